use std::sync::Arc;

use crate::domain::session::Session;
use crate::infra::subscription::Subscription;

pub type AuthHandler = Arc<dyn Fn(Option<Session>) + Send + Sync>;

/// The identity-provider seam. Sign-in and sign-out flows belong to the
/// provider's own SDK; the client only observes state transitions. Provider
/// failures are not surfaced as errors, they show up as the unauthenticated
/// state.
pub trait IdentityProvider: Send + Sync {
    /// Registers a handler for auth-state changes. The current state is
    /// replayed immediately on registration.
    fn on_auth_state_change(&self, handler: AuthHandler) -> Subscription;
}
