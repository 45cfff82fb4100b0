use std::sync::{Arc, Mutex};

use tracing::info;

use crate::domain::session::Session;
use crate::infra::auth::{AuthHandler, IdentityProvider};
use crate::infra::lock;
use crate::infra::subscription::Subscription;

pub type SessionListener = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

/// Observes the identity provider and fans the signed-in identity out to
/// local listeners. Holds `None` until the first provider callback and
/// again after sign-out; provider failures only ever show up as the
/// unauthenticated state.
pub struct SessionTracker {
    inner: Arc<Mutex<TrackerInner>>,
    _auth_subscription: Subscription,
}

#[derive(Default)]
struct TrackerInner {
    current: Option<Session>,
    listeners: Vec<(u64, SessionListener)>,
    next_listener_id: u64,
}

impl SessionTracker {
    pub fn new(auth: &Arc<dyn IdentityProvider>) -> Self {
        let inner = Arc::new(Mutex::new(TrackerInner::default()));
        let handler: AuthHandler = Arc::new({
            let inner = inner.clone();
            move |session: Option<Session>| {
                let listeners = {
                    let mut state = lock(&inner);
                    if state.current == session {
                        return;
                    }
                    match &session {
                        Some(session) => info!(user_id = %session.user_id, "session signed in"),
                        None => info!("session signed out"),
                    }
                    state.current = session.clone();
                    state
                        .listeners
                        .iter()
                        .map(|(_, listener)| listener.clone())
                        .collect::<Vec<_>>()
                };
                for listener in listeners {
                    listener(session.as_ref());
                }
            }
        });
        let auth_subscription = auth.on_auth_state_change(handler);
        Self {
            inner,
            _auth_subscription: auth_subscription,
        }
    }

    pub fn current(&self) -> Option<Session> {
        lock(&self.inner).current.clone()
    }

    /// Registers a listener and immediately replays the current state.
    pub fn on_change(&self, listener: SessionListener) -> Subscription {
        let (id, current) = {
            let mut state = lock(&self.inner);
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state.listeners.push((id, listener.clone()));
            (id, state.current.clone())
        };
        listener(current.as_ref());

        let inner = self.inner.clone();
        Subscription::new(move || {
            lock(&inner)
                .listeners
                .retain(|(listener_id, _)| *listener_id != id);
        })
    }
}
