use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The externally-authenticated identity. Not owned by the client; only
/// observed through identity-provider transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
}
