//! Session identity.

/// Who this participant is within one session.
///
/// Produced by the login flow (out of scope here) and immutable for the
/// session's lifetime; it is dropped with the [`crate::SyncSession`]
/// that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// The shared session being joined.
    pub session_id: String,
    /// This participant's unique id, the echo-discard key.
    pub user_id: String,
    /// Display name shown next to focus indicators.
    pub username: String,
    pub email: String,
}

impl SessionIdentity {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            username: username.into(),
            email: email.into(),
        }
    }
}
