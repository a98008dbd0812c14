/// Session lifecycle notifications broadcast by `ApiClient`.
///
/// `Expired` replaces a hard redirect: the host decides how to get the user
/// back to `redirect_to`, and must treat any in-flight work as cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    /// A 401 was recovered with a fresh access token
    Refreshed,
    /// Refresh failed; both tokens have been cleared
    Expired { redirect_to: String },
}

impl SessionEvent {
    pub fn is_expired(&self) -> bool {
        matches!(self, SessionEvent::Expired { .. })
    }
}
