use keyring::Entry;

use super::session::{Session, SessionError, SessionStore, ACCESS_TOKEN_SLOT, REFRESH_TOKEN_SLOT};

/// Default keychain service name
pub const SERVICE_NAME: &str = "budgetline";

/// Session stored in the OS keychain, one entry per slot.
///
/// The entries are created once and reused, so a backend that keeps
/// credentials per entry sees every write.
pub struct KeyringSessionStore {
    access: Entry,
    refresh: Entry,
}

impl KeyringSessionStore {
    pub fn new() -> Result<Self, SessionError> {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Result<Self, SessionError> {
        Ok(Self {
            access: Entry::new(service, ACCESS_TOKEN_SLOT)?,
            refresh: Entry::new(service, REFRESH_TOKEN_SLOT)?,
        })
    }

    /// Build over explicit entries, e.g. ones backed by a custom credential
    pub fn with_entries(access: Entry, refresh: Entry) -> Self {
        Self { access, refresh }
    }

    fn get(entry: &Entry) -> Result<Option<String>, SessionError> {
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(entry: &Entry) -> Result<(), SessionError> {
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for KeyringSessionStore {
    fn access_token(&self) -> Result<Option<String>, SessionError> {
        Self::get(&self.access)
    }

    fn refresh_token(&self) -> Result<Option<String>, SessionError> {
        Self::get(&self.refresh)
    }

    fn set_session(&self, session: &Session) -> Result<(), SessionError> {
        self.access.set_password(&session.access_token)?;
        self.refresh.set_password(&session.refresh_token)?;
        Ok(())
    }

    fn set_access_token(&self, token: &str) -> Result<(), SessionError> {
        self.access.set_password(token)?;
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        Self::delete(&self.access)?;
        Self::delete(&self.refresh)
    }
}
