use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Session file name in the session directory
const SESSION_FILE: &str = "session.json";

/// Storage slot holding the access token
pub const ACCESS_TOKEN_SLOT: &str = "authToken";

/// Storage slot holding the refresh token
pub const REFRESH_TOKEN_SLOT: &str = "refreshToken";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse session file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Session store lock poisoned")]
    Poisoned,
}

/// A signed-in session: the pair handed out by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Persistence backend for the two token slots.
///
/// Presence or absence of a slot is the only semantic: a missing access token
/// means requests go out unauthenticated, a missing refresh token means a 401
/// cannot be recovered. Implementations synchronize internally and are
/// last-write-wins across concurrent writers.
pub trait SessionStore: Send + Sync {
    fn access_token(&self) -> Result<Option<String>, SessionError>;

    fn refresh_token(&self) -> Result<Option<String>, SessionError>;

    /// Overwrite both slots
    fn set_session(&self, session: &Session) -> Result<(), SessionError>;

    /// Replace the access token, keeping the stored refresh token
    fn set_access_token(&self, token: &str) -> Result<(), SessionError>;

    /// Remove both slots
    fn clear_session(&self) -> Result<(), SessionError>;

    /// Both slots, if both are present
    fn session(&self) -> Result<Option<Session>, SessionError> {
        match (self.access_token()?, self.refresh_token()?) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(Session {
                access_token,
                refresh_token,
            })),
            _ => Ok(None),
        }
    }
}

/// On-disk / in-memory layout of the two slots.
///
/// The renames must stay equal to `ACCESS_TOKEN_SLOT` and `REFRESH_TOKEN_SLOT`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSlots {
    #[serde(rename = "authToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionSlots {
    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Session kept in process memory. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: RwLock<SessionSlots>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: &Session) -> Self {
        let store = Self::default();
        if let Ok(mut slots) = store.slots.write() {
            slots.access_token = Some(session.access_token.clone());
            slots.refresh_token = Some(session.refresh_token.clone());
        }
        store
    }

    fn write(&self, f: impl FnOnce(&mut SessionSlots)) -> Result<(), SessionError> {
        let mut slots = self.slots.write().map_err(|_| SessionError::Poisoned)?;
        f(&mut slots);
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn access_token(&self) -> Result<Option<String>, SessionError> {
        let slots = self.slots.read().map_err(|_| SessionError::Poisoned)?;
        Ok(slots.access_token.clone())
    }

    fn refresh_token(&self) -> Result<Option<String>, SessionError> {
        let slots = self.slots.read().map_err(|_| SessionError::Poisoned)?;
        Ok(slots.refresh_token.clone())
    }

    fn set_session(&self, session: &Session) -> Result<(), SessionError> {
        self.write(|slots| {
            slots.access_token = Some(session.access_token.clone());
            slots.refresh_token = Some(session.refresh_token.clone());
            slots.updated_at = Some(Utc::now());
        })
    }

    fn set_access_token(&self, token: &str) -> Result<(), SessionError> {
        self.write(|slots| {
            slots.access_token = Some(token.to_string());
            slots.updated_at = Some(Utc::now());
        })
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        self.write(|slots| *slots = SessionSlots::default())
    }
}

/// Session persisted as JSON in `<dir>/session.json`.
///
/// A missing file reads as an empty session; clearing removes the file.
/// Writes go to a temporary file that is renamed over `session.json`, so a
/// reader never sees a partial file. A file that does not parse is treated
/// as empty and is replaced by the next write.
pub struct FileSessionStore {
    dir: PathBuf,
    // Readers share, writers exclusive, within this process
    lock: RwLock<()>,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}.tmp", SESSION_FILE, std::process::id()))
    }

    /// Caller holds `lock`
    fn load(&self) -> Result<SessionSlots, SessionError> {
        let path = self.path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SessionSlots::default())
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&contents) {
            Ok(slots) => Ok(slots),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                Ok(SessionSlots::default())
            }
        }
    }

    /// Caller holds `lock` for writing
    fn save(&self, slots: &SessionSlots) -> Result<(), SessionError> {
        let path = self.path();
        if slots.is_empty() {
            return Self::remove(&path);
        }
        std::fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string_pretty(slots)?;
        let temp = self.temp_path();
        std::fs::write(&temp, contents)?;
        if let Err(e) = std::fs::rename(&temp, &path) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }
        debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    fn remove(path: &Path) -> Result<(), SessionError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self) -> Result<SessionSlots, SessionError> {
        let _guard = self.lock.read().map_err(|_| SessionError::Poisoned)?;
        self.load()
    }

    fn update(&self, f: impl FnOnce(&mut SessionSlots)) -> Result<(), SessionError> {
        let _guard = self.lock.write().map_err(|_| SessionError::Poisoned)?;
        let mut slots = self.load()?;
        f(&mut slots);
        self.save(&slots)
    }
}

impl SessionStore for FileSessionStore {
    fn access_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.read()?.access_token)
    }

    fn refresh_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.read()?.refresh_token)
    }

    fn set_session(&self, session: &Session) -> Result<(), SessionError> {
        let _guard = self.lock.write().map_err(|_| SessionError::Poisoned)?;
        self.save(&SessionSlots {
            access_token: Some(session.access_token.clone()),
            refresh_token: Some(session.refresh_token.clone()),
            updated_at: Some(Utc::now()),
        })
    }

    fn set_access_token(&self, token: &str) -> Result<(), SessionError> {
        self.update(|slots| {
            slots.access_token = Some(token.to_string());
            slots.updated_at = Some(Utc::now());
        })
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        let _guard = self.lock.write().map_err(|_| SessionError::Poisoned)?;
        Self::remove(&self.path())
    }
}
