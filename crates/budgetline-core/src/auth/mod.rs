//! Authentication module for managing the token session.
//!
//! This module provides:
//! - `SessionStore`: the access/refresh token pair behind two named slots,
//!   with in-memory, file and OS keychain backends
//! - `SessionEvent`: notifications the hosting application subscribes to,
//!   including the forced sign-out when a refresh fails

pub mod credentials;
pub mod events;
pub mod session;

pub use credentials::KeyringSessionStore;
pub use events::SessionEvent;
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionError, SessionSlots, SessionStore,
    ACCESS_TOKEN_SLOT, REFRESH_TOKEN_SLOT,
};
