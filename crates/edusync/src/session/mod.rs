//! Session management module.
//!
//! Owns the single client session: who is logged in, with which role and
//! credential, and where that is persisted between runs.

mod manager;
mod models;
mod store;

pub use manager::{LoginGuard, SessionManager};
pub use models::{Account, Identity, LogoutReason, SessionEvent, SessionRecord, SessionState};
pub use store::{
    DEFAULT_SESSION_KEY, FileSessionStore, MemorySessionStore, SessionStore, StoreError,
    StoreResult,
};
