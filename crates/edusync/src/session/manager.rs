//! Session manager - owns the authentication state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::auth::{AuthError, AuthResult, Role};

use super::models::{Identity, LogoutReason, SessionEvent, SessionState};
use super::store::{SessionStore, StoreError};

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 16;

/// Owns the single session of a running client.
///
/// State is either `Anonymous` or `Authenticated(identity)`. Every transition is
/// mirrored to the durable store and announced on the event channel. Share it
/// behind an `Arc`; reads never block on a pending login.
pub struct SessionManager {
    state: RwLock<SessionState>,
    store: Arc<dyn SessionStore>,
    login_in_flight: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("role", &self.current_role())
            .field("login_in_flight", &self.is_login_in_flight())
            .finish()
    }
}

impl SessionManager {
    /// Create an anonymous manager over `store`. Call [`restore`](Self::restore)
    /// to pick up a persisted session.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(SessionState::Anonymous),
            store,
            login_in_flight: AtomicBool::new(false),
            events,
        }
    }

    /// Load the persisted session.
    ///
    /// Returns `true` if a session was restored. A record that is corrupt, or
    /// whose credential no longer yields a permitted role, is cleared and the
    /// manager stays anonymous.
    pub fn restore(&self) -> AuthResult<bool> {
        let record = match self.store.load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("no persisted session");
                return Ok(false);
            }
            Err(StoreError::Corrupt(reason)) => {
                warn!("discarding corrupt session record: {}", reason);
                self.discard_stored()?;
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        match Identity::from_record(&record) {
            Ok(identity) => {
                info!("restored session for {} ({})", identity.name, identity.role);
                let event = SessionEvent::LoggedIn {
                    name: identity.name.clone(),
                    role: identity.role,
                };
                *self.write_state() = SessionState::Authenticated(identity);
                let _ = self.events.send(event);
                Ok(true)
            }
            Err(e) => {
                warn!("discarding persisted session: {}", e);
                self.discard_stored()?;
                Ok(false)
            }
        }
    }

    /// Start a session for `identity`, replacing any current one.
    ///
    /// The identity is persisted before it becomes visible, so a store failure
    /// leaves the previous state untouched.
    pub fn login(&self, identity: Identity) -> AuthResult<()> {
        identity.validate()?;
        self.store.save(&identity.to_record())?;

        info!("logged in {} as {}", identity.name, identity.role);
        let event = SessionEvent::LoggedIn {
            name: identity.name.clone(),
            role: identity.role,
        };
        *self.write_state() = SessionState::Authenticated(identity);
        let _ = self.events.send(event);
        Ok(())
    }

    /// End the session. Calling this while anonymous is a no-op.
    pub fn logout(&self) -> AuthResult<()> {
        self.end_session(LogoutReason::UserRequested)
    }

    /// Response interceptor hook: a resource API rejected the credential.
    ///
    /// Same transition as [`logout`](Self::logout).
    pub fn handle_unauthorized(&self) -> AuthResult<()> {
        self.end_session(LogoutReason::Unauthorized)
    }

    fn end_session(&self, reason: LogoutReason) -> AuthResult<()> {
        let previous = std::mem::take(&mut *self.write_state());

        // In-memory state is already anonymous even if clearing the store fails.
        self.store.clear()?;

        if let SessionState::Authenticated(identity) = previous {
            info!("logged out {} ({})", identity.name, reason);
            let _ = self.events.send(SessionEvent::LoggedOut { reason });
        }
        Ok(())
    }

    fn discard_stored(&self) -> AuthResult<()> {
        *self.write_state() = SessionState::Anonymous;
        self.store.clear()?;
        let _ = self.events.send(SessionEvent::LoggedOut {
            reason: LogoutReason::InvalidStoredSession,
        });
        Ok(())
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.read_state().clone()
    }

    /// The logged-in identity, if any.
    pub fn current_user(&self) -> Option<Identity> {
        self.read_state().identity().cloned()
    }

    /// Role of the logged-in identity, if any.
    pub fn current_role(&self) -> Option<Role> {
        self.read_state().role()
    }

    /// Bearer credential of the logged-in identity, if any.
    pub fn credential(&self) -> Option<String> {
        self.read_state()
            .identity()
            .map(|identity| identity.credential.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_authenticated()
    }

    /// Take the in-flight login lock.
    ///
    /// Fails with `LoginInProgress` while another guard is alive. The lock is
    /// released when the guard drops.
    pub fn begin_login(&self) -> AuthResult<LoginGuard<'_>> {
        if self
            .login_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AuthError::LoginInProgress);
        }
        Ok(LoginGuard {
            flag: &self.login_in_flight,
        })
    }

    /// Whether a login exchange is pending.
    pub fn is_login_in_flight(&self) -> bool {
        self.login_in_flight.load(Ordering::Acquire)
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held for the duration of one login exchange.
#[derive(Debug)]
pub struct LoginGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for LoginGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
