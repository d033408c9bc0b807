//! Command handlers invoked by the screen layer.
//!
//! Sub-modules are grouped by concern:
//! - [`session`]    — create / inspect / reset / dispose sessions, user and project context
//! - [`fields`]     — field changes and list item edits
//! - [`navigation`] — next / previous / jump and the step table
//! - [`submit`]     — submission and payload preview
//!
//! All handlers follow the `_inner` + wrapper pattern: `_inner` functions
//! take the individual locks and hold the logic; the public wrappers take
//! `&AppState` and delegate.

pub mod fields;
pub mod navigation;
pub mod session;
pub mod submit;

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::error::AppError;
use crate::state::UserContext;
use crate::wizard::WizardSession;

pub use session::SessionSnapshot;

pub(crate) type Sessions = HashMap<Uuid, WizardSession>;

pub(crate) fn read_sessions(
    lock: &RwLock<Sessions>,
) -> Result<RwLockReadGuard<'_, Sessions>, AppError> {
    lock.read()
        .map_err(|e| AppError::State(format!("session table lock poisoned: {e}")))
}

pub(crate) fn write_sessions(
    lock: &RwLock<Sessions>,
) -> Result<RwLockWriteGuard<'_, Sessions>, AppError> {
    lock.write()
        .map_err(|e| AppError::State(format!("session table lock poisoned: {e}")))
}

pub(crate) fn read_context(
    lock: &RwLock<UserContext>,
) -> Result<RwLockReadGuard<'_, UserContext>, AppError> {
    lock.read()
        .map_err(|e| AppError::State(format!("user context lock poisoned: {e}")))
}

pub(crate) fn write_context(
    lock: &RwLock<UserContext>,
) -> Result<RwLockWriteGuard<'_, UserContext>, AppError> {
    lock.write()
        .map_err(|e| AppError::State(format!("user context lock poisoned: {e}")))
}

/// Parse a session id. A malformed id cannot name an open session, so it is
/// reported as not found.
pub(crate) fn parse_session_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::SessionNotFound(format!("session {id} not found")))
}

/// Run `f` on the session named by `id` under the write lock.
pub(crate) fn with_session<T>(
    id: &str,
    lock: &RwLock<Sessions>,
    f: impl FnOnce(&mut WizardSession) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let uuid = parse_session_id(id)?;
    let mut sessions = write_sessions(lock)?;
    let session = sessions
        .get_mut(&uuid)
        .ok_or_else(|| AppError::SessionNotFound(format!("session {id} not found")))?;
    f(session)
}
