//! Field change and list edit handlers.
//!
//! Every handler returns the session snapshot after the edit, so the screen
//! re-renders from the store rather than from its own copy.

use std::sync::RwLock;

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::{LabourRole, ListItem};
use crate::registry::ListField;
use crate::state::AppState;

use super::{with_session, SessionSnapshot, Sessions};

// ── on_field_change ──────────────────────────────────────────────────────────

/// Testable inner logic for [`on_field_change`].
pub(crate) fn on_field_change_inner(
    id: &str,
    name: &str,
    value: Value,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SessionSnapshot, AppError> {
    with_session(id, sessions_lock, |session| {
        session.set_field(name, value)?;
        Ok(SessionSnapshot::from(&*session))
    })
}

// ── merge_fields ─────────────────────────────────────────────────────────────

/// Testable inner logic for [`merge_fields`].
pub(crate) fn merge_fields_inner(
    id: &str,
    fields: &Map<String, Value>,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SessionSnapshot, AppError> {
    with_session(id, sessions_lock, |session| {
        session.merge_json(fields)?;
        Ok(SessionSnapshot::from(&*session))
    })
}

// ── list items ───────────────────────────────────────────────────────────────

pub(crate) fn add_list_item_inner(
    id: &str,
    item: ListItem,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SessionSnapshot, AppError> {
    with_session(id, sessions_lock, |session| {
        session.add_list_item(item)?;
        Ok(SessionSnapshot::from(&*session))
    })
}

pub(crate) fn remove_list_item_inner(
    id: &str,
    list: ListField,
    index: usize,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SessionSnapshot, AppError> {
    with_session(id, sessions_lock, |session| {
        session.remove_list_item(list, index)?;
        Ok(SessionSnapshot::from(&*session))
    })
}

pub(crate) fn update_list_item_inner(
    id: &str,
    list: ListField,
    index: usize,
    fields: &Map<String, Value>,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SessionSnapshot, AppError> {
    with_session(id, sessions_lock, |session| {
        session.update_list_item(list, index, fields)?;
        Ok(SessionSnapshot::from(&*session))
    })
}

// ── labour roles ─────────────────────────────────────────────────────────────

pub(crate) fn add_labour_role_inner(
    id: &str,
    labour_index: usize,
    role: LabourRole,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SessionSnapshot, AppError> {
    with_session(id, sessions_lock, |session| {
        session.add_labour_role(labour_index, role)?;
        Ok(SessionSnapshot::from(&*session))
    })
}

pub(crate) fn remove_labour_role_inner(
    id: &str,
    labour_index: usize,
    role_index: usize,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SessionSnapshot, AppError> {
    with_session(id, sessions_lock, |session| {
        session.remove_labour_role(labour_index, role_index)?;
        Ok(SessionSnapshot::from(&*session))
    })
}

pub(crate) fn update_labour_role_inner(
    id: &str,
    labour_index: usize,
    role_index: usize,
    fields: &Map<String, Value>,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SessionSnapshot, AppError> {
    with_session(id, sessions_lock, |session| {
        session.update_labour_role(labour_index, role_index, fields)?;
        Ok(SessionSnapshot::from(&*session))
    })
}

// ── Command wrappers ─────────────────────────────────────────────────────────

/// A screen's change handler: write one field.
pub fn on_field_change(
    id: &str,
    name: &str,
    value: Value,
    state: &AppState,
) -> Result<SessionSnapshot, AppError> {
    on_field_change_inner(id, name, value, &state.sessions)
}

/// Merge a whole form object at once.
pub fn merge_fields(
    id: &str,
    fields: &Map<String, Value>,
    state: &AppState,
) -> Result<SessionSnapshot, AppError> {
    merge_fields_inner(id, fields, &state.sessions)
}

pub fn add_list_item(
    id: &str,
    item: ListItem,
    state: &AppState,
) -> Result<SessionSnapshot, AppError> {
    add_list_item_inner(id, item, &state.sessions)
}

pub fn remove_list_item(
    id: &str,
    list: ListField,
    index: usize,
    state: &AppState,
) -> Result<SessionSnapshot, AppError> {
    remove_list_item_inner(id, list, index, &state.sessions)
}

pub fn update_list_item(
    id: &str,
    list: ListField,
    index: usize,
    fields: &Map<String, Value>,
    state: &AppState,
) -> Result<SessionSnapshot, AppError> {
    update_list_item_inner(id, list, index, fields, &state.sessions)
}

pub fn add_labour_role(
    id: &str,
    labour_index: usize,
    role: LabourRole,
    state: &AppState,
) -> Result<SessionSnapshot, AppError> {
    add_labour_role_inner(id, labour_index, role, &state.sessions)
}

pub fn remove_labour_role(
    id: &str,
    labour_index: usize,
    role_index: usize,
    state: &AppState,
) -> Result<SessionSnapshot, AppError> {
    remove_labour_role_inner(id, labour_index, role_index, &state.sessions)
}

pub fn update_labour_role(
    id: &str,
    labour_index: usize,
    role_index: usize,
    fields: &Map<String, Value>,
    state: &AppState,
) -> Result<SessionSnapshot, AppError> {
    update_labour_role_inner(id, labour_index, role_index, fields, &state.sessions)
}

// ── Tests ────────────────────────────────────────────────────────────────────
