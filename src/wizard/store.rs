//! The single mutable record of a wizard session.
//!
//! Screens read a snapshot and write back through [`WizardStore::merge`] or
//! one of the list helpers, which all build a patch and call `merge`. A merge
//! recomputes every derived `totalHours` before it is committed and notifies
//! listeners only when the record actually changed, so repeating a merge is
//! a no-op.

use std::fmt;

use serde_json::{Map, Value};

use super::WizardKind;
use crate::models::entries::apply_entry_fields;
use crate::models::{LabourRole, ListItem, WizardPatch, WizardRecord};
use crate::registry::{FieldError, FieldMode, FieldRegistry, ListField};

pub type ListenerId = u64;

type Listener = Box<dyn Fn(&WizardRecord) + Send + Sync>;

pub struct WizardStore {
    registry: FieldRegistry,
    mode: FieldMode,
    record: WizardRecord,
    revision: u64,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: ListenerId,
}

impl fmt::Debug for WizardStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardStore")
            .field("kind", &self.registry.kind())
            .field("mode", &self.mode)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl WizardStore {
    pub fn new(kind: WizardKind, mode: FieldMode) -> Self {
        Self::seeded(kind, mode, WizardRecord::default())
    }

    /// Start from a previously saved record, e.g. when editing an entry.
    pub fn seeded(kind: WizardKind, mode: FieldMode, mut record: WizardRecord) -> Self {
        record.recompute_derived();
        Self {
            registry: FieldRegistry::for_kind(kind),
            mode,
            record,
            revision: 0,
            listeners: Vec::new(),
            next_listener_id: 1,
        }
    }

    pub fn kind(&self) -> WizardKind {
        self.registry.kind()
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    pub fn get(&self) -> &WizardRecord {
        &self.record
    }

    /// An owned copy for a screen to render from. Writing to it has no effect
    /// on the store.
    pub fn snapshot(&self) -> WizardRecord {
        self.record.clone()
    }

    /// Bumped on every committed change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Merge `patch` into the record. Returns whether the record changed.
    ///
    /// Fields the registry does not declare for this wizard kind are dropped
    /// in permissive mode and reject the merge in strict mode.
    pub fn merge(&mut self, mut patch: WizardPatch) -> Result<bool, FieldError> {
        let undeclared: Vec<_> = patch
            .keys()
            .filter(|k| !self.registry.declares(*k))
            .collect();
        for key in undeclared {
            match self.mode {
                FieldMode::Strict => return Err(FieldError::Unknown(key.as_str().to_string())),
                FieldMode::Permissive => {
                    tracing::warn!(field = %key, kind = %self.kind(), "ignoring undeclared field");
                    patch.remove(key);
                }
            }
        }

        let mut next = self.record.clone();
        let touched = next.apply(patch)?;
        tracing::debug!(kind = %self.kind(), fields = ?touched, "merge");
        Ok(self.commit(next))
    }

    /// Merge a screen's untyped form object.
    pub fn merge_json(&mut self, fields: &Map<String, Value>) -> Result<bool, FieldError> {
        let (patch, ignored) = WizardPatch::from_json(fields, &self.registry, self.mode)?;
        for name in &ignored {
            tracing::warn!(field = %name, kind = %self.kind(), "ignoring unknown field");
        }
        self.merge(patch)
    }

    /// Single-field merge, as sent by a screen's change handler.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<bool, FieldError> {
        let mut fields = Map::new();
        fields.insert(name.to_string(), value);
        self.merge_json(&fields)
    }

    /// Replace the record with an empty one.
    pub fn reset(&mut self) {
        self.record = WizardRecord::default();
        self.revision += 1;
        self.notify();
    }

    pub fn add_list_item(&mut self, item: ListItem) -> Result<bool, FieldError> {
        let patch = match item {
            ListItem::Equipment(e) => {
                let mut list = self.record.equipments.clone();
                list.push(e);
                WizardPatch::new().with_equipments(list)
            }
            ListItem::Labour(l) => {
                let mut list = self.record.labours.clone();
                list.push(l);
                WizardPatch::new().with_labours(list)
            }
            ListItem::Visitor(v) => {
                let mut list = self.record.visitors.clone();
                list.push(v);
                WizardPatch::new().with_visitors(list)
            }
        };
        self.merge(patch)
    }

    pub fn remove_list_item(&mut self, list: ListField, index: usize) -> Result<bool, FieldError> {
        let out_of_range = || FieldError::IndexOutOfRange {
            list: list.key().as_str().to_string(),
            index,
        };
        let patch = match list {
            ListField::Equipments => {
                let mut items = self.record.equipments.clone();
                if index >= items.len() {
                    return Err(out_of_range());
                }
                items.remove(index);
                WizardPatch::new().with_equipments(items)
            }
            ListField::Labours => {
                let mut items = self.record.labours.clone();
                if index >= items.len() {
                    return Err(out_of_range());
                }
                items.remove(index);
                WizardPatch::new().with_labours(items)
            }
            ListField::Visitors => {
                let mut items = self.record.visitors.clone();
                if index >= items.len() {
                    return Err(out_of_range());
                }
                items.remove(index);
                WizardPatch::new().with_visitors(items)
            }
        };
        self.merge(patch)
    }

    /// Write individual fields of one list entry, e.g.
    /// `{"quantity": "3"}` on `equipments[0]`.
    pub fn update_list_item(
        &mut self,
        list: ListField,
        index: usize,
        fields: &Map<String, Value>,
    ) -> Result<bool, FieldError> {
        let name = list.key().as_str();
        let out_of_range = || FieldError::IndexOutOfRange {
            list: name.to_string(),
            index,
        };
        let (patch, ignored) = match list {
            ListField::Equipments => {
                let mut items = self.record.equipments.clone();
                let entry = items.get_mut(index).ok_or_else(out_of_range)?;
                let ignored = apply_entry_fields(entry, name, fields, self.mode)?;
                (WizardPatch::new().with_equipments(items), ignored)
            }
            ListField::Labours => {
                let mut items = self.record.labours.clone();
                let entry = items.get_mut(index).ok_or_else(out_of_range)?;
                let ignored = apply_entry_fields(entry, name, fields, self.mode)?;
                (WizardPatch::new().with_labours(items), ignored)
            }
            ListField::Visitors => {
                let mut items = self.record.visitors.clone();
                let entry = items.get_mut(index).ok_or_else(out_of_range)?;
                let ignored = apply_entry_fields(entry, name, fields, self.mode)?;
                (WizardPatch::new().with_visitors(items), ignored)
            }
        };
        for field in &ignored {
            tracing::warn!(field = %field, index, "ignoring unknown entry field");
        }
        self.merge(patch)
    }

    pub fn add_labour_role(
        &mut self,
        labour_index: usize,
        role: LabourRole,
    ) -> Result<bool, FieldError> {
        let mut labours = self.record.labours.clone();
        let labour = labours
            .get_mut(labour_index)
            .ok_or_else(|| FieldError::IndexOutOfRange {
                list: "labours".to_string(),
                index: labour_index,
            })?;
        labour.roles.push(role);
        self.merge(WizardPatch::new().with_labours(labours))
    }

    pub fn remove_labour_role(
        &mut self,
        labour_index: usize,
        role_index: usize,
    ) -> Result<bool, FieldError> {
        let mut labours = self.record.labours.clone();
        let labour = labours
            .get_mut(labour_index)
            .ok_or_else(|| FieldError::IndexOutOfRange {
                list: "labours".to_string(),
                index: labour_index,
            })?;
        if role_index >= labour.roles.len() {
            return Err(FieldError::IndexOutOfRange {
                list: format!("labours[{labour_index}].roles"),
                index: role_index,
            });
        }
        labour.roles.remove(role_index);
        self.merge(WizardPatch::new().with_labours(labours))
    }

    pub fn update_labour_role(
        &mut self,
        labour_index: usize,
        role_index: usize,
        fields: &Map<String, Value>,
    ) -> Result<bool, FieldError> {
        let mut labours = self.record.labours.clone();
        let labour = labours
            .get_mut(labour_index)
            .ok_or_else(|| FieldError::IndexOutOfRange {
                list: "labours".to_string(),
                index: labour_index,
            })?;
        let list = format!("labours[{labour_index}].roles");
        let role = labour
            .roles
            .get_mut(role_index)
            .ok_or_else(|| FieldError::IndexOutOfRange {
                list: list.clone(),
                index: role_index,
            })?;
        let ignored = apply_entry_fields(role, &list, fields, self.mode)?;
        for field in &ignored {
            tracing::warn!(field = %field, "ignoring unknown role field");
        }
        self.merge(WizardPatch::new().with_labours(labours))
    }

    /// Register a listener called with the new record after every change.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&WizardRecord) + Send + Sync + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, next: WizardRecord) -> bool {
        if next == self.record {
            return false;
        }
        self.record = next;
        self.revision += 1;
        self.notify();
        true
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.record);
        }
    }
}
