//! The accumulated record of one wizard session and partial updates to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entries::{DerivedHours, Equipment, Labour, Visitor};
use super::text_from_json;
use crate::registry::{FieldError, FieldKey, FieldKind, FieldMode, FieldRegistry, ListField};

/// Everything entered so far in one wizard session.
///
/// Text fields default to `""` and lists to empty. `totalHours` on every
/// entry is kept equal to `quantity × hours` by [`WizardRecord::recompute_derived`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WizardRecord {
    pub user_id: String,
    pub project_id: String,
    pub selected_date: String,
    pub location: String,
    pub on_shore: String,
    pub temp_high: String,
    pub temp_low: String,
    pub weather: String,
    pub working_day: String,
    pub report_number: String,
    pub project_number: String,
    pub project_name: String,
    pub owner: String,
    pub contract_number: String,
    pub contractor: String,
    pub site_inspector: String,
    pub time_in: String,
    pub time_out: String,
    pub owner_contact: String,
    pub owner_project_manager: String,
    pub component: String,
    pub description: String,
    pub selected_logo_id: String,
    pub equipments: Vec<Equipment>,
    pub labours: Vec<Labour>,
    pub visitors: Vec<Visitor>,
}

impl WizardRecord {
    /// The value of a text field, or `None` for list keys.
    pub fn text(&self, key: FieldKey) -> Option<&str> {
        let value = match key {
            FieldKey::UserId => &self.user_id,
            FieldKey::ProjectId => &self.project_id,
            FieldKey::SelectedDate => &self.selected_date,
            FieldKey::Location => &self.location,
            FieldKey::OnShore => &self.on_shore,
            FieldKey::TempHigh => &self.temp_high,
            FieldKey::TempLow => &self.temp_low,
            FieldKey::Weather => &self.weather,
            FieldKey::WorkingDay => &self.working_day,
            FieldKey::ReportNumber => &self.report_number,
            FieldKey::ProjectNumber => &self.project_number,
            FieldKey::ProjectName => &self.project_name,
            FieldKey::Owner => &self.owner,
            FieldKey::ContractNumber => &self.contract_number,
            FieldKey::Contractor => &self.contractor,
            FieldKey::SiteInspector => &self.site_inspector,
            FieldKey::TimeIn => &self.time_in,
            FieldKey::TimeOut => &self.time_out,
            FieldKey::OwnerContact => &self.owner_contact,
            FieldKey::OwnerProjectManager => &self.owner_project_manager,
            FieldKey::Component => &self.component,
            FieldKey::Description => &self.description,
            FieldKey::SelectedLogoId => &self.selected_logo_id,
            FieldKey::Equipments | FieldKey::Labours | FieldKey::Visitors => return None,
        };
        Some(value.as_str())
    }

    fn text_mut(&mut self, key: FieldKey) -> Option<&mut String> {
        let slot = match key {
            FieldKey::UserId => &mut self.user_id,
            FieldKey::ProjectId => &mut self.project_id,
            FieldKey::SelectedDate => &mut self.selected_date,
            FieldKey::Location => &mut self.location,
            FieldKey::OnShore => &mut self.on_shore,
            FieldKey::TempHigh => &mut self.temp_high,
            FieldKey::TempLow => &mut self.temp_low,
            FieldKey::Weather => &mut self.weather,
            FieldKey::WorkingDay => &mut self.working_day,
            FieldKey::ReportNumber => &mut self.report_number,
            FieldKey::ProjectNumber => &mut self.project_number,
            FieldKey::ProjectName => &mut self.project_name,
            FieldKey::Owner => &mut self.owner,
            FieldKey::ContractNumber => &mut self.contract_number,
            FieldKey::Contractor => &mut self.contractor,
            FieldKey::SiteInspector => &mut self.site_inspector,
            FieldKey::TimeIn => &mut self.time_in,
            FieldKey::TimeOut => &mut self.time_out,
            FieldKey::OwnerContact => &mut self.owner_contact,
            FieldKey::OwnerProjectManager => &mut self.owner_project_manager,
            FieldKey::Component => &mut self.component,
            FieldKey::Description => &mut self.description,
            FieldKey::SelectedLogoId => &mut self.selected_logo_id,
            FieldKey::Equipments | FieldKey::Labours | FieldKey::Visitors => return None,
        };
        Some(slot)
    }

    /// The JSON value a screen would render for `key`.
    pub fn field_value(&self, key: FieldKey) -> Value {
        let value = match key {
            FieldKey::Equipments => serde_json::to_value(&self.equipments),
            FieldKey::Labours => serde_json::to_value(&self.labours),
            FieldKey::Visitors => serde_json::to_value(&self.visitors),
            text => return Value::String(self.text(text).unwrap_or_default().to_string()),
        };
        value.unwrap_or(Value::Array(Vec::new()))
    }

    /// Rewrite every derived `totalHours` from its inputs.
    pub fn recompute_derived(&mut self) {
        for e in &mut self.equipments {
            e.recompute_total();
        }
        for l in &mut self.labours {
            l.recompute_totals();
        }
        for v in &mut self.visitors {
            v.recompute_total();
        }
    }

    /// Apply `patch` field by field. Type mismatches are caught before any
    /// field is written.
    pub fn apply(&mut self, patch: WizardPatch) -> Result<Vec<FieldKey>, FieldError> {
        for (key, value) in &patch.values {
            if !value.fits(*key) {
                return Err(FieldError::WrongType {
                    field: key.as_str().to_string(),
                    expected: expected_for(*key),
                });
            }
        }

        let mut touched = Vec::with_capacity(patch.values.len());
        for (key, value) in patch.values {
            match value {
                FieldValue::Text(text) => {
                    if let Some(slot) = self.text_mut(key) {
                        *slot = text;
                    }
                }
                FieldValue::Equipments(list) => self.equipments = list,
                FieldValue::Labours(list) => self.labours = list,
                FieldValue::Visitors(list) => self.visitors = list,
            }
            touched.push(key);
        }
        self.recompute_derived();
        Ok(touched)
    }
}

/// A value carried by a [`WizardPatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Equipments(Vec<Equipment>),
    Labours(Vec<Labour>),
    Visitors(Vec<Visitor>),
}

impl FieldValue {
    fn fits(&self, key: FieldKey) -> bool {
        match self {
            FieldValue::Text(_) => key.kind() == FieldKind::Text,
            FieldValue::Equipments(_) => key == FieldKey::Equipments,
            FieldValue::Labours(_) => key == FieldKey::Labours,
            FieldValue::Visitors(_) => key == FieldKey::Visitors,
        }
    }
}

fn expected_for(key: FieldKey) -> &'static str {
    match key {
        FieldKey::Equipments => "a list of equipment entries",
        FieldKey::Labours => "a list of labour entries",
        FieldKey::Visitors => "a list of visitor entries",
        _ => "a text value",
    }
}

/// A partial update to a [`WizardRecord`]: only the fields present are
/// written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardPatch {
    values: BTreeMap<FieldKey, FieldValue>,
}

impl WizardPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.values.insert(key, FieldValue::Text(value.into()));
        self
    }

    pub fn with_equipments(mut self, list: Vec<Equipment>) -> Self {
        self.values
            .insert(FieldKey::Equipments, FieldValue::Equipments(list));
        self
    }

    pub fn with_labours(mut self, list: Vec<Labour>) -> Self {
        self.values.insert(FieldKey::Labours, FieldValue::Labours(list));
        self
    }

    pub fn with_visitors(mut self, list: Vec<Visitor>) -> Self {
        self.values
            .insert(FieldKey::Visitors, FieldValue::Visitors(list));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.values.keys().copied()
    }

    /// Drop `key` from the patch, returning whether it was present.
    pub(crate) fn remove(&mut self, key: FieldKey) -> bool {
        self.values.remove(&key).is_some()
    }

    /// Build a patch from a screen's untyped form object.
    ///
    /// Each key is resolved through `registry`. Keys it does not declare are
    /// returned as ignored in permissive mode; in strict mode the first one
    /// fails the whole conversion. Wrong-typed values always fail.
    pub fn from_json(
        fields: &Map<String, Value>,
        registry: &FieldRegistry,
        mode: FieldMode,
    ) -> Result<(Self, Vec<String>), FieldError> {
        let mut patch = Self::new();
        let mut ignored = Vec::new();

        for (name, value) in fields {
            let key = match registry.resolve(name) {
                Ok(key) => key,
                Err(err) => match mode {
                    FieldMode::Strict => return Err(err),
                    FieldMode::Permissive => {
                        ignored.push(name.clone());
                        continue;
                    }
                },
            };
            let field_value = match key {
                FieldKey::Equipments => FieldValue::Equipments(list_from_json(key, value)?),
                FieldKey::Labours => FieldValue::Labours(list_from_json(key, value)?),
                FieldKey::Visitors => FieldValue::Visitors(list_from_json(key, value)?),
                _ => FieldValue::Text(text_from_json(name, value)?),
            };
            patch.values.insert(key, field_value);
        }

        Ok((patch, ignored))
    }
}

fn list_from_json<T: serde::de::DeserializeOwned>(
    key: FieldKey,
    value: &Value,
) -> Result<Vec<T>, FieldError> {
    serde_json::from_value(value.clone()).map_err(|_| FieldError::WrongType {
        field: key.as_str().to_string(),
        expected: expected_for(key),
    })
}

/// One new entry for a list field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "list", content = "item")]
pub enum ListItem {
    #[serde(rename = "equipments")]
    Equipment(Equipment),
    #[serde(rename = "labours")]
    Labour(Labour),
    #[serde(rename = "visitors")]
    Visitor(Visitor),
}

impl ListItem {
    pub fn list(&self) -> ListField {
        match self {
            ListItem::Equipment(_) => ListField::Equipments,
            ListItem::Labour(_) => ListField::Labours,
            ListItem::Visitor(_) => ListField::Visitors,
        }
    }
}
