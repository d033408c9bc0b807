//! Field registry for wizard records.
//!
//! Every key a screen may write is declared here, per wizard kind, together
//! with whether that kind requires it and the value a fresh record starts
//! with. The store resolves untyped form keys through [`FieldRegistry`]; the
//! step tables and the assembler read their required sets from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::wizard::WizardKind;

/// Every field a wizard record can hold, named by its camelCase wire key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    UserId,
    ProjectId,
    SelectedDate,
    Location,
    OnShore,
    TempHigh,
    TempLow,
    Weather,
    WorkingDay,
    ReportNumber,
    ProjectNumber,
    ProjectName,
    Owner,
    ContractNumber,
    Contractor,
    SiteInspector,
    TimeIn,
    TimeOut,
    OwnerContact,
    OwnerProjectManager,
    Component,
    Description,
    SelectedLogoId,
    Equipments,
    Labours,
    Visitors,
}

impl FieldKey {
    /// All keys in declaration order.
    pub const ALL: [FieldKey; 26] = [
        FieldKey::UserId,
        FieldKey::ProjectId,
        FieldKey::SelectedDate,
        FieldKey::Location,
        FieldKey::OnShore,
        FieldKey::TempHigh,
        FieldKey::TempLow,
        FieldKey::Weather,
        FieldKey::WorkingDay,
        FieldKey::ReportNumber,
        FieldKey::ProjectNumber,
        FieldKey::ProjectName,
        FieldKey::Owner,
        FieldKey::ContractNumber,
        FieldKey::Contractor,
        FieldKey::SiteInspector,
        FieldKey::TimeIn,
        FieldKey::TimeOut,
        FieldKey::OwnerContact,
        FieldKey::OwnerProjectManager,
        FieldKey::Component,
        FieldKey::Description,
        FieldKey::SelectedLogoId,
        FieldKey::Equipments,
        FieldKey::Labours,
        FieldKey::Visitors,
    ];

    /// The wire key, e.g. `"ownerProjectManager"`.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::UserId => "userId",
            FieldKey::ProjectId => "projectId",
            FieldKey::SelectedDate => "selectedDate",
            FieldKey::Location => "location",
            FieldKey::OnShore => "onShore",
            FieldKey::TempHigh => "tempHigh",
            FieldKey::TempLow => "tempLow",
            FieldKey::Weather => "weather",
            FieldKey::WorkingDay => "workingDay",
            FieldKey::ReportNumber => "reportNumber",
            FieldKey::ProjectNumber => "projectNumber",
            FieldKey::ProjectName => "projectName",
            FieldKey::Owner => "owner",
            FieldKey::ContractNumber => "contractNumber",
            FieldKey::Contractor => "contractor",
            FieldKey::SiteInspector => "siteInspector",
            FieldKey::TimeIn => "timeIn",
            FieldKey::TimeOut => "timeOut",
            FieldKey::OwnerContact => "ownerContact",
            FieldKey::OwnerProjectManager => "ownerProjectManager",
            FieldKey::Component => "component",
            FieldKey::Description => "description",
            FieldKey::SelectedLogoId => "selectedLogoId",
            FieldKey::Equipments => "equipments",
            FieldKey::Labours => "labours",
            FieldKey::Visitors => "visitors",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FieldKey::Equipments | FieldKey::Labours | FieldKey::Visitors => FieldKind::List,
            _ => FieldKind::Text,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| FieldError::Unknown(s.to_string()))
    }
}

/// Storage shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single string value; empty string when unset.
    Text,
    /// An ordered sequence of entries; empty when unset.
    List,
}

/// The three list fields, used by the list item helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListField {
    Equipments,
    Labours,
    Visitors,
}

impl ListField {
    pub fn key(self) -> FieldKey {
        match self {
            ListField::Equipments => FieldKey::Equipments,
            ListField::Labours => FieldKey::Labours,
            ListField::Visitors => FieldKey::Visitors,
        }
    }
}

/// How merges treat keys the registry does not declare for the wizard kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMode {
    /// Undeclared keys are logged and skipped.
    #[default]
    Permissive,
    /// Undeclared keys reject the whole merge.
    Strict,
}

/// Errors raised while resolving or writing a field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("unknown field `{0}`")]
    Unknown(String),
    #[error("field `{field}` expects {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
    #[error("`{list}` has no entry at index {index}")]
    IndexOutOfRange { list: String, index: usize },
}

/// Declaration of one field for one wizard kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub key: FieldKey,
    pub required: bool,
}

impl FieldSpec {
    /// The value a fresh record holds for this field.
    pub fn default_value(&self) -> serde_json::Value {
        match self.key.kind() {
            FieldKind::Text => serde_json::Value::String(String::new()),
            FieldKind::List => serde_json::Value::Array(Vec::new()),
        }
    }
}

const fn req(key: FieldKey) -> FieldSpec {
    FieldSpec {
        key,
        required: true,
    }
}

const fn opt(key: FieldKey) -> FieldSpec {
    FieldSpec {
        key,
        required: false,
    }
}

const DAILY_ENTRY_FIELDS: &[FieldSpec] = &[
    req(FieldKey::UserId),
    req(FieldKey::ProjectId),
    req(FieldKey::SelectedDate),
    req(FieldKey::Location),
    opt(FieldKey::OnShore),
    opt(FieldKey::TempHigh),
    opt(FieldKey::TempLow),
    opt(FieldKey::Weather),
    opt(FieldKey::WorkingDay),
    opt(FieldKey::ReportNumber),
    opt(FieldKey::ProjectNumber),
    opt(FieldKey::ProjectName),
    opt(FieldKey::Owner),
    opt(FieldKey::ContractNumber),
    opt(FieldKey::Contractor),
    opt(FieldKey::SiteInspector),
    opt(FieldKey::TimeIn),
    opt(FieldKey::TimeOut),
    opt(FieldKey::OwnerContact),
    opt(FieldKey::OwnerProjectManager),
    opt(FieldKey::Component),
    opt(FieldKey::Equipments),
    req(FieldKey::Labours),
    opt(FieldKey::Visitors),
    opt(FieldKey::Description),
    req(FieldKey::SelectedLogoId),
];

const DAILY_DIARY_FIELDS: &[FieldSpec] = &[
    req(FieldKey::UserId),
    req(FieldKey::ProjectId),
    req(FieldKey::SelectedDate),
    opt(FieldKey::ProjectNumber),
    opt(FieldKey::ProjectName),
    opt(FieldKey::Owner),
    req(FieldKey::ContractNumber),
    req(FieldKey::ReportNumber),
    req(FieldKey::Contractor),
    req(FieldKey::OwnerContact),
    req(FieldKey::OwnerProjectManager),
    req(FieldKey::Description),
    req(FieldKey::SelectedLogoId),
];

/// The declared fields of one wizard kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRegistry {
    kind: WizardKind,
    specs: &'static [FieldSpec],
}

impl FieldRegistry {
    pub fn for_kind(kind: WizardKind) -> Self {
        let specs = match kind {
            WizardKind::DailyEntry => DAILY_ENTRY_FIELDS,
            WizardKind::DailyDiary => DAILY_DIARY_FIELDS,
        };
        Self { kind, specs }
    }

    pub fn kind(&self) -> WizardKind {
        self.kind
    }

    pub fn specs(&self) -> &'static [FieldSpec] {
        self.specs
    }

    pub fn spec(&self, key: FieldKey) -> Option<&'static FieldSpec> {
        self.specs.iter().find(|s| s.key == key)
    }

    pub fn declares(&self, key: FieldKey) -> bool {
        self.spec(key).is_some()
    }

    pub fn is_required(&self, key: FieldKey) -> bool {
        self.spec(key).is_some_and(|s| s.required)
    }

    /// Keys that must be present before this kind can be submitted.
    pub fn required_keys(&self) -> Vec<FieldKey> {
        self.specs
            .iter()
            .filter(|s| s.required)
            .map(|s| s.key)
            .collect()
    }

    /// Resolve an untyped form key to a field declared for this kind.
    pub fn resolve(&self, name: &str) -> Result<FieldKey, FieldError> {
        let key = FieldKey::from_str(name)?;
        if self.declares(key) {
            Ok(key)
        } else {
            Err(FieldError::Unknown(name.to_string()))
        }
    }
}
