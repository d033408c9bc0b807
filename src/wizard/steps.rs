//! Static step tables.
//!
//! Steps are numbered from 1, as the step indicator on screen shows them.
//! A step's required fields are the fields it owns that the
//! [`FieldRegistry`] marks required, so the registry stays the one place
//! that decides required-ness.

use serde::Serialize;

use super::WizardKind;
use crate::registry::{FieldKey, FieldRegistry};

/// One screen's worth of fields within a wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub index: usize,
    pub name: &'static str,
    pub fields_owned: Vec<FieldKey>,
    pub required_fields: Vec<FieldKey>,
    /// `None` on the terminal review step.
    pub next: Option<usize>,
    pub previous: Option<usize>,
}

impl StepDefinition {
    pub fn is_review(&self) -> bool {
        self.next.is_none()
    }
}

type Layout = &'static [(&'static str, &'static [FieldKey])];

const DAILY_ENTRY_LAYOUT: Layout = &[
    (
        "projectDetails",
        &[
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
        ],
    ),
    ("equipment", &[FieldKey::Equipments]),
    ("labour", &[FieldKey::Labours]),
    ("visitors", &[FieldKey::Visitors]),
    ("description", &[FieldKey::Description]),
    ("review", &[FieldKey::SelectedLogoId]),
];

const DAILY_DIARY_LAYOUT: Layout = &[
    (
        "projectDetails",
        &[
            FieldKey::UserId,
            FieldKey::ProjectId,
            FieldKey::SelectedDate,
            FieldKey::ProjectNumber,
            FieldKey::ProjectName,
            FieldKey::Owner,
            FieldKey::ContractNumber,
            FieldKey::ReportNumber,
            FieldKey::Contractor,
            FieldKey::OwnerContact,
            FieldKey::OwnerProjectManager,
        ],
    ),
    ("description", &[FieldKey::Description]),
    ("review", &[FieldKey::SelectedLogoId]),
];

/// The ordered steps of one wizard kind. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTable {
    kind: WizardKind,
    steps: Vec<StepDefinition>,
}

impl StepTable {
    pub fn for_kind(kind: WizardKind) -> Self {
        let registry = FieldRegistry::for_kind(kind);
        let layout = match kind {
            WizardKind::DailyEntry => DAILY_ENTRY_LAYOUT,
            WizardKind::DailyDiary => DAILY_DIARY_LAYOUT,
        };
        let count = layout.len();
        let steps = layout
            .iter()
            .enumerate()
            .map(|(i, (name, owned))| {
                let index = i + 1;
                StepDefinition {
                    index,
                    name: *name,
                    fields_owned: owned.to_vec(),
                    required_fields: owned
                        .iter()
                        .copied()
                        .filter(|k| registry.is_required(*k))
                        .collect(),
                    next: (index < count).then_some(index + 1),
                    previous: (index > 1).then(|| index - 1),
                }
            })
            .collect();
        Self { kind, steps }
    }

    pub fn kind(&self) -> WizardKind {
        self.kind
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        index.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    pub fn first(&self) -> &StepDefinition {
        &self.steps[0]
    }

    /// Union of every step's required fields, in step order.
    pub fn all_required(&self) -> Vec<FieldKey> {
        self.steps
            .iter()
            .flat_map(|s| s.required_fields.iter().copied())
            .collect()
    }

    /// The step that owns `key`, if any.
    pub fn step_owning(&self, key: FieldKey) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.fields_owned.contains(&key))
    }
}
