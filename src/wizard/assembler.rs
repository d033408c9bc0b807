//! Record → backend payload.
//!
//! [`assemble`] is pure: it checks the full required set of the wizard kind,
//! then serializes a body with the canonical wire keys. Blank entry
//! sub-fields are filled the way the review screen shows them
//! ("Unknown Equipment", `"0"` hours and so on). `totalHours` is always
//! derived from `quantity` and `hours`, whatever the record holds.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::presence::missing_fields;
use super::WizardKind;
use crate::models::entries::total_hours;
use crate::models::{Equipment, Labour, LabourRole, Visitor, WizardRecord};
use crate::registry::FieldRegistry;

/// The record lacks fields required for submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record is missing required fields: {}", .missing_fields.join(", "))]
pub struct IncompleteRecordError {
    pub missing_fields: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error(transparent)]
    Incomplete(#[from] IncompleteRecordError),
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The serialized body of one submission. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    kind: WizardKind,
    json: String,
    fingerprint: String,
}

impl SubmissionPayload {
    pub fn kind(&self) -> WizardKind {
        self.kind
    }

    pub fn as_json(&self) -> &str {
        &self.json
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.json)
    }

    /// Lowercase hex SHA-256 of the body bytes. Equal bodies share a
    /// fingerprint, so a retry of the same record is recognisable.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Build the backend payload for `record`.
pub fn assemble(kind: WizardKind, record: &WizardRecord) -> Result<SubmissionPayload, AssembleError> {
    let required = FieldRegistry::for_kind(kind).required_keys();
    let missing = missing_fields(record, &required);
    if !missing.is_empty() {
        return Err(IncompleteRecordError {
            missing_fields: missing,
        }
        .into());
    }

    let json = match kind {
        WizardKind::DailyEntry => serde_json::to_string(&DailyEntryBody::from_record(record))?,
        WizardKind::DailyDiary => serde_json::to_string(&DailyDiaryBody::from_record(record))?,
    };
    let fingerprint = format!("{:x}", Sha256::digest(json.as_bytes()));
    Ok(SubmissionPayload {
        kind,
        json,
        fingerprint,
    })
}

// ── wire bodies ────────────────────────────────────────────────────────────

fn or_default<'a>(value: &'a str, fallback: &'static str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn wire_total(quantity: &str, hours: &str) -> String {
    let total = total_hours(quantity, hours);
    if total.is_empty() {
        "0".to_string()
    } else {
        total
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EquipmentWire<'a> {
    equipment_name: &'a str,
    quantity: &'a str,
    hours: &'a str,
    total_hours: String,
}

impl<'a> From<&'a Equipment> for EquipmentWire<'a> {
    fn from(e: &'a Equipment) -> Self {
        Self {
            equipment_name: or_default(&e.equipment_name, "Unknown Equipment"),
            quantity: or_default(&e.quantity, "0"),
            hours: or_default(&e.hours, "0"),
            total_hours: wire_total(&e.quantity, &e.hours),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleWire<'a> {
    role_name: &'a str,
    quantity: &'a str,
    hours: &'a str,
    total_hours: String,
}

impl<'a> From<&'a LabourRole> for RoleWire<'a> {
    fn from(r: &'a LabourRole) -> Self {
        Self {
            role_name: or_default(&r.role_name, "Unknown Role"),
            quantity: or_default(&r.quantity, "0"),
            hours: or_default(&r.hours, "0"),
            total_hours: wire_total(&r.quantity, &r.hours),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LabourWire<'a> {
    contractor_name: &'a str,
    roles: Vec<RoleWire<'a>>,
}

impl<'a> From<&'a Labour> for LabourWire<'a> {
    fn from(l: &'a Labour) -> Self {
        Self {
            contractor_name: or_default(&l.contractor_name, "Unknown Contractor"),
            roles: l.roles.iter().map(RoleWire::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VisitorWire<'a> {
    visitor_name: &'a str,
    company: &'a str,
    quantity: &'a str,
    hours: &'a str,
    total_hours: String,
}

impl<'a> From<&'a Visitor> for VisitorWire<'a> {
    fn from(v: &'a Visitor) -> Self {
        Self {
            visitor_name: or_default(&v.visitor_name, "Unknown Visitor"),
            company: or_default(&v.company, "Unknown Company"),
            quantity: or_default(&v.quantity, "0"),
            hours: or_default(&v.hours, "0"),
            total_hours: wire_total(&v.quantity, &v.hours),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyEntryBody<'a> {
    user_id: &'a str,
    project_id: &'a str,
    selected_date: &'a str,
    location: &'a str,
    on_shore: &'a str,
    temp_high: &'a str,
    temp_low: &'a str,
    weather: &'a str,
    working_day: &'a str,
    report_number: &'a str,
    project_number: &'a str,
    project_name: &'a str,
    owner: &'a str,
    contract_number: &'a str,
    contractor: &'a str,
    site_inspector: &'a str,
    time_in: &'a str,
    time_out: &'a str,
    owner_contact: &'a str,
    owner_project_manager: &'a str,
    component: &'a str,
    equipments: Vec<EquipmentWire<'a>>,
    labours: Vec<LabourWire<'a>>,
    visitors: Vec<VisitorWire<'a>>,
    description: &'a str,
    selected_logo_id: &'a str,
}

impl<'a> DailyEntryBody<'a> {
    fn from_record(r: &'a WizardRecord) -> Self {
        Self {
            user_id: &r.user_id,
            project_id: &r.project_id,
            selected_date: &r.selected_date,
            location: &r.location,
            on_shore: &r.on_shore,
            temp_high: &r.temp_high,
            temp_low: &r.temp_low,
            weather: &r.weather,
            working_day: &r.working_day,
            report_number: &r.report_number,
            project_number: &r.project_number,
            project_name: &r.project_name,
            owner: &r.owner,
            contract_number: &r.contract_number,
            contractor: &r.contractor,
            site_inspector: &r.site_inspector,
            time_in: &r.time_in,
            time_out: &r.time_out,
            owner_contact: &r.owner_contact,
            owner_project_manager: &r.owner_project_manager,
            component: &r.component,
            equipments: r.equipments.iter().map(EquipmentWire::from).collect(),
            labours: r.labours.iter().map(LabourWire::from).collect(),
            visitors: r.visitors.iter().map(VisitorWire::from).collect(),
            description: &r.description,
            selected_logo_id: &r.selected_logo_id,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyDiaryBody<'a> {
    project_id: &'a str,
    project_number: &'a str,
    project_name: &'a str,
    selected_date: &'a str,
    owner: &'a str,
    description: &'a str,
    contractor: &'a str,
    owner_contact: &'a str,
    contract_number: &'a str,
    report_number: &'a str,
    owner_project_manager: &'a str,
    user_id: &'a str,
    selected_logo_id: &'a str,
}

impl<'a> DailyDiaryBody<'a> {
    fn from_record(r: &'a WizardRecord) -> Self {
        Self {
            project_id: &r.project_id,
            project_number: &r.project_number,
            project_name: &r.project_name,
            selected_date: &r.selected_date,
            owner: &r.owner,
            description: &r.description,
            contractor: &r.contractor,
            owner_contact: &r.owner_contact,
            contract_number: &r.contract_number,
            report_number: &r.report_number,
            owner_project_manager: &r.owner_project_manager,
            user_id: &r.user_id,
            selected_logo_id: &r.selected_logo_id,
        }
    }
}
