//! Presence rules for required fields.
//!
//! A text field is present when non-empty. A list is present when it has at
//! least one entry; labours additionally need every contractor named and at
//! least one named role per contractor.

use crate::models::WizardRecord;
use crate::registry::FieldKey;

/// The subset of `keys` that `record` does not satisfy, in the order given.
///
/// Labour problems are reported per entry (`labours[0].contractorName`,
/// `labours[0].roles`) so the screen can point at the offending row.
pub fn missing_fields(record: &WizardRecord, keys: &[FieldKey]) -> Vec<String> {
    let mut missing = Vec::new();
    for &key in keys {
        match key {
            FieldKey::Equipments => {
                if record.equipments.is_empty() {
                    missing.push(key.as_str().to_string());
                }
            }
            FieldKey::Visitors => {
                if record.visitors.is_empty() {
                    missing.push(key.as_str().to_string());
                }
            }
            FieldKey::Labours => missing.extend(missing_labour_fields(record)),
            text => {
                if record.text(text).unwrap_or_default().is_empty() {
                    missing.push(text.as_str().to_string());
                }
            }
        }
    }
    missing
}

fn missing_labour_fields(record: &WizardRecord) -> Vec<String> {
    if record.labours.is_empty() {
        return vec![FieldKey::Labours.as_str().to_string()];
    }
    let mut missing = Vec::new();
    for (i, labour) in record.labours.iter().enumerate() {
        if labour.contractor_name.is_empty() {
            missing.push(format!("labours[{i}].contractorName"));
        }
        if !labour.roles.iter().any(|r| !r.role_name.is_empty()) {
            missing.push(format!("labours[{i}].roles"));
        }
    }
    missing
}
