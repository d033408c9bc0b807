//! Wizard record data model.
//!
//! All fields are strings on the wire, matching what the field screens
//! collect; numbers are only interpreted to derive `totalHours`.

pub mod entries;
pub mod record;

pub use entries::{DerivedHours, Equipment, Labour, LabourRole, Visitor};
pub use record::{FieldValue, ListItem, WizardPatch, WizardRecord};

use serde_json::Value;

use crate::registry::FieldError;

/// Read a text field from screen input. Numbers and booleans keep their
/// literal spelling; `null` clears the field.
pub(crate) fn text_from_json(field: &str, value: &Value) -> Result<String, FieldError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(_) | Value::Object(_) => Err(FieldError::WrongType {
            field: field.to_string(),
            expected: "a text value",
        }),
    }
}
