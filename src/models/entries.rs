//! List entries of a wizard record: equipment, labour (with roles) and
//! visitors.
//!
//! Every entry that carries `quantity` and `hours` also carries a derived
//! `totalHours`. It is never taken from input; [`DerivedHours::recompute_total`]
//! rewrites it from the two inputs and the store calls it on every merge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::text_from_json;
use crate::registry::{FieldError, FieldMode};

/// Parse a user-typed number the way the field app always has: leading
/// whitespace is skipped and the longest decimal prefix wins, so `"3 hrs"`
/// is 3 and `"abc"` is nothing.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut end = 0;

    if end < len && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut j = frac_start;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            end = j;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut j = end + 1;
        if j < len && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `quantity × hours` rendered as text, or `""` when either side is not a
/// number.
pub fn total_hours(quantity: &str, hours: &str) -> String {
    match (parse_number(quantity), parse_number(hours)) {
        (Some(q), Some(h)) => {
            let total = q * h;
            if !total.is_finite() {
                String::new()
            } else if total == 0.0 {
                // avoids "-0"
                "0".to_string()
            } else {
                number_text(total)
            }
        }
        _ => String::new(),
    }
}

/// Shortest round-trip text for `value`, switching to exponent form
/// (`1e+22`, `1e-7`) outside `1e-6 <= |value| < 1e21` the way the field
/// app prints numbers.
fn number_text(value: f64) -> String {
    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{value}");
    }
    let text = format!("{value:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => text,
    }
}

/// An entry whose `totalHours` is derived from `quantity` and `hours`.
pub trait DerivedHours {
    fn quantity(&self) -> &str;
    fn hours(&self) -> &str;
    fn total_hours_mut(&mut self) -> &mut String;

    fn recompute_total(&mut self) {
        let total = total_hours(self.quantity(), self.hours());
        *self.total_hours_mut() = total;
    }
}

/// Field-by-field writes from untyped screen input.
pub trait EntryFields {
    /// The text slot behind a wire name, if the entry has one.
    fn text_field_mut(&mut self, name: &str) -> Option<&mut String>;

    /// Write `value` into the field `name`. Returns `Ok(false)` when the
    /// entry has no such field.
    fn set_value(&mut self, name: &str, value: &Value) -> Result<bool, FieldError> {
        match self.text_field_mut(name) {
            Some(slot) => {
                *slot = text_from_json(name, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Apply a JSON object of field updates to one entry.
///
/// `totalHours` is accepted and dropped. Unknown names are collected and
/// returned in permissive mode, and fail the whole update in strict mode.
pub(crate) fn apply_entry_fields<E: EntryFields>(
    entry: &mut E,
    list: &str,
    fields: &Map<String, Value>,
    mode: FieldMode,
) -> Result<Vec<String>, FieldError> {
    let mut ignored = Vec::new();
    for (name, value) in fields {
        if name == "totalHours" {
            tracing::debug!(list, "ignoring write to derived totalHours");
            continue;
        }
        if !entry.set_value(name, value)? {
            let qualified = format!("{list}.{name}");
            match mode {
                FieldMode::Strict => return Err(FieldError::Unknown(qualified)),
                FieldMode::Permissive => ignored.push(qualified),
            }
        }
    }
    Ok(ignored)
}

/// A piece of equipment on site.
///
/// Accepts the legacy `name` key on input; always emits `equipmentName`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Equipment {
    #[serde(alias = "name")]
    pub equipment_name: String,
    pub quantity: String,
    pub hours: String,
    pub total_hours: String,
}

impl DerivedHours for Equipment {
    fn quantity(&self) -> &str {
        &self.quantity
    }
    fn hours(&self) -> &str {
        &self.hours
    }
    fn total_hours_mut(&mut self) -> &mut String {
        &mut self.total_hours
    }
}

impl EntryFields for Equipment {
    fn text_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "equipmentName" | "name" => Some(&mut self.equipment_name),
            "quantity" => Some(&mut self.quantity),
            "hours" => Some(&mut self.hours),
            _ => None,
        }
    }
}

/// One trade working for a contractor, e.g. three labourers for eight hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabourRole {
    pub role_name: String,
    pub quantity: String,
    pub hours: String,
    pub total_hours: String,
}

impl DerivedHours for LabourRole {
    fn quantity(&self) -> &str {
        &self.quantity
    }
    fn hours(&self) -> &str {
        &self.hours
    }
    fn total_hours_mut(&mut self) -> &mut String {
        &mut self.total_hours
    }
}

impl EntryFields for LabourRole {
    fn text_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "roleName" => Some(&mut self.role_name),
            "quantity" => Some(&mut self.quantity),
            "hours" => Some(&mut self.hours),
            _ => None,
        }
    }
}

/// A contractor and the roles it had on site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Labour {
    pub contractor_name: String,
    pub roles: Vec<LabourRole>,
}

impl Labour {
    pub fn recompute_totals(&mut self) {
        for role in &mut self.roles {
            role.recompute_total();
        }
    }
}

impl EntryFields for Labour {
    fn text_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "contractorName" => Some(&mut self.contractor_name),
            _ => None,
        }
    }

    fn set_value(&mut self, name: &str, value: &Value) -> Result<bool, FieldError> {
        if name == "roles" {
            self.roles =
                serde_json::from_value(value.clone()).map_err(|_| FieldError::WrongType {
                    field: "labours.roles".to_string(),
                    expected: "a list of labour roles",
                })?;
            return Ok(true);
        }
        match self.text_field_mut(name) {
            Some(slot) => {
                *slot = text_from_json(name, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// A visitor to site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Visitor {
    pub visitor_name: String,
    pub company: String,
    pub quantity: String,
    pub hours: String,
    pub total_hours: String,
}

impl DerivedHours for Visitor {
    fn quantity(&self) -> &str {
        &self.quantity
    }
    fn hours(&self) -> &str {
        &self.hours
    }
    fn total_hours_mut(&mut self) -> &mut String {
        &mut self.total_hours
    }
}

impl EntryFields for Visitor {
    fn text_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "visitorName" => Some(&mut self.visitor_name),
            "company" => Some(&mut self.company),
            "quantity" => Some(&mut self.quantity),
            "hours" => Some(&mut self.hours),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_number_accepts_plain_and_prefixed_values() {
        assert_eq!(parse_number("3"), Some(3.0));
        assert_eq!(parse_number("  2.5"), Some(2.5));
        assert_eq!(parse_number("3 hrs"), Some(3.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("4."), Some(4.0));
        assert_eq!(parse_number("-2"), Some(-2.0));
        assert_eq!(parse_number("1e2x"), Some(100.0));
        assert_eq!(parse_number("7e"), Some(7.0));
    }

    #[test]
    fn parse_number_rejects_non_numbers() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn total_hours_formats_like_the_field_app() {
        assert_eq!(total_hours("3", "2"), "6");
        assert_eq!(total_hours("1.5", "1.5"), "2.25");
        assert_eq!(total_hours("2", "0.5"), "1");
        assert_eq!(total_hours("0", "8"), "0");
        assert_eq!(total_hours("-0", "8"), "0");
        assert_eq!(total_hours("", "8"), "");
        assert_eq!(total_hours("two", "8"), "");
    }

    #[test]
    fn total_hours_uses_exponent_form_at_the_extremes() {
        assert_eq!(total_hours("1e11", "1e11"), "1e+22");
        assert_eq!(total_hours("-1e11", "1e11"), "-1e+22");
        assert_eq!(total_hours("0.0000001", "1"), "1e-7");
        assert_eq!(total_hours("0.000001", "1"), "0.000001");
        assert_eq!(total_hours("1e10", "1e10"), "100000000000000000000");
    }

    #[test]
    fn recompute_total_overwrites_stale_value() {
        let mut e = Equipment {
            equipment_name: "Excavator".to_string(),
            quantity: "2".to_string(),
            hours: "4".to_string(),
            total_hours: "999".to_string(),
        };
        e.recompute_total();
        assert_eq!(e.total_hours, "8");
    }

    #[test]
    fn labour_recomputes_every_role() {
        let mut labour = Labour {
            contractor_name: "Acme".to_string(),
            roles: vec![
                LabourRole {
                    role_name: "Carpenter".to_string(),
                    quantity: "2".to_string(),
                    hours: "8".to_string(),
                    total_hours: String::new(),
                },
                LabourRole {
                    role_name: "Labourer".to_string(),
                    quantity: "x".to_string(),
                    hours: "8".to_string(),
                    total_hours: "5".to_string(),
                },
            ],
        };
        labour.recompute_totals();
        assert_eq!(labour.roles[0].total_hours, "16");
        assert_eq!(labour.roles[1].total_hours, "");
    }

    #[test]
    fn equipment_accepts_legacy_name_key() {
        let e: Equipment =
            serde_json::from_value(json!({ "name": "Crane", "quantity": "1" })).expect("parse");
        assert_eq!(e.equipment_name, "Crane");
        let out = serde_json::to_value(&e).expect("serialize");
        assert_eq!(out["equipmentName"], "Crane");
        assert!(out.get("name").is_none());
    }

    #[test]
    fn apply_fields_permissive_collects_unknown_names() {
        let mut e = Equipment::default();
        let fields = json!({ "employeeName": "Jane", "quantity": "3", "hours": "2" });
        let ignored = apply_entry_fields(
            &mut e,
            "equipments",
            fields.as_object().expect("object"),
            FieldMode::Permissive,
        )
        .expect("permissive never fails on unknown names");
        assert_eq!(ignored, vec!["equipments.employeeName".to_string()]);
        assert_eq!(e.quantity, "3");
        assert_eq!(e.hours, "2");
    }

    #[test]
    fn apply_fields_strict_rejects_unknown_names() {
        let mut v = Visitor::default();
        let fields = json!({ "badge": "42" });
        let err = apply_entry_fields(
            &mut v,
            "visitors",
            fields.as_object().expect("object"),
            FieldMode::Strict,
        )
        .expect_err("strict mode rejects unknown names");
        assert_eq!(err, FieldError::Unknown("visitors.badge".to_string()));
    }

    #[test]
    fn apply_fields_drops_total_hours() {
        let mut role = LabourRole::default();
        let fields = json!({ "totalHours": "100", "quantity": "1" });
        apply_entry_fields(
            &mut role,
            "roles",
            fields.as_object().expect("object"),
            FieldMode::Strict,
        )
        .expect("totalHours is known, just ignored");
        assert_eq!(role.total_hours, "");
        assert_eq!(role.quantity, "1");
    }

    #[test]
    fn labour_roles_must_be_a_list() {
        let mut labour = Labour::default();
        let err = labour
            .set_value("roles", &json!("nope"))
            .expect_err("roles must be an array");
        assert!(matches!(err, FieldError::WrongType { .. }));
    }
}
