//! Master control (checklist template) rules.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::checklist::ChecklistItemDefinition;
use crate::error::CoreError;
use crate::schedule::{buffer_exceeds_interval, ControlInterval};

/// Lifecycle of a master control. Only `active` controls start sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    #[default]
    Draft,
    Active,
    Inactive,
}

impl ControlStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(CoreError::Validation(format!(
                "Invalid control status '{s}'. Must be one of: draft, active, inactive"
            ))),
        }
    }
}

/// Convert a signed buffer-day count from an API payload.
pub fn validate_buffer_days(buffer_days: i32) -> Result<u32, CoreError> {
    u32::try_from(buffer_days)
        .map_err(|_| CoreError::Validation("buffer_days must not be negative".into()))
}

/// Check an ordered item list before it replaces a control's checklist.
pub fn validate_item_definitions(items: &[ChecklistItemDefinition]) -> Result<(), CoreError> {
    if items.is_empty() {
        return Err(CoreError::Validation(
            "A control needs at least one checklist item".into(),
        ));
    }
    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        if item.id.as_str().trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Checklist item {} has a blank key",
                index + 1
            )));
        }
        if item.name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Checklist item '{}' has a blank name",
                item.id
            )));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate checklist item key '{}'",
                item.id
            )));
        }
    }
    Ok(())
}

/// Non-fatal observations about a control's schedule settings.
pub fn control_warnings(interval: ControlInterval, buffer_days: u32) -> Vec<String> {
    let mut warnings = Vec::new();
    if buffer_exceeds_interval(buffer_days, interval) {
        warnings.push(format!(
            "buffer_days ({buffer_days}) is not shorter than the {} interval ({} days)",
            interval.as_str(),
            interval.day_count()
        ));
    }
    warnings
}

/// Opaque token printed into a control's QR code.
pub fn generate_qr_code() -> String {
    format!("ctl-{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::checklist::{ItemId, Priority};

    fn item(id: &str, name: &str) -> ChecklistItemDefinition {
        ChecklistItemDefinition {
            id: ItemId::new(id),
            name: name.into(),
            priority: Priority::Low,
            instructions: String::new(),
            interval: ControlInterval::Weekly,
            buffer_days: 2,
        }
    }

    #[test]
    fn rejects_empty_blank_and_duplicate_items() {
        assert_matches!(validate_item_definitions(&[]), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_item_definitions(&[item(" ", "Gauge")]),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_item_definitions(&[item("a", "")]),
            Err(CoreError::Validation(_))
        );
        let err = validate_item_definitions(&[item("a", "Gauge"), item("a", "Pin")]).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
        assert!(validate_item_definitions(&[item("a", "Gauge"), item("b", "Pin")]).is_ok());
    }

    #[test]
    fn negative_buffer_rejected() {
        assert!(validate_buffer_days(-1).is_err());
        assert_eq!(validate_buffer_days(16).unwrap(), 16);
    }

    #[test]
    fn oversized_buffer_produces_warning() {
        assert!(control_warnings(ControlInterval::Monthly, 7).is_empty());
        let warnings = control_warnings(ControlInterval::Weekly, 10);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("weekly"));
    }

    #[test]
    fn qr_codes_are_unique() {
        let a = generate_qr_code();
        assert!(a.starts_with("ctl-"));
        assert_ne!(a, generate_qr_code());
    }

    #[test]
    fn status_round_trip() {
        for s in [ControlStatus::Draft, ControlStatus::Active, ControlStatus::Inactive] {
            assert_eq!(ControlStatus::from_str_db(s.as_str()).unwrap(), s);
        }
        assert!(ControlStatus::from_str_db("archived").is_err());
    }
}
