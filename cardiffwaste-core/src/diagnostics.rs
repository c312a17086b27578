//! Diagnostics export with identifier redaction.

use serde_json::{Value, json};

use crate::coordinator::CoordinatorState;
use crate::entry::ConfigEntry;
use crate::redact::redact_uprn;

/// Keys whose string values are masked wherever they appear.
const TO_REDACT: [&str; 1] = ["uprn"];

/// Dump an entry and its cached data as JSON, with identifiers redacted.
///
/// # Errors
///
/// Returns a `serde_json::Error` when the entry or snapshot cannot be
/// serialised, which would indicate a bug in the model types.
pub fn entry_diagnostics(
    entry: &ConfigEntry,
    state: &CoordinatorState,
) -> serde_json::Result<Value> {
    let snapshot = state.snapshot.as_deref();
    let mut value = json!({
        "entry": serde_json::to_value(entry)?,
        "data": serde_json::to_value(snapshot)?,
        "stale": state.stale,
        "last_success": state.last_success,
    });
    redact_in_place(&mut value);
    Ok(value)
}

/// Walk a JSON value and mask every string under a redacted key.
fn redact_in_place(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                if TO_REDACT.contains(&key.as_str()) {
                    if let Value::String(raw) = nested {
                        *raw = redact_uprn(raw);
                    }
                } else {
                    redact_in_place(nested);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_in_place(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::model::{CollectionKind, CollectionRecord, CollectionsSnapshot, Uprn};

    #[test]
    fn uprn_is_redacted_to_last_four() {
        let entry = ConfigEntry::new("12 Working Street", Uprn::new("100100123456"));
        let value =
            entry_diagnostics(&entry, &CoordinatorState::default()).expect("diagnostics");

        let uprn = value["entry"]["uprn"].as_str().expect("uprn string");
        assert_eq!(uprn, "xxxxxxxx3456");
        assert_eq!(uprn.len(), "100100123456".len());
    }

    #[test]
    fn cached_snapshot_is_included() {
        let entry = ConfigEntry::new("12 Working Street", Uprn::new("100100123456"));
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).expect("valid date");
        let snapshot = CollectionsSnapshot::from_records(vec![CollectionRecord {
            kind: CollectionKind::General,
            date,
            type_label: "General Waste".to_owned(),
            image_url: String::new(),
        }]);
        let state = CoordinatorState {
            snapshot: Some(Arc::new(snapshot)),
            stale: false,
            last_success: None,
        };

        let value = entry_diagnostics(&entry, &state).expect("diagnostics");
        assert_eq!(
            value["data"]["collections"]["general"]["type_label"],
            "General Waste"
        );
        assert_eq!(value["stale"], false);
    }

    #[test]
    fn no_data_serialises_as_null() {
        let entry = ConfigEntry::new("12 Working Street", Uprn::new("100100123456"));
        let value =
            entry_diagnostics(&entry, &CoordinatorState::default()).expect("diagnostics");
        assert!(value["data"].is_null());
    }
}
