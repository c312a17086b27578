//! Config entries binding a property to its per-category options.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CollectionKind, Uprn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// Per-category sensor enablement.
///
/// Categories without an explicit value fall back to
/// [`CollectionKind::default_enabled`], so entries created before a category
/// existed pick up its default.
pub struct CollectionOptions {
    overrides: HashMap<CollectionKind, bool>,
}

impl CollectionOptions {
    /// Options with every category at its default.
    #[must_use]
    pub fn defaults() -> Self {
        let overrides = CollectionKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.default_enabled()))
            .collect();
        Self { overrides }
    }

    /// Whether sensors for a category should exist.
    #[must_use]
    pub fn enabled(&self, kind: CollectionKind) -> bool {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_enabled())
    }

    /// Set the enablement for one category.
    pub fn set_enabled(&mut self, kind: CollectionKind, enabled: bool) {
        self.overrides.insert(kind, enabled);
    }

    /// All categories that are currently enabled, in canonical order.
    #[must_use]
    pub fn enabled_kinds(&self) -> Vec<CollectionKind> {
        CollectionKind::ALL
            .into_iter()
            .filter(|kind| self.enabled(*kind))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A configured property: identity plus user-chosen options.
pub struct ConfigEntry {
    /// Unique identifier (ULID).
    pub entry_id: String,
    /// Display title, usually the first line of the chosen address.
    pub title: String,
    /// Property identifier the entry was created for. Immutable.
    pub uprn: Uprn,
    /// Which categories produce sensors.
    #[serde(default)]
    pub options: CollectionOptions,
    /// Creation timestamp.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ConfigEntry {
    /// Create an entry with default options.
    #[must_use]
    pub fn new<T: Into<String>>(title: T, uprn: Uprn) -> Self {
        Self {
            entry_id: ulid::Ulid::new().to_string(),
            title: title.into(),
            uprn,
            options: CollectionOptions::defaults(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_category_defaults() {
        let options = CollectionOptions::defaults();
        assert!(options.enabled(CollectionKind::General));
        assert!(options.enabled(CollectionKind::Recycling));
        assert!(!options.enabled(CollectionKind::Glass));
        assert!(!options.enabled(CollectionKind::Hygiene));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let options: CollectionOptions = serde_json::from_str("{\"food\": false}")
            .expect("options parse");
        assert!(!options.enabled(CollectionKind::Food));
        assert!(options.enabled(CollectionKind::Garden));
        assert!(!options.enabled(CollectionKind::Glass));
    }

    #[test]
    fn enabled_kinds_reflect_overrides() {
        let mut options = CollectionOptions::defaults();
        options.set_enabled(CollectionKind::Glass, true);
        options.set_enabled(CollectionKind::General, false);

        let kinds = options.enabled_kinds();
        assert!(kinds.contains(&CollectionKind::Glass));
        assert!(!kinds.contains(&CollectionKind::General));
    }

    #[test]
    fn entry_serde_round_trip() {
        let entry = ConfigEntry::new("12 Working Street", Uprn::new("100100123456"));
        let json = serde_json::to_string(&entry).expect("serialize entry");
        let parsed: ConfigEntry = serde_json::from_str(&json).expect("parse entry");
        assert_eq!(parsed, entry);
    }
}
