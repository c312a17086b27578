//! Sensor entities presenting per-category collection dates.

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::coordinator::CoordinatorState;
use crate::entry::ConfigEntry;
use crate::model::{CollectionKind, Uprn};

/// Fixed attribution attached to every sensor.
pub const ATTRIBUTION: &str = "Data provided by Cardiff Council";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Descriptive attributes exposed alongside the sensor value.
pub struct SensorAttributes {
    /// Data source attribution.
    pub attribution: &'static str,
    /// Council wording for the round, when the category is scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<String>,
    /// Bin image for the round, when the category is scheduled.
    #[serde(rename = "image_URL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One sensor per enabled category.
///
/// Stateless presentation: the value is derived from the coordinator's
/// current snapshot at read time, delivered over the watch channel rather
/// than by polling.
pub struct CollectionSensor {
    kind: CollectionKind,
    name: String,
    unique_id: String,
    state_rx: watch::Receiver<CoordinatorState>,
}

impl CollectionSensor {
    /// Create a sensor for one category of a configured property.
    #[must_use]
    pub fn new(
        uprn: &Uprn,
        kind: CollectionKind,
        state_rx: watch::Receiver<CoordinatorState>,
    ) -> Self {
        debug!(
            kind = %kind,
            uprn = %uprn.redacted(),
            "creating collection sensor"
        );
        Self {
            kind,
            name: kind.display_name(),
            unique_id: format!("cardiffwaste-{}-{}", uprn.as_str(), kind.slug()),
            state_rx,
        }
    }

    /// Category this sensor tracks.
    #[must_use]
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Display name, e.g. "General Waste Collection".
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable unique id: `cardiffwaste-<uprn>-<slug>`.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Next collection date, or `None` when the category is not scheduled.
    #[must_use]
    pub fn native_value(&self) -> Option<NaiveDate> {
        let state = self.state_rx.borrow();
        state
            .snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.record(self.kind))
            .map(|record| record.date)
    }

    /// Attribution plus round label and image when scheduled.
    #[must_use]
    pub fn attributes(&self) -> SensorAttributes {
        let state = self.state_rx.borrow();
        let record = state
            .snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.record(self.kind));
        SensorAttributes {
            attribution: ATTRIBUTION,
            collection_type: record.map(|record| record.type_label.clone()),
            image_url: record.map(|record| record.image_url.clone()),
        }
    }

    /// Whether the displayed value comes from a failed refresh cycle.
    ///
    /// Stale sensors keep showing the last-known date.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.state_rx.borrow().stale
    }

    /// Detached presentation snapshot, safe to hand to a UI thread.
    #[must_use]
    pub fn view(&self) -> SensorView {
        SensorView {
            kind: self.kind,
            name: self.name.clone(),
            unique_id: self.unique_id.clone(),
            value: self.native_value(),
            attributes: self.attributes(),
            stale: self.is_stale(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Point-in-time copy of everything a sensor displays.
pub struct SensorView {
    /// Category the sensor tracks.
    pub kind: CollectionKind,
    /// Display name.
    pub name: String,
    /// Stable unique id.
    pub unique_id: String,
    /// Next collection date, if scheduled.
    pub value: Option<NaiveDate>,
    /// Descriptive attributes.
    pub attributes: SensorAttributes,
    /// Whether the last refresh failed.
    pub stale: bool,
}

/// Build the sensor set for an entry's currently enabled categories.
#[must_use]
pub fn sensors_for_entry(
    entry: &ConfigEntry,
    state_rx: &watch::Receiver<CoordinatorState>,
) -> Vec<CollectionSensor> {
    entry
        .options
        .enabled_kinds()
        .into_iter()
        .map(|kind| CollectionSensor::new(&entry.uprn, kind, state_rx.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{CollectionRecord, CollectionsSnapshot};

    fn state_with_food() -> (watch::Sender<CoordinatorState>, watch::Receiver<CoordinatorState>) {
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).expect("valid date");
        let snapshot = CollectionsSnapshot::from_records(vec![CollectionRecord {
            kind: CollectionKind::Food,
            date,
            type_label: "Food Waste".to_owned(),
            image_url: "https://example.invalid/food.png".to_owned(),
        }]);
        watch::channel(CoordinatorState {
            snapshot: Some(Arc::new(snapshot)),
            stale: false,
            last_success: None,
        })
    }

    #[test]
    fn value_and_attributes_for_scheduled_category() {
        let (_tx, rx) = state_with_food();
        let sensor = CollectionSensor::new(&Uprn::new("100100123456"), CollectionKind::Food, rx);

        assert_eq!(sensor.name(), "Food Waste Collection");
        assert_eq!(sensor.unique_id(), "cardiffwaste-100100123456-food");
        assert_eq!(
            sensor.native_value(),
            NaiveDate::from_ymd_opt(2024, 5, 6)
        );

        let attributes = sensor.attributes();
        assert_eq!(attributes.attribution, ATTRIBUTION);
        assert_eq!(attributes.collection_type.as_deref(), Some("Food Waste"));
        assert_eq!(
            attributes.image_url.as_deref(),
            Some("https://example.invalid/food.png")
        );
    }

    #[test]
    fn absent_category_has_no_value_and_bare_attributes() {
        let (_tx, rx) = state_with_food();
        let sensor = CollectionSensor::new(&Uprn::new("100100123456"), CollectionKind::Garden, rx);

        assert_eq!(sensor.native_value(), None);
        let attributes = sensor.attributes();
        assert_eq!(attributes.attribution, ATTRIBUTION);
        assert!(attributes.collection_type.is_none());
        assert!(attributes.image_url.is_none());
    }

    #[test]
    fn default_entry_gets_default_enabled_sensors() {
        let (_tx, rx) = state_with_food();
        let entry = ConfigEntry::new("12 Working Street", Uprn::new("100100123456"));

        let sensors = sensors_for_entry(&entry, &rx);
        let kinds: Vec<CollectionKind> = sensors.iter().map(CollectionSensor::kind).collect();
        assert!(kinds.contains(&CollectionKind::General));
        assert!(kinds.contains(&CollectionKind::Recycling));
        assert!(!kinds.contains(&CollectionKind::Glass));
        assert!(!kinds.contains(&CollectionKind::Hygiene));
    }

    #[test]
    fn rebuilt_sensor_set_tracks_changed_options() {
        let (_tx, rx) = state_with_food();
        let mut entry = ConfigEntry::new("12 Working Street", Uprn::new("100100123456"));

        entry.options.set_enabled(CollectionKind::Food, false);
        entry.options.set_enabled(CollectionKind::Glass, true);
        let sensors = sensors_for_entry(&entry, &rx);

        let kinds: Vec<CollectionKind> = sensors.iter().map(CollectionSensor::kind).collect();
        assert!(!kinds.contains(&CollectionKind::Food));
        assert!(kinds.contains(&CollectionKind::Glass));
        assert!(kinds.contains(&CollectionKind::General));
    }

    #[test]
    fn stale_flag_passes_through() {
        let (tx, rx) = state_with_food();
        let sensor = CollectionSensor::new(&Uprn::new("100100123456"), CollectionKind::Food, rx);
        assert!(!sensor.is_stale());

        tx.send_modify(|state| state.stale = true);
        assert!(sensor.is_stale());
        // Last-known value survives staleness.
        assert!(sensor.native_value().is_some());
    }
}
