//! Domain data structures for properties, addresses, and collection schedules.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::redact::redact_uprn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Waste collection categories offered by the council.
pub enum CollectionKind {
    /// Seasonal christmas tree pickup.
    #[serde(rename = "christmas tree")]
    ChristmasTree,
    /// Food caddy.
    #[serde(rename = "food")]
    Food,
    /// Garden waste.
    #[serde(rename = "garden")]
    Garden,
    /// Residual/general waste.
    #[serde(rename = "general")]
    General,
    /// Glass collection.
    #[serde(rename = "glass")]
    Glass,
    /// Hygiene/absorbent products.
    #[serde(rename = "hygiene")]
    Hygiene,
    /// Dry recycling.
    #[serde(rename = "recycling")]
    Recycling,
}

impl CollectionKind {
    /// Every category, in the order the council lists them.
    pub const ALL: [Self; 7] = [
        Self::ChristmasTree,
        Self::Garden,
        Self::General,
        Self::Glass,
        Self::Food,
        Self::Hygiene,
        Self::Recycling,
    ];

    /// Stable slug used for option keys, unique ids, and the council API.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::ChristmasTree => "christmas tree",
            Self::Food => "food",
            Self::Garden => "garden",
            Self::General => "general",
            Self::Glass => "glass",
            Self::Hygiene => "hygiene",
            Self::Recycling => "recycling",
        }
    }

    /// Parse a slug back into a category.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    /// Whether sensors for this category are created by default.
    ///
    /// Glass and hygiene rounds only run for opted-in households, so they
    /// start disabled.
    #[must_use]
    pub fn default_enabled(self) -> bool {
        !matches!(self, Self::Glass | Self::Hygiene)
    }

    /// Human-friendly sensor name for this category.
    #[must_use]
    pub fn display_name(self) -> String {
        let title = title_case(self.slug());
        if matches!(self, Self::Recycling) {
            format!("{title} Collection")
        } else {
            format!("{title} Waste Collection")
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.slug())
    }
}

fn title_case(slug: &str) -> String {
    slug.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Unique Property Reference Number identifying an address.
///
/// Deliberately has no [`fmt::Display`] impl; call [`Uprn::redacted`] before
/// putting one in a log line.
pub struct Uprn(String);

impl Uprn {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new<S: Into<String>>(raw: S) -> Self {
        Self(raw.into())
    }

    /// Raw identifier, for requests to the council API.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier with all but the last four characters masked, safe to log.
    #[must_use]
    pub fn redacted(&self) -> String {
        redact_uprn(&self.0)
    }
}

impl From<&str> for Uprn {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Scheduled pickup for a single category.
pub struct CollectionRecord {
    /// Category this record belongs to.
    pub kind: CollectionKind,
    /// Next collection date.
    pub date: NaiveDate,
    /// Council wording for the round, e.g. "Food Waste".
    pub type_label: String,
    /// URL of the council's bin image for the round.
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Complete set of upcoming collections as of one refresh.
///
/// Replaced wholesale on every successful refresh; categories the council did
/// not return are simply absent.
pub struct CollectionsSnapshot {
    collections: HashMap<CollectionKind, CollectionRecord>,
}

impl CollectionsSnapshot {
    /// Build a snapshot from a list of records. Later records win on
    /// duplicate categories.
    #[must_use]
    pub fn from_records(records: Vec<CollectionRecord>) -> Self {
        let collections = records
            .into_iter()
            .map(|record| (record.kind, record))
            .collect();
        Self { collections }
    }

    /// Record for a category, if the council returned one.
    #[must_use]
    pub fn record(&self, kind: CollectionKind) -> Option<&CollectionRecord> {
        self.collections.get(&kind)
    }

    /// Whether the snapshot holds any records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Number of categories with a scheduled collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Iterator over all records.
    pub fn records(&self) -> impl Iterator<Item = &CollectionRecord> {
        self.collections.values()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Address candidate returned by a postcode search.
pub struct AddressMatch {
    /// Identifier the council uses for the address.
    pub uprn: Uprn,
    /// Full display label, e.g. "12 Working Street, Cardiff, CF10 1AA".
    pub label: String,
}

impl AddressMatch {
    /// Short title for a config entry: the label up to the first comma.
    #[must_use]
    pub fn short_title(&self) -> &str {
        self.label.split(',').next().unwrap_or(&self.label).trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_round_trips() {
        for kind in CollectionKind::ALL {
            assert_eq!(
                CollectionKind::from_slug(kind.slug()),
                Some(kind),
                "slug {} must parse back",
                kind.slug()
            );
        }
        assert_eq!(CollectionKind::from_slug("cardboard"), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(
            CollectionKind::General.display_name(),
            "General Waste Collection"
        );
        assert_eq!(
            CollectionKind::ChristmasTree.display_name(),
            "Christmas Tree Waste Collection"
        );
        assert_eq!(
            CollectionKind::Recycling.display_name(),
            "Recycling Collection"
        );
    }

    #[test]
    fn defaults_disable_optin_rounds() {
        assert!(!CollectionKind::Glass.default_enabled());
        assert!(!CollectionKind::Hygiene.default_enabled());
        assert!(CollectionKind::General.default_enabled());
        assert!(CollectionKind::Recycling.default_enabled());
    }

    #[test]
    fn snapshot_keeps_last_record_per_kind() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date");
        let later = NaiveDate::from_ymd_opt(2024, 3, 11).expect("valid date");
        let snapshot = CollectionsSnapshot::from_records(vec![
            CollectionRecord {
                kind: CollectionKind::Food,
                date,
                type_label: "Food Waste".to_owned(),
                image_url: String::new(),
            },
            CollectionRecord {
                kind: CollectionKind::Food,
                date: later,
                type_label: "Food Waste".to_owned(),
                image_url: String::new(),
            },
        ]);
        assert_eq!(snapshot.len(), 1);
        let record = snapshot.record(CollectionKind::Food).expect("food present");
        assert_eq!(record.date, later);
    }

    #[test]
    fn short_title_takes_first_segment() {
        let address = AddressMatch {
            uprn: Uprn::new("100100123456"),
            label: "12 Working Street, Cardiff, CF10 1AA".to_owned(),
        };
        assert_eq!(address.short_title(), "12 Working Street");
    }
}
