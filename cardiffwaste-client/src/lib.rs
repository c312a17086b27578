//! Council client for Cardiff waste collections.
//!
//! Implements the [`WasteClient`] port against the council's address and
//! waste-collection API.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Error as ReqwestError, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use cardiffwaste_core::{
    model::{AddressMatch, CollectionKind, CollectionRecord, CollectionsSnapshot, Uprn},
    ports::{ClientError, WasteClient},
};

const BASE_URL: &str = "https://api.cardiff.gov.uk/WasteManagement/api";
const SYSTEM_REFERENCE: &str = "web";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Response wrapper from /addresses
#[derive(Debug, Deserialize)]
struct AddressSearchResponse {
    #[serde(default)]
    addresses: Vec<AddressEntry>,
}

/// Single address from /addresses
#[derive(Debug, Deserialize)]
struct AddressEntry {
    uprn: String,
    #[serde(rename = "fullAddress")]
    full_address: String,
}

/// Response wrapper from /collections
#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    #[serde(default)]
    collections: Vec<CollectionEntry>,
}

/// Single upcoming round from /collections
#[derive(Debug, Deserialize)]
struct CollectionEntry {
    #[serde(rename = "type")]
    typ: String, // "general", "recycling", ...

    #[serde(rename = "nextCollectionDate")]
    next_collection_date: String, // "YYYY-MM-DD"

    #[serde(rename = "typeDescription", default)]
    description: String,

    #[serde(rename = "imageUrl", default)]
    image_url: String,
}

/// HTTP client for the Cardiff council waste API.
pub struct CardiffWasteClient {
    client: Client,
}

impl CardiffWasteClient {
    /// Create a client bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WasteClient for CardiffWasteClient {
    async fn check_valid_uprn(&self, uprn: &Uprn) -> Result<bool, ClientError> {
        debug!(uprn = %uprn.redacted(), "validating uprn against the council");
        let response = self
            .client
            .get(format!("{BASE_URL}/addresses/{}", uprn.as_str()))
            .query(&[("systemReference", SYSTEM_REFERENCE)])
            .send()
            .await
            .map_err(map_transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response.error_for_status().map_err(map_transport)?;
        Ok(true)
    }

    async fn next_collections(&self, uprn: &Uprn) -> Result<CollectionsSnapshot, ClientError> {
        debug!(uprn = %uprn.redacted(), "fetching next collections");
        let req = self
            .client
            .get(format!("{BASE_URL}/collections"))
            .query(&[
                ("systemReference", SYSTEM_REFERENCE),
                ("uprn", uprn.as_str()),
            ]);

        let response = fetch_json::<CollectionsResponse>(req).await?;
        snapshot_from_entries(response.collections)
    }

    async fn address_search(&self, postcode: &str) -> Result<Vec<AddressMatch>, ClientError> {
        let req = self
            .client
            .get(format!("{BASE_URL}/addresses"))
            .query(&[
                ("systemReference", SYSTEM_REFERENCE),
                ("postcode", postcode),
            ]);

        let response = fetch_json::<AddressSearchResponse>(req).await?;
        if response.addresses.is_empty() {
            return Err(ClientError::EmptyMatches);
        }

        Ok(response
            .addresses
            .into_iter()
            .map(|entry| AddressMatch {
                uprn: Uprn::new(entry.uprn),
                label: entry.full_address,
            })
            .collect())
    }
}

/// Convert council rounds into a snapshot, skipping unknown round types.
fn snapshot_from_entries(
    entries: Vec<CollectionEntry>,
) -> Result<CollectionsSnapshot, ClientError> {
    let mut records = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(kind) = map_collection_type(&entry.typ) else {
            debug!(round = %entry.typ, "skipping unknown collection type");
            continue;
        };

        let date = NaiveDate::parse_from_str(&entry.next_collection_date, DATE_FORMAT)?;

        let type_label = if entry.description.is_empty() {
            kind.display_name()
        } else {
            entry.description
        };

        records.push(CollectionRecord {
            kind,
            date,
            type_label,
            image_url: entry.image_url,
        });
    }

    Ok(CollectionsSnapshot::from_records(records))
}

/// Map the council's round identifiers to collection categories.
fn map_collection_type(raw: &str) -> Option<CollectionKind> {
    let round = raw.trim().to_lowercase();
    match round.as_str() {
        "christmastree" | "christmas tree" | "christmas_tree" => {
            Some(CollectionKind::ChristmasTree)
        }
        "food" => Some(CollectionKind::Food),
        "garden" => Some(CollectionKind::Garden),
        "general" | "residual" => Some(CollectionKind::General),
        "glass" => Some(CollectionKind::Glass),
        "hygiene" => Some(CollectionKind::Hygiene),
        "recycling" => Some(CollectionKind::Recycling),
        _ => None,
    }
}

// Small helper to fetch and decode JSON with status and timeout handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
    req.send()
        .await
        .map_err(map_transport)?
        .error_for_status()
        .map_err(map_transport)?
        .json()
        .await
        .map_err(map_transport)
}

/// Deadline overruns get their own variant so the wizard can tell the user.
fn map_transport(err: ReqwestError) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Network(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_identifiers_map_to_categories() {
        assert_eq!(map_collection_type("general"), Some(CollectionKind::General));
        assert_eq!(
            map_collection_type("Residual"),
            Some(CollectionKind::General)
        );
        assert_eq!(
            map_collection_type("christmasTree"),
            Some(CollectionKind::ChristmasTree)
        );
        assert_eq!(map_collection_type("bulky"), None);
    }

    #[test]
    fn unknown_rounds_are_skipped() {
        let entries = vec![
            CollectionEntry {
                typ: "general".to_owned(),
                next_collection_date: "2024-05-06".to_owned(),
                description: "General Waste".to_owned(),
                image_url: String::new(),
            },
            CollectionEntry {
                typ: "bulky".to_owned(),
                next_collection_date: "2024-05-07".to_owned(),
                description: String::new(),
                image_url: String::new(),
            },
        ];

        let snapshot = snapshot_from_entries(entries).expect("snapshot");
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.record(CollectionKind::General).is_some());
    }

    #[test]
    fn bad_dates_are_parse_errors() {
        let entries = vec![CollectionEntry {
            typ: "food".to_owned(),
            next_collection_date: "06/05/2024".to_owned(),
            description: String::new(),
            image_url: String::new(),
        }];

        assert!(matches!(
            snapshot_from_entries(entries),
            Err(ClientError::Parse(_))
        ));
    }

    #[test]
    fn missing_description_falls_back_to_display_name() {
        let entries = vec![CollectionEntry {
            typ: "recycling".to_owned(),
            next_collection_date: "2024-05-06".to_owned(),
            description: String::new(),
            image_url: String::new(),
        }];

        let snapshot = snapshot_from_entries(entries).expect("snapshot");
        let record = snapshot
            .record(CollectionKind::Recycling)
            .expect("recycling present");
        assert_eq!(record.type_label, "Recycling Collection");
    }

    #[test]
    fn sample_payload_deserialises() {
        let raw = "{\"collections\": [{\"type\": \"garden\", \
                   \"nextCollectionDate\": \"2024-05-06\", \
                   \"typeDescription\": \"Garden Waste\", \
                   \"imageUrl\": \"https://example.invalid/garden.png\"}]}";
        let response: CollectionsResponse = serde_json::from_str(raw).expect("parse");
        assert_eq!(response.collections.len(), 1);
    }
}
