//! Trait describing the council client and its shared error type.

use async_trait::async_trait;
use chrono::ParseError as ChronoParseError;
use reqwest::Error as ReqwestError;

use crate::model::{AddressMatch, CollectionsSnapshot, Uprn};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the council backend.
pub enum ClientError {
    /// The backend did not answer within the request deadline.
    #[error("Request timed out")]
    Timeout,
    /// A postcode search returned no addresses.
    #[error("No matching addresses")]
    EmptyMatches,
    /// The property identifier is not known to the backend.
    #[error("Invalid UPRN")]
    InvalidUprn,
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Failed to parse a date from the backend response.
    #[error("Parse error: {0}")]
    Parse(#[from] ChronoParseError),
    /// Anything the other variants do not cover.
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

#[async_trait]
/// Client surface consumed by the coordinator and the configuration wizard.
pub trait WasteClient: Send + Sync {
    /// Check that the backend recognises the property identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the lookup itself fails; an unknown but
    /// well-formed identifier yields `Ok(false)`.
    async fn check_valid_uprn(&self, uprn: &Uprn) -> Result<bool, ClientError>;

    /// Fetch the upcoming collections for a property.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the backend request fails or rejects
    /// the identifier.
    async fn next_collections(&self, uprn: &Uprn) -> Result<CollectionsSnapshot, ClientError>;

    /// Search for addresses matching a postcode.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyMatches`] when the postcode yields no
    /// addresses, [`ClientError::Timeout`] when the backend does not answer,
    /// and other variants for transport failures.
    async fn address_search(&self, postcode: &str) -> Result<Vec<AddressMatch>, ClientError>;
}
