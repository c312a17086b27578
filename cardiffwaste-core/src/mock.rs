//! Scriptable in-memory client for tests and the TUI demo mode.
//!
//! Implements [`WasteClient`] so it can stand in for the real council client
//! anywhere the trait is accepted. Supports canned search results and
//! snapshots, per-operation failure injection, and a fetch counter for
//! throttling assertions.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::{AddressMatch, CollectionsSnapshot, Uprn};
use crate::ports::{ClientError, WasteClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Failure to inject into the next calls of a mock operation.
pub enum MockFailure {
    /// Behave as a request deadline overrun.
    Timeout,
    /// Behave as a search with no results.
    EmptyMatches,
    /// Behave as an unclassified backend failure.
    Unknown,
}

impl MockFailure {
    fn to_error(self) -> ClientError {
        match self {
            Self::Timeout => ClientError::Timeout,
            Self::EmptyMatches => ClientError::EmptyMatches,
            Self::Unknown => ClientError::Unknown("mock failure".to_owned()),
        }
    }
}

#[derive(Debug, Default)]
/// In-memory [`WasteClient`] with scriptable behaviour.
pub struct MockClient {
    matches: RwLock<Vec<AddressMatch>>,
    snapshot: RwLock<CollectionsSnapshot>,
    valid_uprns: RwLock<HashSet<Uprn>>,
    search_failure: RwLock<Option<MockFailure>>,
    fetch_failure: RwLock<Option<MockFailure>>,
    validate_failure: RwLock<Option<MockFailure>>,
    fetch_count: AtomicU32,
}

impl MockClient {
    /// A mock that knows nothing and fails nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the canned search results.
    pub async fn set_matches(&self, matches: Vec<AddressMatch>) {
        for address in &matches {
            self.valid_uprns.write().await.insert(address.uprn.clone());
        }
        *self.matches.write().await = matches;
    }

    /// Replace the canned snapshot returned by fetches.
    pub async fn set_snapshot(&self, snapshot: CollectionsSnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    /// Mark an identifier as valid without listing it in search results.
    pub async fn add_valid_uprn(&self, uprn: Uprn) {
        self.valid_uprns.write().await.insert(uprn);
    }

    /// Mark an identifier as unknown to the backend.
    pub async fn remove_valid_uprn(&self, uprn: &Uprn) {
        self.valid_uprns.write().await.remove(uprn);
    }

    /// Make subsequent searches fail until cleared with `None`.
    pub async fn fail_search(&self, failure: Option<MockFailure>) {
        *self.search_failure.write().await = failure;
    }

    /// Make subsequent fetches fail until cleared with `None`.
    pub async fn fail_fetch(&self, failure: Option<MockFailure>) {
        *self.fetch_failure.write().await = failure;
    }

    /// Make subsequent validations fail until cleared with `None`.
    pub async fn fail_validate(&self, failure: Option<MockFailure>) {
        *self.validate_failure.write().await = failure;
    }

    /// Number of collection fetches performed so far.
    #[must_use]
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WasteClient for MockClient {
    async fn check_valid_uprn(&self, uprn: &Uprn) -> Result<bool, ClientError> {
        if let Some(failure) = *self.validate_failure.read().await {
            return Err(failure.to_error());
        }
        Ok(self.valid_uprns.read().await.contains(uprn))
    }

    async fn next_collections(&self, _uprn: &Uprn) -> Result<CollectionsSnapshot, ClientError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.fetch_failure.read().await {
            return Err(failure.to_error());
        }
        Ok(self.snapshot.read().await.clone())
    }

    async fn address_search(&self, _postcode: &str) -> Result<Vec<AddressMatch>, ClientError> {
        if let Some(failure) = *self.search_failure.read().await {
            return Err(failure.to_error());
        }
        let matches = self.matches.read().await.clone();
        if matches.is_empty() {
            return Err(ClientError::EmptyMatches);
        }
        Ok(matches)
    }
}
