//! Top-level service owning the per-entry runtime state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::coordinator::{CollectionsCoordinator, CoordinatorState, DEFAULT_REFRESH_INTERVAL};
use crate::diagnostics::entry_diagnostics;
use crate::entry::{CollectionOptions, ConfigEntry};
use crate::flow::ConfigWizard;
use crate::ports::{ClientError, WasteClient};
use crate::sensor::{CollectionSensor, SensorView, sensors_for_entry};
use crate::storage::{EntryStore, StorageError};

#[derive(thiserror::Error, Debug)]
/// Errors surfaced by the service layer.
pub enum ServiceError {
    /// The property already has a configured entry.
    #[error("Property already configured")]
    DuplicateUprn,
    /// No entry with that id is loaded.
    #[error("Unknown entry: {0}")]
    UnknownEntry(String),
    /// The council client failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// Persisting or loading entries failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Serialising diagnostics failed.
    #[error("Diagnostics encode error: {0}")]
    Diagnostics(#[from] serde_json::Error),
}

/// Everything kept alive for one loaded entry.
struct ManagedEntry {
    entry: ConfigEntry,
    coordinator: Arc<CollectionsCoordinator>,
    refresh_task: JoinHandle<()>,
    sensors: Vec<CollectionSensor>,
}

impl Drop for ManagedEntry {
    fn drop(&mut self) {
        self.refresh_task.abort();
    }
}

/// Application context: one client, one state map keyed by entry id.
///
/// Entries move through `add → (update options | reload)* → remove`; each
/// loaded entry owns a coordinator, its hourly refresh task, and the sensor
/// set for the enabled categories.
pub struct WasteService {
    client: Arc<dyn WasteClient>,
    store: Option<EntryStore>,
    refresh_interval: Duration,
    entries: Mutex<HashMap<String, ManagedEntry>>,
}

impl WasteService {
    /// Create a service. Entries are persisted through `store` when given.
    #[must_use]
    pub fn new(client: Arc<dyn WasteClient>, store: Option<EntryStore>) -> Self {
        Self {
            client,
            store,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Override the refresh interval, mostly useful in tests.
    #[must_use]
    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// Start a configuration wizard bound to this service's client.
    #[must_use]
    pub fn create_wizard(&self) -> ConfigWizard {
        ConfigWizard::new(Arc::clone(&self.client))
    }

    /// Load persisted entries and set each of them up.
    ///
    /// A failing first refresh does not prevent the entry from loading; its
    /// state is simply stale until a later cycle succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError::Storage`] when the store cannot be read.
    pub async fn restore(&self) -> Result<usize, ServiceError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let persisted = store.load()?;
        let count = persisted.len();
        let mut entries = self.entries.lock().await;
        for entry in persisted {
            let managed = self.setup(entry).await;
            entries.insert(managed.entry.entry_id.clone(), managed);
        }
        info!(count, "restored config entries");
        Ok(count)
    }

    /// Register a freshly created entry and set it up.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::DuplicateUprn`] when the property already has
    /// an entry, or a [`ServiceError::Storage`] when persisting fails.
    pub async fn add_entry(&self, entry: ConfigEntry) -> Result<(), ServiceError> {
        let mut entries = self.entries.lock().await;
        if entries
            .values()
            .any(|managed| managed.entry.uprn == entry.uprn)
        {
            return Err(ServiceError::DuplicateUprn);
        }
        info!(
            title = %entry.title,
            uprn = %entry.uprn.redacted(),
            "adding config entry"
        );
        let managed = self.setup(entry).await;
        entries.insert(managed.entry.entry_id.clone(), managed);
        self.persist(&entries)?;
        Ok(())
    }

    /// Unload an entry and remove it from persistence.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownEntry`] for an unknown id, or a
    /// [`ServiceError::Storage`] when persisting the removal fails.
    pub async fn remove_entry(&self, entry_id: &str) -> Result<ConfigEntry, ServiceError> {
        let mut entries = self.entries.lock().await;
        let managed = entries
            .remove(entry_id)
            .ok_or_else(|| ServiceError::UnknownEntry(entry_id.to_owned()))?;
        info!(
            title = %managed.entry.title,
            uprn = %managed.entry.uprn.redacted(),
            "removed config entry"
        );
        self.persist(&entries)?;
        Ok(managed.entry.clone())
    }

    /// Replace an entry's options wholesale, persist, and reload.
    ///
    /// The reload rebuilds the sensor set: categories that were just
    /// disabled lose their sensor, newly enabled ones gain one.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownEntry`] for an unknown id, or a
    /// [`ServiceError::Storage`] when persisting fails.
    pub async fn update_options(
        &self,
        entry_id: &str,
        options: CollectionOptions,
    ) -> Result<(), ServiceError> {
        let mut entries = self.entries.lock().await;
        let managed = entries
            .remove(entry_id)
            .ok_or_else(|| ServiceError::UnknownEntry(entry_id.to_owned()))?;
        let mut entry = managed.entry.clone();
        // Dropping the old state aborts its refresh task.
        drop(managed);
        entry.options = options;
        debug!(
            uprn = %entry.uprn.redacted(),
            "options replaced, reloading entry"
        );
        let rebuilt = self.setup(entry).await;
        entries.insert(rebuilt.entry.entry_id.clone(), rebuilt);
        self.persist(&entries)?;
        Ok(())
    }

    /// Unload an entry's runtime state and set it up again.
    ///
    /// Identity is preserved: the rebuilt entry keeps its id, title,
    /// options, and creation time. The coordinator, refresh task, and sensor
    /// set are recreated from scratch, with a forced first refresh.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownEntry`] for an unknown id.
    pub async fn reload_entry(&self, entry_id: &str) -> Result<(), ServiceError> {
        let mut entries = self.entries.lock().await;
        let managed = entries
            .remove(entry_id)
            .ok_or_else(|| ServiceError::UnknownEntry(entry_id.to_owned()))?;
        let entry = managed.entry.clone();
        // Dropping the old state aborts its refresh task.
        drop(managed);
        debug!(uprn = %entry.uprn.redacted(), "reloading config entry");
        let rebuilt = self.setup(entry).await;
        entries.insert(rebuilt.entry.entry_id.clone(), rebuilt);
        Ok(())
    }

    /// Refresh one entry's data now.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownEntry`] for an unknown id, or the
    /// client error when the fetch fails. The entry stays loaded either way.
    pub async fn refresh_entry(&self, entry_id: &str, force: bool) -> Result<(), ServiceError> {
        let coordinator = {
            let entries = self.entries.lock().await;
            let managed = entries
                .get(entry_id)
                .ok_or_else(|| ServiceError::UnknownEntry(entry_id.to_owned()))?;
            Arc::clone(&managed.coordinator)
        };
        coordinator.refresh(force).await?;
        Ok(())
    }

    /// All loaded entries, sorted by creation time.
    pub async fn entries(&self) -> Vec<ConfigEntry> {
        let entries = self.entries.lock().await;
        let mut list: Vec<ConfigEntry> = entries
            .values()
            .map(|managed| managed.entry.clone())
            .collect();
        list.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        list
    }

    /// One entry by id.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownEntry`] for an unknown id.
    pub async fn entry(&self, entry_id: &str) -> Result<ConfigEntry, ServiceError> {
        let entries = self.entries.lock().await;
        entries
            .get(entry_id)
            .map(|managed| managed.entry.clone())
            .ok_or_else(|| ServiceError::UnknownEntry(entry_id.to_owned()))
    }

    /// Current coordinator state for an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownEntry`] for an unknown id.
    pub async fn coordinator_state(&self, entry_id: &str) -> Result<CoordinatorState, ServiceError> {
        let entries = self.entries.lock().await;
        entries
            .get(entry_id)
            .map(|managed| managed.coordinator.state())
            .ok_or_else(|| ServiceError::UnknownEntry(entry_id.to_owned()))
    }

    /// Presentation snapshot of every sensor of an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownEntry`] for an unknown id.
    pub async fn sensor_views(&self, entry_id: &str) -> Result<Vec<SensorView>, ServiceError> {
        let entries = self.entries.lock().await;
        let managed = entries
            .get(entry_id)
            .ok_or_else(|| ServiceError::UnknownEntry(entry_id.to_owned()))?;
        Ok(managed
            .sensors
            .iter()
            .map(CollectionSensor::view)
            .collect())
    }

    /// Diagnostics JSON for an entry, identifiers redacted.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownEntry`] for an unknown id, or a
    /// [`ServiceError::Diagnostics`] when serialisation fails.
    pub async fn diagnostics(&self, entry_id: &str) -> Result<Value, ServiceError> {
        let entries = self.entries.lock().await;
        let managed = entries
            .get(entry_id)
            .ok_or_else(|| ServiceError::UnknownEntry(entry_id.to_owned()))?;
        Ok(entry_diagnostics(
            &managed.entry,
            &managed.coordinator.state(),
        )?)
    }

    /// Build the runtime state for one entry: coordinator, first refresh,
    /// hourly task, sensors.
    async fn setup(&self, entry: ConfigEntry) -> ManagedEntry {
        let coordinator = Arc::new(CollectionsCoordinator::with_min_interval(
            Arc::clone(&self.client),
            entry.uprn.clone(),
            self.refresh_interval,
        ));
        if let Err(err) = coordinator.refresh(true).await {
            warn!(
                uprn = %entry.uprn.redacted(),
                error = %err,
                "first refresh failed, entry starts stale"
            );
        }
        let refresh_task = coordinator.spawn();
        let state_rx = coordinator.subscribe();
        let sensors = sensors_for_entry(&entry, &state_rx);
        ManagedEntry {
            entry,
            coordinator,
            refresh_task,
            sensors,
        }
    }

    fn persist(&self, entries: &HashMap<String, ManagedEntry>) -> Result<(), StorageError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let mut list: Vec<ConfigEntry> = entries
            .values()
            .map(|managed| managed.entry.clone())
            .collect();
        list.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        store.save(&list)
    }
}
