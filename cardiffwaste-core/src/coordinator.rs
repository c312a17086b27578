//! Shared polling coordinator that caches collection data for one property.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::model::{CollectionsSnapshot, Uprn};
use crate::ports::{ClientError, WasteClient};

/// Minimum time between two council fetches for the same property.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Default)]
/// What subscribers see: the last complete snapshot plus freshness flags.
pub struct CoordinatorState {
    /// Last successfully fetched snapshot, shared without copying.
    pub snapshot: Option<Arc<CollectionsSnapshot>>,
    /// Set when the most recent fetch failed; the snapshot is then the
    /// last-known data rather than current.
    pub stale: bool,
    /// When the snapshot was last replaced.
    pub last_success: Option<DateTime<Utc>>,
}

impl CoordinatorState {
    /// Whether any snapshot has ever been fetched.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.snapshot.is_some()
    }
}

#[derive(Debug, Default)]
struct RefreshGate {
    last_attempt: Option<Instant>,
}

/// Owns the client handle for one property and fans cached snapshots out to
/// sensors over a watch channel.
///
/// Snapshot replacement is atomic: the whole [`CoordinatorState`] is swapped
/// in one `watch` send, so a subscriber borrows either the previous or the
/// new complete state.
pub struct CollectionsCoordinator {
    client: Arc<dyn WasteClient>,
    uprn: Uprn,
    min_interval: Duration,
    gate: Mutex<RefreshGate>,
    state_tx: watch::Sender<CoordinatorState>,
}

impl CollectionsCoordinator {
    /// Create a coordinator with the default hourly refresh interval.
    #[must_use]
    pub fn new(client: Arc<dyn WasteClient>, uprn: Uprn) -> Self {
        Self::with_min_interval(client, uprn, DEFAULT_REFRESH_INTERVAL)
    }

    /// Create a coordinator with a custom minimum refresh interval.
    #[must_use]
    pub fn with_min_interval(
        client: Arc<dyn WasteClient>,
        uprn: Uprn,
        min_interval: Duration,
    ) -> Self {
        let (state_tx, _state_rx) = watch::channel(CoordinatorState::default());
        Self {
            client,
            uprn,
            min_interval,
            gate: Mutex::new(RefreshGate::default()),
            state_tx,
        }
    }

    /// Property this coordinator refreshes.
    #[must_use]
    pub fn uprn(&self) -> &Uprn {
        &self.uprn
    }

    /// Subscribe to state replacements.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state_tx.subscribe()
    }

    /// Current state, cloned out of the channel.
    #[must_use]
    pub fn state(&self) -> CoordinatorState {
        self.state_tx.borrow().clone()
    }

    /// Fetch the latest snapshot and notify subscribers.
    ///
    /// Refreshes are serialized by an internal lock; a second caller waits
    /// for the in-flight fetch and, unless `force` is set, is then coalesced
    /// away by the rate limit. On failure the previous snapshot is kept and
    /// the state is marked stale.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from the fetch. The refresh schedule is
    /// unaffected; a later call may succeed and clear the stale flag.
    pub async fn refresh(&self, force: bool) -> Result<(), ClientError> {
        let mut gate = self.gate.lock().await;

        if !force
            && let Some(last) = gate.last_attempt
            && last.elapsed() < self.min_interval
        {
            debug!(
                uprn = %self.uprn.redacted(),
                "refresh throttled, keeping cached snapshot"
            );
            return Ok(());
        }
        gate.last_attempt = Some(Instant::now());

        debug!(uprn = %self.uprn.redacted(), "fetching collections");
        match self.client.next_collections(&self.uprn).await {
            Ok(snapshot) => {
                self.state_tx.send_replace(CoordinatorState {
                    snapshot: Some(Arc::new(snapshot)),
                    stale: false,
                    last_success: Some(Utc::now()),
                });
                Ok(())
            }
            Err(err) => {
                warn!(
                    uprn = %self.uprn.redacted(),
                    error = %err,
                    "fetch failed, marking cached snapshot stale"
                );
                self.state_tx.send_modify(|state| state.stale = true);
                Err(err)
            }
        }
    }

    /// Spawn the periodic refresh task.
    ///
    /// The first tick is skipped because setup performs a forced refresh
    /// before spawning. Fetch failures are logged and the loop keeps going;
    /// the task runs until aborted on entry unload.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(coordinator.min_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = coordinator.refresh(false).await {
                    debug!(
                        uprn = %coordinator.uprn.redacted(),
                        error = %err,
                        "scheduled refresh failed"
                    );
                }
            }
        })
    }
}
