//! Core types and service wiring for the cardiffwaste collection tracker.

/// Shared polling coordinator caching collection data per property.
pub mod coordinator;
/// Diagnostics export with identifier redaction.
pub mod diagnostics;
/// Config entries and per-category options.
pub mod entry;
/// Configuration wizard and options form.
pub mod flow;
/// Scriptable client for tests and the demo mode.
pub mod mock;
/// Domain models and identifiers.
pub mod model;
/// Trait describing the council client.
pub mod ports;
/// Masking of property identifiers for logging.
pub mod redact;
/// Sensor entities derived from cached snapshots.
pub mod sensor;
/// High-level service facade owning the per-entry state map.
pub mod service;
/// JSON persistence for config entries.
pub mod storage;

pub use coordinator::*;
pub use diagnostics::*;
pub use entry::*;
pub use flow::*;
pub use model::*;
pub use ports::*;
pub use redact::*;
pub use sensor::*;
pub use service::*;
pub use storage::*;
