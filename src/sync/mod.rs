//! The four-phase catalog sync orchestrator.
//!
//! `SyncEngine` keeps the in-memory catalog consistent with the remote
//! store: optimistic local load, version check against the authority,
//! conditional refetch, and a fire-and-forget write-back. Failures never
//! escape; they degrade to whatever data is already in memory.

pub mod engine;

pub use engine::{CatalogState, SyncEngine, SyncOutcome};
pub use engine::{KEY_CATEGORIES, KEY_PRODUCTS, KEY_VERSION};
