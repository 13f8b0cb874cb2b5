//! shopsync - client-side catalog sync and cache layer.
//!
//! Keeps a browsing client's local copy of a catalog (products and
//! categories) consistent with a remote authoritative store while
//! minimizing redundant fetches and surviving intermittent connectivity.
//!
//! The moving parts, leaf first:
//!
//! - [`cache::KvStore`]: durable async key-value store with per-entry
//!   optional expiry and lazy eviction
//! - [`cache::CipherCodec`]: encrypts values into opaque cache strings;
//!   decode failures read as cache misses
//! - [`server::VersionAuthority`] / [`server::CatalogService`]: the
//!   server-held version token and the mutation layer that regenerates it
//!   after every committed write
//! - [`sync::SyncEngine`]: the four-phase orchestrator - local load,
//!   version check, conditional refetch, fire-and-forget persist
//!
//! ```no_run
//! use shopsync::{ApiClient, Config, KvStore, SyncEngine};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let store = KvStore::open(config.cache_dir()?).await?;
//! let remote = ApiClient::new("https://shop.example.com/api")?;
//! let engine = SyncEngine::new(remote, store, config.codec()?);
//!
//! engine.sync().await;
//! let catalog = engine.state().await;
//! println!("{} products", catalog.products.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod server;
pub mod sync;

pub use api::{ApiClient, ApiError, CatalogRemote};
pub use cache::{CipherCodec, KvStore};
pub use config::Config;
pub use models::{Category, Product};
pub use server::{CatalogService, MutationError, VersionAuthority, VersionStamp};
pub use sync::{CatalogState, SyncEngine, SyncOutcome};
