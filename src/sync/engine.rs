//! The sync engine state machine.
//!
//! One activation walks up to four phases:
//!
//! 1. **Local load** - read both catalog pieces from the store in parallel
//!    and expose whatever decodes, stale or not. Favors perceived
//!    responsiveness over correctness.
//! 2. **Version check** - compare the remembered token against the
//!    authority. Equal tokens with complete local data end the flow here:
//!    at most one cheap request when nothing has changed.
//! 3. **Refetch** - on mismatch, missing token, or missing local data,
//!    fetch both pieces fresh in parallel and replace the in-memory
//!    snapshot wholesale.
//! 4. **Persist** - spawned write-back of the fresh pieces and the new
//!    token; the visible flow never waits for it.
//!
//! A single in-flight flag owned by the engine instance guards the whole
//! sequence; a second concurrent activation observes it and returns
//! [`SyncOutcome::Skipped`] without doing any work. Without the guard two
//! overlapping refetches could interleave their store writes in
//! unspecified order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::CatalogRemote;
use crate::cache::{CipherCodec, KvStore};
use crate::models::{Category, Product};

/// Store key for the encrypted product list.
pub const KEY_PRODUCTS: &str = "products";
/// Store key for the encrypted category list.
pub const KEY_CATEGORIES: &str = "categories";
/// Store key for the plain-text last-observed version token.
pub const KEY_VERSION: &str = "cache_version";

/// The in-memory catalog snapshot the host application reads.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    /// True while an activation is still working toward first data.
    pub loading: bool,
    /// Most recent degradation reason, cleared on a successful pass.
    pub last_error: Option<String>,
}

/// How an activation ended. There is no failure variant: failures degrade
/// to stale-or-empty in-memory data and surface through `last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another activation was already in flight; nothing was done.
    Skipped,
    /// Local token matched the authority; no catalog fetch was needed.
    UpToDate,
    /// Fresh catalog data was fetched and is being written back.
    Refreshed,
    /// A network failure left the session on stale-or-empty data.
    Degraded,
}

enum PassResult {
    UpToDate,
    Degraded,
    Refreshed {
        products: Vec<Product>,
        categories: Vec<Category>,
        token: String,
    },
}

/// The four-phase sync orchestrator. Generic over the remote boundary so
/// it runs identically against HTTP and in-process stores.
pub struct SyncEngine<R> {
    remote: R,
    store: KvStore,
    codec: CipherCodec,
    state: RwLock<CatalogState>,
    in_flight: Arc<AtomicBool>,
    persist_task: Mutex<Option<JoinHandle<()>>>,
}

impl<R: CatalogRemote> SyncEngine<R> {
    pub fn new(remote: R, store: KvStore, codec: CipherCodec) -> Self {
        Self {
            remote,
            store,
            codec,
            state: RwLock::new(CatalogState::default()),
            in_flight: Arc::new(AtomicBool::new(false)),
            persist_task: Mutex::new(None),
        }
    }

    /// Snapshot of the current in-memory catalog state.
    pub async fn state(&self) -> CatalogState {
        self.state.read().await.clone()
    }

    /// Whether an activation (including its write-back) is in flight.
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one activation of the four-phase flow.
    pub async fn sync(&self) -> SyncOutcome {
        // Re-entrancy guard: the loser of this exchange does no work at
        // all. Not a queue, not a cancellation.
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Sync already in flight, skipping activation");
            return SyncOutcome::Skipped;
        }

        self.state.write().await.loading = true;

        match self.run_phases().await {
            PassResult::UpToDate => {
                self.in_flight.store(false, Ordering::Release);
                SyncOutcome::UpToDate
            }
            PassResult::Degraded => {
                self.in_flight.store(false, Ordering::Release);
                SyncOutcome::Degraded
            }
            PassResult::Refreshed {
                products,
                categories,
                token,
            } => {
                // Phase 4 owns the guard from here; it releases the flag
                // once the write-back settles.
                self.spawn_persist(products, categories, token).await;
                SyncOutcome::Refreshed
            }
        }
    }

    async fn run_phases(&self) -> PassResult {
        // Phase 1: optimistic local load, both pieces in parallel.
        let (local_products, local_categories) = tokio::join!(
            self.load_local::<Vec<Product>>(KEY_PRODUCTS),
            self.load_local::<Vec<Category>>(KEY_CATEGORIES),
        );
        // A lone half of the snapshot is shown for responsiveness but does
        // not count as usable local data for the short-circuit below.
        let have_local = local_products.is_some() && local_categories.is_some();
        if local_products.is_some() || local_categories.is_some() {
            let mut state = self.state.write().await;
            if let Some(products) = local_products {
                state.products = products;
            }
            if let Some(categories) = local_categories {
                state.categories = categories;
            }
            state.loading = false;
            debug!(
                products = state.products.len(),
                categories = state.categories.len(),
                "Exposed locally cached catalog"
            );
        }

        // Phase 2: version check. Never skipped ahead of a refetch; this
        // is the cost-avoidance path that keeps a no-change activation at
        // a single cheap request.
        let local_token = match self.store.get(KEY_VERSION).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read local version token");
                None
            }
        };
        let remote_token = match self.remote.version().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Version check failed, serving local data");
                return self.degrade(format!("version check failed: {}", e)).await;
            }
        };

        if have_local && local_token.as_deref() == Some(remote_token.as_str()) {
            debug!(version = %remote_token, "Catalog is current, no fetch needed");
            let mut state = self.state.write().await;
            state.loading = false;
            state.last_error = None;
            return PassResult::UpToDate;
        }

        // Phase 3: refetch both pieces in parallel. The snapshot is
        // replaced wholesale, so a half-failed fetch updates nothing.
        let (products, categories) =
            match tokio::join!(self.remote.products(), self.remote.categories()) {
                (Ok(products), Ok(categories)) => (products, categories),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(error = %e, "Catalog refetch failed, serving local data");
                    return self.degrade(format!("catalog refetch failed: {}", e)).await;
                }
            };

        {
            let mut state = self.state.write().await;
            state.products = products.clone();
            state.categories = categories.clone();
            state.loading = false;
            state.last_error = None;
        }
        debug!(
            version = %remote_token,
            products = products.len(),
            categories = categories.len(),
            "Catalog refreshed from remote"
        );

        PassResult::Refreshed {
            products,
            categories,
            token: remote_token,
        }
    }

    /// Read and decode one catalog piece. Store errors and decode failures
    /// both read as a cache miss.
    async fn load_local<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(raw)) => {
                let decoded = self.codec.decode(&raw);
                if decoded.is_none() {
                    debug!(key, "Cached entry failed to decode, treating as miss");
                }
                decoded
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read cache entry");
                None
            }
        }
    }

    async fn degrade(&self, reason: String) -> PassResult {
        let mut state = self.state.write().await;
        state.loading = false;
        state.last_error = Some(reason);
        PassResult::Degraded
    }

    /// Phase 4: fire-and-forget write-back. The caller-visible flow never
    /// awaits this; a failure costs future cache hits, not this session's
    /// correctness.
    async fn spawn_persist(&self, products: Vec<Product>, categories: Vec<Category>, token: String) {
        let store = self.store.clone();
        let codec = self.codec.clone();
        let in_flight = Arc::clone(&self.in_flight);

        let handle = tokio::spawn(async move {
            if let Err(e) = persist(&store, &codec, &products, &categories, &token).await {
                warn!(error = %e, "Cache write-back failed");
            }
            in_flight.store(false, Ordering::Release);
        });

        *self.persist_task.lock().await = Some(handle);
    }

    /// Wait for an outstanding write-back to settle. Shutdown and test
    /// hook; normal operation never calls this.
    pub async fn wait_for_persist(&self) {
        let handle = self.persist_task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Persist task failed");
            }
        }
    }

    /// Drop every locally cached entry. Used on logout.
    pub async fn clear_local(&self) -> Result<()> {
        self.store.clear().await
    }
}

/// Catalog pieces first, token last: a mid-sequence failure leaves the old
/// token beside possibly-new data, which only costs a refetch next session.
/// The inverse (new token beside old data) cannot be produced this way.
async fn persist(
    store: &KvStore,
    codec: &CipherCodec,
    products: &[Product],
    categories: &[Category],
    token: &str,
) -> Result<()> {
    store.set(KEY_PRODUCTS, codec.encode(&products)?, None).await?;
    store
        .set(KEY_CATEGORIES, codec.encode(&categories)?, None)
        .await?;
    store.set(KEY_VERSION, token.to_string(), None).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
