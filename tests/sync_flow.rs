//! End-to-end tests of the sync flow against an in-process catalog store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use shopsync::sync::{KEY_CATEGORIES, KEY_PRODUCTS, KEY_VERSION};
use shopsync::{
    ApiError, CatalogRemote, CatalogService, Category, CipherCodec, KvStore, Product, SyncEngine,
    SyncOutcome,
};

/// Delegates to a shared `CatalogService` while counting calls, so tests
/// can assert how much network traffic an activation produced.
#[derive(Clone)]
struct CountingRemote {
    service: Arc<CatalogService>,
    version_calls: Arc<AtomicUsize>,
    catalog_calls: Arc<AtomicUsize>,
}

impl CountingRemote {
    fn new(service: Arc<CatalogService>) -> Self {
        Self {
            service,
            version_calls: Arc::new(AtomicUsize::new(0)),
            catalog_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn version_calls(&self) -> usize {
        self.version_calls.load(Ordering::SeqCst)
    }

    fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }
}

impl CatalogRemote for CountingRemote {
    async fn version(&self) -> Result<String, ApiError> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        self.service.version().await
    }

    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.service.products().await
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.service.categories().await
    }
}

fn category(id: &str) -> Category {
    Category {
        id: id.into(),
        name: id.to_uppercase(),
        description: None,
        product_ids: Vec::new(),
    }
}

fn product(id: &str, category: &str) -> Product {
    Product {
        id: id.into(),
        name: format!("Product {}", id),
        description: None,
        price: 25.0,
        category: category.into(),
        image_url: None,
    }
}

async fn seeded_service() -> Arc<CatalogService> {
    let service = Arc::new(CatalogService::new());
    service.create_category(category("c1")).await.unwrap();
    service.create_product(product("p1", "c1")).await.unwrap();
    service
}

struct Fixture {
    _dir: tempfile::TempDir,
    store: KvStore,
    codec: CipherCodec,
    remote: CountingRemote,
    service: Arc<CatalogService>,
}

impl Fixture {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path().to_path_buf()).await.unwrap();
        let codec = CipherCodec::new([5u8; 32]);
        let service = seeded_service().await;
        let remote = CountingRemote::new(Arc::clone(&service));
        Self {
            _dir: dir,
            store,
            codec,
            remote,
            service,
        }
    }

    fn engine(&self) -> SyncEngine<CountingRemote> {
        SyncEngine::new(self.remote.clone(), self.store.clone(), self.codec.clone())
    }

    async fn authority_token(&self) -> String {
        self.service.authority().current().await.version
    }
}

#[tokio::test]
async fn test_cold_start_fetches_and_persists() {
    let fx = Fixture::new().await;
    let engine = fx.engine();

    assert_eq!(engine.sync().await, SyncOutcome::Refreshed);
    assert_eq!(fx.remote.version_calls(), 1);
    assert_eq!(fx.remote.catalog_calls(), 2);

    let state = engine.state().await;
    assert_eq!(state.products.len(), 1);
    assert_eq!(state.categories.len(), 1);
    assert!(!state.loading);
    assert_eq!(state.last_error, None);

    engine.wait_for_persist().await;
    assert_eq!(
        fx.store.get(KEY_VERSION).await.unwrap(),
        Some(fx.authority_token().await)
    );
    // Catalog entries are stored encrypted, not as plain JSON.
    let raw = fx.store.get(KEY_PRODUCTS).await.unwrap().unwrap();
    assert!(serde_json::from_str::<Vec<Product>>(&raw).is_err());
    assert!(fx.codec.decode::<Vec<Product>>(&raw).is_some());
}

#[tokio::test]
async fn test_matching_token_short_circuits_catalog_fetch() {
    let fx = Fixture::new().await;
    let engine = fx.engine();

    assert_eq!(engine.sync().await, SyncOutcome::Refreshed);
    engine.wait_for_persist().await;

    assert_eq!(engine.sync().await, SyncOutcome::UpToDate);
    // One more authority check, zero further catalog fetches.
    assert_eq!(fx.remote.version_calls(), 2);
    assert_eq!(fx.remote.catalog_calls(), 2);
}

#[tokio::test]
async fn test_next_session_serves_from_cache_without_refetch() {
    let fx = Fixture::new().await;
    let first = fx.engine();
    assert_eq!(first.sync().await, SyncOutcome::Refreshed);
    first.wait_for_persist().await;

    // A fresh engine over the same store: local load plus one version
    // check, no catalog traffic.
    let second = fx.engine();
    assert_eq!(second.sync().await, SyncOutcome::UpToDate);
    assert_eq!(fx.remote.catalog_calls(), 2);

    let state = second.state().await;
    assert_eq!(state.products.len(), 1);
    assert_eq!(state.categories.len(), 1);
}

#[tokio::test]
async fn test_mutation_invalidates_and_forces_refetch() {
    let fx = Fixture::new().await;
    let engine = fx.engine();
    assert_eq!(engine.sync().await, SyncOutcome::Refreshed);
    engine.wait_for_persist().await;
    let old_token = fx.authority_token().await;

    fx.service
        .create_product(product("p2", "c1"))
        .await
        .unwrap();
    let new_token = fx.authority_token().await;
    assert_ne!(old_token, new_token);

    assert_eq!(engine.sync().await, SyncOutcome::Refreshed);
    assert_eq!(engine.state().await.products.len(), 2);

    engine.wait_for_persist().await;
    assert_eq!(fx.store.get(KEY_VERSION).await.unwrap(), Some(new_token));
}

#[tokio::test]
async fn test_concurrent_activations_run_once() {
    let fx = Fixture::new().await;
    let engine = fx.engine();

    let (a, b) = tokio::join!(engine.sync(), engine.sync());
    let outcomes = [a, b];
    assert!(outcomes.contains(&SyncOutcome::Refreshed));
    assert!(outcomes.contains(&SyncOutcome::Skipped));

    engine.wait_for_persist().await;
    assert_eq!(fx.remote.version_calls(), 1);
    assert_eq!(fx.remote.catalog_calls(), 2);
}

#[tokio::test]
async fn test_corrupted_cache_entries_force_refetch() {
    let fx = Fixture::new().await;

    // A matching token beside undecodable catalog entries must not short
    // circuit; the corrupted data reads as a miss.
    fx.store
        .set(KEY_VERSION, fx.authority_token().await, None)
        .await
        .unwrap();
    fx.store
        .set(KEY_PRODUCTS, "garbage-ciphertext".into(), None)
        .await
        .unwrap();
    fx.store
        .set(KEY_CATEGORIES, "more-garbage".into(), None)
        .await
        .unwrap();

    let engine = fx.engine();
    assert_eq!(engine.sync().await, SyncOutcome::Refreshed);
    assert_eq!(fx.remote.catalog_calls(), 2);
    assert_eq!(engine.state().await.products.len(), 1);
}

#[tokio::test]
async fn test_key_mismatch_reads_as_cold_cache() {
    let fx = Fixture::new().await;
    let engine = fx.engine();
    assert_eq!(engine.sync().await, SyncOutcome::Refreshed);
    engine.wait_for_persist().await;

    // Same store, different key: everything decodes to None and the
    // engine refetches instead of erroring.
    let other = SyncEngine::new(
        fx.remote.clone(),
        fx.store.clone(),
        CipherCodec::new([99u8; 32]),
    );
    assert_eq!(other.sync().await, SyncOutcome::Refreshed);
    other.wait_for_persist().await;
    assert_eq!(other.state().await.products.len(), 1);
}

#[tokio::test]
async fn test_clear_local_forces_full_refetch_next_activation() {
    let fx = Fixture::new().await;
    let engine = fx.engine();
    assert_eq!(engine.sync().await, SyncOutcome::Refreshed);
    engine.wait_for_persist().await;

    engine.clear_local().await.unwrap();
    assert_eq!(fx.store.get(KEY_VERSION).await.unwrap(), None);

    assert_eq!(engine.sync().await, SyncOutcome::Refreshed);
    engine.wait_for_persist().await;
    assert_eq!(fx.remote.catalog_calls(), 4);
}
