//! The remote boundary the sync engine depends on.

use crate::models::{Category, Product};

use super::ApiError;

/// Read access to the authoritative catalog store.
///
/// Implemented by [`ApiClient`](super::ApiClient) for HTTP deployments and
/// by [`CatalogService`](crate::server::CatalogService) for in-process use.
/// Catalog reads return already-normalized vectors; implementations resolve
/// the bare-array-or-wrapped-object question before returning.
pub trait CatalogRemote {
    /// Fetch the current version token from the version authority.
    fn version(&self) -> impl std::future::Future<Output = Result<String, ApiError>> + Send;

    /// Fetch all products.
    fn products(&self) -> impl std::future::Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Fetch all categories.
    fn categories(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Category>, ApiError>> + Send;
}
