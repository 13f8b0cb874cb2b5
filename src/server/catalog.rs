//! Authoritative catalog store with mutation-triggered invalidation.
//!
//! Mutations validate first, commit second, and invalidate the version
//! authority last. A rejected mutation never advances the token, so a
//! matching client token always implies a catalog that reflects the last
//! committed write.
//!
//! The mutation layer also owns the referential invariants between the two
//! record types: creating a product registers its id with the parent
//! category, deleting one unregisters it, and a category with members
//! cannot be deleted.

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::api::{ApiError, CatalogRemote};
use crate::models::{Category, Product};

use super::VersionAuthority;

#[derive(Error, Debug, PartialEq)]
pub enum MutationError {
    #[error("category not found: {0}")]
    UnknownCategory(String),

    #[error("product not found: {0}")]
    UnknownProduct(String),

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("category {0} still has products")]
    CategoryNotEmpty(String),
}

/// In-process authoritative catalog store.
pub struct CatalogService {
    records: RwLock<Records>,
    authority: VersionAuthority,
}

#[derive(Default)]
struct Records {
    products: Vec<Product>,
    categories: Vec<Category>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Records::default()),
            authority: VersionAuthority::new(),
        }
    }

    /// Seed the store without advancing the version. Setup helper; real
    /// catalog changes go through the mutation operations below.
    pub async fn seed(&self, products: Vec<Product>, categories: Vec<Category>) {
        let mut records = self.records.write().await;
        records.products = products;
        records.categories = categories;
    }

    /// Read access to the version authority.
    pub fn authority(&self) -> &VersionAuthority {
        &self.authority
    }

    pub async fn create_category(&self, category: Category) -> Result<(), MutationError> {
        {
            let mut records = self.records.write().await;
            if records.categories.iter().any(|c| c.id == category.id) {
                return Err(MutationError::DuplicateId(category.id));
            }
            info!(id = %category.id, name = %category.name, "Category created");
            records.categories.push(category);
        }
        self.authority.invalidate().await;
        Ok(())
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), MutationError> {
        {
            let mut records = self.records.write().await;
            let category = records
                .categories
                .iter()
                .find(|c| c.id == id)
                .ok_or_else(|| MutationError::UnknownCategory(id.to_string()))?;
            if !category.product_ids.is_empty() {
                return Err(MutationError::CategoryNotEmpty(id.to_string()));
            }
            records.categories.retain(|c| c.id != id);
            info!(id, "Category deleted");
        }
        self.authority.invalidate().await;
        Ok(())
    }

    pub async fn create_product(&self, product: Product) -> Result<(), MutationError> {
        {
            let mut records = self.records.write().await;
            if records.products.iter().any(|p| p.id == product.id) {
                return Err(MutationError::DuplicateId(product.id));
            }
            let category = records
                .categories
                .iter_mut()
                .find(|c| c.id == product.category)
                .ok_or_else(|| MutationError::UnknownCategory(product.category.clone()))?;
            category.product_ids.push(product.id.clone());
            info!(id = %product.id, category = %product.category, "Product created");
            records.products.push(product);
        }
        self.authority.invalidate().await;
        Ok(())
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), MutationError> {
        {
            let mut records = self.records.write().await;
            let product = records
                .products
                .iter()
                .find(|p| p.id == id)
                .ok_or_else(|| MutationError::UnknownProduct(id.to_string()))?;
            let category_id = product.category.clone();
            records.products.retain(|p| p.id != id);
            if let Some(category) = records.categories.iter_mut().find(|c| c.id == category_id) {
                category.product_ids.retain(|pid| pid != id);
            }
            info!(id, "Product deleted");
        }
        self.authority.invalidate().await;
        Ok(())
    }
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogRemote for CatalogService {
    async fn version(&self) -> Result<String, ApiError> {
        Ok(self.authority.current().await.version)
    }

    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        Ok(self.records.read().await.products.clone())
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.records.read().await.categories.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
