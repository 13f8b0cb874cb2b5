//! Remote response shapes.
//!
//! The remote store answers catalog reads either as a bare array or as a
//! wrapped object, depending on deployment. Each shape is modeled as an
//! untagged union and normalized into a plain `Vec` immediately after the
//! call, so no shape-checking leaks into consumer code.

use serde::Deserialize;

use super::{Category, Product};

/// Response of the version authority's read endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionResponse {
    pub version: String,
    /// Human-readable timestamp of the last invalidation.
    #[serde(default, rename = "lastUpdated")]
    pub last_updated: Option<String>,
}

/// `GET /catalog/products` response: `Product[]` or `{ data: Product[] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductsPayload {
    Bare(Vec<Product>),
    Wrapped { data: Vec<Product> },
}

impl ProductsPayload {
    pub fn into_products(self) -> Vec<Product> {
        match self {
            ProductsPayload::Bare(products) => products,
            ProductsPayload::Wrapped { data } => data,
        }
    }
}

/// `GET /catalog/categories` response: `Category[]` or
/// `{ categories: Category[] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CategoriesPayload {
    Bare(Vec<Category>),
    Wrapped { categories: Vec<Category> },
}

impl CategoriesPayload {
    pub fn into_categories(self) -> Vec<Category> {
        match self {
            CategoriesPayload::Bare(categories) => categories,
            CategoriesPayload::Wrapped { categories } => categories,
        }
    }
}
