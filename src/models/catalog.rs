//! Domain models for catalog records.
//!
//! Referential integrity between the two types (every id in a category's
//! `product_ids` resolves to a product, every product's `category` resolves
//! to exactly one category) is maintained by the mutation layer in
//! `server::CatalogService`. The sync engine treats both as opaque payload.

use serde::{Deserialize, Serialize};

/// A single product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    /// Id of the category this product belongs to.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A category grouping products by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub product_ids: Vec<String>,
}

impl Category {
    pub fn contains(&self, product_id: &str) -> bool {
        self.product_ids.iter().any(|id| id == product_id)
    }
}
