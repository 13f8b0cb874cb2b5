//! Data models for the catalog domain.
//!
//! This module contains the data structures shared between the sync
//! layer and the remote catalog store:
//!
//! - `Product`, `Category`: the two catalog record types
//! - `ProductsPayload`, `CategoriesPayload`: tagged unions for the two
//!   remote response shapes, normalized once at the API boundary
//! - `VersionResponse`: the version authority's read endpoint payload

pub mod catalog;
pub mod payload;

pub use catalog::{Category, Product};
pub use payload::{CategoriesPayload, ProductsPayload, VersionResponse};
