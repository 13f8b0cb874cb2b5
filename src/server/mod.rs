//! Authoritative catalog store and version authority.
//!
//! This is the server half of the invalidation protocol: the
//! `VersionAuthority` holds the current version token, and the
//! `CatalogService` mutation layer advances it after, and only after, a
//! mutation commits. `CatalogService` implements `CatalogRemote`, so the
//! sync engine can run against it in-process.

pub mod authority;
pub mod catalog;

pub use authority::{VersionAuthority, VersionStamp};
pub use catalog::{CatalogService, MutationError};
