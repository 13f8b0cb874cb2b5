//! Remote catalog access.
//!
//! This module defines the `CatalogRemote` boundary the sync engine talks
//! through, plus the HTTP implementation (`ApiClient`) for a real remote
//! store. Responses are normalized here: catalog reads always come back as
//! plain vectors, whatever shape the server answered with.

pub mod client;
pub mod error;
pub mod remote;

pub use client::ApiClient;
pub use error::ApiError;
pub use remote::CatalogRemote;
