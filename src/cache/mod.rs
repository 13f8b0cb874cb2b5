//! Encrypted local persistence.
//!
//! This module provides the two halves of the client-side cache:
//!
//! - `KvStore`: a durable, asynchronous key-value store with optional
//!   per-entry expiry and lazy, self-healing eviction
//! - `CipherCodec`: serializes values to encrypted opaque strings and
//!   back; decode failures read as cache misses, never as errors

pub mod codec;
pub mod store;

pub use codec::CipherCodec;
pub use store::KvStore;
