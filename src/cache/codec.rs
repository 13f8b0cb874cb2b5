//! Symmetric cipher codec for cache entries.
//!
//! Values are serialized with serde_json, sealed with XChaCha20-Poly1305
//! under a fresh random nonce, and emitted as `base64(nonce || ciphertext)`
//! so they are always safe to hold as an opaque cache string.
//!
//! `decode` never errors. Malformed base64, truncated input, a failed
//! authentication tag, and unparseable plaintext all read as `None`, and
//! callers use that directly as a cache-miss signal.

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// XChaCha20 nonce length in bytes, prepended to every ciphertext.
const NONCE_LEN: usize = 24;

/// Cache key length in bytes.
const KEY_LEN: usize = 32;

#[derive(Clone)]
pub struct CipherCodec {
    key: Key,
}

impl CipherCodec {
    /// Build a codec from a raw 256-bit key.
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self {
            key: Key::from(key),
        }
    }

    /// Derive the cache key from a secret via Argon2id.
    ///
    /// Key provenance is the caller's problem; a per-install secret and a
    /// stable salt give stable ciphertexts across restarts.
    pub fn from_secret(secret: &str, salt: &[u8]) -> Result<Self> {
        let mut key = [0u8; KEY_LEN];
        argon2::Argon2::default()
            .hash_password_into(secret.as_bytes(), salt, &mut key)
            .map_err(|e| anyhow!("Failed to derive cache key: {}", e))?;
        Ok(Self::new(key))
    }

    /// Serialize and encrypt a value into an opaque storage string.
    ///
    /// Ciphertext is non-deterministic (fresh nonce per call); structure is
    /// deterministic.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<String> {
        let plaintext = serde_json::to_vec(value)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let cipher = XChaCha20Poly1305::new(&self.key);
        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| anyhow!("Failed to encrypt cache value"))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    /// Decrypt and deserialize a storage string.
    ///
    /// Returns `None` for any malformed, tampered, or key-mismatched input.
    pub fn decode<T: DeserializeOwned>(&self, ciphertext: &str) -> Option<T> {
        let raw = match BASE64.decode(ciphertext) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "Cache value is not valid base64");
                return None;
            }
        };
        if raw.len() <= NONCE_LEN {
            debug!(len = raw.len(), "Cache value too short to hold a nonce");
            return None;
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let cipher = XChaCha20Poly1305::new(&self.key);
        let plaintext = match cipher.decrypt(XNonce::from_slice(nonce), sealed) {
            Ok(plaintext) => plaintext,
            Err(_) => {
                debug!("Cache value failed authentication");
                return None;
            }
        };

        match serde_json::from_slice(&plaintext) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, "Decrypted cache value is not valid JSON");
                None
            }
        }
    }
}

impl std::fmt::Debug for CipherCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("CipherCodec").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;

    fn codec() -> CipherCodec {
        CipherCodec::new([7u8; 32])
    }

    fn sample_product() -> Product {
        Product {
            id: "p1".into(),
            name: "Enamel Mug".into(),
            description: Some("12oz".into()),
            price: 14.0,
            category: "kitchen".into(),
            image_url: None,
        }
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        let products = vec![sample_product()];
        let encoded = codec.encode(&products).unwrap();
        let decoded: Vec<Product> = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, products);
    }

    #[test]
    fn test_ciphertext_is_non_deterministic() {
        let codec = codec();
        let a = codec.encode(&"same value").unwrap();
        let b = codec.encode(&"same value").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_input_decodes_to_none() {
        let codec = codec();
        assert_eq!(codec.decode::<String>("not base64 !!!"), None);
        assert_eq!(codec.decode::<String>(""), None);
        assert_eq!(codec.decode::<String>(&BASE64.encode(b"short")), None);
        assert_eq!(
            codec.decode::<String>(&BASE64.encode([0u8; 64])),
            None
        );
    }

    #[test]
    fn test_tampered_ciphertext_decodes_to_none() {
        let codec = codec();
        let encoded = codec.encode(&"secret").unwrap();
        let mut raw = BASE64.decode(&encoded).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        assert_eq!(codec.decode::<String>(&BASE64.encode(raw)), None);
    }

    #[test]
    fn test_key_mismatch_decodes_to_none() {
        let encoded = codec().encode(&"secret").unwrap();
        let other = CipherCodec::new([9u8; 32]);
        assert_eq!(other.decode::<String>(&encoded), None);
    }

    #[test]
    fn test_derived_keys_are_stable() {
        let a = CipherCodec::from_secret("passphrase", b"shopsync-salt-01").unwrap();
        let b = CipherCodec::from_secret("passphrase", b"shopsync-salt-01").unwrap();
        let encoded = a.encode(&42u32).unwrap();
        assert_eq!(b.decode::<u32>(&encoded), Some(42));
    }
}
