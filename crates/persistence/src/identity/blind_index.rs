//! Blind indexes for equality search over encrypted identity fields.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::model::IdentityField;
use crate::error::IdentityError;

type HmacSha256 = Hmac<Sha256>;

/// Computes blind indexes.
///
/// A blind index is `hex(HMAC-SHA-256(key, field || 0x1f || normalize(value)))`
/// where `normalize` trims and lower-cases. Equal plaintexts produce equal
/// indexes under the same key, so the central store can answer exact-match
/// searches without decrypting anything. Partial matches are not possible.
#[derive(Clone)]
pub struct BlindIndexer {
    mac: HmacSha256,
}

impl BlindIndexer {
    /// Creates an indexer keyed with `key`.
    ///
    /// Fails when the key is empty.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, IdentityError> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(IdentityError::InvalidIndexKey {
                message: "key must not be empty".to_string(),
            });
        }
        let mac = HmacSha256::new_from_slice(key).map_err(|e| IdentityError::InvalidIndexKey {
            message: e.to_string(),
        })?;
        Ok(Self { mac })
    }

    /// Computes the blind index of `value` for `field`.
    pub fn index(&self, field: IdentityField, value: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(field.as_str().as_bytes());
        mac.update(&[0x1f]);
        mac.update(normalize(value).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for BlindIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlindIndexer").finish_non_exhaustive()
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
