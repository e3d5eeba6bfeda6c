//! Length-prefixed key encoding for LMDB storage.
//!
//! Document keys are encoded as: [len1][collection][len2][id]
//! - No delimiters, no escaping, any bytes allowed
//! - A collection prefix scans exactly that collection
//! - Each part is at most 255 bytes

use crate::error::{PermtreeError, Result};

/// Maximum length of a single key part
pub const MAX_PART_LEN: usize = u8::MAX as usize;

/// Build a length-prefixed key from parts
#[inline]
pub fn build_key(parts: &[&str]) -> Result<Vec<u8>> {
    let total_len: usize = parts.iter().map(|p| 1 + p.len()).sum();
    let mut key = Vec::with_capacity(total_len);
    for part in parts {
        if part.len() > MAX_PART_LEN {
            return Err(PermtreeError::invalid(format!(
                "key part too long: {} bytes (max {})",
                part.len(),
                MAX_PART_LEN
            )));
        }
        key.push(part.len() as u8);
        key.extend_from_slice(part.as_bytes());
    }
    Ok(key)
}

/// Key of a document: [collection][id]
#[inline]
pub fn doc_key(collection: &str, id: &str) -> Result<Vec<u8>> {
    build_key(&[collection, id])
}

/// Prefix covering every document of a collection
#[inline]
pub fn collection_prefix(collection: &str) -> Result<Vec<u8>> {
    build_key(&[collection])
}
