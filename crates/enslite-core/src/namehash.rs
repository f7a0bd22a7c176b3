// # Name Hashing
//
// Maps dotted names onto the 256-bit identifiers the registry is keyed by.
//
// ```text
// node("")          = 0x00..00
// node(label.rest)  = keccak256(node(rest) || keccak256(label))
// ```
//
// `namehash` is total: any string hashes to *some* identifier, including
// names with empty labels ("a..b"). Callers that want stricter semantics
// run the name through a [`NamePolicy`] first, which is what
// `ResolutionService` does before any upstream call.

use crate::config::NameNormalization;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Maximum length of a full name, in bytes
const MAX_NAME_LEN: usize = 253;

/// Maximum length of a single label, in bytes
const MAX_LABEL_LEN: usize = 63;

/// Canonical 256-bit identifier of a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameIdentifier([u8; 32]);

impl NameIdentifier {
    /// Identifier of the empty (root) name
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for NameIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Compute keccak256 of input data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Compute the namehash of a dotted name
///
/// The name is hashed literally: no case folding, no validation. Splitting
/// happens on the first `.`, so a trailing dot ("eth.") hashes the same as
/// "eth" while a leading dot contributes an empty label.
///
/// # Example
///
/// ```
/// use enslite_core::namehash::{namehash, NameIdentifier};
///
/// assert_eq!(namehash(""), NameIdentifier::ZERO);
/// assert_ne!(namehash("eth"), namehash("foo.eth"));
/// ```
pub fn namehash(name: &str) -> NameIdentifier {
    let mut labels = Vec::new();
    let mut rest = name;
    while !rest.is_empty() {
        match rest.split_once('.') {
            Some((label, tail)) => {
                labels.push(label);
                rest = tail;
            }
            None => {
                labels.push(rest);
                rest = "";
            }
        }
    }

    let mut node = [0u8; 32];
    let mut preimage = [0u8; 64];
    for label in labels.iter().rev() {
        preimage[..32].copy_from_slice(&node);
        preimage[32..].copy_from_slice(&keccak256(label.as_bytes()));
        node = keccak256(&preimage);
    }

    NameIdentifier(node)
}

/// Normalization and validation applied to names before hashing or caching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamePolicy {
    normalization: NameNormalization,
}

impl NamePolicy {
    pub fn new(normalization: NameNormalization) -> Self {
        Self { normalization }
    }

    pub fn normalization(&self) -> NameNormalization {
        self.normalization
    }

    /// Normalize and validate a name
    ///
    /// Trims surrounding whitespace and a single trailing root dot, applies
    /// the case policy, then checks the name label by label.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the canonical form used as hash input and cache key
    /// - `Err(Error::MalformedInput)`: the name fails validation
    pub fn normalize(&self, name: &str) -> Result<String> {
        let trimmed = name.trim();
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);

        let canonical = match self.normalization {
            NameNormalization::Lowercase => trimmed.to_ascii_lowercase(),
            NameNormalization::Preserve => trimmed.to_string(),
        };

        validate_name(&canonical)?;
        Ok(canonical)
    }
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self::new(NameNormalization::default())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::malformed("name cannot be empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(Error::malformed(format!(
            "name too long: {} bytes (max {})",
            name.len(),
            MAX_NAME_LEN
        )));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(Error::malformed(format!("empty label in '{}'", name)));
        }

        if label.len() > MAX_LABEL_LEN {
            return Err(Error::malformed(format!(
                "label too long: {} bytes (max {}): '{}'",
                label.len(),
                MAX_LABEL_LEN,
                label
            )));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::malformed(format!(
                "label contains invalid characters: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::malformed(format!(
                "label cannot start or end with hyphen: '{}'",
                label
            )));
        }
    }

    Ok(())
}
