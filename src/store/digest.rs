//! Key digests
//!
//! Raw keys are addressed in the value table by the lowercase hex SHA-256 of
//! their bytes, giving fixed 64-byte storage keys whatever the input looks
//! like.

use std::fmt;

use sha2::{Digest as _, Sha256};

/// Length in bytes of a hex-encoded digest
pub const DIGEST_LEN: usize = 64;

/// Hex-encoded SHA-256 of a raw key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(String);

impl Digest {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest a raw key
pub fn hash_key(key: &[u8]) -> Digest {
    Digest(hex::encode(Sha256::digest(key)))
}
