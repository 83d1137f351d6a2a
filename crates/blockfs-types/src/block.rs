use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-addressed identifier for a stored block.
///
/// A `BlockHash` is the BLAKE3 digest of a block's content. Identical content
/// always produces the same hash, which is what makes blocks deduplicatable:
/// the store keeps at most one copy per distinct hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    /// Create a `BlockHash` from a pre-computed digest.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation. This is the block's on-disk name.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for log output.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.short_hex())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for BlockHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Half-open byte range `[lower, upper)` within a block's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub lower: u64,
    pub upper: u64,
}

impl ByteRange {
    pub fn new(lower: u64, upper: u64) -> Self {
        Self { lower, upper }
    }

    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.upper - self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.upper == self.lower
    }
}

/// Reference to a byte range within a specific block.
///
/// A put operation returns `BlockRef`s in production order; concatenating the
/// referenced bytes in that order reconstructs the original input stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    pub hash: BlockHash,
    pub range: ByteRange,
}

impl BlockRef {
    pub fn new(hash: BlockHash, range: ByteRange) -> Self {
        Self { hash, range }
    }

    /// Number of content bytes this reference covers.
    pub fn len(&self) -> u64 {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Size and creation metadata for a stored block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub hash: BlockHash,
    pub size_bytes: u64,
    /// Derived from the block file's modified time; blocks are immutable, so
    /// modified time equals creation time.
    pub created: DateTime<Utc>,
}
