use blockfs_types::BlockHash;

/// Domain tag mixed into every block hash, preventing collisions with any
/// other BLAKE3 use in the surrounding system.
const DOMAIN: &str = "blockfs-block-v1";

/// Streaming, domain-separated BLAKE3 content hasher.
///
/// Bytes are fed incrementally with [`update`](Self::update); the resulting
/// digest depends only on the concatenated input, never on how it was split
/// across calls. Memory use is constant relative to input size.
pub struct BlockHasher {
    inner: blake3::Hasher,
}

impl BlockHasher {
    pub fn new() -> Self {
        let mut inner = blake3::Hasher::new();
        inner.update(DOMAIN.as_bytes());
        inner.update(b":");
        Self { inner }
    }

    /// Feed the next slice of content.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finish and produce the block's identity.
    pub fn finalize(self) -> BlockHash {
        BlockHash::from_hash(*self.inner.finalize().as_bytes())
    }

    /// One-shot convenience for already-buffered content.
    pub fn hash(data: &[u8]) -> BlockHash {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

impl Default for BlockHasher {
    fn default() -> Self {
        Self::new()
    }
}
