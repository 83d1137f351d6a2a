use std::path::PathBuf;

use blockfs_store::DEFAULT_STREAM_CHUNK_SIZE;

/// Minimum block size: a chunk closes once it grows strictly past this many
/// bytes, and a produced chunk shorter than this marks end-of-stream.
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024 * 1024;

/// Configuration for a [`StorageEngine`](crate::StorageEngine).
///
/// The root directory is fixed for the lifetime of the engine; the `block/`,
/// `diff/`, and `tmp/` namespaces live beneath it.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Root storage directory.
    pub root: PathBuf,
    /// Minimum block size threshold for the splitter.
    pub block_size: usize,
    /// Size of the byte slices an outbound block stream yields.
    pub stream_chunk_size: usize,
}

impl EngineConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            block_size: DEFAULT_BLOCK_SIZE,
            stream_chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
        }
    }

    /// Override the minimum block size (mainly for tests; production keeps
    /// the default).
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_stream_chunk_size(mut self, size: usize) -> Self {
        self.stream_chunk_size = size;
        self
    }

    pub(crate) fn block_dir(&self) -> PathBuf {
        self.root.join("block")
    }

    pub(crate) fn diff_dir(&self) -> PathBuf {
        self.root.join("diff")
    }

    pub(crate) fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_live_under_the_root() {
        let config = EngineConfig::new("/data/blockfs");
        assert_eq!(config.block_dir(), PathBuf::from("/data/blockfs/block"));
        assert_eq!(config.diff_dir(), PathBuf::from("/data/blockfs/diff"));
        assert_eq!(config.tmp_dir(), PathBuf::from("/data/blockfs/tmp"));
    }

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::new("/data");
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.stream_chunk_size, DEFAULT_STREAM_CHUNK_SIZE);
    }
}
