use std::io::BufReader;
use std::time::Instant;

use tracing::{debug, warn};

use blockfs_chunk::{drain, ChunkSource, Splitter, StreamReader};
use blockfs_store::{BlockStream, LocalBlockStore, LocalDiffStore};
use blockfs_types::{BlockHash, BlockInfo, BlockRef, Delimiter, DiffKey, DiffRecord};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// The local block and diff storage engine.
///
/// One instance owns one root directory. All operations are safe to call
/// concurrently from independent request handlers; none of them take
/// cross-request locks.
pub struct StorageEngine {
    config: EngineConfig,
    blocks: LocalBlockStore,
    diffs: LocalDiffStore,
}

impl StorageEngine {
    /// Open an engine over `config.root`, provisioning the `block/`, `diff/`,
    /// and `tmp/` namespaces.
    pub fn open(config: EngineConfig) -> EngineResult<Self> {
        let blocks = LocalBlockStore::open(config.block_dir(), config.tmp_dir())?
            .with_stream_chunk_size(config.stream_chunk_size);
        let diffs = LocalDiffStore::open(config.diff_dir())?;
        Ok(Self {
            config,
            blocks,
            diffs,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Split an inbound byte stream into content-addressed blocks, persist
    /// each one, and return the ordered references.
    ///
    /// An empty stream succeeds with zero references and no writes. On
    /// failure, chunks persisted before the failure stay persisted
    /// (at-least-once semantics per chunk). The source is drained before
    /// returning, success or not, so the transport can close cleanly.
    pub fn put_blocks<S: ChunkSource>(
        &self,
        delimiter: Delimiter,
        mut source: S,
    ) -> EngineResult<Vec<BlockRef>> {
        let start = Instant::now();
        let result = self.put_blocks_inner(delimiter, &mut source);
        drain(&mut source);
        match &result {
            Ok(refs) => {
                debug!(?delimiter, blocks = refs.len(), elapsed = ?start.elapsed(), "put_blocks")
            }
            Err(e) => {
                warn!(?delimiter, error = %e, elapsed = ?start.elapsed(), "put_blocks failed")
            }
        }
        result
    }

    fn put_blocks_inner<S: ChunkSource>(
        &self,
        delimiter: Delimiter,
        source: &mut S,
    ) -> EngineResult<Vec<BlockRef>> {
        let reader = BufReader::new(StreamReader::new(source));
        let mut splitter = Splitter::new(reader, delimiter, self.config.block_size);
        let mut refs = Vec::new();
        for chunk in &mut splitter {
            let chunk = chunk?;
            self.blocks.put_if_absent(&chunk.hash, &chunk.data)?;
            refs.push(chunk.block_ref());
            // A chunk shorter than the minimum block size is definitive
            // end-of-stream; stop requesting further chunks.
            if chunk.len() < self.config.block_size {
                break;
            }
        }
        Ok(refs)
    }

    /// Stream a block's bytes, bounded to `[offset, offset + size)`.
    pub fn get_block(&self, hash: &BlockHash, offset: u64, size: u64) -> EngineResult<BlockStream> {
        self.logged("get_block", || Ok(self.blocks.get(hash, offset, size)?))
    }

    /// Size and creation metadata for a stored block.
    pub fn inspect_block(&self, hash: &BlockHash) -> EngineResult<BlockInfo> {
        self.logged("inspect_block", || Ok(self.blocks.stat(hash)?))
    }

    /// Remove a block unconditionally.
    pub fn delete_block(&self, hash: &BlockHash) -> EngineResult<()> {
        self.logged("delete_block", || Ok(self.blocks.delete(hash)?))
    }

    /// Block enumeration is a permanent capability gap; always fails.
    pub fn list_blocks(&self) -> EngineResult<Vec<BlockInfo>> {
        self.logged("list_blocks", || Ok(self.blocks.list()?))
    }

    /// Store a diff record, replacing any prior value at its key.
    pub fn create_diff(&self, record: &DiffRecord) -> EngineResult<()> {
        self.logged("create_diff", || Ok(self.diffs.create(record)?))
    }

    /// Read the diff record at `key`.
    pub fn inspect_diff(&self, key: &DiffKey) -> EngineResult<DiffRecord> {
        self.logged("inspect_diff", || Ok(self.diffs.inspect(key)?))
    }

    /// All diff records whose shard equals `shard`.
    pub fn list_diff(&self, shard: u64) -> EngineResult<Vec<DiffRecord>> {
        self.logged("list_diff", || Ok(self.diffs.list_by_shard(shard)?))
    }

    /// Remove the diff record at `key`.
    pub fn delete_diff(&self, key: &DiffKey) -> EngineResult<()> {
        self.logged("delete_diff", || Ok(self.diffs.delete(key)?))
    }

    /// Run an operation and record its outcome and latency.
    fn logged<T>(
        &self,
        op: &'static str,
        f: impl FnOnce() -> EngineResult<T>,
    ) -> EngineResult<T> {
        let start = Instant::now();
        let result = f();
        match &result {
            Ok(_) => debug!(op, elapsed = ?start.elapsed(), "ok"),
            Err(e) => warn!(op, error = %e, elapsed = ?start.elapsed(), "failed"),
        }
        result
    }
}
