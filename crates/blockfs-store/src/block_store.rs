use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::debug;

use blockfs_types::{BlockHash, BlockInfo};

use crate::error::{StoreError, StoreResult};

/// Default size of the byte slices an outbound [`BlockStream`] yields.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Content-addressed block storage: one flat file per hash.
///
/// Writes stage into a scratch directory and publish with an atomic rename,
/// so readers never observe a partially written block and an interrupted
/// write leaves nothing in the block namespace. The presence check before a
/// write is not locked: two writers racing on one hash carry byte-identical
/// content, so whichever rename lands is correct.
pub struct LocalBlockStore {
    block_dir: PathBuf,
    tmp_dir: PathBuf,
    stream_chunk_size: usize,
}

impl LocalBlockStore {
    /// Open a block store rooted at `block_dir`, staging writes in `tmp_dir`.
    /// Both directories are created if missing.
    pub fn open(block_dir: impl Into<PathBuf>, tmp_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let block_dir = block_dir.into();
        let tmp_dir = tmp_dir.into();
        fs::create_dir_all(&block_dir)?;
        fs::create_dir_all(&tmp_dir)?;
        Ok(Self {
            block_dir,
            tmp_dir,
            stream_chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
        })
    }

    /// Override the outbound stream slice size (mainly for tests).
    pub fn with_stream_chunk_size(mut self, size: usize) -> Self {
        self.stream_chunk_size = size;
        self
    }

    fn block_path(&self, hash: &BlockHash) -> PathBuf {
        self.block_dir.join(hash.to_hex())
    }

    /// Write a block's content unless it is already stored.
    ///
    /// Returns `true` if this call published the block, `false` if it was
    /// already present (or another writer won the publish race, which is
    /// equivalent: hash equality implies content equality).
    pub fn put_if_absent(&self, hash: &BlockHash, data: &[u8]) -> StoreResult<bool> {
        let path = self.block_path(hash);
        if path.exists() {
            debug!(block = %hash.short_hex(), "block already present, skipping write");
            return Ok(false);
        }

        let mut staged = NamedTempFile::new_in(&self.tmp_dir)?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;

        match staged.persist_noclobber(&path) {
            Ok(_) => {
                debug!(block = %hash.short_hex(), size = data.len(), "block published");
                Ok(true)
            }
            // Lost the publish race; the winner wrote identical bytes.
            Err(_) if path.exists() => Ok(false),
            Err(e) => Err(StoreError::Io(e.error)),
        }
    }

    /// Open a bounded streamed view of a block's bytes.
    ///
    /// The stream covers `[offset, offset + size)` clamped to the stored
    /// content. An offset past the end of the block is a range error.
    pub fn get(&self, hash: &BlockHash, offset: u64, size: u64) -> StoreResult<BlockStream> {
        let path = self.block_path(hash);
        let mut file = File::open(&path).map_err(|e| self.map_not_found(e, hash))?;
        let stored_size = file.metadata()?.len();
        if offset > stored_size {
            return Err(StoreError::RangeOutOfBounds {
                hash: *hash,
                offset,
                size: stored_size,
            });
        }
        file.seek(SeekFrom::Start(offset))?;
        Ok(BlockStream {
            file,
            remaining: size.min(stored_size - offset),
            chunk_size: self.stream_chunk_size,
        })
    }

    /// Size and creation metadata for a stored block.
    pub fn stat(&self, hash: &BlockHash) -> StoreResult<BlockInfo> {
        let metadata = fs::metadata(self.block_path(hash)).map_err(|e| self.map_not_found(e, hash))?;
        let created: DateTime<Utc> = metadata.modified()?.into();
        Ok(BlockInfo {
            hash: *hash,
            size_bytes: metadata.len(),
            created,
        })
    }

    /// Remove a block unconditionally. No reference counting exists at this
    /// layer; the caller owns the decision.
    pub fn delete(&self, hash: &BlockHash) -> StoreResult<()> {
        fs::remove_file(self.block_path(hash)).map_err(|e| self.map_not_found(e, hash))
    }

    /// Block enumeration is unsupported. Failing loudly keeps callers from
    /// mistaking "no results" for an empty store.
    pub fn list(&self) -> StoreResult<Vec<BlockInfo>> {
        Err(StoreError::NotImplemented("list blocks"))
    }

    fn map_not_found(&self, e: io::Error, hash: &BlockHash) -> StoreError {
        if e.kind() == io::ErrorKind::NotFound {
            StoreError::BlockNotFound(*hash)
        } else {
            StoreError::Io(e)
        }
    }
}

/// Finite, non-restartable stream of a block's bytes, bounded to the
/// requested range and sliced into chunks of at most `chunk_size`.
pub struct BlockStream {
    file: File,
    remaining: u64,
    chunk_size: usize,
}

impl BlockStream {
    /// Total bytes this stream will yield.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Collect the rest of the stream into one buffer.
    pub fn into_vec(self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.remaining as usize);
        for slice in self {
            out.extend_from_slice(&slice?);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for BlockStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStream")
            .field("remaining", &self.remaining)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl Iterator for BlockStream {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let want = (self.remaining).min(self.chunk_size as u64) as usize;
        let mut buf = vec![0u8; want];
        loop {
            match self.file.read(&mut buf) {
                Ok(0) => {
                    // Stored file ended early; treat as end of stream.
                    self.remaining = 0;
                    return None;
                }
                Ok(n) => {
                    buf.truncate(n);
                    self.remaining -= n as u64;
                    return Some(Ok(Bytes::from(buf)));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.remaining = 0;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use blockfs_chunk::BlockHasher;
    use tempfile::tempdir;

    use super::*;

    fn store_in(dir: &Path) -> LocalBlockStore {
        LocalBlockStore::open(dir.join("block"), dir.join("tmp")).unwrap()
    }

    #[test]
    fn put_then_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let hash = BlockHasher::hash(b"abcdefghi\n");

        assert!(store.put_if_absent(&hash, b"abcdefghi\n").unwrap());
        let bytes = store.get(&hash, 0, 10).unwrap().into_vec().unwrap();
        assert_eq!(bytes, b"abcdefghi\n");
    }

    #[test]
    fn second_put_is_a_noop() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let hash = BlockHasher::hash(b"content");

        assert!(store.put_if_absent(&hash, b"content").unwrap());
        assert!(!store.put_if_absent(&hash, b"content").unwrap());
        let bytes = store.get(&hash, 0, u64::MAX).unwrap().into_vec().unwrap();
        assert_eq!(bytes, b"content");
    }

    #[test]
    fn staging_leaves_no_scratch_files_behind() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let hash = BlockHasher::hash(b"staged");
        store.put_if_absent(&hash, b"staged").unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path().join("tmp")).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn get_respects_offset_and_size() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let hash = BlockHasher::hash(b"0123456789");
        store.put_if_absent(&hash, b"0123456789").unwrap();

        let bytes = store.get(&hash, 2, 5).unwrap().into_vec().unwrap();
        assert_eq!(bytes, b"23456");
    }

    #[test]
    fn get_clamps_size_to_stored_content() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let hash = BlockHasher::hash(b"short");
        store.put_if_absent(&hash, b"short").unwrap();

        let bytes = store.get(&hash, 3, 1000).unwrap().into_vec().unwrap();
        assert_eq!(bytes, b"rt");
    }

    #[test]
    fn get_rejects_offset_past_end() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let hash = BlockHasher::hash(b"tiny");
        store.put_if_absent(&hash, b"tiny").unwrap();

        assert!(matches!(
            store.get(&hash, 5, 1),
            Err(StoreError::RangeOutOfBounds { offset: 5, .. })
        ));
    }

    #[test]
    fn get_unknown_block_is_not_found() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let hash = BlockHasher::hash(b"never stored");

        assert!(matches!(
            store.get(&hash, 0, 1),
            Err(StoreError::BlockNotFound(h)) if h == hash
        ));
    }

    #[test]
    fn stream_slices_are_bounded_by_chunk_size() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).with_stream_chunk_size(4);
        let hash = BlockHasher::hash(b"0123456789");
        store.put_if_absent(&hash, b"0123456789").unwrap();

        let slices: Vec<_> = store
            .get(&hash, 0, 10)
            .unwrap()
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(slices.len(), 3);
        assert!(slices.iter().all(|s| s.len() <= 4));
        assert_eq!(slices.concat(), b"0123456789");
    }

    #[test]
    fn stat_reports_size() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let hash = BlockHasher::hash(b"sized");
        store.put_if_absent(&hash, b"sized").unwrap();

        let info = store.stat(&hash).unwrap();
        assert_eq!(info.hash, hash);
        assert_eq!(info.size_bytes, 5);
    }

    #[test]
    fn stat_unknown_block_is_not_found() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(matches!(
            store.stat(&BlockHasher::hash(b"ghost")),
            Err(StoreError::BlockNotFound(_))
        ));
    }

    #[test]
    fn delete_then_get_is_not_found_and_double_delete_fails() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let hash = BlockHasher::hash(b"doomed");
        store.put_if_absent(&hash, b"doomed").unwrap();

        store.delete(&hash).unwrap();
        assert!(matches!(
            store.get(&hash, 0, 1),
            Err(StoreError::BlockNotFound(_))
        ));
        assert!(matches!(
            store.delete(&hash),
            Err(StoreError::BlockNotFound(_))
        ));
    }

    #[test]
    fn list_is_not_implemented() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(matches!(
            store.list(),
            Err(StoreError::NotImplemented("list blocks"))
        ));
    }
}
