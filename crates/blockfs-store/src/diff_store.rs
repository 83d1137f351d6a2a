use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use blockfs_types::{DiffKey, DiffRecord, RESERVED_COMMIT_SEGMENT};

use crate::error::{StoreError, StoreResult};

/// On-disk index of diff records, laid out as
/// `<diff_dir>/<repository>/<shard as decimal>/<commit id>`.
///
/// An empty commit id (a shard-level diff) is stored under the reserved `_`
/// segment, so key-to-path and path-to-key are exact inverses. There is no
/// per-key locking: concurrent creates on one key are last-writer-wins.
pub struct LocalDiffStore {
    diff_dir: PathBuf,
}

impl LocalDiffStore {
    /// Open a diff store rooted at `diff_dir`, creating it if missing.
    pub fn open(diff_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let diff_dir = diff_dir.into();
        fs::create_dir_all(&diff_dir)?;
        Ok(Self { diff_dir })
    }

    fn key_to_path(&self, key: &DiffKey) -> PathBuf {
        let commit = if key.commit.is_empty() {
            RESERVED_COMMIT_SEGMENT
        } else {
            key.commit.as_str()
        };
        self.diff_dir
            .join(&key.repo)
            .join(key.shard.to_string())
            .join(commit)
    }

    /// Parse a stored path back into its key. Returns `None` for paths that
    /// are not diff records (directories, foreign files, wrong depth).
    fn path_to_key(&self, path: &Path) -> Option<DiffKey> {
        let rel = path.strip_prefix(&self.diff_dir).ok()?;
        let segments: Vec<&str> = rel.iter().map(|s| s.to_str()).collect::<Option<_>>()?;
        let [repo, shard, commit] = segments.as_slice() else {
            return None;
        };
        let shard = shard.parse::<u64>().ok()?;
        let commit = if *commit == RESERVED_COMMIT_SEGMENT {
            ""
        } else {
            commit
        };
        Some(DiffKey::new(*repo, shard, commit))
    }

    /// Store a record at its key, replacing any prior value there.
    pub fn create(&self, record: &DiffRecord) -> StoreResult<()> {
        record.diff.validate()?;
        let data =
            bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let path = self.key_to_path(&record.diff);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }

    /// Read the record stored at `key`.
    pub fn inspect(&self, key: &DiffKey) -> StoreResult<DiffRecord> {
        key.validate()?;
        self.read_record(&self.key_to_path(key), key)
    }

    /// All records whose key's shard equals `shard`, across every repository
    /// and commit, in filesystem traversal order.
    pub fn list_by_shard(&self, shard: u64) -> StoreResult<Vec<DiffRecord>> {
        let mut records = Vec::new();
        for entry in WalkDir::new(&self.diff_dir) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(key) = self.path_to_key(entry.path()) else {
                warn!(path = %entry.path().display(), "skipping non-diff file in diff namespace");
                continue;
            };
            if key.shard == shard {
                records.push(self.read_record(entry.path(), &key)?);
            }
        }
        Ok(records)
    }

    /// Remove the record stored at `key`.
    pub fn delete(&self, key: &DiffKey) -> StoreResult<()> {
        key.validate()?;
        fs::remove_file(self.key_to_path(key)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StoreError::DiffNotFound(key.clone())
            } else {
                StoreError::Io(e)
            }
        })
    }

    fn read_record(&self, path: &Path, key: &DiffKey) -> StoreResult<DiffRecord> {
        let data = fs::read(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StoreError::DiffNotFound(key.clone())
            } else {
                StoreError::Io(e)
            }
        })?;
        bincode::deserialize(&data).map_err(|e| StoreError::CorruptDiff {
            key: key.clone(),
            reason: e.to_string(),
        })
    }
}
