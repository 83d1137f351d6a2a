use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Path segment standing in for an empty commit identifier.
///
/// Each repository keeps one shard-level diff with an empty commit id; an
/// empty string cannot be a path segment, so it is stored under this token.
/// The token is a reserved word: [`DiffKey::validate`] rejects it as a real
/// commit identifier so decoding is never ambiguous.
pub const RESERVED_COMMIT_SEGMENT: &str = "_";

/// Key identifying one diff record: (repository name, shard number, commit id).
///
/// An empty commit id denotes a shard-level diff not tied to any commit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiffKey {
    pub repo: String,
    pub shard: u64,
    pub commit: String,
}

impl DiffKey {
    pub fn new(repo: impl Into<String>, shard: u64, commit: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            shard,
            commit: commit.into(),
        }
    }

    /// Key for a shard-level diff (empty commit id).
    pub fn shard_level(repo: impl Into<String>, shard: u64) -> Self {
        Self::new(repo, shard, "")
    }

    /// Returns `true` if this is a shard-level key (no commit).
    pub fn is_shard_level(&self) -> bool {
        self.commit.is_empty()
    }

    /// Reject commit identifiers that collide with the reserved path segment.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.commit == RESERVED_COMMIT_SEGMENT {
            return Err(TypeError::ReservedCommitId(self.commit.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for DiffKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.repo, self.shard, self.commit)
    }
}

/// One diff record: a key plus an opaque serialized descriptor.
///
/// The descriptor is produced and consumed by the commit/shard orchestration
/// layer; this engine stores and returns it verbatim without interpreting it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub diff: DiffKey,
    pub descriptor: Vec<u8>,
}

impl DiffRecord {
    pub fn new(diff: DiffKey, descriptor: Vec<u8>) -> Self {
        Self { diff, descriptor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_level_has_empty_commit() {
        let key = DiffKey::shard_level("repo", 3);
        assert!(key.is_shard_level());
        assert_eq!(key.commit, "");
    }

    #[test]
    fn validate_accepts_normal_commit() {
        assert!(DiffKey::new("repo", 0, "abc123").validate().is_ok());
        assert!(DiffKey::shard_level("repo", 0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_reserved_token() {
        let err = DiffKey::new("repo", 0, RESERVED_COMMIT_SEGMENT)
            .validate()
            .unwrap_err();
        assert_eq!(err, TypeError::ReservedCommitId("_".to_string()));
    }

    #[test]
    fn record_serde_roundtrip() {
        let record = DiffRecord::new(DiffKey::new("r1", 2, "c1"), vec![1, 2, 3]);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: DiffRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }
}
