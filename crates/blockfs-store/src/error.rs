use blockfs_types::{BlockHash, DiffKey, TypeError};

/// Errors from block and diff store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No block is stored under this hash.
    #[error("block not found: {0}")]
    BlockNotFound(BlockHash),

    /// No diff record is stored under this key.
    #[error("diff not found: {0}")]
    DiffNotFound(DiffKey),

    /// Requested byte range falls outside the stored content.
    #[error("range out of bounds for block {hash}: offset {offset}, stored size {size}")]
    RangeOutOfBounds {
        hash: BlockHash,
        offset: u64,
        size: u64,
    },

    /// A stored diff blob failed to deserialize.
    #[error("corrupt diff record at {key}: {reason}")]
    CorruptDiff { key: DiffKey, reason: String },

    /// Serialization failure while writing a diff record.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The key is structurally invalid (reserved commit token).
    #[error(transparent)]
    InvalidKey(#[from] TypeError),

    /// Permanent capability gap, not a transient condition.
    #[error("operation not implemented: {0}")]
    NotImplemented(&'static str),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
