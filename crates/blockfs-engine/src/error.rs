use blockfs_chunk::ChunkError;
use blockfs_store::StoreError;

/// Errors surfaced to the transport layer by engine operations.
///
/// Nothing is retried internally: every failure is returned to the
/// immediate caller, which owns retry policy.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// `true` for the not-found family, which transports typically map to a
    /// distinct status code.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::BlockNotFound(_)) | Self::Store(StoreError::DiffNotFound(_))
        )
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
