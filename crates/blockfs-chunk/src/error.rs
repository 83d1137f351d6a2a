use thiserror::Error;

/// Errors from chunking a byte stream.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// A record-delimited unit failed to decode. This aborts the whole put
    /// operation; previously finalized chunks stay persisted.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// I/O failure on the inbound stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for chunking operations.
pub type ChunkResult<T> = Result<T, ChunkError>;
