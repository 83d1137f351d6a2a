//! Foundation types for the blockfs storage engine.
//!
//! blockfs is the local, single-node persistence core behind a versioned,
//! content-addressable file system: byte streams are split into immutable,
//! content-addressed blocks, and per-shard commit metadata ("diffs") is kept
//! in a structured on-disk index. This crate provides the types shared by
//! every other blockfs crate.
//!
//! # Key Types
//!
//! - [`BlockHash`] — Content-addressed block identifier (BLAKE3 hash)
//! - [`BlockRef`] / [`ByteRange`] — Reference to a byte range within a block
//! - [`BlockInfo`] — Size and creation metadata for a stored block
//! - [`Delimiter`] — Chunk boundary policy for the block splitter
//! - [`DiffKey`] / [`DiffRecord`] — (repository, shard, commit) keyed metadata

pub mod block;
pub mod delimiter;
pub mod diff;
pub mod error;

pub use block::{BlockHash, BlockInfo, BlockRef, ByteRange};
pub use delimiter::Delimiter;
pub use diff::{DiffKey, DiffRecord, RESERVED_COMMIT_SEGMENT};
pub use error::TypeError;
