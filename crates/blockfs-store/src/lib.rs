//! On-disk stores for the blockfs storage engine.
//!
//! Two independent namespaces live under the engine root:
//!
//! - [`LocalBlockStore`] — content-addressed block bytes, one flat file per
//!   hash. Writes stage into a scratch directory and publish with an atomic
//!   rename, so a crash never leaves a partial block in place.
//! - [`LocalDiffStore`] — diff metadata keyed by (repository, shard, commit)
//!   and laid out as `repo/shard/commit` paths, with shard-filtered
//!   enumeration over the whole namespace.
//!
//! # Design Rules
//!
//! 1. Blocks are immutable once published; hash equality implies content
//!    equality, so concurrent writers of one hash race benignly.
//! 2. Neither store takes per-key locks; diff creates are last-writer-wins.
//! 3. No operation spans multiple keys transactionally.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod block_store;
pub mod diff_store;
pub mod error;

pub use block_store::{BlockStream, LocalBlockStore, DEFAULT_STREAM_CHUNK_SIZE};
pub use diff_store::LocalDiffStore;
pub use error::{StoreError, StoreResult};
