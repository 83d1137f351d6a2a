//! Streaming block splitter for the blockfs storage engine.
//!
//! This crate turns one inbound byte stream into a sequence of
//! content-addressed chunks, ready for deduplicated storage:
//!
//! 1. The [`ChunkSource`] trait models the transport's "next chunk or end"
//!    interface; [`StreamReader`] bridges it to a pull-based byte reader.
//! 2. [`Splitter`] consumes the reader under a [`Delimiter`] policy and
//!    yields `(hash, bytes)` chunks bounded below by a minimum block size.
//! 3. [`BlockHasher`] computes each chunk's BLAKE3 identity incrementally,
//!    independent of how the input was fed.
//!
//! Chunk production is strictly sequential: each chunk's boundary depends on
//! where the previous one ended, so there is no intra-stream parallelism.
//!
//! [`Delimiter`]: blockfs_types::Delimiter

pub mod error;
pub mod hasher;
pub mod splitter;
pub mod stream;

pub use error::{ChunkError, ChunkResult};
pub use hasher::BlockHasher;
pub use splitter::{Chunk, Splitter};
pub use stream::{drain, BufferSource, ChannelChunkSource, ChunkSource, StreamReader};
