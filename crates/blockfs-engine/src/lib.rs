//! The blockfs storage engine.
//!
//! Ties the block splitter and the on-disk stores into the nine operations
//! the transport layer exposes: streamed block puts, bounded block gets,
//! block inspect/delete, and the four diff index operations. Each engine
//! instance owns one root directory, provisioned at construction with the
//! `block/`, `diff/`, and `tmp/` namespaces.
//!
//! Every request is an independent unit of work: the engine is `Send + Sync`
//! and takes no cross-request locks. Within one put, chunk production is
//! strictly sequential. Request outcomes and latency are recorded with
//! `tracing`; retry policy, timeouts, and authentication belong to the
//! transport layer.

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::StorageEngine;
pub use error::{EngineError, EngineResult};
