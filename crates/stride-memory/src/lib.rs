//! # stride-memory
//!
//! Durable SQLite storage plus the transient TTL caches that hold
//! conversation context and in-flight wizard drafts.

pub mod cache;
pub mod store;

pub use cache::{ContextStore, DraftCache, KvCache, MemoryCache};
pub use store::Store;
