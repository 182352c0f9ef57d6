//! Database Module
//!
//! Key layout, the `KvStore` abstraction with in-memory and RocksDB backends,
//! the per-operation write overlay and read-only queries.

pub mod keys;
pub mod store;
pub mod records;
pub mod schema;
pub mod batch_writer;
pub mod query_engine;

// Re-export main types
pub use store::{KvStore, MemoryStore, StateRead};
pub use schema::{DatabaseManager, DBConfig};
pub use batch_writer::AtomicBatchWriter;
pub use query_engine::{PageRequest, PageResponse, QueryEngine, QueryError, QueryResult};
