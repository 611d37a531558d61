//! Vector storage backends
//!
//! Enriched documents are persisted as points (id, vector, payload) through
//! the `VectorStore` trait. `SqliteVectorStore` is the persistent backend;
//! `InMemoryVectorStore` serves tests and one-off runs.

mod memory;
mod payload;
mod sqlite;
mod traits;

pub use memory::InMemoryVectorStore;
pub use payload::{
    index_documents, points_from_documents, ChainPayload, IndexReport, PointPayload,
    CONTENT_PREVIEW_CHARS,
};
pub use sqlite::SqliteVectorStore;
pub use traits::{OpenStore, ScoredPoint, StorageError, StorageResult, VectorPoint, VectorStore};
