//! Storage trait definitions

use super::payload::PointPayload;
use crate::convergence::cosine_similarity;
use crate::document::DocumentId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid vector for point {id}: {reason}")]
    InvalidVector { id: String, reason: String },

    #[error("Corrupt vector blob for point {0}")]
    CorruptVector(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A stored vector with its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: DocumentId,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

impl VectorPoint {
    /// Reject vectors that can never be searched
    pub fn validate(&self) -> StorageResult<()> {
        let reason = if self.vector.is_empty() {
            "vector is empty"
        } else if self.vector.iter().any(|x| !x.is_finite()) {
            "vector contains non-finite values"
        } else {
            return Ok(());
        };
        Err(StorageError::InvalidVector {
            id: self.id.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: DocumentId,
    /// Cosine similarity to the query
    pub score: f32,
    pub payload: PointPayload,
}

/// Trait for vector storage backends
///
/// Collections are created implicitly by the first upsert. Reading a
/// collection that does not exist behaves like reading an empty one.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace points, returning how many were written
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> StorageResult<usize>;

    /// Nearest points by cosine similarity, best first.
    ///
    /// Points whose dimension differs from the query never match.
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
    ) -> StorageResult<Vec<ScoredPoint>>;

    async fn get(&self, collection: &str, id: &DocumentId) -> StorageResult<Option<VectorPoint>>;

    /// Every point in the collection, ordered by id
    async fn points(&self, collection: &str) -> StorageResult<Vec<VectorPoint>>;

    async fn count(&self, collection: &str) -> StorageResult<usize>;

    /// Drop a collection; returns whether it existed
    async fn delete_collection(&self, collection: &str) -> StorageResult<bool>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: VectorStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

/// Score candidates against `query` and keep the best `limit`.
///
/// Ties are broken by id so results are stable across backends.
pub(crate) fn rank<I>(
    query: &[f32],
    candidates: I,
    limit: usize,
    score_threshold: Option<f32>,
) -> Vec<ScoredPoint>
where
    I: IntoIterator<Item = (DocumentId, Vec<f32>, PointPayload)>,
{
    let mut hits: Vec<ScoredPoint> = candidates
        .into_iter()
        .filter(|(_, vector, _)| vector.len() == query.len())
        .map(|(id, vector, payload)| ScoredPoint {
            score: cosine_similarity(query, &vector),
            id,
            payload,
        })
        .filter(|hit| score_threshold.map_or(true, |t| hit.score >= t))
        .collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    hits.truncate(limit);
    hits
}
