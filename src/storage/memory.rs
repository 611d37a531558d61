//! In-memory vector store

use super::traits::{rank, ScoredPoint, StorageError, StorageResult, VectorPoint, VectorStore};
use crate::document::DocumentId;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Collections = HashMap<String, BTreeMap<DocumentId, VectorPoint>>;

/// Ephemeral store with brute-force search. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<Collections>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Collections>> {
        self.collections.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Collections>> {
        self.collections.write().map_err(|_| StorageError::LockPoisoned)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> StorageResult<usize> {
        for point in &points {
            point.validate()?;
        }
        let mut collections = self.write()?;
        let entries = collections.entry(collection.to_string()).or_default();
        let written = points.len();
        for point in points {
            entries.insert(point.id.clone(), point);
        }
        Ok(written)
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
    ) -> StorageResult<Vec<ScoredPoint>> {
        let collections = self.read()?;
        let Some(entries) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let candidates = entries
            .values()
            .map(|p| (p.id.clone(), p.vector.clone(), p.payload.clone()));
        Ok(rank(query, candidates, limit, score_threshold))
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> StorageResult<Option<VectorPoint>> {
        Ok(self
            .read()?
            .get(collection)
            .and_then(|entries| entries.get(id))
            .cloned())
    }

    async fn points(&self, collection: &str) -> StorageResult<Vec<VectorPoint>> {
        Ok(self
            .read()?
            .get(collection)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str) -> StorageResult<usize> {
        Ok(self.read()?.get(collection).map_or(0, BTreeMap::len))
    }

    async fn delete_collection(&self, collection: &str) -> StorageResult<bool> {
        Ok(self.write()?.remove(collection).is_some())
    }
}
