//! SQLite vector store
//!
//! One table holds every collection. Vectors are stored as little-endian
//! f32 blobs next to their dimension, so a search only scores points whose
//! dimension equals the query's. Search is brute force over that subset.

use super::traits::{
    rank, OpenStore, ScoredPoint, StorageError, StorageResult, VectorPoint, VectorStore,
};
use crate::document::DocumentId;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed vector store
///
/// Thread-safe via internal mutex on the connection.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS points (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                vector BLOB NOT NULL,
                payload_json TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_points_dimension
                ON points(collection, dimension);

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Names of all non-empty collections
    pub fn collections(&self) -> StorageResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT collection FROM points ORDER BY collection")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn row_to_point(id: String, blob: Vec<u8>, payload_json: String) -> StorageResult<VectorPoint> {
        let vector = decode_vector(&blob).ok_or_else(|| StorageError::CorruptVector(id.clone()))?;
        Ok(VectorPoint {
            id: DocumentId::new(id),
            vector,
            payload: serde_json::from_str(&payload_json)?,
        })
    }
}

impl OpenStore for SqliteVectorStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> StorageResult<usize> {
        for point in &points {
            point.validate()?;
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().to_rfc3339();
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO points (collection, id, dimension, vector, payload_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for point in &points {
                stmt.execute(params![
                    collection,
                    point.id.as_str(),
                    point.vector.len() as i64,
                    encode_vector(&point.vector),
                    serde_json::to_string(&point.payload)?,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(points.len())
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
    ) -> StorageResult<Vec<ScoredPoint>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, vector, payload_json FROM points WHERE collection = ?1 AND dimension = ?2",
        )?;
        let rows = stmt
            .query_map(params![collection, query.len() as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut candidates = Vec::with_capacity(rows.len());
        for (id, blob, payload_json) in rows {
            let point = Self::row_to_point(id, blob, payload_json)?;
            candidates.push((point.id, point.vector, point.payload));
        }
        Ok(rank(query, candidates, limit, score_threshold))
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> StorageResult<Option<VectorPoint>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, vector, payload_json FROM points WHERE collection = ?1 AND id = ?2",
                params![collection, id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(id, blob, payload)| Self::row_to_point(id, blob, payload))
            .transpose()
    }

    async fn points(&self, collection: &str) -> StorageResult<Vec<VectorPoint>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, vector, payload_json FROM points WHERE collection = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, blob, payload)| Self::row_to_point(id, blob, payload))
            .collect()
    }

    async fn count(&self, collection: &str) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM points WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn delete_collection(&self, collection: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM points WHERE collection = ?1", params![collection])?;
        Ok(removed > 0)
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_vector(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}
