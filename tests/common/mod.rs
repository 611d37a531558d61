//! Shared helpers for consolidator integration tests
//!
//! Deterministic embedding clients and document builders. Vectors come
//! from a seeded RNG so property-style tests are reproducible.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use consolidator::{Document, EmbeddingClient, EmbeddingError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const DIMENSION: usize = 16;

/// Fixed timestamp so recency never depends on the wall clock
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
}

pub fn embedded(id: &str, vector: Vec<f32>) -> Document {
    Document::new(id, format!("notes about {}", id))
        .with_embedding(vector)
        .with_created_at(epoch())
}

pub fn random_vector(rng: &mut StdRng, dimension: usize) -> Vec<f32> {
    (0..dimension).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

/// `count` documents with random embeddings
pub fn random_documents(seed: u64, count: usize) -> Vec<Document> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| embedded(&format!("doc-{:03}", i), random_vector(&mut rng, DIMENSION)))
        .collect()
}

/// `per_center` documents around each of `centers` orthogonal axes.
///
/// With `noise` well below 0.2 members of one axis link at the default
/// threshold and members of different axes never do.
pub fn clustered_documents(seed: u64, centers: usize, per_center: usize, noise: f32) -> Vec<Document> {
    assert!(centers <= DIMENSION);
    let mut rng = StdRng::seed_from_u64(seed);
    let anchors: Vec<Vec<f32>> = (0..centers)
        .map(|c| (0..DIMENSION).map(|d| if d == c { 1.0 } else { 0.0 }).collect())
        .collect();
    let mut docs = Vec::with_capacity(centers * per_center);
    for (c, anchor) in anchors.iter().enumerate() {
        for m in 0..per_center {
            let vector = anchor
                .iter()
                .map(|x| x + rng.gen_range(-noise..noise))
                .collect();
            docs.push(embedded(&format!("c{}-m{}", c, m), vector));
        }
    }
    docs
}

/// Embeds text by hashing words into buckets; counts provider calls
#[derive(Default)]
pub struct BagOfWordsClient {
    calls: Arc<AtomicUsize>,
}

impl BagOfWordsClient {
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl EmbeddingClient for BagOfWordsClient {
    fn model_name(&self) -> &str {
        "bag-of-words"
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        let mut vector = vec![0.0f32; DIMENSION];
        for word in text.split_whitespace() {
            let bucket = word.bytes().fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % DIMENSION] += 1.0;
        }
        Ok(vector)
    }
}

/// Answers from a fixed table; anything else is a per-item model error
#[derive(Default)]
pub struct TableClient {
    pub vectors: HashMap<String, Vec<f32>>,
}

#[async_trait]
impl EmbeddingClient for TableClient {
    fn model_name(&self) -> &str {
        "table"
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| EmbeddingError::ModelError(format!("unknown text {:?}", text)))
    }
}

/// Every call fails as if the server were down
pub struct OfflineClient;

#[async_trait]
impl EmbeddingClient for OfflineClient {
    fn model_name(&self) -> &str {
        "offline"
    }

    async fn generate_embedding(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Unavailable("connection refused".into()))
    }
}
