//! Point payloads and the document → point conversion
//!
//! Field names follow the camelCase wire format the collection has always
//! used. Older points written with `file`, `intelligence_type` or
//! `enrichment_level` are read through aliases.

use super::traits::{StorageResult, VectorPoint, VectorStore};
use crate::convergence::ChainId;
use crate::document::{Breakthrough, Document, DocumentId, EnrichmentLevel, IntelligenceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Characters of content kept in the payload preview
pub const CONTENT_PREVIEW_CHARS: usize = 500;

/// A chain as recorded on each of its members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainPayload {
    pub chain_id: ChainId,
    pub participants: Vec<DocumentId>,
    pub convergence_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PointPayload {
    #[serde(alias = "file", skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    pub content: String,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
    #[serde(alias = "intelligence_type", skip_serializing_if = "Option::is_none")]
    pub intelligence_type: Option<IntelligenceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intelligence_score: Option<f64>,
    #[serde(alias = "enrichment_level", skip_serializing_if = "Option::is_none")]
    pub enrichment_level: Option<EnrichmentLevel>,
    pub convergence_chains: Vec<ChainPayload>,
    pub breakthroughs: Vec<Breakthrough>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PointPayload {
    pub fn has_source_file(&self) -> bool {
        self.source_file.as_deref().is_some_and(|f| !f.is_empty())
    }
}

/// Outcome of [`index_documents`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    pub indexed: usize,
    /// Documents without a usable embedding, or repeating an earlier id
    pub skipped: usize,
}

/// Convert documents to points.
///
/// Chain participants are reconstructed from the `chain_ids` the documents
/// carry, in input order. Documents whose embedding is missing or fails
/// [`VectorPoint::validate`] yield no point, and only the first document
/// with a given id is converted.
pub fn points_from_documents(documents: &[Document]) -> Vec<VectorPoint> {
    let mut members: HashMap<&ChainId, Vec<DocumentId>> = HashMap::new();
    for doc in documents {
        if let Some(meta) = &doc.enrichment {
            for chain_id in &meta.chain_ids {
                members.entry(chain_id).or_default().push(doc.id.clone());
            }
        }
    }

    let mut seen = HashSet::with_capacity(documents.len());
    documents
        .iter()
        .filter(|&doc| seen.insert(&doc.id))
        .filter_map(|doc| {
            let point = VectorPoint {
                id: doc.id.clone(),
                vector: doc.embedding.clone()?,
                payload: payload_for(doc, &members),
            };
            match point.validate() {
                Ok(()) => Some(point),
                Err(e) => {
                    tracing::warn!(document = %doc.id, error = %e, "document not indexed");
                    None
                }
            }
        })
        .collect()
}

fn payload_for(doc: &Document, members: &HashMap<&ChainId, Vec<DocumentId>>) -> PointPayload {
    let mut payload = PointPayload {
        source_file: doc.source_file.clone(),
        content: doc.content.chars().take(CONTENT_PREVIEW_CHARS).collect(),
        categories: doc.categories.iter().cloned().collect(),
        analysis_type: doc.analysis_type.clone(),
        created_at: doc.created_at,
        ..Default::default()
    };

    if let Some(meta) = &doc.enrichment {
        payload.intelligence_type = Some(meta.intelligence_type);
        payload.convergence_score = Some(meta.convergence_score);
        payload.impact_score = Some(meta.impact_score);
        payload.intelligence_score = Some(meta.intelligence_score);
        payload.enrichment_level = Some(meta.enrichment_level);
        payload.breakthroughs = meta.breakthroughs.clone();
        payload.convergence_chains = meta
            .chain_ids
            .iter()
            .map(|chain_id| ChainPayload {
                chain_id: chain_id.clone(),
                participants: members.get(chain_id).cloned().unwrap_or_default(),
                convergence_score: meta.convergence_score,
            })
            .collect();
    }
    payload
}

/// Write documents into `collection`. Documents that yield no point are
/// counted as skipped and never fail the write.
pub async fn index_documents(
    store: &dyn VectorStore,
    collection: &str,
    documents: &[Document],
) -> StorageResult<IndexReport> {
    let points = points_from_documents(documents);
    let skipped = documents.len() - points.len();
    if skipped > 0 {
        tracing::warn!(collection, skipped, "documents without a usable embedding were not indexed");
    }
    let indexed = if points.is_empty() {
        0
    } else {
        store.upsert(collection, points).await?
    };
    tracing::info!(collection, indexed, "indexed documents");
    Ok(IndexReport { indexed, skipped })
}
