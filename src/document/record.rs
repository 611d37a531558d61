//! Document: the unit of curation, analysis, and enrichment

use super::metadata::EnrichedMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique identifier for a document
///
/// Serializes as a plain string (file path, UUID, or any stable key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A discovered document
///
/// Created at discovery, curated by the user (categories), and annotated
/// by the enrichment pipeline. Persistence happens outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: DocumentId,
    /// Raw text content
    #[serde(default)]
    pub content: String,
    /// Precomputed embedding, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// User-curated categories
    #[serde(default)]
    pub categories: BTreeSet<String>,
    /// Analysis type assigned during discovery (e.g. "breakthrough_tecnico")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
    /// Originating file, when the document came from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// When the document was discovered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the document was last modified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    /// Metadata attached by the last enrichment pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichedMetadata>,
}

impl Document {
    /// Create a new document stamped with the current time
    pub fn new(id: impl Into<DocumentId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding: None,
            categories: BTreeSet::new(),
            analysis_type: None,
            source_file: None,
            created_at: Some(Utc::now()),
            modified_at: None,
            enrichment: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    pub fn with_analysis_type(mut self, analysis_type: impl Into<String>) -> Self {
        self.analysis_type = Some(analysis_type.into());
        self
    }

    pub fn with_source_file(mut self, path: impl Into<String>) -> Self {
        self.source_file = Some(path.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.modified_at = Some(at);
        self
    }

    /// Add a category. Returns false if it was already present.
    pub fn add_category(&mut self, category: impl Into<String>) -> bool {
        self.categories.insert(category.into())
    }

    /// Remove a category. Returns false if it was not present.
    pub fn remove_category(&mut self, category: &str) -> bool {
        self.categories.remove(category)
    }

    /// Dimensionality of the embedding, if one is present
    pub fn embedding_dimension(&self) -> Option<usize> {
        self.embedding.as_ref().map(Vec::len)
    }

    /// Most recent timestamp known for this document
    pub fn last_touched(&self) -> Option<DateTime<Utc>> {
        match (self.created_at, self.modified_at) {
            (Some(c), Some(m)) => Some(c.max(m)),
            (c, m) => m.or(c),
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.enrichment.is_some()
    }
}
