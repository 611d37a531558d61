//! Intelligence metadata attached to documents by enrichment

use crate::convergence::ChainId;
use serde::{Deserialize, Serialize};

/// Upper bound of every persisted score
pub const MAX_SCORE: f64 = 100.0;

/// Clamp a score into `[0, MAX_SCORE]`. NaN collapses to zero.
pub fn normalize_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_SCORE)
}

/// Heuristic classification of a document's role in the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntelligenceType {
    /// Stand-alone document with no convergence signal
    #[default]
    KnowledgePiece,
    /// Member of a convergence chain
    ConvergenceNode,
    /// Carries at least one breakthrough
    BreakthroughInsight,
    /// Highly central member of a convergence chain
    KnowledgeHub,
}

impl IntelligenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnowledgePiece => "knowledge_piece",
            Self::ConvergenceNode => "convergence_node",
            Self::BreakthroughInsight => "breakthrough_insight",
            Self::KnowledgeHub => "knowledge_hub",
        }
    }
}

impl std::fmt::Display for IntelligenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of the enrichment could actually be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentLevel {
    /// Default scores: the document could not take part in analysis
    Degraded,
    /// Scored, but not part of any chain
    Basic,
    /// Scored as a member of a convergence chain
    Convergent,
}

impl EnrichmentLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Degraded => "degraded",
            Self::Basic => "basic",
            Self::Convergent => "convergent",
        }
    }
}

impl std::fmt::Display for EnrichmentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakthroughKind {
    /// Links a chain to categories the rest of the chain does not share
    CrossCategoryBridge,
    /// Representative of an unusually tight chain
    StrongConvergence,
}

/// A notable finding about a document inside a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakthrough {
    pub kind: BreakthroughKind,
    pub chain_id: ChainId,
    pub description: String,
}

/// Scores and classification produced by one enrichment pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMetadata {
    /// Participation in chains weighted by chain strength, 0–100
    pub convergence_score: f64,
    /// Recency combined with chain centrality, 0–100
    pub impact_score: f64,
    /// Mean of convergence and impact, 0–100
    pub intelligence_score: f64,
    pub intelligence_type: IntelligenceType,
    #[serde(default)]
    pub breakthroughs: Vec<Breakthrough>,
    /// Chains this document participates in
    #[serde(default)]
    pub chain_ids: Vec<ChainId>,
    /// Linked degree inside the chain over `chain size - 1`
    #[serde(default)]
    pub centrality: f64,
    pub enrichment_level: EnrichmentLevel,
    /// Why the document was scored with defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl EnrichedMetadata {
    /// Zeroed metadata for a document that could not be analyzed
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            convergence_score: 0.0,
            impact_score: 0.0,
            intelligence_score: 0.0,
            intelligence_type: IntelligenceType::default(),
            breakthroughs: Vec::new(),
            chain_ids: Vec::new(),
            centrality: 0.0,
            enrichment_level: EnrichmentLevel::Degraded,
            failure: Some(reason.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.enrichment_level == EnrichmentLevel::Degraded
    }
}
