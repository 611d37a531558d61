//! Core types for convergence analysis

use crate::document::DocumentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default minimum cosine similarity for two documents to be linked
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// Smallest chain the analysis will ever report
pub const MIN_CHAIN_SIZE: usize = 3;

/// Default chain strength at which the representative counts as a breakthrough
pub const DEFAULT_STRONG_CONVERGENCE: f32 = 0.9;

/// Stable identifier for a convergence chain
///
/// Derived from the ordered participant ids, so the same input order and
/// threshold always produce the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    /// Derive a chain id from its participants (UUID v5 over the joined ids)
    pub fn from_participants(participants: &[DocumentId]) -> Self {
        let joined = participants
            .iter()
            .map(DocumentId::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, joined.as_bytes()).to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A group of at least three documents linked directly or transitively
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceChain {
    pub id: ChainId,
    /// Participants in discovery (input) order
    pub participants: Vec<DocumentId>,
    /// Number of linked partners each participant has inside the chain,
    /// aligned with `participants`
    pub linked_degrees: Vec<usize>,
    /// Mean pairwise similarity over all member pairs
    pub strength: f32,
    /// Mean of the member embeddings
    pub centroid: Vec<f32>,
    /// Member with the highest mean similarity to the others
    pub representative: DocumentId,
}

impl ConvergenceChain {
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.participants.contains(id)
    }

    /// Linked degree of a member over `len - 1`, in `[0, 1]`
    pub fn centrality(&self, id: &DocumentId) -> Option<f64> {
        let position = self.participants.iter().position(|p| p == id)?;
        let others = self.participants.len().saturating_sub(1);
        if others == 0 {
            return Some(0.0);
        }
        Some(self.linked_degrees[position] as f64 / others as f64)
    }
}

/// Similarity verdict for one unordered document pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairJudgement {
    pub a: DocumentId,
    pub b: DocumentId,
    pub similarity: f32,
    /// True when `similarity >= threshold`
    pub linked: bool,
}

/// Why a document was left out of chain analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    MissingEmbedding,
    EmptyEmbedding,
    NonFiniteComponent,
    ZeroNorm,
    DimensionMismatch { expected: usize, actual: usize },
    /// An earlier document in the input already uses this id
    DuplicateId,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEmbedding => write!(f, "missing embedding"),
            Self::EmptyEmbedding => write!(f, "empty embedding"),
            Self::NonFiniteComponent => write!(f, "embedding contains non-finite values"),
            Self::ZeroNorm => write!(f, "embedding has zero norm"),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "embedding dimension {} does not match expected {}",
                actual, expected
            ),
            Self::DuplicateId => write!(f, "duplicate document id"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub id: DocumentId,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Configuration for convergence analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Inclusive similarity threshold for linking two documents
    pub threshold: f32,
    /// Components smaller than this are discarded (never below 3)
    pub min_chain_size: usize,
    /// Required embedding dimensionality; inferred from the first valid
    /// embedding when unset
    pub expected_dimension: Option<usize>,
    /// Chain strength at which the representative is reported as a breakthrough
    pub strong_convergence: f32,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_chain_size: MIN_CHAIN_SIZE,
            expected_dimension: None,
            strong_convergence: DEFAULT_STRONG_CONVERGENCE,
        }
    }
}

impl ConvergenceConfig {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_min_chain_size(mut self, size: usize) -> Self {
        self.min_chain_size = size;
        self
    }

    pub fn with_expected_dimension(mut self, dimension: usize) -> Self {
        self.expected_dimension = Some(dimension);
        self
    }

    /// Reject values the analysis cannot work with
    pub fn validate(&self) -> ConvergenceResult<()> {
        if !self.threshold.is_finite() || !(-1.0..=1.0).contains(&self.threshold) {
            return Err(ConvergenceError::InvalidConfig(format!(
                "threshold must be a finite value in [-1, 1], got {}",
                self.threshold
            )));
        }
        if self.min_chain_size < MIN_CHAIN_SIZE {
            return Err(ConvergenceError::InvalidConfig(format!(
                "min_chain_size must be at least {}, got {}",
                MIN_CHAIN_SIZE, self.min_chain_size
            )));
        }
        if self.expected_dimension == Some(0) {
            return Err(ConvergenceError::InvalidConfig(
                "expected_dimension must be greater than zero".to_string(),
            ));
        }
        if !self.strong_convergence.is_finite() || !(0.0..=1.0).contains(&self.strong_convergence) {
            return Err(ConvergenceError::InvalidConfig(format!(
                "strong_convergence must be in [0, 1], got {}",
                self.strong_convergence
            )));
        }
        Ok(())
    }
}

/// Error types for convergence analysis
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvergenceError {
    #[error("Invalid convergence configuration: {0}")]
    InvalidConfig(String),
}

pub type ConvergenceResult<T> = Result<T, ConvergenceError>;

/// Everything one analysis pass produces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvergenceAnalysis {
    /// Threshold the pass ran with
    pub threshold: f32,
    /// Embedding dimensionality the pass accepted
    pub dimension: Option<usize>,
    /// Number of documents that took part in the pass
    pub analyzed: usize,
    /// Chains, ordered by the input position of their first participant
    pub chains: Vec<ConvergenceChain>,
    /// One judgement per unordered pair of analyzed documents
    pub pairs: Vec<PairJudgement>,
    /// Documents excluded from analysis
    pub skipped: Vec<SkippedDocument>,
    pub insights: Vec<super::Insight>,
}

impl ConvergenceAnalysis {
    /// The chain a document belongs to, if any
    pub fn chain_for(&self, id: &DocumentId) -> Option<&ConvergenceChain> {
        self.chains.iter().find(|c| c.contains(id))
    }

    pub fn is_skipped(&self, id: &DocumentId) -> bool {
        self.skipped.iter().any(|s| &s.id == id)
    }

    pub fn linked_pairs(&self) -> impl Iterator<Item = &PairJudgement> {
        self.pairs.iter().filter(|p| p.linked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_is_deterministic() {
        let ids = vec![DocumentId::new("a"), DocumentId::new("b"), DocumentId::new("c")];
        assert_eq!(ChainId::from_participants(&ids), ChainId::from_participants(&ids));
    }

    #[test]
    fn chain_id_depends_on_order() {
        let forward = vec![DocumentId::new("a"), DocumentId::new("b"), DocumentId::new("c")];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();
        assert_ne!(
            ChainId::from_participants(&forward),
            ChainId::from_participants(&reversed)
        );
    }

    #[test]
    fn default_config_is_valid() {
        let config = ConvergenceConfig::default();
        assert_eq!(config.threshold, 0.7);
        assert_eq!(config.min_chain_size, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_bad_threshold() {
        assert!(ConvergenceConfig::default().with_threshold(f32::NAN).validate().is_err());
        assert!(ConvergenceConfig::default().with_threshold(1.5).validate().is_err());
        assert!(ConvergenceConfig::default().with_threshold(-1.0).validate().is_ok());
    }

    #[test]
    fn config_rejects_chains_smaller_than_three() {
        let err = ConvergenceConfig::default()
            .with_min_chain_size(2)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("min_chain_size"));
    }

    #[test]
    fn centrality_is_degree_over_other_members() {
        let chain = ConvergenceChain {
            id: ChainId::from_string("c"),
            participants: vec!["a".into(), "b".into(), "c".into()],
            linked_degrees: vec![1, 2, 1],
            strength: 0.8,
            centroid: vec![],
            representative: "b".into(),
        };
        assert_eq!(chain.centrality(&"b".into()), Some(1.0));
        assert_eq!(chain.centrality(&"a".into()), Some(0.5));
        assert_eq!(chain.centrality(&"z".into()), None);
    }

    #[test]
    fn skip_reason_serializes_with_tag() {
        let skipped = SkippedDocument {
            id: "doc".into(),
            reason: SkipReason::DimensionMismatch { expected: 768, actual: 3 },
        };
        let value = serde_json::to_value(&skipped).unwrap();
        assert_eq!(value["reason"], "dimension_mismatch");
        assert_eq!(value["expected"], 768);
    }
}
