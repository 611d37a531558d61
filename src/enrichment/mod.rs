//! Intelligence enrichment over batches of documents
//!
//! The pipeline resolves missing embeddings batch by batch, runs
//! convergence analysis once over the whole input, then scores and
//! classifies every document:
//!
//! - convergence score from chain strength and size
//! - impact score from recency and centrality inside the chain
//! - intelligence score as the mean of the two
//!
//! Documents that cannot be analyzed are kept with zeroed scores and a
//! `degraded` enrichment level.

mod options;
mod pipeline;
mod progress;
mod scoring;
mod summary;


use crate::convergence::ConvergenceError;
use crate::embedding::EmbeddingError;

pub use options::{
    EnrichmentOptions, ScoreWeights, DEFAULT_BATCH_SIZE, DEFAULT_HALF_LIFE_DAYS,
    DEFAULT_HUB_THRESHOLD, DEFAULT_SIZE_SATURATION,
};
pub use pipeline::{EnrichmentOutcome, IntelligenceEnrichmentPipeline};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use scoring::{
    breakthroughs_for, classify, convergence_score, impact_score, intelligence_score, recency,
};
pub use summary::EnrichmentSummary;

/// Errors that abort an enrichment run
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Invalid enrichment options: {0}")]
    InvalidOptions(String),

    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error(transparent)]
    Convergence(#[from] ConvergenceError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

pub type EnrichmentResult<T> = Result<T, EnrichmentError>;
