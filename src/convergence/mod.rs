//! Convergence analysis over document embeddings
//!
//! # Architecture
//!
//! - **SimilarityMatrix**: cosine similarity for every unordered pair,
//!   stored as a condensed upper triangle
//! - **UnionFind**: groups documents whose similarity meets the threshold
//! - **ConvergenceAnalysisService**: validates embeddings, builds chains of
//!   at least three members, computes strength, centroid and representative,
//!   and extracts insights
//!
//! # Example
//!
//! ```
//! use consolidator::convergence::{ConvergenceAnalysisService, ConvergenceConfig};
//! use consolidator::document::Document;
//!
//! let service = ConvergenceAnalysisService::new(ConvergenceConfig::default()).unwrap();
//! let docs = vec![
//!     Document::new("a", "").with_embedding(vec![0.9, 0.1]),
//!     Document::new("b", "").with_embedding(vec![0.88, 0.12]),
//!     Document::new("c", "").with_embedding(vec![0.91, 0.09]),
//! ];
//! let analysis = service.analyze_convergence(&docs);
//! assert_eq!(analysis.chains.len(), 1);
//! ```

mod clustering;
mod insights;
mod service;
mod similarity;
mod types;

pub use clustering::UnionFind;
pub use insights::{extract_insights, Insight, InsightKind};
pub use service::ConvergenceAnalysisService;
pub use similarity::{cosine_similarity, SimilarityMatrix};
pub use types::{
    ChainId, ConvergenceAnalysis, ConvergenceChain, ConvergenceConfig, ConvergenceError,
    ConvergenceResult, PairJudgement, SkipReason, SkippedDocument, DEFAULT_STRONG_CONVERGENCE,
    DEFAULT_THRESHOLD, MIN_CHAIN_SIZE,
};
