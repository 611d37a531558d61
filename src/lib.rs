//! Consolidator: convergence analysis and intelligence enrichment
//!
//! Takes a batch of curated documents with embeddings, finds groups of
//! documents that converge on the same theme, and annotates every document
//! with scores and a classification of its role in the collection.
//!
//! # Core Concepts
//!
//! - **Documents**: curated text with an optional embedding and categories
//! - **Convergence chains**: three or more documents linked by cosine
//!   similarity at or above a threshold, joined transitively
//! - **Enrichment**: convergence, impact and intelligence scores (0–100),
//!   an intelligence type, and breakthroughs found inside chains
//! - **Vector store**: enriched documents persisted as points for search
//!   and collection reports
//!
//! # Example
//!
//! ```
//! use consolidator::{Document, EnrichmentOptions, IntelligenceEnrichmentPipeline};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let docs = vec![
//!     Document::new("a", "kyoto temples").with_embedding(vec![0.9, 0.1]),
//!     Document::new("b", "osaka food").with_embedding(vec![0.88, 0.12]),
//!     Document::new("c", "nara deer").with_embedding(vec![0.91, 0.09]),
//! ];
//! let outcome = runtime
//!     .block_on(IntelligenceEnrichmentPipeline::new().enrich(docs, &EnrichmentOptions::default()))
//!     .unwrap();
//! assert_eq!(outcome.summary.chains, 1);
//! ```

pub mod config;
pub mod convergence;
pub mod document;
pub mod embedding;
pub mod enrichment;
pub mod report;
pub mod storage;

pub use config::{load_config, ConfigError, PipelineConfig};
pub use convergence::{ConvergenceAnalysis, ConvergenceAnalysisService, ConvergenceChain, ConvergenceConfig};
pub use document::{Document, DocumentId, EnrichedMetadata, EnrichmentLevel, IntelligenceType};
pub use embedding::{CachedEmbeddingClient, EmbeddingClient, EmbeddingError};
pub use enrichment::{
    EnrichmentError, EnrichmentOptions, EnrichmentOutcome, EnrichmentSummary,
    IntelligenceEnrichmentPipeline, ProgressEvent, ProgressSink,
};
pub use report::CollectionReport;
pub use storage::{
    index_documents, InMemoryVectorStore, OpenStore, SqliteVectorStore, StorageError,
    StorageResult, VectorPoint, VectorStore,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
