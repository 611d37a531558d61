//! Documents and the intelligence metadata enrichment attaches to them

mod metadata;
mod record;

#[cfg(test)]
mod tests;

pub use metadata::{
    normalize_score, Breakthrough, BreakthroughKind, EnrichedMetadata, EnrichmentLevel,
    IntelligenceType, MAX_SCORE,
};
pub use record::{Document, DocumentId};
