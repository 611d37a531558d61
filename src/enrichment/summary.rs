//! Batch-level aggregation of enrichment results

use crate::convergence::ConvergenceAnalysis;
use crate::document::{Document, EnrichmentLevel, IntelligenceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts and distributions across one enrichment run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSummary {
    /// False when the run was disabled and documents were passed through
    pub enabled: bool,
    pub total_documents: usize,
    /// Documents carrying non-degraded metadata
    pub enriched: usize,
    pub degraded: usize,
    /// Documents excluded from convergence analysis
    pub skipped: usize,
    pub embeddings_generated: usize,
    pub embedding_failures: usize,
    pub batches: usize,
    pub chains: usize,
    pub largest_chain: usize,
    pub mean_chain_strength: f64,
    pub breakthroughs: usize,
    pub average_intelligence_score: f64,
    pub intelligence_types: BTreeMap<IntelligenceType, usize>,
    pub enrichment_levels: BTreeMap<EnrichmentLevel, usize>,
}

impl EnrichmentSummary {
    pub(crate) fn disabled(total_documents: usize) -> Self {
        Self {
            enabled: false,
            total_documents,
            ..Default::default()
        }
    }

    /// Aggregate over enriched documents and the analysis that produced them
    pub fn collect(documents: &[Document], analysis: &ConvergenceAnalysis) -> Self {
        let mut summary = Self {
            enabled: true,
            total_documents: documents.len(),
            skipped: analysis.skipped.len(),
            chains: analysis.chains.len(),
            largest_chain: analysis.chains.iter().map(|c| c.len()).max().unwrap_or(0),
            ..Default::default()
        };
        if !analysis.chains.is_empty() {
            summary.mean_chain_strength = analysis
                .chains
                .iter()
                .map(|c| c.strength as f64)
                .sum::<f64>()
                / analysis.chains.len() as f64;
        }

        let mut score_total = 0.0;
        for meta in documents.iter().filter_map(|d| d.enrichment.as_ref()) {
            if meta.is_degraded() {
                summary.degraded += 1;
            } else {
                summary.enriched += 1;
            }
            summary.breakthroughs += meta.breakthroughs.len();
            score_total += meta.intelligence_score;
            *summary.intelligence_types.entry(meta.intelligence_type).or_default() += 1;
            *summary.enrichment_levels.entry(meta.enrichment_level).or_default() += 1;
        }
        let scored = summary.enriched + summary.degraded;
        if scored > 0 {
            summary.average_intelligence_score = score_total / scored as f64;
        }
        summary
    }

    pub fn count_of(&self, kind: IntelligenceType) -> usize {
        self.intelligence_types.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EnrichedMetadata;

    #[test]
    fn empty_input_yields_zeroed_summary() {
        let summary = EnrichmentSummary::collect(&[], &ConvergenceAnalysis::default());
        assert!(summary.enabled);
        assert_eq!(summary.total_documents, 0);
        assert_eq!(summary.average_intelligence_score, 0.0);
        assert!(summary.intelligence_types.is_empty());
    }

    #[test]
    fn degraded_documents_are_counted_separately() {
        let mut ok = Document::new("ok", "");
        ok.enrichment = Some(EnrichedMetadata {
            enrichment_level: EnrichmentLevel::Basic,
            failure: None,
            intelligence_score: 40.0,
            ..EnrichedMetadata::degraded("")
        });
        let mut bad = Document::new("bad", "");
        bad.enrichment = Some(EnrichedMetadata::degraded("missing embedding"));

        let summary = EnrichmentSummary::collect(&[ok, bad], &ConvergenceAnalysis::default());
        assert_eq!(summary.enriched, 1);
        assert_eq!(summary.degraded, 1);
        assert_eq!(summary.average_intelligence_score, 20.0);
        assert_eq!(summary.count_of(IntelligenceType::KnowledgePiece), 2);
        assert_eq!(summary.enrichment_levels[&EnrichmentLevel::Degraded], 1);
    }

    #[test]
    fn distributions_serialize_as_string_keys() {
        let mut summary = EnrichmentSummary::default();
        summary.intelligence_types.insert(IntelligenceType::KnowledgeHub, 2);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["intelligence_types"]["knowledge_hub"], 2);
    }
}
