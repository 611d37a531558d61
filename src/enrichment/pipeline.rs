//! IntelligenceEnrichmentPipeline: embedding resolution → convergence → scores

use super::options::EnrichmentOptions;
use super::progress::{NoProgress, ProgressEvent, ProgressSink};
use super::scoring::{
    breakthroughs_for, classify, convergence_score, impact_score, intelligence_score, recency,
};
use super::summary::EnrichmentSummary;
use super::{EnrichmentError, EnrichmentResult};
use crate::convergence::{
    ConvergenceAnalysis, ConvergenceAnalysisService, ConvergenceChain, Insight, SkipReason,
};
use crate::document::{Document, DocumentId, EnrichedMetadata, EnrichmentLevel};
use crate::embedding::{EmbeddingClient, EmbeddingError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Documents in input order, annotated, plus what the run found
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentOutcome {
    pub documents: Vec<Document>,
    pub summary: EnrichmentSummary,
    pub analysis: ConvergenceAnalysis,
}

/// Annotates batches of approved documents with intelligence metadata.
///
/// The embedding client is optional; without one, documents lacking an
/// embedding are scored as degraded.
#[derive(Clone, Default)]
pub struct IntelligenceEnrichmentPipeline {
    client: Option<Arc<dyn EmbeddingClient>>,
}

impl std::fmt::Debug for IntelligenceEnrichmentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntelligenceEnrichmentPipeline")
            .field("client", &self.client.as_ref().map(|c| c.model_name().to_string()))
            .finish()
    }
}

impl IntelligenceEnrichmentPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: Arc<dyn EmbeddingClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub async fn enrich(
        &self,
        documents: Vec<Document>,
        options: &EnrichmentOptions,
    ) -> EnrichmentResult<EnrichmentOutcome> {
        self.enrich_with_progress(documents, options, &NoProgress).await
    }

    /// Enrich `batch` as one self-contained unit: chains are detected within
    /// the batch only. For callers that split their collection themselves.
    pub async fn enrich_batch(
        &self,
        batch: Vec<Document>,
        options: &EnrichmentOptions,
    ) -> EnrichmentResult<EnrichmentOutcome> {
        let options = EnrichmentOptions {
            batch_size: batch.len().max(1),
            ..options.clone()
        };
        self.enrich(batch, &options).await
    }

    pub async fn enrich_with_progress(
        &self,
        mut documents: Vec<Document>,
        options: &EnrichmentOptions,
        progress: &dyn ProgressSink,
    ) -> EnrichmentResult<EnrichmentOutcome> {
        options.validate()?;

        if !options.enabled {
            tracing::debug!(documents = documents.len(), "enrichment disabled, passing through");
            let summary = EnrichmentSummary::disabled(documents.len());
            return Ok(EnrichmentOutcome {
                documents,
                summary,
                analysis: ConvergenceAnalysis::default(),
            });
        }

        let total = documents.len();
        let batches = total.div_ceil(options.batch_size);
        progress.report(ProgressEvent::Started { total, batches });

        // Earlier annotations never feed into a new pass
        for doc in documents.iter_mut() {
            doc.enrichment = None;
        }

        // Keyed by input position: ids are not guaranteed unique
        let mut failures: HashMap<usize, String> = HashMap::new();
        let mut generated = 0;
        for (index, batch) in documents.chunks_mut(options.batch_size).enumerate() {
            let failed_before = failures.len();
            let offset = index * options.batch_size;
            let batch_generated = self
                .resolve_embeddings(batch, offset, options, &mut failures)
                .await?;
            generated += batch_generated;
            progress.report(ProgressEvent::BatchEmbedded {
                batch: index + 1,
                generated: batch_generated,
                failed: failures.len() - failed_before,
            });
        }

        let service = ConvergenceAnalysisService::new(options.convergence_config())?;
        let analysis = service.analyze_convergence(&documents);
        progress.report(ProgressEvent::ChainsDetected {
            chains: analysis.chains.len(),
            skipped: analysis.skipped.len(),
        });

        let reference = options
            .reference_time
            .or_else(|| documents.iter().filter_map(Document::last_touched).max())
            .unwrap_or_else(Utc::now);
        let scorer = Scorer::new(&analysis, reference, options);

        let mut processed = 0;
        let mut seen: HashSet<DocumentId> = HashSet::with_capacity(total);
        for (index, batch) in documents.chunks_mut(options.batch_size).enumerate() {
            for (position, doc) in (processed..).zip(batch.iter_mut()) {
                let metadata = if seen.insert(doc.id.clone()) {
                    scorer.score(doc, failures.get(&position))
                } else {
                    EnrichedMetadata::degraded(SkipReason::DuplicateId.to_string())
                };
                doc.enrichment = Some(metadata);
            }
            processed += batch.len();
            tracing::debug!(batch = index + 1, batches, processed, total, "batch scored");
            progress.report(ProgressEvent::BatchScored {
                batch: index + 1,
                batches,
                processed,
                total,
            });
        }

        let mut summary = EnrichmentSummary::collect(&documents, &analysis);
        summary.embeddings_generated = generated;
        summary.embedding_failures = failures.len();
        summary.batches = batches;

        tracing::info!(
            documents = total,
            enriched = summary.enriched,
            degraded = summary.degraded,
            chains = summary.chains,
            "enrichment complete"
        );
        progress.report(ProgressEvent::Finished {
            enriched: summary.enriched,
            degraded: summary.degraded,
        });

        Ok(EnrichmentOutcome {
            documents,
            summary,
            analysis,
        })
    }

    /// Embed documents of `batch` that have no vector yet.
    ///
    /// Per-document failures land in `failures` under their input position
    /// (`offset` + index in batch); a systemic provider failure aborts the
    /// run. Returns how many embeddings were generated.
    async fn resolve_embeddings(
        &self,
        batch: &mut [Document],
        offset: usize,
        options: &EnrichmentOptions,
        failures: &mut HashMap<usize, String>,
    ) -> EnrichmentResult<usize> {
        let Some(client) = self.client.as_ref() else {
            return Ok(0);
        };
        if !options.generate_missing_embeddings {
            return Ok(0);
        }

        let missing: Vec<usize> = batch
            .iter()
            .enumerate()
            .filter(|(_, doc)| doc.embedding.as_ref().map_or(true, |v| v.is_empty()))
            .map(|(i, _)| i)
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = missing.iter().map(|&i| batch[i].content.as_str()).collect();
        let mut results = client.embed_batch(&texts).await.into_iter();

        let mut generated = 0;
        for index in missing {
            let doc = &mut batch[index];
            let result = results.next().unwrap_or(Err(EmbeddingError::EmptyResult));
            match result {
                Ok(vector) if !vector.is_empty() => {
                    doc.embedding = Some(vector);
                    generated += 1;
                }
                Ok(_) => {
                    record_failure(failures, offset + index, &doc.id, EmbeddingError::EmptyResult);
                }
                Err(e) if e.is_systemic() => {
                    tracing::warn!(document = %doc.id, error = %e, "embedding provider unavailable");
                    return Err(EnrichmentError::EmbeddingUnavailable(e.to_string()));
                }
                Err(e) => record_failure(failures, offset + index, &doc.id, e),
            }
        }
        Ok(generated)
    }
}

fn record_failure(
    failures: &mut HashMap<usize, String>,
    position: usize,
    id: &DocumentId,
    error: EmbeddingError,
) {
    tracing::warn!(document = %id, position, error = %error, "embedding generation failed");
    failures.insert(position, format!("embedding generation failed: {}", error));
}

/// Per-run lookup tables for scoring documents one at a time
struct Scorer<'a> {
    options: &'a EnrichmentOptions,
    reference: DateTime<Utc>,
    chains: HashMap<&'a DocumentId, &'a ConvergenceChain>,
    skipped: HashMap<&'a DocumentId, &'a SkipReason>,
    insights: &'a [Insight],
}

impl<'a> Scorer<'a> {
    fn new(
        analysis: &'a ConvergenceAnalysis,
        reference: DateTime<Utc>,
        options: &'a EnrichmentOptions,
    ) -> Self {
        let chains = analysis
            .chains
            .iter()
            .flat_map(|chain| chain.participants.iter().map(move |id| (id, chain)))
            .collect();
        // Repeated ids are handled by position in the caller; the id itself
        // belongs to its first occurrence.
        let skipped = analysis
            .skipped
            .iter()
            .filter(|s| s.reason != SkipReason::DuplicateId)
            .map(|s| (&s.id, &s.reason))
            .collect();
        Self {
            options,
            reference,
            chains,
            skipped,
            insights: &analysis.insights,
        }
    }

    fn score(&self, doc: &Document, failure: Option<&String>) -> EnrichedMetadata {
        if let Some(failure) = failure {
            return EnrichedMetadata::degraded(failure.clone());
        }
        if let Some(reason) = self.skipped.get(&doc.id) {
            return EnrichedMetadata::degraded(reason.to_string());
        }

        let options = self.options;
        let chain = self.chains.get(&doc.id).copied();
        let centrality = chain.and_then(|c| c.centrality(&doc.id)).unwrap_or(0.0);

        let convergence = convergence_score(chain, &options.weights, options.size_saturation);
        let fresh = recency(doc.last_touched(), self.reference, options.half_life_days);
        let impact = impact_score(fresh, centrality, &options.weights);

        let breakthroughs = breakthroughs_for(&doc.id, self.insights);
        let intelligence_type =
            classify(chain.is_some(), centrality, !breakthroughs.is_empty(), options);

        EnrichedMetadata {
            convergence_score: convergence,
            impact_score: impact,
            intelligence_score: intelligence_score(convergence, impact),
            intelligence_type,
            breakthroughs,
            chain_ids: chain.map(|c| vec![c.id.clone()]).unwrap_or_default(),
            centrality,
            enrichment_level: if chain.is_some() {
                EnrichmentLevel::Convergent
            } else {
                EnrichmentLevel::Basic
            },
            failure: None,
        }
    }
}
