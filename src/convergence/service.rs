//! ConvergenceAnalysisService: similarity matrix → linked pairs → chains

use super::clustering::UnionFind;
use super::insights::extract_insights;
use super::similarity::{cosine_similarity, SimilarityMatrix};
use super::types::{
    ChainId, ConvergenceAnalysis, ConvergenceChain, ConvergenceConfig, ConvergenceResult,
    PairJudgement, SkipReason, SkippedDocument,
};
use crate::document::{Document, DocumentId};
use std::collections::{HashMap, HashSet};

/// Detects convergence chains over a batch of embedded documents.
///
/// Documents with missing or malformed embeddings are logged and left out;
/// they never abort the pass.
#[derive(Debug, Clone)]
pub struct ConvergenceAnalysisService {
    config: ConvergenceConfig,
}

impl Default for ConvergenceAnalysisService {
    fn default() -> Self {
        Self {
            config: ConvergenceConfig::default(),
        }
    }
}

impl ConvergenceAnalysisService {
    /// Create a service, rejecting invalid configuration
    pub fn new(config: ConvergenceConfig) -> ConvergenceResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    /// Similarity between two documents, if both carry usable embeddings
    pub fn similarity(&self, a: &Document, b: &Document) -> Option<f32> {
        let a = a.embedding.as_deref().filter(|v| !v.is_empty())?;
        let b = b.embedding.as_deref().filter(|v| !v.is_empty())?;
        if a.len() != b.len() {
            return None;
        }
        Some(cosine_similarity(a, b))
    }

    /// Run a full analysis pass over `documents` (input order is discovery order)
    pub fn analyze_convergence(&self, documents: &[Document]) -> ConvergenceAnalysis {
        let (accepted, skipped, dimension) = self.partition(documents);

        let vectors: Vec<&[f32]> = accepted.iter().map(|(_, v)| *v).collect();
        let matrix = SimilarityMatrix::compute(&vectors);

        let mut forest = UnionFind::new(accepted.len());
        let mut degrees = vec![0usize; accepted.len()];
        let mut pairs = Vec::with_capacity(matrix.pair_count());
        for (i, j, similarity) in matrix.pairs() {
            let linked = similarity >= self.config.threshold;
            if linked {
                forest.union(i, j);
                degrees[i] += 1;
                degrees[j] += 1;
            }
            pairs.push(PairJudgement {
                a: accepted[i].0.id.clone(),
                b: accepted[j].0.id.clone(),
                similarity,
                linked,
            });
        }

        let chains: Vec<ConvergenceChain> = forest
            .components()
            .into_iter()
            .filter(|members| members.len() >= self.config.min_chain_size)
            .map(|members| self.build_chain(&members, &accepted, &matrix, &degrees))
            .collect();

        let by_id: HashMap<&DocumentId, &Document> =
            accepted.iter().map(|(doc, _)| (&doc.id, *doc)).collect();
        let insights = chains
            .iter()
            .flat_map(|chain| extract_insights(chain, &by_id, self.config.strong_convergence))
            .collect();

        tracing::debug!(
            analyzed = accepted.len(),
            skipped = skipped.len(),
            chains = chains.len(),
            threshold = self.config.threshold,
            "convergence analysis complete"
        );

        ConvergenceAnalysis {
            threshold: self.config.threshold,
            dimension,
            analyzed: accepted.len(),
            chains,
            pairs,
            skipped,
            insights,
        }
    }

    /// Split documents into analyzable ones and skipped ones, fixing the
    /// expected dimension along the way.
    #[allow(clippy::type_complexity)]
    fn partition<'a>(
        &self,
        documents: &'a [Document],
    ) -> (Vec<(&'a Document, &'a [f32])>, Vec<SkippedDocument>, Option<usize>) {
        let mut dimension = self.config.expected_dimension;
        let mut accepted = Vec::with_capacity(documents.len());
        let mut skipped = Vec::new();

        let mut seen = HashSet::with_capacity(documents.len());
        for doc in documents {
            // The first occurrence of an id owns it, usable embedding or not
            let checked = if seen.insert(&doc.id) {
                check_embedding(doc, dimension)
            } else {
                Err(SkipReason::DuplicateId)
            };
            match checked {
                Ok(vector) => {
                    dimension.get_or_insert(vector.len());
                    accepted.push((doc, vector));
                }
                Err(reason) => {
                    tracing::warn!(
                        document = %doc.id,
                        %reason,
                        "excluding document from convergence analysis"
                    );
                    skipped.push(SkippedDocument {
                        id: doc.id.clone(),
                        reason,
                    });
                }
            }
        }

        (accepted, skipped, dimension)
    }

    fn build_chain(
        &self,
        members: &[usize],
        accepted: &[(&Document, &[f32])],
        matrix: &SimilarityMatrix,
        degrees: &[usize],
    ) -> ConvergenceChain {
        let participants: Vec<DocumentId> =
            members.iter().map(|&i| accepted[i].0.id.clone()).collect();

        // Degrees counted over all accepted documents equal degrees inside the
        // component: a linked partner is always in the same component.
        let linked_degrees: Vec<usize> = members.iter().map(|&i| degrees[i]).collect();

        let dimension = accepted[members[0]].1.len();
        let mut sums = vec![0.0f64; dimension];
        for &i in members {
            for (acc, &x) in sums.iter_mut().zip(accepted[i].1) {
                *acc += x as f64;
            }
        }
        let centroid: Vec<f32> = sums
            .into_iter()
            .map(|sum| (sum / members.len() as f64) as f32)
            .collect();

        // Highest mean similarity to the other members; earliest wins ties
        let mut representative = members[0];
        let mut best = f32::NEG_INFINITY;
        for &i in members {
            let mean: f32 = members
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| matrix.get(i, j))
                .sum::<f32>()
                / (members.len() - 1) as f32;
            if mean > best {
                best = mean;
                representative = i;
            }
        }

        ConvergenceChain {
            id: ChainId::from_participants(&participants),
            strength: matrix.mean_over(members),
            representative: accepted[representative].0.id.clone(),
            participants,
            linked_degrees,
            centroid,
        }
    }
}

/// Validate a document's embedding against the expected dimension
fn check_embedding(doc: &Document, expected: Option<usize>) -> Result<&[f32], SkipReason> {
    let vector = doc
        .embedding
        .as_deref()
        .ok_or(SkipReason::MissingEmbedding)?;
    if vector.is_empty() {
        return Err(SkipReason::EmptyEmbedding);
    }
    if let Some(expected) = expected {
        if vector.len() != expected {
            return Err(SkipReason::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(SkipReason::NonFiniteComponent);
    }
    if vector.iter().all(|x| *x == 0.0) {
        return Err(SkipReason::ZeroNorm);
    }
    Ok(vector)
}
