//! Score formulas and classification rules
//!
//! Every function here is pure; the pipeline feeds them the analysis
//! results for one document at a time.

use super::options::{EnrichmentOptions, ScoreWeights};
use crate::convergence::{ConvergenceChain, Insight, InsightKind};
use crate::document::{
    normalize_score, Breakthrough, BreakthroughKind, DocumentId, IntelligenceType, MAX_SCORE,
};
use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Exponential decay of a timestamp's relevance.
///
/// Returns 1.0 at (or after) `reference`, 0.5 one half-life earlier, and
/// 0.0 when the document has no timestamp at all.
pub fn recency(at: Option<DateTime<Utc>>, reference: DateTime<Utc>, half_life_days: f64) -> f64 {
    let Some(at) = at else {
        return 0.0;
    };
    let age_days = ((reference - at).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0);
    0.5f64.powf(age_days / half_life_days)
}

/// Convergence score for a document; zero outside any chain.
///
/// Non-decreasing in chain strength for a fixed chain size.
pub fn convergence_score(
    chain: Option<&ConvergenceChain>,
    weights: &ScoreWeights,
    size_saturation: usize,
) -> f64 {
    let Some(chain) = chain else {
        return 0.0;
    };
    let size_factor = chain.len().min(size_saturation) as f64 / size_saturation as f64;
    let raw = weights.strength * chain.strength as f64 + weights.size * size_factor;
    normalize_score(MAX_SCORE * raw.clamp(0.0, 1.0))
}

pub fn impact_score(recency: f64, centrality: f64, weights: &ScoreWeights) -> f64 {
    let raw = weights.recency * recency + weights.centrality * centrality;
    normalize_score(MAX_SCORE * raw.clamp(0.0, 1.0))
}

pub fn intelligence_score(convergence: f64, impact: f64) -> f64 {
    normalize_score((convergence + impact) / 2.0)
}

/// First matching rule wins: hub, breakthrough, convergence node, piece.
pub fn classify(
    in_chain: bool,
    centrality: f64,
    has_breakthrough: bool,
    options: &EnrichmentOptions,
) -> IntelligenceType {
    if in_chain && centrality > options.hub_threshold {
        IntelligenceType::KnowledgeHub
    } else if has_breakthrough {
        IntelligenceType::BreakthroughInsight
    } else if in_chain {
        IntelligenceType::ConvergenceNode
    } else {
        IntelligenceType::KnowledgePiece
    }
}

/// Breakthroughs the chain insights attribute to `id`
pub fn breakthroughs_for(id: &DocumentId, insights: &[Insight]) -> Vec<Breakthrough> {
    insights
        .iter()
        .filter_map(|insight| {
            let kind = match &insight.kind {
                InsightKind::CrossCategoryBridge { document, .. } if document == id => {
                    BreakthroughKind::CrossCategoryBridge
                }
                InsightKind::StrongConvergence { representative, .. } if representative == id => {
                    BreakthroughKind::StrongConvergence
                }
                _ => return None,
            };
            Some(Breakthrough {
                kind,
                chain_id: insight.chain_id.clone(),
                description: insight.description.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::ChainId;
    use chrono::{Duration, TimeZone};

    fn chain(size: usize, strength: f32) -> ConvergenceChain {
        let participants: Vec<DocumentId> =
            (0..size).map(|i| DocumentId::new(format!("d{}", i))).collect();
        ConvergenceChain {
            id: ChainId::from_participants(&participants),
            linked_degrees: vec![size - 1; size],
            representative: participants[0].clone(),
            participants,
            strength,
            centroid: Vec::new(),
        }
    }

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn recency_halves_every_half_life() {
        let now = reference();
        assert_eq!(recency(Some(now), now, 30.0), 1.0);
        assert!((recency(Some(now - Duration::days(30)), now, 30.0) - 0.5).abs() < 1e-9);
        assert!((recency(Some(now - Duration::days(60)), now, 30.0) - 0.25).abs() < 1e-9);
        assert_eq!(recency(None, now, 30.0), 0.0);
    }

    #[test]
    fn future_timestamps_count_as_fresh() {
        let now = reference();
        assert_eq!(recency(Some(now + Duration::days(3)), now, 30.0), 1.0);
    }

    #[test]
    fn convergence_zero_outside_chain() {
        assert_eq!(convergence_score(None, &ScoreWeights::default(), 10), 0.0);
    }

    #[test]
    fn convergence_monotone_in_strength() {
        let weights = ScoreWeights::default();
        let mut previous = 0.0;
        for step in 0..=20 {
            let strength = 0.5 + step as f32 * 0.025;
            let score = convergence_score(Some(&chain(4, strength)), &weights, 10);
            assert!(score >= previous, "{} < {} at strength {}", score, previous, strength);
            assert!((0.0..=100.0).contains(&score));
            previous = score;
        }
    }

    #[test]
    fn size_factor_saturates() {
        let weights = ScoreWeights::default();
        let ten = convergence_score(Some(&chain(10, 0.8)), &weights, 10);
        let twenty = convergence_score(Some(&chain(20, 0.8)), &weights, 10);
        assert_eq!(ten, twenty);
        assert!((ten - 84.0).abs() < 1e-4);
    }

    #[test]
    fn heavy_weights_saturate_at_max() {
        let weights = ScoreWeights {
            strength: 5.0,
            size: 5.0,
            recency: 5.0,
            centrality: 5.0,
        };
        assert_eq!(convergence_score(Some(&chain(3, 0.9)), &weights, 10), 100.0);
        assert_eq!(impact_score(1.0, 1.0, &weights), 100.0);
    }

    #[test]
    fn impact_and_intelligence_combine() {
        let weights = ScoreWeights::default();
        let impact = impact_score(0.5, 1.0, &weights);
        assert!((impact - 80.0).abs() < 1e-9);
        assert!((intelligence_score(60.0, impact) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn classification_rule_order() {
        let options = EnrichmentOptions::default();
        assert_eq!(classify(true, 1.0, true, &options), IntelligenceType::KnowledgeHub);
        assert_eq!(classify(true, 0.5, true, &options), IntelligenceType::BreakthroughInsight);
        assert_eq!(classify(true, 0.5, false, &options), IntelligenceType::ConvergenceNode);
        assert_eq!(classify(false, 0.0, false, &options), IntelligenceType::KnowledgePiece);
        // Hub threshold is exclusive
        assert_eq!(classify(true, 0.75, false, &options), IntelligenceType::ConvergenceNode);
    }

    #[test]
    fn breakthroughs_match_only_their_document() {
        let c = chain(3, 0.95);
        let insights = vec![
            Insight {
                chain_id: c.id.clone(),
                kind: InsightKind::StrongConvergence {
                    representative: DocumentId::new("d0"),
                    strength: 0.95,
                },
                description: "strong".into(),
            },
            Insight {
                chain_id: c.id.clone(),
                kind: InsightKind::CrossCategoryBridge {
                    document: DocumentId::new("d2"),
                    categories: vec!["finance".into()],
                },
                description: "bridge".into(),
            },
            Insight {
                chain_id: c.id.clone(),
                kind: InsightKind::SharedTheme {
                    categories: vec!["rust".into()],
                },
                description: "theme".into(),
            },
        ];

        let d0 = breakthroughs_for(&DocumentId::new("d0"), &insights);
        assert_eq!(d0.len(), 1);
        assert_eq!(d0[0].kind, BreakthroughKind::StrongConvergence);

        let d2 = breakthroughs_for(&DocumentId::new("d2"), &insights);
        assert_eq!(d2.len(), 1);
        assert_eq!(d2[0].kind, BreakthroughKind::CrossCategoryBridge);

        assert!(breakthroughs_for(&DocumentId::new("d1"), &insights).is_empty());
    }
}
