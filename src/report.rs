//! Collection report: statistics over stored point payloads

use crate::storage::{ChainPayload, VectorPoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Upper bounds of the convergence score ranges; the last range is open
const SCORE_RANGE_BOUNDS: [f64; 4] = [20.0, 40.0, 60.0, 80.0];

/// Summary statistics over a list of numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; needs at least two values
    pub std_dev: Option<f64>,
}

impl NumericStats {
    /// `None` for an empty list. Non-finite values are ignored.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };
        let std_dev = (count >= 2).then(|| {
            let variance =
                sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        });

        Some(Self {
            count,
            mean,
            median,
            min: sorted[0],
            max: sorted[count - 1],
            std_dev,
        })
    }
}

/// Convergence scores falling in `[lower, upper)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub label: String,
    pub lower: f64,
    pub upper: Option<f64>,
    pub count: usize,
    pub mean: Option<f64>,
}

/// How many points carry each optional payload field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    pub with_source_file: usize,
    pub with_categories: usize,
    pub with_intelligence_type: usize,
    pub with_chains: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionReport {
    pub total_points: usize,
    pub unique_source_files: usize,
    pub categories: BTreeMap<String, usize>,
    pub intelligence_types: BTreeMap<String, usize>,
    pub enrichment_levels: BTreeMap<String, usize>,
    /// Distinct chains by id
    pub chains: usize,
    pub chain_sizes: Option<NumericStats>,
    /// Chain size → number of chains
    pub chain_size_histogram: BTreeMap<usize, usize>,
    pub chain_scores: Option<NumericStats>,
    pub score_ranges: Vec<ScoreRange>,
    pub quality: DataQuality,
}

impl CollectionReport {
    /// Build the report. A chain recorded on several members counts once.
    pub fn from_points(points: &[VectorPoint]) -> Self {
        let mut files = BTreeSet::new();
        let mut categories = BTreeMap::new();
        let mut intelligence_types = BTreeMap::new();
        let mut enrichment_levels = BTreeMap::new();
        let mut seen_chains = HashSet::new();
        let mut chains: Vec<&ChainPayload> = Vec::new();
        let mut quality = DataQuality::default();

        for point in points {
            let payload = &point.payload;
            if payload.has_source_file() {
                quality.with_source_file += 1;
                if let Some(file) = &payload.source_file {
                    files.insert(file.as_str());
                }
            }
            if !payload.categories.is_empty() {
                quality.with_categories += 1;
            }
            for category in &payload.categories {
                *categories.entry(category.clone()).or_default() += 1;
            }
            if let Some(kind) = payload.intelligence_type {
                quality.with_intelligence_type += 1;
                *intelligence_types.entry(kind.to_string()).or_default() += 1;
            }
            if let Some(level) = payload.enrichment_level {
                *enrichment_levels.entry(level.to_string()).or_default() += 1;
            }
            if !payload.convergence_chains.is_empty() {
                quality.with_chains += 1;
            }
            for chain in &payload.convergence_chains {
                if seen_chains.insert(chain.chain_id.clone()) {
                    chains.push(chain);
                }
            }
        }

        let sizes: Vec<f64> = chains.iter().map(|c| c.participants.len() as f64).collect();
        let scores: Vec<f64> = chains.iter().map(|c| c.convergence_score).collect();
        let mut chain_size_histogram = BTreeMap::new();
        for chain in &chains {
            *chain_size_histogram.entry(chain.participants.len()).or_default() += 1;
        }

        Self {
            total_points: points.len(),
            unique_source_files: files.len(),
            categories,
            intelligence_types,
            enrichment_levels,
            chains: chains.len(),
            chain_sizes: NumericStats::from_values(&sizes),
            chain_size_histogram,
            chain_scores: NumericStats::from_values(&scores),
            score_ranges: score_ranges(&scores),
            quality,
        }
    }
}

fn score_ranges(scores: &[f64]) -> Vec<ScoreRange> {
    let mut lower = 0.0;
    let mut ranges = Vec::with_capacity(SCORE_RANGE_BOUNDS.len() + 1);
    for upper in SCORE_RANGE_BOUNDS.iter().copied().map(Some).chain([None]) {
        let members: Vec<f64> = scores
            .iter()
            .copied()
            .filter(|&s| s >= lower && upper.map_or(true, |u| s < u))
            .collect();
        let label = match upper {
            Some(u) => format!("{}-{}", lower, u),
            None => format!("{}+", lower),
        };
        ranges.push(ScoreRange {
            label,
            lower,
            upper,
            count: members.len(),
            mean: NumericStats::from_values(&members).map(|s| s.mean),
        });
        if let Some(u) = upper {
            lower = u;
        }
    }
    ranges
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn write_distribution(
    f: &mut fmt::Formatter<'_>,
    distribution: &BTreeMap<String, usize>,
    total: usize,
) -> fmt::Result {
    if distribution.is_empty() {
        return writeln!(f, "- none recorded");
    }
    let mut ranked: Vec<(&String, &usize)> = distribution.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1));
    for (name, count) in ranked {
        writeln!(f, "- {}: {} points ({:.1}%)", name, count, percent(*count, total))?;
    }
    Ok(())
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total_points;
        writeln!(f, "# Collection Report")?;
        writeln!(f)?;
        writeln!(f, "## Overview")?;
        writeln!(f, "- Total points: {}", total)?;
        writeln!(f, "- Unique source files: {}", self.unique_source_files)?;
        writeln!(f)?;

        writeln!(f, "## Categories")?;
        write_distribution(f, &self.categories, total)?;
        writeln!(f)?;
        writeln!(f, "## Intelligence Types")?;
        write_distribution(f, &self.intelligence_types, total)?;
        writeln!(f)?;
        writeln!(f, "## Enrichment Levels")?;
        write_distribution(f, &self.enrichment_levels, total)?;
        writeln!(f)?;

        writeln!(f, "## Convergence Chains")?;
        match &self.chain_sizes {
            Some(sizes) => {
                writeln!(f, "- Chains: {}", self.chains)?;
                writeln!(f, "- Mean participants: {:.1}", sizes.mean)?;
                writeln!(f, "- Median participants: {:.1}", sizes.median)?;
                writeln!(f, "- Largest: {}", sizes.max)?;
                writeln!(f, "- Smallest: {}", sizes.min)?;
                for (size, count) in &self.chain_size_histogram {
                    writeln!(f, "  * {} participants: {} chains", size, count)?;
                }
            }
            None => writeln!(f, "- no chains recorded")?,
        }
        writeln!(f)?;

        writeln!(f, "## Convergence Scores")?;
        match &self.chain_scores {
            Some(scores) => {
                writeln!(f, "- Mean: {:.2}", scores.mean)?;
                writeln!(f, "- Median: {:.2}", scores.median)?;
                writeln!(f, "- Range: {:.2} to {:.2}", scores.min, scores.max)?;
                if let Some(sd) = scores.std_dev {
                    writeln!(f, "- Standard deviation: {:.2}", sd)?;
                }
                for range in self.score_ranges.iter().filter(|r| r.count > 0) {
                    writeln!(
                        f,
                        "  * {}: {} chains (mean {:.2})",
                        range.label,
                        range.count,
                        range.mean.unwrap_or_default()
                    )?;
                }
            }
            None => writeln!(f, "- no scores recorded")?,
        }
        writeln!(f)?;

        let q = &self.quality;
        writeln!(f, "## Data Quality")?;
        for (label, count) in [
            ("source file", q.with_source_file),
            ("categories", q.with_categories),
            ("intelligence type", q.with_intelligence_type),
            ("convergence chains", q.with_chains),
        ] {
            writeln!(
                f,
                "- Points with {}: {}/{} ({:.1}%)",
                label,
                count,
                total,
                percent(count, total)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::ChainId;
    use crate::document::{DocumentId, EnrichmentLevel, IntelligenceType};
    use crate::storage::PointPayload;

    fn chain(id: &str, size: usize, score: f64) -> ChainPayload {
        ChainPayload {
            chain_id: ChainId::from_string(id),
            participants: (0..size).map(|i| DocumentId::new(format!("{}-{}", id, i))).collect(),
            convergence_score: score,
        }
    }

    fn point(id: &str, payload: PointPayload) -> VectorPoint {
        VectorPoint {
            id: DocumentId::new(id),
            vector: vec![1.0],
            payload,
        }
    }

    #[test]
    fn stats_match_hand_computed_values() {
        let stats = NumericStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.count, 8);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.median, 4.5);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        // sqrt(32 / 7)
        assert!((stats.std_dev.unwrap() - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn single_value_has_no_std_dev() {
        let stats = NumericStats::from_values(&[3.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert!(stats.std_dev.is_none());
        assert!(NumericStats::from_values(&[]).is_none());
    }

    #[test]
    fn chains_shared_by_members_count_once() {
        let shared = chain("c1", 3, 86.0);
        let member = |id: &str, file: &str| {
            point(
                id,
                PointPayload {
                    source_file: Some(file.into()),
                    categories: vec!["travel".into()],
                    intelligence_type: Some(IntelligenceType::ConvergenceNode),
                    enrichment_level: Some(EnrichmentLevel::Convergent),
                    convergence_chains: vec![shared.clone()],
                    ..Default::default()
                },
            )
        };
        let points = vec![
            member("a", "a.md"),
            member("b", "b.md"),
            member("c", "a.md"),
            point("d", PointPayload::default()),
        ];

        let report = CollectionReport::from_points(&points);
        assert_eq!(report.total_points, 4);
        assert_eq!(report.unique_source_files, 2);
        assert_eq!(report.chains, 1);
        assert_eq!(report.chain_size_histogram.get(&3), Some(&1));
        assert_eq!(report.categories["travel"], 3);
        assert_eq!(report.intelligence_types["convergence_node"], 3);
        assert_eq!(report.quality.with_chains, 3);
        assert_eq!(report.quality.with_source_file, 3);
    }

    #[test]
    fn score_ranges_partition_scores() {
        let points = vec![
            point(
                "a",
                PointPayload {
                    convergence_chains: vec![chain("low", 3, 10.0), chain("mid", 4, 55.0)],
                    ..Default::default()
                },
            ),
            point(
                "b",
                PointPayload {
                    convergence_chains: vec![chain("edge", 3, 80.0), chain("top", 5, 95.0)],
                    ..Default::default()
                },
            ),
        ];
        let report = CollectionReport::from_points(&points);
        let counts: Vec<usize> = report.score_ranges.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 2]);
        assert_eq!(report.score_ranges[4].label, "80+");
        assert_eq!(report.score_ranges[4].mean, Some(87.5));
    }

    #[test]
    fn markdown_renders_every_section() {
        let report = CollectionReport::from_points(&[]);
        let text = report.to_string();
        for heading in ["## Overview", "## Categories", "## Convergence Chains", "## Data Quality"] {
            assert!(text.contains(heading), "missing {}", heading);
        }
        assert!(text.contains("- no chains recorded"));
    }
}
