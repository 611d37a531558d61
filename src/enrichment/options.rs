//! Enrichment options and validation

use super::EnrichmentError;
use crate::convergence::{ConvergenceConfig, DEFAULT_STRONG_CONVERGENCE, DEFAULT_THRESHOLD, MIN_CHAIN_SIZE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_HUB_THRESHOLD: f64 = 0.75;
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;
pub const DEFAULT_SIZE_SATURATION: usize = 10;

/// Weights combining the raw signals into scores.
///
/// `strength + size` feed the convergence score, `recency + centrality`
/// feed the impact score. Each combination is clamped to `[0, 1]` before
/// scaling, so weights that sum past one saturate instead of overflowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub strength: f64,
    pub size: f64,
    pub recency: f64,
    pub centrality: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            strength: 0.8,
            size: 0.2,
            recency: 0.4,
            centrality: 0.6,
        }
    }
}

/// Options for one enrichment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentOptions {
    /// When false, documents come back untouched
    pub enabled: bool,
    /// Inclusive similarity threshold for linking documents
    pub threshold: f32,
    pub min_chain_size: usize,
    pub batch_size: usize,
    /// Embed documents that arrive without a vector (needs a client)
    pub generate_missing_embeddings: bool,
    /// Centrality above which a chain member is a knowledge hub
    pub hub_threshold: f64,
    pub strong_convergence: f32,
    pub half_life_days: f64,
    /// Chain size at which the size factor saturates
    pub size_saturation: usize,
    /// Age reference for recency; defaults to the newest timestamp in the input
    pub reference_time: Option<DateTime<Utc>>,
    pub weights: ScoreWeights,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_THRESHOLD,
            min_chain_size: MIN_CHAIN_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            generate_missing_embeddings: true,
            hub_threshold: DEFAULT_HUB_THRESHOLD,
            strong_convergence: DEFAULT_STRONG_CONVERGENCE,
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
            size_saturation: DEFAULT_SIZE_SATURATION,
            reference_time: None,
            weights: ScoreWeights::default(),
        }
    }
}

impl EnrichmentOptions {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_generate_missing_embeddings(mut self, generate: bool) -> Self {
        self.generate_missing_embeddings = generate;
        self
    }

    pub fn with_reference_time(mut self, at: DateTime<Utc>) -> Self {
        self.reference_time = Some(at);
        self
    }

    pub fn with_hub_threshold(mut self, threshold: f64) -> Self {
        self.hub_threshold = threshold;
        self
    }

    /// The analysis configuration these options imply
    pub fn convergence_config(&self) -> ConvergenceConfig {
        ConvergenceConfig {
            threshold: self.threshold,
            min_chain_size: self.min_chain_size,
            expected_dimension: None,
            strong_convergence: self.strong_convergence,
        }
    }

    pub fn validate(&self) -> Result<(), EnrichmentError> {
        self.convergence_config()
            .validate()
            .map_err(|e| EnrichmentError::InvalidOptions(e.to_string()))?;

        if self.batch_size == 0 {
            return Err(invalid("batch_size must be greater than zero"));
        }
        if !self.hub_threshold.is_finite() || !(0.0..=1.0).contains(&self.hub_threshold) {
            return Err(invalid(format!(
                "hub_threshold must be in [0, 1], got {}",
                self.hub_threshold
            )));
        }
        if !self.half_life_days.is_finite() || self.half_life_days <= 0.0 {
            return Err(invalid(format!(
                "half_life_days must be positive, got {}",
                self.half_life_days
            )));
        }
        if self.size_saturation == 0 {
            return Err(invalid("size_saturation must be greater than zero"));
        }

        let w = &self.weights;
        for (name, value) in [
            ("strength", w.strength),
            ("size", w.size),
            ("recency", w.recency),
            ("centrality", w.centrality),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "weight {} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> EnrichmentError {
    EnrichmentError::InvalidOptions(message.into())
}
