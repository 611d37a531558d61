//! Pipeline configuration loaded from YAML
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Lookup order: an explicit path, then
//! `<config dir>/consolidator/config.yaml`, then built-in defaults.

use crate::embedding::{CachedEmbeddingClient, EmbeddingClient, DEFAULT_CACHE_TTL};
use crate::enrichment::EnrichmentOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_COLLECTION: &str = "knowledge_consolidator";
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub enrichment: EnrichmentOptions,
    /// Vector store collection documents are indexed into
    pub collection: String,
    /// SQLite store location; defaults under the user data directory
    pub store_path: Option<PathBuf>,
    pub search_limit: usize,
    pub score_threshold: Option<f32>,
    /// Lifetime of cached embeddings, in seconds
    pub cache_ttl_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enrichment: EnrichmentOptions::default(),
            collection: DEFAULT_COLLECTION.to_string(),
            store_path: None,
            search_limit: DEFAULT_SEARCH_LIMIT,
            score_threshold: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml(text: &str) -> ConfigResult<Self> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.enrichment
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("collection must not be empty".into()));
        }
        if self.search_limit == 0 {
            return Err(ConfigError::Invalid("search_limit must be greater than zero".into()));
        }
        if let Some(t) = self.score_threshold {
            if !t.is_finite() || !(-1.0..=1.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "score_threshold must be in [-1, 1], got {}",
                    t
                )));
            }
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Wrap `client` in an embedding cache whose entries live for
    /// `cache_ttl_secs`
    pub fn cached_client<C: EmbeddingClient>(&self, client: C) -> CachedEmbeddingClient<C> {
        CachedEmbeddingClient::with_ttl(client, self.cache_ttl())
    }

    /// Configured store path, or the per-user default
    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(default_store_path)
    }
}

/// Load configuration. An explicit `path` must exist; the default location
/// is optional.
pub fn load_config(path: Option<&Path>) -> ConfigResult<PipelineConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(p) => p,
            None => {
                tracing::debug!("no configuration file found, using defaults");
                return Ok(PipelineConfig::default());
            }
        },
    };
    tracing::debug!(path = %path.display(), "loading configuration");
    PipelineConfig::from_yaml(&std::fs::read_to_string(&path)?)
}

/// `~/.config/consolidator/config.yaml` on Linux
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("consolidator").join("config.yaml"))
}

/// `~/.local/share/consolidator/vectors.db` on Linux
pub fn default_store_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("consolidator").join("vectors.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(PipelineConfig::from_yaml("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn nested_enrichment_options_parse() {
        let config = PipelineConfig::from_yaml(
            "collection: notes\nenrichment:\n  threshold: 0.6\n  batch_size: 25\n",
        )
        .unwrap();
        assert_eq!(config.collection, "notes");
        assert_eq!(config.enrichment.threshold, 0.6);
        assert_eq!(config.enrichment.batch_size, 25);
        assert_eq!(config.search_limit, DEFAULT_SEARCH_LIMIT);
    }

    #[test]
    fn invalid_values_are_rejected_after_parse() {
        let err = PipelineConfig::from_yaml("enrichment:\n  threshold: 3.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = PipelineConfig::from_yaml("collection: ''\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = PipelineConfig::from_yaml("enrichment: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "search_limit: 3").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.search_limit, 3);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("absent.yaml").as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    struct FixedClient;

    #[async_trait::async_trait]
    impl EmbeddingClient for FixedClient {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn generate_embedding(
            &self,
            _text: &str,
        ) -> Result<Vec<f32>, crate::embedding::EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }
    }

    #[test]
    fn cached_client_uses_configured_ttl() {
        let config = PipelineConfig::from_yaml("cache_ttl_secs: 5\n").unwrap();
        assert_eq!(config.cached_client(FixedClient).ttl(), Duration::from_secs(5));
        assert_eq!(
            PipelineConfig::default().cached_client(FixedClient).ttl(),
            DEFAULT_CACHE_TTL
        );
    }

    #[test]
    fn store_path_prefers_configured_value() {
        let config = PipelineConfig {
            store_path: Some(PathBuf::from("/tmp/x.db")),
            ..Default::default()
        };
        assert_eq!(config.store_path(), PathBuf::from("/tmp/x.db"));
        assert!(PipelineConfig::default().store_path().ends_with("consolidator/vectors.db"));
    }
}
