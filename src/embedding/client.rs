//! EmbeddingClient trait: the boundary to an external embedding provider

use async_trait::async_trait;

/// Error type for embedding operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmbeddingError {
    /// The provider could not be reached; affects every document
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),
    /// Nothing to embed
    #[error("cannot embed empty text")]
    EmptyInput,
    /// The provider answered without a vector
    #[error("embedding returned no results")]
    EmptyResult,
    /// The provider rejected or failed on this particular text
    #[error("embedding model error: {0}")]
    ModelError(String),
}

impl EmbeddingError {
    /// Systemic errors abort a batch; the rest only affect one document.
    pub fn is_systemic(&self) -> bool {
        matches!(self, EmbeddingError::Unavailable(_))
    }
}

/// Trait for turning text into vectors.
///
/// Production implementations call an embedding server over HTTP; tests
/// use deterministic in-process clients. Retries are the caller's business.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Identifies the model behind this client (e.g. "nomic-embed-text")
    fn model_name(&self) -> &str;

    /// Embed one text.
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts, one result per text, in order.
    ///
    /// The default implementation awaits `generate_embedding` sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> Vec<Result<Vec<f32>, EmbeddingError>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.generate_embedding(text).await);
        }
        results
    }
}
