//! Embedding provider abstraction and caching

mod cache;
mod client;

pub use cache::{CachedEmbeddingClient, DEFAULT_CACHE_TTL};
pub use client::{EmbeddingClient, EmbeddingError};
