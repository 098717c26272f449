//! Embedding generation
//!
//! This module provides an abstraction over embedding models with:
//! - A trait for different embedding backends
//! - HTTP embedding backend
//! - Order-preserving batch processing for index builds

mod http_backend;
#[cfg(feature = "local-embed")]
mod fastembed_impl;

pub use http_backend::*;
#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;

use crate::config::{EmbeddingBackendKind, EmbeddingConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::debug;

/// Trait for embedding providers
///
/// Implementations must be deterministic for a fixed model and must not
/// retry internally.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text (one call per incoming question)
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingService("No embedding returned".to_string()))
    }

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.backend_kind()? {
        EmbeddingBackendKind::Http => Ok(Arc::new(HttpEmbedder::new(config)?)),
        #[cfg(feature = "local-embed")]
        EmbeddingBackendKind::Local => Ok(Arc::new(FastEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embed"))]
        EmbeddingBackendKind::Local => Err(Error::Config(
            "Local embeddings require building with the 'local-embed' feature".to_string(),
        )),
    }
}

/// Embed texts in batches, keeping up to `concurrency` batches in flight
///
/// Output order always matches input order, whatever order the batches
/// complete in.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
    concurrency: usize,
    progress: Option<&ProgressBar>,
) -> Result<Vec<Vec<f32>>> {
    let total = texts.len();
    let batches: Vec<Vec<String>> = texts
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect();
    debug!(
        "Embedding {} texts in {} batches ({} in flight)",
        total,
        batches.len(),
        concurrency
    );

    let mut results = futures::stream::iter(batches.into_iter().map(|batch| async move {
        let expected = batch.len();
        let embeddings = embedder.embed(batch).await?;
        if embeddings.len() != expected {
            return Err(Error::EmbeddingService(format!(
                "Expected {} embeddings, got {}",
                expected,
                embeddings.len()
            )));
        }
        Ok::<_, Error>(embeddings)
    }))
    .buffered(concurrency.max(1));

    let mut all_embeddings = Vec::with_capacity(total);
    while let Some(batch) = results.next().await {
        let batch = batch?;
        if let Some(bar) = progress {
            bar.inc(batch.len() as u64);
        }
        all_embeddings.extend(batch);
    }

    Ok(all_embeddings)
}
