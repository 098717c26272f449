//! In-process embeddings through fastembed (`local-embed` feature)

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// fastembed model for a configured model id
fn local_model(model_id: &str) -> Option<EmbeddingModel> {
    match model_id {
        "sentence-transformers/all-MiniLM-L6-v2" => Some(EmbeddingModel::AllMiniLML6V2),
        "BAAI/bge-small-en-v1.5" => Some(EmbeddingModel::BGESmallENV15),
        "BAAI/bge-base-en-v1.5" => Some(EmbeddingModel::BGEBaseENV15),
        "BAAI/bge-large-en-v1.5" => Some(EmbeddingModel::BGELargeENV15),
        _ => None,
    }
}

/// Embedder running the model inside this process
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_id: String,
    dimension: usize,
}

impl FastEmbedder {
    /// Load (downloading on first use) the configured model
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = local_model(&config.model).ok_or_else(|| {
            Error::Config(format!(
                "Model '{}' is not available for local embeddings",
                config.model
            ))
        })?;

        info!("Loading local embedding model {}", config.model);
        let text_embedding =
            TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(true))
                .map_err(|e| {
                    Error::EmbeddingService(format!("Failed to load {}: {}", config.model, e))
                })?;

        Ok(Self {
            model: Arc::new(Mutex::new(text_embedding)),
            model_id: config.model.clone(),
            dimension: config.resolved_dimension(),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Embedding {} texts locally", texts.len());

        // fastembed blocks; keep it off the async workers
        let model = Arc::clone(&self.model);
        let embeddings = tokio::task::spawn_blocking(move || model.blocking_lock().embed(texts, None))
            .await
            .map_err(|e| Error::EmbeddingService(format!("Embedding task failed: {}", e)))?
            .map_err(|e| Error::EmbeddingService(e.to_string()))?;

        if let Some(vector) = embeddings.iter().find(|v| v.len() != self.dimension) {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}
