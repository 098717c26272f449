//! Text generation backends
//!
//! The answer pipeline only needs "prompt in, text out". Two backends are
//! provided:
//! - [`LocalGenerator`]: a self-hosted text-generation server
//! - [`RemoteGenerator`]: an OpenAI-compatible chat-completions API

mod local;
mod remote;

pub use local::*;
pub use remote::*;

use crate::config::{GenerationBackendKind, GenerationConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for text generation providers
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate at most `max_tokens` tokens for `prompt`
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Create a generator based on configuration
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.backend_kind()? {
        GenerationBackendKind::Local => Ok(Arc::new(LocalGenerator::new(config)?)),
        GenerationBackendKind::Remote => Ok(Arc::new(RemoteGenerator::new(config)?)),
    }
}

/// Map a transport-level failure to a status-less generation error
fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::generation(None, format!("request timed out: {}", err))
    } else {
        Error::generation(None, err.to_string())
    }
}

/// Turn a non-success response into a generation error carrying its status
async fn status_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Error::generation(Some(status.as_u16()), body)
}
