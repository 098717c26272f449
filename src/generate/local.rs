use super::{status_error, transport_error, Generator};
use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    max_new_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Single(GeneratedText),
    Batch(Vec<GeneratedText>),
}

/// Generator backed by a self-hosted text-generation server
pub struct LocalGenerator {
    client: Client,
    base_url: Url,
    model: String,
}

impl LocalGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Self::with_timeout(&config.url, &config.model, config.timeout())
    }

    pub fn with_timeout(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid generation URL: {}", e)))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Generator for LocalGenerator {
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        let url = self
            .base_url
            .join("/generate")
            .map_err(|e| Error::Config(format!("Invalid generation URL: {}", e)))?;
        let request = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens: max_tokens,
            },
        };
        debug!("Generating up to {} tokens with {}", max_tokens, self.model);

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed: GenerateResponse = response.json().await.map_err(transport_error)?;
        match parsed {
            GenerateResponse::Single(output) => Ok(output.generated_text),
            GenerateResponse::Batch(outputs) => outputs
                .into_iter()
                .next()
                .map(|output| output.generated_text)
                .ok_or_else(|| Error::generation(None, "empty generation response")),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
