use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Serialize)]
struct EmbedTextRequest<'a> {
    model: &'a str,
    inputs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Embeddings { embeddings: Vec<Vec<f32>> },
    Vectors { vectors: Vec<Vec<f32>> },
    Data { data: Vec<EmbeddingData> },
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_embeddings(self) -> Vec<Vec<f32>> {
        match self {
            EmbeddingResponse::Embeddings { embeddings } => embeddings,
            EmbeddingResponse::Vectors { vectors } => vectors,
            EmbeddingResponse::Data { data } => data.into_iter().map(|d| d.embedding).collect(),
        }
    }
}

/// Embedder backed by an HTTP embedding server
pub struct HttpEmbedder {
    client: Client,
    base_url: Url,
    model_id: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Self::with_timeout(
            &config.backend_url,
            &config.model,
            config.resolved_dimension(),
            config.timeout(),
        )
    }

    pub fn with_timeout(
        base_url: &str,
        model_id: &str,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid embedding backend URL: {}", e)))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            model_id: model_id.to_string(),
            dimension,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid embedding backend URL: {}", e)))
    }

    fn validate_dimensions(&self, embeddings: &[Vec<f32>]) -> Result<()> {
        if let Some(mismatch) = embeddings.iter().find(|vec| vec.len() != self.dimension) {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: mismatch.len(),
            });
        }
        Ok(())
    }
}

fn service_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::EmbeddingService(format!("request timed out: {}", err))
    } else {
        Error::EmbeddingService(err.to_string())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected = texts.len();
        let url = self.endpoint("/v1/embed/text")?;
        let request = EmbedTextRequest {
            model: &self.model_id,
            inputs: texts,
        };
        debug!("Embedding {} texts with {}", expected, self.model_id);

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(service_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::EmbeddingService(format!(
                "backend returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(service_error)?;
        let embeddings = parsed.into_embeddings();
        if embeddings.len() != expected {
            return Err(Error::EmbeddingService(format!(
                "Expected {} embeddings, got {}",
                expected,
                embeddings.len()
            )));
        }

        self.validate_dimensions(&embeddings)?;
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder(server: &MockServer, timeout: Duration) -> HttpEmbedder {
        HttpEmbedder::with_timeout(&server.uri(), "test-model", 3, timeout).unwrap()
    }

    #[tokio::test]
    async fn test_embed_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed/text"))
            .and(body_partial_json(json!({"model": "test-model"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = embedder(&server, Duration::from_secs(5));
        let vectors = embedder
            .embed(vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_openai_style_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed/text"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": [0.5, 0.5, 0.0]}]
            })))
            .mount(&server)
            .await;

        let embedder = embedder(&server, Duration::from_secs(5));
        let vector = embedder.embed_one("question").await.unwrap();
        assert_eq!(vector, vec![0.5, 0.5, 0.0]);
    }

    #[tokio::test]
    async fn test_error_status_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed/text"))
            .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
            .expect(1) // no retries
            .mount(&server)
            .await;

        let embedder = embedder(&server, Duration::from_secs(5));
        let err = embedder.embed_one("question").await.unwrap_err();
        match err {
            Error::EmbeddingService(message) => assert!(message.contains("warming up")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed/text"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"embeddings": [[1.0, 0.0, 0.0]]}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let embedder = embedder(&server, Duration::from_millis(50));
        let err = embedder.embed_one("question").await.unwrap_err();
        assert!(matches!(err, Error::EmbeddingService(_)));
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed/text"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vectors": [[1.0, 0.0]]
            })))
            .mount(&server)
            .await;

        let embedder = embedder(&server, Duration::from_secs(5));
        let err = embedder.embed_one("question").await.unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let server = MockServer::start().await;
        let embedder = embedder(&server, Duration::from_secs(5));
        assert!(embedder.embed(Vec::new()).await.unwrap().is_empty());
    }
}
