//! Question answering
//!
//! [`Assistant`] owns everything a question needs: the shared index (via its
//! [`Retriever`]), the embedding client and the generator. It is built once
//! at startup, shared by reference, and keeps no per-conversation state.

use crate::config::Config;
use crate::embed::create_embedder;
use crate::error::{Error, Result};
use crate::generate::{create_generator, Generator};
use crate::index::VectorIndex;
use crate::prompt::assemble_with_history;
use crate::retrieve::{RankingMode, Retriever, DEFAULT_K};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Query API request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
    /// Earlier `(user, assistant)` turns, oldest first
    #[serde(default)]
    pub history: Vec<(String, String)>,
}

/// Query API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Per-question knobs
#[derive(Debug, Clone)]
pub struct AnswerOptions {
    /// Chunks retrieved per question
    pub k: usize,
    /// Maximum generated tokens
    pub max_tokens: usize,
    /// Upper bound on the generation call
    pub generation_timeout: Duration,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            max_tokens: crate::config::default_generation_max_tokens(),
            generation_timeout: Duration::from_secs(crate::config::default_generation_timeout()),
        }
    }
}

impl AnswerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            k: config.retrieval.k,
            max_tokens: config.generation.max_tokens,
            generation_timeout: config.generation.timeout(),
        }
    }
}

/// Load the configured index and wrap it in a retriever
///
/// The index must have been built with the configured embedding model;
/// vectors from a different model are not comparable.
pub fn open_retriever(config: &Config) -> Result<Retriever> {
    let index_dir = config.index_path();
    let index = VectorIndex::load(&index_dir)?;

    if index.model() != config.embedding.model {
        return Err(Error::IndexUnavailable(format!(
            "index at {} was built with '{}' but the configured embedding model is '{}'; rebuild the index",
            index_dir.display(),
            index.model(),
            config.embedding.model
        )));
    }

    let dimension = config.embedding.resolved_dimension();
    if index.dimension() != dimension {
        return Err(Error::DimensionMismatch {
            expected: dimension,
            actual: index.dimension(),
        });
    }

    let embedder = create_embedder(&config.embedding)?;
    info!(
        "Loaded index with {} chunks (model {})",
        index.len(),
        index.model()
    );

    Ok(Retriever::new(Arc::new(index), embedder)
        .with_ranking(RankingMode::from_config(&config.retrieval))
        .with_timeout(config.embedding.timeout())
        .with_history_in_query(config.retrieval.history_in_query))
}

/// Retrieval-augmented question answering over a loaded index
pub struct Assistant {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    options: AnswerOptions,
}

impl Assistant {
    pub fn new(retriever: Retriever, generator: Arc<dyn Generator>, options: AnswerOptions) -> Self {
        Self {
            retriever,
            generator,
            options,
        }
    }

    /// Load the index and connect the configured backends
    pub fn init(config: &Config) -> Result<Self> {
        let retriever = open_retriever(config)?;
        let generator = create_generator(&config.generation)?;
        info!(
            "Assistant ready: {} chunks, generating with {}",
            retriever.index().len(),
            generator.model_name()
        );

        Ok(Self::new(
            retriever,
            generator,
            AnswerOptions::from_config(config),
        ))
    }

    /// Release the index and backend clients
    pub fn teardown(self) {
        debug!(
            "Shutting down assistant ({} chunks released)",
            self.retriever.index().len()
        );
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn options(&self) -> &AnswerOptions {
        &self.options
    }

    /// Answer a question, optionally in the context of earlier turns
    ///
    /// The generated text is returned as-is. Generation runs even when
    /// nothing relevant was retrieved.
    pub async fn answer(&self, question: &str, history: &[(String, String)]) -> Result<String> {
        let chunks = self
            .retriever
            .retrieve_with_history(question, history, self.options.k)
            .await?;
        if chunks.is_empty() {
            debug!("No chunks retrieved; generating without context");
        }

        let prompt = assemble_with_history(question, history, &chunks);
        debug!("Prompt is {} chars from {} chunks", prompt.len(), chunks.len());

        tokio::time::timeout(
            self.options.generation_timeout,
            self.generator.generate(&prompt, self.options.max_tokens),
        )
        .await
        .map_err(|_| {
            Error::generation(
                None,
                format!(
                    "generation timed out after {:?}",
                    self.options.generation_timeout
                ),
            )
        })?
    }

    /// Handle a query API request
    pub async fn ask(&self, request: AskRequest) -> Result<AskResponse> {
        let answer = self.answer(&request.query, &request.history).await?;
        Ok(AskResponse { answer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkSource, Passage};
    use crate::embed::Embedder;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    /// Returns the prompt it was given
    struct EchoGenerator {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl EchoGenerator {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, prompt: &str, _max_tokens: usize) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(prompt.to_string())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn assistant(index: VectorIndex, generator: Arc<EchoGenerator>) -> Assistant {
        let retriever = Retriever::new(Arc::new(index), Arc::new(FixedEmbedder));
        Assistant::new(retriever, generator, AnswerOptions::default())
    }

    fn small_index() -> VectorIndex {
        let mut index = VectorIndex::new(2, "fixed");
        index
            .add(
                Passage::new("Eka was founded in 2015.", ChunkSource::Site),
                vec![1.0, 0.0],
            )
            .unwrap();
        index
            .add(
                Passage::new("Unrelated text.", ChunkSource::Site),
                vec![0.0, 1.0],
            )
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_answer_passes_context_to_generator() {
        let generator = Arc::new(EchoGenerator::new());
        let assistant = assistant(small_index(), generator.clone());

        let answer = assistant.answer("When was Eka founded?", &[]).await.unwrap();

        assert!(answer.contains("Context:\nEka was founded in 2015.\n\nUnrelated text."));
        assert!(answer.contains("Question: When was Eka founded?"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_index_still_generates() {
        let generator = Arc::new(EchoGenerator::new());
        let assistant = assistant(VectorIndex::new(2, "fixed"), generator.clone());

        let answer = assistant.answer("Anything?", &[]).await.unwrap();

        assert!(answer.contains("Question: Anything?"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let mut generator = EchoGenerator::new();
        generator.delay = Duration::from_millis(500);
        let retriever = Retriever::new(Arc::new(small_index()), Arc::new(FixedEmbedder));
        let options = AnswerOptions {
            generation_timeout: Duration::from_millis(20),
            ..AnswerOptions::default()
        };
        let assistant = Assistant::new(retriever, Arc::new(generator), options);

        let err = assistant.answer("q", &[]).await.unwrap_err();
        assert!(matches!(err, Error::GenerationService { status: None, .. }));
    }

    #[tokio::test]
    async fn test_ask_renders_history() {
        let generator = Arc::new(EchoGenerator::new());
        let assistant = assistant(small_index(), generator);

        let request: AskRequest = serde_json::from_str(
            r#"{"query": "And grants?", "history": [["Who are you?", "Eka."]]}"#,
        )
        .unwrap();
        let response = assistant.ask(request).await.unwrap();

        assert!(response
            .answer
            .contains("User: Who are you?\nAssistant: Eka.\n\nAnd grants?"));
    }

    #[test]
    fn test_request_history_defaults_to_empty() {
        let request: AskRequest = serde_json::from_str(r#"{"query": "hi"}"#).unwrap();
        assert!(request.history.is_empty());

        let response = serde_json::to_string(&AskResponse {
            answer: "ok".into(),
        })
        .unwrap();
        assert_eq!(response, r#"{"answer":"ok"}"#);
    }

    fn config_in(tmp: &TempDir) -> Config {
        let mut config = Config::default();
        config.base_dir = tmp.path().to_path_buf();
        config
    }

    #[test]
    fn test_init_without_index_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let err = Assistant::init(&config_in(&tmp)).err().unwrap();
        assert!(matches!(err, Error::IndexUnavailable(_)));
    }

    #[test]
    fn test_init_rejects_other_model() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let mut index = VectorIndex::new(384, "some-other-model");
        index
            .add(Passage::new("text", ChunkSource::Site), vec![0.5; 384])
            .unwrap();
        index.save(&config.index_path()).unwrap();

        let err = Assistant::init(&config).err().unwrap();
        assert!(matches!(err, Error::IndexUnavailable(_)));
    }

    #[test]
    fn test_init_and_teardown() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let mut index = VectorIndex::new(384, config.embedding.model.clone());
        index
            .add(Passage::new("text", ChunkSource::Site), vec![0.5; 384])
            .unwrap();
        index.save(&config.index_path()).unwrap();

        let assistant = Assistant::init(&config).unwrap();
        assert_eq!(assistant.retriever().index().len(), 1);
        assert_eq!(assistant.options().k, 4);
        assistant.teardown();
    }
}
