//! Question-to-chunks retrieval
//!
//! Embeds the question once and asks the shared index for the nearest
//! chunks. Ranking is pure cosine similarity unless priority weighting is
//! switched on.

use crate::config::{RankingKind, RetrievalConfig};
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::index::{Chunk, ScoredChunk, VectorIndex};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Chunks retrieved per question unless configured otherwise
pub const DEFAULT_K: usize = 4;

const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// How candidate chunks are ordered
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RankingMode {
    /// Cosine similarity only
    #[default]
    Similarity,
    /// Cosine similarity plus `weight * priority / 10`
    Priority { weight: f32 },
}

impl RankingMode {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        match config.ranking {
            RankingKind::Similarity => RankingMode::Similarity,
            RankingKind::Priority => RankingMode::Priority {
                weight: config.priority_weight,
            },
        }
    }
}

/// Finds the chunks most relevant to a question
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    ranking: RankingMode,
    embed_timeout: Duration,
    history_in_query: bool,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index,
            embedder,
            ranking: RankingMode::default(),
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
            history_in_query: false,
        }
    }

    pub fn with_ranking(mut self, ranking: RankingMode) -> Self {
        self.ranking = ranking;
        self
    }

    /// Upper bound on the question embedding call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Include previous user turns in the embedded text
    pub fn with_history_in_query(mut self, enabled: bool) -> Self {
        self.history_in_query = enabled;
        self
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Top `k` chunks with their scores, best first
    pub async fn search(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let vector = self.embed_question(question).await?;

        let results = match self.ranking {
            RankingMode::Similarity => self.index.query(&vector, k)?,
            RankingMode::Priority { weight } => {
                let mut scores = self.index.score_all(&vector)?;
                for (score, chunk) in scores.iter_mut().zip(self.index.chunks()) {
                    *score += weight * f32::from(chunk.priority()) / 10.0;
                }
                self.index.top_k(&scores, k)
            }
        };

        debug!(
            "Retrieved {} chunks (ids {:?})",
            results.len(),
            results.iter().map(|r| r.chunk.id).collect::<Vec<_>>()
        );
        Ok(results)
    }

    /// Top `k` chunks, best first
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .search(question, k)
            .await?
            .into_iter()
            .map(|scored| scored.chunk)
            .collect())
    }

    /// Retrieve for a question asked mid-conversation
    ///
    /// History only affects the embedded text when history-in-query is
    /// enabled; otherwise this is exactly [`Retriever::retrieve`].
    pub async fn retrieve_with_history(
        &self,
        question: &str,
        history: &[(String, String)],
        k: usize,
    ) -> Result<Vec<Chunk>> {
        if !self.history_in_query || history.is_empty() {
            return self.retrieve(question, k).await;
        }

        let mut query = history
            .iter()
            .map(|(user, _)| user.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        query.push('\n');
        query.push_str(question);
        self.retrieve(&query, k).await
    }

    async fn embed_question(&self, text: &str) -> Result<Vec<f32>> {
        tokio::time::timeout(self.embed_timeout, self.embedder.embed_one(text))
            .await
            .map_err(|_| {
                Error::EmbeddingService(format!(
                    "question embedding timed out after {:?}",
                    self.embed_timeout
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkSource, Passage};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns a fixed vector per known text and records every request
    struct LookupEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        seen: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl LookupEmbedder {
        fn new(pairs: &[(&str, [f32; 2])]) -> Self {
            Self {
                vectors: pairs
                    .iter()
                    .map(|(text, v)| (text.to_string(), v.to_vec()))
                    .collect(),
                seen: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl Embedder for LookupEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            tokio::time::sleep(self.delay).await;
            self.seen.lock().unwrap().extend(texts.iter().cloned());
            Ok(texts
                .iter()
                .map(|t| self.vectors.get(t).cloned().unwrap_or(vec![0.0, 1.0]))
                .collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "lookup"
        }
    }

    fn index() -> Arc<VectorIndex> {
        let mut index = VectorIndex::new(2, "lookup");
        index
            .add(Passage::new("site", ChunkSource::Site), vec![1.0, 0.0])
            .unwrap();
        index
            .add(
                Passage::new(
                    "[FAQ Answer]\nyes",
                    ChunkSource::FaqAnswer {
                        question: "q".into(),
                    },
                ),
                vec![0.95, (1.0f32 - 0.95 * 0.95).sqrt()],
            )
            .unwrap();
        index
            .add(Passage::new("other", ChunkSource::Site), vec![0.0, 1.0])
            .unwrap();
        Arc::new(index)
    }

    #[tokio::test]
    async fn test_similarity_ranking() {
        let embedder = Arc::new(LookupEmbedder::new(&[("question", [1.0, 0.0])]));
        let retriever = Retriever::new(index(), embedder);

        let chunks = retriever.retrieve("question", 2).await.unwrap();
        let ids: Vec<u32> = chunks.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_priority_ranking_prefers_faq() {
        let embedder = Arc::new(LookupEmbedder::new(&[("question", [1.0, 0.0])]));
        let retriever =
            Retriever::new(index(), embedder).with_ranking(RankingMode::Priority { weight: 0.1 });

        let results = retriever.search("question", 2).await.unwrap();
        assert_eq!(results[0].chunk.id, 1);
        assert_eq!(results[1].chunk.id, 0);
        assert!((results[0].score - 1.05).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_k_larger_than_index() {
        let embedder = Arc::new(LookupEmbedder::new(&[]));
        let retriever = Retriever::new(index(), embedder);
        assert_eq!(retriever.retrieve("anything", 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_history_ignored_by_default() {
        let embedder = Arc::new(LookupEmbedder::new(&[]));
        let retriever = Retriever::new(index(), embedder.clone());
        let history = vec![("Who are you?".to_string(), "Eka.".to_string())];

        retriever
            .retrieve_with_history("What do you fund?", &history, 2)
            .await
            .unwrap();

        assert_eq!(*embedder.seen.lock().unwrap(), vec!["What do you fund?"]);
    }

    #[tokio::test]
    async fn test_history_in_query_prepends_user_turns() {
        let embedder = Arc::new(LookupEmbedder::new(&[]));
        let retriever = Retriever::new(index(), embedder.clone()).with_history_in_query(true);
        let history = vec![
            ("Who are you?".to_string(), "Eka.".to_string()),
            ("Where?".to_string(), "Pune.".to_string()),
        ];

        retriever
            .retrieve_with_history("What do you fund?", &history, 2)
            .await
            .unwrap();

        assert_eq!(
            *embedder.seen.lock().unwrap(),
            vec!["Who are you?\nWhere?\nWhat do you fund?"]
        );
    }

    #[tokio::test]
    async fn test_embedding_timeout_is_service_error() {
        let mut embedder = LookupEmbedder::new(&[]);
        embedder.delay = Duration::from_millis(500);
        let retriever =
            Retriever::new(index(), Arc::new(embedder)).with_timeout(Duration::from_millis(20));

        let err = retriever.retrieve("slow", 2).await.unwrap_err();
        assert!(matches!(err, Error::EmbeddingService(_)));
    }

    #[test]
    fn test_ranking_mode_from_config() {
        let mut config = RetrievalConfig::default();
        assert_eq!(RankingMode::from_config(&config), RankingMode::Similarity);

        config.ranking = RankingKind::Priority;
        config.priority_weight = 0.2;
        assert_eq!(
            RankingMode::from_config(&config),
            RankingMode::Priority { weight: 0.2 }
        );
    }
}
