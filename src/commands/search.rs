//! Search command - retrieval without generation

use crate::answer::open_retriever;
use crate::chunk::SourceKind;
use crate::config::Config;
use crate::error::Result;
use crate::index::ScoredChunk;
use serde::{Deserialize, Serialize};
use tracing::info;

const PREVIEW_CHARS: usize = 200;

/// One retrieved chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: u32,
    pub kind: SourceKind,
    pub score: f32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl From<ScoredChunk> for SearchHit {
    fn from(scored: ScoredChunk) -> Self {
        Self {
            id: scored.chunk.id,
            kind: scored.chunk.kind(),
            score: scored.score,
            extra: scored.chunk.extra().map(str::to_string),
            text: scored.chunk.text,
        }
    }
}

/// Search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

/// Retrieve the chunks a question would be answered from
pub async fn cmd_search(config: &Config, query: &str, k: Option<usize>) -> Result<SearchResult> {
    let retriever = open_retriever(config)?;
    let k = k.unwrap_or(config.retrieval.k);
    info!("Searching {} chunks for top {}", retriever.index().len(), k);

    let hits = retriever
        .search(query, k)
        .await?
        .into_iter()
        .map(SearchHit::from)
        .collect();

    Ok(SearchResult {
        query: query.to_string(),
        hits,
    })
}

/// Print search results to console
pub fn print_search_results(result: &SearchResult) {
    println!("\n🔍 Query: {}\n", result.query);
    println!("Found {} results:\n", result.hits.len());

    for (i, hit) in result.hits.iter().enumerate() {
        println!("{}. [score: {:.3}] #{} ({})", i + 1, hit.score, hit.id, hit.kind);
        if let Some(extra) = &hit.extra {
            println!("   Paired: {}", preview(extra));
        }
        println!("   {}\n", preview(&hit.text));
    }
}

fn preview(text: &str) -> String {
    let flat = text.trim().replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkSource;
    use crate::index::Chunk;

    #[test]
    fn test_hit_from_scored_chunk() {
        let hit = SearchHit::from(ScoredChunk {
            chunk: Chunk {
                id: 7,
                text: "[FAQ Question]\nWhen?".into(),
                source: ChunkSource::FaqQuestion {
                    answer: "2015".into(),
                },
                embedding: vec![1.0],
            },
            score: 0.5,
        });

        assert_eq!(hit.id, 7);
        assert_eq!(hit.kind, SourceKind::FaqQuestion);
        assert_eq!(hit.extra.as_deref(), Some("2015"));
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["kind"], "faq_question");
    }

    #[test]
    fn test_preview_is_char_safe() {
        let text = "é".repeat(300);
        let shown = preview(&text);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
    }
}
