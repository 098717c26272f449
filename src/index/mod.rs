//! In-memory vector index with exact cosine search
//!
//! This module provides:
//! - Append-only chunk storage with a fixed embedding dimension
//! - Exact top-k cosine similarity search with a deterministic tie-break
//! - Binary persistence with a JSON manifest (see [`persist`])

mod persist;

pub use persist::*;

use crate::chunk::{ChunkSource, Passage, SourceKind};
use crate::error::{Error, Result};
use serde::Serialize;
use std::cmp::Ordering;

/// Position of a chunk in its index
pub type ChunkId = u32;

/// An indexed passage with its embedding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source: ChunkSource,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn priority(&self) -> u8 {
        self.source.priority()
    }

    pub fn extra(&self) -> Option<&str> {
        self.source.extra()
    }
}

/// A chunk paired with its similarity to a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Vector index over chunk embeddings
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    model: String,
    chunks: Vec<Chunk>,
    norms: Vec<f64>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension` produced by `model`
    pub fn new(dimension: usize, model: impl Into<String>) -> Self {
        Self {
            dimension,
            model: model.into(),
            chunks: Vec::new(),
            norms: Vec::new(),
        }
    }

    /// Append a passage with its embedding, returning the assigned id
    pub fn add(&mut self, passage: Passage, embedding: Vec<f32>) -> Result<ChunkId> {
        self.check_dimension(embedding.len())?;

        let id = ChunkId::try_from(self.chunks.len())
            .map_err(|_| Error::IndexUnavailable("index is full".to_string()))?;
        self.norms.push(norm(&embedding));
        self.chunks.push(Chunk {
            id,
            text: passage.text,
            source: passage.source,
            embedding,
        });
        Ok(id)
    }

    /// Top `k` chunks by cosine similarity, best first
    ///
    /// Returns exactly `min(k, len)` results; equal scores are ordered by
    /// ascending id.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let scores = self.score_all(vector)?;
        Ok(self.top_k(&scores, k))
    }

    /// Cosine similarity of `vector` against every chunk, in id order
    ///
    /// Scores lie in `[-1, 1]` and are rounded to six decimal places so that
    /// chunks pointing the same way compare equal.
    pub fn score_all(&self, vector: &[f32]) -> Result<Vec<f32>> {
        self.check_dimension(vector.len())?;

        let query_norm = norm(vector);
        Ok(self
            .chunks
            .iter()
            .zip(&self.norms)
            .map(|(chunk, chunk_norm)| cosine(vector, query_norm, &chunk.embedding, *chunk_norm))
            .collect())
    }

    /// The `k` best chunks for per-chunk `scores` given in id order
    ///
    /// Only the returned chunks are cloned.
    pub fn top_k(&self, scores: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut ranked: Vec<(ChunkId, f32)> = self
            .chunks
            .iter()
            .zip(scores)
            .map(|(chunk, score)| (chunk.id, *score))
            .collect();
        rank(&mut ranked);

        ranked
            .into_iter()
            .take(k)
            .filter_map(|(id, score)| {
                self.get(id).map(|chunk| ScoredChunk {
                    chunk: chunk.clone(),
                    score,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id as usize)
    }

    fn check_dimension(&self, actual: usize) -> Result<()> {
        if actual != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }
}

/// Decimal places kept in a similarity score
const SCORE_SCALE: f64 = 1e6;

/// Sort `(id, score)` pairs by score descending, then id ascending
pub fn rank(scored: &mut [(ChunkId, f32)]) {
    scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
}

fn norm(vector: &[f32]) -> f64 {
    vector
        .iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}

fn cosine(a: &[f32], a_norm: f64, b: &[f32], b_norm: f64) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let similarity = (dot / (a_norm * b_norm)).clamp(-1.0, 1.0);
    let score = ((similarity * SCORE_SCALE).round() / SCORE_SCALE) as f32;
    // -0.0 sorts below 0.0 under total_cmp
    if score == 0.0 {
        0.0
    } else {
        score
    }
}
