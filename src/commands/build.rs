//! Build command - chunk, embed and persist the index

use crate::chunk::{load_passages, Passage, SourceKind};
use crate::config::Config;
use crate::embed::{embed_in_batches, Embedder};
use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::progress::embedding_progress;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Build statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStats {
    pub site_chunks: usize,
    pub faq_chunks: usize,
    pub total_chunks: usize,
    pub dimension: usize,
    pub model: String,
    pub index_dir: String,
    pub checksum: String,
    pub elapsed_ms: u128,
}

/// Build options
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Draw a progress bar while embedding
    pub show_progress: bool,
}

/// Embed passages in canonical order and collect them into an index
pub async fn build_index(
    passages: Vec<Passage>,
    embedder: &dyn Embedder,
    batch_size: usize,
    concurrency: usize,
    show_progress: bool,
) -> Result<VectorIndex> {
    if passages.is_empty() {
        return Err(Error::NoDocuments);
    }

    let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
    let progress = show_progress.then(|| embedding_progress(texts.len() as u64));
    let embeddings = embed_in_batches(
        embedder,
        texts,
        batch_size,
        concurrency,
        progress.as_ref(),
    )
    .await;
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }
    let embeddings = embeddings?;

    let mut index = VectorIndex::new(embedder.dimension(), embedder.model_name());
    for (passage, embedding) in passages.into_iter().zip(embeddings) {
        index.add(passage, embedding)?;
    }
    Ok(index)
}

/// Execute the build: read inputs, embed everything, write the index
///
/// Nothing is written unless every step succeeds.
pub async fn cmd_build(
    config: &Config,
    embedder: &dyn Embedder,
    options: BuildOptions,
) -> Result<BuildStats> {
    let started = Instant::now();
    info!("Starting index build with {}", embedder.model_name());

    let passages = load_passages(&config.corpus_path(), &config.faq_path(), &config.chunk)?;
    let site_chunks = passages
        .iter()
        .filter(|p| p.source.kind() == SourceKind::Site)
        .count();
    let total_chunks = passages.len();

    let index = build_index(
        passages,
        embedder,
        config.embedding.batch_size,
        config.embedding.concurrency,
        options.show_progress,
    )
    .await?;

    let index_dir = config.index_path();
    let manifest = index.save(&index_dir)?;

    let stats = BuildStats {
        site_chunks,
        faq_chunks: total_chunks - site_chunks,
        total_chunks,
        dimension: manifest.dimension,
        model: manifest.model,
        index_dir: index_dir.display().to_string(),
        checksum: manifest.checksum,
        elapsed_ms: started.elapsed().as_millis(),
    };
    info!(
        "Built index: {} chunks in {} ms",
        stats.total_chunks, stats.elapsed_ms
    );
    Ok(stats)
}

/// Print build stats to console
pub fn print_build_stats(stats: &BuildStats) {
    println!("\n✓ Index built\n");
    println!("Site chunks: {}", stats.site_chunks);
    println!("FAQ chunks: {}", stats.faq_chunks);
    println!("Total chunks: {}", stats.total_chunks);
    println!("Model: {} ({} dimensions)", stats.model, stats.dimension);
    println!("Index: {}", stats.index_dir);
    println!("Took: {:.1}s", stats.elapsed_ms as f64 / 1000.0);
}
