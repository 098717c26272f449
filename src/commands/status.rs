//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::index::{IndexManifest, INDEX_FILE};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub corpus_file: String,
    pub corpus_present: bool,
    pub faq_file: String,
    pub faq_present: bool,
    pub index_dir: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub generation_backend: String,
    pub generation_model: String,
    pub generation_url: String,
    pub index: Option<IndexManifest>,
    /// Why the manifest could not be read, when an index file exists
    pub index_error: Option<String>,
}

/// Get system status
pub fn cmd_status(config: &Config) -> Result<StatusInfo> {
    let index_dir = config.index_path();

    let (index, index_error) = match IndexManifest::load(&index_dir) {
        Ok(manifest) => (Some(manifest), None),
        Err(e) => {
            debug!("No readable manifest: {}", e);
            let error = index_dir.join(INDEX_FILE).exists().then(|| e.to_string());
            (None, error)
        }
    };

    Ok(StatusInfo {
        corpus_file: config.corpus_path().display().to_string(),
        corpus_present: config.corpus_path().exists(),
        faq_file: config.faq_path().display().to_string(),
        faq_present: config.faq_path().exists(),
        index_dir: index_dir.display().to_string(),
        embedding_model: config.embedding.model.clone(),
        embedding_url: config.embedding.backend_url.clone(),
        generation_backend: config.generation.backend.clone(),
        generation_model: config.generation.model.clone(),
        generation_url: config.generation.url.clone(),
        index,
        index_error,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    let present = |yes: bool| if yes { "present" } else { "missing" };

    println!("\n📊 orgqa Status\n");
    println!("Inputs:");
    println!("  Site corpus: {} ({})", status.corpus_file, present(status.corpus_present));
    println!("  FAQ file: {} ({})", status.faq_file, present(status.faq_present));

    println!("\nIndex: {}", status.index_dir);
    match (&status.index, &status.index_error) {
        (Some(manifest), _) => {
            println!("  Chunks: {}", manifest.chunk_count);
            println!("  Model: {} ({} dimensions)", manifest.model, manifest.dimension);
            println!("  Built: {}", manifest.built_at.to_rfc3339());
            println!("  Checksum: {}", manifest.checksum);
            if manifest.model != status.embedding_model {
                println!(
                    "  ⚠ built with a different model than configured ({}); rebuild it",
                    status.embedding_model
                );
            }
        }
        (None, Some(error)) => println!("  Unreadable: {}", error),
        (None, None) => println!("  Not built yet. Run 'orgqa build'."),
    }

    println!("\nEmbedding: {} via {}", status.embedding_model, status.embedding_url);
    println!(
        "Generation: {} ({}) via {}",
        status.generation_model, status.generation_backend, status.generation_url
    );
}
