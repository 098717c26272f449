//! Turning source text into indexable passages
//!
//! This module handles:
//! - Splitting the site corpus into overlapping, boundary-aware windows
//! - Parsing the FAQ file into question/answer passages
//! - Producing the canonical passage order that fixes chunk ids

mod boundaries;
mod faq;
mod window;

pub use boundaries::*;
pub use faq::*;
pub use window::*;

use crate::config::ChunkConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Where a chunk came from, with only the fields each origin needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkSource {
    /// A window of the crawled site text
    Site,
    /// An FAQ answer; keeps the question it answers
    FaqAnswer { question: String },
    /// An FAQ question; keeps its answer
    FaqQuestion { answer: String },
}

/// Discriminant of [`ChunkSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Site,
    FaqAnswer,
    FaqQuestion,
}

impl ChunkSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            ChunkSource::Site => SourceKind::Site,
            ChunkSource::FaqAnswer { .. } => SourceKind::FaqAnswer,
            ChunkSource::FaqQuestion { .. } => SourceKind::FaqQuestion,
        }
    }

    /// The paired FAQ text, for display only
    pub fn extra(&self) -> Option<&str> {
        match self {
            ChunkSource::Site => None,
            ChunkSource::FaqAnswer { question } => Some(question),
            ChunkSource::FaqQuestion { answer } => Some(answer),
        }
    }

    pub fn priority(&self) -> u8 {
        self.kind().priority()
    }
}

impl SourceKind {
    /// Higher means more authoritative
    pub fn priority(self) -> u8 {
        match self {
            SourceKind::Site => 1,
            SourceKind::FaqAnswer => 10,
            SourceKind::FaqQuestion => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Site => "site",
            SourceKind::FaqAnswer => "faq_answer",
            SourceKind::FaqQuestion => "faq_question",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text waiting to be embedded and added to an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub text: String,
    pub source: ChunkSource,
}

impl Passage {
    pub fn new(text: impl Into<String>, source: ChunkSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

/// Split site text into `Site` passages
pub fn site_passages(text: &str, config: &ChunkConfig) -> Vec<Passage> {
    split_windows(text, WindowParams::from(config))
        .map(|window| Passage::new(window, ChunkSource::Site))
        .collect()
}

/// Build passages from in-memory sources: site windows first, then FAQ pairs
pub fn passages_from_sources(
    site_text: Option<&str>,
    faq_text: Option<&str>,
    config: &ChunkConfig,
) -> Vec<Passage> {
    let mut passages = Vec::new();

    if let Some(text) = site_text {
        let site = site_passages(text, config);
        debug!("Site corpus produced {} chunks", site.len());
        passages.extend(site);
    }

    if let Some(raw) = faq_text {
        let faq = faq_passages(raw);
        debug!("FAQ produced {} chunks ({} pairs)", faq.len(), faq.len() / 2);
        passages.extend(faq);
    }

    passages
}

/// Read the corpus and FAQ files and build passages in canonical order
///
/// Either file may be missing; it is an error only if nothing at all
/// comes out of them.
pub fn load_passages(
    corpus_path: &Path,
    faq_path: &Path,
    config: &ChunkConfig,
) -> Result<Vec<Passage>> {
    let site_text = read_optional(corpus_path, "site corpus")?;
    let faq_text = read_optional(faq_path, "FAQ file")?;

    let passages = passages_from_sources(site_text.as_deref(), faq_text.as_deref(), config);
    if passages.is_empty() {
        return Err(Error::NoDocuments);
    }

    info!("Prepared {} chunks for indexing", passages.len());
    Ok(passages)
}

fn read_optional(path: &Path, label: &str) -> Result<Option<String>> {
    if !path.exists() {
        warn!("Missing {}: {}", label, path.display());
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(path)?))
}
