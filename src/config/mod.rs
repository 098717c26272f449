//! Configuration management for orgqa
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "orgqa.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input and index locations
    #[serde(default)]
    pub data: DataConfig,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Generation backend configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Directory relative data paths resolve against (not user-editable)
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Input and index locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Cleaned site text produced by the crawler
    #[serde(default = "default_corpus_file")]
    pub corpus_file: String,

    /// Blank-line separated Q:/A: blocks
    #[serde(default = "default_faq_file")]
    pub faq_file: String,

    /// Directory for index.bin and manifest.json
    #[serde(default = "default_index_dir")]
    pub index_dir: String,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name/identifier; must be the same at build and serve time
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// "http" or "local" (requires the local-embed feature)
    #[serde(default = "default_embedding_backend")]
    pub backend: String,

    /// Embedding backend base URL
    #[serde(default = "default_embedding_backend_url")]
    pub backend_url: String,

    /// Batch size for embedding
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// Batches in flight during a build
    #[serde(default = "default_embedding_concurrency")]
    pub concurrency: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

/// Lookup the expected embedding dimension for a known model
pub fn embedding_dimension_for_model(model: &str) -> Option<usize> {
    match model {
        "BAAI/bge-small-en-v1.5" => Some(384),
        "BAAI/bge-base-en-v1.5" => Some(768),
        "BAAI/bge-large-en-v1.5" => Some(1024),
        "sentence-transformers/all-MiniLM-L6-v2" => Some(384),
        _ => None,
    }
}

impl EmbeddingConfig {
    /// Resolve the effective embedding dimension based on the configured model
    pub fn resolved_dimension(&self) -> usize {
        if let Some(expected) = embedding_dimension_for_model(&self.model) {
            if expected != self.dimension {
                warn!(
                    "Embedding dimension {} does not match model '{}' ({}); using {}",
                    self.dimension, self.model, expected, expected
                );
            }
            expected
        } else {
            self.dimension
        }
    }

    pub fn backend_kind(&self) -> Result<EmbeddingBackendKind> {
        self.backend.parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Embedding backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackendKind {
    /// Embedding server reached over HTTP
    Http,
    /// In-process fastembed model
    Local,
}

impl std::str::FromStr for EmbeddingBackendKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "http" | "https" | "python-sidecar" => Ok(Self::Http),
            "local" | "fastembed" => Ok(Self::Local),
            _ => Err(Error::Config(format!(
                "Unsupported embedding backend '{}'; expected 'http' or 'local'",
                value
            ))),
        }
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Target characters per chunk (hard upper bound)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,

    /// How far back from the target a boundary may be searched for
    /// (a fifth of `chunk_size` when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_tolerance: Option<usize>,
}

impl ChunkConfig {
    /// Boundary search window in effect for this chunk size
    pub fn tolerance(&self) -> usize {
        self.boundary_tolerance.unwrap_or(self.chunk_size / 5)
    }
}

/// How retrieved chunks are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingKind {
    /// Pure cosine similarity
    #[default]
    Similarity,
    /// Cosine similarity plus a small bonus for authoritative chunks
    Priority,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question
    #[serde(default = "default_retrieval_k")]
    pub k: usize,

    /// Ranking mode
    #[serde(default)]
    pub ranking: RankingKind,

    /// Weight of chunk priority when ranking = "priority"
    #[serde(default = "default_priority_weight")]
    pub priority_weight: f32,

    /// Prepend previous user turns to the text that gets embedded
    #[serde(default)]
    pub history_in_query: bool,
}

/// Generation backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationBackendKind {
    /// Self-hosted text-generation server
    Local,
    /// Chat-completions API
    Remote,
}

impl std::str::FromStr for GenerationBackendKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "local" | "tgi" => Ok(Self::Local),
            "remote" | "openai" | "openai-compatible" => Ok(Self::Remote),
            _ => Err(Error::Config(format!(
                "Unsupported generation backend '{}'; expected 'local' or 'remote'",
                value
            ))),
        }
    }
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// "local" or "remote"
    #[serde(default = "default_generation_backend")]
    pub backend: String,

    /// Server base URL
    #[serde(default = "default_generation_url")]
    pub url: String,

    /// Model identifier sent to the server
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Environment variable holding the bearer token (remote only)
    #[serde(default = "default_generation_api_key_env")]
    pub api_key_env: String,

    /// Maximum output length in tokens
    #[serde(default = "default_generation_max_tokens")]
    pub max_tokens: usize,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl GenerationConfig {
    pub fn backend_kind(&self) -> Result<GenerationBackendKind> {
        self.backend.parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the API key from environment
    pub fn api_key(&self) -> Option<String> {
        if self.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            embedding: EmbeddingConfig::default(),
            chunk: ChunkConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_file: default_corpus_file(),
            faq_file: default_faq_file(),
            index_dir: default_index_dir(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            backend: default_embedding_backend(),
            backend_url: default_embedding_backend_url(),
            batch_size: default_embedding_batch_size(),
            concurrency: default_embedding_concurrency(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
            boundary_tolerance: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_retrieval_k(),
            ranking: RankingKind::default(),
            priority_weight: default_priority_weight(),
            history_in_query: false,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_generation_backend(),
            url: default_generation_url(),
            model: default_generation_model(),
            api_key_env: default_generation_api_key_env(),
            max_tokens: default_generation_max_tokens(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.base_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, or the default one if present, or defaults
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load(path);
        }

        let default_path = Self::default_config_path();
        if default_path.exists() {
            Self::load(&default_path)
        } else {
            debug!("No config file found, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Resolve a configured data path against the config file directory
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn corpus_path(&self) -> PathBuf {
        self.resolve_path(&self.data.corpus_file)
    }

    pub fn faq_path(&self) -> PathBuf {
        self.resolve_path(&self.data.faq_file)
    }

    pub fn index_path(&self) -> PathBuf {
        self.resolve_path(&self.data.index_dir)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk.overlap >= self.chunk.chunk_size {
            return Err(Error::Config(
                "chunk.overlap must be < chunk.chunk_size".to_string(),
            ));
        }

        if let Some(tolerance) = self.chunk.boundary_tolerance {
            if tolerance >= self.chunk.chunk_size {
                return Err(Error::Config(
                    "chunk.boundary_tolerance must be < chunk.chunk_size".to_string(),
                ));
            }
        }

        if self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }

        if self.embedding.concurrency == 0 {
            return Err(Error::Config(
                "embedding.concurrency must be at least 1".to_string(),
            ));
        }

        if self.embedding.resolved_dimension() == 0 {
            return Err(Error::Config(
                "embedding.dimension must be positive".to_string(),
            ));
        }

        if self.retrieval.k == 0 {
            return Err(Error::Config("retrieval.k must be at least 1".to_string()));
        }

        if !self.retrieval.priority_weight.is_finite() || self.retrieval.priority_weight < 0.0 {
            return Err(Error::Config(
                "retrieval.priority_weight must be a non-negative number".to_string(),
            ));
        }

        if self.generation.max_tokens == 0 {
            return Err(Error::Config(
                "generation.max_tokens must be at least 1".to_string(),
            ));
        }

        self.embedding.backend_kind()?;
        self.generation.backend_kind()?;

        Ok(())
    }
}
