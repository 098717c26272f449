//! Default values for configuration

/// Default site corpus file (produced by the crawler)
pub fn default_corpus_file() -> String {
    "data/site.txt".to_string()
}

/// Default FAQ file (optional)
pub fn default_faq_file() -> String {
    "data/faq.txt".to_string()
}

/// Default directory holding the persisted index
pub fn default_index_dir() -> String {
    "data/index".to_string()
}

/// Default embedding model (sentence-transformers/all-MiniLM-L6-v2)
pub fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

/// Default embedding dimension for the default model
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default embedding backend kind
pub fn default_embedding_backend() -> String {
    "http".to_string()
}

/// Default embedding backend URL
pub fn default_embedding_backend_url() -> String {
    std::env::var("ORGQA_EMBEDDING_URL").unwrap_or_else(|_| "http://127.0.0.1:7997".to_string())
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default number of embedding batches in flight during a build
pub fn default_embedding_concurrency() -> usize {
    4
}

/// Default embedding request timeout in seconds
pub fn default_embedding_timeout() -> u64 {
    30
}

/// Default target characters per chunk
pub fn default_chunk_size() -> usize {
    900
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    120
}

/// Default number of chunks retrieved per question
pub fn default_retrieval_k() -> usize {
    4
}

/// Default weight of chunk priority in priority ranking mode
pub fn default_priority_weight() -> f32 {
    0.05
}

/// Default generation backend kind
pub fn default_generation_backend() -> String {
    "local".to_string()
}

/// Default generation server URL
pub fn default_generation_url() -> String {
    std::env::var("ORGQA_GENERATION_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
}

/// Default generation model
pub fn default_generation_model() -> String {
    "facebook/bart-large-cnn".to_string()
}

/// Default environment variable holding the remote API key
pub fn default_generation_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Default maximum generated tokens
pub fn default_generation_max_tokens() -> usize {
    400
}

/// Default generation request timeout in seconds
pub fn default_generation_timeout() -> u64 {
    120
}
