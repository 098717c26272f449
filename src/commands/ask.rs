//! Ask command - answer one question from the CLI

use crate::answer::{AskRequest, AskResponse, Assistant};
use crate::config::Config;
use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Ask options
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    /// Override the configured number of retrieved chunks
    pub k: Option<usize>,
}

/// Answer a single request with a freshly initialized assistant
pub async fn cmd_ask(
    config: &Config,
    request: AskRequest,
    options: AskOptions,
) -> Result<AskResponse> {
    let mut config = config.clone();
    if let Some(k) = options.k {
        config.retrieval.k = k;
    }
    config.validate()?;

    let assistant = Assistant::init(&config)?;
    let response = assistant.ask(request).await;
    assistant.teardown();
    response
}

/// Read conversation history from a JSON file of `[user, assistant]` pairs
pub fn load_history(path: &Path) -> Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path)?;
    let history: Vec<(String, String)> = serde_json::from_str(&content)?;
    debug!("Loaded {} history turns from {}", history.len(), path.display());
    Ok(history)
}

/// Read the question from stdin when none was given on the command line
pub fn read_question(question: Option<String>) -> Result<String> {
    let question = match question {
        Some(question) => question,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let question = question.trim().to_string();
    if question.is_empty() {
        return Err(Error::Config("No question given".to_string()));
    }
    Ok(question)
}

pub fn print_answer(response: &AskResponse) {
    println!("{}", response.answer);
}
