//! Prompt assembly
//!
//! Retrieved chunks and the question are substituted into a fixed template
//! in one pass, so placeholder-looking text inside either value is kept
//! verbatim.

use crate::index::Chunk;

/// Answer the model is told to give when the context lacks the answer
pub const FALLBACK_ANSWER: &str = "I don\u{2019}t know based on EkaImpact\u{2019}s data.";

/// Prompt template with `{context}` and `{question}` placeholders
pub const RAG_PROMPT: &str = concat!(
    "You are a helpful assistant with access to EkaImpact NGO information. \n",
    "Use the provided context to answer the user\u{2019}s question.\n",
    "\n",
    "If the answer is not in the context, say: \"I don\u{2019}t know based on EkaImpact\u{2019}s data.\"\n",
    "\n",
    "Context:\n",
    "{context}\n",
    "\n",
    "Question: {question}\n",
    "\n",
    "Answer:",
);

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUESTION_PLACEHOLDER: &str = "{question}";
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Build the generation prompt for a question and its retrieved chunks
pub fn assemble(question: &str, chunks: &[Chunk]) -> String {
    render(RAG_PROMPT, &format_context(chunks), question)
}

/// Like [`assemble`], with earlier turns rendered ahead of the question
pub fn assemble_with_history(
    question: &str,
    history: &[(String, String)],
    chunks: &[Chunk],
) -> String {
    if history.is_empty() {
        return assemble(question, chunks);
    }
    let question = format!("{}\n\n{}", format_history(history), question);
    render(RAG_PROMPT, &format_context(chunks), &question)
}

/// Chunk texts in retrieval order, separated by blank lines
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

fn format_history(history: &[(String, String)]) -> String {
    history
        .iter()
        .map(|(user, assistant)| format!("User: {}\nAssistant: {}", user, assistant))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitute both placeholders in a single left-to-right scan
pub fn render(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(QUESTION_PLACEHOLDER) {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}
