//! orgqa: question answering over an organization's site text and FAQ
//!
//! The build phase chunks the inputs, embeds every chunk and persists a
//! vector index. The serve phase loads that index once and answers
//! questions by retrieving the closest chunks and handing them, with the
//! question, to a text-generation backend.

pub mod answer;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod generate;
pub mod index;
pub mod progress;
pub mod prompt;
pub mod retrieve;
