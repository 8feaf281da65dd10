//! # stride-nlp
//!
//! Free-text understanding backed by a local Ollama instance: pulling
//! structured task fields out of a sentence, and short motivation lines
//! for streak pushes.

pub mod ollama;

pub use ollama::OllamaExtractor;
