//! Concrete inference backends.

pub mod ollama;

pub use ollama::OllamaInference;
