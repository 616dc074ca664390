//! Company-Identifier Resolution Library
//!
//! An LLM-assisted browser agent that discovers a company's tax
//! identifier (INN) and contact email on an arbitrary corporate website,
//! a pattern learning engine that improves future navigation from
//! manually confirmed successes, and a batch orchestrator that runs many
//! resolutions concurrently with bounded parallelism.
//!
//! # Design Philosophy
//!
//! **Deterministic first, model last**
//!
//! - Regex and checksum before registry, registry before navigation
//! - The model only ever picks the next link; it never produces the value
//! - Every extracted value carries proof (URL, snippet, method, confidence)
//! - Not-found is a normal outcome, not an error
//! - One domain's fault never aborts its siblings
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use resolver::{
//!     BatchOrchestrator, InteractiveResolver, PatternLearningEngine,
//! };
//!
//! let learning = Arc::new(PatternLearningEngine::load("patterns.json").await?);
//! let resolver = Arc::new(InteractiveResolver::new(inference, registry, learning));
//! let orchestrator = BatchOrchestrator::new(session, candidates, resolver);
//!
//! let run = orchestrator.resolve_batch(domains).await;
//! for (domain, attempt) in &run.results {
//!     println!("{domain}: {:?}", attempt.inn);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Capability interfaces (PageController, Inference, Registry)
//! - [`types`] - Attempts, proofs, learned patterns, batch reports
//! - [`extract`] - Deterministic INN/email extraction and screening
//! - [`resolver`] - The phased interactive resolver
//! - [`learning`] - The persistent pattern learning engine
//! - [`batch`] - The bounded-concurrency batch orchestrator
//! - [`testing`] - Mock implementations for testing

pub mod batch;
pub mod error;
pub mod extract;
pub mod learning;
pub mod prompts;
pub mod resolver;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "chromium")]
pub mod browser;

#[cfg(feature = "dadata")]
pub mod registry;

#[cfg(feature = "ollama")]
pub mod inference;

// Re-export core types at crate root
pub use error::{LearningError, ResolveError};
pub use traits::{
    candidates::CandidateUrls,
    inference::Inference,
    page::{PageController, PageLink, PageSession},
    registry::{Registry, RegistryRecord},
};
pub use types::{
    attempt::{
        ActionKind, ActionRecord, Confidence, ExtractionAttempt, ExtractionMethod, Phase,
        ProofRecord,
    },
    batch::{BatchRun, BatchStats},
    config::{BatchConfig, ResolveConfig},
    patterns::{DataType, LearnedItem, LearningStats, PatternDocument},
};

// Re-export the core components
pub use batch::BatchOrchestrator;
pub use learning::PatternLearningEngine;
pub use resolver::{next_phase, InteractiveResolver, PhaseOutcome, PhaseTransition};

// Re-export extraction helpers used by callers formatting results
pub use extract::{best_inn, find_emails, find_inn, inn_checksum_ok, InnMatch};

#[cfg(feature = "chromium")]
pub use browser::ChromiumBrowser;

#[cfg(feature = "dadata")]
pub use registry::DadataRegistry;

#[cfg(feature = "ollama")]
pub use inference::OllamaInference;
