//! # covenant-runtime
//!
//! The collaborators around the covenant-core engine: the text-generation
//! provider seam, the generate/check/log pipeline, the JSON run history
//! with trace and aggregation reads, the HTML report renderer, and a
//! rule-set cache.
//!
//! The engine in `covenant-core` stays pure and synchronous; everything
//! that touches the network or the filesystem lives here.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use covenant_core::LoadedRuleSet;
//! use covenant_runtime::{HistoryStore, Pipeline, TogetherProvider};
//!
//! let rules = LoadedRuleSet::load("constitution.json")?.into_rules();
//! let pipeline = Pipeline::new(
//!     Arc::new(TogetherProvider::from_env()?),
//!     rules,
//!     HistoryStore::new("log.json"),
//! );
//!
//! let record = pipeline.run("Write a sorting function.", "developer").await?;
//! println!("score: {}", record.score);
//! ```

pub mod cache;
pub mod history;
pub mod pipeline;
pub mod providers;
pub mod report;

pub use cache::RuleSetCache;
pub use history::{HistoryError, HistoryStore, HistorySummary, RunRecord};
pub use pipeline::{Pipeline, PipelineError};
pub use providers::{
    GeneratedText, GenerationConfig, GeneratorError, StaticGenerator, TextGenerator, DEFAULT_MODEL,
};
pub use report::render_report;

#[cfg(feature = "together")]
pub use providers::{TogetherProvider, TOGETHER_API_KEY_ENV};
