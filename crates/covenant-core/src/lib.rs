//! # covenant-core
//!
//! Deterministic policy-compliance evaluation engine.
//!
//! Given a piece of generated text, an actor role, and a declarative rule
//! set, this crate determines which rules are violated and computes a
//! compliance score in `[0, 100]`.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same inputs always produce the same ordered
//!    violation list and score
//! 2. **Pure**: no I/O beyond rule-set loading, no clock, no hidden state
//! 3. **Permissive loading**: a malformed rule degrades to an inert no-op
//!    with a warning instead of failing the whole rule set
//! 4. **Concurrency-safe**: the evaluator holds no state, so concurrent
//!    calls need no locking
//!
//! ## Example
//!
//! ```rust,ignore
//! use covenant_core::{evaluate, LoadedRuleSet};
//!
//! let loaded = LoadedRuleSet::load("constitution.json")?;
//! for warning in &loaded.warnings {
//!     eprintln!("warning: {warning}");
//! }
//!
//! let result = evaluate("user prompt", "generated output", "developer", &loaded.rules);
//! println!("score: {} ({} violations)", result.score, result.violations.len());
//! ```

pub mod evaluator;
pub mod rules;
pub mod types;

// Re-export main types at crate root
pub use evaluator::{evaluate, score_for};
pub use rules::{LoadWarning, LoadedRuleSet, Rule, RuleKind, RuleSet, RuleStoreError};
pub use types::{EvaluationResult, Severity, Violation, ViolationKind};
