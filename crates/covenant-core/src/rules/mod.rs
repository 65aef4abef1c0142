//! Rule set loading and validation.
//!
//! Rule sets are structured documents (JSON or YAML) with a top-level
//! `rules` array. Parsing is strict about document shape and deliberately
//! permissive about individual rules: a malformed rule is retained as an
//! inert no-op and reported through the warnings channel rather than failing
//! the load.

mod parser;

pub use parser::{LoadWarning, LoadedRuleSet, Rule, RuleKind, RuleSet, RuleStoreError};
