//! The generate, check, log pipeline.
//!
//! An explicit, typed pipeline of three stages passing an immutable record
//! forward: the generator produces the output text, the covenant-core
//! evaluator checks it, and the history store persists the result. All
//! collaborators are constructed by the caller and passed in; the pipeline
//! holds no ambient state.

use std::sync::Arc;
use thiserror::Error;

use chrono::Utc;
use uuid::Uuid;

use covenant_core::{evaluate, RuleSet};

use crate::history::{HistoryError, HistoryStore, RunRecord};
use crate::providers::{GenerationConfig, GeneratorError, TextGenerator};

/// Errors from a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("generation failed: {0}")]
    Generation(#[from] GeneratorError),

    #[error("history persistence failed: {0}")]
    History(#[from] HistoryError),
}

/// The three-stage run pipeline.
pub struct Pipeline {
    generator: Arc<dyn TextGenerator>,
    rules: RuleSet,
    store: HistoryStore,
    config: GenerationConfig,
}

impl Pipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(generator: Arc<dyn TextGenerator>, rules: RuleSet, store: HistoryStore) -> Self {
        Self {
            generator,
            rules,
            store,
            config: GenerationConfig::default(),
        }
    }

    /// Replace the generation config.
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// The rule set this pipeline checks against.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run the pipeline once: generate, check, log.
    ///
    /// The run id and timestamp are assigned up front so the record is
    /// traceable even while stages are still executing in logs.
    pub async fn run(&self, input_text: &str, role: &str) -> Result<RunRecord, PipelineError> {
        let uuid = Uuid::new_v4();
        let timestamp = Utc::now();

        tracing::info!(
            %uuid,
            generator = self.generator.name(),
            model = %self.config.model,
            "generating output"
        );
        let generated = self.generator.generate(input_text, &self.config).await?;

        tracing::info!(%uuid, rules = self.rules.len(), "checking output");
        let result = evaluate(input_text, &generated.content, role, &self.rules);

        let record = RunRecord {
            uuid,
            timestamp,
            input: input_text.to_string(),
            output: generated.content,
            role: role.to_string(),
            llm_model: generated.model,
            violations: result.violations,
            score: result.score,
        };

        self.store.append(&record)?;
        tracing::info!(
            %uuid,
            score = record.score,
            violations = record.violations.len(),
            "run logged"
        );

        Ok(record)
    }
}
