//! The lob parser: one completion call behind the validation boundary.

use tracing::{info, warn};
use volley_llm::{CompletionOptions, CompletionService};

use crate::error::ParseError;
use crate::prompt::{build_system_prompt, CompanyContext};
use crate::schema::{validate_output, ValidatedBatch};

/// Default output-token budget, sized for roughly 15 tasks with entity lists.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Parser configuration.
#[derive(Clone, Debug)]
pub struct ParserConfig {
    /// Output-token budget for the completion call.
    pub max_output_tokens: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Orchestrates segmentation, classification, and entity extraction.
///
/// Exactly one completion attempt per call — retry policy stays with the
/// caller because completion calls are costly and not guaranteed idempotent.
pub struct LobParser<C: CompletionService> {
    completion: C,
    config: ParserConfig,
}

impl<C: CompletionService> LobParser<C> {
    /// Create a parser over the given completion collaborator.
    pub fn new(completion: C, config: ParserConfig) -> Self {
        Self { completion, config }
    }

    /// Parse one lob of text into classified tasks and extracted entities.
    ///
    /// `company_context`, when present, is serialized into the instruction
    /// payload so the model can ground mentions against known names.
    pub async fn parse(
        &self,
        text: &str,
        company_context: Option<&CompanyContext>,
    ) -> Result<ValidatedBatch, ParseError> {
        if text.trim().is_empty() {
            return Err(ParseError::invalid_input("lob text is empty"));
        }

        let system_prompt = build_system_prompt(company_context);
        let options = CompletionOptions::deterministic(self.config.max_output_tokens);

        let raw = self
            .completion
            .complete_json(&system_prompt, text, &options)
            .await?;

        let batch = validate_output(&raw).map_err(|e| ParseError::MalformedOutput {
            message: e.message,
        })?;

        if batch.dropped_tasks > 0 || batch.dropped_entities > 0 {
            warn!(
                dropped_tasks = batch.dropped_tasks,
                dropped_entities = batch.dropped_entities,
                "parse completed with dropped items"
            );
        }
        info!(
            tasks = batch.tasks.len(),
            entities = batch.entities.len(),
            "lob parsed"
        );

        Ok(batch)
    }
}
