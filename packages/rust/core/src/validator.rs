//! Validator stage: judge a proposed label set against the description.
//!
//! Validation is two checks in sequence. The structural check is local and
//! authoritative: an empty proposal or a label outside the candidate scope
//! fails without consulting the model. Only a structurally sound proposal is
//! submitted for semantic judgment, and if that judgment comes back unparsable
//! the structural verdict stands.

use tracing::{debug, instrument, warn};

use fieldscope_llm::{Judgment, LlmClient, prompt};
use fieldscope_shared::{
    Candidate, ClassificationRequest, FieldscopeError, Level, Result, ValidationReport,
};
use fieldscope_taxonomy::CandidateSet;

pub struct Validator<'a> {
    llm: Option<&'a dyn LlmClient>,
}

impl<'a> Validator<'a> {
    /// Validator with semantic judgment backed by the given model.
    pub fn new(llm: &'a dyn LlmClient) -> Self {
        Self { llm: Some(llm) }
    }

    /// Structural-only validator. No model calls.
    pub fn structural() -> Self {
        Self { llm: None }
    }

    #[instrument(skip_all, fields(level = level.as_str(), proposed = proposed.len()))]
    pub async fn validate(
        &self,
        level: Level,
        request: &ClassificationRequest,
        proposed: &[Candidate],
        pool: &CandidateSet,
    ) -> Result<ValidationReport> {
        if proposed.is_empty() {
            return Ok(ValidationReport::invalid("no labels proposed", Vec::new()));
        }

        let out_of_scope: Vec<String> = proposed
            .iter()
            .filter(|c| !pool.contains(&c.name))
            .map(|c| c.name.clone())
            .collect();
        if !out_of_scope.is_empty() {
            return Ok(ValidationReport::invalid(
                format!("labels outside the candidate scope: {}", out_of_scope.join(", ")),
                out_of_scope,
            ));
        }

        let Some(llm) = self.llm else {
            return Ok(ValidationReport::valid("structurally consistent"));
        };

        let names: Vec<String> = proposed.iter().map(|c| c.name.clone()).collect();
        let prompt = prompt::validate(level, &request.description, &names, pool);
        let Some(value) = llm.generate_structured(&prompt).await? else {
            return Err(FieldscopeError::LlmUnavailable(
                "model produced no structured output; check credentials and quota".into(),
            ));
        };

        let judgment = match Judgment::from_value(value) {
            Ok(judgment) => judgment,
            Err(e) => {
                warn!(error = %e, "validator response unparsable, keeping structural verdict");
                return Ok(ValidationReport::valid(
                    "structurally consistent (semantic judgment unparsable)",
                ));
            }
        };

        // Removal suggestions only make sense for names in the pool; anything
        // else would be a no-op in the next derivation.
        let removals: Vec<String> = judgment
            .removals
            .into_iter()
            .filter(|name| {
                let known = pool.contains(name);
                if !known {
                    warn!(%name, "ignoring removal suggestion outside the candidate scope");
                }
                known
            })
            .collect();

        debug!(is_valid = judgment.is_valid, removals = removals.len(), "semantic verdict");
        Ok(ValidationReport {
            is_valid: judgment.is_valid,
            reason: judgment.reason,
            removals,
            additions: judgment.additions,
        })
    }
}
