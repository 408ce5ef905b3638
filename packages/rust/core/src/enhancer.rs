//! Enhancement: propose fields the taxonomy does not yet cover.
//!
//! Runs after field classification. The model is asked for fields outside the
//! candidate pool that would classify the description better; a second pass
//! filters out anything already known anywhere in the college master and asks
//! the model to confirm the rest. Results are informational only. They are
//! reported to the caller but never merged into the subfield scope.

use std::collections::BTreeSet;

use tracing::{debug, instrument, warn};

use fieldscope_llm::{EnhancementChoices, Judgment, LlmClient, prompt};
use fieldscope_shared::{Candidate, FieldscopeError, Result};
use fieldscope_taxonomy::CandidateSet;

pub struct Enhancer<'a> {
    llm: &'a dyn LlmClient,
}

impl<'a> Enhancer<'a> {
    pub fn new(llm: &'a dyn LlmClient) -> Self {
        Self { llm }
    }

    /// Propose novel fields for the description. Names already in `pool`
    /// violate the novelty contract and are dropped.
    #[instrument(skip_all)]
    pub async fn propose(
        &self,
        description: &str,
        pool: &CandidateSet,
    ) -> Result<Vec<Candidate>> {
        let prompt = prompt::enhance(description, pool);
        let Some(value) = self.llm.generate_structured(&prompt).await? else {
            return Err(FieldscopeError::LlmUnavailable(
                "model produced no structured output; check credentials and quota".into(),
            ));
        };

        let choices = match EnhancementChoices::from_value(value) {
            Ok(parsed) => parsed.choices.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "enhancement response unparsable, skipping enhancement");
                Vec::new()
            }
        };

        let mut seen = BTreeSet::new();
        let proposed: Vec<Candidate> = choices
            .into_iter()
            .filter(|choice| {
                if pool.contains(&choice.name) {
                    warn!(name = %choice.name, "enhancement proposed an existing candidate, dropping");
                    return false;
                }
                seen.insert(choice.name.clone())
            })
            .map(|choice| Candidate::new(choice.name, choice.rationale))
            .collect();

        debug!(count = proposed.len(), "novel fields proposed");
        Ok(proposed)
    }

    /// Confirm proposed fields: drop names already known anywhere in the
    /// college master, then ask the model to strike poor semantic matches.
    #[instrument(skip_all, fields(proposed = proposed.len()))]
    pub async fn confirm(
        &self,
        description: &str,
        proposed: Vec<Candidate>,
        known_fields: &BTreeSet<String>,
    ) -> Result<Vec<Candidate>> {
        let mut novel: Vec<Candidate> = proposed
            .into_iter()
            .filter(|c| {
                if known_fields.contains(&c.name) {
                    warn!(name = %c.name, "proposed field already exists in the taxonomy, dropping");
                    return false;
                }
                true
            })
            .collect();

        if novel.is_empty() {
            return Ok(novel);
        }

        let names: Vec<String> = novel.iter().map(|c| c.name.clone()).collect();
        let prompt = prompt::enhance_validate(description, &names);
        let Some(value) = self.llm.generate_structured(&prompt).await? else {
            return Err(FieldscopeError::LlmUnavailable(
                "model produced no structured output; check credentials and quota".into(),
            ));
        };

        match Judgment::from_value(value) {
            Ok(judgment) => {
                novel.retain(|c| !judgment.removals.contains(&c.name));
            }
            Err(e) => {
                warn!(error = %e, "enhancement judgment unparsable, keeping proposals as-is");
            }
        }

        Ok(novel)
    }
}
