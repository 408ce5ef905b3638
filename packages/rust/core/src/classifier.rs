//! Classifier stage: propose labels for one hierarchy level.
//!
//! The stage owns the policy around unusable model output. A null generation
//! means the provider itself is not working (bad credentials, exhausted quota)
//! and is fatal; a response that is JSON but the wrong shape is the model
//! misbehaving and yields an empty proposal, which the validator will reject
//! and the loop can retry.

use std::collections::BTreeSet;

use tracing::{debug, instrument, warn};

use fieldscope_llm::{ChoiceList, LlmClient, prompt};
use fieldscope_shared::{
    Candidate, ClassificationRequest, Feedback, FieldscopeError, Level, Result,
};
use fieldscope_taxonomy::CandidateSet;

pub struct Classifier<'a> {
    llm: &'a dyn LlmClient,
}

impl<'a> Classifier<'a> {
    pub fn new(llm: &'a dyn LlmClient) -> Self {
        Self { llm }
    }

    /// Ask the model to select labels from `candidates`.
    ///
    /// Names not present in the candidate set are dropped, preserving the
    /// model's order for the rest. Duplicates keep their first occurrence.
    #[instrument(skip_all, fields(level = level.as_str()))]
    pub async fn propose(
        &self,
        level: Level,
        request: &ClassificationRequest,
        candidates: &CandidateSet,
        feedback: &Feedback,
    ) -> Result<Vec<Candidate>> {
        // The department hint steers unit selection only; lower levels are
        // already scoped by confirmed parents.
        let hint = match level {
            Level::Unit => request.unit_hint.as_deref(),
            _ => None,
        };

        let prompt = prompt::classify(level, &request.description, hint, candidates, feedback);
        let Some(value) = self.llm.generate_structured(&prompt).await? else {
            return Err(FieldscopeError::LlmUnavailable(
                "model produced no structured output; check credentials and quota".into(),
            ));
        };

        let list = match ChoiceList::from_value(value) {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "classifier response unparsable, proposing nothing");
                return Ok(Vec::new());
            }
        };

        let mut seen = BTreeSet::new();
        let mut proposed = Vec::new();
        for choice in list.choices {
            if !candidates.contains(&choice.name) {
                warn!(name = %choice.name, "dropping label outside the candidate scope");
                continue;
            }
            if !seen.insert(choice.name.clone()) {
                continue;
            }
            proposed.push(Candidate::new(choice.name, choice.rationale));
        }

        debug!(count = proposed.len(), "labels proposed");
        Ok(proposed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{field_pool, Reply, ScriptedLlm};
    use serde_json::json;

    fn request() -> ClassificationRequest {
        ClassificationRequest::new("synthesis of novel catalysts", "CLAS")
    }

    #[tokio::test]
    async fn keeps_in_scope_labels_in_model_order() {
        let llm = ScriptedLlm::new(vec![Reply::Json(json!({
            "choices": [
                {"name": "Chemical Biology", "rationale": "protein work"},
                {"name": "Chemistry", "rationale": "catalysis"},
            ]
        }))]);
        let proposed = Classifier::new(&llm)
            .propose(Level::Field, &request(), &field_pool(), &Feedback::default())
            .await
            .expect("propose");

        let names: Vec<&str> = proposed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Chemical Biology", "Chemistry"]);
        assert_eq!(proposed[1].rationale, "catalysis");
    }

    #[tokio::test]
    async fn filters_out_of_scope_and_duplicate_labels() {
        let llm = ScriptedLlm::new(vec![Reply::Json(json!({
            "choices": [
                {"name": "Chemistry"},
                {"name": "Alchemy"},
                {"name": "Chemistry"},
            ]
        }))]);
        let proposed = Classifier::new(&llm)
            .propose(Level::Field, &request(), &field_pool(), &Feedback::default())
            .await
            .expect("propose");

        assert_eq!(proposed.len(), 1);
        assert_eq!(proposed[0].name, "Chemistry");
    }

    #[tokio::test]
    async fn wrong_shape_response_proposes_nothing() {
        let llm = ScriptedLlm::new(vec![Reply::Json(json!({"verdict": "yes"}))]);
        let proposed = Classifier::new(&llm)
            .propose(Level::Field, &request(), &field_pool(), &Feedback::default())
            .await
            .expect("propose");
        assert!(proposed.is_empty());
    }

    #[tokio::test]
    async fn null_generation_is_fatal() {
        let llm = ScriptedLlm::new(vec![Reply::Empty]);
        let err = Classifier::new(&llm)
            .propose(Level::Field, &request(), &field_pool(), &Feedback::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FieldscopeError::LlmUnavailable(_)));
    }
}
