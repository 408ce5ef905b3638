//! Classify/validate/revise loop for a single hierarchy level.
//!
//! Each iteration derives a fresh candidate pool from the immutable store and
//! the latest feedback, proposes labels, and validates them against the same
//! pool. Feedback is replaced every iteration, never accumulated, so the pool
//! seen at iteration n reflects only the verdict from iteration n-1. Hitting
//! the iteration ceiling is not an error: the last proposal is kept and the
//! exhaustion is recorded in the audit log.

use serde_json::json;
use tracing::{info, instrument, warn};

use fieldscope_llm::LlmClient;
use fieldscope_shared::{
    ClassificationRequest, Feedback, Level, Result, ValidationReport,
};
use fieldscope_taxonomy::{derive, Scope, TaxonomyStore};

use crate::classifier::Classifier;
use crate::pipeline::ProgressReporter;
use crate::state::{LevelOutcome, RunState};
use crate::validator::Validator;

pub struct StageController<'a> {
    classifier: Classifier<'a>,
    validator: Validator<'a>,
    max_iterations: usize,
}

impl<'a> StageController<'a> {
    pub fn new(llm: &'a dyn LlmClient, max_iterations: usize) -> Self {
        Self {
            classifier: Classifier::new(llm),
            validator: Validator::new(llm),
            max_iterations,
        }
    }

    /// Run the loop for one level until the validator passes or the iteration
    /// ceiling is reached.
    #[instrument(skip_all, fields(level = %level))]
    pub async fn run_level(
        &self,
        level: Level,
        request: &ClassificationRequest,
        store: &TaxonomyStore,
        scope: &Scope,
        state: &mut RunState,
        progress: &dyn ProgressReporter,
    ) -> Result<LevelOutcome> {
        let mut feedback: Option<Feedback> = None;
        let mut last = LevelOutcome {
            confirmed: Vec::new(),
            report: ValidationReport::invalid("no iterations run", Vec::new()),
            iterations: 0,
            exhausted: false,
        };

        for iteration in 1..=self.max_iterations {
            progress.iteration(level, iteration, self.max_iterations);

            let pool = derive(store, scope, feedback.as_ref())?;
            let current_feedback = feedback.take().unwrap_or_default();

            let proposed = self
                .classifier
                .propose(level, request, &pool, &current_feedback)
                .await?;
            state.record(
                format!("{level}_classified"),
                json!({
                    "iteration": iteration,
                    "pool_size": pool.len(),
                    "proposed": proposed.iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
                }),
            );

            let report = self.validator.validate(level, request, &proposed, &pool).await?;
            state.record(
                format!("{level}_validated"),
                json!({
                    "iteration": iteration,
                    "is_valid": report.is_valid,
                    "reason": report.reason,
                    "removals": report.removals,
                    "additions": report.additions,
                }),
            );

            let is_valid = report.is_valid;
            last = LevelOutcome {
                confirmed: proposed,
                report,
                iterations: iteration,
                exhausted: false,
            };

            if is_valid {
                info!(iteration, confirmed = last.confirmed.len(), "level confirmed");
                return Ok(last);
            }

            feedback = Some(Feedback::from_report(
                &last.report.removals,
                &last.report.additions,
            ));
        }

        warn!(
            max_iterations = self.max_iterations,
            "iteration ceiling reached, keeping last proposal"
        );
        state.record(
            "iterations_exhausted",
            json!({
                "level": level,
                "max_iterations": self.max_iterations,
                "kept": last.confirmed.iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
            }),
        );
        last.exhausted = true;
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use crate::testing::{sample_store, Reply, ScriptedLlm};
    use serde_json::json;

    const CLAS: &str = "College of Liberal Arts & Sciences";

    fn request() -> ClassificationRequest {
        ClassificationRequest::new("synthesis of novel catalysts", CLAS)
    }

    fn field_scope() -> Scope {
        Scope::Fields {
            college: CLAS.into(),
            units: vec!["Chemistry Dept".into(), "History Dept".into()],
        }
    }

    async fn run(
        llm: &ScriptedLlm,
        max_iterations: usize,
        state: &mut RunState,
    ) -> Result<LevelOutcome> {
        StageController::new(llm, max_iterations)
            .run_level(
                Level::Field,
                &request(),
                &sample_store(),
                &field_scope(),
                state,
                &SilentProgress,
            )
            .await
    }

    #[tokio::test]
    async fn first_pass_success_stops_after_one_iteration() {
        let llm = ScriptedLlm::new(vec![
            Reply::Json(json!({"choices": [{"name": "Chemistry", "rationale": "catalysis"}]})),
            Reply::Json(json!({"is_valid": true, "reason": "good match"})),
        ]);
        let mut state = RunState::new(request());
        let outcome = run(&llm, 3, &mut state).await.expect("run");

        assert!(!outcome.exhausted);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.names(), ["Chemistry"]);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn rejection_feeds_removals_into_the_next_pool() {
        // Iteration 1: model picks a history field, validator strikes it.
        // Iteration 2: the struck name is gone from the pool, so proposing it
        // again would be filtered; the model picks Chemistry and passes.
        let llm = ScriptedLlm::new(vec![
            Reply::Json(json!({"choices": [{"name": "American History"}]})),
            Reply::Json(json!({
                "is_valid": false,
                "reason": "not a history description",
                "removals": ["American History"],
            })),
            Reply::Json(json!({"choices": [
                {"name": "American History"},
                {"name": "Chemistry"},
            ]})),
            Reply::Json(json!({"is_valid": true, "reason": "matches"})),
        ]);
        let mut state = RunState::new(request());
        let outcome = run(&llm, 3, &mut state).await.expect("run");

        assert_eq!(outcome.iterations, 2);
        // The re-proposed struck name fell outside the shrunk pool.
        assert_eq!(outcome.names(), ["Chemistry"]);

        let events: Vec<&str> = state.events().iter().map(|e| e.event.as_str()).collect();
        assert_eq!(
            events,
            ["field_classified", "field_validated", "field_classified", "field_validated"]
        );
    }

    #[tokio::test]
    async fn exhaustion_at_default_ceiling_keeps_the_last_proposal() {
        // Never satisfied: the loop must stop after exactly 3 attempts and
        // keep iteration 3's proposal.
        let reject = || {
            Reply::Json(json!({
                "is_valid": false,
                "reason": "still unconvincing",
                "removals": [],
            }))
        };
        let llm = ScriptedLlm::new(vec![
            Reply::Json(json!({"choices": [{"name": "Chemistry"}]})),
            reject(),
            Reply::Json(json!({"choices": [{"name": "Chemical Biology"}]})),
            reject(),
            Reply::Json(json!({"choices": [{"name": "Global History"}]})),
            reject(),
        ]);
        let mut state = RunState::new(request());
        let outcome = run(&llm, 3, &mut state).await.expect("run");

        assert!(outcome.exhausted);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.names(), ["Global History"]);
        assert_eq!(llm.call_count(), 6);
        assert!(
            state
                .events()
                .iter()
                .any(|e| e.event == "iterations_exhausted")
        );
    }

    #[tokio::test]
    async fn feedback_is_replaced_not_accumulated() {
        // Iteration 2's verdict removes nothing, so iteration 3's pool must
        // contain the name struck in iteration 1 again.
        let llm = ScriptedLlm::new(vec![
            Reply::Json(json!({"choices": [{"name": "American History"}]})),
            Reply::Json(json!({
                "is_valid": false,
                "reason": "wrong discipline",
                "removals": ["American History"],
            })),
            Reply::Json(json!({"choices": [{"name": "Global History"}]})),
            Reply::Json(json!({
                "is_valid": false,
                "reason": "too broad",
                "removals": [],
            })),
            Reply::Json(json!({"choices": [{"name": "American History"}]})),
            Reply::Json(json!({"is_valid": true, "reason": "fine"})),
        ]);
        let mut state = RunState::new(request());
        let outcome = run(&llm, 3, &mut state).await.expect("run");

        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.names(), ["American History"]);
    }

    #[tokio::test]
    async fn missing_scope_fails_before_any_model_call() {
        let llm = ScriptedLlm::new(vec![]);
        let mut state = RunState::new(request());
        let err = StageController::new(&llm, 3)
            .run_level(
                Level::Unit,
                &request(),
                &sample_store(),
                &Scope::Units {
                    college: "Hogwarts".into(),
                },
                &mut state,
                &SilentProgress,
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("scope not found"));
        assert_eq!(llm.call_count(), 0);
    }
}
