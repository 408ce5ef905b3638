//! End-to-end classification pipeline: units → fields → enhancement → subfields.
//!
//! Each level's confirmed labels become the scope of the next. An empty
//! confirmed set fails the next level's scope derivation, so a run that
//! confirms nothing at some level stops there instead of classifying against
//! an empty pool.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::{info, instrument};

use fieldscope_llm::LlmClient;
use fieldscope_shared::{ClassificationRequest, Level, Result};
use fieldscope_taxonomy::{derive, Scope, TaxonomyStore};

use crate::controller::StageController;
use crate::enhancer::Enhancer;
use crate::state::RunState;

/// Knobs for one classification run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Classify/validate iteration ceiling per level.
    pub max_iterations: usize,
    /// Whether to run the field-enhancement pass.
    pub enhancement: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            enhancement: true,
        }
    }
}

/// Completed run: the final state plus wall-clock time.
#[derive(Debug)]
pub struct ClassifyResult {
    pub state: RunState,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called at the start of each classify/validate iteration.
    fn iteration(&self, level: Level, iteration: usize, max: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &ClassifyResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn iteration(&self, _level: Level, _iteration: usize, _max: usize) {}
    fn done(&self, _result: &ClassifyResult) {}
}

/// Classify a research description through all three hierarchy levels.
#[instrument(skip_all, fields(request_id = %request.id, college = %request.college))]
pub async fn classify(
    store: &TaxonomyStore,
    llm: &dyn LlmClient,
    request: ClassificationRequest,
    config: &PipelineConfig,
    progress: &dyn ProgressReporter,
) -> Result<ClassifyResult> {
    let start = Instant::now();
    let mut state = RunState::new(request.clone());
    let controller = StageController::new(llm, config.max_iterations);

    progress.phase("units");
    let unit_scope = Scope::Units {
        college: request.college.clone(),
    };
    let units = controller
        .run_level(Level::Unit, &request, store, &unit_scope, &mut state, progress)
        .await?;
    state.set_outcome(Level::Unit, units);

    progress.phase("fields");
    let field_scope = Scope::Fields {
        college: request.college.clone(),
        units: state.unit_names(),
    };
    let fields = controller
        .run_level(Level::Field, &request, store, &field_scope, &mut state, progress)
        .await?;
    state.set_outcome(Level::Field, fields);

    if config.enhancement {
        progress.phase("enhancement");
        let pool = derive(store, &field_scope, None)?;
        let enhancer = Enhancer::new(llm);

        let proposed = enhancer.propose(&request.description, &pool).await?;
        state.record(
            "fields_enhanced",
            json!({"proposed": proposed.iter().map(|c| c.name.clone()).collect::<Vec<_>>()}),
        );

        let confirmed = enhancer
            .confirm(&request.description, proposed, &store.all_field_names())
            .await?;
        state.record(
            "enhancement_confirmed",
            json!({"new_fields": confirmed.iter().map(|c| c.name.clone()).collect::<Vec<_>>()}),
        );
        state.new_fields = confirmed;
    }

    progress.phase("subfields");
    let subfield_scope = Scope::Subfields {
        fields: state.field_names(),
    };
    let subfields = controller
        .run_level(Level::Subfield, &request, store, &subfield_scope, &mut state, progress)
        .await?;
    state.set_outcome(Level::Subfield, subfields);

    let result = ClassifyResult {
        state,
        elapsed: start.elapsed(),
    };

    info!(
        units = result.state.unit_names().len(),
        fields = result.state.field_names().len(),
        subfields = result.state.subfield_names().len(),
        new_fields = result.state.new_fields.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "classification complete"
    );
    progress.done(&result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_store, Reply, ScriptedLlm};
    use fieldscope_shared::FieldscopeError;
    use serde_json::json;

    const CLAS: &str = "College of Liberal Arts & Sciences";

    fn request() -> ClassificationRequest {
        ClassificationRequest::new("synthesis of novel organic catalysts", CLAS)
    }

    fn valid() -> Reply {
        Reply::Json(json!({"is_valid": true, "reason": "matches"}))
    }

    #[tokio::test]
    async fn full_run_descends_through_all_levels() {
        let llm = ScriptedLlm::new(vec![
            // units
            Reply::Json(json!({"choices": [{"name": "Chemistry Dept", "rationale": "chemistry"}]})),
            valid(),
            // fields
            Reply::Json(json!({"choices": [{"name": "Chemistry"}]})),
            valid(),
            // enhancement: propose then confirm
            Reply::Json(json!({"choices": [{"name": "Astrochemistry", "rationale": "novel area"}]})),
            Reply::Json(json!({"is_valid": true, "reason": "plausible", "removals": []})),
            // subfields; Astrochemistry never enters this scope, otherwise
            // derivation would fail on a field absent from the subfield master
            Reply::Json(json!({"choices": [{"name": "Organic Chemistry"}]})),
            valid(),
        ]);

        let result = classify(
            &sample_store(),
            &llm,
            request(),
            &PipelineConfig::default(),
            &SilentProgress,
        )
        .await
        .expect("classify");

        assert_eq!(result.state.unit_names(), ["Chemistry Dept"]);
        assert_eq!(result.state.field_names(), ["Chemistry"]);
        assert_eq!(result.state.subfield_names(), ["Organic Chemistry"]);
        assert_eq!(result.state.new_fields.len(), 1);
        assert_eq!(result.state.new_fields[0].name, "Astrochemistry");
        assert_eq!(llm.call_count(), 8);
        assert!(
            result
                .state
                .events()
                .iter()
                .any(|e| e.event == "enhancement_confirmed")
        );
    }

    #[tokio::test]
    async fn enhancement_can_be_disabled() {
        let llm = ScriptedLlm::new(vec![
            Reply::Json(json!({"choices": [{"name": "Chemistry Dept"}]})),
            valid(),
            Reply::Json(json!({"choices": [{"name": "Chemistry"}]})),
            valid(),
            Reply::Json(json!({"choices": [{"name": "Physical Chemistry"}]})),
            valid(),
        ]);
        let config = PipelineConfig {
            enhancement: false,
            ..PipelineConfig::default()
        };

        let result = classify(&sample_store(), &llm, request(), &config, &SilentProgress)
            .await
            .expect("classify");

        assert!(result.state.new_fields.is_empty());
        assert_eq!(llm.call_count(), 6);
    }

    #[tokio::test]
    async fn nothing_confirmed_at_unit_level_stops_the_run() {
        // The model proposes nothing; the structural check rejects the empty
        // proposal without a validation call, and after exhaustion the empty
        // unit set fails field-scope derivation.
        let llm = ScriptedLlm::new(vec![Reply::Json(json!({"choices": []}))]);
        let config = PipelineConfig {
            max_iterations: 1,
            ..PipelineConfig::default()
        };

        let err = classify(&sample_store(), &llm, request(), &config, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, FieldscopeError::ScopeNotFound { .. }));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_college_is_fatal() {
        let llm = ScriptedLlm::new(vec![]);
        let err = classify(
            &sample_store(),
            &llm,
            ClassificationRequest::new("desc", "Hogwarts"),
            &PipelineConfig::default(),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, FieldscopeError::ScopeNotFound { .. }));
    }
}
