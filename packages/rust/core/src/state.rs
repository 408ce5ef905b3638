//! Mutable run state: per-level outcomes plus an append-only audit log.
//!
//! Every state transition goes through [`RunState::record`], so a finished run
//! carries a complete, ordered trace of what each stage saw and decided. The
//! log is serializable for inspection; it is never replayed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use fieldscope_shared::{
    Candidate, ClassificationRequest, Level, Satisfaction, ValidationReport,
};

/// One audit-log entry: an event name plus an arbitrary JSON payload.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub event: String,
    pub payload: Value,
    pub at: DateTime<Utc>,
}

/// Final result of one hierarchy level's classify/validate loop.
#[derive(Debug, Clone, Serialize)]
pub struct LevelOutcome {
    /// Labels confirmed at this level.
    pub confirmed: Vec<Candidate>,
    /// The last validator report produced for this level.
    pub report: ValidationReport,
    /// Number of classify/validate iterations consumed.
    pub iterations: usize,
    /// True when the iteration ceiling was hit without a passing report.
    pub exhausted: bool,
}

impl LevelOutcome {
    pub fn satisfaction(&self) -> Satisfaction {
        self.report.satisfaction()
    }

    /// Confirmed label names in proposal order.
    pub fn names(&self) -> Vec<String> {
        self.confirmed.iter().map(|c| c.name.clone()).collect()
    }
}

/// Accumulated state of one classification run.
#[derive(Debug, Serialize)]
pub struct RunState {
    pub request: ClassificationRequest,
    pub units: Option<LevelOutcome>,
    pub fields: Option<LevelOutcome>,
    pub subfields: Option<LevelOutcome>,
    /// Novel fields proposed by enhancement. Informational: never merged into
    /// the subfield scope.
    pub new_fields: Vec<Candidate>,
    events: Vec<LogEvent>,
}

impl RunState {
    pub fn new(request: ClassificationRequest) -> Self {
        Self {
            request,
            units: None,
            fields: None,
            subfields: None,
            new_fields: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Append an audit event. Payloads are plain JSON so callers can attach
    /// whatever shape fits the event.
    pub fn record(&mut self, event: impl Into<String>, payload: Value) {
        let event = event.into();
        debug!(%event, "audit");
        self.events.push(LogEvent {
            event,
            payload,
            at: Utc::now(),
        });
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    /// Store a finished level outcome in its slot.
    pub fn set_outcome(&mut self, level: Level, outcome: LevelOutcome) {
        match level {
            Level::Unit => self.units = Some(outcome),
            Level::Field => self.fields = Some(outcome),
            Level::Subfield => self.subfields = Some(outcome),
        }
    }

    pub fn unit_names(&self) -> Vec<String> {
        self.units.as_ref().map(LevelOutcome::names).unwrap_or_default()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.as_ref().map(LevelOutcome::names).unwrap_or_default()
    }

    pub fn subfield_names(&self) -> Vec<String> {
        self.subfields.as_ref().map(LevelOutcome::names).unwrap_or_default()
    }
}
