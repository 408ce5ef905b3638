//! Classification engine: the per-level classify/validate loop, the field
//! enhancement pass, and the pipeline that chains the three hierarchy levels.

pub mod classifier;
pub mod controller;
pub mod enhancer;
pub mod pipeline;
pub mod state;
pub mod validator;

pub use classifier::Classifier;
pub use controller::StageController;
pub use enhancer::Enhancer;
pub use pipeline::{classify, ClassifyResult, PipelineConfig, ProgressReporter, SilentProgress};
pub use state::{LevelOutcome, LogEvent, RunState};
pub use validator::Validator;
