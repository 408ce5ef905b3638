//! LLM capability injection for FieldScope.
//!
//! The core never depends on a specific model or vendor: it talks to a single
//! object-safe trait, [`LlmClient`], with one operation returning parsed JSON
//! (or `None` when the provider cannot produce usable output). The concrete
//! [`GeminiClient`] adapter and the prompt builders live here too.

pub mod gemini;
pub mod prompt;
pub mod response;

use async_trait::async_trait;

use fieldscope_shared::Result;

pub use gemini::GeminiClient;
pub use response::{Choice, ChoiceList, EnhancementChoices, Judgment};

/// Injected classification/judgment capability.
///
/// Returns `Ok(None)` when the provider could not produce structured output
/// (unreachable endpoint handled upstream as an error; blocked or empty
/// generations surface as `None`). Whether `None` is fatal is a per-stage
/// policy decision, not the adapter's.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a structured (JSON) response to the prompt.
    async fn generate_structured(&self, prompt: &str) -> Result<Option<serde_json::Value>>;
}
