//! Typed views over the model's structured responses.
//!
//! Parsing here is deliberately strict about shape but tolerant of the known
//! legacy variant: a single-`choice` object is wrapped into the `choices`
//! list form before validation. Anything else that fails schema validation is
//! a [`FieldscopeError::MalformedResponse`], which stages absorb as a soft
//! failure.

use serde::{Deserialize, Serialize};

use fieldscope_shared::{FieldscopeError, Result};

// ---------------------------------------------------------------------------
// Classifier response
// ---------------------------------------------------------------------------

/// One selected label with the model's rationale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub name: String,
    #[serde(default)]
    pub rationale: String,
}

/// Classifier response: a ranked list of choices, best-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceList {
    pub choices: Vec<Choice>,
}

impl ChoiceList {
    /// Parse a raw model response, accepting the back-compat single-`choice`
    /// form.
    pub fn from_value(raw: serde_json::Value) -> Result<Self> {
        let raw = wrap_single_choice(raw);
        serde_json::from_value(raw)
            .map_err(|e| FieldscopeError::MalformedResponse(format!("choices: {e}")))
    }
}

/// Enhancer response: either a list of proposals or `null` when the existing
/// candidates already classify the description sufficiently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementChoices {
    pub choices: Option<Vec<Choice>>,
}

impl EnhancementChoices {
    pub fn from_value(raw: serde_json::Value) -> Result<Self> {
        let raw = wrap_single_choice(raw);
        serde_json::from_value(raw)
            .map_err(|e| FieldscopeError::MalformedResponse(format!("enhancement choices: {e}")))
    }
}

/// Back-compat: `{"choice": ..., "rationale": ...}` becomes a one-element
/// `choices` list.
fn wrap_single_choice(raw: serde_json::Value) -> serde_json::Value {
    if let serde_json::Value::Object(ref map) = raw {
        if map.contains_key("choice") && !map.contains_key("choices") {
            let name = map
                .get("choice")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let rationale = map
                .get("rationale")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            return serde_json::json!({
                "choices": [{ "name": name, "rationale": rationale }]
            });
        }
    }
    raw
}

// ---------------------------------------------------------------------------
// Validator response
// ---------------------------------------------------------------------------

/// The model's validation judgment of a proposed label set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub is_valid: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub removals: Vec<String>,
    #[serde(default)]
    pub additions: Vec<String>,
}

impl Judgment {
    pub fn from_value(raw: serde_json::Value) -> Result<Self> {
        serde_json::from_value(raw)
            .map_err(|e| FieldscopeError::MalformedResponse(format!("judgment: {e}")))
    }
}
