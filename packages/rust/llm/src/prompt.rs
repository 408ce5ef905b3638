//! Prompt builders for the classifier, validator, and enhancer stages.
//!
//! Prompts instruct the model to answer with strict JSON matching a small
//! hand-written schema; the response module enforces the shape on the way
//! back in. All three hierarchy levels present their candidates as "Fields"
//! or "Subfields" — wording the model handles better than internal level
//! names.

use std::fmt::Write as _;

use fieldscope_shared::{Feedback, Level};
use fieldscope_taxonomy::CandidateSet;

/// JSON shape the classifier must return.
const CHOICES_SCHEMA: &str = r#"{
  "choices": [
    { "name": "<candidate name, verbatim>", "rationale": "<why it matches the research description>" }
  ]
}"#;

/// JSON shape the enhancer must return (`choices` may be null).
const ENHANCEMENT_SCHEMA: &str = r#"{
  "choices": [
    { "name": "<new field name>", "rationale": "<why it better classifies the description>" }
  ]
}"#;

/// JSON shape the validator must return.
const JUDGMENT_SCHEMA: &str = r#"{
  "is_valid": <bool>,
  "reason": "<string>",
  "removals": ["<candidate name>"]
}"#;

/// Render the candidate pool as one `- Name: description` line per entry.
fn render_candidates(candidates: &CandidateSet) -> String {
    let mut out = String::new();
    for (name, desc) in candidates.iter() {
        if desc.is_empty() {
            let _ = writeln!(out, "- {name}");
        } else {
            let _ = writeln!(out, "- {name}: {desc}");
        }
    }
    out
}

/// Build the classification prompt for one level.
pub fn classify(
    level: Level,
    description: &str,
    unit_hint: Option<&str>,
    candidates: &CandidateSet,
    feedback: &Feedback,
) -> String {
    let noun = level.prompt_noun();
    let mut prompt = format!(
        "You are an academic classifier.\n\
         Given a research description and a list of candidate {noun}, \
         return all the {noun} that best fit the given research description.\n\
         Strictly return a JSON object of the following structure:\n\n\
         {CHOICES_SCHEMA}\n\n\
         Rules:\n \
         - The 'name' MUST be one of the provided candidate {noun} (verbatim).\n \
         - Output ONLY valid JSON. No prose, no markdown, no comments.\n\n"
    );

    if let Some(hint) = unit_hint {
        let _ = writeln!(prompt, "Department hint: {hint}\n");
    }

    if !feedback.removals.is_empty() {
        let removed: Vec<&str> = feedback.removals.iter().map(String::as_str).collect();
        let _ = writeln!(
            prompt,
            "Previously rejected (do NOT select these): {}\n",
            removed.join(", ")
        );
    }

    let _ = write!(
        prompt,
        "Research description:\n{description}\n\n\
         Candidate {noun} and their descriptions:\n{}",
        render_candidates(candidates)
    );

    prompt
}

/// Build the validation prompt for one level's proposed labels.
pub fn validate(
    level: Level,
    description: &str,
    proposed: &[String],
    candidates: &CandidateSet,
) -> String {
    let noun = level.prompt_noun();
    format!(
        "You are validating if the selected {noun} match the user's research description.\n\
         Return strictly JSON with keys: is_valid (bool), reason (string), removals (string array):\n\n\
         {JUDGMENT_SCHEMA}\n\n\
         User text:\n{description}\n\n\
         Chosen {noun}: {proposed:?}\n\n\
         If not valid, suggest {noun} to remove from this list:\n{}\
         Output ONLY valid JSON. No prose, no markdown.\n",
        render_candidates(candidates)
    )
}

/// Build the enhancement prompt: propose fields outside the candidate set.
pub fn enhance(description: &str, candidates: &CandidateSet) -> String {
    format!(
        "You are an academic classifier.\n\
         Given a research description and a list of candidate Fields, \
         generate and return any additional Fields that are NOT in the \
         candidate set but that help better classify the description.\n\
         If the existing candidate Fields already sufficiently classify the \
         description, return `\"choices\": null`.\n\n\
         Strictly return a JSON object of the following structure:\n\n\
         {ENHANCEMENT_SCHEMA}\n\n\
         Rules:\n \
         - Each proposed 'name' MUST NOT be one of the provided candidate Fields.\n \
         - Output ONLY valid JSON. No prose, no markdown, no comments.\n\n\
         Research description:\n{description}\n\n\
         Candidate Fields and their descriptions:\n{}",
        render_candidates(candidates)
    )
}

/// Build the enhancement-validation prompt for newly proposed fields.
pub fn enhance_validate(description: &str, proposed: &[String]) -> String {
    format!(
        "You are validating if the selected Fields match the user's research description.\n\
         Return strictly JSON with keys: is_valid (bool), reason (string), removals (string array):\n\n\
         {JUDGMENT_SCHEMA}\n\n\
         User text:\n{description}\n\n\
         Chosen Fields: {proposed:?}\n\n\
         If some fields are not good semantic matches, list them in 'removals'. \
         If all fields are fine, 'removals' should be an empty list.\n\
         Output ONLY valid JSON. No prose, no markdown.\n"
    )
}
