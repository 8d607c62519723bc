// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Persona shared by every classification prompt.
pub const CLASSIFIER_SYSTEM: &str = "You are an experienced federal position \
    classification specialist. You apply OPM position classification standards \
    exactly as written and never invent factor titles, levels, or point values.";

/// Reminds the model that point arithmetic is done elsewhere.
pub const NO_ARITHMETIC_INSTRUCTION: &str = "\
    Do NOT compute point totals or grades. Propose levels only; \
    points and grades are assigned by the classification tables.";

/// Wraps an OPM guide excerpt so the model treats it as reference material.
/// An empty excerpt yields an empty string.
pub fn reference_block(label: &str, excerpt: &str) -> String {
    if excerpt.trim().is_empty() {
        return String::new();
    }
    format!("REFERENCE ({label}), quoted for grounding only:\n<<<\n{excerpt}\n>>>\n\n")
}

/// Joins the classifier persona with the JSON-only rule.
pub fn json_system() -> String {
    format!("{CLASSIFIER_SYSTEM} {JSON_ONLY_SYSTEM}")
}
