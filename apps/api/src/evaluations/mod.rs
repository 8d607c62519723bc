// Evaluation API: generate, regenerate, update, and PD draft.
// All LLM calls go through llm_client; all scoring goes through classification.

pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod prompts;
