use std::sync::Arc;

use crate::classification::HeuristicConfig;
use crate::config::Config;
use crate::llm_client::CompletionService;
use crate::references::ReferenceTextProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `LlmClient` in production; scripted in tests.
    pub llm: Arc<dyn CompletionService>,
    pub references: Arc<dyn ReferenceTextProvider>,
    pub heuristics: Arc<HeuristicConfig>,
    pub config: Config,
}
