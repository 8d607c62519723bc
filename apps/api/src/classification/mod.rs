// Classification core: point tables, level navigation, grade bands, the
// factor-set builder, and band reconciliation.
// Pure synchronous code. No I/O and no LLM calls below this module.

pub mod bands;
pub mod builder;
pub mod evaluation;
pub mod factors;
pub mod heuristics;
pub mod level;
pub mod points;
pub mod reconcile;

// Re-export the API consumed by the evaluation pipeline and handlers.
pub use bands::{GradeBand, GradeBandTable};
pub use builder::{detect_rating_system, ExistingFactor, ExistingFactors, FactorSetBuilder};
pub use evaluation::EvaluationView;
pub use factors::{FactorId, RatingSystem};
pub use heuristics::HeuristicConfig;
pub use reconcile::{reconcile, ReconcileReport};
