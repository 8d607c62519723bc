//! Request and response bodies for the evaluation endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classification::{
    EvaluationView, ExistingFactors, FactorId, GradeBand, RatingSystem, ReconcileReport,
};

/// Body of generate, regenerate, and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    /// Required for generate/regenerate; may be empty for update.
    #[serde(default)]
    pub duties_text: String,
    pub target_grade: String,
    #[serde(default)]
    pub existing_factors: ExistingFactors,
    #[serde(default)]
    pub rating_system: Option<RatingSystem>,
    /// Regenerate only: factor keys the model should re-propose.
    #[serde(default)]
    pub factors_to_regenerate: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdDraftRequest {
    #[serde(flatten)]
    pub evaluation: EvaluationRequest,
    #[serde(default)]
    pub position_title: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

/// Model output for factor proposals. Same shape as `existingFactors`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FactorProposal {
    #[serde(default)]
    pub factors: ExistingFactors,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub evaluation_id: Uuid,
    pub rating_system: RatingSystem,
    /// The band grade actually targeted, after skipped-grade resolution.
    pub target_grade: String,
    #[serde(flatten)]
    pub view: EvaluationView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced_from: Option<u32>,
    pub adjustments: ReconcileReport,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdDraftResponse {
    pub evaluation: EvaluationResponse,
    pub draft: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradesQuery {
    #[serde(default)]
    pub rating_system: Option<RatingSystem>,
}

/// Query for the level stepper: one factor level under one rating system.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelQuery {
    #[serde(default)]
    pub rating_system: Option<RatingSystem>,
    pub factor: String,
    pub level: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelResponse {
    pub rating_system: RatingSystem,
    pub factor: FactorId,
    pub level: String,
    pub points: u32,
    pub next_higher: Option<String>,
    pub next_lower: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradesResponse {
    pub rating_system: RatingSystem,
    pub bands: Vec<GradeBand>,
}
