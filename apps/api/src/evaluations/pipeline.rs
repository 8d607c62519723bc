//! Evaluation pipeline: request → (LLM proposal) → factor-set builder →
//! reconciliation → response.
//!
//! The LLM only ever proposes levels and rationales. Points, totals, and
//! grades come from the classification core, so a model reply can never
//! change the arithmetic.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::classification::{
    detect_rating_system, reconcile, ExistingFactors, FactorId, FactorSetBuilder, GradeBand,
    GradeBandTable, RatingSystem,
};
use crate::errors::AppError;
use crate::evaluations::models::{
    EvaluationRequest, EvaluationResponse, FactorProposal, PdDraftRequest, PdDraftResponse,
};
use crate::evaluations::prompts::{build_factor_proposal_prompt, build_pd_draft_prompt};
use crate::llm_client::{complete_json, CompletionService};
use crate::llm_client::prompts::{json_system, CLASSIFIER_SYSTEM};
use crate::references::resource_for;
use crate::state::AppState;

/// Rating system and resolved target band for one request.
struct Scope {
    system: RatingSystem,
    target: &'static GradeBand,
}

fn scope_for(request: &EvaluationRequest) -> Result<Scope, AppError> {
    let system = detect_rating_system(request.rating_system, &request.existing_factors);
    let target = GradeBandTable::for_system(system).resolve_target(&request.target_grade)?;
    Ok(Scope { system, target })
}

fn require_duties(request: &EvaluationRequest) -> Result<(), AppError> {
    if request.duties_text.trim().is_empty() {
        return Err(AppError::Validation("dutiesText cannot be empty".to_string()));
    }
    Ok(())
}

/// Asks the model for levels of `targets` only; anything else it returns is dropped.
async fn propose(
    state: &AppState,
    scope: &Scope,
    duties: &str,
    targets: &[FactorId],
    kept: &ExistingFactors,
) -> Result<ExistingFactors, AppError> {
    let excerpt = state
        .references
        .excerpt(resource_for(scope.system), state.config.reference_char_budget)
        .await;
    let prompt =
        build_factor_proposal_prompt(scope.system, scope.target, duties, targets, kept, &excerpt);

    let proposal: FactorProposal = complete_json(state.llm.as_ref(), &prompt, &json_system())
        .await
        .map_err(|e| AppError::Llm(format!("Factor proposal failed: {e}")))?;

    let mut proposed = ExistingFactors::new();
    for (key, factor) in proposal.factors {
        match key.parse::<FactorId>() {
            Ok(id) if targets.contains(&id) => {
                proposed.insert(id.as_str().to_string(), factor);
            }
            _ => warn!("Discarding unrequested factor '{key}' from model proposal"),
        }
    }
    Ok(proposed)
}

fn finish(state: &AppState, scope: &Scope, duties: &str, factors: &ExistingFactors) -> EvaluationResponse {
    let evaluation =
        FactorSetBuilder::new(&state.heuristics, scope.system, scope.target).build(duties, factors);
    let reconciled = reconcile(evaluation, scope.target);

    info!(
        "{} evaluation for {}: {} points, {} ({} moves)",
        scope.system,
        scope.target.grade,
        reconciled.evaluation.total_points(),
        reconciled.band.grade,
        reconciled.report.moves.len()
    );

    EvaluationResponse {
        evaluation_id: Uuid::new_v4(),
        rating_system: scope.system,
        target_grade: scope.target.grade.to_string(),
        view: reconciled.view(),
        forced_from: reconciled.evaluation.forced().map(|f| f.from),
        adjustments: reconciled.report,
        generated_at: Utc::now(),
    }
}

/// Full generation: the model proposes every factor. Caller-supplied levels
/// are shown to it as context only.
pub async fn generate(
    state: &AppState,
    request: &EvaluationRequest,
) -> Result<EvaluationResponse, AppError> {
    require_duties(request)?;
    let scope = scope_for(request)?;

    let proposed = propose(
        state,
        &scope,
        &request.duties_text,
        scope.system.factors(),
        &request.existing_factors,
    )
    .await?;

    Ok(finish(state, &scope, &request.duties_text, &proposed))
}

/// Keeps caller levels except the listed factors and any factor the caller
/// did not supply; those are re-proposed. Nothing to re-propose means no
/// model call at all.
pub async fn regenerate(
    state: &AppState,
    request: &EvaluationRequest,
) -> Result<EvaluationResponse, AppError> {
    require_duties(request)?;
    let scope = scope_for(request)?;

    let mut listed = BTreeSet::new();
    for key in &request.factors_to_regenerate {
        let id = key
            .parse::<FactorId>()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if scope.system.has_factor(id) {
            listed.insert(id);
        } else {
            warn!("factorsToRegenerate names {id}, which is not part of {}", scope.system);
        }
    }

    let mut kept = ExistingFactors::new();
    for (key, factor) in &request.existing_factors {
        if let Ok(id) = key.parse::<FactorId>() {
            if scope.system.has_factor(id) && !listed.contains(&id) {
                kept.insert(id.as_str().to_string(), factor.clone());
            }
        }
    }

    let targets: Vec<FactorId> = scope
        .system
        .factors()
        .iter()
        .copied()
        .filter(|id| listed.contains(id) || !kept.contains_key(id.as_str()))
        .collect();

    let mut merged = kept.clone();
    if targets.is_empty() {
        info!("Regenerate with nothing to re-propose; skipping the model");
    } else {
        merged.extend(propose(state, &scope, &request.duties_text, &targets, &kept).await?);
    }

    Ok(finish(state, &scope, &request.duties_text, &merged))
}

/// User-edited levels through builder and reconciliation. No model call.
pub fn update(state: &AppState, request: &EvaluationRequest) -> Result<EvaluationResponse, AppError> {
    let scope = scope_for(request)?;
    Ok(finish(state, &scope, &request.duties_text, &request.existing_factors))
}

/// Generates and reconciles an evaluation, then asks the model for the PD
/// narrative. The factor section is appended from the reconciled result so
/// headers and points appear exactly as computed.
pub async fn draft(state: &AppState, request: &PdDraftRequest) -> Result<PdDraftResponse, AppError> {
    let evaluation = generate(state, &request.evaluation).await?;

    let headers: Vec<String> = evaluation
        .view
        .factors
        .values()
        .map(|f| f.header.clone())
        .collect();
    let prompt = build_pd_draft_prompt(
        request.position_title.as_deref(),
        request.organization.as_deref(),
        &evaluation.view.final_grade,
        &headers,
        &request.evaluation.duties_text,
    );

    let narrative = state
        .llm
        .complete(&prompt, CLASSIFIER_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("PD draft failed: {e}")))?;

    let draft = format!("{}\n\n{}", narrative.trim(), factor_section(&evaluation));
    Ok(PdDraftResponse { evaluation, draft })
}

fn factor_section(evaluation: &EvaluationResponse) -> String {
    let mut section = String::from("FACTOR EVALUATION\n");
    for factor in evaluation.view.factors.values() {
        section.push_str(&format!("\n{}\n{}\n", factor.header, factor.rationale));
    }
    section.push_str(&format!(
        "\nTotal Points: {}\nFinal Grade: {}\nGrade Range: {}\n",
        evaluation.view.total_points, evaluation.view.final_grade, evaluation.view.grade_range
    ));
    section
}
