// All LLM prompt constants for the evaluations module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::classification::{ExistingFactors, FactorId, GradeBand, RatingSystem};
use crate::llm_client::prompts::{reference_block, NO_ARITHMETIC_INSTRUCTION};

/// Factor proposal prompt. Replace every `{placeholder}` before sending;
/// `{duties}` is replaced last.
pub const FACTOR_PROPOSAL_TEMPLATE: &str = r#"{reference}Evaluate the position below under the {system} for a target grade of {target_grade} (point range {grade_range}).

Propose a level and a short rationale for EACH of these factors, and no others:
{factor_lines}
{context}
Return a JSON object with this EXACT schema (no extra fields):
{
  "factors": {
    "<factor id>": {"level": "<factor id>-<level number>", "rationale": "Two or three sentences tied to the duties."}
  }
}

Rules:
- Factor ids are exactly as listed ("1", "4A", ...). Levels use the same id as prefix, e.g. "1-7" or "4A-2".
- Never exceed the highest level shown for a factor.
- Base every level on the duties text, not on the target grade alone.
- {no_arithmetic}

DUTIES:
{duties}"#;

/// PD narrative prompt. Replace every `{placeholder}` before sending.
pub const PD_DRAFT_TEMPLATE: &str = r#"Write a federal position description for "{position_title}"{organization} at {grade}.

Use these sections, in order, as plain text with upper-case section headings:
INTRODUCTION
MAJOR DUTIES (with approximate percentage of time for each duty)

The factor evaluation has already been completed. These factor headers are final and will be appended after your text; stay consistent with them and do NOT restate or renumber them:
{factor_headers}

DUTIES:
{duties}"#;

/// Human name of the rating system used in prompts.
pub fn system_name(system: RatingSystem) -> &'static str {
    match system {
        RatingSystem::Fes => "Factor Evaluation System (FES)",
        RatingSystem::Gssg => "General Schedule Supervisory Guide (GSSG)",
    }
}

/// `"- Factor 1 (Knowledge Required by the Position): 1-1 to 1-9"`
fn factor_lines(system: RatingSystem, factors: &[FactorId]) -> String {
    factors
        .iter()
        .filter_map(|f| {
            let title = system.title(*f)?;
            let max = system.max_level(*f)?;
            Some(format!("- {} ({title}): {f}-1 to {f}-{max}", f.display_key()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Levels the caller already holds, shown as context for the proposal.
fn context_block(kept: &ExistingFactors) -> String {
    let lines: Vec<String> = kept
        .iter()
        .filter_map(|(key, factor)| {
            let level = factor.level.as_deref()?.trim();
            (!level.is_empty()).then(|| format!("- {key}: {level}"))
        })
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    format!(
        "\nAlready assigned (context only, do not change):\n{}\n",
        lines.join("\n")
    )
}

pub fn build_factor_proposal_prompt(
    system: RatingSystem,
    target: &GradeBand,
    duties: &str,
    targets: &[FactorId],
    kept: &ExistingFactors,
    excerpt: &str,
) -> String {
    FACTOR_PROPOSAL_TEMPLATE
        .replace("{reference}", &reference_block(system.as_str(), excerpt))
        .replace("{system}", system_name(system))
        .replace("{target_grade}", target.grade)
        .replace("{grade_range}", &target.range_label())
        .replace("{factor_lines}", &factor_lines(system, targets))
        .replace("{context}", &context_block(kept))
        .replace("{no_arithmetic}", NO_ARITHMETIC_INSTRUCTION)
        .replace("{duties}", duties.trim())
}

pub fn build_pd_draft_prompt(
    position_title: Option<&str>,
    organization: Option<&str>,
    grade: &str,
    factor_headers: &[String],
    duties: &str,
) -> String {
    let organization = organization
        .map(|o| format!(" in {}", o.trim()))
        .unwrap_or_default();
    PD_DRAFT_TEMPLATE
        .replace("{position_title}", position_title.unwrap_or("the position").trim())
        .replace("{organization}", &organization)
        .replace("{grade}", grade)
        .replace("{factor_headers}", &factor_headers.join("\n"))
        .replace("{duties}", duties.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{ExistingFactor, GradeBandTable};

    fn gs12() -> &'static GradeBand {
        GradeBandTable::for_system(RatingSystem::Fes)
            .band_for_grade("GS-12")
            .unwrap()
    }

    #[test]
    fn test_proposal_prompt_lists_only_targets() {
        let prompt = build_factor_proposal_prompt(
            RatingSystem::Fes,
            gs12(),
            "Analyzes budgets.",
            &[FactorId::F1, FactorId::F5],
            &ExistingFactors::new(),
            "",
        );
        assert!(prompt.contains("- Factor 1 (Knowledge Required by the Position): 1-1 to 1-9"));
        assert!(prompt.contains("- Factor 5 (Scope and Effect): 5-1 to 5-6"));
        assert!(!prompt.contains("Factor 2 ("));
        assert!(prompt.contains("2755-3150"));
        assert!(prompt.ends_with("Analyzes budgets."));
        assert!(!prompt.contains("REFERENCE"));
        assert!(!prompt.contains("{factor_lines}"));
    }

    #[test]
    fn test_proposal_prompt_includes_reference_and_context() {
        let mut kept = ExistingFactors::new();
        kept.insert(
            "2".to_string(),
            ExistingFactor {
                level: Some("2-4".to_string()),
                ..Default::default()
            },
        );
        let prompt = build_factor_proposal_prompt(
            RatingSystem::Fes,
            gs12(),
            "d",
            &[FactorId::F1],
            &kept,
            "Level 1-7 requires mastery.",
        );
        assert!(prompt.starts_with("REFERENCE (FES)"));
        assert!(prompt.contains("- 2: 2-4"));
    }

    #[test]
    fn test_gssg_prompt_uses_split_factor_ids() {
        let band = GradeBandTable::for_system(RatingSystem::Gssg)
            .band_for_grade("GS-13")
            .unwrap();
        let prompt = build_factor_proposal_prompt(
            RatingSystem::Gssg,
            band,
            "d",
            RatingSystem::Gssg.factors(),
            &ExistingFactors::new(),
            "",
        );
        assert!(prompt.contains("General Schedule Supervisory Guide"));
        assert!(prompt.contains("- Factor 4A (Personal Contacts: Nature of Contacts): 4A-1 to 4A-4"));
    }

    #[test]
    fn test_pd_draft_prompt_embeds_headers() {
        let headers = vec!["Factor 1 - Knowledge Required by the Position Level 1-7, 1250 Points".to_string()];
        let prompt = build_pd_draft_prompt(Some("Budget Analyst"), Some("OCFO"), "GS-12", &headers, "d");
        assert!(prompt.contains("\"Budget Analyst\" in OCFO at GS-12"));
        assert!(prompt.contains(&headers[0]));
    }
}
