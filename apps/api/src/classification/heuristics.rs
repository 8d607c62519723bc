//! Editorial heuristics for the factor-set builder.
//!
//! Grade profiles (typical levels per grade), duties-keyword nudges, and the
//! diversification amounts are approximations, not OPM scoring law. They
//! are data so they can be tuned without touching the builder: the defaults
//! below can be replaced wholesale by a JSON file (`HEURISTICS_PATH`).

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classification::bands::{GradeBand, GradeBandTable};
use crate::classification::factors::{FactorId, RatingSystem};

/// Containment rule: any phrase found in the duties text shifts `factor`
/// by the sign of `shift`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRule {
    pub system: RatingSystem,
    pub factor: FactorId,
    pub phrases: Vec<String>,
    pub shift: i8,
}

/// Typical levels for one grade, in the system's factor order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeProfile {
    pub system: RatingSystem,
    pub grade: String,
    pub levels: Vec<u8>,
}

/// Rung counts applied when every factor came out at the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Diversification {
    /// Factors 1 and 5.
    pub primary_bump: u8,
    /// Factor 2.
    pub secondary_bump: u8,
    /// Factor 3, downward.
    pub down_nudge: u8,
}

impl Default for Diversification {
    fn default() -> Self {
        Self {
            primary_bump: 2,
            secondary_bump: 1,
            down_nudge: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeuristicConfig {
    pub grade_profiles: Vec<GradeProfile>,
    pub keyword_rules: Vec<KeywordRule>,
    pub diversification: Diversification,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            grade_profiles: default_profiles(),
            keyword_rules: default_rules(),
            diversification: Diversification::default(),
        }
    }
}

impl HeuristicConfig {
    /// Built-in defaults, or the JSON file at `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read heuristics file {}", path.display()))?;
        let config: HeuristicConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid heuristics JSON in {}", path.display()))?;
        config.validate()?;

        info!(
            "Loaded heuristics from {}: {} profiles, {} keyword rules",
            path.display(),
            config.grade_profiles.len(),
            config.keyword_rules.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for profile in &self.grade_profiles {
            let expected = profile.system.factors().len();
            if profile.levels.len() != expected {
                bail!(
                    "{} profile {} has {} levels, expected {}",
                    profile.system,
                    profile.grade,
                    profile.levels.len(),
                    expected
                );
            }
            if GradeBandTable::for_system(profile.system)
                .band_for_grade(&profile.grade)
                .is_none()
            {
                bail!(
                    "{} profile names '{}', which is not a band grade",
                    profile.system,
                    profile.grade
                );
            }
        }
        for rule in &self.keyword_rules {
            if !rule.system.has_factor(rule.factor) {
                bail!(
                    "Keyword rule targets factor {} which is not part of {}",
                    rule.factor,
                    rule.system
                );
            }
        }
        Ok(())
    }

    /// Typical levels for `band` in `system`, in factor order.
    pub fn profile_levels(&self, system: RatingSystem, band: &GradeBand) -> Option<&[u8]> {
        let table = GradeBandTable::for_system(system);
        self.grade_profiles
            .iter()
            .find(|p| {
                p.system == system
                    && table
                        .band_for_grade(&p.grade)
                        .is_some_and(|b| b.grade == band.grade)
            })
            .map(|p| p.levels.as_slice())
    }

    /// Net nudge (-1, 0, or +1) for `factor` from the lowercased duties text.
    /// At most one upward and one downward step apply per factor.
    pub fn keyword_shift(&self, system: RatingSystem, factor: FactorId, duties_lower: &str) -> i8 {
        let matches = |up: bool| {
            self.keyword_rules.iter().any(|rule| {
                rule.system == system
                    && rule.factor == factor
                    && (rule.shift > 0) == up
                    && rule.shift != 0
                    && rule.phrases.iter().any(|p| duties_lower.contains(p.as_str()))
            })
        };
        i8::from(matches(true)) - i8::from(matches(false))
    }
}

fn profile(system: RatingSystem, grade: &str, levels: &[u8]) -> GradeProfile {
    GradeProfile {
        system,
        grade: grade.to_string(),
        levels: levels.to_vec(),
    }
}

fn default_profiles() -> Vec<GradeProfile> {
    use RatingSystem::{Fes, Gssg};
    vec![
        profile(Fes, "GS-05", &[4, 2, 2, 2, 2, 2, 2, 1, 1]),
        profile(Fes, "GS-07", &[5, 3, 2, 2, 2, 2, 2, 1, 1]),
        profile(Fes, "GS-09", &[6, 3, 3, 3, 3, 2, 2, 1, 1]),
        profile(Fes, "GS-11", &[7, 4, 3, 4, 3, 3, 2, 1, 1]),
        profile(Fes, "GS-12", &[7, 4, 4, 4, 4, 3, 3, 1, 1]),
        profile(Fes, "GS-13", &[8, 4, 4, 5, 4, 3, 3, 1, 1]),
        profile(Fes, "GS-14", &[8, 5, 5, 5, 5, 3, 3, 1, 1]),
        profile(Fes, "GS-15", &[9, 5, 5, 6, 5, 4, 4, 1, 1]),
        // GSSG order: 1, 2, 3, 4A, 4B, 5, 6. The GSSG floor (1165) sits above
        // the GS-05 band, so its profile is simply the floor.
        profile(Gssg, "GS-05", &[1, 1, 1, 1, 1, 1, 1]),
        profile(Gssg, "GS-07", &[1, 1, 1, 1, 1, 3, 1]),
        profile(Gssg, "GS-09", &[2, 1, 1, 2, 2, 5, 1]),
        profile(Gssg, "GS-11", &[2, 2, 2, 2, 2, 4, 2]),
        profile(Gssg, "GS-12", &[3, 2, 2, 2, 2, 5, 2]),
        profile(Gssg, "GS-13", &[3, 2, 3, 3, 3, 6, 2]),
        profile(Gssg, "GS-14", &[4, 3, 3, 3, 3, 6, 3]),
        profile(Gssg, "GS-15", &[5, 3, 4, 4, 4, 7, 4]),
    ]
}

fn rule(system: RatingSystem, factor: FactorId, shift: i8, phrases: &[&str]) -> KeywordRule {
    KeywordRule {
        system,
        factor,
        phrases: phrases.iter().map(|p| p.to_string()).collect(),
        shift,
    }
}

fn default_rules() -> Vec<KeywordRule> {
    use FactorId::*;
    use RatingSystem::{Fes, Gssg};
    vec![
        rule(Fes, F1, 1, &["expert", "recognized authority", "mastery of"]),
        rule(Fes, F1, -1, &["entry level", "entry-level", "trainee", "routine"]),
        rule(Fes, F2, 1, &["independently", "minimal supervision", "broad latitude"]),
        rule(Fes, F2, -1, &["close supervision", "detailed instructions"]),
        rule(Fes, F3, 1, &["develops policy", "policy development", "lack of precedent"]),
        rule(Fes, F3, -1, &["established procedures", "clear guidelines"]),
        rule(Fes, F4, 1, &["complex", "novel", "unprecedented"]),
        rule(Fes, F4, -1, &["routine", "repetitive", "straightforward"]),
        rule(Fes, F5, 1, &["national", "agency-wide", "government-wide"]),
        rule(Fes, F5, -1, &["immediate office", "local office"]),
        rule(Fes, F6, 1, &["congress", "senior officials", "media"]),
        rule(Fes, F7, 1, &["negotiate", "persuade", "justify", "defend"]),
        rule(Fes, F8, 1, &["lifting", "climbing", "field work", "strenuous"]),
        rule(Fes, F9, 1, &["hazard", "outdoors", "laboratory", "protective equipment"]),
        rule(Gssg, F1, 1, &["national", "agency-wide", "multi-state", "government-wide"]),
        rule(Gssg, F1, -1, &["single office", "local office"]),
        rule(Gssg, F2, 1, &["reports to senior", "senior executive", "agency head"]),
        rule(Gssg, F3, 1, &["supervises", "hiring", "budget", "performance appraisals"]),
        rule(Gssg, F3, -1, &["team lead", "work leader"]),
        rule(Gssg, F4A, 1, &["congress", "media", "senior officials"]),
        rule(Gssg, F4B, 1, &["negotiate", "justify", "defend"]),
        rule(Gssg, F5, 1, &["professional staff", "scientists", "engineers"]),
        rule(Gssg, F5, -1, &["clerical"]),
        rule(Gssg, F6, 1, &["subordinate supervisors", "coordinate", "multiple programs"]),
    ]
}
