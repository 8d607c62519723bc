//! Factor-set builder: turns partial, user-edited, or model-proposed factor
//! input into one complete, validated assignment per required factor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classification::bands::GradeBand;
use crate::classification::evaluation::{Evaluation, FactorAssignment};
use crate::classification::factors::{FactorId, RatingSystem};
use crate::classification::heuristics::{Diversification, HeuristicConfig};
use crate::classification::level::{validate, Direction, Level};

/// Client- or model-supplied state for one factor. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingFactor {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
    /// Only read for rating-system detection; headers are always rebuilt.
    #[serde(default)]
    pub header: Option<String>,
}

/// Keyed `"1"` or `"Factor 1"`, exactly as the caller sent it.
pub type ExistingFactors = BTreeMap<String, ExistingFactor>;

/// Explicit choice wins. Otherwise 4A/4B keys or a GSSG title in any header
/// select GSSG; everything else is FES.
pub fn detect_rating_system(
    explicit: Option<RatingSystem>,
    existing: &ExistingFactors,
) -> RatingSystem {
    if let Some(system) = explicit {
        return system;
    }

    let split_key = existing
        .keys()
        .filter_map(|k| k.parse::<FactorId>().ok())
        .any(|f| matches!(f, FactorId::F4A | FactorId::F4B));

    let gssg_titles: Vec<String> = RatingSystem::Gssg
        .factors()
        .iter()
        .filter_map(|f| RatingSystem::Gssg.title(*f))
        .map(str::to_lowercase)
        .collect();
    let gssg_header = existing
        .values()
        .filter_map(|e| e.header.as_deref())
        .map(str::to_lowercase)
        .any(|h| gssg_titles.iter().any(|t| h.contains(t.as_str())));

    if split_key || gssg_header {
        debug!("Detected GSSG from existing factors");
        RatingSystem::Gssg
    } else {
        RatingSystem::Fes
    }
}

pub struct FactorSetBuilder<'a> {
    heuristics: &'a HeuristicConfig,
    system: RatingSystem,
    target: &'static GradeBand,
}

impl<'a> FactorSetBuilder<'a> {
    pub fn new(
        heuristics: &'a HeuristicConfig,
        system: RatingSystem,
        target: &'static GradeBand,
    ) -> Self {
        Self {
            heuristics,
            system,
            target,
        }
    }

    pub fn build(&self, duties: &str, existing: &ExistingFactors) -> Evaluation {
        let inputs = self.index_inputs(existing);
        let duties_lower = duties.to_lowercase();
        let profile = self.heuristics.profile_levels(self.system, self.target);
        if profile.is_none() {
            warn!(
                "No {} grade profile for {}; missing factors default to level 1",
                self.system, self.target.grade
            );
        }

        let mut levels = Vec::with_capacity(self.system.factors().len());
        let mut rationales = Vec::with_capacity(self.system.factors().len());
        for (index, factor) in self.system.factors().iter().copied().enumerate() {
            let input = inputs.get(&factor).copied();
            let level = match input.and_then(|e| non_empty(e.level.as_deref())) {
                Some(raw) => self.normalize(factor, raw),
                None => {
                    let typical = profile.and_then(|p| p.get(index)).copied().unwrap_or(1);
                    self.intelligent_default(factor, typical, &duties_lower)
                }
            };
            let Some(level) = level else {
                warn!("Factor {} has no valid level under {}, skipped", factor, self.system);
                continue;
            };
            levels.push(level);
            rationales.push(input.and_then(|e| non_empty(e.rationale.as_deref())));
        }

        if diversify(self.system, &mut levels, &self.heuristics.diversification) {
            info!(
                "All {} factors shared one level; diversified for {}",
                self.system, self.target.grade
            );
        }

        let assignments = levels
            .into_iter()
            .zip(rationales)
            .map(|(level, rationale)| {
                let rationale = rationale
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Assigned at level {level}."));
                FactorAssignment::new(self.system, level, rationale)
            })
            .collect();

        Evaluation::new(self.system, assignments)
    }

    fn index_inputs<'e>(
        &self,
        existing: &'e ExistingFactors,
    ) -> BTreeMap<FactorId, &'e ExistingFactor> {
        let mut inputs = BTreeMap::new();
        for (key, value) in existing {
            match key.parse::<FactorId>() {
                Ok(factor) if self.system.has_factor(factor) => {
                    inputs.insert(factor, value);
                }
                Ok(factor) => {
                    warn!("Ignoring factor {} which is not part of {}", factor, self.system)
                }
                Err(e) => warn!("Ignoring existing factor: {e}"),
            }
        }
        inputs
    }

    /// Prefix repair and clamping happen in `validate`; unreadable input falls
    /// back to level 1.
    fn normalize(&self, factor: FactorId, raw: &str) -> Option<Level> {
        match validate(self.system, factor, raw) {
            Ok((level, _)) => Some(level),
            Err(e) => {
                warn!("Factor {}: {}; using level 1", factor, e);
                Level::new(self.system, factor, 1)
            }
        }
    }

    fn intelligent_default(&self, factor: FactorId, typical: u8, duties_lower: &str) -> Option<Level> {
        let max = self.system.max_level(factor)?;
        let shift = self.heuristics.keyword_shift(self.system, factor, duties_lower);
        let number = (i16::from(typical) + i16::from(shift)).clamp(1, i16::from(max));
        Level::new(self.system, factor, number as u8)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Spreads a uniform level set so the factors do not all read the same.
/// Returns whether anything was applied.
pub fn diversify(system: RatingSystem, levels: &mut [Level], amounts: &Diversification) -> bool {
    let Some(first) = levels.first().map(Level::number) else {
        return false;
    };
    if levels.len() < 2 || levels.iter().any(|l| l.number() != first) {
        return false;
    }

    for level in levels.iter_mut() {
        let (direction, rungs) = match level.factor() {
            FactorId::F1 | FactorId::F5 => (Direction::Up, amounts.primary_bump),
            FactorId::F2 => (Direction::Up, amounts.secondary_bump),
            FactorId::F3 => (Direction::Down, amounts.down_nudge),
            _ => continue,
        };
        *level = level.shifted(system, direction, rungs);
    }
    true
}
