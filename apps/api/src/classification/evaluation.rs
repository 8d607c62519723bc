//! Evaluation model: factor assignments for one rating system and the
//! output view returned to callers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classification::bands::GradeBand;
use crate::classification::factors::{FactorId, RatingSystem};
use crate::classification::level::Level;
use crate::classification::points::points_for;

/// One factor's level, locked title, table points, and rationale.
///
/// `points` is private and only ever written alongside `level`, so it can
/// never disagree with the point table.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorAssignment {
    title: &'static str,
    level: Level,
    points: u32,
    pub rationale: String,
}

impl FactorAssignment {
    pub fn new(system: RatingSystem, level: Level, rationale: String) -> Self {
        FactorAssignment {
            title: system.title(level.factor()).unwrap_or_default(),
            level,
            points: points_for(system, &level),
            rationale,
        }
    }

    pub fn factor(&self) -> FactorId {
        self.level.factor()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    /// `"Factor 1 - Knowledge Required by the Position Level 1-7, 1250 Points"`
    pub fn header(&self) -> String {
        format!(
            "{} - {} Level {}, {} Points",
            self.factor().display_key(),
            self.title,
            self.level,
            self.points
        )
    }

    fn set_level(&mut self, system: RatingSystem, level: Level) {
        self.points = points_for(system, &level);
        self.level = level;
    }
}

/// A point total replaced by the nearest band minimum because the searched
/// total ended in a forbidden range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedTotal {
    pub from: u32,
    pub to: u32,
}

/// The factor set for one rating system, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    system: RatingSystem,
    assignments: Vec<FactorAssignment>,
    forced: Option<ForcedTotal>,
}

impl Evaluation {
    /// Assignments are reordered into the system's display order; any whose
    /// factor is foreign to `system` is dropped.
    pub fn new(system: RatingSystem, assignments: Vec<FactorAssignment>) -> Self {
        let mut assignments: Vec<FactorAssignment> = assignments
            .into_iter()
            .filter(|a| system.has_factor(a.factor()))
            .collect();
        assignments.sort_by_key(|a| {
            system
                .factors()
                .iter()
                .position(|f| *f == a.factor())
                .unwrap_or(usize::MAX)
        });

        Evaluation {
            system,
            assignments,
            forced: None,
        }
    }

    pub fn system(&self) -> RatingSystem {
        self.system
    }

    pub fn assignments(&self) -> &[FactorAssignment] {
        &self.assignments
    }

    pub fn assignment(&self, factor: FactorId) -> Option<&FactorAssignment> {
        self.assignments.iter().find(|a| a.factor() == factor)
    }

    /// Live sum of the assignment points.
    pub fn points_sum(&self) -> u32 {
        self.assignments.iter().map(|a| a.points).sum()
    }

    /// Reported total: the live sum, or the forced band minimum.
    pub fn total_points(&self) -> u32 {
        self.forced.map_or_else(|| self.points_sum(), |f| f.to)
    }

    pub fn forced(&self) -> Option<ForcedTotal> {
        self.forced
    }

    /// Replaces the level of `factor`, returning the point delta. Any forced
    /// total is discarded since it no longer describes these levels.
    pub(crate) fn set_level(&mut self, level: Level) -> Option<i64> {
        let system = self.system;
        let assignment = self
            .assignments
            .iter_mut()
            .find(|a| a.factor() == level.factor())?;
        let before = assignment.points as i64;
        assignment.set_level(system, level);
        self.forced = None;
        Some(assignment.points as i64 - before)
    }

    pub(crate) fn force_total(&mut self, to: u32) {
        self.forced = Some(ForcedTotal {
            from: self.points_sum(),
            to,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorView {
    pub header: String,
    pub level: String,
    pub points: u32,
    pub rationale: String,
}

/// Output contract: factors keyed `"Factor <id>"`, plus the three derived
/// fields, which are always computed together from one total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationView {
    pub factors: BTreeMap<String, FactorView>,
    pub total_points: u32,
    pub final_grade: String,
    pub grade_range: String,
}

impl EvaluationView {
    pub(crate) fn new(evaluation: &Evaluation, band: &GradeBand) -> Self {
        let factors = evaluation
            .assignments()
            .iter()
            .map(|a| {
                (
                    a.factor().display_key(),
                    FactorView {
                        header: a.header(),
                        level: a.level().to_string(),
                        points: a.points(),
                        rationale: a.rationale.clone(),
                    },
                )
            })
            .collect();

        EvaluationView {
            factors,
            total_points: evaluation.total_points(),
            final_grade: band.grade.to_string(),
            grade_range: band.range_label(),
        }
    }
}
