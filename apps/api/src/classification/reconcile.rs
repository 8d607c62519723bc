//! Reconciliation engine: band-seeking local search over factor levels.
//!
//! Flow: in band? → done. Otherwise walk the system's priority order (reversed
//! when decreasing), stepping one rung at a time toward the band midpoint,
//! until within tolerance, a pass changes nothing, or the iteration cap is hit.
//! A total left in a forbidden range is forced to the next band's minimum.
//!
//! Pure computation: no I/O, no shared state, safe on any request thread.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classification::bands::{BandLookup, GradeBand, GradeBandTable};
use crate::classification::evaluation::{Evaluation, EvaluationView};
use crate::classification::factors::FactorId;
use crate::classification::level::Direction;
use crate::classification::points::points_for;

/// One accepted level change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelMove {
    pub factor: FactorId,
    pub from: String,
    pub to: String,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub target_grade: String,
    pub starting_points: u32,
    pub iterations: u32,
    pub moves: Vec<LevelMove>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced_from: Option<u32>,
    pub in_target_band: bool,
}

/// A reconciled evaluation and the band its total falls in.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub evaluation: Evaluation,
    pub band: &'static GradeBand,
    pub report: ReconcileReport,
}

impl Reconciled {
    pub fn view(&self) -> EvaluationView {
        EvaluationView::new(&self.evaluation, self.band)
    }
}

/// Search target: the band interval plus the midpoint the search aims for.
struct Target {
    min: i64,
    max: Option<i64>,
    mid: i64,
}

impl Target {
    fn new(band: &GradeBand, tolerance: i64) -> Self {
        let min = band.min_points as i64;
        let max = band.max_points.map(i64::from);
        let mid = match max {
            Some(max) => (min + max) / 2,
            // Open top band: aim just inside the floor.
            None => min + tolerance,
        };
        Target { min, max, mid }
    }

    fn contains(&self, total: i64) -> bool {
        total >= self.min && self.max.map_or(true, |max| total <= max)
    }
}

/// Adjusts `evaluation` toward `target` and derives its final grade.
///
/// Never fails: factors missing from the evaluation are skipped, a stalled
/// search stops where it is, and a forbidden total is forced to a band edge.
pub fn reconcile(mut evaluation: Evaluation, target: &'static GradeBand) -> Reconciled {
    let system = evaluation.system();
    let profile = system.profile();
    let goal = Target::new(target, profile.tolerance);

    let starting_points = evaluation.points_sum();
    let mut total = starting_points as i64;
    let mut iterations = 0;
    let mut moves = Vec::new();

    if goal.contains(total) {
        debug!(
            "{} evaluation already in {} ({} points)",
            system, target.grade, total
        );
    } else {
        'search: while iterations < profile.max_iterations {
            iterations += 1;

            let direction = if goal.mid > total {
                Direction::Up
            } else {
                Direction::Down
            };
            let mut changed = false;

            for factor in profile.order(direction) {
                let Some(current) = evaluation.assignment(factor).map(|a| a.level()) else {
                    debug!("Factor {} absent from {} evaluation, skipped", factor, system);
                    continue;
                };
                let Some(candidate) = current.step(system, direction) else {
                    continue;
                };

                let delta =
                    points_for(system, &candidate) as i64 - points_for(system, &current) as i64;
                if !accepts(&goal, total, delta) {
                    continue;
                }

                evaluation.set_level(candidate);
                total += delta;
                changed = true;
                moves.push(LevelMove {
                    factor,
                    from: current.to_string(),
                    to: candidate.to_string(),
                    delta,
                });

                if (goal.mid - total).abs() <= profile.tolerance {
                    break 'search;
                }
            }

            if !changed {
                debug!("Pass {} made no moves; search stalled", iterations);
                break;
            }
        }
    }

    let band = match GradeBandTable::for_system(system).band_for_points(evaluation.points_sum()) {
        BandLookup::Band(band) => band,
        BandLookup::Forbidden { resolve_to } => {
            warn!(
                "{} total {} is in a forbidden range after {} passes; forcing to {} ({})",
                system,
                evaluation.points_sum(),
                iterations,
                resolve_to.min_points,
                resolve_to.grade
            );
            evaluation.force_total(resolve_to.min_points);
            resolve_to
        }
    };

    let report = ReconcileReport {
        target_grade: target.grade.to_string(),
        starting_points,
        iterations,
        moves,
        forced_from: evaluation.forced().map(|f| f.from),
        in_target_band: band.grade == target.grade,
    };

    info!(
        "Reconciled {} evaluation: {} → {} points, {} moves, final {} (target {})",
        system,
        starting_points,
        evaluation.total_points(),
        report.moves.len(),
        band.grade,
        target.grade
    );

    Reconciled {
        evaluation,
        band,
        report,
    }
}

/// A move must point toward the midpoint and must not overshoot it: it either
/// shrinks the distance to the midpoint or carries an out-of-band total into
/// the band.
fn accepts(goal: &Target, total: i64, delta: i64) -> bool {
    let diff = goal.mid - total;
    if delta == 0 || delta.signum() != diff.signum() {
        return false;
    }
    let next = total + delta;
    (goal.mid - next).abs() < diff.abs() || (!goal.contains(total) && goal.contains(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::evaluation::FactorAssignment;
    use crate::classification::factors::RatingSystem;
    use crate::classification::level::Level;

    fn evaluation(system: RatingSystem, levels: &[u8]) -> Evaluation {
        let assignments = system
            .factors()
            .iter()
            .zip(levels)
            .map(|(factor, number)| {
                let level = Level::new(system, *factor, *number).unwrap();
                FactorAssignment::new(system, level, String::new())
            })
            .collect();
        Evaluation::new(system, assignments)
    }

    fn band(system: RatingSystem, grade: &str) -> &'static GradeBand {
        GradeBandTable::for_system(system).band_for_grade(grade).unwrap()
    }

    fn assert_invariants(reconciled: &Reconciled) {
        let evaluation = &reconciled.evaluation;
        let system = evaluation.system();

        // Points consistency.
        match evaluation.forced() {
            Some(forced) => {
                assert_eq!(forced.from, evaluation.points_sum());
                assert_eq!(evaluation.total_points(), reconciled.band.min_points);
            }
            None => assert_eq!(evaluation.total_points(), evaluation.points_sum()),
        }

        // Band validity.
        assert!(reconciled.band.contains(evaluation.total_points()));
        let view = reconciled.view();
        assert_eq!(view.total_points, evaluation.total_points());
        assert_eq!(view.final_grade, reconciled.band.grade);
        assert_eq!(view.grade_range, reconciled.band.range_label());

        // Level bounds and table-backed points.
        for a in evaluation.assignments() {
            let max = system.max_level(a.factor()).unwrap();
            assert!((1..=max).contains(&a.level().number()));
            assert_eq!(a.points(), points_for(system, &a.level()));
        }
    }

    #[test]
    fn test_fes_push_out_of_forbidden_range() {
        // 750+125+125+75+25+10+20+20+50 = 1200, inside the skipped GS-06 range.
        let start = evaluation(RatingSystem::Fes, &[5, 2, 2, 2, 1, 1, 1, 2, 3]);
        assert_eq!(start.points_sum(), 1200);

        let reconciled = reconcile(start, band(RatingSystem::Fes, "GS-07"));

        assert_invariants(&reconciled);
        assert!(reconciled.evaluation.total_points() >= 1355);
        assert_eq!(reconciled.view().final_grade, "GS-07");
        assert!(reconciled.report.in_target_band);
        assert!(reconciled.report.forced_from.is_none());

        // Increases follow the priority order, starting with factor 1.
        let factors: Vec<FactorId> = reconciled.report.moves.iter().map(|m| m.factor).collect();
        assert_eq!(factors, vec![FactorId::F1, FactorId::F5]);
        assert!(reconciled.report.moves.iter().all(|m| m.delta > 0));
        assert_eq!(reconciled.evaluation.total_points(), 1450);
    }

    #[test]
    fn test_in_band_evaluation_is_unchanged() {
        // GS-12 profile, 2790 points.
        let start = evaluation(RatingSystem::Fes, &[7, 4, 4, 4, 4, 3, 3, 1, 1]);
        let reconciled = reconcile(start.clone(), band(RatingSystem::Fes, "GS-12"));
        assert_eq!(reconciled.evaluation, start);
        assert!(reconciled.report.moves.is_empty());
        assert_eq!(reconciled.report.iterations, 0);
        assert_invariants(&reconciled);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let start = evaluation(RatingSystem::Fes, &[5, 2, 2, 2, 1, 1, 1, 2, 3]);
        let target = band(RatingSystem::Fes, "GS-07");
        let once = reconcile(start, target);
        let twice = reconcile(once.evaluation.clone(), target);
        assert_eq!(twice.evaluation, once.evaluation);
        assert!(twice.report.moves.is_empty());
    }

    #[test]
    fn test_decrease_walks_reverse_priority() {
        // GS-15 profile (4265) aimed at GS-12.
        let start = evaluation(RatingSystem::Fes, &[9, 5, 5, 6, 5, 4, 4, 1, 1]);
        let reconciled = reconcile(start, band(RatingSystem::Fes, "GS-12"));

        assert_invariants(&reconciled);
        assert_eq!(reconciled.view().final_grade, "GS-12");
        let first = &reconciled.report.moves[0];
        assert!(first.delta < 0);
        // 8 and 9 are already at level 1, so the reverse walk starts at factor 7.
        assert_eq!(first.factor, FactorId::F7);
    }

    #[test]
    fn test_unreachable_band_forces_to_nearest_edge() {
        // GSSG floor is 1165 points, above the whole GS-05 band and inside
        // the skipped range below GS-07.
        let start = evaluation(RatingSystem::Gssg, &[1, 1, 1, 1, 1, 1, 1]);
        assert_eq!(start.points_sum(), 1165);

        let reconciled = reconcile(start, band(RatingSystem::Gssg, "GS-05"));

        assert_invariants(&reconciled);
        assert!(reconciled.report.moves.is_empty());
        assert_eq!(reconciled.report.forced_from, Some(1165));
        assert_eq!(reconciled.evaluation.total_points(), 1355);
        assert_eq!(reconciled.view().final_grade, "GS-07");
        assert!(!reconciled.report.in_target_band);
    }

    #[test]
    fn test_open_top_band_target() {
        let start = evaluation(RatingSystem::Fes, &[8, 4, 4, 5, 4, 3, 3, 1, 1]);
        let reconciled = reconcile(start, band(RatingSystem::Fes, "GS-15"));
        assert_invariants(&reconciled);
        assert_eq!(reconciled.view().final_grade, "GS-15");
        assert_eq!(reconciled.view().grade_range, "4055+");
    }

    #[test]
    fn test_missing_factor_is_skipped() {
        let system = RatingSystem::Fes;
        // Only factors 2..9 present; factor 1 would be probed first.
        let assignments = system.factors()[1..]
            .iter()
            .map(|f| FactorAssignment::new(system, Level::new(system, *f, 1).unwrap(), String::new()))
            .collect();
        let start = Evaluation::new(system, assignments);

        let reconciled = reconcile(start, band(system, "GS-05"));

        assert_invariants(&reconciled);
        assert!(reconciled
            .report
            .moves
            .iter()
            .all(|m| m.factor != FactorId::F1));
    }

    #[test]
    fn test_gssg_reaches_target_band() {
        // GS-09 profile (1985) aimed at GS-13.
        let start = evaluation(RatingSystem::Gssg, &[2, 1, 1, 2, 2, 5, 1]);
        let reconciled = reconcile(start, band(RatingSystem::Gssg, "GS-13"));
        assert_invariants(&reconciled);
        assert_eq!(reconciled.view().final_grade, "GS-13");
        assert_eq!(reconciled.report.moves[0].factor, FactorId::F1);
    }

    #[test]
    fn test_invariants_hold_for_every_profile_and_target() {
        let fes_starts: [[u8; 9]; 4] = [
            [1, 1, 1, 1, 1, 1, 1, 1, 1],
            [4, 2, 2, 2, 2, 2, 2, 1, 1],
            [7, 4, 3, 4, 3, 3, 2, 1, 1],
            [9, 5, 5, 6, 6, 4, 4, 3, 3],
        ];
        let gssg_starts: [[u8; 7]; 4] = [
            [1, 1, 1, 1, 1, 1, 1],
            [2, 2, 2, 2, 2, 4, 2],
            [3, 3, 3, 3, 3, 3, 3],
            [5, 3, 4, 4, 4, 8, 6],
        ];

        for system in [RatingSystem::Fes, RatingSystem::Gssg] {
            let starts: Vec<Vec<u8>> = match system {
                RatingSystem::Fes => fes_starts.iter().map(|s| s.to_vec()).collect(),
                RatingSystem::Gssg => gssg_starts.iter().map(|s| s.to_vec()).collect(),
            };
            for target in GradeBandTable::for_system(system).bands() {
                for start in &starts {
                    let reconciled = reconcile(evaluation(system, start), target);
                    assert_invariants(&reconciled);
                    assert!(reconciled.report.iterations <= system.profile().max_iterations);
                }
            }
        }
    }

    #[test]
    fn test_accepts_rejects_overshoot() {
        let goal = Target {
            min: 1355,
            max: Some(1600),
            mid: 1477,
        };
        // Wrong direction.
        assert!(!accepts(&goal, 1200, -50));
        // Lands past the band and further from the midpoint.
        assert!(!accepts(&goal, 1200, 600));
        // Closer to the midpoint.
        assert!(accepts(&goal, 1200, 200));
        // Zero-point step.
        assert!(!accepts(&goal, 1200, 0));
        // Entering the band may overshoot the midpoint.
        assert!(accepts(&goal, 1354, 246));
        // Once inside, a move may not drift away from the midpoint.
        assert!(!accepts(&goal, 1450, 100));
    }
}
