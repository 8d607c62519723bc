//! Grade bands under the two-grade-interval convention.
//!
//! Only GS-05, 07, 09, 11, 12, 13, 14, and 15 are reachable through point
//! bands. Any total outside every band (the skipped GS-06/08/10 ranges, the
//! slivers between contiguous bands, anything below GS-05) is forbidden and
//! resolves to the nearest higher band.

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::classification::factors::RatingSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    pub grade: &'static str,
    pub min_points: u32,
    /// `None` for the open-ended top band.
    pub max_points: Option<u32>,
}

impl GradeBand {
    const fn closed(grade: &'static str, min_points: u32, max_points: u32) -> Self {
        GradeBand {
            grade,
            min_points,
            max_points: Some(max_points),
        }
    }

    const fn open(grade: &'static str, min_points: u32) -> Self {
        GradeBand {
            grade,
            min_points,
            max_points: None,
        }
    }

    pub fn contains(&self, total: u32) -> bool {
        total >= self.min_points && self.max_points.map_or(true, |max| total <= max)
    }

    /// Display range, e.g. `"1355-1600"` or `"4055+"`.
    pub fn range_label(&self) -> String {
        match self.max_points {
            Some(max) => format!("{}-{}", self.min_points, max),
            None => format!("{}+", self.min_points),
        }
    }

    /// Numeric part of the grade name (`"GS-07"` → 7).
    pub fn grade_number(&self) -> u8 {
        self.grade
            .trim_start_matches("GS-")
            .parse()
            .unwrap_or_default()
    }
}

/// Result of placing a point total on the band table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandLookup {
    Band(&'static GradeBand),
    /// The total sits in no band; `resolve_to` is the nearest higher band.
    Forbidden { resolve_to: &'static GradeBand },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
    #[error("'{0}' is not a General Schedule grade")]
    Unparseable(String),

    #[error("GS-{0:02} is outside the General Schedule (GS-01 to GS-15)")]
    OutOfSchedule(u8),
}

static FES_BANDS: [GradeBand; 8] = [
    GradeBand::closed("GS-05", 855, 1100),
    GradeBand::closed("GS-07", 1355, 1600),
    GradeBand::closed("GS-09", 1855, 2100),
    GradeBand::closed("GS-11", 2355, 2750),
    GradeBand::closed("GS-12", 2755, 3150),
    GradeBand::closed("GS-13", 3155, 3600),
    GradeBand::closed("GS-14", 3605, 4050),
    GradeBand::open("GS-15", 4055),
];

// Same names and boundaries as FES, kept as an independent table so the two
// systems can diverge without touching each other.
static GSSG_BANDS: [GradeBand; 8] = [
    GradeBand::closed("GS-05", 855, 1100),
    GradeBand::closed("GS-07", 1355, 1600),
    GradeBand::closed("GS-09", 1855, 2100),
    GradeBand::closed("GS-11", 2355, 2750),
    GradeBand::closed("GS-12", 2755, 3150),
    GradeBand::closed("GS-13", 3155, 3600),
    GradeBand::closed("GS-14", 3605, 4050),
    GradeBand::open("GS-15", 4055),
];

/// Read-only band table for one rating system.
#[derive(Debug, Clone, Copy)]
pub struct GradeBandTable {
    bands: &'static [GradeBand],
}

impl GradeBandTable {
    pub fn for_system(system: RatingSystem) -> Self {
        let bands: &'static [GradeBand] = match system {
            RatingSystem::Fes => &FES_BANDS,
            RatingSystem::Gssg => &GSSG_BANDS,
        };
        GradeBandTable { bands }
    }

    pub fn bands(&self) -> &'static [GradeBand] {
        self.bands
    }

    pub fn band_for_points(&self, total: u32) -> BandLookup {
        if let Some(band) = self.bands.iter().find(|b| b.contains(total)) {
            return BandLookup::Band(band);
        }

        // The top band is open, so some band always lies above a forbidden total.
        let resolve_to = self
            .bands
            .iter()
            .find(|b| b.min_points > total)
            .unwrap_or(&self.bands[self.bands.len() - 1]);
        BandLookup::Forbidden { resolve_to }
    }

    /// Exact lookup by canonical or loose grade name (`"GS-13"`, `"gs 13"`, `"13"`).
    pub fn band_for_grade(&self, grade: &str) -> Option<&'static GradeBand> {
        let number = parse_grade_number(grade).ok()?;
        self.bands.iter().find(|b| b.grade_number() == number)
    }

    /// Resolves a requested target grade. A skipped grade (GS-06, GS-08,
    /// GS-10, or below GS-05) moves up to the next band grade with a warning.
    pub fn resolve_target(&self, grade: &str) -> Result<&'static GradeBand, GradeError> {
        let number = parse_grade_number(grade)?;
        if !(1..=15).contains(&number) {
            return Err(GradeError::OutOfSchedule(number));
        }

        let band = self
            .bands
            .iter()
            .find(|b| b.grade_number() >= number)
            .unwrap_or(&self.bands[self.bands.len() - 1]);

        if band.grade_number() != number {
            warn!(
                "GS-{:02} has no point band; targeting {} instead",
                number, band.grade
            );
        }
        Ok(band)
    }
}

fn parse_grade_number(grade: &str) -> Result<u8, GradeError> {
    let digits: String = grade
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '-' || c.is_whitespace())
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits
        .parse::<u8>()
        .map_err(|_| GradeError::Unparseable(grade.to_string()))
}
