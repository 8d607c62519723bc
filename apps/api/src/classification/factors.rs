//! Factor catalogue: rating systems, factor ids, locked titles, and the
//! per-system search profile used by the reconciler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classification::level::Direction;
use crate::classification::points;

/// The two OPM point-rating methods. One evaluation never mixes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RatingSystem {
    /// Factor Evaluation System: 9 factors, non-supervisory positions.
    #[default]
    Fes,
    /// General Schedule Supervisory Guide: 6 factors with factor 4 split into 4A/4B.
    Gssg,
}

/// One evaluable factor id. FES uses 1..9; GSSG uses 1, 2, 3, 4A, 4B, 5, 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FactorId {
    #[serde(rename = "1")]
    F1,
    #[serde(rename = "2")]
    F2,
    #[serde(rename = "3")]
    F3,
    #[serde(rename = "4")]
    F4,
    #[serde(rename = "4A")]
    F4A,
    #[serde(rename = "4B")]
    F4B,
    #[serde(rename = "5")]
    F5,
    #[serde(rename = "6")]
    F6,
    #[serde(rename = "7")]
    F7,
    #[serde(rename = "8")]
    F8,
    #[serde(rename = "9")]
    F9,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown factor id '{0}'")]
pub struct UnknownFactor(pub String);

impl FactorId {
    pub fn as_str(self) -> &'static str {
        match self {
            FactorId::F1 => "1",
            FactorId::F2 => "2",
            FactorId::F3 => "3",
            FactorId::F4 => "4",
            FactorId::F4A => "4A",
            FactorId::F4B => "4B",
            FactorId::F5 => "5",
            FactorId::F6 => "6",
            FactorId::F7 => "7",
            FactorId::F8 => "8",
            FactorId::F9 => "9",
        }
    }

    /// Display key used in the output contract, e.g. `"Factor 4A"`.
    pub fn display_key(self) -> String {
        format!("Factor {}", self.as_str())
    }
}

impl fmt::Display for FactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `"1"`, `"4a"`, `"Factor 4A"`, `"factor 7"`.
impl FromStr for FactorId {
    type Err = UnknownFactor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let bare = lower
            .strip_prefix("factor")
            .map(str::trim)
            .unwrap_or(lower.as_str());

        match bare {
            "1" => Ok(FactorId::F1),
            "2" => Ok(FactorId::F2),
            "3" => Ok(FactorId::F3),
            "4" => Ok(FactorId::F4),
            "4a" => Ok(FactorId::F4A),
            "4b" => Ok(FactorId::F4B),
            "5" => Ok(FactorId::F5),
            "6" => Ok(FactorId::F6),
            "7" => Ok(FactorId::F7),
            "8" => Ok(FactorId::F8),
            "9" => Ok(FactorId::F9),
            _ => Err(UnknownFactor(trimmed.to_string())),
        }
    }
}

/// Search parameters for the reconciler. The priority list is the increase
/// order; the decrease order is always its reverse.
#[derive(Debug, Clone, Copy)]
pub struct SystemProfile {
    pub priority: &'static [FactorId],
    /// Early-stop distance from the band midpoint.
    pub tolerance: i64,
    pub max_iterations: u32,
}

impl SystemProfile {
    pub fn order(&self, direction: Direction) -> Vec<FactorId> {
        match direction {
            Direction::Up => self.priority.to_vec(),
            Direction::Down => self.priority.iter().rev().copied().collect(),
        }
    }
}

const FES_FACTORS: &[FactorId] = &[
    FactorId::F1,
    FactorId::F2,
    FactorId::F3,
    FactorId::F4,
    FactorId::F5,
    FactorId::F6,
    FactorId::F7,
    FactorId::F8,
    FactorId::F9,
];

const GSSG_FACTORS: &[FactorId] = &[
    FactorId::F1,
    FactorId::F2,
    FactorId::F3,
    FactorId::F4A,
    FactorId::F4B,
    FactorId::F5,
    FactorId::F6,
];

// Largest point swings first, physical demands/environment last.
const FES_PROFILE: SystemProfile = SystemProfile {
    priority: &[
        FactorId::F1,
        FactorId::F5,
        FactorId::F2,
        FactorId::F4,
        FactorId::F3,
        FactorId::F6,
        FactorId::F7,
        FactorId::F8,
        FactorId::F9,
    ],
    tolerance: 40,
    max_iterations: 50,
};

const GSSG_PROFILE: SystemProfile = SystemProfile {
    priority: &[
        FactorId::F1,
        FactorId::F5,
        FactorId::F3,
        FactorId::F2,
        FactorId::F4A,
        FactorId::F4B,
        FactorId::F6,
    ],
    tolerance: 25,
    max_iterations: 100,
};

impl RatingSystem {
    pub fn as_str(self) -> &'static str {
        match self {
            RatingSystem::Fes => "FES",
            RatingSystem::Gssg => "GSSG",
        }
    }

    /// Required factors in display order.
    pub fn factors(self) -> &'static [FactorId] {
        match self {
            RatingSystem::Fes => FES_FACTORS,
            RatingSystem::Gssg => GSSG_FACTORS,
        }
    }

    pub fn has_factor(self, factor: FactorId) -> bool {
        self.factors().contains(&factor)
    }

    pub fn profile(self) -> SystemProfile {
        match self {
            RatingSystem::Fes => FES_PROFILE,
            RatingSystem::Gssg => GSSG_PROFILE,
        }
    }

    /// Highest level of `factor`, or `None` when the factor is not part of this system.
    pub fn max_level(self, factor: FactorId) -> Option<u8> {
        points::row(self, factor).map(|row| row.len() as u8)
    }

    /// Locked display title. Never altered by reconciliation.
    pub fn title(self, factor: FactorId) -> Option<&'static str> {
        let title = match (self, factor) {
            (RatingSystem::Fes, FactorId::F1) => "Knowledge Required by the Position",
            (RatingSystem::Fes, FactorId::F2) => "Supervisory Controls",
            (RatingSystem::Fes, FactorId::F3) => "Guidelines",
            (RatingSystem::Fes, FactorId::F4) => "Complexity",
            (RatingSystem::Fes, FactorId::F5) => "Scope and Effect",
            (RatingSystem::Fes, FactorId::F6) => "Personal Contacts",
            (RatingSystem::Fes, FactorId::F7) => "Purpose of Contacts",
            (RatingSystem::Fes, FactorId::F8) => "Physical Demands",
            (RatingSystem::Fes, FactorId::F9) => "Work Environment",
            (RatingSystem::Gssg, FactorId::F1) => "Program Scope and Effect",
            (RatingSystem::Gssg, FactorId::F2) => "Organizational Setting",
            (RatingSystem::Gssg, FactorId::F3) => {
                "Supervisory and Managerial Authority Exercised"
            }
            (RatingSystem::Gssg, FactorId::F4A) => "Personal Contacts: Nature of Contacts",
            (RatingSystem::Gssg, FactorId::F4B) => "Personal Contacts: Purpose of Contacts",
            (RatingSystem::Gssg, FactorId::F5) => "Difficulty of Typical Work Directed",
            (RatingSystem::Gssg, FactorId::F6) => "Other Conditions",
            _ => return None,
        };
        Some(title)
    }
}

impl fmt::Display for RatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
