//! Factor levels and the level navigator.
//!
//! A level is carried as a typed `{factor, number, notation}` value. Strings
//! like `"1-7"`, `"4A-2"`, or `"7-D"` only exist at the request/response
//! boundary: `validate` turns one into a `Level` once, repairing a wrong
//! prefix or an out-of-range number, and `Display` turns it back.

use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::classification::factors::{FactorId, RatingSystem};

/// How the level number was written. Letter notation (`A` = 1) survives
/// navigation so `"7-B"` steps to `"7-C"`, not `"7-3"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Notation {
    #[default]
    Numeric,
    Letter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level '{0}' has no '-' separator")]
    MissingHyphen(String),

    #[error("level '{0}' has no readable level number")]
    BadNumber(String),

    #[error("factor {factor} is not part of {system}")]
    ForeignFactor {
        system: RatingSystem,
        factor: FactorId,
    },
}

/// A repair applied while validating a boundary string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelRepair {
    PrefixCorrected { from: String },
    Clamped { from: u8 },
}

/// Syntactic parse of a level string, before any factor/range checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLevel {
    pub prefix: String,
    pub number: u8,
    pub notation: Notation,
}

/// A level that is in range for its factor under one rating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    factor: FactorId,
    number: u8,
    notation: Notation,
}

impl Level {
    /// Range-checked constructor. `None` when `number` is outside `1..=max`.
    pub fn new(system: RatingSystem, factor: FactorId, number: u8) -> Option<Self> {
        let max = system.max_level(factor)?;
        (1..=max).contains(&number).then_some(Level {
            factor,
            number,
            notation: Notation::Numeric,
        })
    }

    pub fn factor(&self) -> FactorId {
        self.factor
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// Next rung up, or `None` at the factor's ceiling.
    pub fn next_higher(&self, system: RatingSystem) -> Option<Level> {
        let max = system.max_level(self.factor)?;
        (self.number < max).then(|| Level {
            number: self.number + 1,
            ..*self
        })
    }

    /// Next rung down, or `None` at level 1.
    pub fn next_lower(&self) -> Option<Level> {
        (self.number > 1).then(|| Level {
            number: self.number - 1,
            ..*self
        })
    }

    pub fn step(&self, system: RatingSystem, direction: Direction) -> Option<Level> {
        match direction {
            Direction::Up => self.next_higher(system),
            Direction::Down => self.next_lower(),
        }
    }

    /// Moves up to `rungs` steps, stopping at the boundary.
    pub fn shifted(&self, system: RatingSystem, direction: Direction, rungs: u8) -> Level {
        let mut level = *self;
        for _ in 0..rungs {
            match level.step(system, direction) {
                Some(next) => level = next,
                None => break,
            }
        }
        level
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.notation {
            Notation::Letter if self.number <= 26 => {
                let letter = (b'A' + self.number - 1) as char;
                write!(f, "{}-{}", self.factor, letter)
            }
            _ => write!(f, "{}-{}", self.factor, self.number),
        }
    }
}

/// Splits `"1-7"`, `"Level 4A-2"`, or `"7-d"` into prefix and number.
pub fn parse_raw(input: &str) -> Result<RawLevel, LevelError> {
    let trimmed = input.trim();
    let body = match trimmed.get(..5) {
        Some(head) if head.eq_ignore_ascii_case("level") => trimmed[5..].trim_start(),
        _ => trimmed,
    };

    let (prefix, suffix) = body
        .split_once('-')
        .ok_or_else(|| LevelError::MissingHyphen(input.to_string()))?;
    let suffix = suffix.trim();

    let (number, notation) = if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit())
    {
        let number = suffix
            .parse::<u8>()
            .map_err(|_| LevelError::BadNumber(input.to_string()))?;
        (number, Notation::Numeric)
    } else {
        let mut chars = suffix.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                let number = c.to_ascii_uppercase() as u8 - b'A' + 1;
                (number, Notation::Letter)
            }
            _ => return Err(LevelError::BadNumber(input.to_string())),
        }
    };

    Ok(RawLevel {
        prefix: prefix.trim().to_string(),
        number,
        notation,
    })
}

/// Boundary validation: parses `input` as a level of `factor`, correcting a
/// mismatched prefix and clamping an out-of-range number. Every repair is
/// logged and returned.
pub fn validate(
    system: RatingSystem,
    factor: FactorId,
    input: &str,
) -> Result<(Level, Vec<LevelRepair>), LevelError> {
    let max = system
        .max_level(factor)
        .ok_or(LevelError::ForeignFactor { system, factor })?;
    let raw = parse_raw(input)?;
    let mut repairs = Vec::new();

    if !raw.prefix.eq_ignore_ascii_case(factor.as_str()) {
        warn!(
            "Level '{}' filed under factor {}: prefix corrected to '{}'",
            input, factor, factor
        );
        repairs.push(LevelRepair::PrefixCorrected {
            from: raw.prefix.clone(),
        });
    }

    let number = raw.number.clamp(1, max);
    if number != raw.number {
        warn!(
            "Level '{}' outside 1..={} for {} factor {}: clamped to {}",
            input, max, system, factor, number
        );
        repairs.push(LevelRepair::Clamped { from: raw.number });
    }

    let level = Level {
        factor,
        number,
        notation: raw.notation,
    };
    Ok((level, repairs))
}

/// String-boundary navigator: `next_higher(Fes, "7", "7-B") == Some("7-C")`.
pub fn next_higher(system: RatingSystem, factor_id: &str, level: &str) -> Option<String> {
    navigate(system, factor_id, level, Direction::Up)
}

/// String-boundary navigator: `next_lower(Fes, "1", "1-1") == None`.
pub fn next_lower(system: RatingSystem, factor_id: &str, level: &str) -> Option<String> {
    navigate(system, factor_id, level, Direction::Down)
}

fn navigate(
    system: RatingSystem,
    factor_id: &str,
    level: &str,
    direction: Direction,
) -> Option<String> {
    let factor = match factor_id.parse::<FactorId>() {
        Ok(factor) => factor,
        Err(e) => {
            warn!("Cannot navigate: {e}");
            return None;
        }
    };

    match validate(system, factor, level) {
        Ok((current, _)) => current.step(system, direction).map(|l| l.to_string()),
        Err(e) => {
            warn!("Cannot navigate from '{level}': {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_raw_numeric() {
        let raw = parse_raw("1-7").unwrap();
        assert_eq!(raw.prefix, "1");
        assert_eq!(raw.number, 7);
        assert_eq!(raw.notation, Notation::Numeric);
    }

    #[test]
    fn test_parse_raw_split_factor_and_level_word() {
        let raw = parse_raw("Level 4A-2").unwrap();
        assert_eq!(raw.prefix, "4A");
        assert_eq!(raw.number, 2);
    }

    #[test]
    fn test_parse_raw_letter_suffix() {
        let raw = parse_raw("7-d").unwrap();
        assert_eq!(raw.number, 4);
        assert_eq!(raw.notation, Notation::Letter);
    }

    #[test]
    fn test_parse_raw_missing_hyphen() {
        assert_eq!(
            parse_raw("7"),
            Err(LevelError::MissingHyphen("7".to_string()))
        );
    }

    #[test]
    fn test_parse_raw_bad_number() {
        assert!(matches!(parse_raw("1-x7"), Err(LevelError::BadNumber(_))));
        assert!(matches!(parse_raw("1-"), Err(LevelError::BadNumber(_))));
        assert!(matches!(parse_raw("1-900"), Err(LevelError::BadNumber(_))));
    }

    #[test]
    fn test_next_higher_preserves_letter_notation() {
        assert_eq!(
            next_higher(RatingSystem::Fes, "7", "7-B").as_deref(),
            Some("7-C")
        );
        assert_eq!(
            next_lower(RatingSystem::Fes, "7", "7-B").as_deref(),
            Some("7-A")
        );
    }

    #[test]
    fn test_next_higher_numeric() {
        assert_eq!(
            next_higher(RatingSystem::Fes, "1", "1-7").as_deref(),
            Some("1-8")
        );
        assert_eq!(
            next_higher(RatingSystem::Gssg, "4A", "4A-2").as_deref(),
            Some("4A-3")
        );
    }

    #[test]
    fn test_navigator_boundaries() {
        for system in [RatingSystem::Fes, RatingSystem::Gssg] {
            for factor in system.factors() {
                let max = system.max_level(*factor).unwrap();
                let top = format!("{factor}-{max}");
                let bottom = format!("{factor}-1");
                assert_eq!(next_higher(system, factor.as_str(), &top), None);
                assert_eq!(next_lower(system, factor.as_str(), &bottom), None);
            }
        }
    }

    #[test]
    fn test_navigator_repairs_prefix() {
        // "3-2" filed under factor 2 is treated as "2-2".
        assert_eq!(
            next_higher(RatingSystem::Fes, "2", "3-2").as_deref(),
            Some("2-3")
        );
    }

    #[test]
    fn test_validate_reports_prefix_repair() {
        let (level, repairs) = validate(RatingSystem::Fes, FactorId::F2, "3-4").unwrap();
        assert_eq!(level.to_string(), "2-4");
        assert_eq!(
            repairs,
            vec![LevelRepair::PrefixCorrected {
                from: "3".to_string()
            }]
        );
    }

    #[test]
    fn test_validate_clamps_out_of_range() {
        let (level, repairs) = validate(RatingSystem::Fes, FactorId::F1, "1-99").unwrap();
        assert_eq!(level.number(), 9);
        assert_eq!(repairs, vec![LevelRepair::Clamped { from: 99 }]);

        let (level, _) = validate(RatingSystem::Fes, FactorId::F1, "1-0").unwrap();
        assert_eq!(level.number(), 1);
    }

    #[test]
    fn test_validate_rejects_foreign_factor() {
        assert_eq!(
            validate(RatingSystem::Gssg, FactorId::F7, "7-1").unwrap_err(),
            LevelError::ForeignFactor {
                system: RatingSystem::Gssg,
                factor: FactorId::F7,
            }
        );
    }

    #[test]
    fn test_level_new_is_range_checked() {
        assert!(Level::new(RatingSystem::Gssg, FactorId::F2, 3).is_some());
        assert!(Level::new(RatingSystem::Gssg, FactorId::F2, 4).is_none());
        assert!(Level::new(RatingSystem::Fes, FactorId::F8, 0).is_none());
    }

    #[test]
    fn test_shifted_stops_at_boundary() {
        let level = Level::new(RatingSystem::Gssg, FactorId::F2, 2).unwrap();
        let up = level.shifted(RatingSystem::Gssg, Direction::Up, 5);
        assert_eq!(up.number(), 3);
        let down = level.shifted(RatingSystem::Gssg, Direction::Down, 5);
        assert_eq!(down.number(), 1);
    }
}
