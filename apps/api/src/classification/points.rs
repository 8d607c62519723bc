//! Point tables for the FES primary standard and the GSSG.
//!
//! Each row lists the points for levels 1..=max, so a row's length is the
//! factor's ceiling. GSSG 4A and 4B have their own rows; there is no plain
//! GSSG factor 4 and no fallback between systems.

use tracing::warn;

use crate::classification::factors::{FactorId, RatingSystem};
use crate::classification::level::{parse_raw, Level};

const FES_ROWS: &[(FactorId, &[u32])] = &[
    (FactorId::F1, &[50, 200, 350, 550, 750, 950, 1250, 1550, 1850]),
    (FactorId::F2, &[25, 125, 275, 450, 650]),
    (FactorId::F3, &[25, 125, 275, 450, 650]),
    (FactorId::F4, &[25, 75, 150, 225, 325, 450]),
    (FactorId::F5, &[25, 75, 150, 225, 325, 450]),
    (FactorId::F6, &[10, 25, 60, 110]),
    (FactorId::F7, &[20, 50, 120, 220]),
    (FactorId::F8, &[5, 20, 50]),
    (FactorId::F9, &[5, 20, 50]),
];

const GSSG_ROWS: &[(FactorId, &[u32])] = &[
    (FactorId::F1, &[175, 350, 550, 775, 900]),
    (FactorId::F2, &[100, 250, 350]),
    (FactorId::F3, &[450, 775, 900, 1025]),
    (FactorId::F4A, &[25, 50, 75, 100]),
    (FactorId::F4B, &[30, 75, 100, 125]),
    (FactorId::F5, &[75, 205, 340, 505, 650, 800, 930, 1030]),
    (FactorId::F6, &[310, 575, 975, 1120, 1225, 1325]),
];

pub(crate) fn row(system: RatingSystem, factor: FactorId) -> Option<&'static [u32]> {
    let rows = match system {
        RatingSystem::Fes => FES_ROWS,
        RatingSystem::Gssg => GSSG_ROWS,
    };
    rows.iter().find(|(id, _)| *id == factor).map(|(_, row)| *row)
}

/// Points for a level number. Returns 0 and logs when the combination is not
/// in the active system's table.
pub fn points_at(system: RatingSystem, factor: FactorId, number: u8) -> u32 {
    let cell = row(system, factor).and_then(|row| {
        (number as usize)
            .checked_sub(1)
            .and_then(|index| row.get(index))
    });

    match cell {
        Some(points) => *points,
        None => {
            warn!(
                "Point table miss: {} factor {} level {}, scoring 0",
                system, factor, number
            );
            0
        }
    }
}

/// Points for a validated level.
pub fn points_for(system: RatingSystem, level: &Level) -> u32 {
    points_at(system, level.factor(), level.number())
}

/// String-boundary lookup, e.g. `lookup(Fes, "1", "1-7") == 1250`.
///
/// Never fails: unknown factors, malformed levels, and out-of-range numbers
/// all score 0 with a diagnostic.
pub fn lookup(system: RatingSystem, factor_id: &str, level: &str) -> u32 {
    let factor = match factor_id.parse::<FactorId>() {
        Ok(factor) => factor,
        Err(e) => {
            warn!("Point table miss: {e} ({system})");
            return 0;
        }
    };

    match parse_raw(level) {
        Ok(raw) => points_at(system, factor, raw.number),
        Err(e) => {
            warn!("Point table miss: {e} for {system} factor {factor}");
            0
        }
    }
}
