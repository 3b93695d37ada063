//! Rotation-to-answer decoding
//!
//! A participant picks an answer by rotating their marker. The rotation is
//! read from the first edge of the marker (corner 0 to corner 1) and snapped
//! to one of four quarter turns, each standing for one answer symbol.
//!
//! The snapping rule is `index = round(θ / 90 + 2) mod 4` with θ in degrees.
//! `f64::round` rounds half away from zero; since `atan2` yields θ in
//! `[-180, 180]`, `θ / 90 + 2` is never negative, so ties always round up.
//! Exactly on a 45° boundary the marker therefore snaps to the next quarter
//! turn counter-clockwise in frame coordinates (45° is `D`, -45° is `C`).

use std::{fmt::Display, str::FromStr};

use enum_map::Enum;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

use crate::marker::Marker;

/// One of the four answer symbols a marker rotation can express
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, SerializeDisplay,
    DeserializeFromStr,
)]
pub enum Symbol {
    /// First answer option
    A,
    /// Second answer option
    B,
    /// Third answer option
    C,
    /// Fourth answer option
    D,
}

/// Symbols indexed by snapped quarter turn
const SYMBOLS: [Symbol; 4] = [Symbol::A, Symbol::B, Symbol::C, Symbol::D];

impl Symbol {
    /// Returns the symbol as its single-letter label
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a symbol label fails
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown answer symbol {0:?}")]
pub struct ParseSymbolError(String);

impl FromStr for Symbol {
    type Err = ParseSymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(ParseSymbolError(other.to_owned())),
        }
    }
}

/// Errors that can occur when decoding a marker's rotation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The marker geometry does not define a direction (coincident corners,
    /// zero-length edge or non-finite coordinates)
    #[error("marker geometry is degenerate")]
    Ambiguous,
}

/// Returns the planar rotation of a marker in degrees, in `[-180, 180]`
///
/// # Errors
///
/// Returns [`Error::Ambiguous`] if the first edge has no direction.
pub fn angle(marker: &Marker) -> Result<f64, Error> {
    if !marker.has_finite_corners() {
        return Err(Error::Ambiguous);
    }

    let [first, second, ..] = marker.corners;
    let dx = second.x - first.x;
    let dy = second.y - first.y;

    if dx == 0. && dy == 0. {
        return Err(Error::Ambiguous);
    }

    Ok(dy.atan2(dx).to_degrees())
}

/// Returns the quarter-turn index (0..=3) for a rotation in degrees
///
/// Total for every finite angle; the result is taken modulo 4 with Euclidean
/// remainder so angles outside `[-180, 180]` wrap like their equivalents.
pub fn quarter_index(degrees: f64) -> usize {
    ((degrees / 90. + 2.).round() as i64).rem_euclid(4) as usize
}

/// Snaps a rotation in degrees to its answer symbol
pub fn symbol_for_angle(degrees: f64) -> Symbol {
    SYMBOLS[quarter_index(degrees)]
}

/// Decodes the answer symbol expressed by a marker's rotation
///
/// # Errors
///
/// Returns [`Error::Ambiguous`] for degenerate geometry; the caller treats
/// it as a failed decode for that marker only.
pub fn decode(marker: &Marker) -> Result<Symbol, Error> {
    angle(marker).map(symbol_for_angle)
}
