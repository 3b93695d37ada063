//! Fiducial marker detections
//!
//! The image processing that finds markers in a frame lives outside this
//! crate. What comes back from it is a list of [`Marker`]s: the decoded
//! identity of the printed tag and its four corners, ordered consistently
//! (clockwise, starting from the tag's top-left corner) by the detector.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Identity decoded from a marker's binary pattern
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    derive_more::From,
)]
#[serde(transparent)]
pub struct MarkerId(u32);

impl MarkerId {
    /// Creates a marker identity from the detector's numeric id
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the detector's numeric id
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point in frame (pixel) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate, growing to the right
    pub x: f64,
    /// Vertical coordinate, growing downwards
    pub y: f64,
}

impl Point {
    /// Creates a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A single marker found by the detector in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// The decoded identity of the tag
    pub id: MarkerId,
    /// The four corners of the tag, in detector order
    pub corners: [Point; 4],
}

impl Marker {
    /// Creates a marker from its identity and corners
    pub fn new(id: impl Into<MarkerId>, corners: [Point; 4]) -> Self {
        Self {
            id: id.into(),
            corners,
        }
    }

    /// Returns `true` when every corner coordinate is a finite number
    pub fn has_finite_corners(&self) -> bool {
        self.corners.iter().all(|p| p.is_finite())
    }
}
