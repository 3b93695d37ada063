//! Presenter options
//!
//! Options are fixed when the presenter view is mounted: which marker
//! identities own the four slots, how long each question's countdown runs,
//! and how the camera is requested.

use std::time::Duration;

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    camera::FacingMode,
    constants::{countdown, slots::SLOT_COUNT},
    marker::MarkerId,
    registry::{self, SlotRegistry},
};

type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds
fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    val: &Duration,
    _ctx: &(),
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Validates that no marker owns two slots
fn validate_distinct(markers: &[MarkerId; SLOT_COUNT], _ctx: &()) -> ValidationResult {
    match markers.iter().duplicates().next() {
        Some(duplicate) => Err(garde::Error::new(format!(
            "marker {duplicate} is assigned to more than one slot"
        ))),
        None => Ok(()),
    }
}

/// Options for one presenter view
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Options {
    /// Marker identity owning each slot, in slot order
    #[garde(custom(validate_distinct))]
    slot_markers: [MarkerId; SLOT_COUNT],
    /// Per-question countdown before the answer is revealed
    #[garde(custom(validate_duration::<{ countdown::MIN_SECONDS }, { countdown::MAX_SECONDS }>))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    countdown: Duration,
    /// Preferred camera direction
    #[garde(skip)]
    facing: FacingMode,
    /// Whether scanning starts together with the presentation
    #[garde(skip)]
    camera_on_start: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            slot_markers: crate::constants::slots::DEFAULT_MARKERS.map(MarkerId::new),
            countdown: Duration::from_secs(countdown::DEFAULT_SECONDS),
            facing: FacingMode::default(),
            camera_on_start: true,
        }
    }
}

/// Errors that can occur when loading options
#[derive(Error, Debug)]
pub enum Error {
    /// The options are not well-formed JSON
    #[error("options could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    /// The options parsed but break a constraint
    #[error("options are invalid: {0}")]
    Invalid(#[from] garde::Report),
}

impl Options {
    /// Parses and validates options from JSON; missing fields keep their
    /// defaults
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed JSON and [`Error::Invalid`]
    /// if a constraint is broken.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Sets the marker identities owning the slots
    #[must_use]
    pub fn with_slot_markers(mut self, markers: [MarkerId; SLOT_COUNT]) -> Self {
        self.slot_markers = markers;
        self
    }

    /// Sets the per-question countdown
    #[must_use]
    pub fn with_countdown(mut self, countdown: Duration) -> Self {
        self.countdown = countdown;
        self
    }

    /// Sets whether scanning starts together with the presentation
    #[must_use]
    pub fn with_camera_on_start(mut self, camera_on_start: bool) -> Self {
        self.camera_on_start = camera_on_start;
        self
    }

    /// Builds the slot registry from the configured markers
    ///
    /// # Errors
    ///
    /// Returns [`registry::Error::Duplicate`] if a marker owns two slots.
    pub fn registry(&self) -> Result<SlotRegistry, registry::Error> {
        SlotRegistry::new(self.slot_markers)
    }

    /// Returns the per-question countdown
    pub fn countdown(&self) -> Duration {
        self.countdown
    }

    /// Returns the preferred camera direction
    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Returns whether scanning starts together with the presentation
    pub fn camera_on_start(&self) -> bool {
        self.camera_on_start
    }
}
