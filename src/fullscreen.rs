//! Best-effort fullscreen handling
//!
//! Presenting on a projector usually wants fullscreen, but the platform may
//! refuse (no user gesture, kiosk policy, ...). Failures are logged and
//! otherwise ignored.

use thiserror::Error;
use tracing::warn;

/// Reasons the platform refused a fullscreen change
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The platform rejected the request
    #[error("fullscreen request denied: {0}")]
    Denied(String),
}

/// Platform fullscreen primitives
pub trait FullscreenPlatform {
    /// Asks the platform to show the presenter fullscreen
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the platform refuses.
    fn request_fullscreen(&mut self) -> Result<(), Error>;

    /// Asks the platform to leave fullscreen
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the platform refuses.
    fn exit_fullscreen(&mut self) -> Result<(), Error>;
}

/// Tracks and toggles the presenter's fullscreen state
#[derive(Debug)]
pub struct Fullscreen<P> {
    platform: P,
    active: bool,
}

impl<P: FullscreenPlatform> Fullscreen<P> {
    /// Creates a controller, assuming the presenter starts windowed
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            active: false,
        }
    }

    /// Returns whether the presenter is currently fullscreen
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Mirrors a fullscreen change reported by the platform
    ///
    /// The platform can leave fullscreen on its own (e.g. the viewer pressed
    /// the system exit key), so its notifications are the source of truth.
    pub fn on_change(&mut self, active: bool) {
        self.active = active;
    }

    /// Enters fullscreen if windowed, leaves it otherwise
    pub fn toggle(&mut self) {
        if self.active {
            self.exit();
        } else {
            match self.platform.request_fullscreen() {
                Ok(()) => self.active = true,
                Err(e) => warn!("fullscreen toggle failed: {e}"),
            }
        }
    }

    /// Leaves fullscreen if active
    pub fn exit(&mut self) {
        if !self.active {
            return;
        }
        match self.platform.exit_fullscreen() {
            Ok(()) => self.active = false,
            Err(e) => warn!("leaving fullscreen failed: {e}"),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::testing::FakePlatform;

    #[test]
    fn test_toggle_enters_and_leaves() {
        let platform = FakePlatform::default();
        let mut fullscreen = Fullscreen::new(platform.clone());

        fullscreen.toggle();
        assert!(fullscreen.is_active());
        assert!(platform.is_fullscreen());

        fullscreen.toggle();
        assert!(!fullscreen.is_active());
        assert!(!platform.is_fullscreen());
    }

    #[test]
    fn test_failed_request_is_not_fatal() {
        let platform = FakePlatform::default();
        platform.fail();
        let mut fullscreen = Fullscreen::new(platform.clone());

        fullscreen.toggle();

        assert!(!fullscreen.is_active());
        assert_eq!(platform.requests(), 1);
    }

    #[test]
    fn test_exit_when_windowed_does_nothing() {
        let platform = FakePlatform::default();
        let mut fullscreen = Fullscreen::new(platform.clone());

        fullscreen.exit();

        assert_eq!(platform.exits(), 0);
    }

    #[test]
    fn test_platform_change_is_mirrored() {
        let platform = FakePlatform::default();
        let mut fullscreen = Fullscreen::new(platform.clone());
        fullscreen.toggle();

        fullscreen.on_change(false);
        assert!(!fullscreen.is_active());

        fullscreen.toggle();
        assert_eq!(platform.requests(), 2);
    }
}
