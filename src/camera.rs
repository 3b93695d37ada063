//! Camera and detector boundaries
//!
//! The crate never talks to a camera or runs image processing itself. The
//! host supplies a [`Camera`] able to open an exclusive [`VideoStream`], and
//! a [`MarkerDetector`] that turns the stream's frames into [`Marker`]s.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::marker::Marker;

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera, pointed at the room
    #[default]
    Environment,
    /// Front camera, pointed at the operator
    User,
}

/// Reasons a camera stream could not be acquired
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// The operator (or the platform) refused camera access
    #[error("camera permission was denied")]
    PermissionDenied,
    /// There is no camera to open
    #[error("no camera device is available")]
    NoDevice,
}

/// Source of exclusive video streams
pub trait Camera {
    /// The stream type produced by this camera
    type Stream: VideoStream;

    /// Requests an exclusive stream, preferring cameras facing `facing`
    ///
    /// Acquisition may wait on the operator granting permission; the host
    /// resolves that wait before returning.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if permission is denied or no device exists.
    fn request_stream(&mut self, facing: FacingMode) -> Result<Self::Stream, Error>;
}

/// A live camera stream
pub trait VideoStream {
    /// A single captured frame
    type Frame;

    /// Returns the frame currently displayed by the stream, if one is ready
    fn frame(&mut self) -> Option<Self::Frame>;

    /// Stops every underlying media track, releasing the device
    fn stop_tracks(&mut self);
}

/// A frame could not be analysed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("marker detection failed: {0}")]
pub struct DetectionError(pub String);

/// Finds markers in frames of type `F`
pub trait MarkerDetector<F> {
    /// Returns every marker visible in `frame`
    ///
    /// # Errors
    ///
    /// Returns a [`DetectionError`] if the frame could not be processed.
    fn detect(&mut self, frame: &F) -> Result<Vec<Marker>, DetectionError>;
}
