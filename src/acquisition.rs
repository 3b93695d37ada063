//! Live marker acquisition
//!
//! The [`AcquisitionController`] owns the camera stream and the detector for
//! as long as scanning is enabled, runs one detection pass per displayed
//! frame, and publishes the per-slot [`AnswerVector`] whenever a frame
//! changes it.
//!
//! Frame pacing is provided by the host: every pass ends by handing a
//! [`TickToken`] to the `schedule_frame` closure, and the host calls
//! [`AcquisitionController::tick`] with that token on its next frame. Tokens
//! carry the generation of the stream they were issued for, so a tick that
//! was already queued when [`AcquisitionController::stop`] ran finds no
//! matching stream and does nothing.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    answers::AnswerVector,
    camera::{self, Camera, FacingMode, MarkerDetector, VideoStream},
    marker::{Marker, MarkerId, Point},
    orientation::{self, Symbol},
    registry::{Slot, SlotRegistry},
};

/// Permission for one scheduled detection pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken {
    generation: u64,
}

/// Annotation for one marker of the last processed frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    /// Identity of the detected marker
    pub id: MarkerId,
    /// Corners of the marker, for drawing its outline
    pub corners: [Point; 4],
    /// Slot owned by the marker, `None` for markers outside the whitelist
    pub slot: Option<Slot>,
    /// Decoded answer, `None` if unassigned or the geometry was ambiguous
    pub symbol: Option<Symbol>,
}

/// Reset access to published answers, used by the presentation layer
pub trait AnswerSource {
    /// Clears the published answers to all empty
    fn reset(&mut self);
}

/// Resources held while scanning is enabled
struct Acquisition<S, D> {
    stream: S,
    detector: D,
}

/// Owner of the camera stream and the per-frame detection loop
pub struct AcquisitionController<C: Camera, D> {
    camera: C,
    registry: SlotRegistry,
    facing: FacingMode,
    live: Option<Acquisition<C::Stream, D>>,
    generation: u64,
    published: AnswerVector,
    publish_count: u64,
    overlays: Vec<Overlay>,
}

impl<C: Camera, D> std::fmt::Debug for AcquisitionController<C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquisitionController")
            .field("registry", &self.registry)
            .field("live", &self.live.is_some())
            .field("published", &self.published)
            .finish_non_exhaustive()
    }
}

impl<C: Camera, D> AcquisitionController<C, D> {
    /// Creates a stopped controller
    pub fn new(camera: C, registry: SlotRegistry, facing: FacingMode) -> Self {
        Self {
            camera,
            registry,
            facing,
            live: None,
            generation: 0,
            published: AnswerVector::new(),
            publish_count: 0,
            overlays: Vec::new(),
        }
    }

    /// Returns `true` while a camera stream is held
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Returns the last published answers
    pub fn answers(&self) -> AnswerVector {
        self.published
    }

    /// Returns how many times the answers were published since creation
    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    /// Returns the annotations of the last processed frame
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Returns the slot whitelist
    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    /// Clears the published answers without touching the camera
    pub fn reset(&mut self) {
        self.published = AnswerVector::new();
    }

    /// Releases the camera stream and invalidates every outstanding tick
    ///
    /// Safe to call any number of times.
    pub fn stop(&mut self) {
        if let Some(mut live) = self.live.take() {
            live.stream.stop_tracks();
            self.generation += 1;
            self.overlays.clear();
            info!("camera stream stopped");
        }
    }
}

impl<C, D> AcquisitionController<C, D>
where
    C: Camera,
    D: MarkerDetector<<C::Stream as VideoStream>::Frame>,
{
    /// Acquires the camera and schedules the first detection pass
    ///
    /// Does nothing if a stream is already held; the given detector is then
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns a [`camera::Error`] if the stream could not be acquired.
    /// Scanning stays disabled in that case.
    pub fn start<S: FnMut(TickToken)>(
        &mut self,
        detector: D,
        mut schedule_frame: S,
    ) -> Result<(), camera::Error> {
        if self.live.is_some() {
            debug!("camera stream already live");
            return Ok(());
        }

        let stream = self
            .camera
            .request_stream(self.facing)
            .inspect_err(|e| warn!("camera unavailable: {e}"))?;

        self.generation += 1;
        self.live = Some(Acquisition { stream, detector });
        info!(facing = ?self.facing, "camera stream started");

        schedule_frame(TickToken {
            generation: self.generation,
        });

        Ok(())
    }

    /// Runs one detection pass over the stream's current frame
    ///
    /// Returns the new answers if this frame changed them. Stale tokens
    /// (issued before a [`stop`](Self::stop)) are ignored and not
    /// rescheduled. A frame whose detection fails is logged and skipped.
    pub fn tick<S: FnMut(TickToken)>(
        &mut self,
        token: TickToken,
        mut schedule_frame: S,
    ) -> Option<AnswerVector> {
        if token.generation != self.generation {
            return None;
        }
        let live = self.live.as_mut()?;

        let markers = match live.stream.frame() {
            Some(frame) => match live.detector.detect(&frame) {
                Ok(markers) => Some(markers),
                Err(e) => {
                    error!("skipping frame: {e}");
                    None
                }
            },
            None => None,
        };

        let published = markers.and_then(|markers| self.process(&markers));

        schedule_frame(token);

        published
    }

    /// Folds one frame's markers into a working buffer and publishes it if
    /// it differs from the published answers
    fn process(&mut self, markers: &[Marker]) -> Option<AnswerVector> {
        let mut working = AnswerVector::new();

        self.overlays = markers
            .iter()
            .map(|marker| {
                let slot = self.registry.resolve(marker.id);
                let symbol = slot.and_then(|_| {
                    orientation::decode(marker)
                        .inspect_err(|e| debug!(marker = %marker.id, "no answer: {e}"))
                        .ok()
                });

                if let Some(slot) = slot {
                    working.set(slot, symbol);
                }

                Overlay {
                    id: marker.id,
                    corners: marker.corners,
                    slot,
                    symbol,
                }
            })
            .collect();

        if working == self.published {
            return None;
        }

        debug!(answers = %working, "answers changed");
        self.published = working;
        self.publish_count += 1;

        Some(working)
    }
}

impl<C: Camera, D> AnswerSource for AcquisitionController<C, D> {
    fn reset(&mut self) {
        AcquisitionController::reset(self);
    }
}

impl<C: Camera, D> Drop for AcquisitionController<C, D> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::testing::{FakeCamera, FakeDetector, FakeFrame, Scene, marker_with_edge};

    type Controller = AcquisitionController<FakeCamera, FakeDetector>;

    fn controller(scene: &Scene) -> Controller {
        AcquisitionController::new(
            FakeCamera::new(scene),
            SlotRegistry::new([1, 2, 3, 4].map(MarkerId::new)).unwrap(),
            FacingMode::Environment,
        )
    }

    fn started(scene: &Scene) -> (Controller, TickToken) {
        let mut controller = controller(scene);
        let mut tokens = Vec::new();
        controller
            .start(FakeDetector, |t| tokens.push(t))
            .expect("camera should start");
        (controller, tokens[0])
    }

    fn slot(i: usize) -> Slot {
        Slot::new(i).unwrap()
    }

    #[test]
    fn test_start_schedules_first_tick() {
        let scene = Scene::default();
        let mut controller = controller(&scene);
        let mut tokens = Vec::new();

        controller.start(FakeDetector, |t| tokens.push(t)).unwrap();

        assert!(controller.is_live());
        assert_eq!(tokens.len(), 1);
        assert_eq!(scene.streams_opened(), 1);
    }

    #[test]
    fn test_start_failure_keeps_scanning_off() {
        let scene = Scene::default();
        scene.refuse(camera::Error::PermissionDenied);
        let mut controller = controller(&scene);
        let mut tokens = Vec::new();

        let result = controller.start(FakeDetector, |t| tokens.push(t));

        assert_eq!(result, Err(camera::Error::PermissionDenied));
        assert!(!controller.is_live());
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_start_twice_keeps_single_stream() {
        let scene = Scene::default();
        let (mut controller, _) = started(&scene);

        controller.start(FakeDetector, |_| {}).unwrap();

        assert_eq!(scene.streams_opened(), 1);
    }

    #[test]
    fn test_tick_publishes_decoded_answers() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        scene.show(FakeFrame::Markers(vec![
            marker_with_edge(1, 10., 0.),
            marker_with_edge(3, 0., 10.),
        ]));

        let published = controller.tick(token, |_| {});

        let answers = published.expect("first frame should publish");
        assert_eq!(answers.get(slot(0)), Some(Symbol::C));
        assert_eq!(answers.get(slot(1)), None);
        assert_eq!(answers.get(slot(2)), Some(Symbol::D));
        assert_eq!(controller.answers(), answers);
    }

    #[test]
    fn test_tick_reschedules_itself() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        let mut tokens = Vec::new();

        controller.tick(token, |t| tokens.push(t));

        assert_eq!(tokens, vec![token]);
    }

    #[test]
    fn test_identical_frames_publish_once() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        scene.show(FakeFrame::Markers(vec![marker_with_edge(2, -10., 0.)]));

        assert!(controller.tick(token, |_| {}).is_some());
        assert!(controller.tick(token, |_| {}).is_none());
        assert_eq!(controller.publish_count(), 1);
    }

    #[test]
    fn test_marker_leaving_view_publishes_dash() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        scene.show(FakeFrame::Markers(vec![marker_with_edge(2, -10., 0.)]));
        controller.tick(token, |_| {});

        scene.show(FakeFrame::Markers(vec![]));
        let answers = controller.tick(token, |_| {}).expect("change should publish");

        assert!(answers.is_empty());
        assert_eq!(controller.publish_count(), 2);
    }

    #[test]
    fn test_unregistered_marker_never_occupies_slot() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        scene.show(FakeFrame::Markers(vec![marker_with_edge(99, 10., 0.)]));

        assert!(controller.tick(token, |_| {}).is_none());
        assert!(controller.answers().is_empty());

        let overlays = controller.overlays();
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].id, MarkerId::new(99));
        assert_eq!(overlays[0].slot, None);
        assert_eq!(overlays[0].symbol, None);
    }

    #[test]
    fn test_ambiguous_marker_written_as_dash() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        scene.show(FakeFrame::Markers(vec![
            marker_with_edge(1, 0., 0.),
            marker_with_edge(2, 10., 0.),
        ]));

        let answers = controller.tick(token, |_| {}).unwrap();

        assert_eq!(answers.get(slot(0)), None);
        assert_eq!(answers.get(slot(1)), Some(Symbol::C));
        assert_eq!(controller.overlays()[0].slot, Some(slot(0)));
    }

    #[test]
    fn test_ambiguous_marker_retried_next_frame() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        scene.show(FakeFrame::Markers(vec![marker_with_edge(1, 0., 0.)]));
        assert!(controller.tick(token, |_| {}).is_none());

        scene.show(FakeFrame::Markers(vec![marker_with_edge(1, 0., -10.)]));
        let answers = controller.tick(token, |_| {}).unwrap();

        assert_eq!(answers.get(slot(0)), Some(Symbol::B));
    }

    #[test]
    fn test_detection_error_keeps_loop_running() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        scene.show(FakeFrame::Markers(vec![marker_with_edge(4, 10., 0.)]));
        controller.tick(token, |_| {});

        scene.show(FakeFrame::Corrupt);
        let mut tokens = Vec::new();
        assert!(controller.tick(token, |t| tokens.push(t)).is_none());
        assert_eq!(tokens.len(), 1);
        assert_eq!(controller.answers().get(slot(3)), Some(Symbol::C));

        scene.show(FakeFrame::Markers(vec![marker_with_edge(4, 0., 10.)]));
        let answers = controller.tick(token, |_| {}).unwrap();
        assert_eq!(answers.get(slot(3)), Some(Symbol::D));
    }

    #[test]
    fn test_missing_frame_reschedules_without_publishing() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        let mut tokens = Vec::new();

        assert!(controller.tick(token, |t| tokens.push(t)).is_none());
        assert_eq!(tokens.len(), 1);
        assert_eq!(controller.publish_count(), 0);
    }

    #[test]
    fn test_reset_clears_answers_and_keeps_camera() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        scene.show(FakeFrame::Markers(vec![marker_with_edge(1, 10., 0.)]));
        controller.tick(token, |_| {});

        controller.reset();

        assert!(controller.answers().is_empty());
        assert!(controller.is_live());
        assert_eq!(scene.tracks_stopped(), 0);

        let answers = controller.tick(token, |_| {}).expect("same frame republishes");
        assert_eq!(answers.get(slot(0)), Some(Symbol::C));
    }

    #[test]
    fn test_stop_releases_tracks_once() {
        let scene = Scene::default();
        let (mut controller, _) = started(&scene);

        controller.stop();
        controller.stop();

        assert!(!controller.is_live());
        assert_eq!(scene.tracks_stopped(), 1);
    }

    #[test]
    fn test_pending_tick_after_stop_changes_nothing() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        scene.show(FakeFrame::Markers(vec![marker_with_edge(1, 10., 0.)]));
        controller.tick(token, |_| {});
        let before = controller.answers();
        let reads_before = scene.frames_read();

        controller.stop();
        scene.show(FakeFrame::Markers(vec![marker_with_edge(1, 0., 10.)]));
        let mut tokens = Vec::new();
        let result = controller.tick(token, |t| tokens.push(t));

        assert!(result.is_none());
        assert!(tokens.is_empty());
        assert_eq!(controller.answers(), before);
        assert_eq!(controller.publish_count(), 1);
        assert_eq!(scene.frames_read(), reads_before);
    }

    #[test]
    fn test_old_token_stale_after_restart() {
        let scene = Scene::default();
        let (mut controller, old_token) = started(&scene);
        controller.stop();

        let mut tokens = Vec::new();
        controller.start(FakeDetector, |t| tokens.push(t)).unwrap();
        scene.show(FakeFrame::Markers(vec![marker_with_edge(1, 10., 0.)]));

        assert!(controller.tick(old_token, |_| {}).is_none());
        assert!(controller.tick(tokens[0], |_| {}).is_some());
        assert_eq!(scene.streams_opened(), 2);
    }

    #[test]
    fn test_drop_stops_camera() {
        let scene = Scene::default();
        let (controller, _) = started(&scene);

        drop(controller);

        assert_eq!(scene.tracks_stopped(), 1);
    }

    #[test]
    fn test_last_detection_of_same_marker_wins() {
        let scene = Scene::default();
        let (mut controller, token) = started(&scene);
        scene.show(FakeFrame::Markers(vec![
            marker_with_edge(2, 10., 0.),
            marker_with_edge(2, -10., 0.),
        ]));

        let answers = controller.tick(token, |_| {}).unwrap();

        assert_eq!(answers.get(slot(1)), Some(Symbol::A));
    }
}
