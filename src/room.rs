//! The presenter view
//!
//! A [`Room`] is what the host mounts when the presenter opens the quiz
//! screen. It owns the session state machine, the camera acquisition and
//! the fullscreen state, routes keys, frames and alarms to them, and queues
//! the resulting [`UpdateMessage`](crate::UpdateMessage)s for the renderer.
//!
//! Dropping the room releases the camera.

use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::{
    AlarmMessage,
    acquisition::{AcquisitionController, Overlay, TickToken},
    answers::AnswerVector,
    api::QuizApi,
    camera::{Camera, MarkerDetector, VideoStream},
    config::Options,
    fullscreen::{Fullscreen, FullscreenPlatform},
    input::{self, Command, KeyEvent},
    presentation::{self, Presentation},
    quiz::QuizId,
    registry,
};

/// Host primitives for deferred work
pub trait Scheduler {
    /// Calls [`Room::on_frame`] with `token` on the next displayed frame
    fn request_frame(&mut self, token: TickToken);

    /// Calls [`Room::on_alarm`] with `alarm` once `after` has passed
    fn schedule_alarm(&mut self, alarm: AlarmMessage, after: Duration);
}

/// Incremental changes to the controls around the presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UpdateMessage {
    /// Something went wrong that the operator should know about
    Notice(crate::Error),
    /// Scanning was switched on or off
    Camera {
        /// Whether a camera stream is held
        live: bool,
    },
    /// Fullscreen was entered or left
    Fullscreen {
        /// Whether the presenter is fullscreen
        active: bool,
    },
}

/// Full state of the presenter view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncMessage {
    /// What the presentation shows
    pub view: presentation::SyncMessage,
    /// Whether a camera stream is held
    pub camera_live: bool,
    /// Whether the presenter is fullscreen
    pub fullscreen: bool,
    /// Markers seen in the last processed frame
    pub overlays: Vec<Overlay>,
}

type Frame<C> = <<C as Camera>::Stream as VideoStream>::Frame;

/// The presenter view and every resource it holds
pub struct Room<A, C: Camera, D, P> {
    api: A,
    presentation: Presentation,
    acquisition: AcquisitionController<C, D>,
    fullscreen: Fullscreen<P>,
    detectors: Box<dyn FnMut() -> D>,
    camera_on_start: bool,
    updates: Vec<crate::UpdateMessage>,
}

impl<A, C: Camera, D, P> std::fmt::Debug for Room<A, C, D, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("presentation", &self.presentation)
            .field("acquisition", &self.acquisition)
            .field("pending_updates", &self.updates.len())
            .finish_non_exhaustive()
    }
}

impl<A, C, D, P> Room<A, C, D, P>
where
    A: QuizApi,
    C: Camera,
    D: MarkerDetector<Frame<C>>,
    P: FullscreenPlatform,
{
    /// Mounts the presenter view in quiz selection and loads the quiz list
    ///
    /// `detectors` builds a fresh detector each time scanning starts. A
    /// quiz list that cannot be loaded is reported as a notice.
    ///
    /// # Errors
    ///
    /// Returns [`registry::Error::Duplicate`] if `options` assign one marker
    /// to two slots.
    pub fn mount<F>(
        options: &Options,
        api: A,
        camera: C,
        detectors: F,
        platform: P,
    ) -> Result<Self, registry::Error>
    where
        F: FnMut() -> D + 'static,
    {
        let mut room = Self {
            api,
            presentation: Presentation::new(options.countdown()),
            acquisition: AcquisitionController::new(camera, options.registry()?, options.facing()),
            fullscreen: Fullscreen::new(platform),
            detectors: Box::new(detectors),
            camera_on_start: options.camera_on_start(),
            updates: Vec::new(),
        };
        info!("presenter mounted");
        room.load_quizzes();
        Ok(room)
    }

    /// Returns the session state machine
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Returns the last published answers
    pub fn answers(&self) -> AnswerVector {
        self.acquisition.answers()
    }

    /// Returns the markers seen in the last processed frame
    pub fn overlays(&self) -> &[Overlay] {
        self.acquisition.overlays()
    }

    /// Returns `true` while scanning
    pub fn is_camera_live(&self) -> bool {
        self.acquisition.is_live()
    }

    /// Returns `true` while fullscreen
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_active()
    }

    /// Drains the updates queued since the last call
    pub fn take_updates(&mut self) -> Vec<crate::UpdateMessage> {
        std::mem::take(&mut self.updates)
    }

    /// Returns the message that brings a renderer up to date
    pub fn sync_message(&self) -> crate::SyncMessage {
        SyncMessage {
            view: self.presentation.state_message(self.acquisition.answers()),
            camera_live: self.acquisition.is_live(),
            fullscreen: self.fullscreen.is_active(),
            overlays: self.acquisition.overlays().to_vec(),
        }
        .into()
    }

    /// Reloads the quiz list while choosing
    pub fn load_quizzes(&mut self) {
        if let Err(e) = self.presentation.load_quizzes(&self.api) {
            self.notify(e);
        }
        let list = match self.presentation.state() {
            presentation::State::Select(select) => {
                presentation::QuizListMessage::from(select.quizzes())
            }
            presentation::State::Presenting(_) => return,
        };
        self.announce(presentation::UpdateMessage::QuizList(list));
    }

    /// Starts presenting the chosen quiz
    ///
    /// Scanning starts along with the first question if the options ask
    /// for it.
    ///
    /// # Errors
    ///
    /// Returns the [`presentation::Error`] that kept the quiz from starting;
    /// it is also queued as a notice.
    pub fn select_quiz<S: Scheduler>(
        &mut self,
        quiz_id: QuizId,
        scheduler: &mut S,
    ) -> Result<(), presentation::Error> {
        if let Err(e) = self.presentation.start_session(
            quiz_id,
            &self.api,
            &mut self.acquisition,
            |alarm, after| scheduler.schedule_alarm(alarm, after),
        ) {
            self.notify(e.clone());
            return Err(e);
        }

        self.announce_question();

        if self.camera_on_start {
            self.start_camera(scheduler);
        }

        Ok(())
    }

    /// Applies a keyboard shortcut and returns the command it mapped to
    pub fn handle_key<S: Scheduler>(
        &mut self,
        event: KeyEvent,
        scheduler: &mut S,
    ) -> Option<Command> {
        let command = input::command(
            event,
            self.presentation.is_presenting(),
            self.fullscreen.is_active(),
        )?;

        match command {
            Command::Advance => {
                self.advance(scheduler);
            }
            Command::ToggleReveal => self.toggle_reveal(),
            Command::ToggleFullscreen => self.toggle_fullscreen(),
            Command::ExitFullscreen => self.exit_fullscreen(),
            Command::ToggleCamera => {
                self.toggle_camera(scheduler);
            }
        }

        Some(command)
    }

    /// Moves to the next question; returns `false` on the last one
    pub fn advance<S: Scheduler>(&mut self, scheduler: &mut S) -> bool {
        let advanced = self
            .presentation
            .advance(&mut self.acquisition, |alarm, after| {
                scheduler.schedule_alarm(alarm, after);
            });
        if advanced {
            self.announce_question();
        }
        advanced
    }

    /// Skips the question on screen; same as [`advance`](Self::advance)
    pub fn skip<S: Scheduler>(&mut self, scheduler: &mut S) -> bool {
        self.advance(scheduler)
    }

    /// Shows or hides the correct answer
    pub fn toggle_reveal(&mut self) {
        if self.presentation.toggle_reveal().is_some() {
            self.announce_reveal();
        }
    }

    /// Starts scanning if stopped and stops it otherwise
    ///
    /// Only available while presenting. Returns whether scanning is on
    /// afterwards.
    pub fn toggle_camera<S: Scheduler>(&mut self, scheduler: &mut S) -> bool {
        if !self.presentation.is_presenting() {
            return false;
        }
        if self.acquisition.is_live() {
            self.stop_camera();
        } else {
            self.start_camera(scheduler);
        }
        self.acquisition.is_live()
    }

    /// Runs the detection pass the host was asked to schedule
    pub fn on_frame<S: Scheduler>(&mut self, token: TickToken, scheduler: &mut S) {
        if let Some(answers) = self
            .acquisition
            .tick(token, |token| scheduler.request_frame(token))
        {
            self.announce(presentation::UpdateMessage::answers(answers));
        }
    }

    /// Delivers an alarm the host was asked to schedule
    pub fn on_alarm(&mut self, alarm: AlarmMessage) {
        if self.presentation.receive_alarm(alarm) {
            self.announce_reveal();
        }
    }

    /// Mirrors a fullscreen change reported by the platform
    pub fn on_fullscreen_change(&mut self, active: bool) {
        if self.fullscreen.is_active() != active {
            self.fullscreen.on_change(active);
            self.announce(UpdateMessage::Fullscreen { active });
        }
    }

    /// Ends the presentation and goes back to quiz selection
    pub fn leave(&mut self) {
        self.stop_camera();
        if self.presentation.leave() {
            self.load_quizzes();
        }
    }

    fn start_camera<S: Scheduler>(&mut self, scheduler: &mut S) {
        if self.acquisition.is_live() {
            return;
        }
        let detector = (self.detectors)();
        match self
            .acquisition
            .start(detector, |token| scheduler.request_frame(token))
        {
            Ok(()) => self.announce(UpdateMessage::Camera { live: true }),
            Err(e) => self.notify(e),
        }
    }

    fn stop_camera(&mut self) {
        if self.acquisition.is_live() {
            self.acquisition.stop();
            self.announce(UpdateMessage::Camera { live: false });
        }
    }

    fn toggle_fullscreen(&mut self) {
        let before = self.fullscreen.is_active();
        self.fullscreen.toggle();
        self.announce_fullscreen(before);
    }

    fn exit_fullscreen(&mut self) {
        let before = self.fullscreen.is_active();
        self.fullscreen.exit();
        self.announce_fullscreen(before);
    }

    fn announce_fullscreen(&mut self, before: bool) {
        let active = self.fullscreen.is_active();
        if active != before {
            self.announce(UpdateMessage::Fullscreen { active });
        }
    }

    fn announce_question(&mut self) {
        if let Some(update) = self.presentation.question_update(self.acquisition.answers()) {
            self.announce(update);
        }
    }

    fn announce_reveal(&mut self) {
        if let Some(update) = self.presentation.reveal_message() {
            self.announce(update);
        }
    }

    fn notify<E: Into<crate::Error>>(&mut self, error: E) {
        self.announce(UpdateMessage::Notice(error.into()));
    }

    fn announce<M: Into<crate::UpdateMessage>>(&mut self, message: M) {
        self.updates.push(message.into());
    }
}
