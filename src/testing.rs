//! Fakes shared by the unit tests
//!
//! Resources handed to the core (camera streams, detectors, platforms) are
//! moved into it, so the fakes report what happened to them through shared
//! `Rc<RefCell<_>>` state that the test keeps a handle on.

use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
    AlarmMessage,
    acquisition::TickToken,
    api::{self, QuizApi},
    camera::{self, Camera, DetectionError, FacingMode, MarkerDetector, VideoStream},
    fullscreen::{self, FullscreenPlatform},
    marker::{Marker, Point},
    quiz::{InstanceId, Question, Quiz, QuizId},
    room::Scheduler,
};

/// What the fake camera currently sees
#[derive(Debug, Clone)]
pub enum FakeFrame {
    /// A frame in which the detector finds these markers
    Markers(Vec<Marker>),
    /// A frame on which detection fails
    Corrupt,
}

#[derive(Debug, Default)]
struct SceneState {
    frame: Option<FakeFrame>,
    refuse: Option<camera::Error>,
    streams_opened: usize,
    tracks_stopped: usize,
    frames_read: usize,
}

/// Shared view of the fake camera's world
#[derive(Debug, Clone, Default)]
pub struct Scene(Rc<RefCell<SceneState>>);

impl Scene {
    pub fn show(&self, frame: FakeFrame) {
        self.0.borrow_mut().frame = Some(frame);
    }

    pub fn refuse(&self, error: camera::Error) {
        self.0.borrow_mut().refuse = Some(error);
    }

    pub fn allow(&self) {
        self.0.borrow_mut().refuse = None;
    }

    pub fn streams_opened(&self) -> usize {
        self.0.borrow().streams_opened
    }

    pub fn tracks_stopped(&self) -> usize {
        self.0.borrow().tracks_stopped
    }

    pub fn frames_read(&self) -> usize {
        self.0.borrow().frames_read
    }

    /// Streams opened and not yet stopped
    pub fn open_streams(&self) -> usize {
        let state = self.0.borrow();
        state.streams_opened - state.tracks_stopped
    }
}

pub struct FakeCamera {
    scene: Scene,
}

impl FakeCamera {
    pub fn new(scene: &Scene) -> Self {
        Self {
            scene: scene.clone(),
        }
    }
}

impl Camera for FakeCamera {
    type Stream = FakeStream;

    fn request_stream(&mut self, _facing: FacingMode) -> Result<FakeStream, camera::Error> {
        let mut state = self.scene.0.borrow_mut();
        if let Some(error) = state.refuse.clone() {
            return Err(error);
        }
        state.streams_opened += 1;
        Ok(FakeStream {
            scene: self.scene.clone(),
            stopped: false,
        })
    }
}

pub struct FakeStream {
    scene: Scene,
    stopped: bool,
}

impl VideoStream for FakeStream {
    type Frame = FakeFrame;

    fn frame(&mut self) -> Option<FakeFrame> {
        let mut state = self.scene.0.borrow_mut();
        state.frames_read += 1;
        state.frame.clone()
    }

    fn stop_tracks(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.scene.0.borrow_mut().tracks_stopped += 1;
        }
    }
}

pub struct FakeDetector;

impl MarkerDetector<FakeFrame> for FakeDetector {
    fn detect(&mut self, frame: &FakeFrame) -> Result<Vec<Marker>, DetectionError> {
        match frame {
            FakeFrame::Markers(markers) => Ok(markers.clone()),
            FakeFrame::Corrupt => Err(DetectionError("corrupt frame".to_owned())),
        }
    }
}

/// A square marker whose first edge runs from the origin to `(dx, dy)`
pub fn marker_with_edge(id: u32, dx: f64, dy: f64) -> Marker {
    Marker::new(
        id,
        [
            Point::new(0., 0.),
            Point::new(dx, dy),
            Point::new(dx - dy, dy + dx),
            Point::new(-dy, dx),
        ],
    )
}

pub fn question(text: &str, answers: &[&str], correct_index: Option<usize>) -> Question {
    Question::new(
        text,
        answers.iter().map(|a| (*a).to_owned()).collect(),
        correct_index,
    )
}

pub fn quiz(name: &str, question_count: usize) -> Quiz {
    Quiz::new(
        QuizId::new(),
        name,
        (0..question_count)
            .map(|i| question(&format!("Question {i}"), &["Yes", "No", "Maybe"], Some(i % 3)))
            .collect(),
    )
}

#[derive(Debug, Default)]
struct ApiState {
    quizzes: Vec<Quiz>,
    fail_list: bool,
    fail_create: bool,
    created: Vec<QuizId>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeApi(Rc<RefCell<ApiState>>);

impl FakeApi {
    pub fn with_quizzes(quizzes: Vec<Quiz>) -> Self {
        let api = Self::default();
        api.0.borrow_mut().quizzes = quizzes;
        api
    }

    pub fn fail_list(&self) {
        self.0.borrow_mut().fail_list = true;
    }

    pub fn fail_create(&self, fail: bool) {
        self.0.borrow_mut().fail_create = fail;
    }

    pub fn created(&self) -> Vec<QuizId> {
        self.0.borrow().created.clone()
    }
}

impl QuizApi for FakeApi {
    fn list_quizzes(&self) -> Result<Vec<Quiz>, api::Error> {
        let state = self.0.borrow();
        if state.fail_list {
            return Err(api::Error::Network("connection refused".to_owned()));
        }
        Ok(state.quizzes.clone())
    }

    fn create_instance(&self, quiz_id: &QuizId) -> Result<InstanceId, api::Error> {
        let mut state = self.0.borrow_mut();
        if state.fail_create {
            return Err(api::Error::Status {
                status: 500,
                body: "instance store offline".to_owned(),
            });
        }
        state.created.push(*quiz_id);
        Ok(InstanceId::new())
    }
}

#[derive(Debug, Default)]
struct PlatformState {
    fullscreen: bool,
    fail: bool,
    requests: usize,
    exits: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakePlatform(Rc<RefCell<PlatformState>>);

impl FakePlatform {
    pub fn fail(&self) {
        self.0.borrow_mut().fail = true;
    }

    pub fn requests(&self) -> usize {
        self.0.borrow().requests
    }

    pub fn exits(&self) -> usize {
        self.0.borrow().exits
    }

    pub fn is_fullscreen(&self) -> bool {
        self.0.borrow().fullscreen
    }
}

impl FullscreenPlatform for FakePlatform {
    fn request_fullscreen(&mut self) -> Result<(), fullscreen::Error> {
        let mut state = self.0.borrow_mut();
        state.requests += 1;
        if state.fail {
            return Err(fullscreen::Error::Denied("not allowed by user agent".to_owned()));
        }
        state.fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), fullscreen::Error> {
        let mut state = self.0.borrow_mut();
        state.exits += 1;
        if state.fail {
            return Err(fullscreen::Error::Denied("not allowed by user agent".to_owned()));
        }
        state.fullscreen = false;
        Ok(())
    }
}

/// Records everything the core asks to schedule
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    pub frames: Vec<TickToken>,
    pub alarms: Vec<(AlarmMessage, Duration)>,
}

impl RecordingScheduler {
    pub fn take_frames(&mut self) -> Vec<TickToken> {
        std::mem::take(&mut self.frames)
    }

    pub fn take_alarms(&mut self) -> Vec<(AlarmMessage, Duration)> {
        std::mem::take(&mut self.alarms)
    }
}

impl Scheduler for RecordingScheduler {
    fn request_frame(&mut self, token: TickToken) {
        self.frames.push(token);
    }

    fn schedule_alarm(&mut self, alarm: AlarmMessage, after: Duration) {
        self.alarms.push((alarm, after));
    }
}

/// Answer source that only remembers resets
#[derive(Debug, Default)]
pub struct RecordingAnswers {
    pub answers: crate::answers::AnswerVector,
    pub resets: usize,
}

impl crate::acquisition::AnswerSource for RecordingAnswers {
    fn reset(&mut self) {
        self.answers = crate::answers::AnswerVector::new();
        self.resets += 1;
    }
}
