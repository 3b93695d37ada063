//! Presentation session state machine
//!
//! A presenter view starts by choosing a quiz ([`State::Select`]) and then
//! shows its questions one at a time ([`State::Presenting`]). Each question
//! runs a countdown; when it elapses the correct answer is revealed. The
//! countdown is identified by an epoch which is bumped whenever a new
//! countdown starts, so an alarm scheduled for an earlier question is
//! recognised as stale and ignored.

use std::time::Duration;

use enum_map::EnumMap;
use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::{debug, info, warn};
use web_time::SystemTime;

use crate::{
    acquisition::AnswerSource,
    answers::AnswerVector,
    api::{self, QuizApi},
    orientation::Symbol,
    quiz::{InstanceId, Question, Quiz, QuizId, QuizSummary},
};

/// Errors surfaced to the operator by session transitions
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// The quiz backend could not create a live instance
    #[error("could not start the quiz: {0}")]
    SessionCreateFailed(#[source] api::Error),
    /// The chosen quiz is not in the loaded list
    #[error("quiz {0} is not available")]
    UnknownQuiz(QuizId),
    /// A quiz is already being presented
    #[error("a quiz is already being presented")]
    AlreadyPresenting,
}

/// Quizzes offered while choosing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuizList {
    /// The list has been requested but not received
    #[default]
    Loading,
    /// The list was received
    Loaded(Vec<Quiz>),
    /// The list could not be fetched
    Failed(String),
}

/// State while the operator is choosing a quiz
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectState {
    quizzes: QuizList,
}

impl SelectState {
    /// Returns the offered quizzes
    pub fn quizzes(&self) -> &QuizList {
        &self.quizzes
    }
}

/// State while a quiz is on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentingState {
    quiz: Quiz,
    instance_id: InstanceId,
    current_index: usize,
    reveal: bool,
    countdown_epoch: u64,
    countdown_started: SystemTime,
}

impl PresentingState {
    /// Returns the quiz being presented
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// Returns the backend instance of this run
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Returns the index of the question on screen
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Returns whether the correct answer is shown
    pub fn reveal(&self) -> bool {
        self.reveal
    }

    /// Returns the epoch of the running countdown
    pub fn countdown_epoch(&self) -> u64 {
        self.countdown_epoch
    }

    /// Returns the question on screen, `None` once the quiz is completed
    pub fn question(&self) -> Option<&Question> {
        self.quiz.question(self.current_index)
    }

    fn last_index(&self) -> Option<usize> {
        self.quiz.len().checked_sub(1)
    }
}

/// Current phase of the presenter view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Choosing a quiz
    Select(SelectState),
    /// Showing a quiz
    Presenting(PresentingState),
}

/// Timers requested by the presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// The countdown with this epoch ran out
    CountdownElapsed {
        /// Epoch the countdown was started with
        epoch: u64,
    },
}

/// Quiz list as shown to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QuizListMessage {
    /// Still loading
    Loading,
    /// Quizzes to choose from
    Loaded(Vec<QuizSummary>),
    /// Loading failed with this message
    Failed(String),
}

impl From<&QuizList> for QuizListMessage {
    fn from(list: &QuizList) -> Self {
        match list {
            QuizList::Loading => Self::Loading,
            QuizList::Loaded(quizzes) => Self::Loaded(quizzes.iter().map(Quiz::summary).collect()),
            QuizList::Failed(message) => Self::Failed(message.clone()),
        }
    }
}

/// Everything the renderer needs to draw the question on screen
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionMessage {
    /// Name of the quiz
    pub quiz_name: String,
    /// Backend instance of this run
    pub instance_id: InstanceId,
    /// Index of the question (0-based)
    pub index: usize,
    /// Number of questions in the quiz
    pub count: usize,
    /// Question text
    pub text: String,
    /// Answer options, in symbol order
    pub answers: Vec<String>,
    /// Whether the correct answer is shown
    pub reveal: bool,
    /// Correct option, only sent once revealed
    pub correct_index: Option<usize>,
    /// Time left on the countdown
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub countdown_remaining: Duration,
    /// Whether another question follows
    pub can_advance: bool,
    /// Live answers per slot
    pub slots: AnswerVector,
    /// Live number of slots per answer
    pub tally: EnumMap<Symbol, usize>,
}

/// Messages describing the whole view, sent on (re)connection of a renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SyncMessage {
    /// Choosing a quiz
    Select(QuizListMessage),
    /// A question is on screen
    Question(QuestionMessage),
    /// Every question has been shown
    Completed {
        /// Name of the quiz
        quiz_name: String,
        /// Number of questions in the quiz
        count: usize,
    },
}

/// Incremental changes to the view
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UpdateMessage {
    /// The quiz list finished loading
    QuizList(QuizListMessage),
    /// A new question is on screen
    Question(QuestionMessage),
    /// The quiz has no question left to show
    Completed {
        /// Name of the quiz
        quiz_name: String,
        /// Number of questions in the quiz
        count: usize,
    },
    /// The reveal flag changed
    Reveal {
        /// Whether the correct answer is shown
        reveal: bool,
        /// Correct option, only sent once revealed
        correct_index: Option<usize>,
    },
    /// The scanned answers changed
    Answers {
        /// Live answers per slot
        slots: AnswerVector,
        /// Live number of slots per answer
        tally: EnumMap<Symbol, usize>,
    },
}

impl UpdateMessage {
    /// Builds the update for newly published answers
    pub fn answers(slots: AnswerVector) -> Self {
        Self::Answers {
            slots,
            tally: slots.tally(),
        }
    }
}

/// The presenter's session: which quiz, which question, and whether the
/// answer is revealed
#[derive(Debug, Clone)]
pub struct Presentation {
    state: State,
    countdown: Duration,
    epoch: u64,
}

impl Presentation {
    /// Creates a presentation in the selection phase, waiting for the quiz
    /// list
    pub fn new(countdown: Duration) -> Self {
        Self {
            state: State::Select(SelectState::default()),
            countdown,
            epoch: 0,
        }
    }

    /// Returns the current phase
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns the presenting state, if a quiz is on screen
    pub fn presenting(&self) -> Option<&PresentingState> {
        match &self.state {
            State::Presenting(presenting) => Some(presenting),
            State::Select(_) => None,
        }
    }

    /// Returns `true` while a quiz is on screen
    pub fn is_presenting(&self) -> bool {
        self.presenting().is_some()
    }

    /// Returns the question on screen
    pub fn question(&self) -> Option<&Question> {
        self.presenting().and_then(PresentingState::question)
    }

    /// Returns `true` if a quiz is on screen but has no current question
    pub fn is_completed(&self) -> bool {
        self.presenting().is_some_and(|p| p.question().is_none())
    }

    /// Returns `true` if a later question exists
    pub fn can_advance(&self) -> bool {
        self.presenting()
            .and_then(|p| p.last_index().map(|last| p.current_index < last))
            .unwrap_or(false)
    }

    /// Returns the time left on the running countdown
    pub fn countdown_remaining(&self) -> Option<Duration> {
        self.presenting().map(|p| {
            let elapsed = p.countdown_started.elapsed().unwrap_or_default();
            self.countdown.saturating_sub(elapsed)
        })
    }

    /// Fetches the quiz list from the backend
    ///
    /// Only meaningful while choosing; ignored while presenting.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`api::Error`]. The list is then marked as
    /// failed with the error's message.
    pub fn load_quizzes<A: QuizApi>(&mut self, api: &A) -> Result<(), api::Error> {
        let State::Select(select) = &mut self.state else {
            return Ok(());
        };

        match api.list_quizzes() {
            Ok(quizzes) => {
                debug!(count = quizzes.len(), "quiz list loaded");
                select.quizzes = QuizList::Loaded(quizzes);
                Ok(())
            }
            Err(e) => {
                warn!("quiz list unavailable: {e}");
                select.quizzes = QuizList::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Starts presenting a quiz from the loaded list
    ///
    /// Creates a backend instance first; only once it exists does the view
    /// switch to the first question with the answer hidden, the scanned
    /// answers cleared, and a fresh countdown scheduled.
    ///
    /// # Errors
    ///
    /// * [`Error::AlreadyPresenting`] if a quiz is on screen
    /// * [`Error::UnknownQuiz`] if `quiz_id` is not in the loaded list
    /// * [`Error::SessionCreateFailed`] if the backend call fails; the view
    ///   stays in the selection phase, unchanged
    pub fn start_session<A, R, S>(
        &mut self,
        quiz_id: QuizId,
        api: &A,
        answers: &mut R,
        schedule_alarm: S,
    ) -> Result<(), Error>
    where
        A: QuizApi,
        R: AnswerSource,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let State::Select(select) = &self.state else {
            return Err(Error::AlreadyPresenting);
        };

        let quiz = match &select.quizzes {
            QuizList::Loaded(quizzes) => quizzes.iter().find(|q| q.id() == quiz_id),
            QuizList::Loading | QuizList::Failed(_) => None,
        }
        .ok_or(Error::UnknownQuiz(quiz_id))?
        .clone();

        if let Err(report) = quiz.validate() {
            warn!(quiz = %quiz_id, "presenting a quiz with problems: {report}");
        }

        let instance_id = api.create_instance(&quiz_id).map_err(|e| {
            warn!(quiz = %quiz_id, "session creation failed: {e}");
            Error::SessionCreateFailed(e)
        })?;

        info!(quiz = %quiz_id, instance = %instance_id, "presenting");

        self.state = State::Presenting(PresentingState {
            quiz,
            instance_id,
            current_index: 0,
            reveal: false,
            countdown_epoch: self.epoch,
            countdown_started: SystemTime::now(),
        });
        self.begin_question(answers, schedule_alarm);

        Ok(())
    }

    /// Moves to the next question
    ///
    /// Hides the answer, clears the scanned answers and restarts the
    /// countdown. Returns `false` and changes nothing on the last question
    /// or while choosing.
    pub fn advance<R, S>(&mut self, answers: &mut R, schedule_alarm: S) -> bool
    where
        R: AnswerSource,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        if !self.can_advance() {
            return false;
        }
        let State::Presenting(presenting) = &mut self.state else {
            return false;
        };

        presenting.current_index += 1;
        presenting.reveal = false;
        self.begin_question(answers, schedule_alarm);

        true
    }

    /// Skips the question on screen; same as [`advance`](Self::advance)
    pub fn skip<R, S>(&mut self, answers: &mut R, schedule_alarm: S) -> bool
    where
        R: AnswerSource,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        self.advance(answers, schedule_alarm)
    }

    /// Shows or hides the correct answer
    ///
    /// Returns the new value, or `None` while choosing.
    pub fn toggle_reveal(&mut self) -> Option<bool> {
        match &mut self.state {
            State::Presenting(presenting) => {
                presenting.reveal = !presenting.reveal;
                Some(presenting.reveal)
            }
            State::Select(_) => None,
        }
    }

    /// Handles a scheduled alarm
    ///
    /// An elapsed countdown reveals the answer if it belongs to the
    /// question on screen. Returns `true` if the alarm was current.
    pub fn receive_alarm(&mut self, message: crate::AlarmMessage) -> bool {
        match message {
            crate::AlarmMessage::Presentation(AlarmMessage::CountdownElapsed { epoch }) => {
                match &mut self.state {
                    State::Presenting(presenting) if presenting.countdown_epoch == epoch => {
                        presenting.reveal = true;
                        true
                    }
                    _ => {
                        debug!(epoch, "stale countdown ignored");
                        false
                    }
                }
            }
        }
    }

    /// Returns to quiz selection, discarding the run
    ///
    /// The quiz list needs to be loaded again. Returns `false` if already
    /// choosing.
    pub fn leave(&mut self) -> bool {
        if !self.is_presenting() {
            return false;
        }
        self.epoch += 1;
        self.state = State::Select(SelectState::default());
        info!("back to quiz selection");
        true
    }

    /// Returns the message that brings a renderer up to date
    pub fn state_message(&self, slots: AnswerVector) -> SyncMessage {
        match &self.state {
            State::Select(select) => SyncMessage::Select((&select.quizzes).into()),
            State::Presenting(presenting) => match self.question_message(slots) {
                Some(message) => SyncMessage::Question(message),
                None => SyncMessage::Completed {
                    quiz_name: presenting.quiz.name().to_owned(),
                    count: presenting.quiz.len(),
                },
            },
        }
    }

    /// Returns the message describing the question on screen
    pub fn question_message(&self, slots: AnswerVector) -> Option<QuestionMessage> {
        let presenting = self.presenting()?;
        let question = presenting.question()?;

        Some(QuestionMessage {
            quiz_name: presenting.quiz.name().to_owned(),
            instance_id: presenting.instance_id,
            index: presenting.current_index,
            count: presenting.quiz.len(),
            text: question.text().to_owned(),
            answers: question.answers().to_vec(),
            reveal: presenting.reveal,
            correct_index: question.correct_index().filter(|_| presenting.reveal),
            countdown_remaining: self.countdown_remaining().unwrap_or_default(),
            can_advance: self.can_advance(),
            slots,
            tally: slots.tally(),
        })
    }

    /// Returns the update announcing the question on screen
    pub fn question_update(&self, slots: AnswerVector) -> Option<UpdateMessage> {
        let presenting = self.presenting()?;
        Some(match self.question_message(slots) {
            Some(question) => UpdateMessage::Question(question),
            None => UpdateMessage::Completed {
                quiz_name: presenting.quiz.name().to_owned(),
                count: presenting.quiz.len(),
            },
        })
    }

    /// Returns the update announcing the current reveal flag
    pub fn reveal_message(&self) -> Option<UpdateMessage> {
        let presenting = self.presenting()?;
        Some(UpdateMessage::Reveal {
            reveal: presenting.reveal,
            correct_index: presenting
                .question()
                .and_then(Question::correct_index)
                .filter(|_| presenting.reveal),
        })
    }

    /// Clears the scanned answers and starts a new countdown for the
    /// question on screen
    fn begin_question<R, S>(&mut self, answers: &mut R, mut schedule_alarm: S)
    where
        R: AnswerSource,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let State::Presenting(presenting) = &mut self.state else {
            return;
        };

        answers.reset();

        self.epoch += 1;
        presenting.countdown_epoch = self.epoch;
        presenting.countdown_started = SystemTime::now();

        if presenting.question().is_some() {
            schedule_alarm(
                AlarmMessage::CountdownElapsed { epoch: self.epoch }.into(),
                self.countdown,
            );
        }
    }
}
