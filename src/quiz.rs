//! Quizzes and questions
//!
//! Quizzes are authored and stored elsewhere; this module holds the shape
//! the presentation works with and the normalisation applied to what the
//! quiz backend returns. Backend questions name their text either
//! `questionText`, `question_text` or `text`, and list answers either as
//! plain strings or as `{ "text": ..., "isCorrect": ... }` objects.

use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, DeserializeFromStr, SerializeDisplay, serde_as};
use tracing::debug;
use uuid::Uuid;

use crate::constants::question::{MAX_ANSWER_COUNT, MIN_ANSWER_COUNT};

/// Identifier of a stored quiz
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct QuizId(Uuid);

impl QuizId {
    /// Creates a new random quiz ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuizId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for QuizId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for QuizId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Identifier of a server-tracked live run of a quiz
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Creates a new random instance ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for InstanceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

type ValidationResult = garde::Result;

/// Checks that the correct answer, if any, points at one of the answers
fn within_answers(answers: &[String]) -> impl FnOnce(&Option<usize>, &()) -> ValidationResult + '_ {
    move |index, ()| match index {
        Some(index) if *index >= answers.len() => Err(garde::Error::new(format!(
            "correct answer {index} is not one of the {} answers",
            answers.len()
        ))),
        _ => Ok(()),
    }
}

/// A single question with its answer options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(from = "ApiQuestion")]
pub struct Question {
    /// The question text shown to the room
    #[garde(length(max = crate::constants::question::MAX_TEXT_LENGTH))]
    text: String,
    /// The answer options, selected by symbols A, B, C, D in order
    #[garde(
        length(min = MIN_ANSWER_COUNT, max = MAX_ANSWER_COUNT),
        inner(length(max = crate::constants::question::MAX_ANSWER_LENGTH))
    )]
    answers: Vec<String>,
    /// Index of the correct option, if the quiz marks one
    #[garde(custom(within_answers(&self.answers)))]
    correct_index: Option<usize>,
}

impl Question {
    /// Creates a question
    pub fn new(text: impl Into<String>, answers: Vec<String>, correct_index: Option<usize>) -> Self {
        Self {
            text: text.into(),
            answers,
            correct_index,
        }
    }

    /// Returns the question text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the answer options
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Returns the index of the correct option, if any
    pub fn correct_index(&self) -> Option<usize> {
        self.correct_index
    }
}

/// A quiz as selected for presentation
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Quiz {
    /// Backend identifier
    #[garde(skip)]
    id: QuizId,
    /// Display name
    #[garde(length(max = crate::constants::quiz::MAX_NAME_LENGTH))]
    name: String,
    /// Questions in presentation order
    #[garde(dive)]
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    questions: Vec<Question>,
}

impl Quiz {
    /// Creates a quiz
    pub fn new(id: QuizId, name: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            id,
            name: name.into(),
            questions,
        }
    }

    /// Parses a quiz from the backend's JSON payload
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload is not a quiz.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Returns the quiz identifier
    pub fn id(&self) -> QuizId {
        self.id
    }

    /// Returns the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the questions
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the question at `index`
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Returns the number of questions
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Returns `true` if the quiz has no questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Returns the list entry shown while choosing a quiz
    pub fn summary(&self) -> QuizSummary {
        QuizSummary {
            id: self.id,
            name: self.name.clone(),
            question_count: self.len(),
        }
    }
}

/// Entry in the quiz selection list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSummary {
    /// Quiz to start when this entry is chosen
    pub id: QuizId,
    /// Display name
    pub name: String,
    /// Number of questions in the quiz
    pub question_count: usize,
}

/// Answer option as sent by the backend
#[derive(Deserialize)]
#[serde(untagged)]
enum ApiAnswer {
    Text(String),
    Object {
        text: String,
        #[serde(default, rename = "isCorrect")]
        is_correct: bool,
    },
}

/// Question as sent by the backend
///
/// Payloads may carry several spellings of the same key at once, so each
/// spelling is its own field and the first present one wins.
#[serde_as]
#[derive(Deserialize)]
struct ApiQuestion {
    #[serde(default, rename = "questionText")]
    question_text: Option<String>,
    #[serde(default, rename = "question_text")]
    question_text_snake: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    answers: Vec<ApiAnswer>,
    #[serde(default, rename = "correctIndex")]
    correct_index_camel: Option<usize>,
    #[serde(default)]
    correct_index: Option<usize>,
}

impl From<ApiQuestion> for Question {
    /// Normalises a backend question
    ///
    /// The first answer flagged `isCorrect` wins over an explicit index.
    /// Options past the fourth cannot be selected with a marker and are
    /// dropped, together with a correct index pointing at them.
    fn from(api: ApiQuestion) -> Self {
        let flagged = api
            .answers
            .iter()
            .position(|a| matches!(a, ApiAnswer::Object { is_correct: true, .. }));

        let mut answers: Vec<String> = api
            .answers
            .into_iter()
            .map(|a| match a {
                ApiAnswer::Text(text) | ApiAnswer::Object { text, .. } => text,
            })
            .collect();

        if answers.len() > MAX_ANSWER_COUNT {
            debug!(
                dropped = answers.len() - MAX_ANSWER_COUNT,
                "question has more answers than markers can select"
            );
            answers.truncate(MAX_ANSWER_COUNT);
        }

        let correct_index = flagged
            .or(api.correct_index_camel)
            .or(api.correct_index)
            .filter(|index| *index < answers.len());

        Self {
            text: api
                .question_text
                .or(api.question_text_snake)
                .or(api.text)
                .unwrap_or_default(),
            answers,
            correct_index,
        }
    }
}
