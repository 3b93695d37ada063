//! Quiz backend boundary
//!
//! This module defines the trait the presentation uses to reach the quiz
//! backend. The HTTP client behind it belongs to the host; requests are
//! issued once and failures are reported to the operator, without retry.

use serde::Serialize;
use thiserror::Error;

use crate::quiz::{InstanceId, Quiz, QuizId};

/// Errors reported by the quiz backend
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// The backend could not be reached
    #[error("network error: {0}")]
    Network(String),
    /// The backend answered with a non-success status
    #[error("request failed with status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },
    /// The response could not be understood
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// Body returned when an instance is created
#[derive(serde::Deserialize)]
struct CreatedInstance {
    id: InstanceId,
}

/// Parses the backend's quiz list response
///
/// # Errors
///
/// Returns [`Error::Malformed`] if the body is not a list of quizzes.
pub fn parse_quiz_list(body: &str) -> Result<Vec<Quiz>, Error> {
    Ok(serde_json::from_str(body)?)
}

/// Parses the backend's instance creation response (`{ "id": ... }`)
///
/// # Errors
///
/// Returns [`Error::Malformed`] if the body carries no valid instance id.
pub fn parse_created_instance(body: &str) -> Result<InstanceId, Error> {
    let created: CreatedInstance = serde_json::from_str(body)?;
    Ok(created.id)
}

/// Access to stored quizzes and live quiz instances
pub trait QuizApi {
    /// Lists every stored quiz
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the backend call fails.
    fn list_quizzes(&self) -> Result<Vec<Quiz>, Error>;

    /// Creates a live instance of a quiz and returns its identifier
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the backend call fails.
    fn create_instance(&self, quiz_id: &QuizId) -> Result<InstanceId, Error>;
}
