//! # Pubquiz Presenter Library
//!
//! This library provides the core of a pub-quiz presenter in which teams
//! answer by holding up printed fiducial markers. Each of up to four teams
//! owns one marker; the way the marker is rotated in front of the camera
//! selects answer A, B, C or D.
//!
//! The crate performs no I/O of its own. The host supplies the camera, the
//! marker detector, the quiz backend, fullscreen control and scheduling,
//! then feeds frames, keys and alarms to a [`room::Room`] and renders the
//! [`SyncMessage`]s and [`UpdateMessage`]s it produces.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod constants;

pub mod acquisition;
pub mod answers;
pub mod api;
pub mod camera;
pub mod config;
pub mod fullscreen;
pub mod input;
pub mod marker;
pub mod orientation;
pub mod presentation;
pub mod quiz;
pub mod registry;
pub mod room;

#[cfg(test)]
mod testing;

/// Messages that describe the full state of the presenter view
///
/// A renderer that (re)connects receives one of these and then follows
/// along with [`UpdateMessage`]s.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// State of the presentation alone
    Presentation(presentation::SyncMessage),
    /// State of the presentation and the controls around it
    Room(room::SyncMessage),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages that describe a change to the presenter view
#[derive(Debug, Serialize, Clone, PartialEq, Eq, derive_more::From)]
pub enum UpdateMessage {
    /// Changes to the question, reveal or scanned answers
    Presentation(presentation::UpdateMessage),
    /// Changes to the camera, fullscreen or operator notices
    Room(room::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Alarm messages for timed events
///
/// The host holds on to these and hands them back once their delay has
/// passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Presentation alarms
    Presentation(presentation::AlarmMessage),
}

/// Failures reported to the operator
///
/// None of these end the presentation; they are shown as notices.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// Scanning could not start
    #[error(transparent)]
    Camera(#[from] camera::Error),
    /// The quiz list could not be loaded
    #[error("quiz list unavailable: {0}")]
    QuizList(#[from] api::Error),
    /// A quiz could not be started
    #[error(transparent)]
    Session(#[from] presentation::Error),
}
