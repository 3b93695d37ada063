//! Configuration constants for the pubquiz presentation core
//!
//! This module contains the fixed limits used throughout the crate so that
//! slot counts, answer counts and timer bounds stay consistent between the
//! quiz model, the marker pipeline and the presentation state machine.

/// Participant slot constants
pub mod slots {
    /// Number of participant slots (and whitelisted marker identities)
    pub const SLOT_COUNT: usize = 4;
    /// Marker identities assigned to slots 0..=3 when no configuration is given
    pub const DEFAULT_MARKERS: [u32; SLOT_COUNT] = [1, 2, 3, 4];
}

/// Question content constants
pub mod question {
    /// Minimum number of answer options in a question
    pub const MIN_ANSWER_COUNT: usize = 2;
    /// Maximum number of answer options in a question (one per marker rotation)
    pub const MAX_ANSWER_COUNT: usize = 4;
    /// Maximum length of a question text in characters
    pub const MAX_TEXT_LENGTH: usize = 500;
    /// Maximum length of a single answer option in characters
    pub const MAX_ANSWER_LENGTH: usize = 200;
}

/// Quiz constants
pub mod quiz {
    /// Maximum length of a quiz name in characters
    pub const MAX_NAME_LENGTH: usize = 200;
}

/// Countdown constants
pub mod countdown {
    /// Minimum per-question countdown in seconds
    pub const MIN_SECONDS: u64 = 1;
    /// Maximum per-question countdown in seconds
    pub const MAX_SECONDS: u64 = 300;
    /// Per-question countdown used when none is configured
    pub const DEFAULT_SECONDS: u64 = 30;
}
