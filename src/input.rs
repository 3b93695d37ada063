//! Keyboard shortcuts of the presenter view

use serde::{Deserialize, Serialize};

/// A key as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// Right arrow
    ArrowRight,
    /// Space bar
    Space,
    /// Escape
    Escape,
    /// A printable character
    Char(char),
}

/// A key press together with where focus was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// The pressed key
    pub key: Key,
    /// Whether focus was on a button, input or other control that uses the
    /// key itself
    #[serde(default)]
    pub interactive_target: bool,
}

impl KeyEvent {
    /// A key press with focus on the page itself
    pub fn new(key: Key) -> Self {
        Self {
            key,
            interactive_target: false,
        }
    }

    /// A key press with focus on a control
    pub fn on_control(key: Key) -> Self {
        Self {
            key,
            interactive_target: true,
        }
    }
}

impl From<Key> for KeyEvent {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}

/// Action requested by a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Command {
    /// Go to the next question
    Advance,
    /// Show or hide the correct answer
    ToggleReveal,
    /// Enter or leave fullscreen
    ToggleFullscreen,
    /// Leave fullscreen
    ExitFullscreen,
    /// Start or stop scanning
    ToggleCamera,
}

/// Maps a key press to a command
///
/// Shortcuts only apply while presenting. Space is left to focused
/// controls, and Escape only matters in fullscreen.
pub fn command(event: KeyEvent, presenting: bool, fullscreen: bool) -> Option<Command> {
    if !presenting {
        return None;
    }

    match event.key {
        Key::ArrowRight => Some(Command::Advance),
        Key::Space if event.interactive_target => None,
        Key::Space | Key::Char('r' | 'R') => Some(Command::ToggleReveal),
        Key::Char('f' | 'F') => Some(Command::ToggleFullscreen),
        Key::Char('c' | 'C') => Some(Command::ToggleCamera),
        Key::Escape if fullscreen => Some(Command::ExitFullscreen),
        Key::Escape | Key::Char(_) => None,
    }
}
