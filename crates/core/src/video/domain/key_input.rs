use std::time::Duration;

use crate::shared::constants::{PAUSE_KEY, QUIT_KEY, SAVE_KEY};

/// Control events the frame loop reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Save,
    TogglePause,
}

impl KeyAction {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            QUIT_KEY => Some(Self::Quit),
            SAVE_KEY => Some(Self::Save),
            PAUSE_KEY => Some(Self::TogglePause),
            _ => None,
        }
    }

    /// Parses one line of typed input: a bound key or a spelled-out command.
    /// A line holding only spaces toggles pause.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        if !line.is_empty() && line.trim().is_empty() {
            return Some(Self::TogglePause);
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "quit" | "q" => Some(Self::Quit),
            "save" => Some(Self::Save),
            "pause" | "p" => Some(Self::TogglePause),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(key), None) => Self::from_key(key),
                    _ => None,
                }
            }
        }
    }
}

/// Non-blocking source of control events.
pub trait KeyInput: Send {
    /// Waits up to `timeout` for the next action.
    fn poll(&mut self, timeout: Duration) -> Option<KeyAction>;
}
