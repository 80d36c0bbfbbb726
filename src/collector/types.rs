//! Interaction events dispatched by the host.
//!
//! Keystrokes carry a timestamp and nothing else: there is no field that
//! could hold a key value, so no caller can leak one into the payload.

use serde::{Deserialize, Serialize};

/// Mouse button, following the DOM `MouseEvent.button` numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Other(u8),
}

impl MouseButton {
    pub fn from_dom(button: u8) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            other => MouseButton::Other(other),
        }
    }
}

/// One host-dispatched interaction. `at_ms` is page-relative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InteractionEvent {
    PointerMove { x: f64, y: f64, at_ms: u64 },
    /// Scroll position after the scroll
    Scroll { x: f64, y: f64, at_ms: u64 },
    Click {
        x: f64,
        y: f64,
        button: MouseButton,
        at_ms: u64,
    },
    Keystroke { at_ms: u64 },
}

impl InteractionEvent {
    pub fn pointer_move(x: f64, y: f64, at_ms: u64) -> Self {
        InteractionEvent::PointerMove { x, y, at_ms }
    }

    pub fn scroll(x: f64, y: f64, at_ms: u64) -> Self {
        InteractionEvent::Scroll { x, y, at_ms }
    }

    pub fn click(x: f64, y: f64, button: MouseButton, at_ms: u64) -> Self {
        InteractionEvent::Click {
            x,
            y,
            button,
            at_ms,
        }
    }

    /// A key press. Only the time is kept.
    pub fn keystroke(at_ms: u64) -> Self {
        InteractionEvent::Keystroke { at_ms }
    }

    pub fn at_ms(&self) -> u64 {
        match *self {
            InteractionEvent::PointerMove { at_ms, .. }
            | InteractionEvent::Scroll { at_ms, .. }
            | InteractionEvent::Click { at_ms, .. }
            | InteractionEvent::Keystroke { at_ms } => at_ms,
        }
    }
}
