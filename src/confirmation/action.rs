// src/confirmation/action.rs

use crate::recognition::{DynamicGesture, StaticGesture};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete effect requested from the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    ScrollUp,
    ScrollDown,
    /// Previous tab.
    Left,
    /// Next tab.
    Right,
    /// Reload the active tab.
    Stop,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Self::ScrollUp,
        Self::ScrollDown,
        Self::Left,
        Self::Right,
        Self::Stop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScrollUp => "scroll-up",
            Self::ScrollDown => "scroll-down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Stop => "stop",
        }
    }

    /// Keyboard command names bound to actions.
    pub fn from_command(command: &str) -> Option<Action> {
        match command {
            "scroll-up" => Some(Self::ScrollUp),
            "scroll-down" => Some(Self::ScrollDown),
            "tab-left" => Some(Self::Left),
            "tab-right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a cycle's labels to an action. A confirmed swipe wins over the static
/// pose. Horizontal mappings are mirrored: a leftward point or swipe means
/// "next tab".
pub fn resolve_action(static_gesture: StaticGesture, confirmed: DynamicGesture) -> Option<Action> {
    match confirmed {
        DynamicGesture::SwipeUp => return Some(Action::ScrollUp),
        DynamicGesture::SwipeDown => return Some(Action::ScrollDown),
        DynamicGesture::SwipeLeft => return Some(Action::Right),
        DynamicGesture::SwipeRight => return Some(Action::Left),
        DynamicGesture::None => {}
    }

    match static_gesture {
        StaticGesture::Up => Some(Action::ScrollUp),
        StaticGesture::Down => Some(Action::ScrollDown),
        StaticGesture::Left => Some(Action::Right),
        StaticGesture::Right => Some(Action::Left),
        StaticGesture::Stop => Some(Action::Stop),
        StaticGesture::None => None,
    }
}

/// Static + dynamic pair that must persist for the hold duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CompositeKey {
    pub static_gesture: StaticGesture,
    pub dynamic_gesture: DynamicGesture,
}

impl CompositeKey {
    pub fn new(static_gesture: StaticGesture, dynamic_gesture: DynamicGesture) -> Self {
        Self {
            static_gesture,
            dynamic_gesture,
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.static_gesture, self.dynamic_gesture)
    }
}
