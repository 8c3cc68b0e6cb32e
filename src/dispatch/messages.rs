// src/dispatch/messages.rs
//
// Wire shapes. Everything crossing a context boundary is plain serde data so
// the same types work over an in-process channel or a JSON transport.

use crate::confirmation::Action;
use serde::{Deserialize, Serialize};

/// Messages accepted by the consumer context.
///
/// Gesture payload on the wire: `{"type":"gesture","gesture":"scroll-up"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Gesture { gesture: Action },
    /// Keyboard shortcut by name (`scroll-up`, `tab-left`, ...).
    Command { command: String },
}

impl InboundMessage {
    pub fn gesture(action: Action) -> Self {
        Self::Gesture { gesture: action }
    }
}

/// Consumer's answer to an [`InboundMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            ok: true,
            detail: None,
        }
    }

    pub fn ok_with(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: Some(detail.into()),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollDirection {
    ScrollUp,
    ScrollDown,
}

/// Message understood by an installed executor: `{"action":"scroll-up"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorRequest {
    pub action: ScrollDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorStatus {
    pub ok: bool,
    pub scroll_y: i64,
}
