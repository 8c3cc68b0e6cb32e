// src/recognition/dynamic_classifier.rs

use super::types::{landmark, DynamicGesture};
use crate::types::{DynamicSettings, HandFrame};
use serde::Serialize;

/// Palm-centre displacement between two frames.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MotionDelta {
    pub dx: f32,
    pub dy: f32,
}

/// Movement of the wrist/middle-MCP midpoint from `previous` to `current`.
/// `None` unless both frames are complete.
pub fn motion_delta(current: &HandFrame, previous: &HandFrame) -> Option<MotionDelta> {
    if !current.is_complete() || !previous.is_complete() {
        return None;
    }

    let now = current
        .point(landmark::WRIST)
        .midpoint(current.point(landmark::MIDDLE_MCP));
    let before = previous
        .point(landmark::WRIST)
        .midpoint(previous.point(landmark::MIDDLE_MCP));

    Some(MotionDelta {
        dx: now.x - before.x,
        dy: now.y - before.y,
    })
}

/// Candidate swipe for one frame pair. Consistency over time is the
/// confirmation engine's job; this only looks at the pair.
pub fn classify_dynamic(
    current: Option<&HandFrame>,
    previous: Option<&HandFrame>,
    settings: &DynamicSettings,
) -> DynamicGesture {
    let delta = match (current, previous) {
        (Some(current), Some(previous)) => match motion_delta(current, previous) {
            Some(delta) => delta,
            None => return DynamicGesture::None,
        },
        _ => return DynamicGesture::None,
    };

    let threshold = settings.movement_threshold;
    if delta.dx.abs() < threshold && delta.dy.abs() < threshold {
        return DynamicGesture::None;
    }

    if delta.dx.abs() >= delta.dy.abs() {
        if delta.dx > threshold {
            DynamicGesture::SwipeRight
        } else if delta.dx < -threshold {
            DynamicGesture::SwipeLeft
        } else {
            DynamicGesture::None
        }
    } else if delta.dy > threshold {
        DynamicGesture::SwipeDown
    } else if delta.dy < -threshold {
        DynamicGesture::SwipeUp
    } else {
        DynamicGesture::None
    }
}
