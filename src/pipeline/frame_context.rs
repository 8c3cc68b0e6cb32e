// src/pipeline/frame_context.rs
//
// Everything the engine decided about one cycle, in one place. The session
// publishes it; overlays and logs read from it instead of poking at engine
// internals.

use crate::confirmation::Action;
use crate::recognition::{DynamicGesture, MotionDelta, StaticGesture};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub timestamp_ms: u64,
    pub hand_detected: bool,

    // Classification
    pub static_gesture: StaticGesture,
    pub potential_dynamic: DynamicGesture,
    pub confirmed_dynamic: DynamicGesture,
    pub motion: Option<MotionDelta>,
    pub movement_threshold: f32,
    pub recent_dynamic: Vec<DynamicGesture>,
    /// Share of recent static labels equal to this cycle's. Diagnostic only.
    pub confidence: f32,

    // Confirmation
    pub resolved_action: Option<Action>,
    pub hold_progress: f32,
    pub dispatched: Option<Action>,
    pub cooldown_active: bool,
    pub cooldown_expired: bool,
}
