// src/recognition/mod.rs
//
// Per-frame gesture classification.
//
//   HandFrame ──→ static_classifier  ──→ StaticGesture ──┐
//   (current, previous) → dynamic_classifier → DynamicGesture ┴→ GestureHistory

mod dynamic_classifier;
mod history;
mod static_classifier;
mod types;

pub use dynamic_classifier::{classify_dynamic, motion_delta, MotionDelta};
pub use history::GestureHistory;
pub use static_classifier::classify_static;
pub use types::*;

#[cfg(test)]
pub(crate) use static_classifier::fixtures;
