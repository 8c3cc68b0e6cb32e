// src/recognition/history.rs

use super::types::{DynamicGesture, StaticGesture};
use crate::types::HandFrame;
use std::collections::VecDeque;

/// Bounded FIFO history of recent frames and labels.
///
/// The three queues share one capacity and are appended once per cycle. A
/// cycle without a hand records `None` in the frame queue, so the frame
/// before a gap is never compared against the frame after it. Cooldown
/// expiry clears only the dynamic labels.
pub struct GestureHistory {
    frames: VecDeque<Option<HandFrame>>,
    static_labels: VecDeque<StaticGesture>,
    dynamic_labels: VecDeque<DynamicGesture>,
    capacity: usize,
}

impl GestureHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            static_labels: VecDeque::with_capacity(capacity),
            dynamic_labels: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push_frame(&mut self, frame: Option<HandFrame>) {
        push_bounded(&mut self.frames, frame, self.capacity);
    }

    pub fn push_static(&mut self, gesture: StaticGesture) {
        push_bounded(&mut self.static_labels, gesture, self.capacity);
    }

    pub fn push_dynamic(&mut self, gesture: DynamicGesture) {
        push_bounded(&mut self.dynamic_labels, gesture, self.capacity);
    }

    /// Up to `count` most recent static labels, oldest first.
    pub fn recent_static(&self, count: usize) -> Vec<StaticGesture> {
        tail(&self.static_labels, count)
    }

    /// Up to `count` most recent dynamic labels, oldest first.
    pub fn recent_dynamic(&self, count: usize) -> Vec<DynamicGesture> {
        tail(&self.dynamic_labels, count)
    }

    /// The frame of the cycle before the newest one, if that cycle had a hand.
    pub fn previous_frame(&self) -> Option<&HandFrame> {
        let len = self.frames.len();
        if len < 2 {
            return None;
        }
        self.frames.get(len - 2).and_then(Option::as_ref)
    }

    pub fn latest_frame(&self) -> Option<&HandFrame> {
        self.frames.back().and_then(Option::as_ref)
    }

    /// Drop the dynamic window so stale samples cannot re-trigger.
    pub fn clear_dynamic(&mut self) {
        self.dynamic_labels.clear();
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.static_labels.clear();
        self.dynamic_labels.clear();
    }

    /// Cycles recorded in the frame queue, with or without a hand.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamic_labels.len()
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, capacity: usize) {
    if capacity == 0 {
        return;
    }
    queue.push_back(item);
    while queue.len() > capacity {
        queue.pop_front();
    }
}

fn tail<T: Copy>(queue: &VecDeque<T>, count: usize) -> Vec<T> {
    let skip = queue.len().saturating_sub(count);
    queue.iter().skip(skip).copied().collect()
}
