// src/pipeline/event_bus.rs
//
// Decoupled event system. The session publishes what happened each cycle;
// overlays and logs drain it instead of reaching into engine state.

use super::frame_context::CycleReport;
use crate::confirmation::Action;
use std::collections::VecDeque;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    CycleProcessed(CycleReport),

    ActionDispatched {
        action: Action,
        cycle: u64,
        timestamp_ms: u64,
    },

    DeliveryFailed {
        action: Action,
        reason: String,
    },

    CooldownStarted {
        action: Action,
        expires_ms: u64,
    },

    CooldownExpired {
        timestamp_ms: u64,
    },

    PerceptionFailed {
        cycle: u64,
        reason: String,
    },
}

pub struct EventBus {
    events: VecDeque<PipelineEvent>,
    max_pending: usize,
    dropped: u64,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        let max_pending = max_pending.max(1);
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
            dropped: 0,
        }
    }

    pub fn publish(&mut self, event: PipelineEvent) {
        if self.events.len() >= self.max_pending {
            if self.dropped == 0 {
                warn!(
                    "Event bus full ({} events), dropping oldest",
                    self.max_pending
                );
            } else {
                debug!("Event bus dropped {} events", self.dropped + 1);
            }
            self.dropped += 1;
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}
