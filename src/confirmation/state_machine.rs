// src/confirmation/state_machine.rs
//
// Turns flickering per-frame labels into single dispatches.
//
//   Idle ──static action──────────────→ dispatch → CoolingDown
//   Idle ──confirmed swipe→ Holding(key) ──held ≥ hold_ms──→ dispatch → CoolingDown
//   CoolingDown ──expiry──→ clear swipe window → Idle
//
// A cycle with nothing to do (including a cycle with no hand) drops the hold
// and forgets the last dispatched action, so the same gesture can fire again
// once the hand has relaxed.

use super::action::{resolve_action, Action, CompositeKey};
use crate::clock::{Clock, TimerId, TimerQueue};
use crate::pipeline::CycleReport;
use crate::recognition::{
    classify_dynamic, classify_static, motion_delta, DynamicGesture, GestureHistory,
    StaticGesture,
};
use crate::types::{GestureSettings, HandFrame, TimingConfig};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineState {
    Idle,
    Holding {
        key: CompositeKey,
        started_ms: u64,
        progress: f32,
    },
    CoolingDown {
        expires_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineTimer {
    HoldElapsed,
    CooldownExpired,
}

#[derive(Debug, Clone, Copy)]
struct HoldState {
    key: CompositeKey,
    started_ms: u64,
    progress: f32,
    timer: TimerId,
}

#[derive(Debug, Clone, Copy)]
struct Cooldown {
    expires_ms: u64,
    timer: TimerId,
}

pub struct ConfirmationEngine {
    settings: GestureSettings,
    hold_ms: u64,
    cooldown_ms: u64,
    clock: Arc<dyn Clock>,
    history: GestureHistory,
    timers: TimerQueue<EngineTimer>,
    hold: Option<HoldState>,
    cooldown: Option<Cooldown>,
    last_dispatched: Option<Action>,
    cycle: u64,
}

impl ConfirmationEngine {
    pub fn new(settings: GestureSettings, timing: &TimingConfig, clock: Arc<dyn Clock>) -> Self {
        let history = GestureHistory::new(settings.general.history_length);
        Self {
            settings,
            hold_ms: timing.hold_ms,
            cooldown_ms: timing.cooldown_ms,
            clock,
            history,
            timers: TimerQueue::new(),
            hold: None,
            cooldown: None,
            last_dispatched: None,
            cycle: 0,
        }
    }

    /// Run one recognition cycle. `None` (or an incomplete frame) means no
    /// hand was detected; such a cycle never dispatches.
    pub fn process(&mut self, frame: Option<HandFrame>) -> CycleReport {
        let now = self.clock.now_ms();
        self.cycle += 1;
        let cooldown_expired = self.fire_due_timers(now);

        let frame = frame.filter(|f| f.is_complete());
        let hand_detected = frame.is_some();

        self.history.push_frame(frame);
        let (static_gesture, potential, motion) = if hand_detected {
            let current = self.history.latest_frame();
            let previous = self.history.previous_frame();
            let motion = match (current, previous) {
                (Some(c), Some(p)) => motion_delta(c, p),
                _ => None,
            };
            (
                classify_static(current, &self.settings.static_gesture),
                classify_dynamic(current, previous, &self.settings.dynamic_gesture),
                motion,
            )
        } else {
            (StaticGesture::None, DynamicGesture::None, None)
        };

        self.history.push_static(static_gesture);
        self.history.push_dynamic(potential);

        let confirmed = self.confirm_dynamic(potential);
        let confidence = self.confidence(static_gesture);
        let resolved = resolve_action(static_gesture, confirmed);

        let dispatched = match resolved {
            None => {
                self.go_idle();
                None
            }
            Some(action) if confirmed.is_none() => self.dispatch_static(action, now),
            Some(action) => {
                let key = CompositeKey::new(static_gesture, confirmed);
                self.dispatch_held(action, key, now)
            }
        };

        debug!(
            "cycle {}: static={} dynamic={} confirmed={} action={:?} conf={:.2}",
            self.cycle, static_gesture, potential, confirmed, resolved, confidence
        );

        CycleReport {
            cycle: self.cycle,
            timestamp_ms: now,
            hand_detected,
            static_gesture,
            potential_dynamic: potential,
            confirmed_dynamic: confirmed,
            motion,
            movement_threshold: self.settings.dynamic_gesture.movement_threshold,
            recent_dynamic: self
                .history
                .recent_dynamic(self.settings.dynamic_gesture.min_frames),
            confidence,
            resolved_action: resolved,
            hold_progress: self.hold_progress(),
            dispatched,
            cooldown_active: self.cooldown.is_some(),
            cooldown_expired,
        }
    }

    /// Fire timers that are due without running a cycle. Returns true if the
    /// cooldown expired.
    pub fn poll_timers(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.fire_due_timers(now)
    }

    pub fn state(&self) -> EngineState {
        if let Some(cooldown) = self.cooldown {
            return EngineState::CoolingDown {
                expires_ms: cooldown.expires_ms,
            };
        }
        match self.hold {
            Some(hold) => EngineState::Holding {
                key: hold.key,
                started_ms: hold.started_ms,
                progress: hold.progress,
            },
            None => EngineState::Idle,
        }
    }

    pub fn hold_progress(&self) -> f32 {
        self.hold.map(|h| h.progress).unwrap_or(0.0)
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown.is_some()
    }

    pub fn history(&self) -> &GestureHistory {
        &self.history
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Session teardown: cancel every timer and forget all state.
    pub fn shutdown(&mut self) {
        self.timers.cancel_all();
        self.history.clear();
        self.hold = None;
        self.cooldown = None;
        self.last_dispatched = None;
        debug!("Confirmation engine shut down after {} cycles", self.cycle);
    }

    fn confirm_dynamic(&self, potential: DynamicGesture) -> DynamicGesture {
        if self.cooldown.is_some() || potential.is_none() {
            return DynamicGesture::None;
        }

        let dynamic = &self.settings.dynamic_gesture;
        let window = self.history.recent_dynamic(dynamic.min_frames);
        if window.len() < dynamic.min_frames {
            return DynamicGesture::None;
        }

        let consistent = window.iter().filter(|&&g| g == potential).count();
        if consistent >= dynamic.min_consistent_frames {
            potential
        } else {
            DynamicGesture::None
        }
    }

    fn confidence(&self, current: StaticGesture) -> f32 {
        let recent = self
            .history
            .recent_static(self.settings.general.confidence_frames);
        if recent.is_empty() {
            return 0.0;
        }
        let matching = recent.iter().filter(|&&g| g == current).count();
        matching as f32 / recent.len() as f32
    }

    fn go_idle(&mut self) {
        self.clear_hold();
        self.last_dispatched = None;
    }

    fn dispatch_static(&mut self, action: Action, now: u64) -> Option<Action> {
        self.clear_hold();

        if self.cooldown.is_some() || self.last_dispatched == Some(action) {
            return None;
        }

        info!("✋ Static gesture confirmed → {}", action);
        self.commit(action, now);
        Some(action)
    }

    fn dispatch_held(&mut self, action: Action, key: CompositeKey, now: u64) -> Option<Action> {
        let hold = match self.hold {
            Some(hold) if hold.key == key => hold,
            _ => {
                self.clear_hold();
                let timer = self
                    .timers
                    .schedule(now + self.hold_ms, EngineTimer::HoldElapsed);
                debug!("Hold started for {}", key);
                let hold = HoldState {
                    key,
                    started_ms: now,
                    progress: 0.0,
                    timer,
                };
                self.hold = Some(hold);
                hold
            }
        };

        let elapsed = now.saturating_sub(hold.started_ms);
        let progress = if self.hold_ms == 0 {
            1.0
        } else {
            (elapsed as f32 / self.hold_ms as f32).min(1.0)
        };
        if let Some(h) = self.hold.as_mut() {
            h.progress = progress;
        }

        if elapsed < self.hold_ms
            || self.last_dispatched == Some(action)
            || self.cooldown.is_some()
        {
            return None;
        }

        info!("👋 {} held for {}ms → {}", key, elapsed, action);
        self.clear_hold();
        self.commit(action, now);
        Some(action)
    }

    fn commit(&mut self, action: Action, now: u64) {
        self.last_dispatched = Some(action);
        if let Some(previous) = self.cooldown.take() {
            self.timers.cancel(previous.timer);
        }
        let expires_ms = now + self.cooldown_ms;
        let timer = self
            .timers
            .schedule(expires_ms, EngineTimer::CooldownExpired);
        self.cooldown = Some(Cooldown { expires_ms, timer });
    }

    fn clear_hold(&mut self) {
        if let Some(hold) = self.hold.take() {
            self.timers.cancel(hold.timer);
        }
    }

    fn fire_due_timers(&mut self, now: u64) -> bool {
        let mut cooldown_expired = false;
        for timer in self.timers.take_due(now) {
            match timer {
                EngineTimer::HoldElapsed => {
                    if let Some(hold) = self.hold.as_mut() {
                        hold.progress = 1.0;
                    }
                }
                EngineTimer::CooldownExpired => {
                    self.cooldown = None;
                    self.history.clear_dynamic();
                    self.clear_hold();
                    cooldown_expired = true;
                    debug!("Cooldown expired, swipe window cleared");
                }
            }
        }
        cooldown_expired
    }
}
