// src/clock.rs
//
// Monotonic time source and a cancelable timer queue. The confirmation
// engine only ever reads time through `Clock`, so tests drive it with a
// `ManualClock` instead of sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by tokio's `Instant`, so paused-time tests see
/// virtual time too.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: tokio::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ============================================================================
// TIMER QUEUE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct PendingTimer<T> {
    id: TimerId,
    deadline_ms: u64,
    payload: T,
}

/// Deadline-ordered timers polled against a [`Clock`] reading.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, deadline_ms: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingTimer {
            id,
            deadline_ms,
            payload,
        });
        id
    }

    /// Returns false if the timer already fired or was canceled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return every timer whose deadline has passed, earliest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<T> {
        let mut due: Vec<PendingTimer<T>> = Vec::new();
        let mut remaining = Vec::with_capacity(self.pending.len());
        for timer in self.pending.drain(..) {
            if timer.deadline_ms <= now_ms {
                due.push(timer);
            } else {
                remaining.push(timer);
            }
        }
        self.pending = remaining;

        due.sort_by_key(|t| (t.deadline_ms, t.id.0));
        due.into_iter().map(|t| t.payload).collect()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|t| t.deadline_ms).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(250);
        assert_eq!(other.now_ms(), 250);
        other.set(1000);
        assert_eq!(clock.now_ms(), 1000);
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(300, "late");
        timers.schedule(100, "early");
        timers.schedule(900, "future");

        assert!(timers.take_due(50).is_empty());
        assert_eq!(timers.take_due(300), vec!["early", "late"]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(900));
    }

    #[test]
    fn test_canceled_timer_never_fires() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(100, 1);
        timers.schedule(200, 2);

        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert_eq!(timers.take_due(500), vec![2]);
    }

    #[test]
    fn test_cancel_all_clears_pending() {
        let mut timers = TimerQueue::new();
        timers.schedule(10, ());
        timers.schedule(20, ());
        timers.cancel_all();
        assert!(timers.is_empty());
        assert!(timers.take_due(u64::MAX).is_empty());
    }
}
