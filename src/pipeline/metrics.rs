// src/pipeline/metrics.rs
//
// Counters shared by the frame loop, the dispatcher tasks and the consumer.
// Clones share the same atomics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_cycles: Arc<AtomicU64>,
    pub cycles_with_hand: Arc<AtomicU64>,
    pub estimator_timeouts: Arc<AtomicU64>,
    pub estimator_errors: Arc<AtomicU64>,
    pub maintenance_runs: Arc<AtomicU64>,
    pub actions_dispatched: Arc<AtomicU64>,
    pub actions_delivered: Arc<AtomicU64>,
    pub actions_refused: Arc<AtomicU64>,
    pub delivery_failures: Arc<AtomicU64>,
    pub executor_installs: Arc<AtomicU64>,
    pub install_failures: Arc<AtomicU64>,
    pub cycle_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_cycles: Arc::new(AtomicU64::new(0)),
            cycles_with_hand: Arc::new(AtomicU64::new(0)),
            estimator_timeouts: Arc::new(AtomicU64::new(0)),
            estimator_errors: Arc::new(AtomicU64::new(0)),
            maintenance_runs: Arc::new(AtomicU64::new(0)),
            actions_dispatched: Arc::new(AtomicU64::new(0)),
            actions_delivered: Arc::new(AtomicU64::new(0)),
            actions_refused: Arc::new(AtomicU64::new(0)),
            delivery_failures: Arc::new(AtomicU64::new(0)),
            executor_installs: Arc::new(AtomicU64::new(0)),
            install_failures: Arc::new(AtomicU64::new(0)),
            cycle_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    pub fn set_timing(&self, counter: &AtomicU64, duration_us: u64) {
        counter.store(duration_us, Ordering::Relaxed);
    }

    pub fn cycles_per_sec(&self) -> f64 {
        let cycles = self.total_cycles.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            cycles as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_cycles: self.get(&self.total_cycles),
            cycles_per_sec: self.cycles_per_sec(),
            cycles_with_hand: self.get(&self.cycles_with_hand),
            estimator_timeouts: self.get(&self.estimator_timeouts),
            estimator_errors: self.get(&self.estimator_errors),
            maintenance_runs: self.get(&self.maintenance_runs),
            actions_dispatched: self.get(&self.actions_dispatched),
            actions_delivered: self.get(&self.actions_delivered),
            actions_refused: self.get(&self.actions_refused),
            delivery_failures: self.get(&self.delivery_failures),
            executor_installs: self.get(&self.executor_installs),
            install_failures: self.get(&self.install_failures),
            last_cycle_us: self.get(&self.cycle_time_us),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_cycles: u64,
    pub cycles_per_sec: f64,
    pub cycles_with_hand: u64,
    pub estimator_timeouts: u64,
    pub estimator_errors: u64,
    pub maintenance_runs: u64,
    pub actions_dispatched: u64,
    pub actions_delivered: u64,
    pub actions_refused: u64,
    pub delivery_failures: u64,
    pub executor_installs: u64,
    pub install_failures: u64,
    pub last_cycle_us: u64,
    pub elapsed_secs: f64,
}
