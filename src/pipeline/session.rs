// src/pipeline/session.rs
//
// The frame loop. Each cycle awaits the estimator (bounded by a timeout),
// feeds the engine, and hands confirmed actions to the dispatcher without
// waiting on delivery.
//
//   ok      → next cycle after frame_interval_ms
//   timeout → PerceptionFailed, next cycle after error_backoff_ms
//   error   → PerceptionFailed, maintain(), next cycle after error_backoff_ms

use super::event_bus::{EventBus, PipelineEvent};
use super::metrics::{MetricsSummary, PipelineMetrics};
use crate::confirmation::{Action, ConfirmationEngine};
use crate::dispatch::{ActionDispatcher, DeliveryError, Reply};
use crate::estimator::PoseEstimator;
use crate::types::{HandFrame, TimingConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const EVENT_BUS_CAPACITY: usize = 256;

type Delivery = JoinHandle<Result<Reply, DeliveryError>>;

/// Stops a running session from another task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    active: Arc<AtomicBool>,
}

impl SessionHandle {
    /// The in-flight estimator call finishes, its result is discarded and no
    /// further cycle runs.
    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            info!("🛑 Stop requested");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

pub struct RecognitionSession<E: PoseEstimator> {
    estimator: E,
    engine: ConfirmationEngine,
    dispatcher: ActionDispatcher,
    events: EventBus,
    metrics: PipelineMetrics,
    timing: TimingConfig,
    active: Arc<AtomicBool>,
    cycle: u64,
    in_flight: Vec<(Action, Delivery)>,
}

impl<E: PoseEstimator> RecognitionSession<E> {
    pub fn new(
        estimator: E,
        engine: ConfirmationEngine,
        dispatcher: ActionDispatcher,
        timing: TimingConfig,
        metrics: PipelineMetrics,
    ) -> Self {
        Self {
            estimator,
            engine,
            dispatcher,
            events: EventBus::new(EVENT_BUS_CAPACITY),
            metrics,
            timing,
            active: Arc::new(AtomicBool::new(true)),
            cycle: 0,
            in_flight: Vec::new(),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            active: Arc::clone(&self.active),
        }
    }

    pub fn engine(&self) -> &ConfirmationEngine {
        &self.engine
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        self.events.drain()
    }

    /// Run until stopped or the estimator runs dry. Returns the session so
    /// callers can inspect events and metrics.
    pub async fn run(mut self) -> Self {
        info!(
            "🎬 Recognition session started (timeout {}ms, backoff {}ms, interval {}ms)",
            self.timing.estimator_timeout_ms,
            self.timing.error_backoff_ms,
            self.timing.frame_interval_ms
        );

        while self.active.load(Ordering::SeqCst) {
            if self.estimator.is_finished() {
                info!("Estimator has no more frames");
                break;
            }

            let delay = self.step().await;
            if !self.active.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(delay).await;
        }

        self.finish().await;
        self
    }

    /// One cycle. Returns how long to wait before the next.
    async fn step(&mut self) -> Duration {
        self.cycle += 1;
        let cycle_start = Instant::now();
        self.metrics.inc(&self.metrics.total_cycles);
        self.collect_deliveries(false).await;

        let budget = Duration::from_millis(self.timing.estimator_timeout_ms);
        let estimate = tokio::time::timeout(budget, self.estimator.estimate()).await;

        if !self.active.load(Ordering::SeqCst) {
            debug!("Session stopped during cycle {}, discarding estimate", self.cycle);
            return Duration::ZERO;
        }

        let hands = match estimate {
            Ok(Ok(hands)) => hands,
            Ok(Err(e)) => {
                self.metrics.inc(&self.metrics.estimator_errors);
                warn!("⚠️  Estimator failed on cycle {}: {:#}", self.cycle, e);
                self.perception_failed(format!("{:#}", e));
                self.run_maintenance();
                return self.backoff();
            }
            Err(_) => {
                self.metrics.inc(&self.metrics.estimator_timeouts);
                warn!(
                    "⏱️  Estimator timed out after {}ms on cycle {}",
                    self.timing.estimator_timeout_ms, self.cycle
                );
                self.perception_failed("estimator timed out".to_string());
                return self.backoff();
            }
        };

        let (width, height) = self.estimator.input_size();
        let frame = hands
            .first()
            .map(|points| HandFrame::normalized(points, width, height));
        let report = self.engine.process(frame);

        if report.hand_detected {
            self.metrics.inc(&self.metrics.cycles_with_hand);
        }
        if report.cooldown_expired {
            self.events.publish(PipelineEvent::CooldownExpired {
                timestamp_ms: report.timestamp_ms,
            });
        }
        if let Some(action) = report.dispatched {
            let delivery = self.dispatcher.dispatch(action);
            self.in_flight.push((action, delivery));
            self.events.publish(PipelineEvent::ActionDispatched {
                action,
                cycle: report.cycle,
                timestamp_ms: report.timestamp_ms,
            });
            self.events.publish(PipelineEvent::CooldownStarted {
                action,
                expires_ms: report.timestamp_ms + self.timing.cooldown_ms,
            });
        }
        self.events.publish(PipelineEvent::CycleProcessed(report));

        let interval = self.timing.maintenance_interval;
        if interval > 0 && self.cycle % interval == 0 {
            self.run_maintenance();
        }

        self.metrics.set_timing(
            &self.metrics.cycle_time_us,
            cycle_start.elapsed().as_micros() as u64,
        );
        Duration::from_millis(self.timing.frame_interval_ms)
    }

    fn perception_failed(&mut self, reason: String) {
        self.events.publish(PipelineEvent::PerceptionFailed {
            cycle: self.cycle,
            reason,
        });
        // Timers still run while the estimator is down.
        if self.engine.poll_timers() {
            self.events.publish(PipelineEvent::CooldownExpired {
                timestamp_ms: self.engine.now_ms(),
            });
        }
    }

    fn backoff(&self) -> Duration {
        Duration::from_millis(self.timing.error_backoff_ms)
    }

    fn run_maintenance(&mut self) {
        self.estimator.maintain();
        self.metrics.inc(&self.metrics.maintenance_runs);
    }

    /// Record finished deliveries; with `wait` also wait for the rest.
    async fn collect_deliveries(&mut self, wait: bool) {
        let pending = std::mem::take(&mut self.in_flight);
        for (action, delivery) in pending {
            if !wait && !delivery.is_finished() {
                self.in_flight.push((action, delivery));
                continue;
            }
            let reason = match delivery.await {
                Ok(Ok(reply)) if reply.ok => None,
                Ok(Ok(reply)) => Some(reply.detail.unwrap_or_else(|| "refused".to_string())),
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => {
                    error!("Delivery task for {} panicked: {}", action, e);
                    Some(e.to_string())
                }
            };
            if let Some(reason) = reason {
                self.events
                    .publish(PipelineEvent::DeliveryFailed { action, reason });
            }
        }
    }

    async fn finish(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.collect_deliveries(true).await;
        self.engine.shutdown();

        let summary = self.metrics.summary();
        log_summary(&summary);
    }
}

fn log_summary(summary: &MetricsSummary) {
    info!("📊 Session finished");
    info!(
        "   cycles: {} ({} with hand, {:.1}/s)",
        summary.total_cycles, summary.cycles_with_hand, summary.cycles_per_sec
    );
    info!(
        "   estimator: {} timeouts, {} errors, {} maintenance runs",
        summary.estimator_timeouts, summary.estimator_errors, summary.maintenance_runs
    );
    info!(
        "   actions: {} dispatched, {} delivered, {} refused, {} delivery failures",
        summary.actions_dispatched,
        summary.actions_delivered,
        summary.actions_refused,
        summary.delivery_failures
    );
    info!(
        "   executors: {} installed, {} install failures",
        summary.executor_installs, summary.install_failures
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::consumer::{BackgroundController, ScrollExecutor, SimulatedBrowser};
    use crate::dispatch::MessageBus;
    use crate::recognition::fixtures::pointing;
    use crate::types::{
        DynamicSettings, GeneralSettings, GestureSettings, Point, ScrollConfig, StaticSettings,
    };
    use anyhow::bail;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU64;

    enum Step {
        Hand(Vec<Point>),
        Empty,
        Fail,
        /// Answer with a hand after this many milliseconds.
        Slow(u64, Vec<Point>),
    }

    struct ScriptedEstimator {
        steps: VecDeque<Step>,
        maintained: Arc<AtomicU64>,
    }

    impl ScriptedEstimator {
        fn new(steps: Vec<Step>) -> (Self, Arc<AtomicU64>) {
            let maintained = Arc::new(AtomicU64::new(0));
            (
                Self {
                    steps: steps.into(),
                    maintained: Arc::clone(&maintained),
                },
                maintained,
            )
        }
    }

    impl PoseEstimator for ScriptedEstimator {
        async fn estimate(&mut self) -> anyhow::Result<Vec<Vec<Point>>> {
            match self.steps.pop_front() {
                Some(Step::Hand(points)) => Ok(vec![points]),
                Some(Step::Empty) | None => Ok(Vec::new()),
                Some(Step::Fail) => bail!("backend lost"),
                Some(Step::Slow(ms, points)) => {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(vec![points])
                }
            }
        }

        fn input_size(&self) -> (f32, f32) {
            (1.0, 1.0)
        }

        fn maintain(&mut self) {
            self.maintained.fetch_add(1, Ordering::SeqCst);
        }

        fn is_finished(&self) -> bool {
            self.steps.is_empty()
        }
    }

    fn settings() -> GestureSettings {
        GestureSettings {
            static_gesture: StaticSettings {
                finger_threshold: 0.02,
                direction_threshold: 0.08,
                max_extended_fingers: 1,
            },
            dynamic_gesture: DynamicSettings {
                movement_threshold: 0.06,
                min_frames: 4,
                min_consistent_frames: 2,
            },
            general: GeneralSettings {
                history_length: 15,
                confidence_frames: 5,
            },
        }
    }

    struct Harness {
        session: RecognitionSession<ScriptedEstimator>,
        maintained: Arc<AtomicU64>,
        browser: SimulatedBrowser,
        metrics: PipelineMetrics,
    }

    fn harness(steps: Vec<Step>, timing: TimingConfig) -> Harness {
        let metrics = PipelineMetrics::new();
        let browser = SimulatedBrowser::with_urls(
            ScrollExecutor::new(&ScrollConfig::default()),
            &["https://a.test", "https://b.test", "https://c.test"],
        );
        let (bus, inbox) = MessageBus::channel(16);
        let controller = BackgroundController::new(browser.clone(), metrics.clone());
        tokio::spawn(controller.run(inbox));

        let engine = ConfirmationEngine::new(settings(), &timing, Arc::new(SystemClock::new()));
        let dispatcher = ActionDispatcher::new(bus, metrics.clone());
        let (estimator, maintained) = ScriptedEstimator::new(steps);
        Harness {
            session: RecognitionSession::new(estimator, engine, dispatcher, timing, metrics.clone()),
            maintained,
            browser,
            metrics,
        }
    }

    fn pointing_left() -> Vec<Point> {
        pointing(0.5, 0.5, -0.2, 0.0).points
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointing_left_switches_to_next_tab_once() {
        let steps = (0..6).map(|_| Step::Hand(pointing_left())).collect();
        let h = harness(steps, TimingConfig::default());

        let mut session = h.session.run().await;

        assert_eq!(h.metrics.get(&h.metrics.total_cycles), 6);
        assert_eq!(h.metrics.get(&h.metrics.cycles_with_hand), 6);
        assert_eq!(h.metrics.get(&h.metrics.actions_dispatched), 1);
        assert_eq!(h.metrics.get(&h.metrics.actions_delivered), 1);
        assert_eq!(h.browser.active_tab(), Some(2));

        let events = session.drain_events();
        let dispatched: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::ActionDispatched { action, cycle, .. } => Some((*cycle, *action)),
                _ => None,
            })
            .collect();
        assert_eq!(dispatched, vec![(1, Action::Right)]);
        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::CooldownStarted { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_backs_off_and_continues() {
        let steps = vec![Step::Slow(10_000, pointing_left()), Step::Empty];
        let h = harness(steps, TimingConfig::default());

        let start = tokio::time::Instant::now();
        let mut session = h.session.run().await;
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(2000 + 1000));
        assert!(elapsed < Duration::from_millis(10_000));
        assert_eq!(h.metrics.get(&h.metrics.estimator_timeouts), 1);
        assert_eq!(h.metrics.get(&h.metrics.total_cycles), 2);
        assert_eq!(h.metrics.get(&h.metrics.actions_dispatched), 0);

        let events = session.drain_events();
        assert!(matches!(
            events[0],
            PipelineEvent::PerceptionFailed { cycle: 1, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_estimator_error_runs_maintenance() {
        let steps = vec![Step::Fail, Step::Empty, Step::Empty];
        let h = harness(steps, TimingConfig::default());

        let session = h.session.run().await;

        assert_eq!(h.metrics.get(&h.metrics.estimator_errors), 1);
        assert_eq!(h.maintained.load(Ordering::SeqCst), 1);
        assert_eq!(session.engine().history().frame_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_maintenance() {
        let timing = TimingConfig {
            maintenance_interval: 2,
            ..TimingConfig::default()
        };
        let steps = (0..5).map(|_| Step::Empty).collect();
        let h = harness(steps, timing);

        h.session.run().await;

        assert_eq!(h.maintained.load(Ordering::SeqCst), 2);
        assert_eq!(h.metrics.get(&h.metrics.maintenance_runs), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_result() {
        let steps = vec![Step::Slow(500, pointing_left()), Step::Hand(pointing_left())];
        let h = harness(steps, TimingConfig::default());

        let handle = h.session.handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.stop();
        });

        let mut session = h.session.run().await;

        assert_eq!(h.metrics.get(&h.metrics.total_cycles), 1);
        assert_eq!(h.metrics.get(&h.metrics.cycles_with_hand), 0);
        assert_eq!(h.metrics.get(&h.metrics.actions_dispatched), 0);
        assert!(session.drain_events().is_empty());
        assert_eq!(session.engine().pending_timers(), 0);
        assert!(!session.handle().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_before_start_runs_nothing() {
        let h = harness(vec![Step::Hand(pointing_left())], TimingConfig::default());
        h.session.handle().stop();

        let session = h.session.run().await;
        assert_eq!(h.metrics.get(&h.metrics.total_cycles), 0);
        assert!(!session.estimator().is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_consumer_reports_delivery_failure() {
        let timing = TimingConfig::default();
        let metrics = PipelineMetrics::new();
        let (bus, inbox) = MessageBus::channel(4);
        drop(inbox);

        let engine = ConfirmationEngine::new(settings(), &timing, Arc::new(SystemClock::new()));
        let (estimator, _) = ScriptedEstimator::new(vec![Step::Hand(pointing_left())]);
        let session = RecognitionSession::new(
            estimator,
            engine,
            ActionDispatcher::new(bus, metrics.clone()),
            timing,
            metrics.clone(),
        );

        let mut session = session.run().await;

        assert_eq!(metrics.get(&metrics.delivery_failures), 1);
        assert!(session
            .drain_events()
            .iter()
            .any(|e| matches!(e, PipelineEvent::DeliveryFailed { action: Action::Right, .. })));
    }
}
