// src/main.rs

use anyhow::Result;
use clap::Parser;
use gesture_nav::clock::SystemClock;
use gesture_nav::config::SensitivityPreset;
use gesture_nav::confirmation::ConfirmationEngine;
use gesture_nav::consumer::{BackgroundController, ScrollExecutor, SimulatedBrowser, TabEvent};
use gesture_nav::dispatch::{ActionDispatcher, MessageBus};
use gesture_nav::estimator::{LandmarkTrace, ReplayEstimator};
use gesture_nav::pipeline::{PipelineEvent, PipelineMetrics, RecognitionSession};
use gesture_nav::types::Config;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const BUS_CAPACITY: usize = 64;

#[derive(Parser, Debug)]
#[command(
    name = "gesture-nav",
    about = "Replay a recorded hand landmark trace against a simulated browser"
)]
struct Cli {
    /// YAML configuration file (defaults are used if it does not exist)
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Recorded landmark trace (YAML)
    #[arg(long)]
    trace: String,

    /// Sensitivity preset: veryStrict, strict, balanced, lenient, veryLenient
    #[arg(long)]
    preset: Option<SensitivityPreset>,

    /// URL to open in the simulated browser; repeat for more tabs
    #[arg(long = "tab")]
    tabs: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    if cli.preset.is_some() {
        config.preset = cli.preset;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gesture_nav={}", config.logging.level).into()),
        )
        .init();

    info!("🖐️  Gesture navigation starting");
    if Path::new(&cli.config).exists() {
        info!("✓ Configuration loaded from {}", cli.config);
    } else {
        warn!("{} not found, using defaults", cli.config);
    }
    config.warn_on_unreachable_settings();

    let settings = config.gesture_settings();
    info!(
        "Static: finger={:.3} direction={:.3} max_ext={} | Dynamic: movement={:.3} frames={}/{}",
        settings.static_gesture.finger_threshold,
        settings.static_gesture.direction_threshold,
        settings.static_gesture.max_extended_fingers,
        settings.dynamic_gesture.movement_threshold,
        settings.dynamic_gesture.min_consistent_frames,
        settings.dynamic_gesture.min_frames
    );

    let trace = LandmarkTrace::load(&cli.trace)?;
    if trace.is_empty() {
        warn!("Trace {} has no frames, nothing to do", cli.trace);
        return Ok(());
    }

    // ── Consumer side ────────────────────────────────────────────────────
    let metrics = PipelineMetrics::new();
    let urls: Vec<&str> = if cli.tabs.is_empty() {
        vec!["https://example.com", "https://news.example.com", "chrome://settings"]
    } else {
        cli.tabs.iter().map(String::as_str).collect()
    };
    let browser = SimulatedBrowser::with_urls(ScrollExecutor::new(&config.scroll), &urls);
    let (bus, inbox) = MessageBus::channel(BUS_CAPACITY);
    let controller = BackgroundController::new(browser.clone(), metrics.clone());
    let consumer = tokio::spawn(controller.run(inbox));
    info!("✓ Simulated browser ready ({} tabs)", urls.len());

    bus.reinitialize().await?;
    if let Some(tab_id) = browser.active_tab() {
        if let Some(event @ TabEvent::Activated { .. }) = browser.set_active(tab_id) {
            bus.notify_tab(event).await?;
        }
    }

    // ── Producer side ────────────────────────────────────────────────────
    let engine = ConfirmationEngine::new(settings, &config.timing, Arc::new(SystemClock::new()));
    let dispatcher = ActionDispatcher::new(bus.clone(), metrics.clone());
    let session = RecognitionSession::new(
        ReplayEstimator::new(trace),
        engine,
        dispatcher,
        config.timing.clone(),
        metrics.clone(),
    );

    let mut session = session.run().await;

    let events = session.drain_events();
    let failures = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                PipelineEvent::DeliveryFailed { .. } | PipelineEvent::PerceptionFailed { .. }
            )
        })
        .count();
    for event in &events {
        if let PipelineEvent::ActionDispatched {
            action,
            cycle,
            timestamp_ms,
        } = event
        {
            info!("   cycle {:>4} @ {:>6}ms → {}", cycle, timestamp_ms, action);
        }
    }
    info!("{} events retained, {} failures", events.len(), failures);

    drop(session);
    drop(bus);
    let controller = consumer.await?;

    info!("🧭 Final browser state:");
    for tab in controller.host().snapshot() {
        info!(
            "   {} tab {} [{}] {} scroll_y={} reloads={}",
            if tab.active { "▶" } else { " " },
            tab.id,
            tab.index,
            tab.url,
            browser.scroll_y(tab.id).unwrap_or(0),
            browser.reload_count(tab.id)
        );
    }
    info!(
        "{} install calls, registry holds {}",
        browser.install_count(),
        controller.registry().len()
    );

    Ok(())
}
