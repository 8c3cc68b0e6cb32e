// src/pipeline/mod.rs

pub mod event_bus;
pub mod frame_context;
pub mod metrics;
pub mod session;

pub use event_bus::{EventBus, PipelineEvent};
pub use frame_context::CycleReport;
pub use metrics::{MetricsSummary, PipelineMetrics};
pub use session::{RecognitionSession, SessionHandle};
