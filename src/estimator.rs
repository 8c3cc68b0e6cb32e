// src/estimator.rs
//
// Pose estimator boundary. A real backend (camera + hand landmark model)
// plugs in behind `PoseEstimator`; the crate ships a replay backend that
// feeds recorded landmark traces.

use crate::types::{Point, LANDMARK_COUNT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

pub trait PoseEstimator: Send {
    /// Zero or more hands, each a list of landmarks in estimator space
    /// (`input_size()` pixels). May take arbitrarily long.
    fn estimate(&mut self) -> impl Future<Output = Result<Vec<Vec<Point>>>> + Send;

    /// Width and height of the estimator's coordinate space.
    fn input_size(&self) -> (f32, f32);

    /// Release backend resources. Called every few cycles and after errors.
    fn maintain(&mut self) {}

    /// A finite source (e.g. a replay) has nothing more to give.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Recorded landmarks: one entry per frame, `null` where no hand was seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkTrace {
    pub width: f32,
    pub height: f32,
    pub frames: Vec<Option<Vec<Point>>>,
}

impl LandmarkTrace {
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file: {}", path))?;
        let trace = Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse trace file: {}", path))?;
        info!(
            "📼 Loaded trace {} ({} frames, {}x{})",
            path,
            trace.frames.len(),
            trace.width,
            trace.height
        );
        Ok(trace)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let trace: LandmarkTrace = serde_yaml::from_str(contents)?;
        let short = trace
            .frames
            .iter()
            .flatten()
            .filter(|points| points.len() < LANDMARK_COUNT)
            .count();
        if short > 0 {
            warn!(
                "{} trace frames have fewer than {} landmarks and will be ignored",
                short, LANDMARK_COUNT
            );
        }
        Ok(trace)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

pub struct ReplayEstimator {
    trace: LandmarkTrace,
    cursor: usize,
    maintenance_runs: u64,
}

impl ReplayEstimator {
    pub fn new(trace: LandmarkTrace) -> Self {
        Self {
            trace,
            cursor: 0,
            maintenance_runs: 0,
        }
    }

    pub fn maintenance_runs(&self) -> u64 {
        self.maintenance_runs
    }
}

impl PoseEstimator for ReplayEstimator {
    async fn estimate(&mut self) -> Result<Vec<Vec<Point>>> {
        let hands = match self.trace.frames.get(self.cursor) {
            Some(Some(points)) => vec![points.clone()],
            Some(None) | None => Vec::new(),
        };
        self.cursor += 1;
        Ok(hands)
    }

    fn input_size(&self) -> (f32, f32) {
        (self.trace.width, self.trace.height)
    }

    fn maintain(&mut self) {
        self.maintenance_runs += 1;
        debug!("Replay estimator maintenance #{}", self.maintenance_runs);
    }

    fn is_finished(&self) -> bool {
        self.cursor >= self.trace.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r#"
width: 640
height: 480
frames:
  - null
  - [{x: 320, y: 240}, {x: 330, y: 250}]
"#;

    #[test]
    fn test_trace_parses_nulls_and_points() {
        let trace = LandmarkTrace::from_yaml(TRACE).unwrap();
        assert_eq!(trace.len(), 2);
        assert!(trace.frames[0].is_none());
        assert_eq!(trace.frames[1].as_ref().unwrap()[0], Point::new(320.0, 240.0));
    }

    #[test]
    fn test_bad_trace_fails() {
        assert!(LandmarkTrace::from_yaml("width: [1, 2]").is_err());
        assert!(LandmarkTrace::load("/nonexistent/trace.yaml").is_err());
    }

    #[tokio::test]
    async fn test_replay_walks_trace_then_finishes() {
        let mut estimator = ReplayEstimator::new(LandmarkTrace::from_yaml(TRACE).unwrap());
        assert_eq!(estimator.input_size(), (640.0, 480.0));

        assert!(estimator.estimate().await.unwrap().is_empty());
        assert!(!estimator.is_finished());

        let hands = estimator.estimate().await.unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].len(), 2);
        assert!(estimator.is_finished());

        estimator.maintain();
        assert_eq!(estimator.maintenance_runs(), 1);
    }
}
