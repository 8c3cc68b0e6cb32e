// src/types.rs

use serde::{Deserialize, Serialize};

/// Number of landmarks in one hand skeleton.
pub const LANDMARK_COUNT: usize = 21;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// When set, replaces the whole `gesture` block with a named preset.
    pub preset: Option<crate::config::SensitivityPreset>,
    pub gesture: GestureSettings,
    pub timing: TimingConfig,
    pub scroll: ScrollConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    #[serde(rename = "static")]
    pub static_gesture: StaticSettings,
    #[serde(rename = "dynamic")]
    pub dynamic_gesture: DynamicSettings,
    pub general: GeneralSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticSettings {
    /// Margin a fingertip must clear its PIP joint by to count as extended.
    pub finger_threshold: f32,
    /// Minimum wrist→middle-tip component for a RIGHT/DOWN direction.
    pub direction_threshold: f32,
    /// More extended fingers than this means an open hand (no gesture).
    pub max_extended_fingers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicSettings {
    /// Minimum palm-centre displacement between two frames.
    pub movement_threshold: f32,
    /// Size of the consistency window.
    pub min_frames: usize,
    /// Entries in the window that must agree with the current candidate.
    pub min_consistent_frames: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    pub history_length: usize,
    pub confidence_frames: usize,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            static_gesture: StaticSettings::default(),
            dynamic_gesture: DynamicSettings::default(),
            general: GeneralSettings::default(),
        }
    }
}

impl Default for StaticSettings {
    fn default() -> Self {
        Self {
            finger_threshold: 0.13,
            direction_threshold: 0.03,
            max_extended_fingers: 5,
        }
    }
}

impl Default for DynamicSettings {
    fn default() -> Self {
        Self {
            movement_threshold: 0.1,
            min_frames: 7,
            min_consistent_frames: 3,
        }
    }
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            history_length: 15,
            confidence_frames: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long a composite (static + swipe) key must persist before dispatch.
    pub hold_ms: u64,
    /// Quiet period after any dispatch.
    pub cooldown_ms: u64,
    pub estimator_timeout_ms: u64,
    /// Delay before the next cycle after an estimator timeout or error.
    pub error_backoff_ms: u64,
    /// Delay between successful cycles (frame-rate cap).
    pub frame_interval_ms: u64,
    /// Run estimator maintenance every this many cycles.
    pub maintenance_interval: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            hold_ms: 300,
            cooldown_ms: 1000,
            estimator_timeout_ms: 2000,
            error_backoff_ms: 1000,
            frame_interval_ms: 33,
            maintenance_interval: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    Auto,
    Smooth,
    #[default]
    Instant,
}

impl ScrollBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Smooth => "smooth",
            Self::Instant => "instant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Pixels per scroll action.
    pub distance: i64,
    pub behavior: ScrollBehavior,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            distance: 100,
            behavior: ScrollBehavior::Instant,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// One normalized landmark (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// A detected hand. Frames with fewer than [`LANDMARK_COUNT`] points are
/// carried as-is; the classifiers reject them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HandFrame {
    pub points: Vec<Point>,
}

impl HandFrame {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Scale estimator-space coordinates into the unit square.
    pub fn normalized(points: &[Point], width: f32, height: f32) -> Self {
        let width = if width > 0.0 { width } else { 1.0 };
        let height = if height > 0.0 { height } else { 1.0 };
        Self {
            points: points
                .iter()
                .map(|p| Point::new(p.x / width, p.y / height))
                .collect(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() >= LANDMARK_COUNT
    }

    /// Panics past the end; check [`HandFrame::is_complete`] first.
    pub(crate) fn point(&self, index: usize) -> Point {
        self.points[index]
    }
}
