// src/config.rs

use crate::types::{
    Config, DynamicSettings, GeneralSettings, GestureSettings, ScrollBehavior, ScrollConfig,
    StaticSettings,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;
use tracing::{info, warn};

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path))?;
        Ok(config)
    }

    /// Settings in effect for a recognition session.
    pub fn gesture_settings(&self) -> GestureSettings {
        match self.preset {
            Some(preset) => {
                info!("Using sensitivity preset '{}'", preset.as_str());
                preset.settings()
            }
            None => self.gesture.clone(),
        }
    }

    /// Values are not range-checked, but a few combinations can never
    /// confirm a swipe.
    pub fn unreachable_settings(&self) -> Vec<String> {
        let settings = match self.preset {
            Some(preset) => preset.settings(),
            None => self.gesture.clone(),
        };
        let dynamic = &settings.dynamic_gesture;
        let mut problems = Vec::new();
        if dynamic.min_consistent_frames > dynamic.min_frames {
            problems.push(format!(
                "min_consistent_frames ({}) exceeds min_frames ({})",
                dynamic.min_consistent_frames, dynamic.min_frames
            ));
        }
        if settings.general.history_length < dynamic.min_frames {
            problems.push(format!(
                "history_length ({}) is shorter than min_frames ({})",
                settings.general.history_length, dynamic.min_frames
            ));
        }
        problems
    }

    /// Called by the binary once logging is up, since `load` runs before it.
    pub fn warn_on_unreachable_settings(&self) {
        for problem in self.unreachable_settings() {
            warn!("{}: swipes can never confirm", problem);
        }
    }
}

// ============================================================================
// SENSITIVITY PRESETS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensitivityPreset {
    VeryStrict,
    Strict,
    Balanced,
    Lenient,
    VeryLenient,
}

impl SensitivityPreset {
    pub const ALL: [SensitivityPreset; 5] = [
        Self::VeryStrict,
        Self::Strict,
        Self::Balanced,
        Self::Lenient,
        Self::VeryLenient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryStrict => "veryStrict",
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Lenient => "lenient",
            Self::VeryLenient => "veryLenient",
        }
    }

    pub fn settings(&self) -> GestureSettings {
        let (finger, direction, max_ext, movement, min_frames, min_consistent, history, conf) =
            match self {
                Self::VeryStrict => (0.01, 0.12, 1, 0.12, 8, 5, 20, 8),
                Self::Strict => (0.015, 0.1, 1, 0.1, 6, 4, 18, 6),
                Self::Balanced => return GestureSettings::default(),
                Self::Lenient => (0.025, 0.06, 2, 0.06, 4, 2, 12, 4),
                Self::VeryLenient => (0.03, 0.05, 3, 0.04, 3, 2, 10, 3),
            };

        GestureSettings {
            static_gesture: StaticSettings {
                finger_threshold: finger,
                direction_threshold: direction,
                max_extended_fingers: max_ext,
            },
            dynamic_gesture: DynamicSettings {
                movement_threshold: movement,
                min_frames,
                min_consistent_frames: min_consistent,
            },
            general: GeneralSettings {
                history_length: history,
                confidence_frames: conf,
            },
        }
    }

    /// The preset a settings value was built from, if any.
    pub fn matching(settings: &GestureSettings) -> Option<SensitivityPreset> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.settings() == *settings)
    }
}

impl FromStr for SensitivityPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let expected: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
                anyhow::anyhow!(
                    "unknown preset '{}' (expected one of: {})",
                    s,
                    expected.join(", ")
                )
            })
    }
}

// ============================================================================
// FLAT SETTINGS RECORD
// ============================================================================

/// Flat key→value shape used by the external settings store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsRecord {
    pub scroll_value: i64,
    pub scroll_behavior: ScrollBehavior,
    pub finger_threshold: f32,
    pub direction_threshold: f32,
    pub max_extended_fingers: usize,
    pub movement_threshold: f32,
    pub min_frames: usize,
    pub min_consistent_frames: usize,
    pub history_length: usize,
    pub confidence_frames: usize,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self::from_parts(&GestureSettings::default(), &ScrollConfig::default())
    }
}

impl SettingsRecord {
    pub fn from_parts(settings: &GestureSettings, scroll: &ScrollConfig) -> Self {
        Self {
            scroll_value: scroll.distance,
            scroll_behavior: scroll.behavior,
            finger_threshold: settings.static_gesture.finger_threshold,
            direction_threshold: settings.static_gesture.direction_threshold,
            max_extended_fingers: settings.static_gesture.max_extended_fingers,
            movement_threshold: settings.dynamic_gesture.movement_threshold,
            min_frames: settings.dynamic_gesture.min_frames,
            min_consistent_frames: settings.dynamic_gesture.min_consistent_frames,
            history_length: settings.general.history_length,
            confidence_frames: settings.general.confidence_frames,
        }
    }

    pub fn gesture_settings(&self) -> GestureSettings {
        GestureSettings {
            static_gesture: StaticSettings {
                finger_threshold: self.finger_threshold,
                direction_threshold: self.direction_threshold,
                max_extended_fingers: self.max_extended_fingers,
            },
            dynamic_gesture: DynamicSettings {
                movement_threshold: self.movement_threshold,
                min_frames: self.min_frames,
                min_consistent_frames: self.min_consistent_frames,
            },
            general: GeneralSettings {
                history_length: self.history_length,
                confidence_frames: self.confidence_frames,
            },
        }
    }

    pub fn scroll(&self) -> ScrollConfig {
        ScrollConfig {
            distance: self.scroll_value,
            behavior: self.scroll_behavior,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to encode settings record")
    }

    /// Missing keys fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to decode settings record")
    }
}
