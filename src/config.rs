//! Session tuning
//!
//! Every field defaults to the matching constant in [`crate::consts`], so a
//! partial JSON document only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// How two bubbles get paired for fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FusionTrigger {
    /// Player taps two bubbles
    #[default]
    Selection,
    /// Any two touching bubbles are checked immediately
    Collision,
}

impl FusionTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionTrigger::Selection => "Selection",
            FusionTrigger::Collision => "Collision",
        }
    }
}

/// Volume preferences handed to the audio backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 0.5,
            muted: false,
        }
    }
}

impl AudioSettings {
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0) * self.sfx_volume.clamp(0.0, 1.0)
        }
    }
}

/// Game configuration for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Play area in pixels
    pub width: f32,
    pub height: f32,

    // === Spawning ===
    /// Seconds between automatic drops (0 disables auto-spawn)
    pub spawn_interval_secs: f32,
    /// Spawns since the last bomb before another may appear
    pub bomb_spawn_rate: u32,
    /// Per-spawn bomb chance once eligible
    pub bomb_probability: f64,
    /// Per-spawn clock chance
    pub clock_probability: f64,

    // === Rules ===
    pub fusion_trigger: FusionTrigger,
    /// Taps before a bomb detonates
    pub bomb_timer: u32,
    pub clock_pause_secs: f32,
    /// Points per level
    pub level_up_score: u64,

    pub audio: AudioSettings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,

            spawn_interval_secs: SPAWN_INTERVAL_SECS,
            bomb_spawn_rate: BOMB_SPAWN_RATE,
            bomb_probability: BOMB_PROBABILITY,
            clock_probability: CLOCK_PROBABILITY,

            fusion_trigger: FusionTrigger::Selection,
            bomb_timer: BOMB_TIMER,
            clock_pause_secs: CLOCK_PAUSE_SECS,
            level_up_score: LEVEL_UP_SCORE,

            audio: AudioSettings::default(),
        }
    }
}

impl GameConfig {
    /// Default config with a different trigger mode
    pub fn with_trigger(trigger: FusionTrigger) -> Self {
        Self {
            fusion_trigger: trigger,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Parse, falling back to defaults on malformed input
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) => {
                log::info!("Loaded game config ({} mode)", config.fusion_trigger.as_str());
                config
            }
            Err(e) => {
                log::warn!("Invalid game config ({e}), using defaults");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{"fusion_trigger":"Collision","bomb_timer":5}"#)
            .unwrap();
        assert_eq!(config.fusion_trigger, FusionTrigger::Collision);
        assert_eq!(config.bomb_timer, 5);
        assert_eq!(config.level_up_score, LEVEL_UP_SCORE);
        assert_eq!(config.audio, AudioSettings::default());
    }

    #[test]
    fn test_malformed_json_falls_back() {
        assert_eq!(GameConfig::from_json_or_default("{nope"), GameConfig::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = GameConfig::with_trigger(FusionTrigger::Collision);
        assert_eq!(GameConfig::from_json(&config.to_json()).unwrap(), config);
    }

    #[test]
    fn test_muted_volume_is_zero() {
        let audio = AudioSettings {
            muted: true,
            ..Default::default()
        };
        assert_eq!(audio.effective_volume(), 0.0);
    }
}
