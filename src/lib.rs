//! Bubble Fusion - falling-bubble merge puzzle core
//!
//! Core modules:
//! - `sim`: Bubble lifecycle, fusion rule, scoring, bombs, clocks, game over
//! - `color`: Palette and pigment-style colour mixing
//! - `world`: The physics collaborator on top of rapier2d
//! - `audio`: Sound effect hooks (Web Audio backend in the browser)
//! - `config`: Data-driven session tuning
//! - `platform`: Logger setup and the browser host binding

pub mod audio;
pub mod color;
pub mod config;
pub mod platform;
pub mod sim;
pub mod world;

pub use color::{BubbleColor, ColorMixer};
pub use config::{AudioSettings, FusionTrigger, GameConfig};
pub use world::SimpleWorld;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the browser frame rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Max simulation steps per rendered frame (spiral of death guard)
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted before clamping (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default play area (CSS pixels)
    pub const DEFAULT_WIDTH: f32 = 400.0;
    pub const DEFAULT_HEIGHT: f32 = 700.0;

    /// Spawn placement: horizontal margin on each side, fixed height above the top edge
    pub const SPAWN_MARGIN: f32 = 50.0;
    pub const SPAWN_Y: f32 = -50.0;
    /// Seconds between automatic drops
    pub const SPAWN_INTERVAL_SECS: f32 = 1.2;

    /// Base radius used to size bombs and clocks
    pub const BASE_RADIUS: f32 = 30.0;
    /// Logarithmic value-to-radius range
    pub const MIN_RADIUS: f32 = 12.0;
    pub const MAX_RADIUS: f32 = 90.0;
    /// Fused bubble radius: 30 + level * 5, capped at 65
    pub const FUSED_BASE_RADIUS: f32 = 30.0;
    pub const FUSED_RADIUS_PER_LEVEL: f32 = 5.0;
    pub const FUSED_MAX_RADIUS: f32 = 65.0;

    /// Face values
    pub const MIN_VALUE: u32 = 1;
    pub const MAX_VALUE: u32 = 100;
    /// Sum of a perfect fusion (both bubbles vanish)
    pub const PERFECT_SUM: u32 = 100;

    /// Bomb spawning: eligible once this many spawns happened since the last bomb
    pub const BOMB_SPAWN_RATE: u32 = 25;
    pub const BOMB_PROBABILITY: f64 = 0.3;
    pub const BOMB_TIMER: u32 = 3;
    pub const BOMB_RADIUS_BONUS: f32 = 5.0;
    /// Points lost when a bomb detonates
    pub const BOMB_PENALTY: u64 = 1000;
    pub const EXPLOSION_DURATION_SECS: f32 = 0.6;
    pub const EXPLOSION_RADIUS_MULTIPLIER: f32 = 4.0;
    /// Easing exponent for explosion growth (fast start, slow settle)
    pub const EXPLOSION_EASING: f32 = 0.2;
    /// Peak outward force on a survivor at the blast centre
    pub const EXPLOSION_FORCE: f32 = 50_000.0;
    /// Survivors within this multiple of the current blast radius are pushed
    pub const EXPLOSION_FORCE_RANGE: f32 = 2.0;

    /// Clock spawning and pause
    pub const CLOCK_PROBABILITY: f64 = 0.07;
    pub const CLOCK_PAUSE_SECS: f32 = 5.0;
    pub const CLOCK_RADIUS_FACTOR: f32 = 0.85;
    pub const CLOCK_MIN_RADIUS: f32 = 24.0;

    /// Scoring
    pub const MULTIPLIER_BONUS: u64 = 10;
    pub const HIGH_VALUE_THRESHOLD: u32 = 50;
    pub const HIGH_VALUE_BONUS: u64 = 25;
    pub const PERFECT_FUSION_BONUS: u64 = 500;
    pub const COLOR_BONUS_MULTIPLIER: u64 = 5;
    pub const LEVEL_UP_SCORE: u64 = 1000;

    /// Danger line as a fraction of the play-area height, measured from the top
    pub const DANGER_LINE_FRACTION: f32 = 0.1;
    /// Seconds a bubble may stay above the danger line before the run ends
    pub const DANGER_DWELL_SECS: f64 = 1.0;
}

/// Play-area height of the danger line
#[inline]
pub fn danger_line_y(height: f32) -> f32 {
    height * consts::DANGER_LINE_FRACTION
}
