//! Bubble factory: what to drop next, and how big it is
//!
//! The factory only decides; the engine turns a [`BubbleSpec`] into a physics
//! body.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::bag::ValueBag;
use super::state::{Bomb, BubbleKind};
use crate::color::{BubbleColor, ColorMixer};
use crate::config::GameConfig;
use crate::consts::*;

/// Decorrelates the value bag stream from the spawn-gate stream
const BAG_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Which kind of entity the next drop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Normal,
    Bomb,
    Clock,
}

/// Everything needed to create a bubble body
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleSpec {
    pub kind: BubbleKind,
    pub color: BubbleColor,
    pub radius: f32,
}

/// Spawn gates copied from the session config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRules {
    pub bomb_spawn_rate: u32,
    pub bomb_probability: f64,
    pub clock_probability: f64,
    pub bomb_timer: u32,
    pub clock_secs: f32,
}

impl From<&GameConfig> for SpawnRules {
    fn from(config: &GameConfig) -> Self {
        Self {
            bomb_spawn_rate: config.bomb_spawn_rate,
            bomb_probability: config.bomb_probability,
            clock_probability: config.clock_probability,
            bomb_timer: config.bomb_timer,
            clock_secs: config.clock_pause_secs,
        }
    }
}

impl Default for SpawnRules {
    fn default() -> Self {
        Self::from(&GameConfig::default())
    }
}

/// Radius for a face value on a log scale: 1 -> 12, 100 -> 90
///
/// Values outside 1..=100 are clamped; NaN and infinities count as 1.
pub fn bubble_radius(value: f32) -> f32 {
    let value = if value.is_finite() {
        value.clamp(MIN_VALUE as f32, MAX_VALUE as f32)
    } else {
        MIN_VALUE as f32
    };
    let min_log = (MIN_VALUE as f32).ln();
    let max_log = (MAX_VALUE as f32).ln();
    MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * (value.ln() - min_log) / (max_log - min_log)
}

/// Radius of a fused bubble: grows 5 px per level, capped at 65
pub fn fused_radius(sum: u32) -> f32 {
    (FUSED_BASE_RADIUS + (sum / 10) as f32 * FUSED_RADIUS_PER_LEVEL).min(FUSED_MAX_RADIUS)
}

pub fn bomb_radius() -> f32 {
    BASE_RADIUS + BOMB_RADIUS_BONUS
}

pub fn clock_radius() -> f32 {
    (BASE_RADIUS * CLOCK_RADIUS_FACTOR).max(CLOCK_MIN_RADIUS)
}

#[derive(Debug, Clone)]
pub struct BubbleFactory {
    bag: ValueBag,
    mixer: ColorMixer,
    rng: Pcg32,
    rules: SpawnRules,
    /// Spawns since the last bomb
    spawn_counter: u32,
}

impl BubbleFactory {
    pub fn new(seed: u64, rules: SpawnRules) -> Self {
        Self {
            bag: ValueBag::new(seed ^ BAG_SEED_SALT),
            mixer: ColorMixer::new(),
            rng: Pcg32::seed_from_u64(seed),
            rules,
            spawn_counter: 0,
        }
    }

    pub fn mixer(&self) -> &ColorMixer {
        &self.mixer
    }

    pub fn spawn_counter(&self) -> u32 {
        self.spawn_counter
    }

    /// Roll the spawn gates
    ///
    /// Bombs become eligible once the counter reaches the spawn rate and then
    /// roll every call until one appears; only an actual bomb resets the
    /// counter. The clock roll wins when both fire.
    pub fn next_spawn_kind(&mut self) -> SpawnKind {
        self.spawn_counter += 1;
        let bomb = self.spawn_counter >= self.rules.bomb_spawn_rate
            && self.rng.random::<f64>() < self.rules.bomb_probability;
        let clock = self.rng.random::<f64>() < self.rules.clock_probability;

        if clock {
            SpawnKind::Clock
        } else if bomb {
            self.spawn_counter = 0;
            SpawnKind::Bomb
        } else {
            SpawnKind::Normal
        }
    }

    /// Decide and describe the next drop
    pub fn create_bubble(&mut self) -> BubbleSpec {
        match self.next_spawn_kind() {
            SpawnKind::Normal => self.normal_spec(None),
            SpawnKind::Bomb => self.bomb_spec(),
            SpawnKind::Clock => self.clock_spec(),
        }
    }

    /// Normal bubble with an explicit value, or the next one from the bag
    pub fn normal_spec(&mut self, value: Option<u32>) -> BubbleSpec {
        let value = value
            .unwrap_or_else(|| self.bag.next_value())
            .clamp(MIN_VALUE, MAX_VALUE);
        BubbleSpec {
            kind: BubbleKind::Normal { value },
            color: self.mixer.random_color(&mut self.rng),
            radius: bubble_radius(value as f32),
        }
    }

    /// Product of a fusion with the given sum and blended colour
    pub fn fused_spec(&self, sum: u32, color: BubbleColor) -> BubbleSpec {
        BubbleSpec {
            kind: BubbleKind::Fused {
                value: sum,
                level: sum / 10,
            },
            color,
            radius: fused_radius(sum),
        }
    }

    pub fn bomb_spec(&self) -> BubbleSpec {
        BubbleSpec {
            kind: BubbleKind::Bomb(Bomb {
                timer: self.rules.bomb_timer,
                explosion: None,
            }),
            color: BubbleColor::bomb(),
            radius: bomb_radius(),
        }
    }

    pub fn clock_spec(&self) -> BubbleSpec {
        BubbleSpec {
            kind: BubbleKind::Clock {
                timer_secs: self.rules.clock_secs,
            },
            color: BubbleColor::clock(),
            radius: clock_radius(),
        }
    }

    /// Random x inside the side margins, fixed y above the visible area
    pub fn spawn_position(&mut self, width: f32) -> Vec2 {
        let x = if width > 2.0 * SPAWN_MARGIN {
            self.rng.random_range(SPAWN_MARGIN..width - SPAWN_MARGIN)
        } else {
            width / 2.0
        };
        Vec2::new(x, SPAWN_Y)
    }

    /// New bag and counters; live bubbles are untouched
    pub fn reset(&mut self) {
        self.bag.reset();
        self.spawn_counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rules(bomb_probability: f64, clock_probability: f64) -> SpawnRules {
        SpawnRules {
            bomb_probability,
            clock_probability,
            ..SpawnRules::default()
        }
    }

    #[test]
    fn test_radius_bounds_are_exact() {
        assert_eq!(bubble_radius(1.0), MIN_RADIUS);
        assert!((bubble_radius(100.0) - MAX_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn test_radius_clamps_bad_values() {
        assert_eq!(bubble_radius(f32::NAN), MIN_RADIUS);
        assert_eq!(bubble_radius(-5.0), MIN_RADIUS);
        assert_eq!(bubble_radius(500.0), bubble_radius(100.0));
    }

    #[test]
    fn test_radius_growth_is_sublinear() {
        let small_step = bubble_radius(2.0) - bubble_radius(1.0);
        let avg_step = (bubble_radius(100.0) - bubble_radius(1.0)) / 99.0;
        assert!(small_step > avg_step);
        assert!(bubble_radius(100.0) - bubble_radius(90.0) < avg_step * 10.0);
    }

    #[test]
    fn test_fused_radius_caps() {
        assert_eq!(fused_radius(10), 35.0);
        assert_eq!(fused_radius(50), 55.0);
        assert_eq!(fused_radius(70), 65.0);
        assert_eq!(fused_radius(90), 65.0);
    }

    #[test]
    fn test_special_radii() {
        assert_eq!(bomb_radius(), 35.0);
        assert_eq!(clock_radius(), 25.5);
    }

    #[test]
    fn test_no_bomb_before_spawn_rate() {
        let mut factory = BubbleFactory::new(1, rules(1.0, 0.0));
        for _ in 1..BOMB_SPAWN_RATE {
            assert_eq!(factory.next_spawn_kind(), SpawnKind::Normal);
        }
        assert_eq!(factory.next_spawn_kind(), SpawnKind::Bomb);
        assert_eq!(factory.spawn_counter(), 0);
    }

    #[test]
    fn test_counter_holds_until_bomb_spawns() {
        let mut factory = BubbleFactory::new(1, rules(0.0, 0.0));
        for _ in 0..BOMB_SPAWN_RATE + 10 {
            assert_eq!(factory.next_spawn_kind(), SpawnKind::Normal);
        }
        assert_eq!(factory.spawn_counter(), BOMB_SPAWN_RATE + 10);
    }

    #[test]
    fn test_clock_beats_bomb() {
        let mut factory = BubbleFactory::new(1, rules(1.0, 1.0));
        for _ in 0..BOMB_SPAWN_RATE * 2 {
            assert_eq!(factory.next_spawn_kind(), SpawnKind::Clock);
        }
        // No bomb was produced, so the counter kept climbing
        assert_eq!(factory.spawn_counter(), BOMB_SPAWN_RATE * 2);
    }

    #[test]
    fn test_normal_spec_uses_bag_and_palette() {
        let mut factory = BubbleFactory::new(9, rules(0.0, 0.0));
        let mut values = Vec::new();
        for _ in 0..9 {
            let spec = factory.create_bubble();
            let BubbleKind::Normal { value } = spec.kind else {
                panic!("expected a normal bubble");
            };
            assert!(factory.mixer().palette().contains(&spec.color));
            assert_eq!(spec.radius, bubble_radius(value as f32));
            values.push(value);
        }
        values.sort_unstable();
        assert_eq!(values, (1..=9).collect::<Vec<_>>());
    }

    #[test]
    fn test_explicit_value_is_clamped() {
        let mut factory = BubbleFactory::new(9, SpawnRules::default());
        assert_eq!(
            factory.normal_spec(Some(0)).kind,
            BubbleKind::Normal { value: 1 }
        );
        assert_eq!(
            factory.normal_spec(Some(42)).kind,
            BubbleKind::Normal { value: 42 }
        );
    }

    #[test]
    fn test_reset_clears_counter() {
        let mut factory = BubbleFactory::new(3, rules(0.0, 0.0));
        for _ in 0..5 {
            factory.create_bubble();
        }
        factory.reset();
        assert_eq!(factory.spawn_counter(), 0);
    }

    #[test]
    fn test_spawn_position_respects_margins() {
        let mut factory = BubbleFactory::new(11, SpawnRules::default());
        for _ in 0..100 {
            let pos = factory.spawn_position(400.0);
            assert!(pos.x >= SPAWN_MARGIN && pos.x <= 400.0 - SPAWN_MARGIN);
            assert_eq!(pos.y, SPAWN_Y);
        }
        assert_eq!(factory.spawn_position(60.0).x, 30.0);
    }

    proptest! {
        #[test]
        fn prop_radius_strictly_increasing(v in 1u32..100) {
            prop_assert!(bubble_radius((v + 1) as f32) > bubble_radius(v as f32));
        }
    }
}
