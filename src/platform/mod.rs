//! Platform glue
//!
//! Logger setup, the fixed-timestep frame driver shared by the native demo and
//! the browser binding, and (on wasm32) the JavaScript-facing game object.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::sim::{FusionEngine, PhysicsWorld};

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Install the logger for this target; later calls are no-ops
pub fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("Logger already initialized");
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("info"),
        )
        .try_init();
    }
}

/// Turns variable frame deltas into fixed `SIM_DT` engine ticks
#[derive(Debug, Clone, Default)]
pub struct FrameStepper {
    accumulator: f32,
}

impl FrameStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run as many fixed ticks as `dt` covers, then poll for game over
    ///
    /// Returns the number of ticks taken.
    pub fn advance<W: PhysicsWorld>(&mut self, engine: &mut FusionEngine<W>, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        self.accumulator += dt.min(MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            engine.tick(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop whatever the substep cap left over
        if substeps == MAX_SUBSTEPS {
            self.accumulator = 0.0;
        }
        engine.check_game_over();
        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::world::SimpleWorld;

    fn engine() -> FusionEngine<SimpleWorld> {
        let config = GameConfig::default();
        let world = SimpleWorld::new(config.width, config.height);
        FusionEngine::new(world, config, 9)
    }

    #[test]
    fn test_partial_frames_accumulate() {
        let mut engine = engine();
        let mut stepper = FrameStepper::new();
        assert_eq!(stepper.advance(&mut engine, SIM_DT * 0.6), 0);
        assert_eq!(stepper.advance(&mut engine, SIM_DT * 0.6), 1);
    }

    #[test]
    fn test_long_frames_are_clamped() {
        let mut engine = engine();
        let mut stepper = FrameStepper::new();
        // A one-second hitch still runs at most MAX_FRAME_DT worth of ticks
        let steps = stepper.advance(&mut engine, 1.0);
        assert!(steps <= MAX_SUBSTEPS);
        assert!(engine.time_secs() <= MAX_FRAME_DT as f64 + 1e-6);
    }

    #[test]
    fn test_bad_deltas_are_ignored() {
        let mut engine = engine();
        let mut stepper = FrameStepper::new();
        assert_eq!(stepper.advance(&mut engine, f32::NAN), 0);
        assert_eq!(stepper.advance(&mut engine, -1.0), 0);
        assert_eq!(engine.time_secs(), 0.0);
    }
}
