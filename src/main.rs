//! Bubble Fusion entry point
//!
//! In the browser the page drives [`bubble_fusion::platform::web::BubbleGame`]
//! directly. Natively this runs a headless session with a simple automated
//! player and logs what happened.
//!
//! Usage: `bubble-fusion --seed 42 --seconds 120 --trigger collision`

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use bubble_fusion::audio::{SoundEffect, SoundLog};
    use clap::{Parser, ValueEnum};
    use bubble_fusion::consts::SIM_DT;
    use bubble_fusion::platform::FrameStepper;
    use bubble_fusion::sim::{BubbleId, FusionEngine, FusionSum, PhysicsWorld, fusion_sum};
    use bubble_fusion::{FusionTrigger, GameConfig, SimpleWorld};

    /// Seconds between automated taps
    const THINK_INTERVAL: f32 = 0.5;

    #[derive(Debug, Default)]
    struct Tally {
        fusions: u32,
        perfect: u32,
        pauses: u32,
        levels: Vec<u32>,
    }

    /// How the automated player triggers fusions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum Trigger {
        /// Tap two bubbles to fuse them
        #[value(alias = "selection")]
        Tap,
        /// Fuse on contact
        Collision,
    }

    impl From<Trigger> for FusionTrigger {
        fn from(trigger: Trigger) -> Self {
            match trigger {
                Trigger::Tap => FusionTrigger::Selection,
                Trigger::Collision => FusionTrigger::Collision,
            }
        }
    }

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Headless Bubble Fusion session", long_about = None)]
    pub struct Options {
        /// Seed for the value bag, colours and spawn positions
        #[arg(long, default_value_t = 42)]
        pub seed: u64,
        /// Simulated seconds to play before stopping
        #[arg(long, default_value_t = 120.0)]
        pub seconds: f32,
        #[arg(long, value_enum, default_value_t = Trigger::Tap)]
        pub trigger: Trigger,
    }

    /// First fusable pair among the settled bubbles
    fn pick_pair(engine: &FusionEngine<SimpleWorld>) -> Option<(BubbleId, BubbleId)> {
        let candidates: Vec<_> = engine
            .bubbles()
            .iter()
            .filter(|b| b.has_collided_once)
            .filter_map(|b| Some((b.id, b.value()?)))
            .collect();
        for (i, &(a, va)) in candidates.iter().enumerate() {
            for &(b, vb) in &candidates[i + 1..] {
                if fusion_sum(va, vb).is_some() {
                    return Some((a, b));
                }
            }
        }
        None
    }

    /// Tap a special bubble if there is one, otherwise a fusable pair
    fn play_move(engine: &mut FusionEngine<SimpleWorld>) {
        let special = engine
            .bubbles()
            .iter()
            .find(|b| b.has_collided_once && (b.is_clock() || (b.is_bomb() && !b.is_exploding())))
            .map(|b| b.id);
        let targets = match special {
            Some(id) => vec![id],
            None => match pick_pair(engine) {
                Some((a, b)) => vec![a, b],
                None => return,
            },
        };
        for id in targets {
            let pos = engine
                .bubble(id)
                .and_then(|b| engine.world().position(b.body));
            if let Some(pos) = pos {
                let outcome = engine.tap(pos);
                log::debug!("tap {} -> {:?}", id, outcome);
            }
        }
    }

    pub fn run(options: Options) {
        let trigger = FusionTrigger::from(options.trigger);
        let config = GameConfig::with_trigger(trigger);
        let world = SimpleWorld::new(config.width, config.height);
        let sounds = Rc::new(RefCell::new(SoundLog::default()));
        let tally = Rc::new(RefCell::new(Tally::default()));

        let mut engine = FusionEngine::new(world, config, options.seed)
            .with_audio(Box::new(sounds.clone()));

        let t = tally.clone();
        engine.on_bubble_fusion(move |event| {
            let mut t = t.borrow_mut();
            match event.sum {
                FusionSum::Value(_) => {
                    t.fusions += 1;
                    if event.perfect {
                        t.perfect += 1;
                    }
                }
                FusionSum::Time => log::info!("Clock pause finished"),
            }
        });
        let t = tally.clone();
        engine.on_level_up(move |level| t.borrow_mut().levels.push(level));
        let t = tally.clone();
        engine.on_pause_game(move |ms| {
            t.borrow_mut().pauses += 1;
            log::info!("Board frozen for {} ms", ms);
        });
        engine.on_game_over(|| log::warn!("Danger line held too long"));

        let mut stepper = FrameStepper::new();
        let mut think = 0.0;
        let mut elapsed = 0.0;
        while elapsed < options.seconds && !engine.is_game_over() {
            stepper.advance(&mut engine, SIM_DT);
            elapsed += SIM_DT;
            think += SIM_DT;
            if think >= THINK_INTERVAL && trigger == FusionTrigger::Selection {
                think = 0.0;
                play_move(&mut engine);
            }
        }

        let tally = tally.borrow();
        let sounds = sounds.borrow();
        log::info!(
            "Session over after {:.1}s ({:?}): score {}, level {}",
            engine.time_secs(),
            engine.phase(),
            engine.score(),
            engine.level()
        );
        log::info!(
            "{} fusions ({} perfect), {} clock pauses, {} bombs, levels reached {:?}",
            tally.fusions,
            tally.perfect,
            tally.pauses,
            sounds.count(SoundEffect::BombExplode),
            tally.levels
        );
        log::info!(
            "{} bubbles on the board, {} bodies in the world",
            engine.bubbles().len(),
            engine.world().bodies().len()
        );

        engine.destroy();
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = Options::try_parse_from(["bubble-fusion"]).unwrap();
            assert_eq!(options.seed, 42);
            assert_eq!(options.seconds, 120.0);
            assert_eq!(FusionTrigger::from(options.trigger), FusionTrigger::Selection);
        }

        #[test]
        fn test_flags_parse() {
            let options = Options::try_parse_from([
                "bubble-fusion",
                "--seed",
                "7",
                "--seconds",
                "30",
                "--trigger",
                "collision",
            ])
            .unwrap();
            assert_eq!(options.seed, 7);
            assert_eq!(options.seconds, 30.0);
            assert_eq!(FusionTrigger::from(options.trigger), FusionTrigger::Collision);
        }

        #[test]
        fn test_bad_values_are_rejected() {
            assert!(Options::try_parse_from(["bubble-fusion", "--seed", "abc"]).is_err());
            assert!(Options::try_parse_from(["bubble-fusion", "--trigger", "shake"]).is_err());
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    bubble_fusion::platform::init_logging();
    log::info!("Bubble Fusion core loaded");
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    bubble_fusion::platform::init_logging();
    use clap::Parser;

    let options = headless::Options::parse();
    log::info!(
        "Bubble Fusion (native) starting: seed {}, {}s, {:?} mode",
        options.seed,
        options.seconds,
        options.trigger
    );
    headless::run(options);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
