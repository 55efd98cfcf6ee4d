//! Browser binding
//!
//! `BubbleGame` wraps one session for the host page. The page owns the canvas,
//! pointer handling and `requestAnimationFrame`; it forwards frame deltas and
//! taps here and draws from [`BubbleGame::snapshot`].

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use js_sys::Function;
use serde_json::json;
use wasm_bindgen::prelude::*;

use super::{FrameStepper, init_logging};
use crate::audio::WebAudio;
use crate::config::{AudioSettings, GameConfig};
use crate::sim::{FusionEngine, FusionEvent, FusionSum, TapOutcome};
use crate::world::SimpleWorld;

/// Turn a serde value into a plain JS object
fn to_js(value: serde_json::Value) -> JsValue {
    js_sys::JSON::parse(&value.to_string()).unwrap_or(JsValue::NULL)
}

fn call(hook: &Function, arg: JsValue) {
    if let Err(e) = hook.call1(&JsValue::NULL, &arg) {
        log::warn!("Host callback failed: {:?}", e);
    }
}

fn fusion_payload(event: &FusionEvent) -> JsValue {
    let sum = match event.sum {
        FusionSum::Value(sum) => json!(sum),
        FusionSum::Time => json!("TIME"),
    };
    to_js(json!({
        "valueA": event.value_a,
        "valueB": event.value_b,
        "sum": sum,
        "points": event.points,
        "colorBonus": event.color_bonus,
        "perfect": event.perfect,
        "x": event.pos.x,
        "y": event.pos.y,
    }))
}

fn tap_name(outcome: &TapOutcome) -> &'static str {
    match outcome {
        TapOutcome::Ignored => "ignored",
        TapOutcome::Selected(_) => "selected",
        TapOutcome::Deselected(_) => "deselected",
        TapOutcome::Rejected => "rejected",
        TapOutcome::Fused(_) => "fused",
        TapOutcome::NotFusable => "not_fusable",
        TapOutcome::BombTicked => "bomb_ticked",
        TapOutcome::ClockActivated => "clock_activated",
    }
}

#[wasm_bindgen]
pub struct BubbleGame {
    engine: FusionEngine<SimpleWorld>,
    audio: Rc<RefCell<WebAudio>>,
    stepper: FrameStepper,
}

#[wasm_bindgen]
impl BubbleGame {
    /// `config_json` may be omitted or partial; missing fields take defaults
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, seed: f64, config_json: Option<String>) -> BubbleGame {
        init_logging();

        let mut config = config_json
            .as_deref()
            .map(GameConfig::from_json_or_default)
            .unwrap_or_default();
        config.width = width;
        config.height = height;

        let audio = Rc::new(RefCell::new(WebAudio::new(config.audio)));
        let world = SimpleWorld::new(width, height);
        let engine =
            FusionEngine::new(world, config, seed as u64).with_audio(Box::new(audio.clone()));

        BubbleGame {
            engine,
            audio,
            stepper: FrameStepper::new(),
        }
    }

    /// Advance by a frame delta in seconds; returns true once the run is over
    pub fn tick(&mut self, dt: f32) -> bool {
        self.stepper.advance(&mut self.engine, dt);
        self.engine.is_game_over()
    }

    /// Poll the danger line without stepping (`tick` already does this)
    #[wasm_bindgen(js_name = checkGameOver)]
    pub fn check_game_over(&mut self) -> bool {
        self.engine.check_game_over()
    }

    pub fn tap(&mut self, x: f32, y: f32) -> String {
        tap_name(&self.engine.tap(Vec2::new(x, y))).to_string()
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.engine.resize(width, height);
    }

    pub fn restart(&mut self) {
        self.stepper.reset();
        self.engine.restart();
    }

    pub fn destroy(&mut self) {
        self.engine.destroy();
    }

    pub fn score(&self) -> f64 {
        self.engine.score() as f64
    }

    pub fn level(&self) -> u32 {
        self.engine.level()
    }

    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.engine.is_game_over()
    }

    /// "Playing", "ClockPaused" or "GameOver"
    pub fn phase(&self) -> String {
        format!("{:?}", self.engine.phase())
    }

    #[wasm_bindgen(js_name = dangerLineY)]
    pub fn danger_line_y(&self) -> f32 {
        crate::danger_line_y(self.engine.config().height)
    }

    /// Every live bubble as a JSON array
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.engine.snapshot()).unwrap_or_else(|_| "[]".to_string())
    }

    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&mut self, muted: bool) {
        let mut settings = self.engine.config().audio;
        settings.muted = muted;
        self.apply_audio(settings);
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, master: f32, sfx: f32) {
        let mut settings = self.engine.config().audio;
        settings.master_volume = master.clamp(0.0, 1.0);
        settings.sfx_volume = sfx.clamp(0.0, 1.0);
        self.apply_audio(settings);
    }

    // === Callbacks ===

    #[wasm_bindgen(js_name = onBubbleFusion)]
    pub fn on_bubble_fusion(&mut self, hook: Function) {
        self.engine
            .on_bubble_fusion(move |event| call(&hook, fusion_payload(event)));
    }

    #[wasm_bindgen(js_name = onLevelUp)]
    pub fn on_level_up(&mut self, hook: Function) {
        self.engine
            .on_level_up(move |level| call(&hook, JsValue::from(level)));
    }

    #[wasm_bindgen(js_name = onGameOver)]
    pub fn on_game_over(&mut self, hook: Function) {
        self.engine.on_game_over(move || call(&hook, JsValue::UNDEFINED));
    }

    /// Receives the pause length in milliseconds
    #[wasm_bindgen(js_name = onPauseGame)]
    pub fn on_pause_game(&mut self, hook: Function) {
        self.engine
            .on_pause_game(move |ms| call(&hook, JsValue::from(ms)));
    }

    #[wasm_bindgen(js_name = onScoreUpdate)]
    pub fn on_score_update(&mut self, hook: Function) {
        self.engine.on_score_update(move |update| {
            call(
                &hook,
                to_js(json!({
                    "score": update.score,
                    "delta": update.delta,
                    "fusionSum": update.fusion_sum,
                    "colorBonus": update.color_bonus,
                })),
            )
        });
    }
}

impl BubbleGame {
    fn apply_audio(&mut self, settings: AudioSettings) {
        self.engine.set_audio_settings(settings);
        self.audio.borrow_mut().set_settings(settings);
    }
}
