//! Host callbacks
//!
//! Each hook is optional; the engine calls it only when set.

use glam::Vec2;

/// Sum reported with a fusion callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionSum {
    Value(u32),
    /// A clock pause finished (no points)
    Time,
}

/// Payload of the fusion callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionEvent {
    pub value_a: Option<u32>,
    pub value_b: Option<u32>,
    pub sum: FusionSum,
    pub points: u64,
    pub color_bonus: bool,
    /// Sum was exactly 100 and both bubbles vanished
    pub perfect: bool,
    /// Where the fused bubble appeared (or the burst for a perfect fusion)
    pub pos: Vec2,
}

pub type FusionHook = Box<dyn FnMut(&FusionEvent)>;
pub type LevelUpHook = Box<dyn FnMut(u32)>;
pub type GameOverHook = Box<dyn FnMut()>;
/// Receives the pause duration in milliseconds
pub type PauseHook = Box<dyn FnMut(u32)>;

#[derive(Default)]
pub struct Hooks {
    pub on_bubble_fusion: Option<FusionHook>,
    pub on_level_up: Option<LevelUpHook>,
    pub on_game_over: Option<GameOverHook>,
    pub on_pause_game: Option<PauseHook>,
}

impl Hooks {
    pub fn bubble_fusion(&mut self, event: &FusionEvent) {
        if let Some(hook) = self.on_bubble_fusion.as_mut() {
            hook(event);
        }
    }

    pub fn level_up(&mut self, level: u32) {
        if let Some(hook) = self.on_level_up.as_mut() {
            hook(level);
        }
    }

    pub fn game_over(&mut self) {
        if let Some(hook) = self.on_game_over.as_mut() {
            hook();
        }
    }

    pub fn pause_game(&mut self, duration_ms: u32) {
        if let Some(hook) = self.on_pause_game.as_mut() {
            hook(duration_ms);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
