//! Fusion engine
//!
//! Owns the game-side state of every bubble and drives one session: spawning,
//! collision- and tap-triggered fusion, scoring, level tracking, the danger
//! line and restart/teardown. Bomb and clock mechanics live in `special.rs`.
//!
//! Everything runs on the caller's thread. The host calls [`FusionEngine::tick`]
//! once per frame, [`FusionEngine::check_game_over`] after it, and forwards
//! taps as they arrive.

use glam::Vec2;
use serde::Serialize;

use super::factory::{BubbleFactory, BubbleSpec, SpawnRules};
use super::hooks::{FusionEvent, FusionSum, Hooks};
use super::physics::{BodyHandle, BodyMaterial, PhysicsWorld};
use super::score::{FusionScore, ScoreManager, ScoreUpdate};
use super::selection::{SelectOutcome, Selection};
use super::special::ClockPause;
use super::state::{Bubble, BubbleId, BubbleKind, GamePhase};
use crate::audio::{AudioSink, SoundEffect};
use crate::config::{AudioSettings, FusionTrigger, GameConfig};
use crate::consts::*;
use crate::danger_line_y;

/// The fusion rule: two values fuse iff their sum is a multiple of 10 in 10..=100
pub fn fusion_sum(a: u32, b: u32) -> Option<u32> {
    let sum = a.checked_add(b)?;
    (sum % 10 == 0 && (10..=PERFECT_SUM).contains(&sum)).then_some(sum)
}

/// Result of a successful fusion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionOutcome {
    pub sum: u32,
    pub points: FusionScore,
    pub perfect: bool,
    /// New fused bubble (`None` for a perfect fusion)
    pub product: Option<BubbleId>,
    pub pos: Vec2,
}

/// What a tap did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapOutcome {
    /// Nothing under the pointer, or input is locked
    Ignored,
    Selected(BubbleId),
    Deselected(BubbleId),
    /// Two bubbles already held
    Rejected,
    Fused(FusionOutcome),
    /// Second selection did not satisfy the fusion rule
    NotFusable,
    /// Every live bomb counted down
    BombTicked,
    ClockActivated,
}

/// Flattened bubble for renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleView {
    pub id: BubbleId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub kind: &'static str,
    pub value: Option<u32>,
    pub fusion_level: Option<u32>,
    pub fill: String,
    pub stroke: String,
    pub selected: bool,
    pub bomb_timer: Option<u32>,
    pub clock_secs: Option<f32>,
    pub exploding: bool,
}

pub struct FusionEngine<W: PhysicsWorld> {
    pub(crate) world: W,
    pub(crate) config: GameConfig,
    pub(crate) factory: BubbleFactory,
    pub(crate) score: ScoreManager,
    /// Live bubbles, sorted by id
    pub(crate) bubbles: Vec<Bubble>,
    next_id: BubbleId,
    pub(crate) selection: Selection,
    pub(crate) hooks: Hooks,
    audio: Option<Box<dyn AudioSink>>,
    pub(crate) clock_pause: Option<ClockPause>,
    game_over: bool,
    /// Physics stepping enabled
    running: bool,
    /// Collision-start events are consumed (false after destroy)
    collisions_attached: bool,
    destroyed: bool,
    /// Session clock in seconds, advanced by `tick`
    time_secs: f64,
    spawn_timer: f32,
    level: u32,
}

impl<W: PhysicsWorld> FusionEngine<W> {
    pub fn new(mut world: W, config: GameConfig, seed: u64) -> Self {
        world.set_bounds(config.width, config.height);
        log::info!(
            "Bubble session starting: {}x{}, {} mode, seed {}",
            config.width,
            config.height,
            config.fusion_trigger.as_str(),
            seed
        );
        Self {
            world,
            factory: BubbleFactory::new(seed, SpawnRules::from(&config)),
            config,
            score: ScoreManager::new(),
            bubbles: Vec::new(),
            next_id: 1,
            selection: Selection::new(),
            hooks: Hooks::default(),
            audio: None,
            clock_pause: None,
            game_over: false,
            running: true,
            collisions_attached: true,
            destroyed: false,
            time_secs: 0.0,
            spawn_timer: 0.0,
            level: 1,
        }
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn set_audio(&mut self, audio: Option<Box<dyn AudioSink>>) {
        self.audio = audio;
    }

    /// Record new volume preferences (the sink applies them itself)
    pub fn set_audio_settings(&mut self, settings: AudioSettings) {
        self.config.audio = settings;
    }

    // === Hooks ===

    pub fn on_bubble_fusion(&mut self, hook: impl FnMut(&FusionEvent) + 'static) {
        self.hooks.on_bubble_fusion = Some(Box::new(hook));
    }

    pub fn on_level_up(&mut self, hook: impl FnMut(u32) + 'static) {
        self.hooks.on_level_up = Some(Box::new(hook));
    }

    pub fn on_game_over(&mut self, hook: impl FnMut() + 'static) {
        self.hooks.on_game_over = Some(Box::new(hook));
    }

    /// Called with the pause length in milliseconds when a clock fires
    pub fn on_pause_game(&mut self, hook: impl FnMut(u32) + 'static) {
        self.hooks.on_pause_game = Some(Box::new(hook));
    }

    pub fn on_score_update(&mut self, hook: impl FnMut(ScoreUpdate) + 'static) {
        self.score.set_listener(Some(Box::new(hook)));
    }

    // === Accessors ===

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn bubble(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.bubbles[i])
    }

    pub(crate) fn bubble_mut(&mut self, id: BubbleId) -> Option<&mut Bubble> {
        self.bubbles
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &mut self.bubbles[i])
    }

    pub fn bubble_for_body(&self, body: BodyHandle) -> Option<BubbleId> {
        self.bubbles.iter().find(|b| b.body == body).map(|b| b.id)
    }

    pub fn score(&self) -> u64 {
        self.score.score()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn selected(&self) -> &[BubbleId] {
        self.selection.ids()
    }

    pub fn time_secs(&self) -> f64 {
        self.time_secs
    }

    pub fn phase(&self) -> GamePhase {
        if self.game_over {
            GamePhase::GameOver
        } else if self.clock_pause.is_some() {
            GamePhase::ClockPaused
        } else {
            GamePhase::Playing
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn clock_pause(&self) -> Option<&ClockPause> {
        self.clock_pause.as_ref()
    }

    /// Renderer-friendly copy of every live bubble
    pub fn snapshot(&self) -> Vec<BubbleView> {
        self.bubbles
            .iter()
            .filter_map(|b| {
                let pos = self.world.position(b.body)?;
                let (kind, bomb_timer, clock_secs) = match b.kind {
                    BubbleKind::Normal { .. } => ("normal", None, None),
                    BubbleKind::Fused { .. } => ("fused", None, None),
                    BubbleKind::Bomb(bomb) => ("bomb", Some(bomb.timer), None),
                    BubbleKind::Clock { timer_secs } => ("clock", None, Some(timer_secs)),
                };
                Some(BubbleView {
                    id: b.id,
                    x: pos.x,
                    y: pos.y,
                    radius: b.radius,
                    kind,
                    value: b.value(),
                    fusion_level: b.fusion_level(),
                    fill: b.color.fill.clone(),
                    stroke: b.color.stroke.clone(),
                    selected: b.is_selected,
                    bomb_timer,
                    clock_secs,
                    exploding: b.is_exploding(),
                })
            })
            .collect()
    }

    // === Frame update ===

    /// Advance the session by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if self.destroyed || !self.running {
            return;
        }
        self.time_secs += dt as f64;
        self.world.step(dt);
        self.process_collisions();
        self.update_explosions(dt);
        self.update_clock_pause(dt);
        self.update_spawning(dt);
    }

    fn update_spawning(&mut self, dt: f32) {
        let interval = self.config.spawn_interval_secs;
        if interval <= 0.0 || self.phase() != GamePhase::Playing {
            return;
        }
        self.spawn_timer += dt;
        while self.spawn_timer >= interval {
            self.spawn_timer -= interval;
            self.spawn_bubble();
        }
    }

    fn process_collisions(&mut self) {
        let pairs = self.world.drain_collision_starts();
        if !self.collisions_attached {
            return;
        }
        for pair in pairs {
            // Either side may have been consumed earlier in this batch
            let a = self.bubble_for_body(pair.a);
            let b = self.bubble_for_body(pair.b);
            for id in [a, b].into_iter().flatten() {
                self.latch_first_collision(id);
            }
            if let (Some(a), Some(b)) = (a, b) {
                self.on_bubble_contact(a, b);
            }
        }
    }

    fn latch_first_collision(&mut self, id: BubbleId) {
        let Some(bubble) = self.bubble_mut(id) else {
            return;
        };
        if !bubble.has_collided_once {
            bubble.has_collided_once = true;
            self.play(SoundEffect::Drop);
        }
    }

    fn on_bubble_contact(&mut self, a: BubbleId, b: BubbleId) {
        if self.game_over || self.config.fusion_trigger != FusionTrigger::Collision {
            return;
        }
        let both_clocks = [a, b]
            .iter()
            .all(|&id| self.bubble(id).is_some_and(Bubble::is_clock));
        if both_clocks {
            self.activate_clock(&[a, b]);
        } else {
            self.try_fuse(a, b, None);
        }
    }

    // === Spawning ===

    /// Drop the next bubble from above the play area
    pub fn spawn_bubble(&mut self) -> Option<BubbleId> {
        if self.game_over || self.destroyed {
            return None;
        }
        let spec = self.factory.create_bubble();
        let pos = self.factory.spawn_position(self.config.width);
        Some(self.place_bubble(spec, pos))
    }

    /// Create a body for `spec` at `pos`
    pub fn place_bubble(&mut self, spec: BubbleSpec, pos: Vec2) -> BubbleId {
        let body = self
            .world
            .create_circle(pos, spec.radius, BodyMaterial::default());
        let id = self.next_id;
        self.next_id += 1;
        // Ids only grow, so pushing keeps the list sorted
        self.bubbles.push(Bubble {
            id,
            body,
            kind: spec.kind,
            color: spec.color,
            radius: spec.radius,
            has_collided_once: false,
            is_selected: false,
            danger_since: None,
        });
        id
    }

    /// Take a bubble out of play and out of the physics world
    pub(crate) fn remove_bubble(&mut self, id: BubbleId) -> Option<Bubble> {
        let index = self.bubbles.binary_search_by_key(&id, |b| b.id).ok()?;
        let bubble = self.bubbles.remove(index);
        self.world.remove_body(bubble.body);
        self.selection.forget(id);
        if let Some(pause) = self.clock_pause.as_mut() {
            pause.forget(id);
        }
        Some(bubble)
    }

    // === Fusion ===

    /// Fuse two bubbles if the rule allows it
    ///
    /// `point` is where the product appears; defaults to the midpoint.
    pub fn try_fuse(
        &mut self,
        a_id: BubbleId,
        b_id: BubbleId,
        point: Option<Vec2>,
    ) -> Option<FusionOutcome> {
        if self.game_over || a_id == b_id {
            return None;
        }
        let a = self.bubble(a_id)?;
        let b = self.bubble(b_id)?;
        let (value_a, value_b) = (a.value()?, b.value()?);
        let sum = fusion_sum(value_a, value_b)?;
        let (color_a, color_b) = (a.color.clone(), b.color.clone());
        let (body_a, body_b) = (a.body, b.body);

        self.play(SoundEffect::Fusion);

        let pos = point.unwrap_or_else(|| {
            match (self.world.position(body_a), self.world.position(body_b)) {
                (Some(pa), Some(pb)) => (pa + pb) / 2.0,
                (Some(p), None) | (None, Some(p)) => p,
                (None, None) => Vec2::ZERO,
            }
        });

        let points = self.score.add_score(sum, Some((&color_a, &color_b)));

        self.clear_selection();
        self.remove_bubble(a_id);
        self.remove_bubble(b_id);

        let perfect = sum == PERFECT_SUM;
        let product = if perfect {
            None
        } else {
            let color = self.factory.mixer().mix(&color_a, &color_b);
            let spec = self.factory.fused_spec(sum, color);
            let id = self.place_bubble(spec, pos);
            if let Some(bubble) = self.bubble_mut(id) {
                // Born touching its neighbours; no drop sound
                bubble.has_collided_once = true;
            }
            self.freeze_if_paused(id);
            Some(id)
        };

        log::debug!(
            "Fusion {} + {} = {} for {} points{}",
            value_a,
            value_b,
            sum,
            points.total_points,
            if perfect { " (perfect)" } else { "" }
        );

        self.hooks.bubble_fusion(&FusionEvent {
            value_a: Some(value_a),
            value_b: Some(value_b),
            sum: FusionSum::Value(sum),
            points: points.total_points,
            color_bonus: points.color_bonus_applied(),
            perfect,
            pos,
        });
        self.update_level();

        Some(FusionOutcome {
            sum,
            points,
            perfect,
            product,
            pos,
        })
    }

    pub(crate) fn update_level(&mut self) {
        let level = self.score.level(self.config.level_up_score);
        if level > self.level {
            log::info!("Level up: {} -> {}", self.level, level);
            // A big fusion can skip levels, each one is announced
            for reached in self.level + 1..=level {
                self.hooks.level_up(reached);
            }
            self.level = level;
        } else {
            // Penalties can drop the level; climbing back re-announces it
            self.level = level;
        }
    }

    // === Selection ===

    /// Handle a tap/click at `point`
    pub fn tap(&mut self, point: Vec2) -> TapOutcome {
        if self.game_over || self.destroyed {
            return TapOutcome::Ignored;
        }
        match self.bubble_at(point) {
            Some(id) => self.select_bubble(id, point),
            None => TapOutcome::Ignored,
        }
    }

    /// Bubble under `point`, closest centre first
    fn bubble_at(&self, point: Vec2) -> Option<BubbleId> {
        self.world
            .bodies_at_point(point)
            .into_iter()
            .filter_map(|body| {
                let id = self.bubble_for_body(body)?;
                let pos = self.world.position(body)?;
                Some((id, pos.distance_squared(point)))
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)
    }

    /// Apply a tap to a specific bubble
    pub fn select_bubble(&mut self, id: BubbleId, point: Vec2) -> TapOutcome {
        if self.game_over || self.destroyed {
            return TapOutcome::Ignored;
        }
        let Some(bubble) = self.bubble(id) else {
            return TapOutcome::Ignored;
        };

        match bubble.kind {
            BubbleKind::Bomb(bomb) if bomb.explosion.is_some() => TapOutcome::Ignored,
            BubbleKind::Bomb(_) => {
                self.decrement_bomb_timers();
                TapOutcome::BombTicked
            }
            BubbleKind::Clock { .. } => {
                if self.activate_clock(&[id]) {
                    TapOutcome::ClockActivated
                } else {
                    TapOutcome::Ignored
                }
            }
            BubbleKind::Normal { .. } | BubbleKind::Fused { .. } => {
                match self.selection.toggle(id) {
                    SelectOutcome::Rejected => TapOutcome::Rejected,
                    SelectOutcome::Deselected => {
                        self.set_selected_flag(id, false);
                        TapOutcome::Deselected(id)
                    }
                    SelectOutcome::Selected => {
                        self.set_selected_flag(id, true);
                        let Some((a, b)) = self.selection.pair() else {
                            return TapOutcome::Selected(id);
                        };
                        // The pair resolves immediately, fused or not
                        let outcome = self.try_fuse(a, b, Some(point));
                        self.clear_selection();
                        match outcome {
                            Some(fusion) => TapOutcome::Fused(fusion),
                            None => TapOutcome::NotFusable,
                        }
                    }
                }
            }
        }
    }

    fn set_selected_flag(&mut self, id: BubbleId, selected: bool) {
        if let Some(bubble) = self.bubble_mut(id) {
            bubble.is_selected = selected;
        }
    }

    pub(crate) fn clear_selection(&mut self) {
        for id in self.selection.ids().to_vec() {
            self.set_selected_flag(id, false);
        }
        self.selection.clear();
    }

    // === Game over ===

    /// Poll once per frame; returns true once the run has ended
    ///
    /// A settled bubble whose top edge stays at or above the danger line for
    /// longer than the dwell time ends the run. Bubbles still falling in from
    /// the spawn point have not collided yet and are not tracked.
    pub fn check_game_over(&mut self) -> bool {
        if self.game_over {
            return true;
        }
        if self.destroyed {
            return false;
        }

        // Every live bubble counts, frozen or falling; a fresh drop clears
        // the line long before the dwell runs out
        let line = danger_line_y(self.config.height);
        let now = self.time_secs;
        let mut expired = false;
        for bubble in &mut self.bubbles {
            let Some(pos) = self.world.position(bubble.body) else {
                continue;
            };
            if pos.y - bubble.radius <= line {
                let since = *bubble.danger_since.get_or_insert(now);
                if now - since > DANGER_DWELL_SECS {
                    expired = true;
                }
            } else {
                bubble.danger_since = None;
            }
        }

        if expired {
            self.trigger_game_over();
        }
        self.game_over
    }

    /// End the run; repeated calls do nothing
    pub fn trigger_game_over(&mut self) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.running = false;
        self.clear_selection();
        self.play(SoundEffect::GameOver);
        log::info!(
            "Game over at {:.1}s: score {}, level {}",
            self.time_secs,
            self.score.score(),
            self.level
        );
        self.hooks.game_over();
    }

    // === Lifecycle ===

    pub fn resize(&mut self, width: f32, height: f32) {
        self.config.width = width;
        self.config.height = height;
        self.world.set_bounds(width, height);
    }

    /// Fresh session in the same engine and world
    pub fn restart(&mut self) {
        if self.destroyed {
            log::warn!("restart() after destroy() ignored");
            return;
        }
        self.game_over = false;
        self.clear_selection();
        // Pending countdowns die with the session
        self.clock_pause = None;
        for bubble in std::mem::take(&mut self.bubbles) {
            self.world.remove_body(bubble.body);
        }
        self.factory.reset();
        self.score.reset();
        self.level = 1;
        self.time_secs = 0.0;
        self.spawn_timer = 0.0;
        // Stale starts from the previous session
        self.world.drain_collision_starts();
        self.collisions_attached = true;
        self.running = true;
        log::info!("Session restarted");
    }

    /// Release everything; safe to call more than once
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.running = false;
        self.collisions_attached = false;
        self.clock_pause = None;
        self.selection.clear();
        for bubble in std::mem::take(&mut self.bubbles) {
            self.world.remove_body(bubble.body);
        }
        if let Some(mut audio) = self.audio.take() {
            audio.release();
        }
        self.hooks.clear();
        self.score.set_listener(None);
        log::info!("Session destroyed");
    }

    pub(crate) fn play(&mut self, effect: SoundEffect) {
        if let Some(audio) = self.audio.as_mut() {
            audio.play(effect);
        }
    }
}
