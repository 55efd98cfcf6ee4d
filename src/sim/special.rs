//! Bomb and clock mechanics
//!
//! Both are driven from [`FusionEngine::tick`] by elapsed time rather than by
//! timers of their own, so `restart` only has to drop the state to cancel them.

use glam::Vec2;

use super::engine::FusionEngine;
use super::hooks::{FusionEvent, FusionSum};
use super::physics::PhysicsWorld;
use super::state::{BubbleId, BubbleKind, Explosion};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Active clock countdown; at most one per session
#[derive(Debug, Clone, PartialEq)]
pub struct ClockPause {
    remaining: f32,
    duration: f32,
    /// Clocks consumed when the countdown ends
    clocks: Vec<BubbleId>,
    /// Velocities captured at freeze time
    saved_velocities: Vec<(BubbleId, Vec2)>,
}

impl ClockPause {
    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.0)
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Whole seconds shown on the clock face
    pub fn display_secs(&self) -> f32 {
        self.remaining().ceil()
    }

    pub fn clocks(&self) -> &[BubbleId] {
        &self.clocks
    }

    /// Drop references to a bubble that left play early
    pub fn forget(&mut self, id: BubbleId) {
        self.clocks.retain(|&c| c != id);
        self.saved_velocities.retain(|&(b, _)| b != id);
    }

    fn saved_velocity(&self, id: BubbleId) -> Vec2 {
        self.saved_velocities
            .iter()
            .find(|&&(b, _)| b == id)
            .map_or(Vec2::ZERO, |&(_, v)| v)
    }
}

impl<W: PhysicsWorld> FusionEngine<W> {
    // === Bombs ===

    /// Count every live bomb down by one; returns how many detonated
    pub fn decrement_bomb_timers(&mut self) -> usize {
        self.clear_selection();
        self.play(SoundEffect::BombTick);

        let mut detonated = Vec::new();
        for bubble in &mut self.bubbles {
            if let BubbleKind::Bomb(bomb) = &mut bubble.kind {
                if bomb.explosion.is_some() {
                    continue;
                }
                bomb.timer = bomb.timer.saturating_sub(1);
                if bomb.timer == 0 {
                    detonated.push(bubble.id);
                }
            }
        }

        for &id in &detonated {
            self.detonate(id);
        }
        detonated.len()
    }

    fn detonate(&mut self, id: BubbleId) {
        let Some(bubble) = self.bubble_mut(id) else {
            return;
        };
        let BubbleKind::Bomb(bomb) = &mut bubble.kind else {
            return;
        };
        bomb.explosion = Some(Explosion::new(
            bubble.radius,
            EXPLOSION_RADIUS_MULTIPLIER,
            EXPLOSION_DURATION_SECS,
        ));
        let body = bubble.body;

        self.play(SoundEffect::BombExplode);
        let lost = self.score.subtract_points(BOMB_PENALTY);
        self.update_level();
        // The blast stays where it went off
        self.world.set_static(body, true);
        log::info!("Bomb {} detonated, {} points lost", id, lost);
    }

    /// Grow every active blast, destroy what it swallows, push the rest
    pub(crate) fn update_explosions(&mut self, dt: f32) {
        let exploding: Vec<BubbleId> = self
            .bubbles
            .iter()
            .filter(|b| b.is_exploding())
            .map(|b| b.id)
            .collect();

        for id in exploding {
            let Some(bubble) = self.bubble_mut(id) else {
                // Swallowed by an earlier blast this tick
                continue;
            };
            let BubbleKind::Bomb(bomb) = &mut bubble.kind else {
                continue;
            };
            let Some(explosion) = bomb.explosion.as_mut() else {
                continue;
            };
            explosion.elapsed += dt;
            let radius = explosion.radius(EXPLOSION_EASING);
            let progress = explosion.progress();
            let finished = explosion.is_finished();

            let current = bubble.radius;
            bubble.radius = radius;
            let body = bubble.body;
            if current > 0.0 {
                self.world.scale_body(body, radius / current);
            }

            let Some(center) = self.world.position(body) else {
                continue;
            };
            self.apply_blast(id, center, radius, progress);

            if finished {
                self.remove_bubble(id);
                log::debug!("Explosion {} finished", id);
            }
        }
    }

    fn apply_blast(&mut self, bomb: BubbleId, center: Vec2, radius: f32, progress: f32) {
        let reach = radius * EXPLOSION_FORCE_RANGE;
        let mut destroyed = Vec::new();
        let mut pushed = Vec::new();

        for bubble in &self.bubbles {
            if bubble.id == bomb || bubble.is_exploding() {
                continue;
            }
            let Some(pos) = self.world.position(bubble.body) else {
                continue;
            };
            let dist = pos.distance(center);
            if dist <= radius {
                destroyed.push(bubble.id);
            } else if dist < reach {
                let falloff = (1.0 - dist / reach) * (1.0 - progress);
                let dir = (pos - center).normalize_or_zero();
                pushed.push((bubble.body, pos, dir * EXPLOSION_FORCE * falloff));
            }
        }

        for id in destroyed {
            self.remove_bubble(id);
        }
        for (body, pos, force) in pushed {
            self.world.apply_force(body, pos, force);
        }
    }

    // === Clocks ===

    /// Freeze every numbered bubble for the clock duration
    ///
    /// Ignored while a countdown is already running or after game over.
    pub fn activate_clock(&mut self, clocks: &[BubbleId]) -> bool {
        if self.clock_pause.is_some() || self.is_game_over() {
            return false;
        }
        let clocks: Vec<BubbleId> = clocks
            .iter()
            .copied()
            .filter(|&id| self.bubble(id).is_some_and(|b| b.is_clock()))
            .collect();
        if clocks.is_empty() {
            return false;
        }

        self.clear_selection();

        let mut saved_velocities = Vec::new();
        for bubble in self.bubbles.iter().filter(|b| b.is_numbered()) {
            let velocity = self.world.velocity(bubble.body).unwrap_or(Vec2::ZERO);
            saved_velocities.push((bubble.id, velocity));
            self.world.set_velocity(bubble.body, Vec2::ZERO);
            self.world.set_static(bubble.body, true);
        }

        let duration = self.config.clock_pause_secs.max(0.0);
        let pause = ClockPause {
            remaining: duration,
            duration,
            clocks,
            saved_velocities,
        };
        let display = pause.display_secs();
        for &id in pause.clocks() {
            if let Some(bubble) = self.bubble_mut(id) {
                bubble.kind = BubbleKind::Clock {
                    timer_secs: display,
                };
            }
        }
        log::info!(
            "Clock pause: {} bubbles frozen for {:.1}s",
            pause.saved_velocities.len(),
            duration
        );
        self.clock_pause = Some(pause);

        self.play(SoundEffect::ClockStart);
        self.hooks.pause_game((duration * 1000.0).round() as u32);
        true
    }

    /// Count the pause down and thaw the board when it runs out
    pub(crate) fn update_clock_pause(&mut self, dt: f32) {
        let Some(pause) = self.clock_pause.as_mut() else {
            return;
        };
        pause.remaining -= dt;
        let display = pause.display_secs();
        let expired = pause.remaining <= 0.0;
        let clocks = pause.clocks.clone();

        for id in clocks {
            if let Some(bubble) = self.bubble_mut(id) {
                bubble.kind = BubbleKind::Clock {
                    timer_secs: display,
                };
            }
        }

        if expired {
            if let Some(pause) = self.clock_pause.take() {
                self.finish_clock_pause(pause);
            }
        }
    }

    fn finish_clock_pause(&mut self, pause: ClockPause) {
        let pos = pause
            .clocks
            .first()
            .and_then(|&id| self.bubble(id))
            .and_then(|b| self.world.position(b.body))
            .unwrap_or(Vec2::ZERO);
        for &id in &pause.clocks {
            self.remove_bubble(id);
        }

        for bubble in &self.bubbles {
            if !bubble.is_numbered() {
                continue;
            }
            self.world.set_static(bubble.body, false);
            self.world
                .set_velocity(bubble.body, pause.saved_velocity(bubble.id));
        }

        log::info!("Clock pause over after {:.1}s", pause.duration);
        self.hooks.bubble_fusion(&FusionEvent {
            value_a: None,
            value_b: None,
            sum: FusionSum::Time,
            points: 0,
            color_bonus: false,
            perfect: false,
            pos,
        });
    }

    /// Fusion products born during a pause start frozen (restored at rest)
    pub(crate) fn freeze_if_paused(&mut self, id: BubbleId) {
        if self.clock_pause.is_none() {
            return;
        }
        let Some(body) = self.bubble(id).map(|b| b.body) else {
            return;
        };
        self.world.set_velocity(body, Vec2::ZERO);
        self.world.set_static(body, true);
    }
}
