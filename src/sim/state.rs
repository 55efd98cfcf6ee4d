//! Bubble entities and game phase
//!
//! Position and velocity live in the physics world; a [`Bubble`] holds the
//! game-side attributes keyed by its body handle.

use super::physics::BodyHandle;
use crate::color::BubbleColor;

/// Stable bubble identifier (allocation order)
pub type BubbleId = u32;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Bubbles fall, fuse and pile up
    Playing,
    /// A clock froze every numbered bubble
    ClockPaused,
    /// Run ended, waiting for restart
    GameOver,
}

/// An in-progress bomb detonation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosion {
    /// Seconds since detonation
    pub elapsed: f32,
    pub duration: f32,
    pub original_radius: f32,
    pub max_radius: f32,
}

impl Explosion {
    pub fn new(original_radius: f32, multiplier: f32, duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            original_radius,
            max_radius: original_radius * multiplier,
        }
    }

    /// Linear progress in 0..=1
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Blast radius with `progress^easing`: fast growth, slow settle
    pub fn radius(&self, easing: f32) -> f32 {
        let eased = self.progress().powf(easing);
        self.original_radius + (self.max_radius - self.original_radius) * eased
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}

/// Bomb payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bomb {
    /// Taps left before detonation
    pub timer: u32,
    pub explosion: Option<Explosion>,
}

/// What a bubble is; the variant never changes after creation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BubbleKind {
    /// Freshly dropped, value 1-9
    Normal { value: u32 },
    /// Product of a fusion, value a multiple of 10
    Fused { value: u32, level: u32 },
    Bomb(Bomb),
    /// Seconds left on the clock face
    Clock { timer_secs: f32 },
}

/// A bubble in play
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub id: BubbleId,
    pub body: BodyHandle,
    pub kind: BubbleKind,
    pub color: BubbleColor,
    pub radius: f32,
    /// Latched on the first physics contact (one-shot drop sound)
    pub has_collided_once: bool,
    pub is_selected: bool,
    /// Session time when the top edge crossed the danger line
    pub danger_since: Option<f64>,
}

impl Bubble {
    /// Face value, `None` for bombs and clocks
    pub fn value(&self) -> Option<u32> {
        match self.kind {
            BubbleKind::Normal { value } | BubbleKind::Fused { value, .. } => Some(value),
            BubbleKind::Bomb(_) | BubbleKind::Clock { .. } => None,
        }
    }

    pub fn fusion_level(&self) -> Option<u32> {
        match self.kind {
            BubbleKind::Fused { level, .. } => Some(level),
            _ => None,
        }
    }

    pub fn is_bomb(&self) -> bool {
        matches!(self.kind, BubbleKind::Bomb(_))
    }

    pub fn is_clock(&self) -> bool {
        matches!(self.kind, BubbleKind::Clock { .. })
    }

    pub fn is_exploding(&self) -> bool {
        matches!(
            self.kind,
            BubbleKind::Bomb(Bomb {
                explosion: Some(_),
                ..
            })
        )
    }

    /// Normal and fused bubbles carry numbers and can fuse or be frozen
    pub fn is_numbered(&self) -> bool {
        self.value().is_some()
    }
}
