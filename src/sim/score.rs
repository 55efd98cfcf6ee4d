//! Score ledger
//!
//! Fusions add points (base + high-value, perfect and same-colour bonuses);
//! bomb detonations subtract a penalty, floored at zero. Every change is
//! reported to an optional listener.

use crate::color::BubbleColor;
use crate::consts::*;

/// Change notification sent after every score mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub score: u64,
    /// Signed change (negative for penalties)
    pub delta: i64,
    /// Sum of the fusion that scored, `None` for penalties and resets
    pub fusion_sum: Option<u32>,
    pub color_bonus: bool,
}

/// Points awarded for one fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FusionScore {
    pub total_points: u64,
    /// Part of the total that came from matching colours (0 if none)
    pub color_bonus: u64,
}

impl FusionScore {
    pub fn color_bonus_applied(&self) -> bool {
        self.color_bonus > 0
    }
}

pub type ScoreListener = Box<dyn FnMut(ScoreUpdate)>;

#[derive(Default)]
pub struct ScoreManager {
    score: u64,
    on_update: Option<ScoreListener>,
}

impl std::fmt::Debug for ScoreManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreManager")
            .field("score", &self.score)
            .field("listener", &self.on_update.is_some())
            .finish()
    }
}

impl ScoreManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// 1-based level for the current score
    pub fn level(&self, level_up_score: u64) -> u32 {
        (self.score / level_up_score.max(1)) as u32 + 1
    }

    pub fn set_listener(&mut self, listener: Option<ScoreListener>) {
        self.on_update = listener;
    }

    /// Score a fusion of `sum`, optionally checking the two input colours
    pub fn add_score(
        &mut self,
        sum: u32,
        colors: Option<(&BubbleColor, &BubbleColor)>,
    ) -> FusionScore {
        let base = sum as u64 * MULTIPLIER_BONUS;
        let mut bonus = 0;

        if sum >= HIGH_VALUE_THRESHOLD {
            bonus += (sum / 10) as u64 * HIGH_VALUE_BONUS;
        }
        if sum == PERFECT_SUM {
            bonus += PERFECT_FUSION_BONUS;
        }

        let color_bonus = match colors {
            Some((a, b)) if a.same_pigment(b) => sum as u64 * COLOR_BONUS_MULTIPLIER,
            _ => 0,
        };
        bonus += color_bonus;

        let total_points = base + bonus;
        self.score += total_points;
        self.notify(total_points as i64, Some(sum), color_bonus > 0);

        FusionScore {
            total_points,
            color_bonus,
        }
    }

    /// Subtract a penalty without going below zero; returns points actually lost
    pub fn subtract_points(&mut self, points: u64) -> u64 {
        let lost = points.min(self.score);
        self.score -= lost;
        self.notify(-(lost as i64), None, false);
        lost
    }

    pub fn reset(&mut self) {
        self.score = 0;
        self.notify(0, None, false);
    }

    fn notify(&mut self, delta: i64, fusion_sum: Option<u32>, color_bonus: bool) {
        let update = ScoreUpdate {
            score: self.score,
            delta,
            fusion_sum,
            color_bonus,
        };
        if let Some(listener) = self.on_update.as_mut() {
            listener(update);
        }
    }
}
