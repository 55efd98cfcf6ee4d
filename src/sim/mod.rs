//! Bubble simulation and fusion core
//!
//! All gameplay logic lives here. Like the rest of the crate it is
//! single-threaded and deterministic for a given seed:
//! - Time only advances through `FusionEngine::tick`
//! - Seeded RNG only (value bag, colours, spawn rolls)
//! - Stable iteration order (by bubble id)
//! - No rendering or platform dependencies

pub mod bag;
pub mod engine;
pub mod factory;
pub mod hooks;
pub mod physics;
pub mod score;
pub mod selection;
pub mod special;
pub mod state;

pub use bag::ValueBag;
pub use engine::{BubbleView, FusionEngine, FusionOutcome, TapOutcome, fusion_sum};
pub use factory::{BubbleFactory, BubbleSpec, SpawnKind, SpawnRules, bubble_radius};
pub use hooks::{FusionEvent, FusionSum, Hooks};
pub use physics::{BodyHandle, BodyMaterial, CollisionPair, PhysicsWorld};
pub use score::{FusionScore, ScoreManager, ScoreUpdate};
pub use selection::{SelectOutcome, Selection};
pub use special::ClockPause;
pub use state::{Bomb, Bubble, BubbleId, BubbleKind, Explosion, GamePhase};
