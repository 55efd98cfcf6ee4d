//! Boundary to the rigid-body physics collaborator
//!
//! The engine never integrates motion itself. It creates circle bodies, reads
//! their positions, nudges them (forces, velocities, freezing, scaling) and
//! consumes collision-start pairs. [`crate::world::SimpleWorld`] is the
//! rapier-backed implementation used by every build.

use glam::Vec2;

/// Opaque handle to a body owned by the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// Surface properties for a new body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMaterial {
    /// Bounciness (0 = dead stop, 1 = perfectly elastic)
    pub restitution: f32,
    pub friction: f32,
    /// Fraction of velocity lost per 60 Hz step
    pub air_friction: f32,
}

impl Default for BodyMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.6,
            friction: 0.3,
            air_friction: 0.01,
        }
    }
}

/// A pair of bodies that started touching during the last step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

/// Capabilities the engine needs from a physics backend
pub trait PhysicsWorld {
    /// Create a dynamic circle and add it to the world
    fn create_circle(&mut self, pos: Vec2, radius: f32, material: BodyMaterial) -> BodyHandle;

    /// Remove a body; unknown handles are ignored
    fn remove_body(&mut self, body: BodyHandle);

    /// Every body in the world, walls included
    fn bodies(&self) -> Vec<BodyHandle>;

    /// Circles containing `point` (bounding box first, then exact distance)
    fn bodies_at_point(&self, point: Vec2) -> Vec<BodyHandle>;

    fn position(&self, body: BodyHandle) -> Option<Vec2>;

    fn velocity(&self, body: BodyHandle) -> Option<Vec2>;

    /// Apply a force at a world-space point for the next step
    fn apply_force(&mut self, body: BodyHandle, point: Vec2, force: Vec2);

    fn set_static(&mut self, body: BodyHandle, is_static: bool);

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2);

    /// Scale a circle's radius by `factor`
    fn scale_body(&mut self, body: BodyHandle, factor: f32);

    /// Advance the simulation by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Resize the container (walls are rebuilt)
    fn set_bounds(&mut self, width: f32, height: f32);

    /// Take the collision-start pairs reported since the last call, in order
    fn drain_collision_starts(&mut self) -> Vec<CollisionPair>;
}
