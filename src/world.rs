//! Headless circle physics on rapier
//!
//! Wraps a rapier pipeline in the [`PhysicsWorld`] surface the engine talks
//! to: dynamic circles, an open-topped container (floor and two side walls
//! built from fixed cuboids) and collision-start events collected through a
//! channel. Rapier handles are mapped to stable [`BodyHandle`]s that only grow.

use std::collections::BTreeMap;

use glam::Vec2;
use rapier2d::crossbeam::channel::{Receiver, unbounded};
use rapier2d::prelude::*;

use crate::consts::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::sim::physics::{BodyHandle, BodyMaterial, CollisionPair, PhysicsWorld};

/// Downward acceleration (pixels/s²)
pub const GRAVITY: f32 = 800.0;
/// Mass per unit area
pub const DENSITY: f32 = 0.001;
/// Thickness of the container walls
pub const WALL_THICKNESS: f32 = 50.0;

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Rapier side of one body
#[derive(Debug, Clone, Copy)]
struct Entry {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// Headless implementation of [`PhysicsWorld`]
pub struct SimpleWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    events: ChannelEventCollector,
    collision_recv: Receiver<CollisionEvent>,
    /// Keyed by handle so iteration is deterministic
    entries: BTreeMap<BodyHandle, Entry>,
    next_handle: u32,
    width: f32,
    height: f32,
    walls: Vec<BodyHandle>,
    /// Bodies carrying a user force for the next step
    forced: Vec<RigidBodyHandle>,
    pending: Vec<CollisionPair>,
}

impl Default for SimpleWorld {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl SimpleWorld {
    pub fn new(width: f32, height: f32) -> Self {
        let (collision_send, collision_recv) = unbounded();
        // Contact force events are never enabled, the receiver can go
        let (force_send, _) = unbounded();
        let mut world = Self {
            gravity: vector![0.0, GRAVITY],
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            events: ChannelEventCollector::new(collision_send, force_send),
            collision_recv,
            entries: BTreeMap::new(),
            next_handle: 1,
            width,
            height,
            walls: Vec::new(),
            forced: Vec::new(),
            pending: Vec::new(),
        };
        world.create_walls();
        world
    }

    /// Zero gravity is handy for positioning bodies in tests
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = to_vector(gravity);
        self
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn walls(&self) -> &[BodyHandle] {
        &self.walls
    }

    pub fn radius(&self, body: BodyHandle) -> Option<f32> {
        let entry = self.entries.get(&body)?;
        let ball = self.colliders.get(entry.collider)?.shape().as_ball()?;
        Some(ball.radius)
    }

    pub fn is_static(&self, body: BodyHandle) -> Option<bool> {
        self.rigid_body(body).map(RigidBody::is_fixed)
    }

    /// Teleport a body (tests and debugging)
    pub fn set_position(&mut self, body: BodyHandle, pos: Vec2) {
        if let Some(rb) = self.rigid_body_mut(body) {
            rb.set_translation(to_vector(pos), true);
        }
    }

    fn rigid_body(&self, body: BodyHandle) -> Option<&RigidBody> {
        let entry = self.entries.get(&body)?;
        self.rigid_bodies.get(entry.body)
    }

    fn rigid_body_mut(&mut self, body: BodyHandle) -> Option<&mut RigidBody> {
        let entry = self.entries.get(&body)?;
        self.rigid_bodies.get_mut(entry.body)
    }

    fn insert(&mut self, body: RigidBodyBuilder, collider: ColliderBuilder) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        let body = self.rigid_bodies.insert(body.user_data(u128::from(handle.0)));
        let collider = self.colliders.insert_with_parent(
            collider.user_data(u128::from(handle.0)),
            body,
            &mut self.rigid_bodies,
        );
        self.entries.insert(handle, Entry { body, collider });
        handle
    }

    /// Floor and side walls; the top stays open so bubbles can fall in
    fn create_walls(&mut self) {
        let material = BodyMaterial::default();
        let (w, h, half) = (self.width, self.height, WALL_THICKNESS / 2.0);
        let walls = [
            // Floor, its top face on y = height
            (vector![w / 2.0, h + half], half + w / 2.0 + WALL_THICKNESS, half),
            // Side walls reach well above the screen
            (vector![-half, h / 2.0], half, h),
            (vector![w + half, h / 2.0], half, h),
        ];
        for (center, hx, hy) in walls {
            let body = RigidBodyBuilder::fixed().translation(center);
            let collider = ColliderBuilder::cuboid(hx, hy)
                .restitution(material.restitution)
                .friction(material.friction);
            let handle = self.insert(body, collider);
            self.walls.push(handle);
        }
    }

    /// Map a rapier collider back to its body handle
    fn handle_of(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        let data = self.colliders.get(collider)?.user_data;
        u32::try_from(data).ok().map(BodyHandle)
    }

    fn collect_starts(&mut self) {
        let mut started = Vec::new();
        while let Ok(event) = self.collision_recv.try_recv() {
            if let CollisionEvent::Started(c1, c2, _) = event {
                if let (Some(a), Some(b)) = (self.handle_of(c1), self.handle_of(c2)) {
                    started.push(if a < b {
                        CollisionPair { a, b }
                    } else {
                        CollisionPair { a: b, b: a }
                    });
                }
            }
        }
        // Report in handle order
        started.sort_unstable_by_key(|p| (p.a, p.b));
        started.dedup();
        self.pending.extend(started);
    }
}

impl PhysicsWorld for SimpleWorld {
    fn create_circle(&mut self, pos: Vec2, radius: f32, material: BodyMaterial) -> BodyHandle {
        // Air friction is given per 60 Hz step, damping is per second
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(pos))
            .linear_damping(material.air_friction * 60.0);
        let collider = ColliderBuilder::ball(radius)
            .density(DENSITY)
            .restitution(material.restitution)
            .friction(material.friction)
            .active_events(ActiveEvents::COLLISION_EVENTS);
        self.insert(body, collider)
    }

    fn remove_body(&mut self, body: BodyHandle) {
        let Some(entry) = self.entries.remove(&body) else {
            return;
        };
        self.rigid_bodies.remove(
            entry.body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.walls.retain(|&w| w != body);
        self.forced.retain(|&h| h != entry.body);
    }

    fn bodies(&self) -> Vec<BodyHandle> {
        self.entries.keys().copied().collect()
    }

    fn bodies_at_point(&self, point: Vec2) -> Vec<BodyHandle> {
        self.entries
            .keys()
            .copied()
            .filter(|&handle| {
                let (Some(r), Some(pos)) = (self.radius(handle), self.position(handle)) else {
                    return false;
                };
                let d = point - pos;
                // Bounding box first, then the exact circle
                d.x.abs() <= r && d.y.abs() <= r && d.length_squared() <= r * r
            })
            .collect()
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.rigid_body(body).map(|rb| to_vec2(rb.translation()))
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.rigid_body(body).map(|rb| to_vec2(rb.linvel()))
    }

    fn apply_force(&mut self, body: BodyHandle, _point: Vec2, force: Vec2) {
        let Some(entry) = self.entries.get(&body).copied() else {
            return;
        };
        if let Some(rb) = self.rigid_bodies.get_mut(entry.body) {
            rb.add_force(to_vector(force), true);
            self.forced.push(entry.body);
        }
    }

    fn set_static(&mut self, body: BodyHandle, is_static: bool) {
        if let Some(rb) = self.rigid_body_mut(body) {
            if is_static {
                // Fixed bodies ignore velocity writes, so clear it first
                rb.set_linvel(vector![0.0, 0.0], false);
                rb.set_angvel(0.0, false);
                rb.set_body_type(RigidBodyType::Fixed, true);
            } else {
                rb.set_body_type(RigidBodyType::Dynamic, true);
            }
        }
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(rb) = self.rigid_body_mut(body) {
            rb.set_linvel(to_vector(velocity), true);
        }
    }

    fn scale_body(&mut self, body: BodyHandle, factor: f32) {
        let Some(radius) = self.radius(body) else {
            return;
        };
        if let Some(entry) = self.entries.get(&body) {
            if let Some(collider) = self.colliders.get_mut(entry.collider) {
                collider.set_shape(SharedShape::ball(radius * factor));
            }
        }
    }

    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &self.events,
        );
        // User forces persist in rapier until cleared
        for handle in std::mem::take(&mut self.forced) {
            if let Some(rb) = self.rigid_bodies.get_mut(handle) {
                rb.reset_forces(false);
            }
        }
        self.collect_starts();
    }

    fn set_bounds(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        for wall in std::mem::take(&mut self.walls) {
            self.remove_body(wall);
        }
        self.create_walls();
    }

    fn drain_collision_starts(&mut self) -> Vec<CollisionPair> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn run(world: &mut SimpleWorld, seconds: f32) {
        let steps = (seconds / SIM_DT) as usize;
        for _ in 0..steps {
            world.step(SIM_DT);
        }
    }

    #[test]
    fn test_new_world_has_three_walls() {
        let world = SimpleWorld::new(400.0, 600.0);
        assert_eq!(world.walls().len(), 3);
        assert_eq!(world.bodies().len(), 3);
    }

    #[test]
    fn test_ball_rests_on_floor_and_reports_one_start() {
        let mut world = SimpleWorld::new(400.0, 600.0);
        let ball = world.create_circle(Vec2::new(200.0, 100.0), 20.0, BodyMaterial::default());

        run(&mut world, 10.0);

        let pos = world.position(ball).unwrap();
        assert!((pos.y - 580.0).abs() < 3.0, "ball at {pos}");
        let starts = world.drain_collision_starts();
        let floor = world.walls()[0];
        let floor_hits = starts
            .iter()
            .filter(|p| (p.a == floor || p.b == floor) && (p.a == ball || p.b == ball))
            .count();
        assert!(floor_hits >= 1);
        // Resting contact does not keep re-reporting
        run(&mut world, 1.0);
        assert!(world.drain_collision_starts().is_empty());
    }

    #[test]
    fn test_two_balls_collide() {
        let mut world = SimpleWorld::new(400.0, 600.0).with_gravity(Vec2::ZERO);
        let a = world.create_circle(Vec2::new(100.0, 300.0), 20.0, BodyMaterial::default());
        let b = world.create_circle(Vec2::new(160.0, 300.0), 20.0, BodyMaterial::default());
        world.set_velocity(a, Vec2::new(200.0, 0.0));

        run(&mut world, 0.5);

        let starts = world.drain_collision_starts();
        assert!(starts.contains(&CollisionPair { a, b }));
        // Momentum moved into b
        assert!(world.velocity(b).unwrap().x > 0.0);
    }

    #[test]
    fn test_static_body_stays_put() {
        let mut world = SimpleWorld::new(400.0, 600.0);
        let ball = world.create_circle(Vec2::new(200.0, 100.0), 20.0, BodyMaterial::default());
        world.set_static(ball, true);
        run(&mut world, 1.0);
        assert_eq!(world.position(ball), Some(Vec2::new(200.0, 100.0)));
        assert_eq!(world.is_static(ball), Some(true));
    }

    #[test]
    fn test_bodies_at_point_uses_exact_circle() {
        let mut world = SimpleWorld::new(400.0, 600.0);
        let ball = world.create_circle(Vec2::new(100.0, 100.0), 10.0, BodyMaterial::default());
        assert_eq!(world.bodies_at_point(Vec2::new(105.0, 105.0)), vec![ball]);
        // Inside the bounding box, outside the circle
        assert!(world.bodies_at_point(Vec2::new(109.0, 109.0)).is_empty());
    }

    #[test]
    fn test_scale_and_force() {
        let mut world = SimpleWorld::new(400.0, 600.0).with_gravity(Vec2::ZERO);
        let ball = world.create_circle(Vec2::new(100.0, 100.0), 10.0, BodyMaterial::default());
        world.scale_body(ball, 2.5);
        assert_eq!(world.radius(ball), Some(25.0));

        world.apply_force(ball, Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0));
        world.step(SIM_DT);
        assert!(world.velocity(ball).unwrap().x > 0.0);
    }

    #[test]
    fn test_resize_rebuilds_walls() {
        let mut world = SimpleWorld::new(400.0, 600.0);
        let old_walls = world.walls().to_vec();
        world.set_bounds(800.0, 900.0);
        assert_eq!(world.size(), (800.0, 900.0));
        assert_eq!(world.walls().len(), 3);
        assert!(world.walls().iter().all(|w| !old_walls.contains(w)));
        assert_eq!(world.bodies().len(), 3);
    }

    #[test]
    fn test_remove_unknown_body_is_ignored() {
        let mut world = SimpleWorld::default();
        world.remove_body(BodyHandle(999));
        assert_eq!(world.bodies().len(), 3);
    }

    #[test]
    fn test_force_lasts_one_step() {
        let mut world = SimpleWorld::new(400.0, 600.0).with_gravity(Vec2::ZERO);
        let ball = world.create_circle(Vec2::new(200.0, 300.0), 10.0, BodyMaterial::default());
        world.apply_force(ball, Vec2::new(200.0, 300.0), Vec2::new(50.0, 0.0));
        world.step(SIM_DT);
        let first = world.velocity(ball).unwrap().x;
        world.step(SIM_DT);
        // Only air friction acts on the second step
        assert!(first > 0.0);
        assert!(world.velocity(ball).unwrap().x <= first);
    }

    #[test]
    fn test_frozen_body_thaws() {
        let mut world = SimpleWorld::new(400.0, 600.0).with_gravity(Vec2::ZERO);
        let ball = world.create_circle(Vec2::new(200.0, 300.0), 10.0, BodyMaterial::default());
        world.set_velocity(ball, Vec2::new(0.0, 100.0));
        world.set_static(ball, true);
        assert_eq!(world.velocity(ball), Some(Vec2::ZERO));

        world.set_static(ball, false);
        world.set_velocity(ball, Vec2::new(0.0, 100.0));
        run(&mut world, 0.2);
        assert_eq!(world.is_static(ball), Some(false));
        assert!(world.position(ball).unwrap().y > 300.0);
    }
}
