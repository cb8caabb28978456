//! Moving bodies: their transform, velocity and bounding box.

use cgmath::{InnerSpace, Point3, Rad, Vector3};

use super::aabb::Aabb;
use crate::session::config::PlayerConfig;

/// Position and orientation of an entity. The position is the minimum corner of its
/// bounding box; yaw turns around +Z and pitch tilts the view up or down.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    /// Minimum corner of the bounding box.
    pub position: Point3<f32>,
    /// Rotation around +Z.
    pub yaw: Rad<f32>,
    /// Tilt of the view, positive upwards.
    pub pitch: Rad<f32>,
}

impl Transform {
    /// A transform at `position` looking along +X.
    pub fn new(position: Point3<f32>) -> Self {
        Transform {
            position,
            yaw: Rad(0.0),
            pitch: Rad(0.0),
        }
    }
}

/// A moving body with an axis-aligned bounding box.
#[derive(Clone, Debug)]
pub struct Entity {
    /// Position and orientation.
    pub transform: Transform,
    /// Velocity in blocks per second.
    pub velocity: Vector3<f32>,
    /// Extents of the bounding box.
    pub bounding_box: Vector3<f32>,
    /// Offset of the camera from the minimum corner.
    pub eye_offset: Vector3<f32>,
    /// Standing on a surface after the last physics step.
    pub grounded: bool,
    /// Touched anything during the last physics step.
    pub collided: bool,
}

impl Entity {
    /// Creates a resting entity with its eye at the center of the box.
    pub fn new(position: Point3<f32>, bounding_box: Vector3<f32>) -> Self {
        Entity {
            transform: Transform::new(position),
            velocity: Vector3::new(0.0, 0.0, 0.0),
            bounding_box,
            eye_offset: bounding_box * 0.5,
            grounded: false,
            collided: false,
        }
    }

    /// Creates the player entity described by `config` at `position`.
    pub fn player(position: Point3<f32>, config: &PlayerConfig) -> Self {
        let mut entity = Entity::new(position, config.bounding_box.into());
        entity.eye_offset = config.eye_offset.into();
        entity
    }

    /// Minimum corner of the bounding box.
    pub fn position(&self) -> Point3<f32> {
        self.transform.position
    }

    /// The bounding box in world space.
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.transform.position, self.bounding_box)
    }

    /// World-space position of the camera.
    pub fn eye_position(&self) -> Point3<f32> {
        self.transform.position + self.eye_offset
    }

    /// Horizontal facing direction.
    pub fn forward(&self) -> Vector3<f32> {
        let (sin, cos) = self.transform.yaw.0.sin_cos();
        Vector3::new(cos, sin, 0.0)
    }

    /// Horizontal direction to the right of [`Entity::forward`].
    pub fn right(&self) -> Vector3<f32> {
        let forward = self.forward();
        Vector3::new(forward.y, -forward.x, 0.0)
    }

    /// Full view direction including pitch.
    pub fn look_direction(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.transform.pitch.0.sin_cos();
        (self.forward() * cos_pitch + Vector3::unit_z() * sin_pitch).normalize()
    }

    /// Integrates a force (unit mass) over `dt` into the velocity.
    pub fn apply_force(&mut self, force: Vector3<f32>, dt: f32) {
        self.velocity += force * dt;
    }

    /// Adds an instantaneous velocity change.
    pub fn apply_impulse(&mut self, impulse: Vector3<f32>) {
        self.velocity += impulse;
    }

    /// Like [`Entity::apply_force`], but the velocity change is capped at `max_delta`.
    /// Used for braking, where overshooting would reverse the motion.
    pub fn apply_force_clamped(&mut self, force: Vector3<f32>, dt: f32, max_delta: f32) {
        let delta = force * dt;
        let magnitude = delta.magnitude();
        if magnitude > max_delta && magnitude > 0.0 {
            self.velocity += delta * (max_delta / magnitude);
        } else {
            self.velocity += delta;
        }
    }
}
