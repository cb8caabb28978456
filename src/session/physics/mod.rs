//! # Physics
//!
//! Integrates entity motion and keeps bounding boxes out of solid voxels.
//!
//! ## Step
//!
//! 1. Friction damps the velocity, using the grounded state of the previous step
//! 2. Gravity accelerates the entity downward, capped at terminal velocity
//! 3. The displacement of the step is swept against every solid voxel it could reach,
//!    nearest first. Each contact truncates the displacement on its axis and stops the
//!    velocity on that axis
//! 4. If the box still overlaps a solid voxel, it is pushed out along the shallowest
//!    direction, a bounded number of times
//! 5. If that fails, the step is undone
//!
//! The world is only seen through [`SolidQuery`]; absent or ungenerated terrain is empty.

pub mod aabb;
pub mod entity;
pub mod ray_cast;

use std::collections::HashSet;

use cgmath::{Point3, Vector3};
use log::warn;

use self::{
    aabb::{swept_aabb, Aabb, OVERLAP_TOLERANCE},
    entity::Entity,
};
use crate::session::{config::PhysicsConfig, voxels::dimension::Dimension};

/// Answers whether a voxel blocks movement.
pub trait SolidQuery {
    /// Returns `true` if the voxel at `position` is solid.
    fn is_solid(&self, position: Point3<i32>) -> bool;
}

impl SolidQuery for Dimension {
    fn is_solid(&self, position: Point3<i32>) -> bool {
        Dimension::is_solid(self, position)
    }
}

impl SolidQuery for HashSet<Point3<i32>> {
    fn is_solid(&self, position: Point3<i32>) -> bool {
        self.contains(&position)
    }
}

/// How a physics step ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CollisionOutcome {
    /// No contact with any solid voxel.
    Free,
    /// The swept motion was truncated by at least one contact.
    Collided,
    /// Residual overlap was pushed out in the given number of passes.
    Corrected {
        /// Push-out passes needed.
        passes: u32,
    },
    /// Overlap could not be resolved; position and velocity were restored.
    RolledBack,
}

/// Push-out directions in the order ties are resolved: +X, -X, +Y, -Y, +Z, -Z.
const PUSH_DIRECTIONS: [(usize, f32); 6] = [
    (0, 1.0),
    (0, -1.0),
    (1, 1.0),
    (1, -1.0),
    (2, 1.0),
    (2, -1.0),
];

/// Integrates entity motion and resolves it against solid voxels.
///
/// A step applies friction, gravity and the terminal velocity clamp, then sweeps the
/// bounding box through the world nearest contact first. Overlap left by float error is
/// pushed out along the shallowest axis, and a step that cannot be cleaned up within
/// `max_collision_iterations` passes is rolled back.
#[derive(Clone, Debug)]
pub struct CollisionResolver {
    config: PhysicsConfig,
}

impl CollisionResolver {
    /// Creates a resolver for the given physics constants.
    pub fn new(config: PhysicsConfig) -> Self {
        CollisionResolver { config }
    }

    /// The physics constants in use.
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Advances `entity` by `dt` seconds against the solid voxels of `world`.
    pub fn step(&self, entity: &mut Entity, world: &impl SolidQuery, dt: f32) -> CollisionOutcome {
        let start_position = entity.transform.position;
        let start_velocity = entity.velocity;

        let friction = if entity.grounded {
            self.config.friction_grounded
        } else {
            self.config.friction_air
        };
        entity.velocity += (-friction * entity.velocity) * dt;
        entity.velocity.z -= self.config.gravity * dt;
        entity.velocity.z = entity.velocity.z.max(-self.config.terminal_velocity);

        entity.grounded = false;
        entity.collided = false;

        let displacement = entity.velocity * dt;
        let displacement = self.sweep(entity, world, displacement);
        entity.transform.position += displacement;

        let mut passes = 0;
        while let Some(voxel) = first_overlap(&entity.aabb(), world) {
            if passes == self.config.max_collision_iterations {
                warn!(
                    "Could not resolve collision at {:?} after {} passes, rolling back",
                    entity.transform.position, passes
                );
                entity.transform.position = start_position;
                entity.velocity = start_velocity;
                return CollisionOutcome::RolledBack;
            }
            push_out(entity, voxel);
            passes += 1;
        }

        if passes > 0 {
            CollisionOutcome::Corrected { passes }
        } else if entity.collided {
            CollisionOutcome::Collided
        } else {
            CollisionOutcome::Free
        }
    }

    /// Truncates `displacement` against every solid voxel the motion could touch.
    fn sweep(
        &self,
        entity: &mut Entity,
        world: &impl SolidQuery,
        mut displacement: Vector3<f32>,
    ) -> Vector3<f32> {
        let moving = entity.aabb();
        let reach = moving.union(&moving.translated(displacement));
        let center = moving.center();

        let mut candidates: Vec<(f32, Point3<i32>)> = reach
            .voxels()
            .filter(|voxel| world.is_solid(*voxel))
            .map(|voxel| {
                let voxel_center = Aabb::unit(voxel).center();
                let distance = (0..3)
                    .map(|axis| (voxel_center[axis] - center[axis]).powi(2))
                    .sum::<f32>();
                (distance, voxel)
            })
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (_, voxel) in candidates {
            let Some(hit) = swept_aabb(&moving, displacement, &Aabb::unit(voxel)) else {
                continue;
            };
            if !(0.0..=1.0).contains(&hit.t_in) {
                continue;
            }
            displacement[hit.axis] = hit.entry_distance;
            entity.velocity[hit.axis] = 0.0;
            entity.collided = true;
            if hit.normal.z > 0.0 {
                entity.grounded = true;
            }
        }
        displacement
    }
}

fn first_overlap(aabb: &Aabb, world: &impl SolidQuery) -> Option<Point3<i32>> {
    aabb.voxels().find(|voxel| {
        world.is_solid(*voxel) && aabb.overlaps_with_tolerance(&Aabb::unit(*voxel), OVERLAP_TOLERANCE)
    })
}

/// Moves `entity` out of `voxel` along the direction of least penetration.
fn push_out(entity: &mut Entity, voxel: Point3<i32>) {
    let aabb = entity.aabb();
    let block = Aabb::unit(voxel);

    let mut best: Option<(usize, f32, f32)> = None;
    for (axis, direction) in PUSH_DIRECTIONS {
        let depth = if direction > 0.0 {
            block.max[axis] - aabb.min[axis]
        } else {
            aabb.max[axis] - block.min[axis]
        };
        if depth > 0.0 && best.map_or(true, |(_, _, best_depth)| depth < best_depth) {
            best = Some((axis, direction, depth));
        }
    }
    let Some((axis, direction, depth)) = best else {
        return;
    };

    entity.transform.position[axis] += direction * depth;
    if entity.velocity[axis] * direction < 0.0 {
        entity.velocity[axis] = 0.0;
    }
    entity.collided = true;
    if axis == 2 && direction > 0.0 {
        entity.grounded = true;
    }
}
