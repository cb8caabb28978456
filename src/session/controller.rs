//! # Player Controller
//!
//! Turns one frame of player input into forces on the player entity and, at most every
//! `action_cooldown` seconds, a block edit on the voxel under the crosshair.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Point3, Rad, Vector3};

use crate::session::{
    config::ControllerConfig,
    physics::{entity::Entity, ray_cast::ray_cast},
    voxels::{block::block_type::BlockType, dimension::Dimension},
};

/// Keeps the view from flipping over at the poles.
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Input state of one frame.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PlayerAction {
    /// Accelerate along the horizontal view direction.
    pub move_forward: bool,
    /// Accelerate against the horizontal view direction.
    pub move_backward: bool,
    /// Strafe to the left.
    pub move_left: bool,
    /// Strafe to the right.
    pub move_right: bool,
    /// Jump, if standing on the ground.
    pub jump: bool,
    /// Cursor motion since the last frame, `(horizontal, vertical)`.
    pub rotate: (f32, f32),
    /// Damage the selected block.
    pub primary: bool,
    /// Place a block against the selected face.
    pub secondary: bool,
}

/// A block edit requested by the player.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockEdit {
    /// Damage the block at the position.
    Damage(Point3<i32>),
    /// Place a block of the given type at the position.
    Place(Point3<i32>, BlockType),
}

/// Turns per-frame input into player movement and block edits.
///
/// The controller owns the edit cooldown and the current ray-cast selection.
#[derive(Clone, Debug, Default)]
pub struct PlayerController {
    cooldown: f32,
    selection: Option<Point3<i32>>,
    placement: Option<Point3<i32>>,
}

impl PlayerController {
    /// Creates a controller with no selection and no pending cooldown.
    pub fn new() -> Self {
        Self::default()
    }

    /// The solid block under the crosshair after the last update.
    pub fn selection(&self) -> Option<Point3<i32>> {
        self.selection
    }

    /// Where a placed block would go after the last update.
    pub fn placement(&self) -> Option<Point3<i32>> {
        self.placement
    }

    /// Applies one frame of input to `entity`.
    ///
    /// # Returns
    /// The block edit the player triggered this frame, if any.
    pub fn update(
        &mut self,
        entity: &mut Entity,
        world: &Dimension,
        action: &PlayerAction,
        dt: f32,
        config: &ControllerConfig,
    ) -> Option<BlockEdit> {
        if action.jump && entity.grounded {
            entity.apply_impulse(Vector3::unit_z() * config.jump_strength);
        }
        self.apply_movement(entity, action, dt, config);

        let (dx, dy) = action.rotate;
        let transform = &mut entity.transform;
        transform.yaw -= Rad(dx * config.rotation_speed);
        transform.pitch = Rad((transform.pitch.0 - dy * config.rotation_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT));

        self.select(entity, world, config);

        self.cooldown = (self.cooldown - dt).max(0.0);
        if self.cooldown > 0.0 {
            return None;
        }
        let edit = if action.primary {
            self.selection.map(BlockEdit::Damage)
        } else if action.secondary {
            self.placement
                .map(|position| BlockEdit::Place(position, config.placement_block))
        } else {
            None
        };
        if edit.is_some() {
            self.cooldown = config.action_cooldown;
        }
        edit
    }

    fn apply_movement(&self, entity: &mut Entity, action: &PlayerAction, dt: f32, config: &ControllerConfig) {
        let forward = entity.forward();
        let right = entity.right();
        let mut direction = Vector3::new(0.0, 0.0, 0.0);
        if action.move_forward {
            direction += forward;
        }
        if action.move_backward {
            direction -= forward;
        }
        if action.move_right {
            direction += right;
        }
        if action.move_left {
            direction -= right;
        }

        if direction.magnitude2() > 0.0 {
            entity.apply_force(direction.normalize() * config.movement_force, dt);
            return;
        }

        // brake horizontal motion without reversing it
        let horizontal = Vector3::new(entity.velocity.x, entity.velocity.y, 0.0);
        let speed = horizontal.magnitude();
        if speed > 0.0 {
            entity.apply_force_clamped(-horizontal.normalize() * config.movement_force, dt, speed);
        }
    }

    fn select(&mut self, entity: &Entity, world: &Dimension, config: &ControllerConfig) {
        let hit = ray_cast(
            entity.eye_position(),
            entity.look_direction(),
            config.ray_cast_length,
            |voxel| world.is_solid(voxel),
        );
        self.selection = hit.map(|hit| hit.position);
        self.placement = hit
            .filter(|hit| hit.previous != hit.position)
            .map(|hit| hit.previous);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;
    use crate::session::voxels::{
        block::Block,
        chunk::ChunkData,
    };

    fn floor_world() -> Dimension {
        let mut dimension = Dimension::new();
        dimension.insert_generated(Point2::new(0, 0), ChunkData::with_height(1));
        for y in 0..16 {
            for x in 0..16 {
                dimension.set_block(Point3::new(x, y, 0), Block::new(BlockType::DIRT));
            }
        }
        dimension
    }

    fn looking_down() -> Entity {
        let mut entity = Entity::new(Point3::new(4.0, 4.0, 1.0), Vector3::new(0.9, 0.9, 1.9));
        entity.eye_offset = Vector3::new(0.45, 0.45, 1.6);
        entity.transform.pitch = Rad(-PITCH_LIMIT);
        entity
    }

    #[test]
    fn test_selection_and_placement_below_player() {
        let world = floor_world();
        let mut entity = looking_down();
        let mut controller = PlayerController::new();
        let config = ControllerConfig::default();

        let edit = controller.update(&mut entity, &world, &PlayerAction::default(), 0.016, &config);
        assert_eq!(edit, None);
        assert_eq!(controller.selection(), Some(Point3::new(4, 4, 0)));
        assert_eq!(controller.placement(), Some(Point3::new(4, 4, 1)));

        let action = PlayerAction {
            secondary: true,
            ..PlayerAction::default()
        };
        let edit = controller.update(&mut entity, &world, &action, 0.016, &config);
        assert_eq!(edit, Some(BlockEdit::Place(Point3::new(4, 4, 1), BlockType::STONE)));
    }

    #[test]
    fn test_cooldown_limits_edit_rate() {
        let world = floor_world();
        let mut entity = looking_down();
        let mut controller = PlayerController::new();
        let config = ControllerConfig::default();
        let action = PlayerAction {
            primary: true,
            ..PlayerAction::default()
        };

        let edits = (0..10)
            .filter_map(|_| controller.update(&mut entity, &world, &action, 0.06, &config))
            .count();
        // edits on frames 1, 5 and 9
        assert_eq!(edits, 3);
    }

    #[test]
    fn test_jump_requires_ground() {
        let world = Dimension::new();
        let mut entity = looking_down();
        let mut controller = PlayerController::new();
        let config = ControllerConfig::default();
        let action = PlayerAction {
            jump: true,
            ..PlayerAction::default()
        };

        controller.update(&mut entity, &world, &action, 0.016, &config);
        assert_eq!(entity.velocity.z, 0.0);

        entity.grounded = true;
        controller.update(&mut entity, &world, &action, 0.016, &config);
        assert_eq!(entity.velocity.z, config.jump_strength);
    }

    #[test]
    fn test_braking_stops_without_reversing() {
        let world = Dimension::new();
        let mut entity = looking_down();
        entity.velocity = Vector3::new(0.1, 0.0, 0.0);
        let mut controller = PlayerController::new();
        controller.update(&mut entity, &world, &PlayerAction::default(), 0.1, &ControllerConfig::default());
        assert!(entity.velocity.x.abs() < 1e-6);
    }
}
