//! # World Session
//!
//! The session owns one voxel world and everything that acts on it: the dimension, the
//! mesh manager, the light collaborator, the worker pool, the streaming controller and
//! the player.
//!
//! ## Key Components
//!
//! * `config` - The immutable world description
//! * `voxels` - Block data, chunks, the dimension and terrain generation
//! * `rendering` - Chunk meshing and mesh events for an external renderer
//! * `physics` - Swept AABB collision and voxel ray casts
//! * `streaming` - Chunk residency around the player
//! * `lighting` - The light invalidation seam
//! * `controller` - Player input to forces and block edits
//! * `task_management` - Worker threads for generation and meshing
//!
//! ## Tick
//!
//! [`WorldSession::tick`] runs one simulation step:
//! 1. the controller turns input into forces and at most one block edit
//! 2. the edit is applied, invalidating meshes and light
//! 3. chunks around the player are generated, meshed or evicted
//! 4. the player moves and collides
//!
//! Every task published during a tick completes before the tick returns.

use std::{sync::Arc, time::Duration};

use cgmath::{Point2, Point3};
use log::{debug, info};
use thiserror::Error;

use self::{
    config::{ConfigError, WorldConfig},
    controller::{BlockEdit, PlayerAction, PlayerController},
    lighting::{LightInvalidation, PendingLightUpdates},
    physics::{aabb::Aabb, entity::Entity, CollisionOutcome, CollisionResolver},
    rendering::{MeshEvent, MeshManager},
    streaming::{StreamingController, StreamingReport},
    task_management::{task::TaskContext, TaskManager},
    voxels::{
        block::{block_type::BlockType, Block, DamageResult},
        coords::{in_world_height, world_to_chunk},
        dimension::Dimension,
        generation::TerrainGenerator,
    },
};

pub mod config;
pub mod controller;
pub mod lighting;
pub mod physics;
pub mod rendering;
pub mod streaming;
pub mod task_management;
pub mod voxels;

/// Rounds of meshing in [`WorldSession::rebuild_dirty_meshes`].
const MESH_ROUNDS: usize = 4;

/// Why a block edit was refused. A refused edit changes nothing.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum EditRejection {
    /// The position lies below z = 0 or at or above the world height.
    #[error("{0:?} lies outside the world height")]
    OutOfBounds(Point3<i32>),
    /// The containing chunk is not resident or not generated yet.
    #[error("the chunk containing {0:?} is not generated")]
    ChunkNotLoaded(Point3<i32>),
    /// A block was to be placed on a solid position.
    #[error("{0:?} is already occupied")]
    Occupied(Point3<i32>),
    /// Air was to be placed on an empty position.
    #[error("there is no block at {0:?}")]
    NothingToRemove(Point3<i32>),
    /// The placed block would intersect the player's bounding box.
    #[error("a block at {0:?} would overlap the player")]
    OverlapsEntity(Point3<i32>),
}

/// The effect of an accepted block edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// A solid block was written into an empty position.
    Placed,
    /// A solid block was removed.
    Removed,
    /// The block took damage and survived with the given destroy level.
    Damaged {
        /// Destroy level after the hit.
        level: u8,
    },
}

/// What happened during one [`WorldSession::tick`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TickReport {
    /// The block edit requested by the player this tick and its result.
    pub edit: Option<Result<EditOutcome, EditRejection>>,
    /// Work done by the streaming pass.
    pub streaming: StreamingReport,
    /// How the player's physics step ended.
    pub collision: CollisionOutcome,
    /// Wall-clock time spent in the tick.
    pub duration: Duration,
}

/// A running voxel world.
///
/// `L` receives every block position whose lighting may have changed.
pub struct WorldSession<L: LightInvalidation = PendingLightUpdates> {
    /// The validated world description
    config: WorldConfig,
    /// All resident chunks
    dimension: Dimension,
    /// Dirty chunk tracking and mesh events
    mesh_manager: MeshManager,
    /// Receiver of light invalidations
    light: L,
    /// Worker pool for generation and meshing tasks
    task_manager: TaskManager,
    /// Terrain generator shared with generation tasks
    generator: Arc<TerrainGenerator>,
    /// Residency of chunks around the player
    streaming: StreamingController,
    resolver: CollisionResolver,
    controller: PlayerController,
    player: Entity,
}

impl WorldSession<PendingLightUpdates> {
    /// Creates a session that queues light invalidations in [`PendingLightUpdates`].
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        Self::with_light_system(config, PendingLightUpdates::new())
    }
}

impl<L: LightInvalidation> WorldSession<L> {
    /// Validates `config`, loads the chunks around the spawn column and places the
    /// player on its surface.
    ///
    /// # Errors
    /// Any [`ConfigError`] raised by [`WorldConfig::validate`].
    pub fn with_light_system(config: WorldConfig, light: L) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "Creating world session with seed {} and {} worker threads",
            config.seed, config.worker_threads
        );

        let [spawn_x, spawn_y] = config.player.spawn;
        let mut session = WorldSession {
            dimension: Dimension::new(),
            mesh_manager: MeshManager::new(),
            light,
            task_manager: TaskManager::new(config.worker_threads),
            generator: Arc::new(TerrainGenerator::new(&config)),
            streaming: StreamingController::new(config.streaming.clone()),
            resolver: CollisionResolver::new(config.physics.clone()),
            controller: PlayerController::new(),
            player: Entity::player(Point3::new(spawn_x, spawn_y, 0.0), &config.player),
            config,
        };

        let report = session.load_around_player();
        session.player.transform.position.z = session.footprint_surface() as f32;
        info!(
            "Spawned player at {:?} after generating {} chunks",
            session.player.position(),
            report.generated
        );
        Ok(session)
    }

    /// The configuration the session was created with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The loaded chunks.
    pub fn dimension(&self) -> &Dimension {
        &self.dimension
    }

    /// The player entity.
    pub fn player(&self) -> &Entity {
        &self.player
    }

    /// Mutable access to the player entity, e.g. to teleport it.
    pub fn player_mut(&mut self) -> &mut Entity {
        &mut self.player
    }

    /// The player controller with its current selection.
    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }

    /// The light invalidation collaborator.
    pub fn light(&self) -> &L {
        &self.light
    }

    /// Mutable access to the light invalidation collaborator, e.g. to drain it.
    pub fn light_mut(&mut self) -> &mut L {
        &mut self.light
    }

    /// Dirty chunk tracking and mesh events.
    pub fn mesh_manager(&self) -> &MeshManager {
        &self.mesh_manager
    }

    /// Makes sure every chunk within `radius` of `center` is generated and meshed.
    pub fn ensure_loaded(&mut self, center: Point2<i32>, radius: u32) -> StreamingReport {
        let mut ctx = TaskContext::new(&mut self.dimension, &mut self.mesh_manager, &mut self.light);
        self.streaming
            .ensure_loaded(center, radius, &self.generator, &mut self.task_manager, &mut ctx)
    }

    /// [`WorldSession::ensure_loaded`] around the player's chunk with the configured
    /// load radius.
    pub fn load_around_player(&mut self) -> StreamingReport {
        let center = world_to_chunk(self.player.position());
        self.ensure_loaded(center, self.config.streaming.load_radius)
    }

    /// Places a block, or removes one when `block_type` is [`BlockType::AIR`].
    ///
    /// An accepted edit invalidates the meshes of the containing chunk and of every
    /// neighboring chunk sharing a face with the block. A placement invalidates the
    /// light at the position; a removal also invalidates its six face neighbors.
    pub fn set_block(
        &mut self,
        position: Point3<i32>,
        block_type: BlockType,
    ) -> Result<EditOutcome, EditRejection> {
        let current = self.block_at(position)?;

        let outcome = if block_type.is_solid() {
            if current.is_solid() {
                return Err(EditRejection::Occupied(position));
            }
            if Aabb::unit(position).overlaps(&self.player.aabb()) {
                return Err(EditRejection::OverlapsEntity(position));
            }
            EditOutcome::Placed
        } else {
            if !current.is_solid() {
                return Err(EditRejection::NothingToRemove(position));
            }
            EditOutcome::Removed
        };

        if !self.dimension.set_block(position, Block::new(block_type)) {
            return Err(EditRejection::ChunkNotLoaded(position));
        }
        self.mesh_manager.invalidate_mesh_major(&self.dimension, position);
        self.mesh_manager.invalidate_mesh_minor(&self.dimension, position);
        match outcome {
            EditOutcome::Removed => self.light.invalidate_with_neighbors(position),
            _ => self.light.invalidate(position),
        }
        debug!("{:?} at {:?}", outcome, position);
        Ok(outcome)
    }

    /// Hits the block at `position` once. The block survives until its destroy level
    /// is at the maximum; the next hit removes it like [`WorldSession::set_block`] with
    /// air would.
    pub fn damage_block(&mut self, position: Point3<i32>) -> Result<EditOutcome, EditRejection> {
        let mut block = self.block_at(position)?;
        if !block.is_solid() {
            return Err(EditRejection::NothingToRemove(position));
        }

        match block.damage() {
            DamageResult::Damaged(level) => {
                self.dimension.set_block(position, block);
                self.mesh_manager.invalidate_mesh_major(&self.dimension, position);
                Ok(EditOutcome::Damaged { level })
            }
            DamageResult::Destroyed => self.set_block(position, BlockType::AIR),
        }
    }

    /// Meshes every dirty chunk.
    ///
    /// # Returns
    /// The number of meshes attached.
    pub fn rebuild_dirty_meshes(&mut self) -> usize {
        let mut ctx = TaskContext::new(&mut self.dimension, &mut self.mesh_manager, &mut self.light);
        for _ in 0..MESH_ROUNDS {
            if ctx.mesh_manager.schedule_dirty(ctx.dimension, &mut self.task_manager) == 0 {
                break;
            }
            self.task_manager.run_until_idle(&mut ctx);
        }
        ctx.meshed
    }

    /// Moves the player by `dt` seconds against the loaded terrain.
    pub fn step_physics(&mut self, dt: f32) -> CollisionOutcome {
        self.resolver.step(&mut self.player, &self.dimension, dt)
    }

    /// Runs one simulation step with the given input.
    pub fn tick(&mut self, dt: f32, action: &PlayerAction) -> TickReport {
        let started = web_time::Instant::now();

        let edit = self
            .controller
            .update(&mut self.player, &self.dimension, action, dt, &self.config.controller)
            .map(|edit| self.apply_edit(edit));
        let streaming = self.load_around_player();
        let collision = self.step_physics(dt);

        let duration = started.elapsed();
        debug!(
            "Tick took {:?}: {:?}, {:?}",
            duration, streaming, collision
        );
        TickReport {
            edit,
            streaming,
            collision,
            duration,
        }
    }

    /// Takes the mesh events produced since the last call.
    pub fn drain_mesh_events(&mut self) -> Vec<MeshEvent> {
        self.mesh_manager.drain_events()
    }

    fn apply_edit(&mut self, edit: BlockEdit) -> Result<EditOutcome, EditRejection> {
        let result = match edit {
            BlockEdit::Damage(position) => self.damage_block(position),
            BlockEdit::Place(position, block_type) => self.set_block(position, block_type),
        };
        if let Err(rejection) = &result {
            debug!("Rejected {:?}: {}", edit, rejection);
        }
        result
    }

    fn block_at(&self, position: Point3<i32>) -> Result<Block, EditRejection> {
        if !in_world_height(position.z) {
            return Err(EditRejection::OutOfBounds(position));
        }
        self.dimension
            .get_block(position)
            .ok_or(EditRejection::ChunkNotLoaded(position))
    }

    /// Highest surface under the player's footprint.
    fn footprint_surface(&self) -> i32 {
        let aabb = self.player.aabb();
        let min = aabb.min.map(|v| v.floor() as i32);
        let max = aabb.max.map(|v| v.ceil() as i32 - 1);
        (min.y..=max.y)
            .flat_map(|y| (min.x..=max.x).map(move |x| (x, y)))
            .filter_map(|(x, y)| self.dimension.surface_height(x, y))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{config::GenerationMethod, voxels::coords::MAX_WORLD_HEIGHT};

    fn flat_config(height: u32) -> WorldConfig {
        let mut config = WorldConfig::default();
        config.terrain.method = GenerationMethod::Flat {
            height,
            block_type: BlockType::DIRT,
        };
        config.streaming.load_radius = 1;
        config.streaming.unload_radius = 2;
        config
    }

    #[test]
    fn test_player_spawns_on_surface() {
        let session = WorldSession::new(flat_config(3)).unwrap();
        assert_eq!(session.player().position().z, 3.0);
        assert_eq!(session.dimension().len(), 9);
        assert!(!session.light().is_empty());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut config = flat_config(3);
        config.streaming.unload_radius = 0;
        assert!(matches!(
            WorldSession::new(config),
            Err(ConfigError::InvalidStreaming(_))
        ));
    }

    #[test]
    fn test_place_and_remove_invalidate_light() {
        let mut session = WorldSession::with_light_system(flat_config(3), Vec::new()).unwrap();
        session.light_mut().clear();
        let position = Point3::new(8, 8, 3);

        assert_eq!(session.set_block(position, BlockType::WOOD), Ok(EditOutcome::Placed));
        assert_eq!(session.light().as_slice(), &[position]);

        session.light_mut().clear();
        assert_eq!(session.set_block(position, BlockType::AIR), Ok(EditOutcome::Removed));
        assert_eq!(session.light().len(), 7);
        assert!(session.light().contains(&Point3::new(8, 8, 4)));
    }

    #[test]
    fn test_rejected_edits_change_nothing() {
        let mut session = WorldSession::with_light_system(flat_config(3), Vec::new()).unwrap();
        session.light_mut().clear();
        session.rebuild_dirty_meshes();

        assert_eq!(
            session.set_block(Point3::new(8, 8, 2), BlockType::STONE),
            Err(EditRejection::Occupied(Point3::new(8, 8, 2)))
        );
        assert_eq!(
            session.set_block(Point3::new(8, 8, 5), BlockType::AIR),
            Err(EditRejection::NothingToRemove(Point3::new(8, 8, 5)))
        );
        assert_eq!(
            session.set_block(Point3::new(8, 8, -1), BlockType::STONE),
            Err(EditRejection::OutOfBounds(Point3::new(8, 8, -1)))
        );
        let ceiling = Point3::new(8, 8, MAX_WORLD_HEIGHT);
        assert_eq!(
            session.set_block(ceiling, BlockType::STONE),
            Err(EditRejection::OutOfBounds(ceiling))
        );
        let far_above = Point3::new(8, 8, 40_000_000);
        assert_eq!(
            session.set_block(far_above, BlockType::STONE),
            Err(EditRejection::OutOfBounds(far_above))
        );
        assert_eq!(
            session.damage_block(far_above),
            Err(EditRejection::OutOfBounds(far_above))
        );
        let top = Point3::new(8, 8, MAX_WORLD_HEIGHT - 1);
        assert_eq!(
            session.set_block(top, BlockType::AIR),
            Err(EditRejection::NothingToRemove(top))
        );
        assert_eq!(
            session.set_block(Point3::new(100, 0, 3), BlockType::STONE),
            Err(EditRejection::ChunkNotLoaded(Point3::new(100, 0, 3)))
        );
        assert!(session.light().is_empty());
        assert_eq!(session.mesh_manager().dirty_count(), 0);
    }

    #[test]
    fn test_damage_progresses_until_removal() {
        let mut session = WorldSession::new(flat_config(3)).unwrap();
        let position = Point3::new(5, 5, 2);
        for level in 1..=15 {
            assert_eq!(session.damage_block(position), Ok(EditOutcome::Damaged { level }));
        }
        assert!(session.dimension().is_solid(position));
        assert_eq!(session.damage_block(position), Ok(EditOutcome::Removed));
        assert!(!session.dimension().is_solid(position));
    }

    #[test]
    fn test_edit_marks_meshes_and_rebuild_clears_them() {
        let mut session = WorldSession::new(flat_config(3)).unwrap();
        session.drain_mesh_events();

        session.set_block(Point3::new(0, 0, 2), BlockType::AIR).unwrap();
        assert_eq!(session.mesh_manager().dirty_count(), 3);

        assert_eq!(session.rebuild_dirty_meshes(), 3);
        assert_eq!(session.mesh_manager().dirty_count(), 0);
        assert_eq!(session.drain_mesh_events().len(), 3);
    }

    #[test]
    fn test_idle_tick_keeps_player_grounded() {
        let mut session = WorldSession::new(flat_config(3)).unwrap();
        let report = session.tick(1.0 / 60.0, &PlayerAction::default());
        assert_eq!(report.edit, None);
        assert!(report.streaming.is_idle());
        assert_eq!(report.collision, CollisionOutcome::Collided);
        assert!(session.player().grounded);
        assert!((session.player().position().z - 3.0).abs() < 1e-4);
    }
}
