//! # Chunk Streaming
//!
//! Keeps the chunks around a point generated and meshed, and evicts the ones that fell
//! out of range.
//!
//! A call to [`StreamingController::ensure_loaded`] runs to completion: every task it
//! publishes is processed before it returns, so the world is consistent afterwards and
//! a second call with the same arguments does no work.
//!
//! Residency is tracked in an LRU cache. Chunks are promoted every time they are
//! requested; when `max_resident_chunks` is set, the least recently requested chunks
//! are evicted first once the cap is exceeded.

use std::{num::NonZeroUsize, sync::Arc};

use cgmath::Point2;
use log::{debug, info};
use lru::LruCache;

use crate::session::{
    config::StreamingConfig,
    task_management::{task::TaskContext, TaskManager},
    voxels::{
        block::block_side::BlockSide,
        coords::{chunk_distance, chunks_in_radius},
        generation::TerrainGenerator,
        tasks::chunk_generation_task::ChunkGenerationTask,
    },
};

/// Rounds of meshing per call. Discarded stale meshes are retried in the next round.
const MESH_ROUNDS: usize = 4;

/// The work done by one [`StreamingController::ensure_loaded`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamingReport {
    /// Chunks generated and stored during the call.
    pub generated: usize,
    /// Meshes attached during the call.
    pub meshed: usize,
    /// Chunks evicted because they left the unload radius or the residency cap.
    pub evicted: usize,
    /// Chunks in range left ungenerated because of the generation budget.
    pub pending: usize,
}

impl StreamingReport {
    /// Returns `true` if the call did no work and nothing is left pending.
    pub fn is_idle(&self) -> bool {
        *self == StreamingReport::default()
    }
}

/// Keeps the chunks around a center generated and meshed, and evicts the rest.
///
/// Residency is tracked in an LRU cache keyed by chunk coordinate. Every
/// [`ensure_loaded`](Self::ensure_loaded) call promotes the chunks of its square, so the
/// chunks evicted under a residency cap are the ones requested least recently.
pub struct StreamingController {
    residency: LruCache<Point2<i32>, ()>,
    config: StreamingConfig,
}

impl StreamingController {
    /// Creates a controller with an empty residency set.
    pub fn new(config: StreamingConfig) -> Self {
        let residency = match config.max_resident_chunks {
            Some(capacity) => LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            None => LruCache::unbounded(),
        };
        StreamingController { residency, config }
    }

    /// The streaming parameters this controller was created with.
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Number of chunks currently tracked as resident.
    pub fn resident_count(&self) -> usize {
        self.residency.len()
    }

    /// Returns `true` if `coord` was requested and not evicted since.
    pub fn is_resident(&self, coord: Point2<i32>) -> bool {
        self.residency.contains(&coord)
    }

    /// Generates and meshes every chunk within `radius` of `center`, then evicts chunks
    /// beyond the unload radius and over the residency cap.
    ///
    /// # Arguments
    /// * `center` - Chunk coordinate of the streaming center, usually the player's chunk
    /// * `radius` - Chebyshev load radius in chunks
    /// * `generator` - Shared terrain generator handed to generation tasks
    /// * `task_manager` - Runs generation and meshing tasks
    /// * `ctx` - The world state the task results are applied to
    pub fn ensure_loaded(
        &mut self,
        center: Point2<i32>,
        radius: u32,
        generator: &Arc<TerrainGenerator>,
        task_manager: &mut TaskManager,
        ctx: &mut TaskContext<'_>,
    ) -> StreamingReport {
        let generated_before = ctx.generated;
        let meshed_before = ctx.meshed;
        let mut report = StreamingReport::default();

        let wanted = chunks_in_radius(center, radius);
        let mut overflow = self.promote(&wanted);

        let mut budget = self.config.max_generations_per_tick.unwrap_or(usize::MAX);
        for coord in &wanted {
            let needs_generation = ctx
                .dimension
                .get_chunk(*coord)
                .map_or(true, |chunk| !chunk.get().is_generated());
            if !needs_generation {
                continue;
            }
            if budget == 0 {
                report.pending += 1;
                continue;
            }
            budget -= 1;
            ctx.dimension.reserve(*coord);
            task_manager.publish_task(Box::new(ChunkGenerationTask::new(generator.clone(), *coord)));
        }
        task_manager.run_until_idle(ctx);

        for coord in &wanted {
            let Some(chunk) = ctx.dimension.get_chunk(*coord) else {
                continue;
            };
            let needs_mesh = {
                let chunk = chunk.get();
                chunk.is_generated() && !chunk.is_meshed()
            };
            if needs_mesh {
                ctx.mesh_manager.mark_dirty(*coord);
            }
        }

        let keep_radius = self.config.unload_radius.max(radius);
        overflow.extend(
            ctx.dimension
                .coordinates()
                .filter(|coord| chunk_distance(*coord, center) > keep_radius),
        );
        overflow.sort_by_key(|coord| (coord.x, coord.y));
        overflow.dedup();
        for coord in overflow {
            if self.evict(coord, ctx) {
                report.evicted += 1;
            }
        }

        for _ in 0..MESH_ROUNDS {
            if ctx.mesh_manager.schedule_dirty(ctx.dimension, task_manager) == 0 {
                break;
            }
            task_manager.run_until_idle(ctx);
        }

        report.generated = ctx.generated - generated_before;
        report.meshed = ctx.meshed - meshed_before;
        if !report.is_idle() {
            debug!("Streaming around {:?}: {:?}", center, report);
        }
        if report.pending > 0 {
            info!("{} chunks around {:?} wait for the next call", report.pending, center);
        }
        report
    }

    /// Marks `wanted` as recently requested, farthest first so the nearest chunks end
    /// up most recent.
    ///
    /// # Returns
    /// Coordinates pushed out of the residency cache by the cap.
    fn promote(&mut self, wanted: &[Point2<i32>]) -> Vec<Point2<i32>> {
        if let Some(capacity) = NonZeroUsize::new(wanted.len()) {
            if capacity > self.residency.cap() {
                debug!("Growing residency cap to {} for the load radius", capacity);
                self.residency.resize(capacity);
            }
        }

        let mut overflow = Vec::new();
        for coord in wanted.iter().rev() {
            if self.residency.get(coord).is_some() {
                continue;
            }
            if let Some((evicted, ())) = self.residency.push(*coord, ()) {
                overflow.push(evicted);
            }
        }
        overflow
    }

    /// Removes a chunk from the world and re-meshes the generated neighbors whose
    /// boundary faces it used to hide.
    fn evict(&mut self, coord: Point2<i32>, ctx: &mut TaskContext<'_>) -> bool {
        self.residency.pop(&coord);
        if ctx.dimension.remove(coord).is_none() {
            return false;
        }
        ctx.mesh_manager.forget(coord);

        for side in BlockSide::horizontal() {
            let offset = side.offset();
            let neighbor = Point2::new(coord.x + offset.x, coord.y + offset.y);
            let generated = ctx
                .dimension
                .get_chunk(neighbor)
                .is_some_and(|chunk| chunk.get().is_generated());
            if generated {
                ctx.mesh_manager.invalidate(ctx.dimension, neighbor);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        config::{GenerationMethod, WorldConfig},
        lighting::PendingLightUpdates,
        rendering::{MeshEvent, MeshManager},
        voxels::{block::block_type::BlockType, dimension::Dimension},
    };

    struct Harness {
        dimension: Dimension,
        mesh_manager: MeshManager,
        light: PendingLightUpdates,
        task_manager: TaskManager,
        generator: Arc<TerrainGenerator>,
        streaming: StreamingController,
    }

    impl Harness {
        fn new(streaming: StreamingConfig) -> Self {
            let mut config = WorldConfig::default();
            config.terrain.method = GenerationMethod::Flat {
                height: 2,
                block_type: BlockType::STONE,
            };
            Harness {
                dimension: Dimension::new(),
                mesh_manager: MeshManager::new(),
                light: PendingLightUpdates::new(),
                task_manager: TaskManager::new(0),
                generator: Arc::new(TerrainGenerator::new(&config)),
                streaming: StreamingController::new(streaming),
            }
        }

        fn load(&mut self, center: Point2<i32>, radius: u32) -> StreamingReport {
            let mut ctx = TaskContext::new(&mut self.dimension, &mut self.mesh_manager, &mut self.light);
            self.streaming
                .ensure_loaded(center, radius, &self.generator, &mut self.task_manager, &mut ctx)
        }
    }

    #[test]
    fn test_load_generates_and_meshes_square() {
        let mut harness = Harness::new(StreamingConfig::default());
        let report = harness.load(Point2::new(0, 0), 1);
        assert_eq!(report.generated, 9);
        assert_eq!(report.evicted, 0);
        assert_eq!(harness.dimension.len(), 9);
        for coord in chunks_in_radius(Point2::new(0, 0), 1) {
            assert!(harness.dimension.get_chunk(coord).unwrap().get().is_meshed());
        }
        assert_eq!(harness.mesh_manager.dirty_count(), 0);
        assert_eq!(harness.streaming.resident_count(), 9);
    }

    #[test]
    fn test_second_call_is_idle() {
        let mut harness = Harness::new(StreamingConfig::default());
        harness.load(Point2::new(2, -1), 2);
        let report = harness.load(Point2::new(2, -1), 2);
        assert!(report.is_idle(), "{report:?}");
    }

    #[test]
    fn test_generation_budget_leaves_far_chunks_pending() {
        let mut harness = Harness::new(StreamingConfig {
            max_generations_per_tick: Some(4),
            ..StreamingConfig::default()
        });
        let report = harness.load(Point2::new(0, 0), 1);
        assert_eq!(report.generated, 4);
        assert_eq!(report.pending, 5);
        assert!(harness.dimension.get_chunk(Point2::new(0, 0)).unwrap().get().is_generated());

        let report = harness.load(Point2::new(0, 0), 1);
        assert_eq!(report.generated, 4);
        assert_eq!(report.pending, 1);
    }

    #[test]
    fn test_moving_away_evicts_and_reports_removal() {
        let mut harness = Harness::new(StreamingConfig {
            load_radius: 1,
            unload_radius: 1,
            ..StreamingConfig::default()
        });
        harness.load(Point2::new(0, 0), 1);
        harness.mesh_manager.drain_events();

        let report = harness.load(Point2::new(2, 0), 1);
        assert_eq!(report.evicted, 6);
        assert!(!harness.dimension.contains(Point2::new(-1, 0)));
        assert!(harness.dimension.contains(Point2::new(2, 0)));
        let removed = harness
            .mesh_manager
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, MeshEvent::Removed(_)))
            .count();
        assert_eq!(removed, 6);
    }

    #[test]
    fn test_residency_cap_evicts_least_recent() {
        let mut harness = Harness::new(StreamingConfig {
            load_radius: 0,
            unload_radius: 10,
            max_resident_chunks: Some(2),
            max_generations_per_tick: None,
        });
        harness.load(Point2::new(0, 0), 0);
        harness.load(Point2::new(1, 0), 0);
        harness.load(Point2::new(0, 0), 0);
        let report = harness.load(Point2::new(2, 0), 0);

        assert_eq!(report.evicted, 1);
        assert!(harness.dimension.contains(Point2::new(0, 0)));
        assert!(!harness.dimension.contains(Point2::new(1, 0)));
        assert!(harness.dimension.contains(Point2::new(2, 0)));
    }
}
