//! # Chunk Generation Task
//!
//! Generates the block data of one chunk on a worker thread. The streaming controller
//! reserves an ungenerated placeholder before publishing the task; the result fills it.

use std::sync::Arc;

use cgmath::Point2;
use log::debug;

use crate::session::{
    task_management::task::{Task, TaskContext, TaskResult},
    voxels::{chunk::ChunkData, dimension::Dimension, generation::TerrainGenerator},
};

/// A task that generates chunk data asynchronously.
pub struct ChunkGenerationTask {
    generator: Arc<TerrainGenerator>,
    /// The chunk coordinate to generate
    coord: Point2<i32>,
}

impl ChunkGenerationTask {
    /// Creates a task generating the chunk at `coord`.
    pub fn new(generator: Arc<TerrainGenerator>, coord: Point2<i32>) -> Self {
        ChunkGenerationTask { generator, coord }
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkGenerationTaskResult {
            coord: self.coord,
            data: self.generator.generate(self.coord),
        })
    }
}

/// The generated block data of one chunk.
pub struct ChunkGenerationTaskResult {
    coord: Point2<i32>,
    data: ChunkData,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Stores the data in the reserved chunk and issues its side effects:
    /// 1. every voxel position of the chunk is invalidated for lighting
    /// 2. the chunk is marked dirty for meshing
    /// 3. generated neighbors are re-meshed, since their boundary faces are now culled
    ///    against this chunk
    fn handle_result(self: Box<Self>, ctx: &mut TaskContext<'_>) -> Vec<Box<dyn Task + Send>> {
        let Some(chunk) = ctx.dimension.get_chunk(self.coord) else {
            debug!("Dropping generated data of evicted chunk {:?}", self.coord);
            return Vec::new();
        };

        if chunk.get().is_generated() {
            debug!("Chunk {:?} was already generated", self.coord);
            return Vec::new();
        }

        for position in Dimension::chunk_volume(self.coord, &self.data) {
            ctx.light.invalidate(position);
        }
        chunk.get_mut().complete_generation(self.data);
        ctx.generated += 1;
        ctx.mesh_manager.mark_dirty(self.coord);

        for (neighbor_coord, neighbor) in neighbor_coords(self.coord)
            .into_iter()
            .zip(ctx.dimension.neighbors(self.coord))
        {
            if neighbor.as_ref().is_some_and(|neighbor| neighbor.get().is_generated()) {
                ctx.mesh_manager.invalidate(ctx.dimension, neighbor_coord);
            }
        }
        Vec::new()
    }
}

fn neighbor_coords(coord: Point2<i32>) -> [Point2<i32>; 4] {
    crate::session::voxels::block::block_side::BlockSide::horizontal().map(|side| {
        let offset = side.offset();
        Point2::new(coord.x + offset.x, coord.y + offset.y)
    })
}
