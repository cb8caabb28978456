//! Task for building chunk meshes on a worker thread.
//!
//! The task takes read locks on its chunk and the four horizontal neighbors, builds the
//! mesh, and remembers the chunk revision it read. The result is attached only if the
//! chunk is still the same cell at the same revision; otherwise it is discarded and the
//! chunk stays dirty, so a consumer never sees a mesh built from outdated blocks.

use std::sync::RwLockReadGuard;

use cgmath::Point2;
use log::debug;

use crate::{
    core::MtResource,
    session::{
        rendering::meshing::mesh::{build_chunk_mesh, Mesh},
        task_management::task::{Task, TaskContext, TaskResult},
        voxels::chunk::{Chunk, ChunkData},
    },
};

/// A task that builds the mesh of one chunk.
pub struct ChunkMeshGenerationTask {
    coord: Point2<i32>,
    chunk: MtResource<Chunk>,
    /// Horizontal neighbors, looked up at scheduling time
    neighbors: [Option<MtResource<Chunk>>; 4],
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// # Arguments
    /// * `coord` - The chunk coordinate
    /// * `chunk` - The chunk to mesh
    /// * `neighbors` - Its horizontal neighbors in `BlockSide::horizontal` order
    pub fn new(
        coord: Point2<i32>,
        chunk: MtResource<Chunk>,
        neighbors: [Option<MtResource<Chunk>>; 4],
    ) -> Self {
        ChunkMeshGenerationTask {
            coord,
            chunk,
            neighbors,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let chunk = self.chunk.get();
        let guards: Vec<Option<RwLockReadGuard<'_, Chunk>>> = self
            .neighbors
            .iter()
            .map(|neighbor| neighbor.as_ref().map(MtResource::get))
            .collect();
        let neighbor_data: [Option<&ChunkData>; 4] =
            std::array::from_fn(|i| guards[i].as_ref().and_then(|guard| guard.data()));

        let mesh = chunk
            .data()
            .map(|data| build_chunk_mesh(self.coord, data, neighbor_data));

        Box::new(ChunkMeshGenerationTaskResult {
            coord: self.coord,
            chunk: self.chunk.clone(),
            revision: chunk.revision(),
            mesh,
        })
    }
}

/// The result of a mesh generation task.
pub struct ChunkMeshGenerationTaskResult {
    coord: Point2<i32>,
    chunk: MtResource<Chunk>,
    /// Revision of the chunk the mesh was built from
    revision: u64,
    mesh: Option<Mesh>,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    fn handle_result(self: Box<Self>, ctx: &mut TaskContext<'_>) -> Vec<Box<dyn Task + Send>> {
        let Some(current) = ctx.dimension.get_chunk(self.coord) else {
            debug!("Discarding mesh of evicted chunk {:?}", self.coord);
            ctx.discarded += 1;
            return Vec::new();
        };

        let attached = current.ptr_eq(&self.chunk) && {
            let mut chunk = current.get_mut();
            match self.mesh {
                Some(mesh) if chunk.revision() == self.revision => chunk.set_mesh(mesh),
                _ => false,
            }
        };

        if attached {
            ctx.mesh_manager.record_replaced(self.coord);
            ctx.meshed += 1;
        } else {
            debug!("Discarding stale mesh of chunk {:?}", self.coord);
            ctx.mesh_manager.mark_dirty(self.coord);
            ctx.discarded += 1;
        }
        Vec::new()
    }
}
