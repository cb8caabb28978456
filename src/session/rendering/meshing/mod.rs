//! # Mesh Management
//!
//! Tracks which chunks need a new mesh and tells the rendering backend which chunk
//! buffers changed.
//!
//! ## Invalidation
//!
//! A block edit at position `p` calls two hooks:
//! - [`MeshManager::invalidate_mesh_major`]: the chunk containing `p` is rebuilt
//! - [`MeshManager::invalidate_mesh_minor`]: every other chunk containing one of the six
//!   face neighbors of `p` is rebuilt, because its boundary faces may appear or vanish
//!
//! Invalidating drops the chunk's mesh right away and records the chunk as dirty.
//! [`MeshManager::schedule_dirty`] later turns dirty chunks into meshing tasks.
//!
//! ## Events
//!
//! Every mesh attached to a chunk produces [`MeshEvent::Replaced`]; every evicted chunk
//! produces [`MeshEvent::Removed`]. A renderer drains the events once per frame and
//! re-uploads or frees the matching buffers.

pub mod mesh;

use std::collections::HashSet;

use cgmath::{Point2, Point3};
use log::trace;

use crate::session::{
    rendering::tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask,
    task_management::TaskManager,
    voxels::{block::block_side::BlockSide, coords::block_to_chunk, dimension::Dimension},
};

/// A change to the set of chunk meshes, for the rendering backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeshEvent {
    /// The chunk has a new mesh; its buffers should be re-uploaded.
    Replaced(Point2<i32>),
    /// The chunk was evicted; its buffers should be freed.
    Removed(Point2<i32>),
}

/// Tracks chunks that need a new mesh and the events the renderer consumes.
#[derive(Debug, Default)]
pub struct MeshManager {
    dirty: HashSet<Point2<i32>>,
    events: Vec<MeshEvent>,
    meshes_built: u64,
}

impl MeshManager {
    /// Creates a manager with no dirty chunks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the chunk at `coord` needs a new mesh.
    ///
    /// # Returns
    /// `true` if the chunk was not dirty before.
    pub fn mark_dirty(&mut self, coord: Point2<i32>) -> bool {
        self.dirty.insert(coord)
    }

    /// Returns `true` if the chunk at `coord` waits for a mesh.
    pub fn is_dirty(&self, coord: Point2<i32>) -> bool {
        self.dirty.contains(&coord)
    }

    /// Number of chunks waiting for a mesh.
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Total number of meshes attached to chunks during the session.
    pub fn meshes_built(&self) -> u64 {
        self.meshes_built
    }

    /// Drops the mesh of the chunk at `coord` and marks it dirty. Absent chunks are
    /// ignored.
    pub fn invalidate(&mut self, dimension: &Dimension, coord: Point2<i32>) {
        if let Some(chunk) = dimension.get_chunk(coord) {
            chunk.get_mut().invalidate_mesh();
            self.mark_dirty(coord);
        }
    }

    /// Full rebuild of the chunk containing the edited block.
    pub fn invalidate_mesh_major(&mut self, dimension: &Dimension, position: Point3<i32>) {
        let (coord, _) = block_to_chunk(position);
        trace!("Major mesh invalidation of chunk {:?} at {:?}", coord, position);
        self.invalidate(dimension, coord);
    }

    /// Rebuild of the neighboring chunks whose boundary touches the edited block.
    pub fn invalidate_mesh_minor(&mut self, dimension: &Dimension, position: Point3<i32>) {
        let (own, _) = block_to_chunk(position);
        let mut touched = Vec::with_capacity(2);
        for side in BlockSide::horizontal() {
            let (coord, _) = block_to_chunk(position + side.offset());
            if coord != own && !touched.contains(&coord) {
                touched.push(coord);
            }
        }
        for coord in touched {
            trace!("Minor mesh invalidation of chunk {:?} at {:?}", coord, position);
            self.invalidate(dimension, coord);
        }
    }

    /// Forgets an evicted chunk and tells the renderer to drop its buffers.
    pub fn forget(&mut self, coord: Point2<i32>) {
        self.dirty.remove(&coord);
        self.events.push(MeshEvent::Removed(coord));
    }

    /// Records that a fresh mesh was attached to the chunk at `coord`.
    pub fn record_replaced(&mut self, coord: Point2<i32>) {
        self.meshes_built += 1;
        self.events.push(MeshEvent::Replaced(coord));
    }

    /// Publishes a meshing task for every dirty chunk that has block data.
    ///
    /// Dirty chunks that no longer exist are dropped from the set; ungenerated ones stay
    /// dirty until their data arrives.
    ///
    /// # Returns
    /// The number of tasks published.
    pub fn schedule_dirty(&mut self, dimension: &Dimension, task_manager: &mut TaskManager) -> usize {
        let mut coords: Vec<Point2<i32>> = self.dirty.iter().copied().collect();
        coords.sort_by_key(|coord| (coord.x, coord.y));

        let mut scheduled = 0;
        for coord in coords {
            let Some(chunk) = dimension.get_chunk(coord) else {
                self.dirty.remove(&coord);
                continue;
            };
            if !chunk.get().is_generated() {
                continue;
            }
            self.dirty.remove(&coord);
            task_manager.publish_task(Box::new(ChunkMeshGenerationTask::new(
                coord,
                chunk,
                dimension.neighbors(coord),
            )));
            scheduled += 1;
        }
        scheduled
    }

    /// Takes the events accumulated since the last call.
    pub fn drain_events(&mut self) -> Vec<MeshEvent> {
        std::mem::take(&mut self.events)
    }
}
