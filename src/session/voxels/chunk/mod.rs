//! # Chunk Module
//!
//! A chunk is a `CHUNK_WIDTH × CHUNK_WIDTH` column of the world that grows upwards one
//! horizontal layer at a time. It is the unit of generation, meshing and streaming.
//!
//! ## Lifecycle
//!
//! The chunk's [`ChunkState`] makes the three phases explicit:
//! - `Ungenerated`: the coordinate is reserved and a generation task is on its way
//! - `Generated`: block data is present, the mesh is missing or stale
//! - `Meshed`: block data and a mesh derived from exactly that data
//!
//! Any block write moves a `Meshed` chunk back to `Generated`, so a mesh can never
//! outlive the data it was built from. Every write and every mesh invalidation bumps
//! the chunk's revision, which lets in-flight meshing tasks detect that their input
//! went stale.

use cgmath::{Point2, Point3};
use chunk_iteration::ChunkBlockIterator;

use super::block::Block;
use super::coords::{in_world_height, CHUNK_WIDTH, CHUNK_WIDTH_USIZE};
use crate::session::rendering::Mesh;

pub mod chunk_creation;
pub mod chunk_iteration;

/// One horizontal slice of a chunk, indexed `[y][x]`.
pub type Layer = [[Block; CHUNK_WIDTH_USIZE]; CHUNK_WIDTH_USIZE];

const EMPTY_LAYER: Layer = [[Block {
    block_type: 0,
    destroy_level: 0,
}; CHUNK_WIDTH_USIZE]; CHUNK_WIDTH_USIZE];

/// The block grid of one chunk.
///
/// Positions above the top layer read as air; writing a solid block there appends
/// layers until the position exists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkData {
    layers: Vec<Layer>,
}

impl ChunkData {
    /// Creates block data without any layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates block data with `height` layers of air.
    pub fn with_height(height: usize) -> Self {
        ChunkData {
            layers: vec![EMPTY_LAYER; height],
        }
    }

    /// Number of layers. Every block at or above this elevation is air.
    pub fn height(&self) -> usize {
        self.layers.len()
    }

    /// The stored layers, bottom first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Returns `true` if `local` lies horizontally inside the chunk and within the world
    /// height.
    pub fn in_bounds(local: Point3<i32>) -> bool {
        (0..CHUNK_WIDTH).contains(&local.x)
            && (0..CHUNK_WIDTH).contains(&local.y)
            && in_world_height(local.z)
    }

    /// Looks up a stored block.
    ///
    /// # Returns
    /// `None` when the position is out of bounds or above the top layer.
    pub fn get(&self, local: Point3<i32>) -> Option<&Block> {
        if !Self::in_bounds(local) {
            return None;
        }
        self.layers
            .get(local.z as usize)
            .map(|layer| &layer[local.y as usize][local.x as usize])
    }

    /// The block at `local`, treating everything outside the stored layers as air.
    pub fn get_block(&self, local: Point3<i32>) -> Block {
        self.get(local).copied().unwrap_or_default()
    }

    /// Returns `true` if a solid block is stored at `local`.
    pub fn is_solid(&self, local: Point3<i32>) -> bool {
        self.get(local).is_some_and(Block::is_solid)
    }

    /// Writes a block, growing the layer stack when a solid block is placed above it.
    ///
    /// # Returns
    /// `false` if the position is out of bounds and nothing was written.
    pub fn set(&mut self, local: Point3<i32>, block: Block) -> bool {
        if !Self::in_bounds(local) {
            return false;
        }
        let z = local.z as usize;
        if z >= self.layers.len() {
            if !block.is_solid() {
                return true;
            }
            self.layers.resize(z + 1, EMPTY_LAYER);
        }
        self.layers[z][local.y as usize][local.x as usize] = block;
        true
    }

    /// Iterates over every solid block together with its local position.
    pub fn iter_blocks(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }

    /// Number of solid blocks.
    pub fn solid_count(&self) -> usize {
        self.iter_blocks().count()
    }
}

/// The generation and meshing state of a chunk.
#[derive(Debug)]
pub enum ChunkState {
    /// Queued for generation; holds no data.
    Ungenerated,
    /// Block data is present but no current mesh.
    Generated(ChunkData),
    /// Block data with a mesh built from it.
    Meshed(ChunkData, Mesh),
}

/// A chunk column owned by the [`super::dimension::Dimension`].
#[derive(Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates.
    pub position: Point2<i32>,
    state: ChunkState,
    revision: u64,
}

impl Chunk {
    /// Creates a placeholder for a chunk whose data is still being generated.
    pub fn new(position: Point2<i32>) -> Self {
        Chunk {
            position,
            state: ChunkState::Ungenerated,
            revision: 0,
        }
    }

    /// Creates a chunk that already holds its block data.
    pub fn generated(position: Point2<i32>, data: ChunkData) -> Self {
        Chunk {
            position,
            state: ChunkState::Generated(data),
            revision: 1,
        }
    }

    /// The chunk's generation and meshing state.
    pub fn state(&self) -> &ChunkState {
        &self.state
    }

    /// Counter bumped by every data change and mesh invalidation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The block data, once generated.
    pub fn data(&self) -> Option<&ChunkData> {
        match &self.state {
            ChunkState::Ungenerated => None,
            ChunkState::Generated(data) | ChunkState::Meshed(data, _) => Some(data),
        }
    }

    /// The current mesh, if any.
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.state {
            ChunkState::Meshed(_, mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Returns `true` once block data is stored.
    pub fn is_generated(&self) -> bool {
        !matches!(self.state, ChunkState::Ungenerated)
    }

    /// Returns `true` if the mesh matches the current block data.
    pub fn is_meshed(&self) -> bool {
        matches!(self.state, ChunkState::Meshed(..))
    }

    /// Stores freshly generated block data.
    ///
    /// # Returns
    /// `false` if the chunk already had data, which is then kept untouched.
    pub fn complete_generation(&mut self, data: ChunkData) -> bool {
        if self.is_generated() {
            return false;
        }
        self.state = ChunkState::Generated(data);
        self.revision += 1;
        true
    }

    /// Writes one block and drops the mesh.
    ///
    /// # Returns
    /// `false` if the chunk has no data yet or `local` is out of bounds.
    pub fn set_block(&mut self, local: Point3<i32>, block: Block) -> bool {
        if !ChunkData::in_bounds(local) {
            return false;
        }
        let mut data = match std::mem::replace(&mut self.state, ChunkState::Ungenerated) {
            ChunkState::Ungenerated => return false,
            ChunkState::Generated(data) | ChunkState::Meshed(data, _) => data,
        };
        data.set(local, block);
        self.state = ChunkState::Generated(data);
        self.revision += 1;
        true
    }

    /// Attaches a mesh built from the current data.
    ///
    /// # Returns
    /// `false` if the chunk has no data to attach the mesh to.
    pub fn set_mesh(&mut self, mesh: Mesh) -> bool {
        self.state = match std::mem::replace(&mut self.state, ChunkState::Ungenerated) {
            ChunkState::Ungenerated => return false,
            ChunkState::Generated(data) | ChunkState::Meshed(data, _) => {
                ChunkState::Meshed(data, mesh)
            }
        };
        true
    }

    /// Drops the mesh, if any, and bumps the revision so that meshes built from the
    /// previous state are rejected.
    ///
    /// # Returns
    /// `true` if a mesh was dropped.
    pub fn invalidate_mesh(&mut self) -> bool {
        if !self.is_generated() {
            return false;
        }
        self.revision += 1;
        match std::mem::replace(&mut self.state, ChunkState::Ungenerated) {
            ChunkState::Meshed(data, _) => {
                self.state = ChunkState::Generated(data);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::voxels::block::block_type::BlockType;

    #[test]
    fn test_set_grows_layers_for_solid_blocks_only() {
        let mut data = ChunkData::with_height(2);
        assert!(data.set(Point3::new(1, 1, 9), Block::air()));
        assert_eq!(data.height(), 2);
        assert!(data.set(Point3::new(1, 1, 9), Block::new(BlockType::DIRT)));
        assert_eq!(data.height(), 10);
        assert!(data.is_solid(Point3::new(1, 1, 9)));
        assert!(!data.set(Point3::new(16, 0, 0), Block::new(BlockType::DIRT)));
        assert!(!data.set(Point3::new(0, 0, -1), Block::new(BlockType::DIRT)));
    }

    #[test]
    fn test_set_refuses_layers_above_world_height() {
        use crate::session::voxels::coords::MAX_WORLD_HEIGHT;

        let mut data = ChunkData::new();
        assert!(!data.set(Point3::new(8, 8, MAX_WORLD_HEIGHT), Block::new(BlockType::STONE)));
        assert!(!data.set(Point3::new(8, 8, 40_000_000), Block::new(BlockType::STONE)));
        assert_eq!(data.height(), 0);
        assert!(data.get(Point3::new(8, 8, MAX_WORLD_HEIGHT)).is_none());

        assert!(data.set(Point3::new(8, 8, MAX_WORLD_HEIGHT - 1), Block::new(BlockType::STONE)));
        assert_eq!(data.height(), MAX_WORLD_HEIGHT as usize);
    }

    #[test]
    fn test_block_write_drops_the_mesh() {
        let mut chunk = Chunk::new(Point2::new(0, 0));
        assert!(!chunk.set_block(Point3::new(0, 0, 0), Block::new(BlockType::STONE)));
        assert!(chunk.complete_generation(ChunkData::with_height(1)));
        assert!(!chunk.complete_generation(ChunkData::new()));

        assert!(chunk.set_mesh(Mesh::default()));
        assert!(chunk.is_meshed());
        let revision = chunk.revision();

        assert!(chunk.set_block(Point3::new(0, 0, 0), Block::new(BlockType::STONE)));
        assert!(!chunk.is_meshed());
        assert!(chunk.revision() > revision);
        assert!(chunk.data().is_some_and(|data| data.is_solid(Point3::new(0, 0, 0))));
    }

    #[test]
    fn test_invalidate_mesh_bumps_revision() {
        let mut chunk = Chunk::generated(Point2::new(2, 3), ChunkData::new());
        let revision = chunk.revision();
        assert!(!chunk.invalidate_mesh());
        assert!(chunk.revision() > revision);
        chunk.set_mesh(Mesh::default());
        assert!(chunk.invalidate_mesh());
        assert!(matches!(chunk.state(), ChunkState::Generated(_)));
    }
}
