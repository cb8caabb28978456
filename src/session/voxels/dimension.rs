//! # Dimension Module
//!
//! The [`Dimension`] is the authoritative store of the voxel world: a sparse map from
//! chunk coordinate to chunk. Chunks never point at each other; code that needs a
//! neighbor asks the dimension for it by coordinate at the moment of use.
//!
//! ## Addressing misses
//!
//! Reading a block whose chunk is absent or not generated yet returns `None`. Callers
//! treat such positions as empty, so unloaded terrain never blocks movement.

use std::collections::HashMap;

use cgmath::{Point2, Point3};

use super::{
    block::{block_side::BlockSide, Block},
    chunk::{Chunk, ChunkData},
    coords::{block_to_chunk, chunk_to_block, CHUNK_WIDTH},
};
use crate::core::MtResource;

/// The sparse voxel world, keyed by chunk coordinate.
///
/// # Examples
///
/// ```
/// use cgmath::{Point2, Point3};
/// use voxel_world::session::voxels::{
///     block::{block_type::BlockType, Block},
///     chunk::ChunkData,
///     dimension::Dimension,
/// };
///
/// let mut dimension = Dimension::new();
/// dimension.insert_generated(Point2::new(-1, 0), ChunkData::with_height(4));
///
/// assert!(dimension.set_block(Point3::new(-3, 2, 1), Block::new(BlockType::STONE)));
/// assert!(dimension.is_solid(Point3::new(-3, 2, 1)));
/// assert_eq!(dimension.get_block(Point3::new(40, 0, 0)), None);
/// ```
#[derive(Debug, Default)]
pub struct Dimension {
    chunks: HashMap<Point2<i32>, MtResource<Chunk>>,
}

impl Dimension {
    /// Creates a dimension with no chunks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks present, generated or not.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if no chunk is present.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns `true` if a chunk, generated or not, exists at `coord`.
    pub fn contains(&self, coord: Point2<i32>) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Returns a handle to the chunk at `coord`, if one exists.
    pub fn get_chunk(&self, coord: Point2<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.get(&coord).cloned()
    }

    /// Returns the chunk at `coord`, creating an ungenerated placeholder if none exists.
    pub fn reserve(&mut self, coord: Point2<i32>) -> MtResource<Chunk> {
        self.chunks
            .entry(coord)
            .or_insert_with(|| MtResource::new(Chunk::new(coord)))
            .clone()
    }

    /// Inserts an already generated chunk, replacing whatever was stored at `coord`.
    pub fn insert_generated(&mut self, coord: Point2<i32>, data: ChunkData) -> MtResource<Chunk> {
        let chunk = MtResource::new(Chunk::generated(coord, data));
        self.chunks.insert(coord, chunk.clone());
        chunk
    }

    /// Removes the chunk at `coord` and hands back its cell.
    pub fn remove(&mut self, coord: Point2<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.remove(&coord)
    }

    /// Coordinates of every stored chunk, in no particular order.
    pub fn coordinates(&self) -> impl Iterator<Item = Point2<i32>> + '_ {
        self.chunks.keys().copied()
    }

    /// The four horizontal neighbors of `coord` in [`BlockSide::horizontal`] order:
    /// `[-X, +X, -Y, +Y]`.
    pub fn neighbors(&self, coord: Point2<i32>) -> [Option<MtResource<Chunk>>; 4] {
        BlockSide::horizontal().map(|side| {
            let offset = side.offset();
            self.get_chunk(Point2::new(coord.x + offset.x, coord.y + offset.y))
        })
    }

    /// Looks up a block by global coordinate.
    ///
    /// # Returns
    /// `None` if the containing chunk is absent or ungenerated. Positions above the
    /// chunk's top layer or below the floor read as air.
    pub fn get_block(&self, position: Point3<i32>) -> Option<Block> {
        let (coord, local) = block_to_chunk(position);
        let chunk = self.chunks.get(&coord)?;
        let chunk = chunk.get();
        chunk.data().map(|data| data.get_block(local))
    }

    /// Returns `true` if the block at `position` is loaded and solid.
    pub fn is_solid(&self, position: Point3<i32>) -> bool {
        self.get_block(position).is_some_and(|block| block.is_solid())
    }

    /// Writes a block by global coordinate.
    ///
    /// This only touches block data and the chunk's own mesh state. Neighbor meshes and
    /// lighting are invalidated by the caller.
    ///
    /// # Returns
    /// `false` if the chunk is absent or ungenerated, or the position is below the floor.
    pub fn set_block(&mut self, position: Point3<i32>, block: Block) -> bool {
        let (coord, local) = block_to_chunk(position);
        match self.chunks.get(&coord) {
            Some(chunk) => chunk.get_mut().set_block(local, block),
            None => false,
        }
    }

    /// Elevation just above the highest solid block of a column.
    ///
    /// # Returns
    /// `None` if the column's chunk is not generated, `Some(0)` for an empty column.
    pub fn surface_height(&self, x: i32, y: i32) -> Option<i32> {
        let (coord, local) = block_to_chunk(Point3::new(x, y, 0));
        let chunk = self.chunks.get(&coord)?;
        let chunk = chunk.get();
        let data = chunk.data()?;
        let top = (0..data.height() as i32)
            .rev()
            .find(|z| data.is_solid(Point3::new(local.x, local.y, *z)))
            .map_or(0, |z| z + 1);
        Some(top)
    }

    /// Every block position of a generated chunk's stored volume, bottom layer first.
    pub fn chunk_volume(coord: Point2<i32>, data: &ChunkData) -> impl Iterator<Item = Point3<i32>> {
        let height = data.height() as i32;
        (0..height).flat_map(move |z| {
            (0..CHUNK_WIDTH).flat_map(move |y| {
                (0..CHUNK_WIDTH).map(move |x| chunk_to_block(coord, Point3::new(x, y, z)))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::voxels::block::block_type::BlockType;

    #[test]
    fn test_reserve_keeps_one_chunk_per_coordinate() {
        let mut dimension = Dimension::new();
        let a = dimension.reserve(Point2::new(0, 0));
        let b = dimension.reserve(Point2::new(0, 0));
        assert!(a.ptr_eq(&b));
        assert_eq!(dimension.len(), 1);
        assert_eq!(dimension.get_block(Point3::new(0, 0, 0)), None);
    }

    #[test]
    fn test_blocks_cross_chunk_boundaries() {
        let mut dimension = Dimension::new();
        dimension.insert_generated(Point2::new(0, 0), ChunkData::with_height(1));
        dimension.insert_generated(Point2::new(-1, 0), ChunkData::with_height(1));

        assert!(dimension.set_block(Point3::new(-1, 5, 0), Block::new(BlockType::SAND)));
        assert!(dimension.set_block(Point3::new(0, 5, 0), Block::new(BlockType::WOOD)));
        assert!(!dimension.set_block(Point3::new(16, 5, 0), Block::new(BlockType::WOOD)));

        let left = dimension.get_chunk(Point2::new(-1, 0)).unwrap();
        assert!(left.get().data().unwrap().is_solid(Point3::new(15, 5, 0)));
        assert_eq!(dimension.surface_height(-1, 5), Some(1));
        assert_eq!(dimension.surface_height(3, 3), Some(0));
        assert_eq!(dimension.surface_height(99, 3), None);
    }

    #[test]
    fn test_neighbors_follow_horizontal_side_order() {
        let mut dimension = Dimension::new();
        dimension.insert_generated(Point2::new(1, 0), ChunkData::new());
        dimension.insert_generated(Point2::new(0, -1), ChunkData::new());
        let neighbors = dimension.neighbors(Point2::new(0, 0));
        let present: Vec<bool> = neighbors.iter().map(Option::is_some).collect();
        assert_eq!(present, vec![false, true, true, false]);
    }

    #[test]
    fn test_chunk_volume_covers_every_layer() {
        let data = ChunkData::with_height(3);
        let positions: Vec<_> = Dimension::chunk_volume(Point2::new(-1, 2), &data).collect();
        assert_eq!(positions.len(), 16 * 16 * 3);
        assert_eq!(positions[0], Point3::new(-16, 32, 0));
        assert_eq!(positions[positions.len() - 1], Point3::new(-1, 47, 2));
    }
}
