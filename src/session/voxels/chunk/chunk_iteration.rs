//! # Chunk Iteration Module
//!
//! Iteration over the solid blocks of a chunk, skipping air.

use cgmath::Point3;

use crate::session::voxels::{block::Block, coords::CHUNK_WIDTH_USIZE};

use super::ChunkData;

/// An iterator over all non-air blocks of a chunk in storage order.
///
/// Yields the local position of each block together with a copy of it.
pub struct ChunkBlockIterator<'a> {
    data: &'a ChunkData,
    /// Current X position within the chunk
    local_x: usize,
    /// Current Y position within the chunk
    local_y: usize,
    /// Current Z position (layer index)
    local_z: usize,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates an iterator starting at the bottom layer.
    pub fn new(data: &'a ChunkData) -> Self {
        ChunkBlockIterator {
            data,
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    fn advance(&mut self) {
        self.local_x += 1;
        if self.local_x == CHUNK_WIDTH_USIZE {
            self.local_x = 0;
            self.local_y += 1;
            if self.local_y == CHUNK_WIDTH_USIZE {
                self.local_y = 0;
                self.local_z += 1;
            }
        }
    }
}

impl Iterator for ChunkBlockIterator<'_> {
    type Item = (Point3<i32>, Block);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(layer) = self.data.layers.get(self.local_z) {
            let block = layer[self.local_y][self.local_x];
            let position = Point3::new(
                self.local_x as i32,
                self.local_y as i32,
                self.local_z as i32,
            );
            self.advance();
            if block.is_solid() {
                return Some((position, block));
            }
        }
        None
    }
}
