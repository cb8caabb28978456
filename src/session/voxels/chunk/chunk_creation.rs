//! # Chunk Creation Module
//!
//! A builder that fills chunk data in storage order. Generators push one block type per
//! position, X fastest, then Y, then Z, and never compute indices themselves.

use crate::session::voxels::{
    block::{block_type::BlockType, Block},
    coords::CHUNK_WIDTH_USIZE,
};

use super::ChunkData;

/// Builds a [`ChunkData`] of a fixed height from a stream of block types.
///
/// Positions that are never pushed stay air.
pub struct ChunkDataBuilder {
    data: ChunkData,
    /// Current X position within the chunk
    local_x: usize,
    /// Current Y position within the chunk
    local_y: usize,
    /// Current Z position (layer index)
    local_z: usize,
}

impl ChunkDataBuilder {
    /// Creates a builder for chunk data with `height` layers.
    pub fn new(height: usize) -> Self {
        ChunkDataBuilder {
            data: ChunkData::with_height(height),
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    /// Returns `true` once every position of every layer has been pushed.
    pub fn is_full(&self) -> bool {
        self.local_z >= self.data.height()
    }

    /// Stores a block at the current position and advances to the next one.
    ///
    /// Pushes past the last position are ignored.
    pub fn push_block_type(&mut self, block_type: BlockType) {
        if self.is_full() {
            return;
        }
        if block_type != BlockType::AIR {
            self.data.layers[self.local_z][self.local_y][self.local_x] = Block::new(block_type);
        }

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

    /// Finalizes the builder and returns the constructed data.
    pub fn finish(self) -> ChunkData {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;

    #[test]
    fn test_push_order_is_x_then_y_then_z() {
        let mut builder = ChunkDataBuilder::new(2);
        builder.push_block_type(BlockType::STONE);
        builder.push_block_type(BlockType::DIRT);
        for _ in 2..CHUNK_WIDTH_USIZE * CHUNK_WIDTH_USIZE {
            builder.push_block_type(BlockType::AIR);
        }
        builder.push_block_type(BlockType::GRASS);
        let data = builder.finish();

        assert_eq!(data.get_block(Point3::new(0, 0, 0)).get_block_type(), BlockType::STONE);
        assert_eq!(data.get_block(Point3::new(1, 0, 0)).get_block_type(), BlockType::DIRT);
        assert_eq!(data.get_block(Point3::new(0, 0, 1)).get_block_type(), BlockType::GRASS);
        assert_eq!(data.solid_count(), 3);
    }
}
