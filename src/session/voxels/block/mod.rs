//! # Block Module
//!
//! This module provides the block value stored in chunk layers, its material
//! definitions and the face directions used by meshing and lighting.

use block_type::BlockType;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
pub type BlockTypeSize = u8;

/// Highest destroy level a block reaches before the next hit removes it.
pub const MAX_DESTROY_LEVEL: u8 = 15;

/// How much of a block's color is lost at [`MAX_DESTROY_LEVEL`].
const DAMAGE_DARKENING: f32 = 0.6;

/// Represents a single voxel block in the world.
///
/// Blocks are stored by value in dense chunk layers, so the struct is two bytes and
/// `Pod`. The material is kept as its compact integer id.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, Default, PartialEq, Eq)]
pub struct Block {
    /// The material of this block, encoded as a `BlockTypeSize`.
    pub block_type: BlockTypeSize,
    /// Mining progress in `0..=MAX_DESTROY_LEVEL`.
    pub destroy_level: u8,
}

/// Result of hitting a block once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DamageResult {
    /// The block survived and now has this destroy level.
    Damaged(u8),
    /// The block was already at the maximum level and breaks.
    Destroyed,
}

impl Block {
    /// Creates a new, undamaged block of the specified type.
    pub fn new(block_type: BlockType) -> Self {
        Block {
            block_type: block_type as BlockTypeSize,
            destroy_level: 0,
        }
    }

    /// An undamaged air block.
    pub fn air() -> Self {
        Block::new(BlockType::AIR)
    }

    /// The material of this block. Unknown ids read as air.
    pub fn get_block_type(&self) -> BlockType {
        BlockType::from_int(self.block_type).unwrap_or(BlockType::AIR)
    }

    /// Returns `true` if the block's material is solid.
    pub fn is_solid(&self) -> bool {
        self.get_block_type().is_solid()
    }

    /// The block's material color, darkened in proportion to its destroy level.
    pub fn color(&self) -> [f32; 3] {
        let level = self.destroy_level.min(MAX_DESTROY_LEVEL) as f32;
        let shade = 1.0 - DAMAGE_DARKENING * level / MAX_DESTROY_LEVEL as f32;
        self.get_block_type().color().map(|channel| channel * shade)
    }

    /// Applies one hit of mining progress.
    pub fn damage(&mut self) -> DamageResult {
        if self.destroy_level >= MAX_DESTROY_LEVEL {
            DamageResult::Destroyed
        } else {
            self.destroy_level += 1;
            DamageResult::Damaged(self.destroy_level)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_is_small() {
        assert_eq!(std::mem::size_of::<Block>(), 2);
        assert_eq!(Block::default(), Block::air());
    }

    #[test]
    fn test_damage_saturates_then_destroys() {
        let mut block = Block::new(BlockType::STONE);
        for level in 1..=MAX_DESTROY_LEVEL {
            assert_eq!(block.damage(), DamageResult::Damaged(level));
        }
        assert_eq!(block.damage(), DamageResult::Destroyed);
        assert_eq!(block.destroy_level, MAX_DESTROY_LEVEL);
    }

    #[test]
    fn test_damage_darkens_color() {
        let fresh = Block::new(BlockType::GRASS);
        let mut worn = fresh;
        worn.destroy_level = MAX_DESTROY_LEVEL;
        for (a, b) in fresh.color().iter().zip(worn.color()) {
            assert!(b <= *a);
        }
        assert_eq!(fresh.color(), BlockType::GRASS.color());
    }

    #[test]
    fn test_unknown_ids_read_as_air() {
        let block = Block {
            block_type: 200,
            destroy_level: 0,
        };
        assert!(!block.is_solid());
    }
}
