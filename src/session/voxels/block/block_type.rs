//! # Block Type Module
//!
//! This module defines the materials a block can be made of, together with the
//! flat colors the mesher writes into vertex data.

use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::BlockTypeSize;

/// Enumerates all possible block materials in the voxel world.
///
/// The discriminant is the value stored in [`super::Block::block_type`]. `FromPrimitive`
/// turns stored values back into the rich enum.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// The reserved empty material. Never solid, never meshed.
    AIR = 0,

    /// Bedrock of the layered terrain.
    STONE = 1,

    /// Layer between stone and grass.
    DIRT = 2,

    /// Thin surface layer on top of the stone.
    GRASS = 3,

    /// Loose surface material.
    SAND = 4,

    /// Building material.
    WOOD = 5,
}

impl BlockType {
    /// Converts a stored `BlockTypeSize` back into a `BlockType`.
    ///
    /// # Returns
    /// `None` if the value does not name a known material.
    pub fn from_int(btype: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(btype)
    }

    /// Returns `true` for every material except air.
    pub fn is_solid(self) -> bool {
        self != BlockType::AIR
    }

    /// The undamaged RGB color of the material.
    pub fn color(self) -> [f32; 3] {
        match self {
            BlockType::AIR => [0.0, 0.0, 0.0],
            BlockType::STONE => [0.7, 0.7, 0.7],
            BlockType::DIRT => [0.55, 0.4, 0.25],
            BlockType::GRASS => [0.2, 1.0, 0.2],
            BlockType::SAND => [0.9, 0.85, 0.6],
            BlockType::WOOD => [0.5, 0.35, 0.2],
        }
    }
}
