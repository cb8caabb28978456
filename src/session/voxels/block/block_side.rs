//! # Block Side Module
//!
//! This module defines the six faces of a voxel block. The world is Z-up: `TOP` faces
//! positive Z and `BOTTOM` faces the ground.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The left face (facing negative X)
    LEFT = 0,

    /// The right face (facing positive X)
    RIGHT = 1,

    /// The front face (facing negative Y)
    FRONT = 2,

    /// The back face (facing positive Y)
    BACK = 3,

    /// The bottom face (facing negative Z)
    BOTTOM = 4,

    /// The top face (facing positive Z)
    TOP = 5,
}

impl BlockSide {
    /// Returns all six block faces in a fixed order.
    ///
    /// The order is: [LEFT, RIGHT, FRONT, BACK, BOTTOM, TOP]
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
        ]
    }

    /// The faces that lie on a chunk's horizontal boundary.
    pub fn horizontal() -> [BlockSide; 4] {
        [
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::FRONT,
            BlockSide::BACK,
        ]
    }

    /// Offset from a block to its neighbor across this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
            BlockSide::FRONT => Vector3::new(0, -1, 0),
            BlockSide::BACK => Vector3::new(0, 1, 0),
            BlockSide::BOTTOM => Vector3::new(0, 0, -1),
            BlockSide::TOP => Vector3::new(0, 0, 1),
        }
    }

    /// Outward unit normal of the face.
    pub fn normal(self) -> Vector3<f32> {
        let offset = self.offset();
        Vector3::new(offset.x as f32, offset.y as f32, offset.z as f32)
    }
}
