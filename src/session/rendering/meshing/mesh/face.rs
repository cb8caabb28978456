use cgmath::{Point3, Vector3};

use crate::session::voxels::block::block_side::BlockSide;

/// Local index order of the two triangles of a quad: `(ll, lr, ur)` and `(ll, ur, ul)`.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// A single quad face of a voxel.
///
/// The corners run lower-left, lower-right, upper-right, upper-left, counter-clockwise
/// when seen from outside the block, so both triangles of the quad face along the
/// side's outward normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Lower-left corner of the face in block coordinates
    pub ll: Point3<i32>,
    /// Lower-right corner of the face in block coordinates
    pub lr: Point3<i32>,
    /// Upper-right corner of the face in block coordinates
    pub ur: Point3<i32>,
    /// Upper-left corner of the face in block coordinates
    pub ul: Point3<i32>,
    /// Which side of the block this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates the face on `block_side` of the unit block whose minimum corner is `block`.
    pub fn new(block: Point3<i32>, block_side: BlockSide) -> Self {
        let corner = |dx, dy, dz| block + Vector3::new(dx, dy, dz);
        let (ll, lr, ur, ul) = match block_side {
            BlockSide::TOP => (
                corner(0, 0, 1),
                corner(1, 0, 1),
                corner(1, 1, 1),
                corner(0, 1, 1),
            ),
            BlockSide::BOTTOM => (
                corner(0, 0, 0),
                corner(0, 1, 0),
                corner(1, 1, 0),
                corner(1, 0, 0),
            ),
            BlockSide::RIGHT => (
                corner(1, 0, 0),
                corner(1, 1, 0),
                corner(1, 1, 1),
                corner(1, 0, 1),
            ),
            BlockSide::LEFT => (
                corner(0, 0, 0),
                corner(0, 0, 1),
                corner(0, 1, 1),
                corner(0, 1, 0),
            ),
            BlockSide::BACK => (
                corner(0, 1, 0),
                corner(0, 1, 1),
                corner(1, 1, 1),
                corner(1, 1, 0),
            ),
            BlockSide::FRONT => (
                corner(0, 0, 0),
                corner(1, 0, 0),
                corner(1, 0, 1),
                corner(0, 0, 1),
            ),
        };
        Face {
            ll,
            lr,
            ur,
            ul,
            block_side,
        }
    }

    /// The corners in vertex order.
    pub fn corners(&self) -> [Point3<i32>; 4] {
        [self.ll, self.lr, self.ur, self.ul]
    }
}
