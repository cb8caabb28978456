//! Voxel ray casting for block selection.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::session::voxels::coords::world_to_block;

/// The voxel a ray stopped in, and the face it entered through.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RayHit {
    /// The first accepted voxel.
    pub position: Point3<i32>,
    /// The empty voxel in front of the hit face, where a block would be placed.
    pub previous: Point3<i32>,
}

/// Walks the voxels crossed by a ray in order (Amanatides-Woo traversal) until
/// `is_hit` accepts one or `length` is exceeded.
///
/// # Arguments
/// * `origin` - Start of the ray in world space
/// * `direction` - Ray direction, need not be normalized
/// * `length` - Maximum distance travelled
/// * `is_hit` - Called once per visited voxel, starting with the origin's voxel
pub fn ray_cast(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    length: f32,
    mut is_hit: impl FnMut(Point3<i32>) -> bool,
) -> Option<RayHit> {
    if direction.magnitude2() == 0.0 || !(length > 0.0) {
        return None;
    }
    let direction = direction.normalize();

    let mut voxel = world_to_block(origin);
    let mut previous = voxel;
    let mut step = [0i32; 3];
    let mut t_max = [f32::INFINITY; 3];
    let mut t_delta = [f32::INFINITY; 3];

    for axis in 0..3 {
        let d = direction[axis];
        if d > 0.0 {
            step[axis] = 1;
            t_max[axis] = (voxel[axis] as f32 + 1.0 - origin[axis]) / d;
            t_delta[axis] = 1.0 / d;
        } else if d < 0.0 {
            step[axis] = -1;
            t_max[axis] = (voxel[axis] as f32 - origin[axis]) / d;
            t_delta[axis] = -1.0 / d;
        }
    }

    let mut travelled = 0.0;
    while travelled <= length {
        if is_hit(voxel) {
            return Some(RayHit {
                position: voxel,
                previous,
            });
        }

        let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
            0
        } else if t_max[1] <= t_max[2] {
            1
        } else {
            2
        };
        previous = voxel;
        voxel[axis] += step[axis];
        travelled = t_max[axis];
        t_max[axis] += t_delta[axis];
    }
    None
}
