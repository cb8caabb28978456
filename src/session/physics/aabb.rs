//! Axis-aligned bounding boxes and the swept AABB test.

use cgmath::{Point3, Vector3};

/// Margin under which two touching boxes are not considered overlapping.
pub const OVERLAP_TOLERANCE: f32 = 1e-4;

/// An axis-aligned box in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f32>,
    /// Maximum corner.
    pub max: Point3<f32>,
}

impl Aabb {
    /// Creates a box from its minimum corner and size.
    pub fn new(min: Point3<f32>, size: Vector3<f32>) -> Self {
        Aabb { min, max: min + size }
    }

    /// The unit box occupied by the voxel at `position`.
    pub fn unit(position: Point3<i32>) -> Self {
        let min = Point3::new(position.x as f32, position.y as f32, position.z as f32);
        Aabb::new(min, Vector3::new(1.0, 1.0, 1.0))
    }

    /// Extents along each axis.
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Point3<f32> {
        self.min + self.size() * 0.5
    }

    /// The same box moved by `offset`.
    pub fn translated(&self, offset: Vector3<f32>) -> Self {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Aabb) -> Self {
        Aabb {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Strict overlap: boxes that only share a face do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.overlaps_with_tolerance(other, 0.0)
    }

    /// Overlap by more than `tolerance` on every axis.
    pub fn overlaps_with_tolerance(&self, other: &Aabb, tolerance: f32) -> bool {
        (0..3).all(|axis| {
            self.min[axis] < other.max[axis] - tolerance && other.min[axis] < self.max[axis] - tolerance
        })
    }

    /// The integer voxel positions whose unit boxes intersect this box.
    pub fn voxels(&self) -> impl Iterator<Item = Point3<i32>> {
        let min = self.min.map(|v| v.floor() as i32);
        let max = self.max.map(|v| v.ceil() as i32 - 1);
        (min.z..=max.z).flat_map(move |z| {
            (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| Point3::new(x, y, z)))
        })
    }
}

/// The first contact of a moving box against a static one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SweptHit {
    /// Fraction of the displacement at which the boxes start touching.
    pub t_in: f32,
    /// Fraction of the displacement at which the boxes stop overlapping.
    pub t_out: f32,
    /// The axis on which contact begins.
    pub axis: usize,
    /// Surface normal of the static box at the contact, pointing at the moving box.
    pub normal: Vector3<f32>,
    /// Signed displacement along `axis` that brings the boxes exactly into contact.
    pub entry_distance: f32,
}

/// Sweeps `moving` along `displacement` against the static box `target`.
///
/// Each axis gives an entry and an exit time. The contact axis is the one entering last;
/// on ties the earlier axis in X, Y, Z order wins. An axis the box does not move along
/// either overlaps for all time or never does.
///
/// # Returns
/// `None` if there is no motion, the boxes never overlap along the path, or the overlap
/// window is empty. A hit with `t_in` outside `[0, 1]` is still returned; callers decide
/// whether it happens within the step.
pub fn swept_aabb(moving: &Aabb, displacement: Vector3<f32>, target: &Aabb) -> Option<SweptHit> {
    if displacement == Vector3::new(0.0, 0.0, 0.0) {
        return None;
    }

    let mut t_in = f32::NEG_INFINITY;
    let mut t_out = f32::INFINITY;
    let mut hit_axis = None;
    let mut entry_distance = 0.0;

    for axis in 0..3 {
        let d = displacement[axis];
        if d == 0.0 {
            if moving.max[axis] <= target.min[axis] || target.max[axis] <= moving.min[axis] {
                return None;
            }
            continue;
        }

        let (entry, exit) = if d > 0.0 {
            (target.min[axis] - moving.max[axis], target.max[axis] - moving.min[axis])
        } else {
            (target.max[axis] - moving.min[axis], target.min[axis] - moving.max[axis])
        };
        let axis_in = entry / d;
        let axis_out = exit / d;

        if hit_axis.is_none() || axis_in > t_in {
            t_in = axis_in;
            hit_axis = Some(axis);
            entry_distance = entry;
        }
        t_out = t_out.min(axis_out);
    }

    let axis = hit_axis?;
    if t_in >= t_out {
        return None;
    }

    let mut normal = Vector3::new(0.0, 0.0, 0.0);
    normal[axis] = -displacement[axis].signum();
    Some(SweptHit {
        t_in,
        t_out,
        axis,
        normal,
        entry_distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(x: f32, y: f32, z: f32) -> Aabb {
        Aabb::new(Point3::new(x, y, z), Vector3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_touching_boxes_do_not_overlap() {
        let a = unit_at(0.0, 0.0, 0.0);
        assert!(!a.overlaps(&unit_at(1.0, 0.0, 0.0)));
        assert!(a.overlaps(&unit_at(0.5, 0.5, 0.5)));
        assert!(!a.overlaps_with_tolerance(&unit_at(0.99999, 0.0, 0.0), OVERLAP_TOLERANCE));
    }

    #[test]
    fn test_voxels_cover_partial_cells() {
        let aabb = Aabb::new(Point3::new(-0.5, 0.0, 1.2), Vector3::new(1.0, 0.9, 0.5));
        let voxels: Vec<_> = aabb.voxels().collect();
        assert_eq!(
            voxels,
            vec![Point3::new(-1, 0, 1), Point3::new(0, 0, 1)]
        );
    }

    #[test]
    fn test_falling_box_hits_floor() {
        let moving = unit_at(0.0, 0.0, 5.0);
        let floor = unit_at(0.0, 0.0, 0.0);
        let hit = swept_aabb(&moving, Vector3::new(0.0, 0.0, -8.0), &floor).unwrap();
        assert_eq!(hit.axis, 2);
        assert_eq!(hit.normal, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(hit.entry_distance, -4.0);
        assert!((hit.t_in - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_stationary_axis_without_overlap_misses() {
        let moving = unit_at(0.0, 3.0, 5.0);
        let floor = unit_at(0.0, 0.0, 0.0);
        assert_eq!(swept_aabb(&moving, Vector3::new(0.0, 0.0, -8.0), &floor), None);
        assert_eq!(swept_aabb(&moving, Vector3::new(0.0, 0.0, 0.0), &floor), None);
    }

    #[test]
    fn test_diagonal_tie_prefers_x() {
        let moving = unit_at(-2.0, -2.0, 0.0);
        let target = unit_at(0.0, 0.0, 0.0);
        let hit = swept_aabb(&moving, Vector3::new(2.0, 2.0, 0.0), &target).unwrap();
        assert_eq!(hit.axis, 0);
        assert_eq!(hit.normal, Vector3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_moving_away_reports_negative_entry() {
        let moving = unit_at(0.0, 0.0, 2.0);
        let floor = unit_at(0.0, 0.0, 0.0);
        let hit = swept_aabb(&moving, Vector3::new(0.0, 0.0, 1.0), &floor);
        assert!(hit.map_or(true, |hit| hit.t_in < 0.0 || hit.t_in > 1.0));
    }
}
