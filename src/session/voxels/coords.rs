//! # Coordinate Module
//!
//! Translation between the three coordinate spaces of the world:
//! - world space: continuous `f32` positions of entities
//! - block space: integer coordinates of single voxels
//! - chunk space: 2D integer coordinates of chunk columns
//!
//! Chunks only tile the horizontal plane. X and Y split into a chunk coordinate and a
//! local offset by floor division, so negative coordinates land in the chunk "below"
//! zero. Z passes through unchanged.

use cgmath::{Point2, Point3};

/// The width and depth of a chunk in blocks.
pub const CHUNK_WIDTH: i32 = 16;

/// `CHUNK_WIDTH` as an index type.
pub const CHUNK_WIDTH_USIZE: usize = CHUNK_WIDTH as usize;

/// Number of block layers a chunk column can hold. Valid block Z coordinates lie in
/// `0..MAX_WORLD_HEIGHT`.
pub const MAX_WORLD_HEIGHT: i32 = 256;

/// Returns `true` if `z` is a block layer the world can store.
pub fn in_world_height(z: i32) -> bool {
    (0..MAX_WORLD_HEIGHT).contains(&z)
}

/// Splits a global block coordinate into its chunk coordinate and local offset.
///
/// The local X and Y components always lie in `0..CHUNK_WIDTH`.
pub fn block_to_chunk(position: Point3<i32>) -> (Point2<i32>, Point3<i32>) {
    let chunk = Point2::new(
        position.x.div_euclid(CHUNK_WIDTH),
        position.y.div_euclid(CHUNK_WIDTH),
    );
    let local = Point3::new(
        position.x.rem_euclid(CHUNK_WIDTH),
        position.y.rem_euclid(CHUNK_WIDTH),
        position.z,
    );
    (chunk, local)
}

/// Recomposes a global block coordinate from a chunk coordinate and a local offset.
pub fn chunk_to_block(chunk: Point2<i32>, local: Point3<i32>) -> Point3<i32> {
    Point3::new(
        chunk.x * CHUNK_WIDTH + local.x,
        chunk.y * CHUNK_WIDTH + local.y,
        local.z,
    )
}

/// The block containing a world-space point.
pub fn world_to_block(position: Point3<f32>) -> Point3<i32> {
    Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    )
}

/// The chunk whose column contains a world-space point.
pub fn world_to_chunk(position: Point3<f32>) -> Point2<i32> {
    block_to_chunk(world_to_block(position)).0
}

/// Chebyshev distance between two chunk coordinates. Load and unload radii are
/// measured with it, which makes the loaded area a square.
pub fn chunk_distance(a: Point2<i32>, b: Point2<i32>) -> u32 {
    (a.x - b.x).unsigned_abs().max((a.y - b.y).unsigned_abs())
}

/// All chunk coordinates within `radius` of `center`, nearest first.
///
/// Ties in Euclidean distance are ordered by coordinate so the result is
/// deterministic.
pub fn chunks_in_radius(center: Point2<i32>, radius: u32) -> Vec<Point2<i32>> {
    let r = radius as i32;
    let mut coords: Vec<Point2<i32>> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| Point2::new(center.x + dx, center.y + dy)))
        .collect();
    coords.sort_by_key(|coord| {
        let dx = (coord.x - center.x) as i64;
        let dy = (coord.y - center.y) as i64;
        (dx * dx + dy * dy, coord.x, coord.y)
    });
    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_blocks_floor_into_negative_chunks() {
        let (chunk, local) = block_to_chunk(Point3::new(-1, -16, 3));
        assert_eq!(chunk, Point2::new(-1, -1));
        assert_eq!(local, Point3::new(15, 0, 3));

        let (chunk, local) = block_to_chunk(Point3::new(-17, 15, 0));
        assert_eq!(chunk, Point2::new(-2, 0));
        assert_eq!(local, Point3::new(15, 15, 0));
    }

    #[test]
    fn test_world_to_chunk_floors() {
        assert_eq!(world_to_chunk(Point3::new(-0.1, 0.0, 5.0)), Point2::new(-1, 0));
        assert_eq!(world_to_chunk(Point3::new(15.99, 16.0, 5.0)), Point2::new(0, 1));
    }

    #[test]
    fn test_chunks_in_radius_is_square_and_nearest_first() {
        let center = Point2::new(3, -2);
        let coords = chunks_in_radius(center, 2);
        assert_eq!(coords.len(), 25);
        assert_eq!(coords[0], center);
        assert!(coords.iter().all(|c| chunk_distance(*c, center) <= 2));
        assert_eq!(chunks_in_radius(center, 0), vec![center]);
    }
}
