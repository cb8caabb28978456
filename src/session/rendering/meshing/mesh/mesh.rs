//! Mesh data structures and the per-voxel mesher.
//!
//! Every solid block emits one quad for each face whose neighbor is not solid. The
//! neighbor lookup runs against a padded occupancy bitmap: the chunk's own blocks plus a
//! one-block border copied from the four horizontal neighbor chunks. A missing neighbor
//! chunk leaves its border empty, so faces on that boundary are emitted.

use bitvec::vec::BitVec;
use cgmath::{EuclideanSpace, Point2, Point3};

use super::face::{Face, QUAD_INDICES};
use crate::session::{
    rendering::Vertex,
    voxels::{
        block::block_side::BlockSide,
        chunk::ChunkData,
        coords::{chunk_to_block, CHUNK_WIDTH, CHUNK_WIDTH_USIZE},
    },
};

/// Width of the padded occupancy bitmap.
const WRAPPED_WIDTH: usize = CHUNK_WIDTH_USIZE + 2;
const WRAPPED_PLANE: usize = WRAPPED_WIDTH * WRAPPED_WIDTH;

/// Renderable geometry of one chunk: four vertices and six indices per visible face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Four vertices per face.
    pub vertices: Vec<Vertex>,
    /// Two counter-clockwise triangles per face.
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one quad with the given color.
    pub fn push_face(&mut self, face: &Face, color: [f32; 3]) {
        let base = self.vertices.len() as u32;
        let normal: [f32; 3] = face.block_side.normal().into();
        for corner in face.corners() {
            self.vertices.push(Vertex::new(
                [corner.x as f32, corner.y as f32, corner.z as f32],
                normal,
                color,
            ));
        }
        self.indices.extend(QUAD_INDICES.map(|index| base + index));
    }

    /// Number of quads in the mesh.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Returns `true` if the mesh has no faces.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The vertices of each quad, in emission order.
    pub fn faces(&self) -> impl Iterator<Item = &[Vertex]> {
        self.vertices.chunks_exact(4)
    }

    /// The vertex buffer as raw bytes, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The index buffer as raw bytes, ready for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Solidity of a chunk's blocks with a one-block border on every side.
///
/// Indexed from `-1` to `CHUNK_WIDTH` horizontally and from `-1` to `height` vertically.
struct PaddedOccupancy {
    bits: BitVec,
    height: i32,
}

impl PaddedOccupancy {
    fn new(data: &ChunkData, neighbors: &[Option<&ChunkData>; 4]) -> Self {
        let height = data.height() as i32;
        let mut occupancy = PaddedOccupancy {
            bits: BitVec::repeat(false, WRAPPED_PLANE * (height as usize + 2)),
            height,
        };

        for (local, _) in data.iter_blocks() {
            occupancy.set(local);
        }

        let last = CHUNK_WIDTH - 1;
        for (side, neighbor) in BlockSide::horizontal().into_iter().zip(neighbors) {
            let Some(neighbor) = neighbor else {
                continue;
            };
            for z in 0..height {
                for i in 0..CHUNK_WIDTH {
                    // (position in the neighbor, position in this chunk's border)
                    let (source, border) = match side {
                        BlockSide::LEFT => (Point3::new(last, i, z), Point3::new(-1, i, z)),
                        BlockSide::RIGHT => (Point3::new(0, i, z), Point3::new(CHUNK_WIDTH, i, z)),
                        BlockSide::FRONT => (Point3::new(i, last, z), Point3::new(i, -1, z)),
                        BlockSide::BACK => (Point3::new(i, 0, z), Point3::new(i, CHUNK_WIDTH, z)),
                        BlockSide::BOTTOM | BlockSide::TOP => continue,
                    };
                    if neighbor.is_solid(source) {
                        occupancy.set(border);
                    }
                }
            }
        }
        occupancy
    }

    fn index(&self, position: Point3<i32>) -> Option<usize> {
        let range = -1..=CHUNK_WIDTH;
        if !range.contains(&position.x)
            || !range.contains(&position.y)
            || !(-1..=self.height).contains(&position.z)
        {
            return None;
        }
        Some(
            (position.x + 1) as usize
                + (position.y + 1) as usize * WRAPPED_WIDTH
                + (position.z + 1) as usize * WRAPPED_PLANE,
        )
    }

    fn set(&mut self, position: Point3<i32>) {
        if let Some(index) = self.index(position) {
            self.bits.set(index, true);
        }
    }

    fn is_solid(&self, position: Point3<i32>) -> bool {
        self.index(position)
            .is_some_and(|index| self.bits.get(index).is_some_and(|bit| *bit))
    }
}

/// Builds the mesh of the chunk at `coord`.
///
/// # Arguments
/// * `coord` - Chunk coordinate, used to place vertices in world space
/// * `data` - The chunk's block data
/// * `neighbors` - Block data of the horizontal neighbors in [`BlockSide::horizontal`]
///   order, `None` where no generated chunk exists
pub fn build_chunk_mesh(
    coord: Point2<i32>,
    data: &ChunkData,
    neighbors: [Option<&ChunkData>; 4],
) -> Mesh {
    let occupancy = PaddedOccupancy::new(data, &neighbors);
    let origin = chunk_to_block(coord, Point3::origin());

    let mut mesh = Mesh::new();
    for (local, block) in data.iter_blocks() {
        for side in BlockSide::all() {
            if !occupancy.is_solid(local + side.offset()) {
                mesh.push_face(&Face::new(origin + local.to_vec(), side), block.color());
            }
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::voxels::block::{block_type::BlockType, Block};

    fn single_block(local: Point3<i32>) -> ChunkData {
        let mut data = ChunkData::new();
        data.set(local, Block::new(BlockType::STONE));
        data
    }

    #[test]
    fn test_single_block_emits_six_faces() {
        let mesh = build_chunk_mesh(Point2::new(0, 0), &single_block(Point3::new(3, 4, 0)), [None; 4]);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.vertices.len(), 24);
        assert!(mesh.indices.iter().all(|index| (*index as usize) < mesh.vertices.len()));
        assert_eq!(mesh.vertex_bytes().len(), 24 * std::mem::size_of::<Vertex>());
    }

    #[test]
    fn test_vertices_are_in_world_space() {
        let mesh = build_chunk_mesh(Point2::new(-1, 2), &single_block(Point3::new(0, 0, 5)), [None; 4]);
        for vertex in &mesh.vertices {
            assert!((-16.0..=-15.0).contains(&vertex.position[0]));
            assert!((32.0..=33.0).contains(&vertex.position[1]));
            assert!((5.0..=6.0).contains(&vertex.position[2]));
        }
    }

    #[test]
    fn test_buried_block_emits_nothing() {
        let mut data = ChunkData::new();
        for z in 0..3 {
            for y in 4..7 {
                for x in 4..7 {
                    data.set(Point3::new(x, y, z), Block::new(BlockType::DIRT));
                }
            }
        }
        let mesh = build_chunk_mesh(Point2::new(0, 0), &data, [None; 4]);
        // 3x3x3 cube: 9 quads per side
        assert_eq!(mesh.face_count(), 54);
        let center = [5.5, 5.5, 1.5];
        for face in mesh.faces() {
            let centroid: Vec<f32> = (0..3)
                .map(|axis| face.iter().map(|v| v.position[axis]).sum::<f32>() / 4.0)
                .collect();
            let touches_center = (0..3).all(|axis| (centroid[axis] - center[axis]).abs() < 1.0);
            assert!(!touches_center);
        }
    }

    #[test]
    fn test_neighbor_chunk_culls_boundary_faces() {
        let data = single_block(Point3::new(15, 8, 0));
        let neighbor = single_block(Point3::new(0, 8, 0));

        let without = build_chunk_mesh(Point2::new(0, 0), &data, [None; 4]);
        let with = build_chunk_mesh(Point2::new(0, 0), &data, [None, Some(&neighbor), None, None]);

        assert_eq!(without.face_count(), 6);
        assert_eq!(with.face_count(), 5);
        assert!(with
            .faces()
            .all(|face| face[0].normal != [1.0, 0.0, 0.0]));
    }
}
