//! Mesh generation for voxel rendering.
//!
//! Converts chunk block data into flat vertex and index buffers. Each visible block
//! face becomes one quad made of two counter-clockwise triangles.
//!
//! # Architecture
//! - [`Mesh`]: the vertex and index buffers of one chunk
//! - [`Face`]: one quad of a voxel with its corners and side
//! - [`build_chunk_mesh`]: the per-voxel mesher with neighbor-chunk face culling

mod face;
mod mesh;

pub use face::{Face, QUAD_INDICES};
pub use mesh::*;
