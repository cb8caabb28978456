//! # Rendering Module
//!
//! Everything the world core hands to a rendering backend: chunk meshes, their
//! vertex format, and the bookkeeping that decides when a mesh must be rebuilt.
//! The backend itself (buffers, pipelines, draw calls) lives outside this crate.

pub mod meshing;
pub mod tasks;
pub mod vertex;

pub use meshing::{mesh::Mesh, MeshEvent, MeshManager};
pub use vertex::Vertex;
