//! Worker-side chunk meshing.

pub mod chunk_mesh_generation_task;
