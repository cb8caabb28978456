//! # Voxels Module
//!
//! The voxel world data model and everything that produces block data.
//!
//! ## Components
//! - `block`: the block value, its materials and face directions
//! - `chunk`: a chunk column with its explicit generation/meshing state
//! - `coords`: block, chunk and world coordinate translation
//! - `dimension`: the sparse coordinate-to-chunk store
//! - `generation`: noise field and terrain/cave generator
//! - `tasks`: background chunk generation

pub mod block;
pub mod chunk;
pub mod coords;
pub mod dimension;
pub mod generation;
pub mod tasks;
