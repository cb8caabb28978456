//! # Generation Module
//!
//! Procedural block data: a seeded noise field and the layered terrain and cave
//! generator built on top of it.

pub mod noise_field;
pub mod terrain;

pub use noise_field::NoiseSource;
pub use terrain::TerrainGenerator;
