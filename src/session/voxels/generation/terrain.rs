//! # Terrain Generator
//!
//! Fills one chunk's block data from its coordinate alone. The generator never looks at
//! neighboring chunks, so chunks can be generated in any order and on any thread with
//! bit-identical results.
//!
//! ## Layered generation
//!
//! 1. Every column evaluates one height per terrain layer: `base + Σ octaves`, floored and
//!    clamped at zero. The layers stack, so each one owns a band
//!    `[cumulative_below, cumulative_below + height)`.
//! 2. The chunk gets exactly as many layers as its tallest column.
//! 3. A voxel takes the material of the lowest band containing it, or air above all bands.
//! 4. A 3D density field then carves caves: a solid voxel inside the cave height band whose
//!    density is below the threshold becomes air. Carving never adds material.

use cgmath::{Point2, Point3};

use super::noise_field::{derive_seed, NoiseSource};
use crate::session::{
    config::{CavesConfig, GenerationMethod, Octave, WorldConfig},
    voxels::{
        block::block_type::BlockType,
        chunk::{chunk_creation::ChunkDataBuilder, ChunkData},
        coords::{chunk_to_block, CHUNK_WIDTH, CHUNK_WIDTH_USIZE, MAX_WORLD_HEIGHT},
    },
};

/// Noise stream reserved for cave density. Terrain layer `i` uses stream `i + 1`.
const CAVE_STREAM: u64 = 0;

#[derive(Clone, Debug)]
struct LayerSampler {
    block_type: BlockType,
    base: f64,
    octaves: Vec<Octave>,
    noise: NoiseSource,
}

/// Produces chunk block data for one world configuration.
///
/// The generator is immutable and shared between worker threads behind an `Arc`.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    method: GenerationMethod,
    layers: Vec<LayerSampler>,
    caves: CavesConfig,
    cave_octaves: Vec<Octave>,
    cave_noise: NoiseSource,
}

impl TerrainGenerator {
    /// Creates a generator for a validated configuration.
    pub fn new(config: &WorldConfig) -> Self {
        let layers = config
            .terrain
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| LayerSampler {
                block_type: layer.block_type,
                base: layer.base,
                octaves: layer.octaves(),
                noise: NoiseSource::new(derive_seed(config.seed, index as u64 + 1)),
            })
            .collect();

        TerrainGenerator {
            method: config.terrain.method.clone(),
            layers,
            caves: config.caves.clone(),
            cave_octaves: config.caves.octaves(),
            cave_noise: NoiseSource::new(derive_seed(config.seed, CAVE_STREAM)),
        }
    }

    /// Generates the block data of the chunk at `coord`.
    pub fn generate(&self, coord: Point2<i32>) -> ChunkData {
        match &self.method {
            GenerationMethod::Layered => self.generate_layered(coord, self.caves.enabled),
            GenerationMethod::Flat { height, block_type } => {
                let height = (*height).min(MAX_WORLD_HEIGHT as u32) as usize;
                let mut builder = ChunkDataBuilder::new(height);
                for _ in 0..height * CHUNK_WIDTH_USIZE * CHUNK_WIDTH_USIZE {
                    builder.push_block_type(*block_type);
                }
                builder.finish()
            }
            GenerationMethod::Empty => ChunkData::new(),
        }
    }

    /// Generates the layered terrain of a chunk without carving caves.
    pub fn generate_uncarved(&self, coord: Point2<i32>) -> ChunkData {
        self.generate_layered(coord, false)
    }

    /// Cumulative band tops of a column, bottom layer first.
    ///
    /// The last entry's height is the column's total height. Band tops never exceed
    /// `MAX_WORLD_HEIGHT`.
    pub fn column_bands(&self, x: i32, y: i32) -> Vec<(BlockType, u32)> {
        let position = [x as f64 + 0.5, y as f64 + 0.5];
        let mut cumulative = 0u32;
        self.layers
            .iter()
            .map(|layer| {
                let height = (layer.base + layer.noise.fractal_2d(position, &layer.octaves))
                    .floor()
                    .max(0.0) as u32;
                cumulative = cumulative.saturating_add(height).min(MAX_WORLD_HEIGHT as u32);
                (layer.block_type, cumulative)
            })
            .collect()
    }

    /// Returns `true` if the cave field carves the voxel at `position`.
    pub fn is_cave(&self, position: Point3<i32>) -> bool {
        if !self.caves.enabled || position.z < 0 {
            return false;
        }
        let z = position.z as u32;
        if z < self.caves.min_height || z >= self.caves.max_height {
            return false;
        }
        let sample = [
            position.x as f64 + 0.5,
            position.y as f64 + 0.5,
            position.z as f64 + 0.5,
        ];
        self.cave_noise.fractal_3d(sample, &self.cave_octaves) < self.caves.threshold
    }

    fn generate_layered(&self, coord: Point2<i32>, carve: bool) -> ChunkData {
        let mut columns = Vec::with_capacity(CHUNK_WIDTH_USIZE * CHUNK_WIDTH_USIZE);
        let mut height = 0;
        for y in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                let world = chunk_to_block(coord, Point3::new(x, y, 0));
                let bands = self.column_bands(world.x, world.y);
                height = height.max(bands.last().map_or(0, |band| band.1));
                columns.push(bands);
            }
        }

        let mut builder = ChunkDataBuilder::new(height as usize);
        for z in 0..height {
            for y in 0..CHUNK_WIDTH {
                for x in 0..CHUNK_WIDTH {
                    let bands = &columns[(y * CHUNK_WIDTH + x) as usize];
                    let mut block_type = bands
                        .iter()
                        .find(|(_, top)| z < *top)
                        .map_or(BlockType::AIR, |(block_type, _)| *block_type);

                    if carve && block_type != BlockType::AIR {
                        let position = chunk_to_block(coord, Point3::new(x, y, z as i32));
                        if self.is_cave(position) {
                            block_type = BlockType::AIR;
                        }
                    }
                    builder.push_block_type(block_type);
                }
            }
        }
        builder.finish()
    }
}
