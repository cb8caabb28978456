//! # World Configuration
//!
//! Every tunable of a world session lives in [`WorldConfig`]: the generation seed and
//! terrain layers, cave carving, streaming radii, the physics constants and the player
//! controller. The record is read once at session creation, validated, and then shared
//! read-only by every generation task.
//!
//! Configurations are plain `serde` structures, so a world can be described in JSON:
//!
//! ```json
//! {
//!   "seed": 42,
//!   "streaming": { "load_radius": 3, "unload_radius": 5 },
//!   "terrain": { "method": { "type": "flat", "height": 4, "block_type": "stone" } }
//! }
//! ```
//!
//! Fields that are left out take the values of [`WorldConfig::default`].

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::voxels::{block::block_type::BlockType, coords::MAX_WORLD_HEIGHT};

/// Errors raised while loading or validating a [`WorldConfig`].
///
/// All of them are fatal to session startup; none can occur once a session runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Layered generation was selected with an empty layer list.
    #[error("terrain generation is layered but no layers are configured")]
    NoTerrainLayers,

    /// A terrain layer has an out-of-range parameter.
    #[error("terrain layer {index} is invalid: {reason}")]
    InvalidLayer {
        /// Position of the layer, bottom first.
        index: usize,
        /// The violated constraint.
        reason: &'static str,
    },

    /// The layers together can stack above the world height.
    #[error("layered terrain can reach {height} blocks, above the world height of {}", MAX_WORLD_HEIGHT)]
    TerrainTooTall {
        /// Sum of the layers' maximum heights.
        height: f64,
    },

    /// Flat generation has an invalid material or height.
    #[error("flat terrain is invalid: {0}")]
    InvalidFlatTerrain(&'static str),

    /// A cave parameter is out of range.
    #[error("cave configuration is invalid: {0}")]
    InvalidCaves(&'static str),

    /// The streaming radii, residency cap or generation budget contradict each other.
    #[error("streaming configuration is invalid: {0}")]
    InvalidStreaming(String),

    /// A physics constant is out of range.
    #[error("physics configuration is invalid: {0}")]
    InvalidPhysics(&'static str),

    /// The player or controller configuration is unusable.
    #[error("player configuration is invalid: {0}")]
    InvalidPlayer(&'static str),

    /// The configuration file could not be read.
    #[error("failed to read world configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for this structure.
    #[error("failed to parse world configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One term of a fractal noise sum.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Octave {
    /// Spatial frequency of the sample.
    pub frequency: f64,
    /// Weight of the sample; its contribution lies in `[0, amplitude]`.
    pub amplitude: f64,
}

/// How chunk block data is produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationMethod {
    /// Stacked noise height fields followed by 3D cave carving.
    Layered,
    /// Every column is filled with one material up to a fixed height. Caves are not carved.
    Flat {
        /// Number of filled layers.
        height: u32,
        /// Material of every filled block.
        block_type: BlockType,
    },
    /// Chunks contain no blocks at all.
    Empty,
}

/// Parameters of one terrain layer.
///
/// The layer contributes `base + Σ octave` blocks of `block_type` to every column, where
/// octave `i` samples at `frequency * lacunarity^i` with weight `amplitude * persistence^i`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainLayerConfig {
    /// Material of the layer's band.
    pub block_type: BlockType,
    /// Height added to every column before noise.
    pub base: f64,
    /// Frequency of the first octave.
    pub frequency: f64,
    /// Amplitude of the first octave.
    pub amplitude: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Number of octaves.
    pub octaves: u32,
}

impl TerrainLayerConfig {
    /// Expands the layer parameters into its explicit octave list.
    pub fn octaves(&self) -> Vec<Octave> {
        octave_list(
            self.frequency,
            self.amplitude,
            self.lacunarity,
            self.persistence,
            self.octaves,
        )
    }

    /// The tallest band this layer can produce: `base` plus every octave at full amplitude,
    /// clamped at zero.
    pub fn max_height(&self) -> f64 {
        let peak: f64 = self.octaves().iter().map(|octave| octave.amplitude).sum();
        (self.base + peak).max(0.0)
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let invalid = |reason| Err(ConfigError::InvalidLayer { index, reason });

        if self.block_type == BlockType::AIR {
            return invalid("block type must not be air");
        }
        if !self.base.is_finite() {
            return invalid("base height must be finite");
        }
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return invalid("frequency must be positive");
        }
        if !(self.amplitude.is_finite() && self.amplitude >= 0.0) {
            return invalid("amplitude must not be negative");
        }
        if !(self.lacunarity.is_finite() && self.lacunarity > 0.0) {
            return invalid("lacunarity must be positive");
        }
        if !(self.persistence.is_finite() && self.persistence > 0.0) {
            return invalid("persistence must be positive");
        }
        if self.octaves == 0 {
            return invalid("at least one octave is required");
        }
        if self.max_height() > f64::from(MAX_WORLD_HEIGHT) {
            return invalid("maximum height exceeds the world height");
        }
        Ok(())
    }
}

/// Terrain generation method and layer stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// How chunk data is produced.
    pub method: GenerationMethod,
    /// Layers from the bottom up. Only read by [`GenerationMethod::Layered`].
    pub layers: Vec<TerrainLayerConfig>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            method: GenerationMethod::Layered,
            layers: vec![
                TerrainLayerConfig {
                    block_type: BlockType::STONE,
                    base: 0.0,
                    frequency: 0.125 / 16.0,
                    amplitude: 40.0,
                    lacunarity: 2.0,
                    persistence: 0.5,
                    octaves: 4,
                },
                TerrainLayerConfig {
                    block_type: BlockType::GRASS,
                    base: 0.0,
                    frequency: 0.25 / 16.0,
                    amplitude: 1.25,
                    lacunarity: 2.0,
                    persistence: 2.0,
                    octaves: 3,
                },
            ],
        }
    }
}

/// 3D density carving applied after the layered height fields.
///
/// A voxel inside `[min_height, max_height)` whose fractal density is strictly below
/// `threshold` is forced empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CavesConfig {
    /// Whether caves are carved at all.
    pub enabled: bool,
    /// Density below which a voxel is carved.
    pub threshold: f64,
    /// Frequency of the first octave.
    pub frequency: f64,
    /// Amplitude of the first octave.
    pub amplitude: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Number of octaves.
    pub octaves: u32,
    /// Lowest carved layer.
    pub min_height: u32,
    /// First layer above the carved band.
    pub max_height: u32,
}

impl CavesConfig {
    /// Expands the cave parameters into their explicit octave list.
    pub fn octaves(&self) -> Vec<Octave> {
        octave_list(
            self.frequency,
            self.amplitude,
            self.lacunarity,
            self.persistence,
            self.octaves,
        )
    }
}

impl Default for CavesConfig {
    fn default() -> Self {
        CavesConfig {
            enabled: true,
            threshold: 0.45,
            frequency: 1.0 / 16.0,
            amplitude: 0.5,
            lacunarity: 2.0,
            persistence: 0.5,
            octaves: 5,
            min_height: 1,
            max_height: 256,
        }
    }
}

/// Chunk residency around the player, in chunk units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chebyshev radius around the player that is kept generated and meshed.
    pub load_radius: u32,
    /// Chunks farther than this from the player are evicted.
    pub unload_radius: u32,
    /// Upper bound on resident chunks; the least recently requested ones go first.
    pub max_resident_chunks: Option<usize>,
    /// Caps how many chunks one call may generate. Nearest chunks are generated first.
    pub max_generations_per_tick: Option<usize>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        StreamingConfig {
            load_radius: 4,
            unload_radius: 6,
            max_resident_chunks: None,
            max_generations_per_tick: None,
        }
    }
}

/// Constants of the collision resolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration in blocks per second squared.
    pub gravity: f32,
    /// Fraction of velocity lost per step while airborne.
    pub friction_air: f32,
    /// Fraction of velocity lost per step on the ground.
    pub friction_grounded: f32,
    /// Largest downward speed an entity may reach.
    pub terminal_velocity: f32,
    /// Passes of the overlap-and-push fallback before a step is rolled back.
    pub max_collision_iterations: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            gravity: 9.8,
            friction_air: 0.03,
            friction_grounded: 0.05,
            terminal_velocity: 50.0,
            max_collision_iterations: 5,
        }
    }
}

/// Player controller tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Acceleration applied by the movement keys.
    pub movement_force: f32,
    /// Upward impulse of a jump.
    pub jump_strength: f32,
    /// Radians of view rotation per unit of cursor motion.
    pub rotation_speed: f32,
    /// Reach of block selection in blocks.
    pub ray_cast_length: f32,
    /// Seconds between two block edits.
    pub action_cooldown: f32,
    /// Material placed by the secondary action.
    pub placement_block: BlockType,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            movement_force: 20.0,
            jump_strength: 5.0,
            rotation_speed: 0.002,
            ray_cast_length: 8.0,
            action_cooldown: 0.2,
            placement_block: BlockType::STONE,
        }
    }
}

/// The player's spawn column and body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Horizontal spawn column. The player is dropped onto the surface of that column.
    pub spawn: [f32; 2],
    /// Extents of the player's bounding box.
    pub bounding_box: [f32; 3],
    /// Eye position relative to the minimum corner of the bounding box.
    pub eye_offset: [f32; 3],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            spawn: [0.0, 0.0],
            bounding_box: [0.9, 0.9, 1.9],
            eye_offset: [0.45, 0.45, 1.6],
        }
    }
}

/// The immutable description of a world session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Root seed; every noise stream is derived from it.
    pub seed: u64,
    /// Terrain generation.
    pub terrain: TerrainConfig,
    /// Cave carving.
    pub caves: CavesConfig,
    /// Chunk residency.
    pub streaming: StreamingConfig,
    /// Collision and integration constants.
    pub physics: PhysicsConfig,
    /// Player controller tuning.
    pub controller: ControllerConfig,
    /// The player's body and spawn.
    pub player: PlayerConfig,
    /// Threads used for chunk generation and meshing. Zero runs every task inline.
    pub worker_threads: usize,
}

impl WorldConfig {
    /// Parses a configuration from JSON. The result is not validated yet.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every parameter that would make generation or physics meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.terrain.method {
            GenerationMethod::Layered => {
                if self.terrain.layers.is_empty() {
                    return Err(ConfigError::NoTerrainLayers);
                }
                for (index, layer) in self.terrain.layers.iter().enumerate() {
                    layer.validate(index)?;
                }
                let height: f64 = self.terrain.layers.iter().map(|l| l.max_height()).sum();
                if height > f64::from(MAX_WORLD_HEIGHT) {
                    return Err(ConfigError::TerrainTooTall { height });
                }
            }
            GenerationMethod::Flat { height, block_type } => {
                if *block_type == BlockType::AIR {
                    return Err(ConfigError::InvalidFlatTerrain("block type must not be air"));
                }
                if *height > MAX_WORLD_HEIGHT as u32 {
                    return Err(ConfigError::InvalidFlatTerrain(
                        "height exceeds the world height",
                    ));
                }
            }
            GenerationMethod::Empty => {}
        }

        let caves = &self.caves;
        if caves.enabled {
            if !(caves.frequency.is_finite() && caves.frequency > 0.0) {
                return Err(ConfigError::InvalidCaves("frequency must be positive"));
            }
            if !(caves.amplitude.is_finite() && caves.amplitude >= 0.0) {
                return Err(ConfigError::InvalidCaves("amplitude must not be negative"));
            }
            if !(caves.lacunarity.is_finite() && caves.lacunarity > 0.0) {
                return Err(ConfigError::InvalidCaves("lacunarity must be positive"));
            }
            if !(caves.persistence.is_finite() && caves.persistence > 0.0) {
                return Err(ConfigError::InvalidCaves("persistence must be positive"));
            }
            if caves.octaves == 0 {
                return Err(ConfigError::InvalidCaves("at least one octave is required"));
            }
            if !caves.threshold.is_finite() {
                return Err(ConfigError::InvalidCaves("threshold must be finite"));
            }
            if caves.min_height > caves.max_height {
                return Err(ConfigError::InvalidCaves("min_height exceeds max_height"));
            }
        }

        let streaming = &self.streaming;
        if streaming.unload_radius < streaming.load_radius {
            return Err(ConfigError::InvalidStreaming(format!(
                "unload radius {} is smaller than load radius {}",
                streaming.unload_radius, streaming.load_radius
            )));
        }
        if let Some(capacity) = streaming.max_resident_chunks {
            let required = square_area(streaming.load_radius);
            if capacity < required {
                return Err(ConfigError::InvalidStreaming(format!(
                    "{capacity} resident chunks cannot hold the {required} chunks of the load radius"
                )));
            }
        }
        if streaming.max_generations_per_tick == Some(0) {
            return Err(ConfigError::InvalidStreaming(
                "the generation budget must allow at least one chunk".to_string(),
            ));
        }

        let physics = &self.physics;
        if !(physics.gravity.is_finite() && physics.gravity >= 0.0) {
            return Err(ConfigError::InvalidPhysics("gravity must not be negative"));
        }
        for friction in [physics.friction_air, physics.friction_grounded] {
            if !(0.0..1.0).contains(&friction) {
                return Err(ConfigError::InvalidPhysics("friction must lie in [0, 1)"));
            }
        }
        if !(physics.terminal_velocity.is_finite() && physics.terminal_velocity > 0.0) {
            return Err(ConfigError::InvalidPhysics("terminal velocity must be positive"));
        }
        if physics.max_collision_iterations == 0 {
            return Err(ConfigError::InvalidPhysics(
                "at least one collision iteration is required",
            ));
        }

        if self
            .player
            .bounding_box
            .iter()
            .any(|extent| !(extent.is_finite() && *extent > 0.0))
        {
            return Err(ConfigError::InvalidPlayer("bounding box extents must be positive"));
        }
        if self.controller.placement_block == BlockType::AIR {
            return Err(ConfigError::InvalidPlayer("placement block must not be air"));
        }

        Ok(())
    }
}

/// Number of chunks in a square of the given Chebyshev radius.
pub fn square_area(radius: u32) -> usize {
    let side = 2 * radius as usize + 1;
    side * side
}

fn octave_list(
    frequency: f64,
    amplitude: f64,
    lacunarity: f64,
    persistence: f64,
    count: u32,
) -> Vec<Octave> {
    (0..count as i32)
        .map(|i| Octave {
            frequency: frequency * lacunarity.powi(i),
            amplitude: amplitude * persistence.powi(i),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_stone_octaves() {
        let config = TerrainConfig::default();
        let octaves = config.layers[0].octaves();
        let expected = [(0.125, 40.0), (0.25, 20.0), (0.5, 10.0), (1.0, 5.0)];
        assert_eq!(octaves.len(), expected.len());
        for (octave, (frequency, amplitude)) in octaves.iter().zip(expected) {
            assert!((octave.frequency - frequency / 16.0).abs() < 1e-12);
            assert!((octave.amplitude - amplitude).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_frequency_is_rejected() {
        let mut config = WorldConfig::default();
        config.terrain.layers[1].frequency = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLayer { index: 1, .. })
        ));
    }

    #[test]
    fn test_layer_taller_than_the_world_is_rejected() {
        let mut config = WorldConfig::default();
        config.terrain.layers[0].base = 3.0e9;
        config.terrain.layers[1].base = 3.0e9;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLayer { index: 0, .. })
        ));

        let mut config = WorldConfig::default();
        config.terrain.layers[1].persistence = 1.0e300;
        config.terrain.layers[1].octaves = 8;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLayer { index: 1, .. })
        ));
    }

    #[test]
    fn test_stacked_layers_taller_than_the_world_are_rejected() {
        let mut config = WorldConfig::default();
        config.terrain.layers[0].base = 150.0;
        config.terrain.layers[1].base = 150.0;
        assert!(config.terrain.layers.iter().all(|layer| layer.max_height() <= 256.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TerrainTooTall { .. })
        ));
    }

    #[test]
    fn test_flat_terrain_height_is_bounded() {
        let mut config = WorldConfig::default();
        config.terrain.method = GenerationMethod::Flat {
            height: MAX_WORLD_HEIGHT as u32,
            block_type: BlockType::STONE,
        };
        assert!(config.validate().is_ok());
        config.terrain.method = GenerationMethod::Flat {
            height: u32::MAX,
            block_type: BlockType::STONE,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFlatTerrain(_))
        ));
    }

    #[test]
    fn test_unload_radius_below_load_radius_is_rejected() {
        let mut config = WorldConfig::default();
        config.streaming.load_radius = 5;
        config.streaming.unload_radius = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStreaming(_))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = WorldConfig::from_json_str(
            r#"{ "seed": 7, "terrain": { "method": { "type": "flat", "height": 3, "block_type": "dirt" } } }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(
            config.terrain.method,
            GenerationMethod::Flat {
                height: 3,
                block_type: BlockType::DIRT
            }
        );
        assert_eq!(config.physics, PhysicsConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(
            WorldConfig::from_json_str("{ \"seed\": "),
            Err(ConfigError::Parse(_))
        ));
    }
}
