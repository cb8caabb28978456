#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! The simulation core of a voxel sandbox: an infinite, chunked, procedurally generated
//! block world with streaming, meshing and player collision. Rendering, windowing and
//! lighting solves live outside this crate and plug in through mesh events and the
//! light invalidation seam.
//!
//! ## Key Modules
//!
//! * `core` - Shared-ownership primitives used across threads
//! * `session` - The world session and its subsystems
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_world::session::{config::WorldConfig, controller::PlayerAction, WorldSession};
//!
//! let mut session = WorldSession::new(WorldConfig::default()).unwrap();
//! let report = session.tick(1.0 / 60.0, &PlayerAction::default());
//! for event in session.drain_mesh_events() {
//!     // re-upload or free the chunk buffers named by `event`
//! }
//! # let _ = report;
//! ```

use log::info;

use session::{
    config::{ConfigError, WorldConfig},
    controller::PlayerAction,
};

pub mod core;
pub mod session;

pub use session::{EditOutcome, EditRejection, WorldSession};

/// Length of the headless demo in frames.
const DEMO_FRAMES: u32 = 600;
const DEMO_DT: f32 = 1.0 / 60.0;

/// Initializes `env_logger` from `RUST_LOG`, writing to stdout. Calling it twice is
/// harmless.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    let _ = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init();
}

/// Runs a headless demo session: walk, jump, dig and build for ten simulated seconds.
///
/// The first command line argument, if any, is the path of a JSON world configuration.
pub fn run() -> Result<(), ConfigError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading world configuration from {}", path);
            WorldConfig::load(path)?
        }
        None => WorldConfig::default(),
    };

    let mut session = WorldSession::new(config)?;
    let mut light_updates = 0;
    let mut mesh_events = 0;
    for frame in 0..DEMO_FRAMES {
        let report = session.tick(DEMO_DT, &scripted_action(frame));
        if let Some(edit) = report.edit {
            info!("Frame {}: edit {:?}", frame, edit);
        }

        light_updates += session.light_mut().drain().len();
        mesh_events += session.drain_mesh_events().len();
        if frame % 60 == 0 {
            info!(
                "Frame {}: player at {:?}, {} chunks resident, {} light updates, {} mesh events",
                frame,
                session.player().position(),
                session.dimension().len(),
                light_updates,
                mesh_events
            );
        }
    }

    info!(
        "Demo finished with {} chunks and {} meshes built",
        session.dimension().len(),
        session.mesh_manager().meshes_built()
    );
    Ok(())
}

fn scripted_action(frame: u32) -> PlayerAction {
    let mut action = PlayerAction::default();
    match frame {
        0..=179 => action.move_forward = true,
        180..=189 => {
            action.move_forward = true;
            action.jump = true;
        }
        190..=239 => action.rotate = (0.0, 20.0),
        240..=359 => action.primary = true,
        360..=419 => action.secondary = true,
        420..=479 => action.rotate = (30.0, -20.0),
        _ => {
            action.move_forward = true;
            action.move_left = frame % 120 < 60;
        }
    }
    action
}
