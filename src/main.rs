//! # Voxel World Demo
//!
//! Runs a headless world session with a scripted player.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [world.json]
//! ```

use log::error;

fn main() {
    voxel_world::init_logger();
    if let Err(err) = voxel_world::run() {
        error!("{}", err);
        std::process::exit(1);
    }
}
