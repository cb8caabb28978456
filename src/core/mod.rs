//! # Core Module
//!
//! Shared-ownership primitives used by the world session and its worker pool.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking

pub mod mt_resource;

pub use mt_resource::MtResource;
