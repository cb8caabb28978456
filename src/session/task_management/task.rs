//! # Task System Core Traits
//!
//! This module defines the two halves of a unit of background work:
//! - `Task`: runs on a worker thread and owns everything it reads
//! - `TaskResult`: runs on the simulation thread and applies the work to the world
//!
//! ## Task Lifecycle
//! 1. A `Task` is published via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the simulation thread with a
//!    [`TaskContext`] borrowing the world state
//! 5. The result can spawn follow-up tasks

use crate::session::{
    lighting::LightInvalidation, rendering::MeshManager, voxels::dimension::Dimension,
};

/// The world state a task result may touch, borrowed for one round of result handling.
pub struct TaskContext<'a> {
    /// The loaded chunks.
    pub dimension: &'a mut Dimension,
    /// Dirty chunk tracking and mesh events.
    pub mesh_manager: &'a mut MeshManager,
    /// Receives positions whose light became stale.
    pub light: &'a mut dyn LightInvalidation,
    /// Chunks whose generated data was stored.
    pub generated: usize,
    /// Meshes attached to chunks.
    pub meshed: usize,
    /// Meshes thrown away because their chunk changed while they were built.
    pub discarded: usize,
}

impl<'a> TaskContext<'a> {
    /// Borrows the world state with all counters at zero.
    pub fn new(
        dimension: &'a mut Dimension,
        mesh_manager: &'a mut MeshManager,
        light: &'a mut dyn LightInvalidation,
    ) -> Self {
        TaskContext {
            dimension,
            mesh_manager,
            light,
            generated: 0,
            meshed: 0,
            discarded: 0,
        }
    }
}

/// A unit of work that can be executed on a worker thread.
///
/// Tasks should own all the data they need. Shared world data is reached through
/// `MtResource` handles and only read.
pub trait Task: Send {
    /// Processes the task and returns a result for the simulation thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// The result of processing a `Task`.
pub trait TaskResult: Send {
    /// Applies the result on the simulation thread.
    ///
    /// # Returns
    /// Follow-up tasks to publish (can be empty).
    fn handle_result(self: Box<Self>, ctx: &mut TaskContext<'_>) -> Vec<Box<dyn Task + Send>>;
}
