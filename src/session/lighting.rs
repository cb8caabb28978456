//! # Light Invalidation
//!
//! The world core does not compute lighting. Its only obligation towards a lighting
//! solver is to report every block position whose light may have changed:
//! - every voxel of a freshly generated chunk
//! - the position of a placed block
//! - the position of a removed block and its six face neighbors
//!
//! Solvers plug in through [`LightInvalidation`]. [`PendingLightUpdates`] is the default
//! collaborator: it collects positions, without duplicates, until a solver drains them.

use std::collections::HashSet;

use cgmath::Point3;

use crate::session::voxels::block::block_side::BlockSide;

/// Receives block positions whose lighting must be recomputed.
pub trait LightInvalidation {
    /// Marks the light at `position` as stale.
    fn invalidate(&mut self, position: Point3<i32>);

    /// Invalidates `position` and the six positions sharing a face with it.
    fn invalidate_with_neighbors(&mut self, position: Point3<i32>) {
        self.invalidate(position);
        for side in BlockSide::all() {
            self.invalidate(position + side.offset());
        }
    }
}

/// Records every call in order. Mostly useful to observe invalidation in tests.
impl LightInvalidation for Vec<Point3<i32>> {
    fn invalidate(&mut self, position: Point3<i32>) {
        self.push(position);
    }
}

/// A deduplicated queue of positions awaiting a lighting solve.
#[derive(Debug, Default)]
pub struct PendingLightUpdates {
    queue: Vec<Point3<i32>>,
    queued: HashSet<Point3<i32>>,
    total_requests: u64,
}

impl PendingLightUpdates {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct positions waiting to be drained.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if no position is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns `true` if `position` is waiting to be drained.
    pub fn contains(&self, position: Point3<i32>) -> bool {
        self.queued.contains(&position)
    }

    /// Every `invalidate` call received so far, duplicates included.
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Hands the queued positions to a solver, in first-request order.
    pub fn drain(&mut self) -> Vec<Point3<i32>> {
        self.queued.clear();
        std::mem::take(&mut self.queue)
    }
}

impl LightInvalidation for PendingLightUpdates {
    fn invalidate(&mut self, position: Point3<i32>) {
        self.total_requests += 1;
        if self.queued.insert(position) {
            self.queue.push(position);
        }
    }
}
