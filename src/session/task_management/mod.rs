//! # Task Management System
//!
//! A small worker pool for chunk generation and meshing.
//!
//! ## Architecture Overview
//! - `TaskManager`: distributes tasks to workers and applies their results
//! - `Task`: a unit of work executed on a worker thread
//! - `TaskResult`: the result of a task, applied on the simulation thread
//! - `TaskChannel`: the pair of channels connecting the manager to one worker
//!
//! Each worker has a dedicated channel and tasks are handed out round-robin, at most
//! `MAX_TASKS_IN_FLIGHT` per worker. Everything else waits in a FIFO queue.
//!
//! A manager created with zero workers runs every task inline on the calling thread.
//! The same happens once every worker has been lost, so a crashed worker degrades
//! throughput but never stalls the simulation.
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. Workers process them and send back results
//! 3. Results are applied in `process_completed_tasks()` or `run_until_idle()`
//! 4. Results may publish follow-up tasks
//!
//! A simulation tick calls `run_until_idle()` after publishing its work, which blocks
//! until every task and follow-up has been applied. No task is ever left running
//! across a structural edit of the world.

pub mod task;

use log::{error, info};
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use task::{Task, TaskContext, TaskResult};

/// A communication channel between the simulation thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from the simulation thread to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tasks sent but not yet answered
/// - `_worker`: Handle to the worker thread
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// Dropping the manager closes every task channel, which ends the worker loops.
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. Zero processes tasks inline.
    ///
    /// Workers that fail to spawn are logged and skipped.
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            match thread::Builder::new()
                .name(format!("world-worker-{index}"))
                .spawn(task_closure)
            {
                Ok(worker) => channels.push(TaskChannel {
                    task_sender: task_tx,
                    result_receiver: result_rx,
                    num_tasks_in_flight: 0,
                    _worker: worker,
                }),
                Err(err) => error!("Failed to spawn world worker {index}: {err}"),
            }
        }

        info!(
            "Task manager running {} worker threads (available parallelism: {:?})",
            channels.len(),
            thread::available_parallelism().map(|n| n.get()).ok()
        );

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Tasks currently being processed by workers.
    pub fn in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Tasks waiting for a free worker.
    pub fn queued(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Returns `true` if no task is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.in_flight() == 0
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was sent; the in-flight counter is incremented
    /// - `Err(task)` if the worker is gone, handing the task back for requeueing
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an available worker channel, round-robin from the last used one.
    ///
    /// # Returns
    /// - `Some(usize)` index of a channel below `MAX_TASKS_IN_FLIGHT`
    /// - `None` if all channels are busy or there are no channels
    fn find_available_channel(&self) -> Option<usize> {
        let len = self.channels.len();
        (0..len)
            .map(|offset| (self.current_channel + offset) % len)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Removes a worker whose thread has terminated. Its in-flight tasks are lost; the
    /// work they stood for is detected as missing and rescheduled by the next tick.
    fn drop_channel(&mut self, channel_idx: usize) {
        let channel = self.channels.remove(channel_idx);
        error!(
            "World worker disconnected with {} task(s) in flight; {} worker(s) left",
            channel.num_tasks_in_flight,
            self.channels.len()
        );
        if self.current_channel >= self.channels.len() {
            self.current_channel = 0;
        }
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately handed to a worker
    /// - `false` if the task was queued
    pub fn publish_task(&mut self, mut task: Box<dyn Task + Send>) -> bool {
        loop {
            let Some(channel_idx) = self.find_available_channel() else {
                self.queued_tasks.push_back(task);
                return false;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(()) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    return true;
                }
                Err(returned) => {
                    self.drop_channel(channel_idx);
                    task = returned;
                }
            }
        }
    }

    /// Hands queued tasks to workers until the queue is empty or every worker is busy.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(()) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    self.queued_tasks.push_front(task);
                    self.drop_channel(channel_idx);
                }
            }
        }
    }

    /// Applies every result that workers have finished so far, without blocking.
    ///
    /// # Returns
    /// The number of results applied.
    pub fn process_completed_tasks(&mut self, ctx: &mut TaskContext<'_>) -> usize {
        let mut handled = 0;
        let mut tasks_to_queue = Vec::new();
        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                tasks_to_queue.extend(result.handle_result(ctx));
                handled += 1;
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }
        handled
    }

    /// Processes tasks until nothing is queued or in flight, blocking on worker results.
    ///
    /// # Returns
    /// The number of results applied.
    pub fn run_until_idle(&mut self, ctx: &mut TaskContext<'_>) -> usize {
        let mut handled = 0;
        loop {
            if self.channels.is_empty() {
                while let Some(task) = self.queued_tasks.pop_front() {
                    let result = task.process();
                    self.queued_tasks.extend(result.handle_result(ctx));
                    handled += 1;
                }
                return handled;
            }

            self.process_queued_tasks();
            handled += self.process_completed_tasks(ctx);
            if self.is_idle() {
                return handled;
            }

            let Some(channel_idx) = self
                .channels
                .iter()
                .position(|channel| channel.num_tasks_in_flight > 0)
            else {
                continue;
            };
            match self.channels[channel_idx].result_receiver.recv() {
                Ok(result) => {
                    self.channels[channel_idx].num_tasks_in_flight -= 1;
                    for task in result.handle_result(ctx) {
                        self.publish_task(task);
                    }
                    handled += 1;
                }
                Err(_) => self.drop_channel(channel_idx),
            }
        }
    }
}
