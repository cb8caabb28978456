//! Worker-side chunk generation.

pub mod chunk_generation_task;
