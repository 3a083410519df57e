//! State module for tracking crawl progress
//!
//! This module provides the lifecycle of a single crawl task.
//!
//! # Components
//!
//! - `TaskState`: Tracks the state of one crawl task (pending, fetching, pruned, ...)

mod task_state;

// Re-export main types
pub use task_state::TaskState;
