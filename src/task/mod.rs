// ABOUTME: One-off task execution mode.
// ABOUTME: Starts a task from a revision and optionally waits for a successful exit.

mod error;
mod runner;

pub use error::TaskError;
pub use runner::{TaskSnapshot, run_task, wait_for_task};
