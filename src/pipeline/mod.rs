//! Pipeline entry points.
//!
//! - `diff`: which extracted chapters are new
//! - `poll`: the fetch/extract/diff/notify/persist loop

pub mod diff;
pub mod poll;

pub use diff::{DiffCalculator, DiffResult, calculate_diff};
pub use poll::{CycleOutcome, CycleReport, PollLoop, PollState, RunSummary};
