//! Copying generated proto artifacts into the source tree
//!
//! - **engine**: enumerates protos and fans the work out over a worker pool
//! - **outcome**: the counts a run reports

mod engine;
mod outcome;

pub use engine::{SyncEngine, SyncOptions};
pub use outcome::SyncOutcome;
