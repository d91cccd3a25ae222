//! Pipeline entry points.
//!
//! - `Coordinator`: one concurrent check cycle over all targets
//! - `Watcher`: per-target polling plus runtime commands

pub mod check;
pub mod diff;
pub mod watch;

pub use check::Coordinator;
pub use diff::{dissimilarity, exceeds};
pub use watch::{Command, Reply, Watcher, WatcherHandle};
