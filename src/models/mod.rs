// src/models/mod.rs

//! Domain models for the page watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod document;
mod report;
mod target;
mod transform;

// Re-export all public types
pub use config::{Config, LoggingConfig, Settings, TargetConfig};
pub use document::{Document, Element, Node};
pub use report::{
    CheckFailure, CheckStage, CheckStatus, CycleReport, Delivery, TargetFailure, TargetOutcome,
};
pub use target::Target;
pub use transform::Transform;
