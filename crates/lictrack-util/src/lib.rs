//! Shared utilities for lictrack
//!
//! This crate provides:
//! - ID types (InstanceId, CycleId)
//! - The license error taxonomy shared by every crate
//! - Time utilities (mock-aware wall clock, injectable clocks)
//! - Default paths for the configuration file

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
