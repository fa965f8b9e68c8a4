//! Shared types for lictrack
//!
//! This crate defines the data passed between the engine and its
//! collaborators:
//! - License records and status tiers (what the cache holds)
//! - Remote wire payloads (what license endpoints speak)

mod types;
mod wire;

pub use types::*;
pub use wire::*;

/// Date format used on the wire and in license files
pub const DATE_FORMAT: &str = "%Y-%m-%d";
