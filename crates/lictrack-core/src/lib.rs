//! License state synchronization engine for lictrack
//!
//! This crate is the heart of lictrack, containing:
//! - The license state cache (one snapshot per directory instance)
//! - Status classification (OK / WARNING / EXPIRED by days to expiry)
//! - The sync engine (refresh one, refresh all with partial-failure
//!   tolerance, apply license)
//! - The refresh scheduler (fixed period, non-overlapping cycles)
//! - Best-effort alert delivery for degraded licenses

mod cache;
mod classifier;
mod engine;
mod notifier;
mod record;
mod report;
mod scheduler;

pub use cache::*;
pub use classifier::*;
pub use engine::*;
pub use notifier::*;
pub use record::*;
pub use report::*;
pub use scheduler::*;
