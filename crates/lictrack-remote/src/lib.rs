//! Remote license endpoint interface for lictrack
//!
//! This crate defines the boundary between the synchronization engine and
//! the per-instance license endpoints. It contains:
//! - The `LicenseEndpoint` trait
//! - `HttpLicenseClient`, the reqwest-backed implementation
//! - `MockEndpoint`, an in-memory endpoint for tests and local runs

mod http;
mod mock;
mod traits;

pub use http::*;
pub use mock::*;
pub use traits::*;
