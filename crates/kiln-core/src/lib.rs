//! Kiln Core
//!
//! Shared utilities for the Kiln crates: logging setup, profiling scopes,
//! small geometry types and math re-exports.

pub mod alloc;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;
