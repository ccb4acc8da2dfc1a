//! Test utilities for Kiln.
//!
//! This crate provides testing infrastructure for the Kiln render-state
//! engine: vertex fixtures and, behind the `mock` feature, a backend that
//! records every call instead of talking to a GPU.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use kiln_gfx::{GraphicsBackend, PrimitiveType};
//! use kiln_test_utils::{BackendCall, MockBackend};
//!
//! let mock = MockBackend::new();
//! mock.draw_arrays(PrimitiveType::Triangles, 0, 3);
//!
//! assert_eq!(mock.count_draws(), 1);
//! assert!(matches!(mock.calls()[0], BackendCall::DrawArrays { count: 3, .. }));
//! # }
//! ```
//!
//! # Design
//!
//! The backend contract takes `&self` everywhere, so the mock records calls
//! through a shared `parking_lot::Mutex<Vec<BackendCall>>`. Shaders created by
//! the mock write their uniform assignments into the same log, which keeps the
//! relative order of state changes and parameter writes observable in tests.

pub mod fixtures;
#[cfg(feature = "mock")]
pub mod mock_backend;

pub use fixtures::*;
#[cfg(feature = "mock")]
pub use mock_backend::*;
