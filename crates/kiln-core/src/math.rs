//! Math types used across Kiln.
//!
//! Matrices and vectors come from [`glam`]. Transforms are column-major
//! `Mat4`s, points are `Vec3`s and pixel sizes are `UVec2`s.
//!
//! ```
//! use kiln_core::math::{Mat4, Vec3};
//!
//! let transform = Mat4::from_translation(Vec3::new(10.0, 20.0, 0.0));
//! assert_eq!(transform.transform_point3(Vec3::ZERO), Vec3::new(10.0, 20.0, 0.0));
//! ```
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::{IVec2, Mat3, Mat4, UVec2, Vec2, Vec3, Vec4};
