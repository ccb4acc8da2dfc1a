//! Resource contracts consumed by the dispatcher.
//!
//! Creation, upload and destruction of resources belong to the backend
//! implementation. Kiln only needs to identify them, query a few properties
//! and hand them back to the backend for binding.

use crate::id::CacheId;
use crate::vertex::PrimitiveType;
use glam::{Mat4, UVec2, Vec3, Vec4};

/// A texture that can be bound by the backend.
pub trait Texture: Send + Sync {
    fn cache_id(&self) -> CacheId;

    /// Size of the image, in pixels.
    fn size(&self) -> UVec2;

    /// Size of the backing storage, which may be padded past [`Texture::size`].
    fn actual_size(&self) -> UVec2;

    /// True when rows are stored bottom-up (render-to-texture results).
    fn pixels_flipped(&self) -> bool;
}

/// A vertex buffer previously uploaded to the backend.
pub trait VertexBuffer: Send + Sync {
    fn cache_id(&self) -> CacheId;

    fn vertex_count(&self) -> u32;

    fn primitive_type(&self) -> PrimitiveType;
}

/// Value written to a named shader parameter.
#[derive(Clone, Copy)]
pub enum Uniform<'a> {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Texture(&'a dyn Texture),
}

impl std::fmt::Debug for Uniform<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Vec3(v) => f.debug_tuple("Vec3").field(v).finish(),
            Self::Vec4(v) => f.debug_tuple("Vec4").field(v).finish(),
            Self::Mat4(v) => f.debug_tuple("Mat4").field(v).finish(),
            Self::Texture(t) => f.debug_tuple("Texture").field(&t.cache_id()).finish(),
        }
    }
}

/// A linked shader program.
///
/// Methods take `&self`: parameter writes are backend state, not Rust state,
/// and implementations are expected to use interior mutability where they
/// keep local bookkeeping.
pub trait Shader: Send + Sync {
    fn cache_id(&self) -> CacheId;

    /// Write a named parameter. Unknown names are ignored, with a warning
    /// when warnings are enabled (see [`Shader::set_warn_missing`]).
    fn set_uniform(&self, name: &str, value: Uniform<'_>);

    /// Location of a named vertex attribute, or `None` when the program does
    /// not use it.
    fn attribute_location(&self, name: &str) -> Option<u32>;

    /// Toggle warnings about parameters the program does not declare.
    /// Returns the previous setting.
    fn set_warn_missing(&self, warn: bool) -> bool;
}
