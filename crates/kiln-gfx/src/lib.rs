//! Backend contract for Kiln.
//!
//! Kiln never talks to a graphics API directly. Everything it needs from the
//! outside world is expressed by the traits in this crate:
//!
//! - [`GraphicsBackend`] - the stateful, immediate-mode device
//! - [`RenderSurface`] - the window or offscreen target providing size and activation
//! - [`Texture`], [`Shader`], [`VertexBuffer`] - resources the backend can bind
//! - [`LightSource`] - the registry of scene lights
//!
//! Resources are compared by [`CacheId`] rather than by address, so a resource
//! destroyed and recreated at the same address is never mistaken for the old one.

pub mod backend;
pub mod error;
pub mod id;
pub mod light;
pub mod resource;
pub mod vertex;

pub use backend::*;
pub use error::{ShaderError, ShaderStage};
pub use id::{CacheId, ResourceKind};
pub use light::{Light, LightId, LightRegistry, LightSource, NoLighting};
pub use resource::{Shader, Texture, Uniform, VertexBuffer};
pub use vertex::{Color, PrimitiveType, Vertex, VertexAttribute};
