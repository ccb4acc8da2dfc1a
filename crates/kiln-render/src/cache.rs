//! What the backend currently believes.
//!
//! Render states caching strategies:
//!
//! - View: applied only when [`RenderTarget::set_view`](crate::RenderTarget::set_view)
//!   was called since the last draw, or when the program driving uniforms changed.
//! - Transform: changes on nearly every draw. Small batches are transformed
//!   on the CPU into a scratch buffer so consecutive small draws can share an
//!   identity model-view matrix and, in the best case, the same vertex pointers.
//! - Blend mode: a plain value, compared directly.
//! - Texture, vertex buffer, shader: compared by [`CacheId`]. Addresses and
//!   backend handles are recycled after a resource is destroyed, tokens are not.
//! - Shader binding: not elided, since programs carry parameters that cannot be
//!   tracked. The only saving is never binding "no program" twice in a row.

use crate::blend::BlendMode;
use glam::Mat4;
use kiln_gfx::{CacheId, Vertex};

/// Capacity of the pre-transform scratch buffer, in vertices.
pub const VERTEX_CACHE_SIZE: usize = 32;

/// Per-target record of backend state.
///
/// Owned by exactly one [`RenderTarget`](crate::RenderTarget) and mutated only
/// through `&mut` access to it, so draws on one target are serialized by the
/// borrow checker.
#[derive(Debug, Clone, PartialEq)]
pub struct StateCache {
    pub(crate) states_set: bool,
    pub(crate) view_changed: bool,
    pub(crate) blend_mode: BlendMode,
    pub(crate) texture: CacheId,
    pub(crate) vertex_buffer: CacheId,
    pub(crate) last_shader: CacheId,
    pub(crate) vertex_cache_active: bool,
    // Boxed so the address handed to the backend stays stable while the
    // target itself moves.
    vertex_cache: Box<[Vertex; VERTEX_CACHE_SIZE]>,
}

impl StateCache {
    pub(crate) fn new() -> Self {
        Self {
            states_set: false,
            view_changed: true,
            blend_mode: BlendMode::Alpha,
            texture: CacheId::NULL,
            vertex_buffer: CacheId::NULL,
            last_shader: CacheId::NULL,
            vertex_cache_active: false,
            vertex_cache: Box::new([Vertex::default(); VERTEX_CACHE_SIZE]),
        }
    }

    /// Whether persistent defaults have been established on the backend.
    pub fn states_set(&self) -> bool {
        self.states_set
    }

    /// Whether the active view must be pushed on the next draw.
    pub fn view_changed(&self) -> bool {
        self.view_changed
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Token of the bound texture, [`CacheId::NULL`] when none is.
    pub fn texture(&self) -> CacheId {
        self.texture
    }

    pub fn vertex_buffer(&self) -> CacheId {
        self.vertex_buffer
    }

    /// Program whose uniforms were last written by a draw.
    pub fn last_shader(&self) -> CacheId {
        self.last_shader
    }

    /// True when the backend's vertex pointers still point at the scratch
    /// buffer, filled by the previous draw.
    ///
    /// Anything that re-points the backend's vertex arrays must clear this;
    /// otherwise the next small draw would reuse pointers that no longer
    /// refer to the scratch buffer.
    pub fn vertex_cache_active(&self) -> bool {
        self.vertex_cache_active
    }

    /// Forget that the backend's vertex pointers refer to the scratch buffer.
    pub(crate) fn invalidate_vertex_cache(&mut self) {
        self.vertex_cache_active = false;
    }

    /// Transform `vertices` into the scratch buffer.
    ///
    /// Callers guarantee `vertices.len() <= VERTEX_CACHE_SIZE`.
    pub(crate) fn pre_transform(&mut self, vertices: &[Vertex], transform: &Mat4) {
        for (cached, vertex) in self.vertex_cache.iter_mut().zip(vertices) {
            *cached = Vertex {
                position: transform.project_point3(vertex.position),
                ..*vertex
            };
        }
    }

    /// The first `count` pre-transformed vertices.
    pub(crate) fn pre_transformed(&self, count: usize) -> &[Vertex] {
        &self.vertex_cache[..count]
    }
}
