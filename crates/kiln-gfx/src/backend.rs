//! The stateful graphics device and the surface it renders into.

use crate::error::ShaderError;
use crate::resource::{Shader, Texture, VertexBuffer};
use crate::vertex::{Color, PrimitiveType, Vertex, VertexAttribute};
use bitflags::bitflags;
use glam::{Mat4, UVec2};
use kiln_core::geometry::IntRect;
use std::sync::Arc;

bitflags! {
    /// Optional backend capabilities, detected once by the backend.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BackendFeatures: u32 {
        /// Shader programs can be compiled and bound.
        const SHADERS = 1 << 0;
        /// Vertex buffer objects can be bound as a vertex source.
        const VERTEX_BUFFERS = 1 << 1;
        /// Color and alpha blend factors can be set independently.
        const BLEND_FUNC_SEPARATE = 1 << 2;
    }
}

/// Server-side toggles the engine establishes as persistent defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Lighting,
    DepthTest,
    AlphaTest,
    CullFace,
    Blend,
    Texture2D,
    ColorMaterial,
    Normalize,
}

/// Client-side vertex arrays used by the fixed-function path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientArray {
    Vertex,
    Color,
    TexCoord,
    Normal,
}

impl ClientArray {
    pub const ALL: [ClientArray; 4] = [
        ClientArray::Vertex,
        ClientArray::Color,
        ClientArray::TexCoord,
        ClientArray::Normal,
    ];
}

/// Fixed-function matrix stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixMode {
    ModelView,
    Projection,
    Texture,
}

/// How texture coordinates are interpreted when a texture is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateType {
    /// Coordinates are in `0.0..=1.0`.
    Normalized,
    /// Coordinates are in pixels; the backend installs a scaling texture matrix.
    Pixels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
}

/// Source and destination factors for color and alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFunction {
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl BlendFunction {
    /// Same factors for color and alpha.
    pub const fn combined(src: BlendFactor, dst: BlendFactor) -> Self {
        Self {
            src_color: src,
            dst_color: dst,
            src_alpha: src,
            dst_alpha: dst,
        }
    }

    pub const fn separate(
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) -> Self {
        Self {
            src_color,
            dst_color,
            src_alpha,
            dst_alpha,
        }
    }

    pub fn is_separate(&self) -> bool {
        self.src_color != self.src_alpha || self.dst_color != self.dst_alpha
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunction {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Always,
}

/// Depth configuration applied when depth testing is switched on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthState {
    pub function: DepthFunction,
    pub clear_value: f32,
    /// Near and far ends of the window-space depth range.
    pub range: (f32, f32),
}

impl DepthState {
    /// Reversed depth: far is 0, near is 1, greater-or-equal passes.
    pub const REVERSED: DepthState = DepthState {
        function: DepthFunction::GreaterEqual,
        clear_value: 0.0,
        range: (1.0, 0.0),
    };
}

/// Where vertex attribute pointers read from.
#[derive(Debug, Clone, Copy)]
pub enum VertexSource<'a> {
    /// Client memory. The backend may keep reading the slice until pointers
    /// are supplied again, so the memory must stay put between draws that
    /// rely on previously supplied pointers.
    Client(&'a [Vertex]),
    /// Offsets into the currently bound vertex buffer.
    Buffer,
}

impl VertexSource<'_> {
    pub fn is_buffer(&self) -> bool {
        matches!(self, VertexSource::Buffer)
    }
}

/// A stateful, immediate-mode graphics device.
///
/// Every call changes device state that persists until changed again; the
/// device has no notion of transactions or diffing. Implementations use
/// interior mutability so that one device can be shared by several render
/// targets via `Arc<dyn GraphicsBackend>`.
pub trait GraphicsBackend: Send + Sync {
    // Capability queries

    fn features(&self) -> BackendFeatures;

    /// Shading language version string as reported by the driver, e.g. `"1.30 NVIDIA"`.
    fn shading_language_version(&self) -> String;

    /// Compile and link a program from vertex and fragment sources.
    fn compile_program(&self, vertex: &str, fragment: &str) -> Result<Arc<dyn Shader>, ShaderError>;

    // Persistent toggles

    fn set_capability(&self, capability: Capability, enabled: bool);

    fn set_client_array(&self, array: ClientArray, enabled: bool);

    fn set_depth_state(&self, state: DepthState);

    /// Fill both faces of polygons.
    fn set_polygon_fill(&self);

    // Per-draw state

    fn clear(&self, color: Color, depth: bool);

    /// Viewport in pixels, origin at the bottom-left corner of the target.
    fn set_viewport(&self, rect: IntRect);

    /// Replace the top of a matrix stack. The model-view stack stays current
    /// once the call returns.
    fn load_matrix(&self, mode: MatrixMode, matrix: &Mat4);

    fn set_blend_function(&self, function: BlendFunction);

    fn bind_texture(&self, texture: Option<&dyn Texture>, coordinates: CoordinateType);

    fn bind_shader(&self, shader: Option<&dyn Shader>);

    fn bind_vertex_buffer(&self, buffer: Option<&dyn VertexBuffer>);

    // Vertex specification

    /// Point the four fixed-function client arrays at `source`.
    fn set_vertex_pointers(&self, source: VertexSource<'_>);

    /// Enable a generic attribute array and point it at `attribute` in `source`.
    fn enable_vertex_attribute(&self, location: u32, attribute: VertexAttribute, source: VertexSource<'_>);

    fn disable_vertex_attribute(&self, location: u32);

    fn draw_arrays(&self, primitive: PrimitiveType, first: u32, count: u32);

    // Save and restore

    /// Save all server and client attributes and the three matrix stacks.
    fn push_state(&self);

    /// Restore what the matching [`GraphicsBackend::push_state`] saved.
    fn pop_state(&self);
}

/// The window or offscreen image a render target draws into.
pub trait RenderSurface: Send {
    /// Size in pixels.
    fn size(&self) -> UVec2;

    /// Make (or stop making) this surface's context current on the calling
    /// thread. Returns false when that is not possible.
    fn activate(&mut self, active: bool) -> bool;
}
