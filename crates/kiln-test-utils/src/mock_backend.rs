//! Recording implementation of the backend contract.
//!
//! Nothing here touches a GPU. Every backend call and every shader parameter
//! write is appended to a shared log, and the mock keeps a small model of the
//! device state so tests can compare state before and after a save/restore.

use glam::{Mat4, UVec2, Vec3, Vec4};
use kiln_core::alloc::HashMap;
use kiln_core::geometry::IntRect;
use kiln_gfx::{
    BackendFeatures, BlendFunction, CacheId, Capability, ClientArray, Color, CoordinateType,
    DepthState, GraphicsBackend, MatrixMode, PrimitiveType, RenderSurface, ResourceKind, Shader,
    ShaderError, ShaderStage, Texture, Uniform, VertexAttribute, VertexBuffer, VertexSource,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Attribute names every program compiled by the mock declares.
pub const DEFAULT_ATTRIBUTES: [&str; 4] = ["a_position", "a_color", "a_tex_coords", "a_normal"];

/// Owned copy of a [`Uniform`].
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Texture(CacheId),
}

impl From<Uniform<'_>> for UniformValue {
    fn from(value: Uniform<'_>) -> Self {
        match value {
            Uniform::Int(v) => UniformValue::Int(v),
            Uniform::Float(v) => UniformValue::Float(v),
            Uniform::Vec3(v) => UniformValue::Vec3(v),
            Uniform::Vec4(v) => UniformValue::Vec4(v),
            Uniform::Mat4(v) => UniformValue::Mat4(v),
            Uniform::Texture(t) => UniformValue::Texture(t.cache_id()),
        }
    }
}

/// Records a backend operation for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CompileProgram {
        succeeded: bool,
    },
    SetCapability {
        capability: Capability,
        enabled: bool,
    },
    SetClientArray {
        array: ClientArray,
        enabled: bool,
    },
    SetDepthState(DepthState),
    SetPolygonFill,
    Clear {
        color: Color,
        depth: bool,
    },
    SetViewport(IntRect),
    LoadMatrix {
        mode: MatrixMode,
        matrix: Mat4,
    },
    SetBlendFunction(BlendFunction),
    BindTexture {
        texture: CacheId,
        coordinates: CoordinateType,
    },
    BindShader(CacheId),
    BindVertexBuffer(CacheId),
    SetVertexPointers {
        /// Address of the first client vertex, `None` for buffer offsets.
        address: Option<usize>,
    },
    EnableVertexAttribute {
        location: u32,
        attribute: VertexAttribute,
        from_buffer: bool,
    },
    DisableVertexAttribute(u32),
    DrawArrays {
        primitive: PrimitiveType,
        first: u32,
        count: u32,
    },
    PushState,
    PopState,
    SetUniform {
        shader: CacheId,
        name: String,
        value: UniformValue,
    },
}

/// The part of device state the mock models.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MockDeviceState {
    pub capabilities: HashMap<Capability, bool>,
    pub client_arrays: HashMap<ClientArray, bool>,
    pub matrices: HashMap<MatrixMode, Mat4>,
    pub depth: Option<DepthState>,
    pub viewport: Option<IntRect>,
    pub blend: Option<BlendFunction>,
    pub texture: CacheId,
    pub shader: CacheId,
    pub vertex_buffer: CacheId,
    pub enabled_attributes: Vec<u32>,
}

type CallLog = Arc<Mutex<Vec<BackendCall>>>;

/// Mock implementation of [`GraphicsBackend`] for testing.
///
/// # Borrow Checking Pattern: Interior Mutability
///
/// The contract's methods take `&self`, so the log and the device model live
/// behind `parking_lot::Mutex`. `Mutex` rather than `RefCell` because the
/// contract requires `Send + Sync`.
///
/// # Example
///
/// ```rust
/// use kiln_gfx::{BackendFeatures, GraphicsBackend};
/// use kiln_test_utils::MockBackend;
///
/// let mock = MockBackend::legacy();
/// assert!(!mock.features().contains(BackendFeatures::SHADERS));
/// assert_eq!(mock.call_count(), 0);
/// ```
pub struct MockBackend {
    calls: CallLog,
    state: Mutex<MockDeviceState>,
    saved: Mutex<Vec<MockDeviceState>>,
    features: BackendFeatures,
    version: String,
    fail_compile: bool,
}

impl MockBackend {
    /// A backend with every feature and a programmable pipeline new enough
    /// for the fallback program.
    pub fn new() -> Self {
        Self::with_features(BackendFeatures::all(), "1.30 Mock")
    }

    /// A fixed-function-only backend.
    pub fn legacy() -> Self {
        Self::with_features(BackendFeatures::VERTEX_BUFFERS | BackendFeatures::BLEND_FUNC_SEPARATE, "")
    }

    pub fn with_features(features: BackendFeatures, version: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            state: Mutex::new(MockDeviceState::default()),
            saved: Mutex::new(Vec::new()),
            features,
            version: version.to_string(),
            fail_compile: false,
        }
    }

    /// Make every `compile_program` call fail.
    pub fn failing_compile(mut self) -> Self {
        self.fail_compile = true;
        self
    }

    /// Create a user shader that declares the given attributes.
    pub fn create_shader(&self, attributes: &[&str]) -> Arc<MockShader> {
        Arc::new(MockShader::new(self.calls.clone(), attributes))
    }

    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Get total number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Count calls matching a predicate.
    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn count_texture_binds(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::BindTexture { .. }))
    }

    pub fn count_shader_binds(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::BindShader(_)))
    }

    pub fn count_vertex_buffer_binds(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::BindVertexBuffer(_)))
    }

    pub fn count_blend_changes(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::SetBlendFunction(_)))
    }

    pub fn count_viewport_sets(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::SetViewport(_)))
    }

    pub fn count_vertex_pointer_sets(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::SetVertexPointers { .. }))
    }

    pub fn count_draws(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::DrawArrays { .. }))
    }

    pub fn count_matrix_loads(&self, mode: MatrixMode) -> usize {
        self.count(|call| matches!(call, BackendCall::LoadMatrix { mode: m, .. } if *m == mode))
    }

    /// Number of writes to a named shader parameter, on any shader.
    pub fn count_uniform_writes(&self, name: &str) -> usize {
        self.count(|call| matches!(call, BackendCall::SetUniform { name: n, .. } if n == name))
    }

    /// Last value written to a named parameter of `shader`.
    pub fn last_uniform(&self, shader: CacheId, name: &str) -> Option<UniformValue> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            BackendCall::SetUniform {
                shader: s,
                name: n,
                value,
            } if *s == shader && n == name => Some(value.clone()),
            _ => None,
        })
    }

    /// Snapshot of the modelled device state.
    pub fn state(&self) -> MockDeviceState {
        self.state.lock().clone()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().push(call);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsBackend for MockBackend {
    fn features(&self) -> BackendFeatures {
        self.features
    }

    fn shading_language_version(&self) -> String {
        self.version.clone()
    }

    fn compile_program(&self, _vertex: &str, _fragment: &str) -> Result<Arc<dyn Shader>, ShaderError> {
        if !self.features.contains(BackendFeatures::SHADERS) {
            return Err(ShaderError::Unsupported);
        }

        self.record(BackendCall::CompileProgram {
            succeeded: !self.fail_compile,
        });

        if self.fail_compile {
            return Err(ShaderError::Compile {
                stage: ShaderStage::Fragment,
                log: "mock compile failure".to_string(),
            });
        }

        Ok(Arc::new(MockShader::new(self.calls.clone(), &DEFAULT_ATTRIBUTES)))
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        self.state.lock().capabilities.insert(capability, enabled);
        self.record(BackendCall::SetCapability { capability, enabled });
    }

    fn set_client_array(&self, array: ClientArray, enabled: bool) {
        self.state.lock().client_arrays.insert(array, enabled);
        self.record(BackendCall::SetClientArray { array, enabled });
    }

    fn set_depth_state(&self, state: DepthState) {
        self.state.lock().depth = Some(state);
        self.record(BackendCall::SetDepthState(state));
    }

    fn set_polygon_fill(&self) {
        self.record(BackendCall::SetPolygonFill);
    }

    fn clear(&self, color: Color, depth: bool) {
        self.record(BackendCall::Clear { color, depth });
    }

    fn set_viewport(&self, rect: IntRect) {
        self.state.lock().viewport = Some(rect);
        self.record(BackendCall::SetViewport(rect));
    }

    fn load_matrix(&self, mode: MatrixMode, matrix: &Mat4) {
        self.state.lock().matrices.insert(mode, *matrix);
        self.record(BackendCall::LoadMatrix { mode, matrix: *matrix });
    }

    fn set_blend_function(&self, function: BlendFunction) {
        self.state.lock().blend = Some(function);
        self.record(BackendCall::SetBlendFunction(function));
    }

    fn bind_texture(&self, texture: Option<&dyn Texture>, coordinates: CoordinateType) {
        let texture = texture.map_or(CacheId::NULL, |t| t.cache_id());
        self.state.lock().texture = texture;
        self.record(BackendCall::BindTexture { texture, coordinates });
    }

    fn bind_shader(&self, shader: Option<&dyn Shader>) {
        let shader = shader.map_or(CacheId::NULL, |s| s.cache_id());
        self.state.lock().shader = shader;
        self.record(BackendCall::BindShader(shader));
    }

    fn bind_vertex_buffer(&self, buffer: Option<&dyn VertexBuffer>) {
        let buffer = buffer.map_or(CacheId::NULL, |b| b.cache_id());
        self.state.lock().vertex_buffer = buffer;
        self.record(BackendCall::BindVertexBuffer(buffer));
    }

    fn set_vertex_pointers(&self, source: VertexSource<'_>) {
        let address = match source {
            VertexSource::Client(vertices) => Some(vertices.as_ptr() as usize),
            VertexSource::Buffer => None,
        };
        self.record(BackendCall::SetVertexPointers { address });
    }

    fn enable_vertex_attribute(&self, location: u32, attribute: VertexAttribute, source: VertexSource<'_>) {
        self.state.lock().enabled_attributes.push(location);
        self.record(BackendCall::EnableVertexAttribute {
            location,
            attribute,
            from_buffer: source.is_buffer(),
        });
    }

    fn disable_vertex_attribute(&self, location: u32) {
        self.state.lock().enabled_attributes.retain(|l| *l != location);
        self.record(BackendCall::DisableVertexAttribute(location));
    }

    fn draw_arrays(&self, primitive: PrimitiveType, first: u32, count: u32) {
        self.record(BackendCall::DrawArrays { primitive, first, count });
    }

    fn push_state(&self) {
        let snapshot = self.state.lock().clone();
        self.saved.lock().push(snapshot);
        self.record(BackendCall::PushState);
    }

    fn pop_state(&self) {
        let restored = self.saved.lock().pop();
        let mut state = self.state.lock();
        // The shader binding is not part of the saved attributes.
        let shader = state.shader;
        if let Some(restored) = restored {
            *state = restored;
            state.shader = shader;
        }
        drop(state);
        self.record(BackendCall::PopState);
    }
}

/// A shader program that records parameter writes into the backend's log.
pub struct MockShader {
    id: CacheId,
    calls: CallLog,
    attributes: HashMap<String, u32>,
    warn_missing: Mutex<bool>,
}

impl MockShader {
    fn new(calls: CallLog, attributes: &[&str]) -> Self {
        Self {
            id: CacheId::allocate(ResourceKind::Shader),
            calls,
            attributes: attributes
                .iter()
                .enumerate()
                .map(|(location, name)| (name.to_string(), location as u32))
                .collect(),
            warn_missing: Mutex::new(true),
        }
    }

    pub fn warns_missing(&self) -> bool {
        *self.warn_missing.lock()
    }
}

impl Shader for MockShader {
    fn cache_id(&self) -> CacheId {
        self.id
    }

    fn set_uniform(&self, name: &str, value: Uniform<'_>) {
        self.calls.lock().push(BackendCall::SetUniform {
            shader: self.id,
            name: name.to_string(),
            value: value.into(),
        });
    }

    fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    fn set_warn_missing(&self, warn: bool) -> bool {
        std::mem::replace(&mut *self.warn_missing.lock(), warn)
    }
}

/// Texture with a fresh identity and no pixels.
#[derive(Debug)]
pub struct MockTexture {
    id: CacheId,
    size: UVec2,
    actual_size: UVec2,
    flipped: bool,
}

impl MockTexture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: CacheId::allocate(ResourceKind::Texture),
            size: UVec2::new(width, height),
            actual_size: UVec2::new(width, height),
            flipped: false,
        }
    }

    /// Storage padded to the next power of two, as older drivers require.
    pub fn padded(mut self) -> Self {
        self.actual_size = UVec2::new(self.size.x.next_power_of_two(), self.size.y.next_power_of_two());
        self
    }

    pub fn flipped(mut self) -> Self {
        self.flipped = true;
        self
    }
}

impl Texture for MockTexture {
    fn cache_id(&self) -> CacheId {
        self.id
    }

    fn size(&self) -> UVec2 {
        self.size
    }

    fn actual_size(&self) -> UVec2 {
        self.actual_size
    }

    fn pixels_flipped(&self) -> bool {
        self.flipped
    }
}

/// Vertex buffer with a fresh identity and no storage.
#[derive(Debug)]
pub struct MockVertexBuffer {
    id: CacheId,
    vertex_count: u32,
    primitive: PrimitiveType,
}

impl MockVertexBuffer {
    pub fn new(vertex_count: u32, primitive: PrimitiveType) -> Self {
        Self {
            id: CacheId::allocate(ResourceKind::VertexBuffer),
            vertex_count,
            primitive,
        }
    }
}

impl VertexBuffer for MockVertexBuffer {
    fn cache_id(&self) -> CacheId {
        self.id
    }

    fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    fn primitive_type(&self) -> PrimitiveType {
        self.primitive
    }
}

#[derive(Debug)]
struct SurfaceState {
    size: UVec2,
    can_activate: bool,
    activations: usize,
}

/// Surface whose size and activation outcome can be changed from the test
/// after the target has taken ownership of a clone.
#[derive(Debug, Clone)]
pub struct MockSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl MockSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(SurfaceState {
                size: UVec2::new(width, height),
                can_activate: true,
                activations: 0,
            })),
        }
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.state.lock().size = UVec2::new(width, height);
    }

    /// Make subsequent activations fail (or succeed again).
    pub fn set_can_activate(&self, can_activate: bool) {
        self.state.lock().can_activate = can_activate;
    }

    pub fn activations(&self) -> usize {
        self.state.lock().activations
    }
}

impl RenderSurface for MockSurface {
    fn size(&self) -> UVec2 {
        self.state.lock().size
    }

    fn activate(&mut self, active: bool) -> bool {
        let mut state = self.state.lock();
        if active && state.can_activate {
            state.activations += 1;
        }
        !active || state.can_activate
    }
}
