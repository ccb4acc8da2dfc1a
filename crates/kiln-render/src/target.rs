//! The render target: draw dispatch, view control and backend state reset.

use crate::blend::BlendMode;
use crate::cache::{StateCache, VERTEX_CACHE_SIZE};
use crate::drawable::Drawable;
use crate::pipeline::{DEFAULT_MIN_SHADING_LANGUAGE_VERSION, Pipeline, PipelineMode, PipelinePreference};
use crate::states::RenderStates;
use crate::uniforms;
use crate::view::{self, View};
use glam::{IVec2, Mat4, UVec2, Vec3};
use kiln_core::geometry::{FloatRect, IntRect};
use kiln_core::profiling::profile_function;
use kiln_gfx::{
    BackendFeatures, CacheId, Capability, ClientArray, Color, CoordinateType, DepthState, GraphicsBackend,
    LightSource, MatrixMode, NoLighting, PrimitiveType, RenderSurface, Shader, Texture, Uniform, Vertex,
    VertexAttribute, VertexBuffer, VertexSource,
};
use std::fmt;
use std::sync::Arc;

/// Construction-time settings of a [`RenderTarget`].
///
/// # Example
///
/// ```
/// use kiln_render::{PipelinePreference, RenderTargetDescriptor};
///
/// let descriptor = RenderTargetDescriptor::default()
///     .with_pipeline(PipelinePreference::ForceLegacy)
///     .with_depth_test(true)
///     .with_clear_depth(true);
/// assert!(descriptor.depth_test);
/// ```
#[derive(Clone)]
pub struct RenderTargetDescriptor {
    pub pipeline: PipelinePreference,
    /// The uniform pipeline needs a shading language strictly newer than this.
    pub min_shading_language_version: f32,
    pub depth_test: bool,
    /// Clear the depth buffer along with the color buffer.
    pub clear_depth: bool,
    /// Where lights fed to the uniform pipeline come from.
    pub lights: Arc<dyn LightSource>,
}

impl RenderTargetDescriptor {
    pub fn with_pipeline(mut self, pipeline: PipelinePreference) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_min_shading_language_version(mut self, version: f32) -> Self {
        self.min_shading_language_version = version;
        self
    }

    pub fn with_depth_test(mut self, enabled: bool) -> Self {
        self.depth_test = enabled;
        self
    }

    pub fn with_clear_depth(mut self, enabled: bool) -> Self {
        self.clear_depth = enabled;
        self
    }

    pub fn with_lights(mut self, lights: Arc<dyn LightSource>) -> Self {
        self.lights = lights;
        self
    }
}

impl Default for RenderTargetDescriptor {
    fn default() -> Self {
        Self {
            pipeline: PipelinePreference::Auto,
            min_shading_language_version: DEFAULT_MIN_SHADING_LANGUAGE_VERSION,
            depth_test: false,
            clear_depth: false,
            lights: Arc::new(NoLighting),
        }
    }
}

impl fmt::Debug for RenderTargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTargetDescriptor")
            .field("pipeline", &self.pipeline)
            .field("min_shading_language_version", &self.min_shading_language_version)
            .field("depth_test", &self.depth_test)
            .field("clear_depth", &self.clear_depth)
            .field("shader_lighting", &self.lights.has_shader_lighting())
            .finish()
    }
}

/// Vertex input of one draw.
#[derive(Clone, Copy)]
enum DrawSource<'v> {
    Vertices {
        vertices: &'v [Vertex],
        primitive: PrimitiveType,
    },
    Buffer(&'v dyn VertexBuffer),
}

impl DrawSource<'_> {
    fn vertex_count(&self) -> usize {
        match self {
            DrawSource::Vertices { vertices, .. } => vertices.len(),
            DrawSource::Buffer(buffer) => buffer.vertex_count() as usize,
        }
    }

    fn primitive(&self) -> PrimitiveType {
        match self {
            DrawSource::Vertices { primitive, .. } => *primitive,
            DrawSource::Buffer(buffer) => buffer.primitive_type(),
        }
    }
}

/// A surface plus everything needed to draw into it with as few backend
/// state changes as possible.
///
/// Every draw consults the target's [`StateCache`] and only issues the calls
/// that change what the backend currently believes. The cache is the single
/// record of that belief: callers that touch the backend directly must either
/// wrap their work in [`push_states`](Self::push_states) /
/// [`pop_states`](Self::pop_states) or call
/// [`reset_states`](Self::reset_states) before drawing through the target
/// again.
///
/// # Example
///
/// ```
/// use kiln_render::{RenderStates, RenderTarget, RenderTargetDescriptor};
/// use kiln_gfx::{Color, PrimitiveType, Vertex};
/// use kiln_test_utils::{MockBackend, MockSurface};
/// use std::sync::Arc;
///
/// let backend = Arc::new(MockBackend::new());
/// let mut target = RenderTarget::new(backend.clone(), MockSurface::new(800, 600), RenderTargetDescriptor::default());
///
/// target.clear(Color::BLACK);
/// target.draw_vertices(&[Vertex::default(); 3], PrimitiveType::Triangles, &RenderStates::default());
/// assert_eq!(backend.count_draws(), 1);
/// ```
pub struct RenderTarget {
    backend: Arc<dyn GraphicsBackend>,
    surface: Box<dyn RenderSurface>,
    lights: Arc<dyn LightSource>,
    features: BackendFeatures,
    preference: PipelinePreference,
    min_shading_language_version: f32,
    depth_test: bool,
    clear_depth: bool,
    default_view: View,
    view: View,
    cache: StateCache,
    pipeline: Pipeline,
}

impl RenderTarget {
    /// Create a target drawing into `surface` and initialize it.
    pub fn new(
        backend: Arc<dyn GraphicsBackend>,
        surface: impl RenderSurface + 'static,
        descriptor: RenderTargetDescriptor,
    ) -> Self {
        let features = backend.features();
        let mut target = Self {
            backend,
            surface: Box::new(surface),
            lights: descriptor.lights,
            features,
            preference: descriptor.pipeline,
            min_shading_language_version: descriptor.min_shading_language_version,
            depth_test: descriptor.depth_test,
            clear_depth: descriptor.clear_depth,
            default_view: View::default(),
            view: View::default(),
            cache: StateCache::new(),
            pipeline: Pipeline::Unprobed,
        };
        target.initialize();
        target
    }

    /// Size the default view to the surface and make it active.
    ///
    /// Backend defaults are re-established lazily by the next draw. The
    /// pipeline is probed the first time only.
    pub fn initialize(&mut self) {
        let size = self.surface.size();
        self.default_view = View::from_rect(FloatRect::new(0.0, 0.0, size.x as f32, size.y as f32));
        self.view = self.default_view.clone();
        self.cache.view_changed = true;
        self.cache.states_set = false;

        if self.pipeline.mode() == PipelineMode::Unprobed {
            self.pipeline = Pipeline::select(
                self.backend.as_ref(),
                self.lights.as_ref(),
                self.preference,
                self.min_shading_language_version,
            );
        }
    }

    /// Re-initialize after the surface changed size.
    pub fn on_resize(&mut self) {
        tracing::debug!("Surface resized to {:?}", self.surface.size());
        self.initialize();
    }

    pub fn size(&self) -> UVec2 {
        self.surface.size()
    }

    pub fn pipeline_mode(&self) -> PipelineMode {
        self.pipeline.mode()
    }

    /// What the target believes the backend state to be.
    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    pub fn backend(&self) -> &Arc<dyn GraphicsBackend> {
        &self.backend
    }

    pub fn clear(&mut self, color: Color) {
        if self.surface.activate(true) {
            self.backend.clear(color, self.clear_depth);
        }
    }

    /// Toggle reversed-depth testing.
    pub fn enable_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;

        if !self.surface.activate(true) {
            return;
        }

        if enabled {
            self.backend.set_capability(Capability::DepthTest, true);
            self.backend.set_depth_state(DepthState::REVERSED);
        } else {
            self.backend.set_capability(Capability::DepthTest, false);
        }
    }

    pub fn is_depth_test_enabled(&self) -> bool {
        self.depth_test
    }

    // View control

    /// Replace the active view. Applied by the next draw.
    pub fn set_view(&mut self, view: View) {
        self.view = view;
        self.cache.view_changed = true;
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn default_view(&self) -> &View {
        &self.default_view
    }

    /// Pixel rectangle `view` covers on this target.
    pub fn viewport(&self, view: &View) -> IntRect {
        view::viewport(view, self.size())
    }

    /// Convert a pixel into world coordinates using the active view.
    pub fn map_pixel_to_coords(&self, point: IVec2) -> Vec3 {
        view::map_pixel_to_coords(point, &self.view, self.size())
    }

    pub fn map_pixel_to_coords_with(&self, point: IVec2, view: &View) -> Vec3 {
        view::map_pixel_to_coords(point, view, self.size())
    }

    /// Convert a world point into a pixel using the active view.
    pub fn map_coords_to_pixel(&self, point: Vec3) -> IVec2 {
        view::map_coords_to_pixel(point, &self.view, self.size())
    }

    pub fn map_coords_to_pixel_with(&self, point: Vec3, view: &View) -> IVec2 {
        view::map_coords_to_pixel(point, view, self.size())
    }

    // Drawing

    pub fn draw_drawable(&mut self, drawable: &dyn Drawable, states: &RenderStates<'_>) {
        drawable.draw(self, states);
    }

    pub fn draw_vertices(&mut self, vertices: &[Vertex], primitive: PrimitiveType, states: &RenderStates<'_>) {
        self.dispatch(DrawSource::Vertices { vertices, primitive }, states);
    }

    /// Draw every vertex of an uploaded buffer with its own primitive type.
    pub fn draw_buffer(&mut self, buffer: &dyn VertexBuffer, states: &RenderStates<'_>) {
        self.dispatch(DrawSource::Buffer(buffer), states);
    }

    fn dispatch(&mut self, source: DrawSource<'_>, states: &RenderStates<'_>) {
        profile_function!();

        let count = source.vertex_count();
        if count == 0 {
            return;
        }
        let Ok(draw_count) = u32::try_from(count) else {
            tracing::warn!(count, "Vertex count exceeds the backend draw range, draw skipped");
            return;
        };

        if !self.surface.activate(true) {
            tracing::trace!("Surface could not be activated, draw skipped");
            return;
        }

        if !self.cache.states_set {
            self.reset_states();
        }

        let fallback = self.pipeline.fallback().cloned();
        let uniform_mode = fallback.is_some();
        let effective: Option<&dyn Shader> = match states.shader {
            Some(shader) => Some(shader),
            None => fallback.as_deref(),
        };
        // The program receiving uniforms this draw; none in legacy mode.
        let program = if uniform_mode { effective } else { None };

        let mut previous_warn = None;
        let mut shader_changed = false;
        if let Some(program) = program {
            if let Some(shader) = states.shader {
                previous_warn = Some(shader.set_warn_missing(false));
            }
            shader_changed = program.cache_id() != self.cache.last_shader;
        }

        // Only client arrays can be pre-transformed into the scratch buffer.
        let use_vertex_cache = matches!(source, DrawSource::Vertices { .. })
            && !uniform_mode
            && states.use_vertex_cache
            && count <= VERTEX_CACHE_SIZE;
        let reuse_pointers = match source {
            DrawSource::Vertices { vertices, .. } if use_vertex_cache => {
                self.cache.pre_transform(vertices, &states.transform);

                // A changed view alters the model-view matrix even for identity.
                if !self.cache.vertex_cache_active || self.cache.view_changed {
                    self.apply_transform(&Mat4::IDENTITY, program);
                }
                self.cache.vertex_cache_active
            }
            _ => {
                self.apply_transform(&states.transform, program);
                false
            }
        };

        tracing::trace!(count, shader_changed, reuse_pointers, "Dispatching draw");

        if shader_changed || self.cache.view_changed {
            self.apply_current_view(program);
        }

        if states.blend_mode != self.cache.blend_mode {
            self.apply_blend_mode(states.blend_mode);
        }

        let texture_id = states.texture.map_or(CacheId::NULL, |t| t.cache_id());
        if shader_changed || texture_id != self.cache.texture {
            self.apply_texture(states.texture, program);
        }

        if let Some(shader) = effective {
            self.backend.bind_shader(Some(shader));
        }

        match source {
            DrawSource::Buffer(buffer) => {
                if buffer.cache_id() != self.cache.vertex_buffer {
                    self.apply_vertex_buffer(Some(buffer));
                }
            }
            DrawSource::Vertices { .. } => {
                if !self.cache.vertex_buffer.is_null() {
                    self.apply_vertex_buffer(None);
                }
            }
        }

        let vertex_source = match source {
            DrawSource::Buffer(_) => VertexSource::Buffer,
            DrawSource::Vertices { .. } if use_vertex_cache => VertexSource::Client(self.cache.pre_transformed(count)),
            DrawSource::Vertices { vertices, .. } => VertexSource::Client(vertices),
        };
        let primitive = source.primitive();

        match program {
            None => {
                if !reuse_pointers {
                    self.backend.set_vertex_pointers(vertex_source);
                }
                self.backend.draw_arrays(primitive, 0, draw_count);
            }
            Some(program) => {
                self.apply_lights(program);

                let locations: Vec<(u32, VertexAttribute)> = VertexAttribute::ALL
                    .into_iter()
                    .filter_map(|attribute| {
                        program
                            .attribute_location(uniforms::attribute_name(attribute))
                            .map(|location| (location, attribute))
                    })
                    .collect();

                for &(location, attribute) in &locations {
                    self.backend.enable_vertex_attribute(location, attribute, vertex_source);
                }

                self.backend.draw_arrays(primitive, 0, draw_count);

                for &(location, _) in &locations {
                    self.backend.disable_vertex_attribute(location);
                }
            }
        }

        if states.shader.is_some() && !uniform_mode {
            self.backend.bind_shader(None);
        }

        // Only a client draw through the scratch buffer leaves pointers on it.
        self.cache.vertex_cache_active = use_vertex_cache;

        if let Some(program) = program {
            if let (Some(shader), Some(warn)) = (states.shader, previous_warn) {
                shader.set_warn_missing(warn);
            }
            self.cache.last_shader = program.cache_id();
        }
    }

    // State save and restore

    /// Re-establish every persistent default on the backend.
    ///
    /// The default view becomes the active view again. Needed after foreign
    /// code changed backend state behind the target's back. Safe to call any
    /// number of times.
    pub fn reset_states(&mut self) {
        profile_function!();

        if !self.surface.activate(true) {
            return;
        }

        tracing::debug!("Resetting backend states ({:?} pipeline)", self.pipeline.mode());

        let fallback = self.pipeline.fallback().cloned();
        let program = fallback.as_deref();

        self.backend.set_capability(Capability::Lighting, false);
        if self.depth_test {
            self.backend.set_capability(Capability::DepthTest, true);
            self.backend.set_depth_state(DepthState::REVERSED);
        } else {
            self.backend.set_capability(Capability::DepthTest, false);
        }
        self.backend.set_capability(Capability::AlphaTest, false);
        self.backend.set_capability(Capability::CullFace, true);
        self.backend.set_capability(Capability::Blend, true);

        if program.is_none() {
            self.backend.set_capability(Capability::Texture2D, true);
            self.backend.set_capability(Capability::ColorMaterial, true);
            self.backend.set_capability(Capability::Normalize, true);
            for array in ClientArray::ALL {
                self.backend.set_client_array(array, true);
            }
        }

        self.backend.set_polygon_fill();
        self.cache.states_set = true;

        self.apply_blend_mode(BlendMode::Alpha);
        self.apply_transform(&Mat4::IDENTITY, program);
        self.apply_texture(None, program);

        if self.features.contains(BackendFeatures::SHADERS) {
            self.backend.bind_shader(program);
        }

        if self.features.contains(BackendFeatures::VERTEX_BUFFERS) {
            self.apply_vertex_buffer(None);
        }

        self.cache.vertex_cache_active = false;
        self.cache.last_shader = program.map_or(CacheId::NULL, |p| p.cache_id());

        self.set_view(self.default_view.clone());
    }

    /// Save the backend state, then reset it to the target's defaults.
    pub fn push_states(&mut self) {
        if self.surface.activate(true) {
            tracing::debug!("Saving backend states");
            self.backend.push_state();
        }

        self.reset_states();
    }

    /// Restore the backend state saved by the matching [`push_states`](Self::push_states).
    ///
    /// Defaults are re-established by the next draw through this target.
    pub fn pop_states(&mut self) {
        if !self.surface.activate(true) {
            return;
        }

        tracing::debug!("Restoring backend states");

        if self.pipeline.fallback().is_some() {
            self.backend.bind_shader(None);
        }
        self.backend.pop_state();

        self.cache.states_set = false;
        self.cache.vertex_cache_active = false;
    }

    // Backend state application

    fn apply_current_view(&mut self, program: Option<&dyn Shader>) {
        let viewport = view::viewport(&self.view, self.size());
        let top = self.size().y as i32 - (viewport.y + viewport.height);
        self.backend
            .set_viewport(IntRect::new(viewport.x, top, viewport.width, viewport.height));

        let projection = self.view.transform();
        match program {
            Some(program) => program.set_uniform(uniforms::PROJECTION_MATRIX, Uniform::Mat4(projection)),
            None => self.backend.load_matrix(MatrixMode::Projection, &projection),
        }

        self.cache.view_changed = false;
    }

    fn apply_transform(&self, transform: &Mat4, program: Option<&dyn Shader>) {
        match program {
            Some(program) => {
                program.set_uniform(uniforms::VIEW_MATRIX, Uniform::Mat4(self.view.view_transform()));
                program.set_uniform(uniforms::MODEL_MATRIX, Uniform::Mat4(*transform));

                if self.lights.is_lighting_enabled() {
                    program.set_uniform(uniforms::NORMAL_MATRIX, Uniform::Mat4(uniforms::normal_matrix(transform)));
                }
            }
            None => {
                let model_view = self.view.view_transform() * *transform;
                self.backend.load_matrix(MatrixMode::ModelView, &model_view);
            }
        }
    }

    fn apply_blend_mode(&mut self, mode: BlendMode) {
        let separate = self.features.contains(BackendFeatures::BLEND_FUNC_SEPARATE);
        self.backend.set_blend_function(mode.blend_function(separate));
        self.cache.blend_mode = mode;
    }

    fn apply_texture(&mut self, texture: Option<&dyn Texture>, program: Option<&dyn Shader>) {
        match (program, texture) {
            (Some(program), Some(texture)) => {
                program.set_uniform(uniforms::TEXTURE_MATRIX, Uniform::Mat4(uniforms::texture_matrix(texture)));
                program.set_uniform(uniforms::TEXTURE, Uniform::Texture(texture));
                program.set_uniform(uniforms::TEXTURE_ENABLED, Uniform::Int(1));
            }
            (Some(program), None) => program.set_uniform(uniforms::TEXTURE_ENABLED, Uniform::Int(0)),
            (None, texture) => self.backend.bind_texture(texture, CoordinateType::Pixels),
        }

        self.cache.texture = texture.map_or(CacheId::NULL, |t| t.cache_id());
    }

    fn apply_vertex_buffer(&mut self, buffer: Option<&dyn VertexBuffer>) {
        self.backend.bind_vertex_buffer(buffer);
        self.cache.vertex_buffer = buffer.map_or(CacheId::NULL, |b| b.cache_id());
        // Pointers set from now on are relative to the new binding.
        self.cache.invalidate_vertex_cache();
    }

    fn apply_lights(&self, program: &dyn Shader) {
        if !self.lights.is_lighting_enabled() {
            program.set_uniform(uniforms::LIGHT_COUNT, Uniform::Int(0));
            return;
        }

        let lights = self.lights.enabled_lights();
        program.set_uniform(uniforms::LIGHT_COUNT, Uniform::Int(lights.len() as i32));
        for (index, light) in lights.iter().enumerate() {
            light.add_to_shader(program, index);
        }
        program.set_uniform(uniforms::VIEWER_POSITION, Uniform::Vec3(self.view.position()));
    }
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("size", &self.surface.size())
            .field("pipeline", &self.pipeline)
            .field("depth_test", &self.depth_test)
            .field("view", &self.view)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
