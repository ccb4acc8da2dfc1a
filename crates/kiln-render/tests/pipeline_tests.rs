//! Pipeline selection and the uniform-driven draw path.

mod common;

use glam::{Mat4, Vec3, Vec4};
use kiln_gfx::{BackendFeatures, CacheId, Light, MatrixMode, NoLighting, PrimitiveType, Shader, Texture};
use kiln_render::uniforms;
use kiln_render::{PipelineMode, PipelinePreference, RenderStates, RenderTarget, RenderTargetDescriptor};
use kiln_test_utils::{
    BackendCall, DEFAULT_ATTRIBUTES, MockBackend, MockSurface, MockTexture, MockVertexBuffer, UniformValue, fixtures,
};
use std::sync::Arc;

fn compile_calls(backend: &MockBackend) -> usize {
    backend.count(|c| matches!(c, BackendCall::CompileProgram { .. }))
}

#[test]
fn test_capable_backend_selects_uniform_pipeline() {
    let h = common::uniform();
    assert_eq!(h.backend.calls(), vec![BackendCall::CompileProgram { succeeded: true }]);
}

#[test]
fn test_failed_fallback_build_downgrades_for_good() {
    let mut h = common::with_backend(MockBackend::new().failing_compile(), RenderTargetDescriptor::default());
    assert_eq!(h.target.pipeline_mode(), PipelineMode::Legacy);
    assert_eq!(compile_calls(&h.backend), 1);

    h.surface.set_size(1024, 768);
    h.target.on_resize();
    h.target.initialize();
    h.target.draw_vertices(&fixtures::triangle(), PrimitiveType::Triangles, &RenderStates::default());

    assert_eq!(h.target.pipeline_mode(), PipelineMode::Legacy);
    assert_eq!(compile_calls(&h.backend), 1);
    // Drawn through the fixed-function path.
    assert_eq!(h.backend.count_vertex_pointer_sets(), 1);
    assert_eq!(h.backend.count(|c| matches!(c, BackendCall::SetUniform { .. })), 0);
}

#[test]
fn test_old_shading_language_stays_legacy() {
    for version in ["1.20", "1.29", "OpenGL ES GLSL ES 3.00", ""] {
        let h = common::with_backend(
            MockBackend::with_features(BackendFeatures::all(), version),
            RenderTargetDescriptor::default(),
        );
        assert_eq!(h.target.pipeline_mode(), PipelineMode::Legacy, "version {:?}", version);
        assert_eq!(compile_calls(&h.backend), 0);
    }
}

#[test]
fn test_configured_threshold_is_respected() {
    let h = common::with_backend(
        MockBackend::with_features(BackendFeatures::all(), "1.30"),
        RenderTargetDescriptor::default().with_min_shading_language_version(1.50),
    );
    assert_eq!(h.target.pipeline_mode(), PipelineMode::Legacy);
}

#[test]
fn test_forced_legacy_never_probes() {
    let h = common::with_backend(
        MockBackend::new(),
        RenderTargetDescriptor::default().with_pipeline(PipelinePreference::ForceLegacy),
    );
    assert_eq!(h.target.pipeline_mode(), PipelineMode::Legacy);
    assert_eq!(h.backend.call_count(), 0);
}

#[test]
fn test_no_shader_lighting_stays_legacy() {
    let backend = Arc::new(MockBackend::new());
    let target = RenderTarget::new(
        backend.clone(),
        MockSurface::new(64, 64),
        RenderTargetDescriptor::default().with_lights(Arc::new(NoLighting)),
    );
    assert_eq!(target.pipeline_mode(), PipelineMode::Legacy);
    assert_eq!(backend.call_count(), 0);
}

#[test]
fn test_reset_binds_fallback_program() {
    let mut h = common::uniform();
    h.target.reset_states();

    let fallback = h.bound_shader();
    assert!(!fallback.is_null());
    assert_eq!(h.target.cache().last_shader(), fallback);
    assert_eq!(
        h.backend.last_uniform(fallback, uniforms::TEXTURE_ENABLED),
        Some(UniformValue::Int(0))
    );
    // No fixed-function state in uniform mode.
    assert_eq!(h.backend.count(|c| matches!(c, BackendCall::SetClientArray { .. })), 0);
    assert_eq!(h.backend.count_matrix_loads(MatrixMode::ModelView), 0);
}

#[test]
fn test_every_draw_binds_effective_program() {
    let mut h = common::uniform();
    let triangle = fixtures::triangle();
    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &RenderStates::default());
    let fallback = h.bound_shader();
    h.backend.clear_calls();

    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &RenderStates::default());
    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &RenderStates::default());

    assert_eq!(h.backend.count_shader_binds(), 2);
    assert_eq!(h.bound_shader(), fallback);
}

#[test]
fn test_shader_change_reapplies_view_and_texture() {
    let mut h = common::uniform();
    let triangle = fixtures::triangle();
    let texture = MockTexture::new(64, 64);
    let user = h.backend.create_shader(&DEFAULT_ATTRIBUTES);
    let with_texture = RenderStates::default().with_texture(&texture);

    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &with_texture);
    h.backend.clear_calls();

    // Same program, same texture, same view.
    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &with_texture);
    assert_eq!(h.backend.count_viewport_sets(), 0);
    assert_eq!(h.backend.count_uniform_writes(uniforms::PROJECTION_MATRIX), 0);
    assert_eq!(h.backend.count_uniform_writes(uniforms::TEXTURE_ENABLED), 0);

    // Switching program re-applies both even though the texture is unchanged.
    h.backend.clear_calls();
    let user_states = with_texture.with_shader(user.as_ref());
    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &user_states);

    assert_eq!(h.backend.count_viewport_sets(), 1);
    assert_eq!(
        h.backend.last_uniform(user.cache_id(), uniforms::PROJECTION_MATRIX),
        Some(UniformValue::Mat4(h.target.view().transform()))
    );
    assert_eq!(
        h.backend.last_uniform(user.cache_id(), uniforms::TEXTURE),
        Some(UniformValue::Texture(texture.cache_id()))
    );
    assert_eq!(h.target.cache().last_shader(), user.cache_id());

    // And staying on it does not.
    h.backend.clear_calls();
    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &user_states);
    assert_eq!(h.backend.count_viewport_sets(), 0);
    assert_eq!(h.backend.count_uniform_writes(uniforms::TEXTURE), 0);
}

#[test]
fn test_texture_uniforms() {
    let mut h = common::uniform();
    let texture = MockTexture::new(100, 50).padded().flipped();

    h.target.draw_vertices(
        &fixtures::triangle(),
        PrimitiveType::Triangles,
        &RenderStates::default().with_texture(&texture),
    );

    let program = h.bound_shader();
    assert_eq!(
        h.backend.last_uniform(program, uniforms::TEXTURE_MATRIX),
        Some(UniformValue::Mat4(uniforms::texture_matrix(&texture)))
    );
    assert_eq!(h.backend.last_uniform(program, uniforms::TEXTURE_ENABLED), Some(UniformValue::Int(1)));
    // Uniform mode samples through the program, never the fixed-function unit.
    assert_eq!(h.backend.count_texture_binds(), 0);
    assert_eq!(h.target.cache().texture(), texture.cache_id());
}

#[test]
fn test_transform_uniforms() {
    let mut h = common::uniform();
    let transform = Mat4::from_translation(Vec3::new(3.0, 4.0, 0.0));

    h.target.draw_vertices(
        &fixtures::triangle(),
        PrimitiveType::Triangles,
        &RenderStates::default().with_transform(transform),
    );

    let program = h.bound_shader();
    assert_eq!(h.backend.last_uniform(program, uniforms::MODEL_MATRIX), Some(UniformValue::Mat4(transform)));
    assert_eq!(
        h.backend.last_uniform(program, uniforms::VIEW_MATRIX),
        Some(UniformValue::Mat4(h.target.view().view_transform()))
    );
    // Lighting is off, so normals are never needed.
    assert_eq!(h.backend.count_uniform_writes(uniforms::NORMAL_MATRIX), 0);
}

#[test]
fn test_uniform_mode_ignores_vertex_cache() {
    let mut h = common::uniform();
    let states = RenderStates::default().with_vertex_cache(true);
    let triangle = fixtures::triangle();

    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &states);
    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &states);

    assert_eq!(h.backend.count_vertex_pointer_sets(), 0);
    assert!(!h.target.cache().vertex_cache_active());
    assert!(h.backend.calls().contains(&BackendCall::EnableVertexAttribute {
        location: 0,
        attribute: kiln_gfx::VertexAttribute::Position,
        from_buffer: false,
    }));
}

#[test]
fn test_attributes_enabled_for_draw_only() {
    let mut h = common::uniform();
    let user = h.backend.create_shader(&["a_position", "a_color"]);

    h.target.draw_vertices(
        &fixtures::triangle(),
        PrimitiveType::Triangles,
        &RenderStates::default().with_shader(user.as_ref()),
    );

    let calls = h.backend.calls();
    let enabled: Vec<u32> = calls
        .iter()
        .filter_map(|c| match c {
            BackendCall::EnableVertexAttribute { location, .. } => Some(*location),
            _ => None,
        })
        .collect();
    let disabled: Vec<u32> = calls
        .iter()
        .filter_map(|c| match c {
            BackendCall::DisableVertexAttribute(location) => Some(*location),
            _ => None,
        })
        .collect();

    assert_eq!(enabled, vec![0, 1]);
    assert_eq!(disabled, enabled);
    assert!(h.backend.state().enabled_attributes.is_empty());

    let draw = calls.iter().position(|c| matches!(c, BackendCall::DrawArrays { .. }));
    let first_disable = calls
        .iter()
        .position(|c| matches!(c, BackendCall::DisableVertexAttribute(_)));
    assert!(draw < first_disable);
}

#[test]
fn test_buffer_attributes_read_from_buffer() {
    let mut h = common::uniform();
    let buffer = MockVertexBuffer::new(6, PrimitiveType::Triangles);

    h.target.draw_buffer(&buffer, &RenderStates::default());

    assert_eq!(
        h.backend.count(|c| matches!(c, BackendCall::EnableVertexAttribute { from_buffer: true, .. })),
        DEFAULT_ATTRIBUTES.len()
    );
    assert_eq!(h.target.cache().vertex_buffer(), kiln_gfx::VertexBuffer::cache_id(&buffer));
}

#[test]
fn test_warn_missing_is_restored() {
    let mut h = common::uniform();
    let user = h.backend.create_shader(&DEFAULT_ATTRIBUTES);
    let states = RenderStates::default().with_shader(user.as_ref());

    h.target.draw_vertices(&fixtures::triangle(), PrimitiveType::Triangles, &states);
    assert!(user.warns_missing());

    user.set_warn_missing(false);
    h.target.draw_vertices(&fixtures::triangle(), PrimitiveType::Triangles, &states);
    assert!(!user.warns_missing());
}

#[test]
fn test_lights_are_written_when_enabled() {
    let mut h = common::uniform();
    h.lights.add(Light::directional(Vec3::new(0.0, -1.0, 0.0)));
    h.lights.add(Light::point(Vec3::new(1.0, 2.0, 3.0)).with_color(Vec4::new(1.0, 0.0, 0.0, 1.0)));
    h.lights.set_lighting_enabled(true);

    h.target.draw_vertices(&fixtures::triangle(), PrimitiveType::Triangles, &RenderStates::default());

    let program = h.bound_shader();
    assert_eq!(h.backend.last_uniform(program, uniforms::LIGHT_COUNT), Some(UniformValue::Int(2)));
    assert_eq!(
        h.backend.last_uniform(program, "u_lights[1].position_direction"),
        Some(UniformValue::Vec4(Vec4::new(1.0, 2.0, 3.0, 1.0)))
    );
    assert_eq!(
        h.backend.last_uniform(program, "u_lights[1].color"),
        Some(UniformValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 1.0)))
    );
    assert_eq!(
        h.backend.last_uniform(program, uniforms::VIEWER_POSITION),
        Some(UniformValue::Vec3(h.target.view().position()))
    );
    assert_eq!(
        h.backend.last_uniform(program, uniforms::NORMAL_MATRIX),
        Some(UniformValue::Mat4(Mat4::IDENTITY))
    );
}

#[test]
fn test_light_count_is_zero_when_lighting_disabled() {
    let mut h = common::uniform();
    h.lights.add(Light::default());

    h.target.draw_vertices(&fixtures::triangle(), PrimitiveType::Triangles, &RenderStates::default());

    let program = h.bound_shader();
    assert_eq!(h.backend.last_uniform(program, uniforms::LIGHT_COUNT), Some(UniformValue::Int(0)));
    assert_eq!(h.backend.count_uniform_writes(uniforms::VIEWER_POSITION), 0);
    assert_eq!(h.backend.count_uniform_writes("u_lights[0].color"), 0);
}

#[test]
fn test_pop_unbinds_program_before_restoring() {
    let mut h = common::uniform();
    h.target.draw_vertices(&fixtures::triangle(), PrimitiveType::Triangles, &RenderStates::default());
    h.target.push_states();
    h.backend.clear_calls();

    h.target.pop_states();

    assert_eq!(h.backend.calls(), vec![BackendCall::BindShader(CacheId::NULL), BackendCall::PopState]);
}

#[test]
fn test_user_program_is_rebound_after_reset() {
    let mut h = common::uniform();
    let user = h.backend.create_shader(&DEFAULT_ATTRIBUTES);
    let states = RenderStates::default().with_shader(user.as_ref());
    let triangle = fixtures::triangle();

    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &states);
    h.target.reset_states();
    h.backend.clear_calls();
    h.target.draw_vertices(&triangle, PrimitiveType::Triangles, &states);

    // The reset bound the fallback, so the user program counts as changed.
    assert_eq!(h.backend.count_viewport_sets(), 1);
    assert_eq!(h.bound_shader(), user.cache_id());
}
