//! Choosing between the fixed-function and the uniform-driven pipeline.
//!
//! The choice is made once per target. A target starts out
//! [`Unprobed`](PipelineMode::Unprobed), moves to either
//! [`Uniform`](PipelineMode::Uniform) or [`Legacy`](PipelineMode::Legacy)
//! when it is initialized, and never changes again.

use crate::uniforms;
use kiln_gfx::{BackendFeatures, GraphicsBackend, LightSource, Shader, VertexAttribute};
use std::fmt;
use std::sync::Arc;

/// Shading language versions at or below this cannot run the fallback program.
pub const DEFAULT_MIN_SHADING_LANGUAGE_VERSION: f32 = 1.29;

/// Which pipeline a target runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineMode {
    /// Initialization has not run yet.
    Unprobed,
    /// Fixed-function path; user shaders are bound around their own draws only.
    Legacy,
    /// Every draw runs a program fed through named uniforms.
    Uniform,
}

/// What the caller allows the selector to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelinePreference {
    /// Use the uniform pipeline when the backend supports it.
    #[default]
    Auto,
    /// Never probe; stay on the fixed-function path.
    ForceLegacy,
}

/// The selected pipeline together with the fallback program it owns.
#[derive(Clone, Default)]
pub(crate) enum Pipeline {
    #[default]
    Unprobed,
    Legacy,
    Uniform { fallback: Arc<dyn Shader> },
}

impl Pipeline {
    pub(crate) fn mode(&self) -> PipelineMode {
        match self {
            Pipeline::Unprobed => PipelineMode::Unprobed,
            Pipeline::Legacy => PipelineMode::Legacy,
            Pipeline::Uniform { .. } => PipelineMode::Uniform,
        }
    }

    pub(crate) fn fallback(&self) -> Option<&Arc<dyn Shader>> {
        match self {
            Pipeline::Uniform { fallback } => Some(fallback),
            _ => None,
        }
    }

    /// Probe the backend and build the fallback program if possible.
    ///
    /// A build failure is logged and yields [`Pipeline::Legacy`]; it is never
    /// retried.
    pub(crate) fn select(
        backend: &dyn GraphicsBackend,
        lights: &dyn LightSource,
        preference: PipelinePreference,
        min_version: f32,
    ) -> Pipeline {
        if preference == PipelinePreference::ForceLegacy {
            tracing::info!("Legacy pipeline forced by configuration");
            return Pipeline::Legacy;
        }

        if !lights.has_shader_lighting() {
            tracing::debug!("Light source has no shader lighting, using legacy pipeline");
            return Pipeline::Legacy;
        }

        if !backend.features().contains(BackendFeatures::SHADERS) {
            tracing::debug!("Backend has no programmable pipeline, using legacy pipeline");
            return Pipeline::Legacy;
        }

        let reported = backend.shading_language_version();
        let version = parse_shading_language_version(&reported);
        if version <= min_version {
            tracing::debug!(
                "Shading language version {:?} is not above {}, using legacy pipeline",
                reported,
                min_version
            );
            return Pipeline::Legacy;
        }

        let source = FallbackSource::new(lights.maximum_lights());
        match backend.compile_program(&source.vertex, &source.fragment) {
            Ok(fallback) => {
                tracing::info!("Uniform pipeline enabled (shading language {})", version);
                Pipeline::Uniform { fallback }
            }
            Err(e) => {
                tracing::error!("Compiling fallback shader failed, falling back to legacy pipeline: {}", e);
                Pipeline::Legacy
            }
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pipeline::Uniform { fallback } => f
                .debug_struct("Uniform")
                .field("fallback", &fallback.cache_id())
                .finish(),
            other => write!(f, "{:?}", other.mode()),
        }
    }
}

/// Leading number of a version string such as `"4.60 NVIDIA"`.
///
/// Strings that do not start with a number (`"OpenGL ES GLSL ES 1.00"`)
/// parse as `0.0`, which keeps embedded profiles on the legacy path.
pub fn parse_shading_language_version(version: &str) -> f32 {
    version
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<f32>().ok())
        .unwrap_or(0.0)
}

/// Sources of the program the uniform pipeline falls back to when a draw
/// brings no shader of its own.
#[derive(Debug, Clone)]
pub struct FallbackSource {
    pub vertex: String,
    pub fragment: String,
}

impl FallbackSource {
    pub fn new(maximum_lights: usize) -> Self {
        Self {
            vertex: vertex_source(),
            fragment: fragment_source(maximum_lights.max(1)),
        }
    }
}

fn vertex_source() -> String {
    format!(
        r#"#version 130

uniform mat4 {model};
uniform mat4 {view};
uniform mat4 {projection};
uniform mat4 {texture_matrix};
uniform int {texture_enabled};
uniform int {light_count};

in vec3 {position};
in vec4 {color};
in vec2 {tex_coords};
in vec3 {normal};

out vec4 v_color;
out vec2 v_tex_coords;
out vec3 v_position;
out vec3 v_normal;

void main()
{{
    gl_Position = {projection} * {view} * {model} * vec4({position}, 1.0);
    v_color = {color};

    if ({texture_enabled} == 1)
        v_tex_coords = ({texture_matrix} * vec4({tex_coords}, 0.0, 1.0)).st;

    if ({light_count} > 0)
    {{
        v_normal = {normal};
        v_position = {position};
    }}
}}
"#,
        model = uniforms::MODEL_MATRIX,
        view = uniforms::VIEW_MATRIX,
        projection = uniforms::PROJECTION_MATRIX,
        texture_matrix = uniforms::TEXTURE_MATRIX,
        texture_enabled = uniforms::TEXTURE_ENABLED,
        light_count = uniforms::LIGHT_COUNT,
        position = uniforms::attribute_name(VertexAttribute::Position),
        color = uniforms::attribute_name(VertexAttribute::Color),
        tex_coords = uniforms::attribute_name(VertexAttribute::TexCoords),
        normal = uniforms::attribute_name(VertexAttribute::Normal),
    )
}

fn fragment_source(maximum_lights: usize) -> String {
    format!(
        r#"#version 130

struct Light
{{
    vec4 color;
    vec4 position_direction;
    float ambient_intensity;
    float diffuse_intensity;
    float specular_intensity;
    float constant_attenuation;
    float linear_attenuation;
    float quadratic_attenuation;
}};

uniform mat4 {model};
uniform mat4 {normal_matrix};
uniform sampler2D {texture};
uniform int {texture_enabled};
uniform Light u_lights[{maximum_lights}];
uniform int {light_count};
uniform vec3 {viewer};

in vec4 v_color;
in vec2 v_tex_coords;
in vec3 v_position;
in vec3 v_normal;

out vec4 f_color;

const float shininess = 1.0;
const vec4 specular_color = vec4(0.0001, 0.0001, 0.0001, 1.0);

vec4 lighting()
{{
    if ({light_count} == 0)
        return vec4(1.0);

    vec3 normal = normalize(({normal_matrix} * vec4(v_normal, 1.0)).xyz);
    vec3 world_position = vec3({model} * vec4(v_position, 1.0));
    vec3 to_viewer = normalize({viewer} - world_position);

    vec4 total = vec4(0.0);
    for (int i = 0; i < {light_count}; ++i)
    {{
        vec3 to_light = normalize(-u_lights[i].position_direction.xyz);
        float attenuation = 1.0;

        if (u_lights[i].position_direction.w > 0.0)
        {{
            vec3 ray = u_lights[i].position_direction.xyz - world_position;
            float distance = length(ray);
            to_light = normalize(ray);
            attenuation = u_lights[i].constant_attenuation
                        + u_lights[i].linear_attenuation * distance
                        + u_lights[i].quadratic_attenuation * distance * distance;
        }}

        vec4 ambient = u_lights[i].color * u_lights[i].ambient_intensity;

        float diffuse_factor = max(0.0, dot(normal, to_light));
        vec4 diffuse = u_lights[i].color * u_lights[i].diffuse_intensity * diffuse_factor;

        float specular_factor = 0.0;
        if (diffuse_factor > 0.0)
            specular_factor = pow(max(0.0, dot(to_viewer, reflect(-to_light, normal))), shininess);
        vec4 specular = specular_factor * specular_color * u_lights[i].color * u_lights[i].specular_intensity;

        total += ambient + (diffuse + specular) / attenuation;
    }}

    return vec4(total.rgb, 1.0);
}}

vec4 texel()
{{
    if ({texture_enabled} == 0)
        return vec4(1.0);

    return texture2D({texture}, v_tex_coords);
}}

void main()
{{
    f_color = v_color * texel() * lighting();
}}
"#,
        model = uniforms::MODEL_MATRIX,
        normal_matrix = uniforms::NORMAL_MATRIX,
        texture = uniforms::TEXTURE,
        texture_enabled = uniforms::TEXTURE_ENABLED,
        light_count = uniforms::LIGHT_COUNT,
        viewer = uniforms::VIEWER_POSITION,
        maximum_lights = maximum_lights,
    )
}
