//! Names and values of the parameters the uniform-driven pipeline writes.
//!
//! User shaders that want to run on the uniform pipeline declare the subset
//! of these they need; anything undeclared is skipped.

use glam::{Mat3, Mat4, Vec4};
use kiln_gfx::{Texture, VertexAttribute};

pub const MODEL_MATRIX: &str = "u_model_matrix";
pub const VIEW_MATRIX: &str = "u_view_matrix";
pub const PROJECTION_MATRIX: &str = "u_projection_matrix";
pub const NORMAL_MATRIX: &str = "u_normal_matrix";
pub const TEXTURE_MATRIX: &str = "u_texture_matrix";
pub const TEXTURE: &str = "u_texture";
pub const TEXTURE_ENABLED: &str = "u_texture_enabled";
pub const LIGHT_COUNT: &str = "u_light_count";
pub const VIEWER_POSITION: &str = "u_viewer_position";

/// Attribute name a program declares for a vertex component.
pub const fn attribute_name(attribute: VertexAttribute) -> &'static str {
    match attribute {
        VertexAttribute::Position => "a_position",
        VertexAttribute::Color => "a_color",
        VertexAttribute::TexCoords => "a_tex_coords",
        VertexAttribute::Normal => "a_normal",
    }
}

/// Matrix mapping pixel texture coordinates to normalized ones.
///
/// Scales by the backing size, which may be larger than the image, and
/// flips Y for textures stored bottom-up.
pub fn texture_matrix(texture: &dyn Texture) -> Mat4 {
    let actual = texture.actual_size().as_vec2();
    let x_scale = 1.0 / actual.x;
    let mut y_scale = 1.0 / actual.y;
    let mut y_flip = 0.0;

    if texture.pixels_flipped() {
        y_scale = -y_scale;
        y_flip = texture.size().y as f32 / actual.y;
    }

    Mat4::from_cols(
        Vec4::new(x_scale, 0.0, 0.0, 0.0),
        Vec4::new(0.0, y_scale, 0.0, 0.0),
        Vec4::Z,
        Vec4::new(0.0, y_flip, 0.0, 1.0),
    )
}

/// Inverse-transpose of the upper 3x3 of `model`, for transforming normals.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(*model).inverse().transpose())
}
