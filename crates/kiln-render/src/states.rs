use crate::blend::BlendMode;
use glam::Mat4;
use kiln_gfx::{Shader, Texture};
use std::fmt;

/// Per-draw state descriptor.
///
/// Borrowed for the duration of one draw call; the target keeps no
/// reference to the texture or shader afterwards, only their identity tokens.
#[derive(Clone, Copy)]
pub struct RenderStates<'a> {
    /// Model transform applied to every vertex.
    pub transform: Mat4,
    pub blend_mode: BlendMode,
    pub texture: Option<&'a dyn Texture>,
    pub shader: Option<&'a dyn Shader>,
    /// Allow small vertex batches to be transformed on the CPU into the
    /// target's scratch buffer instead of changing the model-view matrix.
    pub use_vertex_cache: bool,
}

impl<'a> RenderStates<'a> {
    pub const DEFAULT: RenderStates<'static> = RenderStates {
        transform: Mat4::IDENTITY,
        blend_mode: BlendMode::Alpha,
        texture: None,
        shader: None,
        use_vertex_cache: false,
    };

    pub fn new() -> Self {
        RenderStates::DEFAULT
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_texture(mut self, texture: &'a dyn Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_shader(mut self, shader: &'a dyn Shader) -> Self {
        self.shader = Some(shader);
        self
    }

    pub fn with_vertex_cache(mut self, enabled: bool) -> Self {
        self.use_vertex_cache = enabled;
        self
    }

    /// Copy of these states with `local` applied before the current transform.
    ///
    /// Drawables use this to append their own transform to the one they were
    /// given.
    pub fn transformed(&self, local: Mat4) -> Self {
        let mut states = *self;
        states.transform = self.transform * local;
        states
    }
}

impl Default for RenderStates<'_> {
    fn default() -> Self {
        RenderStates::DEFAULT
    }
}

impl fmt::Debug for RenderStates<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderStates")
            .field("transform", &self.transform)
            .field("blend_mode", &self.blend_mode)
            .field("texture", &self.texture.map(|t| t.cache_id()))
            .field("shader", &self.shader.map(|s| s.cache_id()))
            .field("use_vertex_cache", &self.use_vertex_cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_transformed_applies_local_first() {
        let parent = RenderStates::new().with_transform(Mat4::from_scale(Vec3::splat(2.0)));
        let child = parent.transformed(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));

        let point = child.transform.transform_point3(Vec3::ZERO);
        assert_eq!(point, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(child.blend_mode, parent.blend_mode);
    }

    #[test]
    fn test_default_states() {
        let states = RenderStates::default();
        assert_eq!(states.transform, Mat4::IDENTITY);
        assert!(states.texture.is_none());
        assert!(states.shader.is_none());
        assert!(!states.use_vertex_cache);
    }
}
