//! Views and the mapping between target pixels and world coordinates.
//!
//! A [`View`] is a camera: a projection (`transform`), a model-view matrix
//! (`view_transform`) and the normalized rectangle of the target it renders
//! into. The free functions here turn a view and a target size into a pixel
//! viewport and convert points in both directions. They are pure and are only
//! used for hit-testing and viewport setup, never to change backend state.
//!
//! # Example
//!
//! ```
//! use kiln_core::geometry::{FloatRect, IntRect};
//! use kiln_render::view::{viewport, View};
//! use glam::UVec2;
//!
//! let mut view = View::from_rect(FloatRect::new(0.0, 0.0, 800.0, 600.0));
//! view.set_viewport(FloatRect::new(0.5, 0.0, 0.5, 1.0));
//!
//! assert_eq!(viewport(&view, UVec2::new(800, 600)), IntRect::new(400, 0, 400, 600));
//! ```

use glam::{IVec2, Mat4, UVec2, Vec3};
use kiln_core::geometry::{FloatRect, IntRect};

/// A camera rendering into part of a target.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// Normalized target rectangle
    viewport: FloatRect,
    /// Projection (world to clip)
    transform: Mat4,
    /// Model-view (camera placement)
    view_transform: Mat4,
    /// Cached inverse of `transform * view_transform`
    inverse_transform: Mat4,
    /// Eye position, used for specular lighting
    position: Vec3,
}

impl View {
    pub fn new(transform: Mat4, view_transform: Mat4) -> Self {
        let mut view = Self {
            viewport: FloatRect::UNIT,
            transform,
            view_transform,
            inverse_transform: Mat4::IDENTITY,
            position: Vec3::ZERO,
        };
        view.update_inverse();
        view
    }

    /// A 2D view showing `rect` of the world, Y pointing down.
    pub fn from_rect(rect: FloatRect) -> Self {
        let mut view = Self::new(Mat4::IDENTITY, Mat4::IDENTITY);
        view.reset(rect);
        view
    }

    /// Show `rect` of the world with an orthographic projection and no
    /// camera transform. The viewport is left untouched.
    pub fn reset(&mut self, rect: FloatRect) {
        self.transform = Mat4::orthographic_rh_gl(rect.x, rect.right(), rect.bottom(), rect.y, -1.0, 1.0);
        self.view_transform = Mat4::IDENTITY;
        self.position = Vec3::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0, 0.0);
        self.update_inverse();
    }

    /// Place the camera at `eye` looking towards `target`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.view_transform = Mat4::look_at_rh(eye, target, up);
        self.position = eye;
        self.update_inverse();
    }

    pub fn viewport(&self) -> FloatRect {
        self.viewport
    }

    /// Set the normalized rectangle of the target this view renders into.
    pub fn set_viewport(&mut self, viewport: FloatRect) {
        self.viewport = viewport;
    }

    /// Projection matrix.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.update_inverse();
    }

    /// Camera (model-view) matrix.
    pub fn view_transform(&self) -> Mat4 {
        self.view_transform
    }

    pub fn set_view_transform(&mut self, view_transform: Mat4) {
        self.view_transform = view_transform;
        self.update_inverse();
    }

    /// Inverse of the full world-to-clip transform.
    pub fn inverse_transform(&self) -> Mat4 {
        self.inverse_transform
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn update_inverse(&mut self) {
        self.inverse_transform = (self.transform * self.view_transform).inverse();
    }
}

impl Default for View {
    fn default() -> Self {
        Self::from_rect(FloatRect::new(0.0, 0.0, 1000.0, 1000.0))
    }
}

/// Pixel rectangle covered by `view` on a target of `target_size` pixels.
///
/// The origin is rounded to the nearest pixel and the extent truncated, so
/// views tiling the target side by side never overlap.
pub fn viewport(view: &View, target_size: UVec2) -> IntRect {
    let width = target_size.x as f32;
    let height = target_size.y as f32;
    let rect = view.viewport();

    IntRect::new(
        (0.5 + width * rect.x) as i32,
        (0.5 + height * rect.y) as i32,
        (width * rect.width) as i32,
        (height * rect.height) as i32,
    )
}

/// Convert a pixel of the target into world coordinates.
pub fn map_pixel_to_coords(point: IVec2, view: &View, target_size: UVec2) -> Vec3 {
    let rect = viewport(view, target_size);
    let x = -1.0 + 2.0 * (point.x - rect.x) as f32 / rect.width as f32;
    let y = 1.0 - 2.0 * (point.y - rect.y) as f32 / rect.height as f32;

    view.inverse_transform().project_point3(Vec3::new(x, y, 0.0))
}

/// Convert a world point into a pixel of the target.
pub fn map_coords_to_pixel(point: Vec3, view: &View, target_size: UVec2) -> IVec2 {
    let normalized = (view.transform() * view.view_transform()).project_point3(point);
    let rect = viewport(view, target_size);

    IVec2::new(
        ((normalized.x + 1.0) / 2.0 * rect.width as f32 + rect.x as f32) as i32,
        ((-normalized.y + 1.0) / 2.0 * rect.height as f32 + rect.y as f32) as i32,
    )
}
