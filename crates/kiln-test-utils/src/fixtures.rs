//! Vertex data used across tests and benchmarks.

use glam::{Vec2, Vec3};
use kiln_gfx::{Color, Vertex};

/// A single triangle in pixel coordinates.
pub fn triangle() -> [Vertex; 3] {
    [
        Vertex::new(Vec3::new(0.0, 0.0, 0.0), Color::RED, Vec2::new(0.0, 0.0)),
        Vertex::new(Vec3::new(100.0, 0.0, 0.0), Color::GREEN, Vec2::new(1.0, 0.0)),
        Vertex::new(Vec3::new(0.0, 100.0, 0.0), Color::BLUE, Vec2::new(0.0, 1.0)),
    ]
}

/// An axis-aligned quad with its top-left corner at `origin`, wound for `Quads`.
pub fn quad(origin: Vec2, size: Vec2) -> [Vertex; 4] {
    let corner = |x: f32, y: f32| {
        Vertex::new(
            Vec3::new(origin.x + x * size.x, origin.y + y * size.y, 0.0),
            Color::WHITE,
            Vec2::new(x * size.x, y * size.y),
        )
        .with_normal(Vec3::Z)
    };

    [corner(0.0, 0.0), corner(0.0, 1.0), corner(1.0, 1.0), corner(1.0, 0.0)]
}

/// `count` vertices laid out on a line, for tests that only care about the count.
pub fn strip(count: usize) -> Vec<Vertex> {
    (0..count)
        .map(|i| Vertex::new(Vec3::new(i as f32, 0.0, 0.0), Color::WHITE, Vec2::ZERO))
        .collect()
}
