//! Vertex layout shared by every draw path.

use glam::{Vec2, Vec3};
use static_assertions::const_assert_eq;
use std::mem::{offset_of, size_of};

/// An RGBA color with 8-bit components.
///
/// The struct is `#[repr(C)]` and implements `bytemuck::Pod`, so it sits
/// directly inside [`Vertex`] and is read by the backend as four normalized bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Components mapped to `0.0..=1.0`.
    pub fn to_array_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// A point with color, texture coordinates and a normal.
///
/// The byte layout is part of the backend contract: backends read vertex
/// components through the offsets reported by [`VertexAttribute`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Color,
    pub tex_coords: Vec2,
    pub normal: Vec3,
}

const_assert_eq!(size_of::<Vertex>(), 36);
const_assert_eq!(offset_of!(Vertex, position), 0);
const_assert_eq!(offset_of!(Vertex, color), 12);
const_assert_eq!(offset_of!(Vertex, tex_coords), 16);
const_assert_eq!(offset_of!(Vertex, normal), 24);

impl Vertex {
    pub const STRIDE: usize = size_of::<Vertex>();

    pub fn new(position: Vec3, color: Color, tex_coords: Vec2) -> Self {
        Self {
            position,
            color,
            tex_coords,
            normal: Vec3::ZERO,
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }
}

/// The components of a [`Vertex`], as seen by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    Color,
    TexCoords,
    Normal,
}

impl VertexAttribute {
    pub const ALL: [VertexAttribute; 4] = [
        VertexAttribute::Position,
        VertexAttribute::Color,
        VertexAttribute::TexCoords,
        VertexAttribute::Normal,
    ];

    /// Byte offset of the component inside a vertex.
    pub const fn offset(self) -> usize {
        match self {
            VertexAttribute::Position => offset_of!(Vertex, position),
            VertexAttribute::Color => offset_of!(Vertex, color),
            VertexAttribute::TexCoords => offset_of!(Vertex, tex_coords),
            VertexAttribute::Normal => offset_of!(Vertex, normal),
        }
    }

    /// Number of scalar components.
    pub const fn components(self) -> u32 {
        match self {
            VertexAttribute::Position | VertexAttribute::Normal => 3,
            VertexAttribute::Color => 4,
            VertexAttribute::TexCoords => 2,
        }
    }

    /// Whether integer components are normalized to `0.0..=1.0` (only colors).
    pub const fn normalized(self) -> bool {
        matches!(self, VertexAttribute::Color)
    }
}

/// How a sequence of vertices is assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
}
