use crate::states::RenderStates;
use crate::target::RenderTarget;
use kiln_gfx::{PrimitiveType, Vertex};

/// Something that knows how to draw itself into a [`RenderTarget`].
///
/// Implementations call back into the target's draw entry points, usually
/// after appending their own transform with [`RenderStates::transformed`].
pub trait Drawable {
    fn draw(&self, target: &mut RenderTarget, states: &RenderStates<'_>);
}

/// An owned list of vertices drawn with a single primitive type.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexArray {
    vertices: Vec<Vertex>,
    primitive: PrimitiveType,
}

impl VertexArray {
    pub fn new(primitive: PrimitiveType) -> Self {
        Self {
            vertices: Vec::new(),
            primitive,
        }
    }

    pub fn from_vertices(primitive: PrimitiveType, vertices: impl Into<Vec<Vertex>>) -> Self {
        Self {
            vertices: vertices.into(),
            primitive,
        }
    }

    pub fn push(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    pub fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    pub fn set_primitive(&mut self, primitive: PrimitiveType) {
        self.primitive = primitive;
    }
}

impl Drawable for VertexArray {
    fn draw(&self, target: &mut RenderTarget, states: &RenderStates<'_>) {
        target.draw_vertices(&self.vertices, self.primitive, states);
    }
}
