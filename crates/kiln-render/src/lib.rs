//! Kiln Render
//!
//! Render-state caching and draw dispatch in front of a stateful,
//! immediate-mode graphics backend.
//!
//! A [`RenderTarget`] accepts draw requests (a slice of vertices or an
//! uploaded vertex buffer) together with [`RenderStates`], and issues only the
//! backend calls needed to bring the device from the state recorded in its
//! [`StateCache`] to the state the draw requires.
//!
//! # Pipelines
//!
//! At construction the target probes the backend once. If a programmable
//! pipeline of a recent enough shading language is available and the light
//! source supports shader lighting, a fallback program is compiled and every
//! draw runs through named uniforms ([`PipelineMode::Uniform`]). Otherwise, or
//! if that program fails to build, the target stays on the fixed-function path
//! ([`PipelineMode::Legacy`]) for the rest of its life.
//!
//! # Example
//!
//! ```
//! use kiln_gfx::{Color, PrimitiveType};
//! use kiln_render::{RenderStates, RenderTarget, RenderTargetDescriptor};
//! use kiln_test_utils::{MockBackend, MockSurface, fixtures};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(MockBackend::new());
//! let mut target = RenderTarget::new(backend.clone(), MockSurface::new(800, 600), RenderTargetDescriptor::default());
//!
//! target.clear(Color::BLACK);
//! target.draw_vertices(&fixtures::triangle(), PrimitiveType::Triangles, &RenderStates::default());
//! assert_eq!(backend.count_draws(), 1);
//! ```

pub mod blend;
pub mod cache;
pub mod drawable;
pub mod pipeline;
pub mod states;
pub mod target;
pub mod uniforms;
pub mod view;

pub use blend::BlendMode;
pub use cache::{StateCache, VERTEX_CACHE_SIZE};
pub use drawable::{Drawable, VertexArray};
pub use pipeline::{PipelineMode, PipelinePreference};
pub use states::RenderStates;
pub use target::{RenderTarget, RenderTargetDescriptor};
pub use view::View;
