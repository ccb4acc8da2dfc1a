//! Shared setup for the render target integration tests.

#![allow(dead_code)]

use kiln_gfx::{CacheId, LightRegistry};
use kiln_render::{PipelineMode, RenderTarget, RenderTargetDescriptor};
use kiln_test_utils::{MockBackend, MockSurface};
use std::sync::Arc;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub surface: MockSurface,
    pub lights: Arc<LightRegistry>,
    pub target: RenderTarget,
}

fn build(backend: MockBackend, descriptor: RenderTargetDescriptor) -> Harness {
    kiln_core::logging::init_for_tests();

    let backend = Arc::new(backend);
    let surface = MockSurface::new(WIDTH, HEIGHT);
    let lights = Arc::new(LightRegistry::new());
    let target = RenderTarget::new(
        backend.clone(),
        surface.clone(),
        descriptor.with_lights(lights.clone()),
    );

    Harness {
        backend,
        surface,
        lights,
        target,
    }
}

/// A target on a fixed-function-only backend.
pub fn legacy() -> Harness {
    build(MockBackend::legacy(), RenderTargetDescriptor::default())
}

/// A target running the uniform pipeline.
pub fn uniform() -> Harness {
    let harness = build(MockBackend::new(), RenderTargetDescriptor::default());
    assert_eq!(harness.target.pipeline_mode(), PipelineMode::Uniform);
    harness
}

pub fn with_backend(backend: MockBackend, descriptor: RenderTargetDescriptor) -> Harness {
    build(backend, descriptor)
}

impl Harness {
    /// Program currently bound on the mock device.
    pub fn bound_shader(&self) -> CacheId {
        self.backend.state().shader
    }
}
