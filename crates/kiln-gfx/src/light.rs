//! Scene lights and the registry the dispatcher reads them from.

use crate::resource::{Shader, Uniform};
use glam::{Vec3, Vec4};
use parking_lot::RwLock;

/// Default capacity of a [`LightRegistry`].
pub const DEFAULT_MAXIMUM_LIGHTS: usize = 8;

/// A directional or point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Vec4,
    /// `w == 0` means `xyz` is a direction, `w > 0` means `xyz` is a position.
    pub position_direction: Vec4,
    pub ambient_intensity: f32,
    pub diffuse_intensity: f32,
    pub specular_intensity: f32,
    pub constant_attenuation: f32,
    pub linear_attenuation: f32,
    pub quadratic_attenuation: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            position_direction: Vec4::new(0.0, 0.0, -1.0, 0.0),
            ambient_intensity: 0.0,
            diffuse_intensity: 1.0,
            specular_intensity: 1.0,
            constant_attenuation: 1.0,
            linear_attenuation: 0.0,
            quadratic_attenuation: 0.0,
        }
    }
}

impl Light {
    pub fn directional(direction: Vec3) -> Self {
        Self {
            position_direction: direction.extend(0.0),
            ..Default::default()
        }
    }

    pub fn point(position: Vec3) -> Self {
        Self {
            position_direction: position.extend(1.0),
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Write this light into element `index` of the `u_lights` array.
    pub fn add_to_shader(&self, shader: &dyn Shader, index: usize) {
        let field = |name: &str| format!("u_lights[{}].{}", index, name);

        shader.set_uniform(&field("color"), Uniform::Vec4(self.color));
        shader.set_uniform(&field("position_direction"), Uniform::Vec4(self.position_direction));
        shader.set_uniform(&field("ambient_intensity"), Uniform::Float(self.ambient_intensity));
        shader.set_uniform(&field("diffuse_intensity"), Uniform::Float(self.diffuse_intensity));
        shader.set_uniform(&field("specular_intensity"), Uniform::Float(self.specular_intensity));
        shader.set_uniform(&field("constant_attenuation"), Uniform::Float(self.constant_attenuation));
        shader.set_uniform(&field("linear_attenuation"), Uniform::Float(self.linear_attenuation));
        shader.set_uniform(&field("quadratic_attenuation"), Uniform::Float(self.quadratic_attenuation));
    }
}

/// Where the dispatcher finds the lights to feed into shaders.
pub trait LightSource: Send + Sync {
    /// Whether lighting can be computed by the fallback program at all.
    fn has_shader_lighting(&self) -> bool;

    fn is_lighting_enabled(&self) -> bool;

    /// Size of the light array compiled into the fallback program.
    fn maximum_lights(&self) -> usize;

    /// Snapshot of the enabled lights, never longer than [`LightSource::maximum_lights`].
    /// The order is stable for the lifetime of the snapshot.
    fn enabled_lights(&self) -> Vec<Light>;
}

/// A light source that never lights anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLighting;

impl LightSource for NoLighting {
    fn has_shader_lighting(&self) -> bool {
        false
    }

    fn is_lighting_enabled(&self) -> bool {
        false
    }

    fn maximum_lights(&self) -> usize {
        0
    }

    fn enabled_lights(&self) -> Vec<Light> {
        Vec::new()
    }
}

/// Handle to a light stored in a [`LightRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(u32);

#[derive(Debug)]
struct LightEntry {
    id: LightId,
    light: Light,
    enabled: bool,
}

#[derive(Debug, Default)]
struct RegistryInner {
    entries: Vec<LightEntry>,
    next_id: u32,
    lighting_enabled: bool,
}

/// A thread-safe list of lights in insertion order.
///
/// ```
/// use kiln_gfx::{Light, LightRegistry, LightSource};
/// use glam::Vec3;
///
/// let registry = LightRegistry::new();
/// let sun = registry.add(Light::directional(Vec3::new(0.0, -1.0, 0.0)));
/// registry.set_lighting_enabled(true);
/// assert_eq!(registry.enabled_lights().len(), 1);
///
/// registry.set_enabled(sun, false);
/// assert!(registry.enabled_lights().is_empty());
/// ```
#[derive(Debug)]
pub struct LightRegistry {
    inner: RwLock<RegistryInner>,
    maximum_lights: usize,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::with_maximum_lights(DEFAULT_MAXIMUM_LIGHTS)
    }

    pub fn with_maximum_lights(maximum_lights: usize) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            maximum_lights,
        }
    }

    /// Add an enabled light.
    pub fn add(&self, light: Light) -> LightId {
        let mut inner = self.inner.write();
        let id = LightId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push(LightEntry {
            id,
            light,
            enabled: true,
        });
        id
    }

    pub fn remove(&self, id: LightId) -> Option<Light> {
        let mut inner = self.inner.write();
        let index = inner.entries.iter().position(|entry| entry.id == id)?;
        Some(inner.entries.remove(index).light)
    }

    pub fn update(&self, id: LightId, light: Light) -> bool {
        let mut inner = self.inner.write();
        match inner.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.light = light;
                true
            }
            None => false,
        }
    }

    pub fn set_enabled(&self, id: LightId, enabled: bool) {
        if let Some(entry) = self.inner.write().entries.iter_mut().find(|entry| entry.id == id) {
            entry.enabled = enabled;
        }
    }

    pub fn set_lighting_enabled(&self, enabled: bool) {
        self.inner.write().lighting_enabled = enabled;
    }
}

impl Default for LightRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LightSource for LightRegistry {
    fn has_shader_lighting(&self) -> bool {
        true
    }

    fn is_lighting_enabled(&self) -> bool {
        self.inner.read().lighting_enabled
    }

    fn maximum_lights(&self) -> usize {
        self.maximum_lights
    }

    fn enabled_lights(&self) -> Vec<Light> {
        let inner = self.inner.read();
        if !inner.lighting_enabled {
            return Vec::new();
        }

        inner
            .entries
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.light)
            .take(self.maximum_lights)
            .collect()
    }
}
