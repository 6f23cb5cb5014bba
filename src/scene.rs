//! Scene Render Snapshot
//!
//! The scene layer (graph traversal, transform propagation, asset streaming)
//! lives outside this crate. Once per frame it flattens whatever it manages
//! into a [`SceneRenderInfo`] snapshot and hands it to
//! [`Renderer::render_scene`]. The snapshot is read-only for the whole
//! frame: the renderer owns it for the duration of the call and passes only
//! borrow it.
//!
//! [`Renderer::render_scene`]: crate::renderer::Renderer::render_scene

use glam::{Mat4, Vec3};

use crate::resources::{EnvironmentMap, Handle, Material, Mesh};

/// Camera matrices for the frame, already composed by the scene layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRenderInfo {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for CameraRenderInfo {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// One light, flattened to world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRenderInfo {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    /// World transform; a directional light shines along its local −Z axis.
    pub transform: Mat4,
}

/// One renderable object: mesh + material + world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderObjectInfo {
    pub mesh: Handle<Mesh>,
    pub material: Handle<Material>,
    pub transform: Mat4,
}

/// Per-frame, read-only snapshot of everything the pass stack draws.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneRenderInfo {
    pub camera: CameraRenderInfo,
    /// Draw order is the snapshot order; the scene layer sorts.
    pub render_objects: Vec<RenderObjectInfo>,
    pub lights: Vec<LightRenderInfo>,
    /// Unset when the scene has no environment lighting.
    pub environment_map: Handle<EnvironmentMap>,
}

impl SceneRenderInfo {
    /// First directional light in snapshot order, if any. The shadow and
    /// deferred passes treat it as the sun.
    #[must_use]
    pub fn primary_directional_light(&self) -> Option<&LightRenderInfo> {
        self.lights
            .iter()
            .find(|light| light.kind == LightKind::Directional)
    }
}
