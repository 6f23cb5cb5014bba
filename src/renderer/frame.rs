//! Per-Frame Uniform Data
//!
//! [`FrameUniforms`] is the frame-global constant block every pass binds at
//! slot 0: camera matrices with their inverses, the primary directional
//! light, and the shadow-space projection derived from it. One instance
//! lives per in-flight back buffer (see
//! [`ResourcePool::write_frame_uniforms`]); the derivation itself is a pure
//! function of the scene snapshot, so identical input produces bit-identical
//! uniform contents.
//!
//! [`ResourcePool::write_frame_uniforms`]: crate::resources::ResourcePool::write_frame_uniforms

use glam::{Mat3, Mat4, Vec3};

use crate::scene::SceneRenderInfo;

/// Half-extent of the fixed world-space box the directional shadow map
/// covers, in world units.
const SHADOW_EXTENT: f32 = 30.0;
/// Near/far range of the shadow projection along the light direction.
const SHADOW_RANGE: f32 = 100.0;
/// How far the shadow origin is pulled back from the camera along the light.
const SHADOW_PULLBACK: f32 = 50.0;

/// Frame-global uniform block, uploaded once per frame into the slot
/// matching the current back-buffer index.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub inv_view: Mat4,
    pub projection: Mat4,
    pub inv_projection: Mat4,
    pub view_orientation: Mat4,
    pub inv_view_orientation: Mat4,
    pub shadow_projection: Mat4,
    pub inv_shadow_projection: Mat4,
    pub camera_position: Vec3,
    pub _pad0: f32,
    pub light_direction: Vec3,
    pub light_intensity: f32,
    pub light_color: Vec3,
    pub _pad1: f32,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            inv_view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            inv_projection: Mat4::IDENTITY,
            view_orientation: Mat4::IDENTITY,
            inv_view_orientation: Mat4::IDENTITY,
            shadow_projection: Mat4::IDENTITY,
            inv_shadow_projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            _pad0: 0.0,
            light_direction: Vec3::NEG_Z,
            light_intensity: 0.0,
            light_color: Vec3::ONE,
            _pad1: 0.0,
        }
    }
}

/// Derive the frame-global uniforms from the scene snapshot.
///
/// Pure: no clocks, no caches, no pool access. Calling it twice with the
/// same snapshot yields bit-identical results.
#[must_use]
pub fn build_frame_uniforms(scene: &SceneRenderInfo) -> FrameUniforms {
    let view = scene.camera.view;
    let inv_view = view.inverse();
    let projection = scene.camera.projection;

    let view_orientation = Mat4::from_mat3(Mat3::from_mat4(view));
    let camera_position = inv_view.w_axis.truncate();

    let mut uniforms = FrameUniforms {
        view,
        inv_view,
        projection,
        inv_projection: projection.inverse(),
        view_orientation,
        inv_view_orientation: view_orientation.inverse(),
        camera_position,
        ..FrameUniforms::default()
    };

    if let Some(light) = scene.primary_directional_light() {
        let (shadow_projection, direction) =
            directional_shadow_projection(light.transform, camera_position);
        uniforms.shadow_projection = shadow_projection;
        uniforms.inv_shadow_projection = shadow_projection.inverse();
        uniforms.light_direction = direction;
        uniforms.light_color = light.color;
        uniforms.light_intensity = light.intensity;
    }

    uniforms
}

/// Shadow-space projection for a directional light: a fixed world-space
/// ortho box oriented by the light's rotation and anchored near the camera.
///
/// Returns the combined projection and the normalized light direction.
#[must_use]
pub fn directional_shadow_projection(light_transform: Mat4, camera_position: Vec3) -> (Mat4, Vec3) {
    let rotation = Mat4::from_mat3(Mat3::from_mat4(light_transform));
    let direction = rotation
        .transform_vector3(Vec3::NEG_Z)
        .try_normalize()
        .unwrap_or(Vec3::NEG_Z);

    let origin = camera_position - direction * SHADOW_PULLBACK;
    let light_world = Mat4::from_translation(origin) * rotation;
    let projection = Mat4::orthographic_rh(
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        -SHADOW_RANGE,
        SHADOW_RANGE,
    ) * light_world.inverse();

    (projection, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{CameraRenderInfo, LightKind, LightRenderInfo};

    fn test_scene() -> SceneRenderInfo {
        SceneRenderInfo {
            camera: CameraRenderInfo {
                view: Mat4::look_at_rh(Vec3::new(0.0, 2.0, 4.0), Vec3::ZERO, Vec3::Y),
                projection: Mat4::perspective_rh(1.2, 1.5, 0.1, 100.0),
            },
            lights: vec![LightRenderInfo {
                kind: LightKind::Directional,
                color: Vec3::ONE,
                intensity: 1.0,
                transform: Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2),
            }],
            ..SceneRenderInfo::default()
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let scene = test_scene();
        let a = build_frame_uniforms(&scene);
        let b = build_frame_uniforms(&scene);
        assert_eq!(bytemuck::bytes_of(&a), bytemuck::bytes_of(&b));
    }

    #[test]
    fn test_camera_position_comes_from_inverse_view() {
        let uniforms = build_frame_uniforms(&test_scene());
        let expected = Vec3::new(0.0, 2.0, 4.0);
        assert!((uniforms.camera_position - expected).length() < 1e-4);
    }

    #[test]
    fn test_light_rotated_down_shines_down() {
        // Rotating -Z by -90° around X points the light along -Y.
        let (_, direction) = directional_shadow_projection(
            Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2),
            Vec3::ZERO,
        );
        assert!((direction - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_shadow_projection_centers_on_pullback_origin() {
        let (projection, direction) =
            directional_shadow_projection(Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2), Vec3::ZERO);
        // The point the box is anchored on projects to the NDC origin (z at
        // the ortho midpoint maps to 0.5 in glam's RH zero-to-one depth).
        let origin = Vec3::ZERO - direction * 50.0;
        let projected = projection.project_point3(origin);
        assert!(projected.x.abs() < 1e-4);
        assert!(projected.y.abs() < 1e-4);
    }

    #[test]
    fn test_scene_without_lights_keeps_identity_shadow() {
        let mut scene = test_scene();
        scene.lights.clear();
        let uniforms = build_frame_uniforms(&scene);
        assert_eq!(uniforms.shadow_projection, Mat4::IDENTITY);
        assert_eq!(uniforms.light_intensity, 0.0);
    }
}
