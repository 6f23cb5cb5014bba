//! Minimal host application: build the canonical pass stack, feed it a tiny
//! scene, and run a few frames against the headless backend, printing what
//! each frame recorded.

use std::sync::Arc;

use ember::backend::HeadlessDevice;
use ember::passes::{
    BloomPass, DeferredPbrPass, FxaaPass, GeometryPass, ShadowPass, ToneMappingPass,
};
use ember::resources::{Format, IndexBufferDesc, VertexAttribute, VertexBufferDesc, VertexLayout};
use ember::scene::{CameraRenderInfo, LightKind, LightRenderInfo, RenderObjectInfo};
use ember::{AppInfo, Renderer, SceneRenderInfo};
use glam::{Mat4, Vec3};

fn main() -> ember::Result<()> {
    env_logger::init();

    let info = AppInfo {
        name: "Ember Frame Loop".to_string(),
        width: 900,
        height: 600,
        num_back_buffers: 2,
    };
    let device = Arc::new(HeadlessDevice::new(info.width, info.height, info.num_back_buffers));
    let device_handle: Arc<dyn ember::Device> = device.clone();
    let mut renderer = Renderer::new(info, device_handle)?;

    let stack = [
        renderer.add_pass(Box::new(ShadowPass::new())),
        renderer.add_pass(Box::new(GeometryPass::new())),
        renderer.add_pass(Box::new(DeferredPbrPass::new())),
        renderer.add_pass(Box::new(FxaaPass::new())),
        renderer.add_pass(Box::new(BloomPass::new())),
        renderer.add_pass(Box::new(ToneMappingPass::new())),
    ];
    renderer.configure_stack(&stack)?;
    renderer.validate_stack()?;

    // A single triangle with the standard object vertex layout.
    let pool = renderer.resources_mut();
    let layout = VertexLayout::new(&[
        VertexAttribute {
            format: Format::R32G32B32Float,
            semantic: "POSITION",
        },
        VertexAttribute {
            format: Format::R32G32B32Float,
            semantic: "NORMAL",
        },
        VertexAttribute {
            format: Format::R32G32B32Float,
            semantic: "TANGENT",
        },
        VertexAttribute {
            format: Format::R32G32Float,
            semantic: "TEXCOORD",
        },
    ]);
    let floats_per_vertex = (layout.stride() / 4) as usize;
    let vertices = vec![0.0f32; floats_per_vertex * 3];
    let indices = [0u16, 1, 2];
    let mesh = pool.create_mesh(
        VertexBufferDesc {
            layout,
            num_vertices: 3,
        },
        bytemuck::cast_slice(&vertices),
        IndexBufferDesc {
            format: Format::R16Uint,
            num_indices: 3,
        },
        bytemuck::cast_slice(&indices),
    )?;
    let material = pool.create_material(ember::resources::MaterialDesc {
        base_color_factor: [1.0, 1.0, 1.0, 1.0],
        roughness_factor: 0.8,
        ..ember::resources::MaterialDesc::default()
    })?;

    let mut scene = SceneRenderInfo {
        camera: CameraRenderInfo {
            view: Mat4::look_at_rh(Vec3::new(0.0, 2.0, 4.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0),
        },
        render_objects: vec![RenderObjectInfo {
            mesh,
            material,
            transform: Mat4::IDENTITY,
        }],
        lights: vec![LightRenderInfo {
            kind: LightKind::Directional,
            color: Vec3::ONE,
            intensity: 1.0,
            transform: Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2),
        }],
        ..SceneRenderInfo::default()
    };

    for frame in 0..3 {
        // Spin the object a little so every frame uploads fresh uniforms.
        scene.render_objects[0].transform = Mat4::from_rotation_y(frame as f32 * 0.3);
        renderer.render_scene(&scene)?;

        let commands = device.last_frame().expect("frame was submitted");
        println!("frame {frame}: {} commands recorded", commands.len());
    }

    println!(
        "shared targets: {:?}",
        renderer.resources().shared_target_names().collect::<Vec<_>>()
    );

    Ok(())
}
