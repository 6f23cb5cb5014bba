//! Frame-recording benchmark: full canonical stack against the headless
//! backend, measuring the CPU cost of one orchestrated frame.

use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use ember::backend::HeadlessDevice;
use ember::passes::{
    BloomPass, DeferredPbrPass, FxaaPass, GeometryPass, ShadowPass, ToneMappingPass,
};
use ember::scene::{CameraRenderInfo, LightKind, LightRenderInfo};
use ember::{AppInfo, Renderer, SceneRenderInfo};
use glam::{Mat4, Vec3};

fn build_renderer() -> Renderer {
    let info = AppInfo {
        width: 1920,
        height: 1080,
        ..AppInfo::default()
    };
    let device = Arc::new(HeadlessDevice::new(info.width, info.height, info.num_back_buffers));
    let mut renderer = Renderer::new(info, device).unwrap();

    let stack = [
        renderer.add_pass(Box::new(ShadowPass::new())),
        renderer.add_pass(Box::new(GeometryPass::new())),
        renderer.add_pass(Box::new(DeferredPbrPass::new())),
        renderer.add_pass(Box::new(FxaaPass::new())),
        renderer.add_pass(Box::new(BloomPass::new())),
        renderer.add_pass(Box::new(ToneMappingPass::new())),
    ];
    renderer.configure_stack(&stack).unwrap();
    renderer
}

fn bench_render_scene(c: &mut Criterion) {
    let mut renderer = build_renderer();
    let scene = SceneRenderInfo {
        camera: CameraRenderInfo {
            view: Mat4::look_at_rh(Vec3::new(0.0, 2.0, 4.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0),
        },
        lights: vec![LightRenderInfo {
            kind: LightKind::Directional,
            color: Vec3::ONE,
            intensity: 1.0,
            transform: Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2),
        }],
        ..SceneRenderInfo::default()
    };

    c.bench_function("render_scene_canonical_stack", |b| {
        b.iter(|| renderer.render_scene(std::hint::black_box(&scene)).unwrap());
    });
}

criterion_group!(benches, bench_render_scene);
criterion_main!(benches);
