//! Pass Stack Orchestration Tests
//!
//! Tests for:
//! - Named-target resolution order across a configured pass stack
//! - Pre-flight stack validation against declared reads/writes
//! - The canonical Shadow → Geometry → DeferredPBR → FXAA → Bloom →
//!   ToneMapping frame, end to end against the recording backend
//! - Frame-uniform idempotence across identical frames
//! - Resize re-registration semantics

use std::sync::Arc;

use ember::backend::{Command, CommandList, HeadlessDevice};
use ember::passes::{
    BloomPass, DeferredPbrPass, FxaaPass, GeometryPass, RenderPass, ShadowPass, ToneMappingPass,
};
use ember::resources::{
    Format, IndexBufferDesc, RenderTargetDesc, ResourcePool, VertexAttribute, VertexBufferDesc,
    VertexLayout, mip_count,
};
use ember::scene::{CameraRenderInfo, LightKind, LightRenderInfo, RenderObjectInfo};
use ember::{AppInfo, PassId, RenderError, Renderer, Result, SceneRenderInfo};
use glam::{Mat4, Vec3};

const WIDTH: u32 = 900;
const HEIGHT: u32 = 600;

fn build_renderer() -> (Renderer, Arc<HeadlessDevice>) {
    let info = AppInfo {
        width: WIDTH,
        height: HEIGHT,
        ..AppInfo::default()
    };
    let device = Arc::new(HeadlessDevice::new(WIDTH, HEIGHT, info.num_back_buffers));
    let device_handle: Arc<dyn ember::Device> = device.clone();
    let renderer = Renderer::new(info, device_handle).unwrap();
    (renderer, device)
}

fn configure_canonical_stack(renderer: &mut Renderer) -> Vec<PassId> {
    let stack = vec![
        renderer.add_pass(Box::new(ShadowPass::new())),
        renderer.add_pass(Box::new(GeometryPass::new())),
        renderer.add_pass(Box::new(DeferredPbrPass::new())),
        renderer.add_pass(Box::new(FxaaPass::new())),
        renderer.add_pass(Box::new(BloomPass::new())),
        renderer.add_pass(Box::new(ToneMappingPass::new())),
    ];
    renderer.configure_stack(&stack).unwrap();
    stack
}

/// One mesh at identity transform, one white directional light at unit
/// intensity: the smallest scene the canonical stack fully exercises.
fn single_mesh_scene(renderer: &mut Renderer) -> SceneRenderInfo {
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

    let mesh = pool
        .create_mesh(
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
        )
        .unwrap();
    let material = pool.create_material(ember::resources::MaterialDesc {
        base_color_factor: [1.0; 4],
        roughness_factor: 1.0,
        ..ember::resources::MaterialDesc::default()
    })
    .unwrap();

    SceneRenderInfo {
        camera: CameraRenderInfo {
            view: Mat4::look_at_rh(Vec3::new(0.0, 2.0, 4.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(1.0, WIDTH as f32 / HEIGHT as f32, 0.1, 100.0),
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
    }
}

// ============================================================================
// Toy passes for ordering scenarios
// ============================================================================

/// Registers `"X"` during its setup and draws nothing.
struct ProducerPass;

impl RenderPass for ProducerPass {
    fn name(&self) -> &'static str {
        "Producer"
    }

    fn writes(&self) -> &'static [&'static str] {
        &["X"]
    }

    fn init(&mut self, info: &AppInfo, pool: &mut ResourcePool) -> Result<()> {
        pool.create_named_render_target(
            RenderTargetDesc::single_color(info.width, info.height, Format::R32G32B32A32Float),
            "X",
            true,
        )?;
        Ok(())
    }

    fn render(
        &self,
        _scene: &SceneRenderInfo,
        _pool: &ResourcePool,
        _cmd: &mut dyn CommandList,
    ) -> Result<()> {
        Ok(())
    }
}

/// Resolves `"X"` every frame.
struct ConsumerPass;

impl RenderPass for ConsumerPass {
    fn name(&self) -> &'static str {
        "Consumer"
    }

    fn reads(&self) -> &'static [&'static str] {
        &["X"]
    }

    fn init(&mut self, _info: &AppInfo, _pool: &mut ResourcePool) -> Result<()> {
        Ok(())
    }

    fn render(
        &self,
        _scene: &SceneRenderInfo,
        pool: &ResourcePool,
        _cmd: &mut dyn CommandList,
    ) -> Result<()> {
        pool.named_render_target("X")?;
        Ok(())
    }
}

/// Neither reads nor writes any name.
struct NeutralPass;

impl RenderPass for NeutralPass {
    fn name(&self) -> &'static str {
        "Neutral"
    }

    fn init(&mut self, _info: &AppInfo, _pool: &mut ResourcePool) -> Result<()> {
        Ok(())
    }

    fn render(
        &self,
        _scene: &SceneRenderInfo,
        _pool: &ResourcePool,
        _cmd: &mut dyn CommandList,
    ) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn stack_in_registration_order_succeeds() {
    let (mut renderer, device) = build_renderer();
    let a = renderer.add_pass(Box::new(NeutralPass));
    let b = renderer.add_pass(Box::new(ProducerPass));
    let c = renderer.add_pass(Box::new(ConsumerPass));
    renderer.configure_stack(&[a, b, c]).unwrap();
    renderer.set_present_source("X");

    renderer.render_scene(&SceneRenderInfo::default()).unwrap();
    assert_eq!(device.submitted_frames().len(), 1);
}

#[test]
fn consumer_ordered_before_producer_fails_and_submits_nothing() {
    let (mut renderer, device) = build_renderer();
    let a = renderer.add_pass(Box::new(NeutralPass));
    let b = renderer.add_pass(Box::new(ProducerPass));
    let c = renderer.add_pass(Box::new(ConsumerPass));
    renderer.configure_stack(&[c, a, b]).unwrap();
    renderer.set_present_source("X");

    let err = renderer.render_scene(&SceneRenderInfo::default()).unwrap_err();
    match err {
        RenderError::UnknownTargetName(name) => assert!(name.starts_with('X'), "got {name:?}"),
        other => panic!("expected UnknownTargetName, got {other:?}"),
    }
    // The frame was aborted before submission: no half-recorded command list
    // reaches the device.
    assert!(device.submitted_frames().is_empty());
}

#[test]
fn validation_rejects_misordered_stack_before_first_frame() {
    let (mut renderer, _) = build_renderer();
    let a = renderer.add_pass(Box::new(NeutralPass));
    let b = renderer.add_pass(Box::new(ProducerPass));
    let c = renderer.add_pass(Box::new(ConsumerPass));

    renderer.configure_stack(&[a, b, c]).unwrap();
    assert!(renderer.validate_stack().is_ok());

    renderer.configure_stack(&[c, a, b]).unwrap();
    assert!(matches!(
        renderer.validate_stack(),
        Err(RenderError::UnknownTargetName(_))
    ));
}

#[test]
fn validation_accepts_canonical_stack_and_rejects_swapped_post_chain() {
    let (mut renderer, _) = build_renderer();
    let stack = configure_canonical_stack(&mut renderer);
    assert!(renderer.validate_stack().is_ok());

    // Bloom reads the FXAA output; swapping the two must fail pre-flight.
    let mut swapped = stack.clone();
    swapped.swap(3, 4);
    renderer.configure_stack(&swapped).unwrap();
    assert!(matches!(
        renderer.validate_stack(),
        Err(RenderError::UnknownTargetName(_))
    ));
}

// ============================================================================
// End-to-end canonical stack
// ============================================================================

#[test]
fn canonical_stack_renders_and_registers_every_stage_output() {
    let (mut renderer, device) = build_renderer();
    configure_canonical_stack(&mut renderer);
    let scene = single_mesh_scene(&mut renderer);

    renderer.validate_stack().unwrap();
    renderer.render_scene(&scene).unwrap();

    for name in [
        ShadowPass::OUTPUT,
        GeometryPass::OUTPUT,
        DeferredPbrPass::OUTPUT,
        FxaaPass::OUTPUT,
        BloomPass::OUTPUT,
        ToneMappingPass::OUTPUT,
    ] {
        assert!(
            renderer.resources().render_target_handle(name).is_ok(),
            "stage output {name:?} was not registered"
        );
    }

    let frame = device.last_frame().expect("one frame submitted");
    assert!(!frame.is_empty());

    // The frame ends with the presentation blit of the tone-mapped output.
    assert!(matches!(frame.last(), Some(Command::Draw { index_count: 3 })));
}

#[test]
fn canonical_stack_issues_expected_draws_and_dispatches() {
    let (mut renderer, device) = build_renderer();
    configure_canonical_stack(&mut renderer);
    let scene = single_mesh_scene(&mut renderer);
    renderer.render_scene(&scene).unwrap();

    let frame = device.last_frame().unwrap();
    let draws = frame
        .iter()
        .filter(|command| matches!(command, Command::Draw { .. }))
        .count();
    let dispatches = frame
        .iter()
        .filter(|command| matches!(command, Command::Dispatch { .. }))
        .count();

    // Draws: shadow object + geometry object + deferred resolve +
    // tone-mapping resolve + presentation blit. (The environment cube is
    // skipped since the scene carries no environment map.)
    assert_eq!(draws, 5);

    // Dispatches: one FXAA, then bloom's threshold + composite and
    // `mip_count - 1` transitions in each chain direction.
    let bloom_dispatches = 2 * mip_count(WIDTH, HEIGHT) as usize;
    assert_eq!(dispatches, 1 + bloom_dispatches);
}

#[test]
fn missing_present_source_aborts_the_frame() {
    let (mut renderer, device) = build_renderer();
    // Empty stack: nothing registers the tone-mapping output the blit needs.
    let err = renderer.render_scene(&SceneRenderInfo::default()).unwrap_err();
    assert!(matches!(err, RenderError::UnknownTargetName(_)));
    assert!(device.submitted_frames().is_empty());
}

// ============================================================================
// Uniform idempotence
// ============================================================================

#[test]
fn identical_frames_produce_bit_identical_uniforms() {
    let (mut renderer, device) = build_renderer();
    configure_canonical_stack(&mut renderer);
    let scene = single_mesh_scene(&mut renderer);

    renderer.render_scene(&scene).unwrap(); // writes slot 0
    renderer.render_scene(&scene).unwrap(); // writes slot 1

    let pool = renderer.resources();
    assert_eq!(
        bytemuck::bytes_of(pool.frame_uniforms(0)),
        bytemuck::bytes_of(pool.frame_uniforms(1)),
    );

    // The backend saw the same bytes in both uniform slots too.
    let slot0 = device.buffer_contents(pool.frame_buffer(0).raw).unwrap();
    let slot1 = device.buffer_contents(pool.frame_buffer(1).raw).unwrap();
    assert_eq!(slot0, slot1);
    assert_eq!(slot0, bytemuck::bytes_of(&ember::build_frame_uniforms(&scene)));
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn resize_reregisters_names_with_new_dimensions() {
    let (mut renderer, _) = build_renderer();
    configure_canonical_stack(&mut renderer);
    let scene = single_mesh_scene(&mut renderer);
    renderer.render_scene(&scene).unwrap();

    let gbuffer = renderer.resources().named_render_target(GeometryPass::OUTPUT).unwrap();
    assert_eq!((gbuffer.desc.width, gbuffer.desc.height), (WIDTH, HEIGHT));

    renderer.resize(1280, 720).unwrap();

    // Same names, new dimensions: later passes resolve the new targets.
    for name in [
        GeometryPass::OUTPUT,
        DeferredPbrPass::OUTPUT,
        FxaaPass::OUTPUT,
        BloomPass::OUTPUT,
        ToneMappingPass::OUTPUT,
    ] {
        let target = renderer.resources().named_render_target(name).unwrap();
        assert_eq!(
            (target.desc.width, target.desc.height),
            (1280, 720),
            "{name:?} still has stale dimensions"
        );
    }

    // The shadow map resolution is independent of the presentation size.
    let shadow = renderer.resources().named_render_target(ShadowPass::OUTPUT).unwrap();
    assert_eq!((shadow.desc.width, shadow.desc.height), (4096, 4096));

    renderer.render_scene(&scene).unwrap();
}
