//! Renderer: Per-Frame Driver
//!
//! Owns the pass registry and the active pass stack, uploads the per-frame
//! uniforms, drives sequential pass execution, and composites the final
//! named target onto the presentation target.
//!
//! # Frame anatomy
//!
//! 1. Select the uniform slot matching the device's back-buffer index and
//!    overwrite it with matrices derived from the scene snapshot.
//! 2. Open one command recording scope for the whole frame.
//! 3. Run every configured pass, strictly in stack order. A pass's one-time
//!    setup runs right before its first execution, so registration order
//!    follows stack order: a pass can only resolve names that
//!    earlier-ordered passes have published.
//! 4. Resolve the present-source name and blit it fullscreen onto the back
//!    buffer with a fixed pass-through pipeline.
//! 5. Composite the debug overlay, if one is installed.
//! 6. Submit and request presentation.
//!
//! A pass failing to resolve a named input aborts the frame: the command
//! list is dropped without being submitted and the error names the violated
//! target.

pub mod frame;
pub mod passes;

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::backend::{Attachment, Device};
use crate::errors::{RenderError, Result};
use crate::resources::descriptors::{
    Format, GraphicsPipelineDesc, SamplerDesc, SamplerFilter, ShaderStages,
};
use crate::resources::{GraphicsPipeline, Handle, Mesh, ResourcePool};
use crate::scene::SceneRenderInfo;
use crate::settings::AppInfo;

use self::passes::{RenderPass, ToneMappingPass};

/// Identifier of a pass in the renderer's registry. Only the renderer that
/// issued it can interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(usize);

/// Registry entry: the owned pass plus its lifecycle state
/// (`Uninitialized → Initialized`).
struct PassSlot {
    pass: Box<dyn RenderPass>,
    initialized: bool,
}

pub struct Renderer {
    device: Arc<dyn Device>,
    pool: ResourcePool,
    info: AppInfo,

    /// Authoritative owner of every added pass, in creation order.
    passes: Vec<PassSlot>,
    /// Active execution order: indices into `passes`.
    stack: Vec<PassId>,

    /// Optional overlay composited onto the back buffer after the blit.
    overlay: Option<Box<dyn RenderPass>>,

    /// Named target resolved for the final blit.
    present_source: String,

    blit_pipeline: Handle<GraphicsPipeline>,
    blit_mesh: Handle<Mesh>,
}

impl Renderer {
    /// Creates the renderer, its resource pool, and the presentation blit
    /// resources.
    pub fn new(info: AppInfo, device: Arc<dyn Device>) -> Result<Self> {
        if info.num_back_buffers != info.back_buffer_count() {
            log::warn!(
                "Requested {} back buffers, clamped to {}",
                info.num_back_buffers,
                info.back_buffer_count(),
            );
        }

        let mut pool = ResourcePool::new(Arc::clone(&device), &info)?;

        let blit_pipeline = pool.create_graphics_pipeline(GraphicsPipelineDesc {
            vertex_shader_path: "shaders/fullscreen_texture".to_string(),
            pixel_shader_path: "shaders/fullscreen_texture".to_string(),
            vertex_layout: passes::fullscreen_layout(),
            texture_visibilities: smallvec::smallvec![ShaderStages::PIXEL],
            sampler_descs: smallvec::smallvec![SamplerDesc::pixel(SamplerFilter::Point)],
            render_target_formats: smallvec::smallvec![Format::R8G8B8A8Unorm],
            ..GraphicsPipelineDesc::default()
        })?;
        let blit_mesh = passes::create_fullscreen_triangle(&mut pool)?;

        Ok(Self {
            device,
            pool,
            info,
            passes: Vec::new(),
            stack: Vec::new(),
            overlay: None,
            present_source: ToneMappingPass::OUTPUT.to_string(),
            blit_pipeline,
            blit_mesh,
        })
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Register a pass with the renderer, which owns it from here on. Setup
    /// is deferred until the pass first executes, so output names appear in
    /// the registry in stack order rather than registration order.
    pub fn add_pass(&mut self, pass: Box<dyn RenderPass>) -> PassId {
        self.passes.push(PassSlot {
            pass,
            initialized: false,
        });
        PassId(self.passes.len() - 1)
    }

    /// Replace the active stack wholesale. The only supported way to change
    /// pipeline topology; call it before the frame loop starts.
    pub fn configure_stack(&mut self, stack: &[PassId]) -> Result<()> {
        for id in stack {
            if id.0 >= self.passes.len() {
                return Err(RenderError::InvalidHandle {
                    kind: "render pass",
                    index: id.0 as u32,
                });
            }
        }
        self.stack = stack.to_vec();
        Ok(())
    }

    /// Pre-flight check of the configured stack: every declared read must be
    /// preceded by a declared write of the same name. Catches misordered
    /// stacks before the first frame instead of in the middle of it.
    pub fn validate_stack(&self) -> Result<()> {
        let mut written: FxHashSet<&str> = FxHashSet::default();
        for id in &self.stack {
            let pass = &self.passes[id.0].pass;
            for read in pass.reads() {
                if !written.contains(read) {
                    return Err(RenderError::UnknownTargetName(format!(
                        "{read} (read by {} before any pass writes it)",
                        pass.name()
                    )));
                }
            }
            written.extend(pass.writes());
        }
        Ok(())
    }

    /// Install the overlay composited after the final blit.
    pub fn set_debug_overlay(&mut self, mut overlay: Box<dyn RenderPass>) -> Result<()> {
        overlay.init(&self.info, &mut self.pool)?;
        self.overlay = Some(overlay);
        Ok(())
    }

    /// Name of the target blitted to the back buffer each frame. Defaults to
    /// the tone-mapping output.
    pub fn set_present_source(&mut self, name: impl Into<String>) {
        self.present_source = name.into();
    }

    /// Re-run setup for every initialized pass against new presentation
    /// dimensions. Passes re-register their named targets in place; later
    /// passes then resolve the re-created targets.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.info.width = width;
        self.info.height = height;
        for slot in &mut self.passes {
            if slot.initialized {
                slot.pass.init(&self.info, &mut self.pool)?;
            }
        }
        if let Some(overlay) = &mut self.overlay {
            overlay.init(&self.info, &mut self.pool)?;
        }
        log::info!("Renderer resized to {width}x{height}");
        Ok(())
    }

    // ========================================================================
    // Frame Driver
    // ========================================================================

    /// Record and submit one frame from the scene snapshot.
    pub fn render_scene(&mut self, scene: &SceneRenderInfo) -> Result<()> {
        let slot = self.device.current_backbuffer_index();
        let uniforms = frame::build_frame_uniforms(scene);
        self.pool.write_frame_uniforms(slot, &uniforms);

        let mut cmd = self.device.create_command_list();

        for position in 0..self.stack.len() {
            let id = self.stack[position];
            let entry = &mut self.passes[id.0];
            if !entry.initialized {
                entry.pass.init(&self.info, &mut self.pool)?;
                entry.initialized = true;
                log::info!("Initialized render pass: {}", entry.pass.name());
            }
            entry.pass.render(scene, &self.pool, cmd.as_mut())?;
        }

        // Blit the final pass output onto the back buffer.
        let source = self.pool.named_render_target(&self.present_source)?;
        let backbuffer = self.device.current_backbuffer();

        cmd.bind_graphics_pipeline(self.pool.graphics_pipeline(self.blit_pipeline)?);
        let blit_mesh = self.pool.mesh(self.blit_mesh)?;
        cmd.bind_vertex_buffer(&blit_mesh.vertex_buffer);
        cmd.bind_index_buffer(&blit_mesh.index_buffer);
        cmd.bind_target_texture(0, source, Attachment::Color(0));
        cmd.bind_render_target(&backbuffer);
        cmd.draw(blit_mesh.index_buffer.desc.num_indices);

        if let Some(overlay) = &self.overlay {
            cmd.bind_render_target(&backbuffer);
            overlay.render(scene, &self.pool, cmd.as_mut())?;
        }

        self.device.submit_and_present(cmd)
    }

    // ========================================================================
    // Access
    // ========================================================================

    #[must_use]
    pub fn resources(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn resources_mut(&mut self) -> &mut ResourcePool {
        &mut self.pool
    }

    #[must_use]
    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    #[must_use]
    pub fn app_info(&self) -> &AppInfo {
        &self.info
    }
}
