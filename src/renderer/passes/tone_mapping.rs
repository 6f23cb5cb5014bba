use crate::backend::{Attachment, CommandList};
use crate::errors::Result;
use crate::resources::descriptors::{
    DynamicCallDataDesc, Format, GraphicsPipelineDesc, RenderTargetDesc, SamplerDesc,
    SamplerFilter, ShaderStages,
};
use crate::resources::{GraphicsPipeline, Handle, Mesh, RenderTarget, ResourcePool};
use crate::scene::SceneRenderInfo;
use crate::settings::AppInfo;

use super::{RenderPass, create_fullscreen_triangle, fullscreen_layout};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ToneMapData {
    exposure: f32,
    gamma: f32,
}

/// Final HDR resolve: exposure scaling plus gamma correction into a
/// display-referred 8-bit target. Its output name is what the renderer
/// blits to the back buffer by default.
pub struct ToneMappingPass {
    pipeline: Handle<GraphicsPipeline>,
    quad_mesh: Handle<Mesh>,
    output: Handle<RenderTarget>,
    exposure: f32,
    gamma: f32,
}

impl ToneMappingPass {
    pub const OUTPUT: &'static str = "ToneMappingOutput";

    #[must_use]
    pub fn new() -> Self {
        Self {
            pipeline: Handle::UNSET,
            quad_mesh: Handle::UNSET,
            output: Handle::UNSET,
            exposure: 1.0,
            gamma: 2.2,
        }
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure.max(0.0);
    }

    pub fn set_gamma(&mut self, gamma: f32) {
        self.gamma = gamma.max(1e-3);
    }
}

impl Default for ToneMappingPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for ToneMappingPass {
    fn name(&self) -> &'static str {
        "Tone Mapping Pass"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[super::BloomPass::OUTPUT]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[Self::OUTPUT]
    }

    fn init(&mut self, info: &AppInfo, pool: &mut ResourcePool) -> Result<()> {
        self.pipeline = pool.create_graphics_pipeline(GraphicsPipelineDesc {
            vertex_shader_path: "shaders/tone_mapping".to_string(),
            pixel_shader_path: "shaders/tone_mapping".to_string(),
            vertex_layout: fullscreen_layout(),
            texture_visibilities: smallvec::smallvec![ShaderStages::PIXEL],
            sampler_descs: smallvec::smallvec![SamplerDesc::pixel(SamplerFilter::Point)],
            render_target_formats: smallvec::smallvec![Format::R8G8B8A8Unorm],
            dynamic_call_data: Some(DynamicCallDataDesc {
                slot: 0,
                size: std::mem::size_of::<ToneMapData>() as u32,
                visibility: ShaderStages::PIXEL,
            }),
            ..GraphicsPipelineDesc::default()
        })?;

        self.quad_mesh = create_fullscreen_triangle(pool)?;

        self.output = pool.create_named_render_target(
            RenderTargetDesc::single_color(info.width, info.height, Format::R8G8B8A8Unorm),
            Self::OUTPUT,
            true,
        )?;

        Ok(())
    }

    fn render(
        &self,
        _scene: &SceneRenderInfo,
        pool: &ResourcePool,
        cmd: &mut dyn CommandList,
    ) -> Result<()> {
        let input = pool.named_render_target(super::BloomPass::OUTPUT)?;
        let output = pool.render_target(self.output)?;
        let quad = pool.mesh(self.quad_mesh)?;

        let data = ToneMapData {
            exposure: self.exposure,
            gamma: self.gamma,
        };

        cmd.bind_graphics_pipeline(pool.graphics_pipeline(self.pipeline)?);
        cmd.bind_render_target(output);
        cmd.set_dynamic_call_data(bytemuck::bytes_of(&data));
        cmd.bind_target_texture(0, input, Attachment::Color(0));
        cmd.bind_vertex_buffer(&quad.vertex_buffer);
        cmd.bind_index_buffer(&quad.index_buffer);
        cmd.draw(quad.index_buffer.desc.num_indices);

        Ok(())
    }
}
