use crate::backend::{Attachment, CommandList};
use crate::errors::Result;
use crate::resources::descriptors::{
    ComputePipelineDesc, DynamicCallDataDesc, Format, RenderTargetDesc, SamplerDesc,
    SamplerFilter, ShaderStages,
};
use crate::resources::{ComputePipeline, Handle, RenderTarget, ResourcePool};
use crate::scene::SceneRenderInfo;
use crate::settings::AppInfo;

use super::{RenderPass, compute_grid};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct FxaaData {
    width: u32,
    height: u32,
}

/// Fast approximate anti-aliasing over the lit HDR color, one compute
/// dispatch per frame.
#[derive(Default)]
pub struct FxaaPass {
    pipeline: Handle<ComputePipeline>,
    output: Handle<RenderTarget>,
    extent: (u32, u32),
}

impl FxaaPass {
    pub const OUTPUT: &'static str = "FXAAOutput";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderPass for FxaaPass {
    fn name(&self) -> &'static str {
        "FXAA Pass"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[super::DeferredPbrPass::OUTPUT]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[Self::OUTPUT]
    }

    fn init(&mut self, info: &AppInfo, pool: &mut ResourcePool) -> Result<()> {
        self.pipeline = pool.create_compute_pipeline(ComputePipelineDesc {
            shader_path: "shaders/fxaa".to_string(),
            dynamic_call_data: Some(DynamicCallDataDesc {
                slot: 0,
                size: std::mem::size_of::<FxaaData>() as u32,
                visibility: ShaderStages::COMPUTE,
            }),
            sampler_descs: smallvec::smallvec![SamplerDesc {
                visibility: ShaderStages::COMPUTE,
                filter: SamplerFilter::Linear,
                ..SamplerDesc::default()
            }],
            num_textures: 1,
            num_uavs: 1,
            ..ComputePipelineDesc::default()
        })?;

        self.output = pool.create_named_render_target(
            RenderTargetDesc::single_color(info.width, info.height, Format::R32G32B32A32Float),
            Self::OUTPUT,
            true,
        )?;
        self.extent = (info.width, info.height);

        Ok(())
    }

    fn render(
        &self,
        _scene: &SceneRenderInfo,
        pool: &ResourcePool,
        cmd: &mut dyn CommandList,
    ) -> Result<()> {
        let input = pool.named_render_target(super::DeferredPbrPass::OUTPUT)?;
        let output = pool.render_target(self.output)?;

        let data = FxaaData {
            width: self.extent.0,
            height: self.extent.1,
        };

        cmd.bind_compute_pipeline(pool.compute_pipeline(self.pipeline)?);
        cmd.set_dynamic_call_data(bytemuck::bytes_of(&data));
        cmd.bind_target_texture(0, input, Attachment::Color(0));
        cmd.bind_rw_target_texture(0, output, Attachment::Color(0));
        cmd.dispatch(compute_grid(self.extent.0), compute_grid(self.extent.1), 1);

        Ok(())
    }
}
