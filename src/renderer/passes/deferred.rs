//! Deferred PBR Lighting Pass
//!
//! Fullscreen lighting resolve: consumes the G-buffer and the shadow map by
//! name, applies the primary directional light and image-based lighting from
//! the scene's environment map, and writes the lit HDR color under `"Lit"`.

use crate::backend::{Attachment, CommandList};
use crate::errors::Result;
use crate::resources::descriptors::{
    Format, GraphicsPipelineDesc, RenderTargetDesc, SamplerDesc, SamplerFilter, ShaderStages,
};
use crate::resources::{GraphicsPipeline, Handle, Mesh, RenderTarget, ResourcePool};
use crate::scene::SceneRenderInfo;
use crate::settings::AppInfo;

use super::{RenderPass, create_fullscreen_triangle, fullscreen_layout};

#[derive(Default)]
pub struct DeferredPbrPass {
    pipeline: Handle<GraphicsPipeline>,
    quad_mesh: Handle<Mesh>,
    output: Handle<RenderTarget>,
}

impl DeferredPbrPass {
    pub const OUTPUT: &'static str = "Lit";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderPass for DeferredPbrPass {
    fn name(&self) -> &'static str {
        "Deferred PBR Pass"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[super::GeometryPass::OUTPUT, super::ShadowPass::OUTPUT]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[Self::OUTPUT]
    }

    fn init(&mut self, info: &AppInfo, pool: &mut ResourcePool) -> Result<()> {
        self.pipeline = pool.create_graphics_pipeline(GraphicsPipelineDesc {
            vertex_shader_path: "shaders/deferred_pbr".to_string(),
            pixel_shader_path: "shaders/deferred_pbr".to_string(),
            vertex_layout: fullscreen_layout(),
            constant_buffer_visibilities: smallvec::smallvec![ShaderStages::ALL],
            // 5 G-buffer attachments, shadow depth, irradiance, specular
            texture_visibilities: smallvec::smallvec![ShaderStages::PIXEL; 8],
            sampler_descs: smallvec::smallvec![
                SamplerDesc::pixel(SamplerFilter::Linear),
                SamplerDesc::pixel(SamplerFilter::Point),
            ],
            render_target_formats: smallvec::smallvec![Format::R32G32B32A32Float],
            ..GraphicsPipelineDesc::default()
        })?;

        self.quad_mesh = create_fullscreen_triangle(pool)?;

        self.output = pool.create_named_render_target(
            RenderTargetDesc::single_color(info.width, info.height, Format::R32G32B32A32Float),
            Self::OUTPUT,
            true,
        )?;

        Ok(())
    }

    fn render(
        &self,
        scene: &SceneRenderInfo,
        pool: &ResourcePool,
        cmd: &mut dyn CommandList,
    ) -> Result<()> {
        let gbuffer = pool.named_render_target(super::GeometryPass::OUTPUT)?;
        let shadow_map = pool.named_render_target(super::ShadowPass::OUTPUT)?;
        let output = pool.render_target(self.output)?;
        let quad = pool.mesh(self.quad_mesh)?;

        cmd.clear_render_target(output);
        cmd.bind_graphics_pipeline(pool.graphics_pipeline(self.pipeline)?);
        cmd.bind_render_target(output);
        cmd.bind_constant_buffer(0, pool.current_frame_buffer());

        for attachment in 0..gbuffer.desc.num_render_targets {
            cmd.bind_target_texture(attachment, gbuffer, Attachment::Color(attachment as u8));
        }
        cmd.bind_target_texture(5, shadow_map, Attachment::Depth);

        if !scene.environment_map.is_unset() {
            let environment = pool.environment_map(scene.environment_map)?;
            cmd.bind_texture(
                6,
                pool.texture_or_fallback(environment.desc.irradiance_texture),
            );
            cmd.bind_texture(
                7,
                pool.texture_or_fallback(environment.desc.specular_texture),
            );
        }

        cmd.bind_vertex_buffer(&quad.vertex_buffer);
        cmd.bind_index_buffer(&quad.index_buffer);
        cmd.draw(quad.index_buffer.desc.num_indices);

        Ok(())
    }
}
