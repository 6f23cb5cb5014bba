//! Geometry (G-Buffer) Pass
//!
//! Fills the deferred G-buffer: albedo, normal, position, emissive, and
//! metallic/roughness/occlusion, each in its own color attachment, plus
//! depth. Before the objects are drawn, the scene's environment cubemap is
//! rendered as the background so that later passes see sky pixels where
//! no geometry covers the frame.

use glam::Mat4;

use crate::backend::CommandList;
use crate::errors::Result;
use crate::resources::descriptors::{
    DynamicCallDataDesc, Format, GraphicsPipelineDesc, RenderTargetDesc, SamplerDesc,
    SamplerFilter, ShaderStages, WindingOrder,
};
use crate::resources::{GraphicsPipeline, Handle, Mesh, RenderTarget, ResourcePool};
use crate::scene::SceneRenderInfo;
use crate::settings::AppInfo;

use super::{RenderPass, create_unit_cube, object_layout, position_layout};

/// Number of G-buffer color attachments.
const GBUFFER_ATTACHMENTS: u32 = 5;

#[derive(Default)]
pub struct GeometryPass {
    gbuffer_pipeline: Handle<GraphicsPipeline>,
    cubemap_pipeline: Handle<GraphicsPipeline>,
    cube_mesh: Handle<Mesh>,
    output: Handle<RenderTarget>,
}

impl GeometryPass {
    pub const OUTPUT: &'static str = "GBuffer";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderPass for GeometryPass {
    fn name(&self) -> &'static str {
        "Geometry Pass"
    }

    fn writes(&self) -> &'static [&'static str] {
        &[Self::OUTPUT]
    }

    fn init(&mut self, info: &AppInfo, pool: &mut ResourcePool) -> Result<()> {
        let gbuffer_formats: smallvec::SmallVec<[Format; 8]> =
            smallvec::smallvec![Format::R32G32B32A32Float; GBUFFER_ATTACHMENTS as usize];

        self.gbuffer_pipeline = pool.create_graphics_pipeline(GraphicsPipelineDesc {
            vertex_shader_path: "shaders/gbuffer".to_string(),
            pixel_shader_path: "shaders/gbuffer".to_string(),
            vertex_layout: object_layout(),
            constant_buffer_visibilities: smallvec::smallvec![
                ShaderStages::ALL,   // frame uniforms
                ShaderStages::PIXEL, // material constants
            ],
            texture_visibilities: smallvec::smallvec![ShaderStages::PIXEL; 5],
            sampler_descs: smallvec::smallvec![
                SamplerDesc::pixel(SamplerFilter::Linear),
                SamplerDesc::pixel(SamplerFilter::Point),
            ],
            render_target_formats: gbuffer_formats.clone(),
            depth_format: Some(Format::R32Float),
            winding_order: WindingOrder::CounterClockwise,
            dynamic_call_data: Some(DynamicCallDataDesc {
                slot: 2,
                size: std::mem::size_of::<Mat4>() as u32,
                visibility: ShaderStages::VERTEX,
            }),
            ..GraphicsPipelineDesc::default()
        })?;

        self.cubemap_pipeline = pool.create_graphics_pipeline(GraphicsPipelineDesc {
            vertex_shader_path: "shaders/cubemap".to_string(),
            pixel_shader_path: "shaders/cubemap".to_string(),
            vertex_layout: position_layout(),
            constant_buffer_visibilities: smallvec::smallvec![ShaderStages::ALL],
            texture_visibilities: smallvec::smallvec![ShaderStages::PIXEL],
            sampler_descs: smallvec::smallvec![SamplerDesc::pixel(SamplerFilter::Linear)],
            render_target_formats: gbuffer_formats.clone(),
            depth_format: Some(Format::R32Float),
            ..GraphicsPipelineDesc::default()
        })?;

        self.cube_mesh = create_unit_cube(pool)?;

        self.output = pool.create_named_render_target(
            RenderTargetDesc {
                width: info.width,
                height: info.height,
                num_render_targets: GBUFFER_ATTACHMENTS,
                formats: gbuffer_formats,
                clear_colors: smallvec::smallvec![[0.0; 4]; GBUFFER_ATTACHMENTS as usize],
                allow_depth_stencil: true,
                depth_format: Format::R32Float,
                depth_clear_value: 1.0,
            },
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
        let output = pool.render_target(self.output)?;

        cmd.clear_render_target(output);
        cmd.bind_render_target(output);

        // Environment background
        if !scene.environment_map.is_unset() {
            let environment = pool.environment_map(scene.environment_map)?;
            let cube = pool.mesh(self.cube_mesh)?;

            cmd.bind_graphics_pipeline(pool.graphics_pipeline(self.cubemap_pipeline)?);
            cmd.bind_constant_buffer(0, pool.current_frame_buffer());
            cmd.bind_vertex_buffer(&cube.vertex_buffer);
            cmd.bind_index_buffer(&cube.index_buffer);
            cmd.bind_texture(
                0,
                pool.texture_or_fallback(environment.desc.environment_texture),
            );
            cmd.draw(cube.index_buffer.desc.num_indices);
        }

        // Geometry
        cmd.bind_graphics_pipeline(pool.graphics_pipeline(self.gbuffer_pipeline)?);
        cmd.bind_constant_buffer(0, pool.current_frame_buffer());

        for object in &scene.render_objects {
            cmd.set_dynamic_call_data(bytemuck::bytes_of(&object.transform));

            let mesh = pool.mesh(object.mesh)?;
            cmd.bind_vertex_buffer(&mesh.vertex_buffer);
            cmd.bind_index_buffer(&mesh.index_buffer);

            let material = pool.material(object.material)?;
            cmd.bind_texture(0, pool.texture_or_fallback(material.desc.albedo_texture));
            cmd.bind_texture(1, pool.texture_or_fallback(material.desc.normal_texture));
            cmd.bind_texture(
                2,
                pool.texture_or_fallback(material.desc.metallic_roughness_texture),
            );
            cmd.bind_texture(3, pool.texture_or_fallback(material.desc.emissive_texture));
            cmd.bind_texture(4, pool.texture_or_fallback(material.desc.occlusion_texture));
            cmd.bind_constant_buffer(1, &material.constant_buffer);

            cmd.draw(mesh.index_buffer.desc.num_indices);
        }

        Ok(())
    }
}
