use glam::Mat4;

use crate::backend::CommandList;
use crate::errors::Result;
use crate::resources::descriptors::{
    DynamicCallDataDesc, Format, GraphicsPipelineDesc, RenderTargetDesc, ShaderStages,
    WindingOrder,
};
use crate::resources::{GraphicsPipeline, Handle, RenderTarget, ResourcePool};
use crate::scene::SceneRenderInfo;
use crate::settings::AppInfo;

use super::{RenderPass, object_layout};

const SHADOW_MAP_SIZE: u32 = 4096;

/// Renders every object into the directional light's shadow map using the
/// shadow-space projection carried in the frame uniforms.
#[derive(Default)]
pub struct ShadowPass {
    pipeline: Handle<GraphicsPipeline>,
    output: Handle<RenderTarget>,
}

impl ShadowPass {
    pub const OUTPUT: &'static str = "ShadowMap";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderPass for ShadowPass {
    fn name(&self) -> &'static str {
        "Shadow Pass"
    }

    fn writes(&self) -> &'static [&'static str] {
        &[Self::OUTPUT]
    }

    fn init(&mut self, _info: &AppInfo, pool: &mut ResourcePool) -> Result<()> {
        self.pipeline = pool.create_graphics_pipeline(GraphicsPipelineDesc {
            vertex_shader_path: "shaders/shadow".to_string(),
            pixel_shader_path: "shaders/shadow".to_string(),
            vertex_layout: object_layout(),
            constant_buffer_visibilities: smallvec::smallvec![ShaderStages::VERTEX],
            render_target_formats: smallvec::smallvec![Format::R8G8B8A8Unorm],
            depth_format: Some(Format::R32Float),
            winding_order: WindingOrder::CounterClockwise,
            dynamic_call_data: Some(DynamicCallDataDesc {
                slot: 1,
                size: std::mem::size_of::<Mat4>() as u32,
                visibility: ShaderStages::VERTEX,
            }),
            ..GraphicsPipelineDesc::default()
        })?;

        // The shadow map resolution is independent of the presentation size.
        self.output = pool.create_named_render_target(
            RenderTargetDesc {
                width: SHADOW_MAP_SIZE,
                height: SHADOW_MAP_SIZE,
                num_render_targets: 1,
                formats: smallvec::smallvec![Format::R8G8B8A8Unorm],
                clear_colors: smallvec::smallvec![[0.0; 4]],
                allow_depth_stencil: true,
                depth_format: Format::R32Float,
                depth_clear_value: 1.0,
            },
            Self::OUTPUT,
            false,
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
        let pipeline = pool.graphics_pipeline(self.pipeline)?;

        cmd.clear_render_target(output);
        cmd.bind_graphics_pipeline(pipeline);
        cmd.bind_render_target(output);
        cmd.bind_constant_buffer(0, pool.current_frame_buffer());

        for object in &scene.render_objects {
            cmd.set_dynamic_call_data(bytemuck::bytes_of(&object.transform));

            let mesh = pool.mesh(object.mesh)?;
            cmd.bind_vertex_buffer(&mesh.vertex_buffer);
            cmd.bind_index_buffer(&mesh.index_buffer);
            cmd.draw(mesh.index_buffer.desc.num_indices);
        }

        Ok(())
    }
}
