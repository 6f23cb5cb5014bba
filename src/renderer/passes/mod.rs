//! Render Passes
//!
//! A pass is one stage of the pipeline: it owns its private pipelines and
//! targets, publishes outputs under well-known names, and imports the
//! outputs of earlier-ordered passes by name. The stock stack is
//! Shadow → Geometry → DeferredPBR → FXAA → Bloom → ToneMapping.

pub mod bloom;
pub mod deferred;
pub mod fxaa;
pub mod geometry;
pub mod shadow;
pub mod tone_mapping;

pub use bloom::BloomPass;
pub use deferred::DeferredPbrPass;
pub use fxaa::FxaaPass;
pub use geometry::GeometryPass;
pub use shadow::ShadowPass;
pub use tone_mapping::ToneMappingPass;

use crate::backend::CommandList;
use crate::errors::Result;
use crate::resources::descriptors::{Format, IndexBufferDesc, VertexAttribute, VertexBufferDesc, VertexLayout};
use crate::resources::{Handle, Mesh, ResourcePool};
use crate::scene::SceneRenderInfo;
use crate::settings::AppInfo;

/// One stage of the rendering pipeline.
///
/// # Lifecycle
///
/// `Uninitialized → Initialized → (Rendering)*`
///
/// [`init`](RenderPass::init) runs exactly once per configuration: it
/// creates the pass's private pipelines and targets and registers its output
/// names. It runs again only when the renderer is resized, re-registering
/// the same names over the old mappings.
///
/// [`render`](RenderPass::render) runs once per frame for every pass in the
/// configured stack, strictly in stack order. A pass must not assume it can
/// resolve a name registered by a pass ordered after it; failing to resolve
/// an input is fatal to the frame.
pub trait RenderPass {
    /// Pass name for logs and backend debug groups.
    fn name(&self) -> &'static str;

    /// Named targets this pass resolves, for pre-flight stack validation.
    fn reads(&self) -> &'static [&'static str] {
        &[]
    }

    /// Named targets this pass registers, for pre-flight stack validation.
    fn writes(&self) -> &'static [&'static str] {
        &[]
    }

    /// One-time setup: create pipelines and targets, register output names.
    fn init(&mut self, info: &AppInfo, pool: &mut ResourcePool) -> Result<()>;

    /// Per-frame execution: resolve named inputs, bind resources, record
    /// draw/dispatch work.
    fn render(
        &self,
        scene: &SceneRenderInfo,
        pool: &ResourcePool,
        cmd: &mut dyn CommandList,
    ) -> Result<()>;
}

// ============================================================================
// Shared Geometry Helpers
// ============================================================================

/// Edge length of the compute tile every post-process shader is written for.
pub(crate) const COMPUTE_TILE: u32 = 8;

/// Dispatch grid extent covering `pixels` with [`COMPUTE_TILE`]-wide groups.
#[inline]
pub(crate) fn compute_grid(pixels: u32) -> u32 {
    pixels.div_ceil(COMPUTE_TILE).max(1)
}

/// Layout of the oversized fullscreen triangle: one float2 position.
pub(crate) fn fullscreen_layout() -> VertexLayout {
    VertexLayout::new(&[VertexAttribute {
        format: Format::R32G32Float,
        semantic: "POSITION",
    }])
}

/// Standard interleaved object vertex: position, normal, tangent, texcoord.
pub(crate) fn object_layout() -> VertexLayout {
    VertexLayout::new(&[
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
    ])
}

/// Position-only layout used by the environment cube.
pub(crate) fn position_layout() -> VertexLayout {
    VertexLayout::new(&[VertexAttribute {
        format: Format::R32G32B32Float,
        semantic: "POSITION",
    }])
}

/// A single oversized triangle covering the whole viewport; cheaper than a
/// two-triangle quad and immune to the diagonal seam.
pub(crate) fn create_fullscreen_triangle(pool: &mut ResourcePool) -> Result<Handle<Mesh>> {
    let vertices: [[f32; 2]; 3] = [[-1.0, -1.0], [-1.0, 3.0], [3.0, -1.0]];
    let indices: [u16; 3] = [0, 1, 2];

    pool.create_mesh(
        VertexBufferDesc {
            layout: fullscreen_layout(),
            num_vertices: vertices.len() as u32,
        },
        bytemuck::cast_slice(&vertices),
        IndexBufferDesc {
            format: Format::R16Uint,
            num_indices: indices.len() as u32,
        },
        bytemuck::cast_slice(&indices),
    )
}

/// A unit cube around the origin, position-only, for the environment pass.
pub(crate) fn create_unit_cube(pool: &mut ResourcePool) -> Result<Handle<Mesh>> {
    let vertices: [[f32; 3]; 8] = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    #[rustfmt::skip]
    let indices: [u16; 36] = [
        0, 2, 1, 0, 3, 2, // -Z
        4, 5, 6, 4, 6, 7, // +Z
        0, 1, 5, 0, 5, 4, // -Y
        3, 7, 6, 3, 6, 2, // +Y
        0, 4, 7, 0, 7, 3, // -X
        1, 2, 6, 1, 6, 5, // +X
    ];

    pool.create_mesh(
        VertexBufferDesc {
            layout: position_layout(),
            num_vertices: vertices.len() as u32,
        },
        bytemuck::cast_slice(&vertices),
        IndexBufferDesc {
            format: Format::R16Uint,
            num_indices: indices.len() as u32,
        },
        bytemuck::cast_slice(&indices),
    )
}
