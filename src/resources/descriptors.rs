//! Resource Creation Descriptors
//!
//! Immutable configuration records supplied to the [`ResourcePool`]'s
//! creation calls. A descriptor is validated once at creation time
//! ([`RenderError::InvalidDescriptor`] on malformed input), then stored next
//! to the backend object it produced; lookups return both.
//!
//! [`ResourcePool`]: crate::resources::ResourcePool
//! [`RenderError::InvalidDescriptor`]: crate::errors::RenderError

use smallvec::SmallVec;

use crate::errors::{RenderError, Result};
use crate::resources::handle::Handle;
use crate::resources::pool::Texture;

/// Maximum number of simultaneous color attachments on a render target.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Full mip-chain length for a `width × height` base level:
/// `floor(log2(max(width, height))) + 1`.
#[inline]
#[must_use]
pub fn mip_count(width: u32, height: u32) -> u32 {
    u32::BITS - width.max(height).max(1).leading_zeros()
}

// ============================================================================
// Enumerations
// ============================================================================

/// Pixel and vertex-attribute formats understood by the backend contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    R8G8B8A8Unorm,
    R16Uint,
    R32Uint,
    R32Float,
    R32G32Float,
    R32G32B32Float,
    R32G32B32A32Float,
    R16G16B16A16Float,
}

impl Format {
    /// Size of one element of this format in bytes.
    #[must_use]
    pub const fn size_bytes(self) -> u32 {
        match self {
            Self::R16Uint => 2,
            Self::R8G8B8A8Unorm | Self::R32Uint | Self::R32Float => 4,
            Self::R32G32Float | Self::R16G16B16A16Float => 8,
            Self::R32G32B32Float => 12,
            Self::R32G32B32A32Float => 16,
        }
    }

    /// Whether this format is usable as a depth attachment.
    #[must_use]
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::R32Float)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureType {
    #[default]
    Tex2D,
    Tex2DArray,
    TexCube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    #[default]
    Back,
    Front,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindingOrder {
    #[default]
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerFilter {
    #[default]
    Linear,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
}

bitflags::bitflags! {
    /// Shader stages a binding is visible to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        const VERTEX = 1 << 0;
        const PIXEL = 1 << 1;
        const COMPUTE = 1 << 2;
        const ALL = Self::VERTEX.bits() | Self::PIXEL.bits();
    }
}

impl Default for ShaderStages {
    fn default() -> Self {
        Self::ALL
    }
}

// ============================================================================
// Samplers and Vertex Layouts
// ============================================================================

/// Static sampler slot baked into a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerDesc {
    pub visibility: ShaderStages,
    pub filter: SamplerFilter,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub wrap_w: WrapMode,
}

impl SamplerDesc {
    #[must_use]
    pub fn pixel(filter: SamplerFilter) -> Self {
        Self {
            visibility: ShaderStages::PIXEL,
            filter,
            ..Self::default()
        }
    }
}

/// One vertex attribute: format plus shader semantic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub format: Format,
    pub semantic: &'static str,
}

/// Ordered set of vertex attributes describing one interleaved buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexLayout {
    pub attributes: SmallVec<[VertexAttribute; 8]>,
}

impl VertexLayout {
    #[must_use]
    pub fn new(attributes: &[VertexAttribute]) -> Self {
        Self {
            attributes: SmallVec::from_slice(attributes),
        }
    }

    /// Byte stride of one interleaved vertex.
    #[must_use]
    pub fn stride(&self) -> u32 {
        self.attributes.iter().map(|a| a.format.size_bytes()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

// ============================================================================
// Texture and Render-Target Descriptors
// ============================================================================

/// Creation record for a sampled / storage texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub texture_type: TextureType,
    pub format: Format,
    pub num_mips: u32,
    pub num_array_slices: u32,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            texture_type: TextureType::Tex2D,
            format: Format::R8G8B8A8Unorm,
            num_mips: 1,
            num_array_slices: 1,
        }
    }
}

impl TextureDesc {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidDescriptor(format!(
                "texture extent must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        let max_mips = mip_count(self.width, self.height);
        if self.num_mips == 0 || self.num_mips > max_mips {
            return Err(RenderError::InvalidDescriptor(format!(
                "mip count {} out of range 1..={} for {}x{}",
                self.num_mips, max_mips, self.width, self.height
            )));
        }
        if self.num_array_slices == 0 {
            return Err(RenderError::InvalidDescriptor(
                "texture must have at least one array slice".to_string(),
            ));
        }
        Ok(())
    }
}

/// Creation record for a render target: up to [`MAX_COLOR_ATTACHMENTS`] color
/// attachments plus an optional depth-stencil attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDesc {
    pub width: u32,
    pub height: u32,
    pub num_render_targets: u32,
    pub formats: SmallVec<[Format; MAX_COLOR_ATTACHMENTS]>,
    pub clear_colors: SmallVec<[[f32; 4]; MAX_COLOR_ATTACHMENTS]>,
    pub allow_depth_stencil: bool,
    pub depth_format: Format,
    pub depth_clear_value: f32,
}

impl Default for RenderTargetDesc {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            num_render_targets: 0,
            formats: SmallVec::new(),
            clear_colors: SmallVec::new(),
            allow_depth_stencil: false,
            depth_format: Format::R32Float,
            depth_clear_value: 1.0,
        }
    }
}

impl RenderTargetDesc {
    /// Convenience constructor for the common single-color-attachment case.
    #[must_use]
    pub fn single_color(width: u32, height: u32, format: Format) -> Self {
        Self {
            width,
            height,
            num_render_targets: 1,
            formats: smallvec::smallvec![format],
            clear_colors: smallvec::smallvec![[0.0; 4]],
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidDescriptor(format!(
                "render target extent must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.num_render_targets as usize > MAX_COLOR_ATTACHMENTS {
            return Err(RenderError::InvalidDescriptor(format!(
                "{} color attachments exceeds the maximum of {MAX_COLOR_ATTACHMENTS}",
                self.num_render_targets
            )));
        }
        if self.formats.len() != self.num_render_targets as usize {
            return Err(RenderError::InvalidDescriptor(format!(
                "render target declares {} attachments but supplies {} formats",
                self.num_render_targets,
                self.formats.len()
            )));
        }
        if self.clear_colors.len() != self.formats.len() {
            return Err(RenderError::InvalidDescriptor(format!(
                "render target supplies {} clear colors for {} attachments",
                self.clear_colors.len(),
                self.formats.len()
            )));
        }
        if self.num_render_targets == 0 && !self.allow_depth_stencil {
            return Err(RenderError::InvalidDescriptor(
                "render target must have at least one color or depth attachment".to_string(),
            ));
        }
        if self.allow_depth_stencil && !self.depth_format.is_depth() {
            return Err(RenderError::InvalidDescriptor(format!(
                "{:?} is not a depth format",
                self.depth_format
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Pipeline Descriptors
// ============================================================================

/// Small per-draw/per-dispatch uniform payload bound at a fixed slot,
/// distinct from the larger per-frame constant buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DynamicCallDataDesc {
    pub slot: u32,
    pub size: u32,
    pub visibility: ShaderStages,
}

/// Creation record for a graphics (vertex + pixel) pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsPipelineDesc {
    pub vertex_shader_path: String,
    pub pixel_shader_path: String,
    pub shader_version: String,
    pub vertex_layout: VertexLayout,
    pub constant_buffer_visibilities: SmallVec<[ShaderStages; 4]>,
    pub texture_visibilities: SmallVec<[ShaderStages; 8]>,
    pub sampler_descs: SmallVec<[SamplerDesc; 4]>,
    pub render_target_formats: SmallVec<[Format; MAX_COLOR_ATTACHMENTS]>,
    pub depth_format: Option<Format>,
    pub cull_mode: CullMode,
    pub winding_order: WindingOrder,
    pub dynamic_call_data: Option<DynamicCallDataDesc>,
}

impl Default for GraphicsPipelineDesc {
    fn default() -> Self {
        Self {
            vertex_shader_path: String::new(),
            pixel_shader_path: String::new(),
            shader_version: "5_1".to_string(),
            vertex_layout: VertexLayout::default(),
            constant_buffer_visibilities: SmallVec::new(),
            texture_visibilities: SmallVec::new(),
            sampler_descs: SmallVec::new(),
            render_target_formats: SmallVec::new(),
            depth_format: None,
            cull_mode: CullMode::default(),
            winding_order: WindingOrder::default(),
            dynamic_call_data: None,
        }
    }
}

impl GraphicsPipelineDesc {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.vertex_shader_path.is_empty() || self.pixel_shader_path.is_empty() {
            return Err(RenderError::InvalidDescriptor(
                "graphics pipeline requires vertex and pixel shader paths".to_string(),
            ));
        }
        if self.vertex_layout.is_empty() {
            return Err(RenderError::InvalidDescriptor(format!(
                "graphics pipeline {} has an empty vertex layout",
                self.vertex_shader_path
            )));
        }
        if self.render_target_formats.is_empty() && self.depth_format.is_none() {
            return Err(RenderError::InvalidDescriptor(format!(
                "graphics pipeline {} writes no color or depth output",
                self.pixel_shader_path
            )));
        }
        if let Some(depth) = self.depth_format
            && !depth.is_depth()
        {
            return Err(RenderError::InvalidDescriptor(format!(
                "{depth:?} is not a depth format"
            )));
        }
        Ok(())
    }
}

/// Creation record for a compute pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputePipelineDesc {
    pub shader_path: String,
    pub shader_version: String,
    pub dynamic_call_data: Option<DynamicCallDataDesc>,
    pub sampler_descs: SmallVec<[SamplerDesc; 4]>,
    pub num_textures: u32,
    pub num_uavs: u32,
}

impl Default for ComputePipelineDesc {
    fn default() -> Self {
        Self {
            shader_path: String::new(),
            shader_version: "5_1".to_string(),
            dynamic_call_data: None,
            sampler_descs: SmallVec::new(),
            num_textures: 0,
            num_uavs: 0,
        }
    }
}

impl ComputePipelineDesc {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.shader_path.is_empty() {
            return Err(RenderError::InvalidDescriptor(
                "compute pipeline requires a shader path".to_string(),
            ));
        }
        if self.num_textures + self.num_uavs == 0 {
            return Err(RenderError::InvalidDescriptor(format!(
                "compute pipeline {} binds no textures or UAVs",
                self.shader_path
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Mesh Buffer Descriptors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferDesc {
    pub layout: VertexLayout,
    pub num_vertices: u32,
}

impl VertexBufferDesc {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.layout.is_empty() {
            return Err(RenderError::InvalidDescriptor(
                "vertex buffer has an empty layout".to_string(),
            ));
        }
        if self.num_vertices == 0 {
            return Err(RenderError::InvalidDescriptor(
                "vertex buffer has zero vertices".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferDesc {
    pub format: Format,
    pub num_indices: u32,
}

impl IndexBufferDesc {
    pub(crate) fn validate(&self) -> Result<()> {
        if !matches!(self.format, Format::R16Uint | Format::R32Uint) {
            return Err(RenderError::InvalidDescriptor(format!(
                "{:?} is not an index format",
                self.format
            )));
        }
        if self.num_indices == 0 {
            return Err(RenderError::InvalidDescriptor(
                "index buffer has zero indices".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Material and Environment Descriptors
// ============================================================================

/// PBR material record: texture handles plus scalar factors. Unset texture
/// handles fall back to the pool's 1×1 white texture at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialDesc {
    pub albedo_texture: Handle<Texture>,
    pub normal_texture: Handle<Texture>,
    pub metallic_roughness_texture: Handle<Texture>,
    pub emissive_texture: Handle<Texture>,
    pub occlusion_texture: Handle<Texture>,
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
}

/// Image-based-lighting environment: pre-filtered cubemap set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EnvironmentMapDesc {
    pub environment_texture: Handle<Texture>,
    pub irradiance_texture: Handle<Texture>,
    pub specular_texture: Handle<Texture>,
}
