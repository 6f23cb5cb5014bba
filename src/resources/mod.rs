//! Resource Management
//!
//! Provides:
//! - `Handle<T>`: opaque typed resource handles
//! - Creation descriptors and their validation
//! - `ResourcePool`: handle-indexed storage + named render-target registry

pub mod descriptors;
pub mod handle;
pub mod pool;

pub use descriptors::{
    ComputePipelineDesc, CullMode, DynamicCallDataDesc, EnvironmentMapDesc, Format,
    GraphicsPipelineDesc, IndexBufferDesc, MaterialDesc, RenderTargetDesc, SamplerDesc,
    SamplerFilter, ShaderStages, TextureDesc, TextureType, VertexAttribute, VertexBufferDesc,
    VertexLayout, WindingOrder, WrapMode, mip_count,
};
pub use handle::Handle;
pub use pool::{
    ComputePipeline, ConstantBuffer, EnvironmentMap, GraphicsPipeline, IndexBuffer, Material, Mesh,
    RenderTarget, ResourcePool, Texture, VertexBuffer,
};
