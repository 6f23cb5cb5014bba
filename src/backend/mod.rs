//! Graphics Backend Contract
//!
//! The orchestration core never talks to a graphics API directly. It calls
//! through the [`Device`] and [`CommandList`] traits defined here, and a
//! backend crate (or the in-tree [`headless`] recorder) implements them.
//!
//! Backend objects are identified by opaque [`RawId`]s. The core stores a
//! `RawId` next to the descriptor that produced it and hands both back to the
//! command list at bind time; it never interprets the id.
//!
//! # Synchronisation
//!
//! All command recording for a frame happens on one thread, in pass-stack
//! order, into a single command list. The only CPU/GPU overlap the core
//! relies on is the per-back-buffer uniform ring: the device's
//! [`current_backbuffer_index`](Device::current_backbuffer_index) must only
//! advance once the GPU has finished with the slot being reclaimed.

pub mod headless;

pub use headless::{Command, HeadlessCommandList, HeadlessDevice};

use crate::errors::Result;
use crate::resources::descriptors::{
    ComputePipelineDesc, GraphicsPipelineDesc, IndexBufferDesc, RenderTargetDesc, TextureDesc,
    VertexBufferDesc,
};
use crate::resources::pool::{
    ComputePipeline, ConstantBuffer, GraphicsPipeline, IndexBuffer, RenderTarget, Texture,
    VertexBuffer,
};

/// Opaque identifier for one backend object (texture memory, pipeline state,
/// buffer allocation). Only the backend that issued it can interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawId(pub u64);

/// Selects one attachment of a render target when binding it as a shader
/// input or copy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// The n-th color attachment.
    Color(u8),
    /// The depth-stencil attachment.
    Depth,
}

/// One frame's command recording scope.
///
/// Recording is infallible by contract: every resource passed in has already
/// been resolved through the pool, and a backend that cannot record a
/// command reports the failure at submission.
pub trait CommandList {
    fn bind_graphics_pipeline(&mut self, pipeline: &GraphicsPipeline);
    fn bind_compute_pipeline(&mut self, pipeline: &ComputePipeline);

    fn bind_render_target(&mut self, target: &RenderTarget);
    fn clear_render_target(&mut self, target: &RenderTarget);

    fn bind_vertex_buffer(&mut self, buffer: &VertexBuffer);
    fn bind_index_buffer(&mut self, buffer: &IndexBuffer);
    fn bind_constant_buffer(&mut self, slot: u32, buffer: &ConstantBuffer);

    /// Bind a texture (all mips) as a sampled shader input.
    fn bind_texture(&mut self, slot: u32, texture: &Texture);
    /// Bind a single mip level of a texture as a sampled shader input.
    fn bind_texture_mip(&mut self, slot: u32, texture: &Texture, mip: u32);
    /// Bind one attachment of a render target as a sampled shader input.
    fn bind_target_texture(&mut self, slot: u32, target: &RenderTarget, attachment: Attachment);

    /// Bind a single mip level of a texture for unordered (read-write) access.
    fn bind_rw_texture(&mut self, slot: u32, texture: &Texture, mip: u32);
    /// Bind one attachment of a render target for unordered access.
    fn bind_rw_target_texture(&mut self, slot: u32, target: &RenderTarget, attachment: Attachment);

    /// Upload the per-draw/per-dispatch payload declared by the bound
    /// pipeline's dynamic-call-data slot.
    fn set_dynamic_call_data(&mut self, data: &[u8]);

    fn dispatch(&mut self, x: u32, y: u32, z: u32);
    fn draw(&mut self, index_count: u32);

    /// Copy one attachment of a render target into mip 0 of a texture.
    fn copy_target_to_texture(&mut self, target: &RenderTarget, attachment: Attachment, dst: &Texture);
}

/// The graphics device: resource factory plus presentation engine.
///
/// Creation calls are synchronous from the caller's point of view; each may
/// trigger backend allocation (GPU memory, descriptor-table binding).
/// Methods take `&self`: real devices are internally synchronised, and the
/// core records from a single thread regardless.
pub trait Device {
    /// Number of back buffers in the presentation ring (2 or 3).
    fn backbuffer_count(&self) -> u32;

    /// Index of the back buffer the CPU is currently recording for.
    /// Always `< backbuffer_count()`.
    fn current_backbuffer_index(&self) -> u32;

    /// The presentation target for the current back buffer.
    fn current_backbuffer(&self) -> RenderTarget;

    fn create_texture(&self, desc: &TextureDesc) -> Result<RawId>;
    fn create_render_target(&self, desc: &RenderTargetDesc) -> Result<RawId>;
    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> Result<RawId>;
    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc) -> Result<RawId>;
    fn create_vertex_buffer(&self, desc: &VertexBufferDesc, data: &[u8]) -> Result<RawId>;
    fn create_index_buffer(&self, desc: &IndexBufferDesc, data: &[u8]) -> Result<RawId>;
    fn create_constant_buffer(&self, size: u64) -> Result<RawId>;

    /// Overwrite the contents of a buffer created by this device.
    fn write_buffer(&self, buffer: RawId, data: &[u8]);

    /// Open a fresh command recording scope.
    fn create_command_list(&self) -> Box<dyn CommandList>;

    /// Submit a recorded command list and request presentation, advancing the
    /// back-buffer index.
    fn submit_and_present(&self, list: Box<dyn CommandList>) -> Result<()>;
}
