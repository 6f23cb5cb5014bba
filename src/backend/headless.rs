//! Headless Recording Backend
//!
//! A [`Device`]/[`CommandList`] implementation with no GPU behind it. Every
//! creation call allocates a fresh [`RawId`]; every recorded command is kept
//! as a [`Command`] value that tests, tools, and the demo can inspect.
//!
//! This is the reference implementation of the backend contract: it models
//! the presentation ring (the back-buffer index advances on
//! [`submit_and_present`](Device::submit_and_present)) and retains the
//! last written contents of every buffer, but performs no rendering.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::{Attachment, CommandList, Device, RawId};
use crate::errors::Result;
use crate::resources::descriptors::{
    ComputePipelineDesc, Format, GraphicsPipelineDesc, IndexBufferDesc, RenderTargetDesc,
    TextureDesc, VertexBufferDesc,
};
use crate::resources::pool::{
    ComputePipeline, ConstantBuffer, GraphicsPipeline, IndexBuffer, RenderTarget, Texture,
    VertexBuffer,
};

/// One recorded command, mirroring the [`CommandList`] contract.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BindGraphicsPipeline(RawId),
    BindComputePipeline(RawId),
    BindRenderTarget(RawId),
    ClearRenderTarget(RawId),
    BindVertexBuffer(RawId),
    BindIndexBuffer(RawId),
    BindConstantBuffer { slot: u32, buffer: RawId },
    BindTexture { slot: u32, texture: RawId, mip: Option<u32> },
    BindTargetTexture { slot: u32, target: RawId, attachment: Attachment },
    BindRwTexture { slot: u32, texture: RawId, mip: u32 },
    BindRwTargetTexture { slot: u32, target: RawId, attachment: Attachment },
    SetDynamicCallData(Vec<u8>),
    Dispatch { x: u32, y: u32, z: u32 },
    Draw { index_count: u32 },
    CopyTargetToTexture { target: RawId, attachment: Attachment, texture: RawId },
}

type CommandLog = Arc<Mutex<Vec<Command>>>;

/// Command list that records into a shared log owned by its device.
///
/// Lists created standalone via [`HeadlessCommandList::new`] own a private
/// log; [`commands`](HeadlessCommandList::commands) snapshots it for
/// pass-level assertions.
pub struct HeadlessCommandList {
    log: CommandLog,
}

impl HeadlessCommandList {
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_log(log: CommandLog) -> Self {
        Self { log }
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        self.log.lock().clone()
    }

    fn push(&self, command: Command) {
        self.log.lock().push(command);
    }
}

impl Default for HeadlessCommandList {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandList for HeadlessCommandList {
    fn bind_graphics_pipeline(&mut self, pipeline: &GraphicsPipeline) {
        self.push(Command::BindGraphicsPipeline(pipeline.raw));
    }

    fn bind_compute_pipeline(&mut self, pipeline: &ComputePipeline) {
        self.push(Command::BindComputePipeline(pipeline.raw));
    }

    fn bind_render_target(&mut self, target: &RenderTarget) {
        self.push(Command::BindRenderTarget(target.raw));
    }

    fn clear_render_target(&mut self, target: &RenderTarget) {
        self.push(Command::ClearRenderTarget(target.raw));
    }

    fn bind_vertex_buffer(&mut self, buffer: &VertexBuffer) {
        self.push(Command::BindVertexBuffer(buffer.raw));
    }

    fn bind_index_buffer(&mut self, buffer: &IndexBuffer) {
        self.push(Command::BindIndexBuffer(buffer.raw));
    }

    fn bind_constant_buffer(&mut self, slot: u32, buffer: &ConstantBuffer) {
        self.push(Command::BindConstantBuffer {
            slot,
            buffer: buffer.raw,
        });
    }

    fn bind_texture(&mut self, slot: u32, texture: &Texture) {
        self.push(Command::BindTexture {
            slot,
            texture: texture.raw,
            mip: None,
        });
    }

    fn bind_texture_mip(&mut self, slot: u32, texture: &Texture, mip: u32) {
        self.push(Command::BindTexture {
            slot,
            texture: texture.raw,
            mip: Some(mip),
        });
    }

    fn bind_target_texture(&mut self, slot: u32, target: &RenderTarget, attachment: Attachment) {
        self.push(Command::BindTargetTexture {
            slot,
            target: target.raw,
            attachment,
        });
    }

    fn bind_rw_texture(&mut self, slot: u32, texture: &Texture, mip: u32) {
        self.push(Command::BindRwTexture {
            slot,
            texture: texture.raw,
            mip,
        });
    }

    fn bind_rw_target_texture(&mut self, slot: u32, target: &RenderTarget, attachment: Attachment) {
        self.push(Command::BindRwTargetTexture {
            slot,
            target: target.raw,
            attachment,
        });
    }

    fn set_dynamic_call_data(&mut self, data: &[u8]) {
        self.push(Command::SetDynamicCallData(data.to_vec()));
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.push(Command::Dispatch { x, y, z });
    }

    fn draw(&mut self, index_count: u32) {
        self.push(Command::Draw { index_count });
    }

    fn copy_target_to_texture(&mut self, target: &RenderTarget, attachment: Attachment, dst: &Texture) {
        self.push(Command::CopyTargetToTexture {
            target: target.raw,
            attachment,
            texture: dst.raw,
        });
    }
}

// ============================================================================
// Device
// ============================================================================

struct DeviceState {
    next_raw: u64,
    backbuffer_index: u32,
    /// Logs of command lists opened this frame, in creation order. The
    /// renderer records one list per frame; draining in order keeps the
    /// trace faithful even if a tool opens several.
    open_logs: Vec<CommandLog>,
    submitted: Vec<Vec<Command>>,
    buffers: FxHashMap<RawId, Vec<u8>>,
}

/// Recording device with a simulated presentation ring.
pub struct HeadlessDevice {
    backbuffer_count: u32,
    backbuffer: RenderTarget,
    state: Mutex<DeviceState>,
}

impl HeadlessDevice {
    /// Creates a device presenting to a `width × height` swap chain of
    /// `backbuffer_count` buffers (clamped to 2..=3).
    #[must_use]
    pub fn new(width: u32, height: u32, backbuffer_count: u32) -> Self {
        let backbuffer = RenderTarget {
            desc: RenderTargetDesc::single_color(width, height, Format::R8G8B8A8Unorm),
            raw: RawId(u64::MAX),
        };
        Self {
            backbuffer_count: backbuffer_count.clamp(2, 3),
            backbuffer,
            state: Mutex::new(DeviceState {
                next_raw: 1,
                backbuffer_index: 0,
                open_logs: Vec::new(),
                submitted: Vec::new(),
                buffers: FxHashMap::default(),
            }),
        }
    }

    fn allocate(&self) -> RawId {
        let mut state = self.state.lock();
        let raw = RawId(state.next_raw);
        state.next_raw += 1;
        raw
    }

    /// Commands of every submitted frame, oldest first.
    #[must_use]
    pub fn submitted_frames(&self) -> Vec<Vec<Command>> {
        self.state.lock().submitted.clone()
    }

    /// Commands of the most recently submitted frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<Vec<Command>> {
        self.state.lock().submitted.last().cloned()
    }

    /// Last contents written to a buffer, if any.
    #[must_use]
    pub fn buffer_contents(&self, buffer: RawId) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&buffer).cloned()
    }
}

impl Device for HeadlessDevice {
    fn backbuffer_count(&self) -> u32 {
        self.backbuffer_count
    }

    fn current_backbuffer_index(&self) -> u32 {
        self.state.lock().backbuffer_index
    }

    fn current_backbuffer(&self) -> RenderTarget {
        self.backbuffer.clone()
    }

    fn create_texture(&self, _desc: &TextureDesc) -> Result<RawId> {
        Ok(self.allocate())
    }

    fn create_render_target(&self, _desc: &RenderTargetDesc) -> Result<RawId> {
        Ok(self.allocate())
    }

    fn create_graphics_pipeline(&self, _desc: &GraphicsPipelineDesc) -> Result<RawId> {
        Ok(self.allocate())
    }

    fn create_compute_pipeline(&self, _desc: &ComputePipelineDesc) -> Result<RawId> {
        Ok(self.allocate())
    }

    fn create_vertex_buffer(&self, _desc: &VertexBufferDesc, data: &[u8]) -> Result<RawId> {
        let raw = self.allocate();
        self.state.lock().buffers.insert(raw, data.to_vec());
        Ok(raw)
    }

    fn create_index_buffer(&self, _desc: &IndexBufferDesc, data: &[u8]) -> Result<RawId> {
        let raw = self.allocate();
        self.state.lock().buffers.insert(raw, data.to_vec());
        Ok(raw)
    }

    fn create_constant_buffer(&self, size: u64) -> Result<RawId> {
        let raw = self.allocate();
        self.state.lock().buffers.insert(raw, vec![0; size as usize]);
        Ok(raw)
    }

    fn write_buffer(&self, buffer: RawId, data: &[u8]) {
        self.state.lock().buffers.insert(buffer, data.to_vec());
    }

    fn create_command_list(&self) -> Box<dyn CommandList> {
        let log: CommandLog = Arc::new(Mutex::new(Vec::new()));
        self.state.lock().open_logs.push(Arc::clone(&log));
        Box::new(HeadlessCommandList::with_log(log))
    }

    fn submit_and_present(&self, list: Box<dyn CommandList>) -> Result<()> {
        drop(list);
        let mut state = self.state.lock();
        let mut frame = Vec::new();
        for log in state.open_logs.drain(..) {
            frame.append(&mut log.lock());
        }
        state.submitted.push(frame);
        state.backbuffer_index = (state.backbuffer_index + 1) % self.backbuffer_count;
        Ok(())
    }
}
