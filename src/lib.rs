//! # Ember
//!
//! Frame-orchestration core for a real-time 3D renderer.
//!
//! Ember turns a per-frame [`SceneRenderInfo`] snapshot into an ordered
//! sequence of GPU work across a configurable stack of render passes
//! (shadow, G-buffer, deferred lighting, FXAA, bloom, tone mapping). It
//! owns the resource pool, the named render-target registry that lets
//! passes compose without direct references, and the pass lifecycle; the
//! graphics API itself stays behind the [`Device`]/[`CommandList`] traits a
//! backend crate implements.
//!
//! ```rust
//! use std::sync::Arc;
//! use ember::backend::HeadlessDevice;
//! use ember::passes::{
//!     BloomPass, DeferredPbrPass, FxaaPass, GeometryPass, ShadowPass, ToneMappingPass,
//! };
//! use ember::{AppInfo, Renderer, SceneRenderInfo};
//!
//! # fn main() -> ember::Result<()> {
//! let info = AppInfo { width: 900, height: 600, ..AppInfo::default() };
//! let device = Arc::new(HeadlessDevice::new(info.width, info.height, info.num_back_buffers));
//! let mut renderer = Renderer::new(info, device)?;
//!
//! let stack = [
//!     renderer.add_pass(Box::new(ShadowPass::new())),
//!     renderer.add_pass(Box::new(GeometryPass::new())),
//!     renderer.add_pass(Box::new(DeferredPbrPass::new())),
//!     renderer.add_pass(Box::new(FxaaPass::new())),
//!     renderer.add_pass(Box::new(BloomPass::new())),
//!     renderer.add_pass(Box::new(ToneMappingPass::new())),
//! ];
//! renderer.configure_stack(&stack)?;
//! renderer.validate_stack()?;
//!
//! renderer.render_scene(&SceneRenderInfo::default())?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;

pub use renderer::passes;

pub use backend::{Attachment, CommandList, Device, RawId};
pub use errors::{RenderError, Result};
pub use renderer::{PassId, Renderer};
pub use renderer::frame::{FrameUniforms, build_frame_uniforms};
pub use renderer::passes::RenderPass;
pub use resources::{Handle, ResourcePool};
pub use scene::{CameraRenderInfo, LightKind, LightRenderInfo, RenderObjectInfo, SceneRenderInfo};
pub use settings::AppInfo;
