//! Resource Pool & Named Render-Target Registry
//!
//! Typed, handle-indexed storage for GPU resource descriptors and the
//! backend objects created from them. Creation is the only mutation path
//! exposed to passes; there is no destroy, and every resource lives for the
//! lifetime of the pool.
//!
//! The pool also carries two cross-cutting registries:
//!
//! - **Named render targets**: a pass publishes an output under a string key
//!   and a later pass imports it without holding a direct reference. This is
//!   how passes compose into a pipeline: there is no dependency graph, only
//!   registration order. Re-registering a name overwrites the mapping
//!   (exercised on resize, not per frame).
//! - **Per-frame uniform slots**: one CPU copy + one backend constant buffer
//!   per in-flight back buffer, so the CPU can write frame *N+1* while the
//!   GPU consumes frame *N*.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::backend::{Device, RawId};
use crate::errors::{RenderError, Result};
use crate::renderer::frame::FrameUniforms;
use crate::resources::descriptors::{
    ComputePipelineDesc, EnvironmentMapDesc, GraphicsPipelineDesc, IndexBufferDesc, MaterialDesc,
    RenderTargetDesc, TextureDesc, VertexBufferDesc,
};
use crate::resources::handle::Handle;
use crate::settings::AppInfo;

// ============================================================================
// Resource Records
// ============================================================================
// Each record pairs the immutable creation descriptor with the opaque backend
// object it produced. Lookups hand out both.

#[derive(Debug, Clone)]
pub struct Texture {
    pub desc: TextureDesc,
    pub raw: RawId,
}

#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub desc: RenderTargetDesc,
    pub raw: RawId,
}

#[derive(Debug, Clone)]
pub struct GraphicsPipeline {
    pub desc: GraphicsPipelineDesc,
    pub raw: RawId,
}

#[derive(Debug, Clone)]
pub struct ComputePipeline {
    pub desc: ComputePipelineDesc,
    pub raw: RawId,
}

#[derive(Debug, Clone)]
pub struct VertexBuffer {
    pub desc: VertexBufferDesc,
    pub raw: RawId,
}

#[derive(Debug, Clone)]
pub struct IndexBuffer {
    pub desc: IndexBufferDesc,
    pub raw: RawId,
}

#[derive(Debug, Clone)]
pub struct ConstantBuffer {
    pub size: u64,
    pub raw: RawId,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertex_buffer: VertexBuffer,
    pub index_buffer: IndexBuffer,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub desc: MaterialDesc,
    pub constant_buffer: ConstantBuffer,
}

#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    pub desc: EnvironmentMapDesc,
}

/// Scalar material factors as uploaded to the material constant buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialConstants {
    base_color_factor: [f32; 4],
    metallic_factor: f32,
    roughness_factor: f32,
    _pad: [f32; 2],
}

// ============================================================================
// Typed Store
// ============================================================================

/// Append-only storage for one resource kind. Handles are 1-based so that
/// the zero handle stays "unset".
struct Store<T> {
    kind: &'static str,
    entries: Vec<T>,
}

impl<T> Store<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    fn insert(&mut self, value: T) -> Handle<T> {
        self.entries.push(value);
        Handle::from_index(self.entries.len() as u32)
    }

    fn get(&self, handle: Handle<T>) -> Result<&T> {
        let index = handle.index();
        if index == 0 || index as usize > self.entries.len() {
            return Err(RenderError::InvalidHandle {
                kind: self.kind,
                index,
            });
        }
        Ok(&self.entries[index as usize - 1])
    }
}

/// One named render-target registration.
struct NamedTarget {
    handle: Handle<RenderTarget>,
    /// Whether the target participates in the cross-pass import chain (as
    /// opposed to a name registered only for tooling visibility).
    shared: bool,
}

// ============================================================================
// Pool
// ============================================================================

/// Handle-indexed storage for all pool-lifetime GPU resources.
pub struct ResourcePool {
    device: Arc<dyn Device>,

    textures: Store<Texture>,
    render_targets: Store<RenderTarget>,
    graphics_pipelines: Store<GraphicsPipeline>,
    compute_pipelines: Store<ComputePipeline>,
    meshes: Store<Mesh>,
    materials: Store<Material>,
    environment_maps: Store<EnvironmentMap>,

    named_targets: FxHashMap<String, NamedTarget>,

    frame_data: Vec<FrameUniforms>,
    frame_buffers: Vec<ConstantBuffer>,

    /// 1×1 white texture bound wherever a material leaves a slot unset.
    fallback_texture: Handle<Texture>,
}

impl ResourcePool {
    /// Creates the pool and its per-back-buffer uniform ring.
    pub fn new(device: Arc<dyn Device>, info: &AppInfo) -> Result<Self> {
        let mut pool = Self {
            device,
            textures: Store::new("texture"),
            render_targets: Store::new("render target"),
            graphics_pipelines: Store::new("graphics pipeline"),
            compute_pipelines: Store::new("compute pipeline"),
            meshes: Store::new("mesh"),
            materials: Store::new("material"),
            environment_maps: Store::new("environment map"),
            named_targets: FxHashMap::default(),
            frame_data: Vec::new(),
            frame_buffers: Vec::new(),
            fallback_texture: Handle::UNSET,
        };

        let uniform_size = std::mem::size_of::<FrameUniforms>() as u64;
        for _ in 0..info.back_buffer_count() {
            let raw = pool.device.create_constant_buffer(uniform_size)?;
            pool.frame_data.push(FrameUniforms::default());
            pool.frame_buffers.push(ConstantBuffer {
                size: uniform_size,
                raw,
            });
        }

        pool.fallback_texture = pool.create_texture(TextureDesc::default())?;

        log::debug!(
            "Resource pool ready: {} uniform slots of {} bytes",
            pool.frame_buffers.len(),
            uniform_size,
        );

        Ok(pool)
    }

    /// The device this pool allocates from.
    #[must_use]
    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    // ========================================================================
    // Creation (the only mutation path exposed to passes)
    // ========================================================================

    pub fn create_texture(&mut self, desc: TextureDesc) -> Result<Handle<Texture>> {
        desc.validate()?;
        let raw = self.device.create_texture(&desc)?;
        log::debug!(
            "Created texture {}x{} ({:?}, {} mips)",
            desc.width,
            desc.height,
            desc.format,
            desc.num_mips,
        );
        Ok(self.textures.insert(Texture { desc, raw }))
    }

    pub fn create_render_target(&mut self, desc: RenderTargetDesc) -> Result<Handle<RenderTarget>> {
        desc.validate()?;
        let raw = self.device.create_render_target(&desc)?;
        Ok(self.render_targets.insert(RenderTarget { desc, raw }))
    }

    /// Create a render target and publish it under `name` in one step.
    pub fn create_named_render_target(
        &mut self,
        desc: RenderTargetDesc,
        name: &str,
        shared: bool,
    ) -> Result<Handle<RenderTarget>> {
        let handle = self.create_render_target(desc)?;
        self.register_render_target(handle, name, shared)?;
        Ok(handle)
    }

    pub fn create_graphics_pipeline(
        &mut self,
        desc: GraphicsPipelineDesc,
    ) -> Result<Handle<GraphicsPipeline>> {
        desc.validate()?;
        let raw = self.device.create_graphics_pipeline(&desc)?;
        Ok(self.graphics_pipelines.insert(GraphicsPipeline { desc, raw }))
    }

    pub fn create_compute_pipeline(
        &mut self,
        desc: ComputePipelineDesc,
    ) -> Result<Handle<ComputePipeline>> {
        desc.validate()?;
        let raw = self.device.create_compute_pipeline(&desc)?;
        Ok(self.compute_pipelines.insert(ComputePipeline { desc, raw }))
    }

    pub fn create_mesh(
        &mut self,
        vertex_desc: VertexBufferDesc,
        vertex_data: &[u8],
        index_desc: IndexBufferDesc,
        index_data: &[u8],
    ) -> Result<Handle<Mesh>> {
        vertex_desc.validate()?;
        index_desc.validate()?;

        let expected_vertex_bytes =
            u64::from(vertex_desc.layout.stride()) * u64::from(vertex_desc.num_vertices);
        if vertex_data.len() as u64 != expected_vertex_bytes {
            return Err(RenderError::InvalidDescriptor(format!(
                "vertex data is {} bytes, layout expects {expected_vertex_bytes}",
                vertex_data.len()
            )));
        }
        let expected_index_bytes =
            u64::from(index_desc.format.size_bytes()) * u64::from(index_desc.num_indices);
        if index_data.len() as u64 != expected_index_bytes {
            return Err(RenderError::InvalidDescriptor(format!(
                "index data is {} bytes, descriptor expects {expected_index_bytes}",
                index_data.len()
            )));
        }

        let vertex_raw = self.device.create_vertex_buffer(&vertex_desc, vertex_data)?;
        let index_raw = self.device.create_index_buffer(&index_desc, index_data)?;
        Ok(self.meshes.insert(Mesh {
            vertex_buffer: VertexBuffer {
                desc: vertex_desc,
                raw: vertex_raw,
            },
            index_buffer: IndexBuffer {
                desc: index_desc,
                raw: index_raw,
            },
        }))
    }

    pub fn create_material(&mut self, desc: MaterialDesc) -> Result<Handle<Material>> {
        for handle in [
            desc.albedo_texture,
            desc.normal_texture,
            desc.metallic_roughness_texture,
            desc.emissive_texture,
            desc.occlusion_texture,
        ] {
            if !handle.is_unset() {
                self.textures.get(handle)?;
            }
        }

        let constants = MaterialConstants {
            base_color_factor: desc.base_color_factor,
            metallic_factor: desc.metallic_factor,
            roughness_factor: desc.roughness_factor,
            _pad: [0.0; 2],
        };
        let size = std::mem::size_of::<MaterialConstants>() as u64;
        let raw = self.device.create_constant_buffer(size)?;
        self.device.write_buffer(raw, bytemuck::bytes_of(&constants));

        Ok(self.materials.insert(Material {
            desc,
            constant_buffer: ConstantBuffer { size, raw },
        }))
    }

    pub fn create_environment_map(
        &mut self,
        desc: EnvironmentMapDesc,
    ) -> Result<Handle<EnvironmentMap>> {
        for handle in [
            desc.environment_texture,
            desc.irradiance_texture,
            desc.specular_texture,
        ] {
            if !handle.is_unset() {
                self.textures.get(handle)?;
            }
        }
        Ok(self.environment_maps.insert(EnvironmentMap { desc }))
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn texture(&self, handle: Handle<Texture>) -> Result<&Texture> {
        self.textures.get(handle)
    }

    pub fn render_target(&self, handle: Handle<RenderTarget>) -> Result<&RenderTarget> {
        self.render_targets.get(handle)
    }

    pub fn graphics_pipeline(&self, handle: Handle<GraphicsPipeline>) -> Result<&GraphicsPipeline> {
        self.graphics_pipelines.get(handle)
    }

    pub fn compute_pipeline(&self, handle: Handle<ComputePipeline>) -> Result<&ComputePipeline> {
        self.compute_pipelines.get(handle)
    }

    pub fn mesh(&self, handle: Handle<Mesh>) -> Result<&Mesh> {
        self.meshes.get(handle)
    }

    pub fn material(&self, handle: Handle<Material>) -> Result<&Material> {
        self.materials.get(handle)
    }

    pub fn environment_map(&self, handle: Handle<EnvironmentMap>) -> Result<&EnvironmentMap> {
        self.environment_maps.get(handle)
    }

    /// The texture for `handle`, or the 1×1 white fallback when the handle is
    /// unset or stale. Material texture slots are optional by design, so an
    /// empty slot is not a configuration error.
    #[must_use]
    pub fn texture_or_fallback(&self, handle: Handle<Texture>) -> &Texture {
        self.textures
            .get(handle)
            .or_else(|_| self.textures.get(self.fallback_texture))
            .expect("fallback texture is created with the pool")
    }

    // ========================================================================
    // Named Render-Target Registry
    // ========================================================================

    /// Publish `handle` under `name`. Re-registering overwrites: last writer
    /// wins, which is what the resize path relies on.
    pub fn register_render_target(
        &mut self,
        handle: Handle<RenderTarget>,
        name: &str,
        shared: bool,
    ) -> Result<()> {
        self.render_targets.get(handle)?;
        if let Some(previous) = self
            .named_targets
            .insert(name.to_string(), NamedTarget { handle, shared })
        {
            log::debug!(
                "Render target name {name:?} re-registered (was handle {})",
                previous.handle.index(),
            );
        } else {
            log::debug!("Render target name {name:?} registered");
        }
        Ok(())
    }

    /// Resolve a name registered by an earlier-ordered pass.
    pub fn render_target_handle(&self, name: &str) -> Result<Handle<RenderTarget>> {
        self.named_targets
            .get(name)
            .map(|entry| entry.handle)
            .ok_or_else(|| RenderError::UnknownTargetName(name.to_string()))
    }

    /// Resolve a name straight to the stored record.
    pub fn named_render_target(&self, name: &str) -> Result<&RenderTarget> {
        self.render_target(self.render_target_handle(name)?)
    }

    /// Names registered for the cross-pass import chain, for tooling such as
    /// a debug overlay's target browser.
    pub fn shared_target_names(&self) -> impl Iterator<Item = &str> {
        self.named_targets
            .iter()
            .filter(|(_, entry)| entry.shared)
            .map(|(name, _)| name.as_str())
    }

    // ========================================================================
    // Per-Frame Uniform Slots
    // ========================================================================

    /// CPU copy of the uniforms last written to `slot`.
    #[must_use]
    pub fn frame_uniforms(&self, slot: u32) -> &FrameUniforms {
        &self.frame_data[slot as usize]
    }

    /// Overwrite `slot`'s CPU copy and upload it to the matching backend
    /// buffer. Called once per frame for the slot selected by the device's
    /// back-buffer index.
    pub fn write_frame_uniforms(&mut self, slot: u32, uniforms: &FrameUniforms) {
        self.frame_data[slot as usize] = *uniforms;
        self.device.write_buffer(
            self.frame_buffers[slot as usize].raw,
            bytemuck::bytes_of(uniforms),
        );
    }

    /// Constant buffer for `slot`, bound by passes at the shared slot 0.
    #[must_use]
    pub fn frame_buffer(&self, slot: u32) -> &ConstantBuffer {
        &self.frame_buffers[slot as usize]
    }

    /// Constant buffer for the back buffer currently being recorded.
    #[must_use]
    pub fn current_frame_buffer(&self) -> &ConstantBuffer {
        self.frame_buffer(self.device.current_backbuffer_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessDevice;
    use crate::resources::descriptors::Format;

    fn test_pool() -> ResourcePool {
        let device = Arc::new(HeadlessDevice::new(64, 64, 2));
        ResourcePool::new(device, &AppInfo::default()).unwrap()
    }

    #[test]
    fn test_create_then_get_returns_supplied_descriptor() {
        let mut pool = test_pool();
        let desc = TextureDesc {
            width: 128,
            height: 64,
            format: Format::R32G32B32A32Float,
            num_mips: 5,
            ..TextureDesc::default()
        };
        let handle = pool.create_texture(desc.clone()).unwrap();
        assert_eq!(pool.texture(handle).unwrap().desc, desc);
    }

    #[test]
    fn test_get_fails_for_unset_and_out_of_range_handles() {
        let pool = test_pool();

        let err = pool.texture(Handle::UNSET).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidHandle { kind: "texture", index: 0 }
        ));

        let err = pool.render_target(Handle::from_index(99)).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidHandle { kind: "render target", index: 99 }
        ));
    }

    #[test]
    fn test_invalid_descriptor_is_rejected_before_allocation() {
        let mut pool = test_pool();
        let desc = TextureDesc {
            width: 16,
            height: 16,
            num_mips: 12,
            ..TextureDesc::default()
        };
        assert!(matches!(
            pool.create_texture(desc),
            Err(RenderError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_named_target_registration_and_resolution() {
        let mut pool = test_pool();
        let desc = RenderTargetDesc::single_color(64, 64, Format::R32G32B32A32Float);
        let handle = pool.create_named_render_target(desc, "SceneColor", true).unwrap();

        assert_eq!(pool.render_target_handle("SceneColor").unwrap(), handle);
        assert!(matches!(
            pool.render_target_handle("NoSuchName"),
            Err(RenderError::UnknownTargetName(_))
        ));
        assert_eq!(pool.shared_target_names().collect::<Vec<_>>(), vec!["SceneColor"]);
    }

    #[test]
    fn test_reregistration_overwrites_previous_mapping() {
        let mut pool = test_pool();
        let first = pool
            .create_named_render_target(
                RenderTargetDesc::single_color(64, 64, Format::R32G32B32A32Float),
                "SceneColor",
                true,
            )
            .unwrap();
        let second = pool
            .create_named_render_target(
                RenderTargetDesc::single_color(128, 128, Format::R32G32B32A32Float),
                "SceneColor",
                true,
            )
            .unwrap();

        assert_ne!(first, second);
        let resolved = pool.named_render_target("SceneColor").unwrap();
        assert_eq!(resolved.desc.width, 128);
    }

    #[test]
    fn test_material_validates_referenced_textures() {
        let mut pool = test_pool();

        let mut desc = MaterialDesc::default();
        desc.albedo_texture = Handle::from_index(42);
        assert!(pool.create_material(desc).is_err());

        let texture = pool.create_texture(TextureDesc::default()).unwrap();
        let desc = MaterialDesc {
            albedo_texture: texture,
            base_color_factor: [1.0; 4],
            ..MaterialDesc::default()
        };
        assert!(pool.create_material(desc).is_ok());
    }

    #[test]
    fn test_mesh_creation_checks_data_sizes() {
        let mut pool = test_pool();
        let layout = crate::resources::descriptors::VertexLayout::new(&[
            crate::resources::descriptors::VertexAttribute {
                format: Format::R32G32Float,
                semantic: "POSITION",
            },
        ]);
        let vertex_desc = VertexBufferDesc {
            layout,
            num_vertices: 3,
        };
        let index_desc = IndexBufferDesc {
            format: Format::R16Uint,
            num_indices: 3,
        };

        let vertices = [[-1.0f32, -1.0], [-1.0, 3.0], [3.0, -1.0]];
        let indices = [0u16, 1, 2];

        // Truncated vertex data must be rejected
        assert!(
            pool.create_mesh(
                vertex_desc.clone(),
                &bytemuck::cast_slice(&vertices)[..8],
                index_desc,
                bytemuck::cast_slice(&indices),
            )
            .is_err()
        );

        assert!(
            pool.create_mesh(
                vertex_desc,
                bytemuck::cast_slice(&vertices),
                index_desc,
                bytemuck::cast_slice(&indices),
            )
            .is_ok()
        );
    }
}
