//! Mip-Chain Bloom Pass
//!
//! Multi-scale bloom over the anti-aliased HDR color, adapted from the
//! *Call of Duty: Advanced Warfare* bloom (SIGGRAPH 2014).
//!
//! # Algorithm
//!
//! 1. **Threshold**: the pass input is copied into mip 0 of a scratch
//!    "downscale" texture, then a compute stage discards pixels below the
//!    luminance threshold in place.
//!
//! 2. **Downsample**: a 13-tap box filter walks the chain, reading mip *i*
//!    and writing mip *i+1* at half resolution, until the 1×1 tail mip is
//!    reached.
//!
//! 3. **Upsample**: starting from the exact mip index the downsample loop
//!    reached, each step additively blends the next-coarser upsample result
//!    with the matching downscale mip into the "upscale" texture one level
//!    finer, accumulating a soft blur across all scales.
//!
//! 4. **Composite**: a final dispatch blends upscale mip 0 with the original
//!    input and writes the externally visible `"BloomOutput"` target.
//!
//! # Invariants
//!
//! The chain length is `mip_count(w, h) = floor(log2(max(w, h))) + 1`; the
//! downsample and upsample loops each perform exactly `mip_count - 1`
//! transitions, and the upsample loop's bound is the index the downsample
//! loop actually reached; a fixed constant here would silently under- or
//! over-blur. Every dispatch covers its *target* mip with 8×8 tiles.

use crate::backend::{Attachment, CommandList};
use crate::errors::Result;
use crate::resources::descriptors::{
    ComputePipelineDesc, DynamicCallDataDesc, Format, RenderTargetDesc, SamplerDesc,
    ShaderStages, TextureDesc, WrapMode, mip_count,
};
use crate::resources::{ComputePipeline, Handle, RenderTarget, ResourcePool, Texture};
use crate::scene::SceneRenderInfo;
use crate::settings::AppInfo;

use super::{RenderPass, compute_grid};

const DEFAULT_THRESHOLD: f32 = 0.9;

/// Per-dispatch payload shared by all four bloom stages: the extent of the
/// target mip plus the luminance threshold (only the threshold stage reads
/// the latter).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BloomData {
    width: u32,
    height: u32,
    threshold: f32,
}

/// Extent of `base` at `level`, never collapsing below one texel.
#[inline]
fn mip_extent(base: u32, level: u32) -> u32 {
    (base >> level).max(1)
}

pub struct BloomPass {
    threshold_pipeline: Handle<ComputePipeline>,
    downsample_pipeline: Handle<ComputePipeline>,
    upsample_pipeline: Handle<ComputePipeline>,
    composite_pipeline: Handle<ComputePipeline>,

    /// Scratch chain the threshold/downsample stages write.
    downscale_texture: Handle<Texture>,
    /// Accumulation chain the upsample stage writes.
    upscale_texture: Handle<Texture>,

    output: Handle<RenderTarget>,

    extent: (u32, u32),
    threshold: f32,
}

impl BloomPass {
    pub const OUTPUT: &'static str = "BloomOutput";

    #[must_use]
    pub fn new() -> Self {
        Self {
            threshold_pipeline: Handle::UNSET,
            downsample_pipeline: Handle::UNSET,
            upsample_pipeline: Handle::UNSET,
            composite_pipeline: Handle::UNSET,
            downscale_texture: Handle::UNSET,
            upscale_texture: Handle::UNSET,
            output: Handle::UNSET,
            extent: (0, 0),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Luminance cutoff for the threshold stage.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.max(0.0);
    }

    fn clamp_sampler() -> SamplerDesc {
        SamplerDesc {
            visibility: ShaderStages::COMPUTE,
            wrap_u: WrapMode::Clamp,
            wrap_v: WrapMode::Clamp,
            wrap_w: WrapMode::Clamp,
            ..SamplerDesc::default()
        }
    }
}

impl Default for BloomPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for BloomPass {
    fn name(&self) -> &'static str {
        "Bloom Pass"
    }

    fn reads(&self) -> &'static [&'static str] {
        &[super::FxaaPass::OUTPUT]
    }

    fn writes(&self) -> &'static [&'static str] {
        &[Self::OUTPUT]
    }

    fn init(&mut self, info: &AppInfo, pool: &mut ResourcePool) -> Result<()> {
        let dynamic_call_data = Some(DynamicCallDataDesc {
            slot: 0,
            size: std::mem::size_of::<BloomData>() as u32,
            visibility: ShaderStages::COMPUTE,
        });

        self.threshold_pipeline = pool.create_compute_pipeline(ComputePipelineDesc {
            shader_path: "shaders/bloom/threshold".to_string(),
            dynamic_call_data,
            num_uavs: 1,
            ..ComputePipelineDesc::default()
        })?;

        self.downsample_pipeline = pool.create_compute_pipeline(ComputePipelineDesc {
            shader_path: "shaders/bloom/downsample".to_string(),
            dynamic_call_data,
            sampler_descs: smallvec::smallvec![Self::clamp_sampler()],
            num_textures: 1,
            num_uavs: 1,
            ..ComputePipelineDesc::default()
        })?;

        self.upsample_pipeline = pool.create_compute_pipeline(ComputePipelineDesc {
            shader_path: "shaders/bloom/upsample".to_string(),
            dynamic_call_data,
            sampler_descs: smallvec::smallvec![Self::clamp_sampler()],
            num_textures: 1,
            num_uavs: 2,
            ..ComputePipelineDesc::default()
        })?;

        self.composite_pipeline = pool.create_compute_pipeline(ComputePipelineDesc {
            shader_path: "shaders/bloom/composite".to_string(),
            num_uavs: 3,
            ..ComputePipelineDesc::default()
        })?;

        let chain = TextureDesc {
            width: info.width,
            height: info.height,
            format: Format::R32G32B32A32Float,
            num_mips: mip_count(info.width, info.height),
            ..TextureDesc::default()
        };
        self.downscale_texture = pool.create_texture(chain.clone())?;
        self.upscale_texture = pool.create_texture(chain.clone())?;

        self.output = pool.create_named_render_target(
            RenderTargetDesc::single_color(info.width, info.height, Format::R32G32B32A32Float),
            Self::OUTPUT,
            true,
        )?;

        self.extent = (info.width, info.height);
        log::debug!(
            "Bloom chain allocated: {}x{}, {} mip levels",
            chain.width,
            chain.height,
            chain.num_mips,
        );

        Ok(())
    }

    fn render(
        &self,
        _scene: &SceneRenderInfo,
        pool: &ResourcePool,
        cmd: &mut dyn CommandList,
    ) -> Result<()> {
        let input = pool.named_render_target(super::FxaaPass::OUTPUT)?;
        let downscale = pool.texture(self.downscale_texture)?;
        let upscale = pool.texture(self.upscale_texture)?;
        let output = pool.render_target(self.output)?;

        let (width, height) = self.extent;
        let mips = downscale.desc.num_mips;

        cmd.copy_target_to_texture(input, Attachment::Color(0), downscale);

        // ── Phase 1: threshold in place over the full-resolution mip 0 ──────
        let mut data = BloomData {
            width,
            height,
            threshold: self.threshold,
        };
        cmd.bind_compute_pipeline(pool.compute_pipeline(self.threshold_pipeline)?);
        cmd.set_dynamic_call_data(bytemuck::bytes_of(&data));
        cmd.bind_rw_texture(0, downscale, 0);
        cmd.dispatch(compute_grid(width), compute_grid(height), 1);

        // ── Phase 2: downsample chain, mip i → mip i+1 ──────────────────────
        cmd.bind_compute_pipeline(pool.compute_pipeline(self.downsample_pipeline)?);
        let mut mip = 0;
        while mip + 1 < mips {
            data.width = mip_extent(width, mip + 1);
            data.height = mip_extent(height, mip + 1);
            cmd.set_dynamic_call_data(bytemuck::bytes_of(&data));
            cmd.bind_texture_mip(0, downscale, mip);
            cmd.bind_rw_texture(0, downscale, mip + 1);
            cmd.dispatch(compute_grid(data.width), compute_grid(data.height), 1);
            mip += 1;
        }

        // ── Phase 3: upsample chain, walking back from the mip the ──────────
        // downsample loop reached. Each step reads upscale[mip] and blends it
        // with downscale[mip-1] into upscale[mip-1].
        cmd.bind_compute_pipeline(pool.compute_pipeline(self.upsample_pipeline)?);
        while mip >= 1 {
            data.width = mip_extent(width, mip - 1);
            data.height = mip_extent(height, mip - 1);
            cmd.set_dynamic_call_data(bytemuck::bytes_of(&data));
            cmd.bind_texture_mip(0, upscale, mip);
            cmd.bind_rw_texture(0, downscale, mip - 1);
            cmd.bind_rw_texture(1, upscale, mip - 1);
            cmd.dispatch(compute_grid(data.width), compute_grid(data.height), 1);
            mip -= 1;
        }

        // ── Phase 4: composite upscale mip 0 with the original input ────────
        cmd.bind_compute_pipeline(pool.compute_pipeline(self.composite_pipeline)?);
        cmd.bind_rw_texture(0, upscale, 0);
        cmd.bind_rw_target_texture(1, input, Attachment::Color(0));
        cmd.bind_rw_target_texture(2, output, Attachment::Color(0));
        cmd.dispatch(compute_grid(width), compute_grid(height), 1);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Command, HeadlessCommandList, HeadlessDevice, RawId};
    use crate::settings::AppInfo;
    use std::sync::Arc;

    fn record_bloom_frame(width: u32, height: u32) -> (Vec<Command>, u32) {
        let info = AppInfo {
            width,
            height,
            ..AppInfo::default()
        };
        let device = Arc::new(HeadlessDevice::new(width, height, 2));
        let mut pool = ResourcePool::new(device, &info).unwrap();

        // Stand in for the FXAA pass output the bloom input resolves.
        pool.create_named_render_target(
            RenderTargetDesc::single_color(width, height, Format::R32G32B32A32Float),
            super::super::FxaaPass::OUTPUT,
            true,
        )
        .unwrap();

        let mut pass = BloomPass::new();
        pass.init(&info, &mut pool).unwrap();

        let mut cmd = HeadlessCommandList::new();
        let scene = SceneRenderInfo::default();
        pass.render(&scene, &pool, &mut cmd).unwrap();

        (cmd.commands(), mip_count(width, height))
    }

    /// Dispatches grouped by the compute pipeline bound when they ran.
    fn dispatches_per_pipeline(commands: &[Command]) -> Vec<(RawId, u32)> {
        let mut segments: Vec<(RawId, u32)> = Vec::new();
        for command in commands {
            match command {
                Command::BindComputePipeline(raw) => segments.push((*raw, 0)),
                Command::Dispatch { .. } => {
                    segments.last_mut().expect("dispatch before pipeline bind").1 += 1;
                }
                _ => {}
            }
        }
        segments
    }

    #[test]
    fn test_chain_runs_num_mips_minus_one_transitions_each_way() {
        for (width, height) in [(900, 600), (1920, 1080), (64, 64), (7, 3)] {
            let (commands, mips) = record_bloom_frame(width, height);
            let segments = dispatches_per_pipeline(&commands);

            // threshold, downsample, upsample, composite, in that order
            assert_eq!(segments.len(), 4, "{width}x{height}");
            assert_eq!(segments[0].1, 1, "threshold runs once for {width}x{height}");
            assert_eq!(segments[1].1, mips - 1, "downsample transitions for {width}x{height}");
            assert_eq!(segments[2].1, mips - 1, "upsample transitions for {width}x{height}");
            assert_eq!(segments[3].1, 1, "composite runs once for {width}x{height}");
        }
    }

    #[test]
    fn test_final_upsample_writes_accumulation_mip_zero_once() {
        let (commands, _) = record_bloom_frame(900, 600);

        // The accumulation texture is the one the composite phase reads at
        // slot 0; its RawId shows up in the upsample phase's slot-1 binds.
        let upsample_accum_mip0 = commands
            .iter()
            .filter(|command| {
                matches!(
                    command,
                    Command::BindRwTexture { slot: 1, mip: 0, .. }
                )
            })
            .count();
        assert_eq!(upsample_accum_mip0, 1);
    }

    #[test]
    fn test_one_by_one_input_still_composites() {
        // A 1×1 chain has a single mip: no transitions, threshold and
        // composite only.
        let (commands, mips) = record_bloom_frame(1, 1);
        assert_eq!(mips, 1);
        let segments = dispatches_per_pipeline(&commands);
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[1].1, 0);
        assert_eq!(segments[2].1, 0);
    }

    #[test]
    fn test_dispatch_grids_cover_target_mips() {
        let (commands, _) = record_bloom_frame(900, 600);
        let mut dispatches = commands.iter().filter_map(|command| match command {
            Command::Dispatch { x, y, .. } => Some((*x, *y)),
            _ => None,
        });

        // Threshold covers the full resolution…
        assert_eq!(dispatches.next(), Some((compute_grid(900), compute_grid(600))));
        // …and the first downsample covers the half-resolution target mip.
        assert_eq!(dispatches.next(), Some((compute_grid(450), compute_grid(300))));
    }

    #[test]
    fn test_mip_extent_floors_at_one_texel() {
        assert_eq!(mip_extent(900, 0), 900);
        assert_eq!(mip_extent(900, 1), 450);
        assert_eq!(mip_extent(900, 9), 1);
        assert_eq!(mip_extent(3, 5), 1);
    }
}
