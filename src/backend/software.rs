//! CPU backend for headless hosts and testing.
//!
//! Render targets live in host memory. The host writes scene depth directly
//! with [`SoftwareBackend::write_depth`] instead of rasterizing on a GPU; the
//! depth blit, readback and present paths behave like the wgpu backend,
//! including the bottom-left readback origin.

use std::collections::{HashMap, HashSet};

use crate::backend::traits::*;
use crate::backend::types::*;

/// Counters for the work a [`SoftwareBackend`] has performed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftwareStats {
    pub depth_blits: u64,
    pub pixel_reads: u64,
    pub presents: u64,
}

#[derive(Debug)]
struct SoftwareTarget {
    desc: RenderTargetDescriptor,
    /// Row-major, top row first
    color: Vec<[f32; 4]>,
    depth: Option<Vec<f32>>,
}

impl SoftwareTarget {
    fn new(desc: RenderTargetDescriptor) -> Self {
        let pixels = (desc.width * desc.height) as usize;
        Self {
            color: vec![[0.0; 4]; pixels],
            depth: desc.depth.then(|| vec![1.0; pixels]),
            desc,
        }
    }
}

/// Render targets in host memory
#[derive(Debug)]
pub struct SoftwareBackend {
    size: (u32, u32),
    pixel_ratio: f32,
    targets: HashMap<u64, SoftwareTarget>,
    blits: HashSet<u64>,
    next_id: u64,
    active_target: Option<RenderTargetHandle>,
    canvas: Vec<[f32; 4]>,
    stats: SoftwareStats,
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width.max(1), height.max(1)),
            pixel_ratio: 1.0,
            targets: HashMap::new(),
            blits: HashSet::new(),
            next_id: 1,
            active_target: None,
            canvas: Vec::new(),
            stats: SoftwareStats::default(),
        }
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Software Backend"
    }

    /// Change the logical viewport size. Render targets are not resized.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
    }

    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        if ratio > 0.0 && ratio.is_finite() {
            self.pixel_ratio = ratio;
        }
    }

    pub fn stats(&self) -> SoftwareStats {
        self.stats
    }

    pub fn render_target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn depth_blit_count(&self) -> usize {
        self.blits.len()
    }

    /// Pixels last copied to the surface by [`NavigationBackend::present`]
    pub fn canvas(&self) -> &[[f32; 4]] {
        &self.canvas
    }

    /// Overwrite the depth attachment, rows top to bottom
    pub fn write_depth(&mut self, target: RenderTargetHandle, depth: &[f32]) -> BackendResult<()> {
        let target = self.target_mut(target)?;
        let buffer = target.depth.as_mut().ok_or_else(|| {
            BackendError::InvalidHandle("render target has no depth attachment".to_string())
        })?;
        if buffer.len() != depth.len() {
            return Err(BackendError::ReadbackFailed(format!(
                "expected {} depth values, got {}",
                buffer.len(),
                depth.len()
            )));
        }
        buffer.copy_from_slice(depth);
        Ok(())
    }

    /// Fill the whole depth attachment with one value
    pub fn fill_depth(&mut self, target: RenderTargetHandle, value: f32) -> BackendResult<()> {
        let target = self.target_mut(target)?;
        let buffer = target.depth.as_mut().ok_or_else(|| {
            BackendError::InvalidHandle("render target has no depth attachment".to_string())
        })?;
        buffer.fill(value);
        Ok(())
    }

    /// Fill the color attachment
    pub fn fill_color(&mut self, target: RenderTargetHandle, color: [f32; 4]) -> BackendResult<()> {
        self.target_mut(target)?.color.fill(color);
        Ok(())
    }

    /// Depth attachment contents, rows top to bottom
    pub fn depth(&self, target: RenderTargetHandle) -> Option<&[f32]> {
        self.targets.get(&target.0)?.depth.as_deref()
    }

    /// Color attachment contents, rows top to bottom
    pub fn color(&self, target: RenderTargetHandle) -> Option<&[[f32; 4]]> {
        self.targets.get(&target.0).map(|t| t.color.as_slice())
    }

    fn target_mut(&mut self, target: RenderTargetHandle) -> BackendResult<&mut SoftwareTarget> {
        self.targets
            .get_mut(&target.0)
            .ok_or_else(|| BackendError::InvalidHandle(format!("render target {:?}", target)))
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl NavigationBackend for SoftwareBackend {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn create_render_target(
        &mut self,
        desc: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::TextureCreationFailed(format!(
                "{:?} has zero size",
                desc.label
            )));
        }
        log::trace!(
            "SoftwareBackend: creating render target {:?} ({}x{})",
            desc.label,
            desc.width,
            desc.height
        );
        let id = self.allocate_id();
        self.targets.insert(id, SoftwareTarget::new(desc.clone()));
        Ok(RenderTargetHandle(id))
    }

    fn resize_render_target(
        &mut self,
        target: RenderTargetHandle,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        let existing = self.target_mut(target)?;
        let mut desc = existing.desc.clone();
        desc.width = width.max(1);
        desc.height = height.max(1);
        *existing = SoftwareTarget::new(desc);
        Ok(())
    }

    fn render_target_size(&self, target: RenderTargetHandle) -> Option<(u32, u32)> {
        self.targets
            .get(&target.0)
            .map(|t| (t.desc.width, t.desc.height))
    }

    fn destroy_render_target(&mut self, target: RenderTargetHandle) {
        self.targets.remove(&target.0);
        if self.active_target == Some(target) {
            self.active_target = None;
        }
    }

    fn render_target(&self) -> Option<RenderTargetHandle> {
        self.active_target
    }

    fn set_render_target(&mut self, target: Option<RenderTargetHandle>) {
        self.active_target = target;
    }

    fn create_depth_blit(&mut self) -> BackendResult<DepthBlitHandle> {
        let id = self.allocate_id();
        self.blits.insert(id);
        Ok(DepthBlitHandle(id))
    }

    fn destroy_depth_blit(&mut self, blit: DepthBlitHandle) {
        self.blits.remove(&blit.0);
    }

    fn draw_depth_blit(
        &mut self,
        blit: DepthBlitHandle,
        source: RenderTargetHandle,
    ) -> BackendResult<()> {
        if !self.blits.contains(&blit.0) {
            return Err(BackendError::InvalidHandle(format!("depth blit {:?}", blit)));
        }
        let active = self.active_target.ok_or(BackendError::NoActiveRenderTarget)?;
        if active == source {
            return Err(BackendError::Unsupported(
                "depth blit cannot write into its own source".to_string(),
            ));
        }

        let (source_width, source_height, source_depth) = {
            let source = self
                .targets
                .get(&source.0)
                .ok_or_else(|| BackendError::InvalidHandle(format!("render target {:?}", source)))?;
            let depth = source.depth.clone().ok_or_else(|| {
                BackendError::InvalidHandle("blit source has no depth attachment".to_string())
            })?;
            (source.desc.width, source.desc.height, depth)
        };

        let target = self.target_mut(active)?;
        if target.desc.color_format != TextureFormat::Rgba32Float {
            return Err(BackendError::FormatMismatch {
                expected: TextureFormat::Rgba32Float,
                found: target.desc.color_format,
            });
        }

        let (width, height) = (target.desc.width, target.desc.height);
        for row in 0..height {
            // Nearest texel under the fragment center, as the WGSL pass does
            let source_row = (((row as f32 + 0.5) / height as f32 * source_height as f32) as u32)
                .min(source_height - 1);
            for col in 0..width {
                let source_col = (((col as f32 + 0.5) / width as f32 * source_width as f32)
                    as u32)
                    .min(source_width - 1);
                let depth = source_depth[(source_row * source_width + source_col) as usize];
                target.color[(row * width + col) as usize] = [depth, depth, depth, 1.0];
            }
        }

        self.stats.depth_blits += 1;
        Ok(())
    }

    fn read_render_target_pixels(
        &mut self,
        target: RenderTargetHandle,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        out: &mut [f32],
    ) -> BackendResult<()> {
        let target = self
            .targets
            .get(&target.0)
            .ok_or_else(|| BackendError::InvalidHandle(format!("render target {:?}", target)))?;
        let (target_width, target_height) = (target.desc.width, target.desc.height);

        if x + width > target_width || y + height > target_height {
            return Err(BackendError::ReadbackFailed(format!(
                "region {}x{} at ({}, {}) exceeds {}x{}",
                width, height, x, y, target_width, target_height
            )));
        }
        if out.len() < (width * height * 4) as usize {
            return Err(BackendError::ReadbackFailed(
                "output buffer too small".to_string(),
            ));
        }

        for region_row in 0..height {
            // Bottom-left origin: row y counts up from the last stored row
            let stored_row = target_height - 1 - (y + region_row);
            for region_col in 0..width {
                let pixel = target.color[(stored_row * target_width + x + region_col) as usize];
                let offset = ((region_row * width + region_col) * 4) as usize;
                out[offset..offset + 4].copy_from_slice(&pixel);
            }
        }

        self.stats.pixel_reads += 1;
        Ok(())
    }

    fn present(&mut self, source: RenderTargetHandle) -> BackendResult<()> {
        let color = self
            .targets
            .get(&source.0)
            .map(|t| t.color.clone())
            .ok_or_else(|| BackendError::InvalidHandle(format!("render target {:?}", source)))?;
        self.canvas = color;
        self.stats.presents += 1;
        Ok(())
    }
}
