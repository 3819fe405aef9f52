//! Depth sampling
//!
//! Copies the depth attachment of the navigation target into a float color
//! target with a full-screen pass, then reads single pixels back as NDC
//! depth.

use glam::Vec2;

use crate::backend::{
    BackendResult, DepthBlitHandle, NavigationBackend, RenderTargetDescriptor, RenderTargetHandle,
};

/// Pixel containing an NDC point, clamped into the target.
///
/// Uses `pixel = ndc * dimension / 2 + dimension / 2` with a bottom-left
/// origin.
pub fn ndc_to_pixel(ndc: Vec2, width: u32, height: u32) -> (u32, u32) {
    let to_pixel = |value: f32, dimension: u32| -> u32 {
        let half = dimension as f32 / 2.0;
        let pixel = (value * half + half).floor();
        // NaN saturates to 0 in the cast
        (pixel.max(0.0) as u32).min(dimension.saturating_sub(1))
    };
    (to_pixel(ndc.x, width), to_pixel(ndc.y, height))
}

/// Raw depth buffer value to NDC depth in `[-1, 1]`
pub fn raw_depth_to_ndc(raw: f32) -> f32 {
    if raw.is_nan() {
        return 1.0;
    }
    raw.clamp(0.0, 1.0) * 2.0 - 1.0
}

/// Owns the readback target and the depth blit pass
#[derive(Debug)]
pub struct DepthSampler {
    target: RenderTargetHandle,
    blit: DepthBlitHandle,
}

impl DepthSampler {
    pub fn new<B: NavigationBackend + ?Sized>(
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> BackendResult<Self> {
        let target =
            backend.create_render_target(&RenderTargetDescriptor::depth_readback(width, height))?;
        let blit = match backend.create_depth_blit() {
            Ok(blit) => blit,
            Err(e) => {
                backend.destroy_render_target(target);
                return Err(e);
            }
        };
        Ok(Self { target, blit })
    }

    /// Float target the depth is copied into
    pub fn target(&self) -> RenderTargetHandle {
        self.target
    }

    pub fn resize<B: NavigationBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        backend.resize_render_target(self.target, width, height)
    }

    /// Copy the depth of `source` into the readback target.
    ///
    /// Restores whichever render target was active before.
    pub fn render<B: NavigationBackend + ?Sized>(
        &self,
        backend: &mut B,
        source: RenderTargetHandle,
    ) -> BackendResult<()> {
        let previous = backend.render_target();
        backend.set_render_target(Some(self.target));
        let result = backend.draw_depth_blit(self.blit, source);
        backend.set_render_target(previous);
        result
    }

    /// NDC depth of the last rendered copy at an NDC point
    pub fn read_depth_at<B: NavigationBackend + ?Sized>(
        &self,
        backend: &mut B,
        ndc: Vec2,
    ) -> BackendResult<f32> {
        // Query the live size so a resize is never read with stale dimensions
        let (width, height) = backend.render_target_size(self.target).ok_or_else(|| {
            crate::backend::BackendError::InvalidHandle("depth readback target".to_string())
        })?;
        let (x, y) = ndc_to_pixel(ndc, width, height);

        let mut pixel = [0.0f32; 4];
        backend.read_render_target_pixels(self.target, x, y, 1, 1, &mut pixel)?;
        let depth = raw_depth_to_ndc(pixel[0]);
        log::trace!("depth at {:?} (pixel {}, {}) = {}", ndc, x, y, depth);
        Ok(depth)
    }

    /// Render then read in one call
    pub fn sample<B: NavigationBackend + ?Sized>(
        &self,
        backend: &mut B,
        source: RenderTargetHandle,
        ndc: Vec2,
    ) -> BackendResult<f32> {
        self.render(backend, source)?;
        self.read_depth_at(backend, ndc)
    }

    /// Free the backend resources. The sampler must not be used afterwards.
    pub fn release<B: NavigationBackend + ?Sized>(&self, backend: &mut B) {
        backend.destroy_depth_blit(self.blit);
        backend.destroy_render_target(self.target);
    }
}
