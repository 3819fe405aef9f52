//! Core backend abstraction traits
//!
//! [`NavigationBackend`] is the slice of a renderer the navigation controls
//! need: owning render targets, running the depth blit pass, reading pixels
//! back and presenting a color buffer.

use crate::backend::types::*;
use std::sync::Arc;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to initialize backend: {0}")]
    InitializationFailed(String),
    #[error("Failed to create device: {0}")]
    DeviceCreationFailed(String),
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to create pipeline: {0}")]
    PipelineCreationFailed(String),
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),
    #[error("No render target is active")]
    NoActiveRenderTarget,
    #[error("Format mismatch: expected {expected:?}, found {found:?}")]
    FormatMismatch {
        expected: TextureFormat,
        found: TextureFormat,
    },
    #[error("Pixel readback failed: {0}")]
    ReadbackFailed(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Backend shared between the host renderer and the navigation controls
pub type SharedBackend<B> = Arc<parking_lot::Mutex<B>>;

/// Handle to a render target (color attachment plus optional depth)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle(pub(crate) u64);

/// Handle to a depth blit pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthBlitHandle(pub(crate) u64);

/// Renderer capabilities consumed by the navigation controls
pub trait NavigationBackend {
    /// Logical viewport size
    fn size(&self) -> (u32, u32);

    /// Physical pixels per logical pixel
    fn pixel_ratio(&self) -> f32;

    /// Viewport size in physical pixels, never zero
    fn drawing_buffer_size(&self) -> (u32, u32) {
        let (width, height) = self.size();
        let ratio = self.pixel_ratio();
        (
            ((width as f32 * ratio).round() as u32).max(1),
            ((height as f32 * ratio).round() as u32).max(1),
        )
    }

    // Render targets

    /// Create a render target
    fn create_render_target(
        &mut self,
        desc: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle>;

    /// Reallocate a render target at a new size. Contents are discarded.
    fn resize_render_target(
        &mut self,
        target: RenderTargetHandle,
        width: u32,
        height: u32,
    ) -> BackendResult<()>;

    /// Pixel size of a render target
    fn render_target_size(&self, target: RenderTargetHandle) -> Option<(u32, u32)>;

    /// Destroy a render target
    fn destroy_render_target(&mut self, target: RenderTargetHandle);

    /// Currently active render target
    fn render_target(&self) -> Option<RenderTargetHandle>;

    /// Bind a render target for subsequent draws. `None` selects the surface.
    fn set_render_target(&mut self, target: Option<RenderTargetHandle>);

    // Depth blit

    /// Create the full-screen pass that copies a depth attachment into color
    fn create_depth_blit(&mut self) -> BackendResult<DepthBlitHandle>;

    /// Destroy a depth blit pipeline
    fn destroy_depth_blit(&mut self, blit: DepthBlitHandle);

    /// Draw the depth attachment of `source` into every channel of the active
    /// render target
    fn draw_depth_blit(
        &mut self,
        blit: DepthBlitHandle,
        source: RenderTargetHandle,
    ) -> BackendResult<()>;

    // Readback and presentation

    /// Read an RGBA float region of a render target's color attachment.
    ///
    /// Coordinates use a bottom-left origin. `out` receives
    /// `width * height * 4` floats, rows ordered bottom to top.
    fn read_render_target_pixels(
        &mut self,
        target: RenderTargetHandle,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        out: &mut [f32],
    ) -> BackendResult<()>;

    /// Copy the color attachment of `source` to the visible surface
    fn present(&mut self, source: RenderTargetHandle) -> BackendResult<()>;
}
