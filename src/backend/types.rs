//! Common types shared between backends

/// Texture format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba32Float,
    Depth32Float,
}

impl TextureFormat {
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::Depth32Float)
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Rgba8Unorm | TextureFormat::Depth32Float => 4,
            TextureFormat::Rgba32Float => 16,
        }
    }
}

/// Render target descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub color_format: TextureFormat,
    /// Attach a sampleable `Depth32Float` depth texture
    pub depth: bool,
    pub sample_count: u32,
}

impl RenderTargetDescriptor {
    /// Target the host renders the navigated scene into
    pub fn navigation(width: u32, height: u32, sample_count: u32) -> Self {
        Self {
            label: Some("navigation target".to_string()),
            width,
            height,
            color_format: TextureFormat::Rgba8Unorm,
            depth: true,
            sample_count: sample_count.max(1),
        }
    }

    /// Float color target the depth blit writes into
    pub fn depth_readback(width: u32, height: u32) -> Self {
        Self {
            label: Some("depth readback target".to_string()),
            width,
            height,
            color_format: TextureFormat::Rgba32Float,
            depth: false,
            sample_count: 1,
        }
    }
}
