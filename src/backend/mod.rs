//! Backend abstraction layer
//!
//! Provides the renderer capabilities the navigation controls consume and
//! two implementations: wgpu for real surfaces and a CPU backend for
//! headless hosts.

pub mod software;
pub mod traits;
pub mod types;
#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

pub use software::{SoftwareBackend, SoftwareStats};
pub use traits::*;
pub use types::*;
#[cfg(feature = "wgpu-backend")]
pub use wgpu_backend::{RenderTargetViews, WgpuBackend};
