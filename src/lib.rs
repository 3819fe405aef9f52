//! World-in-hand camera navigation
//!
//! Navigation driven by the depth buffer of the rendered scene: zoom toward
//! the point under the cursor, rotate around a pivot anchored in the scene
//! and pan along a height plane under the cursor, while keeping the camera
//! inside limits derived from the scene bounds.
//!
//! This crate supports two backends:
//! - **wgpu**: GPU render targets, depth blit pass and pixel readback
//! - **Software**: CPU render targets for headless hosts and tests
//!
//! # Features
//! - Depth-buffer based screen to world unprojection
//! - Zoom, rotate and pan with distance, ground plane and elevation limits
//! - Mouse and two-finger touch gestures
//! - winit input translation
//! - Optional debug gizmos for the navigation state

pub mod backend;
pub mod math;
pub mod navigation;
pub mod resources;
pub mod scene;
pub mod surface;

pub use backend::{BackendError, BackendResult, NavigationBackend, SharedBackend, SoftwareBackend};
#[cfg(feature = "wgpu-backend")]
pub use backend::WgpuBackend;
pub use navigation::{
    ButtonRoles, ControlsEvent, GroundPlaneSource, NavigationInput, RotationPivot,
    WorldInHandControls,
};
pub use scene::{Camera, Scene, SceneEvent, SceneObject, SharedCamera, SharedScene};
pub use surface::{PointerTranslator, SurfaceRect};

/// Configuration for the navigation controls
#[derive(Debug, Clone)]
pub struct NavigationConfig {
    /// Look at the scene bounds center instead of where the view meets the ground
    pub look_at_scene_center: bool,
    /// Sample count of the navigation target
    pub msaa_samples: u32,
    /// Where the ground plane height comes from
    pub ground_plane: GroundPlaneSource,
    /// Allow rotating the camera below the ground plane
    pub allow_rotation_below_ground_plane: bool,
    /// What rotation orbits around
    pub rotation_pivot: RotationPivot,
    /// Mouse buttons for rotate and pan
    pub buttons: ButtonRoles,
    /// Radians of rotation per pixel of drag
    pub rotate_speed: f32,
    /// Zoom per pinch spread, relative to the larger surface dimension
    pub pinch_zoom_scale: f32,
    /// Bounding rectangle of the surface input coordinates refer to
    pub surface: SurfaceRect,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            look_at_scene_center: false,
            msaa_samples: 1,
            ground_plane: GroundPlaneSource::BoundingBoxBottom,
            allow_rotation_below_ground_plane: true,
            rotation_pivot: RotationPivot::LookAt,
            buttons: ButtonRoles::default(),
            rotate_speed: 0.005,
            pinch_zoom_scale: 5.0,
            surface: SurfaceRect::default(),
        }
    }
}
