//! Screen to world unprojection

use glam::{Vec2, Vec3};

use crate::scene::Camera;
use crate::surface::SurfaceRect;

/// A cursor position resolved against the depth buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorSample {
    pub ndc: Vec2,
    /// NDC depth after clamping against the scene back bound
    pub depth: f32,
    pub world: Vec3,
}

/// Client coordinates to NDC, relative to the surface rectangle
pub fn client_to_ndc(surface: &SurfaceRect, client: Vec2) -> Vec2 {
    if surface.width <= 0.0 || surface.height <= 0.0 {
        return Vec2::ZERO;
    }
    let x = client.x - surface.left;
    let y = client.y - surface.top;
    Vec2::new((x / surface.width) * 2.0 - 1.0, 1.0 - (y / surface.height) * 2.0)
}

/// Unproject an NDC point at the sampled depth.
///
/// Depth is limited to `bounding_depth` so empty background resolves to
/// the back of the scene bounds instead of the far plane.
pub fn unproject_with_depth(
    camera: &Camera,
    ndc: Vec2,
    sampled_depth: f32,
    bounding_depth: f32,
) -> CursorSample {
    let depth = sampled_depth.min(bounding_depth);
    CursorSample {
        ndc,
        depth,
        world: camera.unproject(ndc.extend(depth)),
    }
}
