//! Zoom, rotate and pan
//!
//! Each step is computed from copies of the camera state and either yields
//! the new state or `None` when the step is rejected. The controls commit
//! accepted steps in one write.

use glam::{Quat, Vec2, Vec3};

use crate::math::{angle_to_up, Plane, Ray, UP};
use crate::navigation::resilience::ResilienceTracker;
use crate::scene::Camera;

/// Zoom never moves the camera closer to geometry than this many near distances
pub const NEAR_PLANE_MARGIN: f32 = 1.1;

/// Fraction of the cursor distance covered by one zoom-in step
pub const ZOOM_IN_FACTOR: f32 = 0.25;

/// Fraction of the cursor distance covered by one zoom-out step.
///
/// Chosen so a zoom in followed by a zoom out at the same cursor position
/// lands close to the starting distance.
pub const ZOOM_OUT_FACTOR: f32 = 0.33;

/// What the camera orbits around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationPivot {
    /// The look-at point in the middle of the screen
    #[default]
    LookAt,
    /// The scene point under the cursor when the gesture began
    Cursor,
}

/// Camera offset for one zoom step toward `cursor_world`.
///
/// Positive `direction` zooms in. The cursor vector is first shortened so
/// the target stays beyond the near plane margin, measured along the
/// cursor ray. `None` when the cursor point already sits inside that margin.
pub fn zoom_offset(camera: &Camera, cursor_world: Vec3, direction: f32) -> Option<Vec3> {
    if direction == 0.0 || !direction.is_finite() {
        return None;
    }

    let to_cursor = cursor_world - camera.position;
    let depth = to_cursor.dot(camera.forward());
    if depth <= 0.0 {
        return None;
    }

    let near_limit = (depth - camera.near() * NEAR_PLANE_MARGIN) / depth;
    if near_limit <= 0.0 {
        return None;
    }

    let factor = if direction < 0.0 {
        ZOOM_OUT_FACTOR * direction
    } else {
        ZOOM_IN_FACTOR * direction
    };
    Some(to_cursor * near_limit * factor)
}

/// Zoom offset that also respects the distance limit and the ground plane
pub fn zoom_step(
    camera: &Camera,
    resilience: &ResilienceTracker,
    cursor_world: Vec3,
    direction: f32,
) -> Option<Vec3> {
    let offset = zoom_offset(camera, cursor_world, direction)?;
    let next = camera.position + offset;

    if !resilience.allows_camera_position(next) {
        log::debug!("Zoom rejected: {:?} exceeds the maximum distance", next);
        return None;
    }
    if resilience.crosses_ground_plane(camera.position.y, next.y) {
        log::debug!("Zoom rejected: {:?} crosses the ground plane", next);
        return None;
    }
    Some(offset)
}

/// Keep the look-at point at `height` after a zoom.
///
/// Casts a ray from the camera through the point found at the screen center
/// and intersects it with the horizontal plane at `height`. Falls back to the
/// center point itself when the ray misses.
pub fn ground_projected_look_at(camera_position: Vec3, center_world: Vec3, height: f32) -> Vec3 {
    Ray::through(camera_position, center_world)
        .intersect_plane(&Plane::horizontal(height))
        .unwrap_or(center_world)
}

/// Result of an accepted rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationStep {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Elevation of the camera above the pivot after the step
    pub elevation: f32,
}

/// Orbit the camera around `pivot`.
///
/// `delta.x` turns about the up axis unconditionally. `delta.y` lowers the
/// elevation angle, clamped to the tracker's range; the applied pitch is the
/// clamped difference. When `pivot` is not the look-at point, the look-at
/// point orbits with the camera. `None` when the orbit would leave the
/// distance limit.
pub fn rotation_step(
    position: Vec3,
    look_at: Vec3,
    pivot: Vec3,
    delta: Vec2,
    resilience: &ResilienceTracker,
) -> Option<RotationStep> {
    let pivot_to_camera = position - pivot;
    let current = angle_to_up(pivot_to_camera)?;

    let next = resilience.clamp_elevation(current, delta.y);
    let applied = current - next;
    if applied.abs() <= f32::EPSILON && delta.x == 0.0 {
        return None;
    }

    let mut axis = pivot_to_camera.cross(UP).normalize_or_zero();
    if axis == Vec3::ZERO {
        axis = Vec3::X;
    }
    let rotation = Quat::from_rotation_y(-delta.x) * Quat::from_axis_angle(axis, applied);

    let next_position = pivot + rotation * pivot_to_camera;
    if !resilience.allows_camera_position(next_position) {
        log::debug!("Rotation rejected: {:?} exceeds the maximum distance", next_position);
        return None;
    }

    Some(RotationStep {
        position: next_position,
        look_at: pivot + rotation * (look_at - pivot),
        elevation: next,
    })
}

/// Camera translation for a pan drag of `delta`, or `None` when the moved
/// camera would leave the distance limit. Dragging moves the scene, so the
/// camera moves the opposite way.
pub fn pan_step(position: Vec3, delta: Vec3, resilience: &ResilienceTracker) -> Option<Vec3> {
    let offset = -delta;
    let next = position + offset;
    if !resilience.allows_camera_position(next) {
        log::debug!("Pan rejected: {:?} exceeds the maximum distance", next);
        return None;
    }
    Some(offset)
}
