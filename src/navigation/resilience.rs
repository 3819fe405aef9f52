//! Navigation limits derived from the scene bounds
//!
//! Keeps the camera within [`MAX_DISTANCE_MULTIPLIER`] bounding radii of the
//! scene, away from the ground plane and off the up axis.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;

use crate::math::{angle_to_up, Aabb, BoundingSphere};
use crate::scene::{Camera, Scene};

/// Maximum camera distance from the bounds center, in bounding radii
pub const MAX_DISTANCE_MULTIPLIER: f32 = 5.0;

/// Smallest elevation angle rotation may reach
pub const MIN_ELEVATION_ANGLE: f32 = 0.001;

/// Largest elevation angle when rotation below the ground plane is allowed
pub const MAX_ELEVATION_BELOW_GROUND: f32 = PI - MIN_ELEVATION_ANGLE;

/// Largest elevation angle when the camera must stay above the ground plane
pub const MAX_ELEVATION_ABOVE_GROUND: f32 = FRAC_PI_2;

/// Where the ground plane height comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundPlaneSource {
    /// Bottom of the scene bounding box
    #[default]
    BoundingBoxBottom,
    /// Fixed at y = 0
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResilienceState {
    Uninitialized,
    Bound,
}

#[derive(Debug, Clone)]
pub struct ResilienceTracker {
    state: ResilienceState,
    ground_plane_source: GroundPlaneSource,
    allow_rotation_below_ground_plane: bool,

    bounds: Aabb,
    bounding_sphere: BoundingSphere,
    max_pan_zoom_distance: f32,
    ground_plane_height: f32,
    max_rotation_angle: f32,

    elevation_angle: f32,
    bounding_depth_ndc: f32,
    scene_back_point: Vec3,

    empty_scene_warned: bool,
}

impl ResilienceTracker {
    pub fn new(ground_plane_source: GroundPlaneSource, allow_rotation_below_ground_plane: bool) -> Self {
        Self {
            state: ResilienceState::Uninitialized,
            ground_plane_source,
            allow_rotation_below_ground_plane,
            bounds: Aabb::EMPTY,
            bounding_sphere: BoundingSphere::EMPTY,
            max_pan_zoom_distance: 0.0,
            ground_plane_height: 0.0,
            max_rotation_angle: Self::rotation_limit(allow_rotation_below_ground_plane),
            elevation_angle: FRAC_PI_2,
            bounding_depth_ndc: 1.0,
            scene_back_point: Vec3::ZERO,
            empty_scene_warned: false,
        }
    }

    fn rotation_limit(allow_below: bool) -> f32 {
        if allow_below {
            MAX_ELEVATION_BELOW_GROUND
        } else {
            MAX_ELEVATION_ABOVE_GROUND
        }
    }

    pub fn state(&self) -> ResilienceState {
        self.state
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere
    }

    pub fn max_pan_zoom_distance(&self) -> f32 {
        self.max_pan_zoom_distance
    }

    pub fn ground_plane_height(&self) -> f32 {
        self.ground_plane_height
    }

    pub fn ground_plane_source(&self) -> GroundPlaneSource {
        self.ground_plane_source
    }

    pub fn max_rotation_angle(&self) -> f32 {
        self.max_rotation_angle
    }

    pub fn allow_rotation_below_ground_plane(&self) -> bool {
        self.allow_rotation_below_ground_plane
    }

    pub fn elevation_angle(&self) -> f32 {
        self.elevation_angle
    }

    /// NDC depth of the back of the bounding sphere along the view direction
    pub fn bounding_depth_ndc(&self) -> f32 {
        self.bounding_depth_ndc
    }

    pub fn scene_back_point(&self) -> Vec3 {
        self.scene_back_point
    }

    /// Whether the scene bounds are usable as navigation limits
    pub fn limits_active(&self) -> bool {
        self.state == ResilienceState::Bound && !self.bounding_sphere.is_degenerate()
    }

    /// Recompute bounds, limits and back depth from the scene.
    ///
    /// An empty scene disables the distance limit and warns once per tracker.
    pub fn recompute_bounds(&mut self, scene: &Scene, camera: &Camera) {
        self.bounds = scene.bounds();
        self.bounding_sphere = self.bounds.bounding_sphere();
        self.state = ResilienceState::Bound;

        if self.bounding_sphere.is_degenerate() {
            self.max_pan_zoom_distance = 0.0;
            if !self.empty_scene_warned {
                log::warn!(
                    "Scene has no renderable content; pan and zoom limits are disabled until content is added"
                );
                self.empty_scene_warned = true;
            }
        } else {
            self.max_pan_zoom_distance = self.bounding_sphere.radius * MAX_DISTANCE_MULTIPLIER;
        }

        self.recompute_ground_plane_height();
        self.max_rotation_angle = Self::rotation_limit(self.allow_rotation_below_ground_plane);
        self.update_furthest_scene_depth(camera);

        log::debug!(
            "Navigation bounds: center {:?}, radius {}, max distance {}, ground {}",
            self.bounding_sphere.center,
            self.bounding_sphere.radius,
            self.max_pan_zoom_distance,
            self.ground_plane_height
        );
    }

    fn recompute_ground_plane_height(&mut self) {
        self.ground_plane_height = match self.ground_plane_source {
            GroundPlaneSource::BoundingBoxBottom if !self.bounds.is_empty() => self.bounds.min.y,
            _ => 0.0,
        };
    }

    pub fn set_ground_plane_source(&mut self, source: GroundPlaneSource) {
        self.ground_plane_source = source;
        self.recompute_ground_plane_height();
    }

    pub fn set_allow_rotation_below_ground_plane(&mut self, allow: bool) {
        self.allow_rotation_below_ground_plane = allow;
        self.max_rotation_angle = Self::rotation_limit(allow);
    }

    /// Elevation of the camera above the look-at point projected onto the
    /// ground plane, clamped into `[MIN_ELEVATION_ANGLE, max_rotation_angle]`.
    /// Warns when the camera sits on the up axis.
    pub fn recompute_elevation_angle(&mut self, camera: &Camera, look_at: Vec3) -> f32 {
        let reference = Vec3::new(look_at.x, self.ground_plane_height, look_at.z);
        match angle_to_up(camera.position - reference) {
            Some(angle) => {
                if angle <= 0.0 || angle >= PI {
                    // The view matrix of a camera looking along the up axis is
                    // NaN, so zoom and pan reject until a rotation leaves the axis
                    log::warn!(
                        "Camera position is on the up axis of its look-at point; rotation will be clamped off the axis"
                    );
                }
                self.elevation_angle = angle.clamp(MIN_ELEVATION_ANGLE, self.max_rotation_angle);
            }
            None => {
                log::warn!(
                    "Camera position coincides with its ground reference point; navigation may misbehave"
                );
            }
        }
        self.elevation_angle
    }

    /// Store the elevation reached by a rotation
    pub fn set_elevation_angle(&mut self, angle: f32) {
        self.elevation_angle = angle;
    }

    /// Clamp `current - delta` into `[MIN_ELEVATION_ANGLE, max_rotation_angle]`
    pub fn clamp_elevation(&self, current: f32, delta: f32) -> f32 {
        (current - delta)
            .min(self.max_rotation_angle)
            .max(MIN_ELEVATION_ANGLE)
    }

    /// Whether a camera position respects the distance limit
    pub fn allows_camera_position(&self, position: Vec3) -> bool {
        if !self.limits_active() {
            return true;
        }
        position.distance(self.bounding_sphere.center) <= self.max_pan_zoom_distance
    }

    /// Whether moving between two heights crosses the ground plane
    pub fn crosses_ground_plane(&self, current_y: f32, next_y: f32) -> bool {
        (next_y - self.ground_plane_height) * (current_y - self.ground_plane_height) < 0.0
    }

    /// Recompute the back-of-bounds depth for the camera's current view
    pub fn update_furthest_scene_depth(&mut self, camera: &Camera) {
        let forward = camera.forward();
        if self.bounding_sphere.is_degenerate() || forward == Vec3::ZERO {
            self.scene_back_point = self.bounding_sphere.center;
            self.bounding_depth_ndc = 1.0;
            return;
        }

        self.scene_back_point = self.bounding_sphere.center + forward * self.bounding_sphere.radius;
        let view_distance = (self.scene_back_point - camera.position).dot(forward);
        self.bounding_depth_ndc = if view_distance <= camera.near() {
            // Whole scene behind the near plane: nothing to clamp against
            1.0
        } else {
            camera.project(self.scene_back_point).z.clamp(-1.0, 1.0)
        };
    }
}
