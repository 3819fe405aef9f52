//! Debug visualisation of the navigation state
//!
//! The controls report every internal state change to a
//! [`NavigationObserver`]. [`GizmoVisualiser`] turns those reports into a
//! line list the host can draw over its scene.

use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use crate::math::BoundingSphere;

/// Receives navigation state changes. Every method defaults to a no-op.
pub trait NavigationObserver {
    /// World position under the cursor after unprojection
    fn on_mouse_world_position(&mut self, _position: Vec3) {}

    fn on_ground_plane_height(&mut self, _height: f32) {}

    /// Plane at the back of the scene bounds, facing the camera
    fn on_back_plane(&mut self, _anchor: Vec3, _normal: Vec3) {}

    fn on_bounds_changed(&mut self, _sphere: BoundingSphere, _max_distance: f32) {}

    /// Height of the plane a pan gesture moves along
    fn on_pan_height_guide(&mut self, _height: f32) {}

    /// Center of the current rotation
    fn on_pivot_changed(&mut self, _pivot: Vec3) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl NavigationObserver for NoopObserver {}

impl<T: NavigationObserver> NavigationObserver for Arc<Mutex<T>> {
    fn on_mouse_world_position(&mut self, position: Vec3) {
        self.lock().on_mouse_world_position(position);
    }

    fn on_ground_plane_height(&mut self, height: f32) {
        self.lock().on_ground_plane_height(height);
    }

    fn on_back_plane(&mut self, anchor: Vec3, normal: Vec3) {
        self.lock().on_back_plane(anchor, normal);
    }

    fn on_bounds_changed(&mut self, sphere: BoundingSphere, max_distance: f32) {
        self.lock().on_bounds_changed(sphere, max_distance);
    }

    fn on_pan_height_guide(&mut self, height: f32) {
        self.lock().on_pan_height_guide(height);
    }

    fn on_pivot_changed(&mut self, pivot: Vec3) {
        self.lock().on_pivot_changed(pivot);
    }
}

/// A gizmo vertex: position + color.
///
/// Every pair of consecutive vertices forms one line segment.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GizmoVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoKind {
    MouseWorldPosition,
    GroundPlane,
    BackPlane,
    BoundingSphere,
    MaxNavigationSphere,
    PanHeightGuide,
    RotationCenter,
}

impl GizmoKind {
    pub const ALL: [GizmoKind; 7] = [
        GizmoKind::MouseWorldPosition,
        GizmoKind::GroundPlane,
        GizmoKind::BackPlane,
        GizmoKind::BoundingSphere,
        GizmoKind::MaxNavigationSphere,
        GizmoKind::PanHeightGuide,
        GizmoKind::RotationCenter,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoStyle {
    pub visible: bool,
    /// Marker size for points, half extent for planes. Spheres use their own radius.
    pub size: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

impl GizmoStyle {
    fn new(size: f32, color: [f32; 3]) -> Self {
        Self {
            visible: false,
            size,
            color,
            opacity: 1.0,
        }
    }

    fn rgba(&self) -> [f32; 4] {
        [self.color[0], self.color[1], self.color[2], self.opacity]
    }
}

/// Visibility changes; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilitySettings {
    pub mouse_world_position: Option<bool>,
    pub ground_plane: Option<bool>,
    pub back_plane: Option<bool>,
    pub bounding_sphere: Option<bool>,
    pub max_navigation_sphere: Option<bool>,
    pub pan_height_guide: Option<bool>,
    pub rotation_center: Option<bool>,
}

impl VisibilitySettings {
    pub fn all(visible: bool) -> Self {
        Self {
            mouse_world_position: Some(visible),
            ground_plane: Some(visible),
            back_plane: Some(visible),
            bounding_sphere: Some(visible),
            max_navigation_sphere: Some(visible),
            pan_height_guide: Some(visible),
            rotation_center: Some(visible),
        }
    }

    fn get(&self, kind: GizmoKind) -> Option<bool> {
        match kind {
            GizmoKind::MouseWorldPosition => self.mouse_world_position,
            GizmoKind::GroundPlane => self.ground_plane,
            GizmoKind::BackPlane => self.back_plane,
            GizmoKind::BoundingSphere => self.bounding_sphere,
            GizmoKind::MaxNavigationSphere => self.max_navigation_sphere,
            GizmoKind::PanHeightGuide => self.pan_height_guide,
            GizmoKind::RotationCenter => self.rotation_center,
        }
    }
}

/// Last reported navigation state
#[derive(Debug, Clone, Copy, Default)]
struct GizmoState {
    mouse_world_position: Option<Vec3>,
    ground_plane_height: Option<f32>,
    back_plane: Option<(Vec3, Vec3)>,
    bounds: Option<(BoundingSphere, f32)>,
    pan_height_guide: Option<f32>,
    pivot: Option<Vec3>,
}

/// Wireframe gizmos for the navigation state. All gizmos start hidden.
#[derive(Debug, Clone)]
pub struct GizmoVisualiser {
    styles: [GizmoStyle; 7],
    state: GizmoState,
    disposed: bool,
}

impl Default for GizmoVisualiser {
    fn default() -> Self {
        Self::new()
    }
}

impl GizmoVisualiser {
    const SEGMENTS: usize = 32;

    pub fn new() -> Self {
        Self {
            styles: [
                GizmoStyle::new(0.1, [1.0, 1.0, 1.0]),
                GizmoStyle::new(5.0, [0.4, 0.8, 0.4]),
                GizmoStyle::new(5.0, [0.8, 0.4, 0.4]),
                GizmoStyle::new(0.0, [1.0, 1.0, 1.0]),
                GizmoStyle::new(0.0, [1.0, 0.6, 0.2]),
                GizmoStyle::new(5.0, [0.4, 0.6, 1.0]),
                GizmoStyle::new(0.2, [1.0, 1.0, 0.2]),
            ],
            state: GizmoState::default(),
            disposed: false,
        }
    }

    pub fn style(&self, kind: GizmoKind) -> &GizmoStyle {
        &self.styles[kind.index()]
    }

    pub fn set_visibility(&mut self, settings: VisibilitySettings) {
        for kind in GizmoKind::ALL {
            if let Some(visible) = settings.get(kind) {
                self.styles[kind.index()].visible = visible;
            }
        }
    }

    pub fn set_visible(&mut self, kind: GizmoKind, visible: bool) {
        self.styles[kind.index()].visible = visible;
    }

    pub fn set_size(&mut self, kind: GizmoKind, size: f32) {
        self.styles[kind.index()].size = size.max(0.0);
    }

    pub fn set_color(&mut self, kind: GizmoKind, color: [f32; 3]) {
        self.styles[kind.index()].color = color;
    }

    pub fn set_opacity(&mut self, kind: GizmoKind, opacity: f32) {
        self.styles[kind.index()].opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Drop all state. Later reports are ignored.
    pub fn dispose(&mut self) {
        self.state = GizmoState::default();
        self.disposed = true;
    }

    fn visible(&self, kind: GizmoKind) -> Option<&GizmoStyle> {
        let style = self.style(kind);
        (style.visible && style.opacity > 0.0).then_some(style)
    }

    /// Line list for every visible gizmo with known state
    pub fn line_vertices(&self) -> Vec<GizmoVertex> {
        let mut vertices = Vec::new();
        if self.disposed {
            return vertices;
        }
        let state = &self.state;

        if let (Some(style), Some(position)) =
            (self.visible(GizmoKind::MouseWorldPosition), state.mouse_world_position)
        {
            push_sphere(&mut vertices, position, style.size, style.rgba());
        }

        // Ground and guide planes are centered under the scene
        let plane_center = state.bounds.map(|(sphere, _)| sphere.center).unwrap_or(Vec3::ZERO);
        if let (Some(style), Some(height)) =
            (self.visible(GizmoKind::GroundPlane), state.ground_plane_height)
        {
            let center = Vec3::new(plane_center.x, height, plane_center.z);
            push_plane(&mut vertices, center, Vec3::X, Vec3::Z, style.size, style.rgba());
        }
        if let (Some(style), Some(height)) =
            (self.visible(GizmoKind::PanHeightGuide), state.pan_height_guide)
        {
            let center = Vec3::new(plane_center.x, height, plane_center.z);
            push_plane(&mut vertices, center, Vec3::X, Vec3::Z, style.size, style.rgba());
        }

        if let (Some(style), Some((anchor, normal))) =
            (self.visible(GizmoKind::BackPlane), state.back_plane)
        {
            let normal = normal.normalize_or_zero();
            if normal != Vec3::ZERO {
                let (axis_a, axis_b) = normal.any_orthonormal_pair();
                push_plane(&mut vertices, anchor, axis_a, axis_b, style.size, style.rgba());
            }
        }

        if let Some((sphere, max_distance)) = state.bounds {
            if !sphere.is_degenerate() {
                if let Some(style) = self.visible(GizmoKind::BoundingSphere) {
                    push_sphere(&mut vertices, sphere.center, sphere.radius, style.rgba());
                }
                if let Some(style) = self.visible(GizmoKind::MaxNavigationSphere) {
                    push_sphere(&mut vertices, sphere.center, max_distance, style.rgba());
                }
            }
        }

        if let (Some(style), Some(pivot)) = (self.visible(GizmoKind::RotationCenter), state.pivot) {
            push_cross(&mut vertices, pivot, style.size, style.rgba());
        }

        vertices
    }
}

impl NavigationObserver for GizmoVisualiser {
    fn on_mouse_world_position(&mut self, position: Vec3) {
        if !self.disposed {
            self.state.mouse_world_position = Some(position);
        }
    }

    fn on_ground_plane_height(&mut self, height: f32) {
        if !self.disposed {
            self.state.ground_plane_height = Some(height);
        }
    }

    fn on_back_plane(&mut self, anchor: Vec3, normal: Vec3) {
        if !self.disposed {
            self.state.back_plane = Some((anchor, normal));
        }
    }

    fn on_bounds_changed(&mut self, sphere: BoundingSphere, max_distance: f32) {
        if !self.disposed {
            self.state.bounds = Some((sphere, max_distance));
        }
    }

    fn on_pan_height_guide(&mut self, height: f32) {
        if !self.disposed {
            self.state.pan_height_guide = Some(height);
        }
    }

    fn on_pivot_changed(&mut self, pivot: Vec3) {
        if !self.disposed {
            self.state.pivot = Some(pivot);
        }
    }
}

fn push_line(vertices: &mut Vec<GizmoVertex>, start: Vec3, end: Vec3, color: [f32; 4]) {
    vertices.push(GizmoVertex {
        position: start.to_array(),
        color,
    });
    vertices.push(GizmoVertex {
        position: end.to_array(),
        color,
    });
}

fn push_circle(
    vertices: &mut Vec<GizmoVertex>,
    center: Vec3,
    radius: f32,
    axis_a: Vec3,
    axis_b: Vec3,
    color: [f32; 4],
) {
    let mut prev = center + axis_a * radius;
    for i in 1..=GizmoVisualiser::SEGMENTS {
        let angle = (i as f32) * std::f32::consts::TAU / GizmoVisualiser::SEGMENTS as f32;
        let (sin, cos) = angle.sin_cos();
        let point = center + (axis_a * cos + axis_b * sin) * radius;
        push_line(vertices, prev, point, color);
        prev = point;
    }
}

/// Three great circles
fn push_sphere(vertices: &mut Vec<GizmoVertex>, center: Vec3, radius: f32, color: [f32; 4]) {
    push_circle(vertices, center, radius, Vec3::X, Vec3::Y, color);
    push_circle(vertices, center, radius, Vec3::X, Vec3::Z, color);
    push_circle(vertices, center, radius, Vec3::Y, Vec3::Z, color);
}

fn push_cross(vertices: &mut Vec<GizmoVertex>, center: Vec3, size: f32, color: [f32; 4]) {
    let half = size * 0.5;
    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
        push_line(vertices, center - axis * half, center + axis * half, color);
    }
}

/// Square outline plus diagonals
fn push_plane(
    vertices: &mut Vec<GizmoVertex>,
    center: Vec3,
    axis_a: Vec3,
    axis_b: Vec3,
    half_extent: f32,
    color: [f32; 4],
) {
    let a = axis_a * half_extent;
    let b = axis_b * half_extent;
    let corners = [center - a - b, center + a - b, center + a + b, center - a + b];
    for i in 0..4 {
        push_line(vertices, corners[i], corners[(i + 1) % 4], color);
    }
    push_line(vertices, corners[0], corners[2], color);
    push_line(vertices, corners[1], corners[3], color);
}
