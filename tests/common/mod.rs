//! Common utilities for navigation integration tests.
//!
//! The harness plays the host: it owns the shared camera, scene and a
//! [`SoftwareBackend`], ray casts scene depth into the navigation target
//! before every input event and forwards input to the controls.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Once};

use glam::{Vec2, Vec3};
use parking_lot::{Mutex, RwLock};

use world_in_hand::navigation::{ControlsEvent, EventResponse, NavigationInput};
use world_in_hand::resources::Mesh;
use world_in_hand::scene::Projection;
use world_in_hand::{
    Camera, NavigationConfig, Scene, SceneObject, SharedBackend, SharedCamera, SharedScene,
    SoftwareBackend, SurfaceRect, WorldInHandControls,
};

pub const WIDTH: u32 = 64;
pub const HEIGHT: u32 = 48;

// ============================================================================
// Scene helpers
// ============================================================================

pub fn camera_at(position: Vec3, target: Vec3) -> Camera {
    Camera::new(position, target).with_projection(Projection::perspective(
        60.0,
        WIDTH as f32 / HEIGHT as f32,
        0.1,
        100.0,
    ))
}

/// Cube with edge length `size` centered at `position`
pub fn cube(position: Vec3, size: f32) -> SceneObject {
    SceneObject::new(Arc::new(Mesh::cube()))
        .with_position(position)
        .with_scale(Vec3::splat(size))
}

/// UV sphere of the given diameter centered at `position`
pub fn sphere(position: Vec3, diameter: f32) -> SceneObject {
    SceneObject::new(Arc::new(Mesh::sphere(24, 12)))
        .with_position(position)
        .with_scale(Vec3::splat(diameter))
}

/// Square ground mesh of edge `size` at height `y`
pub fn ground(y: f32, size: f32) -> SceneObject {
    SceneObject::new(Arc::new(Mesh::plane(size, size, 4))).with_position(Vec3::new(0.0, y, 0.0))
}

pub fn scene_with(objects: impl IntoIterator<Item = SceneObject>) -> Scene {
    let mut scene = Scene::new();
    for object in objects {
        scene.add_object(object);
    }
    scene
}

/// Client position of a pixel center
pub fn pixel(x: u32, y: u32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

pub fn center() -> Vec2 {
    Vec2::new(WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0)
}

// ============================================================================
// CPU depth rendering
// ============================================================================

fn intersect_triangle(origin: Vec3, direction: Vec3, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t > 1e-6).then_some(t)
}

/// Raw depth in `[0, 1]` for every pixel, rows top to bottom. Misses get 1.
pub fn render_depth(camera: &Camera, scene: &Scene, width: u32, height: u32) -> Vec<f32> {
    let triangles: Vec<[Vec3; 3]> = scene
        .objects
        .iter()
        .filter(|object| object.visible)
        .flat_map(|object| {
            let matrix = object.transform.matrix();
            object
                .mesh
                .triangles()
                .map(move |tri| tri.map(|p| matrix.transform_point3(p)))
                .collect::<Vec<_>>()
        })
        .collect();

    let mut depth = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        for column in 0..width {
            let ndc = Vec2::new(
                (column as f32 + 0.5) / width as f32 * 2.0 - 1.0,
                1.0 - (row as f32 + 0.5) / height as f32 * 2.0,
            );
            let through = camera.unproject(ndc.extend(0.0));
            let direction = (through - camera.position).normalize();

            let nearest = triangles
                .iter()
                .filter_map(|tri| intersect_triangle(camera.position, direction, *tri))
                .fold(f32::INFINITY, f32::min);

            let raw = if nearest.is_finite() {
                let hit = camera.position + direction * nearest;
                (camera.project(hit).z * 0.5 + 0.5).clamp(0.0, 1.0)
            } else {
                1.0
            };
            depth.push(raw);
        }
    }
    depth
}

// ============================================================================
// Harness
// ============================================================================

/// Counts emitted control events
#[derive(Debug, Clone, Default)]
pub struct EventCounts {
    pub change: Rc<Cell<usize>>,
    pub start: Rc<Cell<usize>>,
    pub end: Rc<Cell<usize>>,
}

impl EventCounts {
    pub fn totals(&self) -> (usize, usize, usize) {
        (self.start.get(), self.change.get(), self.end.get())
    }
}

pub struct Harness {
    pub camera: SharedCamera,
    pub backend: SharedBackend<SoftwareBackend>,
    pub scene: SharedScene,
    pub controls: WorldInHandControls<SoftwareBackend>,
    pub events: EventCounts,
}

impl Harness {
    pub fn new(camera: Camera, scene: Scene) -> Self {
        Self::with_config(camera, scene, NavigationConfig::default())
    }

    pub fn with_config(camera: Camera, scene: Scene, config: NavigationConfig) -> Self {
        let camera = Arc::new(RwLock::new(camera));
        let backend = Arc::new(Mutex::new(SoftwareBackend::new(WIDTH, HEIGHT)));
        let scene = Arc::new(RwLock::new(scene));
        let config = NavigationConfig {
            surface: SurfaceRect::from_size(WIDTH as f32, HEIGHT as f32),
            ..config
        };

        let mut controls =
            WorldInHandControls::new(camera.clone(), backend.clone(), scene.clone(), config)
                .expect("controls");

        let events = EventCounts::default();
        for (kind, counter) in [
            (ControlsEvent::Change, events.change.clone()),
            (ControlsEvent::ChangeStart, events.start.clone()),
            (ControlsEvent::ChangeEnd, events.end.clone()),
        ] {
            controls.add_event_listener(kind, move || counter.set(counter.get() + 1));
        }

        Self {
            camera,
            backend,
            scene,
            controls,
            events,
        }
    }

    pub fn camera(&self) -> Camera {
        self.camera.read().clone()
    }

    /// Render the scene depth into the navigation target, as the host would
    pub fn render(&self) {
        let camera = self.camera();
        let depth = render_depth(&camera, &self.scene.read(), WIDTH, HEIGHT);
        self.backend
            .lock()
            .write_depth(self.controls.navigation_target(), &depth)
            .expect("write depth");
    }

    /// Render a fresh frame, then deliver the input
    pub fn input(&mut self, input: NavigationInput) -> EventResponse {
        self.render();
        self.controls.handle_input(input)
    }
}

// ============================================================================
// Log capture
// ============================================================================

thread_local! {
    static RECORDS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Install the capturing logger and clear this thread's records
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
}

/// Warnings logged on this thread containing `text`
pub fn warnings_containing(text: &str) -> usize {
    RECORDS.with(|records| {
        records
            .borrow()
            .iter()
            .filter(|(level, message)| *level == log::Level::Warn && message.contains(text))
            .count()
    })
}
