//! Scene management
//!
//! The navigated scene is owned by the host. Navigation reads its geometry
//! for bounds and listens for [`SceneEvent`]s the host fires after changing
//! content or resizing the surface.

mod camera;
mod transform;

pub use camera::*;
pub use transform::*;

use std::sync::mpsc;
use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;

use crate::math::{Aabb, BoundingSphere};
use crate::resources::Mesh;

/// Camera shared between the host and the navigation controls
pub type SharedCamera = Arc<RwLock<Camera>>;

/// Scene shared between the host and the navigation controls
pub type SharedScene = Arc<RwLock<Scene>>;

/// A renderable object in the scene
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub mesh: Arc<Mesh>,
    pub transform: Transform,
    pub visible: bool,
}

impl SceneObject {
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self {
            mesh,
            transform: Transform::new(),
            visible: true,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    /// World space bounds computed from every transformed vertex
    pub fn world_bounds(&self) -> Aabb {
        let matrix = self.transform.matrix();
        Aabb::from_points(self.mesh.positions.iter().map(|p| matrix.transform_point3(*p)))
    }
}

/// Notifications the host fires on the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneEvent {
    /// Renderable content was added, removed or moved
    ContentChanged,
    /// The render surface changed size
    Resized,
}

/// Receiving end of a scene subscription
#[derive(Debug)]
pub struct SceneSubscription {
    id: u64,
    receiver: mpsc::Receiver<SceneEvent>,
}

impl SceneSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Drain pending events without blocking
    pub fn drain(&self) -> Vec<SceneEvent> {
        self.receiver.try_iter().collect()
    }
}

/// The scene containing all renderable content
#[derive(Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    subscribers: Vec<(u64, mpsc::Sender<SceneEvent>)>,
    next_subscriber_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a render object to the scene
    pub fn add_object(&mut self, object: SceneObject) -> usize {
        let id = self.objects.len();
        self.objects.push(object);
        id
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Axis-aligned bounds of all visible geometry
    pub fn bounds(&self) -> Aabb {
        self.objects
            .iter()
            .filter(|object| object.visible)
            .map(SceneObject::world_bounds)
            .fold(Aabb::EMPTY, |acc, bounds| acc.union(&bounds))
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounds().bounding_sphere()
    }

    pub fn subscribe(&mut self) -> SceneSubscription {
        let (sender, receiver) = mpsc::channel();
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;
        self.subscribers.push((id, sender));
        SceneSubscription { id, receiver }
    }

    pub fn unsubscribe(&mut self, id: u64) {
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver an event to every subscriber, dropping disconnected ones
    pub fn notify(&mut self, event: SceneEvent) {
        self.subscribers.retain(|(_, sender)| sender.send(event).is_ok());
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("objects", &self.objects.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
