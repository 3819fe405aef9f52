//! World-in-hand navigation controls
//!
//! The host renders the navigated scene into [`WorldInHandControls::navigation_target`]
//! with the shared camera, calls [`WorldInHandControls::update`] once per frame and
//! forwards input through [`WorldInHandControls::handle_input`]. The controls move
//! the camera and notify listeners.

use glam::{Vec2, Vec3};

use crate::backend::{
    BackendResult, NavigationBackend, RenderTargetDescriptor, RenderTargetHandle, SharedBackend,
};
use crate::math::{Plane, Ray};
use crate::navigation::depth_sampler::DepthSampler;
use crate::navigation::events::{ControlsEvent, EventDispatcher, ListenerId};
use crate::navigation::gestures::{GestureAction, GestureMachine, GestureOutput};
use crate::navigation::input::{
    ButtonRoles, EventResponse, GestureState, NavigationInput, PointerEvent, PointerTracker,
    WheelEvent,
};
use crate::navigation::operations::{self, RotationPivot};
use crate::navigation::resilience::{GroundPlaneSource, ResilienceTracker};
use crate::navigation::unproject::{client_to_ndc, unproject_with_depth};
use crate::navigation::visualiser::{NavigationObserver, NoopObserver};
use crate::scene::{Camera, SceneEvent, SceneSubscription, SharedCamera, SharedScene};
use crate::surface::SurfaceRect;
use crate::NavigationConfig;

/// Camera state captured at construction for [`WorldInHandControls::reset`]
#[derive(Debug, Clone, Copy, PartialEq)]
struct CameraSnapshot {
    position: Vec3,
    look_at: Vec3,
}

/// Look-at point for a camera: the scene center when requested, else where
/// the view ray meets the ground plane, else the camera's own target.
fn initial_look_at(camera: &Camera, resilience: &ResilienceTracker, scene_center: bool) -> Vec3 {
    if scene_center && resilience.limits_active() {
        return resilience.bounding_sphere().center;
    }
    let ray = Ray::new(camera.position, camera.forward());
    ray.distance_to_plane(&Plane::horizontal(resilience.ground_plane_height()))
        .filter(|t| *t > camera.near())
        .map(|t| ray.at(t))
        .unwrap_or(camera.target)
}

pub struct WorldInHandControls<B: NavigationBackend> {
    camera: SharedCamera,
    backend: SharedBackend<B>,
    scene: SharedScene,
    subscription: SceneSubscription,
    config: NavigationConfig,

    navigation_target: RenderTargetHandle,
    depth_sampler: DepthSampler,
    resilience: ResilienceTracker,
    gestures: GestureMachine,

    mouse_world: Vec3,
    look_at: Vec3,
    pan_start: Option<Vec3>,
    pan_height_guide: Option<Plane>,
    initial: CameraSnapshot,

    dispatcher: EventDispatcher,
    observer: Box<dyn NavigationObserver>,
    disposed: bool,
}

impl<B: NavigationBackend> WorldInHandControls<B> {
    /// Allocate the navigation targets, derive the scene limits and point the
    /// camera at its look-at point.
    pub fn new(
        camera: SharedCamera,
        backend: SharedBackend<B>,
        scene: SharedScene,
        config: NavigationConfig,
    ) -> BackendResult<Self> {
        let (navigation_target, depth_sampler) = {
            let mut backend = backend.lock();
            let (width, height) = backend.drawing_buffer_size();
            let target = backend.create_render_target(&RenderTargetDescriptor::navigation(
                width,
                height,
                config.msaa_samples,
            ))?;
            match DepthSampler::new(&mut *backend, width, height) {
                Ok(sampler) => (target, sampler),
                Err(e) => {
                    backend.destroy_render_target(target);
                    return Err(e);
                }
            }
        };

        let subscription = scene.write().subscribe();

        let mut resilience =
            ResilienceTracker::new(config.ground_plane, config.allow_rotation_below_ground_plane);
        let mut camera_state = camera.read().clone();
        resilience.recompute_bounds(&scene.read(), &camera_state);

        let look_at = initial_look_at(&camera_state, &resilience, config.look_at_scene_center);
        camera_state.look_at(look_at);
        camera.write().look_at(look_at);
        resilience.recompute_elevation_angle(&camera_state, look_at);
        resilience.update_furthest_scene_depth(&camera_state);

        log::debug!(
            "Navigation controls created: look-at {:?}, elevation {}, max distance {}",
            look_at,
            resilience.elevation_angle(),
            resilience.max_pan_zoom_distance()
        );

        Ok(Self {
            camera,
            backend,
            scene,
            subscription,
            config,
            navigation_target,
            depth_sampler,
            resilience,
            gestures: GestureMachine::new(),
            mouse_world: look_at,
            look_at,
            pan_start: None,
            pan_height_guide: None,
            initial: CameraSnapshot {
                position: camera_state.position,
                look_at,
            },
            dispatcher: EventDispatcher::new(),
            observer: Box::new(NoopObserver),
            disposed: false,
        })
    }

    // Accessors

    /// Render target to draw the navigated scene into
    pub fn navigation_target(&self) -> RenderTargetHandle {
        self.navigation_target
    }

    pub fn depth_sampler(&self) -> &DepthSampler {
        &self.depth_sampler
    }

    pub fn resilience(&self) -> &ResilienceTracker {
        &self.resilience
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    /// Scene point under the cursor at the last sample
    pub fn mouse_world_position(&self) -> Vec3 {
        self.mouse_world
    }

    pub fn elevation_angle(&self) -> f32 {
        self.resilience.elevation_angle()
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gestures.state()
    }

    pub fn tracked_pointers(&self) -> &PointerTracker {
        self.gestures.pointers()
    }

    /// Height of the plane the current pan gesture moves along
    pub fn pan_height_guide(&self) -> Option<f32> {
        self.pan_height_guide.map(|plane| plane.height())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // Configuration

    pub fn set_ground_plane_source(&mut self, source: GroundPlaneSource) {
        self.config.ground_plane = source;
        self.resilience.set_ground_plane_source(source);
        self.observer.on_ground_plane_height(self.resilience.ground_plane_height());
    }

    pub fn set_allow_rotation_below_ground_plane(&mut self, allow: bool) {
        self.config.allow_rotation_below_ground_plane = allow;
        self.resilience.set_allow_rotation_below_ground_plane(allow);
    }

    pub fn set_rotation_pivot(&mut self, pivot: RotationPivot) {
        self.config.rotation_pivot = pivot;
    }

    pub fn set_button_roles(&mut self, buttons: ButtonRoles) {
        self.config.buttons = buttons;
    }

    /// Exchange the rotate and pan buttons
    pub fn swap_buttons(&mut self) {
        self.config.buttons = self.config.buttons.swapped();
    }

    /// Bounding rectangle of the surface input coordinates refer to
    pub fn set_surface_rect(&mut self, surface: SurfaceRect) {
        self.config.surface = surface;
    }

    /// Install an observer and report the current state to it
    pub fn set_observer(&mut self, observer: Box<dyn NavigationObserver>) {
        self.observer = observer;
        let camera = self.camera.read().clone();
        self.report_state(&camera);
        self.observer.on_mouse_world_position(self.mouse_world);
    }

    // Events

    pub fn add_event_listener(
        &mut self,
        event: ControlsEvent,
        listener: impl FnMut() + 'static,
    ) -> ListenerId {
        self.dispatcher.add_listener(event, listener)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.dispatcher.remove_listener(id)
    }

    // Lifecycle

    /// Copy the navigation depth into the readback target. With
    /// `copy_to_canvas` the navigation color buffer is also shown on the surface.
    pub fn update(&mut self, copy_to_canvas: bool) -> BackendResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.process_scene_events();

        let mut backend = self.backend.lock();
        self.depth_sampler.render(&mut *backend, self.navigation_target)?;
        if copy_to_canvas {
            if let Err(e) = backend.present(self.navigation_target) {
                log::warn!("Failed to copy the navigation target to the canvas: {}", e);
            }
        }
        Ok(())
    }

    /// React to scene notifications received since the last call
    pub fn process_scene_events(&mut self) {
        let events = self.subscription.drain();
        if events.contains(&SceneEvent::ContentChanged) {
            self.recompute_bounds();
        }
        if events.contains(&SceneEvent::Resized) {
            if let Err(e) = self.resize_targets() {
                log::warn!("Failed to resize navigation targets: {}", e);
            }
        }
    }

    fn recompute_bounds(&mut self) {
        let camera = self.camera.read().clone();
        self.resilience.recompute_bounds(&self.scene.read(), &camera);
        self.report_state(&camera);
    }

    fn resize_targets(&mut self) -> BackendResult<()> {
        let mut backend = self.backend.lock();
        let (width, height) = backend.drawing_buffer_size();
        backend.resize_render_target(self.navigation_target, width, height)?;
        self.depth_sampler.resize(&mut *backend, width, height)?;
        log::debug!("Navigation targets resized to {}x{}", width, height);
        Ok(())
    }

    /// Release the targets, unsubscribe from the scene and drop all listeners
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.scene.write().unsubscribe(self.subscription.id());
        {
            let mut backend = self.backend.lock();
            self.depth_sampler.release(&mut *backend);
            backend.destroy_render_target(self.navigation_target);
        }
        self.dispatcher.clear();
        self.gestures.reset();
        self.pan_start = None;
        self.pan_height_guide = None;
        self.disposed = true;
        log::debug!("Navigation controls disposed");
    }

    /// Restore the camera captured at construction
    pub fn reset(&mut self) {
        if self.disposed {
            return;
        }
        let mut camera = self.camera.read().clone();
        camera.position = self.initial.position;
        self.look_at = self.initial.look_at;
        camera.look_at(self.look_at);
        self.commit_camera(&camera);

        self.resilience.recompute_elevation_angle(&camera, self.look_at);
        self.resilience.update_furthest_scene_depth(&camera);
        self.report_back_plane(&camera);
        log::debug!("Navigation reset to {:?}", self.initial);
        self.dispatcher.dispatch(ControlsEvent::Change);
    }

    /// Re-derive the look-at point and limits after the scene or camera was
    /// replaced. Without an explicit point the look-at point is derived the
    /// same way as at construction.
    pub fn reload_camera(&mut self, look_at: Option<Vec3>) {
        if self.disposed {
            return;
        }
        let mut camera = self.camera.read().clone();
        self.resilience.recompute_bounds(&self.scene.read(), &camera);

        self.look_at = look_at.unwrap_or_else(|| {
            initial_look_at(&camera, &self.resilience, self.config.look_at_scene_center)
        });
        camera.look_at(self.look_at);
        self.commit_camera(&camera);

        self.resilience.recompute_elevation_angle(&camera, self.look_at);
        self.resilience.update_furthest_scene_depth(&camera);
        self.report_state(&camera);
        log::debug!("Camera reloaded with look-at {:?}", self.look_at);
        self.dispatcher.dispatch(ControlsEvent::Change);
    }

    // Input

    pub fn handle_input(&mut self, input: NavigationInput) -> EventResponse {
        match input {
            NavigationInput::PointerDown(event) => self.handle_pointer_down(event),
            NavigationInput::PointerMove(event) => self.handle_pointer_move(event),
            NavigationInput::PointerUp(event) => self.handle_pointer_up(event),
            NavigationInput::PointerCancel(event) => self.handle_pointer_cancel(event),
            NavigationInput::Wheel(event) => self.handle_wheel(event),
            NavigationInput::ContextMenu => self.handle_context_menu(),
        }
    }

    pub fn handle_pointer_down(&mut self, event: PointerEvent) -> EventResponse {
        if self.disposed {
            return EventResponse::ignored();
        }
        self.process_scene_events();
        let output = self.gestures.pointer_down(event, &self.config);
        self.run_gesture(output)
    }

    pub fn handle_pointer_move(&mut self, event: PointerEvent) -> EventResponse {
        if self.disposed {
            return EventResponse::ignored();
        }
        self.process_scene_events();
        let output = self.gestures.pointer_move(event, &self.config);
        self.run_gesture(output)
    }

    pub fn handle_pointer_up(&mut self, event: PointerEvent) -> EventResponse {
        if self.disposed {
            return EventResponse::ignored();
        }
        self.process_scene_events();
        let output = self.gestures.pointer_up(event);
        self.finish_gesture_if_idle();
        self.run_gesture(output)
    }

    pub fn handle_pointer_cancel(&mut self, event: PointerEvent) -> EventResponse {
        if self.disposed {
            return EventResponse::ignored();
        }
        self.process_scene_events();
        let output = self.gestures.pointer_cancel(event);
        self.finish_gesture_if_idle();
        self.run_gesture(output)
    }

    /// One zoom step per wheel event, toward the scene point under the cursor
    pub fn handle_wheel(&mut self, event: WheelEvent) -> EventResponse {
        if self.disposed {
            return EventResponse::ignored();
        }
        self.process_scene_events();

        let mut response = EventResponse::consumed();
        if event.delta_y == 0.0 || !self.update_mouse_parameters(event.position()) {
            return response;
        }
        if self.zoom(-event.delta_y.signum()) {
            // A running drag owns the start and end events
            let standalone = self.gestures.state() == GestureState::Idle;
            if standalone {
                self.dispatcher.dispatch(ControlsEvent::ChangeStart);
            }
            self.dispatcher.dispatch(ControlsEvent::Change);
            if standalone {
                self.dispatcher.dispatch(ControlsEvent::ChangeEnd);
            }
            response.camera_changed = true;
        }
        response
    }

    pub fn handle_context_menu(&mut self) -> EventResponse {
        EventResponse::consumed()
    }

    fn finish_gesture_if_idle(&mut self) {
        if self.gestures.state() == GestureState::Idle {
            self.pan_start = None;
            self.pan_height_guide = None;
        }
    }

    fn run_gesture(&mut self, output: GestureOutput) -> EventResponse {
        let mut response = output.response;
        if output.started {
            self.dispatcher.dispatch(ControlsEvent::ChangeStart);
        }

        let mut changed = false;
        for action in output.actions {
            changed |= self.apply_action(action);
        }
        if changed {
            self.dispatcher.dispatch(ControlsEvent::Change);
        }

        if output.ended {
            self.dispatcher.dispatch(ControlsEvent::ChangeEnd);
        }
        response.camera_changed = changed;
        response
    }

    /// Returns whether the camera moved
    fn apply_action(&mut self, action: GestureAction) -> bool {
        log::trace!("Gesture action {:?}", action);
        match action {
            GestureAction::BeginRotate { client } => {
                self.update_mouse_parameters(client);
                let pivot = self.rotation_pivot();
                self.observer.on_pivot_changed(pivot);
                false
            }
            GestureAction::Rotate { delta } => self.rotate(delta),
            GestureAction::BeginPan { client } => {
                self.begin_pan(client);
                false
            }
            GestureAction::Pan { client } => self.pan_to_cursor(client),
            GestureAction::Zoom { client, direction } => {
                self.update_mouse_parameters(client) && self.zoom(direction)
            }
        }
    }

    fn begin_pan(&mut self, client: Vec2) {
        if !self.update_mouse_parameters(client) {
            self.pan_start = None;
            self.pan_height_guide = None;
            return;
        }
        self.pan_start = Some(self.mouse_world);
        self.pan_height_guide = Some(Plane::horizontal(self.mouse_world.y));
        self.observer.on_pan_height_guide(self.mouse_world.y);
    }

    /// Pan so the point grabbed at the gesture start stays under the cursor.
    /// Movement is measured on the height guide fixed at the gesture start.
    fn pan_to_cursor(&mut self, client: Vec2) -> bool {
        let (Some(start), Some(guide)) = (self.pan_start, self.pan_height_guide) else {
            return false;
        };
        if !self.update_mouse_parameters(client) {
            return false;
        }

        let position = self.camera.read().position;
        let Some(current) = Ray::through(position, self.mouse_world).intersect_plane(&guide) else {
            log::trace!("Pan ray misses the height guide at {}", guide.height());
            return false;
        };
        self.pan(current - start)
    }

    // Sampling

    fn sample_depth(&mut self, ndc: Vec2) -> Option<f32> {
        let mut backend = self.backend.lock();
        match self.depth_sampler.sample(&mut *backend, self.navigation_target, ndc) {
            Ok(depth) => Some(depth),
            Err(e) => {
                log::warn!("Depth readback failed: {}", e);
                None
            }
        }
    }

    /// Resolve the scene point under a client position. Returns false when
    /// the depth could not be read; the previous point is kept.
    pub fn update_mouse_parameters(&mut self, client: Vec2) -> bool {
        let ndc = client_to_ndc(&self.config.surface, client);
        let Some(depth) = self.sample_depth(ndc) else {
            return false;
        };

        let camera = self.camera.read().clone();
        let sample = unproject_with_depth(&camera, ndc, depth, self.resilience.bounding_depth_ndc());
        self.mouse_world = sample.world;
        self.observer.on_mouse_world_position(sample.world);
        true
    }

    fn rotation_pivot(&self) -> Vec3 {
        match self.config.rotation_pivot {
            RotationPivot::LookAt => self.look_at,
            RotationPivot::Cursor => self.mouse_world,
        }
    }

    // Operations

    fn commit_camera(&self, camera: &Camera) {
        let mut shared = self.camera.write();
        shared.position = camera.position;
        shared.target = camera.target;
    }

    /// Zoom toward the last sampled cursor point. Positive `direction` zooms
    /// in. Returns whether the camera moved.
    pub fn zoom(&mut self, direction: f32) -> bool {
        let mut camera = self.camera.read().clone();
        let Some(offset) =
            operations::zoom_step(&camera, &self.resilience, self.mouse_world, direction)
        else {
            return false;
        };

        let reference_height = self.look_at.y;
        camera.position += offset;
        camera.target += offset;

        // Screen center keeps the orientation; only the look-at height is fixed
        let center = match self.sample_depth(Vec2::ZERO) {
            Some(depth) => {
                unproject_with_depth(&camera, Vec2::ZERO, depth, self.resilience.bounding_depth_ndc())
                    .world
            }
            None => camera.target,
        };
        self.look_at = operations::ground_projected_look_at(camera.position, center, reference_height);
        camera.look_at(self.look_at);
        self.commit_camera(&camera);

        self.resilience.update_furthest_scene_depth(&camera);
        self.report_back_plane(&camera);
        true
    }

    /// Orbit the camera around the configured pivot by angle deltas.
    /// Returns whether the camera moved.
    pub fn rotate(&mut self, delta: Vec2) -> bool {
        let mut camera = self.camera.read().clone();
        let pivot = self.rotation_pivot();
        let Some(step) =
            operations::rotation_step(camera.position, self.look_at, pivot, delta, &self.resilience)
        else {
            return false;
        };

        self.look_at = step.look_at;
        camera.position = step.position;
        camera.look_at(step.look_at);
        self.commit_camera(&camera);

        self.resilience.set_elevation_angle(step.elevation);
        self.resilience.update_furthest_scene_depth(&camera);
        self.report_back_plane(&camera);
        true
    }

    /// Move the scene by a world-space drag. The camera and look-at point move
    /// the opposite way. Returns whether the camera moved.
    pub fn pan(&mut self, delta: Vec3) -> bool {
        let mut camera = self.camera.read().clone();
        let Some(offset) = operations::pan_step(camera.position, delta, &self.resilience) else {
            return false;
        };

        camera.position += offset;
        self.look_at += offset;
        camera.look_at(self.look_at);
        self.commit_camera(&camera);

        self.resilience.update_furthest_scene_depth(&camera);
        self.report_back_plane(&camera);
        true
    }

    // Observer reporting

    fn report_back_plane(&mut self, camera: &Camera) {
        self.observer
            .on_back_plane(self.resilience.scene_back_point(), -camera.forward());
    }

    fn report_state(&mut self, camera: &Camera) {
        self.observer.on_bounds_changed(
            self.resilience.bounding_sphere(),
            self.resilience.max_pan_zoom_distance(),
        );
        self.observer.on_ground_plane_height(self.resilience.ground_plane_height());
        self.report_back_plane(camera);
    }
}

impl<B: NavigationBackend> Drop for WorldInHandControls<B> {
    fn drop(&mut self) {
        if !self.disposed {
            log::warn!("WorldInHandControls dropped without dispose(); releasing its resources now");
            self.dispose();
        }
    }
}

impl<B: NavigationBackend> std::fmt::Debug for WorldInHandControls<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldInHandControls")
            .field("navigation_target", &self.navigation_target)
            .field("look_at", &self.look_at)
            .field("mouse_world", &self.mouse_world)
            .field("gesture", &self.gestures.state())
            .field("resilience", &self.resilience)
            .field("disposed", &self.disposed)
            .finish()
    }
}
