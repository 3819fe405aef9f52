//! Pointer and wheel input
//!
//! Events use client coordinates in logical pixels with a top-left origin,
//! the same space as [`crate::surface::SurfaceRect`].

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerType {
    Mouse,
    Touch,
    Pen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Usually the left mouse button
    Primary,
    /// Usually the right mouse button
    Secondary,
    /// Usually the middle mouse button
    Auxiliary,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u64,
    pub pointer_type: PointerType,
    pub button: PointerButton,
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerEvent {
    pub fn mouse(button: PointerButton, client_x: f32, client_y: f32) -> Self {
        Self {
            pointer_id: 1,
            pointer_type: PointerType::Mouse,
            button,
            client_x,
            client_y,
        }
    }

    pub fn touch(pointer_id: u64, client_x: f32, client_y: f32) -> Self {
        Self {
            pointer_id,
            pointer_type: PointerType::Touch,
            button: PointerButton::Primary,
            client_x,
            client_y,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.client_x, self.client_y)
    }

    pub fn with_position(mut self, client_x: f32, client_y: f32) -> Self {
        self.client_x = client_x;
        self.client_y = client_y;
        self
    }
}

/// Wheel scroll. Positive `delta_y` scrolls down, which zooms out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub client_x: f32,
    pub client_y: f32,
    pub delta_y: f32,
}

impl WheelEvent {
    pub fn new(client_x: f32, client_y: f32, delta_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            delta_y,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.client_x, self.client_y)
    }
}

/// Input the navigation controls react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationInput {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    PointerCancel(PointerEvent),
    Wheel(WheelEvent),
    ContextMenu,
}

/// Pointer capture change the host should apply to its surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerCapture {
    #[default]
    Unchanged,
    Capture(u64),
    Release(u64),
}

/// What the host should do with an input event after dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventResponse {
    /// Suppress the platform default (scrolling, context menu)
    pub prevent_default: bool,
    pub capture: PointerCapture,
    /// The camera changed during this event
    pub camera_changed: bool,
}

impl EventResponse {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn consumed() -> Self {
        Self {
            prevent_default: true,
            ..Self::default()
        }
    }
}

/// Current gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Rotating,
    Panning,
    TouchRotatingZooming,
}

/// Mouse button assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonRoles {
    pub rotate: PointerButton,
    pub pan: PointerButton,
}

impl Default for ButtonRoles {
    fn default() -> Self {
        Self {
            rotate: PointerButton::Primary,
            pan: PointerButton::Secondary,
        }
    }
}

impl ButtonRoles {
    pub fn swapped(self) -> Self {
        Self {
            rotate: self.pan,
            pan: self.rotate,
        }
    }
}

/// Tracks up to two touch pointers and their previous positions.
///
/// Further pointers are ignored until a tracked one is removed.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    pointers: Vec<PointerEvent>,
    previous: Vec<PointerEvent>,
}

impl PointerTracker {
    pub const MAX_POINTERS: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    fn index_of(&self, pointer_id: u64) -> Option<usize> {
        self.pointers.iter().position(|p| p.pointer_id == pointer_id)
    }

    /// Add a new pointer or update a tracked one. Returns whether the event
    /// belongs to a tracked pointer afterwards.
    pub fn track(&mut self, event: PointerEvent) -> bool {
        match self.index_of(event.pointer_id) {
            Some(index) => {
                self.previous[index] = self.pointers[index];
                self.pointers[index] = event;
                true
            }
            None if self.pointers.len() < Self::MAX_POINTERS => {
                self.pointers.push(event);
                self.previous.push(event);
                true
            }
            None => false,
        }
    }

    /// Stop tracking a pointer. Untracked ids are ignored.
    pub fn remove(&mut self, pointer_id: u64) -> bool {
        match self.index_of(pointer_id) {
            Some(index) => {
                self.pointers.remove(index);
                self.previous.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, pointer_id: u64) -> bool {
        self.index_of(pointer_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn first(&self) -> Option<&PointerEvent> {
        self.pointers.first()
    }

    pub fn pointers(&self) -> &[PointerEvent] {
        &self.pointers
    }

    /// The tracked pointer that is not `pointer_id`
    pub fn other(&self, pointer_id: u64) -> Option<&PointerEvent> {
        self.pointers.iter().find(|p| p.pointer_id != pointer_id)
    }

    /// Midpoint of the event and the other tracked pointer. Falls back to
    /// the event position with a single pointer.
    pub fn average_position(&self, event: &PointerEvent) -> Vec2 {
        match self.other(event.pointer_id) {
            Some(other) => (event.position() + other.position()) * 0.5,
            None => event.position(),
        }
    }

    /// Distance between the two tracked pointers now and before the last update
    pub fn pinch_lengths(&self) -> Option<(f32, f32)> {
        if self.pointers.len() < 2 {
            return None;
        }
        let current = self.pointers[0].position().distance(self.pointers[1].position());
        let previous = self.previous[0].position().distance(self.previous[1].position());
        Some((current, previous))
    }

    pub fn clear(&mut self) {
        self.pointers.clear();
        self.previous.clear();
    }
}
