//! Navigation surface and winit input translation

use glam::Vec2;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

use crate::navigation::{NavigationInput, PointerButton, PointerEvent, PointerType, WheelEvent};

/// Bounding rectangle of the navigation surface in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle at the origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Rectangle covering a window's inner area
    pub fn from_physical_size(size: PhysicalSize<u32>, scale_factor: f64) -> Self {
        let logical = size.to_logical::<f32>(scale_factor);
        Self::from_size(logical.width, logical.height)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left
            && point.y >= self.top
            && point.x < self.left + self.width
            && point.y < self.top + self.height
    }
}

/// Pointer id used for the mouse
pub const MOUSE_POINTER_ID: u64 = 1;

/// Touch ids are offset so they never collide with the mouse
pub const TOUCH_POINTER_ID_OFFSET: u64 = 0x1_0000;

/// Wheel distance reported per scrolled line
const LINE_HEIGHT: f32 = 40.0;

/// Converts winit window events into navigation input.
///
/// Keeps the last cursor position and the pressed mouse button since winit
/// reports them separately.
#[derive(Debug, Clone)]
pub struct PointerTranslator {
    scale_factor: f64,
    cursor: Vec2,
    pressed: Option<PointerButton>,
}

impl Default for PointerTranslator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PointerTranslator {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            scale_factor,
            cursor: Vec2::ZERO,
            pressed: None,
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor > 0.0 && scale_factor.is_finite() {
            self.scale_factor = scale_factor;
        }
    }

    /// Last cursor position in logical pixels
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    fn to_logical(&self, position: PhysicalPosition<f64>) -> Vec2 {
        let logical = position.to_logical::<f32>(self.scale_factor);
        Vec2::new(logical.x, logical.y)
    }

    fn mouse_event(&self, button: PointerButton) -> PointerEvent {
        PointerEvent {
            pointer_id: MOUSE_POINTER_ID,
            pointer_type: PointerType::Mouse,
            button,
            client_x: self.cursor.x,
            client_y: self.cursor.y,
        }
    }

    pub fn translate(&mut self, event: &WindowEvent) -> Option<NavigationInput> {
        match event {
            WindowEvent::CursorMoved { position, .. } => Some(self.cursor_moved(*position)),
            WindowEvent::CursorLeft { .. } => self.cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => self.mouse_input(*state, *button),
            WindowEvent::MouseWheel { delta, .. } => self.mouse_wheel(*delta),
            WindowEvent::Touch(touch) => Some(self.touch(touch.phase, touch.location, touch.id)),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.set_scale_factor(*scale_factor);
                None
            }
            _ => None,
        }
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) -> NavigationInput {
        self.cursor = self.to_logical(position);
        NavigationInput::PointerMove(self.mouse_event(self.pressed.unwrap_or(PointerButton::Primary)))
    }

    /// Leaving the window cancels a held drag
    pub fn cursor_left(&mut self) -> Option<NavigationInput> {
        self.pressed
            .take()
            .map(|button| NavigationInput::PointerCancel(self.mouse_event(button)))
    }

    /// Only the first pressed button starts a pointer, like DOM pointer events
    pub fn mouse_input(&mut self, state: ElementState, button: MouseButton) -> Option<NavigationInput> {
        let button = match button {
            MouseButton::Left => PointerButton::Primary,
            MouseButton::Right => PointerButton::Secondary,
            MouseButton::Middle => PointerButton::Auxiliary,
            MouseButton::Back => PointerButton::Other(3),
            MouseButton::Forward => PointerButton::Other(4),
            MouseButton::Other(id) => PointerButton::Other(id),
        };

        match state {
            ElementState::Pressed if self.pressed.is_none() => {
                self.pressed = Some(button);
                Some(NavigationInput::PointerDown(self.mouse_event(button)))
            }
            ElementState::Released if self.pressed == Some(button) => {
                self.pressed = None;
                Some(NavigationInput::PointerUp(self.mouse_event(button)))
            }
            _ => None,
        }
    }

    /// Positive `delta_y` scrolls down, as in DOM wheel events
    pub fn mouse_wheel(&mut self, delta: MouseScrollDelta) -> Option<NavigationInput> {
        let delta_y = match delta {
            MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
            MouseScrollDelta::PixelDelta(position) => -self.to_logical(position).y,
        };
        if delta_y == 0.0 {
            return None;
        }
        Some(NavigationInput::Wheel(WheelEvent::new(
            self.cursor.x,
            self.cursor.y,
            delta_y,
        )))
    }

    pub fn touch(&mut self, phase: TouchPhase, location: PhysicalPosition<f64>, id: u64) -> NavigationInput {
        let position = self.to_logical(location);
        let event = PointerEvent::touch(
            id.wrapping_add(TOUCH_POINTER_ID_OFFSET),
            position.x,
            position.y,
        );
        match phase {
            TouchPhase::Started => NavigationInput::PointerDown(event),
            TouchPhase::Moved => NavigationInput::PointerMove(event),
            TouchPhase::Ended => NavigationInput::PointerUp(event),
            TouchPhase::Cancelled => NavigationInput::PointerCancel(event),
        }
    }
}
