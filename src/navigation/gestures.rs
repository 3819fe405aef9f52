//! Input state machine
//!
//! Turns pointer events into navigation actions. The machine only decides
//! *what* should happen; the controls sample depth and move the camera.
//!
//! Mouse and pen gestures are chosen by button role. Touch gestures are
//! chosen by finger count: one finger pans, two fingers rotate around their
//! midpoint and zoom by pinching.

use glam::Vec2;

use crate::navigation::input::{
    EventResponse, GestureState, PointerCapture, PointerEvent, PointerTracker, PointerType,
};
use crate::NavigationConfig;

/// A step the controls carry out for a gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// Sample the scene under `client` and fix the rotation pivot
    BeginRotate { client: Vec2 },
    /// Rotate by angle deltas in radians
    Rotate { delta: Vec2 },
    /// Sample the scene under `client` and fix the pan height guide
    BeginPan { client: Vec2 },
    /// Pan so the scene point grabbed at the start follows `client`
    Pan { client: Vec2 },
    /// Zoom toward the scene point under `client`
    Zoom { client: Vec2, direction: f32 },
}

/// Result of feeding one event to the machine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureOutput {
    pub response: EventResponse,
    pub actions: Vec<GestureAction>,
    /// A gesture began with this event
    pub started: bool,
    /// The last gesture ended with this event
    pub ended: bool,
}

impl GestureOutput {
    fn consumed() -> Self {
        Self {
            response: EventResponse::consumed(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GestureMachine {
    state: GestureState,
    pointers: PointerTracker,
    /// Mouse or pen pointer driving the current gesture
    owner: Option<u64>,
    rotate_start: Vec2,
}

impl GestureMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Tracked touch pointers
    pub fn pointers(&self) -> &PointerTracker {
        &self.pointers
    }

    /// Forget every pointer and return to idle
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
        self.pointers.clear();
        self.owner = None;
    }

    pub fn pointer_down(&mut self, event: PointerEvent, config: &NavigationConfig) -> GestureOutput {
        let was_idle = self.state == GestureState::Idle;

        let actions = if event.pointer_type == PointerType::Touch {
            if !self.pointers.track(event) {
                log::trace!("Ignoring touch pointer {}: two pointers already tracked", event.pointer_id);
                return GestureOutput::consumed();
            }
            self.owner = None;
            self.touch_down(event)
        } else {
            if !was_idle {
                return GestureOutput::consumed();
            }
            let client = event.position();
            if event.button == config.buttons.rotate {
                self.state = GestureState::Rotating;
                self.rotate_start = client;
                vec![GestureAction::BeginRotate { client }]
            } else if event.button == config.buttons.pan {
                self.state = GestureState::Panning;
                vec![GestureAction::BeginPan { client }]
            } else {
                return GestureOutput::default();
            }
        };

        if event.pointer_type != PointerType::Touch {
            self.owner = Some(event.pointer_id);
        }
        log::trace!("Pointer {} down: {:?}", event.pointer_id, self.state);

        GestureOutput {
            response: EventResponse {
                prevent_default: true,
                capture: PointerCapture::Capture(event.pointer_id),
                camera_changed: false,
            },
            actions,
            started: was_idle,
            ended: false,
        }
    }

    /// Pick the touch gesture for the current finger count
    fn touch_down(&mut self, event: PointerEvent) -> Vec<GestureAction> {
        match self.pointers.len() {
            1 => {
                self.state = GestureState::Panning;
                vec![GestureAction::BeginPan {
                    client: event.position(),
                }]
            }
            _ => {
                self.state = GestureState::TouchRotatingZooming;
                let client = self.pointers.average_position(&event);
                self.rotate_start = client;
                vec![GestureAction::BeginRotate { client }]
            }
        }
    }

    fn rotate_to(&mut self, client: Vec2, config: &NavigationConfig) -> GestureAction {
        let delta = (client - self.rotate_start) * config.rotate_speed;
        self.rotate_start = client;
        GestureAction::Rotate { delta }
    }

    fn owns(&self, event: &PointerEvent) -> bool {
        if event.pointer_type == PointerType::Touch {
            self.pointers.contains(event.pointer_id)
        } else {
            self.owner == Some(event.pointer_id)
        }
    }

    pub fn pointer_move(&mut self, event: PointerEvent, config: &NavigationConfig) -> GestureOutput {
        if self.state == GestureState::Idle || !self.owns(&event) {
            return GestureOutput::default();
        }
        if event.pointer_type == PointerType::Touch {
            self.pointers.track(event);
        }

        let mut output = GestureOutput::consumed();
        match self.state {
            GestureState::Idle => {}
            GestureState::Rotating => {
                output.actions.push(self.rotate_to(event.position(), config));
            }
            GestureState::Panning => {
                output.actions.push(GestureAction::Pan {
                    client: event.position(),
                });
            }
            GestureState::TouchRotatingZooming => {
                let client = self.pointers.average_position(&event);
                output.actions.push(self.rotate_to(client, config));

                let extent = config.surface.width.max(config.surface.height);
                if let Some((current, previous)) = self.pointers.pinch_lengths() {
                    let direction = (current - previous) / extent * config.pinch_zoom_scale;
                    if extent > 0.0 && direction != 0.0 {
                        output.actions.push(GestureAction::Zoom { client, direction });
                    }
                }
            }
        }
        output
    }

    /// Pointer released. A touch gesture continues as a pan while a finger
    /// remains down.
    pub fn pointer_up(&mut self, event: PointerEvent) -> GestureOutput {
        let mut output = GestureOutput {
            response: EventResponse {
                prevent_default: true,
                capture: PointerCapture::Release(event.pointer_id),
                camera_changed: false,
            },
            ..GestureOutput::default()
        };

        if event.pointer_type == PointerType::Touch {
            if !self.pointers.remove(event.pointer_id) {
                return output;
            }
            if let Some(remaining) = self.pointers.first().copied() {
                self.pointers.track(remaining);
                output.actions = self.touch_down(remaining);
                log::trace!("Touch {} up, continuing with {}", event.pointer_id, remaining.pointer_id);
                return output;
            }
        } else if self.owner != Some(event.pointer_id) {
            return output;
        }

        self.owner = None;
        output.ended = self.state != GestureState::Idle;
        self.state = GestureState::Idle;
        output
    }

    /// Cancellation cleans up like a release; committed moves stay.
    pub fn pointer_cancel(&mut self, event: PointerEvent) -> GestureOutput {
        self.pointer_up(event)
    }
}
