//! World-in-hand navigation
//!
//! The scene is grabbed where the cursor points: zoom moves toward the point
//! under the cursor, rotation orbits a pivot in the scene and panning drags
//! the grabbed point along a horizontal plane. Cursor points are recovered
//! from the depth buffer of the navigation target.

pub mod controls;
pub mod depth_sampler;
pub mod events;
pub mod gestures;
pub mod input;
pub mod operations;
pub mod resilience;
pub mod unproject;
pub mod visualiser;

pub use controls::WorldInHandControls;
pub use depth_sampler::{ndc_to_pixel, raw_depth_to_ndc, DepthSampler};
pub use events::{ControlsEvent, EventDispatcher, ListenerId};
pub use gestures::{GestureAction, GestureMachine, GestureOutput};
pub use input::{
    ButtonRoles, EventResponse, GestureState, NavigationInput, PointerButton, PointerCapture,
    PointerEvent, PointerTracker, PointerType, WheelEvent,
};
pub use operations::RotationPivot;
pub use resilience::{GroundPlaneSource, ResilienceState, ResilienceTracker};
pub use unproject::{client_to_ndc, unproject_with_depth, CursorSample};
pub use visualiser::{
    GizmoKind, GizmoStyle, GizmoVertex, GizmoVisualiser, NavigationObserver, NoopObserver,
    VisibilitySettings,
};
