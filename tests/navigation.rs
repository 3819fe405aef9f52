//! Navigation behaviour against CPU-rendered depth.

mod common;

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use glam::{Vec2, Vec3};
use parking_lot::Mutex;
use rstest::rstest;

use common::*;
use world_in_hand::backend::NavigationBackend;
use world_in_hand::math::BoundingSphere;
use world_in_hand::navigation::resilience::MIN_ELEVATION_ANGLE;
use world_in_hand::navigation::{
    GestureState, GizmoKind, GizmoVisualiser, NavigationInput, PointerButton, PointerCapture,
    PointerEvent, VisibilitySettings, WheelEvent,
};
use world_in_hand::{GroundPlaneSource, NavigationConfig, RotationPivot, Scene, SceneEvent};

fn wheel(client: Vec2, delta_y: f32) -> NavigationInput {
    NavigationInput::Wheel(WheelEvent::new(client.x, client.y, delta_y))
}

fn mouse(button: PointerButton, client: Vec2) -> PointerEvent {
    PointerEvent::mouse(button, client.x, client.y)
}

/// Cube of edge 2 at the origin, camera above and in front
fn cube_harness() -> Harness {
    Harness::new(
        camera_at(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO),
        scene_with([cube(Vec3::ZERO, 2.0)]),
    )
}

// ============================================================================
// Zoom
// ============================================================================

#[test]
fn test_zoom_in_then_out_returns_near_start() {
    let mut harness = cube_harness();
    let start = harness.camera().position;

    let response = harness.input(wheel(center(), -1.0));
    assert!(response.camera_changed);
    assert!(response.prevent_default);
    let zoomed = harness.camera().position;
    assert!(zoomed.distance(Vec3::ZERO) < start.distance(Vec3::ZERO));

    assert!(harness.input(wheel(center(), 1.0)).camera_changed);
    let end = harness.camera().position;
    assert!(
        end.distance(start) < 0.1,
        "zoom pair drifted from {:?} to {:?}",
        start,
        end
    );
    assert_eq!(harness.events.totals(), (2, 2, 2));
}

#[test]
fn test_zoom_keeps_orientation() {
    let mut harness = cube_harness();
    let forward = harness.camera().forward();
    harness.input(wheel(pixel(40, 20), -1.0));

    let camera = harness.camera();
    assert!((camera.forward() - forward).length() < 1e-4);
    assert_eq!(camera.target, harness.controls.look_at());
}

#[test]
fn test_distance_bound_holds_for_zoom_and_pan_sequence() {
    let mut harness = Harness::new(
        camera_at(Vec3::new(0.0, 1.5, 4.0), Vec3::ZERO),
        scene_with([cube(Vec3::ZERO, 2.0)]),
    );
    let reachable = BoundingSphere::new(
        harness.controls.resilience().bounding_sphere().center,
        harness.controls.resilience().max_pan_zoom_distance() + 1e-4,
    );

    for step in 0..12 {
        let before = harness.camera().position;
        let committed = if step % 3 == 2 {
            harness.controls.pan(Vec3::new(0.0, 0.0, -1.5))
        } else {
            harness.input(wheel(center(), 1.0)).camera_changed
        };

        let after = harness.camera().position;
        assert!(reachable.contains_point(after), "{:?} left the navigation sphere", after);
        if !committed {
            assert_eq!(before, after);
        }
    }
}

#[test]
fn test_zoom_rejected_at_ground_plane() {
    let config = NavigationConfig {
        ground_plane: GroundPlaneSource::Zero,
        ..Default::default()
    };
    // Camera just above y = 0, looking down at a cube below it
    let mut harness = Harness::with_config(
        camera_at(Vec3::new(0.0, 0.5, 6.0), Vec3::new(0.0, -3.0, 0.0)),
        scene_with([cube(Vec3::new(0.0, -3.0, 0.0), 2.0)]),
        config,
    );
    let before = harness.camera();

    let response = harness.input(wheel(center(), 1.0));

    assert!(!response.camera_changed);
    assert!(response.prevent_default);
    assert_eq!(harness.camera(), before);
    assert_eq!(harness.events.totals(), (0, 0, 0));
}

#[test]
fn test_zero_wheel_delta_is_ignored() {
    let mut harness = cube_harness();
    let before = harness.camera();
    let response = harness.input(wheel(center(), 0.0));
    assert!(!response.camera_changed);
    assert_eq!(harness.camera(), before);
    assert_eq!(harness.events.totals(), (0, 0, 0));
}

#[test]
fn test_pinch_zoom_moves_toward_scene() {
    let mut harness = cube_harness();
    let start = harness.camera().position.distance(Vec3::ZERO);

    harness.input(NavigationInput::PointerDown(PointerEvent::touch(10, 24.0, 24.0)));
    harness.input(NavigationInput::PointerDown(PointerEvent::touch(11, 40.0, 24.0)));
    assert_eq!(harness.controls.gesture_state(), GestureState::TouchRotatingZooming);

    let response = harness.input(NavigationInput::PointerMove(PointerEvent::touch(11, 56.0, 24.0)));
    assert!(response.camera_changed);
    assert!(harness.camera().position.distance(Vec3::ZERO) < start);
}

#[test]
fn test_zoom_onto_sphere_resting_on_ground_mesh() {
    let mut harness = Harness::new(
        camera_at(Vec3::new(0.0, 2.0, 6.0), Vec3::ZERO),
        scene_with([ground(-1.0, 20.0), sphere(Vec3::ZERO, 2.0)]),
    );
    assert!((harness.controls.resilience().ground_plane_height() + 1.0).abs() < 1e-5);

    let start = harness.camera().position.distance(Vec3::ZERO);
    assert!(harness.input(wheel(center(), -1.0)).camera_changed);

    let zoomed = harness.camera();
    assert!(zoomed.position.distance(Vec3::ZERO) < start);
    assert!(zoomed.position.y > -1.0);
}

// ============================================================================
// Rotate
// ============================================================================

#[test]
fn test_elevation_lands_on_bounds() {
    let config = NavigationConfig {
        allow_rotation_below_ground_plane: false,
        ..Default::default()
    };
    let mut harness = Harness::with_config(
        camera_at(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO),
        scene_with([cube(Vec3::ZERO, 2.0)]),
        config,
    );

    assert!(harness.controls.rotate(Vec2::new(0.0, 10.0)));
    assert_eq!(harness.controls.elevation_angle(), MIN_ELEVATION_ANGLE);

    assert!(harness.controls.rotate(Vec2::new(0.2, -10.0)));
    assert_eq!(harness.controls.elevation_angle(), FRAC_PI_2);

    let look_at = harness.controls.look_at();
    assert_eq!(harness.camera().target, look_at);
}

#[test]
fn test_elevation_stays_in_range_while_dragging() {
    let mut harness = cube_harness();
    let max = harness.controls.resilience().max_rotation_angle();

    harness.input(NavigationInput::PointerDown(mouse(PointerButton::Primary, center())));
    assert_eq!(harness.controls.gesture_state(), GestureState::Rotating);

    let path = [(40.0, 10.0), (10.0, 47.0), (60.0, -300.0), (0.0, 600.0), (32.0, 24.0)];
    for (x, y) in path {
        harness.input(NavigationInput::PointerMove(mouse(
            PointerButton::Primary,
            Vec2::new(x, y),
        )));
        let elevation = harness.controls.elevation_angle();
        assert!(elevation > 0.0 && elevation <= max, "elevation {}", elevation);
    }

    let response = harness.input(NavigationInput::PointerUp(mouse(PointerButton::Primary, center())));
    assert_eq!(response.capture, PointerCapture::Release(1));
    assert_eq!(harness.controls.gesture_state(), GestureState::Idle);
    let (start, change, end) = harness.events.totals();
    assert_eq!((start, end), (1, 1));
    assert!(change >= 1);
}

#[test]
fn test_rotation_keeps_distance_to_look_at() {
    let mut harness = cube_harness();
    let look_at = harness.controls.look_at();
    let distance = harness.camera().position.distance(look_at);

    assert!(harness.controls.rotate(Vec2::new(0.7, 0.3)));
    assert_eq!(harness.controls.look_at(), look_at);
    assert!((harness.camera().position.distance(look_at) - distance).abs() < 1e-3);
}

#[test]
fn test_cursor_pivot_keeps_distance_to_grabbed_point() {
    let mut harness = cube_harness();
    harness.controls.set_rotation_pivot(RotationPivot::Cursor);

    let grab = pixel(36, 26);
    harness.input(NavigationInput::PointerDown(mouse(PointerButton::Primary, grab)));
    let pivot = harness.controls.mouse_world_position();
    let distance = harness.camera().position.distance(pivot);

    harness.input(NavigationInput::PointerMove(mouse(
        PointerButton::Primary,
        grab + Vec2::new(30.0, 10.0),
    )));
    assert!((harness.camera().position.distance(pivot) - distance).abs() < 1e-3);
    assert_eq!(harness.camera().target, harness.controls.look_at());
}

/// Camera looking far past the cube, so the ground look-at point lies well
/// outside the navigation bounds
fn distant_look_at_harness() -> Harness {
    Harness::new(
        camera_at(Vec3::new(0.0, 1.5, 6.0), Vec3::new(0.0, -1.0, -20.0)),
        scene_with([cube(Vec3::ZERO, 2.0)]),
    )
}

fn distance_from_bounds(harness: &Harness) -> f32 {
    let center = harness.controls.resilience().bounding_sphere().center;
    harness.camera().position.distance(center)
}

#[test]
fn test_rotation_around_distant_look_at_respects_distance_limit() {
    let mut harness = distant_look_at_harness();
    let max = harness.controls.resilience().max_pan_zoom_distance();
    assert!((harness.controls.look_at() - Vec3::new(0.0, -1.0, -20.0)).length() < 1e-3);

    let before = harness.camera();
    assert!(!harness.controls.rotate(Vec2::new(PI, 0.0)));
    assert_eq!(harness.camera(), before);

    // A small turn stays inside the limit and is still accepted
    assert!(harness.controls.rotate(Vec2::new(0.05, 0.0)));
    assert!(distance_from_bounds(&harness) <= max + 1e-4);
}

#[test]
fn test_cursor_rotation_on_background_respects_distance_limit() {
    let mut harness = distant_look_at_harness();
    harness.controls.set_rotation_pivot(RotationPivot::Cursor);
    let max = harness.controls.resilience().max_pan_zoom_distance();

    let grab = pixel(1, 24);
    harness.input(NavigationInput::PointerDown(mouse(PointerButton::Primary, grab)));
    for step in 1..=6 {
        harness.input(NavigationInput::PointerMove(mouse(
            PointerButton::Primary,
            grab + Vec2::new(10.0 * step as f32, 0.0),
        )));
        let distance = distance_from_bounds(&harness);
        assert!(distance <= max + 1e-4, "step {}: {} > {}", step, distance, max);
    }
    harness.input(NavigationInput::PointerUp(mouse(PointerButton::Primary, grab)));
}

#[test]
fn test_camera_on_up_axis_starts_off_the_axis() {
    capture_logs();
    let mut harness = Harness::new(
        camera_at(Vec3::new(0.0, 6.0, 0.0), Vec3::ZERO),
        scene_with([cube(Vec3::ZERO, 2.0)]),
    );
    assert_eq!(harness.controls.elevation_angle(), MIN_ELEVATION_ANGLE);
    assert!(warnings_containing("up axis") >= 1);

    assert!(harness.controls.rotate(Vec2::new(0.0, -0.5)));
    assert!((harness.controls.elevation_angle() - 0.5).abs() < 1e-5);
    assert!(harness.camera().view_matrix().is_finite());
}

// ============================================================================
// Pan
// ============================================================================

#[test]
fn test_pan_height_guide_is_fixed_at_gesture_start() {
    let mut harness = Harness::new(
        camera_at(Vec3::new(0.0, 3.0, 6.0), Vec3::ZERO),
        scene_with([cube(Vec3::ZERO, 2.0)]),
    );

    let grab = pixel(34, 26);
    harness.input(NavigationInput::PointerDown(mouse(PointerButton::Secondary, grab)));
    assert_eq!(harness.controls.gesture_state(), GestureState::Panning);
    let height = harness.controls.mouse_world_position().y;
    assert_eq!(harness.controls.pan_height_guide(), Some(height));

    for (i, offset) in [Vec2::new(4.0, 0.0), Vec2::new(6.0, 3.0), Vec2::new(-5.0, 2.0)]
        .into_iter()
        .enumerate()
    {
        let response = harness.input(NavigationInput::PointerMove(mouse(
            PointerButton::Secondary,
            grab + offset,
        )));
        assert!(response.camera_changed);
        assert_eq!(harness.controls.pan_height_guide(), Some(height));

        // A zoom in the middle of the drag moves the camera vertically
        if i == 0 {
            assert!(harness.input(wheel(grab + offset, -1.0)).camera_changed);
            assert_eq!(harness.controls.pan_height_guide(), Some(height));
        }
    }

    harness.input(NavigationInput::PointerUp(mouse(PointerButton::Secondary, grab)));
    assert_eq!(harness.controls.pan_height_guide(), None);
}

#[test]
fn test_wheel_during_drag_keeps_one_gesture() {
    let mut harness = Harness::new(
        camera_at(Vec3::new(0.0, 3.0, 6.0), Vec3::ZERO),
        scene_with([cube(Vec3::ZERO, 2.0)]),
    );

    let grab = pixel(34, 26);
    harness.input(NavigationInput::PointerDown(mouse(PointerButton::Secondary, grab)));
    harness.input(NavigationInput::PointerMove(mouse(
        PointerButton::Secondary,
        grab + Vec2::new(4.0, 0.0),
    )));
    assert!(harness.input(wheel(grab + Vec2::new(4.0, 0.0), -1.0)).camera_changed);

    let (start, change, end) = harness.events.totals();
    assert_eq!((start, end), (1, 0));
    assert!(change >= 2);

    harness.input(NavigationInput::PointerUp(mouse(PointerButton::Secondary, grab)));
    let (start, _, end) = harness.events.totals();
    assert_eq!((start, end), (1, 1));
}

#[test]
fn test_pan_drag_moves_camera_against_drag() {
    let mut harness = Harness::new(
        camera_at(Vec3::new(0.0, 3.0, 6.0), Vec3::ZERO),
        scene_with([cube(Vec3::ZERO, 2.0)]),
    );
    let start = harness.camera();

    harness.input(NavigationInput::PointerDown(mouse(PointerButton::Secondary, center())));
    harness.input(NavigationInput::PointerMove(mouse(
        PointerButton::Secondary,
        center() + Vec2::new(8.0, 0.0),
    )));

    let camera = harness.camera();
    assert!(camera.position.x < start.position.x);
    assert!((camera.position.y - start.position.y).abs() < 1e-4);
    assert!((camera.forward() - start.forward()).length() < 1e-4);
}

#[test]
fn test_pan_bound_scenario() {
    let radius = 3.0_f32.sqrt();
    let mut harness = Harness::with_config(
        camera_at(Vec3::new(0.0, 0.0, 4.0 * radius), Vec3::ZERO),
        scene_with([cube(Vec3::ZERO, 2.0)]),
        NavigationConfig {
            ground_plane: GroundPlaneSource::Zero,
            ..Default::default()
        },
    );
    let resilience = harness.controls.resilience();
    assert!((resilience.bounding_sphere().radius - radius).abs() < 1e-5);
    assert!((resilience.max_pan_zoom_distance() - 5.0 * radius).abs() < 1e-4);

    // Dragging the scene left moves the camera right
    let drag = Vec3::new(-2.0 * radius, 0.0, 0.0);
    assert!(harness.controls.pan(drag));
    let accepted = harness.camera().position;
    assert!((accepted - Vec3::new(2.0 * radius, 0.0, 4.0 * radius)).length() < 1e-4);

    assert!(!harness.controls.pan(drag));
    assert_eq!(harness.camera().position, accepted);
}

// ============================================================================
// Input bookkeeping
// ============================================================================

#[test]
fn test_touch_pointer_bookkeeping() {
    let mut harness = cube_harness();
    let ids = |harness: &Harness| -> Vec<u64> {
        harness
            .controls
            .tracked_pointers()
            .pointers()
            .iter()
            .map(|p| p.pointer_id)
            .collect()
    };

    harness.input(NavigationInput::PointerDown(PointerEvent::touch(1, 20.0, 20.0)));
    harness.input(NavigationInput::PointerDown(PointerEvent::touch(2, 40.0, 20.0)));
    harness.input(NavigationInput::PointerDown(PointerEvent::touch(3, 30.0, 30.0)));
    assert_eq!(ids(&harness), vec![1, 2]);

    harness.input(NavigationInput::PointerUp(PointerEvent::touch(1, 20.0, 20.0)));
    assert_eq!(harness.controls.gesture_state(), GestureState::Panning);
    assert_eq!(ids(&harness), vec![2]);

    harness.input(NavigationInput::PointerDown(PointerEvent::touch(3, 30.0, 30.0)));
    assert_eq!(ids(&harness), vec![2, 3]);
    assert_eq!(harness.controls.gesture_state(), GestureState::TouchRotatingZooming);

    harness.input(NavigationInput::PointerUp(PointerEvent::touch(2, 40.0, 20.0)));
    harness.input(NavigationInput::PointerCancel(PointerEvent::touch(3, 30.0, 30.0)));
    assert!(ids(&harness).is_empty());
    assert_eq!(harness.controls.gesture_state(), GestureState::Idle);

    // One gesture from the first finger down to the last finger up
    let (start, _, end) = harness.events.totals();
    assert_eq!((start, end), (1, 1));
}

#[test]
fn test_context_menu_is_suppressed() {
    let mut harness = cube_harness();
    assert!(harness.input(NavigationInput::ContextMenu).prevent_default);
}

#[test]
fn test_swapped_buttons_pan_with_primary() {
    let mut harness = cube_harness();
    harness.controls.swap_buttons();
    harness.input(NavigationInput::PointerDown(mouse(PointerButton::Primary, center())));
    assert_eq!(harness.controls.gesture_state(), GestureState::Panning);
}

// ============================================================================
// Depth sampling
// ============================================================================

#[rstest]
#[case(0.0, -1.0)]
#[case(0.25, -0.5)]
#[case(0.5, 0.0)]
#[case(1.0, 1.0)]
#[case(1.75, 1.0)]
#[case(-0.5, -1.0)]
fn test_uniform_depth_round_trip(#[case] raw: f32, #[case] expected: f32) {
    let mut harness = cube_harness();
    let target = harness.controls.navigation_target();
    harness.backend.lock().fill_depth(target, raw).unwrap();
    harness.controls.update(false).unwrap();

    for ndc in [Vec2::ZERO, Vec2::new(-1.0, -1.0), Vec2::new(0.9, -0.4), Vec2::new(3.0, 3.0)] {
        let depth = harness
            .controls
            .depth_sampler()
            .read_depth_at(&mut *harness.backend.lock(), ndc)
            .unwrap();
        assert!((depth - expected).abs() < 1e-6, "ndc {:?}: {}", ndc, depth);
    }
}

#[test]
fn test_background_resolves_to_back_of_bounds() {
    let mut harness = cube_harness();
    // Top-left corner misses the cube
    assert!(harness.input(NavigationInput::PointerDown(mouse(PointerButton::Primary, pixel(0, 0)))).prevent_default);

    let camera = harness.camera();
    let world = harness.controls.mouse_world_position();
    let back_depth = harness.controls.resilience().bounding_depth_ndc();
    assert!((camera.project(world).z - back_depth).abs() < 1e-4);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_empty_scene_then_content() {
    capture_logs();
    let mut harness = Harness::new(
        camera_at(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO),
        Scene::new(),
    );
    assert_eq!(harness.controls.resilience().max_pan_zoom_distance(), 0.0);
    assert_eq!(warnings_containing("no renderable content"), 1);

    // Still empty: limits stay off and the warning is not repeated
    harness.scene.write().notify(SceneEvent::ContentChanged);
    harness.controls.update(false).unwrap();
    harness.input(wheel(center(), -1.0));
    assert_eq!(harness.controls.resilience().max_pan_zoom_distance(), 0.0);
    assert_eq!(warnings_containing("no renderable content"), 1);

    harness.scene.write().add_object(cube(Vec3::new(1.0, 0.0, 0.0), 2.0));
    harness.scene.write().notify(SceneEvent::ContentChanged);
    harness.controls.update(false).unwrap();

    let resilience = harness.controls.resilience();
    let radius = resilience.bounding_sphere().radius;
    assert!((radius - 3.0_f32.sqrt()).abs() < 1e-5);
    assert!((resilience.max_pan_zoom_distance() - 5.0 * radius).abs() < 1e-4);
    assert_eq!(warnings_containing("no renderable content"), 1);
}

#[test]
fn test_reset_restores_construction_camera() {
    let mut harness = cube_harness();
    let initial = harness.camera();
    let look_at = harness.controls.look_at();

    harness.controls.rotate(Vec2::new(0.5, 0.2));
    harness.input(wheel(center(), -1.0));
    assert_ne!(harness.camera().position, initial.position);

    let changes = harness.events.change.get();
    harness.controls.reset();
    assert!((harness.camera().position - initial.position).length() < 1e-6);
    assert_eq!(harness.controls.look_at(), look_at);
    assert_eq!(harness.events.change.get(), changes + 1);
}

#[test]
fn test_reload_camera_with_scene_center() {
    let mut harness = cube_harness();
    harness.scene.write().add_object(cube(Vec3::new(4.0, 0.0, 0.0), 2.0));

    let scene_center = Vec3::new(2.0, 0.0, 0.0);
    harness.controls.reload_camera(Some(scene_center));
    assert_eq!(harness.controls.look_at(), scene_center);
    assert_eq!(harness.camera().target, scene_center);
    assert!((harness.controls.resilience().bounding_sphere().center - scene_center).length() < 1e-5);
}

#[test]
fn test_look_at_scene_center_flag() {
    let harness = Harness::with_config(
        camera_at(Vec3::new(0.0, 2.0, 5.0), Vec3::new(0.0, 0.0, -3.0)),
        scene_with([cube(Vec3::new(0.0, 1.0, 0.0), 2.0)]),
        NavigationConfig {
            look_at_scene_center: true,
            ..Default::default()
        },
    );
    assert!((harness.controls.look_at() - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
    assert_eq!(harness.camera().target, harness.controls.look_at());
}

#[test]
fn test_look_at_defaults_to_ground_intersection() {
    let harness = cube_harness();
    // View ray through the origin meets the cube bottom at y = -1
    let look_at = harness.controls.look_at();
    assert!((look_at - Vec3::new(0.0, -1.0, -2.5)).length() < 1e-4);
}

#[test]
fn test_resize_reallocates_targets() {
    let mut harness = cube_harness();
    harness.backend.lock().set_size(32, 20);
    harness.scene.write().notify(SceneEvent::Resized);
    harness.controls.update(false).unwrap();

    let backend = harness.backend.lock();
    let navigation = harness.controls.navigation_target();
    let readback = harness.controls.depth_sampler().target();
    assert_eq!(backend.render_target_size(navigation), Some((32, 20)));
    assert_eq!(backend.render_target_size(readback), Some((32, 20)));
}

#[test]
fn test_update_copies_to_canvas() {
    let mut harness = cube_harness();
    let target = harness.controls.navigation_target();
    harness.backend.lock().fill_color(target, [0.25, 0.5, 0.75, 1.0]).unwrap();

    harness.controls.update(false).unwrap();
    assert_eq!(harness.backend.lock().stats().presents, 0);

    harness.controls.update(true).unwrap();
    let backend = harness.backend.lock();
    assert_eq!(backend.stats().presents, 1);
    assert!(backend.canvas().iter().all(|p| *p == [0.25, 0.5, 0.75, 1.0]));
}

#[test]
fn test_dispose_releases_everything() {
    let mut harness = cube_harness();
    assert_eq!(harness.scene.read().subscriber_count(), 1);
    assert_eq!(harness.backend.lock().render_target_count(), 2);

    harness.controls.dispose();
    assert!(harness.controls.is_disposed());
    assert_eq!(harness.scene.read().subscriber_count(), 0);
    assert_eq!(harness.backend.lock().render_target_count(), 0);
    assert_eq!(harness.backend.lock().depth_blit_count(), 0);

    let before = harness.camera();
    let response = harness.controls.handle_input(wheel(center(), -1.0));
    assert!(!response.prevent_default);
    assert_eq!(harness.camera(), before);
    assert_eq!(harness.events.totals(), (0, 0, 0));

    // Idempotent
    harness.controls.dispose();
}

#[test]
fn test_observer_receives_state() {
    let mut harness = cube_harness();
    let visualiser = Arc::new(Mutex::new(GizmoVisualiser::new()));
    visualiser.lock().set_visibility(VisibilitySettings {
        bounding_sphere: Some(true),
        rotation_center: Some(true),
        ..Default::default()
    });
    harness.controls.set_observer(Box::new(visualiser.clone()));
    let sphere_only = visualiser.lock().line_vertices().len();
    assert!(sphere_only > 0);

    harness.input(NavigationInput::PointerDown(mouse(PointerButton::Primary, center())));
    assert_eq!(visualiser.lock().line_vertices().len(), sphere_only + 6);

    visualiser.lock().set_visible(GizmoKind::BoundingSphere, false);
    assert_eq!(visualiser.lock().line_vertices().len(), 6);
}
