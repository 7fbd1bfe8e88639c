//! Camera control: gesture steering plus ordinary mouse orbit and zoom.

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;

use crate::viewer::constants::{MAX_CAMERA_DISTANCE, MIN_CAMERA_DISTANCE, POLAR_MARGIN};
use crate::viewer::resources::{GestureInput, OrbitCamera};

/// Per-tick camera update.
///
/// Gestures drive yaw and polar angle (see [`OrbitCamera::steer`]);
/// distance and manual orbit stay on ordinary mouse input, unaffected by
/// gestures.
pub fn camera_control_system(
    mut orbit: ResMut<OrbitCamera>,
    input: Res<GestureInput>,
    time: Res<Time>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll: EventReader<MouseWheel>,
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
) {
    // Manual orbit on right-click drag
    if mouse_button.pressed(MouseButton::Right) {
        for ev in mouse_motion.read() {
            orbit.yaw -= ev.delta.x * 0.01;
            orbit.polar = (orbit.polar + ev.delta.y * 0.01)
                .clamp(POLAR_MARGIN, std::f32::consts::PI - POLAR_MARGIN);
        }
    }

    // Zoom on scroll
    for ev in scroll.read() {
        orbit.distance =
            (orbit.distance - ev.y * 2.0).clamp(MIN_CAMERA_DISTANCE, MAX_CAMERA_DISTANCE);
    }

    orbit.steer(&input.0, time.delta_secs());

    if let Ok(mut transform) = camera_query.get_single_mut() {
        *transform = Transform::from_translation(orbit.position()).looking_at(orbit.target, Vec3::Y);
    }
}
