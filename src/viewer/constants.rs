//! Visual and interaction constants for the viewer.

use std::f32::consts::PI;

use bevy::prelude::*;

// =============================================================================
// Node Colors
// =============================================================================

/// Agent node color (dusty rose).
pub const COLOR_AGENT: Color = Color::srgb(0.63, 0.53, 0.53);
pub const COLOR_AGENT_ACCENT: Color = Color::srgb(0.75, 0.44, 0.31);
/// Skill node color (gold).
pub const COLOR_SKILL: Color = Color::srgb(1.0, 0.84, 0.0);
pub const COLOR_SKILL_ACCENT: Color = Color::srgb(1.0, 0.67, 0.0);
/// Task node color (red).
pub const COLOR_TASK: Color = Color::srgb(0.97, 0.44, 0.44);
pub const COLOR_TASK_ACCENT: Color = Color::srgb(1.0, 0.27, 0.27);
/// Resource node color (teal).
pub const COLOR_RESOURCE: Color = Color::srgb(0.35, 0.60, 0.54);
pub const COLOR_RESOURCE_ACCENT: Color = Color::srgb(0.29, 0.54, 0.48);
/// Zone node color (mauve).
pub const COLOR_ZONE: Color = Color::srgb(0.50, 0.38, 0.44);
pub const COLOR_ZONE_ACCENT: Color = Color::srgb(0.63, 0.50, 0.57);

// =============================================================================
// Edge Colors by Relationship Type
// =============================================================================

pub const COLOR_HAS_SKILL: Color = Color::srgb(0.9, 0.7, 0.2);
pub const COLOR_ASSIGNED_TO: Color = Color::srgb(1.0, 0.5, 0.3);
pub const COLOR_REQUIRES: Color = Color::srgb(0.8, 0.3, 0.5);
pub const COLOR_PRODUCES: Color = Color::srgb(0.5, 0.8, 0.4);
pub const COLOR_LOCATED_IN: Color = Color::srgb(0.6, 0.4, 0.8);
pub const COLOR_RELATED_TO: Color = Color::srgb(0.7, 0.7, 0.7);

// =============================================================================
// Geometry
// =============================================================================

/// Edge cylinder radius.
pub const EDGE_RADIUS: f32 = 0.04;
/// Below this squared endpoint distance an edge is a degenerate
/// zero-length line and is hidden instead of drawn.
pub const EDGE_EPSILON_SQ: f32 = 0.01;
/// Hit radius of the invisible pick hotspot at an edge's midpoint.
pub const EDGE_HOTSPOT_RADIUS: f32 = 0.35;
/// Hit radius padding over the visual radius, for easier clicking.
pub const HIT_PADDING: f32 = 1.8;

// =============================================================================
// Decorative motion
// =============================================================================

pub const BOB_AMPLITUDE: f32 = 0.35;
pub const BOB_FREQUENCY: f32 = 1.5;
pub const DRIFT_RADIUS: f32 = 0.2;
pub const PULSE_SCALE: f32 = 0.08;

// =============================================================================
// Camera
// =============================================================================

/// Hand x spans two full turns either way from center.
pub const YAW_SPAN: f32 = 4.0 * PI;
/// Gesture y maps into this polar range before the hard clamp.
pub const POLAR_TARGET_MIN: f32 = PI / 4.0;
pub const POLAR_TARGET_MAX: f32 = PI / 1.8;
/// Hard bound keeping the camera off the poles.
pub const POLAR_MARGIN: f32 = 0.1;
/// Per-tick follow factors: open palm tracks fast, fist holds the frame.
pub const FOLLOW_OPEN: f32 = 0.10;
pub const FOLLOW_CLOSED: f32 = 0.01;
pub const FOLLOW_DEFAULT: f32 = 0.05;
pub const MIN_CAMERA_DISTANCE: f32 = 4.0;
pub const MAX_CAMERA_DISTANCE: f32 = 120.0;
/// Idle yaw drift applied per second when no gesture is steering the camera.
pub const AUTO_ROTATE_SPEED: f32 = 0.09;
