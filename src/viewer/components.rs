//! ECS components for graph scene entities.

use bevy::prelude::*;

use crate::models::{EdgeKind, NodeKind};

/// The graph id an entity root represents. Picking walks up the hierarchy
/// until it finds one of these.
#[derive(Component, Debug, Clone)]
pub struct GraphId(pub String);

/// Per-node render state.
///
/// The phase offsets this entity's decorative oscillation so no two
/// entities ever move in lockstep; it is derived from the id alone and
/// therefore stable across updates.
#[derive(Component, Debug)]
pub struct NodeVisual {
    pub kind: NodeKind,
    pub phase: f32,
}

/// Per-edge render state. Endpoints are resolved through the scene index
/// every tick, after node positions have been validated.
#[derive(Component, Debug)]
pub struct EdgeVisual {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

/// Spherical hit volume for ray picking. Present on entity roots and on
/// decoration children, so a click on a ring or spike still resolves to
/// the owning entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct HitSphere {
    pub radius: f32,
}

/// Marker for the tracking status readout text.
#[derive(Component)]
pub struct StatusReadout;

/// Stable oscillation phase for an id, spread over a full turn.
pub fn stable_phase(id: &str) -> f32 {
    let hash = id
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32));
    (hash % 6283) as f32 / 1000.0
}
