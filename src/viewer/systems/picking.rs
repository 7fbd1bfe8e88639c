//! Click-to-select ray picking.
//!
//! A click casts a ray through the cursor, intersects every hit sphere the
//! scene owns (entity roots and decoration children alike), takes the
//! nearest hit, and walks up the parent chain until an entity carrying a
//! graph id is found. The result is only reported; highlighting is decided
//! by the selection store, not here.

use bevy::prelude::*;

use crate::viewer::components::{GraphId, HitSphere};
use crate::viewer::resources::{CurrentGraph, OnSelect, SelectionChanged, SelectionRes};

/// Ray/sphere test: distance along the ray to the closest approach, if the
/// ray passes within the radius and the sphere is in front of the origin.
pub fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let t = to_center.dot(direction);
    if t <= 0.0 {
        return None;
    }
    let closest = origin + direction * t;
    if closest.distance(center) < radius {
        Some(t)
    } else {
        None
    }
}

/// Resolve a left click to a graph id (or a miss) and report it.
#[allow(clippy::too_many_arguments)]
pub fn pick_entity_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    targets: Query<(Entity, &GlobalTransform, &HitSphere)>,
    ids: Query<(&GraphId, &Visibility)>,
    parents: Query<&Parent>,
    on_select: Res<OnSelect>,
    mut events: EventWriter<SelectionChanged>,
) {
    if !mouse_button.just_pressed(MouseButton::Left) {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.get_single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };

    // Nearest hit across every owned hit sphere
    let mut nearest: Option<(Entity, f32)> = None;
    for (entity, transform, hit) in targets.iter() {
        if let Some(t) = ray_sphere(ray.origin, *ray.direction, transform.translation(), hit.radius)
        {
            if nearest.map_or(true, |(_, best)| t < best) {
                nearest = Some((entity, t));
            }
        }
    }

    // Walk up the containment hierarchy to the id-carrying entity; hits on
    // hidden entities do not select
    let picked = nearest.and_then(|(mut entity, _)| loop {
        if let Ok((graph_id, visibility)) = ids.get(entity) {
            if *visibility == Visibility::Hidden {
                break None;
            }
            break Some(graph_id.0.clone());
        }
        match parents.get(entity) {
            Ok(parent) => entity = parent.get(),
            Err(_) => break None,
        }
    });

    if let Some(callback) = on_select.0.as_ref() {
        callback(picked.as_deref());
    }
    events.send(SelectionChanged(picked));
}

/// Built-in selection consumer, standing in for the external store: owns
/// the selected id and derives the highlight set (the picked entity plus
/// its graph neighbors). The scene reads this back for glow only.
pub fn selection_store_system(
    mut events: EventReader<SelectionChanged>,
    current: Res<CurrentGraph>,
    mut selection: ResMut<SelectionRes>,
) {
    for SelectionChanged(picked) in events.read() {
        let state = &mut selection.0;
        state.selected = picked.clone();
        state.highlighted.clear();

        let Some(id) = picked else {
            continue;
        };
        state.highlighted.insert(id.clone());
        for edge in &current.0.edges {
            if edge.source == *id {
                state.highlighted.insert(edge.target.clone());
            } else if edge.target == *id {
                state.highlighted.insert(edge.source.clone());
            }
            if edge.id == *id {
                state.highlighted.insert(edge.source.clone());
                state.highlighted.insert(edge.target.clone());
            }
        }
    }
}
