//! ECS resources and events for viewer state.

use std::collections::HashMap;
use std::f32::consts::PI;

use bevy::prelude::*;
use tokio::sync::{mpsc, watch};

use super::constants::*;
use super::style::{edge_color, node_style};
use crate::gesture::{Gesture, GestureState, TrackingStatus};
use crate::layout::ForceLayout;
use crate::models::{EdgeKind, GraphData, NodeKind, SelectionState};

/// Selection callback signature: `Some(id)` on a hit, `None` on a miss.
pub type SelectFn = Box<dyn Fn(Option<&str>) + Send + Sync>;

// =============================================================================
// Camera State
// =============================================================================

/// Camera orbit state.
///
/// Yaw is the azimuth; polar is measured from the +Y pole and held strictly
/// inside `(POLAR_MARGIN, PI - POLAR_MARGIN)` so the camera can never
/// invert over the top.
#[derive(Resource)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub polar: f32,
    /// Distance from target; mouse wheel only, gestures never touch it.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Idle azimuthal rotation, radians per second.
    pub auto_rotate: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            polar: PI / 2.0 - 0.3,
            distance: 40.0,
            target: Vec3::ZERO,
            auto_rotate: AUTO_ROTATE_SPEED,
        }
    }
}

impl OrbitCamera {
    /// Advance the orbit one render tick from the latest gesture sample.
    ///
    /// No active hand: constant auto-rotation. Active hand: x maps to a yaw
    /// target spanning [`YAW_SPAN`] so small motion near either edge keeps
    /// the turn going, y maps to a polar target; both are approached by
    /// per-tick exponential smoothing whose factor depends on the gesture
    /// (open follows fast, fist near-freezes the frame).
    pub fn steer(&mut self, input: &GestureState, dt: f32) {
        if !input.active {
            self.yaw += self.auto_rotate * dt;
        } else {
            let target_yaw = (input.x.clamp(0.0, 1.0) - 0.5) * YAW_SPAN;
            let target_polar = POLAR_TARGET_MIN
                + input.y.clamp(0.0, 1.0) * (POLAR_TARGET_MAX - POLAR_TARGET_MIN);

            let follow = match input.gesture {
                Gesture::Open => FOLLOW_OPEN,
                Gesture::Closed => FOLLOW_CLOSED,
                Gesture::None => FOLLOW_DEFAULT,
            };

            self.yaw += (target_yaw - self.yaw) * follow;
            self.polar += (target_polar - self.polar) * follow;
        }
        self.polar = self.polar.clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
    }

    /// World-space camera position for the current orbit parameters.
    pub fn position(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + self.distance
                * Vec3::new(
                    sin_polar * self.yaw.sin(),
                    self.polar.cos(),
                    sin_polar * self.yaw.cos(),
                )
    }
}

// =============================================================================
// Cross-loop inputs
// =============================================================================

/// The gesture sample the render loop acts on this tick (copied from the
/// latest-wins slot at the top of the frame).
#[derive(Resource, Default)]
pub struct GestureInput(pub GestureState);

/// Receiving ends of the tracking pipeline's latest-wins slots. `None`
/// when tracking is disabled.
#[derive(Resource, Default)]
pub struct GestureFeed {
    pub gesture: Option<watch::Receiver<GestureState>>,
    pub status: Option<watch::Receiver<TrackingStatus>>,
}

/// Channel of wholesale graph updates produced off the render loop (file
/// re-reads, service pushes). Drained non-blockingly each tick.
#[derive(Resource, Default)]
pub struct GraphStream(pub Option<mpsc::Receiver<GraphData>>);

/// Initial graph payload, consumed by a startup system.
#[derive(Resource)]
pub struct InitialGraph(pub Option<GraphData>);

// =============================================================================
// Graph and scene state
// =============================================================================

/// The layout simulation.
#[derive(Resource)]
pub struct LayoutRes(pub ForceLayout);

/// Id → entity maps for everything the scene currently owns. Mutated only
/// inside the ingest system.
#[derive(Resource, Default)]
pub struct SceneIndex {
    pub nodes: HashMap<String, Entity>,
    pub edges: HashMap<String, Entity>,
}

/// Last ingested graph, kept for adjacency lookups (selection store).
#[derive(Resource, Default)]
pub struct CurrentGraph(pub GraphData);

/// Externally-owned selection, mirrored here for the scene to read. The
/// core only writes it through the built-in selection store system, which
/// stands in for the external consumer.
#[derive(Resource, Default)]
pub struct SelectionRes(pub SelectionState);

/// Selection callback invoked on every pick.
#[derive(Resource, Default)]
pub struct OnSelect(pub Option<SelectFn>);

// =============================================================================
// Events
// =============================================================================

/// A wholesale graph update entering the scene.
#[derive(Event)]
pub struct GraphUpdate(pub GraphData);

/// Reported pick result: `Some(id)` or `None` for a miss.
#[derive(Event)]
pub struct SelectionChanged(pub Option<String>);

// =============================================================================
// Materials and meshes
// =============================================================================

/// Normal/glow/accent material handles for one node kind.
#[derive(Clone)]
pub struct NodeMaterialSet {
    pub normal: Handle<StandardMaterial>,
    pub glow: Handle<StandardMaterial>,
    pub accent: Handle<StandardMaterial>,
}

/// Pre-created materials for nodes and edges.
///
/// Created once at startup; swapping handles between normal and glow
/// states is then free.
#[derive(Resource)]
pub struct StyleMaterials {
    agent: NodeMaterialSet,
    skill: NodeMaterialSet,
    task: NodeMaterialSet,
    resource: NodeMaterialSet,
    zone: NodeMaterialSet,
    edges: HashMap<EdgeKind, (Handle<StandardMaterial>, Handle<StandardMaterial>)>,
}

impl StyleMaterials {
    pub fn build(materials: &mut Assets<StandardMaterial>) -> Self {
        let mut node_set = |kind: NodeKind| {
            let style = node_style(kind);
            let [r, g, b] = style.base_color.to_srgba().to_f32_array_no_alpha();

            let normal = materials.add(StandardMaterial {
                base_color: style.base_color,
                metallic: 0.1,
                perceptual_roughness: 0.8,
                emissive: LinearRgba::new(
                    r * style.emissive_intensity,
                    g * style.emissive_intensity,
                    b * style.emissive_intensity,
                    1.0,
                ),
                ..default()
            });
            let glow = materials.add(StandardMaterial {
                base_color: style.base_color,
                metallic: 0.3,
                perceptual_roughness: 0.4,
                emissive: LinearRgba::new(r * 1.5, g * 1.5, b * 1.5, 1.0),
                ..default()
            });
            let accent = materials.add(StandardMaterial {
                base_color: style.accent_color,
                metallic: 0.2,
                perceptual_roughness: 0.6,
                ..default()
            });
            NodeMaterialSet {
                normal,
                glow,
                accent,
            }
        };

        let agent = node_set(NodeKind::Agent);
        let skill = node_set(NodeKind::Skill);
        let task = node_set(NodeKind::Task);
        let resource = node_set(NodeKind::Resource);
        let zone = node_set(NodeKind::Zone);

        let mut edges = HashMap::new();
        for kind in [
            EdgeKind::HasSkill,
            EdgeKind::AssignedTo,
            EdgeKind::Requires,
            EdgeKind::Produces,
            EdgeKind::LocatedIn,
            EdgeKind::RelatedTo,
        ] {
            let color = edge_color(kind);
            let [r, g, b] = color.to_srgba().to_f32_array_no_alpha();
            let normal = materials.add(StandardMaterial {
                base_color: color,
                metallic: 0.3,
                perceptual_roughness: 0.6,
                ..default()
            });
            let glow = materials.add(StandardMaterial {
                base_color: color,
                metallic: 0.4,
                perceptual_roughness: 0.4,
                emissive: LinearRgba::new(r * 2.5, g * 2.5, b * 2.5, 1.0),
                ..default()
            });
            edges.insert(kind, (normal, glow));
        }

        Self {
            agent,
            skill,
            task,
            resource,
            zone,
            edges,
        }
    }

    pub fn node_set(&self, kind: NodeKind) -> &NodeMaterialSet {
        match kind {
            NodeKind::Agent => &self.agent,
            NodeKind::Skill => &self.skill,
            NodeKind::Task => &self.task,
            NodeKind::Resource => &self.resource,
            NodeKind::Zone => &self.zone,
        }
    }

    pub fn edge_set(&self, kind: EdgeKind) -> &(Handle<StandardMaterial>, Handle<StandardMaterial>) {
        // All kinds are inserted in build(); the map lookup cannot miss
        &self.edges[&kind]
    }
}

/// Shared mesh handles, one per node kind plus decorations and the unit
/// edge cylinder.
#[derive(Resource)]
pub struct SceneAssets {
    agent_mesh: Handle<Mesh>,
    skill_mesh: Handle<Mesh>,
    task_mesh: Handle<Mesh>,
    resource_mesh: Handle<Mesh>,
    zone_mesh: Handle<Mesh>,
    pub ring_mesh: Handle<Mesh>,
    pub spike_mesh: Handle<Mesh>,
    pub edge_mesh: Handle<Mesh>,
}

impl SceneAssets {
    pub fn build(meshes: &mut Assets<Mesh>) -> Self {
        let mesh_for = |meshes: &mut Assets<Mesh>, kind: NodeKind| {
            meshes.add(super::style::build_node_mesh(node_style(kind)))
        };
        Self {
            agent_mesh: mesh_for(meshes, NodeKind::Agent),
            skill_mesh: mesh_for(meshes, NodeKind::Skill),
            task_mesh: mesh_for(meshes, NodeKind::Task),
            resource_mesh: mesh_for(meshes, NodeKind::Resource),
            zone_mesh: mesh_for(meshes, NodeKind::Zone),
            ring_mesh: meshes.add(Torus {
                minor_radius: 0.05,
                major_radius: node_style(NodeKind::Agent).radius * 1.5,
            }),
            spike_mesh: meshes.add(Cone::new(0.12, 0.45)),
            edge_mesh: meshes.add(Cylinder::new(EDGE_RADIUS, 1.0)),
        }
    }

    pub fn node_mesh(&self, kind: NodeKind) -> &Handle<Mesh> {
        match kind {
            NodeKind::Agent => &self.agent_mesh,
            NodeKind::Skill => &self.skill_mesh,
            NodeKind::Task => &self.task_mesh,
            NodeKind::Resource => &self.resource_mesh,
            NodeKind::Zone => &self.zone_mesh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polar_angle_stays_off_the_poles() {
        let mut orbit = OrbitCamera::default();
        // Sweep y across and beyond its range with every gesture
        let inputs = [
            (0.0, Gesture::Open),
            (1.0, Gesture::Open),
            (0.0, Gesture::Closed),
            (1.0, Gesture::None),
            (0.5, Gesture::Open),
            (1.0, Gesture::Open),
            (0.0, Gesture::Open),
        ];
        for _ in 0..200 {
            for (y, gesture) in inputs {
                orbit.steer(
                    &GestureState {
                        active: true,
                        x: 0.5,
                        y,
                        gesture,
                    },
                    1.0 / 60.0,
                );
                assert!(orbit.polar > POLAR_MARGIN);
                assert!(orbit.polar < PI - POLAR_MARGIN);
            }
        }
    }

    #[test]
    fn test_idle_gesture_auto_rotates() {
        let mut orbit = OrbitCamera::default();
        let before = orbit.yaw;
        orbit.steer(&GestureState::default(), 1.0 / 60.0);
        assert!(orbit.yaw > before);
    }

    #[test]
    fn test_fist_follows_slower_than_open_palm() {
        let input = |gesture| GestureState {
            active: true,
            x: 1.0,
            y: 0.5,
            gesture,
        };

        let mut open = OrbitCamera::default();
        let mut closed = OrbitCamera::default();
        for _ in 0..10 {
            open.steer(&input(Gesture::Open), 1.0 / 60.0);
            closed.steer(&input(Gesture::Closed), 1.0 / 60.0);
        }
        // Same target, very different progress toward it
        assert!(open.yaw > closed.yaw * 5.0);
    }

    #[test]
    fn test_edge_x_reaches_multiple_turns() {
        let mut orbit = OrbitCamera::default();
        let input = GestureState {
            active: true,
            x: 1.0,
            y: 0.5,
            gesture: Gesture::Open,
        };
        for _ in 0..2000 {
            orbit.steer(&input, 1.0 / 60.0);
        }
        // Converges toward half the span: two full turns of headroom
        assert!(orbit.yaw > std::f32::consts::TAU * 0.9);
    }

    #[test]
    fn test_camera_position_respects_distance() {
        let orbit = OrbitCamera {
            distance: 25.0,
            ..default()
        };
        let position = orbit.position();
        assert!((position.length() - 25.0).abs() < 1e-3);
    }
}
