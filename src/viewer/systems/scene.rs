//! Scene object lifecycle and per-tick position application.
//!
//! The scene owns exactly one entity per live node id and per live edge
//! id. Wholesale graph updates are diffed against the owned set: departed
//! ids are destroyed before any new entity is created, surviving ids are
//! left untouched. Positions flow from the layout simulation each tick and
//! are validated before they reach a transform; non-finite coordinates
//! hide the entity for the tick instead of corrupting scene bounds.

use bevy::prelude::*;
use tracing::{debug, warn};

use crate::models::{GraphEdge, GraphNode};
use crate::viewer::components::{stable_phase, EdgeVisual, GraphId, HitSphere, NodeVisual};
use crate::viewer::constants::*;
use crate::viewer::resources::{
    CurrentGraph, GraphStream, GraphUpdate, LayoutRes, SceneAssets, SceneIndex, SelectionRes,
    StyleMaterials,
};
use crate::viewer::style::{node_style, MotionKind};

/// Drain off-loop graph updates into the event stream. Never blocks: the
/// producer runs on its own task and this only polls the channel.
pub fn ingest_stream_system(
    mut stream: ResMut<GraphStream>,
    mut events: EventWriter<GraphUpdate>,
) {
    if let Some(receiver) = stream.0.as_mut() {
        while let Ok(data) = receiver.try_recv() {
            events.send(GraphUpdate(data));
        }
    }
}

/// Advance the layout simulation once per render tick.
pub fn step_layout_system(time: Res<Time>, mut layout: ResMut<LayoutRes>) {
    // Clamp so a long frame hitch cannot destabilize the integration
    layout.0.step(time.delta_secs().min(0.05));
}

/// Apply the most recent wholesale update: re-seed the layout and diff the
/// owned entity set.
pub fn ingest_graph_system(
    mut events: EventReader<GraphUpdate>,
    mut commands: Commands,
    mut index: ResMut<SceneIndex>,
    mut layout: ResMut<LayoutRes>,
    mut current: ResMut<CurrentGraph>,
    materials: Res<StyleMaterials>,
    assets: Res<SceneAssets>,
) {
    // Updates are wholesale; only the latest matters
    let Some(GraphUpdate(data)) = events.read().last() else {
        return;
    };

    let dangling = data.dangling_edges();
    if !dangling.is_empty() {
        warn!(
            count = dangling.len(),
            ids = ?dangling.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            "edges referencing missing nodes will not be drawn"
        );
    }

    layout.0.update(&data.nodes, &data.edges);

    // Destroy departed entities before creating anything new
    let node_ids: std::collections::HashSet<&str> =
        data.nodes.iter().map(|n| n.id.as_str()).collect();
    let edge_ids: std::collections::HashSet<&str> =
        data.edges.iter().map(|e| e.id.as_str()).collect();

    index.nodes.retain(|id, entity| {
        let keep = node_ids.contains(id.as_str());
        if !keep {
            commands.entity(*entity).despawn_recursive();
        }
        keep
    });
    index.edges.retain(|id, entity| {
        let keep = edge_ids.contains(id.as_str());
        if !keep {
            commands.entity(*entity).despawn_recursive();
        }
        keep
    });

    // Create entities for newly-appeared ids; surviving ids are not touched
    let mut created = 0usize;
    for node in &data.nodes {
        if index.nodes.contains_key(&node.id) {
            continue;
        }
        let position = layout.0.position(&node.id).unwrap_or(Vec3::ZERO);
        let entity = spawn_node(&mut commands, &materials, &assets, node, position);
        index.nodes.insert(node.id.clone(), entity);
        created += 1;
    }
    for edge in &data.edges {
        if index.edges.contains_key(&edge.id) {
            continue;
        }
        let entity = spawn_edge(&mut commands, &materials, &assets, edge);
        index.edges.insert(edge.id.clone(), entity);
    }

    debug!(
        nodes = data.nodes.len(),
        edges = data.edges.len(),
        created,
        "graph update applied"
    );
    current.0 = data.clone();
}

fn spawn_node(
    commands: &mut Commands,
    materials: &StyleMaterials,
    assets: &SceneAssets,
    node: &GraphNode,
    position: Vec3,
) -> Entity {
    let style = node_style(node.kind);
    let set = materials.node_set(node.kind);

    let mut entity = commands.spawn((
        Mesh3d(assets.node_mesh(node.kind).clone()),
        MeshMaterial3d(set.normal.clone()),
        Transform::from_translation(position),
        Visibility::Hidden,
        GraphId(node.id.clone()),
        NodeVisual {
            kind: node.kind,
            phase: stable_phase(&node.id),
        },
        HitSphere {
            radius: style.radius * HIT_PADDING,
        },
    ));

    entity.with_children(|parent| {
        if style.ring {
            parent.spawn((
                Mesh3d(assets.ring_mesh.clone()),
                MeshMaterial3d(set.accent.clone()),
                Transform::from_rotation(Quat::from_rotation_x(0.4)),
                HitSphere {
                    radius: style.radius * 1.6,
                },
            ));
        }
        if style.spikes {
            // Deterministic golden-angle placement on the surface
            let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
            for i in 0..6 {
                let theta = i as f32 * golden_angle;
                let polar = (1.0 - 2.0 * (i as f32 + 0.5) / 6.0).acos();
                let direction = Vec3::new(
                    polar.sin() * theta.cos(),
                    polar.cos(),
                    polar.sin() * theta.sin(),
                );
                parent.spawn((
                    Mesh3d(assets.spike_mesh.clone()),
                    MeshMaterial3d(set.accent.clone()),
                    Transform::from_translation(direction * style.radius)
                        .with_rotation(Quat::from_rotation_arc(Vec3::Y, direction)),
                    HitSphere { radius: 0.2 },
                ));
            }
        }
    });

    entity.id()
}

fn spawn_edge(
    commands: &mut Commands,
    materials: &StyleMaterials,
    assets: &SceneAssets,
    edge: &GraphEdge,
) -> Entity {
    let (normal, _) = materials.edge_set(edge.kind);
    commands
        .spawn((
            Mesh3d(assets.edge_mesh.clone()),
            MeshMaterial3d(normal.clone()),
            Transform::default(),
            Visibility::Hidden,
            GraphId(edge.id.clone()),
            EdgeVisual {
                source: edge.source.clone(),
                target: edge.target.clone(),
                kind: edge.kind,
            },
            HitSphere {
                radius: EDGE_HOTSPOT_RADIUS,
            },
        ))
        .id()
}

/// Write validated simulation positions (plus decorative motion) into node
/// transforms. Non-finite coordinates hide the entity for this tick; the
/// simulation self-heals and the entity reappears on its own.
pub fn apply_node_positions(
    time: Res<Time>,
    layout: Res<LayoutRes>,
    mut nodes: Query<(&GraphId, &NodeVisual, &mut Transform, &mut Visibility)>,
) {
    let t = time.elapsed_secs();

    for (id, visual, mut transform, mut visibility) in nodes.iter_mut() {
        let Some(base) = layout.0.position(&id.0) else {
            *visibility = Visibility::Hidden;
            continue;
        };

        let style = node_style(visual.kind);
        let bob = (t * BOB_FREQUENCY + visual.phase).sin() * BOB_AMPLITUDE;
        let mut position = base + Vec3::Y * bob;
        if style.motion == MotionKind::Drift {
            let angle = t * 0.4 + visual.phase;
            position += Vec3::new(angle.cos(), 0.0, angle.sin()) * DRIFT_RADIUS;
        }

        if !position.is_finite() {
            *visibility = Visibility::Hidden;
            continue;
        }

        transform.translation = position;
        match style.motion {
            MotionKind::SlowSpin => {
                transform.rotation = Quat::from_rotation_y(t * 0.6 + visual.phase);
            }
            MotionKind::SlowRotate => {
                transform.rotation = Quat::from_rotation_y(t * 0.15 + visual.phase);
            }
            MotionKind::Pulse => {
                transform.scale = Vec3::splat(1.0 + (t * 2.0 + visual.phase).sin() * PULSE_SCALE);
            }
            MotionKind::GentleBob | MotionKind::Drift => {}
        }
        *visibility = Visibility::Visible;
    }
}

/// Recompute edge endpoints from their nodes' already-validated transforms.
/// A hidden endpoint, a missing endpoint, or a near-zero span hides the
/// edge for this tick.
pub fn update_edge_transforms(
    index: Res<SceneIndex>,
    nodes: Query<(&Transform, &Visibility), (With<NodeVisual>, Without<EdgeVisual>)>,
    mut edges: Query<(&EdgeVisual, &mut Transform, &mut Visibility), Without<NodeVisual>>,
) {
    for (edge, mut transform, mut visibility) in edges.iter_mut() {
        let endpoints = index
            .nodes
            .get(&edge.source)
            .copied()
            .zip(index.nodes.get(&edge.target).copied());
        let Some((source_entity, target_entity)) = endpoints else {
            *visibility = Visibility::Hidden;
            continue;
        };
        let (Ok((source_tf, source_vis)), Ok((target_tf, target_vis))) =
            (nodes.get(source_entity), nodes.get(target_entity))
        else {
            *visibility = Visibility::Hidden;
            continue;
        };
        if *source_vis == Visibility::Hidden || *target_vis == Visibility::Hidden {
            *visibility = Visibility::Hidden;
            continue;
        }

        let (a, b) = (source_tf.translation, target_tf.translation);
        let span_sq = a.distance_squared(b);
        if span_sq < EDGE_EPSILON_SQ {
            // Coincident endpoints: a zero-length line is never drawn
            *visibility = Visibility::Hidden;
            continue;
        }

        let direction = b - a;
        let length = span_sq.sqrt();
        transform.translation = (a + b) / 2.0;
        transform.rotation = Quat::from_rotation_arc(Vec3::Y, direction / length);
        transform.scale = Vec3::new(1.0, length, 1.0);
        *visibility = Visibility::Visible;
    }
}

/// Swap normal/glow materials from the externally-owned selection state.
pub fn apply_selection_glow(
    selection: Res<SelectionRes>,
    materials: Res<StyleMaterials>,
    mut nodes: Query<
        (&GraphId, &NodeVisual, &mut MeshMaterial3d<StandardMaterial>),
        Without<EdgeVisual>,
    >,
    mut edges: Query<
        (&GraphId, &EdgeVisual, &mut MeshMaterial3d<StandardMaterial>),
        Without<NodeVisual>,
    >,
) {
    let state = &selection.0;

    for (id, visual, mut material) in nodes.iter_mut() {
        let set = materials.node_set(visual.kind);
        let glowing = state.selected.as_deref() == Some(id.0.as_str())
            || state.highlighted.contains(&id.0);
        let wanted = if glowing { &set.glow } else { &set.normal };
        if material.0 != *wanted {
            material.0 = wanted.clone();
        }
    }

    for (id, visual, mut material) in edges.iter_mut() {
        let (normal, glow) = materials.edge_set(visual.kind);
        let selected = state.selected.as_deref();
        let glowing = selected == Some(id.0.as_str())
            || selected == Some(visual.source.as_str())
            || selected == Some(visual.target.as_str());
        let wanted = if glowing { glow } else { normal };
        if material.0 != *wanted {
            material.0 = wanted.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ForceLayout;
    use crate::models::{EdgeKind, GraphData, NodeKind};
    use bevy::ecs::system::RunSystemOnce;
    use std::collections::HashMap;

    fn node(id: &str, kind: NodeKind) -> crate::models::GraphNode {
        crate::models::GraphNode {
            id: id.to_string(),
            kind,
            label: id.to_string(),
            properties: HashMap::new(),
            position: None,
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> crate::models::GraphEdge {
        crate::models::GraphEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            kind: EdgeKind::RelatedTo,
            label: None,
        }
    }

    fn test_world() -> World {
        let mut world = World::new();
        world.init_resource::<Assets<Mesh>>();
        world.init_resource::<Assets<StandardMaterial>>();
        world.init_resource::<Time>();
        world.init_resource::<SceneIndex>();
        world.init_resource::<CurrentGraph>();
        world.init_resource::<SelectionRes>();
        world.init_resource::<GraphStream>();
        world.init_resource::<Events<GraphUpdate>>();
        world.insert_resource(LayoutRes(ForceLayout::with_seed(7)));

        world.resource_scope(|world, mut materials: Mut<Assets<StandardMaterial>>| {
            world.insert_resource(StyleMaterials::build(&mut materials));
        });
        world.resource_scope(|world, mut meshes: Mut<Assets<Mesh>>| {
            world.insert_resource(SceneAssets::build(&mut meshes));
        });
        world
    }

    fn ingest(world: &mut World, data: GraphData) {
        let _ = world.send_event(GraphUpdate(data));
        let _ = world.run_system_once(ingest_graph_system);
    }

    fn tick_positions(world: &mut World) {
        let _ = world.run_system_once(apply_node_positions);
        let _ = world.run_system_once(update_edge_transforms);
    }

    fn two_node_graph() -> GraphData {
        GraphData {
            nodes: vec![node("a", NodeKind::Agent), node("b", NodeKind::Skill)],
            edges: vec![edge("e1", "a", "b")],
        }
    }

    #[test]
    fn test_entity_set_mirrors_node_id_set() {
        let mut world = test_world();
        ingest(&mut world, two_node_graph());

        let index = world.resource::<SceneIndex>();
        let mut ids: Vec<&str> = index.nodes.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(index.edges.contains_key("e1"));
    }

    #[test]
    fn test_scenario_edge_follows_its_endpoints() {
        let mut world = test_world();
        ingest(&mut world, two_node_graph());

        // A few render ticks of layout + position application
        for _ in 0..5 {
            world.resource_mut::<LayoutRes>().0.step(0.016);
            tick_positions(&mut world);
        }

        let index = world.resource::<SceneIndex>();
        let (a, b, e1) = (
            index.nodes["a"],
            index.nodes["b"],
            index.edges["e1"],
        );

        let a_pos = world.get::<Transform>(a).unwrap().translation;
        let b_pos = world.get::<Transform>(b).unwrap().translation;
        assert_eq!(*world.get::<Visibility>(a).unwrap(), Visibility::Visible);
        assert_eq!(*world.get::<Visibility>(e1).unwrap(), Visibility::Visible);

        // The drawn cylinder spans exactly the two node positions
        let edge_tf = world.get::<Transform>(e1).unwrap();
        assert!(edge_tf
            .translation
            .abs_diff_eq((a_pos + b_pos) / 2.0, 1e-4));
        assert!((edge_tf.scale.y - a_pos.distance(b_pos)).abs() < 1e-4);
    }

    #[test]
    fn test_scenario_removing_node_destroys_it_and_hides_edge() {
        let mut world = test_world();
        ingest(&mut world, two_node_graph());
        let b_entity = world.resource::<SceneIndex>().nodes["b"];

        // Same update minus node b; the edge still names it
        let mut data = two_node_graph();
        data.nodes.retain(|n| n.id != "b");
        ingest(&mut world, data);
        tick_positions(&mut world);

        let index = world.resource::<SceneIndex>();
        assert!(!index.nodes.contains_key("b"));
        assert!(world.get::<GraphId>(b_entity).is_none());

        let e1 = index.edges["e1"];
        assert_eq!(*world.get::<Visibility>(e1).unwrap(), Visibility::Hidden);
    }

    #[test]
    fn test_identical_update_touches_no_entity() {
        let mut world = test_world();
        ingest(&mut world, two_node_graph());

        let before: HashMap<String, Entity> =
            world.resource::<SceneIndex>().nodes.clone();
        let a_translation = world
            .get::<Transform>(before["a"])
            .unwrap()
            .translation;

        ingest(&mut world, two_node_graph());

        let index = world.resource::<SceneIndex>();
        assert_eq!(index.nodes, before);
        // Accumulated transform state survives: the entity was not re-created
        assert_eq!(
            world.get::<Transform>(before["a"]).unwrap().translation,
            a_translation
        );
    }

    #[test]
    fn test_non_finite_position_hides_node_and_edge() {
        let mut world = test_world();
        ingest(&mut world, two_node_graph());
        tick_positions(&mut world);

        let index = world.resource::<SceneIndex>();
        let (a, e1) = (index.nodes["a"], index.edges["e1"]);
        assert_eq!(*world.get::<Visibility>(a).unwrap(), Visibility::Visible);

        // Simulate a numerical blow-up
        world
            .resource_mut::<LayoutRes>()
            .0
            .particle_mut("a")
            .unwrap()
            .position = Vec3::new(f32::NAN, 0.0, 0.0);
        tick_positions(&mut world);

        assert_eq!(*world.get::<Visibility>(a).unwrap(), Visibility::Hidden);
        assert_eq!(*world.get::<Visibility>(e1).unwrap(), Visibility::Hidden);

        // Self-healing: restore a finite position and the pair reappears
        world
            .resource_mut::<LayoutRes>()
            .0
            .particle_mut("a")
            .unwrap()
            .position = Vec3::new(3.0, 0.0, 0.0);
        tick_positions(&mut world);
        assert_eq!(*world.get::<Visibility>(a).unwrap(), Visibility::Visible);
    }

    #[test]
    fn test_coincident_endpoints_hide_the_edge() {
        let mut world = test_world();
        ingest(&mut world, two_node_graph());

        // Force both particles onto the same spot
        {
            let mut layout = world.resource_mut::<LayoutRes>();
            layout.0.particle_mut("a").unwrap().position = Vec3::splat(1.0);
            layout.0.particle_mut("b").unwrap().position = Vec3::splat(1.0);
        }
        tick_positions(&mut world);
        let index = world.resource::<SceneIndex>();
        let (a, b, e1) = (
            index.nodes["a"],
            index.nodes["b"],
            index.edges["e1"],
        );
        // Bob offsets differ per id, so pin the decorated transforms to the
        // exact same point before the edge pass
        world.get_mut::<Transform>(a).unwrap().translation = Vec3::splat(1.0);
        world.get_mut::<Transform>(b).unwrap().translation = Vec3::splat(1.0);
        let _ = world.run_system_once(update_edge_transforms);

        assert_eq!(*world.get::<Visibility>(e1).unwrap(), Visibility::Hidden);
    }

    #[test]
    fn test_dangling_edge_spawns_hidden_and_stays_hidden() {
        let mut world = test_world();
        let data = GraphData {
            nodes: vec![node("a", NodeKind::Agent)],
            edges: vec![edge("e1", "a", "ghost")],
        };
        ingest(&mut world, data);
        tick_positions(&mut world);

        let index = world.resource::<SceneIndex>();
        let e1 = index.edges["e1"];
        assert_eq!(*world.get::<Visibility>(e1).unwrap(), Visibility::Hidden);
    }

    #[test]
    fn test_selection_glow_swaps_materials() {
        let mut world = test_world();
        ingest(&mut world, two_node_graph());

        world.resource_mut::<SelectionRes>().0.selected = Some("a".to_string());
        let _ = world.run_system_once(apply_selection_glow);

        let index = world.resource::<SceneIndex>();
        let (a, b, e1) = (
            index.nodes["a"],
            index.nodes["b"],
            index.edges["e1"],
        );
        let materials = world.resource::<StyleMaterials>();
        let a_handle = world
            .get::<MeshMaterial3d<StandardMaterial>>(a)
            .unwrap()
            .0
            .clone();
        let b_handle = world
            .get::<MeshMaterial3d<StandardMaterial>>(b)
            .unwrap()
            .0
            .clone();
        let e_handle = world
            .get::<MeshMaterial3d<StandardMaterial>>(e1)
            .unwrap()
            .0
            .clone();

        assert_eq!(a_handle, materials.node_set(NodeKind::Agent).glow);
        assert_eq!(b_handle, materials.node_set(NodeKind::Skill).normal);
        // Edges touching the selected node glow too
        assert_eq!(e_handle, materials.edge_set(EdgeKind::RelatedTo).1);
    }
}
