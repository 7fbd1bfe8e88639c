//! Viewer plugin for Bevy.

use std::sync::Mutex;

use bevy::prelude::*;
use tokio::sync::{mpsc, watch};

use super::resources::{
    CurrentGraph, GestureFeed, GestureInput, GraphStream, GraphUpdate, InitialGraph, LayoutRes,
    OnSelect, OrbitCamera, SceneIndex, SelectFn, SelectionChanged, SelectionRes,
};
use super::setup::{seed_initial_graph, setup_scene};
use super::systems;
use crate::config::ViewerConfig;
use crate::gesture::{GestureState, TrackingStatus};
use crate::layout::ForceLayout;
use crate::models::GraphData;

/// Everything the viewer needs from its embedder.
pub struct ViewerOptions {
    /// Initial wholesale graph.
    pub graph: GraphData,
    pub settings: ViewerConfig,
    /// Latest-wins gesture slot from the tracking pipeline, if running.
    pub gesture: Option<watch::Receiver<GestureState>>,
    /// Latest-wins status slot from the tracking pipeline, if running.
    pub status: Option<watch::Receiver<TrackingStatus>>,
    /// Off-loop producer of further wholesale updates.
    pub updates: Option<mpsc::Receiver<GraphData>>,
    /// Selection callback; fired on every pick with `Some(id)` or `None`.
    pub on_select: Option<SelectFn>,
}

/// Plugin wiring the layout engine, scene object manager, gesture input,
/// camera controller, and picking into one fixed-order render loop.
///
/// Fields use `Mutex<Option<...>>` so `build(&self)` can move them into
/// resources.
pub struct ViewerPlugin {
    graph: Mutex<Option<GraphData>>,
    settings: ViewerConfig,
    gesture: Mutex<Option<watch::Receiver<GestureState>>>,
    status: Mutex<Option<watch::Receiver<TrackingStatus>>>,
    updates: Mutex<Option<mpsc::Receiver<GraphData>>>,
    on_select: Mutex<Option<SelectFn>>,
}

impl ViewerPlugin {
    pub fn new(options: ViewerOptions) -> Self {
        Self {
            graph: Mutex::new(Some(options.graph)),
            settings: options.settings,
            gesture: Mutex::new(options.gesture),
            status: Mutex::new(options.status),
            updates: Mutex::new(options.updates),
            on_select: Mutex::new(options.on_select),
        }
    }
}

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        let graph = self.graph.lock().unwrap().take().unwrap_or_default();
        let gesture = self.gesture.lock().unwrap().take();
        let status = self.status.lock().unwrap().take();
        let updates = self.updates.lock().unwrap().take();
        let on_select = self.on_select.lock().unwrap().take();

        app.insert_resource(LayoutRes(ForceLayout::new()))
            .init_resource::<SceneIndex>()
            .init_resource::<CurrentGraph>()
            .init_resource::<SelectionRes>()
            .init_resource::<GestureInput>()
            .insert_resource(GestureFeed { gesture, status })
            .insert_resource(GraphStream(updates))
            .insert_resource(OnSelect(on_select))
            .insert_resource(InitialGraph(Some(graph)))
            .insert_resource(OrbitCamera {
                auto_rotate: self.settings.auto_rotate,
                ..Default::default()
            })
            .add_event::<GraphUpdate>()
            .add_event::<SelectionChanged>()
            .add_systems(Startup, (setup_scene, seed_initial_graph))
            .add_systems(
                Update,
                (
                    // Fixed per-tick order; draw follows in the render schedule
                    (
                        systems::poll_gesture_system,
                        systems::ingest_stream_system,
                        systems::ingest_graph_system,
                        systems::step_layout_system,
                        systems::apply_node_positions,
                        systems::update_edge_transforms,
                        systems::camera_control_system,
                    )
                        .chain(),
                    // Event-driven, outside the fixed order
                    (
                        systems::pick_entity_system,
                        systems::selection_store_system,
                        systems::apply_selection_glow,
                    )
                        .chain(),
                    systems::status_readout_system,
                ),
            );
    }
}
