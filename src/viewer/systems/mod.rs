//! ECS systems for the viewer.
//!
//! The render loop's fixed per-tick order lives in the plugin: gesture
//! read, layout step, scene position application and validation, camera
//! update, then draw. Picking is event-driven and outside the chain.

pub mod camera;
pub mod gesture;
pub mod picking;
pub mod scene;

pub use camera::camera_control_system;
pub use gesture::{poll_gesture_system, status_readout_system};
pub use picking::{pick_entity_system, selection_store_system};
pub use scene::{
    apply_node_positions, apply_selection_glow, ingest_graph_system, ingest_stream_system,
    step_layout_system, update_edge_transforms,
};
