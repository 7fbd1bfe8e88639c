//! Data contracts shared between the graph producer and the viewer core.

mod graph;

pub use graph::{
    EdgeKind, GraphData, GraphEdge, GraphNode, NodeKind, SeedPosition, SelectionState,
};
