//! Graph models: typed nodes, edges, and the wholesale update payload.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Entity type of a graph node.
///
/// Immutable for a given id within a session; drives the visual style
/// table lookup at entity creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A person or acting entity.
    Agent,
    /// A capability an agent carries.
    Skill,
    /// An outstanding piece of work.
    Task,
    /// A consumable or produced asset.
    Resource,
    /// A spatial region grouping other entities.
    Zone,
}

/// Relationship type carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    HasSkill,
    AssignedTo,
    Requires,
    Produces,
    LocatedIn,
    RelatedTo,
}

/// Optional 2D seed position supplied by the producer.
///
/// Used only when the id first appears; afterwards the simulation owns the
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedPosition {
    pub x: f32,
    pub y: f32,
}

/// A node in the ingested graph. Identity is the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier.
    pub id: String,
    /// Entity type (immutable per id for a session).
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Display label.
    pub label: String,
    /// Free-form properties; opaque to the viewer core.
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    /// Optional layout seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SeedPosition>,
}

/// An edge in the ingested graph.
///
/// Endpoints reference node ids. Dangling references are tolerated: they
/// produce no visible entity (see [`GraphData::dangling_edges`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Unique identifier.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Relationship type.
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Wholesale graph update: the full node and edge set, delivered complete
/// on each update, never incrementally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    /// Edges whose source or target id is absent from the node set.
    ///
    /// Tolerated (they render nothing) but reported once per update so a
    /// broken producer is visible in the logs.
    pub fn dangling_edges(&self) -> Vec<&GraphEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
            .collect()
    }
}

/// Selection is owned outside the viewer core. Picking reports id changes
/// through a callback; the external store decides the resulting highlight
/// set, which the scene reads back as a visual-state input only.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    /// The picked entity id, if any.
    pub selected: Option<String>,
    /// Ids to render with the glow material.
    pub highlighted: HashSet<String>,
}
