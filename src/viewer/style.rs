//! Static per-kind visual style table.
//!
//! One descriptor per node type, looked up once at entity creation. Adding
//! a node kind means adding a table entry; entity logic never branches on
//! the kind itself.

use bevy::prelude::*;

use super::constants::*;
use crate::models::{EdgeKind, NodeKind};

/// Base shape of a node entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// Icosphere with the given subdivision count (0 = raw icosahedron).
    Ico(u32),
    /// Regular tetrahedron.
    Tetrahedron,
    /// Cube.
    Cuboid,
}

/// Decorative idle motion applied on top of the simulated position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    GentleBob,
    SlowSpin,
    Pulse,
    Drift,
    SlowRotate,
}

/// Visual descriptor for one node kind.
#[derive(Debug, Clone)]
pub struct NodeStyle {
    pub geometry: GeometryKind,
    pub radius: f32,
    pub base_color: Color,
    pub accent_color: Color,
    pub emissive_intensity: f32,
    /// Orbit ring child entity.
    pub ring: bool,
    /// Crystal spike child entities.
    pub spikes: bool,
    pub motion: MotionKind,
}

const AGENT_STYLE: NodeStyle = NodeStyle {
    geometry: GeometryKind::Ico(1),
    radius: 0.55,
    base_color: COLOR_AGENT,
    accent_color: COLOR_AGENT_ACCENT,
    emissive_intensity: 0.1,
    ring: true,
    spikes: false,
    motion: MotionKind::GentleBob,
};

const SKILL_STYLE: NodeStyle = NodeStyle {
    geometry: GeometryKind::Tetrahedron,
    radius: 0.45,
    base_color: COLOR_SKILL,
    accent_color: COLOR_SKILL_ACCENT,
    emissive_intensity: 0.4,
    ring: false,
    spikes: false,
    motion: MotionKind::SlowSpin,
};

const TASK_STYLE: NodeStyle = NodeStyle {
    geometry: GeometryKind::Cuboid,
    radius: 0.4,
    base_color: COLOR_TASK,
    accent_color: COLOR_TASK_ACCENT,
    emissive_intensity: 0.5,
    ring: false,
    spikes: false,
    motion: MotionKind::Pulse,
};

const RESOURCE_STYLE: NodeStyle = NodeStyle {
    geometry: GeometryKind::Ico(0),
    radius: 0.5,
    base_color: COLOR_RESOURCE,
    accent_color: COLOR_RESOURCE_ACCENT,
    emissive_intensity: 0.2,
    ring: false,
    spikes: false,
    motion: MotionKind::Drift,
};

const ZONE_STYLE: NodeStyle = NodeStyle {
    geometry: GeometryKind::Ico(2),
    radius: 0.7,
    base_color: COLOR_ZONE,
    accent_color: COLOR_ZONE_ACCENT,
    emissive_intensity: 0.05,
    ring: false,
    spikes: true,
    motion: MotionKind::SlowRotate,
};

/// Style lookup. Static: the table never changes at runtime.
pub fn node_style(kind: NodeKind) -> &'static NodeStyle {
    match kind {
        NodeKind::Agent => &AGENT_STYLE,
        NodeKind::Skill => &SKILL_STYLE,
        NodeKind::Task => &TASK_STYLE,
        NodeKind::Resource => &RESOURCE_STYLE,
        NodeKind::Zone => &ZONE_STYLE,
    }
}

/// Get color for a relationship type.
pub fn edge_color(kind: EdgeKind) -> Color {
    match kind {
        EdgeKind::HasSkill => COLOR_HAS_SKILL,
        EdgeKind::AssignedTo => COLOR_ASSIGNED_TO,
        EdgeKind::Requires => COLOR_REQUIRES,
        EdgeKind::Produces => COLOR_PRODUCES,
        EdgeKind::LocatedIn => COLOR_LOCATED_IN,
        EdgeKind::RelatedTo => COLOR_RELATED_TO,
    }
}

/// Build the base mesh for a style.
pub fn build_node_mesh(style: &NodeStyle) -> Mesh {
    match style.geometry {
        GeometryKind::Ico(subdivisions) => Sphere::new(style.radius)
            .mesh()
            .ico(subdivisions)
            .unwrap(),
        GeometryKind::Tetrahedron => {
            // Regular tetrahedron with the requested circumradius
            let s = style.radius / 3.0_f32.sqrt();
            Tetrahedron::new(
                Vec3::new(s, s, s),
                Vec3::new(s, -s, -s),
                Vec3::new(-s, s, -s),
                Vec3::new(-s, -s, s),
            )
            .into()
        }
        GeometryKind::Cuboid => {
            let side = style.radius * 1.4;
            Cuboid::new(side, side, side).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [NodeKind; 5] = [
        NodeKind::Agent,
        NodeKind::Skill,
        NodeKind::Task,
        NodeKind::Resource,
        NodeKind::Zone,
    ];

    #[test]
    fn test_every_kind_has_a_style() {
        for kind in ALL_KINDS {
            let style = node_style(kind);
            assert!(style.radius > 0.0);
        }
    }

    #[test]
    fn test_decoration_flags() {
        assert!(node_style(NodeKind::Agent).ring);
        assert!(node_style(NodeKind::Zone).spikes);
        assert!(!node_style(NodeKind::Skill).ring);
    }
}
