//! Force-directed graph layout engine.
//!
//! Pure data: maintains simulated particle positions for the current
//! node/edge set, one integration step per render tick. No rendering types
//! beyond math primitives.

use std::collections::{HashMap, HashSet};

use bevy::math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{EdgeKind, GraphEdge, GraphNode};

/// Physics constants.
const REPULSION_STRENGTH: f32 = 200.0;
const DAMPING: f32 = 0.6; // Velocity friction per step
const MIN_DISTANCE: f32 = 0.5;
const MAX_VELOCITY: f32 = 200.0;
const MIN_MASS: f32 = 1.0;
const MASS_PER_CONNECTION: f32 = 1.5;
/// Weak pull toward the origin; prevents slow drift of the whole cloud.
const CENTER_STRENGTH: f32 = 0.8;
/// New particles spawn inside a cube of this half-extent.
const SPAWN_EXTENT: f32 = 15.0;

/// Alpha is the simulation energy: reset to 1.0 on every topology change,
/// decaying toward zero afterwards. All forces are scaled by it, so the
/// layout re-settles after each change and then goes quiet.
const ALPHA_DECAY: f32 = 0.0228;
const ALPHA_MIN: f32 = 0.001;

// Per-edge-kind spring parameters (stiffness, rest_length).
// Stiffness: how strongly the log spring pulls toward rest length.
// Rest length: distance where spring force is zero.
const SPRING_LOCATED_IN: (f32, f32) = (50.0, 4.0); // Tight spatial containment
const SPRING_RELATED_TO: (f32, f32) = (10.0, 10.0); // Loose semantic
const SPRING_DEFAULT: (f32, f32) = (20.0, 7.0);

fn spring_params(kind: EdgeKind) -> (f32, f32) {
    match kind {
        EdgeKind::LocatedIn => SPRING_LOCATED_IN,
        EdgeKind::RelatedTo => SPRING_RELATED_TO,
        _ => SPRING_DEFAULT,
    }
}

/// A simulated particle mirroring one graph node while its id is alive.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Node id this particle mirrors.
    pub id: String,
    /// Current position in 3D space.
    pub position: Vec3,
    /// Current velocity.
    pub velocity: Vec3,
    /// Mass from connection count (heavier = slower).
    pub mass: f32,
}

/// A spring between two particle indices.
#[derive(Debug, Clone)]
struct Spring {
    a: usize,
    b: usize,
    stiffness: f32,
    rest_length: f32,
}

/// Keyed particle simulation.
///
/// `update` re-seeds the particle set from a wholesale graph update,
/// preserving position and velocity for ids present in both the old and
/// new set. `step` advances the integration once.
pub struct ForceLayout {
    particles: Vec<Particle>,
    index: HashMap<String, usize>,
    springs: Vec<Spring>,
    alpha: f32,
    rng: StdRng,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceLayout {
    pub fn new() -> Self {
        Self::with_seed(rand::thread_rng().gen())
    }

    /// Deterministic construction for tests and reproducible sessions.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            index: HashMap::new(),
            springs: Vec::new(),
            alpha: 1.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Re-seed the simulation from a wholesale update.
    ///
    /// Ids present before and after keep their position and velocity; this
    /// is the temporal-continuity invariant the whole viewer leans on.
    /// Newly-appeared ids get a bounded random position (or the producer's
    /// 2D seed when present), departed ids are dropped, and edges naming a
    /// missing endpoint contribute no spring. Any topology change resets
    /// alpha to maximum so the layout re-settles.
    pub fn update(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) {
        let mut particles = Vec::with_capacity(nodes.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if index.contains_key(&node.id) {
                continue; // ids are unique by contract; keep the first
            }
            let carried = self
                .index
                .get(&node.id)
                .map(|&i| (self.particles[i].position, self.particles[i].velocity));
            let (position, velocity) = match carried {
                Some(state) => state,
                None => (self.seed_position(node), Vec3::ZERO),
            };
            index.insert(node.id.clone(), particles.len());
            particles.push(Particle {
                id: node.id.clone(),
                position,
                velocity,
                mass: MIN_MASS,
            });
        }

        let mut springs = Vec::with_capacity(edges.len());
        for edge in edges {
            if let (Some(&a), Some(&b)) = (index.get(&edge.source), index.get(&edge.target)) {
                let (stiffness, rest_length) = spring_params(edge.kind);
                springs.push(Spring {
                    a,
                    b,
                    stiffness,
                    rest_length,
                });
            }
        }

        // Mass by arity: well-connected nodes move slower
        let mut connections = vec![0usize; particles.len()];
        for spring in &springs {
            connections[spring.a] += 1;
            connections[spring.b] += 1;
        }
        for (particle, count) in particles.iter_mut().zip(&connections) {
            particle.mass = MIN_MASS + *count as f32 * MASS_PER_CONNECTION;
        }

        let changed = self.topology_differs(&index, &particles, &springs);
        self.particles = particles;
        self.index = index;
        self.springs = springs;
        if changed {
            self.alpha = 1.0;
        }
    }

    /// Run one integration step.
    ///
    /// Repulsion between all pairs, logarithmic springs along edges, and a
    /// weak centering pull, all scaled by the decaying alpha. Numerical
    /// blow-up is deliberately NOT corrected here; the scene layer hides
    /// entities whose coordinates go non-finite until the simulation
    /// recovers.
    pub fn step(&mut self, dt: f32) {
        let n = self.particles.len();
        if n == 0 || dt <= 0.0 {
            return;
        }

        if self.alpha > ALPHA_MIN {
            self.alpha += (0.0 - self.alpha) * ALPHA_DECAY;
        }
        let alpha = self.alpha;

        let masses: Vec<f32> = self.particles.iter().map(|p| p.mass).collect();

        // --- Repulsion: inverse-square between all pairs ---
        for i in 0..n {
            for j in (i + 1)..n {
                let delta = self.particles[i].position - self.particles[j].position;
                let dist = delta.length().max(MIN_DISTANCE);
                let force = REPULSION_STRENGTH / (dist * dist) * alpha;
                let dir = delta.normalize_or_zero();

                self.particles[i].velocity += dir * force * dt / masses[i];
                self.particles[j].velocity -= dir * force * dt / masses[j];
            }
        }

        // --- Attraction: logarithmic springs ---
        // F = stiffness * ln(d / rest_length): zero at rest length, gentle
        // pull beyond, push below.
        for spring in &self.springs {
            let delta = self.particles[spring.b].position - self.particles[spring.a].position;
            let dist = delta.length().max(MIN_DISTANCE);
            let force = spring.stiffness * (dist / spring.rest_length).ln() * alpha;
            let dir = delta.normalize_or_zero();

            self.particles[spring.a].velocity += dir * force * dt / masses[spring.a];
            self.particles[spring.b].velocity -= dir * force * dt / masses[spring.b];
        }

        // --- Centering: weak pull toward the origin ---
        for (particle, mass) in self.particles.iter_mut().zip(&masses) {
            let pull = -particle.position * CENTER_STRENGTH * alpha;
            particle.velocity += pull * dt / mass;
        }

        // --- Damping and integration ---
        for particle in &mut self.particles {
            particle.velocity *= DAMPING;
            let speed = particle.velocity.length();
            if speed > MAX_VELOCITY {
                particle.velocity = particle.velocity.normalize() * MAX_VELOCITY;
            } else if speed < 0.001 {
                particle.velocity = Vec3::ZERO;
            }
            particle.position += particle.velocity * dt;
        }
    }

    /// Current position of the particle mirroring `id`, if alive.
    pub fn position(&self, id: &str) -> Option<Vec3> {
        self.index.get(id).map(|&i| self.particles[i].position)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to one particle, for embedders that pin or nudge
    /// positions from outside the simulation.
    pub fn particle_mut(&mut self, id: &str) -> Option<&mut Particle> {
        let i = *self.index.get(id)?;
        Some(&mut self.particles[i])
    }

    /// Current simulation energy in [0, 1].
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    fn seed_position(&mut self, node: &GraphNode) -> Vec3 {
        let z = self.rng.gen_range(-SPAWN_EXTENT..SPAWN_EXTENT);
        match node.position {
            Some(seed) => Vec3::new(seed.x, seed.y, z),
            None => Vec3::new(
                self.rng.gen_range(-SPAWN_EXTENT..SPAWN_EXTENT),
                self.rng.gen_range(-SPAWN_EXTENT..SPAWN_EXTENT),
                z,
            ),
        }
    }

    /// True when the incoming node id set or edge (endpoint-pair) set
    /// differs from the current one.
    fn topology_differs(
        &self,
        new_index: &HashMap<String, usize>,
        new_particles: &[Particle],
        new_springs: &[Spring],
    ) -> bool {
        if new_index.len() != self.index.len()
            || !new_index.keys().all(|id| self.index.contains_key(id))
        {
            return true;
        }

        let pair = |particles: &[Particle], s: &Spring| -> (String, String) {
            (particles[s.a].id.clone(), particles[s.b].id.clone())
        };
        let old_pairs: HashSet<(String, String)> = self
            .springs
            .iter()
            .map(|s| pair(&self.particles, s))
            .collect();
        let new_pairs: HashSet<(String, String)> = new_springs
            .iter()
            .map(|s| pair(new_particles, s))
            .collect();
        old_pairs != new_pairs
    }
}
