//! Force solver: the per-tick physics step.
//!
//! Each tick applies, in order: link attraction (springs with zero rest
//! length, strength a steep function of edge weight), Barnes–Hut charge
//! repulsion, centroid centering, then damped velocity integration. Forces
//! fully accumulate before any position moves, so renderers never observe a
//! half-integrated tick.
//!
//! An energy scalar `alpha` multiplies the attraction and repulsion passes.
//! It decays toward `alpha_target` at `alpha_decay` per tick; configured to
//! zero here, so the layout never freezes and keeps reacting to drags
//! indefinitely. The interaction controller raises the target to
//! [`SimulationConfig::drag_alpha_target`] while a drag is active.

use super::graph::Graph;
use super::quadtree::{QuadNode, accumulate_repulsion, separation_jiggle};

/// Tunable solver parameters.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
	/// Charge per node; negative repels.
	pub charge_strength: f64,
	/// Barnes–Hut accuracy knob. Higher aggregates more aggressively; 1.0 is
	/// the fastest setting that still looks right for this layout.
	pub theta: f64,
	/// Added to squared distances so coincident nodes cannot produce an
	/// unbounded repulsion.
	pub softening: f64,
	/// Per-tick velocity retention factor, keeping the system from
	/// oscillating unboundedly.
	pub velocity_decay: f64,
	/// Resting energy target.
	pub alpha_target: f64,
	/// Energy target while a drag is active.
	pub drag_alpha_target: f64,
	/// Rate at which `alpha` approaches its target each tick. Zero keeps the
	/// simulation perpetually live.
	pub alpha_decay: f64,
	/// Point the layout centroid is steered toward.
	pub center: (f64, f64),
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			charge_strength: -1000.0,
			theta: 1.0,
			softening: 10.0,
			velocity_decay: 0.6,
			alpha_target: 0.0,
			drag_alpha_target: 0.3,
			alpha_decay: 0.0,
			center: (0.0, 0.0),
		}
	}
}

/// Attraction strength for a link of the given weight: `weight^5 / 1e8`.
///
/// Grows steeply, so low-weight edges barely pull while high-weight edges
/// dominate the clustering.
pub fn link_strength(weight: f64) -> f64 {
	weight.powi(5) / 1.0e8
}

/// Iterative solver. Owns the energy scalar and per-node degree table;
/// positions and velocities live in the shared [`Graph`] arena.
pub struct Simulation {
	config: SimulationConfig,
	alpha: f64,
	alpha_target: f64,
	/// Link count per node, used to bias each link's correction toward the
	/// less-connected endpoint.
	degree: Vec<f64>,
	/// Position scratch buffer for the quadtree, rebuilt each tick.
	positions: Vec<(f64, f64)>,
}

impl Simulation {
	/// Seeds solver state from the graph's link structure.
	pub fn new(graph: &Graph, config: SimulationConfig) -> Self {
		let mut degree = vec![0.0; graph.nodes.len()];
		for link in &graph.links {
			degree[link.source] += 1.0;
			degree[link.target] += 1.0;
		}

		let alpha_target = config.alpha_target;
		Self {
			config,
			alpha: 1.0,
			alpha_target,
			degree,
			positions: Vec::new(),
		}
	}

	/// Current energy scalar.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Current energy target.
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Whether the energy target is at its resting value.
	pub fn is_resting(&self) -> bool {
		self.alpha_target == self.config.alpha_target
	}

	/// Raises the energy target for the duration of a drag.
	pub fn reheat(&mut self) {
		self.alpha_target = self.config.drag_alpha_target;
	}

	/// Lowers the energy target back to rest once a drag ends.
	pub fn rest(&mut self) {
		self.alpha_target = self.config.alpha_target;
	}

	/// Advances the simulation by one step, mutating node state in place.
	pub fn tick(&mut self, graph: &mut Graph) {
		self.apply_link_force(graph);
		self.apply_charge(graph);
		self.apply_centering(graph);
		self.integrate(graph);
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
	}

	/// Springs with zero rest length: every link pulls its endpoints toward
	/// coincidence, counterbalanced by repulsion. The correction is split
	/// between the endpoints by degree bias; a pinned endpoint's share is
	/// skipped, not redistributed.
	fn apply_link_force(&self, graph: &mut Graph) {
		for link in &graph.links {
			let source = &graph.nodes[link.source];
			let target = &graph.nodes[link.target];

			let mut dx = (target.x + target.vx) - (source.x + source.vx);
			let mut dy = (target.y + target.vy) - (source.y + source.vy);
			if dx == 0.0 && dy == 0.0 {
				let (jx, jy) = separation_jiggle(link.source, link.target);
				dx = jx * 1e-6;
				dy = jy * 1e-6;
			}

			// Rest length is zero, so the whole current span is the error.
			let scale = link_strength(link.weight) * self.alpha;
			let (cx, cy) = (dx * scale, dy * scale);
			let bias = self.degree[link.source]
				/ (self.degree[link.source] + self.degree[link.target]);

			let source_pinned = source.pin.is_some();
			let target_pinned = target.pin.is_some();
			if !target_pinned {
				let node = &mut graph.nodes[link.target];
				node.vx -= cx * bias;
				node.vy -= cy * bias;
			}
			if !source_pinned {
				let node = &mut graph.nodes[link.source];
				node.vx += cx * (1.0 - bias);
				node.vy += cy * (1.0 - bias);
			}
		}
	}

	/// Many-body repulsion via the quadtree. Pinned nodes contribute charge
	/// but receive no velocity update.
	fn apply_charge(&mut self, graph: &mut Graph) {
		self.positions.clear();
		self.positions.extend(graph.nodes.iter().map(|n| (n.x, n.y)));

		let Some(tree) = QuadNode::build(&self.positions) else {
			return;
		};

		let strength = -self.config.charge_strength * self.alpha;
		for (index, node) in graph.nodes.iter_mut().enumerate() {
			if node.pin.is_some() {
				continue;
			}
			let mut force = (0.0, 0.0);
			accumulate_repulsion(
				&tree,
				index,
				&self.positions,
				strength,
				self.config.softening,
				self.config.theta,
				&mut force,
			);
			node.vx += force.0;
			node.vy += force.1;
		}
	}

	/// Translates positions so the layout centroid sits at the configured
	/// center, preventing the whole graph from drifting off-screen. Pinned
	/// nodes are exempt; integration re-asserts their pin either way.
	fn apply_centering(&self, graph: &mut Graph) {
		if graph.nodes.is_empty() {
			return;
		}

		let count = graph.nodes.len() as f64;
		let (mut cx, mut cy) = (0.0, 0.0);
		for node in &graph.nodes {
			cx += node.x;
			cy += node.y;
		}
		let shift = (cx / count - self.config.center.0, cy / count - self.config.center.1);

		for node in graph.nodes.iter_mut().filter(|n| n.pin.is_none()) {
			node.x -= shift.0;
			node.y -= shift.1;
		}
	}

	/// Damped velocity integration. Pinned nodes are forced to exactly their
	/// pin position with zeroed velocity.
	fn integrate(&self, graph: &mut Graph) {
		for node in &mut graph.nodes {
			if let Some((fx, fy)) = node.pin {
				node.x = fx;
				node.y = fy;
				node.vx = 0.0;
				node.vy = 0.0;
			} else {
				node.vx *= self.config.velocity_decay;
				node.vy *= self.config.velocity_decay;
				node.x += node.vx;
				node.y += node.vy;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{GraphDocument, LinkSpec, NodeSpec};

	fn spec(id: &str, color: &str, x: f64, y: f64) -> NodeSpec {
		NodeSpec {
			id: id.into(),
			color: color.into(),
			radius: 5.0,
			x: Some(x),
			y: Some(y),
		}
	}

	fn linked_pair(separation: f64, weight: f64) -> Graph {
		let doc = GraphDocument {
			nodes: vec![
				spec("a", "red", -separation / 2.0, 0.0),
				spec("b", "blue", separation / 2.0, 0.0),
			],
			links: vec![LinkSpec {
				source: "a".into(),
				target: "b".into(),
				weight,
			}],
		};
		Graph::load(&doc).unwrap()
	}

	fn distance(graph: &Graph, a: usize, b: usize) -> f64 {
		let dx = graph.nodes[a].x - graph.nodes[b].x;
		let dy = graph.nodes[a].y - graph.nodes[b].y;
		(dx * dx + dy * dy).sqrt()
	}

	#[test]
	fn strength_is_monotone_and_zero_at_zero() {
		assert_eq!(link_strength(0.0), 0.0);

		let mut previous = 0.0;
		for weight in 0..=100 {
			let strength = link_strength(weight as f64);
			assert!(strength >= previous, "non-decreasing at weight {weight}");
			previous = strength;
		}
		assert_eq!(link_strength(10.0), 1e-3);
	}

	#[test]
	fn pinned_node_holds_exact_position_every_tick() {
		let mut graph = linked_pair(100.0, 10.0);
		let mut sim = Simulation::new(&graph, SimulationConfig::default());

		graph.pin(1, 12.0, 34.0);
		for _ in 0..20 {
			sim.tick(&mut graph);
			assert_eq!(graph.nodes[1].x, 12.0);
			assert_eq!(graph.nodes[1].y, 34.0);
			assert_eq!(graph.nodes[1].vx, 0.0);
			assert_eq!(graph.nodes[1].vy, 0.0);
		}
	}

	#[test]
	fn released_node_resumes_free_integration_next_tick() {
		let mut graph = linked_pair(100.0, 10.0);
		let mut sim = Simulation::new(&graph, SimulationConfig::default());

		graph.pin(0, 100.0, 200.0);
		sim.tick(&mut graph);
		assert_eq!((graph.nodes[0].x, graph.nodes[0].y), (100.0, 200.0));

		graph.unpin(0);
		sim.tick(&mut graph);
		assert!(graph.nodes[0].pin.is_none(), "no lingering pin");
		let moved = graph.nodes[0].x != 100.0 || graph.nodes[0].y != 200.0;
		assert!(moved, "attraction and repulsion act again immediately");
	}

	#[test]
	fn linked_pair_approaches_monotonically_without_coinciding() {
		// Seeded well outside the attraction/repulsion equilibrium.
		let mut graph = linked_pair(400.0, 10.0);
		let mut sim = Simulation::new(&graph, SimulationConfig::default());

		let mut previous = distance(&graph, 0, 1);
		let initial = previous;
		for _ in 0..50 {
			sim.tick(&mut graph);
			let current = distance(&graph, 0, 1);
			assert!(current <= previous + 1e-9, "monotone approach");
			assert!(current > 0.0, "repulsion floor prevents coincidence");
			previous = current;
		}
		assert!(previous < initial, "net convergence over the run");
	}

	#[test]
	fn centroid_is_steered_to_the_configured_center() {
		let doc = GraphDocument {
			nodes: vec![spec("a", "red", 10.0, 10.0), spec("b", "blue", 30.0, 50.0)],
			links: vec![],
		};
		let mut graph = Graph::load(&doc).unwrap();
		let mut sim = Simulation::new(&graph, SimulationConfig::default());

		sim.tick(&mut graph);
		let cx = (graph.nodes[0].x + graph.nodes[1].x) / 2.0;
		let cy = (graph.nodes[0].y + graph.nodes[1].y) / 2.0;
		assert!(cx.abs() < 1e-9, "centroid x at origin, got {cx}");
		assert!(cy.abs() < 1e-9, "centroid y at origin, got {cy}");
	}

	#[test]
	fn alpha_never_decays_on_its_own() {
		let mut graph = linked_pair(100.0, 5.0);
		let mut sim = Simulation::new(&graph, SimulationConfig::default());

		for _ in 0..100 {
			sim.tick(&mut graph);
		}
		assert_eq!(sim.alpha(), 1.0, "zero decay keeps the layout live");
	}

	#[test]
	fn energy_target_follows_the_drag_state_machine() {
		let graph = linked_pair(100.0, 5.0);
		let mut sim = Simulation::new(&graph, SimulationConfig::default());

		assert!(sim.is_resting());
		sim.reheat();
		assert!(!sim.is_resting());
		assert_eq!(sim.alpha_target(), 0.3);
		sim.rest();
		assert!(sim.is_resting());
		assert_eq!(sim.alpha_target(), 0.0);
	}

	#[test]
	fn pinned_node_still_repels_its_neighbors() {
		// Symmetric about the center so the centering pass is a no-op.
		let doc = GraphDocument {
			nodes: vec![spec("a", "red", -10.0, 0.0), spec("b", "blue", 10.0, 0.0)],
			links: vec![],
		};
		let mut graph = Graph::load(&doc).unwrap();
		let mut sim = Simulation::new(&graph, SimulationConfig::default());

		graph.pin(0, -10.0, 0.0);
		sim.tick(&mut graph);
		assert_eq!(graph.nodes[0].x, -10.0, "pinned node does not recoil");
		assert!(
			graph.nodes[1].x > 10.0,
			"free node is pushed away from the pinned one"
		);
	}
}
