//! In-memory graph model: a node arena plus links resolved to indices.
//!
//! The arena is the single authoritative copy of node state. The force solver
//! mutates positions and velocities in place, the interaction controller
//! writes pins through [`Graph::pin`] / [`Graph::unpin`], and renderers only
//! read. Links hold `usize` indices into the arena, resolved from ids exactly
//! once at load; the node and link sets never change afterwards.

use std::collections::HashMap;
use std::f64::consts::PI;

use super::error::GraphError;
use super::types::GraphDocument;

/// Radius of the seeding circle for nodes without a position seed.
const SEED_RADIUS: f64 = 100.0;

/// A node in the arena.
///
/// `color` and `radius` are immutable after load; only position, velocity
/// and the pin are touched during the simulation's lifetime.
#[derive(Clone, Debug)]
pub struct Node {
	/// Stable unique identifier, also used as the label text.
	pub id: String,
	/// Display color (CSS color string).
	pub color: String,
	/// Display radius in graph units.
	pub radius: f64,
	/// Current horizontal position.
	pub x: f64,
	/// Current vertical position.
	pub y: f64,
	/// Current horizontal velocity.
	pub vx: f64,
	/// Current vertical velocity.
	pub vy: f64,
	/// Drag pin. While present the node is held at exactly this position and
	/// receives no velocity updates, though it still exerts force on others.
	/// A single `Option` over both coordinates, so a half-set pin cannot
	/// be represented.
	pub pin: Option<(f64, f64)>,
}

/// An undirected weighted edge holding arena indices resolved at load.
#[derive(Clone, Copy, Debug)]
pub struct Link {
	/// Arena index of one endpoint.
	pub source: usize,
	/// Arena index of the other endpoint.
	pub target: usize,
	/// Non-negative attraction weight.
	pub weight: f64,
}

/// The node arena and its resolved links. Constructed once per view.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	/// Node arena. Indices into this vector are stable for the graph's life.
	pub nodes: Vec<Node>,
	/// Links with endpoints resolved to arena indices.
	pub links: Vec<Link>,
}

impl Graph {
	/// Builds a graph from a raw document, resolving link endpoints from ids
	/// to arena indices exactly once.
	///
	/// Fails with [`GraphError::MalformedGraph`] on duplicate node ids,
	/// links referencing unknown ids, or invalid radii/weights. On failure no
	/// partially constructed graph escapes.
	pub fn load(doc: &GraphDocument) -> Result<Self, GraphError> {
		let mut id_to_idx = HashMap::with_capacity(doc.nodes.len());
		let mut nodes = Vec::with_capacity(doc.nodes.len());

		for (i, spec) in doc.nodes.iter().enumerate() {
			if id_to_idx.insert(spec.id.clone(), i).is_some() {
				return Err(GraphError::MalformedGraph(format!(
					"duplicate node id {:?}",
					spec.id
				)));
			}
			if !spec.radius.is_finite() || spec.radius <= 0.0 {
				return Err(GraphError::MalformedGraph(format!(
					"node {:?} has invalid radius {}",
					spec.id, spec.radius
				)));
			}

			let (x, y) = match (spec.x, spec.y) {
				(Some(x), Some(y)) => (x, y),
				_ => {
					let angle = (i as f64) * 2.0 * PI / doc.nodes.len() as f64;
					(SEED_RADIUS * angle.cos(), SEED_RADIUS * angle.sin())
				}
			};

			nodes.push(Node {
				id: spec.id.clone(),
				color: spec.color.clone(),
				radius: spec.radius,
				x,
				y,
				vx: 0.0,
				vy: 0.0,
				pin: None,
			});
		}

		let mut links = Vec::with_capacity(doc.links.len());
		for spec in &doc.links {
			if !spec.weight.is_finite() || spec.weight < 0.0 {
				return Err(GraphError::MalformedGraph(format!(
					"link {:?} -> {:?} has invalid weight {}",
					spec.source, spec.target, spec.weight
				)));
			}
			let resolve = |id: &str| {
				id_to_idx.get(id).copied().ok_or_else(|| {
					GraphError::MalformedGraph(format!("link references unknown node id {id:?}"))
				})
			};
			links.push(Link {
				source: resolve(&spec.source)?,
				target: resolve(&spec.target)?,
				weight: spec.weight,
			});
		}

		Ok(Self { nodes, links })
	}

	/// Pins a node at the given graph-space position. The solver holds it
	/// there until [`Graph::unpin`] releases it.
	pub fn pin(&mut self, index: usize, x: f64, y: f64) {
		self.nodes[index].pin = Some((x, y));
	}

	/// Clears a node's pin, returning it to free integration on the next tick.
	pub fn unpin(&mut self, index: usize) {
		self.nodes[index].pin = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{LinkSpec, NodeSpec};

	fn node_spec(id: &str, color: &str) -> NodeSpec {
		NodeSpec {
			id: id.into(),
			color: color.into(),
			radius: 5.0,
			x: None,
			y: None,
		}
	}

	fn link_spec(source: &str, target: &str, weight: f64) -> LinkSpec {
		LinkSpec {
			source: source.into(),
			target: target.into(),
			weight,
		}
	}

	#[test]
	fn resolves_link_endpoints_round_trip() {
		let doc = GraphDocument {
			nodes: vec![node_spec("a", "red"), node_spec("b", "blue")],
			links: vec![link_spec("b", "a", 3.0)],
		};

		let graph = Graph::load(&doc).unwrap();
		let link = graph.links[0];
		assert_eq!(graph.nodes[link.source].id, "b");
		assert_eq!(graph.nodes[link.target].id, "a");
	}

	#[test]
	fn rejects_dangling_link_endpoint() {
		let doc = GraphDocument {
			nodes: vec![node_spec("a", "red")],
			links: vec![link_spec("a", "ghost", 1.0)],
		};

		assert!(matches!(
			Graph::load(&doc),
			Err(GraphError::MalformedGraph(_))
		));
	}

	#[test]
	fn rejects_duplicate_node_ids() {
		let doc = GraphDocument {
			nodes: vec![node_spec("a", "red"), node_spec("a", "blue")],
			links: vec![],
		};

		assert!(matches!(
			Graph::load(&doc),
			Err(GraphError::MalformedGraph(_))
		));
	}

	#[test]
	fn rejects_negative_link_weight() {
		let doc = GraphDocument {
			nodes: vec![node_spec("a", "red"), node_spec("b", "blue")],
			links: vec![link_spec("a", "b", -1.0)],
		};

		assert!(matches!(
			Graph::load(&doc),
			Err(GraphError::MalformedGraph(_))
		));
	}

	#[test]
	fn keeps_explicit_position_seeds() {
		let mut seeded = node_spec("a", "red");
		seeded.x = Some(42.0);
		seeded.y = Some(-7.0);
		let doc = GraphDocument {
			nodes: vec![seeded, node_spec("b", "blue")],
			links: vec![],
		};

		let graph = Graph::load(&doc).unwrap();
		assert_eq!((graph.nodes[0].x, graph.nodes[0].y), (42.0, -7.0));
		// Unseeded nodes land on the seeding circle.
		let b = &graph.nodes[1];
		let r = (b.x * b.x + b.y * b.y).sqrt();
		assert!((r - SEED_RADIUS).abs() < 1e-9);
	}

	#[test]
	fn pin_is_all_or_nothing() {
		let doc = GraphDocument {
			nodes: vec![node_spec("a", "red")],
			links: vec![],
		};
		let mut graph = Graph::load(&doc).unwrap();

		assert!(graph.nodes[0].pin.is_none());
		graph.pin(0, 10.0, 20.0);
		assert_eq!(graph.nodes[0].pin, Some((10.0, 20.0)));
		graph.unpin(0);
		assert!(graph.nodes[0].pin.is_none());
	}
}
