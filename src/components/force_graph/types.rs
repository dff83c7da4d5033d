//! Raw graph document types, deserialized from the inline JSON payload.

use serde::Deserialize;

/// A node entry in the raw graph document.
#[derive(Clone, Debug, Deserialize)]
pub struct NodeSpec {
	/// Unique identifier. Links reference nodes by this id, and it doubles
	/// as the rendered label text.
	pub id: String,
	/// Display color as a CSS color string (e.g. "#d62728").
	pub color: String,
	/// Display radius in graph units.
	pub radius: f64,
	/// Optional horizontal position seed. Unseeded nodes are placed on a
	/// circle around the origin at load.
	#[serde(default)]
	pub x: Option<f64>,
	/// Optional vertical position seed.
	#[serde(default)]
	pub y: Option<f64>,
}

/// A weighted undirected edge between two nodes, referenced by id.
#[derive(Clone, Debug, Deserialize)]
pub struct LinkSpec {
	/// Id of one endpoint.
	pub source: String,
	/// Id of the other endpoint.
	pub target: String,
	/// Non-negative attraction weight.
	pub weight: f64,
}

/// Complete raw document: `{ nodes: [...], links: [...] }`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphDocument {
	/// All nodes in the graph.
	pub nodes: Vec<NodeSpec>,
	/// All links between them.
	pub links: Vec<LinkSpec>,
}
