//! Retained-mode vector renderer.
//!
//! Builds persistent SVG structure once at attach time: a `<defs>` block with
//! one linear gradient per link (keyed by load-time link index), one `<path>`
//! per link referencing its gradient, and one `<g>` (circle plus label) per
//! node. Each tick only rewrites attributes (path geometry, gradient stop
//! positions, group translations); shapes are never recreated.
//!
//! The node/link set is immutable after load, so index-keyed gradient ids
//! can never desynchronize.

use web_sys::{Document, Element};

use super::error::GraphError;
use super::graph::Graph;
use super::render::{LINK_STROKE_WIDTH, Renderer};
use super::state::ViewTransform;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Attribute carried by every node group so native hit-testing can map an
/// event target back to an arena index.
const NODE_INDEX_ATTR: &str = "data-node-index";

/// Retained SVG renderer attached to a pre-existing `<svg>` element.
pub struct SvgRenderer {
	document: Document,
	root: Element,
	/// Scene group carrying the pan/zoom transform.
	scene: Element,
	/// One gradient element per link, same order as `graph.links`.
	gradients: Vec<Element>,
	/// One path element per link, same order as `graph.links`.
	paths: Vec<Element>,
	/// One group (circle + label) per node, same order as `graph.nodes`.
	node_groups: Vec<Element>,
}

fn svg_element(document: &Document, name: &str) -> Result<Element, GraphError> {
	document
		.create_element_ns(Some(SVG_NS), name)
		.map_err(|_| GraphError::RenderSurface(format!("could not create <{name}> element")))
}

impl SvgRenderer {
	/// Scale extent for the vector surface.
	pub const SCALE_EXTENT: (f64, f64) = (0.1, 4.0);

	/// Attaches to an existing `<svg>` element and builds the retained scene
	/// for `graph`. Fails with [`GraphError::RenderSurface`] when the element
	/// is not an SVG surface.
	pub fn attach(
		root: Element,
		graph: &Graph,
		width: f64,
		height: f64,
	) -> Result<Self, GraphError> {
		if root.namespace_uri().as_deref() != Some(SVG_NS)
			|| !root.tag_name().eq_ignore_ascii_case("svg")
		{
			return Err(GraphError::RenderSurface(format!(
				"expected an <svg> surface, got <{}>",
				root.tag_name()
			)));
		}
		let document = root.owner_document().ok_or_else(|| {
			GraphError::RenderSurface("svg element is detached from any document".into())
		})?;

		// Attaching always rebuilds the retained scene from scratch, so a
		// second attach to the same root cannot stack a duplicate scene.
		root.set_text_content(None);

		let defs = svg_element(&document, "defs")?;
		let scene = svg_element(&document, "g")?;

		let mut gradients = Vec::with_capacity(graph.links.len());
		let mut paths = Vec::with_capacity(graph.links.len());
		for (index, link) in graph.links.iter().enumerate() {
			let gradient = svg_element(&document, "linearGradient")?;
			let id = format!("link-gradient-{index}");
			let _ = gradient.set_attribute("id", &id);
			let _ = gradient.set_attribute("gradientUnits", "userSpaceOnUse");

			// Stop colors are immutable after load; only the gradient's
			// endpoint coordinates change per tick.
			let start = svg_element(&document, "stop")?;
			let _ = start.set_attribute("offset", "0%");
			let _ = start.set_attribute("stop-color", &graph.nodes[link.source].color);
			let end = svg_element(&document, "stop")?;
			let _ = end.set_attribute("offset", "100%");
			let _ = end.set_attribute("stop-color", &graph.nodes[link.target].color);
			let _ = gradient.append_child(&start);
			let _ = gradient.append_child(&end);
			let _ = defs.append_child(&gradient);

			let path = svg_element(&document, "path")?;
			let _ = path.set_attribute("stroke", &format!("url(#{id})"));
			let _ = path.set_attribute("stroke-width", &LINK_STROKE_WIDTH.to_string());
			let _ = path.set_attribute("fill", "none");
			let _ = scene.append_child(&path);

			gradients.push(gradient);
			paths.push(path);
		}

		let mut node_groups = Vec::with_capacity(graph.nodes.len());
		for (index, node) in graph.nodes.iter().enumerate() {
			let group = svg_element(&document, "g")?;
			let _ = group.set_attribute(NODE_INDEX_ATTR, &index.to_string());

			let circle = svg_element(&document, "circle")?;
			let _ = circle.set_attribute("r", &node.radius.to_string());
			let _ = circle.set_attribute("fill", &node.color);

			let label = svg_element(&document, "text")?;
			let _ = label.set_attribute("dy", "0.35em");
			let _ = label.set_attribute("text-anchor", "middle");
			let _ = label.set_attribute("font-weight", "bold");
			let _ = label.set_attribute("fill", "black");
			label.set_text_content(Some(&node.id));

			let _ = group.append_child(&circle);
			let _ = group.append_child(&label);
			let _ = scene.append_child(&group);
			node_groups.push(group);
		}

		let _ = root.append_child(&defs);
		let _ = root.append_child(&scene);

		let mut renderer = Self {
			document,
			root,
			scene,
			gradients,
			paths,
			node_groups,
		};
		renderer.resize(width, height);
		Ok(renderer)
	}
}

impl Renderer for SvgRenderer {
	fn redraw(&mut self, graph: &Graph, view: &ViewTransform) {
		let _ = self.scene.set_attribute(
			"transform",
			&format!("translate({},{}) scale({})", view.x, view.y, view.k),
		);

		for (index, link) in graph.links.iter().enumerate() {
			let source = &graph.nodes[link.source];
			let target = &graph.nodes[link.target];

			let _ = self.paths[index].set_attribute(
				"d",
				&format!("M{},{} L{},{}", source.x, source.y, target.x, target.y),
			);

			let gradient = &self.gradients[index];
			let _ = gradient.set_attribute("x1", &source.x.to_string());
			let _ = gradient.set_attribute("y1", &source.y.to_string());
			let _ = gradient.set_attribute("x2", &target.x.to_string());
			let _ = gradient.set_attribute("y2", &target.y.to_string());
		}

		for (index, node) in graph.nodes.iter().enumerate() {
			let _ = self.node_groups[index]
				.set_attribute("transform", &format!("translate({},{})", node.x, node.y));
		}
	}

	// Native shape hit-testing: ask the DOM which element sits under the
	// pointer and walk up to the enclosing node group.
	fn hit_test(&self, _graph: &Graph, _view: &ViewTransform, sx: f64, sy: f64) -> Option<usize> {
		let rect = self.root.get_bounding_client_rect();
		let mut element = self
			.document
			.element_from_point((rect.left() + sx) as f32, (rect.top() + sy) as f32)?;
		loop {
			if let Some(value) = element.get_attribute(NODE_INDEX_ATTR) {
				return value.parse().ok();
			}
			element = element.parent_element()?;
		}
	}

	fn resize(&mut self, width: f64, height: f64) {
		let _ = self.root.set_attribute("width", &width.to_string());
		let _ = self.root.set_attribute("height", &height.to_string());
	}

	fn scale_extent(&self) -> (f64, f64) {
		Self::SCALE_EXTENT
	}
}
