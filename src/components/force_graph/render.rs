//! Renderer contract and the immediate-mode canvas renderer.
//!
//! Both renderer variants consume the same tick: current node/link state plus
//! the view transform. The canvas variant clears and redraws everything from
//! scratch each tick; the retained SVG variant lives in [`super::svg`].

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::error::GraphError;
use super::graph::{Graph, Link};
use super::state::ViewTransform;

/// Stroke width for links, constant regardless of weight. Edges are told
/// apart by their endpoint-color gradients, not by thickness.
pub const LINK_STROKE_WIDTH: f64 = 5.0;

/// Font for node id labels.
const LABEL_FONT: &str = "bold 10px sans-serif";

/// One tick contract shared by both renderer variants, so a single physics
/// loop can drive either without duplication.
pub trait Renderer {
	/// Redraws the scene from the current node/link state and view transform.
	fn redraw(&mut self, graph: &Graph, view: &ViewTransform);

	/// Which node, if any, a pointer at surface-local `(sx, sy)` lands on.
	fn hit_test(&self, graph: &Graph, view: &ViewTransform, sx: f64, sy: f64) -> Option<usize>;

	/// Adjusts the surface to new displayed dimensions.
	fn resize(&mut self, width: f64, height: f64);

	/// Allowed `(min, max)` range for the view transform's scale.
	fn scale_extent(&self) -> (f64, f64);
}

/// Point-in-circle hit test in graph space; the topmost (last drawn) node
/// wins when circles overlap.
pub fn node_at(graph: &Graph, view: &ViewTransform, sx: f64, sy: f64) -> Option<usize> {
	let (gx, gy) = view.screen_to_graph(sx, sy);
	for (index, node) in graph.nodes.iter().enumerate().rev() {
		let (dx, dy) = (node.x - gx, node.y - gy);
		if dx * dx + dy * dy <= node.radius * node.radius {
			return Some(index);
		}
	}
	None
}

/// Immediate-mode raster renderer.
///
/// The backing buffer is scaled by the device pixel ratio while the CSS size
/// stays at the displayed dimensions, so strokes and labels remain crisp on
/// high-density displays.
pub struct CanvasRenderer {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	dpr: f64,
	width: f64,
	height: f64,
}

impl CanvasRenderer {
	/// Scale extent for the raster surface.
	pub const SCALE_EXTENT: (f64, f64) = (0.1, 10.0);

	/// Attaches to an existing canvas element sized to `width` x `height`
	/// CSS pixels. Fails with [`GraphError::RenderSurface`] when the element
	/// cannot provide a 2d context.
	pub fn attach(canvas: HtmlCanvasElement, width: f64, height: f64) -> Result<Self, GraphError> {
		let ctx = canvas
			.get_context("2d")
			.map_err(|_| GraphError::RenderSurface("canvas refused a 2d context".into()))?
			.ok_or_else(|| GraphError::RenderSurface("canvas has no 2d context".into()))?
			.dyn_into::<CanvasRenderingContext2d>()
			.map_err(|_| GraphError::RenderSurface("2d context has an unexpected type".into()))?;

		let dpr = web_sys::window()
			.map(|w| w.device_pixel_ratio())
			.unwrap_or(1.0)
			.max(1.0);

		let mut renderer = Self {
			canvas,
			ctx,
			dpr,
			width,
			height,
		};
		renderer.resize(width, height);
		Ok(renderer)
	}

	fn draw_link(&self, graph: &Graph, link: &Link) {
		let source = &graph.nodes[link.source];
		let target = &graph.nodes[link.target];

		// A fresh gradient every tick: stops sit at the endpoints' current
		// positions and carry their immutable colors.
		let gradient = self
			.ctx
			.create_linear_gradient(source.x, source.y, target.x, target.y);
		let _ = gradient.add_color_stop(0.0, &source.color);
		let _ = gradient.add_color_stop(1.0, &target.color);

		#[allow(deprecated)]
		self.ctx.set_stroke_style(&gradient);
		self.ctx.set_line_width(LINK_STROKE_WIDTH);
		self.ctx.begin_path();
		self.ctx.move_to(source.x, source.y);
		self.ctx.line_to(target.x, target.y);
		self.ctx.stroke();
	}

	fn draw_nodes(&self, graph: &Graph) {
		use std::f64::consts::PI;

		for node in &graph.nodes {
			self.ctx.begin_path();
			let _ = self.ctx.arc(node.x, node.y, node.radius, 0.0, 2.0 * PI);
			self.ctx.set_fill_style_str(&node.color);
			self.ctx.fill();
		}

		self.ctx.set_font(LABEL_FONT);
		self.ctx.set_text_align("center");
		self.ctx.set_text_baseline("middle");
		self.ctx.set_fill_style_str("black");
		for node in &graph.nodes {
			let _ = self.ctx.fill_text(&node.id, node.x, node.y);
		}
	}
}

impl Renderer for CanvasRenderer {
	fn redraw(&mut self, graph: &Graph, view: &ViewTransform) {
		let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
		self.ctx
			.clear_rect(0.0, 0.0, self.width * self.dpr, self.height * self.dpr);

		self.ctx.save();
		let _ = self.ctx.scale(self.dpr, self.dpr);
		let _ = self.ctx.translate(view.x, view.y);
		let _ = self.ctx.scale(view.k, view.k);

		for link in &graph.links {
			self.draw_link(graph, link);
		}
		self.draw_nodes(graph);

		self.ctx.restore();
	}

	fn hit_test(&self, graph: &Graph, view: &ViewTransform, sx: f64, sy: f64) -> Option<usize> {
		node_at(graph, view, sx, sy)
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.canvas.set_width((width * self.dpr) as u32);
		self.canvas.set_height((height * self.dpr) as u32);

		// Backing buffer grows with pixel density; displayed size does not.
		let style = self.canvas.style();
		let _ = style.set_property("width", &format!("{width}px"));
		let _ = style.set_property("height", &format!("{height}px"));
	}

	fn scale_extent(&self) -> (f64, f64) {
		Self::SCALE_EXTENT
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{GraphDocument, NodeSpec};

	fn graph_with(nodes: Vec<(f64, f64, f64)>) -> Graph {
		let doc = GraphDocument {
			nodes: nodes
				.into_iter()
				.enumerate()
				.map(|(i, (x, y, radius))| NodeSpec {
					id: format!("n{i}"),
					color: "gray".into(),
					radius,
					x: Some(x),
					y: Some(y),
				})
				.collect(),
			links: vec![],
		};
		Graph::load(&doc).unwrap()
	}

	#[test]
	fn hit_test_respects_radius_and_transform() {
		let graph = graph_with(vec![(0.0, 0.0, 5.0)]);
		let view = ViewTransform {
			x: 100.0,
			y: 100.0,
			k: 2.0,
		};

		// Node center maps to screen (100, 100); radius 5 spans 10 px.
		assert_eq!(node_at(&graph, &view, 100.0, 100.0), Some(0));
		assert_eq!(node_at(&graph, &view, 100.0, 109.0), Some(0));
		assert_eq!(node_at(&graph, &view, 100.0, 111.0), None);
	}

	#[test]
	fn hit_test_prefers_the_topmost_node() {
		let graph = graph_with(vec![(0.0, 0.0, 10.0), (2.0, 0.0, 10.0)]);
		let view = ViewTransform::default();

		// Both circles cover the origin; the later-drawn node wins.
		assert_eq!(node_at(&graph, &view, 0.0, 0.0), Some(1));
	}
}
