//! Leptos components wrapping the two renderer variants.
//!
//! Each component attaches its renderer to the surface element it owns in the
//! view, then drives the identical tick sequence from a
//! `requestAnimationFrame` loop: solve forces, then hand the mutated state to
//! the renderer. The physics loop is never duplicated per renderer; only the
//! surface and the hit-testing strategy differ.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::error::GraphError;
use super::graph::Graph;
use super::render::{CanvasRenderer, Renderer};
use super::simulation::{Simulation, SimulationConfig};
use super::state::{DragState, PanState, ViewTransform};
use super::svg::SvgRenderer;
use super::types::GraphDocument;

/// Everything the tick scheduler and input handlers share for one mounted
/// graph. Created once on mount, then mutated every frame.
struct GraphView {
	graph: Graph,
	sim: Simulation,
	transform: ViewTransform,
	drag: DragState,
	pan: PanState,
	renderer: Box<dyn Renderer>,
}

type SharedView = Rc<RefCell<Option<GraphView>>>;

impl GraphView {
	fn new(graph: Graph, renderer: Box<dyn Renderer>, width: f64, height: f64) -> Self {
		let sim = Simulation::new(&graph, SimulationConfig::default());
		Self {
			graph,
			sim,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			renderer,
		}
	}

	/// One scheduler tick: advance the solver, then redraw. Forces integrate
	/// fully before the renderer ever reads a position.
	fn tick(&mut self) {
		self.sim.tick(&mut self.graph);
		self.renderer.redraw(&self.graph, &self.transform);
	}

	fn pointer_down(&mut self, x: f64, y: f64) {
		if let Some(index) = self.renderer.hit_test(&self.graph, &self.transform, x, y) {
			if self.sim.is_resting() {
				self.sim.reheat();
			}
			let (nx, ny) = (self.graph.nodes[index].x, self.graph.nodes[index].y);
			self.graph.pin(index, nx, ny);
			self.drag = DragState {
				active: true,
				node: Some(index),
			};
		} else {
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	fn pointer_move(&mut self, x: f64, y: f64) {
		if self.drag.active {
			if let Some(index) = self.drag.node {
				let (gx, gy) = self.transform.screen_to_graph(x, y);
				self.graph.pin(index, gx, gy);
			}
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	fn pointer_up(&mut self) {
		if self.drag.active {
			if let Some(index) = self.drag.node {
				self.graph.unpin(index);
			}
			self.sim.rest();
		}
		self.drag = DragState::default();
		self.pan.active = false;
	}

	fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let extent = self.renderer.scale_extent();
		self.transform.zoom_at(x, y, factor, extent);
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.renderer.resize(width, height);
	}
}

/// Pointer position local to the surface the event fired on.
fn surface_coords(ev: &MouseEvent) -> Option<(f64, f64)> {
	let element: Element = ev.current_target()?.dyn_into().ok()?;
	let rect = element.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn on_down(context: SharedView) -> impl FnMut(MouseEvent) + 'static {
	move |ev: MouseEvent| {
		let Some((x, y)) = surface_coords(&ev) else {
			return;
		};
		if let Some(ref mut view) = *context.borrow_mut() {
			view.pointer_down(x, y);
		}
	}
}

fn on_move(context: SharedView) -> impl FnMut(MouseEvent) + 'static {
	move |ev: MouseEvent| {
		let Some((x, y)) = surface_coords(&ev) else {
			return;
		};
		if let Some(ref mut view) = *context.borrow_mut() {
			view.pointer_move(x, y);
		}
	}
}

fn on_up(context: SharedView) -> impl FnMut(MouseEvent) + 'static {
	move |_: MouseEvent| {
		if let Some(ref mut view) = *context.borrow_mut() {
			view.pointer_up();
		}
	}
}

fn on_wheel(context: SharedView) -> impl FnMut(WheelEvent) + 'static {
	move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = surface_coords(&ev) else {
			return;
		};
		if let Some(ref mut view) = *context.borrow_mut() {
			view.wheel(x, y, ev.delta_y());
		}
	}
}

/// Keeps the animation-frame loop alive; dropping it stops the scheduler so
/// no further ticks fire after teardown.
struct TickGuard {
	cancelled: Rc<Cell<bool>>,
	raf_handle: Rc<Cell<i32>>,
	_animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl Drop for TickGuard {
	fn drop(&mut self) {
		self.cancelled.set(true);
		if let Some(window) = web_sys::window() {
			let _ = window.cancel_animation_frame(self.raf_handle.get());
		}
	}
}

fn spawn_ticks(context: SharedView) -> TickGuard {
	let cancelled = Rc::new(Cell::new(false));
	let raf_handle = Rc::new(Cell::new(0));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	let (cancelled_inner, handle_inner, animate_inner) =
		(cancelled.clone(), raf_handle.clone(), animate.clone());
	*animate.borrow_mut() = Some(Closure::new(move || {
		if cancelled_inner.get() {
			return;
		}
		if let Some(ref mut view) = *context.borrow_mut() {
			view.tick();
		}
		if let Some(ref cb) = *animate_inner.borrow() {
			if let Ok(handle) = web_sys::window()
				.unwrap()
				.request_animation_frame(cb.as_ref().unchecked_ref())
			{
				handle_inner.set(handle);
			}
		}
	}));
	if let Some(ref cb) = *animate.borrow() {
		if let Ok(handle) = web_sys::window()
			.unwrap()
			.request_animation_frame(cb.as_ref().unchecked_ref())
		{
			raf_handle.set(handle);
		}
	}

	TickGuard {
		cancelled,
		raf_handle,
		_animate: animate,
	}
}

/// Detaches the window resize listener when dropped.
struct ResizeGuard {
	callback: Closure<dyn FnMut()>,
}

impl Drop for ResizeGuard {
	fn drop(&mut self) {
		if let Some(window) = web_sys::window() {
			let _ = window.remove_event_listener_with_callback(
				"resize",
				self.callback.as_ref().unchecked_ref(),
			);
		}
	}
}

fn spawn_fullscreen_resize(context: SharedView) -> ResizeGuard {
	let callback: Closure<dyn FnMut()> = Closure::new(move || {
		let window = web_sys::window().unwrap();
		let (width, height) = (
			window.inner_width().unwrap().as_f64().unwrap(),
			window.inner_height().unwrap().as_f64().unwrap(),
		);
		if let Some(ref mut view) = *context.borrow_mut() {
			view.resize(width, height);
		}
	});
	let _ = web_sys::window()
		.unwrap()
		.add_event_listener_with_callback("resize", callback.as_ref().unchecked_ref());
	ResizeGuard { callback }
}

/// Guards dropped together on component cleanup.
struct ViewGuards {
	_ticks: TickGuard,
	_resize: Option<ResizeGuard>,
}

type SharedGuards = Rc<RefCell<Option<ViewGuards>>>;

/// Teardown closure for `on_cleanup`, which demands `Send + Sync` even on
/// wasm. The `Rc`s go through a [`SendWrapper`], sound because the closure
/// runs on the same single-threaded reactive owner that created it.
fn cleanup_view(context: SharedView, guards: SharedGuards) -> impl FnOnce() + Send + Sync + 'static {
	let held = SendWrapper::new((context, guards));
	move || {
		let (context, guards) = held.take();
		guards.borrow_mut().take();
		context.borrow_mut().take();
	}
}

/// Displayed dimensions for a surface: viewport when fullscreen, explicit
/// props when given, otherwise the parent container's size.
fn surface_size(
	element: &Element,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		let window = web_sys::window().unwrap();
		return (
			window.inner_width().unwrap().as_f64().unwrap(),
			window.inner_height().unwrap().as_f64().unwrap(),
		);
	}
	(
		width.unwrap_or_else(|| {
			element
				.parent_element()
				.map(|p| p.client_width() as f64)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			element
				.parent_element()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

/// Loads the graph, attaches the renderer and starts the tick loop. Any
/// initialization error is reported once and leaves the scheduler unstarted.
fn mount_view(
	context: &SharedView,
	guards: &SharedGuards,
	data: &GraphDocument,
	attach: impl FnOnce(&Graph) -> Result<Box<dyn Renderer>, GraphError>,
	fullscreen: bool,
	width: f64,
	height: f64,
) {
	let graph = match Graph::load(data) {
		Ok(graph) => graph,
		Err(err) => {
			error!("force-diagram: {err}");
			return;
		}
	};
	let renderer = match attach(&graph) {
		Ok(renderer) => renderer,
		Err(err) => {
			error!("force-diagram: {err}");
			return;
		}
	};

	*context.borrow_mut() = Some(GraphView::new(graph, renderer, width, height));
	let resize = fullscreen.then(|| spawn_fullscreen_resize(context.clone()));
	*guards.borrow_mut() = Some(ViewGuards {
		_ticks: spawn_ticks(context.clone()),
		_resize: resize,
	});
}

/// Renders the graph with the retained-mode vector renderer on an `<svg>`
/// surface.
///
/// Pass the loaded document via the reactive `data` signal. The component
/// sizes itself to its parent container by default; set `fullscreen = true`
/// to fill the viewport and follow window resizes. Explicit `width`/`height`
/// override automatic sizing.
#[component]
pub fn ForceGraphSvg(
	#[prop(into)] data: Signal<GraphDocument>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let svg_ref = NodeRef::<leptos::svg::Svg>::new();
	let context: SharedView = Rc::new(RefCell::new(None));
	let guards: SharedGuards = Rc::new(RefCell::new(None));

	let (context_init, guards_init) = (context.clone(), guards.clone());
	Effect::new(move |_| {
		let Some(svg) = svg_ref.get() else {
			return;
		};
		let root: Element = svg.into();
		let (w, h) = surface_size(&root, fullscreen, width, height);

		// Untracked: the mount is keyed to the surface element, not to
		// document changes (the node/link set is immutable after load).
		mount_view(
			&context_init,
			&guards_init,
			&data.get_untracked(),
			|graph| Ok(Box::new(SvgRenderer::attach(root, graph, w, h)?)),
			fullscreen,
			w,
			h,
		);
	});

	on_cleanup(cleanup_view(context.clone(), guards));

	view! {
		<svg
			node_ref=svg_ref
			class="force-graph-svg"
			on:mousedown=on_down(context.clone())
			on:mousemove=on_move(context.clone())
			on:mouseup=on_up(context.clone())
			on:mouseleave=on_up(context.clone())
			on:wheel=on_wheel(context)
			style="display: block; cursor: grab;"
		/>
	}
}

/// Renders the graph with the immediate-mode raster renderer on a canvas
/// surface.
///
/// Identical contract and interactions as [`ForceGraphSvg`]; only the
/// drawing strategy and hit-testing differ.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphDocument>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: SharedView = Rc::new(RefCell::new(None));
	let guards: SharedGuards = Rc::new(RefCell::new(None));

	let (context_init, guards_init) = (context.clone(), guards.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (w, h) = surface_size(&canvas, fullscreen, width, height);

		// Untracked: the mount is keyed to the surface element, not to
		// document changes (the node/link set is immutable after load).
		mount_view(
			&context_init,
			&guards_init,
			&data.get_untracked(),
			|_graph| Ok(Box::new(CanvasRenderer::attach(canvas, w, h)?)),
			fullscreen,
			w,
			h,
		);
	});

	on_cleanup(cleanup_view(context.clone(), guards));

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_down(context.clone())
			on:mousemove=on_move(context.clone())
			on:mouseup=on_up(context.clone())
			on:mouseleave=on_up(context.clone())
			on:wheel=on_wheel(context)
			style="display: block; cursor: grab;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::render::node_at;
	use crate::components::force_graph::types::NodeSpec;

	/// Renderer with no surface, so the view logic runs off-DOM.
	struct StubRenderer;

	impl Renderer for StubRenderer {
		fn redraw(&mut self, _graph: &Graph, _view: &ViewTransform) {}

		fn hit_test(
			&self,
			graph: &Graph,
			view: &ViewTransform,
			sx: f64,
			sy: f64,
		) -> Option<usize> {
			node_at(graph, view, sx, sy)
		}

		fn resize(&mut self, _width: f64, _height: f64) {}

		fn scale_extent(&self) -> (f64, f64) {
			(0.1, 4.0)
		}
	}

	fn spec(id: &str, x: f64, y: f64) -> NodeSpec {
		NodeSpec {
			id: id.into(),
			color: "gray".into(),
			radius: 5.0,
			x: Some(x),
			y: Some(y),
		}
	}

	/// Two nodes, zero-sized surface: screen coords equal graph coords.
	fn view_with_two_nodes() -> GraphView {
		let doc = GraphDocument {
			nodes: vec![spec("a", 0.0, 0.0), spec("b", 100.0, 0.0)],
			links: vec![],
		};
		let graph = Graph::load(&doc).unwrap();
		GraphView::new(graph, Box::new(StubRenderer), 0.0, 0.0)
	}

	#[test]
	fn drag_pins_reheats_and_release_restores_rest() {
		let mut view = view_with_two_nodes();

		view.pointer_down(0.0, 0.0);
		assert!(view.drag.active);
		assert_eq!(view.drag.node, Some(0));
		assert_eq!(view.graph.nodes[0].pin, Some((0.0, 0.0)));
		assert!(!view.sim.is_resting());

		view.pointer_move(30.0, 40.0);
		assert_eq!(view.graph.nodes[0].pin, Some((30.0, 40.0)));

		view.pointer_up();
		assert!(!view.drag.active);
		assert!(view.graph.nodes[0].pin.is_none());
		assert!(view.sim.is_resting());
	}

	#[test]
	fn pointer_down_on_empty_space_pans_the_view() {
		let mut view = view_with_two_nodes();

		view.pointer_down(500.0, 500.0);
		assert!(view.pan.active);
		assert!(!view.drag.active);

		view.pointer_move(510.0, 520.0);
		assert_eq!(view.transform.x, 10.0);
		assert_eq!(view.transform.y, 20.0);
	}

	#[test]
	fn handlers_outlive_the_context_they_were_built_from() {
		let context: SharedView = Rc::new(RefCell::new(None));
		let down = on_down(context.clone());
		let moved = on_move(context.clone());
		let up = on_up(context.clone());
		let wheel = on_wheel(context.clone());
		drop(context);

		// Boxing as 'static trait objects requires owned captures.
		let _held: (
			Box<dyn FnMut(MouseEvent)>,
			Box<dyn FnMut(MouseEvent)>,
			Box<dyn FnMut(MouseEvent)>,
			Box<dyn FnMut(WheelEvent)>,
		) = (Box::new(down), Box::new(moved), Box::new(up), Box::new(wheel));
	}

	#[test]
	fn teardown_clears_the_shared_state() {
		let context: SharedView = Rc::new(RefCell::new(None));
		*context.borrow_mut() = Some(view_with_two_nodes());
		let guards: SharedGuards = Rc::new(RefCell::new(None));

		cleanup_view(context.clone(), guards.clone())();
		assert!(context.borrow().is_none());
		assert!(guards.borrow().is_none());
	}
}
