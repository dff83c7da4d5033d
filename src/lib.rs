//! force-diagram: interactive force-directed rendering of a weighted graph.
//!
//! The crate compiles to WASM and mounts client-side. Graph data arrives
//! inline as JSON; the layout engine keeps the diagram perpetually live so
//! dragging a node always propagates through the simulation. Two renderers
//! share one physics tick: a retained SVG renderer (default) and an
//! immediate-mode canvas renderer, selected with `?renderer=canvas`.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, error, info};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::force_graph::{
	ForceGraphCanvas, ForceGraphSvg, Graph, GraphDocument, GraphError,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("force-diagram: logging initialized");
}

/// Loads the graph document from the inline provider: a
/// `<script id="graph-data" type="application/json">` element.
///
/// Fails with [`GraphError::DataFetch`] when the provider element is missing
/// or unreadable, and with [`GraphError::MalformedGraph`] when its JSON does
/// not deserialize. Either way the caller schedules no ticks.
pub fn load_graph_document() -> Result<GraphDocument, GraphError> {
	let window: Window =
		web_sys::window().ok_or_else(|| GraphError::DataFetch("no window".into()))?;
	let document = window
		.document()
		.ok_or_else(|| GraphError::DataFetch("no document".into()))?;
	let element = document
		.get_element_by_id("graph-data")
		.ok_or_else(|| GraphError::DataFetch("missing <script id=\"graph-data\"> element".into()))?;
	let script: HtmlScriptElement = element
		.dyn_into()
		.map_err(|_| GraphError::DataFetch("graph-data element is not a script tag".into()))?;
	let json = script
		.text()
		.map_err(|_| GraphError::DataFetch("graph-data element is unreadable".into()))?;

	let doc: GraphDocument = serde_json::from_str(&json)
		.map_err(|err| GraphError::MalformedGraph(format!("document does not parse: {err}")))?;
	info!(
		"force-diagram: loaded {} nodes, {} links",
		doc.nodes.len(),
		doc.links.len()
	);
	Ok(doc)
}

/// Whether the page asked for the raster renderer via `?renderer=canvas`.
fn raster_requested() -> bool {
	web_sys::window()
		.and_then(|w| w.location().search().ok())
		.map(|search| search.contains("renderer=canvas"))
		.unwrap_or(false)
}

/// Main application component: loads the inline document and mounts one
/// renderer over the full viewport.
///
/// A load failure is reported once and rendered as a message; no tick
/// scheduling happens without data. Retrying is the embedding page's concern.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let loaded = load_graph_document();

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Weighted Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		{match loaded {
			Ok(doc) => {
				let data = Signal::derive(move || doc.clone());
				if raster_requested() {
					view! { <ForceGraphCanvas data=data fullscreen=true /> }.into_any()
				} else {
					view! { <ForceGraphSvg data=data fullscreen=true /> }.into_any()
				}
			}
			Err(err) => {
				error!("force-diagram: {err}");
				view! { <p class="load-error">{format!("failed to load graph: {err}")}</p> }
					.into_any()
			}
		}}
	}
}
