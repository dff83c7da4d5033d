//! Error taxonomy for graph loading and renderer attachment.
//!
//! All variants are initialization-time failures. Per-tick code has no error
//! path: once a graph has loaded and a renderer has attached, every tick
//! operates on internally consistent state.

use thiserror::Error;

/// Reasons initialization can fail. Each is reported once to the caller;
/// no ticks are scheduled afterwards and no retry is attempted here.
#[derive(Debug, Error)]
pub enum GraphError {
	/// The graph document is structurally invalid: a link references an
	/// unknown node id, a node id is duplicated, a required field is missing
	/// or out of range. Fatal to that load; no partial graph is produced.
	#[error("malformed graph: {0}")]
	MalformedGraph(String),

	/// The data provider did not deliver a document. Recoverable by the
	/// embedding application (retry is its concern, not ours).
	#[error("graph data unavailable: {0}")]
	DataFetch(String),

	/// The host supplied a surface the renderer cannot draw on, e.g. a
	/// canvas without a 2d context or a non-`<svg>` element.
	#[error("render surface rejected: {0}")]
	RenderSurface(String),
}
