//! Force-directed diagram of a weighted, undirected graph.
//!
//! Nodes repel each other, linked nodes attract in steep proportion to edge
//! weight, and the layout stays perpetually live: the energy scalar never
//! decays on its own, so drags keep propagating through the simulation
//! instead of waiting on a restart. Renders with either of two components:
//!
//! - [`ForceGraphSvg`]: retained-mode vector renderer that updates attributes
//!   on persistent SVG shapes each tick.
//! - [`ForceGraphCanvas`]: immediate-mode raster renderer that clears and
//!   redraws a canvas each tick.
//!
//! Both are driven by the same physics tick and support pan, wheel zoom
//! (clamped to a per-renderer scale extent), and drag-to-pin on nodes. Each
//! link is stroked with a gradient running from its source node's color to
//! its target's.
//!
//! # Example
//!
//! ```ignore
//! use force_diagram::{ForceGraphSvg, GraphDocument};
//!
//! let doc: GraphDocument = serde_json::from_str(
//!     r#"{ "nodes": [{ "id": "a", "color": "#d62728", "radius": 5.0 },
//!                    { "id": "b", "color": "#1f77b4", "radius": 5.0 }],
//!          "links": [{ "source": "a", "target": "b", "weight": 10.0 }] }"#,
//! )?;
//!
//! view! { <ForceGraphSvg data=doc fullscreen=true /> }
//! ```

mod component;
mod error;
mod graph;
mod quadtree;
mod render;
mod simulation;
mod state;
mod svg;
mod types;

pub use component::{ForceGraphCanvas, ForceGraphSvg};
pub use error::GraphError;
pub use graph::{Graph, Link, Node};
pub use simulation::{Simulation, SimulationConfig, link_strength};
pub use state::ViewTransform;
pub use types::{GraphDocument, LinkSpec, NodeSpec};
