//! View transform and pointer interaction state.
//!
//! The transform is a purely presentational pan/zoom mapping from graph space
//! to screen space; it never touches node positions. Drag and pan state track
//! one in-progress pointer gesture each.

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug)]
pub struct ViewTransform {
	/// Horizontal translation in screen pixels.
	pub x: f64,
	/// Vertical translation in screen pixels.
	pub y: f64,
	/// Uniform scale factor, clamped by the renderer's scale extent.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Maps a screen-space point back into graph space.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Zooms by `factor` anchored at screen point `(sx, sy)`, keeping the
	/// graph point under the cursor fixed. The resulting scale is clamped to
	/// the `(min, max)` extent regardless of the requested magnitude.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64, extent: (f64, f64)) {
		let new_k = (self.k * factor).clamp(extent.0, extent.1);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}
}

/// Tracks an in-progress node drag.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	/// Whether a drag is active.
	pub active: bool,
	/// Arena index of the dragged node.
	pub node: Option<usize>,
}

/// Tracks an in-progress background pan.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	/// Whether a pan is active.
	pub active: bool,
	/// Screen position where the pan started.
	pub start_x: f64,
	/// Screen position where the pan started.
	pub start_y: f64,
	/// Transform translation at pan start.
	pub transform_start_x: f64,
	/// Transform translation at pan start.
	pub transform_start_y: f64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zoom_is_clamped_to_the_scale_extent() {
		let mut transform = ViewTransform::default();
		transform.zoom_at(0.0, 0.0, 100.0, (0.1, 4.0));
		assert_eq!(transform.k, 4.0);

		transform.zoom_at(0.0, 0.0, 1e-9, (0.1, 4.0));
		assert_eq!(transform.k, 0.1);
	}

	#[test]
	fn zoom_keeps_the_point_under_the_cursor_fixed() {
		let mut transform = ViewTransform {
			x: 50.0,
			y: -20.0,
			k: 1.0,
		};
		let anchor = (120.0, 80.0);
		let before = transform.screen_to_graph(anchor.0, anchor.1);

		transform.zoom_at(anchor.0, anchor.1, 1.1, (0.1, 10.0));
		let after = transform.screen_to_graph(anchor.0, anchor.1);

		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);
	}

	#[test]
	fn screen_to_graph_inverts_the_transform() {
		let transform = ViewTransform {
			x: 400.0,
			y: 300.0,
			k: 2.0,
		};
		// Graph point (10, -5) lands at screen (420, 290).
		let (gx, gy) = transform.screen_to_graph(420.0, 290.0);
		assert_eq!((gx, gy), (10.0, -5.0));
	}
}
