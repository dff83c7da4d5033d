//! Barnes–Hut quadtree for the many-body repulsion pass.
//!
//! Exact pairwise repulsion is quadratic in the node count. The quadtree
//! groups nodes spatially and treats sufficiently distant groups as a single
//! point charge at their center of charge, controlled by the accuracy
//! parameter `theta`: a cell is aggregated when `side_length / distance`
//! falls below it. This keeps the pass near linear and is what lets the
//! layout scale past a few hundred nodes within a frame budget.

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

/// Axis-aligned square region of graph space.
#[derive(Clone, Copy, Debug)]
pub struct QuadBounds {
	/// Horizontal center of the square.
	pub cx: f64,
	/// Vertical center of the square.
	pub cy: f64,
	/// Half the side length.
	pub half_extent: f64,
}

impl QuadBounds {
	fn from_points(points: &[(f64, f64)]) -> Option<Self> {
		let mut min = (f64::INFINITY, f64::INFINITY);
		let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);

		for &(x, y) in points {
			min.0 = min.0.min(x);
			min.1 = min.1.min(y);
			max.0 = max.0.max(x);
			max.1 = max.1.max(y);
		}

		if !min.0.is_finite() || !min.1.is_finite() || !max.0.is_finite() || !max.1.is_finite() {
			return None;
		}

		let center = ((min.0 + max.0) * 0.5, (min.1 + max.1) * 0.5);
		let span_x = (max.0 - min.0).max(1.0);
		let span_y = (max.1 - min.1).max(1.0);
		let half_extent = (span_x.max(span_y) * 0.5) + 1.0;

		Some(Self {
			cx: center.0,
			cy: center.1,
			half_extent,
		})
	}

	fn contains(self, x: f64, y: f64) -> bool {
		x >= self.cx - self.half_extent
			&& x <= self.cx + self.half_extent
			&& y >= self.cy - self.half_extent
			&& y <= self.cy + self.half_extent
	}

	fn child(self, quadrant: usize) -> Self {
		let quarter = self.half_extent * 0.5;
		let (ox, oy) = match quadrant {
			0 => (-quarter, -quarter),
			1 => (quarter, -quarter),
			2 => (-quarter, quarter),
			_ => (quarter, quarter),
		};

		Self {
			cx: self.cx + ox,
			cy: self.cy + oy,
			half_extent: quarter,
		}
	}

	fn quadrant_for(self, x: f64, y: f64) -> usize {
		let right = x >= self.cx;
		let lower = y >= self.cy;
		match (right, lower) {
			(false, false) => 0,
			(true, false) => 1,
			(false, true) => 2,
			(true, true) => 3,
		}
	}

	fn side_length(self) -> f64 {
		self.half_extent * 2.0
	}
}

/// One cell of the quadtree. Internal cells hold only the aggregate; leaves
/// keep the indices of the points inside them.
pub struct QuadNode {
	/// Region this cell covers.
	pub bounds: QuadBounds,
	/// Horizontal center of charge of all points under this cell.
	pub charge_x: f64,
	/// Vertical center of charge of all points under this cell.
	pub charge_y: f64,
	/// Number of points under this cell (each carries unit charge).
	pub count: f64,
	indices: Vec<usize>,
	children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
	/// Builds a quadtree over the given points. `None` when the point set is
	/// empty or contains non-finite coordinates.
	pub fn build(points: &[(f64, f64)]) -> Option<Self> {
		let bounds = QuadBounds::from_points(points)?;
		let indices = (0..points.len()).collect::<Vec<_>>();
		Some(Self::build_node(bounds, indices, points, 0))
	}

	fn build_node(
		bounds: QuadBounds,
		indices: Vec<usize>,
		points: &[(f64, f64)],
		depth: usize,
	) -> Self {
		let mut charge = (0.0, 0.0);
		for &index in &indices {
			charge.0 += points[index].0;
			charge.1 += points[index].1;
		}

		let count = indices.len() as f64;
		if count > 0.0 {
			charge.0 /= count;
			charge.1 /= count;
		}

		let mut node = Self {
			bounds,
			charge_x: charge.0,
			charge_y: charge.1,
			count,
			indices,
			children: std::array::from_fn(|_| None),
		};

		if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
			return node;
		}

		let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
		for &index in &node.indices {
			let (x, y) = points[index];
			buckets[bounds.quadrant_for(x, y)].push(index);
		}

		// All points in one quadrant means splitting cannot make progress.
		let non_empty = buckets.iter().filter(|bucket| !bucket.is_empty()).count();
		if non_empty <= 1 {
			return node;
		}

		for (quadrant, bucket) in buckets.into_iter().enumerate() {
			if bucket.is_empty() {
				continue;
			}
			node.children[quadrant] = Some(Box::new(Self::build_node(
				bounds.child(quadrant),
				bucket,
				points,
				depth + 1,
			)));
		}
		node.indices.clear();
		node
	}

	fn is_leaf(&self) -> bool {
		self.children.iter().all(|child| child.is_none())
	}
}

/// Deterministic unit vector used to separate exactly coincident points.
pub fn separation_jiggle(a: usize, b: usize) -> (f64, f64) {
	let angle = ((a as f64) * 0.618_034 + (b as f64) * 0.414_214) * std::f64::consts::TAU;
	(angle.cos(), angle.sin())
}

fn repulsion_between(
	from: (f64, f64),
	to: (f64, f64),
	from_index: usize,
	to_index: usize,
	strength: f64,
	softening: f64,
) -> (f64, f64) {
	let delta = (from.0 - to.0, from.1 - to.1);
	let distance_sq = delta.0 * delta.0 + delta.1 * delta.1;
	let distance = distance_sq.sqrt();
	let direction = if distance > 1e-4 {
		(delta.0 / distance, delta.1 / distance)
	} else {
		separation_jiggle(from_index, to_index)
	};
	let magnitude = strength / (distance_sq + softening);
	(direction.0 * magnitude, direction.1 * magnitude)
}

/// Accumulates the repulsive force on `points[index]` from every other point,
/// walking the tree and substituting aggregate charges for distant cells.
/// `strength` is the (positive) repulsion magnitude per unit charge.
pub fn accumulate_repulsion(
	node: &QuadNode,
	index: usize,
	points: &[(f64, f64)],
	strength: f64,
	softening: f64,
	theta: f64,
	force: &mut (f64, f64),
) {
	if node.count <= 0.0 {
		return;
	}

	let point = points[index];

	if node.is_leaf() {
		for &other in &node.indices {
			if other == index {
				continue;
			}
			let (fx, fy) =
				repulsion_between(point, points[other], index, other, strength, softening);
			force.0 += fx;
			force.1 += fy;
		}
		return;
	}

	let delta = (point.0 - node.charge_x, point.1 - node.charge_y);
	let distance_sq = (delta.0 * delta.0 + delta.1 * delta.1).max(1e-4);
	let distance = distance_sq.sqrt();
	let can_approximate = !node.bounds.contains(point.0, point.1)
		&& (node.bounds.side_length() / distance) < theta
		&& node.count > 1.0;

	if can_approximate {
		let magnitude = (strength * node.count) / (distance_sq + softening);
		force.0 += (delta.0 / distance) * magnitude;
		force.1 += (delta.1 / distance) * magnitude;
		return;
	}

	for child in node.children.iter().flatten() {
		accumulate_repulsion(child, index, points, strength, softening, theta, force);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn aggregates_count_and_center_of_charge() {
		let points = vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)];
		let tree = QuadNode::build(&points).unwrap();

		assert_eq!(tree.count, 4.0);
		assert!((tree.charge_x - 5.0).abs() < 1e-9);
		assert!((tree.charge_y - 5.0).abs() < 1e-9);
	}

	#[test]
	fn empty_point_set_builds_nothing() {
		assert!(QuadNode::build(&[]).is_none());
	}

	#[test]
	fn pairwise_repulsion_is_equal_and_opposite() {
		let points = vec![(-10.0, 0.0), (10.0, 0.0)];
		let tree = QuadNode::build(&points).unwrap();

		let mut left = (0.0, 0.0);
		let mut right = (0.0, 0.0);
		accumulate_repulsion(&tree, 0, &points, 1000.0, 10.0, 1.0, &mut left);
		accumulate_repulsion(&tree, 1, &points, 1000.0, 10.0, 1.0, &mut right);

		assert!(left.0 < 0.0, "left point pushed further left");
		assert!(right.0 > 0.0, "right point pushed further right");
		assert!((left.0 + right.0).abs() < 1e-12);
		assert!((left.1 + right.1).abs() < 1e-12);
	}

	#[test]
	fn coincident_points_are_pushed_apart() {
		let points = vec![(5.0, 5.0), (5.0, 5.0)];
		let tree = QuadNode::build(&points).unwrap();

		let mut force = (0.0, 0.0);
		accumulate_repulsion(&tree, 0, &points, 1000.0, 10.0, 1.0, &mut force);
		let magnitude = (force.0 * force.0 + force.1 * force.1).sqrt();
		assert!(magnitude > 0.0, "softened floor still separates");
		assert!(magnitude.is_finite());
	}

	#[test]
	fn distant_cluster_approximation_tracks_exact_sum() {
		// A tight far-away cluster and one probe point: the aggregated force
		// should be close to summing the pairwise contributions.
		let mut points = vec![(0.0, 0.0)];
		for i in 0..16 {
			let angle = (i as f64) * std::f64::consts::TAU / 16.0;
			points.push((1000.0 + angle.cos(), angle.sin()));
		}
		let tree = QuadNode::build(&points).unwrap();

		let mut approximate = (0.0, 0.0);
		accumulate_repulsion(&tree, 0, &points, 1000.0, 10.0, 1.0, &mut approximate);

		let mut exact = (0.0, 0.0);
		for other in 1..points.len() {
			let (fx, fy) = repulsion_between(points[0], points[other], 0, other, 1000.0, 10.0);
			exact.0 += fx;
			exact.1 += fy;
		}

		assert!(approximate.0 < 0.0, "probe is pushed away from the cluster");
		let relative = (approximate.0 - exact.0).abs() / exact.0.abs();
		assert!(relative < 0.05, "approximation within 5%, got {relative}");
	}
}
