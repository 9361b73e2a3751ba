//! Barnes-Hut quadtree for the many-body force.
//!
//! Every body carries the same charge, so a cell is summarized by its body
//! count and centroid. Cells far enough away, relative to their width, act
//! as one body placed at the centroid.

use rand::Rng;
use rand::rngs::SmallRng;

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Squared distance under which the force stops growing quadratically.
const DISTANCE_MIN2: f64 = 1.0;

#[derive(Clone, Copy, Debug)]
struct Bounds {
	cx: f64,
	cy: f64,
	half: f64,
}

impl Bounds {
	fn around(points: &[(f64, f64)]) -> Option<Self> {
		if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
			return None;
		}
		let (mut x0, mut y0, mut x1, mut y1) = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
		for &(x, y) in points {
			x0 = x0.min(x);
			y0 = y0.min(y);
			x1 = x1.max(x);
			y1 = y1.max(y);
		}
		if !x0.is_finite() {
			return None;
		}
		let span = (x1 - x0).max(y1 - y0).max(1.0);
		Some(Self {
			cx: (x0 + x1) / 2.0,
			cy: (y0 + y1) / 2.0,
			half: span / 2.0 + 1.0,
		})
	}

	fn contains(self, (x, y): (f64, f64)) -> bool {
		(x - self.cx).abs() <= self.half && (y - self.cy).abs() <= self.half
	}

	fn quadrant(self, (x, y): (f64, f64)) -> usize {
		usize::from(x >= self.cx) + 2 * usize::from(y >= self.cy)
	}

	fn child(self, quadrant: usize) -> Self {
		let q = self.half / 2.0;
		let dx = if quadrant & 1 == 1 { q } else { -q };
		let dy = if quadrant & 2 == 2 { q } else { -q };
		Self {
			cx: self.cx + dx,
			cy: self.cy + dy,
			half: q,
		}
	}

	fn width(self) -> f64 {
		self.half * 2.0
	}
}

#[derive(Debug)]
struct Cell {
	bounds: Bounds,
	centroid: (f64, f64),
	count: f64,
	/// Bodies held directly; empty once the cell is split.
	bodies: Vec<usize>,
	children: [Option<Box<Cell>>; 4],
}

impl Cell {
	fn build(bounds: Bounds, bodies: Vec<usize>, points: &[(f64, f64)], depth: usize) -> Self {
		let (sx, sy) = bodies
			.iter()
			.fold((0.0, 0.0), |(sx, sy), &i| (sx + points[i].0, sy + points[i].1));
		let count = bodies.len() as f64;
		let mut cell = Self {
			bounds,
			centroid: (sx / count, sy / count),
			count,
			bodies,
			children: Default::default(),
		};
		if depth >= MAX_DEPTH || cell.bodies.len() <= LEAF_CAPACITY {
			return cell;
		}

		let mut split: [Vec<usize>; 4] = Default::default();
		for &i in &cell.bodies {
			split[bounds.quadrant(points[i])].push(i);
		}
		if split.iter().filter(|s| !s.is_empty()).count() <= 1 {
			return cell;
		}
		for (quadrant, bodies) in split.into_iter().enumerate() {
			if !bodies.is_empty() {
				cell.children[quadrant] = Some(Box::new(Self::build(bounds.child(quadrant), bodies, points, depth + 1)));
			}
		}
		cell.bodies.clear();
		cell
	}

	fn is_leaf(&self) -> bool {
		self.children.iter().all(Option::is_none)
	}
}

fn jiggle(rng: &mut SmallRng) -> f64 {
	(rng.random::<f64>() - 0.5) * 1e-6
}

/// Velocity change on a body at offset `(dx, dy)` from a charge of `weight`.
fn pull(mut dx: f64, mut dy: f64, weight: f64, rng: &mut SmallRng) -> (f64, f64) {
	if dx == 0.0 {
		dx = jiggle(rng);
	}
	if dy == 0.0 {
		dy = jiggle(rng);
	}
	let mut l = dx * dx + dy * dy;
	if l < DISTANCE_MIN2 {
		l = (DISTANCE_MIN2 * l).sqrt();
	}
	let w = weight / l;
	(dx * w, dy * w)
}

/// Spatial index over a snapshot of body positions.
pub struct QuadTree<'a> {
	points: &'a [(f64, f64)],
	root: Option<Cell>,
}

impl<'a> QuadTree<'a> {
	/// `None` root when any position is not finite; no force is applied then.
	pub fn new(points: &'a [(f64, f64)]) -> Self {
		let root = Bounds::around(points).map(|b| Cell::build(b, (0..points.len()).collect(), points, 0));
		Self { points, root }
	}

	/// Velocity change on body `index` from every other body, each carrying
	/// `strength`. Cells whose width over distance is below `theta` are
	/// approximated by their centroid; `theta = 0` is exact.
	pub fn charge(&self, index: usize, strength: f64, theta: f64, rng: &mut SmallRng) -> (f64, f64) {
		let mut dv = (0.0, 0.0);
		if let Some(root) = &self.root {
			self.visit(root, index, strength, theta * theta, rng, &mut dv);
		}
		dv
	}

	fn visit(&self, cell: &Cell, index: usize, strength: f64, theta2: f64, rng: &mut SmallRng, dv: &mut (f64, f64)) {
		let p = self.points[index];
		if cell.is_leaf() {
			for &other in &cell.bodies {
				if other == index {
					continue;
				}
				let q = self.points[other];
				let (ax, ay) = pull(q.0 - p.0, q.1 - p.1, strength, rng);
				dv.0 += ax;
				dv.1 += ay;
			}
			return;
		}

		let (dx, dy) = (cell.centroid.0 - p.0, cell.centroid.1 - p.1);
		let l = dx * dx + dy * dy;
		let w = cell.bounds.width();
		if !cell.bounds.contains(p) && w * w / theta2 < l {
			let (ax, ay) = pull(dx, dy, strength * cell.count, rng);
			dv.0 += ax;
			dv.1 += ay;
			return;
		}
		for child in cell.children.iter().flatten() {
			self.visit(child, index, strength, theta2, rng, dv);
		}
	}
}
