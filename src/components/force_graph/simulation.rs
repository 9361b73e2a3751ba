//! Velocity-Verlet force layout with an alpha energy schedule.
//!
//! Each tick moves `alpha` toward `alpha_target`, applies the charge
//! (Barnes-Hut over a [`QuadTree`]),
//! positioning, centering and link forces scaled by `alpha`, then
//! integrates velocities with a constant decay. A reheat sets a warm target
//! for [`WARM_TICKS`] ticks; afterwards the target drops to zero and the
//! simulation stops once `alpha` falls under [`ALPHA_MIN`].

use std::f64::consts::PI;

use log::debug;
use petgraph::graph::NodeIndex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::model::{LinkGraph, Node};
use super::quadtree::QuadTree;

/// Target energy after a structural change or a refresh.
pub const WARM_TARGET: f64 = 0.3;
/// Target energy while a node is dragged.
pub const DRAG_TARGET: f64 = 0.2;
/// Ticks a reheat keeps its target before cooling down.
pub const WARM_TICKS: u32 = 180;
pub const ALPHA_MIN: f64 = 0.001;

const VELOCITY_DECAY: f64 = 0.4;
const CHARGE_STRENGTH: f64 = -30.0;
/// Barnes-Hut opening criterion for the charge force.
const THETA: f64 = 0.9;
const POSITION_STRENGTH: f64 = 0.1;
const INITIAL_RADIUS: f64 = 10.0;
const JIGGLE_SEED: u64 = 0x5eed;

pub struct Simulation {
	graph: LinkGraph,
	alpha: f64,
	alpha_target: f64,
	alpha_decay: f64,
	center: (f64, f64),
	distance: f64,
	strength: f64,
	/// Per-link share of the correction applied to the target node.
	bias: Vec<f64>,
	running: bool,
	warm_ticks: u32,
	held: bool,
	rng: SmallRng,
}

impl Simulation {
	pub fn new(center_x: f64, center_y: f64) -> Self {
		Self {
			graph: LinkGraph::default(),
			alpha: 1.0,
			alpha_target: 0.0,
			alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
			center: (center_x, center_y),
			distance: 30.0,
			strength: 1.0,
			bias: Vec::new(),
			running: false,
			warm_ticks: 0,
			held: false,
			rng: SmallRng::seed_from_u64(JIGGLE_SEED),
		}
	}

	/// Replace the bound graph; the previous one is dropped.
	pub fn bind(&mut self, mut graph: LinkGraph, distance: f64, strength: f64) {
		let (cx, cy) = self.center;
		let golden = PI * (3.0 - 5f64.sqrt());
		for (i, node) in graph.node_weights_mut().enumerate() {
			if node.x.is_nan() || node.y.is_nan() {
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * golden;
				node.x = cx + radius * angle.cos();
				node.y = cy + radius * angle.sin();
			}
			if node.vx.is_nan() || node.vy.is_nan() {
				node.vx = 0.0;
				node.vy = 0.0;
			}
		}

		self.bias = graph
			.edge_indices()
			.filter_map(|e| graph.edge_endpoints(e))
			.map(|(s, t)| {
				let (ds, dt) = (graph.edges(s).count() as f64, graph.edges(t).count() as f64);
				ds / (ds + dt)
			})
			.collect();
		self.graph = graph;
		self.distance = distance;
		self.strength = strength;
		self.alpha = 1.0;
		self.alpha_target = 0.0;
		self.warm_ticks = 0;
		self.held = false;
		self.running = true;
		debug!("simulation bound to {} nodes", self.graph.node_count());
	}

	pub fn graph(&self) -> &LinkGraph {
		&self.graph
	}

	pub fn graph_mut(&mut self) -> &mut LinkGraph {
		&mut self.graph
	}

	pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
		self.graph.node_weights_mut()
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn link_distance(&self) -> f64 {
		self.distance
	}

	pub fn set_link_distance(&mut self, distance: f64) {
		self.distance = distance;
	}

	pub fn center(&self) -> (f64, f64) {
		self.center
	}

	pub fn set_center(&mut self, x: f64, y: f64) {
		self.center = (x, y);
	}

	/// Restart with a warm `target` that cools down after [`WARM_TICKS`].
	pub fn reheat(&mut self, target: f64) {
		self.alpha_target = target;
		self.warm_ticks = WARM_TICKS;
		self.running = true;
	}

	/// Reheat only if the simulation is colder than `target`.
	pub fn nudge(&mut self, target: f64) {
		if self.running && self.alpha_target >= target {
			return;
		}
		self.reheat(target);
	}

	/// Restart toward rest.
	pub fn cool(&mut self) {
		self.alpha_target = 0.0;
		self.warm_ticks = 0;
		self.running = true;
	}

	/// Keep the current target until released.
	pub fn hold(&mut self) {
		self.held = true;
	}

	pub fn release(&mut self) {
		self.held = false;
		self.alpha_target = 0.0;
		self.warm_ticks = 0;
	}

	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Nearest node within `radius` of `(x, y)`.
	pub fn find(&self, x: f64, y: f64, radius: f64) -> Option<NodeIndex> {
		let mut best = radius * radius;
		let mut found = None;
		for idx in self.graph.node_indices() {
			let node = &self.graph[idx];
			let (dx, dy) = (x - node.x, y - node.y);
			let d2 = dx * dx + dy * dy;
			if d2 < best {
				best = d2;
				found = Some(idx);
			}
		}
		found
	}

	/// Advance one step. Returns `false` once the simulation is at rest.
	pub fn tick(&mut self) -> bool {
		if !self.running {
			return false;
		}
		if !self.held && self.warm_ticks > 0 {
			self.warm_ticks -= 1;
			if self.warm_ticks == 0 {
				self.alpha_target = 0.0;
			}
		}
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

		self.apply_charge();
		self.apply_position();
		self.apply_center();
		self.apply_links();

		for node in self.graph.node_weights_mut() {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= 1.0 - VELOCITY_DECAY;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= 1.0 - VELOCITY_DECAY;
					node.y += node.vy;
				}
			}
		}

		if self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN {
			self.running = false;
			debug!("simulation settled");
		}
		true
	}

	fn jiggle(&mut self) -> f64 {
		(self.rng.random::<f64>() - 0.5) * 1e-6
	}

	fn apply_charge(&mut self) {
		let positions: Vec<(f64, f64)> = self.graph.node_weights().map(|n| (n.x, n.y)).collect();
		let tree = QuadTree::new(&positions);
		let strength = CHARGE_STRENGTH * self.alpha;
		for (i, node) in self.graph.node_weights_mut().enumerate() {
			let (dvx, dvy) = tree.charge(i, strength, THETA, &mut self.rng);
			node.vx += dvx;
			node.vy += dvy;
		}
	}

	fn apply_position(&mut self) {
		let ((cx, cy), k) = (self.center, POSITION_STRENGTH * self.alpha);
		for node in self.graph.node_weights_mut() {
			node.vx += (cx - node.x) * k;
			node.vy += (cy - node.y) * k;
		}
	}

	fn apply_center(&mut self) {
		let n = self.graph.node_count();
		if n == 0 {
			return;
		}
		let (sx, sy) = self
			.graph
			.node_weights()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let (shift_x, shift_y) = (sx / n as f64 - self.center.0, sy / n as f64 - self.center.1);
		for node in self.graph.node_weights_mut() {
			node.x -= shift_x;
			node.y -= shift_y;
		}
	}

	fn apply_links(&mut self) {
		let edges: Vec<_> = self.graph.edge_indices().collect();
		for e in edges {
			let Some((s, t)) = self.graph.edge_endpoints(e) else {
				continue;
			};
			if s == t {
				continue;
			}
			let (src, tgt) = (&self.graph[s], &self.graph[t]);
			let mut dx = tgt.x + tgt.vx - src.x - src.vx;
			let mut dy = tgt.y + tgt.vy - src.y - src.vy;
			if dx == 0.0 || dx.is_nan() {
				dx = self.jiggle();
			}
			if dy == 0.0 || dy.is_nan() {
				dy = self.jiggle();
			}
			let l = (dx * dx + dy * dy).sqrt();
			let k = (l - self.distance) / l * self.alpha * self.strength;
			let (dx, dy) = (dx * k, dy * k);
			let b = self.bias.get(e.index()).copied().unwrap_or(0.5);

			let target = &mut self.graph[t];
			target.vx -= dx * b;
			target.vy -= dy * b;
			let source = &mut self.graph[s];
			source.vx += dx * (1.0 - b);
			source.vy += dy * (1.0 - b);
		}
	}
}
