use log::debug;
use petgraph::graph::NodeIndex;

use super::simulation::DRAG_TARGET;
use super::state::SurfaceState;

/// Pick distance around the pointer, in device pixels.
pub const DRAG_RADIUS: f64 = 20.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragState {
	#[default]
	Idle,
	Dragging(NodeIndex),
}

/// Pointer handlers. Coordinates are CSS pixels relative to the canvas.
impl SurfaceState {
	/// Pin the node under the pointer, if any, and start dragging it.
	pub fn drag_start(&mut self, px: f64, py: f64) -> Option<NodeIndex> {
		let (x, y) = (px * self.ratio, py * self.ratio);
		let idx = self.simulation.find(x, y, DRAG_RADIUS)?;
		self.simulation.nudge(DRAG_TARGET);
		self.simulation.hold();
		let node = &mut self.simulation.graph_mut()[idx];
		node.fx = Some(node.x);
		node.fy = Some(node.y);
		debug!("dragging `{}`", node.id);
		self.drag = DragState::Dragging(idx);
		Some(idx)
	}

	pub fn drag_move(&mut self, px: f64, py: f64) {
		let DragState::Dragging(idx) = self.drag else {
			return;
		};
		let (x, y) = self.viewport().clip(px * self.ratio, py * self.ratio);
		if let Some(node) = self.simulation.graph_mut().node_weight_mut(idx) {
			node.fx = Some(x);
			node.fy = Some(y);
		}
	}

	/// Release the dragged node back to the simulation.
	pub fn drag_end(&mut self) {
		let DragState::Dragging(idx) = std::mem::take(&mut self.drag) else {
			return;
		};
		if let Some(node) = self.simulation.graph_mut().node_weight_mut(idx) {
			node.fx = None;
			node.fy = None;
		}
		self.simulation.release();
	}
}
