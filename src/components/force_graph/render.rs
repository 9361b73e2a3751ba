use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use web_sys::CanvasRenderingContext2d;

use super::state::SurfaceState;

/// Baseline of the title text, in device pixels from the top.
pub const TITLE_OFFSET: f64 = 60.0;
/// Gap between a node body and its label.
const LABEL_GAP: f64 = 2.0;

/// The drawing calls the render loop needs from a 2D canvas.
pub trait Canvas2d {
	fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64);
	fn save(&self);
	fn restore(&self);
	fn begin_path(&self);
	fn move_to(&self, x: f64, y: f64);
	fn line_to(&self, x: f64, y: f64);
	fn arc(&self, x: f64, y: f64, radius: f64, start: f64, end: f64);
	fn fill(&self);
	fn stroke(&self);
	fn fill_text(&self, text: &str, x: f64, y: f64);
	fn set_fill_style(&self, style: &str);
	fn set_stroke_style(&self, style: &str);
	fn set_line_width(&self, width: f64);
	fn set_font(&self, font: &str);
	fn set_text_align(&self, align: &str);
	fn set_text_baseline(&self, baseline: &str);
}

impl Canvas2d for CanvasRenderingContext2d {
	fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64) {
		CanvasRenderingContext2d::clear_rect(self, x, y, w, h);
	}

	fn save(&self) {
		CanvasRenderingContext2d::save(self);
	}

	fn restore(&self) {
		CanvasRenderingContext2d::restore(self);
	}

	fn begin_path(&self) {
		CanvasRenderingContext2d::begin_path(self);
	}

	fn move_to(&self, x: f64, y: f64) {
		CanvasRenderingContext2d::move_to(self, x, y);
	}

	fn line_to(&self, x: f64, y: f64) {
		CanvasRenderingContext2d::line_to(self, x, y);
	}

	fn arc(&self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
		// only fails for a negative radius, which draws nothing either way
		let _ = CanvasRenderingContext2d::arc(self, x, y, radius, start, end);
	}

	fn fill(&self) {
		CanvasRenderingContext2d::fill(self);
	}

	fn stroke(&self) {
		CanvasRenderingContext2d::stroke(self);
	}

	fn fill_text(&self, text: &str, x: f64, y: f64) {
		let _ = CanvasRenderingContext2d::fill_text(self, text, x, y);
	}

	fn set_fill_style(&self, style: &str) {
		self.set_fill_style_str(style);
	}

	fn set_stroke_style(&self, style: &str) {
		self.set_stroke_style_str(style);
	}

	fn set_line_width(&self, width: f64) {
		CanvasRenderingContext2d::set_line_width(self, width);
	}

	fn set_font(&self, font: &str) {
		CanvasRenderingContext2d::set_font(self, font);
	}

	fn set_text_align(&self, align: &str) {
		CanvasRenderingContext2d::set_text_align(self, align);
	}

	fn set_text_baseline(&self, baseline: &str) {
		CanvasRenderingContext2d::set_text_baseline(self, baseline);
	}
}

/// Node outline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
	#[default]
	Circle,
	Triangle,
	Rectangle,
	Diamond,
}

impl Shape {
	/// Add the outline of a node of visual size `r` at `(x, y)` to the path.
	pub fn trace(self, ctx: &impl Canvas2d, x: f64, y: f64, r: f64) {
		match self {
			Shape::Circle => {
				ctx.move_to(x + r, y);
				ctx.arc(x, y, r, 0.0, 2.0 * PI);
			}
			Shape::Triangle => {
				ctx.move_to(x, y - r * 1.15);
				ctx.line_to(x + r, y + r * 0.577);
				ctx.line_to(x - r, y + r * 0.577);
				ctx.line_to(x, y - r * 1.15);
			}
			Shape::Rectangle => {
				ctx.move_to(x - r, y - r);
				ctx.line_to(x + r, y - r);
				ctx.line_to(x + r, y + r);
				ctx.line_to(x - r, y + r);
				ctx.line_to(x - r, y - r);
			}
			Shape::Diamond => {
				ctx.move_to(x, y - r);
				ctx.line_to(x + r, y);
				ctx.line_to(x, y + r);
				ctx.line_to(x - r, y);
				ctx.line_to(x, y - r);
			}
		}
	}
}

/// Draw one frame of the surface.
pub fn render(state: &SurfaceState, ctx: &impl Canvas2d) {
	ctx.clear_rect(0.0, 0.0, state.width, state.height);
	let Some(config) = state.configs.current() else {
		return;
	};
	let ratio = state.ratio;
	let graph = state.simulation.graph();
	ctx.save();

	ctx.set_stroke_style(&config.rgba.edge);
	for bucket in config.partition.buckets() {
		ctx.begin_path();
		ctx.set_line_width(bucket.width * config.edge_scale * ratio);
		for &link in &bucket.links {
			if let Some((s, t)) = graph.edge_endpoints(link) {
				ctx.move_to(graph[s].x, graph[s].y);
				ctx.line_to(graph[t].x, graph[t].y);
			}
		}
		ctx.stroke();
	}

	ctx.set_font(&config.label_font);
	ctx.set_line_width(config.node_border_width * ratio);
	ctx.set_stroke_style(&config.rgba.node);
	ctx.set_text_align("start");
	ctx.set_text_baseline("middle");
	let viewport = state.viewport();
	for node in graph.node_weights() {
		let (x, y) = viewport.clip(node.x, node.y);
		ctx.begin_path();
		config.node_shape.trace(ctx, x, y, node.vsize);
		ctx.set_fill_style(&node.fill);
		ctx.fill();
		ctx.stroke();

		ctx.set_fill_style(&config.rgba.label);
		ctx.fill_text(&node.label, x + node.vsize + LABEL_GAP, y);
	}

	ctx.set_text_align("center");
	ctx.set_font(&config.title_font(ratio));
	ctx.fill_text(&config.title, state.width / 2.0, TITLE_OFFSET);
	ctx.restore();
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use serde_json::json;

	use super::super::types::GraphData;
	use super::*;

	#[derive(Clone, Debug, PartialEq)]
	pub enum Op {
		Clear,
		Begin,
		Move(f64, f64),
		Line(f64, f64),
		Arc(f64, f64, f64),
		Fill(String),
		Stroke(String, f64),
		Text(String, f64, f64),
		Other,
	}

	/// Records path operations with the styles in effect.
	#[derive(Default)]
	pub struct Recorder {
		pub ops: RefCell<Vec<Op>>,
		fill: RefCell<String>,
		stroke: RefCell<String>,
		width: RefCell<f64>,
	}

	impl Recorder {
		fn push(&self, op: Op) {
			self.ops.borrow_mut().push(op);
		}
	}

	impl Canvas2d for Recorder {
		fn clear_rect(&self, _: f64, _: f64, _: f64, _: f64) {
			self.push(Op::Clear);
		}
		fn save(&self) {
			self.push(Op::Other);
		}
		fn restore(&self) {
			self.push(Op::Other);
		}
		fn begin_path(&self) {
			self.push(Op::Begin);
		}
		fn move_to(&self, x: f64, y: f64) {
			self.push(Op::Move(x, y));
		}
		fn line_to(&self, x: f64, y: f64) {
			self.push(Op::Line(x, y));
		}
		fn arc(&self, x: f64, y: f64, radius: f64, _: f64, _: f64) {
			self.push(Op::Arc(x, y, radius));
		}
		fn fill(&self) {
			self.push(Op::Fill(self.fill.borrow().clone()));
		}
		fn stroke(&self) {
			self.push(Op::Stroke(self.stroke.borrow().clone(), *self.width.borrow()));
		}
		fn fill_text(&self, text: &str, x: f64, y: f64) {
			self.push(Op::Text(text.to_owned(), x, y));
		}
		fn set_fill_style(&self, style: &str) {
			*self.fill.borrow_mut() = style.to_owned();
		}
		fn set_stroke_style(&self, style: &str) {
			*self.stroke.borrow_mut() = style.to_owned();
		}
		fn set_line_width(&self, width: f64) {
			*self.width.borrow_mut() = width;
		}
		fn set_font(&self, _: &str) {}
		fn set_text_align(&self, _: &str) {}
		fn set_text_baseline(&self, _: &str) {}
	}

	fn surface(shape: &str) -> SurfaceState {
		let data: GraphData = serde_json::from_value(json!({
			"nodes": { "id": ["A", "B"], "size": [4, 4], "label": ["a", "b"], "color": [1, null] },
			"links": { "source": ["A"], "target": ["B"], "weight": [2.0] },
			"options": { "nodeShape": shape, "title": "Net" },
		}))
		.unwrap();
		let mut state = SurfaceState::new("s", 800.0, 600.0, 1.0);
		state.construct(&data).unwrap();
		state
	}

	#[test]
	fn triangle_outline_is_flat_bottomed() {
		let ctx = Recorder::default();
		Shape::Triangle.trace(&ctx, 10.0, 20.0, 4.0);
		assert_eq!(
			*ctx.ops.borrow(),
			vec![
				Op::Move(10.0, 20.0 - 4.0 * 1.15),
				Op::Line(14.0, 20.0 + 4.0 * 0.577),
				Op::Line(6.0, 20.0 + 4.0 * 0.577),
				Op::Line(10.0, 20.0 - 4.0 * 1.15),
			]
		);
	}

	#[test]
	fn circle_starts_on_the_rim() {
		let ctx = Recorder::default();
		Shape::Circle.trace(&ctx, 0.0, 0.0, 3.0);
		assert_eq!(*ctx.ops.borrow(), vec![Op::Move(3.0, 0.0), Op::Arc(0.0, 0.0, 3.0)]);
	}

	#[test]
	fn links_are_stroked_per_bucket_width() {
		let state = surface("circle");
		let ctx = Recorder::default();
		render(&state, &ctx);
		let strokes: Vec<_> = ctx
			.ops
			.borrow()
			.iter()
			.filter_map(|op| match op {
				Op::Stroke(style, width) if style.starts_with("rgba(128,128,128,0.6") => Some(*width),
				_ => None,
			})
			.collect();
		// missing bucket plus five numeric buckets
		assert_eq!(strokes.len(), 6);
		assert_eq!(strokes[0], 0.1);
		assert_eq!(strokes[1], 2.0);
	}

	#[test]
	fn nodes_are_clipped_only_when_drawn() {
		let mut state = surface("rectangle");
		let a = state.simulation.graph_mut().node_weights_mut().next().unwrap();
		a.x = 5000.0;
		a.y = -40.0;
		let ctx = Recorder::default();
		render(&state, &ctx);
		assert!(ctx.ops.borrow().contains(&Op::Move(740.0 - 4.0, 100.0 - 4.0)));
		assert!(ctx.ops.borrow().contains(&Op::Text("a".into(), 740.0 + 4.0 + 2.0, 100.0)));
		let a = state.simulation.graph().node_weights().next().unwrap();
		assert_eq!((a.x, a.y), (5000.0, -40.0));
	}

	#[test]
	fn fills_and_title() {
		let state = surface("diamond");
		let ctx = Recorder::default();
		render(&state, &ctx);
		let ops = ctx.ops.borrow();
		assert_eq!(ops[0], Op::Clear);
		assert!(ops.contains(&Op::Fill("rgb(255, 222, 226)".into())));
		assert!(ops.contains(&Op::Fill("rgba(255,255,255,0.6)".into())));
		assert!(ops.contains(&Op::Text("Net".into(), 400.0, TITLE_OFFSET)));
	}
}
