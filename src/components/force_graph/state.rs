use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::{debug, info};
use web_sys::HtmlCanvasElement;

use super::config::{Config, ConfigStore};
use super::error::{ForceGraphError, Result};
use super::interaction::DragState;
use super::model::build_graph;
use super::partition::partition;
use super::simulation::{Simulation, WARM_TARGET};
use super::types::{GraphData, Inbound, UpdateMessage};

/// Buckets used after construction and `process_map` updates.
pub const MAP_BUCKETS: usize = 5;
/// Buckets used after `process_net` updates.
pub const NET_BUCKETS: usize = 1;

/// Margins kept free around the drawn nodes, in device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Padding {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

impl Default for Padding {
	fn default() -> Self {
		Self {
			top: 100.0,
			right: 60.0,
			bottom: 40.0,
			left: 40.0,
		}
	}
}

/// The padded drawing area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

impl Viewport {
	pub fn clip(&self, x: f64, y: f64) -> (f64, f64) {
		let x = if x < self.left {
			self.left
		} else if x > self.right {
			self.right
		} else {
			x
		};
		let y = if y < self.top {
			self.top
		} else if y > self.bottom {
			self.bottom
		} else {
			y
		};
		(x, y)
	}
}

/// Everything bound to one rendering target.
pub struct SurfaceState {
	pub id: String,
	/// Canvas size in device pixels.
	pub width: f64,
	pub height: f64,
	pub ratio: f64,
	pub padding: Padding,
	pub configs: ConfigStore,
	pub simulation: Simulation,
	pub drag: DragState,
	canvas: Option<HtmlCanvasElement>,
}

impl SurfaceState {
	pub fn new(id: impl Into<String>, width: f64, height: f64, ratio: f64) -> Self {
		Self {
			id: id.into(),
			width,
			height,
			ratio,
			padding: Padding::default(),
			configs: ConfigStore::default(),
			simulation: Simulation::new(width / 2.0, height / 2.0),
			drag: DragState::default(),
			canvas: None,
		}
	}

	pub fn with_canvas(mut self, canvas: HtmlCanvasElement) -> Self {
		self.canvas = Some(canvas);
		self
	}

	pub fn canvas(&self) -> Option<&HtmlCanvasElement> {
		self.canvas.as_ref()
	}

	pub fn viewport(&self) -> Viewport {
		Viewport {
			top: self.padding.top,
			right: self.width - self.padding.right,
			bottom: self.height - self.padding.bottom,
			left: self.padding.left,
		}
	}

	/// Adopt a new canvas size and pixel ratio, re-deriving every
	/// ratio-scaled value of the active config.
	pub fn resize(&mut self, width: f64, height: f64, ratio: f64) {
		self.width = width;
		self.height = height;
		self.ratio = ratio;
		if let Some(config) = self.configs.current_mut() {
			config.refresh_label_font(ratio);
			for node in self.simulation.nodes_mut() {
				node.vsize = config.node_scale * node.size * ratio;
			}
			self.simulation.set_link_distance(config.distance * ratio);
		}
		self.simulation.set_center(width / 2.0, height / 2.0);
		self.simulation.cool();
	}

	/// Route a host message to `construct` or `update`.
	pub fn render_value(&mut self, inbound: &Inbound) -> Result<()> {
		match inbound {
			Inbound::Data(data) => self.construct(data),
			Inbound::Update(message) => self.update(message),
		}
	}

	/// Bind a new dataset, replacing the previous nodes and links.
	pub fn construct(&mut self, data: &GraphData) -> Result<()> {
		let ratio = self.ratio;
		let mut graph = build_graph(data)?;
		let config = self.configs.get_config(data, ratio)?;
		config.refresh_label_font(ratio);

		for node in graph.node_weights_mut() {
			node.vsize = config.node_scale * node.size * ratio;
			node.fill = config
				.scalers
				.resolve(config.node_scheme, node.color, node.scheme);
		}
		config.partition = partition(
			graph.edge_indices().map(|e| (e, graph[e].weight)),
			MAP_BUCKETS,
			config.na_width,
		);

		self.simulation.stop();
		self.simulation
			.bind(graph, config.distance * ratio, config.strength);
		self.simulation.reheat(WARM_TARGET);
		self.drag = DragState::default();
		info!("surface `{}` constructed", self.id);
		Ok(())
	}

	/// Switch the active series named by a 1-based index into `seriesData`.
	pub fn update(&mut self, message: &UpdateMessage) -> Result<()> {
		let config = self.configs.current_mut().ok_or(ForceGraphError::NoConfig)?;
		let Some(series) = config.series_data.clone() else {
			debug!("update ignored, no series configured");
			return Ok(());
		};

		let map = message
			.process_map
			.as_deref()
			.map(|raw| series_name(&series, raw))
			.transpose()?;
		let net = message
			.process_net
			.as_deref()
			.map(|raw| series_name(&series, raw))
			.transpose()?;
		if let Some(name) = map {
			apply_series(config, &mut self.simulation, name, true, MAP_BUCKETS);
		}
		if let Some(name) = net {
			apply_series(config, &mut self.simulation, name, false, NET_BUCKETS);
		}
		Ok(())
	}

	/// Advance the layout one step; `false` when at rest.
	pub fn tick(&mut self) -> bool {
		self.simulation.tick()
	}
}

fn series_name<'a>(series: &'a [String], raw: &str) -> Result<&'a str> {
	raw.trim()
		.parse::<usize>()
		.ok()
		.and_then(|n| n.checked_sub(1))
		.and_then(|i| series.get(i))
		.map(String::as_str)
		.ok_or_else(|| {
			ForceGraphError::Configuration(format!(
				"series index `{raw}` is outside 1..={}",
				series.len()
			))
		})
}

fn apply_series(
	config: &mut Config,
	simulation: &mut Simulation,
	name: &str,
	with_scheme: bool,
	buckets: usize,
) {
	debug!("switching to series `{name}`");
	for node in simulation.nodes_mut() {
		node.select_series(name, with_scheme);
	}
	refill(config, simulation);

	let graph = simulation.graph_mut();
	for link in graph.edge_weights_mut() {
		link.select_series(name);
	}
	config.partition = partition(
		graph.edge_indices().map(|e| (e, graph[e].weight)),
		buckets,
		config.na_width,
	);
	simulation.reheat(WARM_TARGET);
}

/// Recompute every node fill from its color value.
pub(super) fn refill(config: &Config, simulation: &mut Simulation) {
	for node in simulation.nodes_mut() {
		node.fill = config
			.scalers
			.resolve(config.node_scheme, node.color, node.scheme);
	}
}

/// Surfaces by identifier.
#[derive(Default)]
pub struct SurfaceRegistry {
	surfaces: HashMap<String, SurfaceState>,
}

impl SurfaceRegistry {
	/// Register a surface, replacing any previous one with the same id.
	pub fn create(&mut self, state: SurfaceState) -> &mut SurfaceState {
		info!("surface `{}` created", state.id);
		match self.surfaces.entry(state.id.clone()) {
			Entry::Occupied(mut entry) => {
				entry.insert(state);
				entry.into_mut()
			}
			Entry::Vacant(entry) => entry.insert(state),
		}
	}

	pub fn contains(&self, id: &str) -> bool {
		self.surfaces.contains_key(id)
	}

	pub fn get(&self, id: &str) -> Option<&SurfaceState> {
		self.surfaces.get(id)
	}

	pub fn get_mut(&mut self, id: &str) -> Option<&mut SurfaceState> {
		self.surfaces.get_mut(id)
	}

	pub fn teardown(&mut self, id: &str) -> Option<SurfaceState> {
		let removed = self.surfaces.remove(id);
		if removed.is_some() {
			info!("surface `{id}` torn down");
		}
		removed
	}

	pub fn len(&self) -> usize {
		self.surfaces.len()
	}

	pub fn is_empty(&self) -> bool {
		self.surfaces.is_empty()
	}
}

thread_local! {
	static SURFACES: RefCell<SurfaceRegistry> = RefCell::new(SurfaceRegistry::default());
}

/// Run `f` against the registry of this thread.
pub fn with_registry<R>(f: impl FnOnce(&mut SurfaceRegistry) -> R) -> R {
	SURFACES.with_borrow_mut(f)
}

/// Run `f` against a registered surface.
pub fn with_surface<R>(id: &str, f: impl FnOnce(&mut SurfaceState) -> R) -> Option<R> {
	with_registry(|registry| registry.get_mut(id).map(f))
}

#[cfg(test)]
mod tests {
	use petgraph::graph::{EdgeIndex, NodeIndex};
	use serde_json::json;

	use super::super::scale::PaletteId;
	use super::*;

	fn series_data() -> GraphData {
		serde_json::from_value(json!({
			"nodes": {
				"id": ["A", "B", "C"],
				"size": [1, 2, 3],
				"color": [0.5, null, -0.5],
				"color.s1": [0.5, null, -0.5],
				"color.s2": [-1, 1, null],
				"scheme.s2": ["Neg", "Pos", "Pos"],
			},
			"links": {
				"source": ["A", "A"],
				"target": ["B", "C"],
				"weight": [0.1, null],
				"weight.s1": [0.1, null],
				"weight.s2": [null, 3.0],
			},
			"options": { "seriesData": ["s1", "s2"] },
		}))
		.unwrap()
	}

	fn surface() -> SurfaceState {
		let mut state = SurfaceState::new("graph", 1000.0, 800.0, 2.0);
		state.construct(&series_data()).unwrap();
		state
	}

	#[test]
	fn construct_derives_visuals_and_buckets() {
		let state = surface();
		let graph = state.simulation.graph();
		assert_eq!(graph[NodeIndex::new(2)].vsize, 6.0);
		assert_eq!(graph[NodeIndex::new(1)].fill, "rgba(255,255,255,0.6)");
		let config = state.configs.current().unwrap();
		assert_eq!(config.partition.len(), 6);
		assert_eq!(
			config.partition.missing().unwrap().links,
			vec![EdgeIndex::new(1)]
		);
		assert_eq!(state.simulation.link_distance(), 800.0);
		assert!(state.simulation.is_running());
	}

	#[test]
	fn process_map_switches_series() {
		let mut state = surface();
		state
			.update(&UpdateMessage {
				process_map: Some("2".into()),
				process_net: None,
			})
			.unwrap();
		let graph = state.simulation.graph();
		let config = state.configs.current().unwrap();
		assert_eq!(graph[NodeIndex::new(0)].color, Some(-1.0));
		assert_eq!(graph[NodeIndex::new(0)].fill, config.scalers.get(PaletteId::Linear2).color(-1.0));
		assert_eq!(graph[NodeIndex::new(2)].fill, "rgba(255,255,255,0.6)");
		assert_eq!(graph[EdgeIndex::new(1)].weight, Some(3.0));
		assert_eq!(config.partition.len(), MAP_BUCKETS + 1);
		assert_eq!(
			config.partition.missing().unwrap().links,
			vec![EdgeIndex::new(0)]
		);
	}

	#[test]
	fn process_net_uses_single_bucket() {
		let mut state = surface();
		state
			.update(&UpdateMessage {
				process_map: None,
				process_net: Some("2".into()),
			})
			.unwrap();
		let graph = state.simulation.graph();
		assert_eq!(graph[NodeIndex::new(0)].scheme, None);
		assert_eq!(state.configs.current().unwrap().partition.len(), NET_BUCKETS + 1);
	}

	#[test]
	fn out_of_range_series_is_rejected() {
		let mut state = surface();
		for raw in ["3", "0", "x"] {
			let err = state
				.update(&UpdateMessage {
					process_map: Some(raw.into()),
					process_net: None,
				})
				.unwrap_err();
			assert!(matches!(err, ForceGraphError::Configuration(_)));
		}
		assert_eq!(state.simulation.graph()[NodeIndex::new(0)].color, Some(0.5));
	}

	#[test]
	fn update_before_any_dataset_fails() {
		let mut state = SurfaceState::new("empty", 100.0, 100.0, 1.0);
		assert!(matches!(
			state.update(&UpdateMessage::default()),
			Err(ForceGraphError::NoConfig)
		));
	}

	#[test]
	fn reconstruct_replaces_graph_and_reuses_config() {
		let mut state = surface();
		let key = state.configs.current_key();
		state.construct(&series_data()).unwrap();
		assert_eq!(state.configs.current_key(), key);
		assert_eq!(state.configs.len(), 1);
		assert_eq!(state.simulation.graph().node_count(), 3);
	}

	#[test]
	fn registry_creates_and_tears_down() {
		let mut registry = SurfaceRegistry::default();
		registry.create(SurfaceState::new("one", 10.0, 10.0, 1.0));
		assert!(registry.contains("one"));
		assert!(registry.get("one").is_some());
		assert!(registry.teardown("one").is_some());
		assert!(registry.is_empty());
		assert!(registry.teardown("one").is_none());
	}

	#[test]
	fn resize_moves_viewport_boundary() {
		let mut state = surface();
		state.resize(500.0, 400.0, 1.0);
		let viewport = state.viewport();
		assert_eq!(viewport.right, 440.0);
		assert_eq!(viewport.bottom, 360.0);
		assert_eq!(viewport.clip(-5.0, 1000.0), (40.0, 360.0));
	}

	#[test]
	fn resize_recenters_and_restarts_cool() {
		let mut state = surface();
		while state.tick() {}
		state.resize(500.0, 400.0, 2.0);
		assert_eq!(state.simulation.center(), (250.0, 200.0));
		assert!(state.simulation.is_running());
		assert_eq!(state.simulation.alpha_target(), 0.0);
	}

	#[test]
	fn resize_rederives_ratio_scaled_values() {
		let mut state = surface();
		state.resize(500.0, 400.0, 1.0);
		let config = state.configs.current().unwrap();
		assert_eq!(config.label_font, "14px Arial");
		assert_eq!(state.simulation.graph()[NodeIndex::new(2)].vsize, 3.0);
		assert_eq!(state.simulation.link_distance(), 400.0);
	}

	#[test]
	fn update_without_series_is_ignored() {
		let data: GraphData = serde_json::from_value(json!({
			"nodes": { "id": ["A", "B"], "color": [0.5, null], "color.s2": [-1, 1] },
			"links": { "source": ["A"], "target": ["B"], "weight": [1.0] },
		}))
		.unwrap();
		let mut state = SurfaceState::new("plain", 800.0, 600.0, 1.0);
		state.construct(&data).unwrap();
		let before = state.configs.current().unwrap().partition.clone();
		state
			.update(&UpdateMessage {
				process_map: Some("2".into()),
				process_net: Some("1".into()),
			})
			.unwrap();
		assert_eq!(state.simulation.graph()[NodeIndex::new(0)].color, Some(0.5));
		assert_eq!(state.configs.current().unwrap().partition, before);
	}

	#[test]
	fn bad_net_index_leaves_map_series_unapplied() {
		let mut state = surface();
		let err = state
			.update(&UpdateMessage {
				process_map: Some("2".into()),
				process_net: Some("9".into()),
			})
			.unwrap_err();
		assert!(matches!(err, ForceGraphError::Configuration(_)));
		let graph = state.simulation.graph();
		assert_eq!(graph[NodeIndex::new(0)].color, Some(0.5));
		assert_eq!(graph[EdgeIndex::new(1)].weight, None);
	}
}
