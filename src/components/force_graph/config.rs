//! Per-dataset visual configuration and its derived caches.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::{DefaultHasher, Hash, Hasher};

use log::{debug, warn};

use super::error::Result;
use super::partition::Partition;
use super::render::Shape;
use super::scale::{Palette, PaletteId, Palettes, Rgb, Scalers, Scheme};
use super::types::{GraphData, LabelSource, Options};

/// Base label font size before scale and pixel ratio.
const LABEL_FONT_PX: f64 = 14.0;

/// Precomputed `rgba(...)` strings per drawing role.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RgbaCache {
	pub edge: String,
	pub label: String,
	pub node: String,
}

fn hex_to_rgba(hex: &str, alpha: f64) -> String {
	match Rgb::from_hex(hex) {
		Some(rgb) => rgb.to_rgba(alpha),
		None => {
			warn!("ignoring invalid color `{hex}`");
			"rgba(0,0,0,0)".into()
		}
	}
}

/// Every visual option of one dataset plus the caches derived from them.
#[derive(Clone, Debug)]
pub struct Config {
	pub pause: bool,
	pub distance: f64,
	pub strength: f64,

	pub title: String,
	pub title_size: f64,
	pub legend_title: String,

	pub label: LabelSource,
	pub label_color: String,
	pub label_opacity: f64,
	pub label_scale: f64,

	pub node_scale: f64,
	pub node_scheme: Scheme,
	pub node_shape: Shape,
	pub node_border_color: String,
	pub node_border_opacity: f64,
	pub node_border_width: f64,

	pub edge_scale: f64,
	pub edge_color: String,
	pub edge_opacity: f64,

	pub na_opacity: f64,
	pub na_width: f64,

	pub series_data: Option<Vec<String>>,

	pub palettes: Palettes,
	pub scalers: Scalers,
	pub rgba: RgbaCache,
	pub label_font: String,
	pub partition: Partition,
}

impl Config {
	/// Defaults overlaid with the host options, caches materialized.
	pub fn build(options: &Options, ratio: f64) -> Result<Self> {
		let mut palettes = Palettes::default();
		if let Some(domain) = options.color_domain {
			palettes.override_domain(domain);
		}
		let scalers = Scalers::build(&palettes)?;

		let mut config = Self {
			pause: false,
			distance: options.distance.unwrap_or(400.0),
			strength: 0.05,
			title: options.title.clone().unwrap_or_default(),
			title_size: options.title_size.unwrap_or(22.0),
			legend_title: options.legend_title.clone().unwrap_or_default(),
			label: options
				.label
				.clone()
				.unwrap_or_else(|| LabelSource::Field("id".into())),
			label_color: options
				.label_color
				.clone()
				.unwrap_or_else(|| "#000000".into()),
			label_opacity: options.label_opacity.unwrap_or(0.8),
			label_scale: options.label_scale.unwrap_or(1.0),
			node_scale: options.node_scale.unwrap_or(1.0),
			node_scheme: options.node_scheme.unwrap_or_default(),
			node_shape: options.node_shape.unwrap_or_default(),
			node_border_color: options
				.node_border_color
				.clone()
				.unwrap_or_else(|| "#808080".into()),
			node_border_opacity: options.node_border_opacity.unwrap_or(1.0),
			node_border_width: options.node_border_width.unwrap_or(1.0),
			edge_scale: options.edge_scale.unwrap_or(1.0),
			edge_color: options
				.edge_color
				.clone()
				.unwrap_or_else(|| "#808080".into()),
			edge_opacity: options.edge_opacity.unwrap_or(0.6),
			na_opacity: 0.6,
			na_width: 0.1,
			series_data: options.series_data.clone(),
			palettes,
			scalers,
			rgba: RgbaCache::default(),
			label_font: String::new(),
			partition: Partition::default(),
		};
		config.refresh_label_font(ratio);
		config.refresh_rgba();
		Ok(config)
	}

	pub fn refresh_rgba(&mut self) {
		self.rgba = RgbaCache {
			edge: hex_to_rgba(&self.edge_color, self.edge_opacity),
			label: hex_to_rgba(&self.label_color, self.label_opacity),
			node: hex_to_rgba(&self.node_border_color, self.node_border_opacity),
		};
	}

	pub fn refresh_label_font(&mut self, ratio: f64) {
		self.label_font = format!("{}px Arial", LABEL_FONT_PX * self.label_scale * ratio);
	}

	/// Replace a palette and its scaler. `dual` follows `dualPos`.
	pub fn redefine_palette(&mut self, id: PaletteId, palette: Palette) -> Result<()> {
		self.scalers.rebuild(id, &palette)?;
		if id == PaletteId::DualPos {
			self.scalers.rebuild(PaletteId::Dual, &palette)?;
			self.palettes.set(PaletteId::Dual, palette.clone());
		}
		self.palettes.set(id, palette);
		Ok(())
	}

	pub fn title_font(&self, ratio: f64) -> String {
		format!("{}px Arial", self.title_size * ratio)
	}
}

/// Stable cache key of a dataset payload.
pub fn payload_key(data: &GraphData) -> Result<u64> {
	let encoded = serde_json::to_string(data)?;
	let mut hasher = DefaultHasher::new();
	encoded.hash(&mut hasher);
	Ok(hasher.finish())
}

/// Configurations of one surface, keyed by payload hash.
#[derive(Debug, Default)]
pub struct ConfigStore {
	configs: HashMap<u64, Config>,
	current: Option<u64>,
}

impl ConfigStore {
	/// Select the configuration for `data`, building it on first sight.
	pub fn get_config(&mut self, data: &GraphData, ratio: f64) -> Result<&mut Config> {
		let key = payload_key(data)?;
		let config = match self.configs.entry(key) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => {
				debug!("building config {key:016x}");
				entry.insert(Config::build(&data.options, ratio)?)
			}
		};
		self.current = Some(key);
		Ok(config)
	}

	pub fn current_key(&self) -> Option<u64> {
		self.current
	}

	pub fn current(&self) -> Option<&Config> {
		self.current.and_then(|key| self.configs.get(&key))
	}

	pub fn current_mut(&mut self) -> Option<&mut Config> {
		self.current.and_then(|key| self.configs.get_mut(&key))
	}

	pub fn len(&self) -> usize {
		self.configs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.configs.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn data(options: serde_json::Value) -> GraphData {
		serde_json::from_value(json!({
			"nodes": { "id": ["A", "B"] },
			"links": { "source": ["A"], "target": ["B"] },
			"options": options,
		}))
		.unwrap()
	}

	#[test]
	fn same_payload_returns_cached_instance() {
		let mut store = ConfigStore::default();
		let payload = data(json!({ "title": "T" }));
		let first = store.get_config(&payload, 1.0).unwrap() as *const Config;
		let second = store.get_config(&payload.clone(), 1.0).unwrap() as *const Config;
		assert_eq!(first, second);
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn whitelisted_option_change_builds_new_config() {
		let mut store = ConfigStore::default();
		let first = store.get_config(&data(json!({ "edgeScale": 1 })), 1.0).unwrap() as *const Config;
		let second = store.get_config(&data(json!({ "edgeScale": 2 })), 1.0).unwrap() as *const Config;
		assert_ne!(first, second);
		assert_eq!(store.len(), 2);
		assert_eq!(store.current().unwrap().edge_scale, 2.0);
	}

	#[test]
	fn options_overlay_defaults() {
		let config = Config::build(
			&data(json!({ "nodeScheme": "linear3", "labelScale": 2, "edgeColor": "#fff" })).options,
			2.0,
		)
		.unwrap();
		assert_eq!(config.node_scheme, Scheme::Linear3);
		assert_eq!(config.distance, 400.0);
		assert_eq!(config.label_font, "56px Arial");
		assert_eq!(config.rgba.edge, "rgba(255,255,255,0.6)");
		assert_eq!(config.rgba.node, "rgba(128,128,128,1)");
		assert_eq!(config.rgba.label, "rgba(0,0,0,0.8)");
	}

	#[test]
	fn color_domain_applies_to_every_palette() {
		let config = Config::build(&data(json!({ "colorDomain": [0, 10] })).options, 1.0).unwrap();
		assert_eq!(config.palettes.get(PaletteId::Linear3).domain, vec![0.0, 5.0, 10.0]);
		assert_eq!(config.scalers.get(PaletteId::Linear3).color(5.0), "rgb(255, 255, 255)");
	}

	#[test]
	fn border_color_change_regenerates_rgba() {
		let mut config = Config::build(&Options::default(), 1.0).unwrap();
		config.node_border_color = "#00ff00".into();
		config.refresh_rgba();
		assert_eq!(config.rgba.node, "rgba(0,255,0,1)");
	}

	#[test]
	fn redefining_dual_pos_updates_dual() {
		let mut config = Config::build(&Options::default(), 1.0).unwrap();
		config
			.redefine_palette(PaletteId::DualPos, Palette::new(&[0.0, 1.0], &["#00FF00", "#000000"]))
			.unwrap();
		assert_eq!(config.scalers.get(PaletteId::Dual).color(0.0), "rgb(0, 255, 0)");
		assert!(config
			.redefine_palette(PaletteId::Linear2, Palette::new(&[0.0], &["#000", "#fff"]))
			.is_err());
		assert_eq!(config.palettes.get(PaletteId::Linear2), &Palettes::default().get(PaletteId::Linear2).clone());
	}
}
