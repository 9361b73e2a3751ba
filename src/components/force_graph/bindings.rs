//! JavaScript entry points for hosts that drive a surface from script.

use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use super::controller::GraphController;
use super::error::{ForceGraphError, Result};
use super::scale::PaletteId;
use super::state::{SurfaceState, with_surface};
use super::types::{Inbound, LabelSource};

fn to_js(err: ForceGraphError) -> JsValue {
	js_sys::Error::new(&err.to_string()).into()
}

fn parse_name<T: DeserializeOwned>(raw: &str) -> Result<T> {
	Ok(serde_json::from_value(Value::String(raw.to_owned()))?)
}

/// Handle to a surface registered by a mounted `ForceGraphCanvas`.
#[wasm_bindgen]
pub struct ScriptController {
	surface_id: String,
}

impl ScriptController {
	fn with<R>(&self, f: impl FnOnce(&mut SurfaceState) -> Result<R>) -> Result<R, JsValue> {
		with_surface(&self.surface_id, f)
			.ok_or_else(|| JsValue::from(js_sys::Error::new(&format!("no surface `{}`", self.surface_id))))?
			.map_err(to_js)
	}
}

#[wasm_bindgen]
impl ScriptController {
	#[wasm_bindgen(constructor)]
	pub fn new(surface_id: String) -> ScriptController {
		ScriptController { surface_id }
	}

	/// Feed a dataset or an update message, encoded as JSON.
	#[wasm_bindgen(js_name = renderValue)]
	pub fn render_value(&self, payload: &str) -> Result<(), JsValue> {
		let inbound = Inbound::from_json(payload).map_err(to_js)?;
		self.with(|s| s.render_value(&inbound))
	}

	pub fn refresh(&self) -> Result<(), JsValue> {
		self.with(|s| s.refresh())
	}

	pub fn pause(&self) -> Result<(), JsValue> {
		self.with(|s| s.pause())
	}

	#[wasm_bindgen(js_name = saveImage)]
	pub fn save_image(&self) -> Result<(), JsValue> {
		self.with(|s| s.save_image())
	}

	#[wasm_bindgen(js_name = setTitle)]
	pub fn set_title(&self, title: &str) -> Result<(), JsValue> {
		self.with(|s| s.set_title(title))
	}

	#[wasm_bindgen(js_name = setTitleSize)]
	pub fn set_title_size(&self, size: f64) -> Result<(), JsValue> {
		self.with(|s| s.set_title_size(size))
	}

	#[wasm_bindgen(js_name = setLegendTitle)]
	pub fn set_legend_title(&self, title: &str) -> Result<(), JsValue> {
		self.with(|s| s.set_legend_title(title))
	}

	#[wasm_bindgen(js_name = setDistance)]
	pub fn set_distance(&self, distance: f64) -> Result<(), JsValue> {
		self.with(|s| s.set_distance(distance))
	}

	/// `"none"` hides labels; `"<field>"` reads `label_<field>`.
	#[wasm_bindgen(js_name = setLabel)]
	pub fn set_label(&self, source: &str) -> Result<(), JsValue> {
		let source = LabelSource::from(source.to_owned());
		self.with(|s| s.set_label_source(source))
	}

	#[wasm_bindgen(js_name = setLabelColor)]
	pub fn set_label_color(&self, color: &str) -> Result<(), JsValue> {
		self.with(|s| s.set_label_color(color))
	}

	#[wasm_bindgen(js_name = setLabelOpacity)]
	pub fn set_label_opacity(&self, opacity: f64) -> Result<(), JsValue> {
		self.with(|s| s.set_label_opacity(opacity))
	}

	#[wasm_bindgen(js_name = setLabelScale)]
	pub fn set_label_scale(&self, scale: f64) -> Result<(), JsValue> {
		self.with(|s| s.set_label_scale(scale))
	}

	#[wasm_bindgen(js_name = setNodeShape)]
	pub fn set_node_shape(&self, shape: &str) -> Result<(), JsValue> {
		let shape = parse_name(shape).map_err(to_js)?;
		self.with(|s| s.set_node_shape(shape))
	}

	#[wasm_bindgen(js_name = setNodeScale)]
	pub fn set_node_scale(&self, scale: f64) -> Result<(), JsValue> {
		self.with(|s| s.set_node_scale(scale))
	}

	#[wasm_bindgen(js_name = setNodeScheme)]
	pub fn set_node_scheme(&self, scheme: &str) -> Result<(), JsValue> {
		let scheme = parse_name(scheme).map_err(to_js)?;
		self.with(|s| s.set_node_scheme(scheme))
	}

	#[wasm_bindgen(js_name = setNodeBorderColor)]
	pub fn set_node_border_color(&self, color: &str) -> Result<(), JsValue> {
		self.with(|s| s.set_node_border_color(color))
	}

	#[wasm_bindgen(js_name = setNodeBorderOpacity)]
	pub fn set_node_border_opacity(&self, opacity: f64) -> Result<(), JsValue> {
		self.with(|s| s.set_node_border_opacity(opacity))
	}

	#[wasm_bindgen(js_name = setNodeBorderWidth)]
	pub fn set_node_border_width(&self, width: f64) -> Result<(), JsValue> {
		self.with(|s| s.set_node_border_width(width))
	}

	#[wasm_bindgen(js_name = setEdgeColor)]
	pub fn set_edge_color(&self, color: &str) -> Result<(), JsValue> {
		self.with(|s| s.set_edge_color(color))
	}

	#[wasm_bindgen(js_name = setEdgeOpacity)]
	pub fn set_edge_opacity(&self, opacity: f64) -> Result<(), JsValue> {
		self.with(|s| s.set_edge_opacity(opacity))
	}

	#[wasm_bindgen(js_name = setEdgeScale)]
	pub fn set_edge_scale(&self, scale: f64) -> Result<(), JsValue> {
		self.with(|s| s.set_edge_scale(scale))
	}

	/// Redefine palette `id` (`linear2`, `linear3`, `dual`, `dualPos`, `dualNeg`).
	#[wasm_bindgen(js_name = changeScheme)]
	pub fn change_scheme(&self, id: &str, domain: Vec<f64>, range: Vec<String>) -> Result<(), JsValue> {
		let id: PaletteId = parse_name(id).map_err(to_js)?;
		self.with(|s| s.change_scheme(id, domain, range))
	}
}
