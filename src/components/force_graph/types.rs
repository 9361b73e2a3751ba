use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::Result;
use super::render::Shape;
use super::scale::Scheme;

/// A data table as sent by the host, either column-major or as row objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Table {
	Rows(Vec<Map<String, Value>>),
	Columns(BTreeMap<String, Vec<Value>>),
}

impl Default for Table {
	fn default() -> Self {
		Table::Rows(Vec::new())
	}
}

impl Table {
	/// Row objects; short columns are padded with nulls.
	pub fn rows(&self) -> Vec<Map<String, Value>> {
		match self {
			Table::Rows(rows) => rows.clone(),
			Table::Columns(columns) => {
				let len = columns.values().map(Vec::len).max().unwrap_or(0);
				(0..len)
					.map(|i| {
						columns
							.iter()
							.map(|(name, col)| (name.clone(), col.get(i).cloned().unwrap_or(Value::Null)))
							.collect()
					})
					.collect()
			}
		}
	}
}

/// Node label source: `"none"` hides labels, anything else names a
/// `label_<source>` field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LabelSource {
	None,
	Field(String),
}

impl From<String> for LabelSource {
	fn from(raw: String) -> Self {
		if raw == "none" {
			LabelSource::None
		} else {
			LabelSource::Field(raw)
		}
	}
}

impl From<LabelSource> for String {
	fn from(source: LabelSource) -> Self {
		match source {
			LabelSource::None => "none".into(),
			LabelSource::Field(name) => name,
		}
	}
}

/// Options the host may set. Keys not listed here are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distance: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub series_data: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title_size: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub legend_title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub edge_scale: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub edge_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub edge_opacity: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub label: Option<LabelSource>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub label_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub label_opacity: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub label_scale: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_scale: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_scheme: Option<Scheme>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_shape: Option<Shape>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_border_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_border_width: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_border_opacity: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub color_domain: Option<[f64; 2]>,
}

/// A full dataset with its options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	#[serde(default)]
	pub nodes: Table,
	#[serde(default)]
	pub links: Table,
	#[serde(default)]
	pub options: Options,
}

/// Series switch requested by the host. Indices are 1-based strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMessage {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub process_map: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub process_net: Option<String>,
}

/// Anything the host can send to a surface.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
	Data(GraphData),
	Update(UpdateMessage),
}

impl Inbound {
	/// Decode a host message; `{"update": true, ...}` is an update, anything
	/// else a dataset.
	pub fn from_value(value: Value) -> Result<Self> {
		let is_update = value
			.get("update")
			.and_then(Value::as_bool)
			.unwrap_or(false);
		Ok(if is_update {
			Inbound::Update(serde_json::from_value(value)?)
		} else {
			Inbound::Data(serde_json::from_value(value)?)
		})
	}

	pub fn from_json(raw: &str) -> Result<Self> {
		Self::from_value(serde_json::from_str(raw)?)
	}
}
