use std::collections::HashMap;

use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};
use serde_json::{Map, Value};

use super::error::{ForceGraphError, Result};
use super::scale::Side;
use super::types::{GraphData, LabelSource};

/// Nodes and weighted links of one dataset.
pub type LinkGraph = UnGraph<Node, Link>;

/// String form of an identifier or label cell.
fn cell_text(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

/// A graph node: data fields, physics state and derived visuals.
#[derive(Clone, Debug)]
pub struct Node {
	pub id: String,
	pub label: String,
	pub size: f64,
	/// Value fed to the color scale; `None` renders the neutral fill.
	pub color: Option<f64>,
	pub scheme: Option<Side>,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned position; set while the node is dragged.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	/// Drawn radius: `node_scale * size * ratio`.
	pub vsize: f64,
	pub fill: String,
	fields: Map<String, Value>,
}

impl Node {
	pub fn from_row(row: Map<String, Value>, position: usize) -> Result<Self> {
		let id = row.get("id").and_then(cell_text).ok_or_else(|| {
			ForceGraphError::DataIntegrity(format!("node row {position} has no identifier"))
		})?;
		let mut node = Self {
			label: String::new(),
			size: row.get("size").and_then(Value::as_f64).unwrap_or(1.0),
			color: row.get("color").and_then(Value::as_f64),
			scheme: row.get("scheme").and_then(Value::as_str).and_then(Side::parse),
			x: f64::NAN,
			y: f64::NAN,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
			vsize: 0.0,
			fill: String::new(),
			id,
			fields: row,
		};
		node.label = node.field_text("label").unwrap_or_default();
		Ok(node)
	}

	pub fn field_f64(&self, name: &str) -> Option<f64> {
		self.fields.get(name).and_then(Value::as_f64)
	}

	pub fn field_text(&self, name: &str) -> Option<String> {
		self.fields.get(name).and_then(cell_text)
	}

	/// Point `color` (and `scheme` when asked) at the `<field>.<series>` columns.
	pub fn select_series(&mut self, series: &str, with_scheme: bool) {
		self.color = self.field_f64(&format!("color.{series}"));
		if with_scheme {
			self.scheme = self
				.fields
				.get(&format!("scheme.{series}"))
				.and_then(Value::as_str)
				.and_then(Side::parse);
		}
	}

	pub fn apply_label(&mut self, source: &LabelSource) {
		self.label = match source {
			LabelSource::None => String::new(),
			LabelSource::Field(name) => self.field_text(&format!("label_{name}")).unwrap_or_default(),
		};
	}
}

/// A link between two nodes with an optional weight.
#[derive(Clone, Debug)]
pub struct Link {
	pub weight: Option<f64>,
	fields: Map<String, Value>,
}

impl Link {
	pub fn select_series(&mut self, series: &str) {
		self.weight = self
			.fields
			.get(&format!("weight.{series}"))
			.and_then(Value::as_f64);
	}
}

/// Build the graph, resolving link endpoints by node identifier.
pub fn build_graph(data: &GraphData) -> Result<LinkGraph> {
	let mut graph = LinkGraph::default();
	let mut by_id: HashMap<String, NodeIndex> = HashMap::new();

	for (position, row) in data.nodes.rows().into_iter().enumerate() {
		let node = Node::from_row(row, position)?;
		let id = node.id.clone();
		by_id.insert(id, graph.add_node(node));
	}

	for (position, row) in data.links.rows().into_iter().enumerate() {
		let endpoint = |key: &str| -> Result<NodeIndex> {
			let id = row.get(key).and_then(cell_text).unwrap_or_default();
			by_id.get(&id).copied().ok_or_else(|| {
				ForceGraphError::DataIntegrity(format!(
					"link {position} {key} references unknown node `{id}`"
				))
			})
		};
		let (source, target) = (endpoint("source")?, endpoint("target")?);
		let weight = row.get("weight").and_then(Value::as_f64);
		graph.add_edge(source, target, Link { weight, fields: row });
	}

	debug!(
		"built graph with {} nodes and {} links",
		graph.node_count(),
		graph.edge_count()
	);
	Ok(graph)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn data(value: Value) -> GraphData {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn resolves_links_by_identifier() {
		let graph = build_graph(&data(json!({
			"nodes": { "id": ["A", "B", "C"], "size": [1, 2, 3] },
			"links": { "source": ["A", "A"], "target": ["B", "C"], "weight": [0.1, null] },
		})))
		.unwrap();
		assert_eq!(graph.node_count(), 3);
		assert_eq!(graph.edge_count(), 2);
		let weights: Vec<_> = graph.edge_weights().map(|l| l.weight).collect();
		assert_eq!(weights, vec![Some(0.1), None]);
	}

	#[test]
	fn unknown_endpoint_is_rejected() {
		let err = build_graph(&data(json!({
			"nodes": [{ "id": "A" }],
			"links": [{ "source": "A", "target": "Z" }],
		})))
		.unwrap_err();
		assert!(matches!(err, ForceGraphError::DataIntegrity(msg) if msg.contains("`Z`")));
	}

	#[test]
	fn node_without_identifier_is_rejected() {
		let err = build_graph(&data(json!({ "nodes": [{ "size": 2 }] }))).unwrap_err();
		assert!(matches!(err, ForceGraphError::DataIntegrity(_)));
	}

	#[test]
	fn series_fields_are_selected() {
		let row = json!({ "id": 7, "color.s2": -0.5, "scheme.s2": "Neg", "label_term": "kinase" });
		let mut node = Node::from_row(row.as_object().unwrap().clone(), 0).unwrap();
		assert_eq!(node.id, "7");
		node.select_series("s2", true);
		assert_eq!(node.color, Some(-0.5));
		assert_eq!(node.scheme, Some(Side::Neg));
		node.apply_label(&LabelSource::Field("term".into()));
		assert_eq!(node.label, "kinase");
		node.apply_label(&LabelSource::None);
		assert_eq!(node.label, "");
	}
}
