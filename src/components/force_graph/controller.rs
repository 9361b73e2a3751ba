//! Settings-panel operations on a live surface.

use log::info;

use super::config::Config;
use super::error::{ForceGraphError, Result};
use super::export::{IMAGE_FILE_NAME, download_png};
use super::render::Shape;
use super::scale::{Palette, PaletteId, Scheme};
use super::simulation::WARM_TARGET;
use super::state::{SurfaceState, refill};
use super::types::LabelSource;

/// Named mutations a settings panel or script may apply.
///
/// Every setter re-derives the caches that depend on what it changes, so the
/// next frame renders the new state. Setters fail with
/// [`ForceGraphError::NoConfig`] before the first dataset arrives.
pub trait GraphController {
	/// Re-settle the layout.
	fn refresh(&mut self) -> Result<()>;

	fn set_title(&mut self, title: &str) -> Result<()>;
	fn set_title_size(&mut self, size: f64) -> Result<()>;
	fn set_legend_title(&mut self, title: &str) -> Result<()>;
	fn set_distance(&mut self, distance: f64) -> Result<()>;

	fn set_label_source(&mut self, source: LabelSource) -> Result<()>;
	fn set_label_color(&mut self, color: &str) -> Result<()>;
	fn set_label_opacity(&mut self, opacity: f64) -> Result<()>;
	fn set_label_scale(&mut self, scale: f64) -> Result<()>;

	fn set_node_shape(&mut self, shape: Shape) -> Result<()>;
	fn set_node_scale(&mut self, scale: f64) -> Result<()>;
	fn set_node_scheme(&mut self, scheme: Scheme) -> Result<()>;
	fn set_node_border_color(&mut self, color: &str) -> Result<()>;
	fn set_node_border_opacity(&mut self, opacity: f64) -> Result<()>;
	fn set_node_border_width(&mut self, width: f64) -> Result<()>;

	fn set_edge_color(&mut self, color: &str) -> Result<()>;
	fn set_edge_opacity(&mut self, opacity: f64) -> Result<()>;
	fn set_edge_scale(&mut self, scale: f64) -> Result<()>;

	/// Redefine a palette; recolors nodes when the active scheme uses it.
	fn change_scheme(&mut self, id: PaletteId, domain: Vec<f64>, range: Vec<String>) -> Result<()>;

	/// Placeholder; has no effect.
	fn pause(&mut self) -> Result<()>;

	/// Download the current canvas as a PNG.
	fn save_image(&self) -> Result<()>;
}

impl SurfaceState {
	fn config_mut(&mut self) -> Result<&mut Config> {
		self.configs.current_mut().ok_or(ForceGraphError::NoConfig)
	}

	fn edit(&mut self, f: impl FnOnce(&mut Config)) -> Result<()> {
		f(self.config_mut()?);
		Ok(())
	}

	fn edit_colors(&mut self, f: impl FnOnce(&mut Config)) -> Result<()> {
		let config = self.config_mut()?;
		f(config);
		config.refresh_rgba();
		Ok(())
	}
}

impl GraphController for SurfaceState {
	fn refresh(&mut self) -> Result<()> {
		self.simulation.reheat(WARM_TARGET);
		Ok(())
	}

	fn set_title(&mut self, title: &str) -> Result<()> {
		self.edit(|c| c.title = title.to_owned())
	}

	fn set_title_size(&mut self, size: f64) -> Result<()> {
		self.edit(|c| c.title_size = size)
	}

	fn set_legend_title(&mut self, title: &str) -> Result<()> {
		self.edit(|c| c.legend_title = title.to_owned())
	}

	fn set_distance(&mut self, distance: f64) -> Result<()> {
		let ratio = self.ratio;
		self.config_mut()?.distance = distance;
		self.simulation.set_link_distance(distance * ratio);
		self.simulation.nudge(WARM_TARGET);
		Ok(())
	}

	fn set_label_source(&mut self, source: LabelSource) -> Result<()> {
		let config = self.configs.current_mut().ok_or(ForceGraphError::NoConfig)?;
		for node in self.simulation.nodes_mut() {
			node.apply_label(&source);
		}
		config.label = source;
		Ok(())
	}

	fn set_label_color(&mut self, color: &str) -> Result<()> {
		self.edit_colors(|c| c.label_color = color.to_owned())
	}

	fn set_label_opacity(&mut self, opacity: f64) -> Result<()> {
		self.edit_colors(|c| c.label_opacity = opacity)
	}

	fn set_label_scale(&mut self, scale: f64) -> Result<()> {
		let ratio = self.ratio;
		self.edit(|c| {
			c.label_scale = scale;
			c.refresh_label_font(ratio);
		})
	}

	fn set_node_shape(&mut self, shape: Shape) -> Result<()> {
		self.edit(|c| c.node_shape = shape)
	}

	fn set_node_scale(&mut self, scale: f64) -> Result<()> {
		let ratio = self.ratio;
		self.config_mut()?.node_scale = scale;
		for node in self.simulation.nodes_mut() {
			node.vsize = scale * node.size * ratio;
		}
		Ok(())
	}

	fn set_node_scheme(&mut self, scheme: Scheme) -> Result<()> {
		let config = self.configs.current_mut().ok_or(ForceGraphError::NoConfig)?;
		config.node_scheme = scheme;
		refill(config, &mut self.simulation);
		Ok(())
	}

	fn set_node_border_color(&mut self, color: &str) -> Result<()> {
		self.edit_colors(|c| c.node_border_color = color.to_owned())
	}

	fn set_node_border_opacity(&mut self, opacity: f64) -> Result<()> {
		self.edit_colors(|c| c.node_border_opacity = opacity)
	}

	fn set_node_border_width(&mut self, width: f64) -> Result<()> {
		self.edit(|c| c.node_border_width = width)
	}

	fn set_edge_color(&mut self, color: &str) -> Result<()> {
		self.edit_colors(|c| c.edge_color = color.to_owned())
	}

	fn set_edge_opacity(&mut self, opacity: f64) -> Result<()> {
		self.edit_colors(|c| c.edge_opacity = opacity)
	}

	fn set_edge_scale(&mut self, scale: f64) -> Result<()> {
		self.edit(|c| c.edge_scale = scale)
	}

	fn change_scheme(&mut self, id: PaletteId, domain: Vec<f64>, range: Vec<String>) -> Result<()> {
		let config = self.configs.current_mut().ok_or(ForceGraphError::NoConfig)?;
		config.redefine_palette(id, Palette { domain, range })?;
		if config.node_scheme.uses(id) {
			refill(config, &mut self.simulation);
		}
		Ok(())
	}

	fn pause(&mut self) -> Result<()> {
		info!("pause requested on `{}`; pausing is not supported", self.id);
		Ok(())
	}

	fn save_image(&self) -> Result<()> {
		let canvas = self
			.canvas()
			.ok_or_else(|| ForceGraphError::Export("surface has no canvas".into()))?;
		download_png(canvas, IMAGE_FILE_NAME)
	}
}

#[cfg(test)]
mod tests {
	use petgraph::graph::NodeIndex;
	use serde_json::json;

	use super::super::scale::MISSING_COLOR;
	use super::*;

	fn surface() -> SurfaceState {
		let data = serde_json::from_value(json!({
			"nodes": {
				"id": ["A", "B"],
				"size": [2, 3],
				"color": [0.0, null],
				"scheme": ["Neg", "Pos"],
				"label_id": ["A", "B"],
				"label_term": ["alpha", "beta"],
			},
			"links": { "source": ["A"], "target": ["B"], "weight": [1.0] },
		}))
		.unwrap();
		let mut state = SurfaceState::new("ctl", 800.0, 600.0, 2.0);
		state.construct(&data).unwrap();
		state
	}

	fn node(state: &SurfaceState, i: usize) -> &super::super::model::Node {
		&state.simulation.graph()[NodeIndex::new(i)]
	}

	#[test]
	fn border_color_updates_rgba_cache() {
		let mut state = surface();
		state.set_node_border_color("#112233").unwrap();
		assert_eq!(state.configs.current().unwrap().rgba.node, "rgba(17,34,51,1)");
		state.set_node_border_opacity(0.5).unwrap();
		assert_eq!(state.configs.current().unwrap().rgba.node, "rgba(17,34,51,0.5)");
		state.set_edge_color("#000").unwrap();
		assert_eq!(state.configs.current().unwrap().rgba.edge, "rgba(0,0,0,0.6)");
	}

	#[test]
	fn label_source_recomputes_labels() {
		let mut state = surface();
		state.set_label_source(LabelSource::Field("term".into())).unwrap();
		assert_eq!(node(&state, 0).label, "alpha");
		state.set_label_source(LabelSource::None).unwrap();
		assert_eq!(node(&state, 1).label, "");
		state.set_label_scale(2.0).unwrap();
		assert_eq!(state.configs.current().unwrap().label_font, "56px Arial");
	}

	#[test]
	fn node_scale_resizes_without_relayout() {
		let mut state = surface();
		let before = (node(&state, 1).x, state.simulation.alpha_target());
		state.set_node_scale(3.0).unwrap();
		assert_eq!(node(&state, 1).vsize, 18.0);
		assert_eq!((node(&state, 1).x, state.simulation.alpha_target()), before);
	}

	#[test]
	fn scheme_switch_recolors_nodes() {
		let mut state = surface();
		state.set_node_scheme(Scheme::Dual).unwrap();
		assert_eq!(node(&state, 0).fill, "rgb(72, 51, 255)");
		assert_eq!(node(&state, 1).fill, MISSING_COLOR);
	}

	#[test]
	fn change_scheme_recolors_only_active_palette() {
		let mut state = surface();
		let fill = node(&state, 0).fill.clone();
		state
			.change_scheme(PaletteId::Linear3, vec![-1.0, 0.0, 1.0], vec!["#000000".into(), "#00FF00".into(), "#FFFFFF".into()])
			.unwrap();
		assert_eq!(node(&state, 0).fill, fill);
		state
			.change_scheme(PaletteId::Linear2, vec![0.0, 1.0], vec!["#00FF00".into(), "#000000".into()])
			.unwrap();
		assert_eq!(node(&state, 0).fill, "rgb(0, 255, 0)");
		let err = state
			.change_scheme(PaletteId::Linear2, vec![0.0, 1.0], vec!["#00FF00".into()])
			.unwrap_err();
		assert!(matches!(err, ForceGraphError::Configuration(_)));
	}

	#[test]
	fn distance_updates_link_force() {
		let mut state = surface();
		state.set_distance(50.0).unwrap();
		assert_eq!(state.configs.current().unwrap().distance, 50.0);
		assert_eq!(state.simulation.link_distance(), 100.0);
	}

	#[test]
	fn setters_need_a_dataset() {
		let mut state = SurfaceState::new("bare", 100.0, 100.0, 1.0);
		assert!(matches!(state.set_title("x"), Err(ForceGraphError::NoConfig)));
		assert!(state.pause().is_ok());
		assert!(matches!(state.save_image(), Err(ForceGraphError::Export(_))));
	}
}
