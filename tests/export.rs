//! Browser-only checks for image export and the script bindings.
#![cfg(target_arch = "wasm32")]

use force_graph_widget::{ScriptController, png_data_url};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlCanvasElement;

wasm_bindgen_test_configure!(run_in_browser);

fn canvas() -> HtmlCanvasElement {
	let document = web_sys::window().unwrap().document().unwrap();
	let canvas: HtmlCanvasElement = document.create_element("canvas").unwrap().dyn_into().unwrap();
	canvas.set_width(40);
	canvas.set_height(30);
	canvas
}

#[wasm_bindgen_test]
fn canvas_exports_as_png_data_url() {
	let url = png_data_url(&canvas()).unwrap();
	assert!(url.starts_with("data:image/png;base64,"));
}

#[wasm_bindgen_test]
fn script_controller_needs_a_mounted_surface() {
	let controller = ScriptController::new("nowhere".into());
	assert!(controller.set_title("x").is_err());
	assert!(controller.render_value(r#"{"nodes": [], "links": []}"#).is_err());
}

#[wasm_bindgen_test]
fn script_controller_rejects_malformed_payload() {
	let controller = ScriptController::new("nowhere".into());
	assert!(controller.render_value("{not json").is_err());
}
