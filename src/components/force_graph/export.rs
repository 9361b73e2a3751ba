use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlAnchorElement, HtmlCanvasElement};

use super::error::{ForceGraphError, Result};

/// File name offered when saving the graph.
pub const IMAGE_FILE_NAME: &str = "network.png";

fn js_error(err: JsValue) -> ForceGraphError {
	ForceGraphError::Export(format!("{err:?}"))
}

/// PNG encoding of the canvas as a `data:` URL.
pub fn png_data_url(canvas: &HtmlCanvasElement) -> Result<String> {
	canvas.to_data_url_with_type("image/png").map_err(js_error)
}

/// Encode the canvas and hand it to the browser as a download.
pub fn download_png(canvas: &HtmlCanvasElement, file_name: &str) -> Result<()> {
	let url = png_data_url(canvas)?;
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| ForceGraphError::Export("no document".into()))?;
	let body = document
		.body()
		.ok_or_else(|| ForceGraphError::Export("document has no body".into()))?;

	let link: HtmlAnchorElement = document
		.create_element("a")
		.map_err(js_error)?
		.dyn_into()
		.map_err(|_| ForceGraphError::Export("`a` is not an anchor element".into()))?;
	link.set_href(&url);
	link.set_download(file_name);
	body.append_child(&link).map_err(js_error)?;
	link.click();
	body.remove_child(&link).map_err(js_error)?;
	Ok(())
}
