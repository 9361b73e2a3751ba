use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, Window};

use super::render;
use super::state::{SurfaceState, with_registry, with_surface};
use super::types::Inbound;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// CSS size of the canvas.
fn measure(
	window: &Window,
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		let inner = |v: Result<JsValue, JsValue>, fallback| v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback);
		return (inner(window.inner_width(), 800.0), inner(window.inner_height(), 600.0));
	}
	(
		width.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_width() as f64)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

/// Size the backing store in device pixels and the element in CSS pixels.
fn apply_size(canvas: &HtmlCanvasElement, (w, h): (f64, f64), ratio: f64) {
	canvas.set_width((w * ratio) as u32);
	canvas.set_height((h * ratio) as u32);
	let style = web_sys::HtmlElement::style(canvas);
	let _ = style.set_property("width", &format!("{w}px"));
	let _ = style.set_property("height", &format!("{h}px"));
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

/// Pointer position in CSS pixels relative to the canvas.
fn pointer(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Canvas bound to the surface `surface_id`.
///
/// Every value of `data` is routed through [`SurfaceState::render_value`]:
/// datasets rebuild the layout, update messages switch series in place.
/// The surface stays registered until the component unmounts, so scripts can
/// reach it through [`super::ScriptController`].
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] surface_id: String,
	#[prop(into)] data: Signal<Inbound>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let id = surface_id.clone();

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();

		if !with_registry(|r| r.contains(&id)) {
			let Some(window) = web_sys::window() else {
				error!("no window to draw `{id}` in");
				return;
			};
			let Some(ctx) = context_2d(&canvas) else {
				error!("canvas for `{id}` has no 2d context");
				return;
			};
			let ratio = window.device_pixel_ratio();
			let (w, h) = measure(&window, &canvas, fullscreen, width, height);
			apply_size(&canvas, (w, h), ratio);
			with_registry(|r| {
				r.create(SurfaceState::new(id.clone(), w * ratio, h * ratio, ratio).with_canvas(canvas.clone()));
			});

			let (resize_id, canvas_resize) = (id.clone(), canvas.clone());
			*resize_cb.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let ratio = win.device_pixel_ratio();
				let (nw, nh) = measure(&win, &canvas_resize, fullscreen, width, height);
				apply_size(&canvas_resize, (nw, nh), ratio);
				with_surface(&resize_id, |s| s.resize(nw * ratio, nh * ratio, ratio));
			}));
			if let Some(ref cb) = *resize_cb.borrow() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}

			let (frame_id, animate_inner, resize_inner) = (id.clone(), animate.clone(), resize_cb.clone());
			*animate.borrow_mut() = Some(Closure::new(move || {
				let alive = with_surface(&frame_id, |s| {
					s.tick();
					render::render(s, &ctx);
				})
				.is_some();
				let Some(win) = web_sys::window() else {
					return;
				};
				if !alive {
					if let Some(cb) = resize_inner.borrow_mut().take() {
						let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
					}
					return;
				}
				if let Some(ref cb) = *animate_inner.borrow() {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}));
			if let Some(ref cb) = *animate.borrow() {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}

		data.with(|inbound| {
			if let Some(Err(err)) = with_surface(&id, |s| s.render_value(inbound)) {
				error!("surface `{id}` rejected payload: {err}");
			}
		});
	});

	let cleanup_id = surface_id.clone();
	on_cleanup(move || {
		with_registry(|r| r.teardown(&cleanup_id));
	});

	let md_id = surface_id.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = pointer(&canvas, &ev);
		with_surface(&md_id, |s| s.drag_start(x, y));
	};

	let mm_id = surface_id.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = pointer(&canvas, &ev);
		with_surface(&mm_id, |s| s.drag_move(x, y));
	};

	let mu_id = surface_id.clone();
	let on_mouseup = move |_: MouseEvent| {
		with_surface(&mu_id, |s| s.drag_end());
	};

	let ml_id = surface_id;
	let on_mouseleave = move |_: MouseEvent| {
		with_surface(&ml_id, |s| s.drag_end());
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			style="display: block; cursor: grab;"
		/>
	}
}
