use leptos::ev::{Event, MouseEvent};
use leptos::prelude::*;
use log::error;
use serde_json::{Value, json};

use crate::components::force_graph::{
	ForceGraphCanvas, GraphController, GraphData, Inbound, Result, Shape, UpdateMessage,
	with_surface,
};

const SURFACE_ID: &str = "home-graph";

/// Sample network: a random tree with two colored series over the same nodes.
fn generate_sample_data(n: usize) -> GraphData {
	let ids: Vec<String> = (0..n).map(|i| format!("g{i}")).collect();
	let series = |seed: usize| -> Vec<Value> {
		(0..n)
			.map(|i| {
				if (i + seed) % 7 == 0 {
					Value::Null
				} else {
					json!(rand_simple(i * 31 + seed) * 2.0 - 1.0)
				}
			})
			.collect()
	};
	let sides: Vec<&str> = (0..n).map(|i| if i % 3 == 0 { "Neg" } else { "Pos" }).collect();
	let (s1, s2) = (series(1), series(2));

	let (mut source, mut target, mut w1, mut w2) = (vec![], vec![], vec![], vec![]);
	for i in 1..n {
		source.push(ids[i].clone());
		target.push(ids[(rand_simple(i) * (i as f64)) as usize].clone());
		w1.push(json!(rand_simple(i + 100) * 4.0));
		w2.push(if i % 5 == 0 { Value::Null } else { json!(rand_simple(i + 200)) });
	}

	let payload = json!({
		"nodes": {
			"id": ids,
			"size": (0..n).map(|i| 3 + i % 4).collect::<Vec<_>>(),
			"label_id": ids,
			"color": s1,
			"color.first": s1,
			"color.second": s2,
			"scheme.first": sides,
			"scheme.second": sides.iter().rev().collect::<Vec<_>>(),
		},
		"links": {
			"source": source,
			"target": target,
			"weight": w1,
			"weight.first": w1,
			"weight.second": w2,
		},
		"options": {
			"title": "Sample network",
			"seriesData": ["first", "second"],
			"label": "id",
			"distance": 60,
		},
	});
	serde_json::from_value(payload).unwrap_or_default()
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

fn control(f: impl FnOnce(&mut dyn GraphController) -> Result<()>) {
	match with_surface(SURFACE_ID, |s| f(s)) {
		Some(Err(err)) => error!("{err}"),
		None => error!("surface `{SURFACE_ID}` is not mounted"),
		Some(Ok(())) => {}
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = RwSignal::new(Inbound::Data(generate_sample_data(100)));
	let show_series = move |index: &'static str| {
		move |_: MouseEvent| {
			graph_data.set(Inbound::Update(UpdateMessage {
				process_map: Some(index.into()),
				process_net: None,
			}))
		}
	};

	let on_shape = move |ev: Event| {
		let raw = event_target_value(&ev);
		match serde_json::from_value::<Shape>(Value::String(raw)) {
			Ok(shape) => control(|c| c.set_node_shape(shape)),
			Err(err) => error!("unknown shape: {err}"),
		}
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ForceGraphCanvas surface_id=SURFACE_ID data=graph_data fullscreen=true />
				<div class="graph-overlay">
					<h1>"Force-Directed Graph"</h1>
					<p class="subtitle">"Drag nodes to reposition. Switch series to recolor."</p>
					<div class="graph-settings">
						<button on:click=show_series("1")>"Series 1"</button>
						<button on:click=show_series("2")>"Series 2"</button>
						<select on:change=on_shape>
							<option value="circle">"Circle"</option>
							<option value="triangle">"Triangle"</option>
							<option value="rectangle">"Rectangle"</option>
							<option value="diamond">"Diamond"</option>
						</select>
						<button on:click=move |_| control(|c| c.refresh())>"Refresh"</button>
						<button on:click=move |_| control(|c| c.save_image())>"Save image"</button>
					</div>
				</div>
			</div>
		</ErrorBoundary>
	}
}
