//! Interactive force-directed graph: data model, layout physics, color
//! scales and the canvas component that ties them to the page.

mod bindings;
mod component;
pub mod config;
pub mod controller;
pub mod error;
mod export;
pub mod interaction;
pub mod model;
pub mod partition;
mod quadtree;
pub mod render;
pub mod scale;
pub mod simulation;
pub mod state;
pub mod types;

pub use bindings::ScriptController;
pub use component::ForceGraphCanvas;
pub use controller::GraphController;
pub use error::{ForceGraphError, Result};
pub use export::{IMAGE_FILE_NAME, download_png, png_data_url};
pub use render::Shape;
pub use scale::{PaletteId, Scheme};
pub use state::{SurfaceState, with_surface};
pub use types::{GraphData, Inbound, LabelSource, Options, UpdateMessage};
