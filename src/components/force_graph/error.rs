use thiserror::Error;

/// Failures surfaced by the graph core and its browser glue.
#[derive(Debug, Error)]
pub enum ForceGraphError {
	/// The dataset is internally inconsistent (unknown link endpoint, missing id).
	#[error("data integrity: {0}")]
	DataIntegrity(String),
	/// A palette, series selection or other setting cannot be applied.
	#[error("configuration: {0}")]
	Configuration(String),
	/// The inbound payload could not be decoded.
	#[error("invalid payload: {0}")]
	Payload(#[from] serde_json::Error),
	/// A controller was used before any dataset was rendered.
	#[error("no configuration has been built for this surface yet")]
	NoConfig,
	/// The canvas could not be exported as an image.
	#[error("image export failed: {0}")]
	Export(String),
}

pub type Result<T, E = ForceGraphError> = std::result::Result<T, E>;
