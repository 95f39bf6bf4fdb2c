use thiserror::Error;
use wasm_bindgen::JsValue;

/// Why a mount point's `data-*` configuration couldn't be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	#[error("Required attribute `{attribute}` is missing or empty")]
	Missing { attribute: &'static str },

	#[error("`data-interval-seconds` must be a positive finite number of seconds, but was {value:?}")]
	InvalidInterval { value: String },

	#[error("`data-interval-basis` must be `scheduled` or `settled`, but was {value:?}")]
	InvalidIntervalBasis { value: String },
}

/// Everything that can go wrong while polling a resource or rendering its response.
///
/// None of these are surfaced to the user.
/// Fetch failures stop the affected component's polling, render failures are isolated to the failing callback.
#[derive(Debug, Error)]
pub enum SyncError {
	/// The fetch was rejected or couldn't be issued.
	#[error("Transport failure: {0}")]
	Transport(String),

	#[error("Server responded with status {0}")]
	Status(u16),

	#[error("Malformed payload: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Malformed payload: expected a JSON object")]
	NotAnObject,

	#[error("Malformed payload: no HTML fragment at key {key:?}")]
	MissingFragment { key: String },

	#[error("No <form> with id {id:?} to serialize")]
	MissingForm { id: String },

	/// The diff/patch collaborator failed or is unavailable.
	#[error("Patch failure: {0}")]
	Patch(String),

	#[error("Could not schedule the next tick: {0}")]
	Timer(String),

	#[error(transparent)]
	Config(#[from] ConfigError),
}

impl From<SyncError> for JsValue {
	fn from(error: SyncError) -> Self {
		js_sys::Error::new(&error.to_string()).into()
	}
}

impl From<ConfigError> for JsValue {
	fn from(error: ConfigError) -> Self {
		SyncError::from(error).into()
	}
}
