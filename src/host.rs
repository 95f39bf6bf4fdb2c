//! The poll loop's view of the page it runs in.

use crate::{ComponentConfig, Payload, ResourceId, SyncError};
use core::time::Duration;

/// Runs on the host's event loop once a timer elapses.
pub type Tick = Box<dyn FnOnce()>;

/// Receives the outcome of a fetch. Called exactly once, in a later event loop turn or immediately.
pub type Settle = Box<dyn FnOnce(Result<Payload, SyncError>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
}

impl Method {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
		}
	}
}

/// What to fetch. Form fields are serialized by the host when the request is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
	pub resource: ResourceId,
	pub form: Option<String>,
}

impl FetchRequest {
	#[must_use]
	pub fn for_component(config: &ComponentConfig) -> Self {
		Self {
			resource: config.resource.clone(),
			form: config.form.clone(),
		}
	}

	/// POST iff there is a form to submit.
	#[must_use]
	pub fn method(&self) -> Method {
		if self.form.is_some() {
			Method::Post
		} else {
			Method::Get
		}
	}
}

/// Single-threaded access to the browser facilities polling needs.
///
/// Implementations must not call back into the poll loop synchronously from [`Host::set_timeout`].
pub trait Host {
	/// Whether the page is currently visible to the user.
	fn is_visible(&self) -> bool;

	/// Runs `tick` once after `delay`.
	///
	/// # Errors
	///
	/// Iff the timer couldn't be armed.
	fn set_timeout(&self, delay: Duration, tick: Tick) -> Result<(), SyncError>;

	/// Issues `request` and reports its decoded payload or failure to `settle`.
	fn fetch(&self, request: FetchRequest, settle: Settle);

	/// The page-wide date-formatting pass, run after fresh content was rendered.
	fn format_dates(&self);
}
