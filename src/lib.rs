//! Live content for server-rendered pages.
//!
//! Mounted components poll a JSON endpoint and patch the HTML fragment they find in each response into their subtree.
//! Components watching the same resource share a single in-flight request: see [`QueueRegistry`].
//!
//! The browser side lives in [`web`]. Everything else is host-agnostic, which is how it's tested natively.

#![doc(html_root_url = "https://docs.rs/update-content/0.0.1")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod config;
mod controller;
pub mod details;
mod error;
mod host;
mod payload;
pub mod poll;
mod queue;
mod render;
pub mod web;

#[cfg(test)]
mod testing;

pub use config::{ComponentConfig, IntervalBasis, DEFAULT_INTERVAL, FORM_ATTRIBUTE, INTERVAL_ATTRIBUTE, INTERVAL_BASIS_ATTRIBUTE, KEY_ATTRIBUTE, RESOURCE_ATTRIBUTE};
pub use controller::Controller;
pub use error::{ConfigError, SyncError};
pub use host::{FetchRequest, Host, Method, Settle, Tick};
pub use payload::{Payload, STOP_FIELD};
pub use poll::{PollHandle, PollState};
pub use queue::{Abandon, DrainReport, QueueRegistry, Renderer, ResourceId, Waiter};
pub use render::{Reconcile, RendererBinding};
