//! Per-resource queues of renderers waiting for the next response.
//!
//! The queue length returned by [`QueueRegistry::enqueue`] is the only thing that keeps
//! components watching the same resource from fetching it concurrently:
//! whoever makes a queue non-empty fetches, everyone else waits for that fetch.

use crate::{Payload, SyncError};
use core::{cell::RefCell, fmt, mem};
use hashbrown::HashMap;
use std::{collections::VecDeque, rc::Rc};
use tracing::{trace, trace_span, warn};

/// Identifies a pollable endpoint, usually a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(Rc<str>);

impl ResourceId {
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ResourceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ResourceId {
	fn from(value: &str) -> Self {
		Self(value.into())
	}
}

impl From<String> for ResourceId {
	fn from(value: String) -> Self {
		Self(value.into())
	}
}

/// Consumes one response on behalf of one mounted component.
pub type Renderer = Box<dyn FnOnce(&Payload) -> Result<(), SyncError>>;

/// Told why the response its [`Waiter`] was queued for will never arrive.
pub type Abandon = Box<dyn FnOnce(&SyncError)>;

/// A queued [`Renderer`] together with what to do if its fetch fails instead.
pub struct Waiter {
	renderer: Renderer,
	abandon: Option<Abandon>,
}

impl Waiter {
	#[must_use]
	pub fn new(renderer: Renderer) -> Self {
		Self { renderer, abandon: None }
	}

	/// Runs `abandon` instead of the renderer when the queue is [discarded](`QueueRegistry::discard`).
	#[must_use]
	pub fn on_abandon(self, abandon: impl 'static + FnOnce(&SyncError)) -> Self {
		Self {
			abandon: Some(Box::new(abandon)),
			..self
		}
	}
}

impl fmt::Debug for Waiter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Waiter").field("abandon", &self.abandon.is_some()).finish_non_exhaustive()
	}
}

/// Outcome of a [`QueueRegistry::drain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
	pub rendered: usize,
	pub failed: usize,
}

impl DrainReport {
	#[must_use]
	pub fn invoked(self) -> usize {
		self.rendered + self.failed
	}
}

/// Shared handle to the registry. Clones refer to the same queues.
///
/// Created empty, lives as long as the last handle, which is normally the page.
#[derive(Clone, Default)]
pub struct QueueRegistry {
	queues: Rc<RefCell<HashMap<ResourceId, VecDeque<Waiter>>>>,
}

impl fmt::Debug for QueueRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let queues = self.queues.borrow();
		f.debug_map().entries(queues.iter().map(|(resource, queue)| (resource, queue.len()))).finish()
	}
}

impl QueueRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `renderer` to `resource`'s queue and returns the queue's new length.
	///
	/// `1` means the caller must fetch `resource`. Anything larger means a fetch is already in flight and will serve `renderer`.
	pub fn enqueue(&self, resource: &ResourceId, renderer: Renderer) -> usize {
		self.enqueue_waiter(resource, Waiter::new(renderer))
	}

	/// Like [`enqueue`](`QueueRegistry::enqueue`), for a renderer that must hear about failed fetches.
	pub fn enqueue_waiter(&self, resource: &ResourceId, waiter: Waiter) -> usize {
		let mut queues = self.queues.borrow_mut();
		let queue = queues.entry(resource.clone()).or_default();
		queue.push_back(waiter);
		trace!(%resource, len = queue.len(), "Enqueued renderer.");
		queue.len()
	}

	/// Invokes every renderer queued for `resource` with `payload`, in insertion order, and leaves the queue empty.
	///
	/// The queue is detached before the first renderer runs, so renderers may enqueue again.
	/// A failing renderer doesn't keep the ones after it from running.
	pub fn drain(&self, resource: &ResourceId, payload: &Payload) -> DrainReport {
		let queue = self.take(resource);
		let span = trace_span!("Draining", %resource, len = queue.len());
		let _enter = span.enter();

		let mut report = DrainReport::default();
		for waiter in queue {
			match (waiter.renderer)(payload) {
				Ok(()) => report.rendered += 1,
				Err(error) => {
					warn!(%resource, %error, "Renderer failed; continuing with the rest of the queue.");
					report.failed += 1;
				}
			}
		}
		report
	}

	/// Empties `resource`'s queue without rendering and returns how many waiters were dropped.
	///
	/// Each waiter's abandon hook, if any, runs with `reason` in insertion order, on the detached queue like [`drain`](`QueueRegistry::drain`).
	pub fn discard(&self, resource: &ResourceId, reason: &SyncError) -> usize {
		let queue = self.take(resource);
		let discarded = queue.len();
		let span = trace_span!("Discarding", %resource, discarded);
		let _enter = span.enter();

		for waiter in queue {
			if let Some(abandon) = waiter.abandon {
				abandon(reason);
			}
		}
		discarded
	}

	#[must_use]
	pub fn len(&self, resource: &ResourceId) -> usize {
		self.queues.borrow().get(resource).map_or(0, VecDeque::len)
	}

	/// Whether no renderer is waiting on any resource, i.e. no fetch is in flight.
	#[must_use]
	pub fn is_idle(&self) -> bool {
		self.queues.borrow().values().all(VecDeque::is_empty)
	}

	fn take(&self, resource: &ResourceId) -> VecDeque<Waiter> {
		self.queues.borrow_mut().get_mut(resource).map(mem::take).unwrap_or_default()
	}
}
