//! The per-component poll loop.
//!
//! Each tick either starts a fetch of the component's resource or, if another tick already
//! started one, waits in the resource's queue to be served by it.
//! The loop ends for good once a delivered response carries the stop signal or a fetch the component was waiting on fails.

use crate::{ComponentConfig, FetchRequest, Host, IntervalBasis, Payload, QueueRegistry, Reconcile, RendererBinding, SyncError, Waiter};
use core::{cell::Cell, fmt};
use std::rc::Rc;
use tracing::{debug, error, info, trace, trace_span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
	Active,
	/// Terminal.
	Stopped,
}

/// Observes a running poll loop. Dropping it doesn't stop the loop.
pub struct PollHandle<H, R> {
	component: Rc<Component<H, R>>,
}

impl<H, R> Clone for PollHandle<H, R> {
	fn clone(&self) -> Self {
		Self {
			component: Rc::clone(&self.component),
		}
	}
}

impl<H, R> fmt::Debug for PollHandle<H, R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PollHandle")
			.field("resource", &self.component.config.resource)
			.field("state", &self.component.state.get())
			.finish()
	}
}

impl<H, R> PollHandle<H, R> {
	#[must_use]
	pub fn state(&self) -> PollState {
		self.component.state.get()
	}

	#[must_use]
	pub fn config(&self) -> &ComponentConfig {
		&self.component.config
	}
}

struct Component<H, R> {
	host: Rc<H>,
	registry: QueueRegistry,
	config: ComponentConfig,
	renderer: RendererBinding<R>,
	state: Cell<PollState>,
}

/// Starts polling `config.resource` for one component and runs the first tick immediately.
///
/// Components started with clones of the same `registry` share fetches of equal resources.
pub fn start<H, R>(host: Rc<H>, registry: QueueRegistry, config: ComponentConfig, reconciler: R) -> PollHandle<H, R>
where
	H: Host + 'static,
	R: Reconcile + 'static,
{
	info!(resource = %config.resource, interval = ?config.interval, basis = ?config.interval_basis, form = ?config.form, "Starting poll loop.");
	let component = Rc::new(Component {
		host,
		registry,
		renderer: RendererBinding::new(config.key.clone(), reconciler),
		config,
		state: Cell::new(PollState::Active),
	});
	Rc::clone(&component).tick();
	PollHandle { component }
}

impl<H, R> Component<H, R>
where
	H: Host + 'static,
	R: Reconcile + 'static,
{
	fn tick(self: Rc<Self>) {
		let span = trace_span!("Tick", resource = %self.config.resource);
		let _enter = span.enter();

		if self.state.get() == PollState::Stopped {
			return trace!("Stopped; not rescheduling.");
		}

		let mut fetching = false;
		if self.host.is_visible() {
			let len = self.registry.enqueue_waiter(&self.config.resource, self.waiter());
			if len == 1 {
				fetching = true;
				self.fetch();
			} else {
				trace!(len, "Fetch already in flight.");
			}
		} else {
			trace!("Page hidden; skipping this tick.");
		}

		if !(fetching && self.config.interval_basis == IntervalBasis::Settled) {
			self.schedule();
		}
	}

	/// The callback queued on this component's behalf for one tick.
	fn waiter(self: &Rc<Self>) -> Waiter {
		let component = Rc::clone(self);
		let abandoned = Rc::clone(self);
		Waiter::new(Box::new(move |payload: &Payload| {
			let rendered = component.renderer.render(payload);
			if payload.stop_requested() {
				component.stop("Server sent the stop signal.");
			}
			rendered
		}))
		.on_abandon(move |_| abandoned.stop("Fetch failed."))
	}

	fn fetch(self: &Rc<Self>) {
		let request = FetchRequest::for_component(&self.config);
		debug!(resource = %request.resource, method = request.method().as_str(), "Fetching.");
		let component = Rc::clone(self);
		self.host.fetch(request, Box::new(move |result| component.settle(result)));
	}

	fn settle(self: Rc<Self>, result: Result<Payload, SyncError>) {
		let span = trace_span!("Settle", resource = %self.config.resource);
		let _enter = span.enter();

		match result {
			Ok(payload) => {
				let report = self.registry.drain(&self.config.resource, &payload);
				debug!(rendered = report.rendered, failed = report.failed, "Delivered response.");
				if report.rendered > 0 {
					self.host.format_dates();
				}
			}
			Err(fetch_error) => {
				error!(error = %fetch_error, "Fetch failed.");
				let discarded = self.registry.discard(&self.config.resource, &fetch_error);
				debug!(discarded, "Stopped every waiter.");
				self.stop("Fetch failed.");
			}
		}

		if self.config.interval_basis == IntervalBasis::Settled {
			self.schedule();
		}
	}

	fn schedule(self: &Rc<Self>) {
		if self.state.get() == PollState::Stopped {
			return;
		}
		let component = Rc::clone(self);
		if let Err(timer_error) = self.host.set_timeout(self.config.interval, Box::new(move || component.tick())) {
			error!(error = %timer_error, "Could not schedule the next tick.");
			self.stop("No timer.");
		}
	}

	fn stop(&self, reason: &str) {
		if self.state.replace(PollState::Stopped) == PollState::Active {
			info!(resource = %self.config.resource, reason, "Polling stopped.");
		}
	}
}
