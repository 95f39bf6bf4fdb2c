//! A manual-clock [`Host`] and a recording [`Reconcile`] for native tests.

use crate::{FetchRequest, Host, Payload, Reconcile, Settle, SyncError, Tick};
use core::{
	cell::{Cell, RefCell},
	time::Duration,
};
use std::rc::Rc;

#[derive(Default)]
pub struct ManualHost {
	now: Cell<Duration>,
	hidden: Cell<bool>,
	timers: RefCell<Vec<(Duration, u64, Tick)>>,
	next_timer: Cell<u64>,
	in_flight: RefCell<Vec<(FetchRequest, Settle)>>,
	requests: RefCell<Vec<(Duration, FetchRequest)>>,
	date_passes: Cell<usize>,
	timer_failure: Cell<bool>,
}

impl ManualHost {
	pub fn new() -> Rc<Self> {
		Rc::new(Self::default())
	}

	pub fn now(&self) -> Duration {
		self.now.get()
	}

	pub fn set_hidden(&self, hidden: bool) {
		self.hidden.set(hidden)
	}

	pub fn fail_timers(&self) {
		self.timer_failure.set(true)
	}

	/// Fires every timer due up to and including `until`, in deadline order, advancing the clock as it goes.
	pub fn advance_to(&self, until: Duration) {
		loop {
			let due = {
				let mut timers = self.timers.borrow_mut();
				let next = timers
					.iter()
					.enumerate()
					.filter(|(_, (deadline, _, _))| *deadline <= until)
					.min_by_key(|(_, (deadline, sequence, _))| (*deadline, *sequence))
					.map(|(i, _)| i);
				next.map(|i| timers.remove(i))
			};
			match due {
				Some((deadline, _, tick)) => {
					self.now.set(deadline);
					tick();
				}
				None => break,
			}
		}
		self.now.set(until);
	}

	pub fn advance_by(&self, duration: Duration) {
		self.advance_to(self.now() + duration);
	}

	pub fn pending_timers(&self) -> usize {
		self.timers.borrow().len()
	}

	pub fn next_deadline(&self) -> Option<Duration> {
		self.timers.borrow().iter().map(|(deadline, _, _)| *deadline).min()
	}

	/// Every request issued so far, with the time it was issued.
	pub fn requests(&self) -> Vec<(Duration, FetchRequest)> {
		self.requests.borrow().clone()
	}

	pub fn request_count(&self) -> usize {
		self.requests.borrow().len()
	}

	pub fn in_flight(&self) -> usize {
		self.in_flight.borrow().len()
	}

	/// Settles the oldest in-flight fetch.
	pub fn respond(&self, result: Result<Payload, SyncError>) {
		let (_, settle) = self.in_flight.borrow_mut().remove(0);
		settle(result)
	}

	pub fn respond_json(&self, text: &str) {
		self.respond(Payload::from_json(text))
	}

	pub fn date_passes(&self) -> usize {
		self.date_passes.get()
	}
}

impl Host for ManualHost {
	fn is_visible(&self) -> bool {
		!self.hidden.get()
	}

	fn set_timeout(&self, delay: Duration, tick: Tick) -> Result<(), SyncError> {
		if self.timer_failure.get() {
			return Err(SyncError::Timer("timers disabled".to_owned()));
		}
		let sequence = self.next_timer.get();
		self.next_timer.set(sequence + 1);
		self.timers.borrow_mut().push((self.now() + delay, sequence, tick));
		Ok(())
	}

	fn fetch(&self, request: FetchRequest, settle: Settle) {
		self.requests.borrow_mut().push((self.now(), request.clone()));
		self.in_flight.borrow_mut().push((request, settle));
	}

	fn format_dates(&self) {
		self.date_passes.set(self.date_passes.get() + 1)
	}
}

/// Stands in for a mount point: a string of markup that only changes when a different fragment arrives.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
	content: Rc<RefCell<String>>,
	writes: Rc<Cell<usize>>,
	reconciliations: Rc<Cell<usize>>,
	log: Option<(Rc<RefCell<Vec<&'static str>>>, &'static str)>,
}

impl Recorder {
	/// A recorder that also appends `name` to `log` on every reconciliation.
	pub fn logging(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Self {
		Self {
			log: Some((Rc::clone(log), name)),
			..Self::default()
		}
	}

	pub fn content(&self) -> String {
		self.content.borrow().clone()
	}

	pub fn writes(&self) -> usize {
		self.writes.get()
	}

	pub fn reconciliations(&self) -> usize {
		self.reconciliations.get()
	}
}

impl Reconcile for Recorder {
	fn reconcile(&self, fragment: &str) -> Result<(), SyncError> {
		self.reconciliations.set(self.reconciliations.get() + 1);
		if let Some((log, name)) = &self.log {
			log.borrow_mut().push(*name);
		}
		if *self.content.borrow() != fragment {
			*self.content.borrow_mut() = fragment.to_owned();
			self.writes.set(self.writes.get() + 1);
		}
		Ok(())
	}
}
