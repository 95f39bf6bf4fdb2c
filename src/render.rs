use crate::{Payload, SyncError};
use tracing::{instrument, trace};

/// The diff/patch collaborator, bound to one mount point.
///
/// Reconciling the same fragment twice in a row must leave the DOM untouched the second time,
/// and nodes the patch doesn't touch keep their focus and input state.
pub trait Reconcile {
	/// Diffs the mount point against `fragment` and applies the resulting patch.
	///
	/// # Errors
	///
	/// Iff the fragment can't be parsed or the patch can't be computed or applied.
	fn reconcile(&self, fragment: &str) -> Result<(), SyncError>;
}

impl<R: Reconcile + ?Sized> Reconcile for Box<R> {
	fn reconcile(&self, fragment: &str) -> Result<(), SyncError> {
		(**self).reconcile(fragment)
	}
}

/// Selects a component's fragment from each payload and hands it to the reconciler.
#[derive(Debug)]
pub struct RendererBinding<R> {
	key: String,
	reconciler: R,
}

impl<R: Reconcile> RendererBinding<R> {
	pub fn new(key: impl Into<String>, reconciler: R) -> Self {
		Self { key: key.into(), reconciler }
	}

	#[must_use]
	pub fn key(&self) -> &str {
		&self.key
	}

	/// # Errors
	///
	/// Iff the payload has no fragment at this binding's key, or reconciliation fails.
	#[instrument(skip(self, payload), fields(key = %self.key))]
	pub fn render(&self, payload: &Payload) -> Result<(), SyncError> {
		let fragment = payload.fragment(&self.key)?;
		if cfg!(feature = "dangerous-logging") {
			trace!(fragment, "Reconciling.");
		} else {
			trace!(len = fragment.len(), "Reconciling.");
		}
		self.reconciler.reconcile(fragment)
	}
}
