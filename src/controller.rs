use crate::{poll, ComponentConfig, ConfigError, Host, PollHandle, QueueRegistry, Reconcile};
use std::rc::Rc;
use tracing::instrument;

/// Starts components against one host, sharing one [`QueueRegistry`] between all of them.
#[derive(Debug)]
pub struct Controller<H> {
	host: Rc<H>,
	registry: QueueRegistry,
}

impl<H> Clone for Controller<H> {
	fn clone(&self) -> Self {
		Self {
			host: Rc::clone(&self.host),
			registry: self.registry.clone(),
		}
	}
}

impl<H: Host + 'static> Controller<H> {
	#[must_use]
	pub fn new(host: Rc<H>) -> Self {
		Self {
			host,
			registry: QueueRegistry::new(),
		}
	}

	#[must_use]
	pub fn registry(&self) -> &QueueRegistry {
		&self.registry
	}

	/// Reads a mount point's configuration through `attribute` (once) and starts its poll loop.
	///
	/// # Errors
	///
	/// Iff the configuration is incomplete or invalid, in which case nothing is started.
	#[instrument(skip(self, attribute, reconciler))]
	pub fn start<R: Reconcile + 'static>(&self, attribute: impl Fn(&str) -> Option<String>, reconciler: R) -> Result<PollHandle<H, R>, ConfigError> {
		let config = ComponentConfig::from_attributes(attribute)?;
		Ok(poll::start(Rc::clone(&self.host), self.registry.clone(), config, reconciler))
	}
}
