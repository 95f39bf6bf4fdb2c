use crate::{ConfigError, ResourceId};
use core::time::Duration;

pub const RESOURCE_ATTRIBUTE: &str = "data-resource";
pub const KEY_ATTRIBUTE: &str = "data-key";
pub const INTERVAL_ATTRIBUTE: &str = "data-interval-seconds";
pub const FORM_ATTRIBUTE: &str = "data-form";
pub const INTERVAL_BASIS_ATTRIBUTE: &str = "data-interval-basis";

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1500);

/// What the poll interval is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalBasis {
	/// The next tick is armed when the current one starts, so slow responses don't cause drift.
	Scheduled,
	/// A component that fetched arms its next tick only once its fetch settled.
	Settled,
}

impl Default for IntervalBasis {
	fn default() -> Self {
		Self::Scheduled
	}
}

/// A mounted component's configuration, read once when it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentConfig {
	pub resource: ResourceId,
	/// Selects the response field holding the HTML fragment.
	pub key: String,
	pub interval: Duration,
	/// Id of a `<form>` whose fields are POSTed. Without one, the resource is fetched with GET.
	pub form: Option<String>,
	pub interval_basis: IntervalBasis,
}

impl ComponentConfig {
	#[must_use]
	pub fn new(resource: impl Into<ResourceId>, key: impl Into<String>) -> Self {
		Self {
			resource: resource.into(),
			key: key.into(),
			interval: DEFAULT_INTERVAL,
			form: None,
			interval_basis: IntervalBasis::default(),
		}
	}

	/// Reads the configuration through `attribute`, which looks up a mount point attribute by name.
	///
	/// Empty optional attributes count as absent.
	///
	/// # Errors
	///
	/// Iff `data-resource` or `data-key` is missing, or an optional attribute has an invalid value.
	pub fn from_attributes(attribute: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let present = |name: &str| attribute(name).filter(|value| !value.trim().is_empty());
		let required = |name: &'static str| present(name).ok_or(ConfigError::Missing { attribute: name });

		let mut config = Self::new(required(RESOURCE_ATTRIBUTE)?, required(KEY_ATTRIBUTE)?);
		if let Some(seconds) = present(INTERVAL_ATTRIBUTE) {
			config.interval = parse_interval(&seconds)?;
		}
		config.form = present(FORM_ATTRIBUTE);
		if let Some(basis) = present(INTERVAL_BASIS_ATTRIBUTE) {
			config.interval_basis = match basis.trim() {
				"scheduled" => IntervalBasis::Scheduled,
				"settled" => IntervalBasis::Settled,
				_ => return Err(ConfigError::InvalidIntervalBasis { value: basis }),
			};
		}
		Ok(config)
	}
}

fn parse_interval(seconds: &str) -> Result<Duration, ConfigError> {
	// `try_from_secs_f64` rejects negative, non-finite and overlong values. Sub-nanosecond ones round to zero.
	match seconds.trim().parse::<f64>().ok().map(Duration::try_from_secs_f64) {
		Some(Ok(interval)) if !interval.is_zero() => Ok(interval),
		_ => Err(ConfigError::InvalidInterval { value: seconds.to_owned() }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn attributes<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl 'a + Fn(&str) -> Option<String> {
		move |name| pairs.iter().find(|(n, _)| *n == name).map(|(_, value)| (*value).to_owned())
	}

	#[test]
	fn defaults() {
		let config = ComponentConfig::from_attributes(attributes(&[("data-resource", "/status"), ("data-key", "fragment")])).unwrap();
		assert_eq!(config, ComponentConfig::new("/status", "fragment"));
		assert_eq!(config.interval, Duration::from_millis(1500));
		assert_eq!(config.form, None);
		assert_eq!(config.interval_basis, IntervalBasis::Scheduled);
	}

	#[test]
	fn all_attributes() {
		let config = ComponentConfig::from_attributes(attributes(&[
			("data-resource", "/jobs/1.json"),
			("data-key", "counts"),
			("data-interval-seconds", "0.5"),
			("data-form", "search"),
			("data-interval-basis", "settled"),
		]))
		.unwrap();
		assert_eq!(config.resource.as_str(), "/jobs/1.json");
		assert_eq!(config.key, "counts");
		assert_eq!(config.interval, Duration::from_millis(500));
		assert_eq!(config.form.as_deref(), Some("search"));
		assert_eq!(config.interval_basis, IntervalBasis::Settled);
	}

	#[test]
	fn empty_optionals_are_absent() {
		let config = ComponentConfig::from_attributes(attributes(&[
			("data-resource", "/status"),
			("data-key", "fragment"),
			("data-interval-seconds", ""),
			("data-form", " "),
		]))
		.unwrap();
		assert_eq!(config.interval, DEFAULT_INTERVAL);
		assert_eq!(config.form, None);
	}

	#[test]
	fn missing_required() {
		assert_eq!(
			ComponentConfig::from_attributes(attributes(&[("data-key", "fragment")])),
			Err(ConfigError::Missing { attribute: "data-resource" })
		);
		assert_eq!(
			ComponentConfig::from_attributes(attributes(&[("data-resource", "/status"), ("data-key", "")])),
			Err(ConfigError::Missing { attribute: "data-key" })
		);
	}

	#[test]
	fn invalid_values() {
		for seconds in ["0", "-1", "soon", "NaN", "inf", "1e300", "1e-12"] {
			assert_eq!(
				ComponentConfig::from_attributes(attributes(&[("data-resource", "/status"), ("data-key", "fragment"), ("data-interval-seconds", seconds)])),
				Err(ConfigError::InvalidInterval { value: seconds.to_owned() })
			);
		}
		assert!(matches!(
			ComponentConfig::from_attributes(attributes(&[("data-resource", "/status"), ("data-key", "fragment"), ("data-interval-basis", "eventually")])),
			Err(ConfigError::InvalidIntervalBasis { .. })
		));
	}
}
