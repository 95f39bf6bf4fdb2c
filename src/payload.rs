use crate::SyncError;
use serde_json::{Map, Value};

/// Name of the numeric field that ends polling when it equals `1`.
pub const STOP_FIELD: &str = "stop";

/// A decoded JSON response: a mapping from field names to values.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
	/// Decodes a response body.
	///
	/// # Errors
	///
	/// Iff `text` isn't valid JSON or isn't a JSON object.
	pub fn from_json(text: &str) -> Result<Self, SyncError> {
		match serde_json::from_str(text)? {
			Value::Object(fields) => Ok(Self(fields)),
			_ => Err(SyncError::NotAnObject),
		}
	}

	/// Selects the HTML fragment stored at `key`.
	///
	/// # Errors
	///
	/// Iff there is no such field or its value isn't a string.
	pub fn fragment(&self, key: &str) -> Result<&str, SyncError> {
		self.0
			.get(key)
			.and_then(Value::as_str)
			.ok_or_else(|| SyncError::MissingFragment { key: key.to_owned() })
	}

	/// Whether the server asked for polling to end, that is `stop` is exactly the number `1`.
	#[must_use]
	#[allow(clippy::float_cmp)]
	pub fn stop_requested(&self) -> bool {
		self.0.get(STOP_FIELD).and_then(Value::as_f64) == Some(1.0)
	}
}

impl From<Map<String, Value>> for Payload {
	fn from(fields: Map<String, Value>) -> Self {
		Self(fields)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn selects_fragment_by_key() {
		let payload = Payload::from_json(r#"{ "fragment": "<div>ok</div>", "other": "<p></p>", "stop": 0 }"#).unwrap();
		assert_eq!(payload.fragment("fragment").unwrap(), "<div>ok</div>");
		assert_eq!(payload.fragment("other").unwrap(), "<p></p>");
		assert!(!payload.stop_requested());
	}

	#[test]
	fn missing_or_non_string_fragment_is_malformed() {
		let payload = Payload::from_json(r#"{ "count": 3 }"#).unwrap();
		assert!(matches!(payload.fragment("fragment"), Err(SyncError::MissingFragment { key }) if key == "fragment"));
		assert!(matches!(payload.fragment("count"), Err(SyncError::MissingFragment { .. })));
	}

	#[test]
	fn only_numeric_one_stops() {
		for (text, expected) in [
			(r#"{ "stop": 1 }"#, true),
			(r#"{ "stop": 1.0 }"#, true),
			(r#"{ "stop": 0 }"#, false),
			(r#"{ "stop": 2 }"#, false),
			(r#"{ "stop": "1" }"#, false),
			(r#"{ "stop": true }"#, false),
			("{}", false),
		] {
			assert_eq!(Payload::from_json(text).unwrap().stop_requested(), expected, "{}", text);
		}
	}

	#[test]
	fn rejects_non_objects() {
		assert!(matches!(Payload::from_json("[1, 2]"), Err(SyncError::NotAnObject)));
		assert!(matches!(Payload::from_json("<html>"), Err(SyncError::Json(_))));
	}
}
