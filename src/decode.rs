//! Helpers for turning raw event payloads into typed values.
//!
//! Payloads are [`serde_json::Value`]s. Paths are sequences of object field names.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
	#[error("missing field at `{path}`")]
	Missing { path: String },
	#[error("expected {expected} at `{path}`, found {found}")]
	Mismatch { path: String, expected: String, found: String },
	#[error("{0}")]
	Custom(String),
}

/// Walks `path` through nested objects.
///
/// # Errors
///
/// [`DecodeError::Missing`] if any segment is absent.
pub fn at<'a>(value: &'a Value, path: &[&str]) -> Result<&'a Value, DecodeError> {
	let mut current = value;
	for (i, segment) in path.iter().enumerate() {
		current = current.get(segment).ok_or_else(|| DecodeError::Missing { path: path[..=i].join(".") })?;
	}
	Ok(current)
}

/// Deserialises the value at `path`.
///
/// # Errors
///
/// Iff the field is missing or doesn't have the expected shape.
pub fn field<T: DeserializeOwned>(value: &Value, path: &[&str]) -> Result<T, DecodeError> {
	let found = at(value, path)?;
	T::deserialize(found).map_err(|error| DecodeError::Mismatch {
		path: path.join("."),
		expected: core::any::type_name::<T>().to_owned(),
		found: if cfg!(feature = "dangerous-logging") { format!("{} ({})", kind_of(found), error) } else { kind_of(found).to_owned() },
	})
}

/// # Errors
///
/// Iff there is no string at `path`.
pub fn string(value: &Value, path: &[&str]) -> Result<String, DecodeError> {
	field(value, path)
}

/// # Errors
///
/// Iff there is no boolean at `path`.
pub fn bool(value: &Value, path: &[&str]) -> Result<bool, DecodeError> {
	field(value, path)
}

/// Decodes `detail.formData` as written for `submit` events: a list of name/value pairs.
///
/// # Errors
///
/// Iff the field is missing or isn't a list of string pairs.
pub fn form_data(value: &Value) -> Result<Vec<(String, String)>, DecodeError> {
	field(value, &["detail", "formData"])
}

fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}
