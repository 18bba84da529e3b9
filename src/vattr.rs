//! Untyped element attributes and their canonical ordering.

use crate::{decode::DecodeError, vnode::AnyMessage};
use core::{cmp::Ordering, fmt::Debug};
use serde_json::Value;
use std::rc::Rc;

/// A raw event payload as handed over by the live document.
pub type RawEvent = Value;

/// Turns a [`RawEvent`] into a type-erased message.
pub type Decoder = Rc<dyn Fn(&RawEvent) -> Result<AnyMessage, DecodeError>>;

/// One entry of an element's attribute list.
///
/// Element attribute lists are kept sorted by [name](`Attribute::name`) (see [`prepare`]),
/// which lets [`diff`](`crate::diff`) merge them linearly.
#[derive(Clone)]
pub enum Attribute {
	/// Reflected as DOM attribute. Compared by string equality.
	Attribute { name: String, value: String },
	/// Assigned as object property only. Compared by value equality.
	Property { name: String, value: Value },
	Event(EventAttribute),
}

/// A declared event listener.
#[derive(Clone)]
pub struct EventAttribute {
	pub name: String,
	pub handler: Decoder,
	/// Dotted property paths copied out of the native event when it's serialised.
	pub include: Vec<String>,
	pub prevent_default: bool,
	pub stop_propagation: bool,
	/// Skip animation frame batching for messages produced by this listener.
	pub immediate: bool,
	/// In milliseconds. `0` disables debouncing.
	pub debounce: u64,
	/// In milliseconds. `0` disables throttling.
	pub throttle: u64,
}

impl EventAttribute {
	#[must_use]
	pub fn new(name: impl Into<String>, handler: Decoder) -> Self {
		Self {
			name: name.into(),
			handler,
			include: Vec::new(),
			prevent_default: false,
			stop_propagation: false,
			immediate: false,
			debounce: 0,
			throttle: 0,
		}
	}

	/// Whether the listener options (everything except the handler itself) are equal.
	#[must_use]
	pub fn same_options(&self, other: &Self) -> bool {
		self.prevent_default == other.prevent_default
			&& self.stop_propagation == other.stop_propagation
			&& self.immediate == other.immediate
			&& self.debounce == other.debounce
			&& self.throttle == other.throttle
	}
}

impl Debug for EventAttribute {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("EventAttribute")
			.field("name", &self.name)
			.field("handler", &(Rc::as_ptr(&self.handler) as *const ()))
			.field("include", &self.include)
			.field("prevent_default", &self.prevent_default)
			.field("stop_propagation", &self.stop_propagation)
			.field("immediate", &self.immediate)
			.field("debounce", &self.debounce)
			.field("throttle", &self.throttle)
			.finish()
	}
}

impl Debug for Attribute {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Self::Attribute { name, value } => {
				if cfg!(feature = "dangerous-logging") {
					write!(f, "{}={:?}", name, value)
				} else {
					write!(f, "{}=…", name)
				}
			}
			Self::Property { name, value } => {
				if cfg!(feature = "dangerous-logging") {
					write!(f, ".{}={}", name, value)
				} else {
					write!(f, ".{}=…", name)
				}
			}
			Self::Event(event) => write!(f, "on:{}", event.name),
		}
	}
}

impl Attribute {
	#[must_use]
	pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self::Attribute { name: name.into(), value: value.into() }
	}

	#[must_use]
	pub fn property(name: impl Into<String>, value: impl Into<Value>) -> Self {
		Self::Property { name: name.into(), value: value.into() }
	}

	#[must_use]
	pub fn name(&self) -> &str {
		match self {
			Self::Attribute { name, .. } | Self::Property { name, .. } | Self::Event(EventAttribute { name, .. }) => name,
		}
	}

	#[must_use]
	pub fn as_event(&self) -> Option<&EventAttribute> {
		match self {
			Self::Event(event) => Some(event),
			Self::Attribute { .. } | Self::Property { .. } => None,
		}
	}

	/// Canonical ordering: by name only.
	#[must_use]
	pub fn compare(&self, other: &Self) -> Ordering {
		self.name().cmp(other.name())
	}
}

/// Brings an attribute list into canonical form.
///
/// Lists with fewer than two entries are returned unchanged.
/// Otherwise the list is stably sorted by name, adjacent `class` values are joined with `' '`,
/// adjacent `style` values with `';'`, and attributes with an empty name or an empty `class`/`style` value are dropped.
#[must_use]
pub fn prepare(mut attributes: Vec<Attribute>) -> Vec<Attribute> {
	if attributes.len() < 2 {
		return attributes;
	}

	attributes.sort_by(Attribute::compare);

	let mut merged: Vec<Attribute> = Vec::with_capacity(attributes.len());
	for attribute in attributes {
		if let Attribute::Attribute { name, value } = &attribute {
			if name.is_empty() || (value.is_empty() && (name == "class" || name == "style")) {
				continue;
			}
		}

		if let (Some(Attribute::Attribute { name: previous_name, value: previous }), Attribute::Attribute { name, value }) = (merged.last_mut(), &attribute) {
			if previous_name == name {
				match name.as_str() {
					"class" => {
						previous.push(' ');
						previous.push_str(value);
						continue;
					}
					"style" => {
						previous.push(';');
						previous.push_str(value);
						continue;
					}
					_ => (),
				}
			}
		}

		merged.push(attribute);
	}
	merged
}
