//! Typed attributes.

use crate::{
	element::erase,
	vattr::{Attribute, EventAttribute, RawEvent},
	vnode::AnyMessage,
};
use core::{fmt::Debug, marker::PhantomData};
use serde_json::Value;
use std::rc::Rc;

/// An [`Attribute`] whose event handler (if any) produces `Msg`.
pub struct Attr<Msg> {
	attribute: Attribute,
	_message: PhantomData<fn() -> Msg>,
}

impl<Msg> Clone for Attr<Msg> {
	fn clone(&self) -> Self {
		Self::from_attribute(self.attribute.clone())
	}
}

impl<Msg> Debug for Attr<Msg> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		self.attribute.fmt(f)
	}
}

impl<Msg> Attr<Msg> {
	/// The caller vouches that a contained handler produces `Msg`.
	#[must_use]
	pub fn from_attribute(attribute: Attribute) -> Self {
		Self {
			attribute,
			_message: PhantomData,
		}
	}

	#[must_use]
	pub fn into_attribute(self) -> Attribute {
		self.attribute
	}

	#[must_use]
	pub fn as_attribute(&self) -> &Attribute {
		&self.attribute
	}

	pub(crate) fn update_event(mut self, f: impl FnOnce(&mut EventAttribute)) -> Self {
		if let Attribute::Event(event) = &mut self.attribute {
			f(event);
		}
		self
	}
}

impl<Msg: 'static> Attr<Msg> {
	/// Moves an event handler into a parent's message space. Other attributes are unaffected.
	#[must_use]
	pub fn map<Outer: 'static>(self, f: impl Fn(Msg) -> Outer + 'static) -> Attr<Outer> {
		let attribute = match self.attribute {
			Attribute::Event(mut event) => {
				let mapper = erase(f);
				let handler = event.handler;
				event.handler = Rc::new(move |raw: &RawEvent| handler(raw).map(|message: AnyMessage| mapper(message)));
				Attribute::Event(event)
			}
			other => other,
		};
		Attr::from_attribute(attribute)
	}
}

#[must_use]
pub fn attribute<Msg>(name: impl Into<String>, value: impl Into<String>) -> Attr<Msg> {
	Attr::from_attribute(Attribute::attribute(name, value))
}

#[must_use]
pub fn property<Msg>(name: impl Into<String>, value: impl Into<Value>) -> Attr<Msg> {
	Attr::from_attribute(Attribute::property(name, value))
}

/// `true` renders as an empty attribute. `false` clears the matching property instead, which also covers removal.
#[must_use]
pub fn boolean_attribute<Msg>(name: impl Into<String>, value: bool) -> Attr<Msg> {
	if value {
		attribute(name, "")
	} else {
		property(name, false)
	}
}

#[must_use]
pub fn class<Msg>(name: impl Into<String>) -> Attr<Msg> {
	attribute("class", name)
}

/// The names whose flag is `true`, joined.
#[must_use]
pub fn classes<Msg, S: AsRef<str>>(names: impl IntoIterator<Item = (S, bool)>) -> Attr<Msg> {
	let names: Vec<String> = names.into_iter().filter(|(_, active)| *active).map(|(name, _)| name.as_ref().to_owned()).collect();
	class(names.join(" "))
}

#[must_use]
pub fn id<Msg>(id: impl Into<String>) -> Attr<Msg> {
	attribute("id", id)
}

#[must_use]
pub fn style<Msg>(property: &str, value: &str) -> Attr<Msg> {
	attribute("style", format!("{}:{}", property, value))
}

#[must_use]
pub fn name<Msg>(name: impl Into<String>) -> Attr<Msg> {
	attribute("name", name)
}

#[must_use]
pub fn href<Msg>(url: impl Into<String>) -> Attr<Msg> {
	attribute("href", url)
}

/// Named with a trailing underscore, as `type` is a keyword.
#[must_use]
pub fn type_<Msg>(kind: impl Into<String>) -> Attr<Msg> {
	attribute("type", kind)
}

#[must_use]
pub fn for_<Msg>(id: impl Into<String>) -> Attr<Msg> {
	attribute("for", id)
}

#[must_use]
pub fn placeholder<Msg>(text: impl Into<String>) -> Attr<Msg> {
	attribute("placeholder", text)
}

/// Sets both the attribute and the live `value` property.
#[must_use]
pub fn value<Msg>(value: impl Into<String>) -> Attr<Msg> {
	attribute("value", value)
}

/// The initial value of an otherwise uncontrolled input.
#[must_use]
pub fn default_value<Msg>(value: impl Into<String>) -> Attr<Msg> {
	attribute("virtual:defaultValue", value)
}

#[must_use]
pub fn checked<Msg>(checked: bool) -> Attr<Msg> {
	boolean_attribute("checked", checked)
}

#[must_use]
pub fn selected<Msg>(selected: bool) -> Attr<Msg> {
	boolean_attribute("selected", selected)
}

#[must_use]
pub fn disabled<Msg>(disabled: bool) -> Attr<Msg> {
	boolean_attribute("disabled", disabled)
}

/// Focuses the element once it's inserted.
#[must_use]
pub fn autofocus<Msg>(autofocus: bool) -> Attr<Msg> {
	boolean_attribute("autofocus", autofocus)
}

/// Placeholder for conditionally absent attributes.
#[must_use]
pub fn none<Msg>() -> Attr<Msg> {
	class("")
}
