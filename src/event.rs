//! Typed event handlers and their modifiers.

use crate::{
	attribute::Attr,
	decode::{self, DecodeError},
	effect::Effect,
	vattr::{Attribute, EventAttribute, RawEvent},
	vnode::AnyMessage,
};
use serde_json::Value;
use std::rc::Rc;

/// Events whose messages are rendered synchronously by default, so that text input never lags a frame behind.
#[must_use]
pub fn is_immediate_event(name: &str) -> bool {
	matches!(name, "input" | "change" | "focus" | "focusin" | "focusout" | "blur" | "select")
}

/// Listens for `name` events, decoding their payload with `decoder`. Payloads that fail to decode are dropped.
#[must_use]
pub fn on<Msg: 'static>(name: &str, decoder: impl Fn(&RawEvent) -> Result<Msg, DecodeError> + 'static) -> Attr<Msg> {
	let mut event = EventAttribute::new(
		name,
		Rc::new(move |raw: &RawEvent| decoder(raw).map(|message| Box::new(message) as AnyMessage)),
	);
	event.immediate = is_immediate_event(name);
	Attr::from_attribute(Attribute::Event(event))
}

#[must_use]
pub fn on_click<Msg: Clone + 'static>(message: Msg) -> Attr<Msg> {
	on("click", move |_| Ok(message.clone()))
}

#[must_use]
pub fn on_mouse_down<Msg: Clone + 'static>(message: Msg) -> Attr<Msg> {
	on("mousedown", move |_| Ok(message.clone()))
}

/// Receives `target.value`.
#[must_use]
pub fn on_input<Msg: 'static>(f: impl Fn(String) -> Msg + 'static) -> Attr<Msg> {
	on("input", move |raw| decode::string(raw, &["target", "value"]).map(&f))
}

/// Receives `target.value`.
#[must_use]
pub fn on_change<Msg: 'static>(f: impl Fn(String) -> Msg + 'static) -> Attr<Msg> {
	on("change", move |raw| decode::string(raw, &["target", "value"]).map(&f))
}

/// Receives `target.checked` of `change` events.
#[must_use]
pub fn on_check<Msg: 'static>(f: impl Fn(bool) -> Msg + 'static) -> Attr<Msg> {
	on("change", move |raw| decode::bool(raw, &["target", "checked"]).map(&f))
}

/// Receives the submitted form's entries. Prevents the browser's own submission.
#[must_use]
pub fn on_submit<Msg: 'static>(f: impl Fn(Vec<(String, String)>) -> Msg + 'static) -> Attr<Msg> {
	on("submit", move |raw| decode::form_data(raw).map(&f)).prevent_default()
}

#[must_use]
pub fn on_focus<Msg: Clone + 'static>(message: Msg) -> Attr<Msg> {
	on("focus", move |_| Ok(message.clone()))
}

#[must_use]
pub fn on_blur<Msg: Clone + 'static>(message: Msg) -> Attr<Msg> {
	on("blur", move |_| Ok(message.clone()))
}

/// Receives `key`.
#[must_use]
pub fn on_keydown<Msg: 'static>(f: impl Fn(String) -> Msg + 'static) -> Attr<Msg> {
	on("keydown", move |raw| decode::string(raw, &["key"]).map(&f)).include(["key"])
}

/// Emits a custom event from the runtime's root, for the embedding page to pick up.
pub fn emit<Msg: 'static>(name: impl Into<String>, data: Value) -> Effect<Msg> {
	Effect::event(name, data)
}

/// Modifiers. These do nothing on attributes that aren't event handlers.
impl<Msg> Attr<Msg> {
	#[must_use]
	pub fn prevent_default(self) -> Self {
		self.update_event(|event| event.prevent_default = true)
	}

	#[must_use]
	pub fn stop_propagation(self) -> Self {
		self.update_event(|event| event.stop_propagation = true)
	}

	#[must_use]
	pub fn immediate(self, immediate: bool) -> Self {
		self.update_event(|event| event.immediate = immediate)
	}

	/// Waits for `ms` milliseconds without further events before dispatching the last one.
	#[must_use]
	pub fn debounce(self, ms: u64) -> Self {
		self.update_event(|event| event.debounce = ms)
	}

	/// Dispatches at most once every `ms` milliseconds.
	#[must_use]
	pub fn throttle(self, ms: u64) -> Self {
		self.update_event(|event| event.throttle = ms)
	}

	/// Copies further dotted property paths out of the native event.
	#[must_use]
	pub fn include<S: Into<String>>(self, properties: impl IntoIterator<Item = S>) -> Self {
		let properties: Vec<String> = properties.into_iter().map(Into::into).collect();
		self.update_event(|event| event.include.extend(properties))
	}
}
