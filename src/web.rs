//! The browser backend: a [`Document`] over `web_sys` and a [`Platform`] over the window's event loop.

use crate::{
	document::{Document, NodeType},
	error::Error,
	platform::{FrameId, Platform, Task, TimerId},
	reconciler::{EventOutcome, MetaId},
	runtime::{App, Runtime},
};
use core::cell::RefCell;
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::{error, instrument, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{AddEventListenerOptions, CustomEvent, CustomEventInit, FormData, HtmlElement, HtmlFormElement, HtmlMediaElement, Node, Window};

/// The expando property that holds a node's [`MetaId`].
const META_PROPERTY: &str = "__cambiumMeta";

pub type WebHandler = Rc<dyn Fn(&Node, &str, &web_sys::Event) -> EventOutcome>;

/// A [`Document`] over the browser DOM.
///
/// All listeners share one closure, which forwards to the handler set with [`set_handler`](`WebDocument::set_handler`).
#[derive(Clone)]
pub struct WebDocument {
	document: web_sys::Document,
	handler: Rc<RefCell<Option<WebHandler>>>,
	listener: Rc<Closure<dyn Fn(web_sys::Event)>>,
}

impl core::fmt::Debug for WebDocument {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("WebDocument").field("has_handler", &self.handler.borrow().is_some()).finish_non_exhaustive()
	}
}

impl WebDocument {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		let handler: Rc<RefCell<Option<WebHandler>>> = Rc::default();
		let listener = {
			let handler = Rc::clone(&handler);
			Closure::wrap(Box::new(move |event: web_sys::Event| {
				let Some(target) = event.current_target().and_then(|target| target.dyn_into::<Node>().ok()) else {
					return;
				};
				let handler = handler.borrow().clone();
				let Some(handler) = handler else {
					return warn!("Event arrived before a handler was set. Ignoring.");
				};
				let name = event.type_();
				let outcome = handler(&target, name.as_str(), &event);
				if outcome.prevent_default {
					event.prevent_default();
				}
				if outcome.stop_propagation {
					event.stop_propagation();
				}
			}) as Box<dyn Fn(web_sys::Event)>)
		};
		Self {
			document,
			handler,
			listener: Rc::new(listener),
		}
	}

	pub fn set_handler(&self, handler: WebHandler) {
		*self.handler.borrow_mut() = Some(handler);
	}
}

fn to_js(value: &Value) -> JsValue {
	match value {
		Value::Null => JsValue::NULL,
		Value::Bool(bool) => JsValue::from_bool(*bool),
		Value::Number(number) => number.as_f64().map_or(JsValue::NULL, JsValue::from_f64),
		Value::String(string) => JsValue::from_str(string),
		Value::Array(_) | Value::Object(_) => js_sys::JSON::parse(&value.to_string()).unwrap_or(JsValue::UNDEFINED),
	}
}

fn to_json(value: &JsValue) -> Value {
	if let Some(bool) = value.as_bool() {
		Value::Bool(bool)
	} else if let Some(number) = value.as_f64() {
		serde_json::Number::from_f64(number).map_or(Value::Null, Value::Number)
	} else if let Some(string) = value.as_string() {
		Value::String(string)
	} else if value.is_null() || value.is_undefined() {
		Value::Null
	} else {
		js_sys::JSON::stringify(value)
			.ok()
			.and_then(|json| json.as_string())
			.and_then(|json| serde_json::from_str(&json).ok())
			.unwrap_or(Value::Null)
	}
}

/// Follows a dotted property path, or returns [`None`] on `undefined`.
fn get_path(root: &JsValue, path: &str) -> Option<JsValue> {
	let mut current = root.clone();
	for segment in path.split('.') {
		current = js_sys::Reflect::get(&current, &JsValue::from_str(segment)).ok()?;
		if current.is_undefined() {
			return None;
		}
	}
	Some(current)
}

fn set_path(data: &mut Map<String, Value>, path: &str, value: Value) {
	let mut segments = path.split('.').peekable();
	let mut current = data;
	while let Some(segment) = segments.next() {
		if segments.peek().is_none() {
			current.insert(segment.to_owned(), value);
			return;
		}
		let next = current.entry(segment.to_owned()).or_insert_with(|| Value::Object(Map::new()));
		if !next.is_object() {
			*next = Value::Object(Map::new());
		}
		let Value::Object(next) = next else { return };
		current = next;
	}
}

fn form_data(event: &web_sys::Event) -> Option<Value> {
	let form = event.target()?.dyn_into::<HtmlFormElement>().ok()?;
	let form_data = FormData::new_with_form(&form).ok()?;
	let entries = js_sys::try_iter(&form_data).ok()??;
	let mut pairs = Vec::new();
	for entry in entries {
		let entry = js_sys::Array::from(&entry.ok()?);
		// Files don't have a string value and are skipped.
		if let (Some(name), Some(value)) = (entry.get(0).as_string(), entry.get(1).as_string()) {
			pairs.push(Value::Array(vec![Value::String(name), Value::String(value)]));
		}
	}
	Some(Value::Array(pairs))
}

impl Document for WebDocument {
	type Node = Node;
	type Event = web_sys::Event;

	fn create_element(&self, namespace: &str, tag: &str) -> Node {
		let element = if namespace.is_empty() {
			self.document.create_element(tag)
		} else {
			self.document.create_element_ns(Some(namespace), tag)
		};
		match element {
			Ok(element) => element.into(),
			Err(_) => {
				error!("Failed to create element. Substituting a comment.");
				self.document.create_comment("").into()
			}
		}
	}

	fn create_text(&self, data: &str) -> Node {
		self.document.create_text_node(data).into()
	}

	fn create_fragment(&self) -> Node {
		self.document.create_document_fragment().into()
	}

	fn insert_before(&self, parent: &Node, node: &Node, reference: Option<&Node>) {
		if parent.insert_before(node, reference).is_err() {
			error!("Failed to insert node.");
		}
	}

	fn remove_child(&self, parent: &Node, child: &Node) {
		if parent.remove_child(child).is_err() {
			error!("Failed to remove child node.");
		}
	}

	fn parent(&self, node: &Node) -> Option<Node> {
		node.parent_node()
	}

	fn first_child(&self, node: &Node) -> Option<Node> {
		node.first_child()
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		node.next_sibling()
	}

	fn node_type(&self, node: &Node) -> NodeType {
		match node.node_type() {
			Node::ELEMENT_NODE => match node.dyn_ref::<web_sys::Element>() {
				Some(element) => NodeType::Element {
					namespace: element.namespace_uri().unwrap_or_default(),
					tag: element.local_name(),
				},
				None => NodeType::Other,
			},
			Node::TEXT_NODE => NodeType::Text(node.text_content().unwrap_or_default()),
			_ => NodeType::Other,
		}
	}

	fn attributes(&self, element: &Node) -> Vec<(String, String)> {
		let Some(element) = element.dyn_ref::<web_sys::Element>() else {
			return Vec::new();
		};
		let attributes = element.attributes();
		(0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| (attribute.name(), attribute.value())).collect()
	}

	fn get_attribute(&self, element: &Node, name: &str) -> Option<String> {
		element.dyn_ref::<web_sys::Element>()?.get_attribute(name)
	}

	fn set_attribute(&self, element: &Node, name: &str, value: &str) {
		let Some(element) = element.dyn_ref::<web_sys::Element>() else {
			return error!("Tried to set an attribute on a non-element.");
		};
		if element.set_attribute(name, value).is_err() {
			if cfg!(feature = "dangerous-logging") {
				error!(name, "Failed to set attribute.");
			} else {
				error!("Failed to set attribute.");
			}
		}
	}

	fn remove_attribute(&self, element: &Node, name: &str) {
		if let Some(element) = element.dyn_ref::<web_sys::Element>() {
			if element.remove_attribute(name).is_err() {
				error!("Failed to remove attribute.");
			}
		}
	}

	fn set_property(&self, node: &Node, name: &str, value: &Value) {
		if js_sys::Reflect::set(node, &JsValue::from_str(name), &to_js(value)).is_err() {
			error!("Failed to set property.");
		}
	}

	fn set_text(&self, node: &Node, data: &str) {
		node.set_text_content(Some(data));
	}

	fn set_inner_html(&self, element: &Node, html: &str) {
		match element.dyn_ref::<web_sys::Element>() {
			Some(element) => element.set_inner_html(html),
			None => error!("Tried to set the inner HTML of a non-element."),
		}
	}

	fn add_event_listener(&self, node: &Node, name: &str, passive: bool) {
		let options = AddEventListenerOptions::new();
		options.set_passive(passive);
		if node
			.add_event_listener_with_callback_and_add_event_listener_options(name, (*self.listener).as_ref().unchecked_ref(), &options)
			.is_err()
		{
			error!("Failed to add event listener.");
		}
	}

	fn remove_event_listener(&self, node: &Node, name: &str) {
		if node.remove_event_listener_with_callback(name, (*self.listener).as_ref().unchecked_ref()).is_err() {
			error!("Failed to remove event listener.");
		}
	}

	fn focus(&self, element: &Node) {
		if let Some(element) = element.dyn_ref::<HtmlElement>() {
			if element.focus().is_err() {
				warn!("Failed to focus element.");
			}
		}
	}

	fn play(&self, element: &Node) {
		if let Some(element) = element.dyn_ref::<HtmlMediaElement>() {
			if element.play().is_err() {
				warn!("Failed to start playback.");
			}
		}
	}

	#[allow(clippy::cast_precision_loss)]
	fn bind(&self, node: &Node, meta: MetaId) {
		if js_sys::Reflect::set(node, &JsValue::from_str(META_PROPERTY), &JsValue::from_f64(meta.to_bits() as f64)).is_err() {
			error!("Failed to bind metadata to node.");
		}
	}

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	fn bound(&self, node: &Node) -> Option<MetaId> {
		let bits = js_sys::Reflect::get(node, &JsValue::from_str(META_PROPERTY)).ok()?.as_f64()?;
		Some(MetaId::from_bits(bits as u64))
	}

	fn serialize_event(&self, event: &web_sys::Event, include: &[String]) -> Value {
		let mut data = Map::new();
		for path in ["target.value", "target.checked"].into_iter().chain(include.iter().map(String::as_str)) {
			if let Some(value) = get_path(event, path) {
				set_path(&mut data, path, to_json(&value));
			}
		}
		if event.type_() == "submit" {
			if let Some(pairs) = form_data(event) {
				set_path(&mut data, "detail.formData", pairs);
			}
		}
		Value::Object(data)
	}

	fn dispatch_custom_event(&self, target: &Node, name: &str, detail: &Value) {
		let init = CustomEventInit::new();
		init.set_bubbles(true);
		init.set_composed(true);
		init.set_detail(&to_js(detail));
		match CustomEvent::new_with_event_init_dict(name, &init) {
			Ok(event) => {
				if target.dispatch_event(&event).is_err() {
					error!("Failed to dispatch custom event.");
				}
			}
			Err(_) => error!("Failed to create custom event."),
		}
	}

	fn query_selector(&self, selector: &str) -> Option<Node> {
		self.document.query_selector(selector).ok().flatten().map(Into::into)
	}
}

/// A [`Platform`] over a browser window.
#[derive(Debug, Clone)]
pub struct WebPlatform {
	window: Window,
}

impl WebPlatform {
	#[must_use]
	pub fn new(window: Window) -> Self {
		Self { window }
	}
}

impl Platform for WebPlatform {
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	fn now(&self) -> u64 {
		self.window.performance().map_or(0, |performance| performance.now() as u64)
	}

	fn set_timeout(&self, delay: u64, task: Task) -> TimerId {
		let callback = Closure::once_into_js(move || task());
		let delay = i32::try_from(delay).unwrap_or(i32::MAX);
		match self.window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay) {
			Ok(handle) => TimerId(u64::try_from(handle).unwrap_or_default()),
			Err(_) => {
				error!("Failed to set timeout.");
				TimerId(0)
			}
		}
	}

	fn clear_timeout(&self, timer: TimerId) {
		self.window.clear_timeout_with_handle(i32::try_from(timer.0).unwrap_or_default());
	}

	fn request_animation_frame(&self, task: Task) -> FrameId {
		let callback = Closure::once_into_js(move |_: f64| task());
		match self.window.request_animation_frame(callback.unchecked_ref()) {
			Ok(handle) => FrameId(u64::try_from(handle).unwrap_or_default()),
			Err(_) => {
				error!("Failed to request animation frame.");
				FrameId(0)
			}
		}
	}

	fn cancel_animation_frame(&self, frame: FrameId) {
		if self.window.cancel_animation_frame(i32::try_from(frame.0).unwrap_or_default()).is_err() {
			error!("Failed to cancel animation frame.");
		}
	}

	fn queue_microtask(&self, task: Task) {
		let callback = Closure::once_into_js(move || task());
		self.window.queue_microtask(callback.unchecked_ref());
	}
}

/// Mounts `app` onto the first element matching `selector` in the current browser document.
///
/// # Errors
///
/// [`Error::NotABrowser`] outside of a window context, [`Error::ElementNotFound`] if nothing matches `selector`.
#[instrument(skip(app, flags))]
pub fn start<Flags, Model: 'static, Msg: 'static>(app: &App<Flags, Model, Msg>, flags: Flags, selector: &str) -> Result<Runtime<WebDocument, Model, Msg>, Error> {
	let window = web_sys::window().ok_or(Error::NotABrowser)?;
	let document = WebDocument::new(window.document().ok_or(Error::NotABrowser)?);
	let platform = Rc::new(WebPlatform::new(window));
	let runtime = Runtime::start_at(app, flags, document.clone(), selector, platform)?;
	document.set_handler(Rc::new(runtime.event_handler()));
	Ok(runtime)
}
