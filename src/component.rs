//! Embedding a [`Runtime`] as a custom element: lifecycle callbacks, observed attributes and the context protocol.

use crate::{
	decode::DecodeError,
	document::Document,
	error::Error,
	platform::Platform,
	runtime::{App, ContextCallback, ContextProvider, ContextRequest, Runtime, Unsubscribe},
};
use core::cell::{Cell, RefCell};
use hashbrown::HashMap;
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, instrument, trace};

type AttributeDecoder<Msg> = Rc<dyn Fn(&str) -> Result<Msg, DecodeError>>;
type ContextDecoder<Msg> = Rc<dyn Fn(&Value) -> Result<Msg, DecodeError>>;

/// What a component listens to, besides its own view's events.
pub struct Config<Msg> {
	attributes: Vec<(String, AttributeDecoder<Msg>)>,
	contexts: Vec<(String, ContextDecoder<Msg>)>,
}

impl<Msg> Default for Config<Msg> {
	fn default() -> Self {
		Self {
			attributes: Vec::new(),
			contexts: Vec::new(),
		}
	}
}

impl<Msg> Clone for Config<Msg> {
	fn clone(&self) -> Self {
		Self {
			attributes: self.attributes.clone(),
			contexts: self.contexts.clone(),
		}
	}
}

impl<Msg: 'static> Config<Msg> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Observes the host attribute `name`. Values that fail to decode are ignored.
	#[must_use]
	pub fn on_attribute_change(mut self, name: impl Into<String>, decoder: impl Fn(&str) -> Result<Msg, DecodeError> + 'static) -> Self {
		self.attributes.push((name.into(), Rc::new(decoder)));
		self
	}

	/// Subscribes to the context `key` from the nearest provider once connected.
	#[must_use]
	pub fn on_context_change(mut self, key: impl Into<String>, decoder: impl Fn(&Value) -> Result<Msg, DecodeError> + 'static) -> Self {
		self.contexts.push((key.into(), Rc::new(decoder)));
		self
	}

	pub fn observed_attributes(&self) -> impl Iterator<Item = &str> {
		self.attributes.iter().map(|(name, _)| name.as_str())
	}
}

/// The host-facing side of a component, without its model and message types.
pub trait Lifecycle {
	/// `providers` are the ancestors that may answer context requests, nearest first.
	fn connected(&self, providers: &[&dyn ContextProvider]);
	fn disconnected(&self);
	fn attribute_changed(&self, name: &str, value: &str);
	fn observed_attributes(&self) -> Vec<String>;
	fn as_provider(&self) -> &dyn ContextProvider;
}

/// A [`Runtime`] wired to a host element's lifecycle.
pub struct Component<D: Document, Model, Msg> {
	runtime: Runtime<D, Model, Msg>,
	config: Config<Msg>,
	subscriptions: Rc<RefCell<HashMap<String, Unsubscribe>>>,
}

impl<D: Document + 'static, Model: 'static, Msg: 'static> Component<D, Model, Msg> {
	pub fn new(runtime: Runtime<D, Model, Msg>, config: Config<Msg>) -> Self {
		Self {
			runtime,
			config,
			subscriptions: Rc::default(),
		}
	}

	pub fn runtime(&self) -> &Runtime<D, Model, Msg> {
		&self.runtime
	}

	pub fn dispatch(&self, message: Msg) {
		self.runtime.dispatch(message);
	}

	pub fn emit(&self, name: &str, data: Value) {
		self.runtime.emit(name, data);
	}

	pub fn provide(&self, key: &str, value: Value) {
		self.runtime.provide(key, value);
	}

	/// Requests each configured context once, from the first provider that has it.
	#[instrument(skip_all)]
	pub fn connected(&self, providers: &[&dyn ContextProvider]) {
		for (key, decoder) in &self.config.contexts {
			let actions = self.runtime.actions();
			let decoder = Rc::clone(decoder);
			let subscriptions = Rc::clone(&self.subscriptions);
			let subscription_key = key.clone();
			let subscribed = Cell::new(false);
			let callback: ContextCallback = Rc::new(move |value: &Value, unsubscribe: Option<&Unsubscribe>| {
				if let (Some(unsubscribe), false) = (unsubscribe, subscribed.replace(true)) {
					let previous = subscriptions.borrow_mut().insert(subscription_key.clone(), unsubscribe.clone());
					if let Some(previous) = previous {
						previous.call();
					}
				}
				match decoder(value) {
					Ok(message) => actions.dispatch(message),
					Err(error) => debug!(%error, "Context value failed to decode. Ignoring."),
				}
			});

			let request = ContextRequest {
				context: key.clone(),
				callback,
				subscribe: true,
			};
			if !providers.iter().any(|provider| provider.request_context(&request)) {
				trace!(context = %key, "No provider found.");
			}
		}
	}

	/// Ends all context subscriptions.
	pub fn disconnected(&self) {
		let subscriptions: Vec<Unsubscribe> = self.subscriptions.borrow_mut().drain().map(|(_, unsubscribe)| unsubscribe).collect();
		for unsubscribe in subscriptions {
			unsubscribe.call();
		}
	}

	pub fn attribute_changed(&self, name: &str, value: &str) {
		let Some((_, decoder)) = self.config.attributes.iter().find(|(observed, _)| observed == name) else {
			return trace!(name, "Ignoring unobserved attribute.");
		};
		match decoder(value) {
			Ok(message) => self.runtime.dispatch(message),
			Err(error) => debug!(name, %error, "Attribute value failed to decode. Ignoring."),
		}
	}
}

impl<D: Document + 'static, Model: 'static, Msg: 'static> Lifecycle for Component<D, Model, Msg> {
	fn connected(&self, providers: &[&dyn ContextProvider]) {
		Component::connected(self, providers);
	}

	fn disconnected(&self) {
		Component::disconnected(self);
	}

	fn attribute_changed(&self, name: &str, value: &str) {
		Component::attribute_changed(self, name, value);
	}

	fn observed_attributes(&self) -> Vec<String> {
		self.config.observed_attributes().map(str::to_owned).collect()
	}

	fn as_provider(&self) -> &dyn ContextProvider {
		&self.runtime
	}
}

type Factory<D> = Box<dyn Fn(D, <D as Document>::Node, Rc<dyn Platform>) -> Box<dyn Lifecycle>>;

/// Named component definitions.
pub struct Registry<D: Document> {
	definitions: HashMap<String, Factory<D>>,
}

impl<D: Document> Default for Registry<D> {
	fn default() -> Self {
		Self { definitions: HashMap::new() }
	}
}

impl<D: Document + 'static> Registry<D> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// # Errors
	///
	/// [`Error::BadComponentName`] iff `name` doesn't contain a hyphen,
	/// [`Error::ComponentAlreadyRegistered`] iff `name` is taken.
	pub fn define<Model: 'static, Msg: 'static>(&mut self, name: &str, app: App<(), Model, Msg>, config: Config<Msg>) -> Result<(), Error> {
		if !name.contains('-') {
			return Err(Error::BadComponentName(name.to_owned()));
		}
		if self.definitions.contains_key(name) {
			return Err(Error::ComponentAlreadyRegistered(name.to_owned()));
		}
		self.definitions.insert(
			name.to_owned(),
			Box::new(move |document: D, root: D::Node, platform: Rc<dyn Platform>| {
				let runtime = Runtime::start(&app, (), document, root, platform);
				Box::new(Component::new(runtime, config.clone())) as Box<dyn Lifecycle>
			}),
		);
		Ok(())
	}

	#[must_use]
	pub fn is_defined(&self, name: &str) -> bool {
		self.definitions.contains_key(name)
	}

	/// Starts a registered component on `root`.
	///
	/// # Errors
	///
	/// [`Error::ComponentNotRegistered`] iff `name` isn't registered.
	pub fn create(&self, name: &str, document: D, root: D::Node, platform: Rc<dyn Platform>) -> Result<Box<dyn Lifecycle>, Error> {
		let factory = self.definitions.get(name).ok_or_else(|| Error::ComponentNotRegistered(name.to_owned()))?;
		Ok(factory(document, root, platform))
	}
}
