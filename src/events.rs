//! The event handler registry.
//!
//! Handlers are stored under their node's [`Path`] joined with the event name,
//! so live nodes never need to own message-producing code themselves.

use crate::{
	decode::DecodeError,
	path::{self, Path},
	vattr::{Attribute, Decoder, RawEvent},
	vnode::{compose, AnyMessage, Mapper, VNode},
};
use hashbrown::{HashMap, HashSet};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum EventError {
	#[error("no handler for `{name}` at `{path}`")]
	Unhandled { path: String, name: String },
	#[error("event could not be decoded: {0}")]
	Decode(#[from] DecodeError),
}

#[derive(Clone)]
struct Handler {
	decoder: Decoder,
	mapper: Option<Mapper>,
}

/// Registered handlers, plus which paths dispatched events recently.
///
/// `dispatched_paths` describes the previous render and `next_dispatched_paths` collects
/// during the current one. [`Events::tick`] advances from one to the next.
#[derive(Default)]
pub struct Events {
	handlers: HashMap<String, Handler>,
	dispatched_paths: Vec<String>,
	next_dispatched_paths: Vec<String>,
	/// Handler keys added during the current diff, which later removals at the same key must not clobber.
	registered: HashSet<String>,
	diffing: bool,
}

impl Events {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes the paths collected since the last tick the current dispatched set.
	pub fn tick(&mut self) {
		self.dispatched_paths = core::mem::take(&mut self.next_dispatched_paths);
	}

	/// Records that `path` dispatched, then decodes `event` through the handler registered for `name` there.
	///
	/// The path is recorded even if there is no matching handler.
	///
	/// # Errors
	///
	/// [`EventError::Unhandled`] if nothing is registered, [`EventError::Decode`] if the handler rejects the payload.
	pub fn handle(&mut self, path: &str, name: &str, event: &RawEvent) -> Result<AnyMessage, EventError> {
		self.next_dispatched_paths.push(path.to_owned());
		let handler = self.handlers.get(&path::event_key(path, name)).ok_or_else(|| EventError::Unhandled {
			path: path.to_owned(),
			name: name.to_owned(),
		})?;
		let message = (handler.decoder)(event)?;
		Ok(match &handler.mapper {
			Some(mapper) => mapper(message),
			None => message,
		})
	}

	/// Whether `path` or one of its ancestors dispatched during the previous render.
	#[must_use]
	pub fn has_dispatched_events(&self, path: &Path) -> bool {
		path.matches(&self.dispatched_paths)
	}

	#[must_use]
	pub fn has_handler(&self, path: &Path, name: &str) -> bool {
		self.handlers.contains_key(&path.event_key(name))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}

	pub fn add_event(&mut self, mapper: Option<&Mapper>, path: &Path, name: &str, handler: &Decoder) {
		let key = path.event_key(name);
		trace!(key = %key.escape_debug(), "Registering handler.");
		if self.diffing {
			self.registered.insert(key.clone());
		}
		self.handlers.insert(
			key,
			Handler {
				decoder: handler.clone(),
				mapper: mapper.cloned(),
			},
		);
	}

	pub fn remove_event(&mut self, path: &Path, name: &str) {
		let key = path.event_key(name);
		if self.registered.contains(&key) {
			trace!(key = %key.escape_debug(), "Keeping handler registered earlier in this diff.");
			return;
		}
		self.handlers.remove(&key);
	}

	/// Registers every event attribute in `child`'s subtree, with `child` at `index` under `parent`.
	pub fn add_child(&mut self, mapper: Option<&Mapper>, parent: &Path, index: usize, child: &VNode) {
		let path = parent.add(index, child.key());
		let mapper = compose(mapper.cloned(), child.mapper().cloned());
		self.add_attributes(mapper.as_ref(), &path, child.attributes());
		self.add_children(mapper.as_ref(), &path, 0, child.children());
	}

	pub fn add_children(&mut self, mapper: Option<&Mapper>, parent: &Path, first_index: usize, children: &[VNode]) {
		for (i, child) in children.iter().enumerate() {
			self.add_child(mapper, parent, first_index + i, child);
		}
	}

	/// Tears down every handler in `child`'s subtree, with `child` at `index` under `parent`.
	pub fn remove_child(&mut self, parent: &Path, index: usize, child: &VNode) {
		let path = parent.add(index, child.key());
		self.remove_attributes(&path, child.attributes());
		self.remove_children(&path, 0, child.children());
	}

	pub fn remove_children(&mut self, parent: &Path, first_index: usize, children: &[VNode]) {
		for (i, child) in children.iter().enumerate() {
			self.remove_child(parent, first_index + i, child);
		}
	}

	fn add_attributes(&mut self, mapper: Option<&Mapper>, path: &Path, attributes: &[Attribute]) {
		for event in attributes.iter().filter_map(Attribute::as_event) {
			self.add_event(mapper, path, &event.name, &event.handler);
		}
	}

	fn remove_attributes(&mut self, path: &Path, attributes: &[Attribute]) {
		for event in attributes.iter().filter_map(Attribute::as_event) {
			self.remove_event(path, &event.name);
		}
	}

	pub(crate) fn begin_diff(&mut self) {
		self.tick();
		self.diffing = true;
	}

	pub(crate) fn finish_diff(&mut self) {
		self.diffing = false;
		self.registered.clear();
	}
}

impl core::fmt::Debug for Events {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Events")
			.field("handlers", &self.handlers.keys().collect::<Vec<_>>())
			.field("dispatched_paths", &self.dispatched_paths)
			.field("next_dispatched_paths", &self.next_dispatched_paths)
			.finish()
	}
}
