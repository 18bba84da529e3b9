//! Descriptions of side effects, returned from `init` and `update` and run by the [`Runtime`](`crate::runtime::Runtime`).

use serde_json::Value;
use std::rc::Rc;

/// What effects may do to the runtime that runs them.
pub trait Sink<Msg> {
	/// `immediate` skips waiting for the next animation frame before rendering.
	fn dispatch(&self, message: Msg, immediate: bool);
	/// Dispatches a bubbling custom event from the runtime's root.
	fn emit(&self, name: &str, data: Value);
	fn provide(&self, key: &str, value: Value);
}

/// Handle passed to effect callbacks.
///
/// Cheap to clone and safe to keep around, for example to dispatch from a later callback.
pub struct Actions<Msg> {
	sink: Rc<dyn Sink<Msg>>,
}

impl<Msg> Clone for Actions<Msg> {
	fn clone(&self) -> Self {
		Self { sink: Rc::clone(&self.sink) }
	}
}

impl<Msg: 'static> Actions<Msg> {
	pub fn new(sink: Rc<dyn Sink<Msg>>) -> Self {
		Self { sink }
	}

	pub fn dispatch(&self, message: Msg) {
		self.sink.dispatch(message, false);
	}

	/// Dispatches and renders synchronously afterwards.
	pub fn dispatch_immediate(&self, message: Msg) {
		self.sink.dispatch(message, true);
	}

	pub fn emit(&self, name: &str, data: Value) {
		self.sink.emit(name, data);
	}

	pub fn provide(&self, key: &str, value: Value) {
		self.sink.provide(key, value);
	}

	/// Actions for an embedded message type.
	pub fn map<Inner: 'static>(&self, f: Rc<dyn Fn(Inner) -> Msg>) -> Actions<Inner> {
		Actions::new(Rc::new(MappedSink { outer: Rc::clone(&self.sink), f }))
	}
}

struct MappedSink<Inner, Msg> {
	outer: Rc<dyn Sink<Msg>>,
	f: Rc<dyn Fn(Inner) -> Msg>,
}

impl<Inner, Msg> Sink<Inner> for MappedSink<Inner, Msg> {
	fn dispatch(&self, message: Inner, immediate: bool) {
		self.outer.dispatch((self.f)(message), immediate);
	}

	fn emit(&self, name: &str, data: Value) {
		self.outer.emit(name, data);
	}

	fn provide(&self, key: &str, value: Value) {
		self.outer.provide(key, value);
	}
}

pub type Action<Msg> = Box<dyn FnOnce(&Actions<Msg>)>;

/// Three queues of actions:
///
/// - `synchronous` actions run as part of the update that produced them,
/// - `before_paint` actions run after the next render was applied, but before the host paints,
/// - `after_paint` actions run on the animation frame after that render.
#[must_use]
pub struct Effect<Msg> {
	pub(crate) synchronous: Vec<Action<Msg>>,
	pub(crate) before_paint: Vec<Action<Msg>>,
	pub(crate) after_paint: Vec<Action<Msg>>,
}

impl<Msg> Default for Effect<Msg> {
	fn default() -> Self {
		Self {
			synchronous: Vec::new(),
			before_paint: Vec::new(),
			after_paint: Vec::new(),
		}
	}
}

impl<Msg> core::fmt::Debug for Effect<Msg> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Effect")
			.field("synchronous", &self.synchronous.len())
			.field("before_paint", &self.before_paint.len())
			.field("after_paint", &self.after_paint.len())
			.finish()
	}
}

impl<Msg: 'static> Effect<Msg> {
	pub fn none() -> Self {
		Self::default()
	}

	pub fn from_fn(action: impl FnOnce(&Actions<Msg>) + 'static) -> Self {
		Self {
			synchronous: vec![Box::new(action)],
			..Self::default()
		}
	}

	/// Emits a custom event from the runtime's root.
	pub fn event(name: impl Into<String>, data: Value) -> Self {
		let name = name.into();
		Self::from_fn(move |actions| actions.emit(&name, data))
	}

	pub fn provide(key: impl Into<String>, value: Value) -> Self {
		let key = key.into();
		Self::from_fn(move |actions| actions.provide(&key, value))
	}

	pub fn before_paint(action: impl FnOnce(&Actions<Msg>) + 'static) -> Self {
		Self {
			before_paint: vec![Box::new(action)],
			..Self::default()
		}
	}

	pub fn after_paint(action: impl FnOnce(&Actions<Msg>) + 'static) -> Self {
		Self {
			after_paint: vec![Box::new(action)],
			..Self::default()
		}
	}

	/// Concatenates the queues of all `effects`, in order.
	pub fn batch(effects: impl IntoIterator<Item = Self>) -> Self {
		effects.into_iter().fold(Self::default(), |mut batch, effect| {
			batch.synchronous.extend(effect.synchronous);
			batch.before_paint.extend(effect.before_paint);
			batch.after_paint.extend(effect.after_paint);
			batch
		})
	}

	#[must_use]
	pub fn is_none(&self) -> bool {
		self.synchronous.is_empty() && self.before_paint.is_empty() && self.after_paint.is_empty()
	}

	/// Moves these effects into a parent's message space.
	pub fn map<Outer: 'static>(self, f: impl Fn(Msg) -> Outer + 'static) -> Effect<Outer> {
		let f: Rc<dyn Fn(Msg) -> Outer> = Rc::new(f);
		let map_all = |actions: Vec<Action<Msg>>| -> Vec<Action<Outer>> {
			actions
				.into_iter()
				.map(|action| {
					let f = Rc::clone(&f);
					Box::new(move |actions: &Actions<Outer>| action(&actions.map(f))) as Action<Outer>
				})
				.collect()
		};
		Effect {
			synchronous: map_all(self.synchronous),
			before_paint: map_all(self.before_paint),
			after_paint: map_all(self.after_paint),
		}
	}

	pub(crate) fn from_actions(synchronous: Vec<Action<Msg>>) -> Self {
		Self {
			synchronous,
			..Self::default()
		}
	}
}
