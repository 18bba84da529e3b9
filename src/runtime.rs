//! The update/render scheduler.
//!
//! A [`Runtime`] owns the application model, the last rendered tree, the [`Events`] registry and the [`Reconciler`].
//! Messages are processed strictly in dispatch order: dispatches made while a tick is running are queued,
//! and rendering always observes a settled model.

use crate::{
	diff::diff,
	document::Document,
	effect::{Action, Actions, Effect, Sink},
	element::Element,
	error::Error,
	events::{EventError, Events},
	platform::{FrameId, Platform},
	reconciler::{EventDispatch, EventOutcome, Reconciler, ReconcilerOptions},
	vnode::VNode,
};
use core::cell::{Cell, RefCell};
use hashbrown::HashMap;
use serde_json::Value;
use std::{
	collections::VecDeque,
	rc::{Rc, Weak},
};
use tracing::{debug, error, instrument, trace};

/// The three functions that make up an application.
pub struct App<Flags, Model, Msg> {
	init: Rc<dyn Fn(Flags) -> (Model, Effect<Msg>)>,
	update: Rc<dyn Fn(Model, Msg) -> (Model, Effect<Msg>)>,
	view: Rc<dyn Fn(&Model) -> Element<Msg>>,
}

impl<Flags, Model, Msg> Clone for App<Flags, Model, Msg> {
	fn clone(&self) -> Self {
		Self {
			init: Rc::clone(&self.init),
			update: Rc::clone(&self.update),
			view: Rc::clone(&self.view),
		}
	}
}

impl<Flags: 'static, Model: 'static, Msg: 'static> App<Flags, Model, Msg> {
	pub fn new(
		init: impl Fn(Flags) -> (Model, Effect<Msg>) + 'static,
		update: impl Fn(Model, Msg) -> (Model, Effect<Msg>) + 'static,
		view: impl Fn(&Model) -> Element<Msg> + 'static,
	) -> Self {
		Self {
			init: Rc::new(init),
			update: Rc::new(update),
			view: Rc::new(view),
		}
	}

	/// An application without effects.
	pub fn simple(init: impl Fn(Flags) -> Model + 'static, update: impl Fn(Model, Msg) -> Model + 'static, view: impl Fn(&Model) -> Element<Msg> + 'static) -> Self {
		Self::new(move |flags| (init(flags), Effect::none()), move |model, message| (update(model, message), Effect::none()), view)
	}
}

/// Called with the current value and, for subscriptions, a handle to end them.
pub type ContextCallback = Rc<dyn Fn(&Value, Option<&Unsubscribe>)>;

/// Ends a context subscription. Calling it more than once is harmless.
#[derive(Clone)]
pub struct Unsubscribe(Rc<dyn Fn()>);

impl Unsubscribe {
	pub fn new(f: impl Fn() + 'static) -> Self {
		Self(Rc::new(f))
	}

	pub fn call(&self) {
		(self.0)();
	}
}

impl core::fmt::Debug for Unsubscribe {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str("Unsubscribe")
	}
}

/// Asks the nearest provider of `context` for its value.
#[derive(Clone)]
pub struct ContextRequest {
	pub context: String,
	pub callback: ContextCallback,
	/// Also receive future values, until unsubscribed.
	pub subscribe: bool,
}

pub trait ContextProvider {
	/// Answers `request` synchronously and returns `true` iff this provider has the requested context.
	fn request_context(&self, request: &ContextRequest) -> bool;
}

struct Context {
	value: Value,
	subscribers: Vec<(u64, ContextCallback)>,
}

struct Scheduler<Msg> {
	/// Set while a tick runs. Dispatches are queued instead of processed.
	should_queue: bool,
	/// Render synchronously at the end of the current tick.
	should_flush: bool,
	queue: VecDeque<Msg>,
	before_paint: Vec<Action<Msg>>,
	after_paint: Vec<Action<Msg>>,
	render_timer: Option<FrameId>,
}

struct Core<D: Document, Model, Msg> {
	this: Weak<Self>,
	update: Rc<dyn Fn(Model, Msg) -> (Model, Effect<Msg>)>,
	view: Rc<dyn Fn(&Model) -> Element<Msg>>,
	platform: Rc<dyn Platform>,
	model: RefCell<Option<Model>>,
	vdom: RefCell<VNode>,
	events: RefCell<Events>,
	reconciler: RefCell<Reconciler<D>>,
	scheduler: RefCell<Scheduler<Msg>>,
	contexts: RefCell<HashMap<String, Context>>,
	next_subscriber: Cell<u64>,
}

/// A running application, mounted onto a live root.
///
/// This is a handle: clones refer to the same application.
pub struct Runtime<D: Document, Model, Msg> {
	core: Rc<Core<D, Model, Msg>>,
}

impl<D: Document, Model, Msg> Clone for Runtime<D, Model, Msg> {
	fn clone(&self) -> Self {
		Self { core: Rc::clone(&self.core) }
	}
}

impl<D: Document + 'static, Model: 'static, Msg: 'static> Runtime<D, Model, Msg> {
	/// Takes over `root`, adopting its current content, and renders `app` synchronously.
	pub fn start<Flags>(app: &App<Flags, Model, Msg>, flags: Flags, document: D, root: D::Node, platform: Rc<dyn Platform>) -> Self {
		Self::start_with(app, flags, document, root, platform, ReconcilerOptions::default())
	}

	/// Like [`start`](`Runtime::start`), but finds the root with a selector first.
	///
	/// # Errors
	///
	/// [`Error::ElementNotFound`] iff nothing matches `selector`.
	pub fn start_at<Flags>(app: &App<Flags, Model, Msg>, flags: Flags, document: D, selector: &str, platform: Rc<dyn Platform>) -> Result<Self, Error> {
		let root = document.query_selector(selector).ok_or_else(|| Error::ElementNotFound { selector: selector.to_owned() })?;
		Ok(Self::start(app, flags, document, root, platform))
	}

	#[instrument(skip_all)]
	pub fn start_with<Flags>(app: &App<Flags, Model, Msg>, flags: Flags, document: D, root: D::Node, platform: Rc<dyn Platform>, options: ReconcilerOptions) -> Self {
		let (model, effects) = (app.init)(flags);
		let core = Rc::new_cyclic(|this: &Weak<Core<D, Model, Msg>>| {
			let weak = this.clone();
			let dispatch: Rc<dyn Fn(EventDispatch)> = Rc::new(move |dispatch| {
				if let Some(core) = weak.upgrade() {
					core.handle_dispatch(dispatch);
				}
			});
			let mut reconciler = Reconciler::new(document, root, Rc::clone(&platform), dispatch, options);
			let vdom = reconciler.virtualise();
			Core {
				this: this.clone(),
				update: Rc::clone(&app.update),
				view: Rc::clone(&app.view),
				platform,
				model: RefCell::new(Some(model)),
				vdom: RefCell::new(vdom),
				events: RefCell::new(Events::new()),
				reconciler: RefCell::new(reconciler),
				scheduler: RefCell::new(Scheduler {
					should_queue: false,
					should_flush: true,
					queue: VecDeque::new(),
					before_paint: Vec::new(),
					after_paint: Vec::new(),
					render_timer: None,
				}),
				contexts: RefCell::new(HashMap::new()),
				next_subscriber: Cell::new(0),
			}
		});
		core.tick(effects);
		Self { core }
	}

	/// Processes `message`. Rendering waits for the next animation frame.
	pub fn dispatch(&self, message: Msg) {
		self.core.dispatch(message, false);
	}

	/// Processes `message` and renders synchronously.
	pub fn dispatch_immediate(&self, message: Msg) {
		self.core.dispatch(message, true);
	}

	pub fn emit(&self, name: &str, data: Value) {
		self.core.emit(name, data);
	}

	/// Sets a context value, notifying current subscribers.
	pub fn provide(&self, key: &str, value: Value) {
		self.core.provide(key, value);
	}

	/// Routes a native event that reached a listener on `target` into the application.
	///
	/// The host is expected to act on the returned `prevent_default` and `stop_propagation` flags.
	/// Events that arrive while a patch is being applied are retried on a microtask.
	pub fn handle_event(&self, target: &D::Node, name: &str, event: &D::Event) -> EventOutcome {
		self.core.handle_event(target, name, event)
	}

	/// Like [`handle_event`](`Runtime::handle_event`), but without keeping the runtime alive.
	pub fn event_handler(&self) -> impl Fn(&D::Node, &str, &D::Event) -> EventOutcome + 'static {
		let core = Rc::downgrade(&self.core);
		move |target, name, event| core.upgrade().map_or_else(EventOutcome::default, |core| core.handle_event(target, name, event))
	}

	pub fn actions(&self) -> Actions<Msg> {
		self.core.actions()
	}

	/// [`None`] while `update` runs, as the model is moved out of the runtime for the call.
	pub fn with_model<R>(&self, f: impl FnOnce(&Model) -> R) -> Option<R> {
		self.core.model.borrow().as_ref().map(f)
	}

	/// # Panics
	///
	/// If called while a patch is being applied.
	pub fn with_document<R>(&self, f: impl FnOnce(&D) -> R) -> R {
		f(self.core.reconciler.borrow().document())
	}

	/// The root node this runtime renders into.
	pub fn root(&self) -> D::Node {
		self.core.reconciler.borrow().root_node().clone()
	}

	/// The number of registered event handlers.
	pub fn handler_count(&self) -> usize {
		self.core.events.borrow().len()
	}
}

impl<D: Document + 'static, Model: 'static, Msg: 'static> ContextProvider for Runtime<D, Model, Msg> {
	fn request_context(&self, request: &ContextRequest) -> bool {
		self.core.request_context(request)
	}
}

struct RuntimeSink<D: Document, Model, Msg> {
	core: Weak<Core<D, Model, Msg>>,
}

impl<D: Document + 'static, Model: 'static, Msg: 'static> Sink<Msg> for RuntimeSink<D, Model, Msg> {
	fn dispatch(&self, message: Msg, immediate: bool) {
		if let Some(core) = self.core.upgrade() {
			core.dispatch(message, immediate);
		}
	}

	fn emit(&self, name: &str, data: Value) {
		if let Some(core) = self.core.upgrade() {
			core.emit(name, data);
		}
	}

	fn provide(&self, key: &str, value: Value) {
		if let Some(core) = self.core.upgrade() {
			core.provide(key, value);
		}
	}
}

impl<D: Document + 'static, Model: 'static, Msg: 'static> Core<D, Model, Msg> {
	fn actions(&self) -> Actions<Msg> {
		Actions::new(Rc::new(RuntimeSink { core: self.this.clone() }))
	}

	fn dispatch(&self, message: Msg, immediate: bool) {
		{
			let mut scheduler = self.scheduler.borrow_mut();
			scheduler.should_flush |= immediate;
			if scheduler.should_queue {
				trace!("Queueing message dispatched mid-tick.");
				return scheduler.queue.push_back(message);
			}
		}
		let effects = self.update(message);
		self.tick(effects);
	}

	fn update(&self, message: Msg) -> Effect<Msg> {
		let model = self.model.borrow_mut().take();
		let Some(model) = model else {
			error!("Model missing during update. Dropping message.");
			return Effect::none();
		};
		let (model, effects) = (self.update)(model, message);
		*self.model.borrow_mut() = Some(model);
		effects
	}

	/// Runs `effects`, then every update queued meanwhile, then renders or schedules a render.
	#[instrument(skip_all)]
	fn tick(&self, mut effects: Effect<Msg>) {
		self.scheduler.borrow_mut().should_queue = true;
		let actions = self.actions();
		loop {
			for action in effects.synchronous {
				action(&actions);
			}
			let next = {
				let mut scheduler = self.scheduler.borrow_mut();
				scheduler.before_paint.extend(effects.before_paint);
				scheduler.after_paint.extend(effects.after_paint);
				scheduler.queue.pop_front()
			};
			match next {
				Some(message) => effects = self.update(message),
				None => break,
			}
		}

		let flush = {
			let mut scheduler = self.scheduler.borrow_mut();
			scheduler.should_queue = false;
			if scheduler.should_flush {
				if let Some(frame) = scheduler.render_timer.take() {
					self.platform.cancel_animation_frame(frame);
				}
				true
			} else {
				if scheduler.render_timer.is_none() {
					let weak = self.this.clone();
					scheduler.render_timer = Some(self.platform.request_animation_frame(Box::new(move || {
						if let Some(core) = weak.upgrade() {
							core.render();
						}
					})));
				}
				false
			}
		};
		if flush {
			self.render();
		}
	}

	#[instrument(skip_all)]
	fn render(&self) {
		{
			let mut scheduler = self.scheduler.borrow_mut();
			scheduler.should_flush = false;
			scheduler.render_timer = None;
		}

		let next = match self.model.borrow().as_ref() {
			Some(model) => (self.view)(model).into_vnode(),
			None => return error!("Model missing during render. Skipping."),
		};

		{
			let mut vdom = self.vdom.borrow_mut();
			let mut events = self.events.borrow_mut();
			let mut reconciler = self.reconciler.borrow_mut();
			let patch = diff(&mut events, &vdom, &next);
			trace!(empty = patch.is_empty(), "Applying patch.");
			reconciler.push(&patch);
			drop(patch);
			*vdom = next;
		}

		let (before_paint, after_paint) = {
			let mut scheduler = self.scheduler.borrow_mut();
			(core::mem::take(&mut scheduler.before_paint), core::mem::take(&mut scheduler.after_paint))
		};
		if !before_paint.is_empty() {
			let weak = self.this.clone();
			self.platform.queue_microtask(Box::new(move || {
				if let Some(core) = weak.upgrade() {
					core.flush(before_paint);
				}
			}));
		}
		if !after_paint.is_empty() {
			let weak = self.this.clone();
			self.platform.request_animation_frame(Box::new(move || {
				if let Some(core) = weak.upgrade() {
					core.flush(after_paint);
				}
			}));
		}
	}

	fn flush(&self, actions: Vec<Action<Msg>>) {
		self.scheduler.borrow_mut().should_flush = true;
		self.tick(Effect::from_actions(actions));
	}

	fn handle_event(&self, target: &D::Node, name: &str, event: &D::Event) -> EventOutcome {
		let outcome = match self.reconciler.try_borrow_mut() {
			Ok(mut reconciler) => reconciler.handle_event(target, name, event),
			Err(_) => {
				debug!(name, "Event arrived while patching. Deferring.");
				let weak = self.this.clone();
				let (target, name, event) = (target.clone(), name.to_owned(), event.clone());
				self.platform.queue_microtask(Box::new(move || {
					if let Some(core) = weak.upgrade() {
						core.handle_event(&target, &name, &event);
					}
				}));
				return EventOutcome::default();
			}
		};
		if let Some(dispatch) = outcome.dispatch.clone() {
			self.handle_dispatch(dispatch);
		}
		outcome
	}

	fn handle_dispatch(&self, dispatch: EventDispatch) {
		let result = match self.events.try_borrow_mut() {
			Ok(mut events) => events.handle(&dispatch.path, &dispatch.name, &dispatch.data),
			Err(_) => {
				let weak = self.this.clone();
				self.platform.queue_microtask(Box::new(move || {
					if let Some(core) = weak.upgrade() {
						core.handle_dispatch(dispatch);
					}
				}));
				return;
			}
		};

		match result {
			Ok(message) => match message.downcast::<Msg>() {
				Ok(message) => self.dispatch(*message, dispatch.immediate),
				Err(_) => error!(name = %dispatch.name, "Handler produced a message of an unexpected type. Dropping it."),
			},
			Err(EventError::Unhandled { .. }) => debug!(name = %dispatch.name, "No handler registered. Dropping event."),
			Err(EventError::Decode(error)) => debug!(name = %dispatch.name, %error, "Event failed to decode. Dropping it."),
		}
	}

	fn emit(&self, name: &str, data: Value) {
		match self.reconciler.try_borrow() {
			Ok(reconciler) => reconciler.document().dispatch_custom_event(reconciler.root_node(), name, &data),
			Err(_) => {
				let weak = self.this.clone();
				let name = name.to_owned();
				self.platform.queue_microtask(Box::new(move || {
					if let Some(core) = weak.upgrade() {
						core.emit(&name, data);
					}
				}));
			}
		}
	}

	fn provide(&self, key: &str, value: Value) {
		let subscribers = {
			let mut contexts = self.contexts.borrow_mut();
			match contexts.get_mut(key) {
				Some(context) => {
					context.value = value.clone();
					context.subscribers.clone()
				}
				None => {
					contexts.insert(key.to_owned(), Context { value, subscribers: Vec::new() });
					return;
				}
			}
		};
		for (id, callback) in subscribers.iter().rev() {
			callback(&value, Some(&self.unsubscribe(key, *id)));
		}
	}

	fn unsubscribe(&self, key: &str, id: u64) -> Unsubscribe {
		let weak = self.this.clone();
		let key = key.to_owned();
		Unsubscribe::new(move || {
			if let Some(core) = weak.upgrade() {
				if let Some(context) = core.contexts.borrow_mut().get_mut(&key) {
					context.subscribers.retain(|&(subscriber, _)| subscriber != id);
				}
			}
		})
	}

	fn request_context(&self, request: &ContextRequest) -> bool {
		let (value, subscription) = {
			let mut contexts = self.contexts.borrow_mut();
			let Some(context) = contexts.get_mut(&request.context) else {
				return false;
			};
			let subscription = request.subscribe.then(|| {
				let id = self.next_subscriber.get();
				self.next_subscriber.set(id + 1);
				context.subscribers.push((id, Rc::clone(&request.callback)));
				id
			});
			(context.value.clone(), subscription)
		};
		match subscription {
			Some(id) => (request.callback)(&value, Some(&self.unsubscribe(&request.context, id))),
			None => (request.callback)(&value, None),
		}
		true
	}
}
