//! Clock, timers, microtasks and animation frames.

use core::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u64);

pub type Task = Box<dyn FnOnce()>;

/// Cooperative scheduling primitives of a single-threaded event loop.
///
/// All methods take `&self`: callbacks routinely schedule further work while they run.
pub trait Platform {
	/// Milliseconds since an arbitrary, fixed origin.
	fn now(&self) -> u64;
	fn set_timeout(&self, delay: u64, task: Task) -> TimerId;
	/// Does nothing if the timer already fired or was cleared.
	fn clear_timeout(&self, timer: TimerId);
	fn request_animation_frame(&self, task: Task) -> FrameId;
	fn cancel_animation_frame(&self, frame: FrameId);
	fn queue_microtask(&self, task: Task);
}

/// A deterministic [`Platform`] on a virtual clock that only moves when told to.
///
/// Microtasks are drained after every task run through [`advance`](`ManualPlatform::advance`) or [`next_frame`](`ManualPlatform::next_frame`),
/// mirroring a browser event loop.
#[derive(Default)]
pub struct ManualPlatform {
	now: Cell<u64>,
	next_id: Cell<u64>,
	/// (due, id) → task. Ties fire in scheduling order.
	timers: RefCell<BTreeMap<(u64, u64), Task>>,
	frames: RefCell<Vec<(u64, Task)>>,
	microtasks: RefCell<VecDeque<Task>>,
}

impl ManualPlatform {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn next_id(&self) -> u64 {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		id
	}

	/// Moves the clock forward by `ms`, firing due timers in order.
	pub fn advance(&self, ms: u64) {
		let target = self.now.get() + ms;
		loop {
			let due = {
				let mut timers = self.timers.borrow_mut();
				let first = timers.keys().next().copied();
				match first {
					Some(key) if key.0 <= target => timers.remove(&key).map(|task| (key.0, task)),
					_ => None,
				}
			};
			let Some((at, task)) = due else { break };
			self.now.set(at.max(self.now.get()));
			trace!(at, "Firing timer.");
			task();
			self.run_microtasks();
		}
		self.now.set(target);
	}

	/// Runs queued microtasks, including ones queued while doing so.
	pub fn run_microtasks(&self) {
		loop {
			let task = self.microtasks.borrow_mut().pop_front();
			match task {
				Some(task) => task(),
				None => break,
			}
		}
	}

	/// Runs the animation frame callbacks requested before this call.
	pub fn next_frame(&self) {
		self.run_microtasks();
		let frames = core::mem::take(&mut *self.frames.borrow_mut());
		trace!(count = frames.len(), "Running animation frame.");
		for (_, task) in frames {
			task();
			self.run_microtasks();
		}
	}

	#[must_use]
	pub fn pending_timers(&self) -> usize {
		self.timers.borrow().len()
	}

	#[must_use]
	pub fn pending_frames(&self) -> usize {
		self.frames.borrow().len()
	}

	#[must_use]
	pub fn pending_microtasks(&self) -> usize {
		self.microtasks.borrow().len()
	}
}

impl Platform for ManualPlatform {
	fn now(&self) -> u64 {
		self.now.get()
	}

	fn set_timeout(&self, delay: u64, task: Task) -> TimerId {
		let id = self.next_id();
		self.timers.borrow_mut().insert((self.now.get() + delay, id), task);
		TimerId(id)
	}

	fn clear_timeout(&self, timer: TimerId) {
		self.timers.borrow_mut().retain(|&(_, id), _| id != timer.0);
	}

	fn request_animation_frame(&self, task: Task) -> FrameId {
		let id = self.next_id();
		self.frames.borrow_mut().push((id, task));
		FrameId(id)
	}

	fn cancel_animation_frame(&self, frame: FrameId) {
		self.frames.borrow_mut().retain(|&(id, _)| id != frame.0);
	}

	fn queue_microtask(&self, task: Task) {
		self.microtasks.borrow_mut().push_back(task);
	}
}

impl<P: Platform + ?Sized> Platform for std::rc::Rc<P> {
	fn now(&self) -> u64 {
		(**self).now()
	}

	fn set_timeout(&self, delay: u64, task: Task) -> TimerId {
		(**self).set_timeout(delay, task)
	}

	fn clear_timeout(&self, timer: TimerId) {
		(**self).clear_timeout(timer);
	}

	fn request_animation_frame(&self, task: Task) -> FrameId {
		(**self).request_animation_frame(task)
	}

	fn cancel_animation_frame(&self, frame: FrameId) {
		(**self).cancel_animation_frame(frame);
	}

	fn queue_microtask(&self, task: Task) {
		(**self).queue_microtask(task);
	}
}
