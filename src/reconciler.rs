//! Applies [`Patch`]es to a live [`Document`], keeping a shadow metadata tree in step.

use crate::{
	document::Document,
	patch::{Change, Patch},
	path::SEPARATOR_ELEMENT,
	platform::{Platform, TimerId},
	vattr::{Attribute, EventAttribute},
	vnode::{Kind, VNode},
};
use core::cell::Cell;
use hashbrown::HashMap;
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, Level};

/// Written on keyed elements if [`ReconcilerOptions::expose_keys`] is set, and read back by virtualisation.
pub const KEY_ATTRIBUTE: &str = "data-cambium-key";

/// Identifies a shadow metadata node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaId(u64);

impl MetaId {
	/// For [`Document`] implementations that need to round-trip the id through a foreign representation.
	#[must_use]
	pub fn to_bits(self) -> u64 {
		self.0
	}

	#[must_use]
	pub fn from_bits(bits: u64) -> Self {
		Self(bits)
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcilerOptions {
	/// Mirror keys into [`KEY_ATTRIBUTE`], so that a later virtualisation can recover them.
	pub expose_keys: bool,
}

/// A request to route an event into the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDispatch {
	pub path: String,
	pub name: String,
	pub data: Value,
	pub immediate: bool,
}

/// What to do about a native event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOutcome {
	pub prevent_default: bool,
	pub stop_propagation: bool,
	/// Set iff the event should be dispatched right away.
	///
	/// Debounced dispatches are delivered later, through the callback passed to [`Reconciler::new`].
	pub dispatch: Option<EventDispatch>,
}

/// Listener options, per event name.
#[derive(Debug, Clone)]
struct Listener {
	include: Vec<String>,
	prevent_default: bool,
	stop_propagation: bool,
	immediate: bool,
}

impl From<&EventAttribute> for Listener {
	fn from(event: &EventAttribute) -> Self {
		Self {
			include: event.include.clone(),
			prevent_default: event.prevent_default,
			stop_propagation: event.stop_propagation,
			immediate: event.immediate,
		}
	}
}

#[derive(Debug)]
struct Throttle {
	delay: u64,
	last: Option<u64>,
	/// Sequence number of the event this throttle last let through.
	last_event: Rc<Cell<Option<u64>>>,
}

#[derive(Debug)]
struct Debounce {
	delay: u64,
	/// Cleared by the timer itself when it fires.
	timeout: Rc<Cell<Option<TimerId>>>,
}

#[derive(Debug)]
pub(crate) struct MetadataNode<N> {
	pub(crate) kind: Kind,
	pub(crate) key: String,
	pub(crate) parent: Option<MetaId>,
	pub(crate) children: Vec<MetaId>,
	pub(crate) node: N,
	handlers: HashMap<String, Listener>,
	throttles: HashMap<String, Throttle>,
	debouncers: HashMap<String, Debounce>,
}

/// Exclusive owner of the live tree below its root.
pub struct Reconciler<D: Document> {
	document: D,
	platform: Rc<dyn Platform>,
	dispatch: Rc<dyn Fn(EventDispatch)>,
	options: ReconcilerOptions,
	root: MetaId,
	metas: HashMap<MetaId, MetadataNode<D::Node>>,
	next_meta: u64,
	pending_focus: Vec<D::Node>,
	event_sequence: u64,
}

impl<D: Document> Reconciler<D> {
	/// Takes over `root`'s child nodes.
	///
	/// `dispatch` receives debounced events when their timer fires. It's never called from within a method of this [`Reconciler`].
	pub fn new(document: D, root: D::Node, platform: Rc<dyn Platform>, dispatch: Rc<dyn Fn(EventDispatch)>, options: ReconcilerOptions) -> Self {
		let mut this = Self {
			document,
			platform,
			dispatch,
			options,
			root: MetaId(0),
			metas: HashMap::new(),
			next_meta: 0,
			pending_focus: Vec::new(),
			event_sequence: 0,
		};
		this.root = this.insert_meta(Kind::Element, None, root, 0, "");
		this
	}

	pub fn document(&self) -> &D {
		&self.document
	}

	pub fn root_node(&self) -> &D::Node {
		&self.meta(self.root).node
	}

	/// The number of live metadata nodes, including the root.
	#[must_use]
	pub fn metadata_len(&self) -> usize {
		self.metas.len()
	}

	/// Whether any debounce timer is currently pending.
	#[must_use]
	pub fn has_pending_debounce(&self) -> bool {
		self.metas.values().any(|meta| meta.debouncers.values().any(|debounce| debounce.timeout.get().is_some()))
	}

	pub(crate) fn root(&self) -> MetaId {
		self.root
	}

	pub(crate) fn meta(&self, id: MetaId) -> &MetadataNode<D::Node> {
		self.metas.get(&id).unwrap_or_else(|| panic!("cambium bug: Missing metadata node {:?}", id))
	}

	fn meta_mut(&mut self, id: MetaId) -> &mut MetadataNode<D::Node> {
		self.metas.get_mut(&id).unwrap_or_else(|| panic!("cambium bug: Missing metadata node {:?}", id))
	}

	/// Creates a metadata node and links it in as `parent`'s `index`th child.
	pub(crate) fn insert_meta(&mut self, kind: Kind, parent: Option<MetaId>, node: D::Node, index: usize, key: &str) -> MetaId {
		let id = MetaId(self.next_meta);
		self.next_meta += 1;
		self.document.bind(&node, id);
		self.metas.insert(
			id,
			MetadataNode {
				kind,
				key: key.to_owned(),
				parent,
				children: Vec::new(),
				node,
				handlers: HashMap::new(),
				throttles: HashMap::new(),
				debouncers: HashMap::new(),
			},
		);
		if let Some(parent) = parent {
			let children = &mut self.meta_mut(parent).children;
			let index = index.min(children.len());
			children.insert(index, id);
		}
		id
	}

	/// The live node that a metadata node's children are attached to.
	///
	/// Fragments don't have an element of their own, so that's their anchor's parent.
	fn parent_node(&self, id: MetaId) -> Option<D::Node> {
		let meta = self.meta(id);
		match meta.kind {
			Kind::Fragment => self.document.parent(&meta.node),
			Kind::Element | Kind::Text | Kind::UnsafeInnerHtml => Some(meta.node.clone()),
		}
	}

	/// The registry path of a metadata node, in string form.
	#[must_use]
	pub(crate) fn path_of(&self, id: MetaId) -> String {
		let mut segments = Vec::new();
		let mut current = id;
		while let Some(parent) = self.meta(current).parent {
			let meta = self.meta(current);
			if meta.key.is_empty() {
				let index = self.meta(parent).children.iter().position(|&child| child == current).unwrap_or_default();
				segments.push(index.to_string());
			} else {
				segments.push(meta.key.clone());
			}
			current = parent;
		}

		let mut path = String::new();
		for (i, segment) in segments.iter().rev().enumerate() {
			if i > 0 {
				path.push(SEPARATOR_ELEMENT);
			}
			path.push_str(segment);
		}
		path
	}

	/// Renders `vnode` as the root's only child. The root must not have metadata children yet.
	#[instrument(skip_all)]
	pub fn mount(&mut self, vnode: &VNode) {
		debug_assert!(self.meta(self.root).children.is_empty(), "`mount` called on a populated root");
		let root_node = self.root_node().clone();
		self.insert_child(&root_node, None, self.root, 0, vnode);
		self.flush_focus();
	}

	/// Applies `patch`, which is addressed to the root's children.
	#[instrument(skip_all)]
	pub fn push(&mut self, patch: &Patch<'_>) {
		let mut stack = vec![(self.root, patch)];
		while let Some((id, patch)) = stack.pop() {
			for change in &patch.changes {
				self.apply(id, change);
			}

			if patch.removed > 0 {
				let count = self.meta(id).children.len();
				if patch.removed > count {
					debug_assert!(false, "Trailing removal of {} beyond {} children", patch.removed, count);
					error!("Trailing removal of {} children, but only {} exist. Removing all.", patch.removed, count);
				}
				let removed = patch.removed.min(count);
				self.remove_children(id, count - removed, removed);
			}

			for child in &patch.children {
				match self.meta(id).children.get(child.index) {
					Some(&child_id) => stack.push((child_id, child)),
					None => {
						debug_assert!(false, "Child patch addresses missing child {}", child.index);
						error!("Child patch addresses missing child {}. Skipping.", child.index);
					}
				}
			}
		}
		self.flush_focus();
	}

	fn apply(&mut self, id: MetaId, change: &Change<'_>) {
		match *change {
			Change::ReplaceText { content } => {
				let span = trace_span!("ReplaceText");
				let _enter = span.enter();
				self.document.set_text(&self.meta(id).node, content);
			}
			Change::ReplaceInnerHtml { inner_html } => {
				let span = trace_span!("ReplaceInnerHtml");
				let _enter = span.enter();
				self.document.set_inner_html(&self.meta(id).node, inner_html);
			}
			Change::UpdateAttributes { ref added, ref removed } => {
				let span = trace_span!("UpdateAttributes", added = added.len(), removed = removed.len());
				let _enter = span.enter();
				self.update(id, added, removed);
			}
			Change::Move { key, before } => {
				let span = trace_span!("Move", before);
				let _enter = span.enter();
				self.move_child(id, key, before);
			}
			Change::Remove { index } => {
				let span = trace_span!("Remove", index);
				let _enter = span.enter();
				self.remove_children(id, index, 1);
			}
			Change::Replace { index, with } => {
				let span = trace_span!("Replace", index);
				let _enter = span.enter();
				self.remove_children(id, index, 1);
				let reference = self.reference(id, index);
				if let Some(parent_node) = self.parent_node(id) {
					self.insert_child(&parent_node, reference.as_ref(), id, index, with);
				} else {
					error!("Can't replace a child of a detached fragment.");
				}
			}
			Change::Insert { children, before } => {
				let span = trace_span!("Insert", count = children.len(), before);
				let _enter = span.enter();
				let fragment = self.document.create_fragment();
				let reference = self.reference(id, before);
				self.insert_children(&fragment, None, id, before, children);
				match self.parent_node(id) {
					Some(parent_node) => self.document.insert_before(&parent_node, &fragment, reference.as_ref()),
					None => error!("Can't insert into a detached fragment."),
				}
			}
		}
	}

	/// The live node to insert before so that a new child ends up at `index` of `id`'s children.
	///
	/// Fragments extend past their anchor, so the search descends into the last child of trailing fragments.
	fn reference(&self, id: MetaId, index: usize) -> Option<D::Node> {
		let meta = self.meta(id);
		if let Some(&child) = meta.children.get(index) {
			return Some(self.meta(child).node.clone());
		}

		let mut last = match meta.children.last() {
			Some(&last) => last,
			None if meta.kind == Kind::Fragment => id,
			None => return None,
		};
		loop {
			let last_meta = self.meta(last);
			match (last_meta.kind, last_meta.children.last()) {
				(Kind::Fragment, Some(&child)) => last = child,
				_ => break,
			}
		}
		self.document.next_sibling(&self.meta(last).node)
	}

	fn move_child(&mut self, id: MetaId, key: &str, before: usize) {
		let children = &self.meta(id).children;
		let found = children.iter().skip(before + 1).position(|&child| self.meta(child).key == key).map(|offset| before + 1 + offset);
		let (Some(position), Some(&reference)) = (found, children.get(before)) else {
			debug_assert!(false, "`Move` references a key absent from the live children");
			return error!("`Move` references a key absent from the live children. Skipping.");
		};

		let moved = self.meta_mut(id).children.remove(position);
		self.meta_mut(id).children.insert(before, moved);

		let Some(parent_node) = self.parent_node(id) else {
			return error!("Can't move within a detached fragment.");
		};
		let reference = self.meta(reference).node.clone();
		self.move_subtree(&parent_node, moved, &reference);
	}

	/// Moves a node, and if it's a fragment all of its materialised descendants, before `reference`.
	fn move_subtree(&self, parent_node: &D::Node, id: MetaId, reference: &D::Node) {
		let meta = self.meta(id);
		self.document.move_before(parent_node, &meta.node, Some(reference));
		if meta.kind == Kind::Fragment {
			for &child in &meta.children {
				self.move_subtree(parent_node, child, reference);
			}
		}
	}

	fn remove_children(&mut self, id: MetaId, index: usize, count: usize) {
		let parent_node = self.parent_node(id);
		let children = &mut self.meta_mut(id).children;
		if index + count > children.len() {
			debug_assert!(false, "Removal of {}..{} beyond {} children", index, index + count, children.len());
			error!("Removal beyond the end of the live children. Clamping.");
		}
		let end = (index + count).min(children.len());
		let start = index.min(end);
		let deleted: Vec<MetaId> = children.drain(start..end).collect();

		// Fragment children are siblings of their anchor in the live tree.
		let mut detach = deleted.clone();
		let mut i = 0;
		while let Some(&current) = detach.get(i) {
			let meta = self.meta(current);
			match &parent_node {
				Some(parent_node) => self.document.remove_child(parent_node, &meta.node),
				None => error!("Can't remove from a detached fragment."),
			}
			if meta.kind == Kind::Fragment {
				detach.extend_from_slice(&meta.children);
			}
			i += 1;
		}

		for id in deleted {
			self.free(id);
		}
	}

	/// Drops a metadata subtree, cancelling its pending debounce timers.
	fn free(&mut self, id: MetaId) {
		let mut stack = vec![id];
		while let Some(id) = stack.pop() {
			if let Some(meta) = self.metas.remove(&id) {
				for debounce in meta.debouncers.values() {
					if let Some(timeout) = debounce.timeout.take() {
						self.platform.clear_timeout(timeout);
					}
				}
				stack.extend(meta.children);
			}
		}
	}

	fn update(&mut self, id: MetaId, added: &[&Attribute], removed: &[&Attribute]) {
		for attribute in removed {
			let name = attribute.name();
			let node = self.meta(id).node.clone();
			if self.meta_mut(id).handlers.remove(name).is_some() {
				self.document.remove_event_listener(&node, name);
				self.update_throttle(id, name, 0);
				self.update_debounce(id, name, 0);
			} else {
				self.document.remove_attribute(&node, name);
				if matches!(name, "checked" | "selected") {
					self.document.set_property(&node, name, &Value::Bool(false));
				}
			}
		}

		for attribute in added {
			self.create_attribute(id, attribute);
		}
	}

	fn create_attribute(&mut self, id: MetaId, attribute: &Attribute) {
		let node = self.meta(id).node.clone();
		match attribute {
			Attribute::Attribute { name, value } => {
				if name == "virtual:defaultValue" {
					return self.document.set_property(&node, "defaultValue", &Value::String(value.clone()));
				}
				if self.document.get_attribute(&node, name).as_deref() != Some(value.as_str()) {
					self.document.set_attribute(&node, name, value);
				}
				match name.as_str() {
					"value" => self.document.set_property(&node, "value", &Value::String(value.clone())),
					"checked" | "selected" => self.document.set_property(&node, name, &Value::Bool(true)),
					"autofocus" => self.pending_focus.push(node),
					"autoplay" => self.document.play(&node),
					_ => (),
				}
			}
			Attribute::Property { name, value } => self.document.set_property(&node, name, value),
			Attribute::Event(event) => {
				let name = event.name.as_str();
				if self.meta(id).handlers.contains_key(name) {
					self.document.remove_event_listener(&node, name);
				}
				self.document.add_event_listener(&node, name, !event.prevent_default);
				self.update_throttle(id, name, event.throttle);
				self.update_debounce(id, name, event.debounce);
				self.meta_mut(id).handlers.insert(name.to_owned(), event.into());
			}
		}
	}

	fn update_throttle(&mut self, id: MetaId, name: &str, delay: u64) {
		let throttles = &mut self.meta_mut(id).throttles;
		if delay > 0 {
			match throttles.get_mut(name) {
				Some(throttle) => throttle.delay = delay,
				None => {
					throttles.insert(
						name.to_owned(),
						Throttle {
							delay,
							last: None,
							last_event: Rc::default(),
						},
					);
				}
			}
		} else {
			throttles.remove(name);
		}
	}

	fn update_debounce(&mut self, id: MetaId, name: &str, delay: u64) {
		let debouncers = &mut self.meta_mut(id).debouncers;
		if delay > 0 {
			match debouncers.get_mut(name) {
				Some(debounce) => debounce.delay = delay,
				None => {
					debouncers.insert(name.to_owned(), Debounce { delay, timeout: Rc::default() });
				}
			}
		} else if let Some(timeout) = debouncers.remove(name).and_then(|debounce| debounce.timeout.take()) {
			self.platform.clear_timeout(timeout);
		}
	}

	fn insert_children(&mut self, dom_parent: &D::Node, before: Option<&D::Node>, meta_parent: MetaId, index: usize, children: &[VNode]) {
		for (i, child) in children.iter().enumerate() {
			self.insert_child(dom_parent, before, meta_parent, index + i, child);
		}
	}

	fn insert_child(&mut self, dom_parent: &D::Node, before: Option<&D::Node>, meta_parent: MetaId, index: usize, vnode: &VNode) {
		match vnode {
			VNode::Element { key, namespace, tag, attributes, children, .. } => {
				let (node, id) = self.create_element(meta_parent, index, Kind::Element, key, namespace, tag, attributes);
				self.insert_children(&node, None, id, 0, children);
				self.document.insert_before(dom_parent, &node, before);
			}
			VNode::Text { key, content, .. } => {
				let node = self.document.create_text(content);
				self.insert_meta(Kind::Text, Some(meta_parent), node.clone(), index, key);
				self.document.insert_before(dom_parent, &node, before);
			}
			VNode::Fragment { key, children, .. } => {
				let anchor = self.document.create_text("");
				let id = self.insert_meta(Kind::Fragment, Some(meta_parent), anchor.clone(), index, key);
				self.document.insert_before(dom_parent, &anchor, before);
				self.insert_children(dom_parent, before, id, 0, children);
			}
			VNode::UnsafeInnerHtml {
				key,
				namespace,
				tag,
				attributes,
				inner_html,
				..
			} => {
				let (node, _) = self.create_element(meta_parent, index, Kind::UnsafeInnerHtml, key, namespace, tag, attributes);
				self.document.set_inner_html(&node, inner_html);
				self.document.insert_before(dom_parent, &node, before);
			}
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn create_element(&mut self, meta_parent: MetaId, index: usize, kind: Kind, key: &str, namespace: &str, tag: &str, attributes: &[Attribute]) -> (D::Node, MetaId) {
		if STATIC_MAX_LEVEL >= Level::TRACE {
			trace!(tag, "Creating element.");
		}
		let node = self.document.create_element(namespace, tag);
		let id = self.insert_meta(kind, Some(meta_parent), node.clone(), index, key);
		if self.options.expose_keys && !key.is_empty() {
			self.document.set_attribute(&node, KEY_ATTRIBUTE, key);
		}
		for attribute in attributes {
			self.create_attribute(id, attribute);
		}
		(node, id)
	}

	fn flush_focus(&mut self) {
		for node in core::mem::take(&mut self.pending_focus) {
			self.document.focus(&node);
		}
	}

	/// Decides what to do about a native `name` event that reached a listener on `target`.
	///
	/// Throttled events are let through at most once per throttle window.
	/// Debounced events restart their timer. When it fires, the event is delivered through the dispatch callback,
	/// unless the throttle already let that same event through.
	#[instrument(skip(self, target, event))]
	pub fn handle_event(&mut self, target: &D::Node, name: &str, event: &D::Event) -> EventOutcome {
		let Some(id) = self.document.bound(target).filter(|id| self.metas.contains_key(id)) else {
			debug!("Event on a node without metadata. Ignoring.");
			return EventOutcome::default();
		};
		let Some(listener) = self.meta(id).handlers.get(name).cloned() else {
			debug!("Event without a declared listener. Ignoring.");
			return EventOutcome::default();
		};

		self.event_sequence += 1;
		let sequence = self.event_sequence;
		let dispatch = EventDispatch {
			path: self.path_of(id),
			name: name.to_owned(),
			data: self.document.serialize_event(event, &listener.include),
			immediate: listener.immediate,
		};
		let mut outcome = EventOutcome {
			prevent_default: listener.prevent_default,
			stop_propagation: listener.stop_propagation,
			dispatch: None,
		};

		let now = self.platform.now();
		let platform = Rc::clone(&self.platform);
		let sink = Rc::clone(&self.dispatch);
		let meta = self.meta_mut(id);

		let mut throttled_last_event = None;
		if let Some(throttle) = meta.throttles.get_mut(name) {
			if throttle.last.map_or(true, |last| now > last + throttle.delay) {
				trace!("Throttle window elapsed.");
				throttle.last = Some(now);
				throttle.last_event.set(Some(sequence));
				outcome.dispatch = Some(dispatch.clone());
			} else {
				trace!("Throttled.");
			}
			throttled_last_event = Some(Rc::clone(&throttle.last_event));
		}

		let debounced = match meta.debouncers.get_mut(name) {
			Some(debounce) => {
				if let Some(timeout) = debounce.timeout.take() {
					platform.clear_timeout(timeout);
				}
				let dispatch = dispatch.clone();
				let timeout = Rc::clone(&debounce.timeout);
				debounce.timeout.set(Some(platform.set_timeout(
					debounce.delay,
					Box::new(move || {
						timeout.set(None);
						if throttled_last_event.map_or(false, |last| last.get() == Some(sequence)) {
							return trace!("Debounced event was already let through by the throttle.");
						}
						sink(dispatch);
					}),
				)));
				true
			}
			None => false,
		};

		if !debounced && !meta.throttles.contains_key(name) {
			outcome.dispatch = Some(dispatch);
		}
		outcome
	}
}

impl<D: Document + core::fmt::Debug> core::fmt::Debug for Reconciler<D> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Reconciler")
			.field("document", &self.document)
			.field("options", &self.options)
			.field("root", &self.root)
			.field("metadata_len", &self.metas.len())
			.finish_non_exhaustive()
	}
}
