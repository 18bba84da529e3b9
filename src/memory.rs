//! An in-memory [`Document`], for running headless and for tests.

use crate::{
	document::{Document, NodeType},
	reconciler::MetaId,
	vnode::is_void_element,
};
use core::cell::RefCell;
use serde_json::Value;
use std::{collections::BTreeMap, rc::Rc};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum Data {
	Element {
		namespace: String,
		tag: String,
		attributes: Vec<(String, String)>,
		properties: BTreeMap<String, Value>,
		/// Event name → passive.
		listeners: BTreeMap<String, bool>,
		inner_html: Option<String>,
	},
	Text(String),
	Comment(String),
	Fragment,
}

#[derive(Debug, Clone)]
struct Node {
	data: Data,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	meta: Option<MetaId>,
}

/// A custom event dispatched through [`Document::dispatch_custom_event`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
	pub target: NodeId,
	pub name: String,
	pub detail: Value,
}

#[derive(Debug, Default)]
struct Arena {
	nodes: Vec<Node>,
	body: Option<NodeId>,
	focused: Option<NodeId>,
	played: Vec<NodeId>,
	emitted: Vec<EmittedEvent>,
	mutations: usize,
}

/// A shared handle to an arena of nodes. Clones refer to the same document.
///
/// Events are plain JSON payloads, returned as-is by [`Document::serialize_event`].
#[derive(Debug, Clone)]
pub struct MemoryDocument(Rc<RefCell<Arena>>);

impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDocument {
	/// A document with an empty `<body>`.
	#[must_use]
	pub fn new() -> Self {
		let this = Self(Rc::default());
		let body = this.alloc(Data::Element {
			namespace: String::new(),
			tag: "body".to_owned(),
			attributes: Vec::new(),
			properties: BTreeMap::new(),
			listeners: BTreeMap::new(),
			inner_html: None,
		});
		this.0.borrow_mut().body = Some(body);
		this
	}

	fn alloc(&self, data: Data) -> NodeId {
		let mut arena = self.0.borrow_mut();
		arena.nodes.push(Node {
			data,
			parent: None,
			children: Vec::new(),
			meta: None,
		});
		NodeId(arena.nodes.len() - 1)
	}

	#[must_use]
	pub fn body(&self) -> NodeId {
		self.0.borrow().body.unwrap_or(NodeId(0))
	}

	#[must_use]
	pub fn create_comment(&self, data: &str) -> NodeId {
		self.alloc(Data::Comment(data.to_owned()))
	}

	/// Appends `child` to `parent`.
	pub fn append(&self, parent: NodeId, child: NodeId) {
		self.insert_before(&parent, &child, None);
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.0.borrow().nodes[node.0].children.clone()
	}

	#[must_use]
	pub fn property(&self, node: NodeId, name: &str) -> Option<Value> {
		match &self.0.borrow().nodes[node.0].data {
			Data::Element { properties, .. } => properties.get(name).cloned(),
			Data::Text(_) | Data::Comment(_) | Data::Fragment => None,
		}
	}

	/// Event name → passive, for each listener on `node`.
	#[must_use]
	pub fn listeners(&self, node: NodeId) -> Vec<(String, bool)> {
		match &self.0.borrow().nodes[node.0].data {
			Data::Element { listeners, .. } => listeners.iter().map(|(name, &passive)| (name.clone(), passive)).collect(),
			Data::Text(_) | Data::Comment(_) | Data::Fragment => Vec::new(),
		}
	}

	#[must_use]
	pub fn focused(&self) -> Option<NodeId> {
		self.0.borrow().focused
	}

	#[must_use]
	pub fn played(&self) -> Vec<NodeId> {
		self.0.borrow().played.clone()
	}

	#[must_use]
	pub fn emitted(&self) -> Vec<EmittedEvent> {
		self.0.borrow().emitted.clone()
	}

	/// Counts structural, attribute, property and content mutations.
	#[must_use]
	pub fn mutations(&self) -> usize {
		self.0.borrow().mutations
	}

	/// Serialises `node`'s children.
	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		let arena = self.0.borrow();
		let mut html = String::new();
		write_children(&arena, node, &mut html);
		html
	}

	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let arena = self.0.borrow();
		let mut html = String::new();
		write_node(&arena, node, &mut html);
		html
	}

	/// Depth-first, in document order.
	fn find(&self, from: NodeId, predicate: &dyn Fn(&Node) -> bool) -> Option<NodeId> {
		let arena = self.0.borrow();
		let mut stack = vec![from];
		while let Some(id) = stack.pop() {
			let node = &arena.nodes[id.0];
			if predicate(node) {
				return Some(id);
			}
			stack.extend(node.children.iter().rev());
		}
		None
	}

	fn mutated(&self) {
		self.0.borrow_mut().mutations += 1;
	}

	fn detach(arena: &mut Arena, node: NodeId) {
		if let Some(parent) = arena.nodes[node.0].parent.take() {
			arena.nodes[parent.0].children.retain(|&child| child != node);
		}
	}
}

fn escape(text: &str, html: &mut String) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'<' => html.push_str("&lt;"),
			'>' => html.push_str("&gt;"),
			'"' => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}

fn write_children(arena: &Arena, node: NodeId, html: &mut String) {
	for &child in &arena.nodes[node.0].children {
		write_node(arena, child, html);
	}
}

fn write_node(arena: &Arena, node: NodeId, html: &mut String) {
	match &arena.nodes[node.0].data {
		Data::Element {
			namespace,
			tag,
			attributes,
			inner_html,
			..
		} => {
			html.push('<');
			html.push_str(tag);
			for (name, value) in attributes {
				html.push(' ');
				html.push_str(name);
				html.push_str("=\"");
				escape(value, html);
				html.push('"');
			}
			html.push('>');
			if is_void_element(tag, namespace) {
				return;
			}
			match inner_html {
				Some(inner_html) => html.push_str(inner_html),
				None => write_children(arena, node, html),
			}
			html.push_str("</");
			html.push_str(tag);
			html.push('>');
		}
		Data::Text(text) => escape(text, html),
		Data::Comment(comment) => {
			html.push_str("<!--");
			html.push_str(comment);
			html.push_str("-->");
		}
		Data::Fragment => write_children(arena, node, html),
	}
}

impl Document for MemoryDocument {
	type Node = NodeId;
	type Event = Value;

	fn create_element(&self, namespace: &str, tag: &str) -> NodeId {
		self.alloc(Data::Element {
			namespace: namespace.to_owned(),
			tag: tag.to_owned(),
			attributes: Vec::new(),
			properties: BTreeMap::new(),
			listeners: BTreeMap::new(),
			inner_html: None,
		})
	}

	fn create_text(&self, data: &str) -> NodeId {
		self.alloc(Data::Text(data.to_owned()))
	}

	fn create_fragment(&self) -> NodeId {
		self.alloc(Data::Fragment)
	}

	fn insert_before(&self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) {
		let mut arena = self.0.borrow_mut();
		let moving = if matches!(arena.nodes[node.0].data, Data::Fragment) {
			let children = core::mem::take(&mut arena.nodes[node.0].children);
			for &child in &children {
				arena.nodes[child.0].parent = None;
			}
			children
		} else {
			Self::detach(&mut arena, *node);
			vec![*node]
		};

		let position = match reference {
			Some(reference) => match arena.nodes[parent.0].children.iter().position(|child| child == reference) {
				Some(position) => position,
				None => {
					error!("Reference node is not a child of the parent. Appending instead.");
					arena.nodes[parent.0].children.len()
				}
			},
			None => arena.nodes[parent.0].children.len(),
		};
		for (i, &child) in moving.iter().enumerate() {
			arena.nodes[child.0].parent = Some(*parent);
			arena.nodes[parent.0].children.insert(position + i, child);
		}
		arena.mutations += 1;
	}

	fn remove_child(&self, parent: &NodeId, child: &NodeId) {
		let mut arena = self.0.borrow_mut();
		if arena.nodes[child.0].parent != Some(*parent) {
			return error!("Tried to remove a node from a parent it isn't attached to.");
		}
		Self::detach(&mut arena, *child);
		arena.mutations += 1;
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow().nodes[node.0].parent
	}

	fn first_child(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow().nodes[node.0].children.first().copied()
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		let arena = self.0.borrow();
		let parent = arena.nodes[node.0].parent?;
		let siblings = &arena.nodes[parent.0].children;
		let position = siblings.iter().position(|sibling| sibling == node)?;
		siblings.get(position + 1).copied()
	}

	fn node_type(&self, node: &NodeId) -> NodeType {
		match &self.0.borrow().nodes[node.0].data {
			Data::Element { namespace, tag, .. } => NodeType::Element {
				namespace: namespace.clone(),
				tag: tag.clone(),
			},
			Data::Text(data) => NodeType::Text(data.clone()),
			Data::Comment(_) | Data::Fragment => NodeType::Other,
		}
	}

	fn attributes(&self, element: &NodeId) -> Vec<(String, String)> {
		match &self.0.borrow().nodes[element.0].data {
			Data::Element { attributes, .. } => attributes.clone(),
			Data::Text(_) | Data::Comment(_) | Data::Fragment => Vec::new(),
		}
	}

	fn get_attribute(&self, element: &NodeId, name: &str) -> Option<String> {
		match &self.0.borrow().nodes[element.0].data {
			Data::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.clone()),
			Data::Text(_) | Data::Comment(_) | Data::Fragment => None,
		}
	}

	fn set_attribute(&self, element: &NodeId, name: &str, value: &str) {
		if let Data::Element { attributes, .. } = &mut self.0.borrow_mut().nodes[element.0].data {
			match attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => value.clone_into(existing),
				None => attributes.push((name.to_owned(), value.to_owned())),
			}
		}
		self.mutated();
	}

	fn remove_attribute(&self, element: &NodeId, name: &str) {
		if let Data::Element { attributes, .. } = &mut self.0.borrow_mut().nodes[element.0].data {
			attributes.retain(|(n, _)| n != name);
		}
		self.mutated();
	}

	fn set_property(&self, node: &NodeId, name: &str, value: &Value) {
		if let Data::Element { properties, .. } = &mut self.0.borrow_mut().nodes[node.0].data {
			properties.insert(name.to_owned(), value.clone());
		}
		self.mutated();
	}

	fn set_text(&self, node: &NodeId, data: &str) {
		if let Data::Text(text) = &mut self.0.borrow_mut().nodes[node.0].data {
			data.clone_into(text);
		}
		self.mutated();
	}

	fn set_inner_html(&self, element: &NodeId, html: &str) {
		{
			let mut arena = self.0.borrow_mut();
			let children = core::mem::take(&mut arena.nodes[element.0].children);
			for child in children {
				arena.nodes[child.0].parent = None;
			}
			if let Data::Element { inner_html, .. } = &mut arena.nodes[element.0].data {
				*inner_html = Some(html.to_owned());
			}
		}
		self.mutated();
	}

	fn add_event_listener(&self, node: &NodeId, name: &str, passive: bool) {
		if let Data::Element { listeners, .. } = &mut self.0.borrow_mut().nodes[node.0].data {
			listeners.insert(name.to_owned(), passive);
		}
	}

	fn remove_event_listener(&self, node: &NodeId, name: &str) {
		if let Data::Element { listeners, .. } = &mut self.0.borrow_mut().nodes[node.0].data {
			listeners.remove(name);
		}
	}

	fn focus(&self, element: &NodeId) {
		self.0.borrow_mut().focused = Some(*element);
	}

	fn play(&self, element: &NodeId) {
		self.0.borrow_mut().played.push(*element);
	}

	fn bind(&self, node: &NodeId, meta: MetaId) {
		self.0.borrow_mut().nodes[node.0].meta = Some(meta);
	}

	fn bound(&self, node: &NodeId) -> Option<MetaId> {
		self.0.borrow().nodes[node.0].meta
	}

	fn serialize_event(&self, event: &Value, _include: &[String]) -> Value {
		event.clone()
	}

	fn dispatch_custom_event(&self, target: &NodeId, name: &str, detail: &Value) {
		self.0.borrow_mut().emitted.push(EmittedEvent {
			target: *target,
			name: name.to_owned(),
			detail: detail.clone(),
		});
	}

	/// Supports `#id` and bare tag names.
	fn query_selector(&self, selector: &str) -> Option<NodeId> {
		let body = self.body();
		match selector.strip_prefix('#') {
			Some(id) => self.find(body, &|node| matches!(&node.data, Data::Element { attributes, .. } if attributes.iter().any(|(n, v)| n == "id" && v == id))),
			None => self.find(body, &|node| matches!(&node.data, Data::Element { tag, .. } if tag == selector)),
		}
	}
}
