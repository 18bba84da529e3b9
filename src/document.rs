//! The live document the [`Reconciler`](`crate::reconciler::Reconciler`) mutates.
//!
//! Implementations exist for the browser DOM ([`web`](`crate::web`), behind the `"web"` feature)
//! and for an in-memory tree ([`memory`](`crate::memory`)).

use crate::reconciler::MetaId;
use core::fmt::Debug;
use serde_json::Value;

/// What a live node is, as far as virtualisation cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
	/// `namespace` is empty for HTML.
	Element { namespace: String, tag: String },
	Text(String),
	/// Comments, processing instructions and the like.
	Other,
}

/// Low-level mutation and inspection primitives.
///
/// Nodes are handles: cloning one must not clone the underlying live node.
pub trait Document {
	type Node: Clone + Debug + 'static;
	type Event: Clone + 'static;

	/// `namespace` is empty for HTML.
	fn create_element(&self, namespace: &str, tag: &str) -> Self::Node;
	fn create_text(&self, data: &str) -> Self::Node;
	/// A detached container whose children are spliced in place when it's inserted.
	fn create_fragment(&self) -> Self::Node;

	/// Inserts (or moves) `node` into `parent` before `reference`, or at the end if that is [`None`].
	///
	/// Inserting a fragment moves its children instead, leaving it empty.
	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>);

	/// Like [`insert_before`](`Document::insert_before`), but for nodes that are already attached to `parent`.
	///
	/// Implementations may preserve state (like focus) that re-insertion would lose.
	fn move_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>) {
		self.insert_before(parent, node, reference);
	}

	fn remove_child(&self, parent: &Self::Node, child: &Self::Node);

	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
	fn node_type(&self, node: &Self::Node) -> NodeType;

	/// All attributes of an element, in document order.
	fn attributes(&self, element: &Self::Node) -> Vec<(String, String)>;
	fn get_attribute(&self, element: &Self::Node, name: &str) -> Option<String>;
	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str);
	fn remove_attribute(&self, element: &Self::Node, name: &str);
	fn set_property(&self, node: &Self::Node, name: &str, value: &Value);

	/// Replaces a text node's data.
	fn set_text(&self, node: &Self::Node, data: &str);
	fn set_inner_html(&self, element: &Self::Node, html: &str);

	/// Subscribes the node to native `name` events, which the host then routes to
	/// [`Runtime::handle_event`](`crate::runtime::Runtime::handle_event`).
	fn add_event_listener(&self, node: &Self::Node, name: &str, passive: bool);
	fn remove_event_listener(&self, node: &Self::Node, name: &str);

	fn focus(&self, element: &Self::Node);
	/// Resumes media playback, where applicable.
	fn play(&self, element: &Self::Node);

	/// Associates a live node with its shadow metadata.
	fn bind(&self, node: &Self::Node, meta: MetaId);
	fn bound(&self, node: &Self::Node) -> Option<MetaId>;

	/// Extracts a JSON payload from a native event.
	///
	/// `include` lists extra dotted property paths to copy. Implementations always copy `target.value` and `target.checked`
	/// where present, and `detail.formData` for `submit` events.
	fn serialize_event(&self, event: &Self::Event, include: &[String]) -> Value;

	/// Dispatches a bubbling custom event.
	fn dispatch_custom_event(&self, target: &Self::Node, name: &str, detail: &Value);

	fn query_selector(&self, selector: &str) -> Option<Self::Node>;
}
