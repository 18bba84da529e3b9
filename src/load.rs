//! Virtualisation: adopting an existing live subtree as the initial rendered tree.

use crate::{
	document::{Document, NodeType},
	reconciler::{MetaId, Reconciler, KEY_ATTRIBUTE},
	vattr::Attribute,
	vnode::{Kind, VNode, NAMESPACE_HTML},
};
use tracing::{instrument, trace};

impl<D: Document> Reconciler<D> {
	/// Builds metadata for the root's current child nodes and returns the equivalent [`VNode`].
	///
	/// Elements and non-empty text nodes are adopted. Everything else is removed.
	/// A single adopted node is returned as-is, several are wrapped in a fragment (with a new anchor),
	/// and if there are none the root's content is replaced with an empty text node.
	///
	/// Keys are recovered from (and then stripped of) [`KEY_ATTRIBUTE`].
	#[instrument(skip_all)]
	pub fn virtualise(&mut self) -> VNode {
		let root = self.root();
		let root_node = self.root_node().clone();

		let mut count = 0;
		let mut child = self.document().first_child(&root_node);
		while let Some(current) = child {
			if can_virtualise(&self.document().node_type(&current)) {
				count += 1;
			}
			child = self.document().next_sibling(&current);
		}
		trace!(count, "Virtualising root children.");

		match count {
			0 => {
				while let Some(child) = self.document().first_child(&root_node) {
					self.document().remove_child(&root_node, &child);
				}
				let placeholder = self.document().create_text("");
				self.insert_meta(Kind::Text, Some(root), placeholder.clone(), 0, "");
				self.document().insert_before(&root_node, &placeholder, None);
				VNode::text("")
			}
			1 => {
				let mut children = self.virtualise_child_nodes(root, &root_node);
				children.pop().unwrap_or_else(|| VNode::text(""))
			}
			_ => {
				let anchor = self.document().create_text("");
				let fragment = self.insert_meta(Kind::Fragment, Some(root), anchor.clone(), 0, "");
				let children = self.virtualise_child_nodes(fragment, &root_node);
				let first = self.document().first_child(&root_node);
				self.document().insert_before(&root_node, &anchor, first.as_ref());
				VNode::fragment(children)
			}
		}
	}

	fn virtualise_child_nodes(&mut self, meta: MetaId, node: &D::Node) -> Vec<VNode> {
		let mut children = Vec::new();
		let mut child = self.document().first_child(node);
		while let Some(current) = child {
			let next = self.document().next_sibling(&current);

			let key = match self.document().node_type(&current) {
				NodeType::Element { .. } => {
					let key = self.document().get_attribute(&current, KEY_ATTRIBUTE);
					if key.is_some() {
						self.document().remove_attribute(&current, KEY_ATTRIBUTE);
					}
					key.unwrap_or_default()
				}
				NodeType::Text(_) | NodeType::Other => String::new(),
			};

			match self.virtualise_node(meta, &current, &key, children.len()) {
				Some(vnode) => children.push(vnode.with_key(key)),
				None => self.document().remove_child(node, &current),
			}
			child = next;
		}
		children
	}

	fn virtualise_node(&mut self, meta: MetaId, node: &D::Node, key: &str, index: usize) -> Option<VNode> {
		match self.document().node_type(node) {
			NodeType::Element { namespace, tag } => {
				let id = self.insert_meta(Kind::Element, Some(meta), node.clone(), index, key);
				let namespace = if namespace == NAMESPACE_HTML { String::new() } else { namespace };
				let attributes = self
					.document()
					.attributes(node)
					.into_iter()
					.filter(|(name, _)| name != "xmlns")
					.map(|(name, value)| Attribute::attribute(name, value))
					.collect();
				let children = self.virtualise_child_nodes(id, node);
				Some(VNode::element(namespace, tag, attributes, children))
			}
			NodeType::Text(data) if !data.is_empty() => {
				self.insert_meta(Kind::Text, Some(meta), node.clone(), index, key);
				Some(VNode::text(data))
			}
			NodeType::Text(_) | NodeType::Other => None,
		}
	}
}

fn can_virtualise(node_type: &NodeType) -> bool {
	match node_type {
		NodeType::Element { .. } => true,
		NodeType::Text(data) => !data.is_empty(),
		NodeType::Other => false,
	}
}
