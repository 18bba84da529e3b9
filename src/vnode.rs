//! The untyped virtual node model.
//!
//! Trees are built fresh for every render and never mutated afterwards.
//! The typed authoring layer in [`element`](`crate::element`) produces these.

use crate::vattr::{self, Attribute};
use core::{any::Any, fmt::Debug};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::warn;

/// A message with its type erased.
pub type AnyMessage = Box<dyn Any>;

/// Translates messages of an embedded subtree into the message space of its parent.
pub type Mapper = Rc<dyn Fn(AnyMessage) -> AnyMessage>;

/// The XHTML namespace, which [`VNode`]s denote with an empty string.
pub const NAMESPACE_HTML: &str = "http://www.w3.org/1999/xhtml";

/// Node kinds, used by the reconciler's shadow tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
	Fragment,
	Element,
	Text,
	UnsafeInnerHtml,
}

/// Key → index into the sibling list, for every child with a non-empty key.
pub type KeyedChildren = HashMap<String, usize>;

#[derive(Clone)]
pub enum VNode {
	/// Has no element of its own. Rendered as an empty text node anchor followed by the children.
	Fragment {
		key: String,
		mapper: Option<Mapper>,
		children: Vec<VNode>,
		keyed_children: KeyedChildren,
	},
	Element {
		key: String,
		mapper: Option<Mapper>,
		/// Empty for HTML.
		namespace: String,
		tag: String,
		attributes: Vec<Attribute>,
		children: Vec<VNode>,
		keyed_children: KeyedChildren,
	},
	Text {
		key: String,
		mapper: Option<Mapper>,
		content: String,
	},
	/// Attributes are diffed, but the content is only ever replaced wholesale.
	UnsafeInnerHtml {
		key: String,
		mapper: Option<Mapper>,
		namespace: String,
		tag: String,
		attributes: Vec<Attribute>,
		inner_html: String,
	},
}

impl VNode {
	#[must_use]
	pub fn fragment(children: Vec<VNode>) -> Self {
		let keyed_children = index_keyed(&children);
		Self::Fragment {
			key: String::new(),
			mapper: None,
			children,
			keyed_children,
		}
	}

	/// Attributes are brought into canonical order via [`vattr::prepare`].
	#[must_use]
	pub fn element(namespace: impl Into<String>, tag: impl Into<String>, attributes: Vec<Attribute>, children: Vec<VNode>) -> Self {
		let namespace = namespace.into();
		let tag = tag.into();
		let keyed_children = index_keyed(&children);
		Self::Element {
			key: String::new(),
			mapper: None,
			namespace,
			tag,
			attributes: vattr::prepare(attributes),
			children,
			keyed_children,
		}
	}

	#[must_use]
	pub fn text(content: impl Into<String>) -> Self {
		Self::Text {
			key: String::new(),
			mapper: None,
			content: content.into(),
		}
	}

	#[must_use]
	pub fn unsafe_inner_html(namespace: impl Into<String>, tag: impl Into<String>, attributes: Vec<Attribute>, inner_html: impl Into<String>) -> Self {
		Self::UnsafeInnerHtml {
			key: String::new(),
			mapper: None,
			namespace: namespace.into(),
			tag: tag.into(),
			attributes: vattr::prepare(attributes),
			inner_html: inner_html.into(),
		}
	}

	/// Sets this node's key, replacing any previous one.
	#[must_use]
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		*self.key_mut() = key.into();
		self
	}

	/// Composes `mapper` *outside* of any mapper this node already carries.
	#[must_use]
	pub fn map_with(mut self, mapper: Mapper) -> Self {
		let slot = self.mapper_mut();
		*slot = compose(Some(mapper), slot.take());
		self
	}

	#[must_use]
	pub fn kind(&self) -> Kind {
		match self {
			Self::Fragment { .. } => Kind::Fragment,
			Self::Element { .. } => Kind::Element,
			Self::Text { .. } => Kind::Text,
			Self::UnsafeInnerHtml { .. } => Kind::UnsafeInnerHtml,
		}
	}

	#[must_use]
	pub fn key(&self) -> &str {
		match self {
			Self::Fragment { key, .. } | Self::Element { key, .. } | Self::Text { key, .. } | Self::UnsafeInnerHtml { key, .. } => key,
		}
	}

	fn key_mut(&mut self) -> &mut String {
		match self {
			Self::Fragment { key, .. } | Self::Element { key, .. } | Self::Text { key, .. } | Self::UnsafeInnerHtml { key, .. } => key,
		}
	}

	#[must_use]
	pub fn mapper(&self) -> Option<&Mapper> {
		match self {
			Self::Fragment { mapper, .. } | Self::Element { mapper, .. } | Self::Text { mapper, .. } | Self::UnsafeInnerHtml { mapper, .. } => mapper.as_ref(),
		}
	}

	fn mapper_mut(&mut self) -> &mut Option<Mapper> {
		match self {
			Self::Fragment { mapper, .. } | Self::Element { mapper, .. } | Self::Text { mapper, .. } | Self::UnsafeInnerHtml { mapper, .. } => mapper,
		}
	}

	/// Empty for leaves.
	#[must_use]
	pub fn children(&self) -> &[VNode] {
		match self {
			Self::Fragment { children, .. } | Self::Element { children, .. } => children,
			Self::Text { .. } | Self::UnsafeInnerHtml { .. } => &[],
		}
	}

	/// Empty for text and fragments.
	#[must_use]
	pub fn attributes(&self) -> &[Attribute] {
		match self {
			Self::Element { attributes, .. } | Self::UnsafeInnerHtml { attributes, .. } => attributes,
			Self::Fragment { .. } | Self::Text { .. } => &[],
		}
	}

	/// Looks up a child by key.
	#[must_use]
	pub fn keyed_child(&self, key: &str) -> Option<&VNode> {
		match self {
			Self::Fragment { children, keyed_children, .. } | Self::Element { children, keyed_children, .. } => keyed_children.get(key).and_then(|&i| children.get(i)),
			Self::Text { .. } | Self::UnsafeInnerHtml { .. } => None,
		}
	}
}

impl Debug for VNode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Self::Fragment { key, children, .. } => f.debug_struct("Fragment").field("key", key).field("children", children).finish(),
			Self::Element { key, namespace, tag, attributes, children, .. } => f
				.debug_struct("Element")
				.field("key", key)
				.field("namespace", namespace)
				.field("tag", tag)
				.field("attributes", attributes)
				.field("children", children)
				.finish(),
			Self::Text { key, content, .. } => {
				let mut debug = f.debug_struct("Text");
				debug.field("key", key);
				if cfg!(feature = "dangerous-logging") {
					debug.field("content", content);
				}
				debug.finish_non_exhaustive()
			}
			Self::UnsafeInnerHtml { key, namespace, tag, attributes, .. } => f
				.debug_struct("UnsafeInnerHtml")
				.field("key", key)
				.field("namespace", namespace)
				.field("tag", tag)
				.field("attributes", attributes)
				.finish_non_exhaustive(),
		}
	}
}

/// Builds the key → index map for a sibling list.
///
/// Duplicate keys are a bug in the calling view. The first occurrence wins.
#[must_use]
pub fn index_keyed(children: &[VNode]) -> KeyedChildren {
	let mut keyed = KeyedChildren::new();
	for (i, child) in children.iter().enumerate() {
		let key = child.key();
		if key.is_empty() {
			continue;
		}
		if keyed.contains_key(key) {
			if cfg!(debug_assertions) {
				panic!("Duplicate key encountered: {:?}", key);
			}
			warn!("Duplicate key encountered among siblings. Later occurrences are treated as unkeyed for lookup.");
			continue;
		}
		keyed.insert(key.to_owned(), i);
	}
	keyed
}

/// `parent ∘ child`, where [`None`] is the identity.
#[must_use]
pub fn compose(parent: Option<Mapper>, child: Option<Mapper>) -> Option<Mapper> {
	match (parent, child) {
		(None, child) => child,
		(parent, None) => parent,
		(Some(parent), Some(child)) => Some(Rc::new(move |message| parent(child(message)))),
	}
}

/// Whether `tag` can't have children, in which case HTML serialisation omits the closing tag.
#[must_use]
pub fn is_void_element(tag: &str, namespace: &str) -> bool {
	namespace.is_empty()
		&& matches!(
			tag,
			"area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "param" | "source" | "track" | "wbr"
		)
}
