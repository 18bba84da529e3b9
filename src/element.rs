//! Typed views.
//!
//! An [`Element<Msg>`] is a [`VNode`] whose event handlers produce `Msg`.

use crate::{
	attribute::Attr,
	vnode::{AnyMessage, Mapper, VNode},
};
use core::{fmt::Debug, marker::PhantomData};
use std::rc::Rc;

pub struct Element<Msg> {
	node: VNode,
	_message: PhantomData<fn() -> Msg>,
}

impl<Msg> Clone for Element<Msg> {
	fn clone(&self) -> Self {
		Self::from_vnode(self.node.clone())
	}
}

impl<Msg> Debug for Element<Msg> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		self.node.fmt(f)
	}
}

impl<Msg> Element<Msg> {
	/// The caller vouches that all handlers in `node` produce `Msg`.
	#[must_use]
	pub fn from_vnode(node: VNode) -> Self {
		Self { node, _message: PhantomData }
	}

	#[must_use]
	pub fn into_vnode(self) -> VNode {
		self.node
	}

	#[must_use]
	pub fn as_vnode(&self) -> &VNode {
		&self.node
	}

	#[must_use]
	pub fn with_key(self, key: impl Into<String>) -> Self {
		Self::from_vnode(self.node.with_key(key))
	}
}

impl<Msg: 'static> Element<Msg> {
	/// Embeds this subtree in a parent's message space.
	///
	/// This is O(1): the conversion is composed onto the node and only runs when an event is handled.
	#[must_use]
	pub fn map<Outer: 'static>(self, f: impl Fn(Msg) -> Outer + 'static) -> Element<Outer> {
		Element::from_vnode(self.node.map_with(erase(f)))
	}
}

/// Lifts a typed conversion into a [`Mapper`]. Messages of other types pass through unchanged.
pub(crate) fn erase<Msg: 'static, Outer: 'static>(f: impl Fn(Msg) -> Outer + 'static) -> Mapper {
	Rc::new(move |message: AnyMessage| match message.downcast::<Msg>() {
		Ok(message) => Box::new(f(*message)) as AnyMessage,
		Err(message) => message,
	})
}

fn vnodes<Msg>(children: Vec<Element<Msg>>) -> Vec<VNode> {
	children.into_iter().map(Element::into_vnode).collect()
}

fn attributes<Msg>(attributes: Vec<Attr<Msg>>) -> Vec<crate::vattr::Attribute> {
	attributes.into_iter().map(Attr::into_attribute).collect()
}

/// An HTML element.
#[must_use]
pub fn element<Msg>(tag: &str, attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	namespaced("", tag, attrs, children)
}

#[must_use]
pub fn namespaced<Msg>(namespace: &str, tag: &str, attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	Element::from_vnode(VNode::element(namespace, tag, attributes(attrs), vnodes(children)))
}

#[must_use]
pub fn text<Msg>(content: impl Into<String>) -> Element<Msg> {
	Element::from_vnode(VNode::text(content))
}

/// Renders nothing visible (an empty text node).
#[must_use]
pub fn none<Msg>() -> Element<Msg> {
	text("")
}

#[must_use]
pub fn fragment<Msg>(children: Vec<Element<Msg>>) -> Element<Msg> {
	Element::from_vnode(VNode::fragment(vnodes(children)))
}

/// `inner_html` is inserted without any escaping.
#[must_use]
pub fn unsafe_raw_html<Msg>(namespace: &str, tag: &str, attrs: Vec<Attr<Msg>>, inner_html: impl Into<String>) -> Element<Msg> {
	Element::from_vnode(VNode::unsafe_inner_html(namespace, tag, attributes(attrs), inner_html))
}

/// Builders whose children are identified by key, so that reordering them moves live nodes instead of rewriting them.
pub mod keyed {
	use super::{Attr, Element};

	fn keyed<Msg>(children: Vec<(String, Element<Msg>)>) -> Vec<Element<Msg>> {
		children.into_iter().map(|(key, child)| child.with_key(key)).collect()
	}

	#[must_use]
	pub fn element<Msg>(tag: &str, attrs: Vec<Attr<Msg>>, children: Vec<(String, Element<Msg>)>) -> Element<Msg> {
		super::element(tag, attrs, keyed(children))
	}

	#[must_use]
	pub fn namespaced<Msg>(namespace: &str, tag: &str, attrs: Vec<Attr<Msg>>, children: Vec<(String, Element<Msg>)>) -> Element<Msg> {
		super::namespaced(namespace, tag, attrs, keyed(children))
	}

	#[must_use]
	pub fn fragment<Msg>(children: Vec<(String, Element<Msg>)>) -> Element<Msg> {
		super::fragment(keyed(children))
	}

	#[must_use]
	pub fn ul<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<(String, Element<Msg>)>) -> Element<Msg> {
		element("ul", attrs, children)
	}

	#[must_use]
	pub fn ol<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<(String, Element<Msg>)>) -> Element<Msg> {
		element("ol", attrs, children)
	}

	#[must_use]
	pub fn div<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<(String, Element<Msg>)>) -> Element<Msg> {
		element("div", attrs, children)
	}
}
