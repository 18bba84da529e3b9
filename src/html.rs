//! HTML element helpers.

use crate::{
	attribute::Attr,
	element::{element, Element},
};

#[must_use]
pub fn a<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("a", attrs, children)
}

#[must_use]
pub fn article<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("article", attrs, children)
}

#[must_use]
pub fn button<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("button", attrs, children)
}

#[must_use]
pub fn div<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("div", attrs, children)
}

#[must_use]
pub fn footer<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("footer", attrs, children)
}

#[must_use]
pub fn form<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("form", attrs, children)
}

#[must_use]
pub fn h1<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("h1", attrs, children)
}

#[must_use]
pub fn h2<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("h2", attrs, children)
}

#[must_use]
pub fn h3<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("h3", attrs, children)
}

#[must_use]
pub fn header<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("header", attrs, children)
}

#[must_use]
pub fn label<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("label", attrs, children)
}

#[must_use]
pub fn li<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("li", attrs, children)
}

#[must_use]
pub fn main<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("main", attrs, children)
}

#[must_use]
pub fn nav<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("nav", attrs, children)
}

#[must_use]
pub fn ol<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("ol", attrs, children)
}

#[must_use]
pub fn option<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("option", attrs, children)
}

#[must_use]
pub fn p<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("p", attrs, children)
}

#[must_use]
pub fn section<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("section", attrs, children)
}

#[must_use]
pub fn select<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("select", attrs, children)
}

#[must_use]
pub fn span<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("span", attrs, children)
}

#[must_use]
pub fn textarea<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("textarea", attrs, children)
}

#[must_use]
pub fn ul<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<Element<Msg>>) -> Element<Msg> {
	element("ul", attrs, children)
}

#[must_use]
pub fn br<Msg>(attrs: Vec<Attr<Msg>>) -> Element<Msg> {
	element("br", attrs, Vec::new())
}

#[must_use]
pub fn hr<Msg>(attrs: Vec<Attr<Msg>>) -> Element<Msg> {
	element("hr", attrs, Vec::new())
}

#[must_use]
pub fn img<Msg>(attrs: Vec<Attr<Msg>>) -> Element<Msg> {
	element("img", attrs, Vec::new())
}

#[must_use]
pub fn input<Msg>(attrs: Vec<Attr<Msg>>) -> Element<Msg> {
	element("input", attrs, Vec::new())
}

pub use crate::element::text;
