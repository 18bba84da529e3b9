#![doc(html_root_url = "https://docs.rs/cambium/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod attribute;
pub mod component;
pub mod decode;
pub mod diff;
pub mod document;
pub mod effect;
pub mod element;
pub mod error;
pub mod event;
pub mod events;
pub mod html;
pub mod load;
pub mod memory;
pub mod patch;
pub mod path;
pub mod platform;
pub mod reconciler;
pub mod runtime;
pub mod vattr;
pub mod vnode;

#[cfg(feature = "web")]
pub mod web;

pub use crate::{
	attribute::Attr,
	effect::{Actions, Effect},
	element::Element,
	error::Error,
	runtime::{App, Runtime},
};
