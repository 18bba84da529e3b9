#![cfg(all(target_arch = "wasm32", feature = "web"))]

use std::sync::Once;
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlElement};

static LOG_INITIALIZED: Once = Once::new();

/// Installs browser console logging and returns a fresh, empty mount point with the given `id`.
pub fn mount_point(id: &str) -> HtmlElement {
	LOG_INITIALIZED.call_once(tracing_wasm::set_as_global_default);

	let document = window().unwrap().document().unwrap();
	let element: HtmlElement = document.create_element("div").unwrap().dyn_into().unwrap();
	element.set_id(id);
	document.body().unwrap().append_child(&element).unwrap();
	element
}
