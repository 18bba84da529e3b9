#![cfg(all(target_arch = "wasm32", feature = "web"))]

mod web_setup_;

use cambium::{
	attribute::{id, value},
	event::{on_click, on_input},
	html::{button, div, input, p, text},
	web, App,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlElement, HtmlInputElement};

wasm_bindgen_test_configure!(run_in_browser);

#[derive(Clone)]
enum Msg {
	Increment,
	Edit(String),
}

fn app() -> App<(), (i32, String), Msg> {
	App::simple(
		|()| (0, String::new()),
		|(count, draft), message| match message {
			Msg::Increment => (count + 1, draft),
			Msg::Edit(draft) => (count, draft),
		},
		|(count, draft): &(i32, String)| {
			div(
				vec![],
				vec![
					button(vec![id("increment"), on_click(Msg::Increment)], vec![text(count.to_string())]),
					input(vec![id("draft"), value(draft.clone()), on_input(Msg::Edit)]),
					p(vec![], vec![text(draft.clone())]),
				],
			)
		},
	)
}

fn by_id<T: JsCast>(id: &str) -> T {
	window().unwrap().document().unwrap().get_element_by_id(id).unwrap().dyn_into().unwrap()
}

#[wasm_bindgen_test]
fn click() {
	let root = web_setup_::mount_point("click-app");
	let runtime = web::start(&app(), (), "#click-app").unwrap();
	assert_eq!(root.inner_html(), r#"<div><button id="increment">0</button><input id="draft" value=""><p></p></div>"#);

	by_id::<HtmlElement>("increment").click();
	assert_eq!(runtime.with_model(|(count, _)| *count), Some(1));
	// Clicks are rendered on the next animation frame.
	assert_eq!(by_id::<HtmlElement>("increment").inner_text(), "0");

	root.remove();
}

#[wasm_bindgen_test]
fn input_renders_immediately() {
	let root = web_setup_::mount_point("input-app");
	let runtime = web::start(&app(), (), "#input-app").unwrap();

	let draft: HtmlInputElement = by_id("draft");
	draft.set_value("hi");
	draft.dispatch_event(&web_sys::Event::new("input").unwrap()).unwrap();

	assert_eq!(runtime.with_model(|(_, draft)| draft.clone()), Some("hi".to_owned()));
	assert_eq!(root.query_selector("p").unwrap().unwrap().text_content().as_deref(), Some("hi"));
	assert_eq!(draft.value(), "hi");

	root.remove();
}

#[wasm_bindgen_test]
fn missing_root() {
	web_setup_::mount_point("unrelated");
	assert!(matches!(web::start(&app(), (), "#nowhere"), Err(cambium::Error::ElementNotFound { .. })));
}
