
use cambium::{
	attribute::value,
	document::Document,
	effect::Effect,
	error::Error,
	event::{emit, on_click, on_input},
	html::{button, div, input, p, text},
	memory::{EmittedEvent, MemoryDocument},
	platform::ManualPlatform,
	runtime::{App, ContextProvider, ContextRequest, Runtime, Unsubscribe},
};
use core::cell::{Cell, RefCell};
use serde_json::{json, Value};
use std::rc::Rc;

fn start<Model: 'static, Msg: 'static>(app: &App<(), Model, Msg>) -> (Runtime<MemoryDocument, Model, Msg>, MemoryDocument, Rc<ManualPlatform>) {
	harness_::init_tracing();
	let document = MemoryDocument::new();
	let platform = Rc::new(ManualPlatform::new());
	let runtime = Runtime::start(app, (), document.clone(), document.body(), platform.clone());
	(runtime, document, platform)
}

fn html(document: &MemoryDocument) -> String {
	document.inner_html(document.body())
}

fn counter(renders: &Rc<Cell<usize>>) -> App<(), i32, i32> {
	let renders = Rc::clone(renders);
	App::simple(
		|()| 0,
		|count, delta| count + delta,
		move |count: &i32| {
			renders.set(renders.get() + 1);
			button(vec![on_click(1)], vec![text(count.to_string())])
		},
	)
}

#[test]
fn first_render_is_synchronous() {
	let renders = Rc::default();
	let (runtime, document, _) = start(&counter(&renders));
	assert_eq!(html(&document), "<button>0</button>");
	assert_eq!(renders.get(), 1);
	assert_eq!(runtime.handler_count(), 1);
	assert_eq!(runtime.with_model(|count| *count), Some(0));
}

#[test]
fn dispatches_share_one_frame() {
	let renders = Rc::default();
	let (runtime, document, platform) = start(&counter(&renders));
	for _ in 0..3 {
		runtime.dispatch(1);
	}
	assert_eq!(runtime.with_model(|count| *count), Some(3));
	assert_eq!(html(&document), "<button>0</button>");
	assert_eq!(platform.pending_frames(), 1);

	platform.next_frame();
	assert_eq!(html(&document), "<button>3</button>");
	assert_eq!(renders.get(), 2);
}

#[test]
fn model_is_unavailable_during_update() {
	let slot: Rc<RefCell<Option<Runtime<MemoryDocument, i32, i32>>>> = Rc::default();
	let seen: Rc<RefCell<Vec<Option<i32>>>> = Rc::default();
	let app = {
		let (slot, seen) = (Rc::clone(&slot), Rc::clone(&seen));
		App::simple(
			|()| 0,
			move |count: i32, delta: i32| {
				if let Some(runtime) = slot.borrow().as_ref() {
					seen.borrow_mut().push(runtime.with_model(|count| *count));
				}
				count + delta
			},
			|count: &i32| text(count.to_string()),
		)
	};
	let (runtime, _, _) = start(&app);
	*slot.borrow_mut() = Some(runtime.clone());

	runtime.dispatch(1);
	assert_eq!(*seen.borrow(), [None::<i32>]);
	assert_eq!(runtime.with_model(|count| *count), Some(1));
	slot.borrow_mut().take();
}

#[test]
fn immediate_dispatch_renders_synchronously() {
	let renders = Rc::default();
	let (runtime, document, platform) = start(&counter(&renders));
	runtime.dispatch(1);
	runtime.dispatch_immediate(1);
	assert_eq!(html(&document), "<button>2</button>");
	assert_eq!(platform.pending_frames(), 0);
	assert_eq!(renders.get(), 2);
}

#[test]
fn clicks_render_on_the_next_frame() {
	let renders = Rc::default();
	let (runtime, document, platform) = start(&counter(&renders));
	let target = document.query_selector("button").unwrap();
	let outcome = runtime.handle_event(&target, "click", &json!({}));
	assert!(!outcome.prevent_default);
	assert_eq!(html(&document), "<button>0</button>");
	platform.next_frame();
	assert_eq!(html(&document), "<button>1</button>");
}

fn echo() -> App<(), String, String> {
	App::simple(
		|()| String::new(),
		|_, text: String| text,
		|text: &String| div(vec![], vec![input(vec![value(text.clone()), on_input(|text| text)]), p(vec![], vec![cambium::html::text(text.clone())])]),
	)
}

#[test]
fn input_renders_immediately() {
	let (runtime, document, _) = start(&echo());
	let field = document.query_selector("input").unwrap();
	runtime.handle_event(&field, "input", &json!({ "target": { "value": "hi" } }));
	assert_eq!(html(&document), r#"<div><input value="hi"><p>hi</p></div>"#);
	assert_eq!(document.property(field, "value"), Some(json!("hi")));
}

#[test]
fn debounced_input_arrives_later() {
	let app: App<(), String, String> = App::simple(
		|()| String::new(),
		|_, text: String| text,
		|text: &String| div(vec![], vec![input(vec![on_input(|text| text).debounce(100)]), p(vec![], vec![cambium::html::text(text.clone())])]),
	);
	let (runtime, document, platform) = start(&app);
	let field = document.query_selector("input").unwrap();
	for typed in ["h", "hi"] {
		assert_eq!(runtime.handle_event(&field, "input", &json!({ "target": { "value": typed } })).dispatch, None);
	}
	assert_eq!(html(&document), "<div><input><p></p></div>");
	platform.advance(100);
	assert_eq!(html(&document), "<div><input><p>hi</p></div>");
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
	Start,
	Synchronous,
	BeforePaint,
	AfterPaint,
}

#[test]
fn effect_phases() {
	let app = App::new(
		|()| (Vec::<Step>::new(), Effect::none()),
		|mut log: Vec<Step>, step: Step| {
			let effect = match step {
				Step::Start => Effect::batch([
					Effect::after_paint(|actions| actions.dispatch(Step::AfterPaint)),
					Effect::before_paint(|actions| actions.dispatch(Step::BeforePaint)),
					Effect::from_fn(|actions| actions.dispatch(Step::Synchronous)),
				]),
				_ => Effect::none(),
			};
			log.push(step);
			(log, effect)
		},
		|log: &Vec<Step>| text(format!("{}", log.len())),
	);
	let (runtime, document, platform) = start(&app);

	runtime.dispatch_immediate(Step::Start);
	assert_eq!(runtime.with_model(Clone::clone), Some(vec![Step::Start, Step::Synchronous]));
	assert_eq!(html(&document), "2");

	platform.run_microtasks();
	assert_eq!(runtime.with_model(Vec::len), Some(3));
	assert_eq!(html(&document), "3");

	platform.next_frame();
	assert_eq!(runtime.with_model(Clone::clone), Some(vec![Step::Start, Step::Synchronous, Step::BeforePaint, Step::AfterPaint]));
	assert_eq!(html(&document), "4");
}

#[test]
fn messages_are_processed_in_dispatch_order() {
	let app = App::new(
		|()| (Vec::<u32>::new(), Effect::none()),
		|mut seen: Vec<u32>, n: u32| {
			seen.push(n);
			let effect = if n < 3 {
				Effect::from_fn(move |actions| {
					actions.dispatch(n * 10);
					actions.dispatch(n + 1);
				})
			} else {
				Effect::none()
			};
			(seen, effect)
		},
		|seen: &Vec<u32>| text(format!("{:?}", seen)),
	);
	let (runtime, _, _) = start(&app);
	runtime.dispatch(1);
	assert_eq!(runtime.with_model(Clone::clone), Some(vec![1, 10, 2, 20, 3]));
}

#[test]
fn emitted_events_leave_from_the_root() {
	let app = App::new(
		|()| ((), Effect::none()),
		|(), (): ()| ((), emit("saved", json!({ "id": 7 }))),
		|_: &()| text::<()>("idle"),
	);
	let (runtime, document, _) = start(&app);
	runtime.dispatch(());
	assert_eq!(
		document.emitted(),
		vec![EmittedEvent {
			target: document.body(),
			name: "saved".to_owned(),
			detail: json!({ "id": 7 }),
		}]
	);
}

#[test]
fn contexts() {
	let renders = Rc::default();
	let (runtime, _, _) = start(&counter(&renders));

	let received: Rc<RefCell<Vec<Value>>> = Rc::default();
	let handle: Rc<RefCell<Option<Unsubscribe>>> = Rc::default();
	let request = ContextRequest {
		context: "theme".to_owned(),
		callback: {
			let received = Rc::clone(&received);
			let handle = Rc::clone(&handle);
			Rc::new(move |value: &Value, unsubscribe: Option<&Unsubscribe>| {
				received.borrow_mut().push(value.clone());
				*handle.borrow_mut() = unsubscribe.cloned();
			})
		},
		subscribe: true,
	};

	assert!(!runtime.request_context(&request));
	runtime.provide("theme", json!("dark"));
	assert!(runtime.request_context(&request));
	runtime.provide("theme", json!("light"));
	assert_eq!(*received.borrow(), [json!("dark"), json!("light")]);

	let unsubscribe = handle.borrow_mut().take().unwrap();
	unsubscribe.call();
	unsubscribe.call();
	runtime.provide("theme", json!("blue"));
	assert_eq!(received.borrow().len(), 2);
}

#[test]
fn one_shot_context_requests() {
	let app = App::new(|()| ((), Effect::provide("locale", json!("de"))), |(), (): ()| ((), Effect::none()), |_: &()| text::<()>(""));
	let (runtime, _, _) = start(&app);

	let calls = Rc::new(Cell::new(0));
	let request = ContextRequest {
		context: "locale".to_owned(),
		callback: {
			let calls = Rc::clone(&calls);
			Rc::new(move |value: &Value, unsubscribe: Option<&Unsubscribe>| {
				assert_eq!(value, &json!("de"));
				assert!(unsubscribe.is_none());
				calls.set(calls.get() + 1);
			})
		},
		subscribe: false,
	};
	assert!(runtime.request_context(&request));
	runtime.provide("locale", json!("fr"));
	assert_eq!(calls.get(), 1);
}

#[test]
fn start_at() {
	let renders = Rc::default();
	let app = counter(&renders);
	let document = MemoryDocument::new();
	let platform = Rc::new(ManualPlatform::new());

	let missing = Runtime::start_at(&app, (), document.clone(), "#app", platform.clone()).err();
	assert_eq!(missing, Some(Error::ElementNotFound { selector: "#app".to_owned() }));

	let mount = document.create_element("", "main");
	document.set_attribute(&mount, "id", "app");
	document.append(document.body(), mount);
	let runtime = Runtime::start_at(&app, (), document.clone(), "#app", platform).unwrap();
	assert_eq!(runtime.root(), mount);
	assert_eq!(html(&document), r#"<main id="app"><button>0</button></main>"#);
}

#[test]
fn existing_content_is_adopted() {
	let document = MemoryDocument::new();
	let existing = document.create_element("", "button");
	let label = document.create_text("0");
	document.append(existing, label);
	document.append(document.body(), existing);

	let renders = Rc::default();
	let runtime = Runtime::start(&counter(&renders), (), document.clone(), document.body(), Rc::new(ManualPlatform::new()));
	assert_eq!(document.children(document.body()), vec![existing]);
	assert_eq!(document.listeners(existing), vec![("click".to_owned(), true)]);
	runtime.dispatch_immediate(1);
	assert_eq!(document.children(existing), vec![label]);
	assert_eq!(html(&document), "<button>1</button>");
}

#[derive(Debug, Clone, PartialEq)]
enum Parent {
	Child(i32),
}

#[test]
fn mapped_children() {
	let app = App::simple(
		|()| Vec::<Parent>::new(),
		|mut seen: Vec<Parent>, message| {
			seen.push(message);
			seen
		},
		|_: &Vec<Parent>| div(vec![], vec![button(vec![on_click(5)], vec![]).map(Parent::Child)]),
	);
	let (runtime, document, _) = start(&app);
	let target = document.query_selector("button").unwrap();
	runtime.handle_event(&target, "click", &json!({}));
	assert_eq!(runtime.with_model(Clone::clone), Some(vec![Parent::Child(5)]));
}
