use cambium::{
	decode::{self, DecodeError},
	events::{EventError, Events},
	path::Path,
	vattr::{Attribute, EventAttribute},
	vnode::{AnyMessage, Mapper, VNode},
};
use serde_json::json;
use std::rc::Rc;

fn input_handler() -> Attribute {
	Attribute::Event(EventAttribute::new(
		"input",
		Rc::new(|event: &serde_json::Value| decode::string(event, &["target", "value"]).map(|value| Box::new(value) as AnyMessage)),
	))
}

fn form() -> VNode {
	VNode::element("", "form", vec![], vec![VNode::element("", "input", vec![input_handler()], vec![]).with_key("name")])
}

#[test]
fn registers_subtree() {
	let mut events = Events::new();
	events.add_child(None, &Path::ROOT, 0, &form());
	assert_eq!(events.len(), 1);
	assert!(events.has_handler(&Path::ROOT.add(0, "").add(0, "name"), "input"));
}

#[test]
fn handle_decodes() {
	let mut events = Events::new();
	events.add_child(None, &Path::ROOT, 0, &form());
	let message = events.handle("0\tname", "input", &json!({ "target": { "value": "Ada" } })).unwrap();
	assert_eq!(*message.downcast::<String>().unwrap(), "Ada");
}

#[test]
fn handle_reports_failures() {
	let mut events = Events::new();
	events.add_child(None, &Path::ROOT, 0, &form());
	assert!(matches!(events.handle("0", "input", &json!({})), Err(EventError::Unhandled { .. })));
	assert!(matches!(
		events.handle("0\tname", "input", &json!({})),
		Err(EventError::Decode(DecodeError::Missing { .. }))
	));
}

#[test]
fn mappers_compose_outside_in() {
	let wrap: Mapper = Rc::new(|message: AnyMessage| match message.downcast::<String>() {
		Ok(value) => Box::new(format!("[{}]", value)) as AnyMessage,
		Err(message) => message,
	});
	let shout: Mapper = Rc::new(|message: AnyMessage| match message.downcast::<String>() {
		Ok(value) => Box::new(value.to_uppercase()) as AnyMessage,
		Err(message) => message,
	});
	let vnode = form().map_with(shout).map_with(wrap);

	let mut events = Events::new();
	events.add_child(None, &Path::ROOT, 0, &vnode);
	let message = events.handle("0\tname", "input", &json!({ "target": { "value": "ada" } })).unwrap();
	assert_eq!(*message.downcast::<String>().unwrap(), "[ADA]");
}

#[test]
fn dispatched_paths_advance_on_tick() {
	let mut events = Events::new();
	events.add_child(None, &Path::ROOT, 0, &form());
	let input = Path::ROOT.add(0, "").add(0, "name");

	let _ = events.handle("0\tname", "input", &json!({ "target": { "value": "" } }));
	assert!(!events.has_dispatched_events(&input));

	events.tick();
	assert!(events.has_dispatched_events(&input));

	events.tick();
	assert!(!events.has_dispatched_events(&input));
}

#[test]
fn unhandled_events_still_count_as_dispatched() {
	let mut events = Events::new();
	let _ = events.handle("3", "click", &json!({}));
	events.tick();
	assert!(events.has_dispatched_events(&Path::ROOT.add(3, "").add(0, "")));
}

#[test]
fn remove_child_tears_down_subtree() {
	let mut events = Events::new();
	let vnode = form();
	events.add_child(None, &Path::ROOT, 0, &vnode);
	events.remove_child(&Path::ROOT, 0, &vnode);
	assert!(events.is_empty());
}
