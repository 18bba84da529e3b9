use cambium::{
	attribute::{boolean_attribute, class, classes, Attr},
	decode::{self, DecodeError},
	element::{keyed, text},
	event::{is_immediate_event, on_click, on_input, on_keydown, on_submit},
	events::Events,
	html,
	path::Path,
	vattr::{Attribute, EventAttribute},
};
use serde_json::json;

fn event<Msg>(attr: &Attr<Msg>) -> &EventAttribute {
	match attr.as_attribute() {
		Attribute::Event(event) => event,
		other => panic!("not an event: {:?}", other),
	}
}

#[test]
fn decode_walks_paths() {
	let raw = json!({ "target": { "value": "x", "checked": true }, "count": 3 });
	assert_eq!(decode::string(&raw, &["target", "value"]), Ok("x".to_owned()));
	assert_eq!(decode::bool(&raw, &["target", "checked"]), Ok(true));
	assert_eq!(decode::field::<u32>(&raw, &["count"]), Ok(3));
	assert_eq!(
		decode::string(&raw, &["target", "name"]),
		Err(DecodeError::Missing { path: "target.name".to_owned() })
	);
	assert!(matches!(decode::string(&raw, &["count"]), Err(DecodeError::Mismatch { ref path, .. }) if path == "count"));
}

#[test]
fn form_data_pairs() {
	let raw = json!({ "detail": { "formData": [["name", "Ada"], ["role", "admin"]] } });
	assert_eq!(
		decode::form_data(&raw),
		Ok(vec![("name".to_owned(), "Ada".to_owned()), ("role".to_owned(), "admin".to_owned())])
	);
	assert!(decode::form_data(&json!({ "detail": {} })).is_err());
}

#[test]
fn handler_defaults() {
	assert!(is_immediate_event("input"));
	assert!(is_immediate_event("focusout"));
	assert!(!is_immediate_event("click"));

	let input = on_input(|value: String| value);
	assert!(event(&input).immediate);
	assert!(!event(&input).prevent_default);

	let submit = on_submit(|entries: Vec<(String, String)>| entries.len());
	assert_eq!(event(&submit).name, "submit");
	assert!(event(&submit).prevent_default);
	assert!(!event(&submit).immediate);

	let keydown = on_keydown(|key: String| key);
	assert_eq!(event(&keydown).include, ["key"]);
}

#[test]
fn modifiers() {
	let click = on_click(()).debounce(200).throttle(50).stop_propagation().immediate(true);
	let click = event(&click);
	assert_eq!((click.debounce, click.throttle), (200, 50));
	assert!(click.stop_propagation && click.immediate);

	// No effect on plain attributes.
	let plain: Attr<()> = class("x").debounce(10).prevent_default();
	assert!(matches!(plain.as_attribute(), Attribute::Attribute { name, value } if name == "class" && value == "x"));
}

#[test]
fn boolean_attributes() {
	let on: Attr<()> = boolean_attribute("disabled", true);
	assert!(matches!(on.as_attribute(), Attribute::Attribute { value, .. } if value.is_empty()));
	let off: Attr<()> = boolean_attribute("disabled", false);
	assert!(matches!(off.as_attribute(), Attribute::Property { value, .. } if *value == json!(false)));
}

#[test]
fn classes_keep_active_names() {
	let attr: Attr<()> = classes([("todo", true), ("done", false), ("editing", true)]);
	assert!(matches!(attr.as_attribute(), Attribute::Attribute { value, .. } if value == "todo editing"));
}

#[test]
fn mapped_elements_produce_outer_messages() {
	#[derive(Debug, PartialEq)]
	enum Outer {
		Row(u32),
	}

	let row = html::button(vec![on_click(7_u32)], vec![text("+")]).map(Outer::Row);
	let mut events = Events::new();
	events.add_child(None, &Path::ROOT, 0, row.as_vnode());
	let message = events.handle("0", "click", &json!({})).unwrap();
	assert_eq!(*message.downcast::<Outer>().unwrap(), Outer::Row(7));
}

#[test]
fn mapped_attributes_produce_outer_messages() {
	let attr = on_input(|value: String| value.len()).map(|length: usize| length * 2);
	let message = (event(&attr).handler)(&json!({ "target": { "value": "abc" } })).unwrap();
	assert_eq!(*message.downcast::<usize>().unwrap(), 6);
}

#[test]
fn keyed_lists() {
	let list = keyed::ul::<()>(vec![], vec![("a".to_owned(), html::li(vec![], vec![])), ("b".to_owned(), html::li(vec![], vec![]))]);
	let keys: Vec<&str> = list.as_vnode().children().iter().map(cambium::vnode::VNode::key).collect();
	assert_eq!(keys, ["a", "b"]);
}
