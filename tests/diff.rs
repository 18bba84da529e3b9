use cambium::{
	diff::diff,
	events::Events,
	path::Path,
	patch::{Change, Patch},
	vattr::{Attribute, EventAttribute},
	vnode::{AnyMessage, VNode},
};
use serde_json::json;
use std::rc::Rc;

fn on(name: &str) -> Attribute {
	Attribute::Event(EventAttribute::new(name, Rc::new(|_: &serde_json::Value| Ok(Box::new(()) as AnyMessage))))
}

fn li(key: &str) -> VNode {
	VNode::element("", "li", vec![on("click")], vec![VNode::text(key)]).with_key(key)
}

fn ul(keys: &[&str]) -> VNode {
	VNode::element("", "ul", vec![], keys.iter().map(|key| li(key)).collect())
}

fn registered(vnode: &VNode) -> Events {
	let mut events = Events::new();
	events.add_child(None, &Path::ROOT, 0, vnode);
	events
}

fn count(patch: &Patch<'_>) -> (usize, usize, usize, usize) {
	(
		patch.count_changes(|change| matches!(change, Change::Move { .. })),
		patch.count_changes(|change| matches!(change, Change::Insert { .. })),
		patch.count_changes(|change| matches!(change, Change::Remove { .. })),
		patch.count_changes(|change| matches!(change, Change::Replace { .. })),
	)
}

#[test]
fn identical_trees_produce_nothing() {
	let old = ul(&["a", "b", "c"]);
	let new = ul(&["a", "b", "c"]);
	let mut events = registered(&old);
	let patch = diff(&mut events, &old, &new);
	assert!(patch.is_empty(), "{:?}", patch);
	assert_eq!(events.len(), 3);
}

#[test]
fn text_is_replaced_in_place() {
	let old = VNode::element("", "p", vec![], vec![VNode::text("before")]);
	let new = VNode::element("", "p", vec![], vec![VNode::text("after")]);
	let mut events = Events::new();
	let patch = diff(&mut events, &old, &new);
	assert_eq!(patch.count_changes(|change| matches!(change, Change::ReplaceText { content: "after" })), 1);
	assert_eq!(count(&patch), (0, 0, 0, 0));
}

#[test]
fn rotation_is_a_single_move() {
	let old = ul(&["a", "b", "c"]);
	let new = ul(&["c", "a", "b"]);
	let mut events = registered(&old);
	let patch = diff(&mut events, &old, &new);
	assert_eq!(count(&patch), (1, 0, 0, 0));

	let ul_patch = &patch.children[0];
	assert!(matches!(ul_patch.changes[..], [Change::Move { key: "c", before: 0 }]));
	assert_eq!(ul_patch.removed, 0);
}

#[test]
fn reversal_only_moves() {
	let old = ul(&["a", "b", "c", "d"]);
	let new = ul(&["d", "c", "b", "a"]);
	let mut events = registered(&old);
	let patch = diff(&mut events, &old, &new);
	assert_eq!(count(&patch), (3, 0, 0, 0));
	for key in ["a", "b", "c", "d"] {
		assert!(events.has_handler(&Path::ROOT.add(0, "").add(0, key), "click"));
	}
	assert_eq!(events.len(), 4);
}

#[test]
fn trailing_nodes_are_removed_in_bulk() {
	let old = ul(&["a", "b", "c"]);
	let new = ul(&["a"]);
	let mut events = registered(&old);
	let patch = diff(&mut events, &old, &new);
	assert_eq!(patch.children[0].removed, 2);
	assert_eq!(count(&patch), (0, 0, 0, 0));
	assert_eq!(events.len(), 1);
}

#[test]
fn new_nodes_are_inserted() {
	let old = ul(&["b"]);
	let new = ul(&["a", "b", "c"]);
	let mut events = registered(&old);
	let patch = diff(&mut events, &old, &new);
	let changes = &patch.children[0].changes;
	assert!(matches!(changes[0], Change::Insert { before: 0, ref children } if children.len() == 1));
	assert!(matches!(changes[1], Change::Insert { before: 2, ref children } if children.len() == 1));
	assert_eq!(events.len(), 3);
}

#[test]
fn dropped_keys_are_removed_at_the_current_position() {
	let old = ul(&["a", "b", "c"]);
	let new = ul(&["a", "c"]);
	let mut events = registered(&old);
	let patch = diff(&mut events, &old, &new);
	assert!(matches!(patch.children[0].changes[..], [Change::Remove { index: 1 }]));
	assert!(!events.has_handler(&Path::ROOT.add(0, "").add(1, "b"), "click"));
	assert_eq!(events.len(), 2);
}

#[test]
fn different_tags_are_replaced() {
	let old = VNode::element("", "div", vec![on("click")], vec![]);
	let new = VNode::element("", "span", vec![on("click")], vec![]);
	let mut events = registered(&old);
	let patch = diff(&mut events, &old, &new);
	assert!(matches!(patch.changes[..], [Change::Replace { index: 0, .. }]));
	assert!(events.has_handler(&Path::ROOT.add(0, ""), "click"));
	assert_eq!(events.len(), 1);
}

#[test]
fn unkeyed_shift_moves_handlers_to_new_paths() {
	let button = VNode::element("", "button", vec![on("click")], vec![]);
	let old = VNode::fragment(vec![button.clone()]);
	let new = VNode::fragment(vec![VNode::element("", "h1", vec![], vec![]), button]);
	let mut events = registered(&old);
	let _ = diff(&mut events, &old, &new);
	assert!(events.has_handler(&Path::ROOT.add(0, "").add(1, ""), "click"));
	assert!(!events.has_handler(&Path::ROOT.add(0, "").add(0, ""), "click"));
	assert_eq!(events.len(), 1);
}

#[test]
fn attributes_are_merged() {
	let old = VNode::element("", "a", vec![Attribute::attribute("href", "/old"), Attribute::attribute("title", "same")], vec![]);
	let new = VNode::element("", "a", vec![Attribute::attribute("href", "/new"), Attribute::attribute("rel", "next"), Attribute::attribute("title", "same")], vec![]);
	let mut events = Events::new();
	let patch = diff(&mut events, &old, &new);
	match &patch.children[0].changes[..] {
		[Change::UpdateAttributes { added, removed }] => {
			assert_eq!(added.iter().map(|attribute| attribute.name()).collect::<Vec<_>>(), ["href", "rel"]);
			assert!(removed.is_empty());
		}
		other => panic!("unexpected {:?}", other),
	}
}

fn text_input(value: &str) -> VNode {
	VNode::element("", "input", vec![Attribute::attribute("value", value), on("input")], vec![])
}

fn resyncs_value(patch: &Patch<'_>) -> bool {
	patch.count_changes(|change| matches!(change, Change::UpdateAttributes { added, .. } if added.iter().any(|attribute| attribute.name() == "value"))) > 0
}

#[test]
fn controlled_inputs_are_resynced() {
	let old = text_input("typed");
	let new = text_input("typed");
	let mut events = registered(&old);
	assert!(!resyncs_value(&diff(&mut events, &old, &new)));

	let _ = events.handle("0", "input", &json!({ "target": { "value": "typed!" } }));
	assert!(resyncs_value(&diff(&mut events, &old, &new)));

	// Only the render right after the event.
	assert!(!resyncs_value(&diff(&mut events, &old, &new)));
}
