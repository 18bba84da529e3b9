//! Computes [`Patch`]es between two [`VNode`] trees and keeps the [`Events`] registry in step.
//!
//! Changes are emitted so that they can be applied strictly in order:
//! While walking a sibling list, the live list is always `new[..n]` followed by the old nodes that weren't consumed or moved yet,
//! so every index in a [`Change`] is simply the current position `n` in the new list.

use crate::{
	events::Events,
	path::Path,
	patch::{Change, Patch},
	vattr::Attribute,
	vnode::{compose, KeyedChildren, Mapper, VNode},
};
use core::{cmp::Ordering, slice};
use hashbrown::HashSet;
use tracing::{instrument, trace, trace_span};

/// Diffs `old` against `new`, both rooted at the patched node's first child slot.
///
/// The returned [`Patch`] is addressed to the node that will contain `new` (index `0`).
/// `events` is ticked first, so controlled element detection reflects the last committed render,
/// and is left with exactly the handlers declared in `new`.
#[instrument(skip_all)]
pub fn diff<'a>(events: &mut Events, old: &'a VNode, new: &'a VNode) -> Patch<'a> {
	events.begin_diff();
	let mut patch = Patch::new(0);
	let unkeyed = KeyedChildren::new();
	diff_children(
		events,
		Siblings {
			nodes: slice::from_ref(old),
			keyed: &unkeyed,
			path: &Path::ROOT,
		},
		Siblings {
			nodes: slice::from_ref(new),
			keyed: &unkeyed,
			path: &Path::ROOT,
		},
		None,
		&mut patch,
	);
	events.finish_diff();
	patch
}

/// One side of a sibling list comparison.
#[derive(Clone, Copy)]
struct Siblings<'a, 'b> {
	nodes: &'a [VNode],
	keyed: &'b KeyedChildren,
	/// Path of the parent.
	path: &'b Path,
}

#[allow(clippy::too_many_lines)]
fn diff_children<'a>(events: &mut Events, old: Siblings<'a, '_>, new: Siblings<'a, '_>, mapper: Option<&Mapper>, patch: &mut Patch<'a>) {
	let mut moved = HashSet::<&'a str>::new();
	let mut o = 0;
	let mut n = 0;

	loop {
		// Nodes that were moved forward already sit at their new position.
		while let Some(prev) = old.nodes.get(o) {
			if prev.key().is_empty() || !moved.contains(prev.key()) {
				break;
			}
			o += 1;
		}

		match (old.nodes.get(o), new.nodes.get(n)) {
			(None, None) => break,

			(Some(_), None) => {
				for (i, prev) in old.nodes.iter().enumerate().skip(o) {
					if prev.key().is_empty() || !moved.contains(prev.key()) {
						patch.removed += 1;
						events.remove_child(old.path, i, prev);
					}
				}
				trace!(removed = patch.removed, "Trailing removal.");
				break;
			}

			(None, Some(_)) => {
				let rest = &new.nodes[n..];
				trace!(count = rest.len(), before = n, "Inserting remaining nodes.");
				events.add_children(mapper, new.path, n, rest);
				patch.changes.push(Change::Insert { children: rest, before: n });
				break;
			}

			(Some(prev), Some(next)) if prev.key() == next.key() => {
				diff_node(events, (old.path, o, prev), (new.path, n, next), mapper, patch);
				o += 1;
				n += 1;
			}

			(Some(prev), Some(next)) => {
				let next_did_exist = old.keyed.get(next.key()).and_then(|&i| old.nodes.get(i).map(|matched| (i, matched)));
				let prev_does_exist = new.keyed.contains_key(prev.key());

				match (next_did_exist, prev_does_exist) {
					(Some((i, matched)), true) => {
						let span = trace_span!("Move", before = n);
						let _enter = span.enter();
						patch.changes.push(Change::Move { key: next.key(), before: n });
						moved.insert(next.key());
						diff_node(events, (old.path, i, matched), (new.path, n, next), mapper, patch);
						n += 1;
					}
					(Some(_), false) => {
						trace!(index = n, "Removing node that has no counterpart.");
						patch.changes.push(Change::Remove { index: n });
						events.remove_child(old.path, o, prev);
						o += 1;
					}
					(None, true) => {
						trace!(before = n, "Inserting new node.");
						events.add_child(mapper, new.path, n, next);
						patch.changes.push(Change::Insert {
							children: slice::from_ref(next),
							before: n,
						});
						n += 1;
					}
					(None, false) => {
						trace!(index = n, "Replacing unrelated node.");
						events.remove_child(old.path, o, prev);
						events.add_child(mapper, new.path, n, next);
						patch.changes.push(Change::Replace { index: n, with: next });
						o += 1;
						n += 1;
					}
				}
			}
		}
	}
}

/// Diffs two nodes with equal keys. `prev` sits at `old_index` in the old list, `next` at `new_index` in the new one.
fn diff_node<'a>(events: &mut Events, (old_parent, old_index, prev): (&Path, usize, &'a VNode), (new_parent, new_index, next): (&Path, usize, &'a VNode), mapper: Option<&Mapper>, patch: &mut Patch<'a>) {
	let old_path = old_parent.add(old_index, prev.key());
	let new_path = new_parent.add(new_index, next.key());
	let relocated = old_path != new_path;

	let mut child = Patch::new(new_index);
	match (prev, next) {
		(VNode::Text { content: c_1, .. }, VNode::Text { content: c_2, .. }) => {
			if c_1 != c_2 {
				child.changes.push(Change::ReplaceText { content: c_2 });
			}
		}

		(
			VNode::Fragment {
				children: children_1,
				keyed_children: keyed_1,
				..
			},
			VNode::Fragment {
				children: children_2,
				keyed_children: keyed_2,
				..
			},
		) => {
			let span = trace_span!("Diffing fragment", relocated);
			let _enter = span.enter();
			if relocated {
				events.remove_child(old_parent, old_index, prev);
			}
			let mapper = compose(mapper.cloned(), next.mapper().cloned());
			diff_children(
				events,
				Siblings {
					nodes: children_1,
					keyed: keyed_1,
					path: &old_path,
				},
				Siblings {
					nodes: children_2,
					keyed: keyed_2,
					path: &new_path,
				},
				mapper.as_ref(),
				&mut child,
			);
		}

		(
			VNode::Element {
				namespace: ns_1,
				tag: tag_1,
				attributes: attributes_1,
				children: children_1,
				keyed_children: keyed_1,
				..
			},
			VNode::Element {
				namespace: ns_2,
				tag: tag_2,
				attributes: attributes_2,
				children: children_2,
				keyed_children: keyed_2,
				..
			},
		) if ns_1 == ns_2 && tag_1 == tag_2 => {
			let span = trace_span!("Diffing element", tag = %tag_2, relocated);
			let _enter = span.enter();
			if relocated {
				events.remove_child(old_parent, old_index, prev);
			}
			let mapper = compose(mapper.cloned(), next.mapper().cloned());
			let controlled = is_controlled(events, ns_2, tag_2, &new_path);
			diff_attributes(events, controlled, (&old_path, &new_path), mapper.as_ref(), attributes_1, attributes_2, &mut child);
			diff_children(
				events,
				Siblings {
					nodes: children_1,
					keyed: keyed_1,
					path: &old_path,
				},
				Siblings {
					nodes: children_2,
					keyed: keyed_2,
					path: &new_path,
				},
				mapper.as_ref(),
				&mut child,
			);
		}

		(
			VNode::UnsafeInnerHtml {
				namespace: ns_1,
				tag: tag_1,
				attributes: attributes_1,
				inner_html: html_1,
				..
			},
			VNode::UnsafeInnerHtml {
				namespace: ns_2,
				tag: tag_2,
				attributes: attributes_2,
				inner_html: html_2,
				..
			},
		) if ns_1 == ns_2 && tag_1 == tag_2 => {
			let span = trace_span!("Diffing unsafe inner HTML", tag = %tag_2, relocated);
			let _enter = span.enter();
			if relocated {
				events.remove_child(old_parent, old_index, prev);
			}
			let mapper = compose(mapper.cloned(), next.mapper().cloned());
			diff_attributes(events, false, (&old_path, &new_path), mapper.as_ref(), attributes_1, attributes_2, &mut child);
			if html_1 != html_2 {
				child.changes.push(Change::ReplaceInnerHtml { inner_html: html_2 });
			}
		}

		// Different kinds, tags or namespaces.
		_ => {
			trace!(index = new_index, old = ?prev.kind(), new = ?next.kind(), "Replacing mismatching node.");
			events.remove_child(old_parent, old_index, prev);
			events.add_child(mapper, new_parent, new_index, next);
			patch.changes.push(Change::Replace { index: new_index, with: next });
			return;
		}
	}

	if !child.is_empty() {
		patch.children.push(child);
	}
}

/// Input-like HTML elements that dispatched during the previous render have their value re-applied every time.
fn is_controlled(events: &Events, namespace: &str, tag: &str, path: &Path) -> bool {
	namespace.is_empty() && matches!(tag, "input" | "select" | "textarea") && events.has_dispatched_events(path)
}

fn is_synced(name: &str) -> bool {
	matches!(name, "value" | "checked" | "selected")
}

/// Linear merge of two name-sorted attribute lists.
///
/// Handlers present on both sides are always re-registered, but only show up as `added` if their options changed.
fn diff_attributes<'a>(events: &mut Events, controlled: bool, (old_path, new_path): (&Path, &Path), mapper: Option<&Mapper>, old: &'a [Attribute], new: &'a [Attribute], patch: &mut Patch<'a>) {
	let mut added = Vec::new();
	let mut removed = Vec::new();

	let mut remove = |events: &mut Events, prev: &'a Attribute| {
		if let Attribute::Event(event) = prev {
			events.remove_event(old_path, &event.name);
		}
		removed.push(prev);
	};
	let mut add = |events: &mut Events, next: &'a Attribute, changed: bool| {
		if let Attribute::Event(event) = next {
			events.add_event(mapper, new_path, &event.name, &event.handler);
		}
		if changed {
			added.push(next);
		}
	};

	let (mut i, mut j) = (0, 0);
	loop {
		match (old.get(i), new.get(j)) {
			(None, None) => break,
			(Some(prev), None) => {
				remove(events, prev);
				i += 1;
			}
			(None, Some(next)) => {
				add(events, next, true);
				j += 1;
			}
			(Some(prev), Some(next)) => match prev.compare(next) {
				Ordering::Less => {
					remove(events, prev);
					i += 1;
				}
				Ordering::Greater => {
					add(events, next, true);
					j += 1;
				}
				Ordering::Equal => {
					match (prev, next) {
						(Attribute::Attribute { value: v_1, .. }, Attribute::Attribute { name, value: v_2 }) => {
							add(events, next, (controlled && is_synced(name)) || v_1 != v_2);
						}
						(Attribute::Property { value: v_1, .. }, Attribute::Property { name, value: v_2 }) => {
							add(events, next, (controlled && is_synced(name)) || v_1 != v_2);
						}
						(Attribute::Event(e_1), Attribute::Event(e_2)) => {
							add(events, next, !e_1.same_options(e_2));
						}
						_ => {
							remove(events, prev);
							add(events, next, true);
						}
					}
					i += 1;
					j += 1;
				}
			},
		}
	}

	if !added.is_empty() || !removed.is_empty() {
		patch.changes.push(Change::UpdateAttributes { added, removed });
	}
}
