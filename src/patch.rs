//! The output of [`diff`](`crate::diff::diff`).

use crate::{vattr::Attribute, vnode::VNode};

/// Changes for one node, plus patches for its descendants.
///
/// Patches borrow from the trees they were computed from and are applied exactly once.
#[derive(Debug, Default)]
pub struct Patch<'a> {
	/// Position of the patched node among its parent's children *after* the parent's changes are applied.
	pub index: usize,
	/// How many trailing children to remove once all [`changes`](`Patch::changes`) have been applied.
	pub removed: usize,
	pub changes: Vec<Change<'a>>,
	pub children: Vec<Patch<'a>>,
}

/// A single mutation.
///
/// Indices refer to the patched node's live child list in the state left by all preceding changes of the same [`Patch`].
#[derive(Debug)]
pub enum Change<'a> {
	ReplaceText { content: &'a str },
	ReplaceInnerHtml { inner_html: &'a str },
	UpdateAttributes { added: Vec<&'a Attribute>, removed: Vec<&'a Attribute> },
	/// Moves the child with `key` to just before the child currently at `before`.
	Move { key: &'a str, before: usize },
	Remove { index: usize },
	Replace { index: usize, with: &'a VNode },
	Insert { children: &'a [VNode], before: usize },
}

impl<'a> Patch<'a> {
	#[must_use]
	pub fn new(index: usize) -> Self {
		Self {
			index,
			..Self::default()
		}
	}

	/// Whether applying this patch would do nothing at all.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.removed == 0 && self.changes.is_empty() && self.children.is_empty()
	}

	/// Counts changes in this patch and all descendant patches, filtered by `predicate`.
	#[must_use]
	pub fn count_changes(&self, predicate: impl Copy + Fn(&Change<'a>) -> bool) -> usize {
		self.changes.iter().filter(|change| predicate(change)).count() + self.children.iter().map(|child| child.count_changes(predicate)).sum::<usize>()
	}
}
