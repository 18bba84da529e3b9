//! Stable addresses of nodes within a rendered tree.

use core::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// Separates path segments in the string form.
pub const SEPARATOR_ELEMENT: char = '\t';
/// Separates a path from an event name in [`Path::event_key`].
pub const SEPARATOR_EVENT: char = '\n';

/// A cons chain from the root.
///
/// Keyed nodes are addressed by their key, all others by their index among their siblings,
/// so that a keyed node keeps its path when it moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(Option<Rc<Segment>>);

#[derive(Debug, PartialEq, Eq)]
enum Segment {
	Key(String, Path),
	Index(usize, Path),
}

impl Path {
	pub const ROOT: Self = Self(None);

	/// The path of the child at `index` with `key` (which may be empty).
	#[must_use]
	pub fn add(&self, index: usize, key: &str) -> Self {
		if key.is_empty() {
			Self(Some(Rc::new(Segment::Index(index, self.clone()))))
		} else {
			Self(Some(Rc::new(Segment::Key(key.to_owned(), self.clone()))))
		}
	}

	#[must_use]
	pub fn is_root(&self) -> bool {
		self.0.is_none()
	}

	#[must_use]
	pub fn parent(&self) -> Option<&Self> {
		self.0.as_deref().map(|segment| match segment {
			Segment::Key(_, parent) | Segment::Index(_, parent) => parent,
		})
	}

	/// The registry key for the `name` event handler at this path.
	#[must_use]
	pub fn event_key(&self, name: &str) -> String {
		event_key(&self.to_string(), name)
	}

	/// Whether this path equals or descends from any of `candidates` (which are in string form).
	#[must_use]
	pub fn matches<'a>(&self, candidates: impl IntoIterator<Item = &'a String>) -> bool {
		let mut candidates = candidates.into_iter().peekable();
		if candidates.peek().is_none() {
			return false;
		}
		let path = self.to_string();
		candidates.any(|candidate| is_prefix(candidate, &path))
	}

	fn segments(&self) -> Vec<&Segment> {
		let mut segments = Vec::new();
		let mut current = self;
		while let Some(segment) = current.0.as_deref() {
			segments.push(segment);
			current = match segment {
				Segment::Key(_, parent) | Segment::Index(_, parent) => parent,
			};
		}
		segments.reverse();
		segments
	}
}

/// The root renders as the empty string, which makes root event keys just the event name.
impl Display for Path {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		for (i, segment) in self.segments().into_iter().enumerate() {
			if i > 0 {
				write!(f, "{}", SEPARATOR_ELEMENT)?;
			}
			match segment {
				Segment::Key(key, _) => f.write_str(key)?,
				Segment::Index(index, _) => write!(f, "{}", index)?,
			}
		}
		Ok(())
	}
}

/// Joins a path in string form with an event name.
#[must_use]
pub fn event_key(path: &str, name: &str) -> String {
	if path.is_empty() {
		name.to_owned()
	} else {
		format!("{}{}{}", path, SEPARATOR_EVENT, name)
	}
}

/// Segment-aware: `"1"` is a prefix of `"1\t0"`, but not of `"10"`.
fn is_prefix(candidate: &str, path: &str) -> bool {
	candidate.is_empty()
		|| path
			.strip_prefix(candidate)
			.map_or(false, |rest| rest.is_empty() || rest.starts_with(SEPARATOR_ELEMENT))
}
