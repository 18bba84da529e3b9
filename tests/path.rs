use cambium::path::{event_key, Path};

#[test]
fn root() {
	assert!(Path::ROOT.is_root());
	assert_eq!(Path::ROOT.to_string(), "");
	assert_eq!(Path::ROOT.event_key("click"), "click");
	assert!(Path::ROOT.parent().is_none());
}

#[test]
fn keys_replace_indices() {
	let path = Path::ROOT.add(0, "").add(3, "item-7").add(1, "");
	assert_eq!(path.to_string(), "0\titem-7\t1");
	assert_eq!(path.event_key("input"), "0\titem-7\t1\ninput");
	assert_eq!(path.parent().map(ToString::to_string).as_deref(), Some("0\titem-7"));
}

#[test]
fn keyed_paths_survive_moves() {
	assert_eq!(Path::ROOT.add(0, "a"), Path::ROOT.add(5, "a"));
	assert_ne!(Path::ROOT.add(0, ""), Path::ROOT.add(1, ""));
}

#[test]
fn free_event_key() {
	assert_eq!(event_key("", "submit"), "submit");
	assert_eq!(event_key("2\t0", "submit"), "2\t0\nsubmit");
}

#[test]
fn matches_respects_separators() {
	let path = Path::ROOT.add(1, "").add(0, "");
	assert!(path.matches(&["1".to_owned()]));
	assert!(path.matches(&["1\t0".to_owned()]));
	assert!(!path.matches(&["1\t00".to_owned()]));
	assert!(!Path::ROOT.add(10, "").matches(&["1".to_owned()]));
	assert!(path.matches(&["5".to_owned(), "".to_owned()]));
	assert!(!path.matches(&Vec::<String>::new()));
}
