
use cambium::{
	component::{Component, Config, Registry},
	decode::{self, DecodeError},
	effect::Effect,
	error::Error,
	html::text,
	memory::MemoryDocument,
	platform::ManualPlatform,
	runtime::{App, ContextProvider, Runtime},
};
use serde_json::json;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
enum Msg {
	Label(String),
	Theme(String),
}

fn badge() -> App<(), Vec<Msg>, Msg> {
	App::new(
		|()| (Vec::new(), Effect::none()),
		|mut seen: Vec<Msg>, message| {
			seen.push(message);
			(seen, Effect::none())
		},
		|seen: &Vec<Msg>| text(format!("{}", seen.len())),
	)
}

fn config() -> Config<Msg> {
	Config::new()
		.on_attribute_change("label", |value| Ok(Msg::Label(value.to_owned())))
		.on_attribute_change("count", |value| value.parse::<i32>().map(|_| Msg::Label(value.to_owned())).map_err(|error| DecodeError::Custom(error.to_string())))
		.on_context_change("theme", |value| decode::field(value, &[]).map(Msg::Theme))
}

fn provider() -> Runtime<MemoryDocument, (), ()> {
	let document = MemoryDocument::new();
	let app = App::new(|()| ((), Effect::none()), |(), (): ()| ((), Effect::none()), |_: &()| text::<()>(""));
	Runtime::start(&app, (), document.clone(), document.body(), Rc::new(ManualPlatform::new()))
}

fn component() -> (Component<MemoryDocument, Vec<Msg>, Msg>, MemoryDocument) {
	harness_::init_tracing();
	let document = MemoryDocument::new();
	let runtime = Runtime::start(&badge(), (), document.clone(), document.body(), Rc::new(ManualPlatform::new()));
	(Component::new(runtime, config()), document)
}

fn seen(component: &Component<MemoryDocument, Vec<Msg>, Msg>) -> Vec<Msg> {
	component.runtime().with_model(Clone::clone).unwrap_or_default()
}

#[test]
fn registry() {
	let mut registry = Registry::<MemoryDocument>::new();
	assert_eq!(registry.define("badge", badge(), config()), Err(Error::BadComponentName("badge".to_owned())));
	assert_eq!(registry.define("x-badge", badge(), config()), Ok(()));
	assert!(registry.is_defined("x-badge"));
	assert_eq!(
		registry.define("x-badge", badge(), config()),
		Err(Error::ComponentAlreadyRegistered("x-badge".to_owned()))
	);

	let document = MemoryDocument::new();
	let missing = registry.create("x-missing", document.clone(), document.body(), Rc::new(ManualPlatform::new())).err();
	assert_eq!(missing, Some(Error::ComponentNotRegistered("x-missing".to_owned())));

	let instance = registry.create("x-badge", document.clone(), document.body(), Rc::new(ManualPlatform::new())).unwrap();
	assert_eq!(instance.observed_attributes(), ["label", "count"]);
	assert_eq!(document.inner_html(document.body()), "0");
}

#[test]
fn observed_attributes_are_dispatched() {
	let (component, _) = component();
	component.attribute_changed("label", "new");
	component.attribute_changed("ignored", "x");
	component.attribute_changed("count", "not a number");
	component.attribute_changed("count", "3");
	assert_eq!(seen(&component), [Msg::Label("new".to_owned()), Msg::Label("3".to_owned())]);
}

#[test]
fn context_subscription() {
	let (component, _) = component();
	let outer = provider();
	let inner = provider();
	outer.provide("theme", json!("dark"));

	let providers: [&dyn ContextProvider; 2] = [&inner, &outer];
	component.connected(&providers);
	assert_eq!(seen(&component), [Msg::Theme("dark".to_owned())]);

	outer.provide("theme", json!("light"));
	outer.provide("theme", json!(42));
	assert_eq!(seen(&component), [Msg::Theme("dark".to_owned()), Msg::Theme("light".to_owned())]);

	component.disconnected();
	outer.provide("theme", json!("blue"));
	assert_eq!(seen(&component).len(), 2);
}

#[test]
fn nearest_provider_wins() {
	let (component, _) = component();
	let outer = provider();
	let inner = provider();
	outer.provide("theme", json!("outer"));
	inner.provide("theme", json!("inner"));

	component.connected(&[&inner as &dyn ContextProvider, &outer]);
	outer.provide("theme", json!("ignored"));
	inner.provide("theme", json!("updated"));
	assert_eq!(seen(&component), [Msg::Theme("inner".to_owned()), Msg::Theme("updated".to_owned())]);
}
