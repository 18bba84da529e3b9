use thiserror::Error;

/// Start-up and registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error("no element matches `{selector}`")]
	ElementNotFound { selector: String },
	#[error("not running in a browser")]
	NotABrowser,
	#[error("component name `{0}` doesn't contain a hyphen")]
	BadComponentName(String),
	#[error("a component named `{0}` is already registered")]
	ComponentAlreadyRegistered(String),
	#[error("no component named `{0}` is registered")]
	ComponentNotRegistered(String),
}
