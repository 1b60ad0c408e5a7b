//! Construction-time failures. Load failures of the embedded game are not
//! errors here; they are session state (see `embed::FailureCause`).

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Rejected `GameConfig` values.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required text field is empty
    #[error("{field} is required")]
    EmptyField { field: &'static str },

    /// Neither an absolute url nor a site-relative path
    #[error("{field} must be a valid URL, got {value:?}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("Invalid aspect ratio format: {0:?}")]
    InvalidAspectRatio(String),

    /// A list field contains an empty entry
    #[error("{field} must be an array of non-empty strings")]
    EmptyEntry { field: &'static str },

    #[error("{field} must be a positive number")]
    NonPositive { field: &'static str },

    #[error("Malformed game configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fatal errors raised while mounting the embed on a page.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("no global window")]
    NoWindow,

    #[error("no document on window")]
    NoDocument,

    /// One of the five page anchors is absent
    #[error("Game {name} not found (selector {selector:?})")]
    MissingAnchor { name: &'static str, selector: String },

    /// Anchor exists but is not the element type the embed needs
    #[error("Game {name} is not a <{expected}> element")]
    WrongElement { name: &'static str, expected: &'static str },

    #[error("game embed is already mounted")]
    AlreadyMounted,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid site URL: {0}")]
    Url(#[from] url::ParseError),

    /// Exception thrown by a DOM call
    #[error("JS exception: {0}")]
    Js(String),
}

impl From<JsValue> for EmbedError {
    fn from(value: JsValue) -> Self {
        EmbedError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<EmbedError> for JsValue {
    fn from(err: EmbedError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
