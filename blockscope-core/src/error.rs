use blockscope_fetch::FetchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The live document has no `<main>`; every path is rooted there.
    #[error("Live document has no <main> element")]
    MissingMain,

    #[error("Invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
