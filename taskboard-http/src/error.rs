//! Errors raised while constructing the HTTP backend

use taskboard_engine::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URL '{0}' cannot carry path segments")]
    NotABase(String),

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
