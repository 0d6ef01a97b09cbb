//! # Taskboard HTTP
//!
//! [`HttpBoardBackend`] implements the engine's
//! [`BoardBackend`](taskboard_engine::BoardBackend) over the board REST API
//! using `reqwest`. JSON bodies are camelCase; see [`dto`] for the wire types.
//!
//! ```ignore
//! use taskboard_engine::{BoardSession, SyncConfig};
//! use taskboard_http::HttpBoardBackend;
//!
//! let config = SyncConfig::load()?;
//! let backend = HttpBoardBackend::new(&config)?;
//! let mut session = BoardSession::with_config(backend, config);
//! ```

pub mod client;
pub mod dto;
pub mod error;

pub use client::HttpBoardBackend;
pub use error::HttpClientError;
