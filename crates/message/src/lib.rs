//! Immutable http message value objects.
//!
//! This crate models the pieces of an http exchange as values: a [`Uri`], the
//! [`Headers`] of a message, a [`Request`], a [`Response`] and the [`Stream`] that carries
//! a message body. None of them performs network I/O.
//!
//! Values never change once built. Every mutator is named `with_*` (or `without_*`),
//! takes `&self` and returns a new value; unchanged parts are shared between the old and
//! the new value.
//!
//! # Example
//!
//! ```
//! use micro_message::{HttpMessage, Request, Stream, Uri};
//!
//! let uri = Uri::parse("https://api.example.com/v1/items?limit=10").unwrap();
//! let request = Request::new("POST", uri)
//!     .unwrap()
//!     .with_header("Content-Type", "application/json")
//!     .unwrap()
//!     .with_body(Stream::from(r#"{"name":"lamp"}"#));
//!
//! assert_eq!(request.header_line("host"), "api.example.com");
//! assert_eq!(request.headers().names().collect::<Vec<_>>(), ["Host", "Content-Type"]);
//! assert_eq!(request.body().to_string(), r#"{"name":"lamp"}"#);
//! ```
//!
//! # Modules
//!
//! - [`uri`]: parsing, normalization and serialization of uri references
//! - [`protocol`]: headers, requests and responses
//! - [`body`]: the body stream
//! - [`registry`]: scheme, status and method tables the value types validate against
//! - [`error`]: error types

pub mod body;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod uri;
mod utils;

pub use body::Stream;
pub use error::{BodyError, HttpError, MessageError};
pub use protocol::{Headers, HttpMessage, Request, Response};
pub use uri::Uri;
pub use utils::NumericArg;
