//! Server side requests on top of [`micro_message`].
//!
//! [`ServerRequest`] is the request a server hands to application code: a
//! [`Request`](micro_message::Request) plus server parameters, query and cookie
//! parameters, attributes and a parsed body. [`RequestHandler`] is the trait application
//! code implements to answer it.
//!
//! # Example
//!
//! ```
//! use micro_message::{HttpMessage, Response};
//! use micro_message_server::{RequestHandler, ServerError, ServerRequest, handler_fn};
//!
//! async fn hello(request: ServerRequest) -> Result<Response, ServerError> {
//!     let name = request.query("name").unwrap_or("world").to_owned();
//!     Ok(Response::builder().status(&200).body(format!("hello {name}")).build()?)
//! }
//!
//! # async fn run() -> Result<(), ServerError> {
//! let handler = handler_fn(hello);
//! let request = ServerRequest::from_server_params([("REQUEST_URI", "/?name=ferris")])?;
//! let response = handler.handle(request).await?;
//! assert_eq!(response.body().to_string(), "hello ferris");
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
mod server_request;

pub use error::ServerError;
pub use handler::HandlerFn;
pub use handler::RequestHandler;
pub use handler::handler_fn;
pub use server_request::Pairs;
pub use server_request::ParsedBody;
pub use server_request::ServerRequest;
