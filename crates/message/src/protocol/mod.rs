//! Http messages.
//!
//! - [`Headers`]: case-insensitive header map that keeps the original name spelling
//! - [`MessageHead`] and [`HttpMessage`]: protocol version, headers and body shared by all
//!   messages, with the copy-on-write `with_*` mutators
//! - [`Request`] and [`Response`]
//!
//! Messages are values. Cloning one is cheap: headers are shared until one side changes
//! them, the uri of a request is reference counted and the body is a shared handle.

mod header;
mod message;
mod request;
mod response;
mod version;

pub use header::HeaderValueCase;
pub use header::HeaderValues;
pub use header::Headers;
pub use message::HttpMessage;
pub use message::MessageHead;
pub use request::Request;
pub use request::RequestBuilder;
pub use response::ReasonPhrasePolicy;
pub use response::Response;
pub use response::ResponseBuilder;
