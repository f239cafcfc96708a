use std::fmt;

use http::Version;

use crate::body::Stream;
use crate::error::MessageError;

use super::header::{HeaderValueCase, HeaderValues, Headers};
use super::version::{parse_version, version_str};

/// The parts shared by every message: protocol version, headers and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHead {
    version: Version,
    headers: Headers,
    body: Stream,
}

impl MessageHead {
    pub fn new(version: Version, headers: Headers, body: Stream) -> Self {
        Self { version, headers, body }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &Stream {
        &self.body
    }

    pub(crate) fn set_headers(&mut self, headers: Headers) {
        self.headers = headers;
    }

    /// Writes the header lines, a blank line and the body.
    pub(crate) fn fmt_tail(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, values) in &self.headers {
            writeln!(f, "{name}: {}", values.join(", "))?;
        }
        writeln!(f)?;
        write!(f, "{}", self.body)
    }
}

impl Default for MessageHead {
    fn default() -> Self {
        Self { version: Version::HTTP_11, headers: Headers::new(), body: Stream::empty() }
    }
}

/// Accessors and copy-on-write mutators common to requests and responses.
///
/// Implementors only provide [`head`](HttpMessage::head) and
/// [`with_head`](HttpMessage::with_head). Every `with_*` method returns a new message and
/// leaves the receiver untouched; when the requested value is already in place the result
/// is equal to the receiver.
pub trait HttpMessage: Sized {
    fn head(&self) -> &MessageHead;

    /// Returns a copy of this message carrying `head`.
    fn with_head(&self, head: MessageHead) -> Self;

    /// The protocol version number, e.g. `"1.1"`.
    fn protocol_version(&self) -> &'static str {
        version_str(self.head().version)
    }

    fn version(&self) -> Version {
        self.head().version
    }

    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] for an unsupported version.
    fn with_protocol_version(&self, version: &str) -> Result<Self, MessageError> {
        let version = parse_version(version)?;
        let mut head = self.head().clone();
        head.version = version;
        Ok(self.with_head(head))
    }

    fn headers(&self) -> &Headers {
        &self.head().headers
    }

    /// Header names in insertion order, as they were spelled when last set.
    fn header_names(&self) -> impl Iterator<Item = &str> {
        self.head().headers.names()
    }

    fn has_header(&self, name: &str) -> bool {
        self.head().headers.contains(name)
    }

    /// The values of a header, empty when absent.
    fn header(&self, name: &str) -> &[String] {
        self.head().headers.get(name)
    }

    /// The values of a header joined by `", "`, empty when absent.
    fn header_line(&self, name: &str) -> String {
        self.head().headers.line(name)
    }

    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] for an invalid name or value.
    fn with_header<V: Into<HeaderValues>>(&self, name: &str, values: V) -> Result<Self, MessageError> {
        let headers = self.head().headers.with_header(name, values)?;
        Ok(self.with_headers(headers))
    }

    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] for an invalid name or value.
    fn with_added_header<V: Into<HeaderValues>>(&self, name: &str, values: V) -> Result<Self, MessageError> {
        let headers = self.head().headers.with_added_header(name, values)?;
        Ok(self.with_headers(headers))
    }

    fn without_header(&self, name: &str) -> Self {
        self.with_headers(self.head().headers.without_header(name))
    }

    /// Returns a copy whose header map stores new values with the given policy.
    fn with_header_value_case(&self, value_case: HeaderValueCase) -> Self {
        self.with_headers(self.head().headers.with_value_case(value_case))
    }

    #[doc(hidden)]
    fn with_headers(&self, headers: Headers) -> Self {
        let mut head = self.head().clone();
        head.set_headers(headers);
        self.with_head(head)
    }

    fn body(&self) -> &Stream {
        &self.head().body
    }

    fn with_body(&self, body: Stream) -> Self {
        let mut head = self.head().clone();
        head.body = body;
        self.with_head(head)
    }
}
