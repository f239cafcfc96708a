//! Client side request.
//!
//! A [`Request`] is a [`MessageHead`] plus a method, a [`Uri`] and an optional explicit
//! request target. The method is checked against a [`MethodRegistry`], the standard one
//! unless another registry is given to the [`RequestBuilder`].
//!
//! The `Host` header follows the uri: it is filled from the uri host at construction when
//! no `Host` header was supplied, and [`Request::with_uri`] updates it according to its
//! `preserve_host` flag.

use std::fmt;

use http::{Method, Version};
use triomphe::Arc;

use crate::body::Stream;
use crate::error::MessageError;
use crate::registry::MethodRegistry;
use crate::uri::Uri;
use crate::utils::ensure;

use super::header::{HeaderValueCase, HeaderValues, Headers};
use super::message::{HttpMessage, MessageHead};
use super::version::{parse_version, version_str};

/// An immutable http request.
///
/// # Example
///
/// ```
/// use micro_message::protocol::{HttpMessage, Request};
///
/// let request = Request::new("get", "http://example.com:8081/users?page=2").unwrap();
/// assert_eq!(request.method(), "GET");
/// assert_eq!(request.header_line("host"), "example.com:8081");
/// assert_eq!(request.request_target(), "/users?page=2");
///
/// let json = request.with_header("Content-Type", "application/json").unwrap();
/// assert!(json.has_header("content-type"));
/// assert!(!request.has_header("content-type"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    head: MessageHead,
    method: Method,
    uri: Arc<Uri>,
    target: Option<String>,
    methods: &'static MethodRegistry,
}

impl Request {
    /// Creates a request with an empty body and no headers besides `Host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the method is not registered or the uri is invalid.
    pub fn new<U>(method: &str, uri: U) -> Result<Self, MessageError>
    where
        U: TryInto<Uri>,
        <U as TryInto<Uri>>::Error: Into<MessageError>,
    {
        Self::builder().method(method).uri(uri).build()
    }

    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// # Errors
    ///
    /// Returns [`MessageError::InvalidMethod`] if the method is not registered.
    pub fn with_method(&self, method: &str) -> Result<Self, MessageError> {
        let method = self.methods.resolve(method)?;
        if method == self.method {
            return Ok(self.clone());
        }
        Ok(Self { method, ..self.clone() })
    }

    pub fn methods(&self) -> &'static MethodRegistry {
        self.methods
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns a request with `uri`.
    ///
    /// The `Host` header is set from the new uri's host. With `preserve_host` it is only set
    /// when the request has no `Host` header yet. A uri without a host leaves the header
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] if the host can not be written as a header
    /// value.
    pub fn with_uri(&self, uri: Uri, preserve_host: bool) -> Result<Self, MessageError> {
        let mut request = Self { uri: Arc::new(uri), ..self.clone() };

        let keep_host = preserve_host && !self.header_line("host").is_empty();
        if !keep_host {
            if let Some(host) = host_header(&request.uri) {
                let headers = request.head.headers().with_header("Host", host)?;
                request.head.set_headers(headers);
            }
        }
        Ok(request)
    }

    /// The target of the request line.
    ///
    /// This is the explicit target if one was set, otherwise the origin form built from the
    /// uri: its path (`/` when empty) followed by `?query` when there is a query.
    pub fn request_target(&self) -> String {
        if let Some(target) = &self.target {
            return target.clone();
        }

        let path = self.uri.path();
        let query = self.uri.query();
        let mut target = if path.is_empty() { String::from("/") } else { path };
        if !query.is_empty() {
            target.push('?');
            target.push_str(&query);
        }
        target
    }

    /// Returns a request with an explicit request target, such as `*` or an absolute form.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] if the target contains whitespace.
    pub fn with_request_target(&self, target: &str) -> Result<Self, MessageError> {
        ensure!(
            !target.is_empty() && !target.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()),
            MessageError::invalid_argument(format!("invalid request target {target:?}"))
        );
        if self.target.as_deref() == Some(target) {
            return Ok(self.clone());
        }
        Ok(Self { target: Some(target.to_owned()), ..self.clone() })
    }
}

impl HttpMessage for Request {
    fn head(&self) -> &MessageHead {
        &self.head
    }

    fn with_head(&self, head: MessageHead) -> Self {
        Self { head, ..self.clone() }
    }
}

/// `host[:port]` of a uri, `None` when the uri has no host.
fn host_header(uri: &Uri) -> Option<String> {
    let host = uri.host();
    if host.is_empty() {
        return None;
    }
    Some(match uri.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    })
}

/// Writes the request line, headers and body. The body is read in full.
impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} HTTP/{}", self.method, self.request_target(), self.protocol_version())?;
        self.head.fmt_tail(f)
    }
}

/// Builder for [`Request`]. Errors are deferred until [`build`](RequestBuilder::build).
#[derive(Debug)]
pub struct RequestBuilder {
    inner: Result<RequestParts, MessageError>,
}

#[derive(Debug)]
struct RequestParts {
    method: String,
    uri: Uri,
    version: Version,
    headers: Headers,
    body: Stream,
    target: Option<String>,
    methods: &'static MethodRegistry,
}

impl Default for RequestParts {
    fn default() -> Self {
        Self {
            method: String::from("GET"),
            uri: Uri::empty(),
            version: Version::HTTP_11,
            headers: Headers::new(),
            body: Stream::empty(),
            target: None,
            methods: MethodRegistry::standard(),
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// A `GET` request for the empty uri over HTTP/1.1.
    pub fn new() -> Self {
        Self { inner: Ok(RequestParts::default()) }
    }

    /// The method, upper-cased and checked against the registry when the request is built.
    pub fn method(self, method: &str) -> Self {
        self.and_then(|mut parts| {
            method.clone_into(&mut parts.method);
            Ok(parts)
        })
    }

    pub fn uri<U>(self, uri: U) -> Self
    where
        U: TryInto<Uri>,
        <U as TryInto<Uri>>::Error: Into<MessageError>,
    {
        self.and_then(move |mut parts| {
            parts.uri = uri.try_into().map_err(Into::into)?;
            Ok(parts)
        })
    }

    /// The protocol version, e.g. `"1.0"`.
    pub fn version(self, version: &str) -> Self {
        self.and_then(|mut parts| {
            parts.version = parse_version(version)?;
            Ok(parts)
        })
    }

    /// Appends a header. Repeated names accumulate values.
    pub fn header<V: Into<HeaderValues>>(self, name: &str, values: V) -> Self {
        self.and_then(move |mut parts| {
            parts.headers = parts.headers.with_added_header(name, values)?;
            Ok(parts)
        })
    }

    /// How values of headers added after this call are stored.
    pub fn header_value_case(self, value_case: HeaderValueCase) -> Self {
        self.and_then(|mut parts| {
            parts.headers = parts.headers.with_value_case(value_case);
            Ok(parts)
        })
    }

    pub fn body<B: Into<Stream>>(self, body: B) -> Self {
        self.and_then(move |mut parts| {
            parts.body = body.into();
            Ok(parts)
        })
    }

    /// An explicit request target, see [`Request::with_request_target`].
    pub fn request_target(self, target: &str) -> Self {
        self.and_then(|mut parts| {
            parts.target = Some(target.to_owned());
            Ok(parts)
        })
    }

    /// The registry the method is checked against, here and in later
    /// [`with_method`](Request::with_method) calls.
    pub fn methods(self, methods: &'static MethodRegistry) -> Self {
        self.and_then(|mut parts| {
            parts.methods = methods;
            Ok(parts)
        })
    }

    /// # Errors
    ///
    /// Returns the first error recorded by a builder method, or
    /// [`MessageError::InvalidMethod`] if the method is not registered.
    pub fn build(self) -> Result<Request, MessageError> {
        let parts = self.inner?;
        let method = parts.methods.resolve(&parts.method)?;

        let mut headers = parts.headers;
        if !headers.contains("host") {
            if let Some(host) = host_header(&parts.uri) {
                headers = headers.with_header("Host", host)?;
            }
        }

        let request = Request {
            head: MessageHead::new(parts.version, headers, parts.body),
            method,
            uri: Arc::new(parts.uri),
            target: None,
            methods: parts.methods,
        };

        match parts.target {
            Some(target) => request.with_request_target(&target),
            None => Ok(request),
        }
    }

    fn and_then<F>(self, f: F) -> Self
    where
        F: FnOnce(RequestParts) -> Result<RequestParts, MessageError>,
    {
        Self { inner: self.inner.and_then(f) }
    }
}

impl fmt::Display for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Ok(parts) => write!(f, "{} {} HTTP/{}", parts.method, parts.uri, version_str(parts.version)),
            Err(e) => write!(f, "invalid request: {e}"),
        }
    }
}
