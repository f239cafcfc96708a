//! Server side response.

use std::fmt;

use http::Version;

use crate::body::Stream;
use crate::error::MessageError;
use crate::registry::StatusRegistry;
use crate::utils::NumericArg;

use super::header::{HeaderValueCase, HeaderValues, Headers};
use super::message::{HttpMessage, MessageHead};
use super::version::parse_version;

/// What [`Response::with_status`] does with a caller supplied reason phrase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReasonPhrasePolicy {
    /// The reason phrase always comes from the status registry.
    #[default]
    Registry,
    /// A non-empty reason phrase given to `with_status` is kept.
    RetainCustom,
}

/// An immutable http response.
///
/// # Example
///
/// ```
/// use micro_message::protocol::{HttpMessage, Response};
///
/// let response = Response::new(&404).unwrap();
/// assert_eq!(response.reason_phrase(), "Not Found");
///
/// let ok = response.with_status(&200, None).unwrap();
/// assert_eq!(ok.status_code(), 200);
/// assert_eq!(response.status_code(), 404);
///
/// assert!(Response::new(&999).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    head: MessageHead,
    status: u16,
    reason: String,
    reason_policy: ReasonPhrasePolicy,
    statuses: &'static StatusRegistry,
}

impl Response {
    /// Creates a response with the registry's reason phrase, no headers and an empty body.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidStatusCode`] if the code is not registered, or
    /// [`MessageError::InvalidArgument`] if it is not numeric.
    pub fn new<C: NumericArg + ?Sized>(code: &C) -> Result<Self, MessageError> {
        Self::builder().status(code).build()
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason
    }

    pub fn reason_policy(&self) -> ReasonPhrasePolicy {
        self.reason_policy
    }

    pub fn statuses(&self) -> &'static StatusRegistry {
        self.statuses
    }

    /// Returns a response with another status.
    ///
    /// The reason phrase is looked up in the registry unless the response uses
    /// [`ReasonPhrasePolicy::RetainCustom`] and a non-empty `reason` is given.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidStatusCode`] if the code is not registered, or
    /// [`MessageError::InvalidArgument`] if it is not numeric.
    pub fn with_status<C: NumericArg + ?Sized>(&self, code: &C, reason: Option<&str>) -> Result<Self, MessageError> {
        let (status, registered) = self.statuses.resolve(code.to_numeric()?)?;
        let reason = effective_reason(self.reason_policy, registered, reason);

        if status == self.status && reason == self.reason {
            return Ok(self.clone());
        }
        Ok(Self { status, reason: reason.to_owned(), ..self.clone() })
    }

    /// Returns a response whose later [`with_status`](Response::with_status) calls follow
    /// `policy`. The current reason phrase is kept.
    pub fn with_reason_policy(&self, policy: ReasonPhrasePolicy) -> Self {
        Self { reason_policy: policy, ..self.clone() }
    }
}

fn effective_reason<'a>(policy: ReasonPhrasePolicy, registered: &'a str, custom: Option<&'a str>) -> &'a str {
    match (policy, custom) {
        (ReasonPhrasePolicy::RetainCustom, Some(custom)) if !custom.is_empty() => custom,
        _ => registered,
    }
}

impl HttpMessage for Response {
    fn head(&self) -> &MessageHead {
        &self.head
    }

    fn with_head(&self, head: MessageHead) -> Self {
        Self { head, ..self.clone() }
    }
}

/// Writes the status line, headers and body. The body is read in full.
impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HTTP/{} {} {}", self.protocol_version(), self.status, self.reason)?;
        self.head.fmt_tail(f)
    }
}

/// Builder for [`Response`]. Errors are deferred until [`build`](ResponseBuilder::build).
#[derive(Debug)]
pub struct ResponseBuilder {
    inner: Result<ResponseParts, MessageError>,
}

#[derive(Debug)]
struct ResponseParts {
    status: i64,
    reason: Option<String>,
    reason_policy: ReasonPhrasePolicy,
    version: Version,
    headers: Headers,
    body: Stream,
    statuses: &'static StatusRegistry,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    /// A `200` response over HTTP/1.1.
    pub fn new() -> Self {
        Self {
            inner: Ok(ResponseParts {
                status: 200,
                reason: None,
                reason_policy: ReasonPhrasePolicy::default(),
                version: Version::HTTP_11,
                headers: Headers::new(),
                body: Stream::empty(),
                statuses: StatusRegistry::standard(),
            }),
        }
    }

    pub fn status<C: NumericArg + ?Sized>(self, code: &C) -> Self {
        self.and_then(|mut parts| {
            parts.status = code.to_numeric()?;
            Ok(parts)
        })
    }

    /// A custom reason phrase, kept only with [`ReasonPhrasePolicy::RetainCustom`].
    pub fn reason(self, reason: &str) -> Self {
        self.and_then(|mut parts| {
            parts.reason = Some(reason.to_owned());
            Ok(parts)
        })
    }

    pub fn reason_policy(self, policy: ReasonPhrasePolicy) -> Self {
        self.and_then(|mut parts| {
            parts.reason_policy = policy;
            Ok(parts)
        })
    }

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

    pub fn statuses(self, statuses: &'static StatusRegistry) -> Self {
        self.and_then(|mut parts| {
            parts.statuses = statuses;
            Ok(parts)
        })
    }

    /// # Errors
    ///
    /// Returns the first error recorded by a builder method, or
    /// [`MessageError::InvalidStatusCode`] if the status is not registered.
    pub fn build(self) -> Result<Response, MessageError> {
        let parts = self.inner?;
        let (status, registered) = parts.statuses.resolve(parts.status)?;
        let reason = effective_reason(parts.reason_policy, registered, parts.reason.as_deref());

        Ok(Response {
            reason: reason.to_owned(),
            head: MessageHead::new(parts.version, parts.headers, parts.body),
            status,
            reason_policy: parts.reason_policy,
            statuses: parts.statuses,
        })
    }

    fn and_then<F>(self, f: F) -> Self
    where
        F: FnOnce(ResponseParts) -> Result<ResponseParts, MessageError>,
    {
        Self { inner: self.inner.and_then(f) }
    }
}
