//! Incoming, server side request.
//!
//! A [`ServerRequest`] wraps a [`Request`] together with what a server knows about it
//! beyond the message itself: the server parameters it was built from, the decoded query
//! string and cookies, attributes attached while the request is handled, and the parsed
//! body.

use std::collections::BTreeMap;
use std::fmt;

use http::Method;
use mime::Mime;
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use triomphe::Arc;

use micro_message::protocol::MessageHead;
use micro_message::{HttpMessage, MessageError, Request, Uri};

use crate::ServerError;

/// Name/value pairs in their original order. Repeated names are kept.
pub type Pairs = Vec<(String, String)>;

/// A request body decoded according to its `Content-Type`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// `application/json` or a `+json` type; always an object or an array.
    Json(Value),
    /// `application/x-www-form-urlencoded`
    Form(Pairs),
}

#[derive(Debug, Clone, Copy)]
enum BodyKind {
    Json,
    Form,
}

/// A request as received by a server.
///
/// # Example
///
/// ```
/// use micro_message::HttpMessage;
/// use micro_message_server::ServerRequest;
///
/// let request = ServerRequest::from_server_params([
///     ("REQUEST_METHOD", "GET"),
///     ("REQUEST_URI", "/search?q=rust&page=2"),
///     ("SERVER_PROTOCOL", "HTTP/1.1"),
///     ("HTTP_HOST", "example.com"),
///     ("HTTP_ACCEPT_LANGUAGE", "en"),
/// ])
/// .unwrap();
///
/// assert_eq!(request.uri().to_string(), "http://example.com/search?q=rust&page=2");
/// assert_eq!(request.query("q"), Some("rust"));
/// assert_eq!(request.header_line("accept-language"), "en");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRequest {
    request: Request,
    server_params: Arc<BTreeMap<String, String>>,
    query_params: Arc<Pairs>,
    cookie_params: Arc<Pairs>,
    attributes: Arc<BTreeMap<String, Value>>,
    parsed_body: Option<ParsedBody>,
}

impl ServerRequest {
    /// Wraps `request`. Query parameters come from the uri and cookies from the `Cookie`
    /// header; there are no server parameters.
    pub fn new(request: Request) -> Self {
        let query_params = parse_query(&request.uri().query());
        let cookie_params = parse_cookies(request.header("cookie"));
        Self {
            request,
            server_params: Arc::new(BTreeMap::new()),
            query_params: Arc::new(query_params),
            cookie_params: Arc::new(cookie_params),
            attributes: Arc::new(BTreeMap::new()),
            parsed_body: None,
        }
    }

    /// Builds a request from CGI style server parameters.
    ///
    /// | parameter | used for |
    /// |-----------|----------|
    /// | `REQUEST_METHOD` | method, `GET` when absent |
    /// | `SERVER_PROTOCOL` | protocol version, e.g. `HTTP/1.1` |
    /// | `HTTPS` | `https` scheme unless empty or `off` |
    /// | `HTTP_HOST`, `SERVER_NAME`, `SERVER_PORT` | uri host and port |
    /// | `REQUEST_URI`, `QUERY_STRING` | uri path and query |
    /// | `HTTP_*`, `CONTENT_TYPE`, `CONTENT_LENGTH` | headers |
    ///
    /// The body is empty, use [`with_body`](HttpMessage::with_body) to attach one.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters do not form a valid request.
    pub fn from_server_params<I, K, V>(params: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params: BTreeMap<String, String> = params.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

        let method = params.get("REQUEST_METHOD").map_or("GET", String::as_str);
        let version = params
            .get("SERVER_PROTOCOL")
            .map_or("1.1", |protocol| protocol.strip_prefix("HTTP/").unwrap_or(protocol));

        let mut builder = Request::builder().method(method).version(version).uri(uri_from_params(&params)?);
        for (key, value) in &params {
            if let Some(name) = header_name(key) {
                builder = builder.header(&name, value.as_str());
            }
        }

        let mut request = Self::new(builder.build()?);
        trace!(method = %request.method(), uri = %request.uri(), "built server request");
        request.server_params = Arc::new(params);
        Ok(request)
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn into_request(self) -> Request {
        self.request
    }

    pub fn server_params(&self) -> &BTreeMap<String, String> {
        &self.server_params
    }

    pub fn server_param(&self, name: &str) -> Option<&str> {
        self.server_params.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query_params
    }

    /// The first query parameter called `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        first_value(&self.query_params, name)
    }

    /// Deserializes the query parameters into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidBody`] if the parameters do not fit `T`.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, ServerError> {
        let encoded = serde_urlencoded::to_string(&*self.query_params).map_err(ServerError::invalid_body)?;
        serde_urlencoded::from_str(&encoded).map_err(ServerError::invalid_body)
    }

    /// Returns a request with these query parameters. The uri is left as it is.
    pub fn with_query_params<I, K, V>(&self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { query_params: Arc::new(collect_pairs(params)), ..self.clone() }
    }

    pub fn cookie_params(&self) -> &[(String, String)] {
        &self.cookie_params
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        first_value(&self.cookie_params, name)
    }

    /// Returns a request with these cookies. The `Cookie` header is left as it is.
    pub fn with_cookie_params<I, K, V>(&self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { cookie_params: Arc::new(collect_pairs(params)), ..self.clone() }
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn with_attribute<V: Into<Value>>(&self, name: &str, value: V) -> Self {
        let mut request = self.clone();
        Arc::make_mut(&mut request.attributes).insert(name.to_owned(), value.into());
        request
    }

    pub fn without_attribute(&self, name: &str) -> Self {
        if !self.attributes.contains_key(name) {
            return self.clone();
        }
        let mut request = self.clone();
        Arc::make_mut(&mut request.attributes).remove(name);
        request
    }

    /// The body decoded according to the `Content-Type` header, or the body set with
    /// [`with_parsed_body`](ServerRequest::with_parsed_body).
    ///
    /// Returns `None` for an empty body and for content types other than json and url
    /// encoded forms.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidBody`] if the body does not match its content type, or
    /// a body error if the stream can not be read.
    pub fn parsed_body(&self) -> Result<Option<ParsedBody>, ServerError> {
        if let Some(parsed) = &self.parsed_body {
            return Ok(Some(parsed.clone()));
        }

        let Some(kind) = self.body_kind() else {
            return Ok(None);
        };

        let body = self.body();
        if body.is_seekable() {
            body.rewind()?;
        }
        let bytes = body.contents()?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let parsed = match kind {
            BodyKind::Json => {
                let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
                    debug!(cause = %e, "failed to parse json body");
                    ServerError::invalid_body(e)
                })?;
                if !(value.is_object() || value.is_array()) {
                    return Err(ServerError::invalid_body("json body is neither an object nor an array"));
                }
                ParsedBody::Json(value)
            }
            BodyKind::Form => ParsedBody::Form(serde_urlencoded::from_bytes(&bytes).map_err(|e| {
                debug!(cause = %e, "failed to parse form body");
                ServerError::invalid_body(e)
            })?),
        };
        Ok(Some(parsed))
    }

    /// Returns a request whose [`parsed_body`](ServerRequest::parsed_body) is `body`,
    /// regardless of the actual body.
    pub fn with_parsed_body(&self, body: ParsedBody) -> Self {
        Self { parsed_body: Some(body), ..self.clone() }
    }

    /// Returns a request whose parsed body is decoded from the actual body again.
    pub fn without_parsed_body(&self) -> Self {
        Self { parsed_body: None, ..self.clone() }
    }

    fn body_kind(&self) -> Option<BodyKind> {
        let mime: Mime = self.header("content-type").first()?.parse().ok()?;
        if mime.type_() == mime::APPLICATION && (mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON)) {
            Some(BodyKind::Json)
        } else if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            Some(BodyKind::Form)
        } else {
            None
        }
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// # Errors
    ///
    /// Returns [`MessageError::InvalidMethod`] if the method is not registered.
    pub fn with_method(&self, method: &str) -> Result<Self, MessageError> {
        Ok(self.with_request(self.request.with_method(method)?))
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    /// See [`Request::with_uri`]. Query parameters are left as they are.
    ///
    /// # Errors
    ///
    /// Returns an error if the `Host` header can not be updated.
    pub fn with_uri(&self, uri: Uri, preserve_host: bool) -> Result<Self, MessageError> {
        Ok(self.with_request(self.request.with_uri(uri, preserve_host)?))
    }

    pub fn request_target(&self) -> String {
        self.request.request_target()
    }

    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] if the target contains whitespace.
    pub fn with_request_target(&self, target: &str) -> Result<Self, MessageError> {
        Ok(self.with_request(self.request.with_request_target(target)?))
    }

    fn with_request(&self, request: Request) -> Self {
        Self { request, ..self.clone() }
    }
}

impl HttpMessage for ServerRequest {
    fn head(&self) -> &MessageHead {
        self.request.head()
    }

    fn with_head(&self, head: MessageHead) -> Self {
        self.with_request(self.request.with_head(head))
    }
}

impl From<Request> for ServerRequest {
    fn from(request: Request) -> Self {
        Self::new(request)
    }
}

impl fmt::Display for ServerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.request, f)
    }
}

fn uri_from_params(params: &BTreeMap<String, String>) -> Result<Uri, ServerError> {
    let mut uri = Uri::empty();

    let (host, port) = match params.get("HTTP_HOST") {
        Some(host) => split_host_port(host),
        None => (params.get("SERVER_NAME").map_or("", String::as_str), None),
    };

    if !host.is_empty() {
        let https = params.get("HTTPS").is_some_and(|v| !v.is_empty() && !v.eq_ignore_ascii_case("off"));
        uri = uri.with_scheme(if https { "https" } else { "http" })?.with_host(host)?;

        let port = port.or_else(|| params.get("SERVER_PORT").map(String::as_str)).filter(|p| !p.is_empty());
        if let Some(port) = port {
            uri = uri.with_port(port).map_err(|e| ServerError::invalid_server_param("SERVER_PORT", e))?;
        }
    }

    let request_uri = params.get("REQUEST_URI").map_or("", String::as_str);
    let (path, query) = match request_uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (request_uri, None),
    };
    uri = uri.with_path(path)?;

    let query = query.or_else(|| params.get("QUERY_STRING").map(String::as_str)).unwrap_or_default();
    Ok(uri.with_query(query)?)
}

/// Splits `host[:port]`, leaving bracketed ipv6 literals intact.
fn split_host_port(host: &str) -> (&str, Option<&str>) {
    match host.rsplit_once(':') {
        Some((name, port)) if !name.is_empty() && (!name.starts_with('[') || name.ends_with(']')) => {
            (name, Some(port))
        }
        _ => (host, None),
    }
}

/// `HTTP_ACCEPT_LANGUAGE` becomes `Accept-Language`. Other parameters are not headers.
fn header_name(key: &str) -> Option<String> {
    let words = match key {
        "CONTENT_TYPE" | "CONTENT_LENGTH" | "CONTENT_MD5" => key,
        _ => key.strip_prefix("HTTP_").filter(|name| !name.is_empty())?,
    };

    let name = words
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-");
    Some(name)
}

fn parse_query(query: &str) -> Pairs {
    serde_urlencoded::from_str(query).unwrap_or_else(|e| {
        debug!(query, cause = %e, "ignored malformed query string");
        Pairs::new()
    })
}

fn parse_cookies(lines: &[String]) -> Pairs {
    lines
        .iter()
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_owned(), percent_decode_str(value.trim()).decode_utf8_lossy().into_owned()))
        })
        .collect()
}

fn collect_pairs<I, K, V>(params: I) -> Pairs
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    params.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

fn first_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
}
