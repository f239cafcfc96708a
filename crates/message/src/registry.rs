//! Process-wide lookup tables consulted by the value types.
//!
//! Three registries exist:
//!
//! - [`SchemeRegistry`]: well-known port to scheme name, used by [`Uri`](crate::uri::Uri)
//!   to validate schemes and to hide a port that is the default for the scheme
//! - [`StatusRegistry`]: status code to reason phrase, used by
//!   [`Response`](crate::protocol::Response)
//! - [`MethodRegistry`]: the request methods a [`Request`](crate::protocol::Request) accepts
//!
//! Every registry is an immutable `'static` value. The `standard()` constructors return the
//! built-in tables; `new` builds an alternate table, which is handy in tests or for
//! applications that need extra schemes or status codes.

use http::{Method, StatusCode};

use crate::error::MessageError;

static STANDARD_PORTS: &[(u16, &str)] = &[(80, "http"), (8080, "http"), (443, "https"), (21, "ftp")];

static STANDARD_SCHEMES: SchemeRegistry = SchemeRegistry { ports: STANDARD_PORTS };

/// Maps well-known ports to scheme names.
///
/// A scheme may appear more than once (`http` is registered for both 80 and 8080). The
/// first entry for a scheme is its default port.
#[derive(Debug, PartialEq, Eq)]
pub struct SchemeRegistry {
    ports: &'static [(u16, &'static str)],
}

impl SchemeRegistry {
    /// Creates a registry from `(port, scheme)` pairs. Scheme names must be lowercase.
    pub const fn new(ports: &'static [(u16, &'static str)]) -> Self {
        Self { ports }
    }

    /// The built-in registry: `http` (80, 8080), `https` (443) and `ftp` (21).
    pub fn standard() -> &'static Self {
        &STANDARD_SCHEMES
    }

    /// Returns the default port of `scheme`, compared case-insensitively.
    pub fn default_port(&self, scheme: &str) -> Option<u16> {
        self.ports.iter().find(|(_, name)| name.eq_ignore_ascii_case(scheme)).map(|(port, _)| *port)
    }

    /// Returns the scheme registered for `port`.
    pub fn scheme_for(&self, port: u16) -> Option<&'static str> {
        self.ports.iter().find(|(p, _)| *p == port).map(|(_, scheme)| *scheme)
    }

    /// Returns true if `scheme` is known, compared case-insensitively.
    pub fn is_registered(&self, scheme: &str) -> bool {
        self.default_port(scheme).is_some()
    }
}

static STANDARD_STATUSES: StatusRegistry = StatusRegistry { table: StatusTable::Canonical };

/// Maps status codes to reason phrases.
#[derive(Debug, PartialEq, Eq)]
pub struct StatusRegistry {
    table: StatusTable,
}

#[derive(Debug, PartialEq, Eq)]
enum StatusTable {
    /// The IANA registered codes known to [`http::StatusCode`]
    Canonical,
    Custom(&'static [(u16, &'static str)]),
}

impl StatusRegistry {
    /// Creates a registry from `(code, reason phrase)` pairs.
    pub const fn new(table: &'static [(u16, &'static str)]) -> Self {
        Self { table: StatusTable::Custom(table) }
    }

    /// The built-in registry of IANA registered status codes.
    pub fn standard() -> &'static Self {
        &STANDARD_STATUSES
    }

    /// Returns the reason phrase for `code`, or `None` when the code is not registered.
    pub fn reason_phrase(&self, code: u16) -> Option<&'static str> {
        match self.table {
            StatusTable::Canonical => StatusCode::from_u16(code).ok().and_then(|status| status.canonical_reason()),
            StatusTable::Custom(table) => table.iter().find(|(c, _)| *c == code).map(|(_, reason)| *reason),
        }
    }

    pub fn contains(&self, code: u16) -> bool {
        self.reason_phrase(code).is_some()
    }

    /// Resolves a loosely typed code into a registered one.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidStatusCode`] if the code is not in the registry.
    pub fn resolve(&self, code: i64) -> Result<(u16, &'static str), MessageError> {
        u16::try_from(code)
            .ok()
            .and_then(|c| self.reason_phrase(c).map(|reason| (c, reason)))
            .ok_or_else(|| MessageError::invalid_status_code(code))
    }
}

static STANDARD_METHODS: MethodRegistry = MethodRegistry {
    methods: &[Method::GET, Method::POST, Method::PUT, Method::OPTIONS, Method::PATCH, Method::DELETE, Method::HEAD],
};

/// The set of request methods a request may carry.
#[derive(Debug, PartialEq, Eq)]
pub struct MethodRegistry {
    methods: &'static [Method],
}

impl MethodRegistry {
    pub const fn new(methods: &'static [Method]) -> Self {
        Self { methods }
    }

    /// GET, POST, PUT, OPTIONS, PATCH, DELETE and HEAD.
    pub fn standard() -> &'static Self {
        &STANDARD_METHODS
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Upper-cases `method` and looks it up in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidMethod`] if the method is not registered.
    pub fn resolve(&self, method: &str) -> Result<Method, MessageError> {
        self.methods
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(method))
            .cloned()
            .ok_or_else(|| MessageError::invalid_method(method))
    }

    pub fn methods(&self) -> &'static [Method] {
        self.methods
    }
}
