use std::convert::Infallible;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("message error: {source}")]
    MessageError {
        #[from]
        source: MessageError,
    },

    #[error("body error: {source}")]
    BodyError {
        #[from]
        source: BodyError,
    },
}

/// Validation failures raised by the message and uri value types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("invalid uri {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("invalid http method: {method:?}")]
    InvalidMethod { method: String },

    #[error("invalid http status code: {code}")]
    InvalidStatusCode { code: i64 },
}

impl MessageError {
    pub fn invalid_argument<S: ToString>(str: S) -> Self {
        Self::InvalidArgument { reason: str.to_string() }
    }

    pub fn invalid_uri<U: ToString, S: ToString>(uri: U, reason: S) -> Self {
        Self::InvalidUri { uri: uri.to_string(), reason: reason.to_string() }
    }

    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }

    pub fn invalid_status_code(code: i64) -> Self {
        Self::InvalidStatusCode { code }
    }
}

impl From<Infallible> for MessageError {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

/// Failures of the body stream.
#[derive(Error, Debug)]
pub enum BodyError {
    #[error("stream is not readable")]
    NotReadable,

    #[error("stream is not writable")]
    NotWritable,

    #[error("stream is not seekable")]
    NotSeekable,

    #[error("stream is detached")]
    Detached,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl BodyError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true when the stream had already been closed or detached.
    pub fn is_detached(&self) -> bool {
        matches!(self, BodyError::Detached)
    }
}
