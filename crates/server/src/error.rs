use micro_message::{BodyError, HttpError, MessageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("message error: {source}")]
    Message {
        #[from]
        source: MessageError,
    },

    #[error("body error: {source}")]
    Body {
        #[from]
        source: BodyError,
    },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("invalid server parameter {name}: {reason}")]
    InvalidServerParam { name: String, reason: String },
}

impl ServerError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_server_param<N: ToString, S: ToString>(name: N, reason: S) -> Self {
        Self::InvalidServerParam { name: name.to_string(), reason: reason.to_string() }
    }
}

impl From<HttpError> for ServerError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::MessageError { source } => Self::Message { source },
            HttpError::BodyError { source } => Self::Body { source },
        }
    }
}
