use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use std::fmt;

use crate::api::response::json_response;
use crate::store::StoreError;

/// Machine readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Unknown,
    ResourceNotFound,
    BadRequest,
    Unauthorized,
    Forbidden,
    EndpointNotFound,
    LimitTooBig,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Unknown => "unknown",
            Code::ResourceNotFound => "resource_not_found",
            Code::BadRequest => "bad_request",
            Code::Unauthorized => "unauthorized",
            Code::Forbidden => "forbidden",
            Code::EndpointNotFound => "endpoint_not_found",
            Code::LimitTooBig => "limit_too_big",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Code::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            Code::ResourceNotFound => StatusCode::NOT_FOUND,
            Code::BadRequest => StatusCode::BAD_REQUEST,
            Code::Unauthorized => StatusCode::UNAUTHORIZED,
            Code::Forbidden => StatusCode::FORBIDDEN,
            Code::EndpointNotFound => StatusCode::NOT_FOUND,
            Code::LimitTooBig => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified error, reported to clients as a JSON envelope.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    code: Code,
    message: String,
    #[source]
    cause: Option<Cause>,
}

/// Link in a chain of underlying errors, outermost first.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct Cause {
    pub message: String,
    #[source]
    pub next: Option<Box<Cause>>,
}

impl Cause {
    pub fn new(message: String) -> Self {
        Self {
            message,
            next: None,
        }
    }

    /// Capture `err` and its whole source chain.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            message: err.to_string(),
            next: err.source().map(|e| Box::new(Cause::from_error(e))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cause> {
        std::iter::successors(Some(self), |c| c.next.as_deref())
    }
}

impl Error {
    pub fn new(code: Code, message: &str) -> Self {
        Self {
            code,
            message: message.to_owned(),
            cause: None,
        }
    }

    pub fn wrap<E>(code: Code, message: &str, err: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self {
            code,
            message: message.to_owned(),
            cause: Some(Cause::from_error(&err)),
        }
    }

    pub fn with_cause(code: Code, message: &str, cause: Cause) -> Self {
        Self {
            code,
            message: message.to_owned(),
            cause: Some(cause),
        }
    }

    pub fn resource_not_found() -> Self {
        Self::new(Code::ResourceNotFound, "Resource not found")
    }

    pub fn forbidden() -> Self {
        Self::new(Code::Forbidden, "Forbidden")
    }

    pub fn endpoint_not_found() -> Self {
        Self::new(Code::EndpointNotFound, "Endpoint not found")
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Full error chain, for logs.
    pub fn chain(&self) -> String {
        let mut s = format!("[{}] {}", self.code, self.message);
        if let Some(cause) = &self.cause {
            for c in cause.iter() {
                s.push_str(": ");
                s.push_str(&c.message);
            }
        }
        s
    }

    fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            error: &self.message,
            code: self.code.as_str(),
            cause: self.cause.as_ref().map(|c| c.message.as_str()),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::wrap(Code::Unknown, "Could not retrieve balance updates", err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<&'a str>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_server_error() {
            tracing::error!("{}", self.chain());
        } else {
            tracing::debug!("{}", self.chain());
        }
        json_response(status, &self.body())
    }
}
