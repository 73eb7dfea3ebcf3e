//! Procedure error codes, errors and the client-facing error shape.

use serde::Serialize;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Error code carried by every procedure failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ParseError,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotSupported,
    Timeout,
    Conflict,
    PreconditionFailed,
    PayloadTooLarge,
    TooManyRequests,
    ClientClosedRequest,
    InternalServerError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::PreconditionFailed => "PRECONDITION_FAILED",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorCode::ClientClosedRequest => "CLIENT_CLOSED_REQUEST",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    pub const fn http_status(self) -> u16 {
        match self {
            ErrorCode::ParseError | ErrorCode::BadRequest => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::MethodNotSupported => 405,
            ErrorCode::Timeout => 408,
            ErrorCode::Conflict => 409,
            ErrorCode::PreconditionFailed => 412,
            ErrorCode::PayloadTooLarge => 413,
            ErrorCode::TooManyRequests => 429,
            ErrorCode::ClientClosedRequest => 499,
            ErrorCode::InternalServerError => 500,
        }
    }

    /// JSON-RPC 2.0 style numeric code used in the error shape.
    pub const fn rpc_code(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::BadRequest => -32600,
            ErrorCode::InternalServerError => -32603,
            ErrorCode::Unauthorized => -32001,
            ErrorCode::Forbidden => -32003,
            ErrorCode::NotFound => -32004,
            ErrorCode::MethodNotSupported => -32005,
            ErrorCode::Timeout => -32008,
            ErrorCode::Conflict => -32009,
            ErrorCode::PreconditionFailed => -32012,
            ErrorCode::PayloadTooLarge => -32013,
            ErrorCode::TooManyRequests => -32029,
            ErrorCode::ClientClosedRequest => -32099,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened input validation failures: issues not tied to a field, and
/// issues per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssues {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationIssues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(mut self, message: impl Into<String>) -> Self {
        self.form_errors.push(message.into());
        self
    }

    pub fn field(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }

    /// Issues from a failed input deserialization. `missing field` and
    /// `unknown field` errors are attributed to the named field.
    pub fn from_deserialize(err: &serde_json::Error) -> Self {
        let message = err.to_string();
        match backticked_field(&message) {
            Some(field) => Self::new().field(field, message.clone()),
            None => Self::new().form(message),
        }
    }

    fn summary(&self) -> String {
        let mut parts: Vec<String> = self.form_errors.clone();
        for (field, messages) in &self.field_errors {
            for message in messages {
                parts.push(format!("{field}: {message}"));
            }
        }
        if parts.is_empty() {
            "Input validation failed".to_string()
        } else {
            parts.join("; ")
        }
    }
}

fn backticked_field(message: &str) -> Option<String> {
    let rest = message
        .strip_prefix("missing field `")
        .or_else(|| message.strip_prefix("unknown field `"))?;
    rest.split('`').next().map(str::to_string)
}

/// Failure of a procedure call. Callers receive code and message; stack and
/// source chain stay in server logs.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct RpcError {
    code: ErrorCode,
    message: String,
    captured_stack: Option<String>,
    validation: Option<ValidationIssues>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl RpcError {
    /// Error whose message is the code name.
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.as_str())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            captured_stack: captured_backtrace(),
            validation: None,
            source: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, message)
    }

    /// Wrap an unexpected error as INTERNAL_SERVER_ERROR, keeping it as source.
    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        let source = err.into();
        Self::with_message(ErrorCode::InternalServerError, source.to_string()).with_source(source)
    }

    /// BAD_REQUEST carrying flattened validation issues.
    pub fn validation(issues: ValidationIssues) -> Self {
        let mut err = Self::with_message(ErrorCode::BadRequest, issues.summary());
        err.validation = Some(issues);
        err
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn validation_issues(&self) -> Option<&ValidationIssues> {
        self.validation.as_ref()
    }

    /// Server-side stack: code and message, the source chain, then the
    /// captured backtrace when `RUST_BACKTRACE` enables one.
    pub fn stack(&self) -> String {
        let mut out = format!("{}: {}", self.code, self.message);
        let mut source = StdError::source(self);
        while let Some(cause) = source {
            out.push_str("\n    caused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        if let Some(backtrace) = &self.captured_stack {
            out.push('\n');
            out.push_str(backtrace);
        }
        out
    }

    /// Client-facing error shape. Never includes the stack.
    pub fn shape(&self, path: Option<&str>) -> ErrorShape {
        let validation = match self.code {
            ErrorCode::BadRequest => self.validation.clone().filter(|v| !v.is_empty()),
            _ => None,
        };
        ErrorShape {
            message: self.message.clone(),
            code: self.code.rpc_code(),
            data: ErrorShapeData {
                code: self.code,
                http_status: self.code.http_status(),
                path: path.map(str::to_string),
                validation,
            },
        }
    }
}

fn captured_backtrace() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

/// Error as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorShape {
    pub message: String,
    pub code: i32,
    pub data: ErrorShapeData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorShapeData {
    pub code: ErrorCode,
    pub http_status: u16,
    pub path: Option<String>,
    pub validation: Option<ValidationIssues>,
}
