//! Per-call context threaded through the middleware chain.

use crate::RpcError;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use observability::Logger;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Kind of procedure being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureType {
    Query,
    Mutation,
    Subscription,
}

impl ProcedureType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProcedureType::Query => "query",
            ProcedureType::Mutation => "mutation",
            ProcedureType::Subscription => "subscription",
        }
    }
}

impl fmt::Display for ProcedureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-level request metadata the chain needs.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub method: Method,
    pub headers: HeaderMap,
}

impl RawRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// First value of `name`, if present and valid UTF-8.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Headers as a JSON object. Repeated headers are joined with `, `.
    pub fn headers_json(&self) -> Value {
        let mut map = Map::new();
        for name in self.headers.keys() {
            let joined = self
                .headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            map.insert(name.as_str().to_string(), Value::String(joined));
        }
        Value::Object(map)
    }
}

/// User as carried by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl SessionUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Session supplied by the authentication collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

impl Session {
    /// Session holding exactly `user`.
    pub fn for_user(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            expires: None,
        }
    }
}

/// Context of one procedure call.
///
/// Middleware augments it on the way down (`with_logger`, `with_session`);
/// nothing removes what an earlier stage attached.
#[derive(Debug, Clone)]
pub struct CallContext {
    procedure_path: String,
    procedure_type: ProcedureType,
    raw_request: Arc<RawRequest>,
    session: Option<Session>,
    logger: Option<Logger>,
}

impl CallContext {
    pub fn new(
        procedure_path: impl Into<String>,
        procedure_type: ProcedureType,
        raw_request: RawRequest,
        session: Option<Session>,
    ) -> Self {
        Self {
            procedure_path: procedure_path.into(),
            procedure_type,
            raw_request: Arc::new(raw_request),
            session,
            logger: None,
        }
    }

    pub fn procedure_path(&self) -> &str {
        &self.procedure_path
    }

    pub fn procedure_type(&self) -> ProcedureType {
        self.procedure_type
    }

    pub fn raw_request(&self) -> &RawRequest {
        &self.raw_request
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_user(&self) -> Option<&SessionUser> {
        self.session.as_ref().and_then(|s| s.user.as_ref())
    }

    /// Session user, or UNAUTHORIZED.
    pub fn require_user(&self) -> Result<&SessionUser, RpcError> {
        self.session_user().ok_or_else(RpcError::unauthorized)
    }

    /// Call-scoped logger, once the logging interceptor has run.
    pub fn logger(&self) -> Option<&Logger> {
        self.logger.as_ref()
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }
}
