//! # Procedure middleware
//!
//! Interceptors around remote procedure calls.
//!
//! Every procedure runs the logging interceptor first: it derives a per-call
//! child logger (`path`, `requestHeaders`, `trace_id`), tags the active trace
//! span, and writes exactly one exit record with the call's duration and
//! outcome. Protected procedures then run the auth interceptor, which rejects
//! calls without a session user or whose user no longer exists.
//!
//! ```rust,ignore
//! let factory = ProcedureFactory::new(observability::logger()?.clone(), store);
//! let router = Router::new().nest(
//!     "me",
//!     Router::new().procedure(
//!         "get",
//!         factory.protected_procedure().query(|ctx, _| async move {
//!             Ok(serde_json::to_value(ctx.require_user()?).map_err(RpcError::internal)?)
//!         }),
//!     ),
//! );
//! let user = router.call("me.get", request, session, Value::Null).await?;
//! ```

pub mod context;
mod error;
pub mod middleware;
mod procedure;
mod router;
pub mod store;
pub mod trace;

pub use context::{CallContext, ProcedureType, RawRequest, Session, SessionUser};
pub use error::{ErrorCode, ErrorShape, ErrorShapeData, RpcError, ValidationIssues};
pub use middleware::{AuthMiddleware, LoggingMiddleware, Middleware, Next, ProcedureResult};
pub use procedure::{Procedure, ProcedureBuilder, ProcedureFactory};
pub use router::Router;
pub use store::{InMemoryUserStore, StoreError, UserRecord, UserStore};
