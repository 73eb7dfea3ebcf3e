//! Procedures and the builders that attach their middleware.

use crate::context::{CallContext, ProcedureType, RawRequest, Session};
use crate::error::ValidationIssues;
use crate::middleware::{
    handler_fn, AuthMiddleware, HandlerFn, LoggingMiddleware, Middleware, Next, ProcedureResult,
};
use crate::store::UserStore;
use crate::RpcError;
use futures_util::future::{self, BoxFuture, FutureExt};
use http::header::HeaderName;
use observability::Logger;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A callable procedure: its middleware chain and handler.
pub struct Procedure {
    procedure_type: ProcedureType,
    middleware: Vec<Arc<dyn Middleware>>,
    handler: HandlerFn,
}

impl Procedure {
    pub fn procedure_type(&self) -> ProcedureType {
        self.procedure_type
    }

    /// Names of the chain stages, in call order.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Run the chain and handler for one call at `path`.
    pub async fn call(
        &self,
        path: &str,
        request: RawRequest,
        session: Option<Session>,
        input: Value,
    ) -> ProcedureResult {
        let ctx = CallContext::new(path, self.procedure_type, request, session);
        Next::new(&self.middleware, &self.handler, input).run(ctx).await
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("procedure_type", &self.procedure_type)
            .field("middleware", &self.middleware_names())
            .finish()
    }
}

/// Collects middleware, then finishes into a [`Procedure`].
#[derive(Clone, Default)]
pub struct ProcedureBuilder {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ProcedureBuilder {
    /// Builder with no middleware at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `middleware` to the chain.
    pub fn with<M>(self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.with_shared(Arc::new(middleware))
    }

    pub fn with_shared(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn query<F, Fut>(self, handler: F) -> Procedure
    where
        F: Fn(CallContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ProcedureResult> + Send + 'static,
    {
        self.finish(ProcedureType::Query, handler_fn(handler))
    }

    pub fn mutation<F, Fut>(self, handler: F) -> Procedure
    where
        F: Fn(CallContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ProcedureResult> + Send + 'static,
    {
        self.finish(ProcedureType::Mutation, handler_fn(handler))
    }

    pub fn subscription<F, Fut>(self, handler: F) -> Procedure
    where
        F: Fn(CallContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ProcedureResult> + Send + 'static,
    {
        self.finish(ProcedureType::Subscription, handler_fn(handler))
    }

    /// Query whose input is deserialized into `I`. Input that does not fit
    /// `I` fails with BAD_REQUEST and flattened validation issues.
    pub fn typed_query<I, O, F, Fut>(self, handler: F) -> Procedure
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(CallContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        self.finish(ProcedureType::Query, typed_handler(handler))
    }

    pub fn typed_mutation<I, O, F, Fut>(self, handler: F) -> Procedure
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(CallContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        self.finish(ProcedureType::Mutation, typed_handler(handler))
    }

    fn finish(self, procedure_type: ProcedureType, handler: HandlerFn) -> Procedure {
        Procedure {
            procedure_type,
            middleware: self.middleware,
            handler,
        }
    }
}

fn typed_handler<I, O, F, Fut>(handler: F) -> HandlerFn
where
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
    F: Fn(CallContext, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
{
    Arc::new(move |ctx: CallContext, input: Value| -> BoxFuture<'static, ProcedureResult> {
        let input = match serde_json::from_value::<I>(input) {
            Ok(input) => input,
            Err(err) => {
                let issues = ValidationIssues::from_deserialize(&err);
                return future::ready(Err(RpcError::validation(issues).with_source(err))).boxed();
            }
        };
        let output = handler(ctx, input);
        async move {
            let output = output.await?;
            serde_json::to_value(output).map_err(RpcError::internal)
        }
        .boxed()
    })
}

/// Entry point for building procedures against one logger and user store.
///
/// Public procedures run `[logging]`; protected ones run `[logging, auth]`.
#[derive(Clone)]
pub struct ProcedureFactory {
    logging: Arc<LoggingMiddleware>,
    auth: Arc<AuthMiddleware>,
}

impl ProcedureFactory {
    pub fn new(logger: Logger, store: Arc<dyn UserStore>) -> Self {
        Self {
            logging: Arc::new(LoggingMiddleware::new(logger)),
            auth: Arc::new(AuthMiddleware::new(store)),
        }
    }

    /// Take the correlation id from `header`.
    pub fn with_trace_header(mut self, header: HeaderName) -> Self {
        let logging = (*self.logging).clone().with_trace_header(header);
        self.logging = Arc::new(logging);
        self
    }

    pub fn public_procedure(&self) -> ProcedureBuilder {
        ProcedureBuilder::new().with_shared(self.logging.clone())
    }

    pub fn protected_procedure(&self) -> ProcedureBuilder {
        self.public_procedure().with_shared(self.auth.clone())
    }
}
