//! Interceptor chain.
//!
//! A procedure owns an ordered list of [`Middleware`]. A call walks the list
//! through [`Next`], which is consumed when run, so each stage continues the
//! chain at most once. A stage short-circuits by returning an error instead.

mod auth;
mod logging;

pub use auth::AuthMiddleware;
pub use logging::LoggingMiddleware;

use crate::context::CallContext;
use crate::RpcError;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Outcome of a procedure call.
pub type ProcedureResult = Result<Value, RpcError>;

/// Type-erased procedure handler.
pub type HandlerFn = Arc<dyn Fn(CallContext, Value) -> BoxFuture<'static, ProcedureResult> + Send + Sync>;

/// Erase an async handler closure into a [`HandlerFn`].
pub fn handler_fn<F, Fut>(handler: F) -> HandlerFn
where
    F: Fn(CallContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ProcedureResult> + Send + 'static,
{
    Arc::new(move |ctx: CallContext, input: Value| -> BoxFuture<'static, ProcedureResult> {
        handler(ctx, input).boxed()
    })
}

/// One stage of the chain.
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    /// Observe or gate the call. Implementations either return an error or
    /// run `next` with a (possibly augmented) context.
    fn handle<'a>(&'a self, ctx: CallContext, next: Next<'a>) -> BoxFuture<'a, ProcedureResult>;
}

/// Continuation: the stages after the current one, then the handler.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    handler: &'a HandlerFn,
    input: Value,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware>], handler: &'a HandlerFn, input: Value) -> Self {
        Self {
            remaining: chain,
            handler,
            input,
        }
    }

    /// Run the rest of the chain with `ctx`.
    pub fn run(self, ctx: CallContext) -> BoxFuture<'a, ProcedureResult> {
        match self.remaining.split_first() {
            Some((stage, rest)) => stage.handle(
                ctx,
                Next {
                    remaining: rest,
                    handler: self.handler,
                    input: self.input,
                },
            ),
            None => (self.handler)(ctx, self.input),
        }
    }

    pub fn input(&self) -> &Value {
        &self.input
    }
}
