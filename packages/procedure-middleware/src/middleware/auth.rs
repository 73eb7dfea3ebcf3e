//! Session gate for protected procedures.

use super::{Middleware, Next, ProcedureResult};
use crate::context::{CallContext, Session};
use crate::store::UserStore;
use crate::RpcError;
use futures_util::future::BoxFuture;
use std::sync::Arc;

/// Gate for protected procedures. Runs after logging so rejections are
/// still logged.
///
/// A session alone is not enough: its user must still exist in the store,
/// which catches users deleted while their session stayed valid.
#[derive(Clone)]
pub struct AuthMiddleware {
    store: Arc<dyn UserStore>,
}

impl AuthMiddleware {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }
}

impl Middleware for AuthMiddleware {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn handle<'a>(&'a self, ctx: CallContext, next: Next<'a>) -> BoxFuture<'a, ProcedureResult> {
        Box::pin(async move {
            let user = ctx.require_user()?.clone();

            if self.store.find_user_by_id(&user.id).await?.is_none() {
                tracing::debug!(user_id = %user.id, "session user no longer exists");
                return Err(RpcError::unauthorized());
            }

            next.run(ctx.with_session(Session::for_user(user))).await
        })
    }
}
