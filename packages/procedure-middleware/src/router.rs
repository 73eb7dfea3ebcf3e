//! Path-addressed procedure registry.

use crate::context::{RawRequest, Session};
use crate::middleware::ProcedureResult;
use crate::procedure::Procedure;
use crate::RpcError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps dotted paths (`me.get`) to procedures.
#[derive(Debug, Clone, Default)]
pub struct Router {
    procedures: BTreeMap<String, Arc<Procedure>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `procedure` at `path`. A later registration at the same path
    /// replaces the earlier one.
    pub fn procedure(mut self, path: impl Into<String>, procedure: Procedure) -> Self {
        self.insert(path.into(), Arc::new(procedure));
        self
    }

    /// Mount every procedure of `router` under `prefix.`.
    pub fn nest(mut self, prefix: &str, router: Router) -> Self {
        for (path, procedure) in router.procedures {
            self.insert(format!("{prefix}.{path}"), procedure);
        }
        self
    }

    /// Take every procedure of `router` at its own path.
    pub fn merge(mut self, router: Router) -> Self {
        for (path, procedure) in router.procedures {
            self.insert(path, procedure);
        }
        self
    }

    fn insert(&mut self, path: String, procedure: Arc<Procedure>) {
        if self.procedures.insert(path.clone(), procedure).is_some() {
            tracing::warn!(%path, "procedure registered twice, keeping the last one");
        }
    }

    pub fn get(&self, path: &str) -> Option<&Arc<Procedure>> {
        self.procedures.get(path)
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.procedures.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Call the procedure at `path`. Unknown paths fail with NOT_FOUND
    /// without running any middleware.
    pub async fn call(
        &self,
        path: &str,
        request: RawRequest,
        session: Option<Session>,
        input: Value,
    ) -> ProcedureResult {
        let Some(procedure) = self.procedures.get(path) else {
            return Err(RpcError::not_found(format!("No procedure on path \"{path}\"")));
        };
        procedure.call(path, request, session, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::ProcedureBuilder;
    use crate::ErrorCode;

    fn echo() -> Procedure {
        ProcedureBuilder::new().query(|ctx, _| async move { Ok(Value::from(ctx.procedure_path())) })
    }

    #[test]
    fn test_nest_and_merge_paths() {
        let me = Router::new().procedure("get", echo()).procedure("update", echo());
        let router = Router::new()
            .procedure("health", echo())
            .nest("me", me)
            .merge(Router::new().procedure("version", echo()));

        let paths: Vec<&str> = router.paths().collect();
        assert_eq!(paths, vec!["health", "me.get", "me.update", "version"]);
    }

    #[tokio::test]
    async fn test_call_passes_full_path() {
        let router = Router::new().nest("me", Router::new().procedure("get", echo()));
        let out = router
            .call("me.get", RawRequest::default(), None, Value::Null)
            .await
            .unwrap();
        assert_eq!(out, "me.get");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let err = Router::new()
            .call("missing", RawRequest::default(), None, Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
