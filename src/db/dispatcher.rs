//! Uniform entry points for reads and mutations.
//!
//! Every operation opens exactly one [`SessionScope`]: commit on success,
//! rollback plus a translated domain error on failure, and the pool released
//! (disposed under the ephemeral policy) on every path.

use crate::db::pool::ConnectionManager;
use crate::db::session::SessionScope;
use crate::db::translate::ErrorTranslator;
use crate::error::{DomainError, DomainResult};
use crate::models::{
    Engine, MutationKind, MutationOutcome, Page, Record, Statement, StatementKind,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;

pub struct QueryDispatcher {
    manager: Arc<ConnectionManager>,
    translator: ErrorTranslator,
}

impl QueryDispatcher {
    pub fn new(manager: Arc<ConnectionManager>, translator: ErrorTranslator) -> Self {
        Self {
            manager,
            translator,
        }
    }

    pub fn engine(&self) -> Engine {
        self.manager.engine()
    }

    /// First column of the first row; `None` when no row matched.
    pub async fn scalar(&self, stmt: &Statement) -> DomainResult<Option<JsonValue>> {
        debug!(sql = %stmt.sql, params = stmt.params.len(), "scalar read");
        self.in_scope(async |scope| scope.fetch_scalar(&stmt.sql, &stmt.params).await)
            .await
    }

    /// Full first row; `None` when no row matched, never an error.
    pub async fn row(&self, stmt: &Statement) -> DomainResult<Option<Record>> {
        debug!(sql = %stmt.sql, params = stmt.params.len(), "row read");
        self.in_scope(async |scope| scope.fetch_optional(&stmt.sql, &stmt.params).await)
            .await
    }

    /// All matching rows; always a sequence, possibly empty. Pagination is
    /// applied to the statement before execution, so limiting happens
    /// server-side. Row order is whatever the statement produces.
    pub async fn list(&self, stmt: &Statement, page: Option<Page>) -> DomainResult<Vec<Record>> {
        let sql = match &page {
            Some(p) => format!("{} LIMIT {} OFFSET {}", stmt.sql, p.limit(), p.offset()),
            None => stmt.sql.clone(),
        };
        debug!(sql = %sql, params = stmt.params.len(), "list read");
        self.in_scope(async |scope| scope.fetch_all(&sql, &stmt.params).await)
            .await
    }

    /// Execute an insert, update or delete.
    ///
    /// Inserts yield the generated primary identifier (the statement carries
    /// `RETURNING id`), or `Empty` when none was produced. Updates echo the
    /// applied input parameters so the caller can build a response without a
    /// second read. Deletes yield `Empty`.
    pub async fn mutate(&self, stmt: &Statement) -> DomainResult<MutationOutcome> {
        let StatementKind::Mutation(kind) = stmt.kind else {
            return Err(DomainError::forbidden("mutate requires a mutation statement"));
        };
        debug!(sql = %stmt.sql, kind = ?kind, "mutation");

        match kind {
            MutationKind::Insert => {
                let id = self
                    .in_scope(async |scope| scope.fetch_scalar(&stmt.sql, &stmt.params).await)
                    .await?;
                Ok(match id {
                    Some(JsonValue::Number(n)) => n
                        .as_i64()
                        .map(MutationOutcome::GeneratedId)
                        .unwrap_or(MutationOutcome::Empty),
                    _ => MutationOutcome::Empty,
                })
            }
            MutationKind::Update => {
                let echo = stmt.echo();
                self.in_scope(async |scope| scope.execute(&stmt.sql, &stmt.params).await)
                    .await?;
                Ok(MutationOutcome::Echo(echo))
            }
            MutationKind::Delete => {
                self.in_scope(async |scope| scope.execute(&stmt.sql, &stmt.params).await)
                    .await?;
                Ok(MutationOutcome::Empty)
            }
        }
    }

    /// Run raw DDL statements in a single scope. Bootstrap-only surface.
    pub async fn execute_batch(&self, statements: &[String]) -> DomainResult<()> {
        self.in_scope(async |scope| {
            for sql in statements {
                scope.execute(sql, &[]).await?;
            }
            Ok(())
        })
        .await
    }

    /// The single wrapper every entry point goes through: one scope, commit
    /// or rollback, translated errors, pool released on every path.
    async fn in_scope<T>(
        &self,
        body: impl AsyncFnOnce(&mut SessionScope) -> Result<T, sqlx::Error>,
    ) -> DomainResult<T> {
        let pool = self.manager.acquire().await?;
        let result = match SessionScope::open(&pool).await {
            Ok(mut scope) => match body(&mut scope).await {
                Ok(value) => match scope.commit().await {
                    Ok(()) => Ok(value),
                    Err(e) => Err(self.translator.translate(e)),
                },
                Err(e) => {
                    scope.rollback().await;
                    Err(self.translator.translate(e))
                }
            },
            Err(e) => Err(self.translator.translate(e)),
        };
        self.manager.release().await;
        result
    }
}
