//! Transactional unit of work.
//!
//! A [`SessionScope`] wraps one engine transaction. Commit and rollback
//! consume the scope, so exactly one of them can run; a scope dropped
//! uncommitted rolls back through the underlying transaction's drop
//! semantics, which keeps every exit path from leaking a session.
//! Nesting is unsupported: one scope per dispatcher call.

use crate::db::params::{bind_pg_param, bind_sqlite_param, number_placeholders};
use crate::db::pool::DbPool;
use crate::db::types::RowToRecord;
use crate::models::{ParamValue, Record};
use serde_json::Value as JsonValue;
use sqlx::{Postgres, Sqlite, Transaction};
use tracing::warn;

pub enum SessionScope {
    Postgres(Transaction<'static, Postgres>),
    Sqlite(Transaction<'static, Sqlite>),
}

impl SessionScope {
    /// Begin a transaction on a connection from the pool.
    pub async fn open(pool: &DbPool) -> Result<Self, sqlx::Error> {
        match pool {
            DbPool::Postgres(p) => Ok(Self::Postgres(p.begin().await?)),
            DbPool::Sqlite(p) => Ok(Self::Sqlite(p.begin().await?)),
        }
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        match self {
            Self::Postgres(tx) => tx.commit().await,
            Self::Sqlite(tx) => tx.commit().await,
        }
    }

    /// Roll back. Runs on the cleanup path of a failed operation, so its own
    /// failure is logged rather than propagated; the original error is the
    /// one the caller sees.
    pub async fn rollback(self) {
        let result = match self {
            Self::Postgres(tx) => tx.rollback().await,
            Self::Sqlite(tx) => tx.rollback().await,
        };
        if let Err(e) = result {
            warn!(error = %e, "transaction rollback failed");
        }
    }

    /// First column of the first row, or `None` when nothing matched.
    pub async fn fetch_scalar(
        &mut self,
        sql: &str,
        params: &[(String, ParamValue)],
    ) -> Result<Option<JsonValue>, sqlx::Error> {
        match self {
            Self::Postgres(tx) => {
                let sql = number_placeholders(sql);
                let mut query = sqlx::query(&sql);
                for (_, value) in params {
                    query = bind_pg_param(query, value);
                }
                let row = query.fetch_optional(&mut **tx).await?;
                Ok(row.map(|r| r.first_column()))
            }
            Self::Sqlite(tx) => {
                let mut query = sqlx::query(sql);
                for (_, value) in params {
                    query = bind_sqlite_param(query, value);
                }
                let row = query.fetch_optional(&mut **tx).await?;
                Ok(row.map(|r| r.first_column()))
            }
        }
    }

    /// Full first row as a record, or `None` when nothing matched.
    pub async fn fetch_optional(
        &mut self,
        sql: &str,
        params: &[(String, ParamValue)],
    ) -> Result<Option<Record>, sqlx::Error> {
        match self {
            Self::Postgres(tx) => {
                let sql = number_placeholders(sql);
                let mut query = sqlx::query(&sql);
                for (_, value) in params {
                    query = bind_pg_param(query, value);
                }
                let row = query.fetch_optional(&mut **tx).await?;
                Ok(row.map(|r| r.to_record()))
            }
            Self::Sqlite(tx) => {
                let mut query = sqlx::query(sql);
                for (_, value) in params {
                    query = bind_sqlite_param(query, value);
                }
                let row = query.fetch_optional(&mut **tx).await?;
                Ok(row.map(|r| r.to_record()))
            }
        }
    }

    /// All matching rows, in statement order.
    pub async fn fetch_all(
        &mut self,
        sql: &str,
        params: &[(String, ParamValue)],
    ) -> Result<Vec<Record>, sqlx::Error> {
        match self {
            Self::Postgres(tx) => {
                let sql = number_placeholders(sql);
                let mut query = sqlx::query(&sql);
                for (_, value) in params {
                    query = bind_pg_param(query, value);
                }
                let rows = query.fetch_all(&mut **tx).await?;
                Ok(rows.iter().map(|r| r.to_record()).collect())
            }
            Self::Sqlite(tx) => {
                let mut query = sqlx::query(sql);
                for (_, value) in params {
                    query = bind_sqlite_param(query, value);
                }
                let rows = query.fetch_all(&mut **tx).await?;
                Ok(rows.iter().map(|r| r.to_record()).collect())
            }
        }
    }

    /// Execute a mutating or DDL statement; returns rows affected.
    pub async fn execute(
        &mut self,
        sql: &str,
        params: &[(String, ParamValue)],
    ) -> Result<u64, sqlx::Error> {
        match self {
            Self::Postgres(tx) => {
                let sql = number_placeholders(sql);
                let mut query = sqlx::query(&sql);
                for (_, value) in params {
                    query = bind_pg_param(query, value);
                }
                let result = query.execute(&mut **tx).await?;
                Ok(result.rows_affected())
            }
            Self::Sqlite(tx) => {
                let mut query = sqlx::query(sql);
                for (_, value) in params {
                    query = bind_sqlite_param(query, value);
                }
                let result = query.execute(&mut **tx).await?;
                Ok(result.rows_affected())
            }
        }
    }
}
