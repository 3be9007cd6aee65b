//! Durable counter backends. No counter state is ever kept in process memory.

use crate::error::AppError;
use crate::sequence::SequenceScope;
use crate::sql::counter::upsert_increment;
use crate::sql::QueryBuf;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

/// One atomic increment of a scope's counter, returning the new value.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment(&self, scope: &SequenceScope) -> Result<i64, AppError>;
}

/// Counter rows in `<schema>._sys_sequences`.
#[derive(Clone, Debug)]
pub struct PgCounterStore {
    pool: PgPool,
    schema: String,
}

impl PgCounterStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgCounterStore {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Increment on a caller-held connection, e.g. inside the transaction doing the insert.
    pub async fn increment_on(&self, conn: &mut PgConnection, scope: &SequenceScope) -> Result<i64, AppError> {
        let q = upsert_increment(&self.schema, scope);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        Ok(bind(&q).fetch_one(&mut *conn).await?)
    }
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn increment(&self, scope: &SequenceScope) -> Result<i64, AppError> {
        let q = upsert_increment(&self.schema, scope);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        Ok(bind(&q).fetch_one(&self.pool).await?)
    }
}

fn bind(q: &QueryBuf) -> sqlx::query::QueryScalar<'_, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query
}
