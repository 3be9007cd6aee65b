//! Executes list plans against PostgreSQL.

use crate::error::AppError;
use crate::list::{ListPlan, ListSpec, PaginationResult, QueryRequest};
use crate::response::{ListOutcome, Page};
use crate::settings::{CountStrategy, ListSettings};
use crate::sql::row::{row_to_json, take_total};
use crate::sql::{select_all, select_count, select_page, BaseQuery, QueryBuf, TOTAL_COLUMN};
use serde_json::Value;
use sqlx::PgPool;

/// Search, filter, sort and paginate any base query. Holds settings only.
///
/// With [`CountStrategy::Separate`] the count and the page are two independent
/// reads; rows written between them can make the summary disagree slightly with
/// the page. That window is accepted for administrative listings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListQueryEngine {
    settings: ListSettings,
}

impl ListQueryEngine {
    pub fn new(settings: ListSettings) -> Self {
        ListQueryEngine { settings }
    }

    pub fn settings(&self) -> &ListSettings {
        &self.settings
    }

    pub fn plan(&self, spec: &ListSpec, request: &QueryRequest) -> Result<ListPlan, AppError> {
        ListPlan::resolve(spec, request, &self.settings)
    }

    /// Always returns the `{data, pagination}` envelope, ignoring `is_pagination`.
    pub async fn paginate(
        &self,
        pool: &PgPool,
        base: &BaseQuery,
        request: &QueryRequest,
        spec: &ListSpec,
    ) -> Result<Page<Value>, AppError> {
        let plan = self.plan(spec, request)?;
        self.fetch_page(pool, base, &plan).await
    }

    /// Envelope or bare rows, per the request's `is_pagination` or the entity default.
    pub async fn list(
        &self,
        pool: &PgPool,
        base: &BaseQuery,
        request: &QueryRequest,
        spec: &ListSpec,
    ) -> Result<ListOutcome<Value>, AppError> {
        let plan = self.plan(spec, request)?;
        if plan.paginate {
            Ok(ListOutcome::Paginated(self.fetch_page(pool, base, &plan).await?))
        } else {
            let q = select_all(base, &plan);
            Ok(ListOutcome::Raw(query_many(pool, &q).await?))
        }
    }

    async fn fetch_page(&self, pool: &PgPool, base: &BaseQuery, plan: &ListPlan) -> Result<Page<Value>, AppError> {
        let window = plan.window();
        let (data, total) = match self.settings.count_strategy {
            CountStrategy::Separate => {
                let total = count(pool, &select_count(base, plan)).await?;
                let data = query_many(pool, &select_page(base, plan, window, false)).await?;
                (data, total)
            }
            CountStrategy::Window => {
                let mut data = query_many(pool, &select_page(base, plan, window, true)).await?;
                let mut total = None;
                for row in &mut data {
                    total = take_total(row, TOTAL_COLUMN).or(total);
                }
                let total = match total {
                    Some(n) => n,
                    None if window.offset == 0 => 0,
                    // Past the last page no row carries the count.
                    None => count(pool, &select_count(base, plan)).await?,
                };
                (data, total)
            }
        };
        Ok(Page {
            data,
            pagination: PaginationResult::compute(total, plan.page, plan.limit),
        })
    }
}

async fn count(pool: &PgPool, q: &QueryBuf) -> Result<u64, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    let n = query.fetch_one(pool).await?;
    Ok(u64::try_from(n).unwrap_or(0))
}

async fn query_many(pool: &PgPool, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows.iter().map(row_to_json).collect())
}
