//! Resolve a request against an entity's capabilities before any SQL is written.

use crate::error::AppError;
use crate::list::{ListSpec, PageWindow, QueryRequest, SortOrder};
use crate::settings::ListSettings;
use crate::sql::{ColumnRef, PgBindValue};

/// Case-insensitive substring match of one term across several columns.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchClause {
    pub columns: Vec<ColumnRef>,
    /// `%term%` with LIKE metacharacters escaped.
    pub pattern: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterClause {
    pub column: ColumnRef,
    pub value: PgBindValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderClause {
    pub column: ColumnRef,
    pub order: SortOrder,
    /// Primary key, ascending; None when already sorting by it.
    pub tie_break: Option<ColumnRef>,
}

/// Everything the SQL builder needs; all column references are allow-listed.
#[derive(Clone, Debug, PartialEq)]
pub struct ListPlan {
    pub search: Option<SearchClause>,
    pub filter: Option<FilterClause>,
    pub order: OrderClause,
    pub page: u32,
    pub limit: u32,
    pub paginate: bool,
}

impl ListPlan {
    pub fn resolve(spec: &ListSpec, request: &QueryRequest, settings: &ListSettings) -> Result<Self, AppError> {
        let search = request
            .q
            .as_deref()
            .filter(|_| !spec.searchable_columns().is_empty())
            .map(|term| SearchClause {
                columns: spec.searchable_columns().to_vec(),
                pattern: format!("%{}%", escape_like(term)),
            });

        let filter = match &request.filter {
            Some((name, raw)) => match spec.filter_column(name) {
                Some(column) => Some(FilterClause {
                    column: column.clone(),
                    value: PgBindValue::for_column(column, raw)?,
                }),
                None => {
                    tracing::warn!(field_name = %name, "filter on undeclared column ignored");
                    None
                }
            },
            None => None,
        };

        let column = match request.sort.as_deref() {
            Some(name) => spec.sort_column(name).unwrap_or_else(|| {
                tracing::debug!(sort = %name, "sort on undeclared column, using default");
                spec.default_sort()
            }),
            None => spec.default_sort(),
        };
        let tie_break = (column.name() != spec.primary_key().name()).then(|| spec.primary_key().clone());

        let limit = request
            .limit
            .or(spec.limit_default())
            .unwrap_or(settings.default_limit)
            .min(settings.max_limit)
            .max(1);

        Ok(ListPlan {
            search,
            filter,
            order: OrderClause {
                column: column.clone(),
                order: request.order,
                tie_break,
            },
            page: request.page.max(1),
            limit,
            paginate: request.paginate.unwrap_or(spec.pagination_default()),
        })
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.page, self.limit)
    }
}

/// Escape `\`, `%` and `_` so the term matches literally under `ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
