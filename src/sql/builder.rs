//! Builds parameterized list and count queries around a base query.

use crate::list::{ListPlan, PageWindow};
use crate::sql::{BaseQuery, ColumnKind, ColumnRef, PgBindValue};

/// Alias of the wrapped base query.
const BASE_ALIAS: &str = "base";
/// Window-count column; stripped from rows before they are returned.
pub(crate) const TOTAL_COLUMN: &str = "__total_record";

#[derive(Clone, Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    /// Starts with the base query's parameters so new placeholders continue after them.
    fn over(base: &BaseQuery) -> Self {
        QueryBuf {
            sql: String::new(),
            params: base.params().to_vec(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Searched columns are always compared as text; enum columns are `Text`-kinded too.
fn search_expr(column: &ColumnRef) -> String {
    format!("{}::text", column.qualified(BASE_ALIAS))
}

/// WHERE clause for search (OR across columns) AND filter (equality).
fn where_clause(q: &mut QueryBuf, plan: &ListPlan) -> String {
    let mut parts = Vec::new();
    if let Some(search) = &plan.search {
        let n = q.push_param(PgBindValue::String(search.pattern.clone()));
        let ors: Vec<String> = search
            .columns
            .iter()
            .map(|c| format!("{} ILIKE ${} ESCAPE '\\'", search_expr(c), n))
            .collect();
        parts.push(format!("({})", ors.join(" OR ")));
    }
    if let Some(filter) = &plan.filter {
        let n = q.push_param(filter.value.clone());
        let col = filter.column.qualified(BASE_ALIAS);
        let clause = match filter.column.kind() {
            ColumnKind::Timestamp => format!("{} = ${}::timestamptz", col, n),
            ColumnKind::Date => format!("{} = ${}::date", col, n),
            // Numeric columns may already be selected as text.
            ColumnKind::Numeric => format!("{}::numeric = ${}::numeric", col, n),
            ColumnKind::Text => format!("{}::text = ${}", col, n),
            _ => format!("{} = ${}", col, n),
        };
        parts.push(clause);
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// Numeric columns sort by value even when the base selects them as text.
fn sort_expr(column: &ColumnRef) -> String {
    match column.kind() {
        ColumnKind::Numeric => format!("{}::numeric", column.qualified(BASE_ALIAS)),
        _ => column.qualified(BASE_ALIAS),
    }
}

fn order_clause(plan: &ListPlan) -> String {
    let mut keys = vec![format!("{} {}", sort_expr(&plan.order.column), plan.order.order.as_sql())];
    if let Some(pk) = &plan.order.tie_break {
        keys.push(format!("{} ASC", pk.qualified(BASE_ALIAS)));
    }
    format!(" ORDER BY {}", keys.join(", "))
}

fn from_clause(base: &BaseQuery) -> String {
    format!(" FROM ({}) AS \"{}\"", base.sql(), BASE_ALIAS)
}

/// COUNT of rows matching search and filter, ignoring paging.
pub fn select_count(base: &BaseQuery, plan: &ListPlan) -> QueryBuf {
    let mut q = QueryBuf::over(base);
    let where_ = where_clause(&mut q, plan);
    q.sql = format!("SELECT COUNT(*) AS \"total_record\"{}{}", from_clause(base), where_);
    q
}

/// One page of matching rows. With `with_total`, each row carries the full match count.
pub fn select_page(base: &BaseQuery, plan: &ListPlan, window: PageWindow, with_total: bool) -> QueryBuf {
    let mut q = QueryBuf::over(base);
    let where_ = where_clause(&mut q, plan);
    let total = if with_total {
        format!(", COUNT(*) OVER () AS \"{}\"", TOTAL_COLUMN)
    } else {
        String::new()
    };
    q.sql = format!(
        "SELECT \"{}\".*{}{}{}{} LIMIT {} OFFSET {}",
        BASE_ALIAS,
        total,
        from_clause(base),
        where_,
        order_clause(plan),
        window.limit,
        window.offset
    );
    q
}

/// All matching rows, sorted, no paging.
pub fn select_all(base: &BaseQuery, plan: &ListPlan) -> QueryBuf {
    let mut q = QueryBuf::over(base);
    let where_ = where_clause(&mut q, plan);
    q.sql = format!(
        "SELECT \"{}\".*{}{}{}",
        BASE_ALIAS,
        from_clause(base),
        where_,
        order_clause(plan)
    );
    q
}
