//! Client query-string parameters, validated into a typed request.

use crate::error::AppError;
use std::collections::HashMap;

/// Sort direction; anything unrecognised falls back to descending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated list request. Column names in `sort` and `filter` are still untrusted;
/// they are resolved against the entity's allow-lists when the plan is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRequest {
    pub page: u32,
    /// None means "use the entity or engine default".
    pub limit: Option<u32>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: SortOrder,
    pub filter: Option<(String, String)>,
    /// Explicit `is_pagination`; None defers to the entity default.
    pub paginate: Option<bool>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        QueryRequest {
            page: 1,
            limit: None,
            q: None,
            sort: None,
            order: SortOrder::Desc,
            filter: None,
            paginate: None,
        }
    }
}

impl QueryRequest {
    /// Parse raw query-string pairs. Unknown keys are ignored; empty values count as absent.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let get = |k: &str| params.get(k).map(|v| v.trim()).filter(|v| !v.is_empty());

        let page = match get("page") {
            Some(v) => parse_positive("page", v)?,
            None => 1,
        };
        let limit = get("limit").map(|v| parse_positive("limit", v)).transpose()?;
        let paginate = match get("is_pagination") {
            None => None,
            Some(v) if v.eq_ignore_ascii_case("true") => Some(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Some(false),
            Some(v) => {
                return Err(AppError::invalid_param(
                    "is_pagination",
                    format!("expected \"true\" or \"false\", got '{}'", v),
                ))
            }
        };
        let filter = match (get("field_name"), get("field_value")) {
            (Some(name), Some(value)) => Some((name.to_string(), value.to_string())),
            _ => None,
        };

        Ok(QueryRequest {
            page,
            limit,
            q: get("q").map(str::to_string),
            sort: get("sort").map(str::to_string),
            order: get("orderby").map(SortOrder::parse_lenient).unwrap_or_default(),
            filter,
            paginate,
        })
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u32, AppError> {
    let n: i64 = raw
        .parse()
        .map_err(|_| AppError::invalid_param(name, format!("'{}' is not an integer", raw)))?;
    if n < 1 {
        return Err(AppError::invalid_param(name, "must be at least 1"));
    }
    u32::try_from(n).map_err(|_| AppError::invalid_param(name, "too large"))
}
