//! Extract a validated list request from the query string.

use crate::error::AppError;
use crate::list::QueryRequest;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use std::collections::HashMap;

/// `?page=&limit=&q=&sort=&orderby=&field_name=&field_value=&is_pagination=`.
/// Malformed numbers reject the request with 400 before any handler code runs.
#[derive(Clone, Debug)]
pub struct ListParams(pub QueryRequest);

#[async_trait]
impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::invalid_param("query", e.body_text()))?;
        Ok(ListParams(QueryRequest::from_params(&params)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(uri: &str) -> Result<ListParams, AppError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        ListParams::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn parses_query_string() {
        let ListParams(req) = extract("/bills?page=2&limit=5&q=ana%20m&orderby=asc").await.unwrap();
        assert_eq!(req.page, 2);
        assert_eq!(req.limit, Some(5));
        assert_eq!(req.q.as_deref(), Some("ana m"));
    }

    #[tokio::test]
    async fn bad_limit_is_rejected() {
        let err = extract("/bills?limit=abc").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidQueryParameter { name: "limit", .. }));
    }

    #[tokio::test]
    async fn no_query_string_means_defaults() {
        let ListParams(req) = extract("/bills").await.unwrap();
        assert_eq!(req, QueryRequest::default());
    }
}
