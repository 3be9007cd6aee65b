//! Standard response envelope helpers.

use crate::list::PaginationResult;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{ "data": [...], "pagination": {...} }`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationResult,
}

/// A list response: enveloped when paginated, a bare array when `is_pagination=false`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListOutcome<T> {
    Paginated(Page<T>),
    Raw(Vec<T>),
}

impl<T> ListOutcome<T> {
    pub fn rows_mut(&mut self) -> &mut [T] {
        match self {
            ListOutcome::Paginated(page) => &mut page.data,
            ListOutcome::Raw(rows) => rows,
        }
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ListOutcome<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data }))
}
