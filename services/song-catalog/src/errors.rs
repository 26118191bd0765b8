//!
//! src/errors.rs  Andrew Belles  Oct 19th, 2026
//!
//! Defines enums and methods of error conversion
//! for errors the catalog uses, and how each one is surfaced over http
//!
//!

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("config error: {0}")]
    Config(String),
    #[error("bad request: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("not acceptable: {0}")]
    Rejected(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("db error: {0}")]
    Db(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error)
}

impl CatalogError {
    pub fn status(&self) -> StatusCode {
        match self {
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_)   => StatusCode::NOT_FOUND,
            CatalogError::Upstream(_) | CatalogError::Rejected(_) => StatusCode::NOT_ACCEPTABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self { CatalogError::Http(e.to_string()) }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self { CatalogError::Parse(e.to_string()) }
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self { CatalogError::Db(e.to_string()) }
}

/// Every error leaving a handler is logged once here, then written back
/// to the caller as a plain text body
impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "http.error");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "http.reject");
        }

        let body = match &self {
            CatalogError::Validation(_) => "Bad request",
            CatalogError::NotFound(_)   => "Not found",
            CatalogError::Upstream(_) | CatalogError::Rejected(_) => "Not acceptable",
            _ => "Internal Server Error"
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(CatalogError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(CatalogError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(CatalogError::Upstream("x".into()).status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(CatalogError::Rejected("x".into()).status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(CatalogError::Db("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(CatalogError::Config("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn upstream_failure_body_is_not_acceptable() {
        let response = CatalogError::Upstream("503".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Not acceptable");
    }
}
