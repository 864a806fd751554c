use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::features::records::store::StoreError;
use crate::shared::templates::{render_template, TemplateError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upload storage error: {0}")]
    Storage(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorPage<'a> {
    status: u16,
    title: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Store(StoreError::Unavailable(ref msg)) => {
                tracing::warn!("Record store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "The record database is currently unavailable".to_string(),
                )
            }
            AppError::Store(ref e) => {
                tracing::error!("Record store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Storage(ref msg) => {
                tracing::error!("Upload storage error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "The uploaded file could not be stored".to_string(),
                )
            }
            AppError::Template(ref e) => {
                tracing::error!("Template error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let page = ErrorPage {
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error"),
            message,
        };

        // Template failures must not recurse into another template render
        match render_template("error.html", &page) {
            Ok(body) => (status, Html(body)).into_response(),
            Err(_) => (status, page.message).into_response(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
