//! Error taxonomy shared by the fetcher, extractor, store and handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Errors raised by a [`crate::repository::Repository`].
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("migration error: {0}")]
    Migration(#[from] refinery::Error),

    #[error("duplicate key: {field} '{value}' already exists")]
    DuplicateKey { field: &'static str, value: String },

    #[error("invalid id '{0}'")]
    InvalidId(String),

    #[error("store is unavailable")]
    Unavailable,

    #[error("default user '{0}' does not exist")]
    MissingDefaultUser(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    /// The page could not be fetched (DNS, connect, timeout, non-2xx)
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Persist(#[from] PersistError),
}

impl AppError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TransportError",
            Self::Parse(_) => "ParseError",
            Self::Persist(_) => "PersistError",
        }
    }
}

/// JSON body written for every failed request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error kind: `TransportError`, `ParseError` or `PersistError`
    pub name: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            name: err.name().to_string(),
            message: err.to_string(),
        }
    }
}

// Failures are reported in the body only; clients tell them apart by shape.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(ErrorResponse::from(&self))).into_response()
    }
}
