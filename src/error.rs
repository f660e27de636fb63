//! # Error Module
//!
//! Application error taxonomy and its mapping onto HTTP responses.

use std::fmt;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Entity kinds that can be missing from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    MealPlan,
    Meal,
    ShareLink,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "User",
            Entity::MealPlan => "Meal plan",
            Entity::Meal => "Meal",
            Entity::ShareLink => "Share link",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("Share link has expired")]
    Expired,

    #[error("Cannot share with yourself")]
    SelfShare,

    #[error("You already own this meal plan")]
    AlreadyOwner,

    #[error("You already have access to this meal plan")]
    AlreadyMember,

    #[error("Identity provider error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Upstream(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::Expired => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SelfShare | AppError::AlreadyOwner | AppError::AlreadyMember => {
                StatusCode::BAD_REQUEST
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error while handling request");
                "Internal server error".to_string()
            }
            AppError::Upstream(detail) => {
                tracing::warn!(error = %detail, "Identity provider call failed");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}
