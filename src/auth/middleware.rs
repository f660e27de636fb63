//! Authentication Middleware
//!
//! Axum middleware for session token validation and user authentication.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::{jwt::JwtService, models::AuthUser};
use crate::error::AppError;

/// Authentication middleware that validates bearer tokens and injects user info
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Middleware function for validating bearer tokens
    pub async fn validate_token(
        State(jwt_service): State<Arc<JwtService>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, AppError> {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);

        let Some(token) = token else {
            tracing::warn!("[AuthMiddleware] Missing bearer token for {} {}", req.method(), req.uri());
            return Err(AppError::Unauthorized("missing bearer token".to_string()));
        };

        let claims = jwt_service.validate(&token).map_err(|e| {
            tracing::warn!("[AuthMiddleware] Token rejected for {}: {}", req.uri(), e);
            e
        })?;
        tracing::debug!("[AuthMiddleware] Authenticated user {}", claims.sub);

        req.extensions_mut().insert(AuthUser {
            id: claims.sub,
            email: claims.email,
        });

        Ok(next.run(req).await)
    }
}

fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
