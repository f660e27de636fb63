//! Auth routes for Google sign-in and user info

use axum::{
    Json,
    extract::{Extension, Query, State, rejection::JsonRejection},
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use url::Url;
use uuid::Uuid;

use crate::auth::google::decode_id_token;
use crate::auth::models::{AuthUser, CallbackQuery, CredentialRequest, GoogleProfile, TokenResponse};
use crate::database::User;
use crate::error::AppError;
use crate::server::AppState;

const STATE_COOKIE: &str = "oauth_state";

/// GET /auth/google/login
///
/// Stores a random state in a short-lived cookie and redirects to Google.
pub async fn google_login(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let state = Uuid::new_v4().to_string();
    let auth_url = app_state.google.authorization_url(&state)?;

    let cookie = Cookie::build((STATE_COOKIE, state))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(5));

    tracing::info!("Starting Google OAuth flow");
    Ok((jar.add(cookie), Redirect::temporary(auth_url.as_str())))
}

/// GET /auth/google/callback
///
/// Server-side flow: verify state, exchange the code, then send the browser
/// back to the frontend with a session token.
pub async fn google_callback(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<(CookieJar, Redirect), AppError> {
    if let Some(error) = query.error {
        return Err(AppError::Validation(format!("Google sign-in failed: {error}")));
    }

    let state = query
        .state
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("State parameter missing".to_string()))?;
    let expected = jar
        .get(STATE_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Validation("State cookie missing".to_string()))?;
    if expected != state {
        tracing::warn!("OAuth state mismatch");
        return Err(AppError::Validation("State mismatch".to_string()));
    }
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Authorization code missing".to_string()))?;

    let access_token = app_state.google.exchange_code(&code).await?;
    let profile = app_state.google.fetch_profile(&access_token).await?;
    let (token, _) = sign_in(&app_state, profile).await?;

    let mut target = Url::parse(app_state.google.frontend_url())
        .map_err(|e| AppError::Internal(format!("Invalid FRONTEND_URL: {e}")))?;
    target.query_pairs_mut().append_pair("token", &token);

    Ok((jar, Redirect::temporary(target.as_str())))
}

/// POST /auth/google/callback
///
/// Client-side flow: the Google Sign-In button hands us an ID token.
pub async fn google_credential_callback(
    State(app_state): State<AppState>,
    payload: Result<Json<CredentialRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(request) = payload?;
    if request.credential.trim().is_empty() {
        return Err(AppError::Validation("Missing credential".to_string()));
    }

    let profile = decode_id_token(request.credential.trim())?;
    let (token, user) = sign_in(&app_state, profile).await?;

    Ok(Json(TokenResponse::new(
        token,
        app_state.jwt_service.ttl_seconds(),
        user,
    )))
}

/// GET /api/me
pub async fn me(
    State(app_state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    tracing::debug!(user_id = %auth_user.id, email = %auth_user.email, "Loading current user");
    let user = app_state.users.get_user(&auth_user.id).await?;
    Ok(Json(user))
}

async fn sign_in(app_state: &AppState, profile: GoogleProfile) -> Result<(String, User), AppError> {
    let user = app_state
        .users
        .upsert_google_user(&profile.sub, &profile.email, &profile.name)
        .await?;
    let token = app_state.jwt_service.issue(&user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "User signed in with Google");
    Ok((token, user))
}
