//! # Meal Plan Routes
//!
//! CRUD over meal plans plus the two ways of sharing one: a direct grant by
//! email, and a share link redeemed with `/join`.
//!
//! All endpoints sit behind the bearer-token middleware.

use axum::{
    Json,
    extract::{Extension, Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::auth::models::AuthUser;
use crate::database::{MealPlan, Role};
use crate::error::AppError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct MealPlanRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    #[serde(default)]
    pub meal_plan_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLinkRequest {
    #[serde(default)]
    pub meal_plan_id: String,
    pub role: Option<String>,
    /// Hours until the link expires
    pub expires_in: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLinkResponse {
    pub share_link: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub message: String,
    pub meal_plan: MealPlan,
    pub role: Role,
}

/// GET /api/meal-plans
pub async fn list_meal_plans(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<MealPlan>>, AppError> {
    let plans = state.planner.list_meal_plans(&user.id).await?;
    Ok(Json(plans))
}

/// POST /api/meal-plans
pub async fn create_meal_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<MealPlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MealPlan>), AppError> {
    let Json(request) = payload?;
    let plan = state
        .planner
        .create_meal_plan(&user.id, &request.name, &request.description)
        .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// GET /api/meal-plans/{id}
pub async fn get_meal_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MealPlan>, AppError> {
    Ok(Json(state.planner.get_meal_plan(&user.id, &id).await?))
}

/// PUT /api/meal-plans/{id}
pub async fn update_meal_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<MealPlanRequest>, JsonRejection>,
) -> Result<Json<MealPlan>, AppError> {
    let Json(request) = payload?;
    let plan = state
        .planner
        .update_meal_plan(&user.id, &id, &request.name, &request.description)
        .await?;
    Ok(Json(plan))
}

/// DELETE /api/meal-plans/{id}
pub async fn delete_meal_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.planner.delete_meal_plan(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/meal-plans/share
pub async fn share_meal_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ShareRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;
    if request.meal_plan_id.is_empty() || request.email.trim().is_empty() {
        return Err(AppError::Validation(
            "Meal plan ID and email are required".to_string(),
        ));
    }

    state
        .planner
        .ledger()
        .share_with_user(&request.meal_plan_id, &user.id, &request.email, &request.role)
        .await?;

    Ok(Json(json!({ "message": "Meal plan shared successfully" })))
}

/// POST /api/meal-plans/generate-link
pub async fn generate_share_link(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<GenerateLinkRequest>, JsonRejection>,
) -> Result<Json<GenerateLinkResponse>, AppError> {
    let Json(request) = payload?;
    if request.meal_plan_id.is_empty() {
        return Err(AppError::Validation("Meal plan ID is required".to_string()));
    }

    let link = state
        .planner
        .ledger()
        .create_share_link(
            &request.meal_plan_id,
            &user.id,
            request.role.as_deref(),
            request.expires_in,
        )
        .await?;

    let share_link = format!(
        "{}/join?code={}",
        state.google.frontend_url().trim_end_matches('/'),
        link.code
    );
    Ok(Json(GenerateLinkResponse {
        share_link,
        code: link.code,
        expires_at: link.expires_at,
    }))
}

/// POST /api/meal-plans/join
pub async fn join_meal_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<JoinResponse>, AppError> {
    let Json(request) = payload?;
    if request.code.trim().is_empty() {
        return Err(AppError::Validation("Share code is required".to_string()));
    }

    let (meal_plan, role) = state
        .planner
        .ledger()
        .redeem_share_link(&request.code, &user.id)
        .await?;

    Ok(Json(JoinResponse {
        message: "Successfully joined meal plan".to_string(),
        meal_plan,
        role,
    }))
}
