//! # Meal Routes
//!
//! Meals are always reached through their plan: every handler checks the
//! caller's role on the owning plan before touching the meal.

use axum::{
    Json,
    extract::{Extension, Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use crate::auth::models::AuthUser;
use crate::database::{Meal, MealFields};
use crate::error::AppError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealsQuery {
    pub meal_plan_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMealRequest {
    #[serde(default)]
    pub meal_plan_id: String,
    #[serde(default)]
    pub meal: MealFields,
}

/// GET /api/meals?mealPlanId=
pub async fn list_meals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MealsQuery>,
) -> Result<Json<Vec<Meal>>, AppError> {
    let meal_plan_id = query
        .meal_plan_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Meal plan ID is required".to_string()))?;

    Ok(Json(state.planner.list_meals(&user.id, &meal_plan_id).await?))
}

/// POST /api/meals
pub async fn create_meal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateMealRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Meal>), AppError> {
    let Json(request) = payload?;
    if request.meal_plan_id.is_empty() {
        return Err(AppError::Validation("Meal plan ID is required".to_string()));
    }

    let meal = state
        .planner
        .create_meal(&user.id, &request.meal_plan_id, request.meal)
        .await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

/// GET /api/meals/{id}
pub async fn get_meal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Meal>, AppError> {
    Ok(Json(state.planner.get_meal(&user.id, &id).await?))
}

/// PUT /api/meals/{id}
pub async fn update_meal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<MealFields>, JsonRejection>,
) -> Result<Json<Meal>, AppError> {
    let Json(fields) = payload?;
    Ok(Json(state.planner.update_meal(&user.id, &id, fields).await?))
}

/// DELETE /api/meals/{id}
pub async fn delete_meal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.planner.delete_meal(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
