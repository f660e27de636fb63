//! Repository traits the rest of the server is written against.

use async_trait::async_trait;

use crate::database::models::{Meal, MealFields, MealPlan, MealPlanAccess, ShareLink, User};
use crate::error::AppError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create the user on first login, refresh email and name afterwards
    async fn upsert_google_user(
        &self,
        external_id: &str,
        email: &str,
        name: &str,
    ) -> Result<User, AppError>;

    async fn get_user(&self, id: &str) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<User, AppError>;
}

#[async_trait]
pub trait MealPlanRepository: Send + Sync {
    async fn create_meal_plan(&self, plan: MealPlan) -> Result<MealPlan, AppError>;

    async fn get_meal_plan(&self, id: &str) -> Result<MealPlan, AppError>;

    /// Overwrites name and description only
    async fn update_meal_plan(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<MealPlan, AppError>;

    /// Removes the plan record. Meals, grants and links are left in place.
    async fn delete_meal_plan(&self, id: &str) -> Result<(), AppError>;

    async fn list_meal_plans_created_by(&self, user_id: &str) -> Result<Vec<MealPlan>, AppError>;

    /// Plans for the given ids; unknown ids are skipped
    async fn list_meal_plans_by_ids(&self, ids: &[String]) -> Result<Vec<MealPlan>, AppError>;
}

#[async_trait]
pub trait MealRepository: Send + Sync {
    async fn create_meal(&self, meal: Meal) -> Result<Meal, AppError>;

    async fn get_meal(&self, id: &str) -> Result<Meal, AppError>;

    /// Overwrites name, description, day and meal type only
    async fn update_meal(&self, id: &str, fields: &MealFields) -> Result<Meal, AppError>;

    async fn delete_meal(&self, id: &str) -> Result<(), AppError>;

    async fn list_meals_by_plan(&self, meal_plan_id: &str) -> Result<Vec<Meal>, AppError>;
}

#[async_trait]
pub trait AccessRepository: Send + Sync {
    async fn insert_access(&self, access: MealPlanAccess) -> Result<MealPlanAccess, AppError>;

    /// Stores the grant unless the user already holds one on the plan.
    /// Returns whether it was stored.
    async fn insert_access_if_absent(&self, access: MealPlanAccess) -> Result<bool, AppError>;

    async fn list_access_for_plan(
        &self,
        meal_plan_id: &str,
    ) -> Result<Vec<MealPlanAccess>, AppError>;

    async fn list_access_for_user(&self, user_id: &str) -> Result<Vec<MealPlanAccess>, AppError>;
}

#[async_trait]
pub trait ShareLinkRepository: Send + Sync {
    /// Stores the link unless its code is taken. Returns whether it was stored.
    async fn insert_share_link(&self, link: ShareLink) -> Result<bool, AppError>;

    async fn get_share_link(&self, code: &str) -> Result<ShareLink, AppError>;
}
