//! Planner Service
//!
//! Meal plan and meal CRUD, with every call checked against the access ledger.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::access::{AccessLedger, Action};
use crate::database::{Meal, MealFields, MealPlan, MealPlanRepository, MealRepository, Role};
use crate::error::AppError;

#[derive(Clone)]
pub struct PlannerService {
    plans: Arc<dyn MealPlanRepository>,
    meals: Arc<dyn MealRepository>,
    ledger: AccessLedger,
}

impl PlannerService {
    pub fn new(
        plans: Arc<dyn MealPlanRepository>,
        meals: Arc<dyn MealRepository>,
        ledger: AccessLedger,
    ) -> Self {
        Self {
            plans,
            meals,
            ledger,
        }
    }

    pub fn ledger(&self) -> &AccessLedger {
        &self.ledger
    }

    pub async fn list_meal_plans(&self, user_id: &str) -> Result<Vec<MealPlan>, AppError> {
        self.ledger.list_accessible_plans(user_id).await
    }

    /// Create a plan owned by `user_id` and record the owner grant
    pub async fn create_meal_plan(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<MealPlan, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Meal plan name is required".to_string()));
        }

        let now = Utc::now();
        let plan = self
            .plans
            .create_meal_plan(MealPlan {
                id: Uuid::new_v4().to_string(),
                name: name.trim().to_string(),
                description: description.to_string(),
                created_by: user_id.to_string(),
                created_at: now,
                updated_at: now,
            })
            .await?;

        // a failure here still leaves the creator as owner through created_by
        self.ledger.grant_access(user_id, &plan.id, Role::Owner).await?;
        tracing::info!(meal_plan_id = %plan.id, user_id, "Created meal plan");
        Ok(plan)
    }

    pub async fn get_meal_plan(&self, user_id: &str, id: &str) -> Result<MealPlan, AppError> {
        self.ledger.authorize(user_id, id, Action::Read).await
    }

    pub async fn update_meal_plan(
        &self,
        user_id: &str,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<MealPlan, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Meal plan name is required".to_string()));
        }
        self.ledger.authorize(user_id, id, Action::Write).await?;
        self.plans.update_meal_plan(id, name.trim(), description).await
    }

    /// Deletes the plan record only; its meals, grants and links stay behind
    pub async fn delete_meal_plan(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.ledger.authorize(user_id, id, Action::Delete).await?;
        self.plans.delete_meal_plan(id).await?;
        tracing::info!(meal_plan_id = id, user_id, "Deleted meal plan");
        Ok(())
    }

    pub async fn list_meals(&self, user_id: &str, meal_plan_id: &str) -> Result<Vec<Meal>, AppError> {
        self.ledger.authorize(user_id, meal_plan_id, Action::Read).await?;
        self.meals.list_meals_by_plan(meal_plan_id).await
    }

    pub async fn create_meal(
        &self,
        user_id: &str,
        meal_plan_id: &str,
        fields: MealFields,
    ) -> Result<Meal, AppError> {
        fields.validate()?;
        self.ledger.authorize(user_id, meal_plan_id, Action::Write).await?;

        let now = Utc::now();
        let meal = self
            .meals
            .create_meal(Meal {
                id: Uuid::new_v4().to_string(),
                meal_plan_id: meal_plan_id.to_string(),
                name: fields.name,
                description: fields.description,
                day: fields.day,
                meal_type: fields.meal_type,
                created_at: now,
                updated_at: now,
            })
            .await?;
        tracing::info!(meal_id = %meal.id, meal_plan_id, "Created meal");
        Ok(meal)
    }

    pub async fn get_meal(&self, user_id: &str, id: &str) -> Result<Meal, AppError> {
        let meal = self.meals.get_meal(id).await?;
        self.ledger.authorize(user_id, &meal.meal_plan_id, Action::Read).await?;
        Ok(meal)
    }

    pub async fn update_meal(
        &self,
        user_id: &str,
        id: &str,
        fields: MealFields,
    ) -> Result<Meal, AppError> {
        fields.validate()?;
        let meal = self.meals.get_meal(id).await?;
        self.ledger.authorize(user_id, &meal.meal_plan_id, Action::Write).await?;
        self.meals.update_meal(id, &fields).await
    }

    pub async fn delete_meal(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let meal = self.meals.get_meal(id).await?;
        self.ledger.authorize(user_id, &meal.meal_plan_id, Action::Write).await?;
        self.meals.delete_meal(id).await
    }
}
