// In-memory store
//
// Every table sits behind its own reader/writer lock. Locks are never held
// across an await point.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::database::models::{Meal, MealFields, MealPlan, MealPlanAccess, ShareLink, User};
use crate::database::repository::{
    AccessRepository, MealPlanRepository, MealRepository, ShareLinkRepository, UserRepository,
};
use crate::error::{AppError, Entity};

#[derive(Debug, Default)]
struct UserTable {
    by_id: HashMap<String, User>,
    /// Google subject -> user id
    by_external_id: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct AccessTable {
    /// Grants keyed by plan id, in insertion order
    by_plan: HashMap<String, Vec<MealPlanAccess>>,
    /// Grants keyed by user id, in insertion order
    by_user: HashMap<String, Vec<MealPlanAccess>>,
}

impl AccessTable {
    fn push(&mut self, access: MealPlanAccess) {
        self.by_plan
            .entry(access.meal_plan_id.clone())
            .or_default()
            .push(access.clone());
        self.by_user
            .entry(access.user_id.clone())
            .or_default()
            .push(access);
    }
}

/// Process-local store implementing every repository trait
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<UserTable>,
    meal_plans: RwLock<HashMap<String, MealPlan>>,
    meals: RwLock<HashMap<String, Meal>>,
    access: RwLock<AccessTable>,
    share_links: RwLock<HashMap<String, ShareLink>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn upsert_google_user(
        &self,
        external_id: &str,
        email: &str,
        name: &str,
    ) -> Result<User, AppError> {
        let mut users = self.users.write();

        if let Some(id) = users.by_external_id.get(external_id).cloned() {
            let user = users
                .by_id
                .get_mut(&id)
                .ok_or_else(|| AppError::Internal(format!("dangling identity for {id}")))?;
            user.email = email.to_string();
            user.name = name.to_string();
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            external_id: external_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        };
        users
            .by_external_id
            .insert(external_id.to_string(), user.id.clone());
        users.by_id.insert(user.id.clone(), user.clone());
        tracing::info!(user_id = %user.id, "Created user on first login");
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<User, AppError> {
        self.users
            .read()
            .by_id
            .get(id)
            .cloned()
            .ok_or(AppError::NotFound(Entity::User))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, AppError> {
        let email = email.trim();
        self.users
            .read()
            .by_id
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or(AppError::NotFound(Entity::User))
    }
}

#[async_trait]
impl MealPlanRepository for MemoryStore {
    async fn create_meal_plan(&self, plan: MealPlan) -> Result<MealPlan, AppError> {
        let mut plans = self.meal_plans.write();
        if plans.contains_key(&plan.id) {
            return Err(AppError::Internal(format!("duplicate meal plan id {}", plan.id)));
        }
        plans.insert(plan.id.clone(), plan.clone());
        Ok(plan)
    }

    async fn get_meal_plan(&self, id: &str) -> Result<MealPlan, AppError> {
        self.meal_plans
            .read()
            .get(id)
            .cloned()
            .ok_or(AppError::NotFound(Entity::MealPlan))
    }

    async fn update_meal_plan(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<MealPlan, AppError> {
        let mut plans = self.meal_plans.write();
        let plan = plans.get_mut(id).ok_or(AppError::NotFound(Entity::MealPlan))?;
        plan.name = name.to_string();
        plan.description = description.to_string();
        plan.updated_at = Utc::now();
        Ok(plan.clone())
    }

    async fn delete_meal_plan(&self, id: &str) -> Result<(), AppError> {
        self.meal_plans
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or(AppError::NotFound(Entity::MealPlan))
    }

    async fn list_meal_plans_created_by(&self, user_id: &str) -> Result<Vec<MealPlan>, AppError> {
        Ok(self
            .meal_plans
            .read()
            .values()
            .filter(|p| p.created_by == user_id)
            .cloned()
            .collect())
    }

    async fn list_meal_plans_by_ids(&self, ids: &[String]) -> Result<Vec<MealPlan>, AppError> {
        let plans = self.meal_plans.read();
        Ok(ids.iter().filter_map(|id| plans.get(id).cloned()).collect())
    }
}

#[async_trait]
impl MealRepository for MemoryStore {
    async fn create_meal(&self, meal: Meal) -> Result<Meal, AppError> {
        let mut meals = self.meals.write();
        if meals.contains_key(&meal.id) {
            return Err(AppError::Internal(format!("duplicate meal id {}", meal.id)));
        }
        meals.insert(meal.id.clone(), meal.clone());
        Ok(meal)
    }

    async fn get_meal(&self, id: &str) -> Result<Meal, AppError> {
        self.meals
            .read()
            .get(id)
            .cloned()
            .ok_or(AppError::NotFound(Entity::Meal))
    }

    async fn update_meal(&self, id: &str, fields: &MealFields) -> Result<Meal, AppError> {
        let mut meals = self.meals.write();
        let meal = meals.get_mut(id).ok_or(AppError::NotFound(Entity::Meal))?;
        meal.name = fields.name.clone();
        meal.description = fields.description.clone();
        meal.day = fields.day.clone();
        meal.meal_type = fields.meal_type.clone();
        meal.updated_at = Utc::now();
        Ok(meal.clone())
    }

    async fn delete_meal(&self, id: &str) -> Result<(), AppError> {
        self.meals
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or(AppError::NotFound(Entity::Meal))
    }

    async fn list_meals_by_plan(&self, meal_plan_id: &str) -> Result<Vec<Meal>, AppError> {
        let mut meals: Vec<Meal> = self
            .meals
            .read()
            .values()
            .filter(|m| m.meal_plan_id == meal_plan_id)
            .cloned()
            .collect();
        meals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(meals)
    }
}

#[async_trait]
impl AccessRepository for MemoryStore {
    async fn insert_access(&self, access: MealPlanAccess) -> Result<MealPlanAccess, AppError> {
        self.access.write().push(access.clone());
        Ok(access)
    }

    async fn insert_access_if_absent(&self, access: MealPlanAccess) -> Result<bool, AppError> {
        let mut table = self.access.write();
        let taken = table
            .by_user
            .get(&access.user_id)
            .is_some_and(|grants| grants.iter().any(|g| g.meal_plan_id == access.meal_plan_id));
        if taken {
            return Ok(false);
        }
        table.push(access);
        Ok(true)
    }

    async fn list_access_for_plan(
        &self,
        meal_plan_id: &str,
    ) -> Result<Vec<MealPlanAccess>, AppError> {
        Ok(self
            .access
            .read()
            .by_plan
            .get(meal_plan_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_access_for_user(&self, user_id: &str) -> Result<Vec<MealPlanAccess>, AppError> {
        Ok(self
            .access
            .read()
            .by_user
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ShareLinkRepository for MemoryStore {
    async fn insert_share_link(&self, link: ShareLink) -> Result<bool, AppError> {
        let mut links = self.share_links.write();
        if links.contains_key(&link.code) {
            return Ok(false);
        }
        links.insert(link.code.clone(), link);
        Ok(true)
    }

    async fn get_share_link(&self, code: &str) -> Result<ShareLink, AppError> {
        self.share_links
            .read()
            .get(code)
            .cloned()
            .ok_or(AppError::NotFound(Entity::ShareLink))
    }
}
