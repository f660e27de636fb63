//! # Access Control Module
//!
//! The access ledger answers "may this user touch this meal plan" and owns the
//! grant and share-link records that feed those answers.
//!
//! A plan's creator is always its owner, whether or not an explicit grant
//! exists. Any other user needs at least one grant. When several grants exist
//! for the same pair the strongest one wins.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::database::{
    AccessRepository, MealPlan, MealPlanAccess, MealPlanRepository, Role, ShareLink,
    ShareLinkRepository, UserRepository,
};
use crate::error::AppError;

/// Length of generated share codes
pub const SHARE_CODE_LEN: usize = 10;

/// Share link lifetime when neither the request nor the configuration gives one
pub const DEFAULT_LINK_TTL_HOURS: i64 = 168;

const SHARE_CODE_ATTEMPTS: usize = 8;

/// How roles gate writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Viewers read, editors also write, only owners delete plans
    Strict,
    /// Any grant allows every action
    Permissive,
}

/// What a caller wants to do with a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// View the plan or its meals
    Read,
    /// Rename the plan, add, edit or remove meals
    Write,
    /// Delete the plan itself
    Delete,
}

impl AccessPolicy {
    /// Weakest role that may perform `action`
    pub fn required_role(&self, action: Action) -> Role {
        match (self, action) {
            (AccessPolicy::Permissive, _) | (AccessPolicy::Strict, Action::Read) => Role::Viewer,
            (AccessPolicy::Strict, Action::Write) => Role::Editor,
            (AccessPolicy::Strict, Action::Delete) => Role::Owner,
        }
    }
}

#[derive(Clone)]
pub struct AccessLedger {
    plans: Arc<dyn MealPlanRepository>,
    grants: Arc<dyn AccessRepository>,
    links: Arc<dyn ShareLinkRepository>,
    users: Arc<dyn UserRepository>,
    policy: AccessPolicy,
    default_link_ttl_hours: i64,
}

impl AccessLedger {
    pub fn new(
        plans: Arc<dyn MealPlanRepository>,
        grants: Arc<dyn AccessRepository>,
        links: Arc<dyn ShareLinkRepository>,
        users: Arc<dyn UserRepository>,
        policy: AccessPolicy,
        default_link_ttl_hours: i64,
    ) -> Self {
        Self {
            plans,
            grants,
            links,
            users,
            policy,
            default_link_ttl_hours: if default_link_ttl_hours > 0 {
                default_link_ttl_hours
            } else {
                DEFAULT_LINK_TTL_HOURS
            },
        }
    }

    /// Record a grant. Repeated calls for the same pair add further rows.
    pub async fn grant_access(
        &self,
        user_id: &str,
        meal_plan_id: &str,
        role: Role,
    ) -> Result<MealPlanAccess, AppError> {
        let access = MealPlanAccess {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            meal_plan_id: meal_plan_id.to_string(),
            role,
        };
        let access = self.grants.insert_access(access).await?;
        tracing::info!(
            user_id,
            meal_plan_id,
            role = %role,
            "Granted meal plan access"
        );
        Ok(access)
    }

    /// Strongest role the user holds on the plan, if any
    pub async fn role_for(&self, user_id: &str, meal_plan_id: &str) -> Result<Option<Role>, AppError> {
        let plan = self.plans.get_meal_plan(meal_plan_id).await?;
        self.role_on(user_id, &plan).await
    }

    async fn role_on(&self, user_id: &str, plan: &MealPlan) -> Result<Option<Role>, AppError> {
        if plan.created_by == user_id {
            return Ok(Some(Role::Owner));
        }
        let role = self
            .grants
            .list_access_for_plan(&plan.id)
            .await?
            .into_iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.role)
            .max();
        Ok(role)
    }

    /// Creator or any grant. Fails with `NotFound` for unknown plans.
    pub async fn has_access(&self, user_id: &str, meal_plan_id: &str) -> Result<bool, AppError> {
        Ok(self.role_for(user_id, meal_plan_id).await?.is_some())
    }

    /// Creator or an explicit owner grant. Fails with `NotFound` for unknown plans.
    pub async fn is_owner(&self, user_id: &str, meal_plan_id: &str) -> Result<bool, AppError> {
        Ok(self.role_for(user_id, meal_plan_id).await? == Some(Role::Owner))
    }

    /// Load the plan if the user may perform `action` on it
    pub async fn authorize(
        &self,
        user_id: &str,
        meal_plan_id: &str,
        action: Action,
    ) -> Result<MealPlan, AppError> {
        let plan = self.plans.get_meal_plan(meal_plan_id).await?;
        let Some(role) = self.role_on(user_id, &plan).await? else {
            tracing::warn!(user_id, meal_plan_id, ?action, "No access to meal plan");
            return Err(AppError::Forbidden("no access to this meal plan".to_string()));
        };

        let required = self.policy.required_role(action);
        if role < required {
            tracing::warn!(user_id, meal_plan_id, ?action, role = %role, "Role too weak");
            return Err(AppError::Forbidden(format!(
                "{required} role required, you are {role}"
            )));
        }
        Ok(plan)
    }

    /// Plans the user created or holds a grant on, oldest first
    pub async fn list_accessible_plans(&self, user_id: &str) -> Result<Vec<MealPlan>, AppError> {
        let mut plans = self.plans.list_meal_plans_created_by(user_id).await?;

        let mut granted: Vec<String> = self
            .grants
            .list_access_for_user(user_id)
            .await?
            .into_iter()
            .map(|a| a.meal_plan_id)
            .filter(|id| !plans.iter().any(|p| &p.id == id))
            .collect();
        granted.sort();
        granted.dedup();

        plans.extend(self.plans.list_meal_plans_by_ids(&granted).await?);
        plans.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(plans)
    }

    /// Create a redeemable link. Invalid or missing roles become viewer,
    /// non-positive TTLs fall back to the configured default.
    pub async fn create_share_link(
        &self,
        meal_plan_id: &str,
        created_by: &str,
        role: Option<&str>,
        ttl_hours: Option<i64>,
    ) -> Result<ShareLink, AppError> {
        self.require_owner(created_by, meal_plan_id).await?;

        let role = role
            .and_then(|r| r.parse::<Role>().ok())
            .filter(Role::is_shareable)
            .unwrap_or(Role::Viewer);
        let ttl_hours = match ttl_hours {
            Some(hours) if hours > 0 => hours,
            _ => self.default_link_ttl_hours,
        };

        let now = Utc::now();
        let expires_at = Duration::try_hours(ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        for _ in 0..SHARE_CODE_ATTEMPTS {
            let link = ShareLink {
                code: generate_share_code(),
                meal_plan_id: meal_plan_id.to_string(),
                created_by: created_by.to_string(),
                role,
                expires_at,
                created_at: now,
            };
            if self.links.insert_share_link(link.clone()).await? {
                tracing::info!(meal_plan_id, role = %role, %expires_at, "Created share link");
                return Ok(link);
            }
        }
        Err(AppError::Internal("could not allocate a unique share code".to_string()))
    }

    /// Join a plan through a share link
    pub async fn redeem_share_link(
        &self,
        code: &str,
        user_id: &str,
    ) -> Result<(MealPlan, Role), AppError> {
        let link = self.links.get_share_link(code.trim()).await?;

        if link.is_expired_at(Utc::now()) {
            tracing::warn!(user_id, meal_plan_id = %link.meal_plan_id, "Share link expired");
            return Err(AppError::Expired);
        }

        let plan = self.plans.get_meal_plan(&link.meal_plan_id).await?;
        match self.role_on(user_id, &plan).await? {
            Some(Role::Owner) => return Err(AppError::AlreadyOwner),
            Some(_) => return Err(AppError::AlreadyMember),
            None => {}
        }

        // a concurrent join by the same user may have landed since the check above
        let access = MealPlanAccess {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            meal_plan_id: plan.id.clone(),
            role: link.role,
        };
        if !self.grants.insert_access_if_absent(access).await? {
            return Err(AppError::AlreadyMember);
        }
        tracing::info!(user_id, meal_plan_id = %plan.id, role = %link.role, "Joined meal plan via share link");
        Ok((plan, link.role))
    }

    /// Grant a user, found by email, a role on the owner's plan
    pub async fn share_with_user(
        &self,
        meal_plan_id: &str,
        owner_id: &str,
        target_email: &str,
        role: &str,
    ) -> Result<MealPlanAccess, AppError> {
        let role = role
            .parse::<Role>()
            .ok()
            .filter(Role::is_shareable)
            .ok_or_else(|| {
                AppError::Validation("Invalid role. Must be 'editor' or 'viewer'".to_string())
            })?;

        self.require_owner(owner_id, meal_plan_id).await?;

        let target = self.users.find_user_by_email(target_email).await?;
        if target.id == owner_id {
            return Err(AppError::SelfShare);
        }

        self.grant_access(&target.id, meal_plan_id, role).await
    }

    async fn require_owner(&self, user_id: &str, meal_plan_id: &str) -> Result<(), AppError> {
        if self.is_owner(user_id, meal_plan_id).await? {
            Ok(())
        } else {
            tracing::warn!(user_id, meal_plan_id, "Owner-only action refused");
            Err(AppError::Forbidden(
                "Only the owner can share a meal plan".to_string(),
            ))
        }
    }
}

fn generate_share_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHARE_CODE_LEN)
        .map(char::from)
        .collect()
}
