// Database Models
//
// Records held by the store. JSON field names follow the frontend's camelCase.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// User account created on first Google login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Google subject identifier
    #[serde(rename = "google_id")]
    pub external_id: String,
    pub email: String,
    pub name: String,
}

/// Collection of meals owned by its creator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single meal inside a meal plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    pub meal_plan_id: String,
    pub name: String,
    pub description: String,
    pub day: String,
    /// Breakfast, Lunch, Dinner or free text
    pub meal_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable fields of a meal, used for both create and update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub meal_type: String,
}

impl MealFields {
    /// Name, day and meal type must be present
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty()
            || self.day.trim().is_empty()
            || self.meal_type.trim().is_empty()
        {
            return Err(AppError::Validation(
                "Name, day, and meal type are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Role conferred by a grant. Ordered by strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Owner => "owner",
        }
    }

    /// Roles that may be handed out through sharing
    pub fn is_shareable(&self) -> bool {
        matches!(self, Role::Viewer | Role::Editor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "owner" => Ok(Role::Owner),
            other => Err(AppError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// Explicit grant of a role on a meal plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanAccess {
    pub id: String,
    pub user_id: String,
    pub meal_plan_id: String,
    pub role: Role,
}

/// Time-limited code granting a fixed role to whoever redeems it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    /// The redeemable code, also the record id
    pub code: String,
    pub meal_plan_id: String,
    pub created_by: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ShareLink {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
