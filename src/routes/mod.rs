// # Routes Module
//
// - HTTP route handlers, grouped by the resource they serve.
// - Handlers stay thin: they unpack the request, call the planner service or
//   the access ledger, and map the outcome to a response.
//
//  ## Available Route Modules
// - `health`: Health check endpoint
// - `auth`: Google sign-in and the current user
// - `meal_plans`: Meal plan CRUD, sharing and share links
// - `meals`: Meal CRUD within a plan

/// Health check endpoint
pub mod health;

/// Google sign-in and session endpoints
pub mod auth;

/// Meal plan endpoints
pub mod meal_plans;

/// Meal endpoints
pub mod meals;
