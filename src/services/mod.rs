//! # Services Module
//!
//! Business logic sitting between the HTTP handlers and the repositories.

pub mod planner;

pub use planner::PlannerService;
