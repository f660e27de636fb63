//! # Database Module
//!
//! Storage for users, meal plans, meals, access grants and share links.
//! Callers depend on the repository traits; `MemoryStore` is the in-process
//! implementation behind all of them.

pub mod memory;
pub mod models;
pub mod repository;

pub use memory::MemoryStore;
pub use models::*;
pub use repository::{
    AccessRepository, MealPlanRepository, MealRepository, ShareLinkRepository, UserRepository,
};
