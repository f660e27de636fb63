//! # Authentication Module
//!
//! Google sign-in, session token issuance and validation, and the middleware
//! guarding the `/api` routes.

pub mod google;
pub mod jwt;
pub mod middleware;
pub mod models;
