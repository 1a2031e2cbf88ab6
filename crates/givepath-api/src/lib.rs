//! GivePath API - REST API server
//!
//! This crate provides the REST API for GivePath: public donation and
//! newsletter endpoints, plus the authenticated admin surface for
//! campaigns and bulk email.

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::AppState;
pub use routes::create_router;
