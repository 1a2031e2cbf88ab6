//! GivePath Storage - Database access layer
//!
//! This crate provides the PostgreSQL storage layer for GivePath:
//! connection pooling, migrations, row models, and per-table repositories.

pub mod db;
pub mod models;
pub mod repository;

pub use db::DatabasePool;
pub use models::*;
pub use repository::*;
