//! Admin user repository

use async_trait::async_trait;
use givepath_common::types::AdminUserId;
use givepath_common::{Error, Result};
use uuid::Uuid;

use crate::db::DatabasePool;
use crate::models::{AdminUser, CreateAdminUser, UpdateAdminUser};

/// Admin user repository trait
#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    /// Create a new admin user
    async fn create(&self, input: CreateAdminUser) -> Result<AdminUser>;

    /// Get an admin user by ID
    async fn get(&self, id: AdminUserId) -> Result<Option<AdminUser>>;

    /// Get an admin user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>>;

    /// List admin users, newest first
    async fn list(&self) -> Result<Vec<AdminUser>>;

    /// Update an admin user
    async fn update(&self, id: AdminUserId, input: UpdateAdminUser) -> Result<Option<AdminUser>>;

    /// Delete an admin user
    async fn delete(&self, id: AdminUserId) -> Result<bool>;
}

/// Database admin user repository
#[derive(Clone)]
pub struct DbAdminUserRepository {
    pool: DatabasePool,
}

impl DbAdminUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminUserRepository for DbAdminUserRepository {
    async fn create(&self, input: CreateAdminUser) -> Result<AdminUser> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (id, email, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.email)
        .bind(&input.full_name)
        .bind(input.role.to_string())
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn get(&self, id: AdminUserId) -> Result<Option<AdminUser>> {
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE email = $1")
            .bind(email)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list(&self) -> Result<Vec<AdminUser>> {
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users ORDER BY created_at DESC")
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn update(&self, id: AdminUserId, input: UpdateAdminUser) -> Result<Option<AdminUser>> {
        sqlx::query_as::<_, AdminUser>(
            r#"
            UPDATE admin_users SET
                full_name = COALESCE($2, full_name),
                role = COALESCE($3, role),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.full_name)
        .bind(input.role.map(|r| r.to_string()))
        .bind(input.is_active)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn delete(&self, id: AdminUserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admin_users WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
