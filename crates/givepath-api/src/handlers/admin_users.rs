//! Admin user handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use givepath_common::types::is_plausible_email;
use givepath_common::Error;
use givepath_storage::models::{AdminRole, AdminUser, CreateAdminUser, UpdateAdminUser};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::AppState;
use crate::handlers::{error_response, not_found, ErrorResponse};

/// Admin user response
#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AdminUser> for AdminUserResponse {
    fn from(u: AdminUser) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at,
        }
    }
}

/// Admin user list response
#[derive(Debug, Serialize)]
pub struct AdminUserListResponse {
    pub data: Vec<AdminUserResponse>,
}

/// Request body for creating an admin user
#[derive(Debug, Deserialize)]
pub struct CreateAdminUserRequest {
    pub email: String,
    pub full_name: Option<String>,
    pub role: AdminRole,
}

/// Request body for updating an admin user
#[derive(Debug, Deserialize)]
pub struct UpdateAdminUserRequest {
    pub full_name: Option<String>,
    pub role: Option<AdminRole>,
    pub is_active: Option<bool>,
}

/// List admin users
///
/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdminUserListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let users = state.admin_users.list().await.map_err(error_response)?;

    Ok(Json(AdminUserListResponse {
        data: users.into_iter().map(AdminUserResponse::from).collect(),
    }))
}

/// Create an admin user
///
/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAdminUserRequest>,
) -> Result<(StatusCode, Json<AdminUserResponse>), (StatusCode, Json<ErrorResponse>)> {
    if !is_plausible_email(&body.email) {
        return Err(error_response(Error::Validation(
            "A valid email address is required".to_string(),
        )));
    }

    let existing = state
        .admin_users
        .get_by_email(&body.email)
        .await
        .map_err(error_response)?;
    if existing.is_some() {
        return Err(error_response(Error::Validation(
            "An admin user with this email already exists".to_string(),
        )));
    }

    let user = state
        .admin_users
        .create(CreateAdminUser {
            email: body.email,
            full_name: body.full_name,
            role: body.role,
        })
        .await
        .map_err(error_response)?;

    info!(user = %user.id, "Admin user created");
    Ok((StatusCode::CREATED, Json(AdminUserResponse::from(user))))
}

/// Get one admin user
///
/// GET /api/v1/admin/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminUserResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user = state
        .admin_users
        .get(id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found("Admin user"))?;

    Ok(Json(AdminUserResponse::from(user)))
}

/// Update an admin user
///
/// PUT /api/v1/admin/users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAdminUserRequest>,
) -> Result<Json<AdminUserResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user = state
        .admin_users
        .update(
            id,
            UpdateAdminUser {
                full_name: body.full_name,
                role: body.role,
                is_active: body.is_active,
            },
        )
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found("Admin user"))?;

    Ok(Json(AdminUserResponse::from(user)))
}

/// Delete an admin user
///
/// DELETE /api/v1/admin/users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let deleted = state.admin_users.delete(id).await.map_err(error_response)?;
    if !deleted {
        return Err(not_found("Admin user"));
    }

    info!(user = %id, "Admin user deleted");
    Ok(StatusCode::NO_CONTENT)
}
