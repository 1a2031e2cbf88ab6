//! Fundraising campaign handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use givepath_common::Error;
use givepath_storage::models::{Campaign, CreateCampaign, UpdateCampaign};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::AppState;
use crate::handlers::{error_response, not_found, ErrorResponse};

/// Campaign response
#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub goal_amount: i64,
    pub raised_amount: i64,
    pub progress_percentage: f64,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponse {
    fn from(c: Campaign) -> Self {
        let progress = c.progress_percentage();
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            goal_amount: c.goal_amount,
            raised_amount: c.raised_amount,
            progress_percentage: progress,
            is_active: c.is_active,
            image_url: c.image_url,
            created_at: c.created_at,
        }
    }
}

/// Campaign list response
#[derive(Debug, Serialize)]
pub struct CampaignListResponse {
    pub data: Vec<CampaignResponse>,
}

/// Query parameters for the admin campaign list
#[derive(Debug, Deserialize)]
pub struct ListCampaignsQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// Request body for creating a campaign
#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub title: String,
    pub description: String,
    pub goal_amount: i64,
    pub image_url: Option<String>,
}

/// Request body for updating a campaign
#[derive(Debug, Deserialize)]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub goal_amount: Option<i64>,
    pub is_active: Option<bool>,
    pub image_url: Option<String>,
}

/// List active campaigns for the public site
///
/// GET /api/v1/campaigns
pub async fn list_public_campaigns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CampaignListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let campaigns = state.campaigns.list(true).await.map_err(error_response)?;

    Ok(Json(CampaignListResponse {
        data: campaigns.into_iter().map(CampaignResponse::from).collect(),
    }))
}

/// Get one campaign
///
/// GET /api/v1/campaigns/:id
pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, (StatusCode, Json<ErrorResponse>)> {
    let campaign = state
        .campaigns
        .get(id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found("Campaign"))?;

    Ok(Json(CampaignResponse::from(campaign)))
}

/// List campaigns for the admin dashboard
///
/// GET /api/v1/admin/campaigns
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<CampaignListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let campaigns = state
        .campaigns
        .list(query.active_only)
        .await
        .map_err(error_response)?;

    Ok(Json(CampaignListResponse {
        data: campaigns.into_iter().map(CampaignResponse::from).collect(),
    }))
}

/// Create a campaign
///
/// POST /api/v1/admin/campaigns
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>), (StatusCode, Json<ErrorResponse>)> {
    if body.title.trim().is_empty() {
        return Err(error_response(Error::Validation(
            "Title is required".to_string(),
        )));
    }
    if body.goal_amount <= 0 {
        return Err(error_response(Error::Validation(
            "Goal amount must be positive".to_string(),
        )));
    }

    let campaign = state
        .campaigns
        .create(CreateCampaign {
            title: body.title,
            description: body.description,
            goal_amount: body.goal_amount,
            image_url: body.image_url,
        })
        .await
        .map_err(error_response)?;

    info!(campaign = %campaign.id, "Campaign created");
    Ok((StatusCode::CREATED, Json(CampaignResponse::from(campaign))))
}

/// Update a campaign
///
/// PUT /api/v1/admin/campaigns/:id
pub async fn update_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCampaignRequest>,
) -> Result<Json<CampaignResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Some(goal) = body.goal_amount {
        if goal <= 0 {
            return Err(error_response(Error::Validation(
                "Goal amount must be positive".to_string(),
            )));
        }
    }

    let campaign = state
        .campaigns
        .update(
            id,
            UpdateCampaign {
                title: body.title,
                description: body.description,
                goal_amount: body.goal_amount,
                is_active: body.is_active,
                image_url: body.image_url,
            },
        )
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found("Campaign"))?;

    Ok(Json(CampaignResponse::from(campaign)))
}

/// Delete a campaign
///
/// DELETE /api/v1/admin/campaigns/:id
pub async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let deleted = state.campaigns.delete(id).await.map_err(error_response)?;
    if !deleted {
        return Err(not_found("Campaign"));
    }

    info!(campaign = %id, "Campaign deleted");
    Ok(StatusCode::NO_CONTENT)
}
