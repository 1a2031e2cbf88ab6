//! Bulk email handlers: send, list, preview, and the scheduler sweep

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use givepath_common::Error;
use givepath_core::{CsvRow, DonorPreview, SweepReport};
use givepath_storage::models::{
    CreateEmailCampaign, EmailCampaign, EmailCampaignStatus, RecipientFilters, RecipientMode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::AppState;
use crate::handlers::{error_response, ErrorResponse};

/// Request body for sending or scheduling a bulk email
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub subject: String,
    pub content: String,
    pub recipient_mode: RecipientMode,
    #[serde(default)]
    pub filters: RecipientFilters,
    /// Parsed CSV rows, only meaningful in csv_upload mode
    #[serde(default)]
    pub csv_rows: Vec<CsvRow>,
    /// When set to a future instant, the campaign is stored for the
    /// scheduler instead of being sent now
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Send outcome
#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub id: Uuid,
    pub status: String,
    pub recipient_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
}

/// Email campaign response
#[derive(Debug, Serialize)]
pub struct EmailCampaignResponse {
    pub id: Uuid,
    pub subject: String,
    pub recipient_mode: String,
    pub status: String,
    pub recipient_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<EmailCampaign> for EmailCampaignResponse {
    fn from(c: EmailCampaign) -> Self {
        Self {
            id: c.id,
            subject: c.subject,
            recipient_mode: c.recipient_mode,
            status: c.status,
            recipient_count: c.recipient_count,
            sent_count: c.sent_count,
            failed_count: c.failed_count,
            scheduled_at: c.scheduled_at,
            sent_at: c.sent_at,
            created_at: c.created_at,
        }
    }
}

/// Send a bulk email now, or schedule it for later
///
/// POST /api/v1/admin/email/send
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, (StatusCode, Json<ErrorResponse>)> {
    if body.subject.trim().is_empty() {
        return Err(error_response(Error::Validation(
            "Subject is required".to_string(),
        )));
    }
    if body.content.trim().is_empty() {
        return Err(error_response(Error::Validation(
            "Content is required".to_string(),
        )));
    }

    if let Some(at) = body.scheduled_at {
        if at > Utc::now() {
            return schedule(state, body, at).await;
        }
    }

    send_now(state, body).await
}

/// Store the campaign for the scheduler sweep.
///
/// CSV rows are never persisted, so csv_upload campaigns cannot be
/// scheduled; they would have nobody to send to when their time comes.
async fn schedule(
    state: Arc<AppState>,
    body: SendEmailRequest,
    at: DateTime<Utc>,
) -> Result<Json<SendEmailResponse>, (StatusCode, Json<ErrorResponse>)> {
    if body.recipient_mode == RecipientMode::CsvUpload {
        return Err(error_response(Error::Validation(
            "CSV recipients cannot be scheduled; send immediately instead".to_string(),
        )));
    }

    let recipient_count = state
        .resolver
        .count(body.recipient_mode, &body.filters, &[])
        .await
        .map_err(error_response)?;

    let campaign = state
        .email_campaigns
        .create(CreateEmailCampaign {
            subject: body.subject,
            content: body.content,
            recipient_mode: body.recipient_mode,
            filters: body.filters,
            scheduled_at: Some(at),
            status: EmailCampaignStatus::Scheduled,
            recipient_count: recipient_count as i32,
        })
        .await
        .map_err(error_response)?;

    info!(campaign = %campaign.id, %at, "Email campaign scheduled");

    Ok(Json(SendEmailResponse {
        id: campaign.id,
        status: campaign.status,
        recipient_count: campaign.recipient_count,
        sent_count: 0,
        failed_count: 0,
    }))
}

async fn send_now(
    state: Arc<AppState>,
    body: SendEmailRequest,
) -> Result<Json<SendEmailResponse>, (StatusCode, Json<ErrorResponse>)> {
    let recipients = state
        .resolver
        .resolve(body.recipient_mode, &body.filters, &body.csv_rows)
        .await
        .map_err(error_response)?;

    if recipients.is_empty() {
        return Err(error_response(Error::Validation(
            "No valid recipients found".to_string(),
        )));
    }

    let campaign = state
        .email_campaigns
        .create(CreateEmailCampaign {
            subject: body.subject.clone(),
            content: body.content.clone(),
            recipient_mode: body.recipient_mode,
            filters: body.filters,
            scheduled_at: None,
            status: EmailCampaignStatus::Sending,
            recipient_count: recipients.len() as i32,
        })
        .await
        .map_err(error_response)?;

    let report = state
        .dispatcher
        .send(&body.subject, &body.content, &recipients)
        .await
        .map_err(error_response)?;

    let status = if report.sent_count == 0 {
        state
            .email_campaigns
            .mark_failed(
                campaign.id,
                recipients.len() as i32,
                report.failed_count as i32,
            )
            .await
            .map_err(error_response)?;
        EmailCampaignStatus::Failed
    } else {
        state
            .email_campaigns
            .mark_sent(
                campaign.id,
                recipients.len() as i32,
                report.sent_count as i32,
                report.failed_count as i32,
            )
            .await
            .map_err(error_response)?;
        EmailCampaignStatus::Sent
    };

    info!(
        campaign = %campaign.id,
        sent = report.sent_count,
        failed = report.failed_count,
        "Email campaign dispatched"
    );

    Ok(Json(SendEmailResponse {
        id: campaign.id,
        status: status.to_string(),
        recipient_count: recipients.len() as i32,
        sent_count: report.sent_count as i32,
        failed_count: report.failed_count as i32,
    }))
}

/// Query parameters for listing email campaigns
#[derive(Debug, Deserialize)]
pub struct ListEmailCampaignsQuery {
    pub status: Option<String>,
}

/// Email campaign list response
#[derive(Debug, Serialize)]
pub struct EmailCampaignListResponse {
    pub data: Vec<EmailCampaignResponse>,
}

/// List email campaigns, newest first
///
/// GET /api/v1/admin/email/campaigns
pub async fn list_email_campaigns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEmailCampaignsQuery>,
) -> Result<Json<EmailCampaignListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let campaigns = state
        .email_campaigns
        .list(query.status.as_deref())
        .await
        .map_err(error_response)?;

    Ok(Json(EmailCampaignListResponse {
        data: campaigns
            .into_iter()
            .map(EmailCampaignResponse::from)
            .collect(),
    }))
}

/// Request body for previewing or counting recipients
#[derive(Debug, Deserialize)]
pub struct RecipientQueryRequest {
    pub recipient_mode: RecipientMode,
    #[serde(default)]
    pub filters: RecipientFilters,
    #[serde(default)]
    pub csv_rows: Vec<CsvRow>,
}

/// Recipient preview response
#[derive(Debug, Serialize)]
pub struct PreviewRecipientsResponse {
    pub recipients: Vec<DonorPreview>,
}

/// Preview matching donors, largest total first
///
/// POST /api/v1/admin/email/preview-recipients
pub async fn preview_recipients(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecipientQueryRequest>,
) -> Result<Json<PreviewRecipientsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let recipients = state
        .resolver
        .preview(body.recipient_mode, &body.filters)
        .await
        .map_err(error_response)?;

    Ok(Json(PreviewRecipientsResponse { recipients }))
}

/// Recipient count response
#[derive(Debug, Serialize)]
pub struct CountRecipientsResponse {
    pub count: usize,
}

/// Count how many recipients a mode/filter combination resolves to
///
/// POST /api/v1/admin/email/count-recipients
pub async fn count_recipients(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecipientQueryRequest>,
) -> Result<Json<CountRecipientsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let count = state
        .resolver
        .count(body.recipient_mode, &body.filters, &body.csv_rows)
        .await
        .map_err(error_response)?;

    Ok(Json(CountRecipientsResponse { count }))
}

/// Run one scheduler sweep over due campaigns
///
/// POST /api/v1/admin/email/process-scheduled
pub async fn process_scheduled(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SweepReport>, (StatusCode, Json<ErrorResponse>)> {
    let report = state
        .sweep
        .process_due(Utc::now())
        .await
        .map_err(error_response)?;

    Ok(Json(report))
}
