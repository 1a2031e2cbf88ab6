//! Donation handlers: order creation, payment verification, admin listing

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use givepath_common::types::{is_plausible_email, CampaignId, DonationId};
use givepath_common::Error;
use givepath_core::ReconcileOutcome;
use givepath_storage::models::{CreateDonation, Donation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::AppState;
use crate::handlers::{error_response, ErrorResponse};

/// Request body for creating a donation order
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: Option<String>,
    /// Amount in rupees
    pub amount: i64,
    pub campaign_id: Option<CampaignId>,
}

/// Response for a created order
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub donation_id: DonationId,
    pub order_id: String,
    /// Amount in paise, as the gateway checkout expects
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

/// Request body for verifying a payment
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub donation_id: DonationId,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Verification outcome body
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub status: String,
}

/// Create a pending donation and a matching gateway order
///
/// POST /api/v1/orders
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, (StatusCode, Json<ErrorResponse>)> {
    if body.donor_name.trim().is_empty() {
        return Err(error_response(Error::Validation(
            "Donor name is required".to_string(),
        )));
    }
    if !is_plausible_email(&body.donor_email) {
        return Err(error_response(Error::Validation(
            "A valid email address is required".to_string(),
        )));
    }
    if body.amount <= 0 {
        return Err(error_response(Error::Validation(
            "Amount must be positive".to_string(),
        )));
    }

    let (razorpay, key_id) = match (&state.razorpay, &state.razorpay_key_id) {
        (Some(client), Some(key_id)) => (client, key_id),
        _ => {
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "GATEWAY_UNAVAILABLE".to_string(),
                    message: "Payment gateway is not configured".to_string(),
                }),
            ))
        }
    };

    let order = razorpay
        .create_order(body.amount)
        .await
        .map_err(error_response)?;

    let donation = state
        .donations
        .create(CreateDonation {
            donor_name: body.donor_name,
            donor_email: body.donor_email,
            donor_phone: body.donor_phone,
            amount: body.amount,
            campaign_id: body.campaign_id,
            razorpay_order_id: order.id.clone(),
        })
        .await
        .map_err(error_response)?;

    info!(donation = %donation.id, order = %order.id, amount = body.amount, "Donation order created");

    Ok(Json(CreateOrderResponse {
        donation_id: donation.id,
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
        key_id: key_id.clone(),
    }))
}

/// Verify a gateway payment callback and settle the donation
///
/// POST /api/v1/payments/verify
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyPaymentRequest>,
) -> Result<(StatusCode, Json<VerifyPaymentResponse>), (StatusCode, Json<ErrorResponse>)> {
    let reconciler = state.reconciler.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "GATEWAY_UNAVAILABLE".to_string(),
                message: "Payment gateway is not configured".to_string(),
            }),
        )
    })?;

    let outcome = reconciler
        .verify_and_reconcile(
            body.donation_id,
            &body.razorpay_order_id,
            &body.razorpay_payment_id,
            &body.razorpay_signature,
        )
        .await
        .map_err(error_response)?;

    match outcome {
        ReconcileOutcome::Success => Ok((
            StatusCode::OK,
            Json(VerifyPaymentResponse {
                status: "success".to_string(),
            }),
        )),
        ReconcileOutcome::InvalidSignature => Ok((
            StatusCode::BAD_REQUEST,
            Json(VerifyPaymentResponse {
                status: "failure".to_string(),
            }),
        )),
    }
}

/// Query parameters for listing donations
#[derive(Debug, Deserialize)]
pub struct ListDonationsQuery {
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Donation response
#[derive(Debug, Serialize)]
pub struct DonationResponse {
    pub id: Uuid,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: Option<String>,
    pub amount: i64,
    pub campaign_id: Option<Uuid>,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Donation> for DonationResponse {
    fn from(d: Donation) -> Self {
        Self {
            id: d.id,
            donor_name: d.donor_name,
            donor_email: d.donor_email,
            donor_phone: d.donor_phone,
            amount: d.amount,
            campaign_id: d.campaign_id,
            razorpay_order_id: d.razorpay_order_id,
            razorpay_payment_id: d.razorpay_payment_id,
            status: d.status,
            created_at: d.created_at,
        }
    }
}

/// Donation list response
#[derive(Debug, Serialize)]
pub struct DonationListResponse {
    pub data: Vec<DonationResponse>,
    pub limit: i64,
    pub offset: i64,
}

/// List donations, newest first
///
/// GET /api/v1/admin/donations
pub async fn list_donations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDonationsQuery>,
) -> Result<Json<DonationListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let donations = state
        .donations
        .list(query.status.as_deref(), query.limit, query.offset)
        .await
        .map_err(error_response)?;

    Ok(Json(DonationListResponse {
        data: donations.into_iter().map(DonationResponse::from).collect(),
        limit: query.limit,
        offset: query.offset,
    }))
}
