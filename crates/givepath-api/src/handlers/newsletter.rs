//! Newsletter subscription handler

use axum::{extract::State, http::StatusCode, Json};
use givepath_common::types::is_plausible_email;
use givepath_common::Error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::AppState;
use crate::handlers::{error_response, ErrorResponse};

/// Request body for subscribing
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

/// Subscription response
#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub message: String,
}

/// Subscribe an email address to the newsletter
///
/// POST /api/v1/newsletter
///
/// Subscribing an address that is already on the list is not an error;
/// a lapsed subscription is quietly re-activated.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let email = body.email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(error_response(Error::Validation(
            "A valid email address is required".to_string(),
        )));
    }

    let existing = state
        .subscribers
        .get_by_email(&email)
        .await
        .map_err(error_response)?;

    if let Some(subscriber) = existing {
        if subscriber.is_active {
            return Ok(Json(SubscribeResponse {
                message: "You're already subscribed".to_string(),
            }));
        }
    }

    state
        .subscribers
        .subscribe(&email)
        .await
        .map_err(error_response)?;

    info!(%email, "Newsletter subscription");
    Ok(Json(SubscribeResponse {
        message: "Subscribed successfully".to_string(),
    }))
}
