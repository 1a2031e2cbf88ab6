//! Admin authentication

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use givepath_common::config::Config;
use givepath_core::{
    BatchDispatcher, PaymentReconciler, RazorpayClient, RecipientResolver, SchedulerSweep,
};
use givepath_storage::repository::{
    AdminUserRepository, AdminUserRepositoryTrait, CampaignRepository, CampaignRepositoryTrait,
    DonationRepository, DonationRepositoryTrait, EmailCampaignRepository,
    EmailCampaignRepositoryTrait, SubscriberRepository, SubscriberRepositoryTrait,
};
use givepath_storage::DatabasePool;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabasePool,
    pub donations: Arc<dyn DonationRepositoryTrait>,
    pub campaigns: Arc<dyn CampaignRepositoryTrait>,
    pub email_campaigns: Arc<dyn EmailCampaignRepositoryTrait>,
    pub subscribers: Arc<dyn SubscriberRepositoryTrait>,
    pub admin_users: Arc<dyn AdminUserRepositoryTrait>,
    pub resolver: Arc<RecipientResolver>,
    pub dispatcher: Arc<BatchDispatcher>,
    pub sweep: Arc<SchedulerSweep>,
    /// Absent when Razorpay credentials are not configured; the payment
    /// endpoints refuse requests in that case
    pub razorpay: Option<Arc<RazorpayClient>>,
    pub razorpay_key_id: Option<String>,
    pub reconciler: Option<Arc<PaymentReconciler>>,
    /// SHA-256 hex of the admin API token; absent means the admin
    /// surface rejects everything
    pub admin_token_hash: Option<String>,
}

impl AppState {
    /// Wire repositories and core components from configuration
    pub fn new(db_pool: DatabasePool, config: &Config) -> Self {
        let donations: Arc<dyn DonationRepositoryTrait> =
            Arc::new(DonationRepository::new(db_pool.clone()));
        let campaigns: Arc<dyn CampaignRepositoryTrait> =
            Arc::new(CampaignRepository::new(db_pool.clone()));
        let email_campaigns: Arc<dyn EmailCampaignRepositoryTrait> =
            Arc::new(EmailCampaignRepository::new(db_pool.clone()));
        let subscribers: Arc<dyn SubscriberRepositoryTrait> =
            Arc::new(SubscriberRepository::new(db_pool.clone()));
        let admin_users: Arc<dyn AdminUserRepositoryTrait> =
            Arc::new(AdminUserRepository::new(db_pool.clone()));

        let resolver = Arc::new(RecipientResolver::new(
            donations.clone(),
            subscribers.clone(),
        ));
        let dispatcher = Arc::new(BatchDispatcher::from_config(&config.sendgrid));
        let sweep = Arc::new(SchedulerSweep::new(
            email_campaigns.clone(),
            resolver.clone(),
            dispatcher.clone(),
        ));

        let razorpay = match (&config.razorpay.key_id, &config.razorpay.key_secret) {
            (Some(key_id), Some(key_secret)) => Some(Arc::new(RazorpayClient::new(
                key_id.clone(),
                key_secret.clone(),
            ))),
            _ => {
                warn!("Razorpay credentials not configured; payment endpoints are disabled");
                None
            }
        };
        let reconciler = config.razorpay.key_secret.as_ref().map(|secret| {
            Arc::new(PaymentReconciler::new(
                donations.clone(),
                campaigns.clone(),
                secret.clone(),
            ))
        });

        let admin_token_hash = config.api.admin_token.as_deref().map(hash_token);
        if admin_token_hash.is_none() {
            warn!("No admin token configured; admin endpoints are disabled");
        }

        Self {
            db_pool,
            donations,
            campaigns,
            email_campaigns,
            subscribers,
            admin_users,
            resolver,
            dispatcher,
            sweep,
            razorpay,
            razorpay_key_id: config.razorpay.key_id.clone(),
            reconciler,
            admin_token_hash,
        }
    }
}

/// Extract the admin token from a request
pub fn extract_token(req: &Request) -> Option<&str> {
    // Check Authorization header
    if let Some(auth) = req.headers().get("authorization") {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token);
            }
        }
    }

    // Check X-API-Key header
    if let Some(key) = req.headers().get("x-api-key") {
        if let Ok(key_str) = key.to_str() {
            return Some(key_str);
        }
    }

    None
}

/// Hash a token for comparison
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Admin authentication middleware.
///
/// A single shared token guards the admin surface; hashes are compared
/// so the plaintext token never sits in state.
pub async fn admin_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = state.admin_token_hash.as_ref().ok_or_else(|| {
        warn!(
            "Admin request to {} rejected: no admin token configured",
            request.uri().path()
        );
        StatusCode::UNAUTHORIZED
    })?;

    let token = extract_token(&request).ok_or_else(|| {
        warn!("Missing admin token in request to {}", request.uri().path());
        StatusCode::UNAUTHORIZED
    })?;

    if &hash_token(token) != expected {
        warn!("Admin token mismatch for {}", request.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
