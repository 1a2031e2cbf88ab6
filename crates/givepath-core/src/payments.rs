//! Razorpay order creation and payment reconciliation

use std::sync::Arc;

use givepath_common::types::{CampaignId, DonationId};
use givepath_common::{Error, Result};
use givepath_storage::repository::{CampaignRepositoryTrait, DonationRepositoryTrait};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use tracing::{info, warn};

const RAZORPAY_BASE_URL: &str = "https://api.razorpay.com";

type HmacSha256 = Hmac<Sha256>;

/// Check a Razorpay payment signature.
///
/// The signature is HMAC-SHA256 over `"<order_id>|<payment_id>"`, keyed
/// with the API secret and hex encoded.
pub fn verify_signature(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    expected == signature
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// Razorpay Orders API client
pub struct RazorpayClient {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: RAZORPAY_BASE_URL.to_string(),
            key_id,
            key_secret,
        }
    }

    /// Point the client at a different endpoint (tests)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Create an order for the given amount in rupees.
    ///
    /// Razorpay takes amounts in paise, so the amount is multiplied by
    /// 100 on the way out.
    pub async fn create_order(&self, amount_rupees: i64) -> Result<RazorpayOrder> {
        let receipt = format!("receipt_{}", rand::thread_rng().gen::<u32>());
        let body = json!({
            "amount": amount_rupees * 100,
            "currency": "INR",
            "receipt": receipt,
        });

        let response = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::PaymentGateway(format!("Razorpay request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::PaymentGateway(format!(
                "Razorpay returned {}: {}",
                status, detail
            )));
        }

        response
            .json::<RazorpayOrder>()
            .await
            .map_err(|e| Error::PaymentGateway(format!("Invalid Razorpay response: {}", e)))
    }
}

/// What a reconciliation attempt produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Signature checked out; donation marked successful
    Success,
    /// Signature mismatch; nothing was touched
    InvalidSignature,
}

/// Payment Reconciler - verifies a gateway callback and settles the
/// matching donation
pub struct PaymentReconciler {
    donations: Arc<dyn DonationRepositoryTrait>,
    campaigns: Arc<dyn CampaignRepositoryTrait>,
    key_secret: String,
}

impl PaymentReconciler {
    pub fn new(
        donations: Arc<dyn DonationRepositoryTrait>,
        campaigns: Arc<dyn CampaignRepositoryTrait>,
        key_secret: String,
    ) -> Self {
        Self {
            donations,
            campaigns,
            key_secret,
        }
    }

    /// Verify the gateway signature and, if valid, mark the donation
    /// successful and bump the campaign's raised total.
    ///
    /// An invalid signature leaves the donation untouched. A verified
    /// payment whose campaign increment fails is still a success; the
    /// money moved and the discrepancy is logged for manual correction.
    pub async fn verify_and_reconcile(
        &self,
        donation_id: DonationId,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<ReconcileOutcome> {
        if !verify_signature(order_id, payment_id, signature, &self.key_secret) {
            warn!(%donation_id, order_id, "Payment signature mismatch");
            return Ok(ReconcileOutcome::InvalidSignature);
        }

        let donation = self
            .donations
            .mark_success(donation_id, payment_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Donation {} not found", donation_id)))?;

        if let Some(campaign_id) = donation.campaign_id {
            self.bump_campaign(campaign_id, donation.amount).await;
        }

        info!(%donation_id, payment_id, amount = donation.amount, "Payment reconciled");
        Ok(ReconcileOutcome::Success)
    }

    async fn bump_campaign(&self, campaign_id: CampaignId, amount: i64) {
        match self.campaigns.increment_raised(campaign_id, amount).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(%campaign_id, amount, "Campaign missing; raised total not updated");
            }
            Err(e) => {
                warn!(%campaign_id, amount, "Failed to update raised total: {}", e);
            }
        }
    }
}
