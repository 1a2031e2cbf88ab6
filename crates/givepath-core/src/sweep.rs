//! Scheduler sweep - finds due scheduled email campaigns and sends them

use std::sync::Arc;

use chrono::{DateTime, Utc};
use givepath_common::types::EmailCampaignId;
use givepath_common::Result;
use givepath_storage::models::EmailCampaign;
use givepath_storage::repository::EmailCampaignRepositoryTrait;
use serde::Serialize;
use tracing::{info, warn};

use crate::mailer::BatchDispatcher;
use crate::recipients::RecipientResolver;

/// Per-campaign outcome from one sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub id: EmailCampaignId,
    pub subject: String,
    pub sent_count: usize,
    pub failed_count: usize,
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Campaigns that ended up `sent`
    pub processed: usize,
    pub results: Vec<SweepResult>,
}

/// Scheduler sweep over due email campaigns.
///
/// Each due campaign is claimed with a compare-against-current-status
/// update before any work happens, so concurrent sweeps never dispatch
/// the same campaign twice.
pub struct SchedulerSweep {
    campaigns: Arc<dyn EmailCampaignRepositoryTrait>,
    resolver: Arc<RecipientResolver>,
    dispatcher: Arc<BatchDispatcher>,
}

impl SchedulerSweep {
    pub fn new(
        campaigns: Arc<dyn EmailCampaignRepositoryTrait>,
        resolver: Arc<RecipientResolver>,
        dispatcher: Arc<BatchDispatcher>,
    ) -> Self {
        Self {
            campaigns,
            resolver,
            dispatcher,
        }
    }

    /// Process every scheduled campaign whose time has come.
    ///
    /// A campaign that fails to send is marked `failed` and the sweep
    /// moves on; one bad campaign never blocks the rest.
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let due = self.campaigns.list_due(now).await?;
        if due.is_empty() {
            return Ok(SweepReport::default());
        }

        info!(due = due.len(), "Processing scheduled email campaigns");
        let mut report = SweepReport::default();

        for campaign in due {
            let id = campaign.id;
            match self.campaigns.claim_for_sending(id).await {
                Ok(true) => {}
                // Another worker got there first
                Ok(false) => continue,
                Err(e) => {
                    // Row is still scheduled; the next sweep retries it
                    warn!(campaign = %id, "Claim failed: {}", e);
                    continue;
                }
            }

            match self.dispatch_one(&campaign).await {
                Ok(Some(result)) => {
                    report.processed += 1;
                    report.results.push(result);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(campaign = %id, "Scheduled send failed: {}", e);
                    if let Err(e) = self.campaigns.mark_failed(id, 0, 0).await {
                        warn!(campaign = %id, "Failed to record failure: {}", e);
                    }
                }
            }
        }

        Ok(report)
    }

    /// Send one claimed campaign; Ok(None) means it was marked failed.
    async fn dispatch_one(&self, campaign: &EmailCampaign) -> Result<Option<SweepResult>> {
        let mode = campaign.recipient_mode_enum().ok_or_else(|| {
            givepath_common::Error::Validation(format!(
                "Unknown recipient mode: {}",
                campaign.recipient_mode
            ))
        })?;
        let filters = campaign.filters();

        // Scheduled campaigns carry no CSV rows; csv_upload resolves empty
        let recipients = self.resolver.resolve(mode, &filters, &[]).await?;
        if recipients.is_empty() {
            warn!(campaign = %campaign.id, "No recipients resolved; marking failed");
            self.campaigns.mark_failed(campaign.id, 0, 0).await?;
            return Ok(None);
        }

        let outcome = self
            .dispatcher
            .send(&campaign.subject, &campaign.content, &recipients)
            .await?;

        // The donor base may have changed since scheduling; the resolved
        // total supersedes the schedule-time estimate
        let recipient_count = recipients.len() as i32;

        if outcome.sent_count == 0 {
            self.campaigns
                .mark_failed(campaign.id, recipient_count, outcome.failed_count as i32)
                .await?;
            return Ok(None);
        }

        self.campaigns
            .mark_sent(
                campaign.id,
                recipient_count,
                outcome.sent_count as i32,
                outcome.failed_count as i32,
            )
            .await?;

        info!(
            campaign = %campaign.id,
            sent = outcome.sent_count,
            failed = outcome.failed_count,
            "Scheduled campaign sent"
        );

        Ok(Some(SweepResult {
            id: campaign.id,
            subject: campaign.subject.clone(),
            sent_count: outcome.sent_count,
            failed_count: outcome.failed_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::{EmailProvider, MockProvider, OutboundEmail};
    use async_trait::async_trait;
    use givepath_common::Error;
    use givepath_storage::models::{
        CreateDonation, CreateEmailCampaign, Donation, DonorQuery, DonorRow, Subscriber,
    };
    use givepath_storage::repository::{DonationRepositoryTrait, SubscriberRepositoryTrait};
    use givepath_common::types::DonationId;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct FakeEmailCampaigns {
        rows: Mutex<HashMap<EmailCampaignId, EmailCampaign>>,
        broken_claims: Mutex<Vec<EmailCampaignId>>,
    }

    impl FakeEmailCampaigns {
        fn with(rows: Vec<EmailCampaign>) -> Self {
            Self {
                rows: Mutex::new(rows.into_iter().map(|r| (r.id, r)).collect()),
                broken_claims: Mutex::new(Vec::new()),
            }
        }

        /// Make the next claim for this campaign fail with a store error
        fn break_claim(&self, id: EmailCampaignId) {
            self.broken_claims.lock().unwrap().push(id);
        }

        fn get_row(&self, id: EmailCampaignId) -> EmailCampaign {
            self.rows.lock().unwrap().get(&id).cloned().unwrap()
        }
    }

    #[async_trait]
    impl EmailCampaignRepositoryTrait for FakeEmailCampaigns {
        async fn create(&self, _input: CreateEmailCampaign) -> Result<EmailCampaign> {
            unimplemented!()
        }

        async fn get(&self, id: EmailCampaignId) -> Result<Option<EmailCampaign>> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn list(&self, _status: Option<&str>) -> Result<Vec<EmailCampaign>> {
            unimplemented!()
        }

        async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<EmailCampaign>> {
            let rows = self.rows.lock().unwrap();
            let mut due: Vec<EmailCampaign> = rows
                .values()
                .filter(|r| r.status == "scheduled")
                .filter(|r| r.scheduled_at.map_or(false, |at| at <= now))
                .cloned()
                .collect();
            due.sort_by_key(|r| r.scheduled_at);
            Ok(due)
        }

        async fn claim_for_sending(&self, id: EmailCampaignId) -> Result<bool> {
            if self.broken_claims.lock().unwrap().contains(&id) {
                return Err(Error::Database("connection reset".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&id) {
                Some(row) if row.status == "scheduled" => {
                    row.status = "sending".to_string();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn mark_sent(
            &self,
            id: EmailCampaignId,
            recipient_count: i32,
            sent_count: i32,
            failed_count: i32,
        ) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.get_mut(&id) {
                row.status = "sent".to_string();
                row.recipient_count = recipient_count;
                row.sent_count = sent_count;
                row.failed_count = failed_count;
                row.sent_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn mark_failed(
            &self,
            id: EmailCampaignId,
            recipient_count: i32,
            failed_count: i32,
        ) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.get_mut(&id) {
                row.status = "failed".to_string();
                row.recipient_count = recipient_count;
                row.failed_count = failed_count;
            }
            Ok(())
        }
    }

    struct FakeDonations {
        rows: Vec<DonorRow>,
    }

    #[async_trait]
    impl DonationRepositoryTrait for FakeDonations {
        async fn create(&self, _input: CreateDonation) -> Result<Donation> {
            unimplemented!()
        }

        async fn get(&self, _id: DonationId) -> Result<Option<Donation>> {
            Ok(None)
        }

        async fn mark_success(
            &self,
            _id: DonationId,
            _payment_id: &str,
        ) -> Result<Option<Donation>> {
            Ok(None)
        }

        async fn list(
            &self,
            _status: Option<&str>,
            _limit: i64,
            _offset: i64,
        ) -> Result<Vec<Donation>> {
            Ok(Vec::new())
        }

        async fn list_successful(&self, query: &DonorQuery) -> Result<Vec<DonorRow>> {
            Ok(self
                .rows
                .iter()
                .filter(|r| query.min_amount.map_or(true, |min| r.amount >= min))
                .filter(|r| query.contains(r.created_at))
                .cloned()
                .collect())
        }
    }

    struct FakeSubscribers;

    #[async_trait]
    impl SubscriberRepositoryTrait for FakeSubscribers {
        async fn get_by_email(&self, _email: &str) -> Result<Option<Subscriber>> {
            Ok(None)
        }

        async fn subscribe(&self, _email: &str) -> Result<Subscriber> {
            unimplemented!()
        }

        async fn list_active_emails(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn count_active(&self) -> Result<i64> {
            Ok(0)
        }
    }

    /// Provider that refuses every batch
    struct FailingProvider;

    #[async_trait]
    impl EmailProvider for FailingProvider {
        async fn send_batch(&self, _batch: &[OutboundEmail]) -> Result<()> {
            Err(Error::Provider("provider down".to_string()))
        }
    }

    fn donor_row(email: &str) -> DonorRow {
        DonorRow {
            donor_name: "Asha".to_string(),
            donor_email: email.to_string(),
            amount: 100,
            created_at: Utc::now(),
        }
    }

    fn scheduled_campaign(mode: &str, scheduled_at: DateTime<Utc>) -> EmailCampaign {
        EmailCampaign {
            id: Uuid::new_v4(),
            subject: "Monthly update".to_string(),
            content: "<p>Thank you</p>".to_string(),
            recipient_mode: mode.to_string(),
            filter_min_amount: None,
            filter_campaign_id: None,
            filter_date_from: None,
            filter_date_to: None,
            scheduled_at: Some(scheduled_at),
            status: "scheduled".to_string(),
            recipient_count: 0,
            sent_count: 0,
            failed_count: 0,
            sent_at: None,
            created_at: Utc::now(),
        }
    }

    fn sweep(
        campaigns: Arc<FakeEmailCampaigns>,
        donors: Vec<DonorRow>,
        provider: Arc<dyn EmailProvider>,
    ) -> SchedulerSweep {
        let resolver = Arc::new(RecipientResolver::new(
            Arc::new(FakeDonations { rows: donors }),
            Arc::new(FakeSubscribers),
        ));
        let dispatcher = Arc::new(BatchDispatcher::new(provider, "noreply@x.org".to_string()));
        SchedulerSweep::new(campaigns, resolver, dispatcher)
    }

    #[tokio::test]
    async fn test_nothing_due_is_a_no_op() {
        let future = Utc::now() + chrono::Duration::hours(2);
        let campaign = scheduled_campaign("donors", future);
        let id = campaign.id;
        let campaigns = Arc::new(FakeEmailCampaigns::with(vec![campaign]));
        let sweep = sweep(campaigns.clone(), vec![donor_row("a@x.com")], Arc::new(MockProvider));

        let report = sweep.process_due(Utc::now()).await.unwrap();

        assert_eq!(report.processed, 0);
        assert!(report.results.is_empty());
        assert_eq!(campaigns.get_row(id).status, "scheduled");
    }

    #[tokio::test]
    async fn test_due_campaign_is_sent() {
        let past = Utc::now() - chrono::Duration::minutes(5);
        let campaign = scheduled_campaign("donors", past);
        let id = campaign.id;
        let campaigns = Arc::new(FakeEmailCampaigns::with(vec![campaign]));
        let donors = vec![donor_row("a@x.com"), donor_row("b@x.com")];
        let sweep = sweep(campaigns.clone(), donors, Arc::new(MockProvider));

        let report = sweep.process_due(Utc::now()).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.results[0].sent_count, 2);
        let row = campaigns.get_row(id);
        assert_eq!(row.status, "sent");
        assert_eq!(row.sent_count, 2);
        assert_eq!(row.failed_count, 0);
        assert!(row.sent_at.is_some());
    }

    #[tokio::test]
    async fn test_second_sweep_finds_nothing() {
        let past = Utc::now() - chrono::Duration::minutes(5);
        let campaigns = Arc::new(FakeEmailCampaigns::with(vec![scheduled_campaign(
            "donors", past,
        )]));
        let sweep = sweep(campaigns, vec![donor_row("a@x.com")], Arc::new(MockProvider));

        let first = sweep.process_due(Utc::now()).await.unwrap();
        let second = sweep.process_due(Utc::now()).await.unwrap();

        assert_eq!(first.processed, 1);
        assert_eq!(second.processed, 0);
    }

    #[tokio::test]
    async fn test_already_claimed_campaign_is_skipped() {
        let past = Utc::now() - chrono::Duration::minutes(5);
        let mut campaign = scheduled_campaign("donors", past);
        let id = campaign.id;
        campaign.status = "sending".to_string();
        // list_due only returns scheduled rows, but guard the claim path
        // directly in case a row flips between listing and claiming
        let campaigns = Arc::new(FakeEmailCampaigns::with(vec![campaign]));

        assert!(!campaigns.claim_for_sending(id).await.unwrap());
        assert_eq!(campaigns.get_row(id).status, "sending");
    }

    #[tokio::test]
    async fn test_provider_outage_marks_campaign_failed() {
        let past = Utc::now() - chrono::Duration::minutes(5);
        let campaign = scheduled_campaign("donors", past);
        let id = campaign.id;
        let campaigns = Arc::new(FakeEmailCampaigns::with(vec![campaign]));
        let donors = vec![donor_row("a@x.com"), donor_row("b@x.com"), donor_row("c@x.com")];
        let sweep = sweep(campaigns.clone(), donors, Arc::new(FailingProvider));

        let report = sweep.process_due(Utc::now()).await.unwrap();

        assert_eq!(report.processed, 0);
        let row = campaigns.get_row(id);
        assert_eq!(row.status, "failed");
        assert_eq!(row.failed_count, 3);
        assert_eq!(row.sent_count, 0);
    }

    #[tokio::test]
    async fn test_empty_recipient_set_marks_failed_and_continues() {
        let past = Utc::now() - chrono::Duration::minutes(5);
        // Subscribers mode with zero subscribers resolves empty
        let empty = scheduled_campaign("subscribers", past);
        let sendable = scheduled_campaign("donors", past + chrono::Duration::minutes(1));
        let empty_id = empty.id;
        let sendable_id = sendable.id;
        let campaigns = Arc::new(FakeEmailCampaigns::with(vec![empty, sendable]));
        let sweep = sweep(campaigns.clone(), vec![donor_row("a@x.com")], Arc::new(MockProvider));

        let report = sweep.process_due(Utc::now()).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(campaigns.get_row(empty_id).status, "failed");
        assert_eq!(campaigns.get_row(empty_id).failed_count, 0);
        assert_eq!(campaigns.get_row(sendable_id).status, "sent");
    }

    #[tokio::test]
    async fn test_claim_store_error_does_not_abort_sweep() {
        let past = Utc::now() - chrono::Duration::minutes(5);
        let broken = scheduled_campaign("donors", past);
        let healthy = scheduled_campaign("donors", past + chrono::Duration::minutes(1));
        let broken_id = broken.id;
        let healthy_id = healthy.id;
        let campaigns = Arc::new(FakeEmailCampaigns::with(vec![broken, healthy]));
        campaigns.break_claim(broken_id);
        let sweep = sweep(campaigns.clone(), vec![donor_row("a@x.com")], Arc::new(MockProvider));

        let report = sweep.process_due(Utc::now()).await.unwrap();

        // The errored claim is skipped and stays scheduled for a retry
        assert_eq!(report.processed, 1);
        assert_eq!(campaigns.get_row(broken_id).status, "scheduled");
        assert_eq!(campaigns.get_row(healthy_id).status, "sent");
    }

    #[tokio::test]
    async fn test_recipient_count_refreshed_at_dispatch_time() {
        let past = Utc::now() - chrono::Duration::minutes(5);
        // Scheduled when only one donor matched
        let mut campaign = scheduled_campaign("donors", past);
        campaign.recipient_count = 1;
        let id = campaign.id;
        let campaigns = Arc::new(FakeEmailCampaigns::with(vec![campaign]));
        // Two more donors arrived before the sweep ran
        let donors = vec![
            donor_row("a@x.com"),
            donor_row("b@x.com"),
            donor_row("c@x.com"),
        ];
        let sweep = sweep(campaigns.clone(), donors, Arc::new(MockProvider));

        sweep.process_due(Utc::now()).await.unwrap();

        let row = campaigns.get_row(id);
        assert_eq!(row.status, "sent");
        assert_eq!(row.recipient_count, 3);
        assert_eq!(row.sent_count, 3);
        assert!(row.sent_count + row.failed_count <= row.recipient_count);
    }

    #[tokio::test]
    async fn test_csv_mode_scheduled_campaign_fails_cleanly() {
        // CSV rows are never persisted, so a scheduled csv_upload campaign
        // has nobody to send to
        let past = Utc::now() - chrono::Duration::minutes(5);
        let campaign = scheduled_campaign("csv_upload", past);
        let id = campaign.id;
        let campaigns = Arc::new(FakeEmailCampaigns::with(vec![campaign]));
        let sweep = sweep(campaigns.clone(), vec![donor_row("a@x.com")], Arc::new(MockProvider));

        let report = sweep.process_due(Utc::now()).await.unwrap();

        assert_eq!(report.processed, 0);
        assert_eq!(campaigns.get_row(id).status, "failed");
    }
}
