//! Email campaign repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use givepath_common::types::EmailCampaignId;
use givepath_common::{Error, Result};
use uuid::Uuid;

use crate::db::DatabasePool;
use crate::models::{CreateEmailCampaign, EmailCampaign};

/// Email campaign repository trait
#[async_trait]
pub trait EmailCampaignRepository: Send + Sync {
    /// Persist a new email campaign
    async fn create(&self, input: CreateEmailCampaign) -> Result<EmailCampaign>;

    /// Get an email campaign by ID
    async fn get(&self, id: EmailCampaignId) -> Result<Option<EmailCampaign>>;

    /// List email campaigns, newest first, optionally filtered by status
    async fn list(&self, status: Option<&str>) -> Result<Vec<EmailCampaign>>;

    /// Scheduled campaigns whose scheduled time has elapsed
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<EmailCampaign>>;

    /// Claim a scheduled campaign for sending.
    ///
    /// Compare-against-current-status update; returns false when the row
    /// was already claimed (or is no longer scheduled), in which case the
    /// caller must skip it.
    async fn claim_for_sending(&self, id: EmailCampaignId) -> Result<bool>;

    /// Transition to `sent`, recording the send timestamp and counters.
    ///
    /// `recipient_count` is the total resolved at dispatch time; it
    /// supersedes the estimate stored when the campaign was scheduled,
    /// keeping `sent_count + failed_count <= recipient_count`.
    async fn mark_sent(
        &self,
        id: EmailCampaignId,
        recipient_count: i32,
        sent_count: i32,
        failed_count: i32,
    ) -> Result<()>;

    /// Transition to `failed`, recording the resolved recipient total
    async fn mark_failed(
        &self,
        id: EmailCampaignId,
        recipient_count: i32,
        failed_count: i32,
    ) -> Result<()>;
}

/// Database email campaign repository
#[derive(Clone)]
pub struct DbEmailCampaignRepository {
    pool: DatabasePool,
}

impl DbEmailCampaignRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailCampaignRepository for DbEmailCampaignRepository {
    async fn create(&self, input: CreateEmailCampaign) -> Result<EmailCampaign> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, EmailCampaign>(
            r#"
            INSERT INTO email_campaigns (
                id, subject, content, recipient_mode, filter_min_amount,
                filter_campaign_id, filter_date_from, filter_date_to,
                scheduled_at, status, recipient_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.subject)
        .bind(&input.content)
        .bind(input.recipient_mode.to_string())
        .bind(input.filters.min_amount)
        .bind(input.filters.campaign_id)
        .bind(input.filters.date_from)
        .bind(input.filters.date_to)
        .bind(input.scheduled_at)
        .bind(input.status.to_string())
        .bind(input.recipient_count)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn get(&self, id: EmailCampaignId) -> Result<Option<EmailCampaign>> {
        sqlx::query_as::<_, EmailCampaign>("SELECT * FROM email_campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list(&self, status: Option<&str>) -> Result<Vec<EmailCampaign>> {
        if let Some(status) = status {
            sqlx::query_as::<_, EmailCampaign>(
                r#"
                SELECT * FROM email_campaigns
                WHERE status = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(status)
            .fetch_all(self.pool.pool())
            .await
        } else {
            sqlx::query_as::<_, EmailCampaign>(
                "SELECT * FROM email_campaigns ORDER BY created_at DESC",
            )
            .fetch_all(self.pool.pool())
            .await
        }
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<EmailCampaign>> {
        sqlx::query_as::<_, EmailCampaign>(
            r#"
            SELECT * FROM email_campaigns
            WHERE status = 'scheduled'
              AND scheduled_at IS NOT NULL
              AND scheduled_at <= $1
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn claim_for_sending(&self, id: EmailCampaignId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE email_campaigns SET status = 'sending' WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_sent(
        &self,
        id: EmailCampaignId,
        recipient_count: i32,
        sent_count: i32,
        failed_count: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE email_campaigns SET
                status = 'sent',
                sent_at = NOW(),
                recipient_count = $2,
                sent_count = $3,
                failed_count = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(recipient_count)
        .bind(sent_count)
        .bind(failed_count)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: EmailCampaignId,
        recipient_count: i32,
        failed_count: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE email_campaigns SET
                status = 'failed',
                recipient_count = $2,
                failed_count = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(recipient_count)
        .bind(failed_count)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}
