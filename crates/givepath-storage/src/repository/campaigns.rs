//! Fundraising campaign repository

use async_trait::async_trait;
use givepath_common::types::CampaignId;
use givepath_common::{Error, Result};
use uuid::Uuid;

use crate::db::DatabasePool;
use crate::models::{Campaign, CreateCampaign, UpdateCampaign};

/// Fundraising campaign repository trait
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Create a new campaign
    async fn create(&self, input: CreateCampaign) -> Result<Campaign>;

    /// Get a campaign by ID
    async fn get(&self, id: CampaignId) -> Result<Option<Campaign>>;

    /// List campaigns, newest first; `active_only` restricts to active ones
    async fn list(&self, active_only: bool) -> Result<Vec<Campaign>>;

    /// Update a campaign
    async fn update(&self, id: CampaignId, input: UpdateCampaign) -> Result<Option<Campaign>>;

    /// Delete a campaign
    async fn delete(&self, id: CampaignId) -> Result<bool>;

    /// Accrete a reconciled donation onto the raised total.
    ///
    /// Single server-side increment so concurrent reconciliations against
    /// the same campaign cannot lose an update.
    async fn increment_raised(&self, id: CampaignId, amount: i64) -> Result<bool>;
}

/// Database fundraising campaign repository
#[derive(Clone)]
pub struct DbCampaignRepository {
    pool: DatabasePool,
}

impl DbCampaignRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for DbCampaignRepository {
    async fn create(&self, input: CreateCampaign) -> Result<Campaign> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (id, title, description, goal_amount, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.goal_amount)
        .bind(&input.image_url)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn get(&self, id: CampaignId) -> Result<Option<Campaign>> {
        sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Campaign>> {
        if active_only {
            sqlx::query_as::<_, Campaign>(
                "SELECT * FROM campaigns WHERE is_active ORDER BY created_at DESC",
            )
            .fetch_all(self.pool.pool())
            .await
        } else {
            sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns ORDER BY created_at DESC")
                .fetch_all(self.pool.pool())
                .await
        }
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn update(&self, id: CampaignId, input: UpdateCampaign) -> Result<Option<Campaign>> {
        sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE campaigns SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                goal_amount = COALESCE($4, goal_amount),
                is_active = COALESCE($5, is_active),
                image_url = COALESCE($6, image_url)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.goal_amount)
        .bind(input.is_active)
        .bind(&input.image_url)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn delete(&self, id: CampaignId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_raised(&self, id: CampaignId, amount: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE campaigns SET raised_amount = raised_amount + $2 WHERE id = $1",
        )
        .bind(id)
        .bind(amount)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
