//! Donation repository

use async_trait::async_trait;
use givepath_common::types::DonationId;
use givepath_common::{Error, Result};
use uuid::Uuid;

use crate::db::DatabasePool;
use crate::models::{CreateDonation, Donation, DonorQuery, DonorRow};

/// Donation repository trait
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Create a pending donation
    async fn create(&self, input: CreateDonation) -> Result<Donation>;

    /// Get a donation by ID
    async fn get(&self, id: DonationId) -> Result<Option<Donation>>;

    /// Mark a donation successful and record the gateway payment ID.
    ///
    /// Targets exactly one row by primary key; returns the updated row or
    /// None when no such donation exists.
    async fn mark_success(
        &self,
        id: DonationId,
        razorpay_payment_id: &str,
    ) -> Result<Option<Donation>>;

    /// List donations, newest first, optionally filtered by status
    async fn list(&self, status: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Donation>>;

    /// Successful donation rows matching the query, newest first. An
    /// empty query yields every successful donation.
    async fn list_successful(&self, query: &DonorQuery) -> Result<Vec<DonorRow>>;
}

/// Database donation repository
#[derive(Clone)]
pub struct DbDonationRepository {
    pool: DatabasePool,
}

impl DbDonationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DonationRepository for DbDonationRepository {
    async fn create(&self, input: CreateDonation) -> Result<Donation> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, Donation>(
            r#"
            INSERT INTO donations (
                id, donor_name, donor_email, donor_phone, amount, campaign_id,
                razorpay_order_id, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.donor_name)
        .bind(&input.donor_email)
        .bind(&input.donor_phone)
        .bind(input.amount)
        .bind(input.campaign_id)
        .bind(&input.razorpay_order_id)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn get(&self, id: DonationId) -> Result<Option<Donation>> {
        sqlx::query_as::<_, Donation>("SELECT * FROM donations WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn mark_success(
        &self,
        id: DonationId,
        razorpay_payment_id: &str,
    ) -> Result<Option<Donation>> {
        sqlx::query_as::<_, Donation>(
            r#"
            UPDATE donations SET
                status = 'success',
                razorpay_payment_id = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(razorpay_payment_id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list(&self, status: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Donation>> {
        if let Some(status) = status {
            sqlx::query_as::<_, Donation>(
                r#"
                SELECT * FROM donations
                WHERE status = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.pool())
            .await
        } else {
            sqlx::query_as::<_, Donation>(
                r#"
                SELECT * FROM donations
                ORDER BY created_at DESC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.pool())
            .await
        }
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_successful(&self, query: &DonorQuery) -> Result<Vec<DonorRow>> {
        sqlx::query_as::<_, DonorRow>(
            r#"
            SELECT donor_name, donor_email, amount, created_at
            FROM donations
            WHERE status = 'success'
              AND ($1::bigint IS NULL OR amount >= $1)
              AND ($2::uuid IS NULL OR campaign_id = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at < $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.min_amount)
        .bind(query.campaign_id)
        .bind(query.created_from)
        .bind(query.created_before)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}
