//! Newsletter subscriber repository

use async_trait::async_trait;
use givepath_common::{Error, Result};
use uuid::Uuid;

use crate::db::DatabasePool;
use crate::models::Subscriber;

/// Newsletter subscriber repository trait
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Get a subscriber by email
    async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>>;

    /// Insert a new active subscriber
    async fn subscribe(&self, email: &str) -> Result<Subscriber>;

    /// Emails of every active subscriber
    async fn list_active_emails(&self) -> Result<Vec<String>>;

    /// Number of active subscribers
    async fn count_active(&self) -> Result<i64>;
}

/// Database newsletter subscriber repository
#[derive(Clone)]
pub struct DbSubscriberRepository {
    pool: DatabasePool,
}

impl DbSubscriberRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberRepository for DbSubscriberRepository {
    async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        sqlx::query_as::<_, Subscriber>("SELECT * FROM newsletter_subscribers WHERE email = $1")
            .bind(email)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn subscribe(&self, email: &str) -> Result<Subscriber> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, Subscriber>(
            r#"
            INSERT INTO newsletter_subscribers (id, email)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_active_emails(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT email FROM newsletter_subscribers WHERE is_active")
                .fetch_all(self.pool.pool())
                .await
                .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|(email,)| email).collect())
    }

    async fn count_active(&self) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM newsletter_subscribers WHERE is_active")
                .fetch_one(self.pool.pool())
                .await
                .map_err(|e| Error::Database(e.to_string()))?;

        Ok(count.0)
    }
}
