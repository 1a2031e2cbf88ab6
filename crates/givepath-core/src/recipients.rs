//! Recipient Resolver - Turns a selection mode plus filters into a
//! de-duplicated set of destination addresses

use std::collections::HashSet;
use std::sync::Arc;

use givepath_common::types::is_plausible_email;
use givepath_common::Result;
use givepath_storage::models::{DonorQuery, DonorRow, RecipientFilters, RecipientMode};
use givepath_storage::repository::{DonationRepositoryTrait, SubscriberRepositoryTrait};
use serde::{Deserialize, Serialize};

/// Preview entries are capped so the admin UI never renders an unbounded list
pub const PREVIEW_LIMIT: usize = 100;

/// One uploaded CSV row; columns other than `email` are ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvRow {
    #[serde(default)]
    pub email: Option<String>,
}

/// Per-donor aggregate shown in the recipient preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorPreview {
    pub name: String,
    pub email: String,
    /// Total donated across all matching donations
    pub total: i64,
    /// Number of matching donations
    pub count: i64,
}

/// Recipient Resolver
///
/// Read-only against the donation and subscriber tables; a store error
/// propagates and the caller must treat it as "0 recipients, do not
/// proceed".
pub struct RecipientResolver {
    donations: Arc<dyn DonationRepositoryTrait>,
    subscribers: Arc<dyn SubscriberRepositoryTrait>,
}

impl RecipientResolver {
    pub fn new(
        donations: Arc<dyn DonationRepositoryTrait>,
        subscribers: Arc<dyn SubscriberRepositoryTrait>,
    ) -> Self {
        Self {
            donations,
            subscribers,
        }
    }

    /// Resolve a recipient mode into a de-duplicated list of addresses.
    ///
    /// `csv_rows` is only consulted in csv_upload mode; donor modes
    /// de-duplicate by email, first occurrence winning.
    pub async fn resolve(
        &self,
        mode: RecipientMode,
        filters: &RecipientFilters,
        csv_rows: &[CsvRow],
    ) -> Result<Vec<String>> {
        match mode {
            RecipientMode::Subscribers => self.subscribers.list_active_emails().await,
            RecipientMode::Donors => {
                let rows = self
                    .donations
                    .list_successful(&DonorQuery::default())
                    .await?;
                Ok(dedup_emails(rows.iter().map(|r| r.donor_email.clone())))
            }
            RecipientMode::FilteredDonors => {
                let rows = self
                    .donations
                    .list_successful(&DonorQuery::from_filters(filters))
                    .await?;
                Ok(dedup_emails(rows.iter().map(|r| r.donor_email.clone())))
            }
            RecipientMode::CsvUpload => Ok(csv_emails(csv_rows)),
        }
    }

    /// Aggregate matching donors for the admin preview, sorted by total
    /// donated descending and capped at [`PREVIEW_LIMIT`] entries.
    ///
    /// Only donor modes have a meaningful preview; the other modes yield
    /// an empty list.
    pub async fn preview(
        &self,
        mode: RecipientMode,
        filters: &RecipientFilters,
    ) -> Result<Vec<DonorPreview>> {
        let query = match mode {
            RecipientMode::Donors => DonorQuery::default(),
            RecipientMode::FilteredDonors => DonorQuery::from_filters(filters),
            RecipientMode::Subscribers | RecipientMode::CsvUpload => return Ok(Vec::new()),
        };

        let rows = self.donations.list_successful(&query).await?;
        let mut donors = aggregate_donors(&rows);
        donors.truncate(PREVIEW_LIMIT);
        Ok(donors)
    }

    /// Number of distinct recipients the mode/filters would resolve to
    pub async fn count(
        &self,
        mode: RecipientMode,
        filters: &RecipientFilters,
        csv_rows: &[CsvRow],
    ) -> Result<usize> {
        match mode {
            RecipientMode::Subscribers => {
                let count = self.subscribers.count_active().await?;
                Ok(count as usize)
            }
            _ => Ok(self.resolve(mode, filters, csv_rows).await?.len()),
        }
    }
}

/// De-duplicate emails preserving first-seen order
fn dedup_emails(emails: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for email in emails {
        if seen.insert(email.clone()) {
            out.push(email);
        }
    }
    out
}

/// Valid, de-duplicated addresses from uploaded CSV rows.
///
/// A row counts only when its email field is present and contains `@`;
/// invalid rows are silently dropped.
fn csv_emails(rows: &[CsvRow]) -> Vec<String> {
    dedup_emails(
        rows.iter()
            .filter_map(|row| row.email.clone())
            .filter(|email| is_plausible_email(email)),
    )
}

/// Aggregate donation rows per donor email, sorted by total descending.
///
/// The donor name comes from the first-seen donation for that email.
fn aggregate_donors(rows: &[DonorRow]) -> Vec<DonorPreview> {
    let mut donors: Vec<DonorPreview> = Vec::new();
    let mut index: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    for row in rows {
        match index.get(row.donor_email.as_str()) {
            Some(&i) => {
                donors[i].total += row.amount;
                donors[i].count += 1;
            }
            None => {
                index.insert(row.donor_email.as_str(), donors.len());
                donors.push(DonorPreview {
                    name: row.donor_name.clone(),
                    email: row.donor_email.clone(),
                    total: row.amount,
                    count: 1,
                });
            }
        }
    }

    donors.sort_by(|a, b| b.total.cmp(&a.total));
    donors
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use givepath_common::types::DonationId;
    use givepath_storage::models::{CreateDonation, Donation};
    use pretty_assertions::assert_eq;

    fn donor_row(name: &str, email: &str, amount: i64) -> DonorRow {
        DonorRow {
            donor_name: name.to_string(),
            donor_email: email.to_string(),
            amount,
            created_at: Utc::now(),
        }
    }

    /// Donation store serving a fixed set of successful rows
    struct FakeDonations {
        rows: Vec<DonorRow>,
    }

    #[async_trait]
    impl DonationRepositoryTrait for FakeDonations {
        async fn create(&self, _input: CreateDonation) -> Result<Donation> {
            unimplemented!("not used by resolver tests")
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

    struct FakeSubscribers {
        emails: Vec<String>,
    }

    #[async_trait]
    impl SubscriberRepositoryTrait for FakeSubscribers {
        async fn get_by_email(
            &self,
            _email: &str,
        ) -> Result<Option<givepath_storage::models::Subscriber>> {
            Ok(None)
        }

        async fn subscribe(&self, _email: &str) -> Result<givepath_storage::models::Subscriber> {
            unimplemented!("not used by resolver tests")
        }

        async fn list_active_emails(&self) -> Result<Vec<String>> {
            Ok(self.emails.clone())
        }

        async fn count_active(&self) -> Result<i64> {
            Ok(self.emails.len() as i64)
        }
    }

    fn resolver(rows: Vec<DonorRow>, subscriber_emails: Vec<&str>) -> RecipientResolver {
        RecipientResolver::new(
            Arc::new(FakeDonations { rows }),
            Arc::new(FakeSubscribers {
                emails: subscriber_emails.into_iter().map(String::from).collect(),
            }),
        )
    }

    #[tokio::test]
    async fn test_donors_deduplicated() {
        let resolver = resolver(
            vec![
                donor_row("Asha", "asha@x.com", 500),
                donor_row("Ravi", "ravi@x.com", 200),
                donor_row("Asha", "asha@x.com", 300),
            ],
            vec![],
        );

        let recipients = resolver
            .resolve(RecipientMode::Donors, &RecipientFilters::default(), &[])
            .await
            .unwrap();

        assert_eq!(recipients, vec!["asha@x.com", "ravi@x.com"]);

        let unique: HashSet<_> = recipients.iter().collect();
        assert_eq!(unique.len(), recipients.len());
    }

    #[tokio::test]
    async fn test_filtered_donors_min_amount() {
        let resolver = resolver(
            vec![
                donor_row("Asha", "asha@x.com", 1500),
                donor_row("Ravi", "ravi@x.com", 200),
                donor_row("Mira", "mira@x.com", 1000),
            ],
            vec![],
        );

        let filters = RecipientFilters {
            min_amount: Some(1000),
            ..Default::default()
        };
        let recipients = resolver
            .resolve(RecipientMode::FilteredDonors, &filters, &[])
            .await
            .unwrap();

        assert_eq!(recipients, vec!["asha@x.com", "mira@x.com"]);
        assert_eq!(
            resolver
                .count(RecipientMode::FilteredDonors, &filters, &[])
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_csv_upload_drops_invalid_rows() {
        let resolver = resolver(vec![], vec![]);
        let rows = vec![
            CsvRow {
                email: Some("a@x.com".to_string()),
            },
            CsvRow {
                email: Some("bad".to_string()),
            },
            CsvRow {
                email: Some("b@x.com".to_string()),
            },
            CsvRow { email: None },
        ];

        let recipients = resolver
            .resolve(RecipientMode::CsvUpload, &RecipientFilters::default(), &rows)
            .await
            .unwrap();

        assert_eq!(recipients, vec!["a@x.com", "b@x.com"]);
    }

    #[tokio::test]
    async fn test_subscribers_mode() {
        let resolver = resolver(vec![], vec!["one@x.com", "two@x.com"]);

        let recipients = resolver
            .resolve(
                RecipientMode::Subscribers,
                &RecipientFilters::default(),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(recipients.len(), 2);

        let count = resolver
            .count(RecipientMode::Subscribers, &RecipientFilters::default(), &[])
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_preview_aggregates_and_sorts() {
        let resolver = resolver(
            vec![
                donor_row("Ravi", "ravi@x.com", 200),
                donor_row("Asha", "asha@x.com", 500),
                donor_row("Asha", "asha@x.com", 300),
            ],
            vec![],
        );

        let preview = resolver
            .preview(RecipientMode::Donors, &RecipientFilters::default())
            .await
            .unwrap();

        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0].email, "asha@x.com");
        assert_eq!(preview[0].total, 800);
        assert_eq!(preview[0].count, 2);
        assert_eq!(preview[1].email, "ravi@x.com");
    }

    #[tokio::test]
    async fn test_preview_capped() {
        let rows: Vec<DonorRow> = (0..150)
            .map(|i| donor_row("Donor", &format!("donor{}@x.com", i), 100 + i))
            .collect();
        let resolver = resolver(rows, vec![]);

        let preview = resolver
            .preview(RecipientMode::Donors, &RecipientFilters::default())
            .await
            .unwrap();

        assert_eq!(preview.len(), PREVIEW_LIMIT);
        // Highest totals survive the cap
        assert_eq!(preview[0].total, 249);
    }

    #[tokio::test]
    async fn test_preview_empty_for_non_donor_modes() {
        let resolver = resolver(vec![donor_row("Asha", "asha@x.com", 500)], vec!["s@x.com"]);

        let preview = resolver
            .preview(RecipientMode::Subscribers, &RecipientFilters::default())
            .await
            .unwrap();
        assert!(preview.is_empty());
    }
}
