//! Row models and input structs for the GivePath tables

use chrono::{DateTime, NaiveDate, Utc};
use givepath_common::types::{AdminUserId, CampaignId, DonationId, EmailCampaignId, SubscriberId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Donation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Pending,
    Success,
    Failed,
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DonationStatus::Pending => write!(f, "pending"),
            DonationStatus::Success => write!(f, "success"),
            DonationStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for DonationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DonationStatus::Pending),
            "success" => Ok(DonationStatus::Success),
            "failed" => Ok(DonationStatus::Failed),
            _ => Err(format!("Invalid donation status: {}", s)),
        }
    }
}

/// Donation model
///
/// The amount is immutable once the row exists; only `status` and
/// `razorpay_payment_id` are touched afterwards, exactly once, by payment
/// reconciliation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: Option<String>,
    /// Whole rupees
    pub amount: i64,
    pub campaign_id: Option<CampaignId>,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Get status enum
    pub fn status_enum(&self) -> Option<DonationStatus> {
        self.status.parse().ok()
    }
}

/// Create donation input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDonation {
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: Option<String>,
    pub amount: i64,
    pub campaign_id: Option<CampaignId>,
    pub razorpay_order_id: String,
}

/// Fundraising campaign model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub title: String,
    pub description: String,
    pub goal_amount: i64,
    /// Running total; only ever incremented, by payment reconciliation
    pub raised_amount: i64,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Percentage of the goal raised so far
    pub fn progress_percentage(&self) -> f64 {
        if self.goal_amount == 0 {
            0.0
        } else {
            (self.raised_amount as f64 / self.goal_amount as f64) * 100.0
        }
    }
}

/// Create campaign input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaign {
    pub title: String,
    pub description: String,
    pub goal_amount: i64,
    pub image_url: Option<String>,
}

/// Update campaign input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCampaign {
    pub title: Option<String>,
    pub description: Option<String>,
    pub goal_amount: Option<i64>,
    pub is_active: Option<bool>,
    pub image_url: Option<String>,
}

/// Recipient selection mode for an email campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientMode {
    Subscribers,
    Donors,
    FilteredDonors,
    CsvUpload,
}

impl std::fmt::Display for RecipientMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipientMode::Subscribers => write!(f, "subscribers"),
            RecipientMode::Donors => write!(f, "donors"),
            RecipientMode::FilteredDonors => write!(f, "filtered_donors"),
            RecipientMode::CsvUpload => write!(f, "csv_upload"),
        }
    }
}

impl std::str::FromStr for RecipientMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscribers" => Ok(RecipientMode::Subscribers),
            "donors" => Ok(RecipientMode::Donors),
            "filtered_donors" => Ok(RecipientMode::FilteredDonors),
            "csv_upload" => Ok(RecipientMode::CsvUpload),
            _ => Err(format!("Invalid recipient mode: {}", s)),
        }
    }
}

/// Optional constraints applied in `filtered_donors` mode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipientFilters {
    /// Minimum donation amount (inclusive)
    pub min_amount: Option<i64>,
    /// Restrict to donations against one fundraising campaign
    pub campaign_id: Option<CampaignId>,
    /// Donations created on or after this day (UTC)
    pub date_from: Option<NaiveDate>,
    /// Donations created up to and including this whole day (UTC)
    pub date_to: Option<NaiveDate>,
}

impl RecipientFilters {
    /// True when no constraint is set
    pub fn is_empty(&self) -> bool {
        self.min_amount.is_none()
            && self.campaign_id.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

/// Donation query with the date window expanded to timestamp bounds
#[derive(Debug, Clone, Default)]
pub struct DonorQuery {
    pub min_amount: Option<i64>,
    pub campaign_id: Option<CampaignId>,
    /// Inclusive lower bound
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound
    pub created_before: Option<DateTime<Utc>>,
}

impl DonorQuery {
    /// Expand recipient filters into timestamp bounds.
    ///
    /// `date_from` becomes midnight UTC at the start of that day;
    /// `date_to` is inclusive of the entire day, so the exclusive upper
    /// bound is midnight at the start of the following day.
    pub fn from_filters(filters: &RecipientFilters) -> Self {
        Self {
            min_amount: filters.min_amount,
            campaign_id: filters.campaign_id,
            created_from: filters
                .date_from
                .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc()),
            created_before: filters
                .date_to
                .map(|d| (d + chrono::Days::new(1)).and_time(chrono::NaiveTime::MIN).and_utc()),
        }
    }

    /// True when a donation created at `at` falls inside the date window
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(from) = self.created_from {
            if at < from {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if at >= before {
                return false;
            }
        }
        true
    }
}

/// Email campaign status
///
/// State machine: draft/scheduled -> sending -> sent | failed. The
/// transition to `sending` is an atomic claim taken before any provider
/// call; terminal records are never picked up again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailCampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
}

impl EmailCampaignStatus {
    /// A terminal campaign is never revisited by the sweep
    pub fn is_terminal(&self) -> bool {
        matches!(self, EmailCampaignStatus::Sent | EmailCampaignStatus::Failed)
    }
}

impl std::fmt::Display for EmailCampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailCampaignStatus::Draft => write!(f, "draft"),
            EmailCampaignStatus::Scheduled => write!(f, "scheduled"),
            EmailCampaignStatus::Sending => write!(f, "sending"),
            EmailCampaignStatus::Sent => write!(f, "sent"),
            EmailCampaignStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for EmailCampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EmailCampaignStatus::Draft),
            "scheduled" => Ok(EmailCampaignStatus::Scheduled),
            "sending" => Ok(EmailCampaignStatus::Sending),
            "sent" => Ok(EmailCampaignStatus::Sent),
            "failed" => Ok(EmailCampaignStatus::Failed),
            _ => Err(format!("Invalid email campaign status: {}", s)),
        }
    }
}

/// Email campaign model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EmailCampaign {
    pub id: EmailCampaignId,
    pub subject: String,
    pub content: String,
    pub recipient_mode: String,
    pub filter_min_amount: Option<i64>,
    pub filter_campaign_id: Option<CampaignId>,
    pub filter_date_from: Option<NaiveDate>,
    pub filter_date_to: Option<NaiveDate>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: String,
    pub recipient_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl EmailCampaign {
    /// Get status enum
    pub fn status_enum(&self) -> Option<EmailCampaignStatus> {
        self.status.parse().ok()
    }

    /// Get recipient mode enum
    pub fn recipient_mode_enum(&self) -> Option<RecipientMode> {
        self.recipient_mode.parse().ok()
    }

    /// Stored filter parameters
    pub fn filters(&self) -> RecipientFilters {
        RecipientFilters {
            min_amount: self.filter_min_amount,
            campaign_id: self.filter_campaign_id,
            date_from: self.filter_date_from,
            date_to: self.filter_date_to,
        }
    }
}

/// Create email campaign input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmailCampaign {
    pub subject: String,
    pub content: String,
    pub recipient_mode: RecipientMode,
    pub filters: RecipientFilters,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: EmailCampaignStatus,
    pub recipient_count: i32,
}

/// Newsletter subscriber model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Admin role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Admin,
    Editor,
    Viewer,
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminRole::Admin => write!(f, "admin"),
            AdminRole::Editor => write!(f, "editor"),
            AdminRole::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(AdminRole::Admin),
            "editor" => Ok(AdminRole::Editor),
            "viewer" => Ok(AdminRole::Viewer),
            _ => Err(format!("Invalid admin role: {}", s)),
        }
    }
}

/// Admin user model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Create admin user input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdminUser {
    pub email: String,
    pub full_name: Option<String>,
    pub role: AdminRole,
}

/// Update admin user input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAdminUser {
    pub full_name: Option<String>,
    pub role: Option<AdminRole>,
    pub is_active: Option<bool>,
}

/// One successful donation row as seen by the recipient resolver
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DonorRow {
    pub donor_name: String,
    pub donor_email: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            EmailCampaignStatus::Draft,
            EmailCampaignStatus::Scheduled,
            EmailCampaignStatus::Sending,
            EmailCampaignStatus::Sent,
            EmailCampaignStatus::Failed,
        ] {
            let parsed: EmailCampaignStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }

        assert!("archived".parse::<EmailCampaignStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(EmailCampaignStatus::Sent.is_terminal());
        assert!(EmailCampaignStatus::Failed.is_terminal());
        assert!(!EmailCampaignStatus::Scheduled.is_terminal());
        assert!(!EmailCampaignStatus::Sending.is_terminal());
    }

    #[test]
    fn test_recipient_mode_roundtrip() {
        for mode in [
            RecipientMode::Subscribers,
            RecipientMode::Donors,
            RecipientMode::FilteredDonors,
            RecipientMode::CsvUpload,
        ] {
            let parsed: RecipientMode = mode.to_string().parse().unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn test_donor_query_date_window() {
        let filters = RecipientFilters {
            date_from: Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            date_to: Some(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()),
            ..Default::default()
        };
        let query = DonorQuery::from_filters(&filters);

        assert_eq!(
            query.created_from.unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
        assert_eq!(
            query.created_before.unwrap().to_rfc3339(),
            "2024-03-11T00:00:00+00:00"
        );

        // 23:59:59 on the last day is in; midnight of the next day is out.
        let last_second = "2024-03-10T23:59:59Z".parse().unwrap();
        let next_midnight = "2024-03-11T00:00:00Z".parse().unwrap();
        assert!(query.contains(last_second));
        assert!(!query.contains(next_midnight));
    }

    #[test]
    fn test_donor_query_open_window() {
        let query = DonorQuery::from_filters(&RecipientFilters::default());
        assert!(query.contains(Utc::now()));
        assert!(query.created_from.is_none());
        assert!(query.created_before.is_none());
    }

    #[test]
    fn test_campaign_progress() {
        let campaign = Campaign {
            id: uuid::Uuid::new_v4(),
            title: "Clean Water".to_string(),
            description: String::new(),
            goal_amount: 10000,
            raised_amount: 2500,
            is_active: true,
            image_url: None,
            created_at: Utc::now(),
        };
        assert_eq!(campaign.progress_percentage(), 25.0);
    }
}
