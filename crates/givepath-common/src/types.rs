//! Common types for GivePath

use uuid::Uuid;

/// Unique identifier for donations
pub type DonationId = Uuid;

/// Unique identifier for fundraising campaigns
pub type CampaignId = Uuid;

/// Unique identifier for email campaigns
pub type EmailCampaignId = Uuid;

/// Unique identifier for newsletter subscribers
pub type SubscriberId = Uuid;

/// Unique identifier for admin users
pub type AdminUserId = Uuid;

/// Returns true when a string is plausibly an email address.
///
/// The intake rule is deliberately loose: a recipient row only needs a
/// non-empty address containing `@` to be accepted; anything stricter is
/// left to the email provider.
pub fn is_plausible_email(s: &str) -> bool {
    !s.is_empty() && s.contains('@')
}
