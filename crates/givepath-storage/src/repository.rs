//! Repository layer for data access

pub mod admin_users;
pub mod campaigns;
pub mod donations;
pub mod email_campaigns;
pub mod subscribers;

// Re-export concrete repository implementations with simple names
pub use admin_users::DbAdminUserRepository as AdminUserRepository;
pub use campaigns::DbCampaignRepository as CampaignRepository;
pub use donations::DbDonationRepository as DonationRepository;
pub use email_campaigns::DbEmailCampaignRepository as EmailCampaignRepository;
pub use subscribers::DbSubscriberRepository as SubscriberRepository;

// Re-export repository traits
pub use admin_users::AdminUserRepository as AdminUserRepositoryTrait;
pub use campaigns::CampaignRepository as CampaignRepositoryTrait;
pub use donations::DonationRepository as DonationRepositoryTrait;
pub use email_campaigns::EmailCampaignRepository as EmailCampaignRepositoryTrait;
pub use subscribers::SubscriberRepository as SubscriberRepositoryTrait;
