//! GivePath Core - Business logic
//!
//! The four moving parts of the donation platform: recipient resolution,
//! batched email dispatch, the scheduled-campaign sweep, and payment
//! reconciliation. Everything here works against the repository traits
//! from `givepath-storage`, so components are constructed with explicit
//! dependencies and can be exercised with in-memory fakes.

pub mod mailer;
pub mod payments;
pub mod recipients;
pub mod sweep;

pub use mailer::{BatchDispatcher, DispatchReport, EmailProvider, MockProvider, SendGridClient};
pub use payments::{PaymentReconciler, RazorpayClient, ReconcileOutcome};
pub use recipients::{CsvRow, DonorPreview, RecipientResolver};
pub use sweep::{SchedulerSweep, SweepReport, SweepResult};
