use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AdminId, MobileNumber, Report, ReportId, ReportStatus};

/// Fields written by a successful review. The store applies the patch only if
/// the report's current status equals `expected` in [`ReportStore::update_status`],
/// so two racing reviews of the same report cannot both land.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPatch {
    pub status: ReportStatus,
    pub admin_notes: Option<String>,
    /// `Some` only on the first transition out of `pending`; the store must
    /// leave the existing `verified_at`/`verified_by` untouched when `None`.
    pub reviewed: Option<(DateTime<Utc>, AdminId)>,
}

/// Storage abstraction so the service can be exercised in isolation.
///
/// `count_since`/`most_recent_since` exist for admission control: rate-limit
/// state is always derived from stored `reported_at` timestamps, never from a
/// separately maintained counter.
pub trait ReportStore: Send + Sync {
    fn insert(&self, report: Report) -> Result<Report, StoreError>;
    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError>;
    fn count_since(
        &self,
        submitter: &MobileNumber,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError>;
    fn most_recent_since(
        &self,
        submitter: &MobileNumber,
        since: DateTime<Utc>,
    ) -> Result<Option<Report>, StoreError>;
    fn update_status(
        &self,
        id: &ReportId,
        expected: ReportStatus,
        patch: ReviewPatch,
    ) -> Result<Report, StoreError>;
    fn list(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, StoreError>;
    fn for_submitter(&self, submitter: &MobileNumber) -> Result<Vec<Report>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("report changed concurrently (expected status '{}')", .expected.label())]
    Conflict { expected: ReportStatus },
    #[error("report not found")]
    NotFound,
    #[error("report store unavailable: {0}")]
    Unavailable(String),
}

/// Outbound SMS payload handed to the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsMessage {
    pub body: String,
}

/// Provider acknowledgement for a dispatched message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub provider_id: String,
}

/// Trait describing the outbound SMS hook (e.g., a Twilio adapter).
///
/// `send` may block for the provider round-trip; the service runs it on a
/// background thread, logs failures, and never lets them fail a committed
/// state change.
pub trait Notifier: Send + Sync {
    fn send(&self, to: &MobileNumber, message: SmsMessage) -> Result<DeliveryReceipt, NotifyError>;
}

/// SMS dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("sms transport unavailable: {0}")]
    Transport(String),
}
