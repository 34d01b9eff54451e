//! Report intake, admission control, and lifecycle management.
//!
//! A submission is validated, gated per submitter by [`admission::AdmissionPolicy`]
//! (daily cap, then cooldown window), and persisted as a `pending` report.
//! Administrators move reports through the strict status graph
//! (pending -> verified/spam, verified -> resolved) via the service facade,
//! which sends exactly one SMS per successful transition after the change is
//! durable.

pub mod admission;
pub mod domain;
pub mod lifecycle;
pub mod router;
pub mod service;
pub mod sms;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use admission::{AdmissionDenied, AdmissionPolicy, DayBoundary, RateLimitSnapshot};
pub use domain::{
    AdminId, Location, MobileNumber, Report, ReportId, ReportStatus, ReportSubmission,
};
pub use lifecycle::InvalidTransition;
pub use router::report_router;
pub use service::{
    DashboardStats, HeatmapPoint, ReportService, ReportServiceError, SubmissionReceipt,
    SubmitterHistory,
};
pub use store::{
    DeliveryReceipt, Notifier, NotifyError, ReportStore, ReviewPatch, SmsMessage, StoreError,
};
pub use validation::{SubmissionGuard, ValidationError};
