use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::admission::{AdmissionDenied, AdmissionPolicy, RateLimitSnapshot};
use super::domain::{
    AdminId, MobileNumber, Report, ReportId, ReportStatus, ReportSubmission,
};
use super::lifecycle::{plan_transition, InvalidTransition};
use super::sms;
use super::store::{Notifier, ReportStore, SmsMessage, StoreError};
use super::validation::{SubmissionGuard, ValidationError};

static REPORT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_report_id() -> ReportId {
    let id = REPORT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReportId(format!("rep-{id:06}"))
}

/// Hands committed notifications to detached delivery threads. The caller
/// returns as soon as the message is queued; a slow or failing provider only
/// shows up in the logs, never in the caller's latency or result.
struct SmsDispatcher<N> {
    notifier: Arc<N>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl<N> SmsDispatcher<N>
where
    N: Notifier + 'static,
{
    fn new(notifier: Arc<N>) -> Self {
        Self {
            notifier,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    fn dispatch(&self, to: MobileNumber, message: SmsMessage, report_id: ReportId) {
        let notifier = self.notifier.clone();
        let worker = std::thread::spawn(move || {
            if let Err(err) = notifier.send(&to, message) {
                warn!(report_id = %report_id.0, error = %err, "sms delivery failed");
            }
        });

        let mut in_flight = lock_unpoisoned(&self.in_flight);
        in_flight.retain(|handle| !handle.is_finished());
        in_flight.push(worker);
    }

    /// Block until every queued delivery has been attempted.
    fn drain(&self) {
        let pending = std::mem::take(&mut *lock_unpoisoned(&self.in_flight));
        for worker in pending {
            let _ = worker.join();
        }
    }
}

// Delivery threads never panic while holding the lock, but a poisoned guard
// still carries usable data.
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Service composing the submission guard, admission policy, store, and
/// SMS notifier.
///
/// This is the only writer of a report's `status`/`verified_at`/`verified_by`
/// fields. Admission control applies to submissions only; review transitions
/// enter the lifecycle directly.
pub struct ReportService<S, N> {
    store: Arc<S>,
    sms: SmsDispatcher<N>,
    guard: SubmissionGuard,
    policy: AdmissionPolicy,
}

impl<S, N> ReportService<S, N>
where
    S: ReportStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, policy: AdmissionPolicy) -> Self {
        Self {
            store,
            sms: SmsDispatcher::new(notifier),
            guard: SubmissionGuard,
            policy,
        }
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Wait for every queued SMS delivery attempt to finish. Shutdown paths
    /// and tests call this; request handlers never do.
    pub fn flush_notifications(&self) {
        self.sms.drain();
    }

    /// Submit a new report, gated by validation and admission control.
    pub fn submit(
        &self,
        submission: ReportSubmission,
    ) -> Result<SubmissionReceipt, ReportServiceError> {
        self.submit_at(submission, Utc::now())
    }

    /// Like [`Self::submit`] with an explicit clock, so tests can pin time.
    ///
    /// A rejected submission never creates a row and never notifies. Store
    /// failures during the history read fail the whole check closed.
    pub fn submit_at(
        &self,
        submission: ReportSubmission,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, ReportServiceError> {
        let checked = self.guard.check(submission)?;

        self.policy
            .check(self.store.as_ref(), &checked.submitter, now)??;

        let report = Report {
            id: next_report_id(),
            submitter: checked.submitter,
            crime_type: checked.crime_type,
            description: checked.description,
            location: checked.location,
            status: ReportStatus::Pending,
            reported_at: now,
            verified_at: None,
            verified_by: None,
            admin_notes: None,
        };

        let stored = self.store.insert(report)?;

        // The report is already durable; confirmation goes out in the
        // background.
        self.sms.dispatch(
            stored.submitter.clone(),
            sms::submission_confirmation(&stored.id),
            stored.id.clone(),
        );

        Ok(SubmissionReceipt {
            short_code: stored.id.short_code(),
            report_id: stored.id,
            message: "Report submitted successfully. You will receive an SMS confirmation."
                .to_string(),
        })
    }

    /// Review a report: apply one transition of the status graph.
    pub fn review(
        &self,
        report_id: &ReportId,
        admin: AdminId,
        target: ReportStatus,
        notes: Option<String>,
    ) -> Result<Report, ReportServiceError> {
        self.review_at(report_id, admin, target, notes, Utc::now())
    }

    /// Like [`Self::review`] with an explicit clock.
    ///
    /// The store applies the expected-status check and the patch atomically;
    /// a racing review observes `StoreError::Conflict`. The status-update SMS
    /// is queued only after the update has committed, and the administrator's
    /// response never waits on delivery.
    pub fn review_at(
        &self,
        report_id: &ReportId,
        admin: AdminId,
        target: ReportStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Report, ReportServiceError> {
        let current = self
            .store
            .fetch(report_id)?
            .ok_or(StoreError::NotFound)?;

        let patch = plan_transition(&current, target, admin, notes, now)?;
        let updated = self.store.update_status(report_id, current.status, patch)?;

        self.sms.dispatch(
            updated.submitter.clone(),
            sms::status_update(&updated.id, target),
            updated.id.clone(),
        );

        Ok(updated)
    }

    /// Fetch a single report.
    pub fn get(&self, report_id: &ReportId) -> Result<Report, ReportServiceError> {
        let report = self
            .store
            .fetch(report_id)?
            .ok_or(StoreError::NotFound)?;
        Ok(report)
    }

    /// Admin listing, optionally filtered by status, newest first.
    pub fn list(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, ReportServiceError> {
        let mut reports = self.store.list(status)?;
        reports.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
        Ok(reports)
    }

    /// Dashboard counters per status.
    pub fn dashboard_stats(&self) -> Result<DashboardStats, ReportServiceError> {
        let reports = self.store.list(None)?;
        let mut stats = DashboardStats {
            total: reports.len() as u32,
            ..DashboardStats::default()
        };
        for report in &reports {
            match report.status {
                ReportStatus::Pending => stats.pending += 1,
                ReportStatus::Verified => stats.verified += 1,
                ReportStatus::Spam => stats.spam += 1,
                ReportStatus::Resolved => stats.resolved += 1,
            }
        }
        Ok(stats)
    }

    /// A submitter's reports plus their derived rate-limit standing.
    pub fn submitter_history(
        &self,
        submitter: &MobileNumber,
        now: DateTime<Utc>,
    ) -> Result<SubmitterHistory, ReportServiceError> {
        let mut reports = self.store.for_submitter(submitter)?;
        reports.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
        let rate_limit = self.policy.snapshot(self.store.as_ref(), submitter, now)?;
        Ok(SubmitterHistory { reports, rate_limit })
    }

    /// Coordinates of verified and resolved reports, for the map collaborator.
    pub fn heatmap_points(&self) -> Result<Vec<HeatmapPoint>, ReportServiceError> {
        let mut points = Vec::new();
        for status in [ReportStatus::Verified, ReportStatus::Resolved] {
            for report in self.store.list(Some(status))? {
                points.push(HeatmapPoint {
                    latitude: report.location.latitude,
                    longitude: report.location.longitude,
                    crime_type: report.crime_type,
                });
            }
        }
        Ok(points)
    }
}

/// Caller-facing acknowledgement for an accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub report_id: ReportId,
    pub short_code: String,
    pub message: String,
}

/// Per-status counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: u32,
    pub pending: u32,
    pub verified: u32,
    pub spam: u32,
    pub resolved: u32,
}

/// History plus rate-limit standing for one submitter.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitterHistory {
    pub reports: Vec<Report>,
    pub rate_limit: RateLimitSnapshot,
}

/// Map data point for verified/resolved reports.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub crime_type: String,
}

/// Error raised by the report service.
#[derive(Debug, thiserror::Error)]
pub enum ReportServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    RateLimit(#[from] AdmissionDenied),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReportServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReportServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ReportServiceError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            ReportServiceError::Transition(_) => StatusCode::CONFLICT,
            ReportServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            ReportServiceError::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
            ReportServiceError::Store(StoreError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}
