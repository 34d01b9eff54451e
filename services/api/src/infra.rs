use chrono::{DateTime, Utc};
use crimetrack::reports::{
    DeliveryReceipt, MobileNumber, Notifier, NotifyError, Report, ReportId, ReportStatus,
    ReportStore, ReviewPatch, SmsMessage, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-process report store backing the default deployment and the demo.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReportStore {
    records: Arc<Mutex<HashMap<ReportId, Report>>>,
}

impl ReportStore for InMemoryReportStore {
    fn insert(&self, report: Report) -> Result<Report, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&report.id) {
            return Err(StoreError::Conflict {
                expected: report.status,
            });
        }
        guard.insert(report.id.clone(), report.clone());
        Ok(report)
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn count_since(
        &self,
        submitter: &MobileNumber,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|report| &report.submitter == submitter && report.reported_at >= since)
            .count() as u32)
    }

    fn most_recent_since(
        &self,
        submitter: &MobileNumber,
        since: DateTime<Utc>,
    ) -> Result<Option<Report>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|report| &report.submitter == submitter && report.reported_at >= since)
            .max_by_key(|report| report.reported_at)
            .cloned())
    }

    fn update_status(
        &self,
        id: &ReportId,
        expected: ReportStatus,
        patch: ReviewPatch,
    ) -> Result<Report, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let report = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        if report.status != expected {
            return Err(StoreError::Conflict { expected });
        }
        report.status = patch.status;
        report.admin_notes = patch.admin_notes;
        if let Some((at, admin)) = patch.reviewed {
            report.verified_at = Some(at);
            report.verified_by = Some(admin);
        }
        Ok(report.clone())
    }

    fn list(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|report| status.map_or(true, |wanted| report.status == wanted))
            .cloned()
            .collect())
    }

    fn for_submitter(&self, submitter: &MobileNumber) -> Result<Vec<Report>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|report| &report.submitter == submitter)
            .cloned()
            .collect())
    }
}

/// Notifier stand-in for deployments without SMS credentials: logs the body
/// instead of calling the provider, and records it for the demo output.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier {
    sent: Arc<Mutex<Vec<(MobileNumber, SmsMessage)>>>,
}

impl LoggingNotifier {
    pub(crate) fn sent(&self) -> Vec<(MobileNumber, SmsMessage)> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for LoggingNotifier {
    fn send(&self, to: &MobileNumber, message: SmsMessage) -> Result<DeliveryReceipt, NotifyError> {
        tracing::info!(to = to.as_str(), body = %message.body, "sms dispatched");
        let mut guard = self.sent.lock().expect("notifier mutex poisoned");
        guard.push((to.clone(), message));
        Ok(DeliveryReceipt {
            provider_id: format!("local-{:04}", guard.len()),
        })
    }
}
