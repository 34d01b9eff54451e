use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::reports::admission::{AdmissionPolicy, DayBoundary};
use crate::reports::domain::{
    Location, MobileNumber, Report, ReportId, ReportStatus, ReportSubmission,
};
use crate::reports::service::ReportService;
use crate::reports::store::{
    DeliveryReceipt, Notifier, NotifyError, ReportStore, ReviewPatch, SmsMessage, StoreError,
};

/// Fixed mid-day instant so daily-cap tests never straddle a boundary.
pub(super) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn mobile() -> MobileNumber {
    MobileNumber::new("9876543210").expect("valid mobile")
}

/// Tests pin the day boundary to UTC so seeded timestamps are deterministic
/// regardless of the host time zone.
pub(super) fn policy() -> AdmissionPolicy {
    AdmissionPolicy::new(3, Duration::hours(8), DayBoundary::Utc)
}

pub(super) fn submission() -> ReportSubmission {
    ReportSubmission {
        mobile_number: "9876543210".to_string(),
        crime_type: "Theft".to_string(),
        description: "Bike stolen from the market square rack".to_string(),
        latitude: 17.3850,
        longitude: 78.4867,
        address: Some("Market Square".to_string()),
        submitter_verified: true,
    }
}

static SEED_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// A pending report seeded directly into the store, bypassing admission.
pub(super) fn seeded_report(submitter: &MobileNumber, reported_at: DateTime<Utc>) -> Report {
    let seq = SEED_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    Report {
        id: ReportId(format!("seed-{seq:04}")),
        submitter: submitter.clone(),
        crime_type: "Theft".to_string(),
        description: "seeded".to_string(),
        location: Location {
            latitude: 17.0,
            longitude: 78.0,
            address: None,
        },
        status: ReportStatus::Pending,
        reported_at,
        verified_at: None,
        verified_by: None,
        admin_notes: None,
    }
}

pub(super) fn build_service() -> (
    ReportService<MemoryStore, MemoryNotifier>,
    Arc<MemoryStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = ReportService::new(store.clone(), notifier.clone(), policy());
    (service, store, notifier)
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) records: Arc<Mutex<HashMap<ReportId, Report>>>,
}

impl MemoryStore {
    pub(super) fn seed(&self, report: Report) {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(report.id.clone(), report);
    }

    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("store mutex poisoned").len()
    }
}

impl ReportStore for MemoryStore {
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

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    messages: Arc<Mutex<Vec<(MobileNumber, SmsMessage)>>>,
}

impl MemoryNotifier {
    pub(super) fn messages(&self) -> Vec<(MobileNumber, SmsMessage)> {
        self.messages.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, to: &MobileNumber, message: SmsMessage) -> Result<DeliveryReceipt, NotifyError> {
        let mut guard = self.messages.lock().expect("notifier mutex poisoned");
        guard.push((to.clone(), message));
        Ok(DeliveryReceipt {
            provider_id: format!("SM{:04}", guard.len()),
        })
    }
}

/// Notifier that holds every delivery until the test sends a permit, so
/// tests can observe what callers do while the provider is still busy.
pub(super) struct GatedNotifier {
    gate: Mutex<mpsc::Receiver<()>>,
    delivered: AtomicUsize,
}

impl GatedNotifier {
    pub(super) fn new() -> (Arc<Self>, mpsc::Sender<()>) {
        let (permits, gate) = mpsc::channel();
        let notifier = Arc::new(Self {
            gate: Mutex::new(gate),
            delivered: AtomicUsize::new(0),
        });
        (notifier, permits)
    }

    pub(super) fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

impl Notifier for GatedNotifier {
    fn send(&self, _to: &MobileNumber, _message: SmsMessage) -> Result<DeliveryReceipt, NotifyError> {
        let permit = self.gate.lock().expect("gate mutex poisoned").recv();
        if permit.is_err() {
            return Err(NotifyError::Transport("gate closed".to_string()));
        }
        let count = self.delivered.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(DeliveryReceipt {
            provider_id: format!("SM{count:04}"),
        })
    }
}

/// Notifier whose transport always fails; transitions must still commit.
pub(super) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send(
        &self,
        _to: &MobileNumber,
        _message: SmsMessage,
    ) -> Result<DeliveryReceipt, NotifyError> {
        Err(NotifyError::Transport("provider offline".to_string()))
    }
}

/// Store that refuses every operation; admission must fail closed.
pub(super) struct UnavailableStore;

impl ReportStore for UnavailableStore {
    fn insert(&self, _report: Report) -> Result<Report, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ReportId) -> Result<Option<Report>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn count_since(
        &self,
        _submitter: &MobileNumber,
        _since: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn most_recent_since(
        &self,
        _submitter: &MobileNumber,
        _since: DateTime<Utc>,
    ) -> Result<Option<Report>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update_status(
        &self,
        _id: &ReportId,
        _expected: ReportStatus,
        _patch: ReviewPatch,
    ) -> Result<Report, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _status: Option<ReportStatus>) -> Result<Vec<Report>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn for_submitter(&self, _submitter: &MobileNumber) -> Result<Vec<Report>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}
