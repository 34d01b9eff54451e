use chrono::{DateTime, Utc};

use super::domain::{AdminId, Report, ReportStatus};
use super::store::ReviewPatch;

/// Attempted transition outside the allowed graph. The report is left
/// unmodified; the caller surfaces this as a client error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move report from '{}' to '{}'", .from.label(), .to.label())]
pub struct InvalidTransition {
    pub from: ReportStatus,
    pub to: ReportStatus,
}

/// Validate a requested transition against the stored report and produce the
/// patch the store will apply conditionally.
///
/// Whether this is the first transition out of `pending` is derived from the
/// status actually read from the store, not from the target: both `verified`
/// and `spam` leave `pending`, and only that first step may stamp
/// `verified_at`/`verified_by`. Notes are overwritten on every transition.
pub fn plan_transition(
    current: &Report,
    target: ReportStatus,
    admin: AdminId,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<ReviewPatch, InvalidTransition> {
    if !current.status.can_transition_to(target) {
        return Err(InvalidTransition {
            from: current.status,
            to: target,
        });
    }

    let reviewed = if current.status == ReportStatus::Pending {
        Some((now, admin))
    } else {
        None
    };

    Ok(ReviewPatch {
        status: target,
        admin_notes: notes,
        reviewed,
    })
}
