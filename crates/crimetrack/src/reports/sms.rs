use super::domain::{ReportId, ReportStatus};
use super::store::SmsMessage;

/// Confirmation sent right after a submission is accepted.
pub fn submission_confirmation(id: &ReportId) -> SmsMessage {
    SmsMessage {
        body: format!(
            "CrimeTrack: Your crime report (ID: {}) has been submitted successfully. \
             You will be notified once verified by authorities.",
            id.short_code()
        ),
    }
}

/// Status-update message sent after each successful review transition.
/// Distinct wording per target status, with a generic fallback.
pub fn status_update(id: &ReportId, status: ReportStatus) -> SmsMessage {
    let code = id.short_code();
    let body = match status {
        ReportStatus::Verified => format!(
            "CrimeTrack: Your crime report (ID: {code}) has been VERIFIED by authorities. \
             Appropriate action is being taken. Thank you for reporting."
        ),
        ReportStatus::Spam => format!(
            "CrimeTrack: Your crime report (ID: {code}) has been marked as invalid and \
             cancelled. If you believe this is an error, please contact support."
        ),
        ReportStatus::Resolved => format!(
            "CrimeTrack: Your crime report (ID: {code}) has been RESOLVED. Thank you for \
             using CrimeTrack to keep our community safe."
        ),
        other => format!(
            "CrimeTrack: Your crime report (ID: {code}) status has been updated to: {}.",
            other.label()
        ),
    };

    SmsMessage { body }
}
