use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for persisted reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl ReportId {
    /// Short human-facing code used in SMS bodies: the last six characters
    /// of the id, uppercased.
    pub fn short_code(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let start = chars.len().saturating_sub(6);
        chars[start..].iter().collect::<String>().to_uppercase()
    }
}

/// Opaque reference to the admin identity attached to a review request.
///
/// Session issuance happens upstream; every lifecycle operation receives the
/// identity explicitly rather than reading ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminId(pub String);

/// A submitter's mobile number, validated to exactly ten ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MobileNumber(String);

impl MobileNumber {
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == 10 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Geographic position of the incident. Coordinates come from the geocoding
/// collaborator; the address is best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

/// Review status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Verified,
    Spam,
    Resolved,
}

impl ReportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Verified => "verified",
            ReportStatus::Spam => "spam",
            ReportStatus::Resolved => "resolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "verified" => Some(Self::Verified),
            "spam" => Some(Self::Spam),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }

    /// `spam` and `resolved` have no outgoing edges.
    pub const fn is_terminal(self) -> bool {
        matches!(self, ReportStatus::Spam | ReportStatus::Resolved)
    }

    /// The allowed transition graph. Re-submitting the current status is not
    /// an idempotent no-op; it is rejected like any other missing edge.
    pub const fn can_transition_to(self, target: ReportStatus) -> bool {
        matches!(
            (self, target),
            (ReportStatus::Pending, ReportStatus::Verified)
                | (ReportStatus::Pending, ReportStatus::Spam)
                | (ReportStatus::Verified, ReportStatus::Resolved)
        )
    }
}

/// A persisted crime report.
///
/// `reported_at` is write-once and is the sole anchor for rate-limit window
/// math. `verified_at`/`verified_by` are set on the first transition out of
/// `pending` and never overwritten afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub submitter: MobileNumber,
    pub crime_type: String,
    pub description: String,
    pub location: Location,
    pub status: ReportStatus,
    pub reported_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<AdminId>,
    pub admin_notes: Option<String>,
}

/// Raw inbound submission, before validation.
///
/// `submitter_verified` is the boolean fact produced by the external OTP
/// collaborator; the guard refuses submissions without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSubmission {
    pub mobile_number: String,
    pub crime_type: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub submitter_verified: bool,
}
