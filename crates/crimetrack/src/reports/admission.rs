use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::domain::MobileNumber;
use super::store::{ReportStore, StoreError};

/// Where the daily-cap window resets. The original deployment reset at local
/// midnight; `Utc` pins the boundary to a fixed instant instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    Local,
    Utc,
}

impl DayBoundary {
    fn start_of_day(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DayBoundary::Local => {
                let local = now.with_timezone(&Local);
                let midnight = local
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .expect("midnight is a valid time");
                match Local.from_local_datetime(&midnight) {
                    chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
                        dt.with_timezone(&Utc)
                    }
                    // DST gap at midnight: fall back to the UTC day start.
                    chrono::LocalResult::None => DayBoundary::Utc.start_of_day(now),
                }
            }
            DayBoundary::Utc => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .expect("midnight is a valid time")
                .and_utc(),
        }
    }
}

/// Why a submission was refused, with retry hints for human display.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdmissionDenied {
    #[error("daily limit of {daily_cap} reports reached ({reports_today} today); try again tomorrow")]
    DailyLimitExceeded { reports_today: u32, daily_cap: u32 },
    #[error("last report too recent; wait {hours_remaining} more hour(s)")]
    CooldownActive {
        retry_after: DateTime<Utc>,
        hours_remaining: i64,
    },
}

/// Per-submitter gate in front of report creation.
///
/// Two independent checks, evaluated in order: the calendar-day cap first,
/// then the rolling cooldown window. They use different window semantics on
/// purpose and must not be folded into one rolling counter.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionPolicy {
    daily_cap: u32,
    cooldown: Duration,
    day_boundary: DayBoundary,
}

impl AdmissionPolicy {
    pub fn new(daily_cap: u32, cooldown: Duration, day_boundary: DayBoundary) -> Self {
        Self {
            daily_cap,
            cooldown,
            day_boundary,
        }
    }

    pub fn daily_cap(&self) -> u32 {
        self.daily_cap
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Decide whether `submitter` may create a report at `now`.
    ///
    /// Pure read-then-decide: a store failure fails the check closed rather
    /// than admitting on ambiguous history.
    pub fn check<S: ReportStore + ?Sized>(
        &self,
        store: &S,
        submitter: &MobileNumber,
        now: DateTime<Utc>,
    ) -> Result<Result<(), AdmissionDenied>, StoreError> {
        let day_start = self.day_boundary.start_of_day(now);
        let reports_today = store.count_since(submitter, day_start)?;
        if reports_today >= self.daily_cap {
            return Ok(Err(AdmissionDenied::DailyLimitExceeded {
                reports_today,
                daily_cap: self.daily_cap,
            }));
        }

        let window_start = now - self.cooldown;
        if let Some(recent) = store.most_recent_since(submitter, window_start)? {
            let retry_after = recent.reported_at + self.cooldown;
            // Strict boundary: a report exactly `cooldown` old is out of the
            // window, so cooldown is active iff now < reported_at + cooldown.
            if retry_after > now {
                let remaining = retry_after - now;
                return Ok(Err(AdmissionDenied::CooldownActive {
                    retry_after,
                    hours_remaining: ceil_hours(remaining),
                }));
            }
        }

        Ok(Ok(()))
    }

    /// Snapshot of the submitter's standing, for the history endpoint.
    pub fn snapshot<S: ReportStore + ?Sized>(
        &self,
        store: &S,
        submitter: &MobileNumber,
        now: DateTime<Utc>,
    ) -> Result<RateLimitSnapshot, StoreError> {
        let day_start = self.day_boundary.start_of_day(now);
        let reports_today = store.count_since(submitter, day_start)?;
        let remaining_today = self.daily_cap.saturating_sub(reports_today);

        let window_start = now - self.cooldown;
        let next_report_time = store
            .most_recent_since(submitter, window_start)?
            .map(|recent| recent.reported_at + self.cooldown)
            .filter(|retry_after| *retry_after > now);

        Ok(RateLimitSnapshot {
            reports_today,
            remaining_today,
            can_report_now: remaining_today > 0 && next_report_time.is_none(),
            next_report_time,
        })
    }
}

/// Remaining-hours figure rounds up for display ("wait 3 more hour(s)").
fn ceil_hours(remaining: Duration) -> i64 {
    let millis = remaining.num_milliseconds().max(0);
    let hour = 3_600_000;
    (millis + hour - 1) / hour
}

/// Derived rate-limit standing returned alongside a submitter's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitSnapshot {
    pub reports_today: u32,
    pub remaining_today: u32,
    pub can_report_now: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_report_time: Option<DateTime<Utc>>,
}
