use chrono::Duration;

use super::common::*;
use crate::reports::admission::AdmissionDenied;
use crate::reports::store::StoreError;

#[test]
fn zero_history_is_admitted() {
    let store = MemoryStore::default();
    let decision = policy()
        .check(&store, &mobile(), t0())
        .expect("history read succeeds");
    assert_eq!(decision, Ok(()));
}

#[test]
fn daily_cap_rejects_fourth_report() {
    // Three reports earlier today, all outside the 8h window: the cap alone
    // must fire.
    let store = MemoryStore::default();
    let submitter = mobile();
    for minutes in [30, 60, 90] {
        store.seed(seeded_report(
            &submitter,
            t0() - Duration::hours(11) + Duration::minutes(minutes),
        ));
    }

    let decision = policy()
        .check(&store, &submitter, t0())
        .expect("history read succeeds");
    assert_eq!(
        decision,
        Err(AdmissionDenied::DailyLimitExceeded {
            reports_today: 3,
            daily_cap: 3,
        })
    );
}

#[test]
fn cooldown_boundary_is_strict() {
    let store = MemoryStore::default();
    let submitter = mobile();
    let last = t0() - Duration::hours(8);
    store.seed(seeded_report(&submitter, last));

    // One second before the window closes: still in cooldown.
    let decision = policy()
        .check(&store, &submitter, t0() - Duration::seconds(1))
        .expect("history read succeeds");
    match decision {
        Err(AdmissionDenied::CooldownActive {
            retry_after,
            hours_remaining,
        }) => {
            assert_eq!(retry_after, last + Duration::hours(8));
            assert_eq!(hours_remaining, 1);
        }
        other => panic!("expected cooldown rejection, got {other:?}"),
    }

    // Exactly eight hours later the window has elapsed.
    let decision = policy()
        .check(&store, &submitter, t0())
        .expect("history read succeeds");
    assert_eq!(decision, Ok(()));
}

#[test]
fn cooldown_hours_remaining_rounds_up() {
    let store = MemoryStore::default();
    let submitter = mobile();
    // 59 minutes since the last report leaves 7h01m, displayed as 8.
    store.seed(seeded_report(&submitter, t0() - Duration::minutes(59)));

    match policy().check(&store, &submitter, t0()).expect("read") {
        Err(AdmissionDenied::CooldownActive {
            hours_remaining, ..
        }) => assert_eq!(hours_remaining, 8),
        other => panic!("expected cooldown rejection, got {other:?}"),
    }
}

#[test]
fn daily_cap_wins_over_cooldown() {
    // Both rules violated: the cap is checked first and names the rejection.
    let store = MemoryStore::default();
    let submitter = mobile();
    for hours in [1, 2, 3] {
        store.seed(seeded_report(&submitter, t0() - Duration::hours(hours)));
    }

    let decision = policy()
        .check(&store, &submitter, t0())
        .expect("history read succeeds");
    assert_eq!(
        decision,
        Err(AdmissionDenied::DailyLimitExceeded {
            reports_today: 3,
            daily_cap: 3,
        })
    );
}

#[test]
fn store_failure_fails_closed() {
    match policy().check(&UnavailableStore, &mobile(), t0()) {
        Err(StoreError::Unavailable(_)) => {}
        other => panic!("expected unavailable error, got {other:?}"),
    }
}

#[test]
fn snapshot_reflects_cap_and_cooldown() {
    let store = MemoryStore::default();
    let submitter = mobile();
    let last = t0() - Duration::hours(2);
    store.seed(seeded_report(&submitter, last));

    let snapshot = policy()
        .snapshot(&store, &submitter, t0())
        .expect("history read succeeds");
    assert_eq!(snapshot.reports_today, 1);
    assert_eq!(snapshot.remaining_today, 2);
    assert!(!snapshot.can_report_now);
    assert_eq!(snapshot.next_report_time, Some(last + Duration::hours(8)));
}

#[test]
fn snapshot_clears_once_window_elapses() {
    let store = MemoryStore::default();
    let submitter = mobile();
    store.seed(seeded_report(&submitter, t0() - Duration::hours(9)));

    let snapshot = policy()
        .snapshot(&store, &submitter, t0())
        .expect("history read succeeds");
    assert_eq!(snapshot.reports_today, 1);
    assert!(snapshot.can_report_now);
    assert_eq!(snapshot.next_report_time, None);
}
