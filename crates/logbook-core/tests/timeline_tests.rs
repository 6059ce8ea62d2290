//! End-to-end scenarios through the public API: raw events in, slots,
//! durations and window rollups out.

use chrono::{Duration, NaiveDate};
use logbook_core::{
    Certification, DailyLog, DayEntry, DayWindow, DutyStatus, EventError, HOURS_PER_DAY,
    RawDutyEvent, SlotStatus, UnknownPolicy, aggregate_over_window, compute_durations,
    derive_hourly_slots,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

fn ev(ts: &str, status: &str) -> RawDutyEvent {
    RawDutyEvent {
        timestamp: Some(ts.to_string()),
        status: Some(status.to_string()),
        ..RawDutyEvent::default()
    }
}

fn status_at(events: &[RawDutyEvent], window: &DayWindow, hour: usize) -> SlotStatus {
    derive_hourly_slots(events, window)
        .timeline
        .slot(hour)
        .expect("hour in range")
        .status
}

#[test]
fn driving_then_off_duty() {
    let window = DayWindow::utc(date(2025, 6, 2));
    let events = vec![
        ev("2025-06-02T14:00:00Z", "OFF_DUTY"),
        ev("2025-06-02T06:00:00Z", "DRIVING"),
    ];

    assert_eq!(status_at(&events, &window, 5), SlotStatus::Unknown);
    assert_eq!(
        status_at(&events, &window, 10),
        SlotStatus::Duty(DutyStatus::Driving)
    );
    assert_eq!(
        status_at(&events, &window, 14),
        SlotStatus::Duty(DutyStatus::OffDuty)
    );

    let durations = compute_durations(&derive_hourly_slots(&events, &window).timeline);
    assert_eq!(durations.get(DutyStatus::Driving), Duration::hours(8));
    assert_eq!(durations.get(DutyStatus::OffDuty), Duration::hours(10));
    assert_eq!(durations.unknown(), Duration::hours(6));
}

#[test]
fn no_events_means_unknown_not_off_duty() {
    let window = DayWindow::new(date(2025, 6, 2), chrono_tz::America::Denver);
    let derivation = derive_hourly_slots(&[], &window);
    assert_eq!(derivation.timeline.slots().len(), HOURS_PER_DAY);

    let durations = compute_durations(&derivation.timeline);
    assert_eq!(durations.unknown(), Duration::hours(24));
    for status in DutyStatus::ALL {
        assert_eq!(durations.get(status), Duration::zero());
    }

    // The compliance view is opt-in.
    let collapsed = durations.with_unknown_policy(UnknownPolicy::CountAsOffDuty);
    assert_eq!(collapsed.get(DutyStatus::OffDuty), Duration::hours(24));
}

#[test]
fn one_malformed_event_among_three_valid() {
    let window = DayWindow::utc(date(2025, 6, 2));
    let events = vec![
        ev("2025-06-02T01:00:00Z", "SLEEPER"),
        ev("2025-06-02T07:00:00Z", "ON_DUTY"),
        ev("2025-06-02T08:00:00", "DRIVING"),
        ev("2025-06-02T09:00:00Z", "DRIVING"),
    ];
    let derivation = derive_hourly_slots(&events, &window);

    assert_eq!(derivation.skipped.len(), 1);
    assert_eq!(derivation.skipped[0].index, 2);
    assert!(matches!(
        derivation.skipped[0].reason,
        EventError::InvalidTimestamp { .. }
    ));
    assert_eq!(
        derivation.timeline.slot(8).unwrap().status,
        SlotStatus::Duty(DutyStatus::OnDuty)
    );
    assert_eq!(
        derivation.timeline.slot(9).unwrap().status,
        SlotStatus::Duty(DutyStatus::Driving)
    );
}

#[test]
fn identical_timestamps_follow_input_order() {
    let window = DayWindow::utc(date(2025, 6, 2));
    let events = vec![
        ev("2025-06-02T12:30:00Z", "ON_DUTY"),
        ev("2025-06-02T12:30:00Z", "YM"),
    ];
    assert_eq!(
        status_at(&events, &window, 12),
        SlotStatus::Duty(DutyStatus::YardMove)
    );
}

#[test]
fn offsets_are_normalised_before_comparing() {
    // Same instant written in two offsets: the later input still wins.
    let window = DayWindow::utc(date(2025, 6, 2));
    let events = vec![
        ev("2025-06-02T12:30:00Z", "ON_DUTY"),
        ev("2025-06-02T07:30:00-05:00", "DRIVING"),
    ];
    assert_eq!(
        status_at(&events, &window, 12),
        SlotStatus::Duty(DutyStatus::Driving)
    );
}

#[test]
fn over_fetched_events_from_neighbouring_days_are_dropped() {
    let window = DayWindow::new(date(2025, 6, 2), chrono_tz::America::Los_Angeles);
    let events = vec![
        // 23:00 local on June 1.
        ev("2025-06-02T06:00:00Z", "DRIVING"),
        // 00:30 local on June 2.
        ev("2025-06-02T07:30:00Z", "OFF"),
        // 00:30 local on June 3.
        ev("2025-06-03T07:30:00Z", "ON"),
    ];
    let derivation = derive_hourly_slots(&events, &window);
    assert_eq!(derivation.excluded, 2);
    assert_eq!(
        derivation.timeline.slot(0).unwrap().status,
        SlotStatus::Duty(DutyStatus::OffDuty)
    );
    assert_eq!(
        derivation.timeline.slot(23).unwrap().status,
        SlotStatus::Duty(DutyStatus::OffDuty)
    );
}

#[test]
fn dst_days_still_have_24_slots() {
    for d in [date(2025, 3, 9), date(2025, 11, 2)] {
        let window = DayWindow::new(d, chrono_tz::America::New_York);
        let events = vec![ev(&format!("{d}T12:00:00Z"), "DRIVING")];
        let derivation = derive_hourly_slots(&events, &window);
        assert_eq!(derivation.timeline.slots().len(), 24);
        assert_eq!(
            compute_durations(&derivation.timeline).total(),
            Duration::hours(24)
        );
    }
}

#[test]
fn seven_day_rollup_with_missing_days() {
    let reference = date(2025, 6, 7);
    let mut daily = Vec::new();
    for d in 1..=7 {
        let day = date(2025, 6, d);
        if d == 3 || d == 5 {
            continue;
        }
        let events = if d == 4 {
            Vec::new()
        } else {
            vec![
                ev(&format!("{day}T00:00:00Z"), "OFF"),
                ev(&format!("{day}T08:00:00Z"), "DRIVING"),
                ev(&format!("{day}T17:00:00Z"), "OFF"),
            ]
        };
        let timeline = derive_hourly_slots(&events, &DayWindow::utc(day)).timeline;
        daily.push(DailyLog::logged(
            day,
            compute_durations(&timeline),
            Certification::from(d % 2 == 0),
        ));
    }

    let summary = aggregate_over_window(&daily, reference, 7);

    assert_eq!(summary.days.len(), 7);
    assert_eq!(summary.days[2].entry, DayEntry::NoLog);
    assert_eq!(summary.days[4].entry, DayEntry::NoLog);
    match &summary.days[3].entry {
        DayEntry::Logged { durations, .. } => {
            assert_eq!(durations.unknown(), Duration::hours(24));
        }
        DayEntry::NoLog => panic!("an empty log is still a log"),
    }

    assert_eq!(summary.logged_days, 5);
    assert_eq!(summary.missing_days, 2);
    assert_eq!(summary.totals.get(DutyStatus::Driving), Duration::hours(4 * 9));
    assert_eq!(summary.totals.unknown(), Duration::hours(24));
    assert_eq!(summary.totals.total(), Duration::hours(5 * 24));
}
