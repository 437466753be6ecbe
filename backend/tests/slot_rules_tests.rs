//! Property and scenario tests for the slot rule engine.

mod support;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};
use proptest::prelude::*;

use meeting_planner::services::slot_validator::{
    RejectionReason, SlotValidator, ValidationResult,
};
use support::{monday_morning, monday_utc, submission};

fn local(day_offset: i64, start_minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(day_offset)
        + Duration::minutes(start_minute as i64)
}

fn fmt(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%dT%H:%M").to_string()
}

fn slot_strings(day_offset: i64, start_minute: u32, length: i64) -> (String, String) {
    let start = local(day_offset, start_minute);
    (fmt(start), fmt(start + Duration::minutes(length)))
}

fn minutes_of_day(t: &DateTime<Utc>) -> u32 {
    t.hour() * 60 + t.minute()
}

proptest! {
    #[test]
    fn accepted_slots_satisfy_every_rule(
        day in -2i64..14,
        start_minute in 0u32..1440,
        length in -30i64..200,
    ) {
        let validator = SlotValidator::submission(chrono_tz::UTC);
        let now = monday_morning();
        let (start, end) = slot_strings(day, start_minute, length);

        if let ValidationResult::Accepted(slot) = validator.check(&start, &end, now) {
            prop_assert!(slot.end > slot.start);
            prop_assert!(slot.start >= now - Duration::minutes(5));
            prop_assert_eq!(slot.start.date_naive(), slot.end.date_naive());
            prop_assert!(slot.duration() <= Duration::hours(2));
            prop_assert!(!matches!(slot.start.weekday(), Weekday::Sat | Weekday::Sun));
            prop_assert!(minutes_of_day(&slot.start) >= 8 * 60 + 30);
            prop_assert!(minutes_of_day(&slot.end) <= 18 * 60 + 30);
        }
    }

    #[test]
    fn swapped_boundaries_are_misordered(
        day in 0i64..14,
        start_minute in 0u32..1300,
        length in 1i64..120,
    ) {
        let validator = SlotValidator::submission(chrono_tz::UTC);
        let (start, end) = slot_strings(day, start_minute, length);
        let result = validator.check(&end, &start, monday_morning());
        prop_assert_eq!(result.reason(), Some(RejectionReason::InvalidOrMisordered));
    }

    #[test]
    fn preview_never_accepts_what_submission_refuses(
        day in 0i64..3,
        start_minute in 0u32..1440,
        length in 1i64..150,
        now_second in 0i64..86_400,
    ) {
        let submission_rules = SlotValidator::submission(chrono_tz::UTC);
        let preview_rules = SlotValidator::preview(chrono_tz::UTC);
        let now = monday_utc(0, 0) + Duration::seconds(now_second);
        let (start, end) = slot_strings(day, start_minute, length);

        if preview_rules.check(&start, &end, now).is_accepted() {
            prop_assert!(submission_rules.check(&start, &end, now).is_accepted());
        }
    }

    #[test]
    fn batch_reports_first_failing_slot(
        slots in prop::collection::vec((0i64..7, 480u32..1140, 15i64..180), 1..6),
    ) {
        let validator = SlotValidator::submission(chrono_tz::UTC);
        let now = monday_morning();
        let strings: Vec<(String, String)> = slots
            .iter()
            .map(|(d, m, l)| slot_strings(*d, *m, *l))
            .collect();
        let pairs: Vec<(&str, &str)> = strings
            .iter()
            .map(|(s, e)| (s.as_str(), e.as_str()))
            .collect();

        let first_failure = pairs
            .iter()
            .position(|(s, e)| !validator.check(s, e, now).is_accepted());

        match validator.check_submission(&submission("Batch", &pairs), now) {
            Ok(accepted) => {
                prop_assert_eq!(first_failure, None);
                prop_assert_eq!(accepted.len(), pairs.len());
            }
            Err(rejection) => {
                prop_assert_eq!(rejection.ordinal, first_failure.map(|i| i + 1));
                let (s, e) = pairs[first_failure.unwrap()];
                prop_assert_eq!(Some(rejection.reason), validator.check(s, e, now).reason());
            }
        }
    }
}

#[test]
fn submission_grace_window_boundary() {
    let validator = SlotValidator::submission(chrono_tz::UTC);
    let now = monday_utc(10, 0) + Duration::seconds(20);

    // 09:55 is 5m20s before now
    let late = validator.check("2024-06-03T09:55", "2024-06-03T10:30", now);
    assert_eq!(late.reason(), Some(RejectionReason::InPast));

    let exact = validator.check(
        "2024-06-03T09:55",
        "2024-06-03T10:30",
        monday_utc(10, 0),
    );
    assert!(exact.is_accepted());
}

#[test]
fn preview_compares_against_start_of_minute() {
    let validator = SlotValidator::preview(chrono_tz::UTC);
    let now = monday_utc(10, 0) + Duration::seconds(45);

    assert!(validator
        .check("2024-06-03T10:00", "2024-06-03T10:30", now)
        .is_accepted());
    assert_eq!(
        validator
            .check("2024-06-03T09:59", "2024-06-03T10:30", now)
            .reason(),
        Some(RejectionReason::InPast)
    );
}

#[test]
fn rules_apply_in_priority_order() {
    let validator = SlotValidator::submission(chrono_tz::UTC);
    let now = monday_morning();

    // past, multi-day, too long, weekend and out of hours all at once
    let everything_wrong = validator.check("2024-06-01T06:00", "2024-06-02T23:00", now);
    assert_eq!(everything_wrong.reason(), Some(RejectionReason::InPast));

    // multi-day beats duration
    let overnight = validator.check("2024-06-04T17:00", "2024-06-05T10:00", now);
    assert_eq!(overnight.reason(), Some(RejectionReason::SpansMultipleDays));

    // duration beats weekend
    let long_saturday = validator.check("2024-06-08T09:00", "2024-06-08T12:00", now);
    assert_eq!(long_saturday.reason(), Some(RejectionReason::DurationTooLong));

    // weekend beats business hours
    let early_saturday = validator.check("2024-06-08T06:00", "2024-06-08T07:00", now);
    assert_eq!(early_saturday.reason(), Some(RejectionReason::WeekendNotAllowed));
}

#[test]
fn business_hours_are_inclusive() {
    let validator = SlotValidator::submission(chrono_tz::UTC);
    let now = monday_morning();

    assert!(validator
        .check("2024-06-04T08:30", "2024-06-04T10:30", now)
        .is_accepted());
    assert!(validator
        .check("2024-06-04T16:30", "2024-06-04T18:30", now)
        .is_accepted());

    let early = validator.check("2024-06-04T08:29", "2024-06-04T09:00", now);
    assert_eq!(early.reason(), Some(RejectionReason::OutsideBusinessHours));
    let late = validator.check("2024-06-04T18:00", "2024-06-04T18:31", now);
    assert_eq!(late.reason(), Some(RejectionReason::OutsideBusinessHours));
}

#[test]
fn wall_clock_times_follow_the_configured_zone() {
    let validator = SlotValidator::submission(chrono_tz::Europe::Paris);
    let now = monday_morning();

    // 09:00 in Paris during summer time is 07:00 UTC
    match validator.check("2024-06-04T09:00", "2024-06-04T10:00", now) {
        ValidationResult::Accepted(slot) => {
            assert_eq!(slot.canonical_start(), "2024-06-04T07:00:00.000Z");
            assert_eq!(slot.canonical_end(), "2024-06-04T08:00:00.000Z");
        }
        other => panic!("expected acceptance, got {other:?}"),
    }

    // 08:00 in Paris is before opening even though it is 06:00 UTC
    let early = validator.check("2024-06-04T08:00", "2024-06-04T09:00", now);
    assert_eq!(early.reason(), Some(RejectionReason::OutsideBusinessHours));
}

#[test]
fn malformed_submissions_have_no_ordinal() {
    let validator = SlotValidator::submission(chrono_tz::UTC);
    let now = monday_morning();

    let no_slots = validator
        .check_submission(&submission("Empty", &[]), now)
        .unwrap_err();
    assert_eq!(no_slots.reason, RejectionReason::EmptyOrMismatchedCount);
    assert_eq!(no_slots.ordinal, None);

    let mut mismatched = submission("Pairs", &[("2024-06-04T09:00", "2024-06-04T10:00")]);
    mismatched.end_times.push("2024-06-04T12:00".to_string());
    let err = validator.check_submission(&mismatched, now).unwrap_err();
    assert_eq!(err.reason, RejectionReason::EmptyOrMismatchedCount);

    let blank_title = submission("  ", &[("2024-06-04T09:00", "2024-06-04T10:00")]);
    let err = validator.check_submission(&blank_title, now).unwrap_err();
    assert_eq!(err.reason, RejectionReason::EmptyOrMismatchedCount);
}

#[test]
fn batch_message_names_the_slot() {
    let validator = SlotValidator::submission(chrono_tz::UTC);
    let err = validator
        .check_submission(
            &submission(
                "Review",
                &[
                    ("2024-06-04T09:00", "2024-06-04T10:00"),
                    ("2024-06-04T19:00", "2024-06-04T20:00"),
                ],
            ),
            monday_morning(),
        )
        .unwrap_err();

    assert_eq!(err.ordinal, Some(2));
    assert_eq!(err.reason, RejectionReason::OutsideBusinessHours);
    assert!(err.message.starts_with("Slot 2"));
    assert!(err.message.contains("19:00 - 20:00"));
}
