//! Slot validation rules for proposed meeting time slots.
//!
//! A single rule engine serves both call sites:
//! - the authoritative submission path ([`ValidationPolicy::submission`]),
//!   which tolerates slots starting up to five minutes in the past;
//! - the advisory preview path ([`ValidationPolicy::preview`]), which compares
//!   against the start of the current minute with no grace window.
//!
//! Rules run in a fixed priority order and the first failing rule wins:
//!
//! 1. both ends parse and `end > start` (`INVALID_OR_MISORDERED`)
//! 2. lead time (`IN_PAST`)
//! 3. same local calendar day (`SPANS_MULTIPLE_DAYS`)
//! 4. maximum duration (`DURATION_TOO_LONG`)
//! 5. allowed weekday (`WEEKEND_NOT_ALLOWED`)
//! 6. business hours, inclusive at both ends (`OUTSIDE_BUSINESS_HOURS`)
//!
//! Validation is a pure function of `(interval, now, policy, timezone)`.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{parse_local_datetime, TimeInterval};

const MALFORMED_SUBMISSION: &str = "A title is required and at least one slot must be proposed, \
                                    each with a matching start and end.";

/// Inconsistent policy settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("workday start {} is after workday end {}", .start.format("%H:%M"), .end.format("%H:%M"))]
    WorkdayOrder { start: NaiveTime, end: NaiveTime },

    #[error("max duration must be positive")]
    NonPositiveDuration,

    #[error("grace window cannot be negative")]
    NegativeGrace,

    #[error("at least one weekday must be allowed")]
    NoWeekdays,
}

/// Which instant the lead-time rule measures the grace window from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NowPrecision {
    /// The exact current instant.
    Exact,
    /// The current instant truncated to the start of its minute.
    Minute,
}

/// Scheduling policy applied to every proposed slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// How far before `now` a slot may start and still be accepted.
    pub grace_window: Duration,
    pub now_precision: NowPrecision,
    pub workday_start: NaiveTime,
    pub workday_end: NaiveTime,
    pub max_duration: Duration,
    pub allowed_weekdays: Vec<Weekday>,
}

impl ValidationPolicy {
    /// Policy for the authoritative batch submission path.
    pub fn submission() -> Self {
        Self {
            grace_window: Duration::minutes(5),
            now_precision: NowPrecision::Exact,
            ..Self::base()
        }
    }

    /// Policy for interactive feedback while a slot is being edited.
    pub fn preview() -> Self {
        Self {
            grace_window: Duration::zero(),
            now_precision: NowPrecision::Minute,
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            grace_window: Duration::zero(),
            now_precision: NowPrecision::Exact,
            workday_start: NaiveTime::from_hms_opt(8, 30, 0).unwrap_or_default(),
            workday_end: NaiveTime::from_hms_opt(18, 30, 0).unwrap_or_default(),
            max_duration: Duration::hours(2),
            allowed_weekdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }

    /// Same thresholds, different lead-time handling.
    pub fn with_lead_time(mut self, grace_window: Duration, now_precision: NowPrecision) -> Self {
        self.grace_window = grace_window;
        self.now_precision = now_precision;
        self
    }

    /// Check the policy is internally consistent.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.workday_start > self.workday_end {
            return Err(PolicyError::WorkdayOrder {
                start: self.workday_start,
                end: self.workday_end,
            });
        }
        if self.max_duration <= Duration::zero() {
            return Err(PolicyError::NonPositiveDuration);
        }
        if self.grace_window < Duration::zero() {
            return Err(PolicyError::NegativeGrace);
        }
        if self.allowed_weekdays.is_empty() {
            return Err(PolicyError::NoWeekdays);
        }
        Ok(())
    }

    fn workday_minutes(&self) -> (u32, u32) {
        (
            minutes_since_midnight(&self.workday_start),
            minutes_since_midnight(&self.workday_end),
        )
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::submission()
    }
}

/// Why a slot or a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    InvalidOrMisordered,
    InPast,
    SpansMultipleDays,
    DurationTooLong,
    WeekendNotAllowed,
    OutsideBusinessHours,
    EmptyOrMismatchedCount,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::InvalidOrMisordered => "INVALID_OR_MISORDERED",
            RejectionReason::InPast => "IN_PAST",
            RejectionReason::SpansMultipleDays => "SPANS_MULTIPLE_DAYS",
            RejectionReason::DurationTooLong => "DURATION_TOO_LONG",
            RejectionReason::WeekendNotAllowed => "WEEKEND_NOT_ALLOWED",
            RejectionReason::OutsideBusinessHours => "OUTSIDE_BUSINESS_HOURS",
            RejectionReason::EmptyOrMismatchedCount => "EMPTY_OR_MISMATCHED_COUNT",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A refused slot: machine-readable reason plus a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub message: String,
}

impl Rejection {
    pub fn new(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// Outcome of validating one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Accepted(TimeInterval),
    Rejected(Rejection),
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted(_))
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            ValidationResult::Accepted(_) => None,
            ValidationResult::Rejected(r) => Some(r.reason),
        }
    }
}

/// A meeting creation request as submitted: title, optional description and
/// parallel lists of start/end strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSubmission {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_times: Vec<String>,
    #[serde(default)]
    pub end_times: Vec<String>,
}

/// First failure in a submission. `ordinal` is the 1-based slot position, or
/// `None` when the submission as a whole is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct SubmissionRejection {
    pub ordinal: Option<usize>,
    pub reason: RejectionReason,
    pub message: String,
}

/// Policy-parameterized slot rule engine.
#[derive(Debug, Clone)]
pub struct SlotValidator {
    policy: ValidationPolicy,
    timezone: Tz,
}

impl SlotValidator {
    pub fn new(policy: ValidationPolicy, timezone: Tz) -> Self {
        Self { policy, timezone }
    }

    pub fn submission(timezone: Tz) -> Self {
        Self::new(ValidationPolicy::submission(), timezone)
    }

    pub fn preview(timezone: Tz) -> Self {
        Self::new(ValidationPolicy::preview(), timezone)
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Validate one slot given as boundary strings.
    pub fn check(&self, start: &str, end: &str, now: DateTime<Utc>) -> ValidationResult {
        self.check_text(start, end, now, None)
    }

    /// Validate one already-parsed slot.
    pub fn check_interval(&self, interval: &TimeInterval, now: DateTime<Utc>) -> ValidationResult {
        self.judge(interval, now, None)
    }

    /// Validate a whole submission, slots in input order, stopping at the
    /// first refused slot. Either every slot is returned or none.
    pub fn check_submission(
        &self,
        submission: &SlotSubmission,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimeInterval>, SubmissionRejection> {
        if submission.title.trim().is_empty()
            || submission.start_times.is_empty()
            || submission.start_times.len() != submission.end_times.len()
        {
            log::debug!(
                "submission refused: title_present={} starts={} ends={}",
                !submission.title.trim().is_empty(),
                submission.start_times.len(),
                submission.end_times.len()
            );
            return Err(SubmissionRejection {
                ordinal: None,
                reason: RejectionReason::EmptyOrMismatchedCount,
                message: MALFORMED_SUBMISSION.to_string(),
            });
        }

        let mut accepted = Vec::with_capacity(submission.start_times.len());
        for (idx, (start, end)) in submission
            .start_times
            .iter()
            .zip(submission.end_times.iter())
            .enumerate()
        {
            let ordinal = idx + 1;
            match self.check_text(start, end, now, Some(ordinal)) {
                ValidationResult::Accepted(interval) => accepted.push(interval),
                ValidationResult::Rejected(rejection) => {
                    return Err(SubmissionRejection {
                        ordinal: Some(ordinal),
                        reason: rejection.reason,
                        message: rejection.message,
                    });
                }
            }
        }

        Ok(accepted)
    }

    fn check_text(
        &self,
        start: &str,
        end: &str,
        now: DateTime<Utc>,
        ordinal: Option<usize>,
    ) -> ValidationResult {
        let parsed = parse_local_datetime(start, &self.timezone)
            .zip(parse_local_datetime(end, &self.timezone));

        match parsed {
            Some((start, end)) => self.judge(&TimeInterval::new(start, end), now, ordinal),
            None => self.reject(RejectionReason::InvalidOrMisordered, None, ordinal),
        }
    }

    fn judge(
        &self,
        interval: &TimeInterval,
        now: DateTime<Utc>,
        ordinal: Option<usize>,
    ) -> ValidationResult {
        match self.first_violation(interval, now) {
            None => ValidationResult::Accepted(*interval),
            Some(reason) => self.reject(reason, Some(interval), ordinal),
        }
    }

    fn first_violation(&self, interval: &TimeInterval, now: DateTime<Utc>) -> Option<RejectionReason> {
        if !interval.is_ordered() {
            return Some(RejectionReason::InvalidOrMisordered);
        }

        if let Some(earliest) = self.earliest_start(now) {
            if interval.start < earliest {
                return Some(RejectionReason::InPast);
            }
        }

        let start = interval.start.with_timezone(&self.timezone);
        let end = interval.end.with_timezone(&self.timezone);

        if start.date_naive() != end.date_naive() {
            return Some(RejectionReason::SpansMultipleDays);
        }

        if interval.duration() > self.policy.max_duration {
            return Some(RejectionReason::DurationTooLong);
        }

        if !self.policy.allowed_weekdays.contains(&start.weekday()) {
            return Some(RejectionReason::WeekendNotAllowed);
        }

        let (open, close) = self.policy.workday_minutes();
        let within = |minutes: u32| minutes >= open && minutes <= close;
        if !within(minutes_since_midnight(&start.time())) || !within(minutes_since_midnight(&end.time())) {
            return Some(RejectionReason::OutsideBusinessHours);
        }

        None
    }

    /// `None` when the grace window reaches past the representable range,
    /// in which case no start is too early.
    fn earliest_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let reference = match self.policy.now_precision {
            NowPrecision::Exact => now,
            NowPrecision::Minute => now
                .with_second(0)
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(now),
        };
        reference.checked_sub_signed(self.policy.grace_window)
    }

    fn reject(
        &self,
        reason: RejectionReason,
        interval: Option<&TimeInterval>,
        ordinal: Option<usize>,
    ) -> ValidationResult {
        let message = self.describe(reason, interval, ordinal);
        log::debug!("slot rejected: reason={} ordinal={:?} {}", reason, ordinal, message);
        ValidationResult::Rejected(Rejection::new(reason, message))
    }

    fn describe(
        &self,
        reason: RejectionReason,
        interval: Option<&TimeInterval>,
        ordinal: Option<usize>,
    ) -> String {
        let subject = match ordinal {
            Some(n) => format!("Slot {}", n),
            None => "The slot".to_string(),
        };

        match reason {
            RejectionReason::InvalidOrMisordered => format!(
                "{} is invalid or misordered (the end must be after the start).",
                subject
            ),
            RejectionReason::InPast => format!("{} cannot start in the past.", subject),
            RejectionReason::SpansMultipleDays => {
                format!("{} must start and end on the same day.", subject)
            }
            RejectionReason::DurationTooLong => format!(
                "{} cannot last longer than {}.",
                subject,
                format_duration(self.policy.max_duration)
            ),
            RejectionReason::WeekendNotAllowed => {
                let day = interval.map(|i| i.start.with_timezone(&self.timezone).weekday());
                match day {
                    Some(Weekday::Sat) | Some(Weekday::Sun) | None => {
                        format!("{} cannot be on a weekend.", subject)
                    }
                    Some(other) => format!("{} cannot be on a {}.", subject, weekday_name(other)),
                }
            }
            RejectionReason::OutsideBusinessHours => {
                let window = format!(
                    "{} and {}",
                    self.policy.workday_start.format("%H:%M"),
                    self.policy.workday_end.format("%H:%M")
                );
                match interval {
                    Some(i) => format!(
                        "{} ({} - {}) must fall entirely between {}.",
                        subject,
                        i.start.with_timezone(&self.timezone).format("%H:%M"),
                        i.end.with_timezone(&self.timezone).format("%H:%M"),
                        window
                    ),
                    None => format!("{} must fall entirely between {}.", subject, window),
                }
            }
            RejectionReason::EmptyOrMismatchedCount => MALFORMED_SUBMISSION.to_string(),
        }
    }
}

fn minutes_since_midnight(time: &NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    match (minutes / 60, minutes % 60) {
        (1, 0) => "1 hour".to_string(),
        (h, 0) => format!("{} hours", h),
        (0, m) => format!("{} minutes", m),
        (h, m) => format!("{}h{:02}", h, m),
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
