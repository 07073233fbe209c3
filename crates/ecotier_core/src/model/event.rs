//! Emissions event input model.
//!
//! # Responsibility
//! - Define the immutable per-user emissions record consumed by the pipeline.
//! - Decode the timestamp shapes produced by upstream collectors.
//!
//! # Invariants
//! - `user_id` and `activity_type` are non-empty.
//! - `amount` is finite and `>= 0`.
//! - `timestamp` keeps the offset it was recorded with; calendar fields are
//!   derived in that offset, never in UTC.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation failures for a single emissions event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventValidationError {
    EmptyUserId,
    EmptyActivityType,
    NegativeAmount(f64),
    NonFiniteAmount,
    InvalidTimestamp(String),
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUserId => write!(f, "userId must not be empty"),
            Self::EmptyActivityType => write!(f, "activityType must not be empty"),
            Self::NegativeAmount(amount) => {
                write!(f, "amount must be >= 0, got {amount}")
            }
            Self::NonFiniteAmount => write!(f, "amount must be a finite number"),
            Self::InvalidTimestamp(value) => write!(f, "unrecognized timestamp `{value}`"),
        }
    }
}

impl Error for EventValidationError {}

/// One recorded emission for a user activity.
///
/// Deserialization goes through validation, so a decoded event always
/// satisfies the module invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EmissionsEventWire")]
pub struct EmissionsEvent {
    pub user_id: String,
    pub activity_type: String,
    /// Emitted amount in kg CO₂.
    pub amount: f64,
    pub timestamp: DateTime<FixedOffset>,
}

impl EmissionsEvent {
    /// Creates a validated event.
    pub fn new(
        user_id: impl Into<String>,
        activity_type: impl Into<String>,
        amount: f64,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<Self, EventValidationError> {
        let event = Self {
            user_id: user_id.into(),
            activity_type: activity_type.into(),
            amount,
            timestamp,
        };
        event.validate()?;
        Ok(event)
    }

    /// Checks the event invariants.
    ///
    /// Public fields allow callers to build events directly, so the pipeline
    /// re-runs this before aggregation.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(EventValidationError::EmptyUserId);
        }
        if self.activity_type.trim().is_empty() {
            return Err(EventValidationError::EmptyActivityType);
        }
        if !self.amount.is_finite() {
            return Err(EventValidationError::NonFiniteAmount);
        }
        if self.amount < 0.0 {
            return Err(EventValidationError::NegativeAmount(self.amount));
        }
        Ok(())
    }

    /// Calendar month number (1-12) in the event's own offset.
    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    /// Weekday index with Monday = 0 and Sunday = 6.
    pub fn weekday_index(&self) -> u32 {
        self.timestamp.weekday().num_days_from_monday()
    }
}

/// Parses a textual timestamp.
///
/// RFC 3339 input keeps its offset. Naive date-times and bare dates carry no
/// zone information and are read as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, EventValidationError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed);
    }

    let utc = utc_offset();
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| utc.from_utc_datetime(&naive))
        .ok_or_else(|| EventValidationError::InvalidTimestamp(trimmed.to_string()))
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmissionsEventWire {
    user_id: String,
    activity_type: String,
    amount: f64,
    timestamp: TimestampWire,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampWire {
    Text(String),
    /// Firestore `Timestamp` exported as JSON.
    Firestore {
        seconds: i64,
        #[serde(default)]
        nanoseconds: u32,
    },
}

impl TimestampWire {
    fn resolve(self) -> Result<DateTime<FixedOffset>, EventValidationError> {
        match self {
            Self::Text(value) => parse_timestamp(&value),
            Self::Firestore {
                seconds,
                nanoseconds,
            } => Utc
                .timestamp_opt(seconds, nanoseconds)
                .single()
                .map(|instant| instant.with_timezone(&utc_offset()))
                .ok_or_else(|| {
                    EventValidationError::InvalidTimestamp(format!(
                        "seconds={seconds} nanoseconds={nanoseconds}"
                    ))
                }),
        }
    }
}

impl TryFrom<EmissionsEventWire> for EmissionsEvent {
    type Error = EventValidationError;

    fn try_from(value: EmissionsEventWire) -> Result<Self, Self::Error> {
        let timestamp = value.timestamp.resolve()?;
        Self::new(value.user_id, value.activity_type, value.amount, timestamp)
    }
}
