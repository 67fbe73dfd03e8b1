//! Durations and task timing
//!
//! Stored definitions write spans as `{hours, minutes, seconds}`; markup
//! formats use the `HH:MM:SS` clock form.

use crate::id::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// A non-negative span of time with one-second resolution
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "TimeSpanRepr", into = "TimeSpanRepr")]
pub struct TimeSpan {
    seconds: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TimeSpanRepr {
    #[serde(default, skip_serializing_if = "is_zero")]
    hours: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    minutes: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    seconds: u64,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl TryFrom<TimeSpanRepr> for TimeSpan {
    type Error = String;

    fn try_from(repr: TimeSpanRepr) -> Result<Self, Self::Error> {
        Self::checked_from_hms(repr.hours, repr.minutes, repr.seconds).ok_or_else(|| {
            format!(
                "duration of {} hours, {} minutes, {} seconds is out of range",
                repr.hours, repr.minutes, repr.seconds
            )
        })
    }
}

impl From<TimeSpan> for TimeSpanRepr {
    fn from(span: TimeSpan) -> Self {
        Self {
            hours: span.seconds / 3600,
            minutes: (span.seconds % 3600) / 60,
            seconds: span.seconds % 60,
        }
    }
}

impl TimeSpan {
    /// Zero-length span
    pub const ZERO: Self = Self { seconds: 0 };

    /// From whole seconds
    #[inline]
    #[must_use]
    pub const fn from_seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    /// From whole minutes, saturating
    #[inline]
    #[must_use]
    pub const fn from_minutes(minutes: u64) -> Self {
        Self {
            seconds: minutes.saturating_mul(60),
        }
    }

    /// From hours, minutes and seconds, saturating
    ///
    /// Components may overflow their unit. Untrusted input goes through
    /// [`checked_from_hms`](Self::checked_from_hms) instead.
    #[inline]
    #[must_use]
    pub const fn from_hms(hours: u64, minutes: u64, seconds: u64) -> Self {
        match Self::checked_from_hms(hours, minutes, seconds) {
            Some(span) => span,
            None => Self { seconds: u64::MAX },
        }
    }

    /// From hours, minutes and seconds; `None` if the total overflows
    #[must_use]
    pub const fn checked_from_hms(hours: u64, minutes: u64, seconds: u64) -> Option<Self> {
        let (Some(hours), Some(minutes)) = (hours.checked_mul(3600), minutes.checked_mul(60)) else {
            return None;
        };
        let Some(partial) = hours.checked_add(minutes) else {
            return None;
        };
        match partial.checked_add(seconds) {
            Some(seconds) => Some(Self { seconds }),
            None => None,
        }
    }

    /// Total seconds
    #[inline]
    #[must_use]
    pub const fn as_seconds(self) -> u64 {
        self.seconds
    }

    /// Whole minutes, rounded down
    #[inline]
    #[must_use]
    pub const fn whole_minutes(self) -> u64 {
        self.seconds / 60
    }

    /// Whether the span is zero
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.seconds == 0
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(crate) fn is_zero_ref(&self) -> bool {
        self.is_zero()
    }

    /// `self - other`, clamped at zero
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self {
            seconds: self.seconds.saturating_sub(other.seconds),
        }
    }

    /// Lossless `HH:MM:SS` form
    #[must_use]
    pub fn to_clock(self) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            self.seconds / 3600,
            (self.seconds % 3600) / 60,
            self.seconds % 60
        )
    }

    /// Parse `HH:MM:SS` or `HH:MM`; `None` when malformed or out of range
    #[must_use]
    pub fn parse_clock(text: &str) -> Option<Self> {
        let parts: Vec<u64> = text
            .trim()
            .split(':')
            .map(|part| part.trim().parse().ok())
            .collect::<Option<_>>()?;
        match parts.as_slice() {
            [hours, minutes, seconds] => Self::checked_from_hms(*hours, *minutes, *seconds),
            [hours, minutes] => Self::checked_from_hms(*hours, *minutes, 0),
            _ => None,
        }
    }
}

impl Add for TimeSpan {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            seconds: self.seconds.saturating_add(rhs.seconds),
        }
    }
}

impl Sum for TimeSpan {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for TimeSpan {
    /// `HH:MM`, the form shown in rendered headers
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.seconds / 3600, (self.seconds % 3600) / 60)
    }
}

/// Computed schedule for one task in procedure order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskTiming {
    /// Task this timing belongs to
    pub task_id: TaskId,
    /// Declared start, or the previous task's end when not declared
    pub start: TimeSpan,
    /// Sum of the task's division durations
    pub duration: TimeSpan,
    /// `start + duration`
    pub end: TimeSpan,
    /// Idle time between the previous task's end and this task's start
    pub gap_before: TimeSpan,
}

impl TaskTiming {
    /// Whether idle time precedes this task
    #[inline]
    #[must_use]
    pub fn has_gap(&self) -> bool {
        !self.gap_before.is_zero()
    }
}
