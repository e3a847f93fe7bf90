use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::{Add, Sub};

/// Hours of the flying day as a real number, `8.5` is 08:30. Durations and
/// buffers share the unit so they can be added to start times directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hours(pub f64);

impl Hours {
    pub const ZERO: Hours = Hours(0.0);
    pub const END_OF_DAY: Hours = Hours(24.0);
    pub const NEG_INFINITY: Hours = Hours(f64::NEG_INFINITY);

    pub fn max(self, other: Hours) -> Hours {
        Hours(self.0.max(other.0))
    }

    pub fn min(self, other: Hours) -> Hours {
        Hours(self.0.min(other.0))
    }

    pub fn total_cmp(&self, other: &Hours) -> Ordering {
        self.0.total_cmp(&other.0)
    }

    /// Half-open interval overlap, `[a, b)` against `[c, d)`.
    pub fn is_overlapping(time: &(Hours, Hours), window: &(Hours, Hours)) -> bool {
        time.0 < window.1 && time.1 > window.0
    }

    /// Parses the `HHMM` strings used on unavailability records.
    pub fn parse_hhmm(s: &str) -> Option<Hours> {
        let s = s.trim();
        if s.len() != 4 || !s.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let hours: u32 = s[..2].parse().ok()?;
        let minutes: u32 = s[2..].parse().ok()?;
        if hours > 24 || minutes > 59 || (hours == 24 && minutes > 0) {
            return None;
        }
        Some(Hours(hours as f64 + minutes as f64 / 60.0))
    }

    /// Local wall clock as hours of day.
    pub fn now_local() -> Hours {
        let now = chrono::Local::now();
        Hours(now.hour() as f64 + now.minute() as f64 / 60.0)
    }
}

impl std::fmt::Display for Hours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.0.is_finite() {
            return write!(f, "--:--");
        }
        let total = (self.0 * 60.0).round() as i64;
        let sign = if total < 0 { "-" } else { "" };
        let total = total.abs();
        write!(f, "{}{:02}:{:02}", sign, total / 60, total % 60)
    }
}

impl Add<Hours> for Hours {
    type Output = Self;

    fn add(self, rhs: Hours) -> Self::Output {
        Hours(self.0 + rhs.0)
    }
}

impl Sub<Hours> for Hours {
    type Output = Self;

    fn sub(self, rhs: Hours) -> Self::Output {
        Hours(self.0 - rhs.0)
    }
}
