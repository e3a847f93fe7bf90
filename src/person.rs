use crate::event::EventKind;
use crate::time::Hours;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UnavailabilityReason {
    #[serde(rename = "TMUF")]
    Tmuf,
    #[serde(rename = "TMUF - Ground Duties only")]
    TmufGroundDutiesOnly,
    Leave,
    Appointment,
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailabilityPeriod {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    pub reason: UnavailabilityReason,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UnavailabilityPeriod {
    /// Rejects records whose blocked range would be silently widened or
    /// emptied: unparseable times, an end date before the start date, or a
    /// single-day timed period ending before it starts.
    pub fn validate(&self) -> Result<(), String> {
        if self.end_date < self.start_date {
            return Err(format!("unavailability {} ends before it starts", self.id));
        }
        if self.all_day {
            return Ok(());
        }
        let parse = |time: &Option<String>| match time.as_deref() {
            None => Ok(None),
            Some(s) => Hours::parse_hhmm(s)
                .map(Some)
                .ok_or_else(|| format!("unavailability {} has bad time {:?}", self.id, s)),
        };
        let from = parse(&self.start_time)?;
        let to = parse(&self.end_time)?;
        if let (Some(from), Some(to)) = (from, to) {
            if self.start_date == self.end_date && to < from {
                return Err(format!("unavailability {} ends before it starts", self.id));
            }
        }
        Ok(())
    }

    /// Range of `date` the period blocks, if it touches that date at all.
    ///
    /// All-day periods run up to, not including, `end_date` (the first day
    /// back); a period entered with equal dates still blocks that one day.
    /// Timed periods include `end_date`; the first day is blocked from
    /// `start_time` and the last day until `end_time`.
    pub fn blocked_range(&self, date: NaiveDate) -> Option<(Hours, Hours)> {
        if self.all_day {
            let covered = if self.start_date == self.end_date {
                date == self.start_date
            } else {
                date >= self.start_date && date < self.end_date
            };
            return covered.then_some((Hours::ZERO, Hours::END_OF_DAY));
        }

        if date < self.start_date || date > self.end_date {
            return None;
        }
        let from = self
            .start_time
            .as_deref()
            .and_then(Hours::parse_hhmm)
            .filter(|_| date == self.start_date)
            .unwrap_or(Hours::ZERO);
        let to = self
            .end_time
            .as_deref()
            .and_then(Hours::parse_hhmm)
            .filter(|_| date == self.end_date)
            .unwrap_or(Hours::END_OF_DAY);
        Some((from, to))
    }

    /// Ground-duties-only restrictions leave ground school, CPT and
    /// deployments bookable.
    pub fn applies_to(&self, kind: EventKind) -> bool {
        match self.reason {
            UnavailabilityReason::TmufGroundDutiesOnly => kind.is_flying(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructorRank {
    #[serde(rename = "WGCDR")]
    Wgcdr,
    #[serde(rename = "SQNLDR")]
    Sqnldr,
    #[serde(rename = "FLTLT")]
    Fltlt,
    #[serde(rename = "FLGOFF")]
    Flgoff,
    #[serde(rename = "PLTOFF")]
    Pltoff,
    Mr,
}

impl fmt::Display for InstructorRank {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstructorRank::Wgcdr => "WGCDR",
            InstructorRank::Sqnldr => "SQNLDR",
            InstructorRank::Fltlt => "FLTLT",
            InstructorRank::Flgoff => "FLGOFF",
            InstructorRank::Pltoff => "PLTOFF",
            InstructorRank::Mr => "Mr",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Instructor {
    pub name: String,
    pub rank: InstructorRank,
    #[serde(default)]
    pub unavailability: Vec<UnavailabilityPeriod>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainee {
    pub full_name: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub unavailability: Vec<UnavailabilityPeriod>,
}

/// Anyone who can hold a role on an event. Events refer to instructors by
/// `name` and trainees by `full_name`.
#[derive(Debug, Clone, Copy)]
pub enum Person<'a> {
    Instructor(&'a Instructor),
    Trainee(&'a Trainee),
}

impl<'a> Person<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            Person::Instructor(i) => &i.name,
            Person::Trainee(t) => &t.full_name,
        }
    }

    pub fn unavailability(&self) -> &'a [UnavailabilityPeriod] {
        match *self {
            Person::Instructor(i) => &i.unavailability,
            Person::Trainee(t) => &t.unavailability,
        }
    }

    /// Leave, medical and appointments only; other bookings are not consulted.
    pub fn is_statically_unavailable(
        &self,
        start: Hours,
        end: Hours,
        date: NaiveDate,
        kind: EventKind,
    ) -> bool {
        self.unavailability()
            .iter()
            .filter(|p| p.applies_to(kind))
            .filter_map(|p| p.blocked_range(date))
            .any(|blocked| Hours::is_overlapping(&(start, end), &blocked))
    }
}
