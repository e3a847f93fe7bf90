//! Conflict remedies for turnaround violations.
//!
//! Given an event that sits too close to its neighbour on the same aircraft
//! or FTD line, the engine proposes a single new start time and, when the
//! original crew cannot make that slot, alternative instructors for it.
//! Nothing here mutates the program; callers apply at most one remedy and
//! re-run detection.

pub mod context;
pub mod search;
pub mod substitute;
pub mod turnaround;

#[cfg(test)]
mod tests;

use crate::person::InstructorRank;
use crate::time::Hours;
use serde::Serialize;
use std::fmt;
use std::fmt::Formatter;

pub use context::{RemedyConfig, RemedyContext};
pub use search::generate_time_shift_remedies;

/// Added beyond the legal boundary, away from the violating neighbour.
pub const SAFETY_BUFFER: Hours = Hours(5.0 / 60.0);

pub const PREVIOUS_TURNAROUND_MESSAGE: &str = "Turnaround violation with previous";
pub const NEXT_TURNAROUND_MESSAGE: &str = "Turnaround violation with next";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    PreviousTurnaround,
    NextTurnaround,
    Other(String),
}

impl ViolationKind {
    /// Classifies the human readable strings produced by the legacy detector.
    pub fn from_message(message: &str) -> ViolationKind {
        if message.contains(PREVIOUS_TURNAROUND_MESSAGE) {
            ViolationKind::PreviousTurnaround
        } else if message.contains(NEXT_TURNAROUND_MESSAGE) {
            ViolationKind::NextTurnaround
        } else {
            ViolationKind::Other(message.to_string())
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::PreviousTurnaround => f.write_str(PREVIOUS_TURNAROUND_MESSAGE),
            ViolationKind::NextTurnaround => f.write_str(NEXT_TURNAROUND_MESSAGE),
            ViolationKind::Other(message) => f.write_str(message),
        }
    }
}

/// An instructor offered for a slot, with their load for the day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorOption {
    pub name: String,
    pub rank: Option<InstructorRank>,
    pub duty_hours: Hours,
    pub flights_today: u32,
    pub ftds_today: u32,
    pub cpts_today: u32,
    pub ground_today: u32,
}

impl InstructorOption {
    pub fn named(name: impl Into<String>) -> InstructorOption {
        InstructorOption {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Remedy {
    /// Move the event, optionally with a different instructor.
    #[serde(rename = "timeshift", rename_all = "camelCase")]
    TimeShift {
        new_start_time: Hours,
        instructor: InstructorOption,
    },
    /// Keep the time, swap the instructor.
    #[serde(rename = "instructor")]
    Instructor { instructor: InstructorOption },
}

impl Remedy {
    pub fn new_start_time(&self) -> Option<Hours> {
        match self {
            Remedy::TimeShift { new_start_time, .. } => Some(*new_start_time),
            Remedy::Instructor { .. } => None,
        }
    }

    pub fn instructor(&self) -> &InstructorOption {
        match self {
            Remedy::TimeShift { instructor, .. } | Remedy::Instructor { instructor } => instructor,
        }
    }
}

impl fmt::Display for Remedy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let who = match self.instructor().name.as_str() {
            "" => "no instructor",
            name => name,
        };
        match self {
            Remedy::TimeShift { new_start_time, .. } => {
                write!(f, "move to {} with {}", new_start_time, who)
            }
            Remedy::Instructor { .. } => write!(f, "swap instructor to {}", who),
        }
    }
}
