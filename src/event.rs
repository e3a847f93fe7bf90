use crate::time::Hours;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Formatter;
use std::sync::Arc;

pub type EventId = Arc<str>;
pub type ResourceId = Arc<str>;

/// Standby placeholders are parked on resources named `STBY...`.
pub const STANDBY_PREFIX: &str = "STBY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Flight,
    Ftd,
    Ground,
    Cpt,
    Deployment,
}

impl EventKind {
    /// Flights and simulator sorties, the activities that need a turnaround.
    pub fn is_flying(self) -> bool {
        matches!(self, EventKind::Flight | EventKind::Ftd)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Flight => "flight",
            EventKind::Ftd => "ftd",
            EventKind::Ground => "ground",
            EventKind::Cpt => "cpt",
            EventKind::Deployment => "deployment",
        };
        f.write_str(s)
    }
}

/// A scheduled activity occupying `[start_time, start_time + duration)` on
/// its resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub resource_id: ResourceId,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub start_time: Hours,
    pub duration: Hours,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub student: Option<String>,
    #[serde(default)]
    pub pilot: Option<String>,
    #[serde(default)]
    pub crew: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub flight_number: String,
}

impl Event {
    pub fn end_time(&self) -> Hours {
        self.start_time + self.duration
    }

    pub fn is_standby(&self) -> bool {
        self.resource_id.starts_with(STANDBY_PREFIX)
    }

    /// Names holding a role on the event, de-duplicated, blanks skipped.
    pub fn personnel(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        [&self.instructor, &self.student, &self.pilot, &self.crew]
            .into_iter()
            .filter_map(|role| role.as_deref())
            .chain(self.attendees.iter().map(String::as_str))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .for_each(|name| {
                if !names.contains(&name) {
                    names.push(name);
                }
            });
        names
    }

    /// Hypothetical copy of the event moved to `start_time`.
    pub fn shifted_to(&self, start_time: Hours) -> Event {
        Event {
            start_time,
            ..self.clone()
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}-{}",
            self.id,
            self.resource_id,
            self.kind,
            self.start_time,
            self.end_time()
        )
    }
}
