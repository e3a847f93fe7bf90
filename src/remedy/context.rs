use crate::event::{Event, EventKind};
use crate::person::Person;
use crate::remedy::InstructorOption;
use crate::syllabus::{BookingWindow, SyllabusItem};
use crate::time::Hours;
use chrono::NaiveDate;
use serde::Deserialize;

/// Squadron constants the engine works with, all in hours.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemedyConfig {
    pub flight_turnaround: Hours,
    pub ftd_turnaround: Hours,
    /// Caps the duty day of substitute instructors. The time-shift search
    /// itself does not consult it.
    pub max_crew_duty_period: Hours,
    pub flying_end_time: Hours,
    /// Pins the wall clock, mostly for replaying a day after the fact.
    pub clock: Option<Hours>,
}

impl Default for RemedyConfig {
    fn default() -> Self {
        RemedyConfig {
            flight_turnaround: Hours(0.5),
            ftd_turnaround: Hours(0.25),
            max_crew_duty_period: Hours(12.0),
            flying_end_time: Hours(18.0),
            clock: None,
        }
    }
}

impl RemedyConfig {
    pub fn base_turnaround(&self, kind: EventKind) -> Hours {
        match kind {
            EventKind::Flight => self.flight_turnaround,
            EventKind::Ftd => self.ftd_turnaround,
            _ => Hours::ZERO,
        }
    }
}

/// Everything the remedy search needs from the surrounding program.
pub trait RemedyContext {
    fn config(&self) -> &RemedyConfig;

    /// Current time of day.
    fn now(&self) -> Hours;

    fn syllabus_item(&self, id: &str) -> Option<&SyllabusItem>;

    /// Instructor by `name` or trainee by `full_name`.
    fn find_person(&self, name: &str) -> Option<Person<'_>>;

    /// Instructors who could take `event` if it started at `at`.
    fn substitute_instructors(
        &self,
        event: &Event,
        all_events: &[Event],
        at: Hours,
    ) -> Vec<InstructorOption>;

    fn personnel<'e>(&self, event: &'e Event) -> Vec<&'e str> {
        event.personnel()
    }

    fn booking_window(&self, event: &Event) -> BookingWindow {
        BookingWindow::of(event, self.syllabus_item(&event.flight_number))
    }

    fn is_unavailable(
        &self,
        person: &Person<'_>,
        start: Hours,
        end: Hours,
        date: NaiveDate,
        kind: EventKind,
    ) -> bool {
        person.is_statically_unavailable(start, end, date, kind)
    }

    fn pre_flight_time(&self, event: &Event) -> Hours {
        self.syllabus_item(&event.flight_number)
            .map(|s| s.pre_flight_time)
            .unwrap_or(Hours::ZERO)
    }

    fn post_flight_time(&self, event: &Event) -> Hours {
        self.syllabus_item(&event.flight_number)
            .map(|s| s.post_flight_time)
            .unwrap_or(Hours::ZERO)
    }
}
