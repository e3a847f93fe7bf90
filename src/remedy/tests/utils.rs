use crate::event::{Event, EventKind};
use crate::person::{
    Instructor, InstructorRank, Person, Trainee, UnavailabilityPeriod, UnavailabilityReason,
};
use crate::remedy::{InstructorOption, RemedyConfig, RemedyContext};
use crate::syllabus::SyllabusItem;
use crate::time::Hours;
use chrono::NaiveDate;
use proptest::prelude::Strategy;
use proptest::prop_oneof;
use proptest::strategy::Just;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

pub fn id(s: &str) -> Arc<str> {
    Arc::from(s)
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

/// In-memory context with a pinned clock and canned substitutes.
pub struct TestContext {
    pub config: RemedyConfig,
    pub now: Hours,
    pub syllabus: HashMap<String, SyllabusItem>,
    pub instructors: Vec<Instructor>,
    pub trainees: Vec<Trainee>,
    pub substitutes: Vec<InstructorOption>,
    pub substitute_calls: RefCell<Vec<Hours>>,
}

impl TestContext {
    pub fn new(flight_turnaround: f64) -> TestContext {
        TestContext {
            config: RemedyConfig {
                flight_turnaround: Hours(flight_turnaround),
                ftd_turnaround: Hours(0.25),
                max_crew_duty_period: Hours(12.0),
                flying_end_time: Hours(18.0),
                clock: None,
            },
            now: Hours::ZERO,
            syllabus: HashMap::new(),
            instructors: vec![],
            trainees: vec![],
            substitutes: vec![],
            substitute_calls: RefCell::new(vec![]),
        }
    }
}

impl RemedyContext for TestContext {
    fn config(&self) -> &RemedyConfig {
        &self.config
    }

    fn now(&self) -> Hours {
        self.now
    }

    fn syllabus_item(&self, id: &str) -> Option<&SyllabusItem> {
        self.syllabus.get(id)
    }

    fn find_person(&self, name: &str) -> Option<Person<'_>> {
        self.instructors
            .iter()
            .find(|i| i.name == name)
            .map(Person::Instructor)
            .or_else(|| {
                self.trainees
                    .iter()
                    .find(|t| t.full_name == name)
                    .map(Person::Trainee)
            })
    }

    fn substitute_instructors(
        &self,
        _event: &Event,
        _all_events: &[Event],
        at: Hours,
    ) -> Vec<InstructorOption> {
        self.substitute_calls.borrow_mut().push(at);
        self.substitutes.clone()
    }
}

pub fn add_instructor(ctx: &mut TestContext, name: &str, unavailability: Vec<UnavailabilityPeriod>) {
    ctx.instructors.push(Instructor {
        name: name.to_string(),
        rank: InstructorRank::Fltlt,
        unavailability,
    });
}

pub fn add_trainee(ctx: &mut TestContext, full_name: &str, unavailability: Vec<UnavailabilityPeriod>) {
    ctx.trainees.push(Trainee {
        full_name: full_name.to_string(),
        course: "ADF301".to_string(),
        unavailability,
    });
}

pub fn add_syllabus(ctx: &mut TestContext, id: &str, pre_flight_time: f64, post_flight_time: f64) {
    ctx.syllabus.insert(
        id.to_string(),
        SyllabusItem {
            id: id.to_string(),
            code: id.to_string(),
            phase: "BGF".to_string(),
            pre_flight_time: Hours(pre_flight_time),
            post_flight_time: Hours(post_flight_time),
            prerequisites: vec![],
        },
    );
}

pub fn add_substitutes(ctx: &mut TestContext, names: &[&str]) {
    ctx.substitutes
        .extend(names.iter().map(|n| InstructorOption::named(*n)));
}

pub fn add_event(
    events: &mut Vec<Event>,
    event_id: &str,
    resource_id: &str,
    kind: EventKind,
    start_time: f64,
    duration: f64,
    instructor: Option<&str>,
    student: Option<&str>,
    flight_number: &str,
) {
    events.push(Event {
        id: id(event_id),
        resource_id: id(resource_id),
        date: day(),
        kind,
        start_time: Hours(start_time),
        duration: Hours(duration),
        instructor: instructor.map(String::from),
        student: student.map(String::from),
        pilot: None,
        crew: None,
        attendees: vec![],
        flight_number: flight_number.to_string(),
    });
}

pub fn event<'a>(events: &'a [Event], event_id: &str) -> &'a Event {
    events.iter().find(|e| *e.id == *event_id).unwrap()
}

/// Timed unavailability on the test day, `HHMM` bounds.
pub fn unavailable(from: &str, to: &str) -> UnavailabilityPeriod {
    UnavailabilityPeriod {
        id: "U1".to_string(),
        start_date: day(),
        end_date: day(),
        all_day: false,
        start_time: Some(from.to_string()),
        end_time: Some(to.to_string()),
        reason: UnavailabilityReason::Appointment,
        notes: None,
    }
}

pub fn assert_hours(expected: f64, actual: Hours) {
    assert!(
        (expected - actual.0).abs() < 1e-9,
        "expected {} ({}), got {} ({})",
        expected,
        Hours(expected),
        actual.0,
        actual
    );
}

pub fn arb_resource() -> impl Strategy<Value = Arc<str>> {
    prop_oneof![
        Just(Arc::from("PC21-01")),
        Just(Arc::from("PC21-02")),
        Just(Arc::from("STBY001")),
    ]
}
