use crate::error::{ProgramError, ProgramResult};
use crate::event::{Event, EventId};
use crate::person::{Instructor, Person, Trainee};
use crate::remedy::substitute::find_substitute_instructors;
use crate::remedy::turnaround::effective_turnaround;
use crate::remedy::{
    InstructorOption, Remedy, RemedyConfig, RemedyContext, ViolationKind,
    generate_time_shift_remedies,
};
use crate::syllabus::SyllabusItem;
use crate::time::Hours;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

/// Float slack when comparing a gap against its legal minimum.
const TOLERANCE: f64 = 1e-9;

/// An event that currently breaks a turnaround rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub event_id: EventId,
    pub violations: Vec<ViolationKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedRemedy {
    pub event_id: EventId,
    pub previous_start: Hours,
    pub remedy: Remedy,
}

/// The flying program with its people and syllabus, and the production
/// source of everything the remedy engine looks up.
pub struct Program {
    pub config: RemedyConfig,
    pub instructors: Vec<Instructor>,
    pub trainees: Vec<Trainee>,
    syllabus: HashMap<String, SyllabusItem>,
    pub events: Vec<Event>,
    events_index: HashMap<EventId, usize>,
    pub last_applied: Option<AppliedRemedy>,
}

impl Program {
    pub fn new(
        config: RemedyConfig,
        instructors: Vec<Instructor>,
        trainees: Vec<Trainee>,
        syllabus: Vec<SyllabusItem>,
        events: Vec<Event>,
    ) -> ProgramResult<Program> {
        validate(&instructors, &trainees, &events)?;
        let mut program = Program {
            config,
            instructors,
            trainees,
            syllabus: syllabus.into_iter().map(|s| (s.id.clone(), s)).collect(),
            events,
            events_index: HashMap::new(),
            last_applied: None,
        };
        program.reindex();
        Ok(program)
    }

    pub fn from_json(data: &str) -> ProgramResult<Self> {
        #[derive(Deserialize)]
        struct RawData {
            #[serde(default)]
            config: RemedyConfig,
            #[serde(default)]
            instructors: Vec<Instructor>,
            #[serde(default)]
            trainees: Vec<Trainee>,
            #[serde(default)]
            syllabus: Vec<SyllabusItem>,
            events: Vec<Event>,
        }
        let raw: RawData = serde_json::from_str(data)?;
        Program::new(
            raw.config,
            raw.instructors,
            raw.trainees,
            raw.syllabus,
            raw.events,
        )
    }

    pub fn load_from_file(path: &Path) -> ProgramResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Program::from_json(&data)
    }

    fn reindex(&mut self) {
        self.events.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.start_time.total_cmp(&b.start_time))
        });
        self.events_index = self
            .events
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect::<HashMap<EventId, usize>>();
    }

    pub fn event(&self, event_id: &EventId) -> ProgramResult<&Event> {
        self.events_index
            .get(event_id)
            .map(|idx| &self.events[*idx])
            .ok_or_else(|| ProgramError::UnknownEvent(event_id.clone()))
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates = self.events.iter().map(|e| e.date).collect::<Vec<_>>();
        dates.dedup();
        dates
    }

    /// The authoritative event set for one day.
    pub fn events_on(&self, date: NaiveDate) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect()
    }

    pub fn detect_violations(&self, event_id: &EventId) -> ProgramResult<Vec<ViolationKind>> {
        let event = self.event(event_id)?;
        Ok(self.turnaround_violations(event))
    }

    fn turnaround_violations(&self, event: &Event) -> Vec<ViolationKind> {
        let mut violations = vec![];
        if event.is_standby() {
            return violations;
        }

        let on_resource = self
            .events
            .iter()
            .filter(|e| e.date == event.date && e.resource_id == event.resource_id)
            .filter(|e| e.id != event.id)
            .collect::<Vec<&Event>>();
        let base = self.config.base_turnaround(event.kind);

        // same start on the same resource is a double booking, reported once
        // against whichever of the two sorts later
        let position = self.events_index.get(&event.id);
        let double_booked = on_resource.iter().any(|e| {
            e.start_time == event.start_time
                && self.events_index.get(&e.id) < position
                && Hours::is_overlapping(
                    &(e.start_time, e.end_time()),
                    &(event.start_time, event.end_time()),
                )
        });
        let too_close = on_resource
            .iter()
            .filter(|e| e.start_time < event.start_time)
            .last()
            .is_some_and(|prev| {
                let ready_at = prev.end_time() + effective_turnaround(self, base, prev, event);
                event.start_time.0 < ready_at.0 - TOLERANCE
            });
        if double_booked || too_close {
            violations.push(ViolationKind::PreviousTurnaround);
        }
        if let Some(next) = on_resource
            .iter()
            .find(|e| e.start_time > event.start_time)
        {
            let ready_at = event.end_time() + effective_turnaround(self, base, event, next);
            if next.start_time.0 < ready_at.0 - TOLERANCE {
                violations.push(ViolationKind::NextTurnaround);
            }
        }
        violations
    }

    pub fn problems(&self, date: NaiveDate) -> Vec<Problem> {
        self.events
            .iter()
            .filter(|e| e.date == date)
            .filter_map(|e| {
                let violations = self.turnaround_violations(e);
                (!violations.is_empty()).then(|| Problem {
                    event_id: e.id.clone(),
                    violations,
                })
            })
            .collect()
    }

    pub fn time_shift_remedies(&self, event_id: &EventId) -> ProgramResult<Vec<Remedy>> {
        let event = self.event(event_id)?;
        let violations = self.turnaround_violations(event);
        let day = self.events_on(event.date);
        Ok(generate_time_shift_remedies(
            self,
            event,
            &day,
            &violations,
            self.config.flying_end_time,
        ))
    }

    pub fn instructor_remedies(&self, event_id: &EventId) -> ProgramResult<Vec<Remedy>> {
        let event = self.event(event_id)?;
        let day = self.events_on(event.date);
        Ok(self
            .substitute_instructors(event, &day, event.start_time)
            .into_iter()
            .map(|instructor| Remedy::Instructor { instructor })
            .collect())
    }

    pub fn apply_remedy(&mut self, event_id: &EventId, remedy: &Remedy) -> ProgramResult<()> {
        let idx = *self
            .events_index
            .get(event_id)
            .ok_or_else(|| ProgramError::UnknownEvent(event_id.clone()))?;
        let invalid = |reason: &str| ProgramError::InvalidRemedy {
            event: event_id.clone(),
            reason: reason.to_string(),
        };

        let name = remedy.instructor().name.as_str();
        let event = &mut self.events[idx];
        let previous_start = event.start_time;
        match remedy {
            Remedy::TimeShift { new_start_time, .. } => {
                if !new_start_time.0.is_finite() || new_start_time.0 < 0.0 {
                    return Err(invalid("start time out of range"));
                }
                event.start_time = *new_start_time;
                event.instructor = (!name.is_empty()).then(|| name.to_string());
            }
            Remedy::Instructor { .. } => {
                if name.is_empty() {
                    return Err(invalid("no instructor named"));
                }
                event.instructor = Some(name.to_string());
            }
        }
        info!(event = %event_id, from = %previous_start, remedy = %remedy, "applied remedy");

        self.last_applied = Some(AppliedRemedy {
            event_id: event_id.clone(),
            previous_start,
            remedy: remedy.clone(),
        });
        self.reindex();
        Ok(())
    }
}

/// Load-time checks on the records the engine takes on trust.
fn validate(instructors: &[Instructor], trainees: &[Trainee], events: &[Event]) -> ProgramResult<()> {
    let invalid = |reason: String| Err(ProgramError::InvalidScenario(reason));

    let mut seen = HashSet::new();
    for e in events {
        if !seen.insert(e.id.clone()) {
            return invalid(format!("duplicate event id {}", e.id));
        }
        if !e.start_time.0.is_finite() || e.start_time.0 < 0.0 {
            return invalid(format!("event {} starts at {}", e.id, e.start_time.0));
        }
        if !e.duration.0.is_finite() || e.duration.0 <= 0.0 {
            return invalid(format!("event {} lasts {}", e.id, e.duration.0));
        }
    }

    instructors
        .iter()
        .flat_map(|i| &i.unavailability)
        .chain(trainees.iter().flat_map(|t| &t.unavailability))
        .try_for_each(|period| period.validate())
        .map_err(ProgramError::InvalidScenario)
}

impl RemedyContext for Program {
    fn config(&self) -> &RemedyConfig {
        &self.config
    }

    fn now(&self) -> Hours {
        self.config.clock.unwrap_or_else(Hours::now_local)
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
        event: &Event,
        all_events: &[Event],
        at: Hours,
    ) -> Vec<InstructorOption> {
        find_substitute_instructors(self, &self.instructors, event, all_events, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remedy::SAFETY_BUFFER;
    use std::sync::Arc;

    fn id(s: &str) -> EventId {
        Arc::from(s)
    }

    const SCENARIO: &str = r#"{
        "config": { "flightTurnaround": 0.5, "clock": 6.0 },
        "instructors": [
            { "name": "Smith", "rank": "FLTLT" },
            { "name": "Brown", "rank": "SQNLDR" },
            { "name": "White", "rank": "Mr" },
            { "name": "Black", "rank": "FLGOFF", "unavailability": [
                { "id": "U1", "startDate": "2025-03-03", "endDate": "2025-03-04",
                  "allDay": true, "reason": "Leave" }
            ] }
        ],
        "trainees": [
            { "fullName": "Jones", "course": "ADF301" },
            { "fullName": "Green", "course": "ADF301" }
        ],
        "syllabus": [
            { "id": "BGF1", "preFlightTime": 0.25, "postFlightTime": 0.25 }
        ],
        "events": [
            { "id": "E2", "resourceId": "PC21-01", "date": "2025-03-03", "type": "flight",
              "startTime": 10.2, "duration": 1.0, "instructor": "Brown", "student": "Green",
              "flightNumber": "BGF1" },
            { "id": "E1", "resourceId": "PC21-01", "date": "2025-03-03", "type": "flight",
              "startTime": 9.0, "duration": 1.0, "instructor": "Smith", "student": "Jones",
              "flightNumber": "BGF1" },
            { "id": "E3", "resourceId": "PC21-02", "date": "2025-03-03", "type": "flight",
              "startTime": 11.0, "duration": 1.0, "instructor": "White", "student": "Jones",
              "flightNumber": "BGF1" }
        ]
    }"#;

    fn program() -> Program {
        Program::from_json(SCENARIO).unwrap()
    }

    #[test]
    fn test_events_sorted_and_indexed() {
        let program = program();
        assert_eq!(id("E1"), program.events[0].id);
        assert_eq!(Hours(10.2), program.event(&id("E2")).unwrap().start_time);
        assert_eq!(1, program.dates().len());
    }

    #[test]
    fn test_unknown_event() {
        let program = program();
        assert!(matches!(
            program.detect_violations(&id("NOPE")),
            Err(ProgramError::UnknownEvent(_))
        ));
    }

    #[test]
    fn test_detects_previous_and_next_turnaround() {
        let program = program();
        assert_eq!(
            vec![ViolationKind::PreviousTurnaround],
            program.detect_violations(&id("E2")).unwrap()
        );
        assert_eq!(
            vec![ViolationKind::NextTurnaround],
            program.detect_violations(&id("E1")).unwrap()
        );
        assert!(program.detect_violations(&id("E3")).unwrap().is_empty());
        assert_eq!(2, program.problems(program.dates()[0]).len());
    }

    #[test]
    fn test_remedy_then_apply_clears_previous_violation() {
        let mut program = program();
        let remedies = program.time_shift_remedies(&id("E2")).unwrap();
        assert_eq!(1, remedies.len());
        let new_start = remedies[0].new_start_time().unwrap();
        assert!((new_start.0 - (10.5 + SAFETY_BUFFER.0)).abs() < 1e-9);
        assert_eq!("Brown", remedies[0].instructor().name);

        program.apply_remedy(&id("E2"), &remedies[0]).unwrap();
        assert!(program.detect_violations(&id("E2")).unwrap().is_empty());
        assert_eq!(Some("Brown"), program.event(&id("E2")).unwrap().instructor.as_deref());
        let applied = program.last_applied.as_ref().unwrap();
        assert_eq!(Hours(10.2), applied.previous_start);
    }

    #[test]
    fn test_early_remedy_respects_pinned_clock() {
        let mut program = program();
        // ahead of E2 the latest legal start is 8.7, with its brief at 8.45
        program.config.clock = Some(Hours(8.5));
        assert!(program.time_shift_remedies(&id("E1")).unwrap().is_empty());
        program.config.clock = Some(Hours(6.0));
        let remedies = program.time_shift_remedies(&id("E1")).unwrap();
        assert_eq!(1, remedies.len());
        assert!((remedies[0].new_start_time().unwrap().0 - (8.7 - SAFETY_BUFFER.0)).abs() < 1e-9);
    }

    #[test]
    fn test_instructor_remedies_skip_leave_and_double_booking() {
        let program = program();
        let names = program
            .instructor_remedies(&id("E2"))
            .unwrap()
            .iter()
            .map(|r| r.instructor().name.clone())
            .collect::<Vec<_>>();
        // Smith is busy until 10.25, White from 10.75, Black on leave
        assert!(names.is_empty());

        let names = program
            .instructor_remedies(&id("E3"))
            .unwrap()
            .iter()
            .map(|r| r.instructor().name.clone())
            .collect::<Vec<_>>();
        assert_eq!(vec!["Smith".to_string()], names);
    }

    #[test]
    fn test_apply_rejects_bad_remedies() {
        let mut program = program();
        let bad_time = Remedy::TimeShift {
            new_start_time: Hours::NEG_INFINITY,
            instructor: InstructorOption::named("Brown"),
        };
        assert!(matches!(
            program.apply_remedy(&id("E2"), &bad_time),
            Err(ProgramError::InvalidRemedy { .. })
        ));
        let nobody = Remedy::Instructor {
            instructor: InstructorOption::default(),
        };
        assert!(program.apply_remedy(&id("E2"), &nobody).is_err());
        assert!(program.last_applied.is_none());
    }

    #[test]
    fn test_apply_instructor_swap() {
        let mut program = program();
        let swap = Remedy::Instructor {
            instructor: InstructorOption::named("White"),
        };
        program.apply_remedy(&id("E1"), &swap).unwrap();
        assert_eq!(Some("White"), program.event(&id("E1")).unwrap().instructor.as_deref());
        assert_eq!(Hours(9.0), program.event(&id("E1")).unwrap().start_time);
    }

    fn flight(event_id: &str, resource: &str, start: f64, duration: f64, instructor: &str) -> String {
        format!(
            r#"{{ "id": "{}", "resourceId": "{}", "date": "2025-03-03", "type": "flight",
                 "startTime": {}, "duration": {}, "instructor": "{}", "flightNumber": "BGF1" }}"#,
            event_id, resource, start, duration, instructor
        )
    }

    fn load(events: &[String]) -> ProgramResult<Program> {
        Program::from_json(&format!(
            r#"{{ "config": {{ "flightTurnaround": 0.5 }}, "events": [{}] }}"#,
            events.join(",")
        ))
    }

    fn rejected(result: ProgramResult<Program>) -> bool {
        matches!(result, Err(ProgramError::InvalidScenario(_)))
    }

    #[test]
    fn test_same_start_on_one_aircraft_is_reported() {
        let program = load(&[
            flight("A", "PC21-01", 10.0, 1.0, "Smith"),
            flight("B", "PC21-01", 10.0, 1.0, "Brown"),
            flight("C", "PC21-02", 10.0, 1.0, "White"),
        ])
        .unwrap();

        let a = program.detect_violations(&id("A")).unwrap();
        let b = program.detect_violations(&id("B")).unwrap();
        assert_eq!(1, a.len() + b.len());
        assert!(a.iter().chain(&b).all(|v| *v == ViolationKind::PreviousTurnaround));
        assert!(program.detect_violations(&id("C")).unwrap().is_empty());

        let date = program.dates()[0];
        assert_eq!(1, program.problems(date).len());
    }

    #[test]
    fn test_same_start_with_earlier_neighbour_reports_once() {
        let program = load(&[
            flight("P", "PC21-01", 9.0, 1.0, "Green"),
            flight("A", "PC21-01", 10.2, 1.0, "Smith"),
            flight("B", "PC21-01", 10.2, 1.0, "Brown"),
        ])
        .unwrap();

        // both are too close to P, and one of them also sits on the other
        assert_eq!(vec![ViolationKind::PreviousTurnaround], program.detect_violations(&id("A")).unwrap());
        assert_eq!(vec![ViolationKind::PreviousTurnaround], program.detect_violations(&id("B")).unwrap());
    }

    #[test]
    fn test_load_rejects_duplicate_event_ids() {
        let result = load(&[
            flight("C", "PC21-01", 10.2, 1.0, "Smith"),
            flight("C", "PC21-02", 10.5, 1.0, "Brown"),
        ]);
        assert!(rejected(result));
    }

    #[test]
    fn test_load_rejects_bad_times() {
        assert!(rejected(load(&[flight("C", "PC21-01", -1.0, 1.0, "Smith")])));
        assert!(rejected(load(&[flight("C", "PC21-01", 10.0, -1.0, "Smith")])));
        assert!(rejected(load(&[flight("C", "PC21-01", 10.0, 0.0, "Smith")])));
        assert!(load(&[flight("C", "PC21-01", 0.0, 0.5, "Smith")]).is_ok());
    }

    #[test]
    fn test_load_rejects_malformed_unavailability() {
        let scenario = |times: &str| {
            format!(
                r#"{{ "instructors": [{{ "name": "Smith", "rank": "FLTLT", "unavailability": [
                    {{ "id": "U1", "startDate": "2025-03-03", "endDate": "2025-03-03",
                       "allDay": false, {}, "reason": "Appointment" }}
                ] }}], "events": [] }}"#,
                times
            )
        };
        let inverted = scenario(r#""startTime": "1400", "endTime": "1000""#);
        assert!(rejected(Program::from_json(&inverted)));
        let garbled = scenario(r#""startTime": "2pm", "endTime": "1600""#);
        assert!(rejected(Program::from_json(&garbled)));
        let fine = scenario(r#""startTime": "1400", "endTime": "1600""#);
        assert!(Program::from_json(&fine).is_ok());
    }

    #[test]
    fn test_default_scenario_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/default.json");
        let program = Program::load_from_file(&path).unwrap();
        assert_eq!(9, program.events.len());
        assert_eq!(Some(Hours(6.0)), program.config.clock);
        assert!(program.syllabus_item("BGF2").is_some());
    }
}
