use crate::event::{Event, EventKind};
use crate::person::{Instructor, Person};
use crate::remedy::{InstructorOption, RemedyContext};
use crate::syllabus::BookingWindow;
use crate::time::Hours;
use tracing::trace;

/// What an instructor already has on the event's day.
#[derive(Debug, Default)]
struct DayLoad {
    windows: Vec<BookingWindow>,
    flights: u32,
    ftds: u32,
    cpts: u32,
    ground: u32,
}

impl DayLoad {
    fn collect<C: RemedyContext + ?Sized>(
        ctx: &C,
        name: &str,
        event: &Event,
        all_events: &[Event],
    ) -> DayLoad {
        all_events
            .iter()
            .filter(|e| e.id != event.id && e.date == event.date)
            .filter(|e| ctx.personnel(e).contains(&name))
            .fold(DayLoad::default(), |mut load, e| {
                load.windows.push(ctx.booking_window(e));
                match e.kind {
                    EventKind::Flight => load.flights += 1,
                    EventKind::Ftd => load.ftds += 1,
                    EventKind::Cpt => load.cpts += 1,
                    EventKind::Ground | EventKind::Deployment => load.ground += 1,
                }
                load
            })
    }

    /// First booking start to last booking end once `extra` is added.
    fn duty_with(&self, extra: &BookingWindow) -> Hours {
        let (start, end) = self
            .windows
            .iter()
            .fold((extra.start, extra.end), |(start, end), w| {
                (start.min(w.start), end.max(w.end))
            });
        end - start
    }
}

/// Instructors free to take `event` at `at`, least loaded first.
///
/// Anyone already holding a role on the event is skipped, as is anyone on
/// leave, double booked, or pushed past the maximum crew duty period.
pub fn find_substitute_instructors<C: RemedyContext + ?Sized>(
    ctx: &C,
    instructors: &[Instructor],
    event: &Event,
    all_events: &[Event],
    at: Hours,
) -> Vec<InstructorOption> {
    let window = ctx.booking_window(&event.shifted_to(at));
    let on_event = ctx.personnel(event);
    let max_duty = ctx.config().max_crew_duty_period;

    let mut options = instructors
        .iter()
        .filter(|i| !on_event.contains(&i.name.as_str()))
        .filter(|i| {
            !ctx.is_unavailable(
                &Person::Instructor(*i),
                window.start,
                window.end,
                event.date,
                event.kind,
            )
        })
        .filter_map(|i| {
            let load = DayLoad::collect(ctx, &i.name, event, all_events);
            if load.windows.iter().any(|w| w.overlaps(&window)) {
                trace!(instructor = %i.name, "double booked");
                return None;
            }
            let duty_hours = load.duty_with(&window);
            if duty_hours > max_duty {
                trace!(instructor = %i.name, %duty_hours, "over duty period");
                return None;
            }
            Some(InstructorOption {
                name: i.name.clone(),
                rank: Some(i.rank),
                duty_hours,
                flights_today: load.flights,
                ftds_today: load.ftds,
                cpts_today: load.cpts,
                ground_today: load.ground,
            })
        })
        .collect::<Vec<InstructorOption>>();

    options.sort_by(|a, b| {
        a.duty_hours
            .total_cmp(&b.duty_hours)
            .then_with(|| a.name.cmp(&b.name))
    });
    options
}
