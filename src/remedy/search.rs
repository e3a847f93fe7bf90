use crate::event::Event;
use crate::remedy::turnaround::effective_turnaround;
use crate::remedy::{InstructorOption, Remedy, RemedyContext, SAFETY_BUFFER, ViolationKind};
use crate::syllabus::BookingWindow;
use crate::time::Hours;
use tracing::{debug, trace};

/// Proposes a start time that clears a turnaround violation on `conflicted`.
///
/// Previous-turnaround violations are resolved first by delaying the event;
/// only when none is present is a next-turnaround violation resolved by
/// bringing the event forward. A caller facing both applies the result and
/// asks again for the other one. Every infeasible case yields an empty list.
///
/// `all_events` is the full set for the event's day.
pub fn generate_time_shift_remedies<C: RemedyContext + ?Sized>(
    ctx: &C,
    conflicted: &Event,
    all_events: &[Event],
    violations: &[ViolationKind],
    flying_end_time: Hours,
) -> Vec<Remedy> {
    let mut on_resource = all_events
        .iter()
        .filter(|e| e.resource_id == conflicted.resource_id)
        .collect::<Vec<&Event>>();
    on_resource.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let base = ctx.config().base_turnaround(conflicted.kind);

    if violations.contains(&ViolationKind::PreviousTurnaround) {
        debug!(event = %conflicted.id, "resolving previous turnaround by delay");
        return delay_remedies(ctx, conflicted, all_events, &on_resource, base, flying_end_time);
    }
    if violations.contains(&ViolationKind::NextTurnaround) {
        debug!(event = %conflicted.id, "resolving next turnaround by moving earlier");
        return early_remedies(ctx, conflicted, all_events, &on_resource, base);
    }
    vec![]
}

fn delay_remedies<C: RemedyContext + ?Sized>(
    ctx: &C,
    conflicted: &Event,
    all_events: &[Event],
    on_resource: &[&Event],
    base: Hours,
    flying_end_time: Hours,
) -> Vec<Remedy> {
    let Some(prev) = on_resource
        .iter()
        .filter(|e| e.start_time < conflicted.start_time && !e.is_standby())
        .last()
    else {
        debug!(event = %conflicted.id, "no preceding event to delay past");
        return vec![];
    };

    let turnaround = effective_turnaround(ctx, base, prev, conflicted);
    let required_start = prev.end_time() + turnaround;
    // only the base turnaround is held against the next event here
    let max_start = match next_on_resource(on_resource, conflicted) {
        Some(next) => next.start_time - conflicted.duration - base,
        None => flying_end_time - conflicted.duration,
    };

    let candidate = required_start + SAFETY_BUFFER;
    debug!(
        event = %conflicted.id,
        prev = %prev.id,
        %turnaround,
        %required_start,
        %max_start,
        "delay bounds"
    );
    if candidate > max_start {
        return vec![];
    }
    remedies_at(ctx, conflicted, all_events, candidate)
}

fn early_remedies<C: RemedyContext + ?Sized>(
    ctx: &C,
    conflicted: &Event,
    all_events: &[Event],
    on_resource: &[&Event],
    base: Hours,
) -> Vec<Remedy> {
    let Some(next) = next_on_resource(on_resource, conflicted) else {
        debug!(event = %conflicted.id, "no following event to move ahead of");
        return vec![];
    };

    let turnaround = effective_turnaround(ctx, base, conflicted, next);
    let required_end = next.start_time - turnaround;
    let new_start = required_end - conflicted.duration;

    let now = ctx.now();
    if new_start - ctx.pre_flight_time(conflicted) < now {
        debug!(event = %conflicted.id, %new_start, %now, "brief would start in the past");
        return vec![];
    }

    let min_start = on_resource
        .iter()
        .filter(|e| e.start_time < conflicted.start_time)
        .last()
        .map(|prev| prev.end_time() + base)
        .unwrap_or(Hours::NEG_INFINITY);

    let candidate = new_start - SAFETY_BUFFER;
    debug!(
        event = %conflicted.id,
        next = %next.id,
        %turnaround,
        %new_start,
        %min_start,
        "early bounds"
    );
    if candidate < min_start {
        return vec![];
    }
    remedies_at(ctx, conflicted, all_events, candidate)
}

fn next_on_resource<'a>(on_resource: &[&'a Event], conflicted: &Event) -> Option<&'a Event> {
    on_resource
        .iter()
        .find(|e| e.start_time > conflicted.start_time)
        .copied()
}

/// Keeps the original crew when they can all make `candidate`, otherwise
/// offers the slot with each available substitute instructor.
fn remedies_at<C: RemedyContext + ?Sized>(
    ctx: &C,
    conflicted: &Event,
    all_events: &[Event],
    candidate: Hours,
) -> Vec<Remedy> {
    if original_crew_available(ctx, conflicted, all_events, candidate) {
        let instructor = InstructorOption::named(conflicted.instructor.clone().unwrap_or_default());
        return vec![Remedy::TimeShift {
            new_start_time: candidate,
            instructor,
        }];
    }

    let substitutes = ctx.substitute_instructors(conflicted, all_events, candidate);
    debug!(
        event = %conflicted.id,
        %candidate,
        count = substitutes.len(),
        "original crew unavailable, offering substitutes"
    );
    substitutes
        .into_iter()
        .map(|instructor| Remedy::TimeShift {
            new_start_time: candidate,
            instructor,
        })
        .collect()
}

fn original_crew_available<C: RemedyContext + ?Sized>(
    ctx: &C,
    conflicted: &Event,
    all_events: &[Event],
    candidate: Hours,
) -> bool {
    let window = ctx.booking_window(&conflicted.shifted_to(candidate));
    // names with no instructor or trainee record are not checked
    ctx.personnel(conflicted)
        .into_iter()
        .filter_map(|name| ctx.find_person(name))
        .all(|person| {
            let unavailable = ctx.is_unavailable(
                &person,
                window.start,
                window.end,
                conflicted.date,
                conflicted.kind,
            );
            if unavailable {
                trace!(person = person.name(), "statically unavailable");
            }
            !unavailable && !has_booking_clash(ctx, conflicted, all_events, person.name(), &window)
        })
}

fn has_booking_clash<C: RemedyContext + ?Sized>(
    ctx: &C,
    conflicted: &Event,
    all_events: &[Event],
    name: &str,
    window: &BookingWindow,
) -> bool {
    all_events
        .iter()
        .filter(|e| e.id != conflicted.id)
        .filter(|e| ctx.personnel(e).contains(&name))
        .any(|e| {
            let clash = window.overlaps(&ctx.booking_window(e));
            if clash {
                trace!(person = name, other = %e.id, "booking clash");
            }
            clash
        })
}
