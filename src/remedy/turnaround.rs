use crate::event::Event;
use crate::remedy::RemedyContext;
use crate::time::Hours;

pub fn shares_crew<C: RemedyContext + ?Sized>(ctx: &C, before: &Event, after: &Event) -> bool {
    let before_crew = ctx.personnel(before);
    ctx.personnel(after)
        .iter()
        .any(|p| before_crew.contains(p))
}

/// Debrief of the earlier event plus brief of the later one.
pub fn crew_gap<C: RemedyContext + ?Sized>(ctx: &C, before: &Event, after: &Event) -> Hours {
    ctx.post_flight_time(before) + ctx.pre_flight_time(after)
}

/// Minimum legal gap between `before` ending and `after` starting on the same
/// resource. When the same people fly both, their briefing time can bind
/// harder than the resource turnaround.
pub fn effective_turnaround<C: RemedyContext + ?Sized>(
    ctx: &C,
    base: Hours,
    before: &Event,
    after: &Event,
) -> Hours {
    if shares_crew(ctx, before, after) {
        base.max(crew_gap(ctx, before, after))
    } else {
        base
    }
}
