use crate::event::Event;
use crate::time::Hours;
use serde::Deserialize;

/// Static reference data for one syllabus item. Only the briefing buffers
/// feed the remedy engine, the rest is carried for display.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusItem {
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub pre_flight_time: Hours,
    #[serde(default)]
    pub post_flight_time: Hours,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

/// The interval a person is actually tied up by an event, briefings included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingWindow {
    pub start: Hours,
    pub end: Hours,
}

impl BookingWindow {
    /// Missing syllabus data means no buffers, the raw event interval.
    pub fn of(event: &Event, item: Option<&SyllabusItem>) -> BookingWindow {
        let pre = item.map(|s| s.pre_flight_time).unwrap_or(Hours::ZERO);
        let post = item.map(|s| s.post_flight_time).unwrap_or(Hours::ZERO);
        BookingWindow {
            start: event.start_time - pre,
            end: event.start_time + event.duration + post,
        }
    }

    pub fn overlaps(&self, other: &BookingWindow) -> bool {
        Hours::is_overlapping(&(self.start, self.end), &(other.start, other.end))
    }
}
