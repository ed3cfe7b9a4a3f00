use crate::time::{Interval, TimeOfDay};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire format of a meeting's start and end, e.g. `2025-09-16T10:30:00`
pub const MEETING_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Confirmed,
    Pending,
    Tentative,
}

/// Free-form details shown next to a meeting
#[derive(Serialize, Deserialize, Debug, Clone, Default, Eq, PartialEq)]
#[serde(default)]
pub struct MeetingDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MeetingStatus>,
}

/// An already booked meeting on one resource's calendar.
///
/// Meetings are carried alongside the availability data, they are never
/// checked against blocked windows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub resource_id: String,
    pub date: NaiveDate,
    pub slot: Interval,
    pub details: MeetingDetails,
}

impl Meeting {
    /// Builds a meeting from its start and end, which must fall on the same day.
    /// Returns `None` when they do not, or when `end` is not after `start`.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDateTime;
    /// use zeitplan_availability::meeting::{Meeting, MEETING_TIME_FORMAT};
    ///
    /// let at = |s| NaiveDateTime::parse_from_str(s, MEETING_TIME_FORMAT).unwrap();
    /// let meeting = Meeting::new(
    ///     "meeting-1",
    ///     "투자사 A 파트너 <> CEO",
    ///     "investor-a",
    ///     at("2025-09-16T10:30:00"),
    ///     at("2025-09-16T11:00:00"),
    /// )
    /// .unwrap();
    /// assert_eq!(meeting.slot.to_string(), "10:30-11:00");
    ///
    /// assert!(Meeting::new("m", "overnight", "investor-a", at("2025-09-16T23:00:00"), at("2025-09-17T01:00:00")).is_none());
    /// ```
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        resource_id: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Option<Meeting> {
        if start.date() != end.date() {
            return None;
        }
        let slot = Interval::new(time_of_day(start)?, time_of_day(end)?).ok()?;

        Some(Meeting {
            id: id.into(),
            title: title.into(),
            resource_id: resource_id.into(),
            date: start.date(),
            slot,
            details: MeetingDetails::default(),
        })
    }

    pub fn with_details(mut self, details: MeetingDetails) -> Meeting {
        self.details = details;
        self
    }
}

impl fmt::Display for Meeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date, self.slot, self.title)
    }
}

fn time_of_day(at: NaiveDateTime) -> Option<TimeOfDay> {
    // chrono guarantees hour < 24 and minute < 60; seconds are dropped
    TimeOfDay::from_hm(at.hour() as u16, at.minute() as u16).ok()
}
