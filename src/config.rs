use crate::calendar::{BoundaryPolicy, Calendar, LunchWindow, OpenHours, DEFAULT_LUNCH_LABEL};
use crate::meeting::{Meeting, MeetingDetails, MEETING_TIME_FORMAT};
use crate::resource::{BlockedWindow, Resource};
use crate::time::{Interval, TimeOfDay, TimeParseError};
use chrono::NaiveDateTime;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

const INVESTOR_FIXTURE: &str = include_str!("../fixtures/investors.json");

/// Any of these rejects the whole configuration snapshot.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid time in {location}: {source}")]
    Time {
        location: String,
        source: TimeParseError,
    },
    #[error("Invalid window in {location}: {start}-{end} must end after it starts")]
    EmptyWindow {
        location: String,
        start: TimeOfDay,
        end: TimeOfDay,
    },
    #[error("Resource #{index} has an empty id")]
    EmptyResourceId { index: usize },
    #[error("Resource id {id} is configured more than once")]
    DuplicateResource { id: String },
    #[error("Invalid blocked time in {location}: {value} overlaps {previous}")]
    OverlappingBlock {
        location: String,
        previous: Interval,
        value: Interval,
    },
    #[error("Invalid date and time in {location}: {value:?} is not {}", MEETING_TIME_FORMAT)]
    MeetingTime {
        location: String,
        value: String,
        source: chrono::ParseError,
    },
    #[error("Meeting ({id}) must end after it starts on the same day, got {start} to {end}")]
    MeetingSpan {
        id: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("Meeting #{index} has an empty id")]
    EmptyMeetingId { index: usize },
    #[error("Meeting id {id} is configured more than once")]
    DuplicateMeeting { id: String },
    #[error("Meeting ({id}) refers to unknown resource {resource_id}")]
    UnknownMeetingResource { id: String, resource_id: String },
    #[error("Could not read calendar configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wire shape of a calendar configuration, times as `HH:MM` strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub lunch: LunchConfig,
    #[serde(rename = "openHours")]
    pub open_hours: OpenHoursConfig,
    pub resources: Vec<ResourceConfig>,
    /// Already booked meetings, each on one of `resources`
    pub meetings: Vec<MeetingConfig>,
    /// Treat overlapping blocked windows within one resource as a data
    /// entry error instead of letting the first one win.
    #[serde(rename = "rejectOverlappingBlocks")]
    pub reject_overlapping_blocks: bool,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            lunch: LunchConfig::default(),
            open_hours: OpenHoursConfig::default(),
            resources: vec![],
            meetings: vec![],
            reject_overlapping_blocks: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunchConfig {
    pub start: String,
    pub end: String,
    pub label: String,
}

impl Default for LunchConfig {
    fn default() -> Self {
        LunchConfig {
            start: "12:00".to_string(),
            end: "13:30".to_string(),
            label: DEFAULT_LUNCH_LABEL.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenHoursConfig {
    pub start: String,
    pub end: String,
    pub boundary: BoundaryPolicy,
}

impl Default for OpenHoursConfig {
    fn default() -> Self {
        OpenHoursConfig {
            start: "10:00".to_string(),
            end: "17:00".to_string(),
            boundary: BoundaryPolicy::Minute,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, rename = "blockedTimes")]
    pub blocked_times: Vec<BlockedTimeConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedTimeConfig {
    pub start: String,
    pub end: String,
    pub reason: String,
}

/// A booked meeting, start and end as `2025-09-16T10:30:00`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingConfig {
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(rename = "resourceId")]
    pub resource_id: String,
    #[serde(default, rename = "extendedProps")]
    pub details: MeetingDetails,
}

impl CalendarConfig {
    pub fn from_json(json: &str) -> Result<CalendarConfig, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates every window and builds the immutable `Calendar`
    pub fn build(&self) -> Result<Calendar, ConfigError> {
        Calendar::try_from(self)
    }
}

impl Calendar {
    /// Parses and validates a JSON configuration in one step
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::calendar::Calendar;
    ///
    /// let calendar = Calendar::from_json(r#"{
    ///     "resources": [
    ///         { "id": "investor-a", "blockedTimes": [
    ///             { "start": "11:00", "end": "11:30", "reason": "내부 회의" }
    ///         ] }
    ///     ]
    /// }"#).unwrap();
    /// assert_eq!(calendar.resources().len(), 1);
    ///
    /// let broken = Calendar::from_json(r#"{ "lunch": { "start": "12:00", "end": "13:60" } }"#);
    /// assert!(broken.is_err());
    /// ```
    pub fn from_json(json: &str) -> Result<Calendar, ConfigError> {
        CalendarConfig::from_json(json)?.build()
    }

    /// The three investors of the original meeting calendar and their eight
    /// booked meetings, with the default lunch window and 10:00-17:00 open
    /// hours.
    pub fn investor_fixture() -> Result<Calendar, ConfigError> {
        Calendar::from_json(INVESTOR_FIXTURE)
    }
}

fn window(location: &str, start: &str, end: &str) -> Result<Interval, ConfigError> {
    let parse = |value: &str| {
        value.parse::<TimeOfDay>().map_err(|source| ConfigError::Time {
            location: location.to_string(),
            source,
        })
    };

    let (start, end) = (parse(start)?, parse(end)?);

    Interval::new(start, end).map_err(|_| ConfigError::EmptyWindow {
        location: location.to_string(),
        start,
        end,
    })
}

fn date_time(location: &str, value: &str) -> Result<NaiveDateTime, ConfigError> {
    NaiveDateTime::parse_from_str(value, MEETING_TIME_FORMAT).map_err(|source| {
        ConfigError::MeetingTime {
            location: location.to_string(),
            value: value.to_string(),
            source,
        }
    })
}

fn build_meetings(
    config: &CalendarConfig,
    resource_ids: &HashSet<&str>,
) -> Result<Vec<Meeting>, ConfigError> {
    let mut seen = HashSet::with_capacity(config.meetings.len());

    config
        .meetings
        .iter()
        .enumerate()
        .map(|(index, meeting)| {
            if meeting.id.is_empty() {
                return Err(ConfigError::EmptyMeetingId { index });
            }
            if !seen.insert(meeting.id.as_str()) {
                return Err(ConfigError::DuplicateMeeting {
                    id: meeting.id.clone(),
                });
            }
            if !resource_ids.contains(meeting.resource_id.as_str()) {
                return Err(ConfigError::UnknownMeetingResource {
                    id: meeting.id.clone(),
                    resource_id: meeting.resource_id.clone(),
                });
            }

            let location = format!("Meeting ({})", meeting.id);
            let (start, end) = (
                date_time(&location, &meeting.start)?,
                date_time(&location, &meeting.end)?,
            );

            Meeting::new(&meeting.id, &meeting.title, &meeting.resource_id, start, end)
                .map(|built| built.with_details(meeting.details.clone()))
                .ok_or_else(|| ConfigError::MeetingSpan {
                    id: meeting.id.clone(),
                    start,
                    end,
                })
        })
        .collect()
}

fn check_overlaps(id: &str, blocked_times: &[BlockedWindow]) -> Result<(), ConfigError> {
    // Once sorted, any overlap also shows up between neighbours
    if let Some((previous, value)) = blocked_times
        .iter()
        .map(|block| block.window)
        .sorted_by_key(|window| (window.start(), window.end()))
        .tuple_windows()
        .find(|(previous, next)| previous.overlaps(*next))
    {
        return Err(ConfigError::OverlappingBlock {
            location: format!("Resource ({})", id),
            previous,
            value,
        });
    }

    Ok(())
}

impl TryFrom<&CalendarConfig> for Calendar {
    type Error = ConfigError;

    fn try_from(config: &CalendarConfig) -> Result<Self, Self::Error> {
        let lunch = LunchWindow {
            window: window("Lunch window", &config.lunch.start, &config.lunch.end)?,
            label: config.lunch.label.clone(),
        };

        let open_hours = OpenHours {
            window: window("Open hours", &config.open_hours.start, &config.open_hours.end)?,
            policy: config.open_hours.boundary,
        };

        let mut seen = HashSet::with_capacity(config.resources.len());

        let resources = config
            .resources
            .iter()
            .enumerate()
            .map(|(index, resource)| {
                if resource.id.is_empty() {
                    return Err(ConfigError::EmptyResourceId { index });
                }
                if !seen.insert(resource.id.as_str()) {
                    return Err(ConfigError::DuplicateResource {
                        id: resource.id.clone(),
                    });
                }

                let blocked_times = resource
                    .blocked_times
                    .iter()
                    .enumerate()
                    .map(|(i, block)| {
                        let location = format!("Resource ({}) blocked time #{}", resource.id, i + 1);
                        window(&location, &block.start, &block.end)
                            .map(|window| BlockedWindow::new(&block.reason, window))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                if config.reject_overlapping_blocks {
                    check_overlaps(&resource.id, &blocked_times)?;
                }

                debug!(
                    "resource {} with {} blocked windows",
                    resource.id,
                    blocked_times.len()
                );

                Ok(Resource {
                    id: resource.id.clone(),
                    title: resource.title.clone(),
                    description: resource.description.clone(),
                    logo: resource.logo.clone(),
                    blocked_times,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let meetings = build_meetings(config, &seen)?;

        info!(
            "loaded calendar: lunch {}, open hours {} ({:?}), {} resources, {} meetings",
            lunch.window,
            open_hours.window,
            open_hours.policy,
            resources.len(),
            meetings.len()
        );

        Ok(Calendar::new(lunch, open_hours, resources).with_meetings(meetings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_investor_fixture() {
        let calendar = Calendar::investor_fixture().unwrap();

        assert_eq!(
            calendar.resources().iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["investor-a", "investor-b", "investor-c"]
        );
        assert_eq!(calendar.lunch(), &LunchWindow::default());
        assert_eq!(calendar.open_hours(), &OpenHours::default());

        let investor_b = calendar.resource("investor-b").unwrap();
        assert_eq!(investor_b.title.as_deref(), Some("투자사 B"));
        assert_eq!(investor_b.logo.as_deref(), Some("💰"));
        assert_eq!(
            investor_b.describe_blocks(),
            "10:30-11:00 (파트너 콜), 14:00-14:30 (투자위원회), 16:00-17:00 (실사 검토)"
        );
    }

    #[test]
    fn loads_fixture_meetings() {
        use crate::meeting::MeetingStatus;

        let calendar = Calendar::investor_fixture().unwrap();
        assert_eq!(calendar.meetings().len(), 8);

        for (id, count) in [("investor-a", 3), ("investor-b", 3), ("investor-c", 2), ("nobody", 0)] {
            assert_eq!(calendar.meeting_count(id), count, "{}", id);
        }

        let final_call = calendar.meetings_for("investor-b").last().unwrap();
        assert_eq!(final_call.id, "meeting-8");
        assert_eq!(final_call.to_string(), "2025-09-16 16:30-17:00 투자사 B 대표 <> CEO");
        assert_eq!(final_call.details.kind.as_deref(), Some("최종 의사결정"));
        assert_eq!(final_call.details.status, Some(MeetingStatus::Confirmed));
    }

    #[test]
    fn filters_meetings_by_selected_resources() {
        let calendar = Calendar::investor_fixture().unwrap();

        let selected = calendar.selected_meetings(&["investor-c", "investor-a"]);
        assert_eq!(
            selected.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["meeting-1", "meeting-3", "meeting-4", "meeting-6", "meeting-7"]
        );
        assert_eq!(
            calendar
                .selected_resources(&["investor-c", "investor-a"])
                .iter()
                .map(|r| r.id.as_str())
                .collect::<Vec<_>>(),
            vec!["investor-a", "investor-c"]
        );
        assert!(calendar.selected_meetings(&[]).is_empty());
    }

    #[test]
    fn meetings_may_sit_on_blocked_windows() {
        // meeting-7 (15:30-16:00) lies inside investor-a's 15:30-16:30 block
        let calendar = Calendar::investor_fixture().unwrap();
        let meeting = calendar.meetings().iter().find(|m| m.id == "meeting-7").unwrap();

        assert!(calendar
            .check_availability(Some("investor-a"), meeting.slot)
            .unwrap()
            .is_some());
    }

    #[test]
    fn unknown_meeting_resource_rejects_the_whole_snapshot() {
        let err = Calendar::from_json(
            r#"{ "resources": [ { "id": "investor-a" } ], "meetings": [
                { "id": "m1", "title": "ok", "start": "2025-09-16T10:30:00", "end": "2025-09-16T11:00:00", "resourceId": "investor-a" },
                { "id": "m2", "title": "lost", "start": "2025-09-16T11:30:00", "end": "2025-09-16T12:00:00", "resourceId": "investor-z" }
            ] }"#,
        )
        .unwrap_err();

        match err {
            ConfigError::UnknownMeetingResource { id, resource_id } => {
                assert_eq!(id, "m2");
                assert_eq!(resource_id, "investor-z");
            }
            other => panic!("Expected an unknown resource error, got {}", other),
        }
    }

    #[test]
    fn rejects_bad_meeting_times() {
        let meeting = |start: &str, end: &str| {
            format!(
                r#"{{ "resources": [ {{ "id": "a" }} ], "meetings": [
                    {{ "id": "m1", "title": "t", "start": "{}", "end": "{}", "resourceId": "a" }}
                ] }}"#,
                start, end
            )
        };

        let err = Calendar::from_json(&meeting("2025-09-16 10:30", "2025-09-16T11:00:00")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MeetingTime { ref location, ref value, .. }
                if location == "Meeting (m1)" && value == "2025-09-16 10:30"
        ));

        let err = Calendar::from_json(&meeting("2025-09-16T11:00:00", "2025-09-16T10:30:00")).unwrap_err();
        assert!(matches!(err, ConfigError::MeetingSpan { ref id, .. } if id == "m1"));

        let err = Calendar::from_json(&meeting("2025-09-16T16:30:00", "2025-09-17T10:00:00")).unwrap_err();
        assert!(matches!(err, ConfigError::MeetingSpan { .. }));
    }

    #[test]
    fn rejects_bad_meeting_ids() {
        let config = |ids: [&str; 2]| {
            format!(
                r#"{{ "resources": [ {{ "id": "a" }} ], "meetings": [
                    {{ "id": "{}", "title": "t", "start": "2025-09-16T10:30:00", "end": "2025-09-16T11:00:00", "resourceId": "a" }},
                    {{ "id": "{}", "title": "t", "start": "2025-09-16T14:30:00", "end": "2025-09-16T15:00:00", "resourceId": "a" }}
                ] }}"#,
                ids[0], ids[1]
            )
        };

        assert!(matches!(
            Calendar::from_json(&config(["m1", ""])),
            Err(ConfigError::EmptyMeetingId { index: 1 })
        ));
        assert!(matches!(
            Calendar::from_json(&config(["m1", "m1"])),
            Err(ConfigError::DuplicateMeeting { ref id }) if id == "m1"
        ));
        assert_eq!(Calendar::from_json(&config(["m1", "m2"])).unwrap().meeting_count("a"), 2);
    }

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(Calendar::from_json("{}").unwrap(), Calendar::default());
        assert_eq!(CalendarConfig::default().build().unwrap(), Calendar::default());
    }

    #[test]
    fn ignores_presentation_fields() {
        let calendar = Calendar::from_json(
            r#"{ "resources": [ { "id": "investor-a", "eventColor": "blue", "blockedTimes": [] } ] }"#,
        )
        .unwrap();

        assert!(calendar.resource("investor-a").is_some());
    }

    #[test]
    fn reads_boundary_policy() {
        let calendar = Calendar::from_json(
            r#"{ "openHours": { "start": "10:00", "end": "17:00", "boundary": "hourTruncated" } }"#,
        )
        .unwrap();

        assert_eq!(calendar.open_hours().policy, BoundaryPolicy::HourTruncated);
    }

    #[test]
    fn bad_time_rejects_the_whole_snapshot() {
        let err = Calendar::from_json(
            r#"{ "resources": [
                { "id": "ok", "blockedTimes": [ { "start": "10:00", "end": "10:30", "reason": "fine" } ] },
                { "id": "bad", "blockedTimes": [ { "start": "25:00", "end": "25:30", "reason": "nope" } ] }
            ] }"#,
        )
        .unwrap_err();

        match err {
            ConfigError::Time { location, source } => {
                assert_eq!(location, "Resource (bad) blocked time #1");
                assert_eq!(source, TimeParseError::Hour(25));
            }
            other => panic!("Expected a time error, got {}", other),
        }
    }

    #[test]
    fn rejects_empty_windows() {
        let err = Calendar::from_json(r#"{ "openHours": { "start": "17:00", "end": "10:00" } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyWindow { ref location, .. } if location == "Open hours"));

        let err = Calendar::from_json(r#"{ "lunch": { "start": "12:00", "end": "12:00" } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyWindow { ref location, .. } if location == "Lunch window"));
    }

    #[test]
    fn rejects_bad_resource_ids() {
        let err = Calendar::from_json(r#"{ "resources": [ { "id": "a" }, { "id": "" } ] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyResourceId { index: 1 }));

        let err = Calendar::from_json(r#"{ "resources": [ { "id": "a" }, { "id": "a" } ] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateResource { ref id } if id == "a"));
    }

    #[test]
    fn overlapping_blocks_only_rejected_on_request() {
        let mut config = CalendarConfig::default();
        config.resources.push(ResourceConfig {
            id: "investor-a".to_string(),
            title: None,
            description: None,
            logo: None,
            blocked_times: vec![
                BlockedTimeConfig {
                    start: "10:15".to_string(),
                    end: "10:45".to_string(),
                    reason: "Y".to_string(),
                },
                BlockedTimeConfig {
                    start: "10:00".to_string(),
                    end: "10:30".to_string(),
                    reason: "X".to_string(),
                },
            ],
        });

        assert!(config.build().is_ok());

        config.reject_overlapping_blocks = true;
        match config.build() {
            Err(ConfigError::OverlappingBlock {
                location,
                previous,
                value,
            }) => {
                assert_eq!(location, "Resource (investor-a)");
                assert_eq!(previous, Interval::parse("10:00", "10:30").unwrap());
                assert_eq!(value, Interval::parse("10:15", "10:45").unwrap());
            }
            other => panic!("Expected an overlap error, got {:?}", other),
        }
    }

    #[test]
    fn touching_blocks_are_not_overlapping() {
        let calendar = Calendar::from_json(
            r#"{ "rejectOverlappingBlocks": true, "resources": [ { "id": "a", "blockedTimes": [
                { "start": "10:00", "end": "10:30", "reason": "X" },
                { "start": "10:30", "end": "11:00", "reason": "Y" }
            ] } ] }"#,
        );

        assert!(calendar.is_ok());
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(Calendar::from_json("{ \"lunch\": "), Err(ConfigError::Json(_))));
        assert!(matches!(
            Calendar::from_json(r#"{ "resources": [ { "blockedTimes": [] } ] }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = CalendarConfig::from_json(INVESTOR_FIXTURE).unwrap();
        let json = serde_json::to_string(&config).unwrap();

        assert_eq!(CalendarConfig::from_json(&json).unwrap(), config);
    }
}
