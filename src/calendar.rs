use crate::meeting::Meeting;
use crate::resource::Resource;
use crate::time::{Interval, TimeOfDay, Windowed};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub const DEFAULT_LUNCH_LABEL: &str = "점심시간";

const DEFAULT_LUNCH: Interval = Interval::new_unchecked(
    TimeOfDay::from_minutes_unchecked(12 * 60),
    TimeOfDay::from_minutes_unchecked(13 * 60 + 30),
);

const DEFAULT_OPEN_HOURS: Interval = Interval::new_unchecked(
    TimeOfDay::from_minutes_unchecked(10 * 60),
    TimeOfDay::from_minutes_unchecked(17 * 60),
);

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum AvailabilityError {
    #[error("Invalid interval {start}-{end}: a slot must end after it starts")]
    InvalidInterval { start: TimeOfDay, end: TimeOfDay },
    #[error("Invalid slot duration {0}: slots are at least one minute long")]
    InvalidDuration(u16),
    #[error("Invalid slot step {0}: slots must advance by at least one minute")]
    InvalidStep(u16),
}

/// How the open-hours boundary is compared.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum BoundaryPolicy {
    /// Full minute precision: `start >= open && end <= close`.
    #[default]
    Minute,
    /// Compares whole hours only, so a 17:30 end passes a 17:00 close.
    /// Matches the calendar page this library replaced.
    HourTruncated,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct LunchWindow {
    pub window: Interval,
    pub label: String,
}

impl Default for LunchWindow {
    fn default() -> Self {
        LunchWindow {
            window: DEFAULT_LUNCH,
            label: DEFAULT_LUNCH_LABEL.to_string(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct OpenHours {
    pub window: Interval,
    pub policy: BoundaryPolicy,
}

impl Default for OpenHours {
    fn default() -> Self {
        OpenHours {
            window: DEFAULT_OPEN_HOURS,
            policy: BoundaryPolicy::Minute,
        }
    }
}

impl OpenHours {
    /// Boundary comparison, not an overlap test
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::calendar::{BoundaryPolicy, OpenHours};
    /// use zeitplan_availability::time::Interval;
    ///
    /// let mut hours = OpenHours::default();
    /// let late = Interval::parse("16:45", "17:30").unwrap();
    /// assert!(!hours.admits(late));
    ///
    /// hours.policy = BoundaryPolicy::HourTruncated;
    /// assert!(hours.admits(late));
    /// ```
    pub fn admits(&self, candidate: Interval) -> bool {
        let (open, close) = (self.window.start(), self.window.end());

        match self.policy {
            BoundaryPolicy::Minute => candidate.start() >= open && candidate.end() <= close,
            BoundaryPolicy::HourTruncated => {
                candidate.start().hour() >= open.hour() && candidate.end().hour() <= close.hour()
            }
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ReasonKind {
    Lunch,
    Blocked,
}

/// Why a slot cannot be scheduled: the label of the window that was hit and
/// the window itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reason {
    pub kind: ReasonKind,
    pub label: String,
    pub window: Interval,
}

impl fmt::Display for Reason {
    /// `{label} ({start}-{end})`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}-{})",
            self.label,
            self.window.start(),
            self.window.end()
        )
    }
}

/// The two interactions that commit a slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SlotAction {
    /// Selecting an empty slot for a new meeting
    Select,
    /// Dragging an existing meeting to another slot
    Move,
}

impl SlotAction {
    fn verb(self) -> &'static str {
        match self {
            SlotAction::Select => "booked",
            SlotAction::Move => "moved",
        }
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SlotActionError {
    #[error("Unknown slot action {0:?}, expected select or move")]
    UnknownSlotAction(String),
}

impl FromStr for SlotAction {
    type Err = SlotActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(SlotAction::Select),
            "move" => Ok(SlotAction::Move),
            other => Err(SlotActionError::UnknownSlotAction(other.to_string())),
        }
    }
}

/// Why [`Calendar::allow`] refused a slot.
///
/// The messages are English renderings of the calendar page's Korean
/// guidance. `OutsideOpenHours` stands for
/// `업무시간(10:00-17:00) 내에서만 미팅을 예약할 수 있습니다` when selecting and
/// `업무시간(10:00-17:00) 내에서만 일정을 이동할 수 있습니다` when moving.
/// `Blocked` stands for `{reason}에는 미팅을 예약할 수 없습니다` and
/// `{reason}으로는 일정을 이동할 수 없습니다`.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Rejection {
    #[error("Meetings can only be {} within open hours ({open_hours})", .action.verb())]
    OutsideOpenHours {
        action: SlotAction,
        open_hours: Interval,
    },
    #[error("Meetings cannot be {} during {reason}", .action.verb())]
    Blocked { action: SlotAction, reason: Reason },
    #[error(transparent)]
    Invalid(#[from] AvailabilityError),
}

impl Rejection {
    /// The raw blocking reason, for callers that do their own messaging
    pub fn reason(&self) -> Option<&Reason> {
        match self {
            Rejection::Blocked { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Immutable snapshot of everything the checks need: the shared lunch
/// window, the day's open hours and every resource's blocked windows.
/// Booked meetings ride along for display.
#[derive(Clone, Debug)]
pub struct Calendar {
    lunch: LunchWindow,
    open_hours: OpenHours,
    resources: Vec<Resource>,
    meetings: Vec<Meeting>,
    index: HashMap<String, usize>,
}

impl Default for Calendar {
    fn default() -> Self {
        Calendar::new(LunchWindow::default(), OpenHours::default(), vec![])
    }
}

impl PartialEq for Calendar {
    fn eq(&self, other: &Self) -> bool {
        self.lunch == other.lunch
            && self.open_hours == other.open_hours
            && self.resources == other.resources
            && self.meetings == other.meetings
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for Calendar {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let lunch = u.arbitrary::<LunchWindow>()?;
        let open_hours = u.arbitrary::<OpenHours>()?;
        let len = u.arbitrary_len::<Resource>()?.min(8);
        let mut resources = Vec::with_capacity(len);
        for _ in 0..len {
            resources.push(u.arbitrary::<Resource>()?);
        }
        Ok(Calendar::new(lunch, open_hours, resources))
    }
}

impl Calendar {
    /// Constructs a new Calendar snapshot.
    /// Resources keep their order; if two share an id the first one is used.
    pub fn new(lunch: LunchWindow, open_hours: OpenHours, resources: Vec<Resource>) -> Calendar {
        let mut index = HashMap::with_capacity(resources.len());
        for (i, resource) in resources.iter().enumerate() {
            index.entry(resource.id.clone()).or_insert(i);
        }

        Calendar {
            lunch,
            open_hours,
            resources,
            meetings: vec![],
            index,
        }
    }

    pub fn lunch(&self) -> &LunchWindow {
        &self.lunch
    }

    pub fn open_hours(&self) -> &OpenHours {
        &self.open_hours
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.index.get(id).map(|&i| &self.resources[i])
    }

    /// Decides whether `interval` is blocked, and why.
    ///
    /// The lunch window is checked first for every resource. After that an
    /// unknown (or absent) `resource_id` is treated as having no blocks,
    /// otherwise the resource's first overlapping window is reported.
    ///
    /// # Errors
    /// `AvailabilityError::InvalidInterval` when `interval` does not end
    /// after it starts.
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::calendar::Calendar;
    /// use zeitplan_availability::resource::{BlockedWindow, Resource};
    /// use zeitplan_availability::time::Interval;
    ///
    /// let calendar = Calendar::default().with_resources(vec![Resource::new(
    ///     "investor-a",
    ///     vec![BlockedWindow::new("내부 회의", Interval::parse("11:00", "11:30").unwrap())],
    /// )]);
    ///
    /// let reason = calendar
    ///     .check_availability(Some("investor-a"), Interval::parse("11:10", "11:20").unwrap())
    ///     .unwrap();
    /// assert_eq!(reason.unwrap().to_string(), "내부 회의 (11:00-11:30)");
    ///
    /// let reason = calendar
    ///     .check_availability(Some("investor-a"), Interval::parse("12:00", "12:30").unwrap())
    ///     .unwrap();
    /// assert_eq!(reason.unwrap().to_string(), "점심시간 (12:00-13:30)");
    ///
    /// let reason = calendar
    ///     .check_availability(Some("no-such-id"), Interval::parse("11:00", "11:15").unwrap())
    ///     .unwrap();
    /// assert!(reason.is_none());
    /// ```
    pub fn check_availability(
        &self,
        resource_id: Option<&str>,
        interval: Interval,
    ) -> Result<Option<Reason>, AvailabilityError> {
        if !interval.is_valid() {
            return Err(AvailabilityError::InvalidInterval {
                start: interval.start(),
                end: interval.end(),
            });
        }

        if interval.overlaps(self.lunch.window) {
            trace!("{} overlaps lunch {}", interval, self.lunch.window);
            return Ok(Some(Reason {
                kind: ReasonKind::Lunch,
                label: self.lunch.label.clone(),
                window: self.lunch.window,
            }));
        }

        let resource = match resource_id.and_then(|id| self.resource(id)) {
            Some(resource) => resource,
            None => {
                trace!("no known resource for {:?}, nothing else blocks", resource_id);
                return Ok(None);
            }
        };

        Ok(resource.first_block(interval).map(|block| Reason {
            kind: ReasonKind::Blocked,
            label: block.reason.clone(),
            window: block.window,
        }))
    }

    /// Gate for committing a slot. Open hours are checked before any
    /// blocked window, so the open-hours rejection wins when both apply.
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::calendar::{Calendar, Rejection, SlotAction};
    /// use zeitplan_availability::time::Interval;
    ///
    /// let calendar = Calendar::default();
    ///
    /// assert!(calendar
    ///     .allow(SlotAction::Select, None, Interval::parse("10:00", "10:30").unwrap())
    ///     .is_ok());
    ///
    /// let early = calendar.allow(SlotAction::Move, None, Interval::parse("09:30", "10:00").unwrap());
    /// assert!(matches!(early, Err(Rejection::OutsideOpenHours { .. })));
    /// ```
    pub fn allow(
        &self,
        action: SlotAction,
        resource_id: Option<&str>,
        interval: Interval,
    ) -> Result<(), Rejection> {
        if !interval.is_valid() {
            return Err(AvailabilityError::InvalidInterval {
                start: interval.start(),
                end: interval.end(),
            }
            .into());
        }

        if !self.open_hours.admits(interval) {
            debug!(
                "{:?} of {} for {:?} rejected, outside open hours {}",
                action, interval, resource_id, self.open_hours.window
            );
            return Err(Rejection::OutsideOpenHours {
                action,
                open_hours: self.open_hours.window,
            });
        }

        match self.check_availability(resource_id, interval)? {
            Some(reason) => {
                debug!(
                    "{:?} of {} for {:?} rejected: {}",
                    action, interval, resource_id, reason
                );
                Err(Rejection::Blocked { action, reason })
            }
            None => Ok(()),
        }
    }

    /// Every `duration` minute slot, one starting every `step` minutes from
    /// the open time, that could be selected for `resource_id`.
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::calendar::Calendar;
    ///
    /// let calendar = Calendar::default();
    /// let slots = calendar.open_slots(None, 60, 60).unwrap();
    ///
    /// assert_eq!(
    ///     slots.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
    ///     vec!["10:00-11:00", "11:00-12:00", "14:00-15:00", "15:00-16:00", "16:00-17:00"]
    /// );
    /// ```
    pub fn open_slots(
        &self,
        resource_id: Option<&str>,
        duration: u16,
        step: u16,
    ) -> Result<Vec<Interval>, AvailabilityError> {
        if duration == 0 {
            return Err(AvailabilityError::InvalidDuration(duration));
        }
        if step == 0 {
            return Err(AvailabilityError::InvalidStep(step));
        }

        let candidates = std::iter::once(&self.open_hours.window).windowed(duration, step);

        let mut slots = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.allow(SlotAction::Select, resource_id, candidate) {
                Ok(()) => slots.push(candidate),
                Err(Rejection::Invalid(err)) => return Err(err),
                Err(_) => {}
            }
        }

        Ok(slots)
    }

    /// [`Calendar::open_slots`] for every resource, in resource order
    #[cfg(not(feature = "rayon"))]
    pub fn open_slots_by_resource(
        &self,
        duration: u16,
        step: u16,
    ) -> Result<Vec<(&str, Vec<Interval>)>, AvailabilityError> {
        self.resources
            .iter()
            .map(|resource| {
                self.open_slots(Some(resource.id.as_str()), duration, step)
                    .map(|slots| (resource.id.as_str(), slots))
            })
            .collect()
    }

    /// [`Calendar::open_slots`] for every resource, in resource order
    #[cfg(feature = "rayon")]
    pub fn open_slots_by_resource(
        &self,
        duration: u16,
        step: u16,
    ) -> Result<Vec<(&str, Vec<Interval>)>, AvailabilityError> {
        self.resources
            .par_iter()
            .map(|resource| {
                self.open_slots(Some(resource.id.as_str()), duration, step)
                    .map(|slots| (resource.id.as_str(), slots))
            })
            .collect()
    }

    /// Replaces the resource list, keeping lunch, open hours and meetings
    pub fn with_resources(self, resources: Vec<Resource>) -> Calendar {
        let meetings = self.meetings;
        Calendar::new(self.lunch, self.open_hours, resources).with_meetings(meetings)
    }

    /// Replaces the booked meetings. Meetings are not validated here,
    /// [`CalendarConfig::build`](crate::config::CalendarConfig::build) does that.
    pub fn with_meetings(mut self, meetings: Vec<Meeting>) -> Calendar {
        self.meetings = meetings;
        self
    }

    pub fn meetings(&self) -> &[Meeting] {
        &self.meetings
    }

    /// Meetings booked on one resource, in listed order
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::calendar::Calendar;
    ///
    /// let calendar = Calendar::investor_fixture().unwrap();
    /// let titles: Vec<_> = calendar
    ///     .meetings_for("investor-c")
    ///     .map(|meeting| meeting.title.as_str())
    ///     .collect();
    /// assert_eq!(titles, vec!["투자사 C CTO <> CTO", "투자사 C 애널리스트 <> 마케팅팀장"]);
    /// ```
    pub fn meetings_for<'a>(
        &'a self,
        resource_id: &'a str,
    ) -> impl Iterator<Item = &'a Meeting> + 'a {
        self.meetings
            .iter()
            .filter(move |meeting| meeting.resource_id == resource_id)
    }

    pub fn meeting_count(&self, resource_id: &str) -> usize {
        self.meetings_for(resource_id).count()
    }

    /// Resources whose id is in `selected`, in calendar order
    pub fn selected_resources(&self, selected: &[&str]) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|resource| selected.contains(&resource.id.as_str()))
            .collect()
    }

    /// Meetings on any of the `selected` resources, in listed order
    pub fn selected_meetings(&self, selected: &[&str]) -> Vec<&Meeting> {
        self.meetings
            .iter()
            .filter(|meeting| selected.contains(&meeting.resource_id.as_str()))
            .collect()
    }
}
