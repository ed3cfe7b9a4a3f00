pub mod calendar;
pub mod config;
pub mod meeting;
pub mod resource;
pub mod snapshot;
pub mod time;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use calendar::{
    AvailabilityError, BoundaryPolicy, Calendar, LunchWindow, OpenHours, Reason, ReasonKind,
    Rejection, SlotAction, SlotActionError,
};
pub use config::{CalendarConfig, ConfigError};
pub use meeting::{Meeting, MeetingDetails, MeetingStatus};
pub use resource::{BlockedWindow, Resource};
pub use snapshot::CalendarHandle;
pub use time::{format_time, parse_time, Interval, TimeOfDay};
