use core::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of minutes in a calendar day. `TimeOfDay` values stay below this.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum TimeParseError {
    #[error("Expected a time formatted as HH:MM, got {0:?}")]
    Format(String),
    #[error("Hour {0} is outside of 00-23")]
    Hour(u16),
    #[error("Minute {0} is outside of 00-59")]
    Minute(u16),
    #[error("{0} minutes is past the end of the day")]
    OutOfRange(u16),
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum IntervalError {
    #[error("Interval {start}-{end} must end after it starts")]
    Empty { start: TimeOfDay, end: TimeOfDay },
    #[error(transparent)]
    Time(#[from] TimeParseError),
}

/// Wall-clock time as minutes since midnight, in `[0, 1440)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Midnight, the first minute of the day.
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    /// Builds a time from an hour/minute pair
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::time::{TimeOfDay, TimeParseError};
    ///
    /// let noon = TimeOfDay::from_hm(12, 0).unwrap();
    /// assert_eq!(noon.minutes(), 720);
    ///
    /// assert_eq!(TimeOfDay::from_hm(24, 0), Err(TimeParseError::Hour(24)));
    /// assert_eq!(TimeOfDay::from_hm(9, 60), Err(TimeParseError::Minute(60)));
    /// ```
    pub fn from_hm(hour: u16, minute: u16) -> Result<TimeOfDay, TimeParseError> {
        if hour > 23 {
            Err(TimeParseError::Hour(hour))
        } else if minute > 59 {
            Err(TimeParseError::Minute(minute))
        } else {
            Ok(TimeOfDay(hour * 60 + minute))
        }
    }

    /// Builds a time from minutes since midnight
    pub fn from_minutes(minutes: u16) -> Result<TimeOfDay, TimeParseError> {
        if minutes >= MINUTES_PER_DAY {
            Err(TimeParseError::OutOfRange(minutes))
        } else {
            Ok(TimeOfDay(minutes))
        }
    }

    /// Only for values already known to be in range, like the built-in defaults.
    pub(crate) const fn from_minutes_unchecked(minutes: u16) -> TimeOfDay {
        TimeOfDay(minutes)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for TimeOfDay {
    /// Zero padded `HH:MM`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    /// Parses `H:MM` or `HH:MM`. Anything else is rejected rather than
    /// guessed at, a bad boundary would silently move availability.
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::time::TimeOfDay;
    ///
    /// let t: TimeOfDay = "09:30".parse().unwrap();
    /// assert_eq!(t.minutes(), 570);
    /// assert_eq!(t, "9:30".parse().unwrap());
    ///
    /// assert!("0930".parse::<TimeOfDay>().is_err());
    /// assert!("9:3".parse::<TimeOfDay>().is_err());
    /// assert!("24:00".parse::<TimeOfDay>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_error = || TimeParseError::Format(s.to_string());

        let (hour, minute) = s.split_once(':').ok_or_else(format_error)?;

        if hour.is_empty()
            || hour.len() > 2
            || minute.len() != 2
            || !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(format_error());
        }

        let hour = hour.parse::<u16>().map_err(|_| format_error())?;
        let minute = minute.parse::<u16>().map_err(|_| format_error())?;

        TimeOfDay::from_hm(hour, minute)
    }
}

/// Parses a configured `HH:MM` string
pub fn parse_time(time: &str) -> Result<TimeOfDay, TimeParseError> {
    time.parse()
}

/// Formats a time as zero padded `HH:MM`, the inverse of [`parse_time`]
pub fn format_time(time: TimeOfDay) -> String {
    time.to_string()
}

/// Half-open [start, end) span within a single day
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl Interval {
    /// Construct a new Interval
    /// Range is half-open on [start, end), so `end` must be after `start`
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::time::{Interval, TimeOfDay};
    ///
    /// let start = TimeOfDay::from_hm(10, 0).unwrap();
    /// let end = TimeOfDay::from_hm(10, 30).unwrap();
    ///
    /// let test = Interval::new(start, end).unwrap();
    /// assert_eq!(test.duration(), 30);
    ///
    /// assert!(Interval::new(end, start).is_err());
    /// assert!(Interval::new(start, start).is_err());
    /// ```
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Interval, IntervalError> {
        if end > start {
            Ok(Interval { start, end })
        } else {
            Err(IntervalError::Empty { start, end })
        }
    }

    /// Builds an Interval from minutes since midnight
    pub fn from_minutes(start: u16, end: u16) -> Result<Interval, IntervalError> {
        Interval::new(TimeOfDay::from_minutes(start)?, TimeOfDay::from_minutes(end)?)
    }

    /// Builds an Interval from two `HH:MM` strings
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::time::Interval;
    ///
    /// let lunch = Interval::parse("12:00", "13:30").unwrap();
    /// assert_eq!(lunch.to_string(), "12:00-13:30");
    /// ```
    pub fn parse(start: &str, end: &str) -> Result<Interval, IntervalError> {
        Interval::new(start.parse()?, end.parse()?)
    }

    /// Skips the `end > start` check. Intervals built this way may be
    /// degenerate; the availability checks reject those with an error.
    pub const fn new_unchecked(start: TimeOfDay, end: TimeOfDay) -> Interval {
        Interval { start, end }
    }

    pub fn start(self) -> TimeOfDay {
        self.start
    }

    pub fn end(self) -> TimeOfDay {
        self.end
    }

    /// Minutes covered by this interval
    pub fn duration(self) -> u16 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// `false` only for intervals built through [`Interval::new_unchecked`]
    /// with `end <= start`.
    pub fn is_valid(self) -> bool {
        self.end > self.start
    }

    /// Half-open intersection test: `[a0, a1)` and `[b0, b1)` overlap
    /// iff `a0 < b1 && b0 < a1`. Touching endpoints do not overlap.
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::time::Interval;
    ///
    /// let a = Interval::from_minutes(0, 60).unwrap();
    /// let b = Interval::from_minutes(60, 120).unwrap();
    /// assert!(!a.overlaps(b));
    ///
    /// let c = Interval::from_minutes(30, 90).unwrap();
    /// assert!(a.overlaps(c));
    /// assert!(c.overlaps(b));
    ///
    /// let all = Interval::from_minutes(0, 120).unwrap();
    /// assert!(all.overlaps(c) && c.overlaps(all));
    /// ```
    pub fn overlaps(self, other: Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Boundary containment, `other` lies fully within `self`
    pub fn contains(self, other: Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for TimeOfDay {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(TimeOfDay(u.int_in_range(0..=MINUTES_PER_DAY - 1)?))
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for Interval {
    /// Always produces a valid interval, degenerate ones have to be built
    /// with `new_unchecked`.
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let start = u.int_in_range(0..=MINUTES_PER_DAY - 2)?;
        let end = u.int_in_range(start + 1..=MINUTES_PER_DAY - 1)?;
        Ok(Interval::new_unchecked(TimeOfDay(start), TimeOfDay(end)))
    }
}

pub trait Windowed {
    fn windowed(self, duration: u16, step: u16) -> Vec<Interval>;
}

impl<'a, T> Windowed for T
where
    T: Iterator<Item = &'a Interval>,
{
    /// Splits each `Interval` into candidate slots of `duration` minutes,
    /// one starting every `step` minutes. Slots never run past the end of
    /// the interval they came from.
    ///
    /// # Example
    /// ```
    /// use zeitplan_availability::time::{Interval, Windowed};
    ///
    /// let times = vec![Interval::parse("10:00", "11:00").unwrap()];
    ///
    /// let slots = times.iter().windowed(30, 15);
    /// assert_eq!(
    ///     slots.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
    ///     vec!["10:00-10:30", "10:15-10:45", "10:30-11:00"]
    /// );
    ///
    /// assert!(times.iter().windowed(90, 15).is_empty());
    /// ```
    fn windowed(self, duration: u16, step: u16) -> Vec<Interval> {
        let mut windows: Vec<Interval> = Vec::with_capacity(self.size_hint().1.unwrap_or(0));

        if duration == 0 || step == 0 {
            return windows;
        }

        for time in self {
            let end = u32::from(time.end().0);
            let mut start = u32::from(time.start().0);

            while start + u32::from(duration) <= end {
                // both bounds are <= end, which already fits in a TimeOfDay
                windows.push(Interval::new_unchecked(
                    TimeOfDay(start as u16),
                    TimeOfDay((start + u32::from(duration)) as u16),
                ));
                start += u32::from(step);
            }
        }

        windows
    }
}
