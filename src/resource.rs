use crate::time::Interval;
use itertools::Itertools;
use log::trace;
use std::fmt;

/// A span of the day in which one resource cannot meet, and why.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct BlockedWindow {
    pub window: Interval,
    pub reason: String,
}

impl BlockedWindow {
    pub fn new(reason: &str, window: Interval) -> BlockedWindow {
        BlockedWindow {
            window,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for BlockedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}-{})",
            self.reason,
            self.window.start(),
            self.window.end()
        )
    }
}

/// Something meetings are scheduled against, one investor column of the
/// calendar grid.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Resource {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub blocked_times: Vec<BlockedWindow>,
}

impl Resource {
    /// Constructs a new Resource with the specified blocked_times.
    /// This indicates times when this resource *cannot* meet.
    /// Order matters: the first overlapping window is the one reported.
    pub fn new(id: &str, blocked_times: Vec<BlockedWindow>) -> Resource {
        Resource {
            id: id.to_string(),
            title: None,
            description: None,
            logo: None,
            blocked_times,
        }
    }

    pub fn with_title(mut self, title: &str) -> Resource {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Resource {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_logo(mut self, logo: &str) -> Resource {
        self.logo = Some(logo.to_string());
        self
    }

    /// The first blocked window, in stored order, that overlaps `candidate`
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::resource::{BlockedWindow, Resource};
    /// use zeitplan_availability::time::Interval;
    ///
    /// let resource = Resource::new(
    ///     "investor-a",
    ///     vec![
    ///         BlockedWindow::new("X", Interval::parse("10:00", "10:30").unwrap()),
    ///         BlockedWindow::new("Y", Interval::parse("10:15", "10:45").unwrap()),
    ///     ],
    /// );
    ///
    /// let hit = resource.first_block(Interval::parse("10:20", "10:25").unwrap());
    /// assert_eq!(hit.map(|b| b.reason.as_str()), Some("X"));
    ///
    /// let miss = resource.first_block(Interval::parse("10:45", "11:00").unwrap());
    /// assert!(miss.is_none());
    /// ```
    pub fn first_block(&self, candidate: Interval) -> Option<&BlockedWindow> {
        trace!(
            "checking {} against {} blocked windows of {}",
            candidate,
            self.blocked_times.len(),
            self.id
        );
        self.blocked_times.iter().first_overlap(candidate)
    }

    /// Tooltip text listing every blocked window, `HH:MM-HH:MM (reason)`
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::resource::{BlockedWindow, Resource};
    /// use zeitplan_availability::time::Interval;
    ///
    /// let resource = Resource::new(
    ///     "investor-a",
    ///     vec![
    ///         BlockedWindow::new("내부 회의", Interval::parse("11:00", "11:30").unwrap()),
    ///         BlockedWindow::new("기술 검토 시간", Interval::parse("15:30", "16:30").unwrap()),
    ///     ],
    /// );
    ///
    /// assert_eq!(
    ///     resource.describe_blocks(),
    ///     "11:00-11:30 (내부 회의), 15:30-16:30 (기술 검토 시간)"
    /// );
    /// ```
    pub fn describe_blocks(&self) -> String {
        self.blocked_times
            .iter()
            .map(|block| format!("{} ({})", block.window, block.reason))
            .join(", ")
    }
}

pub trait FirstOverlap<'a> {
    fn first_overlap(self, candidate: Interval) -> Option<&'a BlockedWindow>;
}

impl<'a, T> FirstOverlap<'a> for T
where
    T: Iterator<Item = &'a BlockedWindow>,
{
    /// First match wins, not the best match or a union of matches.
    fn first_overlap(mut self, candidate: Interval) -> Option<&'a BlockedWindow> {
        self.find(|block| block.window.overlaps(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(reason: &str, start: &str, end: &str) -> BlockedWindow {
        BlockedWindow::new(reason, Interval::parse(start, end).unwrap())
    }

    #[test]
    fn formats_reason_with_window() {
        assert_eq!(
            block("내부 회의", "11:00", "11:30").to_string(),
            "내부 회의 (11:00-11:30)"
        );
    }

    #[test]
    fn stored_order_decides_between_overlapping_blocks() {
        let forward = Resource::new("r", vec![block("X", "10:00", "10:30"), block("Y", "10:15", "10:45")]);
        let backward = Resource::new("r", vec![block("Y", "10:15", "10:45"), block("X", "10:00", "10:30")]);
        let candidate = Interval::parse("10:20", "10:25").unwrap();

        assert_eq!(forward.first_block(candidate).unwrap().reason, "X");
        assert_eq!(backward.first_block(candidate).unwrap().reason, "Y");
    }

    #[test]
    fn duplicate_blocks_are_allowed() {
        let resource = Resource::new("r", vec![block("A", "14:00", "14:30"), block("A", "14:00", "14:30")]);

        assert_eq!(
            resource.first_block(Interval::parse("13:45", "14:15").unwrap()),
            Some(&resource.blocked_times[0])
        );
    }

    #[test]
    fn edges_of_a_block_are_free() {
        let resource = Resource::new("r", vec![block("콜", "10:30", "11:00")]);

        assert!(resource.first_block(Interval::parse("10:00", "10:30").unwrap()).is_none());
        assert!(resource.first_block(Interval::parse("11:00", "11:30").unwrap()).is_none());
        assert!(resource.first_block(Interval::parse("10:59", "11:30").unwrap()).is_some());
    }

    #[test]
    fn metadata_builders() {
        let resource = Resource::new("investor-a", vec![])
            .with_title("투자사 A")
            .with_description("AI/ML 전문 투자사")
            .with_logo("🚀");

        assert_eq!(resource.title.as_deref(), Some("투자사 A"));
        assert_eq!(resource.description.as_deref(), Some("AI/ML 전문 투자사"));
        assert_eq!(resource.logo.as_deref(), Some("🚀"));
        assert_eq!(resource.describe_blocks(), "");
    }
}
