use crate::calendar::Calendar;
use crate::config::ConfigError;
use log::info;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to the current `Calendar`.
///
/// Readers take an `Arc` of the whole snapshot and keep using it for as long
/// as they like; a reload swaps in a new snapshot and never mutates the one
/// a reader is holding.
#[derive(Debug)]
pub struct CalendarHandle {
    current: RwLock<Arc<Calendar>>,
}

impl Default for CalendarHandle {
    fn default() -> Self {
        CalendarHandle::new(Calendar::default())
    }
}

impl CalendarHandle {
    pub fn new(calendar: Calendar) -> CalendarHandle {
        CalendarHandle {
            current: RwLock::new(Arc::new(calendar)),
        }
    }

    /// The snapshot in effect right now
    pub fn load(&self) -> Arc<Calendar> {
        // The lock only guards an Arc swap, a poisoned lock still holds a
        // complete snapshot.
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swaps in `calendar`, returning the snapshot it replaced
    pub fn replace(&self, calendar: Calendar) -> Arc<Calendar> {
        let next = Arc::new(calendar);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, next)
    }

    /// Parses and validates `json`, then swaps it in. On error the current
    /// snapshot stays in place.
    ///
    /// # Examples
    /// ```
    /// use zeitplan_availability::snapshot::CalendarHandle;
    ///
    /// let handle = CalendarHandle::default();
    /// assert!(handle.reload_json(r#"{ "resources": [ { "id": "investor-a" } ] }"#).is_ok());
    /// assert!(handle.load().resource("investor-a").is_some());
    ///
    /// assert!(handle.reload_json(r#"{ "lunch": { "start": "noon" } }"#).is_err());
    /// assert!(handle.load().resource("investor-a").is_some());
    /// ```
    pub fn reload_json(&self, json: &str) -> Result<Arc<Calendar>, ConfigError> {
        let calendar = Calendar::from_json(json)?;
        info!(
            "replacing calendar snapshot ({} resources)",
            calendar.resources().len()
        );
        Ok(self.replace(calendar))
    }
}
