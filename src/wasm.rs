use crate::calendar::{Calendar, SlotAction};
use crate::config::CalendarConfig;
use crate::time::Interval;
use wasm_bindgen::prelude::*;

fn js_error(err: impl ToString) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Browser facing checker, built once from the page's configuration object.
#[wasm_bindgen]
pub struct AvailabilityChecker {
    calendar: Calendar,
}

#[wasm_bindgen]
impl AvailabilityChecker {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<AvailabilityChecker, JsValue> {
        let config: CalendarConfig = serde_wasm_bindgen::from_value(config).map_err(js_error)?;
        let calendar = config.build().map_err(js_error)?;

        Ok(AvailabilityChecker { calendar })
    }

    /// Reason text when `[start, end)` (minutes since midnight) is blocked,
    /// `undefined` otherwise
    #[wasm_bindgen(js_name = checkAvailability)]
    pub fn check_availability(
        &self,
        resource_id: Option<String>,
        start: u16,
        end: u16,
    ) -> Result<Option<String>, JsValue> {
        let interval = Interval::from_minutes(start, end).map_err(js_error)?;

        self.calendar
            .check_availability(resource_id.as_deref(), interval)
            .map(|reason| reason.map(|reason| reason.to_string()))
            .map_err(js_error)
    }

    /// Rejection message for a `"select"` or `"move"`, `undefined` when the
    /// slot may be committed
    #[wasm_bindgen(js_name = allowSlot)]
    pub fn allow_slot(
        &self,
        action: &str,
        resource_id: Option<String>,
        start: u16,
        end: u16,
    ) -> Result<Option<String>, JsValue> {
        let action: SlotAction = action.parse().map_err(js_error)?;
        let interval = Interval::from_minutes(start, end).map_err(js_error)?;

        Ok(self
            .calendar
            .allow(action, resource_id.as_deref(), interval)
            .err()
            .map(|rejection| rejection.to_string()))
    }

    /// Tooltip text for a resource's blocked windows
    #[wasm_bindgen(js_name = describeBlocks)]
    pub fn describe_blocks(&self, resource_id: &str) -> Option<String> {
        self.calendar
            .resource(resource_id)
            .map(|resource| resource.describe_blocks())
    }

    /// Number of booked meetings on a resource, shown beside its name
    #[wasm_bindgen(js_name = meetingCount)]
    pub fn meeting_count(&self, resource_id: &str) -> usize {
        self.calendar.meeting_count(resource_id)
    }
}
