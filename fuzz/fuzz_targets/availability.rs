#![no_main]
use libfuzzer_sys::fuzz_target;
use zeitplan_availability::{
    calendar::{Calendar, ReasonKind, Rejection, SlotAction},
    time::{Interval, TimeOfDay},
};

fuzz_target!(|data: (Calendar, Option<u8>, u16, u16)| {
    // searching for panics and precedence violations
    #[cfg(feature = "log")]
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply();

    let (calendar, pick, start, end) = data;

    let (start, end) = match (TimeOfDay::from_minutes(start), TimeOfDay::from_minutes(end)) {
        (Ok(start), Ok(end)) => (start, end),
        _ => return,
    };
    let candidate = Interval::new_unchecked(start, end);

    let resource_id = pick.and_then(|i| {
        let resources = calendar.resources();
        if resources.is_empty() {
            None
        } else {
            Some(resources[usize::from(i) % resources.len()].id.clone())
        }
    });

    let checked = calendar.check_availability(resource_id.as_deref(), candidate);

    if !candidate.is_valid() {
        assert!(checked.is_err(), "Degenerate {} should be rejected", candidate);
        return;
    }

    match checked.expect("valid interval") {
        Some(reason) if reason.kind == ReasonKind::Lunch => {
            assert!(candidate.overlaps(calendar.lunch().window))
        }
        Some(reason) => {
            assert!(!candidate.overlaps(calendar.lunch().window));
            assert!(reason.window.overlaps(candidate));
        }
        None => assert!(!candidate.overlaps(calendar.lunch().window)),
    }

    if let Err(Rejection::Blocked { .. }) =
        calendar.allow(SlotAction::Select, resource_id.as_deref(), candidate)
    {
        assert!(
            calendar.open_hours().admits(candidate),
            "Open hours should be checked before blocked windows"
        );
    }

    if let Ok(slots) = calendar.open_slots(resource_id.as_deref(), 30, 15) {
        for slot in slots {
            assert!(calendar
                .allow(SlotAction::Select, resource_id.as_deref(), slot)
                .is_ok());
        }
    }
});
