#![no_main]
use libfuzzer_sys::fuzz_target;
use zeitplan_availability::time::{format_time, parse_time, Interval, TimeOfDay, Windowed};

fuzz_target!(|data: (TimeOfDay, Interval, Interval, u8, u8)| {
    let (time, a, b, duration, step) = data;

    assert_eq!(
        parse_time(&format_time(time)),
        Ok(time),
        "HH:MM should round trip"
    );

    assert_eq!(a.overlaps(b), b.overlaps(a), "Overlap should be symmetric");
    assert!(a.overlaps(a), "Every interval overlaps itself");

    if a.end() == b.start() || b.end() == a.start() {
        assert!(!a.overlaps(b), "Touching intervals should not overlap: {} {}", a, b);
    }

    let windows = std::iter::once(&a).windowed(duration.into(), step.into());
    assert!(
        windows
            .iter()
            .all(|w| a.contains(*w) && w.duration() == u16::from(duration)),
        "Each window should lie within {} and last {} minutes",
        a,
        duration
    );
});
