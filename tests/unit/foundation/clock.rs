use super::*;

#[test]
fn manual_clock_only_moves_when_told() {
    let clock = ManualClock::new();
    assert_eq!(clock.now(), Duration::ZERO);
    clock.advance_ms(250);
    assert_eq!(clock.now(), Duration::from_millis(250));
}

#[test]
fn manual_clock_sleep_advances_instead_of_blocking() {
    let clock = ManualClock::new();
    clock.sleep(Duration::from_secs(3600));
    assert_eq!(clock.now(), Duration::from_secs(3600));
}

#[test]
fn manual_clock_clones_share_time() {
    let a = ManualClock::new();
    let b = a.clone();
    a.advance_ms(10);
    assert_eq!(b.now(), Duration::from_millis(10));
}

#[test]
fn clock_references_are_clocks() {
    fn elapsed(c: impl Clock) -> Duration {
        c.now()
    }
    let clock = ManualClock::new();
    clock.advance_ms(5);
    assert_eq!(elapsed(&clock), Duration::from_millis(5));
}

#[test]
fn system_clock_is_monotonic() {
    let clock = SystemClock::start();
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
