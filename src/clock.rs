// Monotonic time shim so wait loops can run under test without real delays.

/// Monotonic milliseconds plus a blocking sleep.
pub trait Clock {
    fn now_ms(&mut self) -> u64;
    fn sleep_ms(&mut self, ms: u32);
}

/// Poll `ready` every `poll_ms` until it returns true or `timeout_ms`
/// elapses. The predicate is checked before the first sleep, so an already
/// satisfied condition never waits.
pub fn wait_until<C, F>(clock: &mut C, timeout_ms: u32, poll_ms: u32, mut ready: F) -> bool
where
    C: Clock,
    F: FnMut() -> bool,
{
    let deadline = clock.now_ms() + u64::from(timeout_ms);
    loop {
        if ready() {
            return true;
        }
        if clock.now_ms() >= deadline {
            return false;
        }
        clock.sleep_ms(poll_ms);
    }
}

/// Clock backed by the high-resolution timer and a FreeRTOS delay.
#[cfg(target_os = "espidf")]
pub struct EspClock;

#[cfg(target_os = "espidf")]
impl Clock for EspClock {
    fn now_ms(&mut self) -> u64 {
        unsafe { esp_idf_sys::esp_timer_get_time() as u64 / 1000 }
    }

    fn sleep_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test clock that jumps forward by the requested sleep.
    pub struct FakeClock {
        pub now: u64,
        pub sleeps: u32,
    }

    impl FakeClock {
        pub fn new() -> Self {
            FakeClock { now: 0, sleeps: 0 }
        }
    }

    impl Clock for FakeClock {
        fn now_ms(&mut self) -> u64 {
            self.now
        }

        fn sleep_ms(&mut self, ms: u32) {
            self.now += u64::from(ms);
            self.sleeps += 1;
        }
    }

    #[test]
    fn ready_condition_returns_without_sleeping() {
        let mut clock = FakeClock::new();
        assert!(wait_until(&mut clock, 1000, 100, || true));
        assert_eq!(clock.sleeps, 0);
    }

    #[test]
    fn late_condition_is_caught_before_the_deadline() {
        let mut clock = FakeClock::new();
        let mut polls = 0;
        let ok = wait_until(&mut clock, 1000, 100, || {
            polls += 1;
            polls == 4
        });
        assert!(ok);
        assert_eq!(clock.sleeps, 3);
    }

    #[test]
    fn timeout_gives_up() {
        let mut clock = FakeClock::new();
        assert!(!wait_until(&mut clock, 1000, 250, || false));
        assert!(clock.now >= 1000);
    }
}
