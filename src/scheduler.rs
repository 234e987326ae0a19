// Wake scheduling for the deep-sleep cycle. Wakes are aligned to multiples
// of the refresh cadence counted from the daily wake hour, so a 30 minute
// cadence fires at :00 and :30 regardless of how long a cycle took.

/// Extra seconds added before the drift multiplier, compensating for ESP32
/// RTC oscillators that run fast.
const DRIFT_PAD_SECONDS: u64 = 3;
const DRIFT_FACTOR: f64 = 1.0015;

/// A wake is pulled forward to the next slot when the remaining time to the
/// nearest slot is under this floor or nearly a whole period has elapsed.
const SKIP_AHEAD_FLOOR_SECONDS: i64 = 120;
const SKIP_AHEAD_RATIO: f32 = 0.95;

// ── Local time snapshot ─────────────────────────────────────────────

/// Civil time in the configured timezone, as read from the system clock
/// after SNTP sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub year: i32,
    /// 1..=12
    pub month: u32,
    /// 1..=31
    pub day: u32,
    /// Days since Sunday, 0..=6.
    pub weekday: u32,
    pub hour: u32,
    pub min: u32,
    pub sec: u32,
}

// ── Schedule parameters ─────────────────────────────────────────────

/// Refresh cadence and the daily on-window, from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SleepSchedule {
    /// Minutes between refreshes, 2..=1440.
    pub cadence_minutes: u32,
    /// Hour the display resumes refreshing, 0..=23.
    pub wake_hour: u32,
    /// Hour refreshes stop for the night, 0..=23. Equal to `wake_hour`
    /// disables the overnight pause.
    pub bed_hour: u32,
}

// ── Sleep computation ───────────────────────────────────────────────

/// Seconds until the next cadence-aligned wake, observing the overnight
/// window. Hours are counted relative to the wake hour so the bed hour can
/// wrap past midnight. Always returns at least one second.
pub fn aligned_sleep_seconds(schedule: &SleepSchedule, now: &LocalTime) -> u64 {
    let cadence = i64::from(schedule.cadence_minutes);
    let bedtime_hour = if schedule.bed_hour == schedule.wake_hour {
        i64::MAX
    } else {
        (i64::from(schedule.bed_hour) - i64::from(schedule.wake_hour) + 24) % 24
    };

    let cur_hour = (i64::from(now.hour) - i64::from(schedule.wake_hour) + 24) % 24;
    let cur_minute = cur_hour * 60 + i64::from(now.min);
    let cur_second = cur_hour * 3600 + i64::from(now.min) * 60 + i64::from(now.sec);
    let desired_seconds = cadence * 60;
    let offset_minutes = cur_minute % cadence;
    let offset_seconds = cur_second % desired_seconds;

    let mut sleep_minutes = cadence - offset_minutes;
    if desired_seconds - offset_seconds < SKIP_AHEAD_FLOOR_SECONDS
        || offset_seconds as f32 / desired_seconds as f32 > SKIP_AHEAD_RATIO
    {
        sleep_minutes += cadence;
    }

    let predicted_wake_hour = ((cur_minute + sleep_minutes) / 60) % 24;

    let seconds = if predicted_wake_hour < bedtime_hour {
        sleep_minutes * 60 - i64::from(now.sec)
    } else {
        let hours_until_wake = 24 - cur_hour;
        hours_until_wake * 3600 - (i64::from(now.min) * 60 + i64::from(now.sec))
    };
    seconds.max(1) as u64
}

/// Pad and stretch a sleep interval so fast RTCs do not wake early.
pub fn apply_drift_fudge(seconds: u64) -> u64 {
    ((seconds + DRIFT_PAD_SECONDS) as f64 * DRIFT_FACTOR) as u64
}

/// Timer value for the next deep sleep, drift fudge included.
pub fn next_sleep_seconds(schedule: &SleepSchedule, now: &LocalTime) -> u64 {
    apply_drift_fudge(aligned_sleep_seconds(schedule, now))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, min: u32, sec: u32) -> LocalTime {
        LocalTime {
            year: 2024,
            month: 6,
            day: 15,
            weekday: 6,
            hour,
            min,
            sec,
        }
    }

    fn schedule(cadence: u32, wake: u32, bed: u32) -> SleepSchedule {
        SleepSchedule {
            cadence_minutes: cadence,
            wake_hour: wake,
            bed_hour: bed,
        }
    }

    #[test]
    fn wakes_on_cadence_boundary() {
        // 05:50 with a 30 minute cadence lands exactly on 06:00.
        let s = schedule(30, 6, 0);
        assert_eq!(aligned_sleep_seconds(&s, &at(5, 50, 0)), 600);
    }

    #[test]
    fn seconds_are_subtracted_from_the_slot() {
        let s = schedule(30, 6, 0);
        assert_eq!(aligned_sleep_seconds(&s, &at(5, 50, 30)), 570);
    }

    #[test]
    fn overnight_window_sleeps_until_wake_hour() {
        // 01:00 is inside the 00:00..06:00 pause, so sleep five hours.
        let s = schedule(30, 6, 0);
        assert_eq!(aligned_sleep_seconds(&s, &at(1, 0, 0)), 18_000);
    }

    #[test]
    fn near_slot_wake_skips_to_the_next_slot() {
        // 06:29 is 60s from the 06:30 slot, under the floor, so aim at 07:00.
        let s = schedule(30, 6, 0);
        assert_eq!(aligned_sleep_seconds(&s, &at(6, 29, 0)), 1_860);
    }

    #[test]
    fn equal_bed_and_wake_hours_disable_the_pause() {
        let s = schedule(30, 6, 6);
        assert_eq!(aligned_sleep_seconds(&s, &at(1, 0, 0)), 1_800);
    }

    #[test]
    fn boundary_wake_sleeps_a_full_period() {
        // Waking exactly on a slot must schedule the following slot, never 0.
        for cadence in [2u32, 5, 10, 15, 30, 60, 90, 120, 1440] {
            let s = schedule(cadence, 0, 0);
            let got = aligned_sleep_seconds(&s, &at(0, 0, 0));
            assert_eq!(got, u64::from(cadence) * 60, "cadence {cadence}");
        }
    }

    #[test]
    fn wake_instants_stay_aligned_across_cadences() {
        for cadence in 2u32..=180 {
            let s = schedule(cadence, 0, 0);
            for &(h, m, sec) in &[(0u32, 1u32, 0u32), (3, 17, 42), (11, 59, 59), (23, 0, 5)] {
                let now = at(h, m, sec);
                let slept = aligned_sleep_seconds(&s, &now);
                assert!(slept > 0);
                let woke = (u64::from(h) * 3600 + u64::from(m) * 60 + u64::from(sec) + slept)
                    % (u64::from(cadence) * 60);
                // The skip-ahead rule still lands on a slot, just a later one.
                assert_eq!(woke, 0, "cadence {cadence} at {h}:{m}:{sec}");
            }
        }
    }

    #[test]
    fn successive_wakes_walk_the_slot_grid() {
        // Slots for a 45 minute cadence from a 06:00 wake hour fall at
        // 06:00, 06:45, ..., 09:45, 10:30. Chained wakes stay on that grid.
        let s = schedule(45, 6, 6);
        assert_eq!(aligned_sleep_seconds(&s, &at(9, 17, 0)), 1_680);
        assert_eq!(aligned_sleep_seconds(&s, &at(9, 45, 0)), 2_700);
        assert_eq!(aligned_sleep_seconds(&s, &at(10, 30, 0)), 2_700);
    }

    #[test]
    fn drift_fudge_pads_and_stretches() {
        assert_eq!(apply_drift_fudge(600), 603);
        assert_eq!(apply_drift_fudge(18_000), 18_030);
        assert_eq!(apply_drift_fudge(0), 3);
    }
}
