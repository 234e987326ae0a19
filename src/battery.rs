// Battery policy for the wake cycle. Voltage bands decide whether a wake
// proceeds to a refresh or goes straight back to sleep, and a persisted
// latch keeps the low-battery alert from being redrawn every wake.

/// Status bar shows a warning at or below this level, roughly 20%.
pub const WARN_MV: u32 = 3535;
/// Refreshes stop at or below this level, roughly 10%.
pub const LOW_MV: u32 = 3462;
/// Sleep stretches to the long interval at or below this level, roughly 8%.
pub const VERY_LOW_MV: u32 = 3442;
/// Hibernate indefinitely at or below this level, roughly 5%.
pub const CRIT_MV: u32 = 3404;

/// Empty and full points of the discharge curve.
pub const MIN_MV: u32 = 3000;
pub const MAX_MV: u32 = 4200;

pub const LOW_SLEEP_MINUTES: u32 = 30;
pub const VERY_LOW_SLEEP_MINUTES: u32 = 120;

// ── Wake gate ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    /// Healthy, continue with the refresh.
    Proceed,
    /// Low, sleep 30 minutes without refreshing.
    SleepShort,
    /// Very low, sleep 120 minutes without refreshing.
    SleepLong,
    /// Critically low, deep sleep with no wakeup timer. Only the reset
    /// button brings the unit back.
    Hibernate,
}

impl PowerAction {
    /// Timer for the back-to-sleep actions. `None` for `Proceed` (no sleep
    /// yet) and `Hibernate` (no timer at all).
    pub fn timer_minutes(self) -> Option<u32> {
        match self {
            PowerAction::SleepShort => Some(LOW_SLEEP_MINUTES),
            PowerAction::SleepLong => Some(VERY_LOW_SLEEP_MINUTES),
            PowerAction::Proceed | PowerAction::Hibernate => None,
        }
    }
}

/// Verdict for one wake, derived from the measured voltage and the stored
/// low-battery latch.
#[derive(Debug, Clone, Copy)]
pub struct PowerDecision {
    pub action: PowerAction,
    /// Draw the full-screen low-battery alert. Set only on the wake that
    /// first crosses into the low band.
    pub show_alert: bool,
    /// Latch value the status store should hold after this wake.
    pub latch: bool,
    /// Battery is above the low band but close, flag it in the status bar.
    pub low_warning: bool,
}

/// Classify a wake. Bands are inclusive at their upper edge, matching the
/// `<=` comparisons the thresholds were tuned with.
pub fn assess(millivolts: u32, low_latched: bool) -> PowerDecision {
    if millivolts <= LOW_MV {
        let action = if millivolts <= CRIT_MV {
            PowerAction::Hibernate
        } else if millivolts <= VERY_LOW_MV {
            PowerAction::SleepLong
        } else {
            PowerAction::SleepShort
        };
        PowerDecision {
            action,
            show_alert: !low_latched,
            latch: true,
            low_warning: false,
        }
    } else {
        PowerDecision {
            action: PowerAction::Proceed,
            show_alert: false,
            latch: false,
            low_warning: millivolts <= WARN_MV,
        }
    }
}

// ── Gauge helpers ───────────────────────────────────────────────────

/// Charge estimate in percent. Sigmoidal fit of a LiPo discharge curve,
/// adapted from rlogiacco/BatterySense.
pub fn percent(millivolts: u32) -> u32 {
    let v = millivolts.clamp(MIN_MV, MAX_MV);
    let t = 1.724 * f64::from(v - MIN_MV) / f64::from(MAX_MV - MIN_MV);
    let p = (105.0 - 105.0 / (1.0 + t.powf(5.5))) as u32;
    p.min(100)
}

/// Bars shown in the 24px battery glyph, 0 (empty) to 7 (full).
pub fn glyph_bars(percent: u32) -> u8 {
    match percent {
        93..=u32::MAX => 7,
        79..=92 => 6,
        65..=78 => 5,
        50..=64 => 4,
        36..=49 => 3,
        22..=35 => 2,
        8..=21 => 1,
        _ => 0,
    }
}

// ── Voltage measurement ─────────────────────────────────────────────

/// Sample the pack voltage through the on-board divider. The FireBeetle
/// ESP32-E routes the battery through 1M+1M resistors into GPIO34 (A2),
/// so the calibrated pin reading is doubled.
#[cfg(target_os = "espidf")]
pub fn read_millivolts(
    adc1: esp_idf_hal::adc::ADC1,
    pin: esp_idf_hal::gpio::Gpio34,
) -> anyhow::Result<u32> {
    use esp_idf_hal::adc::attenuation::DB_11;
    use esp_idf_hal::adc::oneshot::config::{AdcChannelConfig, Calibration};
    use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};

    let adc = AdcDriver::new(adc1)?;
    let config = AdcChannelConfig {
        attenuation: DB_11,
        calibration: Calibration::Line,
        ..Default::default()
    };
    let mut channel = AdcChannelDriver::new(&adc, pin, &config)?;
    let pin_mv: u16 = adc.read(&mut channel)?;
    Ok(u32::from(pin_mv) * 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_battery_proceeds() {
        let d = assess(3700, false);
        assert_eq!(d.action, PowerAction::Proceed);
        assert!(!d.show_alert);
        assert!(!d.latch);
        assert!(!d.low_warning);
    }

    #[test]
    fn warn_band_proceeds_with_warning() {
        assert!(assess(WARN_MV, false).low_warning);
        assert!(!assess(WARN_MV + 1, false).low_warning);
        assert_eq!(assess(WARN_MV, false).action, PowerAction::Proceed);
    }

    #[test]
    fn band_edges_are_inclusive() {
        assert_eq!(assess(LOW_MV, false).action, PowerAction::SleepShort);
        assert_eq!(assess(LOW_MV + 1, false).action, PowerAction::Proceed);
        assert_eq!(assess(VERY_LOW_MV, false).action, PowerAction::SleepLong);
        assert_eq!(assess(VERY_LOW_MV + 1, false).action, PowerAction::SleepShort);
        assert_eq!(assess(CRIT_MV, false).action, PowerAction::Hibernate);
        assert_eq!(assess(CRIT_MV + 1, false).action, PowerAction::SleepLong);
    }

    #[test]
    fn alert_draws_once_until_recovery() {
        // First wake below the threshold alerts and latches.
        let first = assess(3450, false);
        assert_eq!(first.action, PowerAction::SleepShort);
        assert!(first.show_alert);
        assert!(first.latch);

        // Further low wakes stay silent while the latch holds.
        let again = assess(3430, first.latch);
        assert_eq!(again.action, PowerAction::SleepLong);
        assert!(!again.show_alert);
        assert!(again.latch);

        // Recovery above the threshold clears the latch, so the next dip
        // alerts again.
        let recovered = assess(3600, again.latch);
        assert_eq!(recovered.action, PowerAction::Proceed);
        assert!(!recovered.latch);
        assert!(assess(3450, recovered.latch).show_alert);
    }

    #[test]
    fn critical_wake_hibernates_and_still_alerts() {
        let d = assess(CRIT_MV - 1, false);
        assert_eq!(d.action, PowerAction::Hibernate);
        assert_eq!(d.action.timer_minutes(), None);
        assert!(d.show_alert);
        assert!(d.latch);
    }

    #[test]
    fn sleep_timers_match_bands() {
        assert_eq!(PowerAction::SleepShort.timer_minutes(), Some(30));
        assert_eq!(PowerAction::SleepLong.timer_minutes(), Some(120));
        assert_eq!(PowerAction::Proceed.timer_minutes(), None);
    }

    #[test]
    fn percent_spans_the_curve() {
        assert_eq!(percent(MIN_MV), 0);
        assert_eq!(percent(MAX_MV), 100);
        assert_eq!(percent(2500), 0);
        assert_eq!(percent(4300), 100);

        let mut last = 0;
        for mv in (MIN_MV..=MAX_MV).step_by(10) {
            let p = percent(mv);
            assert!(p >= last, "{mv} mV dipped to {p}%");
            assert!(p <= 100);
            last = p;
        }
    }

    #[test]
    fn glyph_bars_follow_the_fill_thresholds() {
        assert_eq!(glyph_bars(100), 7);
        assert_eq!(glyph_bars(93), 7);
        assert_eq!(glyph_bars(92), 6);
        assert_eq!(glyph_bars(79), 6);
        assert_eq!(glyph_bars(65), 5);
        assert_eq!(glyph_bars(50), 4);
        assert_eq!(glyph_bars(36), 3);
        assert_eq!(glyph_bars(22), 2);
        assert_eq!(glyph_bars(8), 1);
        assert_eq!(glyph_bars(7), 0);
        assert_eq!(glyph_bars(0), 0);
    }
}
