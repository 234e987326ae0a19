mod battery;
mod bme280_sensor;
mod clock;
mod config;
#[cfg(target_os = "espidf")]
mod display;
mod http_client;
mod icons;
mod locale;
mod persist;
mod renderer;
mod scheduler;
mod text_layout;
#[cfg(target_os = "espidf")]
mod time_sync;
mod units;
mod weather;
#[cfg(target_os = "espidf")]
mod wifi;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

// Host builds carry the test suite only.
#[cfg(not(target_os = "espidf"))]
fn main() {}

#[cfg(target_os = "espidf")]
mod firmware {
    use anyhow::Result;
    use epd_waveshare::epd7in5_v2::Display7in5;
    use esp_idf_hal::gpio::{InputPin, OutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_hal::spi::SPI3;
    use esp_idf_hal::units::Hertz;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs};
    use log::{error, info, warn};

    use crate::battery::{self, PowerAction};
    use crate::bme280_sensor::{Bme280, SensorError};
    use crate::clock::EspClock;
    use crate::config::{self, Config, DriverBoard, WeatherProvider};
    use crate::display::{Panel, PanelPins};
    use crate::icons::ErrorGlyph;
    use crate::locale;
    use crate::persist::{self, NvsStatusStore, StatusStore};
    use crate::renderer::{self, DashboardData, IndoorReading};
    use crate::scheduler::{self, SleepSchedule};
    use crate::time_sync;
    use crate::weather;
    use crate::wifi::{self, WifiError};

    /// One full wake cycle. Every failure path paints its own diagnosis on
    /// the panel and goes back to deep sleep.
    pub fn run() -> Result<()> {
        esp_idf_sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();

        let cycle_start_us = unsafe { esp_idf_sys::esp_timer_get_time() };
        info!("BOOT epd-weather-station v{}", env!("CARGO_PKG_VERSION"));

        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs_partition = EspDefaultNvsPartition::take()?;
        let pins = peripherals.pins;

        // ── 1. Configuration ──
        let cfg = {
            let nvs = EspNvs::new(nvs_partition.clone(), config::NS, true)?;
            Config::load(&nvs)
        };
        let s = cfg.locale.strings();
        let schedule = SleepSchedule {
            cadence_minutes: cfg.sleep_cadence_minutes,
            wake_hour: cfg.wake_hour,
            bed_hour: cfg.bed_hour,
        };

        // FireBeetle ESP32-E wiring: panel on VSPI, BME280 on I2C0.
        let spi = peripherals.spi3;
        let panel_pins = PanelPins {
            sclk: pins.gpio18.downgrade_output(),
            mosi: pins.gpio23.downgrade_output(),
            cs: pins.gpio13.downgrade_output(),
            busy: pins.gpio14.downgrade_input(),
            dc: pins.gpio22.downgrade_output(),
            rst: pins.gpio21.downgrade_output(),
            pwr: pins.gpio26.downgrade_output(),
        };

        if let Err(e) = cfg.validate() {
            error!("config: {:#}", e);
            show_error(
                spi,
                panel_pins,
                cfg.driver_board,
                ErrorGlyph::ConfigInvalid,
                s.invalid_config,
                &e.to_string(),
            );
            // The schedule itself may be what failed validation, so sleep
            // a clamped cadence instead of consulting the scheduler.
            sleep_for_minutes(cfg.sleep_cadence_minutes.clamp(2, 1440));
        }

        // ── 2. Battery gate ──
        let mut battery_millivolts = None;
        let mut low_warning = false;
        if cfg.battery_monitoring {
            let mut store = NvsStatusStore::new(nvs_partition.clone())?;
            let mv = battery::read_millivolts(peripherals.adc1, pins.gpio34)?;
            info!("battery {} mV, {}%", mv, battery::percent(mv));

            let decision = battery::assess(mv, store.low_battery_latched()?);
            persist::update_latch(&mut store, decision.latch)?;

            if decision.action != PowerAction::Proceed {
                drop(store);
                if decision.show_alert {
                    show_error(spi, panel_pins, cfg.driver_board, ErrorGlyph::BatteryAlert, s.low_battery, "");
                }
                match decision.action.timer_minutes() {
                    Some(minutes) => sleep_for_minutes(minutes),
                    None => hibernate(),
                }
            }
            battery_millivolts = Some(mv);
            low_warning = decision.low_warning;
        }

        // ── 3. WiFi ──
        let session = match wifi::connect(peripherals.modem, sysloop, &cfg.wifi_ssid, &cfg.wifi_pass)
        {
            Ok(session) => session,
            Err(e) => {
                error!("WiFi: {}", e);
                let text = match e {
                    WifiError::NoSsid => s.network_not_available,
                    _ => s.wifi_connection_failed,
                };
                show_error(spi, panel_pins, cfg.driver_board, ErrorGlyph::WifiOff, text, "");
                enter_deep_sleep(&schedule, cycle_start_us);
            }
        };
        let rssi = session.rssi;

        // ── 4. Clock sync ──
        let mut boot_clock = EspClock;
        let _sntp = match time_sync::synchronize(&mut boot_clock, &cfg.timezone) {
            Ok(sntp) => sntp,
            Err(e) => {
                error!("SNTP: {}", e);
                session.shutdown();
                show_error(spi, panel_pins, cfg.driver_board, ErrorGlyph::TimeSync, s.time_sync_failed, "");
                enter_deep_sleep(&schedule, cycle_start_us);
            }
        };

        // ── 5. Forecast fetch ──
        let fetched = match cfg.provider {
            WeatherProvider::OpenWeatherMap => weather::fetch_one_call(&cfg),
            WeatherProvider::Cma => weather::fetch_cma(&cfg),
        };
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                session.shutdown();
                let line1 = match cfg.provider {
                    WeatherProvider::OpenWeatherMap => {
                        format!("One Call {} API", weather::OWM_ONECALL_VERSION)
                    }
                    WeatherProvider::Cma => "CMA API".to_string(),
                };
                let line2 = format!("{}: {}", e.code, locale::error_phrase(cfg.locale, e.code));
                show_error(spi, panel_pins, cfg.driver_board, ErrorGlyph::CloudDown, &line1, &line2);
                enter_deep_sleep(&schedule, cycle_start_us);
            }
        };
        info!(
            "forecast: {} hourly, {} daily, {} alerts",
            snapshot.hourly.len(),
            snapshot.daily.len(),
            snapshot.alerts.len()
        );

        // ── 6. Air quality, then the radio goes down ──
        let air_fetch = match cfg.provider {
            WeatherProvider::OpenWeatherMap => Some(weather::fetch_air_quality(&cfg)),
            WeatherProvider::Cma => None,
        };
        session.shutdown();
        let air = match air_fetch {
            Some(Ok(air)) => Some(air),
            Some(Err(e)) => {
                let line2 = format!("{}: {}", e.code, locale::error_phrase(cfg.locale, e.code));
                show_error(spi, panel_pins, cfg.driver_board, ErrorGlyph::CloudDown, "Air Pollution API", &line2);
                enter_deep_sleep(&schedule, cycle_start_us);
            }
            None => None,
        };

        // ── 7. Indoor sensor ──
        let mut status = String::new();
        let mut indoor = IndoorReading::default();

        let mut sensor_power = PinDriver::output(pins.gpio4)?;
        sensor_power.set_high()?;
        let i2c_config = I2cConfig::new().baudrate(Hertz(100_000));
        let mut i2c = I2cDriver::new(peripherals.i2c0, pins.gpio17, pins.gpio16, &i2c_config)?;
        let sample = Bme280::probe(&mut i2c).and_then(|sensor| sensor.read_forced(&mut i2c));
        drop(i2c);
        sensor_power.set_low()?;

        match sample {
            Ok(sample) => {
                info!(
                    "indoor {:.1} C, {:.0} %RH",
                    sample.temperature_c, sample.humidity_pct
                );
                indoor.temperature_c = Some(sample.temperature_c);
                indoor.humidity_pct = Some(sample.humidity_pct);
            }
            Err(e) => {
                warn!("BME280: {}", e);
                let phrase = match e {
                    SensorError::NotFound => s.not_found,
                    SensorError::ReadFailed => s.read_failed,
                };
                status = format!("BME {}", phrase);
            }
        }

        // The battery warning outranks a sensor complaint in the one
        // status slot.
        if low_warning {
            status = s.low_battery.to_string();
        }

        // ── 8. Render ──
        let now = time_sync::local_now();
        let refresh_time = locale::refresh_time_string(cfg.locale, now.as_ref());

        let mut frame = Box::<Display7in5>::default();
        renderer::draw_dashboard(
            frame.as_mut(),
            &cfg,
            &DashboardData {
                snapshot: &snapshot,
                air: air.as_ref(),
                indoor,
                city: &cfg.city,
                now,
                refresh_time: &refresh_time,
                status: &status,
                rssi,
                battery_millivolts,
            },
        )?;

        let mut panel = Panel::power_on(spi, panel_pins, cfg.driver_board)?;
        panel.show(&frame)?;
        panel.power_off()?;

        // ── 9. Back to sleep ──
        enter_deep_sleep(&schedule, cycle_start_us);
    }

    // ── Error screens and sleep ─────────────────────────────────────

    /// Paint a full-screen error, logging panel failures instead of
    /// propagating them.
    fn show_error(
        spi: SPI3,
        pins: PanelPins,
        board: DriverBoard,
        glyph: ErrorGlyph,
        line1: &str,
        line2: &str,
    ) {
        if line2.is_empty() {
            error!("{}", line1);
        } else {
            error!("{} {}", line1, line2);
        }

        let mut frame = Box::<Display7in5>::default();
        renderer::draw_error(frame.as_mut(), glyph, line1, line2).ok();

        match Panel::power_on(spi, pins, board) {
            Ok(mut panel) => {
                if let Err(e) = panel.show(&frame) {
                    error!("EPD refresh: {:#}", e);
                }
                if let Err(e) = panel.power_off() {
                    error!("EPD power-off: {:#}", e);
                }
            }
            Err(e) => error!("EPD init: {:#}", e),
        }
    }

    /// Sleep until the next cadence-aligned wake, or one plain cadence when
    /// the clock never synchronized.
    fn enter_deep_sleep(schedule: &SleepSchedule, cycle_start_us: i64) -> ! {
        let seconds = match time_sync::local_now() {
            Some(now) => scheduler::next_sleep_seconds(schedule, &now),
            None => u64::from(schedule.cadence_minutes) * 60,
        };
        let awake_ms = (unsafe { esp_idf_sys::esp_timer_get_time() } - cycle_start_us) / 1000;
        info!("awake {} ms, deep sleep {} s", awake_ms, seconds);
        unsafe {
            esp_idf_sys::esp_sleep_enable_timer_wakeup(seconds * 1_000_000);
            esp_idf_sys::esp_deep_sleep_start();
        }
    }

    fn sleep_for_minutes(minutes: u32) -> ! {
        info!("deep sleep {} min", minutes);
        unsafe {
            esp_idf_sys::esp_sleep_enable_timer_wakeup(u64::from(minutes) * 60 * 1_000_000);
            esp_idf_sys::esp_deep_sleep_start();
        }
    }

    /// Deep sleep with no wakeup timer. Only the reset button ends it.
    fn hibernate() -> ! {
        warn!("battery critically low, hibernating");
        unsafe { esp_idf_sys::esp_deep_sleep_start() }
    }
}
