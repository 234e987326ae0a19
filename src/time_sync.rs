use esp_idf_svc::sntp::{EspSntp, OperatingMode, SntpConf, SyncMode, SyncStatus};
use esp_idf_sys::EspError;
use log::info;
use thiserror::Error;

use crate::clock::{self, Clock};
use crate::scheduler::LocalTime;

const SNTP_SERVERS: [&str; 2] = ["pool.ntp.org", "time.nist.gov"];
const SYNC_TIMEOUT_MS: u32 = 20_000;
const POLL_INTERVAL_MS: u32 = 250;

// System clocks below this are still at their power-on default.
const EPOCH_SANITY_FLOOR: libc::time_t = 1_000_000_000;

#[derive(Debug, Error)]
pub enum TimeSyncError {
    #[error("time synchronization timed out")]
    Timeout,
    #[error(transparent)]
    Esp(#[from] EspError),
}

/// Apply the POSIX timezone and block until SNTP sets the system clock.
/// The handle keeps periodic re-sync alive for the rest of the wake, so
/// the caller must hold on to it.
pub fn synchronize(clock: &mut impl Clock, tz: &str) -> Result<EspSntp<'static>, TimeSyncError> {
    info!("Setting timezone: {}", tz);
    std::env::set_var("TZ", tz);
    unsafe { libc::tzset() };

    let conf = SntpConf {
        servers: SNTP_SERVERS,
        sync_mode: SyncMode::Immediate,
        operating_mode: OperatingMode::Poll,
    };

    info!("Starting SNTP sync with {}", SNTP_SERVERS[0]);
    let sntp = EspSntp::new(&conf)?;

    let synced = clock::wait_until(clock, SYNC_TIMEOUT_MS, POLL_INTERVAL_MS, || {
        sntp.get_sync_status() == SyncStatus::Completed
    });
    if !synced {
        return Err(TimeSyncError::Timeout);
    }

    if let Some(t) = local_now() {
        info!(
            "Time synchronized: {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            t.year, t.month, t.day, t.hour, t.min, t.sec
        );
    }
    Ok(sntp)
}

/// Civil time in the configured timezone, or None while the system clock
/// is still unset.
pub fn local_now() -> Option<LocalTime> {
    let mut now: libc::time_t = 0;
    unsafe {
        libc::time(&mut now);
    }
    if now < EPOCH_SANITY_FLOOR {
        return None;
    }

    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    unsafe {
        libc::localtime_r(&now, &mut tm);
    }
    Some(LocalTime {
        year: tm.tm_year + 1900,
        month: tm.tm_mon as u32 + 1,
        day: tm.tm_mday as u32,
        weekday: tm.tm_wday as u32,
        hour: tm.tm_hour as u32,
        min: tm.tm_min as u32,
        sec: tm.tm_sec as u32,
    })
}
