use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use esp_idf_sys::EspError;
use log::{info, warn};
use thiserror::Error;

const MAX_ATTEMPTS: u32 = 3;

/// Classic station status numbering, shared with the failure phrases.
pub const STATUS_CONNECTED: u8 = 3;
const STATUS_DISCONNECTED: u8 = 6;

#[derive(Debug, Error)]
pub enum WifiError {
    #[error("SSID not found")]
    NoSsid,
    #[error("connection failed")]
    ConnectFailed,
    #[error(transparent)]
    Esp(#[from] EspError),
}

/// A live station link. The radio stays up until `shutdown`.
pub struct WifiSession {
    wifi: Box<EspWifi<'static>>,
    pub rssi: i32,
    pub ip: String,
}

impl WifiSession {
    /// Disconnect and power the radio down. Readings that depend on the
    /// link (RSSI, IP) were captured at connect time.
    pub fn shutdown(mut self) {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
        info!("WiFi stopped");
    }
}

/// Signal strength of the associated AP, or None when not associated.
fn ap_rssi() -> Option<i32> {
    let mut ap_info: esp_idf_sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
    let rc = unsafe { esp_idf_sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
    (rc == esp_idf_sys::ESP_OK).then_some(i32::from(ap_info.rssi))
}

/// Station link state folded onto the classic status numbering.
pub fn station_status() -> u8 {
    if ap_rssi().is_some() {
        STATUS_CONNECTED
    } else {
        STATUS_DISCONNECTED
    }
}

/// Bring the station up and associate, retrying with a full radio reset
/// between attempts. A post-mortem scan separates a missing network from
/// a failed handshake.
pub fn connect(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    ssid: &str,
    password: &str,
) -> Result<WifiSession, WifiError> {
    let mut esp_wifi = EspWifi::new(modem, sysloop.clone(), None)?;

    let auth = if password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };

    let mut wifi_ssid = heapless::String::<32>::new();
    let mut wifi_pass = heapless::String::<64>::new();
    wifi_ssid.push_str(ssid).ok();
    wifi_pass.push_str(password).ok();

    esp_wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: wifi_ssid,
        password: wifi_pass,
        auth_method: auth,
        ..Default::default()
    }))?;

    let mut blocking_wifi = BlockingWifi::wrap(&mut esp_wifi, sysloop)?;

    blocking_wifi.start()?;
    info!("WiFi connecting to '{}'...", ssid);

    let mut connected = false;
    for attempt in 1..=MAX_ATTEMPTS {
        let t0 = unsafe { esp_idf_sys::esp_timer_get_time() };
        match blocking_wifi.connect() {
            Ok(_) => {
                let elapsed_ms = (unsafe { esp_idf_sys::esp_timer_get_time() } - t0) / 1000;
                info!("WiFi connect OK on attempt {} ({}ms)", attempt, elapsed_ms);
                connected = true;
                break;
            }
            Err(e) => {
                let elapsed_ms = (unsafe { esp_idf_sys::esp_timer_get_time() } - t0) / 1000;
                warn!(
                    "WiFi connect attempt {}/{} failed after {}ms: {}",
                    attempt, MAX_ATTEMPTS, elapsed_ms, e
                );
                if attempt < MAX_ATTEMPTS {
                    // Full stop/start cycle to reset radio state.
                    let _ = blocking_wifi.disconnect();
                    blocking_wifi.stop().ok();
                    std::thread::sleep(std::time::Duration::from_millis(500));
                    blocking_wifi.start().ok();
                    std::thread::sleep(std::time::Duration::from_millis(300));
                }
            }
        }
    }

    if !connected {
        // One scan to tell "not in range" apart from "refused us".
        let missing = match blocking_wifi.scan() {
            Ok(aps) => !aps.iter().any(|ap| ap.ssid.as_str() == ssid),
            Err(e) => {
                warn!("WiFi scan failed: {}", e);
                false
            }
        };
        return Err(if missing {
            warn!("'{}' not found in scan results", ssid);
            WifiError::NoSsid
        } else {
            WifiError::ConnectFailed
        });
    }

    // RSSI has to be read now, the radio powers down before the panel
    // refresh finishes.
    let rssi = ap_rssi().unwrap_or(0);

    blocking_wifi.wait_netif_up()?;
    let ip_info = blocking_wifi.wifi().sta_netif().get_ip_info()?;
    info!("WiFi connected, IP {} rssi {}dBm", ip_info.ip, rssi);
    let ip = ip_info.ip.to_string();

    drop(blocking_wifi);

    Ok(WifiSession {
        wifi: Box::new(esp_wifi),
        rssi,
        ip,
    })
}
