use anyhow::{bail, Result};

use crate::locale::Locale;
use crate::units::{DistanceUnit, PrecipUnit, SpeedUnit, TempUnit};

pub const NS: &str = "wx_cfg";

// Build-time secrets, injected from secrets.local.rs by the build script.
const BUILT_IN_WIFI_SSID: &str = match option_env!("LOCAL_WIFI_SSID") {
    Some(s) => s,
    None => "",
};
const BUILT_IN_WIFI_PASS: &str = match option_env!("LOCAL_WIFI_PASS") {
    Some(s) => s,
    None => "",
};
const BUILT_IN_OWM_KEY: &str = match option_env!("LOCAL_OPENWEATHER_API_KEY") {
    Some(s) => s,
    None => "",
};
const BUILT_IN_CMA_ID: &str = match option_env!("LOCAL_CMA_API_ID") {
    Some(s) => s,
    None => "",
};
const BUILT_IN_CMA_KEY: &str = match option_env!("LOCAL_CMA_API_KEY") {
    Some(s) => s,
    None => "",
};

const DEFAULT_LATITUDE: f64 = 40.7128;
const DEFAULT_LONGITUDE: f64 = -74.0060;
const DEFAULT_CITY: &str = "New York";
const DEFAULT_TIMEZONE: &str = "EST5EDT,M3.2.0,M11.1.0";
const DEFAULT_SLEEP_CADENCE: u32 = 30;
const DEFAULT_WAKE_HOUR: u32 = 6;
const DEFAULT_BED_HOUR: u32 = 0;
const DEFAULT_GRAPH_HOURS: u32 = 24;

// ── Categories ──────────────────────────────────────────────────────

/// Panel variants the wiring supports. Only the 7.5" black/white v2 has a
/// driver compiled into this firmware; selecting another model fails
/// validation at startup instead of producing a blank screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelModel {
    /// 7.5" black/white, 800x480.
    BwV2,
    /// 7.5" red/black/white, 800x480.
    ThreeColorB,
    /// 7.3" seven-color ACeP, 800x480.
    SevenColorF,
    /// 7.5" black/white, 640x384.
    BwV1,
}

impl PanelModel {
    pub fn as_str(self) -> &'static str {
        match self {
            PanelModel::BwV2 => "bw_v2",
            PanelModel::ThreeColorB => "3c_b",
            PanelModel::SevenColorF => "7c_f",
            PanelModel::BwV1 => "bw_v1",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bw_v2" => Some(PanelModel::BwV2),
            "3c_b" => Some(PanelModel::ThreeColorB),
            "7c_f" => Some(PanelModel::SevenColorF),
            "bw_v1" => Some(PanelModel::BwV1),
            _ => None,
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            PanelModel::BwV1 => (640, 384),
            _ => (800, 480),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverBoard {
    DespiC02,
    Waveshare,
}

impl DriverBoard {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverBoard::DespiC02 => "despi_c02",
            DriverBoard::Waveshare => "waveshare",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "despi_c02" => Some(DriverBoard::DespiC02),
            "waveshare" => Some(DriverBoard::Waveshare),
            _ => None,
        }
    }
}

/// Dashboard typeface. The layout was sized around ProFont; the built-in
/// embedded-graphics set is narrower and trades readability for headroom
/// on busy locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    ProFont,
    BuiltIn,
}

impl FontFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            FontFamily::ProFont => "profont",
            FontFamily::BuiltIn => "builtin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profont" => Some(FontFamily::ProFont),
            "builtin" => Some(FontFamily::BuiltIn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherProvider {
    OpenWeatherMap,
    Cma,
}

impl WeatherProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            WeatherProvider::OpenWeatherMap => "owm",
            WeatherProvider::Cma => "cma",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owm" => Some(WeatherProvider::OpenWeatherMap),
            "cma" => Some(WeatherProvider::Cma),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMode {
    Http,
    HttpsNoCertVerif,
    HttpsWithCertVerif,
}

impl HttpMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMode::Http => "http",
            HttpMode::HttpsNoCertVerif => "https_no_verify",
            HttpMode::HttpsWithCertVerif => "https",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Some(HttpMode::Http),
            "https_no_verify" => Some(HttpMode::HttpsNoCertVerif),
            "https" => Some(HttpMode::HttpsWithCertVerif),
            _ => None,
        }
    }

    pub fn scheme(self) -> &'static str {
        match self {
            HttpMode::Http => "http",
            _ => "https",
        }
    }
}

/// How the wind direction appears beside the wind speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindIndicator {
    Arrow,
    Number,
    CardinalName,
    IntercardinalName,
    SecondaryIntercardinalName,
    TertiaryIntercardinalName,
    None,
}

impl WindIndicator {
    pub fn as_str(self) -> &'static str {
        match self {
            WindIndicator::Arrow => "arrow",
            WindIndicator::Number => "number",
            WindIndicator::CardinalName => "cardinal",
            WindIndicator::IntercardinalName => "intercardinal",
            WindIndicator::SecondaryIntercardinalName => "secondary_intercardinal",
            WindIndicator::TertiaryIntercardinalName => "tertiary_intercardinal",
            WindIndicator::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arrow" => Some(WindIndicator::Arrow),
            "number" => Some(WindIndicator::Number),
            "cardinal" => Some(WindIndicator::CardinalName),
            "intercardinal" => Some(WindIndicator::IntercardinalName),
            "secondary_intercardinal" => Some(WindIndicator::SecondaryIntercardinalName),
            "tertiary_intercardinal" => Some(WindIndicator::TertiaryIntercardinalName),
            "none" => Some(WindIndicator::None),
            _ => None,
        }
    }

    /// Compass rose size for the name variants.
    pub fn compass_points(self) -> Option<u16> {
        match self {
            WindIndicator::CardinalName => Some(4),
            WindIndicator::IntercardinalName => Some(8),
            WindIndicator::SecondaryIntercardinalName => Some(16),
            WindIndicator::TertiaryIntercardinalName => Some(32),
            _ => None,
        }
    }
}

/// How finely the wind arrow rotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindIconPrecision {
    Cardinal,
    Intercardinal,
    SecondaryIntercardinal,
    TertiaryIntercardinal,
    Degrees360,
}

impl WindIconPrecision {
    pub fn as_str(self) -> &'static str {
        match self {
            WindIconPrecision::Cardinal => "cardinal",
            WindIconPrecision::Intercardinal => "intercardinal",
            WindIconPrecision::SecondaryIntercardinal => "secondary_intercardinal",
            WindIconPrecision::TertiaryIntercardinal => "tertiary_intercardinal",
            WindIconPrecision::Degrees360 => "360",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cardinal" => Some(WindIconPrecision::Cardinal),
            "intercardinal" => Some(WindIconPrecision::Intercardinal),
            "secondary_intercardinal" => Some(WindIconPrecision::SecondaryIntercardinal),
            "tertiary_intercardinal" => Some(WindIconPrecision::TertiaryIntercardinal),
            "360" => Some(WindIconPrecision::Degrees360),
            _ => None,
        }
    }

    /// Snap a direction to this precision.
    pub fn snap(self, degrees: u16) -> u16 {
        let points = match self {
            WindIconPrecision::Cardinal => 4.0,
            WindIconPrecision::Intercardinal => 8.0,
            WindIconPrecision::SecondaryIntercardinal => 16.0,
            WindIconPrecision::TertiaryIntercardinal => 32.0,
            WindIconPrecision::Degrees360 => return degrees % 360,
        };
        let step = 360.0 / points;
        ((f32::from(degrees % 360) / step).round() * step) as u16 % 360
    }
}

// ── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    pub panel: PanelModel,
    pub driver_board: DriverBoard,
    pub font: FontFamily,
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub owm_api_key: String,
    pub cma_api_id: String,
    pub cma_api_key: String,
    pub provider: WeatherProvider,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub cma_province: String,
    pub cma_city: String,
    pub cma_place: String,
    /// POSIX TZ string, daylight rules included.
    pub timezone: String,
    pub locale: Locale,
    pub temp_unit: TempUnit,
    pub speed_unit: SpeedUnit,
    pub distance_unit: DistanceUnit,
    /// Readout for the precipitation bars in the hourly outlook graph.
    pub hourly_precip_unit: PrecipUnit,
    /// Readout under each day's high/low in the forecast strip.
    pub daily_precip_unit: PrecipUnit,
    pub http_mode: HttpMode,
    pub wind_indicator: WindIndicator,
    pub wind_icon_precision: WindIconPrecision,
    /// Minutes between refreshes while awake.
    pub sleep_cadence_minutes: u32,
    pub wake_hour: u32,
    pub bed_hour: u32,
    /// Hours shown in the outlook graph.
    pub hourly_graph_hours: u32,
    pub display_alerts: bool,
    pub battery_monitoring: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            panel: PanelModel::BwV2,
            driver_board: DriverBoard::DespiC02,
            font: FontFamily::ProFont,
            wifi_ssid: BUILT_IN_WIFI_SSID.to_string(),
            wifi_pass: BUILT_IN_WIFI_PASS.to_string(),
            owm_api_key: BUILT_IN_OWM_KEY.to_string(),
            cma_api_id: BUILT_IN_CMA_ID.to_string(),
            cma_api_key: BUILT_IN_CMA_KEY.to_string(),
            provider: WeatherProvider::OpenWeatherMap,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            city: DEFAULT_CITY.to_string(),
            cma_province: String::new(),
            cma_city: String::new(),
            cma_place: String::new(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            locale: Locale::EnUs,
            temp_unit: TempUnit::Celsius,
            speed_unit: SpeedUnit::KilometersPerHour,
            distance_unit: DistanceUnit::Kilometers,
            hourly_precip_unit: PrecipUnit::Pop,
            daily_precip_unit: PrecipUnit::Millimeters,
            http_mode: HttpMode::HttpsNoCertVerif,
            wind_indicator: WindIndicator::Arrow,
            wind_icon_precision: WindIconPrecision::Degrees360,
            sleep_cadence_minutes: DEFAULT_SLEEP_CADENCE,
            wake_hour: DEFAULT_WAKE_HOUR,
            bed_hour: DEFAULT_BED_HOUR,
            hourly_graph_hours: DEFAULT_GRAPH_HOURS,
            display_alerts: true,
            battery_monitoring: true,
        }
    }
}

impl Config {
    /// Reject configurations the rest of the cycle cannot work with. Runs
    /// once per wake, before any network activity.
    pub fn validate(&self) -> Result<()> {
        if self.panel != PanelModel::BwV2 {
            bail!("panel {} has no driver in this build", self.panel.as_str());
        }
        if self.wifi_ssid.is_empty() {
            bail!("wifi ssid is not set");
        }
        match self.provider {
            WeatherProvider::OpenWeatherMap if self.owm_api_key.is_empty() => {
                bail!("provider owm needs an API key")
            }
            WeatherProvider::Cma if self.cma_api_id.is_empty() || self.cma_api_key.is_empty() => {
                bail!("provider cma needs an API id and key")
            }
            WeatherProvider::Cma if self.cma_province.is_empty() || self.cma_city.is_empty() => {
                bail!("provider cma needs a province and city")
            }
            _ => {}
        }
        if !(2..=1440).contains(&self.sleep_cadence_minutes) {
            bail!(
                "sleep cadence {} out of range 2..=1440",
                self.sleep_cadence_minutes
            );
        }
        if self.wake_hour > 23 || self.bed_hour > 23 {
            bail!(
                "wake hour {} / bed hour {} out of range 0..=23",
                self.wake_hour,
                self.bed_hour
            );
        }
        if !(8..=48).contains(&self.hourly_graph_hours) {
            bail!(
                "hourly graph span {} out of range 8..=48",
                self.hourly_graph_hours
            );
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude)
        {
            bail!("coordinates {}, {} invalid", self.latitude, self.longitude);
        }
        if self.timezone.is_empty() {
            bail!("timezone is not set");
        }
        Ok(())
    }
}

// ── NVS overrides ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod nvs {
    use esp_idf_svc::nvs::{EspNvs, NvsDefault};
    use log::{info, warn};

    use super::*;

    const KEY_PANEL: &str = "panel";
    const KEY_DRIVER_BOARD: &str = "driver_board";
    const KEY_FONT: &str = "font";
    const KEY_WIFI_SSID: &str = "wifi_ssid";
    const KEY_WIFI_PASS: &str = "wifi_pass";
    const KEY_OWM_KEY: &str = "owm_key";
    const KEY_CMA_ID: &str = "cma_id";
    const KEY_CMA_KEY: &str = "cma_key";
    const KEY_PROVIDER: &str = "provider";
    const KEY_LATITUDE: &str = "lat";
    const KEY_LONGITUDE: &str = "lon";
    const KEY_CITY: &str = "city";
    const KEY_CMA_PROVINCE: &str = "cma_sheng";
    const KEY_CMA_CITY: &str = "cma_shi";
    const KEY_CMA_PLACE: &str = "cma_place";
    const KEY_TIMEZONE: &str = "timezone";
    const KEY_LOCALE: &str = "locale";
    const KEY_UNIT_TEMP: &str = "unit_temp";
    const KEY_UNIT_SPEED: &str = "unit_speed";
    const KEY_UNIT_DIST: &str = "unit_dist";
    const KEY_UNIT_PRECIP_HOURLY: &str = "unit_precip_hr";
    const KEY_UNIT_PRECIP_DAILY: &str = "unit_precip_day";
    const KEY_HTTP_MODE: &str = "http_mode";
    const KEY_WIND_INDICATOR: &str = "wind_ind";
    const KEY_WIND_ICON_PREC: &str = "wind_icon_prec";
    const KEY_SLEEP_CADENCE: &str = "sleep_cadence";
    const KEY_WAKE_HOUR: &str = "wake_hour";
    const KEY_BED_HOUR: &str = "bed_hour";
    const KEY_GRAPH_HOURS: &str = "graph_hours";
    const KEY_ALERTS: &str = "alerts";
    const KEY_BATTERY_MON: &str = "battery_mon";

    /// Read a string from NVS, returning None if the key is absent or on
    /// error.
    fn nvs_get_str(nvs: &EspNvs<NvsDefault>, key: &str) -> Option<String> {
        // First query the required buffer length.
        let len = match nvs.str_len(key) {
            Ok(Some(len)) => len,
            _ => return None,
        };

        let mut buf = vec![0u8; len];
        match nvs.get_str(key, &mut buf) {
            Ok(Some(val)) => {
                let s = val.trim_end_matches('\0').to_string();
                if s.is_empty() {
                    None
                } else {
                    Some(s)
                }
            }
            _ => None,
        }
    }

    fn override_str(nvs: &EspNvs<NvsDefault>, key: &str, field: &mut String) {
        if let Some(v) = nvs_get_str(nvs, key) {
            info!("NVS {} = {:?}", key, v);
            *field = v;
        }
    }

    fn override_secret(nvs: &EspNvs<NvsDefault>, key: &str, field: &mut String) {
        if let Some(v) = nvs_get_str(nvs, key) {
            info!("NVS {} = <{} chars>", key, v.len());
            *field = v;
        }
    }

    fn override_cat<T: Copy>(
        nvs: &EspNvs<NvsDefault>,
        key: &str,
        field: &mut T,
        parse: fn(&str) -> Option<T>,
        name: fn(T) -> &'static str,
    ) {
        if let Some(v) = nvs_get_str(nvs, key) {
            match parse(&v) {
                Some(parsed) => {
                    info!("NVS {} = {}", key, name(parsed));
                    *field = parsed;
                }
                None => warn!("NVS {} = {:?} is not a known option, ignored", key, v),
            }
        }
    }

    fn override_u32(nvs: &EspNvs<NvsDefault>, key: &str, field: &mut u32) {
        if let Ok(Some(v)) = nvs.get_u32(key) {
            info!("NVS {} = {}", key, v);
            *field = v;
        }
    }

    fn override_bool(nvs: &EspNvs<NvsDefault>, key: &str, field: &mut bool) {
        if let Ok(Some(v)) = nvs.get_u8(key) {
            info!("NVS {} = {}", key, v != 0);
            *field = v != 0;
        }
    }

    impl Config {
        /// Built-in defaults overlaid with whatever keys exist in NVS. The
        /// handle is dropped by the caller before any network activity.
        pub fn load(nvs: &EspNvs<NvsDefault>) -> Config {
            let mut cfg = Config::default();

            override_cat(
                nvs,
                KEY_PANEL,
                &mut cfg.panel,
                PanelModel::parse,
                PanelModel::as_str,
            );
            override_cat(
                nvs,
                KEY_DRIVER_BOARD,
                &mut cfg.driver_board,
                DriverBoard::parse,
                DriverBoard::as_str,
            );
            override_cat(
                nvs,
                KEY_FONT,
                &mut cfg.font,
                FontFamily::parse,
                FontFamily::as_str,
            );
            override_str(nvs, KEY_WIFI_SSID, &mut cfg.wifi_ssid);
            override_secret(nvs, KEY_WIFI_PASS, &mut cfg.wifi_pass);
            override_secret(nvs, KEY_OWM_KEY, &mut cfg.owm_api_key);
            override_str(nvs, KEY_CMA_ID, &mut cfg.cma_api_id);
            override_secret(nvs, KEY_CMA_KEY, &mut cfg.cma_api_key);
            override_cat(
                nvs,
                KEY_PROVIDER,
                &mut cfg.provider,
                WeatherProvider::parse,
                WeatherProvider::as_str,
            );

            if let Some(v) = nvs_get_str(nvs, KEY_LATITUDE) {
                match v.parse() {
                    Ok(lat) => {
                        info!("NVS {} = {}", KEY_LATITUDE, v);
                        cfg.latitude = lat;
                    }
                    Err(_) => warn!("NVS {} = {:?} is not a number, ignored", KEY_LATITUDE, v),
                }
            }
            if let Some(v) = nvs_get_str(nvs, KEY_LONGITUDE) {
                match v.parse() {
                    Ok(lon) => {
                        info!("NVS {} = {}", KEY_LONGITUDE, v);
                        cfg.longitude = lon;
                    }
                    Err(_) => warn!("NVS {} = {:?} is not a number, ignored", KEY_LONGITUDE, v),
                }
            }

            override_str(nvs, KEY_CITY, &mut cfg.city);
            override_str(nvs, KEY_CMA_PROVINCE, &mut cfg.cma_province);
            override_str(nvs, KEY_CMA_CITY, &mut cfg.cma_city);
            override_str(nvs, KEY_CMA_PLACE, &mut cfg.cma_place);
            override_str(nvs, KEY_TIMEZONE, &mut cfg.timezone);

            if let Some(v) = nvs_get_str(nvs, KEY_LOCALE) {
                match Locale::from_key(&v) {
                    Some(locale) => {
                        info!("NVS {} = {:?}", KEY_LOCALE, v);
                        cfg.locale = locale;
                    }
                    None => warn!("NVS {} = {:?} is not a known locale, ignored", KEY_LOCALE, v),
                }
            }

            override_cat(
                nvs,
                KEY_UNIT_TEMP,
                &mut cfg.temp_unit,
                TempUnit::from_key,
                TempUnit::key,
            );
            override_cat(
                nvs,
                KEY_UNIT_SPEED,
                &mut cfg.speed_unit,
                SpeedUnit::from_key,
                SpeedUnit::key,
            );
            override_cat(
                nvs,
                KEY_UNIT_DIST,
                &mut cfg.distance_unit,
                DistanceUnit::from_key,
                DistanceUnit::key,
            );
            override_cat(
                nvs,
                KEY_UNIT_PRECIP_HOURLY,
                &mut cfg.hourly_precip_unit,
                PrecipUnit::from_key,
                PrecipUnit::key,
            );
            override_cat(
                nvs,
                KEY_UNIT_PRECIP_DAILY,
                &mut cfg.daily_precip_unit,
                PrecipUnit::from_key,
                PrecipUnit::key,
            );
            override_cat(
                nvs,
                KEY_HTTP_MODE,
                &mut cfg.http_mode,
                HttpMode::parse,
                HttpMode::as_str,
            );
            override_cat(
                nvs,
                KEY_WIND_INDICATOR,
                &mut cfg.wind_indicator,
                WindIndicator::parse,
                WindIndicator::as_str,
            );
            override_cat(
                nvs,
                KEY_WIND_ICON_PREC,
                &mut cfg.wind_icon_precision,
                WindIconPrecision::parse,
                WindIconPrecision::as_str,
            );

            override_u32(nvs, KEY_SLEEP_CADENCE, &mut cfg.sleep_cadence_minutes);
            override_u32(nvs, KEY_WAKE_HOUR, &mut cfg.wake_hour);
            override_u32(nvs, KEY_BED_HOUR, &mut cfg.bed_hour);
            override_u32(nvs, KEY_GRAPH_HOURS, &mut cfg.hourly_graph_hours);
            override_bool(nvs, KEY_ALERTS, &mut cfg.display_alerts);
            override_bool(nvs, KEY_BATTERY_MON, &mut cfg.battery_monitoring);

            cfg
        }
    }
}
