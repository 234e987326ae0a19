use serde::Deserialize;
use thiserror::Error;

// Forecast model and provider parsers. Two providers share the model: the
// One Call API delivers structured JSON, the CMA relay delivers localized
// free text that is canonicalized here. Temperatures are stored in Kelvin,
// speeds in m/s, distances in meters, precipitation in mm, and every
// timestamp is Unix epoch seconds UTC.

pub const MAX_HOURLY: usize = 48;
pub const MAX_DAILY: usize = 8;
pub const MAX_ALERTS: usize = 8;
pub const MAX_AIR_SAMPLES: usize = 24;

pub const OWM_ENDPOINT: &str = "api.openweathermap.org";
pub const OWM_ONECALL_VERSION: &str = "3.0";
pub const CMA_ENDPOINT: &str = "cn.apihz.cn";

// ── Data types ──────────────────────────────────────────────────────

/// One weather phenomenon in the One Call condition-code space.
#[derive(Debug, Clone, Default)]
pub struct Condition {
    pub id: u16,
    pub main: String,
    pub description: String,
    /// Icon key, e.g. "01d".
    pub icon: String,
}

#[derive(Debug, Clone, Default)]
pub struct Current {
    pub dt: i64,
    pub sunrise: i64,
    pub sunset: i64,
    pub temp: f32,
    pub feels_like: f32,
    pub humidity: u8,
    pub dew_point: f32,
    pub clouds: u8,
    pub uvi: f32,
    pub visibility: u32,
    pub wind_speed: f32,
    pub wind_gust: f32,
    pub wind_deg: u16,
    pub rain_1h: f32,
    pub snow_1h: f32,
    pub condition: Condition,
}

#[derive(Debug, Clone, Default)]
pub struct Hourly {
    pub dt: i64,
    pub temp: f32,
    pub humidity: u8,
    /// Probability of precipitation, 0..=1.
    pub pop: f32,
    pub rain_1h: f32,
    pub snow_1h: f32,
    pub wind_speed: f32,
    pub wind_deg: u16,
    pub condition: Condition,
}

#[derive(Debug, Clone, Default)]
pub struct Daily {
    pub dt: i64,
    pub sunrise: i64,
    pub sunset: i64,
    pub temp_min: f32,
    pub temp_max: f32,
    pub humidity: u8,
    pub pop: f32,
    pub rain: f32,
    pub snow: f32,
    pub wind_speed: f32,
    pub wind_deg: u16,
    pub condition: Condition,
}

#[derive(Debug, Clone, Default)]
pub struct Alert {
    pub sender_name: String,
    pub event: String,
    pub start: i64,
    pub end: i64,
    pub description: String,
    pub tags: Vec<String>,
}

/// Everything one wake cycle knows about the forecast. Rebuilt from
/// scratch every cycle, never persisted.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub lat: f32,
    pub lon: f32,
    pub timezone: String,
    /// Seconds east of UTC, applied only at render time.
    pub timezone_offset: i32,
    pub current: Current,
    pub hourly: Vec<Hourly>,
    pub daily: Vec<Daily>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Default)]
pub struct AirSample {
    pub dt: i64,
    /// Air-quality index, 1 (good) to 5 (very poor).
    pub aqi: u8,
    pub co: f32,
    pub no: f32,
    pub no2: f32,
    pub o3: f32,
    pub so2: f32,
    pub pm2_5: f32,
    pub pm10: f32,
    pub nh3: f32,
}

#[derive(Debug, Clone, Default)]
pub struct AirQuality {
    pub lat: f32,
    pub lon: f32,
    pub samples: Vec<AirSample>,
}

// ── Errors ──────────────────────────────────────────────────────────

/// Payload that arrived but could not be deserialized.
#[derive(Debug, Error)]
#[error("payload deserialization failed: {source}")]
pub struct ParseError {
    #[from]
    source: serde_json::Error,
}

impl ParseError {
    /// Error code in the parse range, -256 minus the failure class.
    pub fn code(&self) -> i32 {
        use serde_json::error::Category;
        let class = match self.source.classify() {
            Category::Eof => 2,
            Category::Syntax | Category::Data => 3,
            Category::Io => 4,
        };
        -256 - class
    }
}

/// Terminal result of a fetch, after retries. The code is an HTTP status,
/// a transport error in -1..=-11, a parse code offset from -256, or a
/// link code offset from -512.
#[derive(Debug, Error)]
#[error("request failed with code {code}")]
pub struct FetchError {
    pub code: i32,
}

// ── Canonicalization ────────────────────────────────────────────────

/// Degrees for a Chinese wind-direction phrase. Compound names win over
/// their parts, so the single-character checks exclude the other axis.
pub fn cn_wind_to_deg(text: &str) -> u16 {
    let has = |needle: &str| text.contains(needle);
    if has("北") && !has("东") && !has("西") {
        return 0;
    }
    if has("东北") {
        return 45;
    }
    if has("东") && !has("南") {
        return 90;
    }
    if has("东南") {
        return 135;
    }
    if has("南") && !has("东") && !has("西") {
        return 180;
    }
    if has("西南") {
        return 225;
    }
    if has("西") && !has("北") {
        return 270;
    }
    if has("西北") {
        return 315;
    }
    0
}

/// Condition id for a Chinese weather phrase. Keywords are checked from
/// the severest phenomenon down, so "雷阵雨" counts as thunder, not rain.
pub fn cn_weather_to_id(text: &str) -> u16 {
    if text.contains("雷") {
        return 210;
    }
    if text.contains("雪") {
        return 600;
    }
    if text.contains("雨") {
        return 500;
    }
    if text.contains("阴") {
        return 804;
    }
    if text.contains("多云") {
        return 801;
    }
    if text.contains("晴") {
        return 800;
    }
    800
}

/// Icon key for a condition id.
pub fn icon_from_id(id: u16) -> &'static str {
    match id {
        200..=299 => "11d",
        300..=599 => "09d",
        600..=699 => "13d",
        700..=799 => "50d",
        800 => "01d",
        801 => "02d",
        802 => "03d",
        _ => "04d",
    }
}

/// Leading numeric prefix of a string, 0.0 when there is none. CMA wind
/// speeds arrive as text like "3.5米/秒".
fn leading_float(s: &str) -> f32 {
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

const CELSIUS_ZERO_K: f32 = 273.15;

// ── One Call JSON structures ────────────────────────────────────────

#[derive(Deserialize)]
struct RawWeather {
    id: Option<u16>,
    main: Option<String>,
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Deserialize)]
struct RawPrecip {
    #[serde(rename = "1h")]
    one_h: Option<f32>,
}

#[derive(Deserialize)]
struct RawCurrent {
    dt: Option<i64>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
    temp: Option<f32>,
    feels_like: Option<f32>,
    humidity: Option<u8>,
    dew_point: Option<f32>,
    clouds: Option<u8>,
    uvi: Option<f32>,
    visibility: Option<u32>,
    wind_speed: Option<f32>,
    wind_gust: Option<f32>,
    wind_deg: Option<u16>,
    rain: Option<RawPrecip>,
    snow: Option<RawPrecip>,
    weather: Option<Vec<RawWeather>>,
}

#[derive(Deserialize)]
struct RawHourly {
    dt: Option<i64>,
    temp: Option<f32>,
    humidity: Option<u8>,
    pop: Option<f32>,
    wind_speed: Option<f32>,
    wind_deg: Option<u16>,
    rain: Option<RawPrecip>,
    snow: Option<RawPrecip>,
    weather: Option<Vec<RawWeather>>,
}

#[derive(Deserialize)]
struct RawDailyTemp {
    min: Option<f32>,
    max: Option<f32>,
}

#[derive(Deserialize)]
struct RawDaily {
    dt: Option<i64>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
    temp: Option<RawDailyTemp>,
    humidity: Option<u8>,
    pop: Option<f32>,
    rain: Option<f32>,
    snow: Option<f32>,
    wind_speed: Option<f32>,
    wind_deg: Option<u16>,
    weather: Option<Vec<RawWeather>>,
}

#[derive(Deserialize)]
struct RawAlert {
    sender_name: Option<String>,
    event: Option<String>,
    start: Option<i64>,
    end: Option<i64>,
    description: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct RawOneCall {
    lat: Option<f32>,
    lon: Option<f32>,
    timezone: Option<String>,
    timezone_offset: Option<i32>,
    current: Option<RawCurrent>,
    hourly: Option<Vec<RawHourly>>,
    daily: Option<Vec<RawDaily>>,
    alerts: Option<Vec<RawAlert>>,
}

fn condition_of(weather: Option<Vec<RawWeather>>) -> Condition {
    let raw = weather.and_then(|mut v| if v.is_empty() { None } else { Some(v.remove(0)) });
    match raw {
        Some(w) => {
            let id = w.id.unwrap_or(800);
            Condition {
                id,
                main: w.main.unwrap_or_default(),
                description: w.description.unwrap_or_default(),
                icon: w.icon.unwrap_or_else(|| icon_from_id(id).to_string()),
            }
        }
        None => Condition {
            id: 800,
            icon: icon_from_id(800).to_string(),
            ..Condition::default()
        },
    }
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Parse a One Call response body. Sequences beyond the model capacities
/// are silently discarded.
pub fn parse_one_call(body: &str) -> Result<Snapshot, ParseError> {
    let raw: RawOneCall = serde_json::from_str(body)?;

    let current = raw.current.map(|c| Current {
        dt: c.dt.unwrap_or(0),
        sunrise: c.sunrise.unwrap_or(0),
        sunset: c.sunset.unwrap_or(0),
        temp: c.temp.unwrap_or(0.0),
        feels_like: c.feels_like.unwrap_or(0.0),
        humidity: c.humidity.unwrap_or(0),
        dew_point: c.dew_point.unwrap_or(0.0),
        clouds: c.clouds.unwrap_or(0),
        uvi: c.uvi.unwrap_or(0.0),
        visibility: c.visibility.unwrap_or(0),
        wind_speed: c.wind_speed.unwrap_or(0.0),
        wind_gust: c.wind_gust.unwrap_or(0.0),
        wind_deg: c.wind_deg.unwrap_or(0) % 360,
        rain_1h: c.rain.and_then(|p| p.one_h).unwrap_or(0.0),
        snow_1h: c.snow.and_then(|p| p.one_h).unwrap_or(0.0),
        condition: condition_of(c.weather),
    });

    let hourly = raw
        .hourly
        .unwrap_or_default()
        .into_iter()
        .take(MAX_HOURLY)
        .map(|h| Hourly {
            dt: h.dt.unwrap_or(0),
            temp: h.temp.unwrap_or(0.0),
            humidity: h.humidity.unwrap_or(0),
            pop: h.pop.unwrap_or(0.0),
            rain_1h: h.rain.and_then(|p| p.one_h).unwrap_or(0.0),
            snow_1h: h.snow.and_then(|p| p.one_h).unwrap_or(0.0),
            wind_speed: h.wind_speed.unwrap_or(0.0),
            wind_deg: h.wind_deg.unwrap_or(0) % 360,
            condition: condition_of(h.weather),
        })
        .collect();

    let daily = raw
        .daily
        .unwrap_or_default()
        .into_iter()
        .take(MAX_DAILY)
        .map(|d| {
            let temp = d.temp.unwrap_or(RawDailyTemp {
                min: None,
                max: None,
            });
            Daily {
                dt: d.dt.unwrap_or(0),
                sunrise: d.sunrise.unwrap_or(0),
                sunset: d.sunset.unwrap_or(0),
                temp_min: temp.min.unwrap_or(0.0),
                temp_max: temp.max.unwrap_or(0.0),
                humidity: d.humidity.unwrap_or(0),
                pop: d.pop.unwrap_or(0.0),
                rain: d.rain.unwrap_or(0.0),
                snow: d.snow.unwrap_or(0.0),
                wind_speed: d.wind_speed.unwrap_or(0.0),
                wind_deg: d.wind_deg.unwrap_or(0) % 360,
                condition: condition_of(d.weather),
            }
        })
        .collect();

    let alerts = raw
        .alerts
        .unwrap_or_default()
        .into_iter()
        .take(MAX_ALERTS)
        .map(|a| Alert {
            sender_name: a.sender_name.unwrap_or_default(),
            event: a.event.unwrap_or_default(),
            start: a.start.unwrap_or(0),
            end: a.end.unwrap_or(0),
            description: a.description.unwrap_or_default(),
            tags: a.tags.unwrap_or_default(),
        })
        .collect();

    Ok(Snapshot {
        lat: raw.lat.unwrap_or(0.0),
        lon: raw.lon.unwrap_or(0.0),
        timezone: raw.timezone.unwrap_or_default(),
        timezone_offset: raw.timezone_offset.unwrap_or(0),
        current: current.unwrap_or_default(),
        hourly,
        daily,
        alerts,
    })
}

// ── CMA JSON structures ─────────────────────────────────────────────

#[derive(Deserialize)]
struct RawCmaDay {
    tem_day: Option<f32>,
    tem_night: Option<f32>,
    wea: Option<String>,
    win: Option<String>,
    win_speed: Option<String>,
}

#[derive(Deserialize)]
struct RawCma {
    tem: Option<f32>,
    hum: Option<f32>,
    precipitation: Option<f32>,
    win: Option<String>,
    win_speed: Option<String>,
    wea: Option<String>,
    data: Option<Vec<RawCmaDay>>,
}

/// Parse a CMA relay response body. Temperatures arrive in Celsius and
/// are normalized to Kelvin so the model stays provider independent. The
/// relay sends no timestamps; daily rows are positional from today.
pub fn parse_cma(body: &str) -> Result<Snapshot, ParseError> {
    let raw: RawCma = serde_json::from_str(body)?;

    let wea = raw.wea.unwrap_or_default();
    let id = cn_weather_to_id(&wea);
    let current = Current {
        temp: raw.tem.unwrap_or(0.0) + CELSIUS_ZERO_K,
        humidity: raw.hum.unwrap_or(0.0).clamp(0.0, 100.0) as u8,
        rain_1h: raw.precipitation.unwrap_or(0.0),
        wind_speed: leading_float(raw.win_speed.as_deref().unwrap_or("")),
        wind_deg: cn_wind_to_deg(raw.win.as_deref().unwrap_or("")),
        condition: Condition {
            id,
            main: String::new(),
            description: wea,
            icon: icon_from_id(id).to_string(),
        },
        ..Current::default()
    };

    let daily = raw
        .data
        .unwrap_or_default()
        .into_iter()
        .take(MAX_DAILY)
        .map(|d| {
            let wea = d.wea.unwrap_or_default();
            let id = cn_weather_to_id(&wea);
            Daily {
                temp_max: d.tem_day.unwrap_or(0.0) + CELSIUS_ZERO_K,
                temp_min: d.tem_night.unwrap_or(0.0) + CELSIUS_ZERO_K,
                wind_speed: leading_float(d.win_speed.as_deref().unwrap_or("")),
                wind_deg: cn_wind_to_deg(d.win.as_deref().unwrap_or("")),
                condition: Condition {
                    id,
                    main: String::new(),
                    description: wea,
                    icon: icon_from_id(id).to_string(),
                },
                ..Daily::default()
            }
        })
        .collect();

    Ok(Snapshot {
        current,
        daily,
        ..Snapshot::default()
    })
}

// ── Air-quality JSON structures ─────────────────────────────────────

#[derive(Deserialize)]
struct RawCoord {
    lat: Option<f32>,
    lon: Option<f32>,
}

#[derive(Deserialize)]
struct RawAirMain {
    aqi: Option<u8>,
}

#[derive(Deserialize, Default)]
struct RawComponents {
    co: Option<f32>,
    no: Option<f32>,
    no2: Option<f32>,
    o3: Option<f32>,
    so2: Option<f32>,
    pm2_5: Option<f32>,
    pm10: Option<f32>,
    nh3: Option<f32>,
}

#[derive(Deserialize)]
struct RawAirEntry {
    dt: Option<i64>,
    main: Option<RawAirMain>,
    components: Option<RawComponents>,
}

#[derive(Deserialize)]
struct RawAir {
    coord: Option<RawCoord>,
    list: Option<Vec<RawAirEntry>>,
}

/// Parse an air-pollution response body, capped at one day of samples.
pub fn parse_air_quality(body: &str) -> Result<AirQuality, ParseError> {
    let raw: RawAir = serde_json::from_str(body)?;
    let (lat, lon) = raw
        .coord
        .map(|c| (c.lat.unwrap_or(0.0), c.lon.unwrap_or(0.0)))
        .unwrap_or((0.0, 0.0));

    let samples = raw
        .list
        .unwrap_or_default()
        .into_iter()
        .take(MAX_AIR_SAMPLES)
        .map(|e| {
            let c = e.components.unwrap_or_default();
            AirSample {
                dt: e.dt.unwrap_or(0),
                aqi: e.main.and_then(|m| m.aqi).unwrap_or(0),
                co: c.co.unwrap_or(0.0),
                no: c.no.unwrap_or(0.0),
                no2: c.no2.unwrap_or(0.0),
                o3: c.o3.unwrap_or(0.0),
                so2: c.so2.unwrap_or(0.0),
                pm2_5: c.pm2_5.unwrap_or(0.0),
                pm10: c.pm10.unwrap_or(0.0),
                nh3: c.nh3.unwrap_or(0.0),
            }
        })
        .collect();

    Ok(AirQuality { lat, lon, samples })
}

// ── Request URIs ────────────────────────────────────────────────────

/// One Call request path. Minutely data is never used; alerts are fetched
/// only when the alerts panel is enabled.
pub fn one_call_uri(lat: f64, lon: f64, lang: &str, api_key: &str, with_alerts: bool) -> String {
    format!(
        "/data/{}/onecall?lat={}&lon={}&lang={}&units=standard&exclude=minutely{}&appid={}",
        OWM_ONECALL_VERSION,
        lat,
        lon,
        lang,
        if with_alerts { "" } else { ",alerts" },
        api_key
    )
}

pub fn air_pollution_uri(lat: f64, lon: f64, api_key: &str) -> String {
    format!(
        "/data/2.5/air_pollution?lat={}&lon={}&appid={}",
        lat, lon, api_key
    )
}

/// CMA relay request path. Location parameters pass through in UTF-8 the
/// way the relay expects them.
pub fn cma_uri(pid: &str, key: &str, province: &str, city: &str, place: &str) -> String {
    format!(
        "/api/tianqi/tqyb.php?pid={}&key={}&sheng={}&shi={}&place={}",
        pid, key, province, city, place
    )
}

/// Copy of a request path with the API key masked, safe for the log.
pub fn sanitized(uri: &str, key: &str) -> String {
    if key.is_empty() {
        uri.to_string()
    } else {
        uri.replace(key, "{KEY}")
    }
}

// ── Fetching ────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod fetch {
    use log::info;

    use super::*;
    use crate::config::Config;
    use crate::http_client;
    use crate::wifi;

    const MAX_ATTEMPTS: u32 = 3;

    /// Run one provider request to completion: bail out with a link code
    /// when the station drops, retry transport, status and parse failures
    /// up to the attempt limit.
    fn fetch_with_retries<T>(
        cfg: &Config,
        host: &str,
        uri: &str,
        log_uri: &str,
        parse: impl Fn(&str) -> Result<T, ParseError>,
    ) -> Result<T, FetchError> {
        info!("attempting HTTP request: {}{}", host, log_uri);
        let mut code = 0;
        for attempt in 1..=MAX_ATTEMPTS {
            let status = wifi::station_status();
            if status != wifi::STATUS_CONNECTED {
                return Err(FetchError {
                    code: -512 - i32::from(status),
                });
            }

            code = match http_client::get(host, uri, cfg.http_mode) {
                Ok(resp) if resp.status == 200 => match parse(&resp.body) {
                    Ok(parsed) => {
                        info!("  attempt {}: 200 OK", attempt);
                        return Ok(parsed);
                    }
                    Err(e) => e.code(),
                },
                Ok(resp) => i32::from(resp.status),
                Err(e) => e.code(),
            };
            info!("  attempt {}: error {}", attempt, code);
        }
        Err(FetchError { code })
    }

    /// Fetch and parse the One Call forecast.
    pub fn fetch_one_call(cfg: &Config) -> Result<Snapshot, FetchError> {
        let uri = one_call_uri(
            cfg.latitude,
            cfg.longitude,
            cfg.locale.owm_lang(),
            &cfg.owm_api_key,
            cfg.display_alerts,
        );
        let log_uri = sanitized(&uri, &cfg.owm_api_key);
        fetch_with_retries(cfg, OWM_ENDPOINT, &uri, &log_uri, parse_one_call)
    }

    /// Fetch and parse the hourly air-quality series.
    pub fn fetch_air_quality(cfg: &Config) -> Result<AirQuality, FetchError> {
        let uri = air_pollution_uri(cfg.latitude, cfg.longitude, &cfg.owm_api_key);
        let log_uri = sanitized(&uri, &cfg.owm_api_key);
        fetch_with_retries(cfg, OWM_ENDPOINT, &uri, &log_uri, parse_air_quality)
    }

    /// Fetch and parse the CMA relay forecast.
    pub fn fetch_cma(cfg: &Config) -> Result<Snapshot, FetchError> {
        let uri = cma_uri(
            &cfg.cma_api_id,
            &cfg.cma_api_key,
            &cfg.cma_province,
            &cfg.cma_city,
            &cfg.cma_place,
        );
        let log_uri = sanitized(&uri, &cfg.cma_api_key);
        fetch_with_retries(cfg, CMA_ENDPOINT, &uri, &log_uri, parse_cma)
    }
}

#[cfg(target_os = "espidf")]
pub use fetch::{fetch_air_quality, fetch_cma, fetch_one_call};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wind_direction_compounds_beat_parts() {
        assert_eq!(cn_wind_to_deg("北风"), 0);
        assert_eq!(cn_wind_to_deg("东北风"), 45);
        assert_eq!(cn_wind_to_deg("东风"), 90);
        assert_eq!(cn_wind_to_deg("东南风"), 135);
        assert_eq!(cn_wind_to_deg("南风"), 180);
        assert_eq!(cn_wind_to_deg("西南风"), 225);
        assert_eq!(cn_wind_to_deg("西风"), 270);
        assert_eq!(cn_wind_to_deg("西北风"), 315);
        assert_eq!(cn_wind_to_deg("无持续风向"), 0);
    }

    #[test]
    fn weather_keywords_rank_by_severity() {
        assert_eq!(cn_weather_to_id("晴"), 800);
        assert_eq!(cn_weather_to_id("多云"), 801);
        assert_eq!(cn_weather_to_id("阴"), 804);
        assert_eq!(cn_weather_to_id("小雨"), 500);
        assert_eq!(cn_weather_to_id("中雪"), 600);
        // Mixed phrases classify as the severest phenomenon mentioned.
        assert_eq!(cn_weather_to_id("雷阵雨"), 210);
        assert_eq!(cn_weather_to_id("雨夹雪"), 600);
        assert_eq!(cn_weather_to_id("阴转多云"), 804);
        assert_eq!(cn_weather_to_id("多云转晴"), 801);
        assert_eq!(cn_weather_to_id("雾"), 800);
    }

    #[test]
    fn icon_table_matches_the_id_ranges() {
        assert_eq!(icon_from_id(210), "11d");
        assert_eq!(icon_from_id(310), "09d");
        assert_eq!(icon_from_id(500), "09d");
        assert_eq!(icon_from_id(600), "13d");
        assert_eq!(icon_from_id(741), "50d");
        assert_eq!(icon_from_id(800), "01d");
        assert_eq!(icon_from_id(801), "02d");
        assert_eq!(icon_from_id(802), "03d");
        assert_eq!(icon_from_id(803), "04d");
        assert_eq!(icon_from_id(804), "04d");
    }

    #[test]
    fn leading_float_parses_prefixes() {
        assert_eq!(leading_float("3.5米/秒"), 3.5);
        assert_eq!(leading_float("12级"), 12.0);
        assert_eq!(leading_float("-2.25"), -2.25);
        assert_eq!(leading_float("风速3"), 0.0);
        assert_eq!(leading_float(""), 0.0);
    }

    fn one_call_body(daily: usize, hourly: usize, alerts: usize) -> String {
        let day = |i: usize| {
            json!({
                "dt": 1_700_000_000_i64 + i as i64 * 86_400,
                "sunrise": 1_700_020_000_i64,
                "sunset": 1_700_060_000_i64,
                "temp": {"min": 280.0, "max": 290.0},
                "humidity": 60,
                "pop": 0.35,
                "wind_speed": 4.2,
                "wind_deg": 200,
                "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}]
            })
        };
        let hour = |i: usize| {
            json!({
                "dt": 1_700_000_000_i64 + i as i64 * 3_600,
                "temp": 284.5,
                "humidity": 70,
                "pop": 0.1,
                "rain": {"1h": 0.4},
                "wind_speed": 3.0,
                "wind_deg": 180,
                "weather": [{"id": 803, "description": "broken clouds", "icon": "04d"}]
            })
        };
        let alert = |i: usize| {
            json!({
                "sender_name": "NWS",
                "event": format!("Alert {i}"),
                "start": 1_700_000_000_i64,
                "end": 1_700_090_000_i64,
                "description": "stay indoors",
                "tags": ["Wind"]
            })
        };
        json!({
            "lat": 40.71,
            "lon": -74.01,
            "timezone": "America/New_York",
            "timezone_offset": -18_000,
            "current": {
                "dt": 1_700_000_123_i64,
                "sunrise": 1_700_020_000_i64,
                "sunset": 1_700_060_000_i64,
                "temp": 285.25,
                "feels_like": 283.0,
                "humidity": 65,
                "dew_point": 279.0,
                "clouds": 40,
                "uvi": 3.2,
                "visibility": 10_000,
                "wind_speed": 5.5,
                "wind_gust": 9.0,
                "wind_deg": 220,
                "rain": {"1h": 0.2},
                "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}]
            },
            "hourly": (0..hourly).map(hour).collect::<Vec<_>>(),
            "daily": (0..daily).map(day).collect::<Vec<_>>(),
            "alerts": (0..alerts).map(alert).collect::<Vec<_>>()
        })
        .to_string()
    }

    #[test]
    fn one_call_parses_the_whole_snapshot() {
        let snap = parse_one_call(&one_call_body(8, 48, 1)).unwrap();
        assert_eq!(snap.timezone, "America/New_York");
        assert_eq!(snap.timezone_offset, -18_000);
        assert_eq!(snap.current.temp, 285.25);
        assert_eq!(snap.current.humidity, 65);
        assert_eq!(snap.current.wind_deg, 220);
        assert_eq!(snap.current.rain_1h, 0.2);
        assert_eq!(snap.current.snow_1h, 0.0);
        assert_eq!(snap.current.condition.id, 500);
        assert_eq!(snap.current.condition.icon, "10d");
        assert_eq!(snap.hourly.len(), 48);
        assert_eq!(snap.hourly[0].rain_1h, 0.4);
        assert_eq!(snap.daily.len(), 8);
        assert_eq!(snap.daily[0].temp_min, 280.0);
        assert_eq!(snap.daily[0].temp_max, 290.0);
        assert_eq!(snap.alerts.len(), 1);
        assert_eq!(snap.alerts[0].event, "Alert 0");
    }

    #[test]
    fn sequences_truncate_at_capacity() {
        let snap = parse_one_call(&one_call_body(12, 60, 10)).unwrap();
        assert_eq!(snap.daily.len(), MAX_DAILY);
        assert_eq!(snap.hourly.len(), MAX_HOURLY);
        assert_eq!(snap.alerts.len(), MAX_ALERTS);
    }

    #[test]
    fn missing_sections_parse_to_empty() {
        let snap = parse_one_call(r#"{"lat": 1.0, "lon": 2.0}"#).unwrap();
        assert!(snap.hourly.is_empty());
        assert!(snap.daily.is_empty());
        assert!(snap.alerts.is_empty());
        assert_eq!(snap.current.condition.id, 800);
    }

    #[test]
    fn cma_temperatures_normalize_to_kelvin() {
        let body = json!({
            "code": 200,
            "wea": "雷阵雨",
            "tem": 28.5,
            "hum": 62.0,
            "precipitation": 1.5,
            "win": "东南风",
            "win_speed": "3.5米/秒",
            "data": [
                {"tem_day": 30.0, "tem_night": 22.0, "wea": "多云", "win": "南风", "win_speed": "2级"},
                {"tem_day": 27.0, "tem_night": 20.0, "wea": "小雨", "win": "北风", "win_speed": "3级"}
            ]
        })
        .to_string();

        let snap = parse_cma(&body).unwrap();
        assert!((snap.current.temp - 301.65).abs() < 1e-3);
        assert_eq!(snap.current.humidity, 62);
        assert_eq!(snap.current.rain_1h, 1.5);
        assert_eq!(snap.current.wind_deg, 135);
        assert_eq!(snap.current.wind_speed, 3.5);
        assert_eq!(snap.current.condition.id, 210);
        assert_eq!(snap.current.condition.icon, "11d");
        assert_eq!(snap.daily.len(), 2);
        assert!((snap.daily[0].temp_max - 303.15).abs() < 1e-3);
        assert!((snap.daily[0].temp_min - 295.15).abs() < 1e-3);
        assert_eq!(snap.daily[0].condition.id, 801);
        assert_eq!(snap.daily[1].condition.id, 500);
        assert_eq!(snap.daily[1].wind_deg, 0);
    }

    #[test]
    fn air_quality_caps_at_one_day() {
        let entry = |i: usize| {
            json!({
                "dt": 1_700_000_000_i64 + i as i64 * 3_600,
                "main": {"aqi": 2},
                "components": {"co": 201.9, "no": 0.02, "no2": 0.77, "o3": 68.7,
                               "so2": 0.64, "pm2_5": 0.5, "pm10": 0.54, "nh3": 0.12}
            })
        };
        let body = json!({
            "coord": {"lat": 40.71, "lon": -74.01},
            "list": (0..30).map(entry).collect::<Vec<_>>()
        })
        .to_string();

        let air = parse_air_quality(&body).unwrap();
        assert_eq!(air.samples.len(), MAX_AIR_SAMPLES);
        assert_eq!(air.samples[0].aqi, 2);
        assert!((air.samples[0].pm2_5 - 0.5).abs() < 1e-6);
        assert!((air.lat - 40.71).abs() < 1e-4);
    }

    #[test]
    fn parse_errors_map_into_the_offset_range() {
        let err = parse_one_call("{\"lat\": ").unwrap_err();
        assert_eq!(err.code(), -258);
        let err = parse_one_call("not json at all").unwrap_err();
        assert_eq!(err.code(), -259);
        let err = parse_air_quality("").unwrap_err();
        assert_eq!(err.code(), -258);
    }

    #[test]
    fn request_uris_carry_the_expected_parameters() {
        let uri = one_call_uri(52.52, 13.4, "de", "SECRET", false);
        assert!(uri.starts_with("/data/3.0/onecall?lat=52.52&lon=13.4&lang=de"));
        assert!(uri.contains("units=standard"));
        assert!(uri.contains("exclude=minutely,alerts"));
        assert!(uri.ends_with("appid=SECRET"));

        let uri = one_call_uri(52.52, 13.4, "en", "SECRET", true);
        assert!(uri.contains("exclude=minutely&"));

        let uri = cma_uri("88888", "SECRET", "广东", "深圳", "南山");
        assert!(uri.contains("pid=88888"));
        assert!(uri.contains("sheng=广东"));
        assert!(uri.contains("shi=深圳"));
        assert!(uri.contains("place=南山"));

        assert_eq!(
            sanitized("/x?appid=SECRET&y=1", "SECRET"),
            "/x?appid={KEY}&y=1"
        );
    }
}
