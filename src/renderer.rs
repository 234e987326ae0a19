use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10, FONT_7X13, FONT_9X15_BOLD},
        MonoFont, MonoTextStyle,
    },
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Alignment, Text},
};
use epd_waveshare::color::Color;
use profont::{PROFONT_12_POINT, PROFONT_18_POINT, PROFONT_24_POINT, PROFONT_9_POINT};

use crate::battery;
use crate::config::{Config, FontFamily, WindIndicator};
use crate::icons::{self, ErrorGlyph};
use crate::locale;
use crate::scheduler::LocalTime;
use crate::text_layout;
use crate::units::PrecipUnit;
use crate::weather::{AirQuality, Daily, Snapshot};

// Panel composition for the 7.5" 800x480 panel. Everything is drawn into
// one full-screen frame per wake; there are no partial updates.

pub const DISPLAY_WIDTH: i32 = 800;
pub const DISPLAY_HEIGHT: i32 = 480;

const FOREGROUND: Color = Color::Black;
// The accent color folds into the foreground on the two-color panel.
const ACCENT: Color = Color::Black;

// Error screens are font-invariant; readability over preference.
const ERROR_FONT: &MonoFont = &PROFONT_24_POINT;

/// The four sizes the dashboard is laid out with, resolved from the font
/// category once per frame.
struct FontSet {
    small: &'static MonoFont<'static>,
    body: &'static MonoFont<'static>,
    heading: &'static MonoFont<'static>,
    large: &'static MonoFont<'static>,
}

fn font_set(family: FontFamily) -> FontSet {
    match family {
        FontFamily::ProFont => FontSet {
            small: &PROFONT_9_POINT,
            body: &PROFONT_12_POINT,
            heading: &PROFONT_18_POINT,
            large: &PROFONT_24_POINT,
        },
        FontFamily::BuiltIn => FontSet {
            small: &FONT_6X10,
            body: &FONT_7X13,
            heading: &FONT_9X15_BOLD,
            large: &FONT_10X20,
        },
    }
}

/// Indoor sensor readings, already in display-friendly units. Missing
/// values render as dashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndoorReading {
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
}

/// Everything the dashboard needs for one frame.
pub struct DashboardData<'a> {
    pub snapshot: &'a Snapshot,
    pub air: Option<&'a AirQuality>,
    pub indoor: IndoorReading,
    pub city: &'a str,
    pub now: Option<LocalTime>,
    pub refresh_time: &'a str,
    pub status: &'a str,
    pub rssi: i32,
    pub battery_millivolts: Option<u32>,
}

// ── Text helpers ────────────────────────────────────────────────────

/// Advance width of a string in a monospaced font.
fn text_width(font: &MonoFont, text: &str) -> u32 {
    text.chars().count() as u32 * (font.character_size.width + font.character_spacing)
}

fn draw_text<D>(
    target: &mut D,
    text: &str,
    anchor: Point,
    font: &MonoFont,
    align: Alignment,
    color: Color,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Color>,
{
    Text::with_alignment(text, anchor, MonoTextStyle::new(font, color), align).draw(target)?;
    Ok(())
}

fn clock_hm(epoch: i64, tz_offset_seconds: i32) -> String {
    if epoch == 0 {
        return "--:--".to_string();
    }
    let sec = (epoch + i64::from(tz_offset_seconds)).rem_euclid(86_400);
    format!("{:02}:{:02}", sec / 3_600, (sec % 3_600) / 60)
}

fn local_hour(epoch: i64, tz_offset_seconds: i32) -> i64 {
    (epoch + i64::from(tz_offset_seconds)).rem_euclid(86_400) / 3_600
}

/// Day of week (0 = Sunday) for a daily row. Providers without timestamps
/// send rows positionally from today, so the current weekday fills in.
fn weekday_index(day: &Daily, idx: usize, tz_offset: i32, now: &Option<LocalTime>) -> Option<usize> {
    if day.dt > 0 {
        let days = (day.dt + i64::from(tz_offset)).div_euclid(86_400);
        Some((days + 4).rem_euclid(7) as usize)
    } else {
        now.as_ref().map(|t| (t.weekday as usize + idx) % 7)
    }
}

// ── Full screens ────────────────────────────────────────────────────

/// Compose the full dashboard frame.
pub fn draw_dashboard<D>(target: &mut D, cfg: &Config, data: &DashboardData) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Color>,
{
    let alerts_shown = cfg.display_alerts && !data.snapshot.alerts.is_empty();
    let fonts = font_set(cfg.font);

    draw_current_conditions(target, cfg, data, &fonts)?;
    draw_outlook_graph(target, cfg, data, alerts_shown, &fonts)?;
    draw_forecast_strip(target, cfg, data, &fonts)?;

    let date = data
        .now
        .as_ref()
        .map(|t| locale::date_string(cfg.locale, t))
        .unwrap_or_default();
    draw_location_date(target, data.city, &date, &fonts)?;

    if alerts_shown {
        draw_alerts(target, data, &fonts)?;
    }
    draw_status_bar(
        target,
        cfg,
        data.status,
        data.refresh_time,
        data.rssi,
        data.battery_millivolts,
    )
}

/// Full-screen error: a 196 px glyph above one or two lines of text. A
/// single long line wraps to at most two lines with the same pitch.
pub fn draw_error<D>(
    target: &mut D,
    glyph: ErrorGlyph,
    line1: &str,
    line2: &str,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Color>,
{
    let anchor_y = DISPLAY_HEIGHT / 2 + 98 + 21;
    if !line2.is_empty() {
        draw_text(
            target,
            line1,
            Point::new(DISPLAY_WIDTH / 2, anchor_y),
            ERROR_FONT,
            Alignment::Center,
            FOREGROUND,
        )?;
        draw_text(
            target,
            line2,
            Point::new(DISPLAY_WIDTH / 2, anchor_y + 55),
            ERROR_FONT,
            Alignment::Center,
            FOREGROUND,
        )?;
    } else {
        let lines = text_layout::wrap(line1, (DISPLAY_WIDTH - 200) as u32, 2, |s| {
            text_width(ERROR_FONT, s)
        });
        for (i, line) in lines.iter().enumerate() {
            draw_text(
                target,
                line,
                Point::new(DISPLAY_WIDTH / 2, anchor_y + i as i32 * 55),
                ERROR_FONT,
                Alignment::Center,
                FOREGROUND,
            )?;
        }
    }
    icons::error_glyph(
        target,
        Point::new(DISPLAY_WIDTH / 2, DISPLAY_HEIGHT / 2 - 21),
        196,
        glyph,
        ACCENT,
    )
}

// ── Sections ────────────────────────────────────────────────────────

fn draw_location_date<D>(
    target: &mut D,
    city: &str,
    date: &str,
    fonts: &FontSet,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Color>,
{
    draw_text(
        target,
        city,
        Point::new(DISPLAY_WIDTH - 2, 23),
        fonts.heading,
        Alignment::Right,
        ACCENT,
    )?;
    draw_text(
        target,
        date,
        Point::new(DISPLAY_WIDTH - 2, 51),
        fonts.body,
        Alignment::Right,
        FOREGROUND,
    )
}

fn draw_current_conditions<D>(
    target: &mut D,
    cfg: &Config,
    data: &DashboardData,
    fonts: &FontSet,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Color>,
{
    let snap = data.snapshot;
    let cur = &snap.current;
    let s = cfg.locale.strings();

    // 1. Condition icon and the current temperature beside it.
    icons::condition(
        target,
        Point::new(110, 130),
        196,
        &cur.condition.icon,
        FOREGROUND,
    )?;

    let temp = format!(
        "{}{}",
        cfg.temp_unit.from_kelvin(cur.temp).round() as i32,
        cfg.temp_unit.suffix()
    );
    draw_text(
        target,
        &temp,
        Point::new(295, 110),
        fonts.large,
        Alignment::Center,
        FOREGROUND,
    )?;

    let feels = format!(
        "{} {}{}",
        s.feels_like,
        cfg.temp_unit.from_kelvin(cur.feels_like).round() as i32,
        cfg.temp_unit.suffix()
    );
    draw_text(
        target,
        &feels,
        Point::new(295, 140),
        fonts.body,
        Alignment::Center,
        FOREGROUND,
    )?;

    // 2. Condition description, up to two lines.
    let desc = text_layout::wrap(&cur.condition.description, 180, 2, |t| {
        text_width(fonts.body, t)
    });
    for (i, line) in desc.iter().enumerate() {
        draw_text(
            target,
            line,
            Point::new(295, 168 + i as i32 * 20),
            fonts.body,
            Alignment::Center,
            FOREGROUND,
        )?;
    }

    // 3. Metric grid, two columns and four rows.
    let tz = snap.timezone_offset;
    metric(target, fonts, 20, 260, s.sunrise, &clock_hm(cur.sunrise, tz))?;
    metric(target, fonts, 200, 260, s.sunset, &clock_hm(cur.sunset, tz))?;

    let speed = cfg.speed_unit.from_mps(cur.wind_speed).round() as i32;
    let wind_value = match cfg.wind_indicator {
        WindIndicator::Number => {
            format!("{}{} {}\u{b0}", speed, cfg.speed_unit.suffix(), cur.wind_deg)
        }
        WindIndicator::Arrow | WindIndicator::None => {
            format!("{}{}", speed, cfg.speed_unit.suffix())
        }
        named => format!(
            "{}{} {}",
            speed,
            cfg.speed_unit.suffix(),
            named
                .compass_points()
                .map(|points| locale::compass_name(cfg.locale, cur.wind_deg, points))
                .unwrap_or_default()
        ),
    };
    metric(target, fonts, 20, 302, s.wind, &wind_value)?;
    if cfg.wind_indicator == WindIndicator::Arrow {
        icons::wind_arrow(
            target,
            Point::new(28 + text_width(fonts.body, &wind_value) as i32, 296),
            22,
            cfg.wind_icon_precision.snap(cur.wind_deg),
            FOREGROUND,
        )?;
    }
    metric(target, fonts, 200, 302, s.humidity, &format!("{}%", cur.humidity))?;

    metric(target, fonts, 20, 344, s.uv_index, &format!("{:.0}", cur.uvi))?;
    let vis = format!(
        "{:.1}{}",
        cfg.distance_unit.from_meters(cur.visibility as f32),
        cfg.distance_unit.suffix()
    );
    metric(target, fonts, 200, 344, s.visibility, &vis)?;

    let aqi = data
        .air
        .and_then(|a| a.samples.first())
        .map(|sample| locale::aqi_desc(cfg.locale, sample.aqi))
        .unwrap_or("--");
    metric(target, fonts, 20, 386, s.air_quality, aqi)?;

    let indoor = match (data.indoor.temperature_c, data.indoor.humidity_pct) {
        (Some(t), Some(h)) => format!(
            "{:.0}{} / {:.0}%",
            cfg.temp_unit.from_kelvin(t + 273.15),
            cfg.temp_unit.suffix(),
            h
        ),
        (Some(t), None) => format!(
            "{:.0}{} / --",
            cfg.temp_unit.from_kelvin(t + 273.15),
            cfg.temp_unit.suffix()
        ),
        _ => "--".to_string(),
    };
    metric(target, fonts, 200, 386, s.indoor, &indoor)
}

fn metric<D>(
    target: &mut D,
    fonts: &FontSet,
    x: i32,
    y: i32,
    label: &str,
    value: &str,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Color>,
{
    draw_text(
        target,
        value,
        Point::new(x, y),
        fonts.body,
        Alignment::Left,
        FOREGROUND,
    )?;
    draw_text(
        target,
        label,
        Point::new(x, y + 16),
        fonts.small,
        Alignment::Left,
        FOREGROUND,
    )
}

/// Temperature line and precipitation bars over the coming hours. Skipped
/// entirely when the provider sends no hourly data.
fn draw_outlook_graph<D>(
    target: &mut D,
    cfg: &Config,
    data: &DashboardData,
    alerts_shown: bool,
    fonts: &FontSet,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Color>,
{
    let snap = data.snapshot;
    let hours = (cfg.hourly_graph_hours as usize).min(snap.hourly.len());
    if hours < 2 {
        return Ok(());
    }

    let x0 = 444;
    let x1 = 784;
    let y0 = if alerts_shown { 132 } else { 68 };
    let y1 = 214;
    let axis = PrimitiveStyle::with_stroke(FOREGROUND, 1);

    Line::new(Point::new(x0, y0), Point::new(x0, y1))
        .into_styled(axis)
        .draw(target)?;
    Line::new(Point::new(x0, y1), Point::new(x1, y1))
        .into_styled(axis)
        .draw(target)?;

    // 1. Temperature scale, padded so a flat series stays mid-graph.
    let temps: Vec<f32> = snap.hourly[..hours]
        .iter()
        .map(|h| cfg.temp_unit.from_kelvin(h.temp))
        .collect();
    let mut t_min = f32::MAX;
    let mut t_max = f32::MIN;
    for t in &temps {
        t_min = t_min.min(*t);
        t_max = t_max.max(*t);
    }
    let span = (t_max - t_min).max(1.0);
    let map_y = |t: f32| y1 - ((t - t_min) / span * (y1 - y0 - 8) as f32) as i32 - 4;

    draw_text(
        target,
        &format!("{}\u{b0}", t_max.round() as i32),
        Point::new(x0 - 4, y0 + 8),
        fonts.small,
        Alignment::Right,
        FOREGROUND,
    )?;
    draw_text(
        target,
        &format!("{}\u{b0}", t_min.round() as i32),
        Point::new(x0 - 4, y1),
        fonts.small,
        Alignment::Right,
        FOREGROUND,
    )?;

    // 2. Precipitation bars behind the temperature line.
    let precip: Vec<f32> = snap.hourly[..hours]
        .iter()
        .map(|h| match cfg.hourly_precip_unit {
            PrecipUnit::Pop => h.pop * 100.0,
            unit => unit.from_millimeters(h.rain_1h + h.snow_1h),
        })
        .collect();
    let p_scale = match cfg.hourly_precip_unit {
        PrecipUnit::Pop => 100.0f32,
        _ => precip.iter().fold(1.0f32, |acc, p| acc.max(*p)),
    };

    let slot = (x1 - x0) as f32 / hours as f32;
    let bar_w = ((slot * 0.6) as u32).max(1);
    for (i, p) in precip.iter().enumerate() {
        if *p <= 0.0 {
            continue;
        }
        let h = ((p / p_scale) * (y1 - y0 - 8) as f32) as u32;
        if h == 0 {
            continue;
        }
        let x = x0 + (slot * (i as f32 + 0.5)) as i32 - (bar_w as i32) / 2;
        Rectangle::new(Point::new(x, y1 - h as i32), Size::new(bar_w, h))
            .into_styled(PrimitiveStyle::with_fill(FOREGROUND))
            .draw(target)?;
    }

    // 3. Temperature polyline.
    let step = (x1 - x0) as f32 / (hours - 1) as f32;
    let line = PrimitiveStyle::with_stroke(FOREGROUND, 2);
    for i in 1..hours {
        let a = Point::new(x0 + (step * (i - 1) as f32) as i32, map_y(temps[i - 1]));
        let b = Point::new(x0 + (step * i as f32) as i32, map_y(temps[i]));
        Line::new(a, b).into_styled(line).draw(target)?;
    }

    // 4. Hour labels along the bottom.
    let label_step = (hours / 6).max(1);
    for i in (0..hours).step_by(label_step) {
        let hour = local_hour(snap.hourly[i].dt, snap.timezone_offset);
        let x = x0 + (step * i as f32) as i32;
        draw_text(
            target,
            &format!("{:02}", hour),
            Point::new(x, y1 + 14),
            fonts.small,
            Alignment::Center,
            FOREGROUND,
        )?;
    }
    Ok(())
}

/// Five-column daily strip: weekday, icon, high/low.
fn draw_forecast_strip<D>(
    target: &mut D,
    cfg: &Config,
    data: &DashboardData,
    fonts: &FontSet,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Color>,
{
    let snap = data.snapshot;
    let s = cfg.locale.strings();

    for (i, day) in snap.daily.iter().take(5).enumerate() {
        let cx = 448 + i as i32 * 76;

        let weekday = weekday_index(day, i, snap.timezone_offset, &data.now)
            .map(|w| s.weekdays_short[w])
            .unwrap_or("");
        draw_text(
            target,
            weekday,
            Point::new(cx, 266),
            fonts.body,
            Alignment::Center,
            FOREGROUND,
        )?;

        icons::condition(target, Point::new(cx, 310), 64, &day.condition.icon, FOREGROUND)?;

        let temps = format!(
            "{}\u{b0}/{}\u{b0}",
            cfg.temp_unit.from_kelvin(day.temp_max).round() as i32,
            cfg.temp_unit.from_kelvin(day.temp_min).round() as i32
        );
        draw_text(
            target,
            &temps,
            Point::new(cx, 362),
            fonts.body,
            Alignment::Center,
            FOREGROUND,
        )?;

        // Precipitation readout under the temps, omitted on dry days.
        let precip = match cfg.daily_precip_unit {
            PrecipUnit::Pop => (day.pop > 0.0).then(|| format!("{:.0}%", day.pop * 100.0)),
            unit => {
                let amount = unit.from_millimeters(day.rain + day.snow);
                (amount > 0.0).then(|| format!("{:.1}{}", amount, unit.suffix()))
            }
        };
        if let Some(precip) = precip {
            draw_text(
                target,
                &precip,
                Point::new(cx, 382),
                fonts.small,
                Alignment::Center,
                FOREGROUND,
            )?;
        }
    }
    Ok(())
}

/// Up to two active alerts between the date line and the outlook graph.
fn draw_alerts<D>(target: &mut D, data: &DashboardData, fonts: &FontSet) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Color>,
{
    for (i, alert) in data.snapshot.alerts.iter().take(2).enumerate() {
        let y = 78 + i as i32 * 28;
        icons::warning(target, Point::new(412, y - 17), ACCENT)?;
        let line = text_layout::wrap(&alert.event, 336, 1, |t| text_width(fonts.body, t))
            .into_iter()
            .next()
            .unwrap_or_default();
        draw_text(
            target,
            &line,
            Point::new(444, y),
            fonts.body,
            Alignment::Left,
            ACCENT,
        )?;
    }
    Ok(())
}

/// Bottom status bar, laid out right to left: battery, link quality,
/// refresh time, then an error note when one is pending.
pub fn draw_status_bar<D>(
    target: &mut D,
    cfg: &Config,
    status: &str,
    refresh_time: &str,
    rssi: i32,
    battery_millivolts: Option<u32>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Color>,
{
    const SP: i32 = 2;
    let fonts = font_set(cfg.font);
    let baseline = DISPLAY_HEIGHT - 1 - 2;
    let mut pos = DISPLAY_WIDTH - 2;

    // 1. Battery, percent and voltage.
    if let Some(mv) = battery_millivolts {
        let percent = battery::percent(mv);
        let color = if mv < battery::WARN_MV { ACCENT } else { FOREGROUND };
        let text = format!("{}% ({:.2}v)", percent, (mv as f32 / 10.0).round() / 100.0);
        draw_text(
            target,
            &text,
            Point::new(pos, baseline),
            fonts.small,
            Alignment::Right,
            color,
        )?;
        pos -= text_width(fonts.small, &text) as i32 + 25;
        icons::battery(
            target,
            Point::new(pos, DISPLAY_HEIGHT - 1 - 17),
            battery::glyph_bars(percent),
            color,
        )?;
        pos -= SP + 9;
    }

    // 2. Link quality.
    let desc = locale::wifi_desc(cfg.locale, rssi);
    let text = if rssi != 0 {
        format!("{} ({}dBm)", desc, rssi)
    } else {
        desc.to_string()
    };
    let color = if rssi >= locale::WIFI_WEAK_DBM { FOREGROUND } else { ACCENT };
    draw_text(
        target,
        &text,
        Point::new(pos, baseline),
        fonts.small,
        Alignment::Right,
        color,
    )?;
    pos -= text_width(fonts.small, &text) as i32 + 19;
    icons::wifi(target, Point::new(pos, DISPLAY_HEIGHT - 1 - 13), rssi, color)?;
    pos -= SP + 8;

    // 3. Refresh time.
    draw_text(
        target,
        refresh_time,
        Point::new(pos, baseline),
        fonts.small,
        Alignment::Right,
        FOREGROUND,
    )?;
    pos -= text_width(fonts.small, refresh_time) as i32 + 25;
    icons::refresh(target, Point::new(pos, DISPLAY_HEIGHT - 1 - 21), FOREGROUND)?;
    pos -= SP;

    // 4. Pending status note.
    if !status.is_empty() {
        draw_text(
            target,
            status,
            Point::new(pos, baseline),
            fonts.small,
            Alignment::Right,
            ACCENT,
        )?;
        pos -= text_width(fonts.small, status) as i32 + 24;
        icons::warning(target, Point::new(pos, DISPLAY_HEIGHT - 1 - 18), ACCENT)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::{Alert, Condition, Current, Hourly};
    use epd_waveshare::epd7in5_v2::Display7in5;
    use epd_waveshare::prelude::*;

    fn blank() -> Box<Display7in5> {
        Box::<Display7in5>::default()
    }

    fn painted(display: &Display7in5) -> usize {
        display
            .buffer()
            .iter()
            .map(|b| b.count_zeros() as usize)
            .sum()
    }

    fn condition(id: u16, icon: &str, desc: &str) -> Condition {
        Condition {
            id,
            main: String::new(),
            description: desc.to_string(),
            icon: icon.to_string(),
        }
    }

    fn full_snapshot() -> Snapshot {
        let hourly = (0..24)
            .map(|i| Hourly {
                dt: 1_718_000_000 + i * 3_600,
                temp: 288.0 + (i % 8) as f32,
                humidity: 60,
                pop: if i % 5 == 0 { 0.6 } else { 0.0 },
                rain_1h: 0.0,
                snow_1h: 0.0,
                wind_speed: 3.0,
                wind_deg: 200,
                condition: condition(801, "02d", "few clouds"),
            })
            .collect();
        let daily = (0..8)
            .map(|i| Daily {
                dt: 1_718_000_000 + i * 86_400,
                sunrise: 1_718_000_000 + i * 86_400 + 20_000,
                sunset: 1_718_000_000 + i * 86_400 + 70_000,
                temp_min: 284.0,
                temp_max: 295.0,
                humidity: 55,
                pop: 0.3,
                rain: 0.8,
                snow: 0.0,
                wind_speed: 4.0,
                wind_deg: 180,
                condition: condition(500, "10d", "light rain"),
            })
            .collect();
        Snapshot {
            lat: 40.7,
            lon: -74.0,
            timezone: "America/New_York".to_string(),
            timezone_offset: -14_400,
            current: Current {
                dt: 1_718_000_000,
                sunrise: 1_718_000_000 + 20_000,
                sunset: 1_718_000_000 + 70_000,
                temp: 291.15,
                feels_like: 290.0,
                humidity: 63,
                dew_point: 284.0,
                clouds: 40,
                uvi: 4.2,
                visibility: 10_000,
                wind_speed: 5.0,
                wind_gust: 8.0,
                wind_deg: 220,
                rain_1h: 0.0,
                snow_1h: 0.0,
                condition: condition(801, "02d", "few clouds"),
            },
            hourly,
            daily,
            alerts: vec![Alert {
                sender_name: "NWS".to_string(),
                event: "Severe Thunderstorm Warning for the Metropolitan Area".to_string(),
                start: 1_718_000_000,
                end: 1_718_090_000,
                description: "take cover".to_string(),
                tags: vec!["Thunderstorm".to_string()],
            }],
        }
    }

    fn noon() -> LocalTime {
        LocalTime {
            year: 2024,
            month: 6,
            day: 10,
            weekday: 1,
            hour: 12,
            min: 30,
            sec: 0,
        }
    }

    #[test]
    fn dashboard_renders_a_full_frame() {
        let snapshot = full_snapshot();
        let air = AirQuality {
            lat: 40.7,
            lon: -74.0,
            samples: vec![crate::weather::AirSample {
                dt: 1_718_000_000,
                aqi: 2,
                ..Default::default()
            }],
        };
        let data = DashboardData {
            snapshot: &snapshot,
            air: Some(&air),
            indoor: IndoorReading {
                temperature_c: Some(22.5),
                humidity_pct: Some(48.0),
            },
            city: "New York",
            now: Some(noon()),
            refresh_time: "12:30",
            status: "",
            rssi: -58,
            battery_millivolts: Some(3900),
        };

        let mut display = blank();
        draw_dashboard(&mut *display, &Config::default(), &data).unwrap();
        assert!(painted(&display) > 2_000);
    }

    #[test]
    fn dashboard_copes_with_sparse_provider_data() {
        // Positional daily rows, no hourly series, no air samples.
        let snapshot = Snapshot {
            current: Current {
                temp: 301.65,
                condition: condition(210, "11d", "雷阵雨"),
                ..Current::default()
            },
            daily: (0..2)
                .map(|_| Daily {
                    temp_min: 295.15,
                    temp_max: 303.15,
                    condition: condition(801, "02d", "多云"),
                    ..Daily::default()
                })
                .collect(),
            ..Snapshot::default()
        };
        let data = DashboardData {
            snapshot: &snapshot,
            air: None,
            indoor: IndoorReading::default(),
            city: "深圳",
            now: Some(noon()),
            refresh_time: "12:30",
            status: "",
            rssi: -71,
            battery_millivolts: None,
        };

        let mut display = blank();
        draw_dashboard(&mut *display, &Config::default(), &data).unwrap();
        assert!(painted(&display) > 500);
    }

    #[test]
    fn status_bar_marks_a_pending_status() {
        let cfg = Config::default();
        let mut plain = blank();
        draw_status_bar(&mut *plain, &cfg, "", "06:00", -55, Some(3700)).unwrap();
        let mut flagged = blank();
        draw_status_bar(&mut *flagged, &cfg, "Low Battery", "06:00", -55, Some(3450)).unwrap();
        assert!(painted(&flagged) > painted(&plain));
    }

    #[test]
    fn error_screen_wraps_a_single_long_line() {
        let mut display = blank();
        draw_error(
            &mut *display,
            ErrorGlyph::WifiOff,
            "Network Not Available",
            "",
        )
        .unwrap();
        assert!(painted(&display) > 500);

        let mut display = blank();
        draw_error(&mut *display, ErrorGlyph::CloudDown, "One Call 3.0 API", "401: Unauthorized")
            .unwrap();
        assert!(painted(&display) > 500);
    }

    #[test]
    fn rejected_configuration_gets_its_own_screen() {
        let mut display = blank();
        draw_error(
            &mut *display,
            ErrorGlyph::ConfigInvalid,
            "Invalid Configuration",
            "panel 7c_f has no driver in this build",
        )
        .unwrap();
        assert!(painted(&display) > 500);
    }

    #[test]
    fn graph_skips_without_hourly_data() {
        let snapshot = Snapshot::default();
        let data = DashboardData {
            snapshot: &snapshot,
            air: None,
            indoor: IndoorReading::default(),
            city: "",
            now: None,
            refresh_time: "unknown",
            status: "",
            rssi: 0,
            battery_millivolts: None,
        };
        let cfg = Config::default();
        let mut display = blank();
        draw_outlook_graph(&mut *display, &cfg, &data, false, &font_set(cfg.font)).unwrap();
        assert_eq!(painted(&display), 0);
    }
}
