use core::f32::consts::PI;

use embedded_graphics::{
    prelude::*,
    primitives::{Arc, Circle, Line, PrimitiveStyle, Rectangle, Triangle},
};
use epd_waveshare::color::Color;

// Glyphs for the panel, drawn from primitives so every size from the
// 16 px status bar up to the 196 px error screen comes from one code
// path. All drawing happens in a single foreground color on the panel
// background; the moon crescent is the only glyph that paints over
// itself with the background color.

/// Full-screen error glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorGlyph {
    BatteryAlert,
    WifiOff,
    CloudDown,
    TimeSync,
    ConfigInvalid,
}

fn background_of(color: Color) -> Color {
    match color {
        Color::Black => Color::White,
        Color::White => Color::Black,
    }
}

fn stroke(color: Color, size: u32) -> PrimitiveStyle<Color> {
    PrimitiveStyle::with_stroke(color, (size / 24).max(1))
}

fn fill(color: Color) -> PrimitiveStyle<Color> {
    PrimitiveStyle::with_fill(color)
}

fn radial(center: Point, radius: f32, angle: f32) -> Point {
    let (sin, cos) = angle.sin_cos();
    Point::new(
        center.x + (cos * radius).round() as i32,
        center.y + (sin * radius).round() as i32,
    )
}

// ── Weather building blocks ─────────────────────────────────────────

fn sun<D: DrawTarget<Color = Color>>(
    target: &mut D,
    center: Point,
    size: u32,
    color: Color,
) -> Result<(), D::Error> {
    let s = size as i32;
    Circle::with_center(center, size / 2)
        .into_styled(fill(color))
        .draw(target)?;
    let ray = stroke(color, size);
    for k in 0..8 {
        let a = k as f32 * (PI / 4.0);
        Line::new(
            radial(center, s as f32 * 0.33, a),
            radial(center, s as f32 * 0.48, a),
        )
        .into_styled(ray)
        .draw(target)?;
    }
    Ok(())
}

fn moon<D: DrawTarget<Color = Color>>(
    target: &mut D,
    center: Point,
    size: u32,
    color: Color,
) -> Result<(), D::Error> {
    let s = size as i32;
    Circle::with_center(center, size * 5 / 8)
        .into_styled(fill(color))
        .draw(target)?;
    Circle::with_center(Point::new(center.x + s / 8, center.y - s / 8), size / 2)
        .into_styled(fill(background_of(color)))
        .draw(target)?;
    Ok(())
}

/// Cloud silhouette. The bounding box is `width` wide and half as tall.
fn cloud<D: DrawTarget<Color = Color>>(
    target: &mut D,
    top_left: Point,
    width: u32,
    color: Color,
) -> Result<(), D::Error> {
    let w = width as i32;
    let style = fill(color);
    Circle::new(Point::new(top_left.x, top_left.y + w / 6), width / 3)
        .into_styled(style)
        .draw(target)?;
    Circle::new(Point::new(top_left.x + w / 5, top_left.y), width / 2)
        .into_styled(style)
        .draw(target)?;
    Circle::new(
        Point::new(top_left.x + w / 2, top_left.y + w / 8),
        width * 2 / 5,
    )
    .into_styled(style)
    .draw(target)?;
    Rectangle::new(
        Point::new(top_left.x + w / 6, top_left.y + w / 4),
        Size::new(width * 2 / 3, width / 4),
    )
    .into_styled(style)
    .draw(target)?;
    Ok(())
}

fn rain<D: DrawTarget<Color = Color>>(
    target: &mut D,
    top_left: Point,
    width: u32,
    color: Color,
    drops: i32,
) -> Result<(), D::Error> {
    let w = width as i32;
    let style = stroke(color, width);
    for k in 0..drops {
        let x = top_left.x + w / 4 + k * w / (drops + 1);
        Line::new(
            Point::new(x, top_left.y),
            Point::new(x - w / 12, top_left.y + w / 6),
        )
        .into_styled(style)
        .draw(target)?;
    }
    Ok(())
}

fn snowflake<D: DrawTarget<Color = Color>>(
    target: &mut D,
    center: Point,
    size: u32,
    color: Color,
) -> Result<(), D::Error> {
    let style = stroke(color, size);
    let r = size as f32 * 0.45;
    for k in 0..3 {
        let a = k as f32 * (PI / 3.0);
        Line::new(radial(center, r, a), radial(center, r, a + PI))
            .into_styled(style)
            .draw(target)?;
    }
    Ok(())
}

fn lightning<D: DrawTarget<Color = Color>>(
    target: &mut D,
    top_left: Point,
    size: u32,
    color: Color,
) -> Result<(), D::Error> {
    let s = size as i32;
    let style = fill(color);
    Triangle::new(
        Point::new(top_left.x + s * 5 / 8, top_left.y),
        Point::new(top_left.x + s / 4, top_left.y + s * 5 / 8),
        Point::new(top_left.x + s * 9 / 16, top_left.y + s * 9 / 16),
    )
    .into_styled(style)
    .draw(target)?;
    Triangle::new(
        Point::new(top_left.x + s * 11 / 16, top_left.y + s * 3 / 8),
        Point::new(top_left.x + s * 3 / 8, top_left.y + s * 7 / 16),
        Point::new(top_left.x + s * 7 / 16, top_left.y + s),
    )
    .into_styled(style)
    .draw(target)?;
    Ok(())
}

fn mist<D: DrawTarget<Color = Color>>(
    target: &mut D,
    center: Point,
    size: u32,
    color: Color,
) -> Result<(), D::Error> {
    let s = size as i32;
    let style = stroke(color, size);
    for k in 0..4 {
        let y = center.y - s * 3 / 16 + k * s / 8;
        let inset = if k % 2 == 0 { s / 8 } else { 0 };
        Line::new(
            Point::new(center.x - s * 3 / 8 + inset, y),
            Point::new(center.x + s * 3 / 8 - (s / 8 - inset), y),
        )
        .into_styled(style)
        .draw(target)?;
    }
    Ok(())
}

// ── Condition icons ─────────────────────────────────────────────────

/// Draw the condition icon for an icon key like "01d" or "10n", centered
/// in a square of the given size. Unknown keys fall back to the cloud.
pub fn condition<D: DrawTarget<Color = Color>>(
    target: &mut D,
    center: Point,
    size: u32,
    key: &str,
    color: Color,
) -> Result<(), D::Error> {
    let s = size as i32;
    let night = key.ends_with('n');
    let code = key.get(..2).unwrap_or("03");

    let celestial = |target: &mut D, center: Point, size: u32| {
        if night {
            moon(target, center, size, color)
        } else {
            sun(target, center, size, color)
        }
    };

    match code {
        "01" => celestial(target, center, size),
        "02" => {
            celestial(
                target,
                Point::new(center.x - s / 8, center.y - s / 8),
                size * 3 / 4,
            )?;
            cloud(
                target,
                Point::new(center.x - s / 4, center.y - s / 16),
                size * 9 / 16,
                color,
            )
        }
        "03" => cloud(
            target,
            Point::new(center.x - s * 3 / 8, center.y - s * 3 / 16),
            size * 3 / 4,
            color,
        ),
        "04" => {
            cloud(
                target,
                Point::new(center.x - s / 8, center.y - s * 5 / 16),
                size / 2,
                color,
            )?;
            cloud(
                target,
                Point::new(center.x - s * 3 / 8, center.y - s / 8),
                size * 11 / 16,
                color,
            )
        }
        "09" | "10" => {
            if code == "10" {
                celestial(
                    target,
                    Point::new(center.x + s / 8, center.y - s / 4),
                    size / 2,
                )?;
            }
            cloud(
                target,
                Point::new(center.x - s * 3 / 8, center.y - s / 4),
                size * 3 / 4,
                color,
            )?;
            rain(
                target,
                Point::new(center.x - s * 3 / 8, center.y + s / 4),
                size * 3 / 4,
                color,
                3,
            )
        }
        "11" => {
            cloud(
                target,
                Point::new(center.x - s * 3 / 8, center.y - s * 5 / 16),
                size * 3 / 4,
                color,
            )?;
            lightning(
                target,
                Point::new(center.x - s * 3 / 16, center.y + s / 16),
                size * 3 / 8,
                color,
            )
        }
        "13" => snowflake(target, center, size, color),
        "50" => mist(target, center, size, color),
        _ => cloud(
            target,
            Point::new(center.x - s * 3 / 8, center.y - s * 3 / 16),
            size * 3 / 4,
            color,
        ),
    }
}

/// Arrow for the wind direction, pointing the way the wind blows. The
/// direction is degrees clockwise from north, i.e. where the wind comes
/// from, so the arrow points the opposite way.
pub fn wind_arrow<D: DrawTarget<Color = Color>>(
    target: &mut D,
    center: Point,
    size: u32,
    from_degrees: u16,
    color: Color,
) -> Result<(), D::Error> {
    let to = (f32::from(from_degrees) + 180.0).to_radians();
    // Compass north is up, which is negative y on the panel.
    let (dx, dy) = (to.sin(), -to.cos());
    let r = size as f32 * 0.45;

    let tip = Point::new(
        center.x + (dx * r).round() as i32,
        center.y + (dy * r).round() as i32,
    );
    let tail = Point::new(
        center.x - (dx * r).round() as i32,
        center.y - (dy * r).round() as i32,
    );
    Line::new(tail, tip)
        .into_styled(stroke(color, size))
        .draw(target)?;

    let head = size as f32 * 0.35;
    let base = Point::new(
        center.x + (dx * (r - head)).round() as i32,
        center.y + (dy * (r - head)).round() as i32,
    );
    let half = head * 0.45;
    let wing = |s: f32| {
        Point::new(
            base.x + (-dy * s).round() as i32,
            base.y + (dx * s).round() as i32,
        )
    };
    Triangle::new(tip, wing(half), wing(-half))
        .into_styled(fill(color))
        .draw(target)
}

// ── Status bar glyphs ───────────────────────────────────────────────

/// 24 px battery, lying on its side, with 0 to 7 charge bars.
pub fn battery<D: DrawTarget<Color = Color>>(
    target: &mut D,
    top_left: Point,
    bars: u8,
    color: Color,
) -> Result<(), D::Error> {
    Rectangle::new(Point::new(top_left.x, top_left.y + 6), Size::new(20, 12))
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(target)?;
    Rectangle::new(Point::new(top_left.x + 20, top_left.y + 9), Size::new(2, 6))
        .into_styled(fill(color))
        .draw(target)?;
    for i in 0..i32::from(bars.min(7)) {
        Rectangle::new(
            Point::new(top_left.x + 2 + i * 2, top_left.y + 8),
            Size::new(2, 8),
        )
        .into_styled(fill(color))
        .draw(target)?;
    }
    Ok(())
}

/// 16 px signal fan. Arc count tracks the RSSI bands; an RSSI of zero
/// means no link and draws a cross instead.
pub fn wifi<D: DrawTarget<Color = Color>>(
    target: &mut D,
    top_left: Point,
    rssi: i32,
    color: Color,
) -> Result<(), D::Error> {
    let base = Point::new(top_left.x + 8, top_left.y + 13);
    Circle::with_center(base, 3)
        .into_styled(fill(color))
        .draw(target)?;

    if rssi == 0 {
        let style = PrimitiveStyle::with_stroke(color, 2);
        Line::new(
            Point::new(top_left.x + 3, top_left.y + 2),
            Point::new(top_left.x + 13, top_left.y + 10),
        )
        .into_styled(style)
        .draw(target)?;
        Line::new(
            Point::new(top_left.x + 13, top_left.y + 2),
            Point::new(top_left.x + 3, top_left.y + 10),
        )
        .into_styled(style)
        .draw(target)?;
        return Ok(());
    }

    let arcs = if rssi >= -50 {
        3
    } else if rssi >= -60 {
        2
    } else if rssi >= -67 {
        1
    } else {
        0
    };
    for k in 1..=arcs {
        Arc::with_center(
            base,
            4 + k * 4,
            Angle::from_degrees(45.0),
            Angle::from_degrees(90.0),
        )
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(target)?;
    }
    Ok(())
}

/// 32 px refresh arrow.
pub fn refresh<D: DrawTarget<Color = Color>>(
    target: &mut D,
    top_left: Point,
    color: Color,
) -> Result<(), D::Error> {
    let center = Point::new(top_left.x + 16, top_left.y + 16);
    Arc::with_center(
        center,
        20,
        Angle::from_degrees(80.0),
        Angle::from_degrees(280.0),
    )
    .into_styled(PrimitiveStyle::with_stroke(color, 3))
    .draw(target)?;
    Triangle::new(
        Point::new(center.x + 13, center.y - 4),
        Point::new(center.x + 5, center.y - 4),
        Point::new(center.x + 9, center.y + 4),
    )
    .into_styled(fill(color))
    .draw(target)
}

/// 24 px warning triangle.
pub fn warning<D: DrawTarget<Color = Color>>(
    target: &mut D,
    top_left: Point,
    color: Color,
) -> Result<(), D::Error> {
    Triangle::new(
        Point::new(top_left.x + 12, top_left.y + 2),
        Point::new(top_left.x + 1, top_left.y + 21),
        Point::new(top_left.x + 23, top_left.y + 21),
    )
    .into_styled(PrimitiveStyle::with_stroke(color, 2))
    .draw(target)?;
    Line::new(
        Point::new(top_left.x + 12, top_left.y + 9),
        Point::new(top_left.x + 12, top_left.y + 15),
    )
    .into_styled(PrimitiveStyle::with_stroke(color, 2))
    .draw(target)?;
    Rectangle::new(Point::new(top_left.x + 11, top_left.y + 17), Size::new(2, 2))
        .into_styled(fill(color))
        .draw(target)
}

// ── Error screen glyphs ─────────────────────────────────────────────

/// Draw one of the full-screen error glyphs centered in a square of the
/// given size.
pub fn error_glyph<D: DrawTarget<Color = Color>>(
    target: &mut D,
    center: Point,
    size: u32,
    glyph: ErrorGlyph,
    color: Color,
) -> Result<(), D::Error> {
    let s = size as i32;
    match glyph {
        ErrorGlyph::BatteryAlert => {
            Rectangle::new(
                Point::new(center.x - s * 3 / 8, center.y - s / 4),
                Size::new(size * 11 / 16, size / 2),
            )
            .into_styled(stroke(color, size))
            .draw(target)?;
            Rectangle::new(
                Point::new(center.x + s * 5 / 16, center.y - s / 8),
                Size::new(size / 16, size / 4),
            )
            .into_styled(fill(color))
            .draw(target)?;
            exclamation(target, center, size / 3, color)
        }
        ErrorGlyph::WifiOff => {
            let base = Point::new(center.x, center.y + s * 3 / 8);
            Circle::with_center(base, size / 12)
                .into_styled(fill(color))
                .draw(target)?;
            for k in 1..=3u32 {
                Arc::with_center(
                    base,
                    size / 6 + k * size / 4,
                    Angle::from_degrees(45.0),
                    Angle::from_degrees(90.0),
                )
                .into_styled(stroke(color, size))
                .draw(target)?;
            }
            let bar = PrimitiveStyle::with_stroke(color, (size / 20).max(2));
            Line::new(
                Point::new(center.x - s * 3 / 8, center.y - s * 3 / 8),
                Point::new(center.x + s * 3 / 8, center.y + s * 3 / 8),
            )
            .into_styled(bar)
            .draw(target)
        }
        ErrorGlyph::CloudDown => {
            cloud(
                target,
                Point::new(center.x - s * 3 / 8, center.y - s * 5 / 16),
                size * 3 / 4,
                color,
            )?;
            let style = PrimitiveStyle::with_stroke(color, (size / 20).max(2));
            Line::new(
                Point::new(center.x, center.y + s / 8),
                Point::new(center.x, center.y + s * 3 / 8),
            )
            .into_styled(style)
            .draw(target)?;
            Triangle::new(
                Point::new(center.x - s / 8, center.y + s * 5 / 16),
                Point::new(center.x + s / 8, center.y + s * 5 / 16),
                Point::new(center.x, center.y + s * 7 / 16),
            )
            .into_styled(fill(color))
            .draw(target)
        }
        ErrorGlyph::TimeSync => {
            Circle::with_center(center, size * 3 / 4)
                .into_styled(stroke(color, size))
                .draw(target)?;
            let hands = PrimitiveStyle::with_stroke(color, (size / 24).max(2));
            Line::new(center, Point::new(center.x, center.y - s / 4))
                .into_styled(hands)
                .draw(target)?;
            Line::new(center, Point::new(center.x + s * 3 / 16, center.y + s / 16))
                .into_styled(hands)
                .draw(target)?;
            Arc::with_center(
                center,
                size * 15 / 16,
                Angle::from_degrees(300.0),
                Angle::from_degrees(120.0),
            )
            .into_styled(stroke(color, size))
            .draw(target)
        }
        ErrorGlyph::ConfigInvalid => {
            Triangle::new(
                Point::new(center.x, center.y - s / 2),
                Point::new(center.x - s / 2, center.y + s * 3 / 8),
                Point::new(center.x + s / 2, center.y + s * 3 / 8),
            )
            .into_styled(stroke(color, size))
            .draw(target)?;
            exclamation(
                target,
                Point::new(center.x, center.y + s / 16),
                size / 2,
                color,
            )
        }
    }
}

fn exclamation<D: DrawTarget<Color = Color>>(
    target: &mut D,
    center: Point,
    size: u32,
    color: Color,
) -> Result<(), D::Error> {
    let s = size as i32;
    let w = (size / 6).max(2);
    Line::new(
        Point::new(center.x, center.y - s / 2),
        Point::new(center.x, center.y + s / 6),
    )
    .into_styled(PrimitiveStyle::with_stroke(color, w))
    .draw(target)?;
    Rectangle::new(
        Point::new(center.x - (w as i32) / 2, center.y + s / 3),
        Size::new(w, w),
    )
    .into_styled(fill(color))
    .draw(target)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn every_condition_key_paints_something() {
        for key in [
            "01d", "01n", "02d", "02n", "03d", "04d", "09d", "10d", "10n", "11d", "13d", "50d",
            "??",
        ] {
            let mut display = blank();
            condition(&mut *display, Point::new(400, 240), 196, key, Color::Black).unwrap();
            assert!(painted(&display) > 0, "key {key} drew nothing");
        }
    }

    #[test]
    fn battery_bars_scale_with_charge() {
        let mut empty = blank();
        battery(&mut *empty, Point::new(100, 100), 0, Color::Black).unwrap();
        let mut full = blank();
        battery(&mut *full, Point::new(100, 100), 7, Color::Black).unwrap();
        assert!(painted(&full) > painted(&empty));
    }

    #[test]
    fn wifi_strength_adds_arcs() {
        let mut weak = blank();
        wifi(&mut *weak, Point::new(100, 100), -80, Color::Black).unwrap();
        let mut strong = blank();
        wifi(&mut *strong, Point::new(100, 100), -40, Color::Black).unwrap();
        assert!(painted(&strong) > painted(&weak));

        let mut off = blank();
        wifi(&mut *off, Point::new(100, 100), 0, Color::Black).unwrap();
        assert!(painted(&off) > 0);
    }

    #[test]
    fn wind_arrow_points_away_from_the_source() {
        // A north wind blows south, so the tip sits below the center.
        let mut display = blank();
        wind_arrow(&mut *display, Point::new(400, 240), 48, 0, Color::Black).unwrap();

        let buffer = display.buffer();
        let width_bytes = 800 / 8;
        let row_painted = |y: usize| {
            buffer[y * width_bytes..(y + 1) * width_bytes]
                .iter()
                .any(|&b| b != 0xFF)
        };
        assert!(row_painted(260), "no pixels south of center");
        assert!(!row_painted(216), "pixels north of the tail");
    }

    #[test]
    fn error_glyphs_paint_at_full_size() {
        for glyph in [
            ErrorGlyph::BatteryAlert,
            ErrorGlyph::WifiOff,
            ErrorGlyph::CloudDown,
            ErrorGlyph::TimeSync,
            ErrorGlyph::ConfigInvalid,
        ] {
            let mut display = blank();
            error_glyph(&mut *display, Point::new(400, 219), 196, glyph, Color::Black).unwrap();
            assert!(painted(&display) > 100);
        }
    }
}
