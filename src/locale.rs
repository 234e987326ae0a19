use crate::scheduler::LocalTime;

// Localized strings for everything the panel shows. Two locales are built
// in; the active one is a config category resolved at startup.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    EnUs,
    DeDe,
}

impl Locale {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "en_US" => Some(Locale::EnUs),
            "de_DE" => Some(Locale::DeDe),
            _ => None,
        }
    }

    pub fn strings(self) -> &'static Strings {
        match self {
            Locale::EnUs => &EN_US,
            Locale::DeDe => &DE_DE,
        }
    }

    /// Language tag for provider requests.
    pub fn owm_lang(self) -> &'static str {
        match self {
            Locale::EnUs => "en",
            Locale::DeDe => "de",
        }
    }
}

/// String table for one locale.
pub struct Strings {
    pub low_battery: &'static str,
    pub network_not_available: &'static str,
    pub wifi_connection_failed: &'static str,
    pub time_sync_failed: &'static str,
    pub invalid_config: &'static str,
    pub read_failed: &'static str,
    pub not_found: &'static str,
    pub unknown: &'static str,
    pub wifi_no_connection: &'static str,
    pub wifi_excellent: &'static str,
    pub wifi_good: &'static str,
    pub wifi_fair: &'static str,
    pub wifi_weak: &'static str,
    pub sunrise: &'static str,
    pub sunset: &'static str,
    pub feels_like: &'static str,
    pub humidity: &'static str,
    pub uv_index: &'static str,
    pub visibility: &'static str,
    pub air_quality: &'static str,
    pub indoor: &'static str,
    pub wind: &'static str,
    pub weekdays: [&'static str; 7],
    pub weekdays_short: [&'static str; 7],
    pub months: [&'static str; 12],
    pub aqi: [&'static str; 5],
    /// 32-point compass rose, index 0 = north, clockwise.
    pub compass: [&'static str; 32],
}

static EN_US: Strings = Strings {
    low_battery: "Low Battery",
    network_not_available: "Network Not Available",
    wifi_connection_failed: "WiFi Connection Failed",
    time_sync_failed: "Time Synchronization Failed",
    invalid_config: "Invalid Configuration",
    read_failed: "Read Failed",
    not_found: "Not Found",
    unknown: "unknown",
    wifi_no_connection: "No Connection",
    wifi_excellent: "Excellent",
    wifi_good: "Good",
    wifi_fair: "Fair",
    wifi_weak: "Weak",
    sunrise: "Sunrise",
    sunset: "Sunset",
    feels_like: "Feels Like",
    humidity: "Humidity",
    uv_index: "UV Index",
    visibility: "Visibility",
    air_quality: "Air Quality",
    indoor: "Indoor",
    wind: "Wind",
    weekdays: [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ],
    weekdays_short: ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
    months: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    aqi: ["Good", "Fair", "Moderate", "Poor", "Very Poor"],
    compass: [
        "N", "NbE", "NNE", "NEbN", "NE", "NEbE", "ENE", "EbN", "E", "EbS", "ESE", "SEbE", "SE",
        "SEbS", "SSE", "SbE", "S", "SbW", "SSW", "SWbS", "SW", "SWbW", "WSW", "WbS", "W", "WbN",
        "WNW", "NWbW", "NW", "NWbN", "NNW", "NbW",
    ],
};

static DE_DE: Strings = Strings {
    low_battery: "Batterie schwach",
    network_not_available: "Netzwerk nicht verf\u{fc}gbar",
    wifi_connection_failed: "WLAN-Verbindung fehlgeschlagen",
    time_sync_failed: "Zeitsynchronisierung fehlgeschlagen",
    invalid_config: "Ung\u{fc}ltige Konfiguration",
    read_failed: "Lesefehler",
    not_found: "nicht gefunden",
    unknown: "unbekannt",
    wifi_no_connection: "Keine Verbindung",
    wifi_excellent: "Ausgezeichnet",
    wifi_good: "Gut",
    wifi_fair: "M\u{e4}\u{df}ig",
    wifi_weak: "Schwach",
    sunrise: "Sonnenaufgang",
    sunset: "Sonnenuntergang",
    feels_like: "Gef\u{fc}hlt",
    humidity: "Luftfeuchte",
    uv_index: "UV-Index",
    visibility: "Sicht",
    air_quality: "Luftqualit\u{e4}t",
    indoor: "Innen",
    wind: "Wind",
    weekdays: [
        "Sonntag",
        "Montag",
        "Dienstag",
        "Mittwoch",
        "Donnerstag",
        "Freitag",
        "Samstag",
    ],
    weekdays_short: ["So", "Mo", "Di", "Mi", "Do", "Fr", "Sa"],
    months: [
        "Januar",
        "Februar",
        "M\u{e4}rz",
        "April",
        "Mai",
        "Juni",
        "Juli",
        "August",
        "September",
        "Oktober",
        "November",
        "Dezember",
    ],
    aqi: ["Gut", "Ordentlich", "M\u{e4}\u{df}ig", "Schlecht", "Sehr schlecht"],
    compass: [
        "N", "NzO", "NNO", "NOzN", "NO", "NOzO", "ONO", "OzN", "O", "OzS", "OSO", "SOzO", "SO",
        "SOzS", "SSO", "SzO", "S", "SzW", "SSW", "SWzS", "SW", "SWzW", "WSW", "WzS", "W", "WzN",
        "WNW", "NWzW", "NW", "NWzN", "NNW", "NzW",
    ],
};

// ── Formatting ──────────────────────────────────────────────────────

/// Date line under the city name, e.g. "Saturday, June 15" or
/// "Samstag, 15. Juni". Day-of-month is space padded and the doubled
/// space collapsed afterwards, single digit days render cleanly.
pub fn date_string(locale: Locale, t: &LocalTime) -> String {
    let s = locale.strings();
    let weekday = s.weekdays[t.weekday as usize % 7];
    let month = s.months[(t.month as usize).clamp(1, 12) - 1];
    let raw = match locale {
        Locale::EnUs => format!("{}, {} {:2}", weekday, month, t.day),
        Locale::DeDe => format!("{}, {:2}. {}", weekday, t.day, month),
    };
    raw.replace("  ", " ")
}

/// Timestamp next to the refresh glyph in the status bar. Falls back to a
/// placeholder when the clock was never synchronized.
pub fn refresh_time_string(locale: Locale, t: Option<&LocalTime>) -> String {
    match t {
        Some(t) => format!("{:02}:{:02}", t.hour, t.min),
        None => locale.strings().unknown.to_string(),
    }
}

/// Compass name for a wind direction, using 4, 8, 16 or 32 points.
pub fn compass_name(locale: Locale, degrees: u16, points: u16) -> &'static str {
    let points = match points {
        4 | 8 | 16 | 32 => points as usize,
        _ => 8,
    };
    let step = 360.0 / points as f32;
    let index = (f32::from(degrees % 360) / step).round() as usize % points;
    locale.strings().compass[index * (32 / points)]
}

/// Description of an air-quality index in 1..=5.
pub fn aqi_desc(locale: Locale, aqi: u8) -> &'static str {
    let idx = aqi.clamp(1, 5) as usize - 1;
    locale.strings().aqi[idx]
}

/// One line of text for an error code: HTTP statuses, transport errors in
/// -1..=-11, payload-parse failures offset from -256 and link failures
/// offset from -512.
pub fn error_phrase(locale: Locale, code: i32) -> &'static str {
    if code <= -512 {
        return wifi_status_phrase(locale, (-512 - code) as u8);
    }
    let (en, de) = if code <= -256 {
        match -256 - code {
            1 => ("Empty Input", "Leere Antwort"),
            2 => ("Incomplete Input", "Unvollst\u{e4}ndige Antwort"),
            3 => ("Invalid Input", "Ung\u{fc}ltige Antwort"),
            4 => ("No Memory", "Kein Speicher"),
            _ => ("Deserialization Failed", "Deserialisierung fehlgeschlagen"),
        }
    } else {
        match code {
            200 => ("OK", "OK"),
            400 => ("Bad Request", "Ung\u{fc}ltige Anfrage"),
            401 => ("Unauthorized", "Nicht autorisiert"),
            403 => ("Forbidden", "Verboten"),
            404 => ("Not Found", "Nicht gefunden"),
            -1 => ("Connection Refused", "Verbindung abgelehnt"),
            -2 => ("Send Header Failed", "Header senden fehlgeschlagen"),
            -3 => ("Send Payload Failed", "Daten senden fehlgeschlagen"),
            -4 => ("Not Connected", "Nicht verbunden"),
            -5 => ("Connection Lost", "Verbindung verloren"),
            -6 => ("No Stream", "Kein Datenstrom"),
            -7 => ("No HTTP Server", "Kein HTTP-Server"),
            -8 => ("Out of Memory", "Zu wenig RAM"),
            -9 => ("Transfer Encoding Error", "Kodierungsfehler"),
            -10 => ("Stream Write Error", "Schreibfehler"),
            -11 => ("Read Timeout", "Zeit\u{fc}berschreitung"),
            _ => ("HTTP Error", "HTTP Fehler"),
        }
    };
    match locale {
        Locale::EnUs => en,
        Locale::DeDe => de,
    }
}

/// Phrase for a Wi-Fi association state, mirroring the numeric states the
/// link layer reports (0 idle, 1 no SSID, 3 connected, 4 failed, 5 lost,
/// 6 disconnected).
pub fn wifi_status_phrase(locale: Locale, status: u8) -> &'static str {
    let (en, de) = match status {
        0 => ("Idle", "Inaktiv"),
        1 => ("No SSID Available", "SSID nicht verf\u{fc}gbar"),
        3 => ("Connected", "Verbunden"),
        4 => ("Connection Failed", "Verbindung fehlgeschlagen"),
        5 => ("Connection Lost", "Verbindung verloren"),
        6 => ("Disconnected", "Getrennt"),
        _ => ("Unknown", "Unbekannt"),
    };
    match locale {
        Locale::EnUs => en,
        Locale::DeDe => de,
    }
}

/// Weakest RSSI still described as "Fair". The status bar highlights
/// links below this edge, so the color switch and the descriptor agree.
pub const WIFI_WEAK_DBM: i32 = -67;

/// Signal-strength descriptor for the status bar.
pub fn wifi_desc(locale: Locale, rssi: i32) -> &'static str {
    let s = locale.strings();
    if rssi == 0 {
        s.wifi_no_connection
    } else if rssi >= -50 {
        s.wifi_excellent
    } else if rssi >= -60 {
        s.wifi_good
    } else if rssi >= WIFI_WEAK_DBM {
        s.wifi_fair
    } else {
        s.wifi_weak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon(month: u32, day: u32, weekday: u32) -> LocalTime {
        LocalTime {
            year: 2024,
            month,
            day,
            weekday,
            hour: 12,
            min: 0,
            sec: 0,
        }
    }

    #[test]
    fn date_strings_collapse_padding() {
        let t = noon(6, 5, 3);
        assert_eq!(date_string(Locale::EnUs, &t), "Wednesday, June 5");
        assert_eq!(date_string(Locale::DeDe, &t), "Mittwoch, 5. Juni");

        let t = noon(12, 25, 4);
        assert_eq!(date_string(Locale::EnUs, &t), "Thursday, December 25");
        assert_eq!(date_string(Locale::DeDe, &t), "Donnerstag, 25. Dezember");
    }

    #[test]
    fn refresh_time_falls_back_when_unsynced() {
        let t = LocalTime {
            year: 2024,
            month: 6,
            day: 5,
            weekday: 3,
            hour: 7,
            min: 30,
            sec: 12,
        };
        assert_eq!(refresh_time_string(Locale::EnUs, Some(&t)), "07:30");
        assert_eq!(refresh_time_string(Locale::EnUs, None), "unknown");
    }

    #[test]
    fn compass_names_follow_precision() {
        assert_eq!(compass_name(Locale::EnUs, 0, 8), "N");
        assert_eq!(compass_name(Locale::EnUs, 45, 8), "NE");
        assert_eq!(compass_name(Locale::EnUs, 45, 4), "E");
        assert_eq!(compass_name(Locale::EnUs, 350, 8), "N");
        assert_eq!(compass_name(Locale::EnUs, 202, 16), "SSW");
        assert_eq!(compass_name(Locale::DeDe, 90, 8), "O");
        assert_eq!(compass_name(Locale::DeDe, 315, 8), "NW");
    }

    #[test]
    fn aqi_descriptions_clamp() {
        assert_eq!(aqi_desc(Locale::EnUs, 1), "Good");
        assert_eq!(aqi_desc(Locale::EnUs, 5), "Very Poor");
        assert_eq!(aqi_desc(Locale::EnUs, 0), "Good");
        assert_eq!(aqi_desc(Locale::EnUs, 9), "Very Poor");
        assert_eq!(aqi_desc(Locale::DeDe, 3), "M\u{e4}\u{df}ig");
    }

    #[test]
    fn error_phrases_cover_the_offset_ranges() {
        assert_eq!(error_phrase(Locale::EnUs, 404), "Not Found");
        assert_eq!(error_phrase(Locale::EnUs, 401), "Unauthorized");
        assert_eq!(error_phrase(Locale::EnUs, -11), "Read Timeout");
        // -512 - 1: link layer reported "no SSID available".
        assert_eq!(error_phrase(Locale::EnUs, -513), "No SSID Available");
        assert_eq!(error_phrase(Locale::EnUs, -518), "Disconnected");
        // -256 - 3: payload failed to deserialize.
        assert_eq!(error_phrase(Locale::EnUs, -259), "Invalid Input");
        assert_eq!(error_phrase(Locale::EnUs, 999), "HTTP Error");
        assert_eq!(error_phrase(Locale::DeDe, 404), "Nicht gefunden");
    }

    #[test]
    fn wifi_descriptor_bands() {
        assert_eq!(wifi_desc(Locale::EnUs, 0), "No Connection");
        assert_eq!(wifi_desc(Locale::EnUs, -45), "Excellent");
        assert_eq!(wifi_desc(Locale::EnUs, -50), "Excellent");
        assert_eq!(wifi_desc(Locale::EnUs, -55), "Good");
        assert_eq!(wifi_desc(Locale::EnUs, -65), "Fair");
        assert_eq!(wifi_desc(Locale::EnUs, WIFI_WEAK_DBM), "Fair");
        assert_eq!(wifi_desc(Locale::EnUs, WIFI_WEAK_DBM - 1), "Weak");
        assert_eq!(wifi_desc(Locale::EnUs, -80), "Weak");
    }
}
