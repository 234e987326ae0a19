// Display units. The model stores provider-native values (Kelvin, m/s,
// meters, millimeters); conversion happens once, at render time.

/// Temperature scale shown on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempUnit {
    Kelvin,
    Celsius,
    Fahrenheit,
}

impl TempUnit {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "kelvin" => Some(TempUnit::Kelvin),
            "celsius" => Some(TempUnit::Celsius),
            "fahrenheit" => Some(TempUnit::Fahrenheit),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            TempUnit::Kelvin => "kelvin",
            TempUnit::Celsius => "celsius",
            TempUnit::Fahrenheit => "fahrenheit",
        }
    }

    pub fn from_kelvin(self, kelvin: f32) -> f32 {
        match self {
            TempUnit::Kelvin => kelvin,
            TempUnit::Celsius => kelvin - 273.15,
            TempUnit::Fahrenheit => (kelvin - 273.15) * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TempUnit::Kelvin => "K",
            TempUnit::Celsius => "\u{b0}C",
            TempUnit::Fahrenheit => "\u{b0}F",
        }
    }
}

/// Wind speed scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedUnit {
    MetersPerSecond,
    FeetPerSecond,
    KilometersPerHour,
    MilesPerHour,
    Knots,
    Beaufort,
}

impl SpeedUnit {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "mps" => Some(SpeedUnit::MetersPerSecond),
            "ftps" => Some(SpeedUnit::FeetPerSecond),
            "kmh" => Some(SpeedUnit::KilometersPerHour),
            "mph" => Some(SpeedUnit::MilesPerHour),
            "knots" => Some(SpeedUnit::Knots),
            "beaufort" => Some(SpeedUnit::Beaufort),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SpeedUnit::MetersPerSecond => "mps",
            SpeedUnit::FeetPerSecond => "ftps",
            SpeedUnit::KilometersPerHour => "kmh",
            SpeedUnit::MilesPerHour => "mph",
            SpeedUnit::Knots => "knots",
            SpeedUnit::Beaufort => "beaufort",
        }
    }

    pub fn from_mps(self, mps: f32) -> f32 {
        match self {
            SpeedUnit::MetersPerSecond => mps,
            SpeedUnit::FeetPerSecond => mps * 3.28084,
            SpeedUnit::KilometersPerHour => mps * 3.6,
            SpeedUnit::MilesPerHour => mps * 2.23694,
            SpeedUnit::Knots => mps * 1.94384,
            SpeedUnit::Beaufort => f32::from(beaufort(mps)),
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::FeetPerSecond => "ft/s",
            SpeedUnit::KilometersPerHour => "km/h",
            SpeedUnit::MilesPerHour => "mph",
            SpeedUnit::Knots => "kt",
            SpeedUnit::Beaufort => "",
        }
    }
}

/// Visibility scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

impl DistanceUnit {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "km" => Some(DistanceUnit::Kilometers),
            "mi" => Some(DistanceUnit::Miles),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }

    pub fn from_meters(self, meters: f32) -> f32 {
        match self {
            DistanceUnit::Kilometers => meters / 1000.0,
            DistanceUnit::Miles => meters / 1609.344,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }
}

/// Precipitation readout, either probability or measured volume. Used for
/// both the hourly graph and the daily strip, configured independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecipUnit {
    /// Probability of precipitation, percent.
    Pop,
    Millimeters,
    Centimeters,
    Inches,
}

impl PrecipUnit {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "pop" => Some(PrecipUnit::Pop),
            "mm" => Some(PrecipUnit::Millimeters),
            "cm" => Some(PrecipUnit::Centimeters),
            "in" => Some(PrecipUnit::Inches),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            PrecipUnit::Pop => "pop",
            PrecipUnit::Millimeters => "mm",
            PrecipUnit::Centimeters => "cm",
            PrecipUnit::Inches => "in",
        }
    }

    pub fn from_millimeters(self, mm: f32) -> f32 {
        match self {
            PrecipUnit::Pop => mm,
            PrecipUnit::Millimeters => mm,
            PrecipUnit::Centimeters => mm / 10.0,
            PrecipUnit::Inches => mm / 25.4,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            PrecipUnit::Pop => "%",
            PrecipUnit::Millimeters => "mm",
            PrecipUnit::Centimeters => "cm",
            PrecipUnit::Inches => "in",
        }
    }
}

/// Beaufort number for a wind speed in m/s.
pub fn beaufort(mps: f32) -> u8 {
    const UPPER_BOUNDS: [f32; 12] = [
        0.5, 1.6, 3.4, 5.5, 8.0, 10.8, 13.9, 17.2, 20.8, 24.5, 28.5, 32.7,
    ];
    for (bft, bound) in UPPER_BOUNDS.iter().enumerate() {
        if mps < *bound {
            return bft as u8;
        }
    }
    12
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_conversions() {
        assert_eq!(TempUnit::Celsius.from_kelvin(273.15), 0.0);
        assert_eq!(TempUnit::Fahrenheit.from_kelvin(273.15), 32.0);
        assert!((TempUnit::Fahrenheit.from_kelvin(295.15) - 71.6).abs() < 0.01);
        assert_eq!(TempUnit::Kelvin.from_kelvin(300.0), 300.0);
    }

    #[test]
    fn speed_conversions() {
        assert!((SpeedUnit::KilometersPerHour.from_mps(10.0) - 36.0).abs() < 1e-4);
        assert!((SpeedUnit::MilesPerHour.from_mps(10.0) - 22.3694).abs() < 1e-3);
        assert!((SpeedUnit::Knots.from_mps(10.0) - 19.4384).abs() < 1e-3);
        assert_eq!(SpeedUnit::Beaufort.from_mps(10.0), 5.0);
    }

    #[test]
    fn beaufort_band_edges() {
        assert_eq!(beaufort(0.0), 0);
        assert_eq!(beaufort(0.5), 1);
        assert_eq!(beaufort(3.3), 2);
        assert_eq!(beaufort(3.4), 3);
        assert_eq!(beaufort(20.8), 9);
        assert_eq!(beaufort(32.7), 12);
        assert_eq!(beaufort(40.0), 12);
    }

    #[test]
    fn distance_and_precip_conversions() {
        assert_eq!(DistanceUnit::Kilometers.from_meters(10_000.0), 10.0);
        assert!((DistanceUnit::Miles.from_meters(1609.344) - 1.0).abs() < 1e-6);
        assert!((PrecipUnit::Inches.from_millimeters(25.4) - 1.0).abs() < 1e-6);
        assert_eq!(PrecipUnit::Centimeters.from_millimeters(12.0), 1.2);
    }

    #[test]
    fn unit_keys_round_trip() {
        assert_eq!(TempUnit::from_key("celsius"), Some(TempUnit::Celsius));
        assert_eq!(TempUnit::from_key("rankine"), None);
        assert_eq!(SpeedUnit::from_key("beaufort"), Some(SpeedUnit::Beaufort));
        assert_eq!(DistanceUnit::from_key("mi"), Some(DistanceUnit::Miles));
        assert_eq!(PrecipUnit::from_key("pop"), Some(PrecipUnit::Pop));

        for u in [TempUnit::Kelvin, TempUnit::Celsius, TempUnit::Fahrenheit] {
            assert_eq!(TempUnit::from_key(u.key()), Some(u));
        }
        for u in [
            SpeedUnit::MetersPerSecond,
            SpeedUnit::FeetPerSecond,
            SpeedUnit::KilometersPerHour,
            SpeedUnit::MilesPerHour,
            SpeedUnit::Knots,
            SpeedUnit::Beaufort,
        ] {
            assert_eq!(SpeedUnit::from_key(u.key()), Some(u));
        }
    }
}
