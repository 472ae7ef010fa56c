//! WMO weather codes and derived indicators shown on the dashboard.

use serde::Serialize;

// ---

/// Human-readable description of a WMO weather code.
pub fn description(code: Option<i64>) -> &'static str {
    match code {
        Some(0) => "Clear sky",
        Some(1) => "Mainly clear",
        Some(2) => "Partly cloudy",
        Some(3) => "Overcast",
        Some(45) => "Fog",
        Some(48) => "Depositing rime fog",
        Some(51) => "Light drizzle",
        Some(53) => "Moderate drizzle",
        Some(55) => "Dense drizzle",
        Some(56) => "Light freezing drizzle",
        Some(57) => "Dense freezing drizzle",
        Some(61) => "Slight rain",
        Some(63) => "Moderate rain",
        Some(65) => "Heavy rain",
        Some(66) => "Light freezing rain",
        Some(67) => "Heavy freezing rain",
        Some(71) => "Slight snow fall",
        Some(73) => "Moderate snow fall",
        Some(75) => "Heavy snow fall",
        Some(77) => "Snow grains",
        Some(80) => "Slight rain showers",
        Some(81) => "Moderate rain showers",
        Some(82) => "Violent rain showers",
        Some(85) => "Slight snow showers",
        Some(86) => "Heavy snow showers",
        Some(95) => "Thunderstorm",
        Some(96) => "Thunderstorm with slight hail",
        Some(99) => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// Emoji icon for a weather code, day/night aware for clear and cloudy skies.
pub fn icon(code: Option<i64>, is_day: bool) -> &'static str {
    let Some(code) = code else {
        return "🌡️";
    };
    match code {
        0 if is_day => "☀️",
        0 => "🌙",
        c if c <= 3 && is_day => "⛅",
        c if c <= 3 => "☁️",
        c if c <= 48 => "🌫️",
        c if c <= 67 => "🌧️",
        c if c <= 77 => "❄️",
        c if c <= 82 => "🌧️",
        c if c <= 86 => "🌨️",
        c if c >= 95 => "⛈️",
        _ => "🌡️",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UvRisk {
    pub level: &'static str,
    pub color: &'static str,
}

pub fn uv_risk(uv: f64) -> UvRisk {
    let (level, color) = match uv {
        uv if uv < 3.0 => ("Low", "#4ade80"),
        uv if uv < 6.0 => ("Moderate", "#facc15"),
        uv if uv < 8.0 => ("High", "#fb923c"),
        uv if uv < 11.0 => ("Very High", "#ef4444"),
        _ => ("Extreme", "#7c3aed"),
    };
    UvRisk { level, color }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Comfort {
    pub level: &'static str,
    pub score: u8,
}

/// Rough comfort rating from air temperature (°C) and relative humidity (%).
pub fn comfort(temp: f64, humidity: f64) -> Comfort {
    let (level, score) = if temp < 10.0 {
        ("Cold", 30)
    } else if temp > 35.0 {
        ("Hot", 20)
    } else if humidity > 80.0 && temp > 25.0 {
        ("Muggy", 40)
    } else if humidity < 30.0 && temp > 20.0 {
        ("Dry", 60)
    } else if (18.0..=26.0).contains(&temp) && (30.0..=60.0).contains(&humidity) {
        ("Ideal", 100)
    } else {
        ("Comfortable", 80)
    };
    Comfort { level, score }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn known_and_unknown_descriptions() {
        // ---
        assert_eq!(description(Some(0)), "Clear sky");
        assert_eq!(description(Some(63)), "Moderate rain");
        assert_eq!(description(Some(99)), "Thunderstorm with heavy hail");
        assert_eq!(description(Some(4)), "Unknown");
        assert_eq!(description(None), "Unknown");
    }

    #[test]
    fn icons_follow_code_bands() {
        // ---
        assert_eq!(icon(Some(0), true), "☀️");
        assert_eq!(icon(Some(0), false), "🌙");
        assert_eq!(icon(Some(2), true), "⛅");
        assert_eq!(icon(Some(3), false), "☁️");
        assert_eq!(icon(Some(45), true), "🌫️");
        assert_eq!(icon(Some(61), true), "🌧️");
        assert_eq!(icon(Some(73), true), "❄️");
        assert_eq!(icon(Some(85), true), "🌨️");
        assert_eq!(icon(Some(90), true), "🌡️");
        assert_eq!(icon(Some(96), true), "⛈️");
        assert_eq!(icon(None, true), "🌡️");
    }

    #[test]
    fn uv_bands() {
        // ---
        assert_eq!(uv_risk(0.0).level, "Low");
        assert_eq!(uv_risk(3.0).level, "Moderate");
        assert_eq!(uv_risk(7.9).level, "High");
        assert_eq!(uv_risk(10.0).level, "Very High");
        assert_eq!(uv_risk(11.0).level, "Extreme");
    }

    #[test]
    fn comfort_levels() {
        // ---
        assert_eq!(comfort(5.0, 50.0).level, "Cold");
        assert_eq!(comfort(36.0, 50.0).level, "Hot");
        assert_eq!(comfort(28.0, 85.0).level, "Muggy");
        assert_eq!(comfort(22.0, 20.0).level, "Dry");
        assert_eq!(comfort(22.0, 45.0), Comfort { level: "Ideal", score: 100 });
        assert_eq!(comfort(15.0, 70.0).level, "Comfortable");
    }
}
