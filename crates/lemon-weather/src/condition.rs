//! WMO weather interpretation codes.
//! See: https://open-meteo.com/en/docs#weathervariables

use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

/// Codes that warrant a high-priority weather alert
pub const SEVERE_WEATHER_CODES: [i32; 11] = [61, 63, 65, 66, 67, 80, 81, 82, 95, 96, 99];

const PARTLY_CLOUDY_CODES: [i32; 3] = [1, 2, 3];
const PRECIPITATION_CODES: [i32; 16] = [51, 53, 55, 56, 57, 61, 63, 65, 66, 67, 80, 81, 82, 95, 96, 99];
const WINTER_PRECIPITATION_CODES: [i32; 6] = [71, 73, 75, 77, 85, 86];
const LOW_VISIBILITY_CODES: [i32; 2] = [45, 48];
const THUNDERSTORM_CODES: [i32; 3] = [95, 96, 99];

/// Full text for a WMO code, or `None` for codes outside the table
pub fn describe_code(code: i32) -> Option<&'static str> {
    let description = match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorms",
        96 => "Thunderstorms with slight hail",
        99 => "Thunderstorms with heavy hail",
        _ => return None,
    };
    Some(description)
}

pub fn is_severe(code: i32) -> bool {
    SEVERE_WEATHER_CODES.contains(&code)
}

/// Small icon name for a code
pub fn icon_for_code(code: i32, is_day: bool) -> Option<&'static str> {
    let icon = if code == 0 {
        if is_day { "ic_day_clear" } else { "ic_night_clear" }
    } else if PARTLY_CLOUDY_CODES.contains(&code) {
        if is_day { "ic_day_few_clouds" } else { "ic_night_few_clouds" }
    } else if PRECIPITATION_CODES.contains(&code) {
        match (THUNDERSTORM_CODES.contains(&code), is_day) {
            (true, true) => "ic_day_thunderstorms",
            (true, false) => "ic_night_thunderstorms",
            (false, true) => "ic_day_rain",
            (false, false) => "ic_night_rain",
        }
    } else if WINTER_PRECIPITATION_CODES.contains(&code) {
        if is_day { "ic_day_snow" } else { "ic_night_snow" }
    } else if LOW_VISIBILITY_CODES.contains(&code) {
        "ic_mist"
    } else {
        return None;
    };
    Some(icon)
}

/// Full-bleed background image name for a code
pub fn image_for_code(code: i32, is_day: bool) -> Option<&'static str> {
    let (day, night) = if code == 0 {
        ("img_day_clear", "img_night_clear")
    } else if PARTLY_CLOUDY_CODES.contains(&code) {
        ("img_day_cloudy", "img_night_cloudy")
    } else if PRECIPITATION_CODES.contains(&code) {
        ("img_day_rain", "img_night_rain")
    } else if WINTER_PRECIPITATION_CODES.contains(&code) {
        ("img_day_snow", "img_night_snow")
    } else if LOW_VISIBILITY_CODES.contains(&code) {
        ("img_day_fog", "img_night_fog")
    } else {
        return None;
    };
    Some(if is_day { day } else { night })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wmo_code_categories() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(3), WeatherCondition::Cloudy);
        assert_eq!(WeatherCondition::from_wmo_code(48), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_wmo_code(57), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(86), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(96), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_wmo_code_unknown_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_describe_code() {
        assert_eq!(describe_code(0), Some("Clear sky"));
        assert_eq!(describe_code(53), Some("Drizzle"));
        assert_eq!(describe_code(82), Some("Violent rain showers"));
        assert_eq!(describe_code(99), Some("Thunderstorms with heavy hail"));
        assert_eq!(describe_code(4), None);
    }

    #[test]
    fn test_every_described_code_has_art() {
        for code in 0..=99 {
            if describe_code(code).is_some() {
                assert!(icon_for_code(code, true).is_some(), "no icon for {}", code);
                assert!(image_for_code(code, false).is_some(), "no image for {}", code);
            }
        }
    }

    #[test]
    fn test_icon_day_night() {
        assert_eq!(icon_for_code(0, true), Some("ic_day_clear"));
        assert_eq!(icon_for_code(0, false), Some("ic_night_clear"));
        assert_eq!(icon_for_code(45, false), Some("ic_mist"));
        assert_eq!(icon_for_code(75, true), Some("ic_day_snow"));
    }

    #[test]
    fn test_rain_and_thunder_icons_differ() {
        assert_eq!(icon_for_code(63, true), Some("ic_day_rain"));
        assert_eq!(icon_for_code(95, true), Some("ic_day_thunderstorms"));
        assert_eq!(icon_for_code(99, false), Some("ic_night_thunderstorms"));
    }

    #[test]
    fn test_image_for_code() {
        assert_eq!(image_for_code(2, true), Some("img_day_cloudy"));
        assert_eq!(image_for_code(48, false), Some("img_night_fog"));
        assert_eq!(image_for_code(1000, true), None);
    }

    #[test]
    fn test_severe_codes() {
        assert!(is_severe(65));
        assert!(is_severe(95));
        assert!(!is_severe(51));
        assert!(!is_severe(0));
    }
}
