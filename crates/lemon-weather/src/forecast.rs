//! Conversion of forecast API responses into display-ready domain values.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Timelike};

use crate::condition::{describe_code, icon_for_code, image_for_code, WeatherCondition};
use crate::response::{CurrentWeatherResponse, DailyWeatherResponse, HourlyWeatherResponse};
use crate::types::{
    Coordinates, CurrentWeatherDetails, DayForecast, HourlyForecast, PrecipitationProbability,
    SingleWeatherDetail, WeatherError,
};

/// Format for sunrise/sunset values on the detail screen
const CLOCK_FORMAT: &str = "%I : %M %p";

/// Local hours before this one get day icons
const NIGHT_STARTS_AT: u32 = 19;

pub fn current_weather_details(
    response: &CurrentWeatherResponse,
    name_of_location: &str,
) -> Result<CurrentWeatherDetails, WeatherError> {
    let current = &response.current_weather;
    let code = current.weathercode;
    let is_day = current.is_day == 1;

    Ok(CurrentWeatherDetails {
        name_of_location: name_of_location.to_string(),
        temperature_rounded: round_half_up(current.temperature),
        weather_code: code,
        weather_condition: describe_code(code).ok_or(WeatherError::UnknownWeatherCode(code))?,
        is_day,
        icon: icon_for_code(code, is_day).ok_or(WeatherError::UnknownWeatherCode(code))?,
        image: image_for_code(code, is_day).ok_or(WeatherError::UnknownWeatherCode(code))?,
        coordinates: Coordinates::new(response.latitude, response.longitude),
    })
}

/// Hourly entries converted to wall-clock time in `tz`. Hours missing a
/// weather code or temperature are skipped.
pub fn hourly_forecasts<Tz: TimeZone>(
    response: &HourlyWeatherResponse,
    tz: &Tz,
) -> Result<Vec<HourlyForecast>, WeatherError> {
    let hourly = &response.hourly;
    let mut forecasts = Vec::with_capacity(hourly.time.len());

    for (i, &epoch) in hourly.time.iter().enumerate() {
        let (Some(code), Some(temperature)) = (
            value_at(&hourly.weathercode, i),
            value_at(&hourly.temperature_2m, i),
        ) else {
            continue;
        };

        let date_time = local_time(epoch, tz)?;
        let is_day = date_time.hour() < NIGHT_STARTS_AT;
        forecasts.push(HourlyForecast {
            date_time,
            weather_icon: icon_for_code(code, is_day)
                .ok_or(WeatherError::UnknownWeatherCode(code))?,
            temperature: round_half_up(temperature),
        });
    }

    Ok(forecasts)
}

/// Hourly precipitation chance; a missing value counts as 0%.
pub fn precipitation_probabilities<Tz: TimeZone>(
    response: &HourlyWeatherResponse,
    tz: &Tz,
) -> Result<Vec<PrecipitationProbability>, WeatherError> {
    response
        .hourly
        .time
        .iter()
        .enumerate()
        .map(|(i, &epoch)| {
            let probability = value_at(&response.hourly.precipitation_probability, i).unwrap_or(0);
            Ok(PrecipitationProbability {
                latitude: response.latitude,
                longitude: response.longitude,
                date_time: local_time(epoch, tz)?,
                probability_percentage: probability.clamp(0, 100) as u8,
            })
        })
        .collect()
}

/// The detail-screen tiles for a single day of daily variables.
///
/// Times are rendered in the location's own UTC offset, not the device's.
pub fn single_weather_details(
    response: &DailyWeatherResponse,
) -> Result<Vec<SingleWeatherDetail>, WeatherError> {
    let daily = &response.daily;
    if daily.time.len() != 1 {
        return Err(WeatherError::Parse(format!(
            "expected daily variables for exactly one day, got {}",
            daily.time.len()
        )));
    }

    let offset = location_offset(response)?;
    let min_temp = first(&daily.temperature_2m_min, "temperature_2m_min")?;
    let max_temp = first(&daily.temperature_2m_max, "temperature_2m_max")?;
    let min_apparent = first(&daily.apparent_temperature_min, "apparent_temperature_min")?;
    let max_apparent = first(&daily.apparent_temperature_max, "apparent_temperature_max")?;
    let uv_index = first(&daily.uv_index_max, "uv_index_max")?;
    let wind_direction = first(&daily.winddirection_10m_dominant, "winddirection_10m_dominant")?;
    let wind_speed = first(&daily.windspeed_10m_max, "windspeed_10m_max")?;
    let sunrise = daily
        .sunrise
        .first()
        .ok_or_else(|| missing("sunrise"))
        .and_then(|&t| local_time(t, &offset))?;
    let sunset = daily
        .sunset
        .first()
        .ok_or_else(|| missing("sunset"))
        .and_then(|&t| local_time(t, &offset))?;

    let feels_like = (round_half_up(min_apparent) + round_half_up(max_apparent)) / 2;

    Ok(vec![
        SingleWeatherDetail {
            name: "Min Temp",
            value: format!("{}°", round_half_up(min_temp)),
            icon: "thermostat",
        },
        SingleWeatherDetail {
            name: "Max Temp",
            value: format!("{}°", round_half_up(max_temp)),
            icon: "thermostat",
        },
        SingleWeatherDetail {
            name: "Sunrise",
            value: sunrise.format(CLOCK_FORMAT).to_string(),
            icon: "sunrise",
        },
        SingleWeatherDetail {
            name: "Sunset",
            value: sunset.format(CLOCK_FORMAT).to_string(),
            icon: "sunset",
        },
        SingleWeatherDetail {
            name: "Feels Like",
            value: format!("{}°", feels_like),
            icon: "thermostat",
        },
        SingleWeatherDetail {
            name: "Max UV Index",
            value: format!("{:.1}", uv_index),
            icon: "uv_index",
        },
        SingleWeatherDetail {
            name: "Wind Direction",
            value: format!("{}°", wind_direction),
            icon: "wind_direction",
        },
        SingleWeatherDetail {
            name: "Wind Speed",
            value: format!("{:.1} Km/h", wind_speed),
            icon: "wind_speed",
        },
    ])
}

/// Multi-day forecast. Days without both a high and a low are dropped.
pub fn day_forecasts(response: &DailyWeatherResponse) -> Result<Vec<DayForecast>, WeatherError> {
    let daily = &response.daily;
    let offset = location_offset(response)?;
    let mut days = Vec::with_capacity(daily.time.len());

    for (i, &epoch) in daily.time.iter().enumerate() {
        let (Some(high), Some(low)) = (
            value_at(&daily.temperature_2m_max, i),
            value_at(&daily.temperature_2m_min, i),
        ) else {
            continue;
        };

        let sunrise = daily.sunrise.get(i).ok_or_else(|| missing("sunrise"))?;
        let sunset = daily.sunset.get(i).ok_or_else(|| missing("sunset"))?;
        let code = value_at(&daily.weathercode, i).unwrap_or(0);

        days.push(DayForecast {
            date: local_time(epoch, &offset)?.date(),
            high,
            low,
            condition: WeatherCondition::from_wmo_code(code),
            precipitation_chance: value_at(&daily.precipitation_probability_max, i)
                .unwrap_or(0)
                .clamp(0, 100) as u8,
            sunrise: local_time(*sunrise, &offset)?.time(),
            sunset: local_time(*sunset, &offset)?.time(),
        });
    }

    Ok(days)
}

/// Forecasts at or after `now`, at most `count` of them.
pub fn next_hours(
    forecasts: Vec<HourlyForecast>,
    now: NaiveDateTime,
    count: usize,
) -> Vec<HourlyForecast> {
    forecasts
        .into_iter()
        .filter(|f| f.date_time >= now)
        .take(count)
        .collect()
}

/// Hour label such as " 9 PM" or "11 AM"
pub fn twelve_hour_label(date_time: &NaiveDateTime) -> String {
    let label = date_time.format("%I %p").to_string();
    match label.strip_prefix('0') {
        Some(rest) => format!(" {}", rest),
        None => label,
    }
}

fn local_time<Tz: TimeZone>(epoch: i64, tz: &Tz) -> Result<NaiveDateTime, WeatherError> {
    DateTime::from_timestamp(epoch, 0)
        .map(|utc| utc.with_timezone(tz).naive_local())
        .ok_or_else(|| WeatherError::Parse(format!("timestamp out of range: {}", epoch)))
}

fn location_offset(response: &DailyWeatherResponse) -> Result<FixedOffset, WeatherError> {
    FixedOffset::east_opt(response.utc_offset_seconds).ok_or_else(|| {
        WeatherError::Parse(format!(
            "invalid utc offset {} for timezone {}",
            response.utc_offset_seconds, response.timezone
        ))
    })
}

/// Halves round towards positive infinity, so -2.5 becomes -2.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn value_at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

fn first<T: Copy>(values: &[Option<T>], name: &str) -> Result<T, WeatherError> {
    value_at(values, 0).ok_or_else(|| missing(name))
}

fn missing(name: &str) -> WeatherError {
    WeatherError::Parse(format!("missing daily value: {}", name))
}
