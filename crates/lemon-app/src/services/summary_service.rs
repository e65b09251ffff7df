//! Short prose summary of current conditions for the detail screen.

use async_trait::async_trait;

use lemon_weather::{is_severe, CurrentWeatherDetails, TemperatureUnit, WeatherCondition};

/// Shown in place of a summary that could not be generated
pub const SUMMARY_UNAVAILABLE: &str =
    "Sorry, I'm having trouble responding to you. Please try again.";

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn summarize(
        &self,
        details: &CurrentWeatherDetails,
        unit: TemperatureUnit,
    ) -> anyhow::Result<String>;
}

/// Generate a summary, falling back to [`SUMMARY_UNAVAILABLE`] on failure.
pub async fn summary_or_default(
    generator: &dyn SummaryGenerator,
    details: &CurrentWeatherDetails,
    unit: TemperatureUnit,
) -> String {
    match generator.summarize(details, unit).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => SUMMARY_UNAVAILABLE.to_string(),
        Err(e) => {
            tracing::warn!("Summary generation failed: {:#}", e);
            SUMMARY_UNAVAILABLE.to_string()
        }
    }
}

/// Builds the summary locally from the weather condition.
#[derive(Debug, Default, Clone)]
pub struct TemplateSummary;

#[async_trait]
impl SummaryGenerator for TemplateSummary {
    async fn summarize(
        &self,
        details: &CurrentWeatherDetails,
        unit: TemperatureUnit,
    ) -> anyhow::Result<String> {
        Ok(template_summary(details, unit))
    }
}

fn template_summary(details: &CurrentWeatherDetails, unit: TemperatureUnit) -> String {
    let period = if details.is_day { "today" } else { "tonight" };
    let mut text = format!(
        "{} in {} {}, currently {}{}.",
        details.weather_condition,
        details.name_of_location,
        period,
        details.temperature_rounded,
        unit.symbol()
    );

    let advice = if is_severe(details.weather_code) {
        match WeatherCondition::from_wmo_code(details.weather_code) {
            WeatherCondition::Thunderstorm => {
                "Weather alert: thunderstorms expected, stay indoors if you can."
            }
            _ => "Weather alert: heavy precipitation, take an umbrella and allow extra travel time.",
        }
    } else {
        match WeatherCondition::from_wmo_code(details.weather_code) {
            WeatherCondition::Clear | WeatherCondition::PartlyCloudy if details.is_day => {
                "A good time to head outside."
            }
            WeatherCondition::Clear | WeatherCondition::PartlyCloudy => "A calm night ahead.",
            WeatherCondition::Fog => "Visibility is reduced, take care on the roads.",
            WeatherCondition::Snow | WeatherCondition::Sleet => {
                "Dress warmly and watch for slippery surfaces."
            }
            WeatherCondition::Drizzle => "A light jacket should do.",
            _ => "Keep an eye on the forecast.",
        }
    };

    text.push(' ');
    text.push_str(advice);
    text
}
