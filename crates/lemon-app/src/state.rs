//! Screen state published by the view models.

use lemon_weather::{
    BriefWeatherDetails, CurrentWeatherDetails, HourlyForecast, LocationAutofillSuggestion,
    PrecipitationProbability, SingleWeatherDetail,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeScreenUiState {
    pub is_loading_autofill_suggestions: bool,
    pub is_loading_saved_locations: bool,
    pub is_loading_weather_details_of_current_location: bool,
    pub error_fetching_weather_for_current_location: bool,
    pub error_fetching_weather_for_saved_locations: bool,
    pub error_fetching_autofill_suggestions: bool,
    pub weather_details_of_current_location: Option<BriefWeatherDetails>,
    /// `None` when the hourly request failed
    pub hourly_forecasts_for_current_location: Option<Vec<HourlyForecast>>,
    pub autofill_suggestions: Vec<LocationAutofillSuggestion>,
    /// Query the current `autofill_suggestions` answer
    pub suggestions_query: String,
    pub weather_details_of_saved_locations: Vec<BriefWeatherDetails>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherDetailScreenUiState {
    pub is_loading: bool,
    pub is_previously_saved_location: bool,
    pub weather_details_of_chosen_location: Option<CurrentWeatherDetails>,
    pub is_weather_summary_text_loading: bool,
    pub weather_summary_text: Option<String>,
    pub error_message: Option<String>,
    pub precipitation_probabilities: Vec<PrecipitationProbability>,
    pub hourly_forecasts: Vec<HourlyForecast>,
    pub additional_weather_info_items: Vec<SingleWeatherDetail>,
}

impl Default for WeatherDetailScreenUiState {
    fn default() -> Self {
        Self {
            is_loading: true,
            is_previously_saved_location: false,
            weather_details_of_chosen_location: None,
            is_weather_summary_text_loading: false,
            weather_summary_text: None,
            error_message: None,
            precipitation_probabilities: Vec::new(),
            hourly_forecasts: Vec::new(),
            additional_weather_info_items: Vec::new(),
        }
    }
}
