use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};

use lemon_app::{
    severe_weather_alert, status_notification, week_forecast, AppServices, HomeModel,
    HomeScreenUiState, IntoAppError, ModelSettings, WeatherDetailModel,
    WeatherDetailScreenUiState,
};
use lemon_core::{App, AppError, TemperatureUnit};
use lemon_weather::forecast::twelve_hour_label;
use lemon_weather::{BriefWeatherDetails, Coordinates, SavedLocation};

/// Upper bound on waiting for a screen to settle
const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "lemon", version, about = "Weather for your saved places")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured temperature unit
    #[arg(long, global = true, value_enum)]
    unit: Option<UnitArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Celsius,
    Fahrenheit,
}

impl From<UnitArg> for TemperatureUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Celsius => TemperatureUnit::Celsius,
            UnitArg::Fahrenheit => TemperatureUnit::Fahrenheit,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Weather at the configured home location
    Current,
    /// Manage saved locations
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
    /// Suggest places matching a name
    Search { query: String },
    /// Detailed conditions for a place
    Detail {
        name: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Also add the place to the saved locations
        #[arg(long)]
        save: bool,
    },
    /// Seven-day outlook for a position
    Forecast {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

#[derive(Subcommand)]
enum SavedAction {
    /// Current weather for every saved location
    List,
    Add {
        name: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    lemon_core::init()?;
    let cli = Cli::parse();

    let app = App::new(cli.config.as_deref()).map_err(with_user_message)?;
    app.initialize()?;

    let services = AppServices::from_config(app.config())?;
    let mut settings = ModelSettings::from(&app.config().weather);
    if let Some(unit) = cli.unit {
        settings.temperature_unit = unit.into();
    }

    let result = run(cli.command, services, settings).await;
    app.shutdown();
    result
}

async fn run(command: Command, services: AppServices, settings: ModelSettings) -> Result<()> {
    let unit = settings.temperature_unit;
    match command {
        Command::Current => {
            let home = HomeModel::start(services, settings);
            home.fetch_weather_for_current_location()
                .await
                .context("Current location task failed")?;
            print_current(&home.state(), unit);
            home.shutdown().await;
        }
        Command::Saved { action } => match action {
            SavedAction::List => {
                let home = HomeModel::start(services, settings);
                let mut rx = home.subscribe();
                let state = settle(&mut rx, |s| !s.is_loading_saved_locations).await?;
                print_saved(&state, unit);
                home.shutdown().await;
            }
            SavedAction::Add { name, lat, lon } => {
                let location = SavedLocation::new(name, Coordinates::new(lat, lon));
                services
                    .saved_locations
                    .upsert(&location)
                    .map_err(user_facing)?;
                println!("Saved {}", location.name);
            }
            SavedAction::Remove { name } => {
                if services.saved_locations.remove(&name).map_err(user_facing)? {
                    println!("Removed {}", name);
                } else {
                    println!("{} is not a saved location", name);
                }
            }
        },
        Command::Search { query } => {
            let query = search_query(query)?;
            let home = HomeModel::start(services, settings);
            let mut rx = home.subscribe();
            home.set_search_query(query.clone());
            let state = settle(&mut rx, |s| {
                s.suggestions_query == query && !s.is_loading_autofill_suggestions
            })
            .await?;
            print_suggestions(&state);
            home.shutdown().await;
        }
        Command::Detail {
            name,
            lat,
            lon,
            save,
        } => {
            let location = SavedLocation::new(name, Coordinates::new(lat, lon));
            let detail = WeatherDetailModel::start(services, location, unit);
            let mut rx = detail.subscribe();
            let state = settle(&mut rx, |s| !s.is_loading).await?;
            print_detail(&state, unit);
            if save && !state.is_previously_saved_location {
                detail
                    .add_location_to_saved_locations()
                    .map_err(user_facing)?;
                println!("\nSaved {}", detail.location().name);
            }
            detail.shutdown().await;
        }
        Command::Forecast { lat, lon } => {
            let days = week_forecast(
                services.weather.as_ref(),
                Coordinates::new(lat, lon),
                unit,
                Local::now().date_naive(),
            )
            .await
            .map_err(user_facing)?;

            for day in days {
                println!(
                    "{}  {:>5.1}{sym} / {:>5.1}{sym}  {:>3}%  {}  (sunrise {}, sunset {})",
                    day.date.format("%a %d %b"),
                    day.high,
                    day.low,
                    day.precipitation_chance,
                    day.condition.description(),
                    day.sunrise.format("%H:%M"),
                    day.sunset.format("%H:%M"),
                    sym = unit.symbol(),
                );
            }
        }
    }
    Ok(())
}

async fn settle<T: Clone>(
    rx: &mut tokio::sync::watch::Receiver<T>,
    predicate: impl FnMut(&T) -> bool,
) -> Result<T> {
    let state = tokio::time::timeout(SETTLE_TIMEOUT, rx.wait_for(predicate))
        .await
        .context("Timed out waiting for weather data")?
        .context("View model stopped unexpectedly")?;
    Ok(state.clone())
}

/// Blank queries never produce suggestions, so they are rejected up front.
fn search_query(query: String) -> Result<String> {
    if query.trim().is_empty() {
        anyhow::bail!("Enter a place name to search for");
    }
    Ok(query)
}

fn with_user_message(error: anyhow::Error) -> anyhow::Error {
    match error.downcast_ref::<AppError>().map(AppError::user_message) {
        Some(message) => error.context(message),
        None => error,
    }
}

fn user_facing(error: impl IntoAppError) -> anyhow::Error {
    let error = error.into_app_error();
    let message = error.user_message();
    anyhow::Error::new(error).context(message)
}

fn print_brief(brief: &BriefWeatherDetails, unit: TemperatureUnit) {
    println!(
        "{:<40} {:>4}{}  {}",
        brief.name_of_location,
        brief.current_temperature_rounded,
        unit.symbol(),
        brief.short_description
    );
}

fn print_current(state: &HomeScreenUiState, unit: TemperatureUnit) {
    if state.error_fetching_weather_for_current_location {
        println!("Weather for your location is unavailable. Check the [location] section of the config.");
        return;
    }
    let Some(brief) = &state.weather_details_of_current_location else {
        return;
    };
    print_brief(brief, unit);

    match &state.hourly_forecasts_for_current_location {
        Some(hours) => {
            println!();
            for hour in hours {
                println!(
                    "  {}  {:>4}{}",
                    twelve_hour_label(&hour.date_time),
                    hour.temperature,
                    unit.symbol()
                );
            }
        }
        None => println!("Hourly forecast unavailable"),
    }
}

fn print_saved(state: &HomeScreenUiState, unit: TemperatureUnit) {
    if state.error_fetching_weather_for_saved_locations {
        println!("Some saved locations could not be refreshed. Please try again.");
        return;
    }
    if state.weather_details_of_saved_locations.is_empty() {
        println!("No saved locations");
        return;
    }
    for brief in &state.weather_details_of_saved_locations {
        print_brief(brief, unit);
    }
}

fn print_suggestions(state: &HomeScreenUiState) {
    if state.error_fetching_autofill_suggestions {
        println!("Place search is unavailable right now");
        return;
    }
    if state.autofill_suggestions.is_empty() {
        println!("No places match {:?}", state.suggestions_query);
        return;
    }
    for suggestion in &state.autofill_suggestions {
        println!(
            "{}, {}  ({})",
            suggestion.name, suggestion.address, suggestion.coordinates
        );
    }
}

fn print_detail(state: &WeatherDetailScreenUiState, unit: TemperatureUnit) {
    if let Some(message) = &state.error_message {
        println!("{}", message);
        return;
    }
    let Some(details) = &state.weather_details_of_chosen_location else {
        return;
    };

    let status = status_notification(details, unit);
    println!("{}\n{}", status.title, status.body);
    if let Some(alert) = severe_weather_alert(details) {
        println!("\n!! {}: {}", alert.title, alert.body);
    }
    if let Some(summary) = &state.weather_summary_text {
        println!("\n{}", summary);
    }

    println!();
    for (hour, rain) in state
        .hourly_forecasts
        .iter()
        .zip(&state.precipitation_probabilities)
    {
        println!(
            "  {}  {:>4}{}  {:>3}% rain",
            twelve_hour_label(&hour.date_time),
            hour.temperature,
            unit.symbol(),
            rain.probability_percentage
        );
    }

    println!();
    for item in &state.additional_weather_info_items {
        println!("  {:<24} {}", item.name, item.value);
    }
}
