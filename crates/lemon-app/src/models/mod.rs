pub mod detail_model;
pub mod home_model;

pub use detail_model::{week_forecast, WeatherDetailModel, DEFAULT_ERROR_MESSAGE};
pub use home_model::HomeModel;
