pub mod db;
pub mod weather;

pub use db::PgStore;
pub use weather::{OpenWeatherAdapter, UnconfiguredWeather};
