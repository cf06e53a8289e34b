//! Core library for the `weather-dash` CLI.
//!
//! This crate defines:
//! - A typed client for the WeatherAPI.com endpoints
//! - The category store the dashboard reads from
//! - Startup loading, public IP resolution and debounced location search
//! - Derived display values, configuration and the persisted theme
//!
//! It is used by `weather-dash-cli`, but can also be reused by other binaries or services.

pub mod api;
pub mod config;
pub mod error;
pub mod init;
pub mod ip;
pub mod model;
pub mod present;
pub mod search;
pub mod store;
pub mod theme;

pub use api::{WeatherApi, WeatherApiClient, client_from_config};
pub use config::Config;
pub use error::ApiError;
pub use init::{initialize, load_dashboard, resolve_location};
pub use ip::IpResolver;
pub use search::{LocationSearch, SearchDriver, SearchInput};
pub use store::{Category, StoreEvent, WeatherStore};
pub use theme::{Theme, ThemeStore};
