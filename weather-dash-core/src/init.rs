//! Startup loading for the dashboard.

use crate::{
    api::WeatherApi,
    config::DASHBOARD_FORECAST_DAYS,
    ip::IpResolver,
    model::{AlertsOptions, CombinedOptions, CurrentWeatherOptions},
    store::WeatherStore,
};

/// Resolves the caller's public IP, then loads current weather + forecast
/// and alerts for it concurrently. Returns the location query used (empty
/// when the IP could not be resolved).
pub async fn initialize<A: WeatherApi>(store: &WeatherStore<A>, ip: &IpResolver) -> String {
    let location = ip.resolve().await;
    load_dashboard(store, &location).await;
    location
}

/// The dashboard's initial loads for a known location.
pub async fn load_dashboard<A: WeatherApi>(store: &WeatherStore<A>, location: &str) {
    tracing::info!(%location, "Loading dashboard");

    let combined = CombinedOptions::dashboard();
    let alerts = AlertsOptions::default();
    tokio::join!(
        store.load_weather_and_forecast(location, DASHBOARD_FORECAST_DAYS, &combined),
        store.load_alerts(location, &alerts),
    );
}

/// The `"name, country"` query of the location current weather resolved to,
/// so follow-up loads target the same place. Loads current weather for
/// `fallback` first when nothing is loaded yet; returns `fallback` when that
/// load fails.
pub async fn resolve_location<A: WeatherApi>(store: &WeatherStore<A>, fallback: &str) -> String {
    if store.current_weather().is_none() {
        store.load_current_weather(fallback, &CurrentWeatherOptions::default()).await;
    }

    match store.current_location() {
        Some(location) => location.query_string(),
        None => fallback.to_string(),
    }
}
