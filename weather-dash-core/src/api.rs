use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::fmt::{self, Debug};
use tracing::instrument;

use crate::{
    Config,
    error::ApiError,
    model::{
        AlertsOptions, AlertsResponse, AstronomyOptions, AstronomyResponse, CurrentWeatherOptions,
        CurrentWeatherResponse, ForecastOptions, ForecastResponse, FutureOptions, FutureResponse,
        HistoryOptions, HistoryResponse, IpLookupResponse, MarineOptions, MarineResponse,
        SearchResponse, SportsOptions, SportsResponse, TimeZoneOptions, TimeZoneResponse,
    },
};

pub const DEFAULT_API_URL: &str = "https://api.weatherapi.com";
pub const DEFAULT_FORECAST_DAYS: u8 = 3;

/// The provider endpoints under `/v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Current,
    Forecast,
    Search,
    History,
    Alerts,
    Astronomy,
    Marine,
    Sports,
    TimeZone,
    Future,
    IpLookup,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "current",
            Endpoint::Forecast => "forecast",
            Endpoint::Search => "search",
            Endpoint::History => "history",
            Endpoint::Alerts => "alerts",
            Endpoint::Astronomy => "astronomy",
            Endpoint::Marine => "marine",
            Endpoint::Sports => "sports",
            Endpoint::TimeZone => "timezone",
            Endpoint::Future => "future",
            Endpoint::IpLookup => "ip",
        }
    }

    pub fn path(&self) -> String {
        format!("/v1/{}.json", self.as_str())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered query parameters for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    pub fn new(api_key: &str) -> Self {
        Self { pairs: vec![("key", api_key.to_string())] }
    }

    pub fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.pairs.push((name, value.to_string()));
        self
    }

    /// Boolean flags go over the wire as `yes`/`no`.
    pub fn flag(self, name: &'static str, value: Option<bool>) -> Self {
        match value {
            Some(v) => self.with(name, if v { "yes" } else { "no" }),
            None => self,
        }
    }

    /// Adds `name` only for a present, non-empty value.
    pub fn text(self, name: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.with(name, v),
            _ => self,
        }
    }

    pub fn date(self, name: &'static str, value: Option<NaiveDate>) -> Self {
        match value {
            Some(d) => self.with(name, format_api_date(d)),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }
}

pub fn format_api_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn current_params(api_key: &str, q: &str, options: &CurrentWeatherOptions) -> QueryParams {
    QueryParams::new(api_key)
        .with("q", q)
        .flag("aqi", options.aqi)
        .text("lang", options.lang.as_deref())
}

pub fn forecast_params(api_key: &str, q: &str, days: u8, options: &ForecastOptions) -> QueryParams {
    QueryParams::new(api_key)
        .with("q", q)
        .with("days", days)
        .flag("aqi", options.aqi)
        .flag("alerts", options.alerts)
        .text("lang", options.lang.as_deref())
}

pub fn history_params(
    api_key: &str,
    q: &str,
    dt: NaiveDate,
    options: &HistoryOptions,
) -> QueryParams {
    QueryParams::new(api_key)
        .with("q", q)
        .date("dt", Some(dt))
        .date("end_dt", options.end_dt)
        .text("lang", options.lang.as_deref())
}

pub fn astronomy_params(api_key: &str, q: &str, options: &AstronomyOptions) -> QueryParams {
    QueryParams::new(api_key)
        .with("q", q)
        .date("dt", options.dt)
        .text("lang", options.lang.as_deref())
}

pub fn marine_params(api_key: &str, q: &str, options: &MarineOptions) -> QueryParams {
    let params = QueryParams::new(api_key).with("q", q);
    let params = match options.days {
        Some(days) if days > 0 => params.with("days", days),
        _ => params,
    };
    params.text("lang", options.lang.as_deref())
}

pub fn lang_params(api_key: &str, q: &str, lang: Option<&str>) -> QueryParams {
    QueryParams::new(api_key).with("q", q).text("lang", lang)
}

pub fn future_params(api_key: &str, q: &str, dt: NaiveDate, options: &FutureOptions) -> QueryParams {
    QueryParams::new(api_key)
        .with("q", q)
        .date("dt", Some(dt))
        .text("lang", options.lang.as_deref())
}

/// Without an IP the provider resolves the caller's own address.
pub fn ip_lookup_params(api_key: &str, ip: Option<&str>) -> QueryParams {
    QueryParams::new(api_key).text("q", ip)
}

/// One call per weather category. Failures are returned unchanged; there is
/// no retry and no response validation beyond decoding.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current_weather(
        &self,
        q: &str,
        options: &CurrentWeatherOptions,
    ) -> Result<CurrentWeatherResponse, ApiError>;

    async fn forecast(
        &self,
        q: &str,
        days: u8,
        options: &ForecastOptions,
    ) -> Result<ForecastResponse, ApiError>;

    async fn search_locations(&self, q: &str) -> Result<SearchResponse, ApiError>;

    async fn history(
        &self,
        q: &str,
        dt: NaiveDate,
        options: &HistoryOptions,
    ) -> Result<HistoryResponse, ApiError>;

    async fn alerts(&self, q: &str, options: &AlertsOptions) -> Result<AlertsResponse, ApiError>;

    async fn astronomy(
        &self,
        q: &str,
        options: &AstronomyOptions,
    ) -> Result<AstronomyResponse, ApiError>;

    async fn marine(&self, q: &str, options: &MarineOptions) -> Result<MarineResponse, ApiError>;

    async fn sports(&self, q: &str, options: &SportsOptions) -> Result<SportsResponse, ApiError>;

    async fn time_zone(
        &self,
        q: &str,
        options: &TimeZoneOptions,
    ) -> Result<TimeZoneResponse, ApiError>;

    async fn future(
        &self,
        q: &str,
        dt: NaiveDate,
        options: &FutureOptions,
    ) -> Result<FutureResponse, ApiError>;

    async fn ip_lookup(&self, ip: Option<&str>) -> Result<IpLookupResponse, ApiError>;
}

#[derive(Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

// Keeps the key out of logs and panics.
impl Debug for WeatherApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl WeatherApiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: QueryParams,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint.path());

        let res = self
            .http
            .get(&url)
            .query(params.pairs())
            .send()
            .await
            .map_err(|source| ApiError::Network { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| ApiError::Network { endpoint, source })?;

        tracing::debug!(%endpoint, status = status.as_u16(), bytes = body.len(), "WeatherAPI response");

        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { endpoint, source })
    }
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

/// The provider wraps failures as `{"error":{"code":..,"message":..}}`;
/// anything else is reported as a truncated body.
fn provider_message(body: &str) -> String {
    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => truncate_body(body),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[async_trait]
impl WeatherApi for WeatherApiClient {
    #[instrument(skip(self, options), level = "info")]
    async fn current_weather(
        &self,
        q: &str,
        options: &CurrentWeatherOptions,
    ) -> Result<CurrentWeatherResponse, ApiError> {
        self.fetch(Endpoint::Current, current_params(&self.api_key, q, options)).await
    }

    #[instrument(skip(self, options), level = "info")]
    async fn forecast(
        &self,
        q: &str,
        days: u8,
        options: &ForecastOptions,
    ) -> Result<ForecastResponse, ApiError> {
        self.fetch(Endpoint::Forecast, forecast_params(&self.api_key, q, days, options)).await
    }

    #[instrument(skip(self), level = "info")]
    async fn search_locations(&self, q: &str) -> Result<SearchResponse, ApiError> {
        self.fetch(Endpoint::Search, QueryParams::new(&self.api_key).with("q", q)).await
    }

    #[instrument(skip(self, options), level = "info")]
    async fn history(
        &self,
        q: &str,
        dt: NaiveDate,
        options: &HistoryOptions,
    ) -> Result<HistoryResponse, ApiError> {
        self.fetch(Endpoint::History, history_params(&self.api_key, q, dt, options)).await
    }

    #[instrument(skip(self, options), level = "info")]
    async fn alerts(&self, q: &str, options: &AlertsOptions) -> Result<AlertsResponse, ApiError> {
        self.fetch(Endpoint::Alerts, lang_params(&self.api_key, q, options.lang.as_deref())).await
    }

    #[instrument(skip(self, options), level = "info")]
    async fn astronomy(
        &self,
        q: &str,
        options: &AstronomyOptions,
    ) -> Result<AstronomyResponse, ApiError> {
        self.fetch(Endpoint::Astronomy, astronomy_params(&self.api_key, q, options)).await
    }

    #[instrument(skip(self, options), level = "info")]
    async fn marine(&self, q: &str, options: &MarineOptions) -> Result<MarineResponse, ApiError> {
        self.fetch(Endpoint::Marine, marine_params(&self.api_key, q, options)).await
    }

    #[instrument(skip(self, options), level = "info")]
    async fn sports(&self, q: &str, options: &SportsOptions) -> Result<SportsResponse, ApiError> {
        self.fetch(Endpoint::Sports, lang_params(&self.api_key, q, options.lang.as_deref())).await
    }

    #[instrument(skip(self, options), level = "info")]
    async fn time_zone(
        &self,
        q: &str,
        options: &TimeZoneOptions,
    ) -> Result<TimeZoneResponse, ApiError> {
        self.fetch(Endpoint::TimeZone, lang_params(&self.api_key, q, options.lang.as_deref()))
            .await
    }

    #[instrument(skip(self, options), level = "info")]
    async fn future(
        &self,
        q: &str,
        dt: NaiveDate,
        options: &FutureOptions,
    ) -> Result<FutureResponse, ApiError> {
        self.fetch(Endpoint::Future, future_params(&self.api_key, q, dt, options)).await
    }

    #[instrument(skip(self), level = "info")]
    async fn ip_lookup(&self, ip: Option<&str>) -> Result<IpLookupResponse, ApiError> {
        self.fetch(Endpoint::IpLookup, ip_lookup_params(&self.api_key, ip)).await
    }
}

/// Construct the API client from config, resolving the key from the
/// environment first.
pub fn client_from_config(config: &Config) -> anyhow::Result<WeatherApiClient> {
    let api_key = config.api_key()?;
    Ok(WeatherApiClient::with_base_url(api_key, &config.api_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn endpoint_paths_follow_v1_layout() {
        assert_eq!(Endpoint::Current.path(), "/v1/current.json");
        assert_eq!(Endpoint::TimeZone.path(), "/v1/timezone.json");
        assert_eq!(Endpoint::IpLookup.path(), "/v1/ip.json");
    }

    #[test]
    fn current_params_encode_aqi_as_yes_no() {
        let opts = CurrentWeatherOptions { aqi: Some(true), lang: None };
        let params = current_params("KEY", "Paris", &opts);
        assert_eq!(
            params.pairs(),
            &[("key", "KEY".to_string()), ("q", "Paris".to_string()), ("aqi", "yes".to_string())]
        );

        let opts = CurrentWeatherOptions { aqi: Some(false), lang: Some("fr".into()) };
        let params = current_params("KEY", "Paris", &opts);
        assert_eq!(params.get("aqi"), Some("no"));
        assert_eq!(params.get("lang"), Some("fr"));
    }

    #[test]
    fn unset_options_are_left_out() {
        let params = current_params("KEY", "Paris", &CurrentWeatherOptions::default());
        assert_eq!(params.get("aqi"), None);
        assert_eq!(params.get("lang"), None);

        let opts = CurrentWeatherOptions { aqi: None, lang: Some(String::new()) };
        assert_eq!(current_params("KEY", "Paris", &opts).get("lang"), None);
    }

    #[test]
    fn forecast_params_always_carry_days() {
        let opts = ForecastOptions { aqi: Some(true), alerts: Some(false), lang: None };
        let params = forecast_params("KEY", "Cebu", 7, &opts);
        assert_eq!(params.get("days"), Some("7"));
        assert_eq!(params.get("aqi"), Some("yes"));
        assert_eq!(params.get("alerts"), Some("no"));
    }

    #[test]
    fn history_params_format_dates() {
        let opts = HistoryOptions { end_dt: Some(date("2024-03-05")), lang: None };
        let params = history_params("KEY", "Cebu", date("2024-03-01"), &opts);
        assert_eq!(params.get("dt"), Some("2024-03-01"));
        assert_eq!(params.get("end_dt"), Some("2024-03-05"));
    }

    #[test]
    fn marine_days_zero_is_omitted() {
        let opts = MarineOptions { days: Some(0), lang: None };
        assert_eq!(marine_params("KEY", "Cebu", &opts).get("days"), None);

        let opts = MarineOptions { days: Some(3), lang: None };
        assert_eq!(marine_params("KEY", "Cebu", &opts).get("days"), Some("3"));
    }

    #[test]
    fn ip_lookup_without_ip_sends_only_key() {
        assert_eq!(ip_lookup_params("KEY", None).pairs(), &[("key", "KEY".to_string())]);
        assert_eq!(ip_lookup_params("KEY", Some("")).get("q"), None);
        assert_eq!(ip_lookup_params("KEY", Some("8.8.8.8")).get("q"), Some("8.8.8.8"));
    }

    #[test]
    fn provider_message_extracts_error_message() {
        let body = r#"{"error":{"code":1006,"message":"No matching location found."}}"#;
        assert_eq!(provider_message(body), "No matching location found.");
        assert_eq!(provider_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = WeatherApiClient::new("SECRET".into());
        assert!(!format!("{client:?}").contains("SECRET"));
    }
}
