//! Response and request types mirroring the WeatherAPI.com JSON shapes.
//!
//! Units follow the provider (metric/imperial pairs, epoch seconds,
//! condition codes). Integer fields stay integers and unknown fields land in
//! `extra`, so a stored value serializes back to the provider's JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Provider fields with no typed counterpart, kept so a value serializes
/// back to what was received.
pub type Extra = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub text: String,
    pub icon: String,
    pub code: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub tz_id: String,
    pub localtime_epoch: i64,
    pub localtime: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Location {
    /// The `"name, country"` query used for follow-up loads of this place.
    pub fn query_string(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    #[serde(rename = "us-epa-index")]
    pub us_epa_index: i32,
    #[serde(rename = "gb-defra-index")]
    pub gb_defra_index: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Current {
    pub last_updated_epoch: i64,
    pub last_updated: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: u8,
    pub condition: WeatherCondition,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub wind_degree: i64,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub pressure_in: f64,
    pub precip_mm: f64,
    pub precip_in: f64,
    pub humidity: i64,
    pub cloud: i64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub vis_km: f64,
    pub vis_miles: f64,
    pub uv: f64,
    pub gust_mph: f64,
    pub gust_kph: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQuality>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub maxtemp_c: f64,
    pub maxtemp_f: f64,
    pub mintemp_c: f64,
    pub mintemp_f: f64,
    pub avgtemp_c: f64,
    pub avgtemp_f: f64,
    pub maxwind_mph: f64,
    pub maxwind_kph: f64,
    pub totalprecip_mm: f64,
    pub totalprecip_in: f64,
    pub avgvis_km: f64,
    pub avgvis_miles: f64,
    #[serde(alias = "avg_humidity")]
    pub avghumidity: i64,
    pub condition: WeatherCondition,
    pub uv: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Sun and moon times as the provider formats them (`"06:12 AM"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Astro {
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub moon_phase: String,
    pub moon_illumination: serde_json::Value,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourForecast {
    pub time_epoch: i64,
    pub time: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: u8,
    pub condition: WeatherCondition,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub wind_degree: i64,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub pressure_in: f64,
    pub precip_mm: f64,
    pub precip_in: f64,
    pub humidity: i64,
    pub cloud: i64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windchill_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windchill_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatindex_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatindex_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dewpoint_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dewpoint_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub will_it_rain: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chance_of_rain: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub will_it_snow: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chance_of_snow: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vis_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vis_miles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust_mph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust_kph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQuality>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One day of a forecast, history or future response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub date_epoch: i64,
    pub day: DayForecast,
    pub astro: Astro,
    pub hour: Vec<HourForecast>,
    #[serde(flatten)]
    pub extra: Extra,
}

pub type HistoryDay = ForecastDay;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub forecastday: Vec<ForecastDay>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub headline: String,
    pub msgtype: String,
    pub severity: String,
    pub urgency: String,
    pub areas: String,
    pub category: String,
    pub certainty: String,
    pub event: String,
    pub note: String,
    pub effective: String,
    pub expires: String,
    pub desc: String,
    pub instruction: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Alerts {
    #[serde(default)]
    pub alert: Vec<Alert>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherResponse {
    pub location: Location,
    pub current: Current,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub location: Location,
    pub current: Current,
    pub forecast: Forecast,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Alerts>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLocationItem {
    pub id: i64,
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub url: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SearchLocationItem {
    pub fn query_string(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

pub type SearchResponse = Vec<SearchLocationItem>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub location: Location,
    pub forecast: Forecast,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub location: Location,
    pub alerts: Alerts,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstronomyBlock {
    pub astro: Astro,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstronomyResponse {
    pub location: Location,
    pub astronomy: AstronomyBlock,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarineDay {
    pub date: String,
    pub date_epoch: i64,
    pub day: DayForecast,
    pub astro: Astro,
    pub hour: Vec<HourForecast>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarineForecast {
    pub forecastday: Vec<MarineDay>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarineResponse {
    pub location: Location,
    pub forecast: MarineForecast,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportsEvent {
    pub stadium: String,
    pub country: String,
    pub tournament: String,
    pub start: String,
    #[serde(rename = "match")]
    pub match_name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sports {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub football: Option<Vec<SportsEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cricket: Option<Vec<SportsEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub golf: Option<Vec<SportsEvent>>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportsResponse {
    pub location: Location,
    pub sports: Sports,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeZoneResponse {
    pub location: Location,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureResponse {
    pub location: Location,
    pub forecast: Forecast,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpLookupResponse {
    pub ip: String,
    #[serde(rename = "type")]
    pub ip_type: String,
    pub continent_code: String,
    pub continent_name: String,
    pub country_code: String,
    pub country_name: String,
    pub is_eu: serde_json::Value,
    pub geoname_id: i64,
    pub city: String,
    pub region: String,
    pub lat: f64,
    pub lon: f64,
    pub tz_id: String,
    pub localtime_epoch: i64,
    pub localtime: String,
    #[serde(flatten)]
    pub extra: Extra,
}

// Request options. `None` means "leave the parameter out".

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentWeatherOptions {
    pub aqi: Option<bool>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastOptions {
    pub aqi: Option<bool>,
    pub alerts: Option<bool>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryOptions {
    pub end_dt: Option<NaiveDate>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AstronomyOptions {
    pub dt: Option<NaiveDate>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarineOptions {
    pub days: Option<u8>,
    pub lang: Option<String>,
}

/// Options for endpoints that only accept a language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LangOptions {
    pub lang: Option<String>,
}

pub type AlertsOptions = LangOptions;
pub type SportsOptions = LangOptions;
pub type TimeZoneOptions = LangOptions;
pub type FutureOptions = LangOptions;

/// Options for the combined current + forecast load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedOptions {
    pub current: CurrentWeatherOptions,
    pub forecast: ForecastOptions,
}

impl CombinedOptions {
    /// What the dashboard asks for on startup and on selection:
    /// air quality on both, alerts on the forecast.
    pub fn dashboard() -> Self {
        Self {
            current: CurrentWeatherOptions { aqi: Some(true), lang: None },
            forecast: ForecastOptions { aqi: Some(true), alerts: Some(true), lang: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_quality_uses_provider_index_names() {
        let json = serde_json::json!({
            "co": 230.3, "no2": 13.5, "o3": 54.2, "so2": 3.1,
            "pm2_5": 8.4, "pm10": 11.0,
            "us-epa-index": 1, "gb-defra-index": 1
        });

        let aq: AirQuality = serde_json::from_value(json).expect("valid air quality");
        assert_eq!(aq.us_epa_index, 1);
        assert_eq!(aq.gb_defra_index, 1);
    }

    #[test]
    fn sports_lists_are_optional() {
        let json = serde_json::json!({
            "football": [{
                "stadium": "Wembley", "country": "United Kingdom",
                "tournament": "FA Cup", "start": "2026-05-16 15:00",
                "match": "Arsenal vs Chelsea"
            }]
        });

        let sports: Sports = serde_json::from_value(json).expect("valid sports");
        assert_eq!(sports.football.as_ref().map(Vec::len), Some(1));
        assert!(sports.cricket.is_none());
        assert!(sports.golf.is_none());
    }

    #[test]
    fn unknown_fields_and_integers_survive_a_round_trip() {
        let json = serde_json::json!({
            "time_epoch": 1760698800, "time": "2026-10-17 12:00",
            "temp_c": 29.5, "temp_f": 85.1, "is_day": 1,
            "condition": { "text": "Sunny", "icon": "//cdn/113.png", "code": 1000 },
            "wind_mph": 8.1, "wind_kph": 13.0, "wind_degree": 65, "wind_dir": "ENE",
            "pressure_mb": 1009.0, "pressure_in": 29.8,
            "precip_mm": 0.0, "precip_in": 0.0,
            "humidity": 70, "cloud": 30,
            "feelslike_c": 33.2, "feelslike_f": 91.8,
            "chance_of_rain": 12, "will_it_rain": 0,
            "snow_cm": 0.0, "short_rad": 512.4
        });

        let hour: HourForecast = serde_json::from_value(json.clone()).expect("valid hour");
        assert_eq!(hour.humidity, 70);
        assert_eq!(hour.extra.get("short_rad"), Some(&serde_json::json!(512.4)));
        assert_eq!(serde_json::to_value(&hour).expect("serializable"), json);
    }

    #[test]
    fn search_item_query_string_joins_name_and_country() {
        let item = SearchLocationItem {
            id: 1,
            name: "London".into(),
            region: "City of London, Greater London".into(),
            country: "United Kingdom".into(),
            lat: 51.52,
            lon: -0.11,
            url: "london-city-of-london-greater-london-united-kingdom".into(),
            extra: Extra::new(),
        };

        assert_eq!(item.query_string(), "London, United Kingdom");
    }
}
