//! Shared fixtures and a scripted `WeatherApi` for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use weather_dash_core::{
    ApiError, WeatherApi,
    api::Endpoint,
    model::*,
};

pub fn location_json(name: &str) -> Value {
    json!({
        "name": name,
        "region": "Central Visayas",
        "country": "Philippines",
        "lat": 10.32,
        "lon": 123.89,
        "tz_id": "Asia/Manila",
        "localtime_epoch": 1709618400,
        "localtime": "2024-03-05 14:00"
    })
}

pub fn condition_json() -> Value {
    json!({ "text": "Partly cloudy", "icon": "//cdn.weatherapi.com/weather/64x64/day/116.png", "code": 1003 })
}

pub fn air_quality_json() -> Value {
    json!({
        "co": 223.6, "no2": 9.4, "o3": 61.1, "so2": 2.3,
        "pm2_5": 12.5, "pm10": 18.2,
        "us-epa-index": 1, "gb-defra-index": 2
    })
}

pub fn current_json() -> Value {
    json!({
        "last_updated_epoch": 1709618400,
        "last_updated": "2024-03-05 14:00",
        "temp_c": 31.0, "temp_f": 87.8,
        "is_day": 1,
        "condition": condition_json(),
        "wind_mph": 9.4, "wind_kph": 15.1, "wind_degree": 70, "wind_dir": "ENE",
        "pressure_mb": 1011.0, "pressure_in": 29.85,
        "precip_mm": 0.0, "precip_in": 0.0,
        "humidity": 63, "cloud": 25,
        "feelslike_c": 35.4, "feelslike_f": 95.7,
        "vis_km": 10.0, "vis_miles": 6.0,
        "uv": 8.0,
        "gust_mph": 10.8, "gust_kph": 17.4,
        "air_quality": air_quality_json()
    })
}

pub fn astro_json() -> Value {
    json!({
        "sunrise": "06:05 AM", "sunset": "06:02 PM",
        "moonrise": "03:12 AM", "moonset": "02:40 PM",
        "moon_phase": "Waning Crescent", "moon_illumination": 29
    })
}

pub fn hour_json(time: &str, epoch: i64) -> Value {
    json!({
        "time_epoch": epoch, "time": time,
        "temp_c": 29.5, "temp_f": 85.1, "is_day": 1,
        "condition": condition_json(),
        "wind_mph": 8.1, "wind_kph": 13.0, "wind_degree": 65, "wind_dir": "ENE",
        "pressure_mb": 1011.0, "pressure_in": 29.86,
        "precip_mm": 0.0, "precip_in": 0.0,
        "humidity": 70, "cloud": 30,
        "feelslike_c": 33.2, "feelslike_f": 91.8,
        "chance_of_rain": 12, "will_it_rain": 0,
        "uv": 7.0
    })
}

pub fn forecast_day_json(date: &str) -> Value {
    json!({
        "date": date,
        "date_epoch": 1709596800,
        "day": {
            "maxtemp_c": 31.8, "maxtemp_f": 89.2,
            "mintemp_c": 25.1, "mintemp_f": 77.2,
            "avgtemp_c": 27.9, "avgtemp_f": 82.2,
            "maxwind_mph": 12.3, "maxwind_kph": 19.8,
            "totalprecip_mm": 0.4, "totalprecip_in": 0.02,
            "avgvis_km": 10.0, "avgvis_miles": 6.0,
            "avghumidity": 71,
            "condition": condition_json(),
            "uv": 8.0
        },
        "astro": astro_json(),
        "hour": [
            hour_json(&format!("{date} 00:00"), 1709596800),
            hour_json(&format!("{date} 01:00"), 1709600400),
        ]
    })
}

pub fn alert_json(severity: &str) -> Value {
    json!({
        "headline": "Heavy rainfall warning",
        "msgtype": "Alert",
        "severity": severity,
        "urgency": "Expected",
        "areas": "Cebu",
        "category": "Met",
        "certainty": "Likely",
        "event": "Rainfall",
        "note": "",
        "effective": "2024-03-05T14:00:00+08:00",
        "expires": "2024-03-06T14:00:00+08:00",
        "desc": "Heavy rain expected.",
        "instruction": "Stay indoors."
    })
}

pub fn current_response_json(name: &str) -> Value {
    json!({ "location": location_json(name), "current": current_json() })
}

pub fn forecast_response_json(name: &str, alerts: &[Value]) -> Value {
    json!({
        "location": location_json(name),
        "current": current_json(),
        "forecast": { "forecastday": [forecast_day_json("2024-03-05"), forecast_day_json("2024-03-06")] },
        "alerts": { "alert": alerts }
    })
}

pub fn history_response_json(name: &str) -> Value {
    json!({
        "location": location_json(name),
        "forecast": { "forecastday": [forecast_day_json("2024-01-01")] }
    })
}

pub fn alerts_response_json(name: &str, alerts: &[Value]) -> Value {
    json!({ "location": location_json(name), "alerts": { "alert": alerts } })
}

pub fn search_response_json(names: &[&str]) -> Value {
    Value::Array(
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let id = i as i64 + 1;
                json!({
                    "id": id,
                    "name": name,
                    "region": "Region",
                    "country": "United Kingdom",
                    "lat": 51.5, "lon": -0.1,
                    "url": name.to_lowercase()
                })
            })
            .collect(),
    )
}

pub fn astronomy_response_json(name: &str) -> Value {
    json!({ "location": location_json(name), "astronomy": { "astro": astro_json() } })
}

pub fn marine_response_json(name: &str) -> Value {
    json!({
        "location": location_json(name),
        "forecast": { "forecastday": [forecast_day_json("2024-03-05")] }
    })
}

pub fn sports_response_json(name: &str) -> Value {
    json!({
        "location": location_json(name),
        "sports": {
            "football": [{
                "stadium": "Rizal Memorial", "country": "Philippines",
                "tournament": "PFL", "start": "2024-03-06 19:00", "match": "Kaya vs Ceres"
            }]
        }
    })
}

pub fn time_zone_response_json(name: &str) -> Value {
    json!({ "location": location_json(name) })
}

pub fn future_response_json(name: &str) -> Value {
    json!({
        "location": location_json(name),
        "forecast": { "forecastday": [forecast_day_json("2024-04-01")] }
    })
}

pub fn ip_lookup_response_json(ip: &str) -> Value {
    json!({
        "ip": ip, "type": "ipv4",
        "continent_code": "AS", "continent_name": "Asia",
        "country_code": "PH", "country_name": "Philippines",
        "is_eu": "false", "geoname_id": 1717512,
        "city": "Cebu", "region": "Central Visayas",
        "lat": 10.32, "lon": 123.89,
        "tz_id": "Asia/Manila",
        "localtime_epoch": 1709618400, "localtime": "2024-03-05 14:00"
    })
}

pub fn decode<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("fixture decodes")
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

/// A `WeatherApi` that answers from fixtures, records every call and can be
/// told to fail or delay per endpoint or per query.
#[derive(Debug, Default)]
pub struct FakeApi {
    calls: Mutex<Vec<(Endpoint, String)>>,
    failing: Mutex<HashSet<Endpoint>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, endpoint: Endpoint) {
        self.failing.lock().insert(endpoint);
    }

    pub fn fail_all(&self) {
        let mut failing = self.failing.lock();
        for endpoint in [
            Endpoint::Current,
            Endpoint::Forecast,
            Endpoint::Search,
            Endpoint::History,
            Endpoint::Alerts,
            Endpoint::Astronomy,
            Endpoint::Marine,
            Endpoint::Sports,
            Endpoint::TimeZone,
            Endpoint::Future,
            Endpoint::IpLookup,
        ] {
            failing.insert(endpoint);
        }
    }

    pub fn heal(&self) {
        self.failing.lock().clear();
    }

    /// Every request whose query equals `q` takes `delay` to answer.
    pub fn delay_query(&self, q: &str, delay: Duration) {
        self.delays.lock().insert(q.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<(Endpoint, String)> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<String> {
        self.calls.lock().iter().filter(|(e, _)| *e == endpoint).map(|(_, q)| q.clone()).collect()
    }

    async fn answer<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        q: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        self.calls.lock().push((endpoint, q.to_string()));

        let delay = self.delays.lock().get(q).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().contains(&endpoint) {
            return Err(ApiError::Status {
                endpoint,
                status: 400,
                message: format!("simulated failure for {q}"),
            });
        }

        Ok(decode(body))
    }
}

#[async_trait]
impl WeatherApi for FakeApi {
    async fn current_weather(
        &self,
        q: &str,
        _options: &CurrentWeatherOptions,
    ) -> Result<CurrentWeatherResponse, ApiError> {
        self.answer(Endpoint::Current, q, current_response_json(q)).await
    }

    async fn forecast(
        &self,
        q: &str,
        _days: u8,
        _options: &ForecastOptions,
    ) -> Result<ForecastResponse, ApiError> {
        self.answer(Endpoint::Forecast, q, forecast_response_json(q, &[])).await
    }

    async fn search_locations(&self, q: &str) -> Result<SearchResponse, ApiError> {
        self.answer(Endpoint::Search, q, search_response_json(&[q])).await
    }

    async fn history(
        &self,
        q: &str,
        _dt: NaiveDate,
        _options: &HistoryOptions,
    ) -> Result<HistoryResponse, ApiError> {
        self.answer(Endpoint::History, q, history_response_json(q)).await
    }

    async fn alerts(&self, q: &str, _options: &AlertsOptions) -> Result<AlertsResponse, ApiError> {
        self.answer(Endpoint::Alerts, q, alerts_response_json(q, &[alert_json("Moderate")])).await
    }

    async fn astronomy(
        &self,
        q: &str,
        _options: &AstronomyOptions,
    ) -> Result<AstronomyResponse, ApiError> {
        self.answer(Endpoint::Astronomy, q, astronomy_response_json(q)).await
    }

    async fn marine(&self, q: &str, _options: &MarineOptions) -> Result<MarineResponse, ApiError> {
        self.answer(Endpoint::Marine, q, marine_response_json(q)).await
    }

    async fn sports(&self, q: &str, _options: &SportsOptions) -> Result<SportsResponse, ApiError> {
        self.answer(Endpoint::Sports, q, sports_response_json(q)).await
    }

    async fn time_zone(
        &self,
        q: &str,
        _options: &TimeZoneOptions,
    ) -> Result<TimeZoneResponse, ApiError> {
        self.answer(Endpoint::TimeZone, q, time_zone_response_json(q)).await
    }

    async fn future(
        &self,
        q: &str,
        _dt: NaiveDate,
        _options: &FutureOptions,
    ) -> Result<FutureResponse, ApiError> {
        self.answer(Endpoint::Future, q, future_response_json(q)).await
    }

    async fn ip_lookup(&self, ip: Option<&str>) -> Result<IpLookupResponse, ApiError> {
        let q = ip.unwrap_or("");
        self.answer(Endpoint::IpLookup, q, ip_lookup_response_json(q)).await
    }
}
