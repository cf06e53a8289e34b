//! Startup sequence: public IP resolution followed by the dashboard loads.

mod common;

use common::*;
use serde_json::json;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use weather_dash_core::{
    Category, IpResolver, WeatherStore, api::Endpoint, initialize, load_dashboard,
    resolve_location,
};

#[tokio::test]
async fn resolved_ip_becomes_the_dashboard_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": "203.0.113.7" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = WeatherStore::new(FakeApi::new());
    let location = initialize(&store, &IpResolver::new(&server.uri())).await;

    assert_eq!(location, "203.0.113.7");
    let api = store.api();
    assert_eq!(api.calls_to(Endpoint::Current), vec!["203.0.113.7".to_string()]);
    assert_eq!(api.calls_to(Endpoint::Forecast), vec!["203.0.113.7".to_string()]);
    assert_eq!(api.calls_to(Endpoint::Alerts), vec!["203.0.113.7".to_string()]);
    assert!(store.current_weather().is_some());
    assert!(store.forecast().is_some());
    assert!(store.alerts().is_some());
    assert!(!store.loading());
}

#[tokio::test]
async fn failed_ip_lookup_falls_back_to_empty_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = WeatherStore::new(FakeApi::new());
    let location = initialize(&store, &IpResolver::new(&server.uri())).await;

    assert_eq!(location, "");
    assert_eq!(store.api().calls_to(Endpoint::Current), vec![String::new()]);
    assert_eq!(store.api().calls_to(Endpoint::Alerts), vec![String::new()]);
}

#[tokio::test]
async fn garbled_ip_response_falls_back_to_empty_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let store = WeatherStore::new(FakeApi::new());
    let location = initialize(&store, &IpResolver::new(&server.uri())).await;

    assert_eq!(location, "");
}

#[tokio::test]
async fn dashboard_keeps_partial_results_when_alerts_fail() {
    let store = WeatherStore::new(FakeApi::new());
    store.api().fail(Endpoint::Alerts);

    load_dashboard(&store, "Cebu, Philippines").await;

    assert!(store.current_weather().is_some());
    assert!(store.forecast().is_some());
    assert!(store.alerts().is_none());
    assert!(store.error().is_some());
}

#[tokio::test]
async fn dashboard_keeps_the_current_weather_failure() {
    let store = WeatherStore::new(FakeApi::new());
    store.api().fail(Endpoint::Current);

    load_dashboard(&store, "Cebu").await;

    assert!(store.current_weather().is_none());
    assert!(store.forecast().is_some());
    assert!(store.alerts().is_some());
    let error = store.last_error().expect("current failure kept");
    assert_eq!(error.category, Category::Current);
    assert!(!store.loading());
}

#[tokio::test]
async fn follow_up_loads_target_the_resolved_place() {
    let store = WeatherStore::new(FakeApi::new());
    load_dashboard(&store, "203.0.113.7").await;

    let location = resolve_location(&store, "203.0.113.7").await;

    assert_eq!(location, "203.0.113.7, Philippines");
    // Current weather was already loaded; nothing new is fetched.
    assert_eq!(store.api().calls_to(Endpoint::Current).len(), 1);
}

#[tokio::test]
async fn resolving_without_current_weather_loads_it_first() {
    let store = WeatherStore::new(FakeApi::new());

    let location = resolve_location(&store, "Cebu").await;

    assert_eq!(location, "Cebu, Philippines");
    assert_eq!(store.api().calls_to(Endpoint::Current), vec!["Cebu".to_string()]);
    assert!(store.current_weather().is_some());
}

#[tokio::test]
async fn resolving_falls_back_to_the_given_query_when_current_fails() {
    let store = WeatherStore::new(FakeApi::new());
    store.api().fail(Endpoint::Current);

    let location = resolve_location(&store, "Cebu").await;

    assert_eq!(location, "Cebu");
    assert!(store.error().is_some());
}
