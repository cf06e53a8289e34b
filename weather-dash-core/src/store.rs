//! Category store: one cell per weather category plus shared `loading` and
//! `error` state.
//!
//! Each `load_*` method marks a request in flight as soon as it is called,
//! then returns the future that calls the [`WeatherApi`] and writes the
//! outcome into its category's cell. It never returns an error: failures
//! become the store's error message and a cleared cell. Dropping the future
//! before it completes gives its in-flight count back.
//!
//! Requests are never aborted. Every cell carries a generation number; a
//! response is applied only while its generation is still the cell's
//! current one, so a newer request for the same category (or [`reset`])
//! makes older in-flight responses land nowhere.
//!
//! Observers either read the getters or [`subscribe`] to [`StoreEvent`]s.
//!
//! [`reset`]: WeatherStore::reset
//! [`subscribe`]: WeatherStore::subscribe

use chrono::NaiveDate;
use parking_lot::Mutex;
use std::{fmt, future::Future, sync::Arc};
use tokio::sync::broadcast;

use crate::{
    api::{WeatherApi, WeatherApiClient},
    error::ApiError,
    model::{
        Alert, AlertsOptions, AlertsResponse, AstronomyOptions, AstronomyResponse, CombinedOptions,
        Current, CurrentWeatherOptions, CurrentWeatherResponse, ForecastDay, ForecastOptions,
        ForecastResponse, FutureOptions, FutureResponse, HistoryDay, HistoryOptions,
        HistoryResponse, IpLookupResponse, Location, MarineOptions, MarineResponse, SearchResponse,
        SportsOptions, SportsResponse, TimeZoneOptions, TimeZoneResponse,
    },
};

const EVENT_CAPACITY: usize = 64;

/// One distinct weather data kind, each with its own cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
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

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Current,
        Category::Forecast,
        Category::Search,
        Category::History,
        Category::Alerts,
        Category::Astronomy,
        Category::Marine,
        Category::Sports,
        Category::TimeZone,
        Category::Future,
        Category::IpLookup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Current => "current",
            Category::Forecast => "forecast",
            Category::Search => "search",
            Category::History => "history",
            Category::Alerts => "alerts",
            Category::Astronomy => "astronomy",
            Category::Marine => "marine",
            Category::Sports => "sports",
            Category::TimeZone => "timezone",
            Category::Future => "future",
            Category::IpLookup => "ip-lookup",
        }
    }

    /// Shown when a failure carries no message of its own.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Category::Current => "Failed to load current weather",
            Category::Forecast => "Failed to load forecast",
            Category::Search => "Failed to search locations",
            Category::History => "Failed to load historical data",
            Category::Alerts => "Failed to load alerts",
            Category::Astronomy => "Failed to load astronomy data",
            Category::Marine => "Failed to load marine weather",
            Category::Sports => "Failed to load sports weather",
            Category::TimeZone => "Failed to load time zone data",
            Category::Future => "Failed to load future weather",
            Category::IpLookup => "Failed to load IP lookup data",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change notifications published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Started(Category),
    Updated(Category),
    Failed { category: Category, message: String },
    /// A superseded response arrived and was dropped.
    Discarded(Category),
    Reset,
}

/// The last failure, with the category that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub category: Category,
    pub message: String,
}

struct Slot<T> {
    value: Option<Arc<T>>,
    generation: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self { value: None, generation: 0 }
    }
}

impl<T> Slot<T> {
    fn clear(&mut self) {
        self.value = None;
        self.generation += 1;
    }
}

#[derive(Default)]
struct StoreState {
    current: Slot<CurrentWeatherResponse>,
    forecast: Slot<ForecastResponse>,
    search: Slot<SearchResponse>,
    history: Slot<HistoryResponse>,
    alerts: Slot<AlertsResponse>,
    astronomy: Slot<AstronomyResponse>,
    marine: Slot<MarineResponse>,
    sports: Slot<SportsResponse>,
    time_zone: Slot<TimeZoneResponse>,
    future: Slot<FutureResponse>,
    ip_lookup: Slot<IpLookupResponse>,
    in_flight: usize,
    // Bumped by reset so completions from before it leave `in_flight` alone.
    epoch: u64,
    error: Option<StoreError>,
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    epoch: u64,
    generation: u64,
}

pub struct WeatherStore<A = WeatherApiClient> {
    api: A,
    state: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl<A: fmt::Debug> fmt::Debug for WeatherStore<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherStore")
            .field("api", &self.api)
            .field("loading", &self.loading())
            .field("error", &self.error())
            .finish_non_exhaustive()
    }
}

impl<A: WeatherApi> WeatherStore<A> {
    pub fn new(api: A) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { api, state: Mutex::new(StoreState::default()), events }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn run<T, S, F>(&self, category: Category, slot: S, request: F) -> impl Future<Output = ()>
    where
        S: Fn(&mut StoreState) -> &mut Slot<T>,
        F: Future<Output = Result<T, ApiError>>,
    {
        let pending = self.begin(category, &slot);
        async move {
            let outcome = request.await;
            pending.finish(&slot, outcome);
        }
    }

    pub fn load_current_weather<'a>(
        &'a self,
        q: &'a str,
        options: &'a CurrentWeatherOptions,
    ) -> impl Future<Output = ()> + 'a {
        self.run(Category::Current, |s| &mut s.current, self.api.current_weather(q, options))
    }

    pub fn load_forecast<'a>(
        &'a self,
        q: &'a str,
        days: u8,
        options: &'a ForecastOptions,
    ) -> impl Future<Output = ()> + 'a {
        self.run(Category::Forecast, |s| &mut s.forecast, self.api.forecast(q, days, options))
    }

    /// A blank query clears the results without issuing a request.
    pub fn search_locations<'a>(&'a self, q: &'a str) -> impl Future<Output = ()> + 'a {
        let load = if q.trim().is_empty() {
            self.state.lock().search.clear();
            self.emit(StoreEvent::Updated(Category::Search));
            None
        } else {
            Some(self.run(Category::Search, |s| &mut s.search, self.api.search_locations(q)))
        };

        async move {
            if let Some(load) = load {
                load.await;
            }
        }
    }

    pub fn load_history<'a>(
        &'a self,
        q: &'a str,
        dt: NaiveDate,
        options: &'a HistoryOptions,
    ) -> impl Future<Output = ()> + 'a {
        self.run(Category::History, |s| &mut s.history, self.api.history(q, dt, options))
    }

    pub fn load_alerts<'a>(&'a self, q: &'a str, options: &'a AlertsOptions) -> impl Future<Output = ()> + 'a {
        self.run(Category::Alerts, |s| &mut s.alerts, self.api.alerts(q, options))
    }

    /// Loads current weather and forecast concurrently. Both requests are
    /// marked in flight before either runs, so one failing is never wiped by
    /// the other starting. Each writes only its own cell.
    pub fn load_weather_and_forecast<'a>(
        &'a self,
        q: &'a str,
        days: u8,
        options: &'a CombinedOptions,
    ) -> impl Future<Output = ()> + 'a {
        let current = self.load_current_weather(q, &options.current);
        let forecast = self.load_forecast(q, days, &options.forecast);
        async move {
            tokio::join!(current, forecast);
        }
    }

    pub fn load_astronomy<'a>(&'a self, q: &'a str, options: &'a AstronomyOptions) -> impl Future<Output = ()> + 'a {
        self.run(Category::Astronomy, |s| &mut s.astronomy, self.api.astronomy(q, options))
    }

    pub fn load_marine<'a>(&'a self, q: &'a str, options: &'a MarineOptions) -> impl Future<Output = ()> + 'a {
        self.run(Category::Marine, |s| &mut s.marine, self.api.marine(q, options))
    }

    pub fn load_sports<'a>(&'a self, q: &'a str, options: &'a SportsOptions) -> impl Future<Output = ()> + 'a {
        self.run(Category::Sports, |s| &mut s.sports, self.api.sports(q, options))
    }

    pub fn load_time_zone<'a>(&'a self, q: &'a str, options: &'a TimeZoneOptions) -> impl Future<Output = ()> + 'a {
        self.run(Category::TimeZone, |s| &mut s.time_zone, self.api.time_zone(q, options))
    }

    pub fn load_future<'a>(
        &'a self,
        q: &'a str,
        dt: NaiveDate,
        options: &'a FutureOptions,
    ) -> impl Future<Output = ()> + 'a {
        self.run(Category::Future, |s| &mut s.future, self.api.future(q, dt, options))
    }

    /// Without an IP the provider looks up the caller's own address.
    pub fn load_ip_lookup<'a>(&'a self, ip: Option<&'a str>) -> impl Future<Output = ()> + 'a {
        self.run(Category::IpLookup, |s| &mut s.ip_lookup, self.api.ip_lookup(ip))
    }
}

/// A request counted in flight. Dropping it unfinished (a timeout, an
/// aborted task) releases its share of the in-flight count.
struct Pending<'a, A> {
    store: &'a WeatherStore<A>,
    category: Category,
    ticket: Ticket,
    settled: bool,
}

impl<A> Pending<'_, A> {
    fn finish<T, S>(mut self, slot: &S, outcome: Result<T, ApiError>)
    where
        S: Fn(&mut StoreState) -> &mut Slot<T>,
    {
        self.settled = true;
        self.store.settle(self.category, slot, self.ticket, outcome);
    }
}

impl<A> Drop for Pending<'_, A> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        tracing::debug!(category = %self.category, "Load dropped before completion");
        self.store.release(self.ticket);
        self.store.emit(StoreEvent::Discarded(self.category));
    }
}

impl<A> WeatherStore<A> {
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn begin<T, S>(&self, category: Category, slot: &S) -> Pending<'_, A>
    where
        S: Fn(&mut StoreState) -> &mut Slot<T>,
    {
        let ticket = {
            let mut state = self.state.lock();
            state.in_flight += 1;
            state.error = None;
            let epoch = state.epoch;
            let cell = slot(&mut *state);
            cell.generation += 1;
            Ticket { epoch, generation: cell.generation }
        };

        self.emit(StoreEvent::Started(category));
        Pending { store: self, category, ticket, settled: false }
    }

    fn release(&self, ticket: Ticket) {
        let mut state = self.state.lock();
        if state.epoch == ticket.epoch {
            state.in_flight = state.in_flight.saturating_sub(1);
        }
    }

    fn settle<T, S>(
        &self,
        category: Category,
        slot: &S,
        ticket: Ticket,
        outcome: Result<T, ApiError>,
    ) where
        S: Fn(&mut StoreState) -> &mut Slot<T>,
    {
        let event = {
            let mut state = self.state.lock();
            if state.epoch == ticket.epoch {
                state.in_flight = state.in_flight.saturating_sub(1);
            }

            let cell = slot(&mut *state);
            if cell.generation != ticket.generation {
                tracing::debug!(%category, "Discarding superseded response");
                StoreEvent::Discarded(category)
            } else {
                match outcome {
                    Ok(value) => {
                        cell.value = Some(Arc::new(value));
                        StoreEvent::Updated(category)
                    }
                    Err(err) => {
                        cell.value = None;
                        let message = failure_message(&err, category);
                        tracing::warn!(%category, error = %err, "Load failed");
                        state.error = Some(StoreError { category, message: message.clone() });
                        StoreEvent::Failed { category, message }
                    }
                }
            }
        };

        self.emit(event);
    }

    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }

    /// Nulls every cell, clears the error and the busy state. Requests still
    /// in flight are superseded: their responses are discarded on arrival.
    pub fn reset(&self) {
        {
            let mut state = self.state.lock();
            state.current.clear();
            state.forecast.clear();
            state.search.clear();
            state.history.clear();
            state.alerts.clear();
            state.astronomy.clear();
            state.marine.clear();
            state.sports.clear();
            state.time_zone.clear();
            state.future.clear();
            state.ip_lookup.clear();
            state.in_flight = 0;
            state.epoch += 1;
            state.error = None;
        }

        self.emit(StoreEvent::Reset);
    }

    /// True while at least one request is in flight.
    pub fn loading(&self) -> bool {
        self.state.lock().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.as_ref().map(|e| e.message.clone())
    }

    pub fn last_error(&self) -> Option<StoreError> {
        self.state.lock().error.clone()
    }

    pub fn has_value(&self, category: Category) -> bool {
        let state = self.state.lock();
        match category {
            Category::Current => state.current.value.is_some(),
            Category::Forecast => state.forecast.value.is_some(),
            Category::Search => state.search.value.is_some(),
            Category::History => state.history.value.is_some(),
            Category::Alerts => state.alerts.value.is_some(),
            Category::Astronomy => state.astronomy.value.is_some(),
            Category::Marine => state.marine.value.is_some(),
            Category::Sports => state.sports.value.is_some(),
            Category::TimeZone => state.time_zone.value.is_some(),
            Category::Future => state.future.value.is_some(),
            Category::IpLookup => state.ip_lookup.value.is_some(),
        }
    }

    pub fn current_weather(&self) -> Option<Arc<CurrentWeatherResponse>> {
        self.state.lock().current.value.clone()
    }

    pub fn forecast(&self) -> Option<Arc<ForecastResponse>> {
        self.state.lock().forecast.value.clone()
    }

    /// Search results; empty when nothing was searched or the search failed.
    pub fn search_results(&self) -> Arc<SearchResponse> {
        self.state.lock().search.value.clone().unwrap_or_default()
    }

    pub fn history(&self) -> Option<Arc<HistoryResponse>> {
        self.state.lock().history.value.clone()
    }

    pub fn alerts(&self) -> Option<Arc<AlertsResponse>> {
        self.state.lock().alerts.value.clone()
    }

    pub fn astronomy(&self) -> Option<Arc<AstronomyResponse>> {
        self.state.lock().astronomy.value.clone()
    }

    pub fn marine(&self) -> Option<Arc<MarineResponse>> {
        self.state.lock().marine.value.clone()
    }

    pub fn sports(&self) -> Option<Arc<SportsResponse>> {
        self.state.lock().sports.value.clone()
    }

    pub fn time_zone(&self) -> Option<Arc<TimeZoneResponse>> {
        self.state.lock().time_zone.value.clone()
    }

    pub fn future(&self) -> Option<Arc<FutureResponse>> {
        self.state.lock().future.value.clone()
    }

    pub fn ip_lookup(&self) -> Option<Arc<IpLookupResponse>> {
        self.state.lock().ip_lookup.value.clone()
    }

    pub fn current_location(&self) -> Option<Location> {
        self.current_weather().map(|c| c.location.clone())
    }

    pub fn current_data(&self) -> Option<Current> {
        self.current_weather().map(|c| c.current.clone())
    }

    /// Alerts from the dedicated endpoint when loaded, otherwise the ones
    /// embedded in the forecast.
    pub fn alert_list(&self) -> Vec<Alert> {
        if let Some(alerts) = self.alerts() {
            return alerts.alerts.alert.clone();
        }

        self.forecast()
            .and_then(|f| f.alerts.as_ref().map(|a| a.alert.clone()))
            .unwrap_or_default()
    }

    pub fn forecast_days(&self) -> Vec<ForecastDay> {
        self.forecast().map(|f| f.forecast.forecastday.clone()).unwrap_or_default()
    }

    pub fn history_days(&self) -> Vec<HistoryDay> {
        self.history().map(|h| h.forecast.forecastday.clone()).unwrap_or_default()
    }
}

/// An error body with nothing to say falls back to the category's message.
fn failure_message(err: &ApiError, category: Category) -> String {
    match err {
        ApiError::Status { status, message, .. } if message.trim().is_empty() => {
            format!("{} (HTTP {status})", category.fallback_message())
        }
        _ => err.to_string(),
    }
}
