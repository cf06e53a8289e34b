//! Search-as-you-type for locations.
//!
//! [`LocationSearch`] is a plain state machine fed with discrete events and
//! explicit instants:
//!
//! ```text
//! Idle ──input──▶ Debouncing ──deadline──▶ Searching ──completed──▶ Idle
//!   ▲                 │ input (re-arms)        │ input
//!   │                 ▼                        ▼
//!   └──echo── Selecting ◀──select── (any)   Debouncing
//! ```
//!
//! [`SearchDriver`] runs it on tokio: input arrives over a channel, the
//! debounce deadline is a `sleep_until`, and searches and selection loads are
//! spawned into a `JoinSet` against the [`WeatherStore`].

use std::{future, sync::Arc, time::Duration};
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinSet},
    time::{Instant, sleep_until},
};

use crate::{
    api::WeatherApi,
    config::{DASHBOARD_FORECAST_DAYS, DEFAULT_LOCATION},
    model::{AlertsOptions, CombinedOptions, SearchLocationItem},
    store::WeatherStore,
};

pub const DEBOUNCE: Duration = Duration::from_millis(300);
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Debouncing { query: String, deadline: Instant },
    Searching { query: String },
    /// A selection was made; the matching echo of `value` into the input is
    /// swallowed.
    Selecting { value: String },
}

/// What the owner of the state machine should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    Search(String),
    /// Load weather, forecast and alerts for this location query.
    LoadLocation(String),
}

#[derive(Debug, Clone)]
pub struct LocationSearch {
    state: SearchState,
    query: String,
    selected: String,
    show_results: bool,
}

impl Default for LocationSearch {
    fn default() -> Self {
        Self::with_selected(DEFAULT_LOCATION)
    }
}

impl LocationSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selected(selected: &str) -> Self {
        Self {
            state: SearchState::Idle,
            query: String::new(),
            selected: selected.to_string(),
            show_results: false,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn show_results(&self) -> bool {
        self.show_results
    }

    /// Pending debounce deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            SearchState::Debouncing { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    /// The input text changed.
    pub fn input(&mut self, query: &str, now: Instant) {
        self.query = query.to_string();

        if let SearchState::Selecting { value } = &self.state {
            if value == query {
                self.state = SearchState::Idle;
                return;
            }
        }

        if query == self.selected {
            self.show_results = false;
            self.state = SearchState::Idle;
            return;
        }

        if query.chars().count() >= MIN_QUERY_CHARS {
            self.state = SearchState::Debouncing {
                query: query.to_string(),
                deadline: now + DEBOUNCE,
            };
        } else {
            self.show_results = false;
            self.state = SearchState::Idle;
        }
    }

    /// Fires the debounced search once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<SearchAction> {
        match &self.state {
            SearchState::Debouncing { query, deadline } if now >= *deadline => {
                let query = query.clone();
                self.state = SearchState::Searching { query: query.clone() };
                self.show_results = true;
                Some(SearchAction::Search(query))
            }
            _ => None,
        }
    }

    /// A search finished. Results of an older query leave the state alone.
    pub fn search_completed(&mut self, query: &str) {
        if matches!(&self.state, SearchState::Searching { query: q } if q == query) {
            self.state = SearchState::Idle;
        }
    }

    pub fn select(&mut self, item: &SearchLocationItem) -> SearchAction {
        let value = item.query_string();
        self.selected = value.clone();
        self.show_results = false;
        self.state = SearchState::Selecting { value: value.clone() };
        SearchAction::LoadLocation(value)
    }

    pub fn focus(&mut self, has_results: bool) {
        if has_results {
            self.show_results = true;
        }
    }

    pub fn blur(&mut self) {
        self.show_results = false;
    }
}

/// Input events for [`SearchDriver`].
#[derive(Debug, Clone)]
pub enum SearchInput {
    Typed(String),
    Select(SearchLocationItem),
    Focus,
    Blur,
}

enum Wakeup {
    Input(Option<SearchInput>),
    Deadline,
    /// A spawned task ended; searches report their query.
    Joined(Option<String>),
}

pub struct SearchDriver<A> {
    store: Arc<WeatherStore<A>>,
    search: LocationSearch,
    days: u8,
}

impl<A: WeatherApi + 'static> SearchDriver<A> {
    pub fn new(store: Arc<WeatherStore<A>>) -> Self {
        Self { store, search: LocationSearch::new(), days: DASHBOARD_FORECAST_DAYS }
    }

    pub fn with_search(mut self, search: LocationSearch) -> Self {
        self.search = search;
        self
    }

    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }

    /// Consumes input until the sender side closes. A search still waiting
    /// on its debounce then fires, and the driver waits for every search and
    /// load it spawned before returning the final search state.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<SearchInput>) -> LocationSearch {
        let mut tasks = JoinSet::new();

        loop {
            let deadline = self.search.deadline();
            let wakeup = tokio::select! {
                input = inputs.recv() => Wakeup::Input(input),
                Some(joined) = tasks.join_next() => Wakeup::Joined(finished_query(joined)),
                _ = async {
                    match deadline {
                        Some(at) => sleep_until(at).await,
                        None => future::pending::<()>().await,
                    }
                } => Wakeup::Deadline,
            };

            match wakeup {
                Wakeup::Input(None) => break,
                Wakeup::Input(Some(input)) => self.handle(input, &mut tasks),
                Wakeup::Deadline => self.fire(&mut tasks),
                Wakeup::Joined(Some(query)) => self.search.search_completed(&query),
                Wakeup::Joined(None) => {}
            }
        }

        if let Some(at) = self.search.deadline() {
            sleep_until(at).await;
            self.fire(&mut tasks);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Some(query) = finished_query(joined) {
                self.search.search_completed(&query);
            }
        }

        self.search
    }

    fn handle(&mut self, input: SearchInput, tasks: &mut JoinSet<Option<String>>) {
        match input {
            SearchInput::Typed(text) => self.search.input(&text, Instant::now()),
            SearchInput::Select(item) => {
                let action = self.search.select(&item);
                self.dispatch(action, tasks);
            }
            SearchInput::Focus => {
                let has_results = !self.store.search_results().is_empty();
                self.search.focus(has_results);
            }
            SearchInput::Blur => self.search.blur(),
        }
    }

    fn fire(&mut self, tasks: &mut JoinSet<Option<String>>) {
        if let Some(action) = self.search.poll(Instant::now()) {
            self.dispatch(action, tasks);
        }
    }

    fn dispatch(&self, action: SearchAction, tasks: &mut JoinSet<Option<String>>) {
        match action {
            SearchAction::Search(query) => {
                tracing::debug!(%query, "Debounced location search");
                let store = Arc::clone(&self.store);
                tasks.spawn(async move {
                    store.search_locations(&query).await;
                    Some(query)
                });
            }
            SearchAction::LoadLocation(location) => {
                tracing::info!(%location, "Loading selected location");
                let days = self.days;

                let store = Arc::clone(&self.store);
                let q = location.clone();
                tasks.spawn(async move {
                    store.load_weather_and_forecast(&q, days, &CombinedOptions::dashboard()).await;
                    None
                });

                let store = Arc::clone(&self.store);
                tasks.spawn(async move {
                    store.load_alerts(&location, &AlertsOptions::default()).await;
                    None
                });
            }
        }
    }
}

fn finished_query(joined: Result<Option<String>, JoinError>) -> Option<String> {
    joined.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Search task failed");
        None
    })
}
