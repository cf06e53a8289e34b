use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{
        broadcast::error::{RecvError, TryRecvError},
        mpsc,
    },
};

use weather_dash_core::{
    Category, Config, IpResolver, LocationSearch, SearchDriver, SearchInput, StoreEvent, Theme,
    ThemeStore, WeatherStore, client_from_config, initialize, load_dashboard, resolve_location,
    model::{
        AlertsOptions, AstronomyOptions, CurrentWeatherOptions, ForecastOptions, HistoryOptions,
        LangOptions, MarineOptions,
    },
    present::DateWindow,
    search::SearchAction,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dash", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    /// Print the provider response as JSON instead of formatted text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct LocationArg {
    /// City, "lat,lon", postcode or IP. Defaults to the configured location.
    pub location: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI key and default location.
    Configure,

    /// Current conditions, forecast and alerts. Without a location the
    /// public IP is used.
    Dashboard {
        #[arg(long)]
        location: Option<String>,
    },

    /// Current conditions.
    Current(LocationArg),

    /// Daily forecast.
    Forecast {
        #[command(flatten)]
        location: LocationArg,

        /// Number of days (1-14). Defaults to the configured value.
        #[arg(long)]
        days: Option<u8>,
    },

    /// Hour-by-hour forecast for one day.
    Hourly {
        #[command(flatten)]
        location: LocationArg,

        /// Day offset into the forecast, 0 being today (at most 13).
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..14))]
        day: u8,
    },

    /// Find locations matching a query.
    Search { query: String },

    /// Search, choose a result interactively and show its dashboard.
    Pick { query: String },

    /// Type queries line by line; `:N` selects result N. Ends on EOF.
    LiveSearch,

    /// Weather for a past date (2010-01-01 onwards).
    History {
        #[command(flatten)]
        location: LocationArg,

        #[arg(long)]
        date: NaiveDate,

        /// Last day of a range.
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Active weather alerts.
    Alerts(LocationArg),

    /// Sun and moon times.
    Astronomy {
        #[command(flatten)]
        location: LocationArg,

        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Air quality index and pollutant levels.
    AirQuality(LocationArg),

    /// Marine forecast.
    Marine {
        #[command(flatten)]
        location: LocationArg,

        #[arg(long)]
        days: Option<u8>,
    },

    /// Upcoming sports events.
    Sports(LocationArg),

    /// Time zone and local time.
    Timezone(LocationArg),

    /// Weather 14 to 300 days ahead.
    Future {
        #[command(flatten)]
        location: LocationArg,

        #[arg(long)]
        date: NaiveDate,
    },

    /// Geolocate an IP address, or the caller's own.
    Ip { ip: Option<String> },

    /// Show or change the saved theme.
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ThemeAction {
    Show,
    Toggle,
    Dark,
    Light,
}

/// Config, store and output mode for one invocation.
struct Session {
    config: Config,
    store: Arc<WeatherStore>,
    json: bool,
}

impl Session {
    fn open(json: bool) -> Result<Self> {
        let config = Config::load()?;
        let client = client_from_config(&config)?;
        let store = Arc::new(WeatherStore::new(client));
        tracing::debug!(api = ?store.api(), location = %config.default_location, "Session opened");
        Ok(Self { config, store, json })
    }

    fn location(&self, arg: LocationArg) -> String {
        explicit(arg).unwrap_or_else(|| self.config.default_location.clone())
    }

    /// Without an explicit location, follow-up loads use the `name, country`
    /// that the default location resolves to.
    async fn follow_up_location(&self, arg: LocationArg) -> String {
        match explicit(arg) {
            Some(location) => location,
            None => resolve_location(&self.store, &self.config.default_location).await,
        }
    }

    /// Prints a loaded cell, or the store's error when the load failed.
    fn show<T: Serialize>(&self, value: Option<Arc<T>>, human: impl FnOnce(&T)) -> Result<()> {
        match value {
            Some(value) if self.json => println!("{}", serde_json::to_string_pretty(&*value)?),
            Some(value) => human(&value),
            None => self.report_error(),
        }
        Ok(())
    }

    fn report_error(&self) {
        if let Some(message) = self.store.error() {
            eprintln!("Error: {message}");
        }
    }
}

fn explicit(arg: LocationArg) -> Option<String> {
    arg.location.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let json = self.json;

        match self.command {
            Command::Configure => configure(),
            Command::Theme { action } => theme(action.unwrap_or(ThemeAction::Show)),
            command => {
                let session = Session::open(json)?;
                dispatch(&session, command).await
            }
        }
    }
}

async fn dispatch(session: &Session, command: Command) -> Result<()> {
    let store = &session.store;

    match command {
        Command::Configure | Command::Theme { .. } => Ok(()),

        Command::Dashboard { location } => {
            match location.filter(|l| !l.trim().is_empty()) {
                Some(location) => load_dashboard(store, &location).await,
                None => {
                    let resolver = IpResolver::new(&session.config.ip_lookup_url);
                    let location = initialize(store, &resolver).await;
                    tracing::debug!(%location, "Dashboard started from public IP");
                }
            }
            show_dashboard(session)
        }

        Command::Current(location) => {
            let q = session.location(location);
            let options = CurrentWeatherOptions { aqi: Some(true), lang: None };
            store.load_current_weather(&q, &options).await;
            session.show(store.current_weather(), render::current)
        }

        Command::Forecast { location, days } => {
            let q = session.location(location);
            let days = days.unwrap_or(session.config.forecast_days);
            let options = ForecastOptions { aqi: Some(true), alerts: Some(false), lang: None };
            store.load_forecast(&q, days, &options).await;
            session.show(store.forecast(), |f| {
                let today = render::local_now(&f.location).date();
                render::forecast_days(&f.forecast.forecastday, today);
            })
        }

        Command::Hourly { location, day } => {
            let q = session.location(location);
            store.load_forecast(&q, day + 1, &ForecastOptions::default()).await;
            let Some(forecast) = store.forecast() else {
                session.report_error();
                return Ok(());
            };
            let Some(selected) = forecast.forecast.forecastday.get(usize::from(day)) else {
                bail!("The forecast has no day {day}");
            };
            if session.json {
                println!("{}", serde_json::to_string_pretty(selected)?);
            } else {
                render::hourly(&forecast.location, selected);
            }
            Ok(())
        }

        Command::Search { query } => {
            store.search_locations(&query).await;
            if store.error().is_some() {
                session.report_error();
                return Ok(());
            }
            let results = store.search_results();
            if session.json {
                println!("{}", serde_json::to_string_pretty(&*results)?);
            } else {
                render::search_results(&results);
            }
            Ok(())
        }

        Command::Pick { query } => pick(session, &query).await,

        Command::LiveSearch => live_search(session).await,

        Command::History { location, date, end } => {
            let window = DateWindow::history(Local::now().date_naive());
            for d in std::iter::once(date).chain(end) {
                if !window.contains(d) {
                    bail!("History is available from {} to {}", window.min, window.max);
                }
            }
            let q = session.follow_up_location(location).await;
            let options = HistoryOptions { end_dt: end, lang: None };
            store.load_history(&q, date, &options).await;
            session.show(store.history(), render::history)
        }

        Command::Alerts(location) => {
            let q = session.location(location);
            store.load_alerts(&q, &AlertsOptions::default()).await;
            session.show(store.alerts(), |a| render::alerts(&a.alerts.alert))
        }

        Command::Astronomy { location, date } => {
            let q = session.follow_up_location(location).await;
            let options = AstronomyOptions { dt: date, lang: None };
            store.load_astronomy(&q, &options).await;
            session.show(store.astronomy(), render::astronomy)
        }

        Command::AirQuality(location) => {
            let q = session.location(location);
            let options = CurrentWeatherOptions { aqi: Some(true), lang: None };
            store.load_current_weather(&q, &options).await;
            session.show(store.current_weather(), render::air_quality)
        }

        Command::Marine { location, days } => {
            let q = session.follow_up_location(location).await;
            let options = MarineOptions { days, lang: None };
            store.load_marine(&q, &options).await;
            session.show(store.marine(), render::marine)
        }

        Command::Sports(location) => {
            let q = session.location(location);
            store.load_sports(&q, &LangOptions::default()).await;
            session.show(store.sports(), render::sports)
        }

        Command::Timezone(location) => {
            let q = session.follow_up_location(location).await;
            store.load_time_zone(&q, &LangOptions::default()).await;
            session.show(store.time_zone(), render::time_zone)
        }

        Command::Future { location, date } => {
            let window = DateWindow::future(Local::now().date_naive());
            if !window.contains(date) {
                bail!("Future weather is available from {} to {}", window.min, window.max);
            }
            let q = session.follow_up_location(location).await;
            store.load_future(&q, date, &LangOptions::default()).await;
            session.show(store.future(), render::future)
        }

        Command::Ip { ip } => {
            store.load_ip_lookup(ip.as_deref().filter(|ip| !ip.trim().is_empty())).await;
            session.show(store.ip_lookup(), render::ip_lookup)
        }
    }
}

fn show_dashboard(session: &Session) -> Result<()> {
    let store = &session.store;

    if !store.has_value(Category::Current) && !store.has_value(Category::Forecast) {
        session.report_error();
        return Ok(());
    }

    if session.json {
        let snapshot = serde_json::json!({
            "current": store.current_weather().as_deref(),
            "forecast": store.forecast().as_deref(),
            "alerts": store.alert_list(),
            "error": store.error(),
        });
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let current = store.current_weather();
    render::dashboard(current.as_deref(), &store.forecast_days(), &store.alert_list());
    session.report_error();
    Ok(())
}

async fn pick(session: &Session, query: &str) -> Result<()> {
    let store = &session.store;
    store.search_locations(query).await;

    let results = store.search_results();
    if results.is_empty() {
        session.report_error();
        println!("No locations found for '{query}'.");
        return Ok(());
    }

    let labels: Vec<String> = results
        .iter()
        .map(|item| format!("{} ({}, {})", item.name, item.region, item.country))
        .collect();
    let choice = inquire::Select::new("Choose a location:", labels)
        .raw_prompt()
        .context("Location selection aborted")?;

    let mut search = LocationSearch::with_selected(&session.config.default_location);
    let SearchAction::LoadLocation(location) = search.select(&results[choice.index]) else {
        bail!("Selection did not produce a location");
    };

    load_dashboard(store, &location).await;
    show_dashboard(session)
}

async fn live_search(session: &Session) -> Result<()> {
    let store = Arc::clone(&session.store);
    let (tx, rx) = mpsc::channel(32);

    let search = LocationSearch::with_selected(&session.config.default_location);
    let driver = SearchDriver::new(Arc::clone(&store))
        .with_search(search)
        .with_days(session.config.forecast_days);
    let driver = tokio::spawn(driver.run(rx));
    let mut events = store.subscribe();

    println!("Type a location (at least 2 characters). `:N` picks result N. Ctrl-D to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let Some(input) = live_input(&store, &line) else {
                    continue;
                };
                if tx.send(input).await.is_err() {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&store, event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Live search output lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    // The driver fires any pending search and waits for its loads.
    drop(tx);
    let search = driver.await.context("Search task failed")?;

    loop {
        match events.try_recv() {
            Ok(event) => print_event(&store, event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Live search output lagged");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    tracing::debug!(selected = search.selected(), "Live search finished");
    Ok(())
}

/// `:N` selects result N of the last search; anything else is typed text.
fn live_input(store: &WeatherStore, line: &str) -> Option<SearchInput> {
    let line = line.trim();
    match line.strip_prefix(':').map(str::parse::<usize>) {
        Some(Ok(n)) => match store.search_results().get(n.wrapping_sub(1)) {
            Some(item) => Some(SearchInput::Select(item.clone())),
            None => {
                eprintln!("No result {n}");
                None
            }
        },
        _ => Some(SearchInput::Typed(line.to_string())),
    }
}

fn print_event(store: &WeatherStore, event: StoreEvent) {
    match event {
        StoreEvent::Updated(Category::Search) => render::search_results(&store.search_results()),
        StoreEvent::Updated(Category::Current) => {
            if let Some(current) = store.current_weather() {
                println!();
                render::current(&current);
            }
        }
        StoreEvent::Failed { message, .. } => eprintln!("Error: {message}"),
        _ => {}
    }
}

fn configure() -> Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load()?;

    let replace_key = !config.is_configured()
        || inquire::Confirm::new("An API key is already saved. Replace it?")
            .with_default(false)
            .prompt()
            .context("Failed to read confirmation")?;

    if replace_key {
        let key = inquire::Password::new("WeatherAPI key:")
            .without_confirmation()
            .with_help_message("Get one at https://www.weatherapi.com/my/")
            .prompt()
            .context("Failed to read API key")?;
        config.set_api_key(key);
    }

    let location = inquire::Text::new("Default location:")
        .with_default(&config.default_location)
        .prompt()
        .context("Failed to read default location")?;
    config.default_location = location.trim().to_string();

    config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

fn theme(action: ThemeAction) -> Result<()> {
    let store = ThemeStore::open_default()?;

    let theme = match action {
        ThemeAction::Show => store.load()?,
        ThemeAction::Toggle => store.toggle()?,
        ThemeAction::Dark => {
            store.save(Theme::Dark)?;
            Theme::Dark
        }
        ThemeAction::Light => {
            store.save(Theme::Light)?;
            Theme::Light
        }
    };

    println!("Theme: {theme}");
    Ok(())
}
