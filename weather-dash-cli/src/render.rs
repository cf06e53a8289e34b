//! Human-readable output for store values.

use chrono::{NaiveDate, NaiveDateTime};
use weather_dash_core::{
    model::{
        Alert, AstronomyResponse, Current, CurrentWeatherResponse, ForecastDay, FutureResponse,
        HistoryResponse, IpLookupResponse, Location, MarineResponse, SearchLocationItem,
        SportsEvent, SportsResponse, TimeZoneResponse,
    },
    present::{
        AlertSeverity, AqiLevel, Pollutant, PollutantLevel, current_hour_index, day_label,
        format_alert_time, format_astro_time, hour_label, long_date, relative_day_label, short_date,
    },
};

fn header(location: &Location) {
    println!("{} ({}, {})", location.name, location.region, location.country);
    println!("Local time: {}  [{}]", location.localtime, location.tz_id);
}

/// Provider local time of the location, used for "today" and the current hour.
pub fn local_now(location: &Location) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&location.localtime, "%Y-%m-%d %H:%M")
        .unwrap_or_else(|_| chrono::Local::now().naive_local())
}

pub fn current(response: &CurrentWeatherResponse) {
    header(&response.location);
    current_block(&response.current);
}

fn current_block(c: &Current) {
    println!();
    println!("  {:.0}°C  {}", c.temp_c, c.condition.text);
    println!("  Feels like {:.0}°C", c.feelslike_c);
    println!("  Wind       {:.0} km/h {}", c.wind_kph, c.wind_dir);
    println!("  Humidity   {}%", c.humidity);
    println!("  Pressure   {:.0} mb", c.pressure_mb);
    println!("  Visibility {:.0} km", c.vis_km);
    println!("  UV index   {:.0}", c.uv);
    if let Some(aq) = &c.air_quality {
        println!("  Air        {}", AqiLevel::from_epa_index(aq.us_epa_index));
    }
    println!("  Updated    {}", c.last_updated);
}

pub fn forecast_days(days: &[ForecastDay], today: NaiveDate) {
    for (index, day) in days.iter().enumerate() {
        println!(
            "  {:<9} {:<7} {:>4.0}° / {:>3.0}°  {:>3}% rain  {}",
            day_label(&day.date, index, today),
            short_date(&day.date),
            day.day.maxtemp_c,
            day.day.mintemp_c,
            day.hour.iter().filter_map(|h| h.chance_of_rain).max().unwrap_or(0),
            day.day.condition.text,
        );
    }
}

pub fn dashboard(
    current: Option<&CurrentWeatherResponse>,
    days: &[ForecastDay],
    alerts: &[Alert],
) {
    let today = match current {
        Some(response) => {
            self::current(response);
            local_now(&response.location).date()
        }
        None => chrono::Local::now().date_naive(),
    };

    if !days.is_empty() {
        println!();
        println!("Forecast");
        forecast_days(days, today);
    }

    if !alerts.is_empty() {
        println!();
        self::alerts(alerts);
    }
}

pub fn hourly(location: &Location, day: &ForecastDay) {
    header(location);
    println!();
    let local = local_now(location);
    println!("{}, {}", relative_day_label(&day.date, local.date()), long_date(&day.date));

    let marker = current_hour_index(&day.hour, local);
    for (index, hour) in day.hour.iter().enumerate() {
        let now = if marker == Some(index) { ">" } else { " " };
        println!(
            "{now} {:>8}  {:>4.0}°C  {:>3}% rain  {:>3.0} km/h  {}",
            hour_label(&hour.time),
            hour.temp_c,
            hour.chance_of_rain.unwrap_or(0),
            hour.wind_kph,
            hour.condition.text,
        );
    }
}

pub fn search_results(items: &[SearchLocationItem]) {
    if items.is_empty() {
        println!("No locations found.");
        return;
    }

    for (index, item) in items.iter().enumerate() {
        println!("{:>3}. {} ({}, {})", index + 1, item.name, item.region, item.country);
    }
}

pub fn history(response: &HistoryResponse) {
    header(&response.location);
    for day in &response.forecast.forecastday {
        println!();
        println!("{}", long_date(&day.date));
        day_summary(day);
    }
}

fn day_summary(day: &ForecastDay) {
    let d = &day.day;
    println!("  {}", d.condition.text);
    println!("  High {:.0}°C  Low {:.0}°C  Avg {:.0}°C", d.maxtemp_c, d.mintemp_c, d.avgtemp_c);
    println!("  Precipitation {:.1} mm", d.totalprecip_mm);
    println!("  Max wind {:.0} km/h  Humidity {}%", d.maxwind_kph, d.avghumidity);
    println!(
        "  Sunrise {}  Sunset {}",
        format_astro_time(&day.astro.sunrise),
        format_astro_time(&day.astro.sunset)
    );
}

pub fn alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        println!("No active weather alerts.");
        return;
    }

    let mut sorted: Vec<&Alert> = alerts.iter().collect();
    sorted.sort_by_key(|a| AlertSeverity::parse(&a.severity));

    println!("Alerts ({})", sorted.len());
    for alert in sorted {
        println!();
        println!("[{}] {}", AlertSeverity::parse(&alert.severity).label(), alert.headline);
        if !alert.areas.is_empty() {
            println!("  Areas:   {}", alert.areas);
        }
        println!(
            "  From {} until {}",
            format_alert_time(&alert.effective),
            format_alert_time(&alert.expires)
        );
        if !alert.desc.is_empty() {
            println!("  {}", alert.desc.trim());
        }
        if !alert.instruction.is_empty() {
            println!("  What to do: {}", alert.instruction.trim());
        }
    }
}

pub fn astronomy(response: &AstronomyResponse) {
    header(&response.location);
    let astro = &response.astronomy.astro;
    println!();
    println!("  Sunrise   {}", format_astro_time(&astro.sunrise));
    println!("  Sunset    {}", format_astro_time(&astro.sunset));
    println!("  Moonrise  {}", format_astro_time(&astro.moonrise));
    println!("  Moonset   {}", format_astro_time(&astro.moonset));
    let illumination = match &astro.moon_illumination {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    println!("  Moon      {} ({illumination}% illuminated)", astro.moon_phase);
}

pub fn air_quality(response: &CurrentWeatherResponse) {
    header(&response.location);
    println!();

    let Some(aq) = &response.current.air_quality else {
        println!("Air quality data is not available for this location.");
        return;
    };

    println!(
        "  US-EPA index {} ({})  UK DEFRA index {}",
        aq.us_epa_index,
        AqiLevel::from_epa_index(aq.us_epa_index),
        aq.gb_defra_index
    );
    println!();
    for pollutant in Pollutant::ALL {
        let value = pollutant.value_in(aq);
        println!(
            "  {:<6} {:>8.1} µg/m³  {}",
            pollutant.label(),
            value,
            PollutantLevel::of(pollutant, value).label()
        );
    }
}

pub fn marine(response: &MarineResponse) {
    header(&response.location);
    for day in &response.forecast.forecastday {
        println!();
        println!("{}", long_date(&day.date));
        println!(
            "  {}  {:.0}° / {:.0}°  wind {:.0} km/h",
            day.day.condition.text, day.day.maxtemp_c, day.day.mintemp_c, day.day.maxwind_kph
        );
        println!(
            "  Sunrise {}  Sunset {}",
            format_astro_time(&day.astro.sunrise),
            format_astro_time(&day.astro.sunset)
        );
    }
}

fn sports_section(title: &str, events: Option<&Vec<SportsEvent>>) {
    let events = events.map(Vec::as_slice).unwrap_or_default();
    println!();
    println!("{title} ({})", events.len());
    for event in events {
        println!("  {}  {}", event.start, event.match_name);
        println!("    {} at {}, {}", event.tournament, event.stadium, event.country);
    }
}

pub fn sports(response: &SportsResponse) {
    header(&response.location);
    sports_section("Football", response.sports.football.as_ref());
    sports_section("Cricket", response.sports.cricket.as_ref());
    sports_section("Golf", response.sports.golf.as_ref());
}

pub fn time_zone(response: &TimeZoneResponse) {
    let l = &response.location;
    header(l);
    println!("  Coordinates {:.2}, {:.2}", l.lat, l.lon);
    println!("  Epoch       {}", l.localtime_epoch);
}

pub fn future(response: &FutureResponse) {
    header(&response.location);
    for day in &response.forecast.forecastday {
        println!();
        println!("{}", long_date(&day.date));
        day_summary(day);
    }
}

pub fn ip_lookup(response: &IpLookupResponse) {
    println!("{} ({})", response.ip, response.ip_type);
    println!("  {}, {}, {}", response.city, response.region, response.country_name);
    println!("  {} [{}]", response.continent_name, response.continent_code);
    println!("  Coordinates {:.2}, {:.2}", response.lat, response.lon);
    println!("  Time zone   {}  Local time {}", response.tz_id, response.localtime);
}
