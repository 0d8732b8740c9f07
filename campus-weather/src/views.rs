//! View-models for campus weather.
//!
//! Each view walks `idle -> loading -> {success, error}`. It only goes back to
//! `loading` on [`refresh`](WeatherView::refresh) or when the displayed
//! campus changes. Fetch errors stay inside the view as a message; rendering
//! never fails.

use crate::campus::Campus;
use crate::icons::AssetStore;
use crate::service::CampusWeatherService;
use common::models::{CompactWeather, ViewStatus, WeatherCard, WeatherSnapshot};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub enum ViewState {
    Idle,
    Loading,
    Success(Arc<WeatherSnapshot>),
    Error(String),
}

impl ViewState {
    pub fn status(&self) -> ViewStatus {
        match self {
            ViewState::Idle => ViewStatus::Idle,
            ViewState::Loading => ViewStatus::Loading,
            ViewState::Success(_) => ViewStatus::Success,
            ViewState::Error(_) => ViewStatus::Error,
        }
    }

    pub fn snapshot(&self) -> Option<&Arc<WeatherSnapshot>> {
        match self {
            ViewState::Success(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Layout that renders a full [`WeatherCard`]
pub struct FullCard;

/// Layout that renders a [`CompactWeather`] line
pub struct Compact;

/// Weather for one campus, rendered in layout `L`
pub struct WeatherView<L> {
    campus: Campus,
    state: ViewState,
    icon_url: Option<String>,
    layout: PhantomData<L>,
}

/// Full weather card for one campus
pub type CampusWeatherView = WeatherView<FullCard>;

/// Temperature and icon only
pub type CompactWeatherView = WeatherView<Compact>;

impl<L> WeatherView<L> {
    pub fn new(campus: Campus) -> Self {
        Self {
            campus,
            state: ViewState::Idle,
            icon_url: None,
            layout: PhantomData,
        }
    }

    pub fn campus(&self) -> Campus {
        self.campus
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// First load; does nothing once the view has left `idle`
    pub async fn load<S: AssetStore>(&mut self, service: &CampusWeatherService<S>) {
        if matches!(self.state, ViewState::Idle) {
            self.refresh(service).await;
        }
    }

    /// Switch campus, loading it if it differs from the current one
    pub async fn select_campus<S: AssetStore>(
        &mut self,
        campus: Campus,
        service: &CampusWeatherService<S>,
    ) {
        if campus != self.campus {
            self.campus = campus;
            self.refresh(service).await;
        }
    }

    /// Manual refresh from any state
    pub async fn refresh<S: AssetStore>(&mut self, service: &CampusWeatherService<S>) {
        self.state = ViewState::Loading;
        self.icon_url = None;

        match service.weather(self.campus).await {
            Ok(snapshot) => {
                self.icon_url = service.icon_url(&snapshot.current.symbol_code).await;
                self.state = ViewState::Success(snapshot);
            }
            Err(e) => {
                warn!(campus = %self.campus, error = %e, "Weather unavailable");
                self.state = ViewState::Error(e.to_string());
            }
        }
    }
}

impl WeatherView<FullCard> {
    pub fn render(&self) -> WeatherCard {
        let snapshot = self.state.snapshot();
        let current = snapshot.map(|s| &s.current);

        WeatherCard {
            campus: self.campus.name().to_string(),
            status: self.state.status(),
            temperature: current.map(|c| format_temperature(c.temperature)),
            description: current.map(|c| describe_symbol(&c.symbol_code)),
            icon_url: self.icon_url.clone(),
            wind: current.and_then(|c| format_wind(c.wind_speed, c.wind_direction)),
            humidity: current.and_then(|c| c.humidity).map(format_humidity),
            precipitation: current
                .and_then(|c| c.precipitation)
                .map(format_precipitation),
            updated: snapshot.map(|s| s.updated.format("%H:%M").to_string()),
            error: self.state.error().map(str::to_string),
        }
    }
}

impl WeatherView<Compact> {
    pub fn render(&self) -> CompactWeather {
        CompactWeather {
            campus: self.campus.name().to_string(),
            status: self.state.status(),
            temperature: self
                .state
                .snapshot()
                .map(|s| format_temperature(s.current.temperature)),
            icon_url: self.icon_url.clone(),
            error: self.state.error().map(str::to_string),
        }
    }
}

pub fn format_temperature(celsius: f64) -> String {
    // `as` turns -0.0 into 0
    format!("{}°", celsius.round() as i64)
}

pub fn format_wind(speed: Option<f64>, direction: Option<f64>) -> Option<String> {
    let speed = speed?;
    Some(match direction {
        Some(degrees) => format!("{:.1} m/s {}", speed, compass_point(degrees)),
        None => format!("{:.1} m/s", speed),
    })
}

pub fn compass_point(degrees: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let sector = ((degrees.rem_euclid(360.0) + 22.5) / 45.0) as usize % POINTS.len();
    POINTS[sector]
}

pub fn format_humidity(percent: f64) -> String {
    format!("{:.0}%", percent)
}

pub fn format_precipitation(millimetres: f64) -> String {
    format!("{:.1} mm", millimetres)
}

const SYMBOL_WORDS: [(&str, &str); 14] = [
    ("clearsky", "clear sky"),
    ("partlycloudy", "partly cloudy"),
    ("cloudy", "cloudy"),
    ("fair", "fair"),
    ("fog", "fog"),
    ("light", "light"),
    ("heavy", "heavy"),
    ("rain", "rain"),
    ("sleet", "sleet"),
    ("snow", "snow"),
    ("showers", "showers"),
    ("andthunder", "and thunder"),
    ("thunder", "thunder"),
    // provider spells some codes "lightssleet" / "heavyssnow"
    ("s", ""),
];

/// Human description of a symbol code, e.g. `lightrainshowers_day` -> "Light rain showers".
///
/// Codes made of unknown words are returned unchanged.
pub fn describe_symbol(symbol_code: &str) -> String {
    let base = symbol_code.split('_').next().unwrap_or(symbol_code);
    let mut rest = base;
    let mut words = Vec::new();

    'next: while !rest.is_empty() {
        for (token, word) in SYMBOL_WORDS {
            if let Some(tail) = rest.strip_prefix(token) {
                if !word.is_empty() {
                    words.push(word);
                }
                rest = tail;
                continue 'next;
            }
        }
        return symbol_code.to_string();
    }

    let sentence = words.join(" ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => sentence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_rounds_to_whole_degrees() {
        assert_eq!(format_temperature(12.4), "12°");
        assert_eq!(format_temperature(12.5), "13°");
        assert_eq!(format_temperature(-0.4), "0°");
        assert_eq!(format_temperature(-3.6), "-4°");
    }

    #[test]
    fn wind_needs_speed() {
        assert_eq!(format_wind(None, Some(90.0)), None);
        assert_eq!(format_wind(Some(3.44), None).as_deref(), Some("3.4 m/s"));
        assert_eq!(
            format_wind(Some(5.0), Some(315.0)).as_deref(),
            Some("5.0 m/s NW")
        );
    }

    #[test]
    fn compass_points_wrap() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(22.4), "N");
        assert_eq!(compass_point(22.5), "NE");
        assert_eq!(compass_point(180.0), "S");
        assert_eq!(compass_point(350.0), "N");
        assert_eq!(compass_point(-90.0), "W");
    }

    #[test]
    fn describes_symbol_codes() {
        assert_eq!(describe_symbol("clearsky_day"), "Clear sky");
        assert_eq!(describe_symbol("partlycloudy_night"), "Partly cloudy");
        assert_eq!(describe_symbol("lightrainshowers_day"), "Light rain showers");
        assert_eq!(
            describe_symbol("lightssleetshowersandthunder_polartwilight"),
            "Light sleet showers and thunder"
        );
        assert_eq!(describe_symbol("heavysnow"), "Heavy snow");
    }

    #[test]
    fn unknown_symbol_codes_pass_through() {
        assert_eq!(describe_symbol("volcanicash_day"), "volcanicash_day");
    }

    #[test]
    fn fresh_view_is_idle() {
        let view = CompactWeatherView::new(Campus::Stavanger);
        let card = view.render();

        assert_eq!(card.status, ViewStatus::Idle);
        assert_eq!(card.campus, "Stavanger");
        assert!(card.temperature.is_none());
        assert!(card.error.is_none());
    }

    #[test]
    fn both_layouts_start_idle_on_their_campus() {
        let full = CampusWeatherView::new(Campus::Bergen);
        let compact = CompactWeatherView::new(Campus::Bergen);

        assert_eq!(full.campus(), compact.campus());
        assert_eq!(full.state().status(), ViewStatus::Idle);
        assert_eq!(full.render().status, compact.render().status);
        assert!(full.render().description.is_none());
    }
}
