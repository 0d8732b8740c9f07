use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where a snapshot was taken
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub name: String,
}

/// Instantaneous conditions from the first forecast step
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct CurrentConditions {
    /// Air temperature in °C
    pub temperature: f64,
    pub symbol_code: String,
    /// Millimetres expected over the next period
    pub precipitation: Option<f64>,
    /// Metres per second
    pub wind_speed: Option<f64>,
    /// Degrees the wind blows from
    pub wind_direction: Option<f64>,
    pub humidity: Option<f64>,
    /// Air pressure at sea level, hPa
    pub pressure: Option<f64>,
    pub cloud_cover: Option<f64>,
}

/// Normalised weather for one campus.
///
/// `updated` and `expires` come from the provider's `Last-Modified` and
/// `Expires` headers. `expires` is advisory only; the local cache TTL decides
/// staleness.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub current: CurrentConditions,
    pub updated: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// A campus from the fixed campus set
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct CampusInfo {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Lifecycle of a weather view
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Full weather card for one campus
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct WeatherCard {
    pub campus: String,
    pub status: ViewStatus,
    pub temperature: Option<String>,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub wind: Option<String>,
    pub humidity: Option<String>,
    pub precipitation: Option<String>,
    pub updated: Option<String>,
    pub error: Option<String>,
}

/// One-line weather summary for one campus
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct CompactWeather {
    pub campus: String,
    pub status: ViewStatus,
    pub temperature: Option<String>,
    pub icon_url: Option<String>,
    pub error: Option<String>,
}

/// Overview of several campuses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OverviewResponse {
    pub campuses: Vec<CompactWeather>,
    pub summary: ResponseSummary,
}

/// Summary of successful vs failed campuses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResponseSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Icon resolution result
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct IconResponse {
    pub symbol_code: String,
    pub file_name: String,
    pub url: Option<String>,
}
