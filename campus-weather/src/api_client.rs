use crate::cache::TtlCache;
use crate::campus::Campus;
use chrono::{DateTime, Duration, Utc};
use common::errors::AppError;
use common::http_client::{HttpClient, JsonResponse};
use common::models::{CurrentConditions, Location, WeatherSnapshot};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{Instrument, info, instrument};

pub type WeatherCache = TtlCache<Campus, WeatherSnapshot>;

#[derive(Debug, Deserialize)]
struct LocationforecastResponse {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Properties {
    timeseries: Vec<TimeStep>,
}

#[derive(Debug, Deserialize)]
struct TimeStep {
    data: StepData,
}

#[derive(Debug, Deserialize)]
struct StepData {
    instant: InstantData,
    next_1_hours: Option<Period>,
    next_6_hours: Option<Period>,
    next_12_hours: Option<Period>,
}

#[derive(Debug, Deserialize)]
struct InstantData {
    details: InstantDetails,
}

#[derive(Debug, Deserialize)]
struct InstantDetails {
    air_temperature: f64,
    air_pressure_at_sea_level: Option<f64>,
    cloud_area_fraction: Option<f64>,
    relative_humidity: Option<f64>,
    wind_from_direction: Option<f64>,
    wind_speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Period {
    summary: Option<Summary>,
    details: Option<PeriodDetails>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    symbol_code: String,
}

#[derive(Debug, Deserialize)]
struct PeriodDetails {
    precipitation_amount: Option<f64>,
}

impl Period {
    fn symbol_code(&self) -> Option<&str> {
        self.summary.as_ref().map(|s| s.symbol_code.as_str())
    }

    fn precipitation(&self) -> Option<f64> {
        self.details.as_ref().and_then(|d| d.precipitation_amount)
    }
}

/// Client for the MET Norway Locationforecast API, fronted by a shared cache
#[derive(Clone)]
pub struct MetNoClient {
    http_client: HttpClient,
    cache: Arc<WeatherCache>,
    base_url: String,
    dedupe_in_flight: bool,
}

impl MetNoClient {
    pub fn new(
        http_client: HttpClient,
        cache: Arc<WeatherCache>,
        base_url: String,
        dedupe_in_flight: bool,
    ) -> Self {
        Self {
            http_client,
            cache,
            base_url,
            dedupe_in_flight,
        }
    }

    pub fn cache(&self) -> &Arc<WeatherCache> {
        &self.cache
    }

    /// Serve `campus` from the cache, or fetch and cache it.
    ///
    /// The network half runs on its own task: if the caller goes away the
    /// fetch still completes and lands in the cache.
    #[instrument(skip(self), fields(campus = %campus))]
    pub async fn fetch_weather(&self, campus: Campus) -> Result<Arc<WeatherSnapshot>, AppError> {
        if let Some(cached) = self.cache.get(&campus).await {
            info!(campus = %campus, "Cache hit");
            return Ok(cached);
        }

        let client = self.clone();
        tokio::spawn(async move { client.fetch_into_cache(campus).await }.in_current_span())
            .await
            .map_err(|e| AppError::internal(format!("Weather fetch task failed: {}", e)))?
    }

    pub fn forecast_url(&self, campus: Campus) -> String {
        let coords = campus.coordinates();
        format!(
            "{}?lat={:.4}&lon={:.4}&altitude={}",
            self.base_url,
            coords.latitude,
            coords.longitude,
            coords.altitude.round() as i64
        )
    }

    async fn fetch_into_cache(&self, campus: Campus) -> Result<Arc<WeatherSnapshot>, AppError> {
        if self.dedupe_in_flight {
            self.cache
                .get_or_try_insert_with(campus, || self.request(campus))
                .await
        } else {
            let snapshot = self.request(campus).await?;
            Ok(self.cache.insert(campus, snapshot).await)
        }
    }

    async fn request(&self, campus: Campus) -> Result<WeatherSnapshot, AppError> {
        info!(campus = %campus, "Fetching weather from API");

        let url = self.forecast_url(campus);
        let response: JsonResponse<LocationforecastResponse> =
            self.http_client.get_json(&url).await?;

        let now = Utc::now();
        let updated = response.header_date("last-modified").unwrap_or(now);
        let expires = response
            .header_date("expires")
            .unwrap_or(now + Duration::hours(1));

        to_snapshot(campus, response.body, updated, expires)
    }
}

fn to_snapshot(
    campus: Campus,
    body: LocationforecastResponse,
    updated: DateTime<Utc>,
    expires: DateTime<Utc>,
) -> Result<WeatherSnapshot, AppError> {
    let step = body
        .properties
        .timeseries
        .into_iter()
        .next()
        .ok_or_else(|| AppError::unexpected("Forecast contained no timeseries"))?;
    let data = step.data;

    let symbol_code = [&data.next_1_hours, &data.next_6_hours, &data.next_12_hours]
        .into_iter()
        .flatten()
        .find_map(Period::symbol_code)
        .ok_or_else(|| AppError::unexpected("Forecast contained no symbol code"))?
        .to_string();
    let precipitation = [&data.next_1_hours, &data.next_6_hours]
        .into_iter()
        .flatten()
        .find_map(Period::precipitation);

    let details = data.instant.details;
    let coords = campus.coordinates();

    Ok(WeatherSnapshot {
        location: Location {
            latitude: coords.latitude,
            longitude: coords.longitude,
            altitude: coords.altitude,
            name: campus.name().to_string(),
        },
        current: CurrentConditions {
            temperature: details.air_temperature,
            symbol_code,
            precipitation,
            wind_speed: details.wind_speed,
            wind_direction: details.wind_from_direction,
            humidity: details.relative_humidity,
            pressure: details.air_pressure_at_sea_level,
            cloud_cover: details.cloud_area_fraction,
        },
        updated,
        expires,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> LocationforecastResponse {
        serde_json::from_value(value).expect("valid forecast body")
    }

    fn step(data: serde_json::Value) -> serde_json::Value {
        json!({ "properties": { "timeseries": [ { "time": "2024-10-15T10:00:00Z", "data": data } ] } })
    }

    #[test]
    fn prefers_one_hour_summary() {
        let body = parse(step(json!({
            "instant": { "details": { "air_temperature": 4.2, "wind_speed": 3.1 } },
            "next_1_hours": {
                "summary": { "symbol_code": "lightrain" },
                "details": { "precipitation_amount": 0.4 }
            },
            "next_6_hours": {
                "summary": { "symbol_code": "cloudy" },
                "details": { "precipitation_amount": 2.0 }
            }
        })));

        let now = Utc::now();
        let snapshot = to_snapshot(Campus::Bergen, body, now, now).expect("snapshot");

        assert_eq!(snapshot.current.symbol_code, "lightrain");
        assert_eq!(snapshot.current.precipitation, Some(0.4));
        assert_eq!(snapshot.current.wind_speed, Some(3.1));
        assert_eq!(snapshot.current.humidity, None);
        assert_eq!(snapshot.location.name, "Bergen");
    }

    #[test]
    fn falls_back_to_six_then_twelve_hours() {
        let six = parse(step(json!({
            "instant": { "details": { "air_temperature": 1.0 } },
            "next_6_hours": { "summary": { "symbol_code": "snow" }, "details": { "precipitation_amount": 1.5 } },
            "next_12_hours": { "summary": { "symbol_code": "cloudy" } }
        })));
        let twelve = parse(step(json!({
            "instant": { "details": { "air_temperature": 1.0 } },
            "next_12_hours": { "summary": { "symbol_code": "fair_night" } }
        })));

        let now = Utc::now();
        let six = to_snapshot(Campus::Oslo, six, now, now).expect("six hours");
        let twelve = to_snapshot(Campus::Oslo, twelve, now, now).expect("twelve hours");

        assert_eq!(six.current.symbol_code, "snow");
        assert_eq!(six.current.precipitation, Some(1.5));
        assert_eq!(twelve.current.symbol_code, "fair_night");
        assert_eq!(twelve.current.precipitation, None);
    }

    #[test]
    fn empty_timeseries_is_rejected() {
        let body = parse(json!({ "properties": { "timeseries": [] } }));
        let now = Utc::now();

        let err = to_snapshot(Campus::Oslo, body, now, now).unwrap_err();
        assert!(matches!(err, AppError::UnexpectedResponse(_)));
    }

    #[test]
    fn missing_symbol_code_is_rejected() {
        let body = parse(step(json!({
            "instant": { "details": { "air_temperature": 1.0 } }
        })));
        let now = Utc::now();

        assert!(to_snapshot(Campus::Oslo, body, now, now).is_err());
    }
}
