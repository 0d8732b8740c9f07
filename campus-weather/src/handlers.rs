use axum::{
    extract::{Path, State},
    response::Json,
};
use axum_extra::extract::Query;
use common::errors::AppError;
use common::models::{CampusInfo, CompactWeather, IconResponse, OverviewResponse, WeatherCard};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::aggregator::Aggregator;
use crate::campus::Campus;
use crate::icons::{HttpAssetStore, resolve_icon_name};
use crate::service::CampusWeatherService;
use crate::views::{CampusWeatherView, CompactWeatherView};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CampusWeatherService<HttpAssetStore>>,
    pub aggregator: Arc<Aggregator<HttpAssetStore>>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check")
    )
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "campus-weather" }))
}

#[utoipa::path(
    get,
    path = "/api/campuses",
    responses(
        (status = 200, description = "Known campuses", body = Vec<CampusInfo>)
    ),
    tag = "weather"
)]
pub async fn list_campuses() -> Json<Vec<CampusInfo>> {
    Json(Campus::ALL.into_iter().map(Campus::info).collect())
}

#[utoipa::path(
    get,
    path = "/api/weather/{campus}",
    params(
        ("campus" = String, Path, description = "Campus name")
    ),
    responses(
        (status = 200, description = "Weather card; fetch failures are reported in `error`", body = WeatherCard),
        (status = 404, description = "Unknown campus")
    ),
    tag = "weather"
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Path(campus): Path<String>,
) -> Result<Json<WeatherCard>, AppError> {
    let campus: Campus = campus.parse()?;
    info!(campus = %campus, "Weather request received");

    let mut view = CampusWeatherView::new(campus);
    view.load(&state.service).await;

    Ok(Json(view.render()))
}

#[utoipa::path(
    get,
    path = "/api/weather/{campus}/compact",
    params(
        ("campus" = String, Path, description = "Campus name")
    ),
    responses(
        (status = 200, description = "Compact weather summary", body = CompactWeather),
        (status = 404, description = "Unknown campus")
    ),
    tag = "weather"
)]
pub async fn get_compact_weather(
    State(state): State<AppState>,
    Path(campus): Path<String>,
) -> Result<Json<CompactWeather>, AppError> {
    let campus: Campus = campus.parse()?;
    info!(campus = %campus, "Compact weather request received");

    let mut view = CompactWeatherView::new(campus);
    view.load(&state.service).await;

    Ok(Json(view.render()))
}

#[derive(Deserialize)]
pub struct OverviewQuery {
    #[serde(default)]
    pub campus: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/weather",
    params(
        ("campus" = Vec<String>, Query, description = "Campuses to include; all when omitted")
    ),
    responses(
        (status = 200, description = "Compact weather for each campus", body = OverviewResponse),
        (status = 404, description = "Unknown campus")
    ),
    tag = "weather"
)]
pub async fn overview(
    State(state): State<AppState>,
    Query(params): Query<OverviewQuery>,
) -> Result<Json<OverviewResponse>, AppError> {
    info!(count = params.campus.len(), "Overview request received");

    let response = state.aggregator.overview(params.campus).await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/icons/{symbol_code}",
    params(
        ("symbol_code" = String, Path, description = "Provider symbol code, e.g. clearsky_day")
    ),
    responses(
        (status = 200, description = "Icon file name and URL (null when no icon is available)", body = IconResponse)
    ),
    tag = "icons"
)]
pub async fn get_icon(
    State(state): State<AppState>,
    Path(symbol_code): Path<String>,
) -> Json<IconResponse> {
    let url = state.service.icon_url(&symbol_code).await;

    Json(IconResponse {
        file_name: resolve_icon_name(&symbol_code),
        symbol_code,
        url,
    })
}
