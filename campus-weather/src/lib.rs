//! Campus weather: cached MET Norway lookups, icon resolution and the view
//! models that render them, served over HTTP.

pub mod aggregator;
pub mod api_client;
pub mod cache;
pub mod campus;
pub mod config;
pub mod handlers;
pub mod icons;
pub mod openapi;
pub mod service;
pub mod views;

use axum::{Router, routing::get};
use common::errors::AppError;
use common::http_client::HttpClient;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::aggregator::Aggregator;
use crate::api_client::{MetNoClient, WeatherCache};
use crate::config::Config;
use crate::handlers::AppState;
use crate::icons::{HttpAssetStore, IconUrlCache, IconUrlResolver};
use crate::service::CampusWeatherService;

/// Wire the shared caches, clients and aggregator from `config`
pub fn build_state(
    config: &Config,
    cancellation_token: CancellationToken,
) -> Result<AppState, AppError> {
    let http_client = HttpClient::new(
        config.http_timeout_seconds,
        config.http_max_retries,
        &config.user_agent,
    )?;
    let ttl = Duration::from_secs(config.cache_ttl_seconds);

    let weather = MetNoClient::new(
        http_client.clone(),
        Arc::new(WeatherCache::with_ttl(ttl)),
        config.weather_api_url.clone(),
        config.dedupe_in_flight,
    );
    let icons = IconUrlResolver::new(
        HttpAssetStore::new(http_client, config.icon_storage_url.clone()),
        Arc::new(IconUrlCache::with_ttl(ttl)),
    );

    let service = Arc::new(CampusWeatherService::new(weather, icons));
    let aggregator = Arc::new(Aggregator::new(
        service.clone(),
        config.max_in_flight,
        cancellation_token,
    ));

    Ok(AppState {
        service,
        aggregator,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/campuses", get(handlers::list_campuses))
        .route("/api/weather", get(handlers::overview))
        .route("/api/weather/{campus}", get(handlers::get_weather))
        .route(
            "/api/weather/{campus}/compact",
            get(handlers::get_compact_weather),
        )
        .route("/api/icons/{symbol_code}", get(handlers::get_icon))
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
