use crate::api_client::MetNoClient;
use crate::campus::Campus;
use crate::icons::{AssetStore, IconUrlResolver};
use common::errors::AppError;
use common::models::WeatherSnapshot;
use std::sync::Arc;

/// Weather and icon lookups shared by every view.
///
/// Build one and hand the same `Arc` to all consumers; the caches inside are
/// what make a fetch by one view visible to the others.
pub struct CampusWeatherService<S> {
    weather: MetNoClient,
    icons: IconUrlResolver<S>,
}

impl<S: AssetStore> CampusWeatherService<S> {
    pub fn new(weather: MetNoClient, icons: IconUrlResolver<S>) -> Self {
        Self { weather, icons }
    }

    pub async fn weather(&self, campus: Campus) -> Result<Arc<WeatherSnapshot>, AppError> {
        self.weather.fetch_weather(campus).await
    }

    pub async fn icon_url(&self, symbol_code: &str) -> Option<String> {
        self.icons.icon_url(symbol_code).await
    }
}
