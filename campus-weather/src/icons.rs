use crate::cache::TtlCache;
use common::errors::AppError;
use common::http_client::HttpClient;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Icon used when the real one cannot be found
pub const FALLBACK_ICON: &str = "cloudy";

const ICON_EXTENSION: &str = ".png";
const MAX_ICON_STEM: usize = 32;

/// Applied in order. Asset names in the bucket were generated with exactly
/// this sequence, so reordering it renames icons.
const ICON_ABBREVIATIONS: [(&str, &str); 8] = [
    ("showers", "shwr"),
    ("andthunder", "_t"),
    ("clearsky", "clear"),
    ("partly", "p"),
    ("heavy", "h"),
    ("light", "l"),
    ("_day", "_d"),
    ("_night", "_n"),
];

/// Shorten a provider symbol code into an asset file name.
///
/// `lightrainshowers_day` becomes `lrainshwr_d.png`. The stem is capped at
/// 32 characters.
pub fn resolve_icon_name(symbol_code: &str) -> String {
    let stem = ICON_ABBREVIATIONS
        .iter()
        .fold(symbol_code.to_string(), |name, (from, to)| {
            name.replacen(from, to, 1)
        });
    let mut file_name: String = stem.chars().take(MAX_ICON_STEM).collect();
    file_name.push_str(ICON_EXTENSION);
    file_name
}

/// Where icon files live
pub trait AssetStore: Send + Sync {
    /// URL for viewing `file_name`, or an error if the store cannot serve it
    fn preview_url(&self, file_name: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Icon bucket reachable over HTTP; an asset exists if a `HEAD` on it succeeds
pub struct HttpAssetStore {
    http_client: HttpClient,
    base_url: String,
}

impl HttpAssetStore {
    pub fn new(http_client: HttpClient, base_url: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(file_name))
    }
}

impl AssetStore for HttpAssetStore {
    async fn preview_url(&self, file_name: &str) -> Result<String, AppError> {
        let url = self.url_for(file_name);
        self.http_client.head(&url).await?;
        Ok(url)
    }
}

pub type IconUrlCache = TtlCache<String, String>;

/// Resolves symbol codes to icon URLs, caching results per symbol code
pub struct IconUrlResolver<S> {
    store: S,
    cache: Arc<IconUrlCache>,
}

impl<S: AssetStore> IconUrlResolver<S> {
    pub fn new(store: S, cache: Arc<IconUrlCache>) -> Self {
        Self { store, cache }
    }

    /// URL of the icon for `symbol_code`.
    ///
    /// Falls back to the `cloudy` icon once; `None` means render without an
    /// icon. Never fails. Only icons the store actually has are cached, so the
    /// cache holds at most one entry per asset in the bucket.
    #[instrument(skip(self))]
    pub async fn icon_url(&self, symbol_code: &str) -> Option<String> {
        let key = symbol_code.to_string();
        if let Some(cached) = self.cache.get(&key).await {
            return Some(cached.as_ref().clone());
        }

        match self.store.preview_url(&resolve_icon_name(symbol_code)).await {
            Ok(url) => {
                info!(symbol_code, url = %url, "Resolved icon");
                self.cache.insert(key, url.clone()).await;
                Some(url)
            }
            Err(e) => {
                warn!(symbol_code, error = %e, "Icon lookup failed, using fallback icon");
                match self.store.preview_url(&resolve_icon_name(FALLBACK_ICON)).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!(symbol_code, error = %e, "Fallback icon lookup failed");
                        None
                    }
                }
            }
        }
    }
}
