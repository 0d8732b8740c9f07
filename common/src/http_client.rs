use crate::errors::AppError;
use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::HeaderMap;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Decoded JSON body together with the response headers it arrived with
#[derive(Debug)]
pub struct JsonResponse<T> {
    pub body: T,
    pub headers: HeaderMap,
}

impl<T> JsonResponse<T> {
    /// Parse an HTTP-date header (`Last-Modified`, `Expires`, ...)
    pub fn header_date(&self, name: &str) -> Option<DateTime<Utc>> {
        let raw = self.headers.get(name)?.to_str().ok()?;
        DateTime::parse_from_rfc2822(raw)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }
}

/// HTTP client with timeout, user agent and optional retries
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, max_retries: u32, user_agent: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Fetch JSON from URL, retrying with exponential backoff when `max_retries > 0`
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T>(&self, url: &str) -> Result<JsonResponse<T>, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match self.fetch_with_timeout(url).await {
                Ok(response) => {
                    info!(url = %url, attempt = attempt + 1, "Request successful");
                    return Ok(response);
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let backoff = Duration::from_millis(2_u64.pow(attempt) * 100);
                        warn!(
                            url = %url,
                            attempt = attempt + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying with exponential backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        error!(
            url = %url,
            attempts = self.max_retries + 1,
            "All attempts failed"
        );
        Err(last_error.unwrap_or_else(|| AppError::internal("Unknown error after retries")))
    }

    /// Issue a `HEAD` request and succeed only on a 2xx status
    #[instrument(skip(self), fields(url = %url))]
    pub async fn head(&self, url: &str) -> Result<(), AppError> {
        let response = tokio::time::timeout(self.timeout, self.client.head(url).send())
            .await
            .map_err(|_| AppError::timeout(format!("Request to {} timed out", url)))?
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http(
                status.as_u16(),
                format!("HTTP error: {}", status),
            ));
        }

        Ok(())
    }

    async fn fetch_with_timeout<T>(&self, url: &str) -> Result<JsonResponse<T>, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| AppError::timeout(format!("Request to {} timed out", url)))?
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http(
                status.as_u16(),
                format!("HTTP error: {}", status),
            ));
        }

        let headers = response.headers().clone();
        let text = response.text().await.map_err(AppError::NetworkError)?;
        let body: T = serde_json::from_str(&text).map_err(AppError::ParseError)?;

        Ok(JsonResponse { body, headers })
    }
}

fn classify(url: &str, e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::timeout(format!("Request to {} timed out", url))
    } else {
        AppError::NetworkError(e)
    }
}
