use common::errors::AppError;
use common::models::{CompactWeather, OverviewResponse, ResponseSummary, ViewStatus};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, instrument};

use crate::campus::Campus;
use crate::icons::AssetStore;
use crate::service::CampusWeatherService;
use crate::views::CompactWeatherView;

/// Builds compact weather for several campuses at once
pub struct Aggregator<S> {
    service: Arc<CampusWeatherService<S>>,
    semaphore: Arc<Semaphore>,
    cancellation_token: CancellationToken,
}

impl<S> Aggregator<S>
where
    S: AssetStore + 'static,
{
    pub fn new(
        service: Arc<CampusWeatherService<S>>,
        max_in_flight: usize,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            service,
            semaphore: Arc::new(Semaphore::new(max_in_flight.max(1))),
            cancellation_token,
        }
    }

    /// Compact weather for `campuses`, or every campus when the list is empty
    #[instrument(skip(self), fields(campus_count = campuses.len()))]
    pub async fn overview(&self, campuses: Vec<String>) -> Result<OverviewResponse, AppError> {
        let campuses = if campuses.is_empty() {
            Campus::ALL.to_vec()
        } else {
            let mut parsed = Vec::with_capacity(campuses.len());
            for name in &campuses {
                let campus: Campus = name.parse()?;
                if !parsed.contains(&campus) {
                    parsed.push(campus);
                }
            }
            parsed
        };

        info!(count = campuses.len(), "Building campus overview");

        let mut handles = Vec::with_capacity(campuses.len());

        for campus in campuses {
            let semaphore = self.semaphore.clone();
            let service = self.service.clone();
            let cancel = self.cancellation_token.clone();

            let handle = tokio::spawn(
                async move {
                    if cancel.is_cancelled() {
                        return cancelled(campus);
                    }

                    let _permit = match semaphore.acquire().await {
                        Ok(p) => p,
                        Err(_) => return failed(campus, "Semaphore closed"),
                    };

                    tokio::select! {
                        card = compact_card(campus, &service) => card,
                        _ = cancel.cancelled() => cancelled(campus),
                    }
                }
                .in_current_span(),
            );

            handles.push(handle);
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await);
        }

        let response = tally(results);
        let summary = &response.summary;
        info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            "Overview completed"
        );

        Ok(response)
    }
}

/// Count finished cards; a task that failed to join counts as failed
fn tally(results: Vec<Result<CompactWeather, JoinError>>) -> OverviewResponse {
    let mut cards = Vec::with_capacity(results.len());
    let mut successful = 0;
    let mut failed = 0;

    for result in results {
        match result {
            Ok(card) => {
                if card.status == ViewStatus::Success {
                    successful += 1;
                } else {
                    failed += 1;
                }
                cards.push(card);
            }
            Err(e) => {
                error!(error = %e, "Task join error");
                failed += 1;
            }
        }
    }

    OverviewResponse {
        campuses: cards,
        summary: ResponseSummary {
            total: successful + failed,
            successful,
            failed,
        },
    }
}

async fn compact_card<S: AssetStore>(
    campus: Campus,
    service: &CampusWeatherService<S>,
) -> CompactWeather {
    let mut view = CompactWeatherView::new(campus);
    view.load(service).await;
    view.render()
}

fn cancelled(campus: Campus) -> CompactWeather {
    failed(campus, "Request cancelled")
}

fn failed(campus: Campus, reason: &str) -> CompactWeather {
    CompactWeather {
        campus: campus.name().to_string(),
        status: ViewStatus::Error,
        temperature: None,
        icon_url: None,
        error: Some(reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(campus: Campus) -> CompactWeather {
        CompactWeather {
            campus: campus.name().to_string(),
            status: ViewStatus::Success,
            temperature: Some("6°".to_string()),
            icon_url: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn join_failures_count_towards_total() {
        let crashed: tokio::task::JoinHandle<CompactWeather> =
            tokio::spawn(async { panic!("card task crashed") });
        let join_error = crashed.await.expect_err("task should panic");

        let response = tally(vec![
            Ok(loaded(Campus::Oslo)),
            Ok(cancelled(Campus::Bergen)),
            Err(join_error),
        ]);

        assert_eq!(response.campuses.len(), 2);
        assert_eq!(response.summary.successful, 1);
        assert_eq!(response.summary.failed, 2);
        assert_eq!(response.summary.total, 3);
    }

    #[test]
    fn empty_overview_has_zero_totals() {
        let response = tally(Vec::new());

        assert!(response.campuses.is_empty());
        assert_eq!(response.summary.total, 0);
    }
}
