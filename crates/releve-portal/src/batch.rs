//! Bounded concurrent statement fetching.
//!
//! Downloads are the only I/O-bound step of a batch run, so concurrency is
//! applied here: a semaphore caps in-flight requests, each client retries
//! independently with capped exponential backoff, and one wall-clock
//! budget bounds the whole batch. A failed client never blocks another.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use releve_core::models::ClientKey;

use crate::client::PortalClient;
use crate::error::PortalError;

/// Tuning knobs for a batch fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Concurrent downloads.
    pub workers: usize,

    /// Retry attempts per client after the first failure.
    pub max_retries: u32,

    /// Initial retry delay; doubled per attempt.
    pub retry_base: Duration,

    /// Upper bound on a single retry delay.
    pub retry_cap: Duration,

    /// Wall-clock budget for the whole batch.
    pub budget: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            workers: 10,
            max_retries: 3,
            retry_base: Duration::from_secs(5),
            retry_cap: Duration::from_secs(60),
            budget: Duration::from_secs(600),
        }
    }
}

/// Result of one client's download, retries included.
#[derive(Debug)]
pub struct FetchOutcome {
    pub client: ClientKey,
    pub result: Result<Vec<u8>, PortalError>,
    pub attempts: u32,
}

/// Fetch all clients' statement PDFs concurrently.
///
/// Clients still pending when the budget runs out are cancelled and do not
/// appear in the returned outcomes; everything that completed (success or
/// final failure) is reported.
pub async fn fetch_statements(
    portal: Arc<PortalClient>,
    clients: &[ClientKey],
    start_date: &str,
    end_date: &str,
    options: &FetchOptions,
) -> Vec<FetchOutcome> {
    let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
    let mut tasks = JoinSet::new();

    for client in clients.iter().cloned() {
        let portal = Arc::clone(&portal);
        let semaphore = Arc::clone(&semaphore);
        let options = options.clone();
        let start = start_date.to_string();
        let end = end_date.to_string();

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return FetchOutcome {
                    client,
                    result: Err(PortalError::Cancelled),
                    attempts: 0,
                };
            };
            fetch_with_retry(&portal, client, &start, &end, &options).await
        });
    }

    let mut outcomes = Vec::with_capacity(clients.len());
    let budget = tokio::time::sleep(options.budget);
    tokio::pin!(budget);

    loop {
        tokio::select! {
            joined = tasks.join_next() => match joined {
                Some(Ok(outcome)) => outcomes.push(outcome),
                Some(Err(e)) => warn!("fetch task failed to join: {e}"),
                None => break,
            },
            _ = &mut budget => {
                warn!(pending = tasks.len(), "batch budget exhausted, cancelling pending downloads");
                tasks.abort_all();
                while let Some(joined) = tasks.join_next().await {
                    if let Ok(outcome) = joined {
                        outcomes.push(outcome);
                    }
                }
                break;
            }
        }
    }

    outcomes
}

async fn fetch_with_retry(
    portal: &PortalClient,
    client: ClientKey,
    start_date: &str,
    end_date: &str,
    options: &FetchOptions,
) -> FetchOutcome {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match portal.download_statement(&client, start_date, end_date).await {
            Ok(bytes) => {
                return FetchOutcome {
                    client,
                    result: Ok(bytes),
                    attempts: attempt,
                };
            }
            Err(err) if attempt > options.max_retries => {
                warn!(client = %client.name, %err, attempts = attempt, "download failed for good");
                return FetchOutcome {
                    client,
                    result: Err(err),
                    attempts: attempt,
                };
            }
            Err(err) => {
                let delay = backoff_delay(options, attempt);
                debug!(
                    client = %client.name,
                    %err,
                    attempt,
                    ?delay,
                    "download failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Exponential backoff: `retry_base * 2^(attempt-1)`, capped.
fn backoff_delay(options: &FetchOptions, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let delay = options.retry_base * 2u32.pow(exponent);
    delay.min(options.retry_cap)
}
