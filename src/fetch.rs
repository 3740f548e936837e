use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{CalendarError, Result};

/// Source of raw calendar HTML. A failure here is always a scrape failure.
pub trait HtmlFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Plain HTTP GET. The client timeout bounds the whole request; there is no retry.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpFetcher { client })
    }
}

impl HtmlFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        info!("Fetching academic calendar: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CalendarError::scrape(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::scrape(url, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CalendarError::scrape(url, e))?;
        info!("Fetched {} bytes", body.len());
        Ok(body)
    }
}

/// Treats the "url" as a local path. Used for offline runs.
pub struct FileFetcher;

impl HtmlFetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        info!("Reading academic calendar from file: {}", url);
        tokio::fs::read_to_string(url)
            .await
            .map_err(|e| CalendarError::scrape(url, e))
    }
}

type Flight = Arc<OnceCell<Result<String>>>;

/// Collapses concurrent fetches of the same URL into one request.
///
/// The shared slot is dropped as soon as the request settles, so a later call
/// always fetches again. Nothing is cached between requests.
pub struct SingleFlight<F> {
    inner: F,
    in_flight: Mutex<HashMap<String, Flight>>,
}

impl<F> SingleFlight<F> {
    pub fn new(inner: F) -> Self {
        SingleFlight {
            inner,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn join(&self, url: &str) -> Flight {
        let mut map = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(flight) = map.get(url) {
            debug!("Joining in-flight fetch of {}", url);
            return Arc::clone(flight);
        }
        let flight = Flight::default();
        map.insert(url.to_string(), Arc::clone(&flight));
        flight
    }

    fn land(&self, url: &str, flight: &Flight) {
        let mut map = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if map.get(url).is_some_and(|current| Arc::ptr_eq(current, flight)) {
            map.remove(url);
        }
    }
}

impl<F: HtmlFetcher> HtmlFetcher for SingleFlight<F> {
    async fn fetch(&self, url: &str) -> Result<String> {
        let flight = self.join(url);
        let result = flight.get_or_init(|| self.inner.fetch(url)).await.clone();
        self.land(url, &flight);
        result
    }
}


// ── Tests ──
