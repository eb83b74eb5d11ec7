use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{redirect, Client};
use tracing::debug;

use crate::core::config::{CrawlConfig, CrawlError};
use crate::core::types::{PageRecord, PageStatus};

const MAX_ATTEMPTS: usize = 3;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Result of one fetch: the page record plus the body when the response was
/// HTML. Non-HTML bodies are never downloaded.
pub struct FetchOutcome {
    pub record: PageRecord,
    pub body: Option<String>,
}

/// Issues single GETs with browser-like headers on a shared client (one
/// cookie jar per crawl run) and classifies transport failures into record
/// statuses.
pub struct PageFetcher {
    client: Client,
    timeout_secs: u64,
}

impl PageFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let redirect_policy = if config.follow_redirects {
            redirect::Policy::limited(10)
        } else {
            redirect::Policy::none()
        };
        let client = Client::builder()
            .default_headers(browser_headers())
            .cookie_store(true)
            .redirect(redirect_policy)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(CrawlError::ClientBuild)?;
        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// One GET. `load_time_s` covers send through full-body availability.
    pub async fn fetch(&self, url: &str, depth: usize, referer: Option<&str>) -> FetchOutcome {
        let started = Instant::now();
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return self.failure(
                    url,
                    depth,
                    PageStatus::Timeout,
                    format!("Request timeout after {} seconds", self.timeout_secs),
                );
            }
            Err(err) if err.is_connect() => {
                return self.failure(url, depth, PageStatus::Error, format!("Connection Error: {err}"));
            }
            Err(err) => {
                return self.failure(url, depth, PageStatus::Error, format!("Client Error: {err}"));
            }
        };

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = if content_type.contains("text/html") {
            match response.text().await {
                Ok(body) => Some(body),
                Err(err) if err.is_timeout() => {
                    return self.failure(
                        url,
                        depth,
                        PageStatus::Timeout,
                        format!("Request timeout after {} seconds", self.timeout_secs),
                    );
                }
                Err(err) => {
                    return self.failure(url, depth, PageStatus::Error, format!("Client Error: {err}"));
                }
            }
        } else {
            None
        };

        let record = PageRecord {
            address: url.to_string(),
            final_url,
            status: PageStatus::Code(status_code),
            content_type,
            load_time_s: round2(started.elapsed().as_secs_f64()),
            crawl_depth: depth,
            crawled_at: Utc::now().to_rfc3339(),
            ..PageRecord::default()
        };
        FetchOutcome { record, body }
    }

    /// Fetch with up to three attempts. A timeout or transport error retries
    /// after `2^k + U(0,1)` seconds (k = 0-indexed failed attempt); after
    /// exhaustion an Error record carries the last failure.
    pub async fn fetch_with_retry(
        &self,
        url: &str,
        depth: usize,
        referer: Option<&str>,
    ) -> FetchOutcome {
        let mut last_error = String::from("No response");
        for attempt in 0..MAX_ATTEMPTS {
            let outcome = self.fetch(url, depth, referer).await;
            if !outcome.record.status.is_failure() {
                return outcome;
            }
            last_error = if outcome.record.error.is_empty() {
                "Unknown error".to_string()
            } else {
                outcome.record.error.clone()
            };
            if attempt + 1 < MAX_ATTEMPTS {
                let wait = backoff_delay(attempt);
                debug!(
                    "attempt {} for {url} failed ({last_error}), retrying in {:.2}s",
                    attempt + 1,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
            }
        }

        self.failure(
            url,
            depth,
            PageStatus::Error,
            format!("Failed after {MAX_ATTEMPTS} attempts. Last error: {last_error}"),
        )
    }

    fn failure(&self, url: &str, depth: usize, status: PageStatus, error: String) -> FetchOutcome {
        FetchOutcome {
            record: PageRecord {
                address: url.to_string(),
                status,
                error,
                crawl_depth: depth,
                crawled_at: Utc::now().to_rfc3339(),
                ..PageRecord::default()
            },
            body: None,
        }
    }
}

/// Exponential backoff with a uniform jitter second: `2^attempt + U(0,1)`.
pub(crate) fn backoff_delay(attempt: usize) -> Duration {
    let jitter: f64 = rand::rng().random_range(0.0..1.0);
    Duration::from_secs_f64((1u64 << attempt.min(16)) as f64 + jitter)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}
