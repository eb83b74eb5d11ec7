use std::time::Duration;

use reqwest::Client;
use texting_robots::Robot;
use tracing::{debug, warn};
use url::Url;

const ROBOTS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Parsed robots.txt state for the crawled host. A missing or unreadable
/// robots.txt leaves the policy permissive and the crawl proceeds.
#[derive(Debug, Default)]
pub struct RobotsPolicy {
    robot: Option<Robot>,
    /// First parseable `Crawl-delay:` value, in seconds. Zero means none.
    pub crawl_delay: f64,
    /// Every `Sitemap:` line found in the file.
    pub sitemap_hints: Vec<String>,
    pub status: String,
}

impl RobotsPolicy {
    pub fn unfetched() -> Self {
        Self {
            status: "Not fetched".to_string(),
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            status: "Ignored (disabled)".to_string(),
            ..Self::default()
        }
    }

    /// Fetch `<scheme>://<host>/robots.txt` on the shared client. Any
    /// failure (network, non-200, unreadable body) falls back to a
    /// permissive policy with status `"Fetched (none)"`.
    pub async fn fetch(client: &Client, start: &Url) -> Self {
        let host = match start.host_str() {
            Some(host) => host.to_string(),
            None => return Self::unfetched(),
        };
        let authority = match start.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        };
        let robots_url = format!("{}://{}/robots.txt", start.scheme(), authority);

        match client
            .get(&robots_url)
            .timeout(ROBOTS_FETCH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().as_u16() == 200 => match response.text().await {
                Ok(body) => Self::parse(&body),
                Err(err) => {
                    warn!("could not read robots.txt body from {robots_url}: {err}");
                    Self::fetched_none()
                }
            },
            Ok(response) => {
                debug!(
                    "no robots.txt at {robots_url} (HTTP {})",
                    response.status().as_u16()
                );
                Self::fetched_none()
            }
            Err(err) => {
                warn!("could not fetch robots.txt from {robots_url}: {err}");
                Self::fetched_none()
            }
        }
    }

    fn fetched_none() -> Self {
        Self {
            status: "Fetched (none)".to_string(),
            ..Self::default()
        }
    }

    /// Parse a robots.txt body: `*`-agent ruleset, first crawl-delay float,
    /// and all sitemap hints.
    pub fn parse(body: &str) -> Self {
        let robot = match Robot::new("*", body.as_bytes()) {
            Ok(robot) => Some(robot),
            Err(err) => {
                debug!("robots.txt did not parse, treating as permissive: {err}");
                None
            }
        };

        let crawl_delay = body
            .lines()
            .find_map(|line| {
                let line = line.trim();
                let value = line
                    .get(..12)
                    .filter(|prefix| prefix.eq_ignore_ascii_case("crawl-delay:"))
                    .map(|_| line[12..].trim())?;
                value.parse::<f64>().ok().filter(|delay| *delay >= 0.0)
            })
            .unwrap_or(0.0);

        // Hints are scanned directly so they survive a ruleset parse failure.
        let sitemap_hints = body
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                line.get(..8)
                    .filter(|prefix| prefix.eq_ignore_ascii_case("sitemap:"))
                    .map(|_| line[8..].trim().to_string())
                    .filter(|hint| !hint.is_empty())
            })
            .collect();

        Self {
            robot,
            crawl_delay,
            sitemap_hints,
            status: "Fetched and parsed".to_string(),
        }
    }

    /// Whether the `*` ruleset allows fetching `url`. Permissive when no
    /// ruleset is held.
    pub fn allows(&self, url: &str) -> bool {
        self.robot.as_ref().map_or(true, |robot| robot.allowed(url))
    }
}
