use thiserror::Error;
use url::Url;

/// Configuration for one crawl run. Immutable once handed to the crawler;
/// `validate` runs synchronously before any I/O.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start_url: String,
    pub max_pages: usize,
    pub max_depth: usize,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub ignore_noindex: bool,
    pub request_timeout_secs: u64,
    /// Uniform random politeness delay bounds in seconds; a robots.txt
    /// crawl-delay > 0 overrides this range.
    pub delay_range: (f64, f64),
    pub respect_robots: bool,
    pub follow_redirects: bool,
    pub use_sitemap: bool,
    /// Accept invalid TLS certificates. Off by default; turn on to audit
    /// sites with broken certificate chains.
    pub accept_invalid_certs: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            max_pages: 50,
            max_depth: 3,
            include_patterns: vec![],
            exclude_patterns: vec![],
            ignore_noindex: false,
            request_timeout_secs: 30,
            delay_range: (0.5, 2.0),
            respect_robots: true,
            follow_redirects: true,
            use_sitemap: true,
            accept_invalid_certs: false,
        }
    }
}

impl CrawlConfig {
    /// Build a default config for a site, prepending `https://` when the
    /// caller passed a bare host.
    pub fn for_site(start_url: &str) -> Self {
        let start_url = start_url.trim();
        let start_url = if start_url.contains("://") {
            start_url.to_string()
        } else {
            format!("https://{start_url}")
        };
        Self {
            start_url,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        let parsed = Url::parse(&self.start_url)
            .map_err(|source| CrawlError::InvalidStartUrl {
                url: self.start_url.clone(),
                reason: source.to_string(),
            })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(CrawlError::InvalidStartUrl {
                url: self.start_url.clone(),
                reason: "expected an absolute http(s) URL".to_string(),
            });
        }
        if self.max_pages == 0 {
            return Err(CrawlError::ZeroMaxPages);
        }
        if self.max_depth == 0 {
            return Err(CrawlError::ZeroMaxDepth);
        }
        if self.request_timeout_secs == 0 {
            return Err(CrawlError::ZeroTimeout);
        }
        let (min, max) = self.delay_range;
        if !(min > 0.0 && min <= max) {
            return Err(CrawlError::InvalidDelayRange { min, max });
        }
        Ok(())
    }
}

/// Failures raised before or during crawl-session setup. Everything past
/// setup is reported as a value inside the record set, never as an error.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid start URL {url:?}: {reason}")]
    InvalidStartUrl { url: String, reason: String },
    #[error("max_pages must be at least 1")]
    ZeroMaxPages,
    #[error("max_depth must be at least 1")]
    ZeroMaxDepth,
    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error("invalid delay range {min}-{max}: need 0 < min <= max")]
    InvalidDelayRange { min: f64, max: f64 },
    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}
