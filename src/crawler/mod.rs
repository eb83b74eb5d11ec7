//! Crawl orchestration.
//!
//! `SeoCrawler` wires the frontier, robots policy, sitemap resolver, fetcher
//! and analyzer into a single polite breadth-first crawl over one domain.
//! URLs discovered in page links are fetched before sitemap seeds; every
//! produced record (including error records) consumes page budget.

pub mod fetcher;
pub mod frontier;
pub mod patterns;
pub mod progress;
pub mod robots;
pub mod sitemap;
pub mod urls;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};
use url::Url;

use crate::analyzer::PageAnalyzer;
use crate::core::config::{CrawlConfig, CrawlError};
use crate::core::types::{CrawlStats, DiscoverySource, PageRecord, SkipReason, SkipRecord};
use fetcher::PageFetcher;
use frontier::Frontier;
use patterns::PatternSet;
use progress::CrawlProgress;
use robots::RobotsPolicy;
use sitemap::SitemapResolver;

/// Cooperative cancellation for a running crawl; checked before each URL is
/// taken from the frontier.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct SeoCrawler {
    config: CrawlConfig,
    start: Url,
    domain: String,
    include: PatternSet,
    exclude: PatternSet,
    frontier: Frontier,
    results: Vec<PageRecord>,
    /// Per-record normalized same-domain outlinks, for inlink accounting.
    outlinks: Vec<Vec<String>>,
    skipped: Vec<SkipRecord>,
    robots: RobotsPolicy,
    sitemap_status: String,
    urls_from_crawling: usize,
    urls_from_sitemap: usize,
    cancelled: Arc<AtomicBool>,
}

impl SeoCrawler {
    /// Validate the config and prepare the crawl state. No I/O happens here.
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        config.validate()?;

        let start_url =
            urls::normalize(&config.start_url).ok_or_else(|| CrawlError::InvalidStartUrl {
                url: config.start_url.clone(),
                reason: "could not canonicalize".to_string(),
            })?;
        let start = Url::parse(&start_url).map_err(|err| CrawlError::InvalidStartUrl {
            url: config.start_url.clone(),
            reason: err.to_string(),
        })?;
        let domain = start
            .host_str()
            .ok_or_else(|| CrawlError::InvalidStartUrl {
                url: config.start_url.clone(),
                reason: "missing host".to_string(),
            })?
            .to_string();

        let include = PatternSet::compile(&config.include_patterns);
        let exclude = PatternSet::compile(&config.exclude_patterns);

        let mut frontier = Frontier::new();
        frontier.push_discovered(start_url, 0);

        Ok(Self {
            config,
            start,
            domain,
            include,
            exclude,
            frontier,
            results: Vec::new(),
            outlinks: Vec::new(),
            skipped: Vec::new(),
            robots: RobotsPolicy::unfetched(),
            sitemap_status: "Not fetched".to_string(),
            urls_from_crawling: 0,
            urls_from_sitemap: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancelled.clone())
    }

    /// Run the crawl: resolve robots and sitemaps, then drive the frontier
    /// until the page budget is spent or no URLs remain. Returns the frozen
    /// record set; setup failures (and only those) surface as errors.
    pub async fn crawl(
        &mut self,
        progress: &dyn CrawlProgress,
    ) -> Result<Vec<PageRecord>, CrawlError> {
        progress.init_step(10, "🔧 Setting up crawler session...");
        let fetcher = PageFetcher::new(&self.config)?;

        self.resolve_robots_and_sitemaps(&fetcher, progress).await;
        progress.init_step(
            100,
            &format!("🚀 Starting crawl with {} URLs ready...", self.frontier.queued()),
        );

        let analyzer = PageAnalyzer::new(&self.domain, self.config.ignore_noindex);
        let mut pages_crawled = 0usize;
        let mut last_fetched: Option<String> = None;

        while pages_crawled < self.config.max_pages {
            if self.cancelled.load(Ordering::Relaxed) {
                info!("crawl cancelled after {pages_crawled} pages");
                break;
            }
            let Some((url, depth, source)) = self.frontier.pop() else {
                break;
            };
            match source {
                DiscoverySource::Crawling => self.urls_from_crawling += 1,
                DiscoverySource::Sitemap => self.urls_from_sitemap += 1,
            }

            if self.frontier.is_visited(&url) {
                continue;
            }
            if let Some(reason) = self.filter_reason(&url) {
                self.skipped.push(SkipRecord { url, reason, source });
                continue;
            }
            self.frontier.mark_visited(&url);

            let outcome = fetcher
                .fetch_with_retry(&url, depth, last_fetched.as_deref())
                .await;
            let mut record = outcome.record;
            record.discovery_source = source;

            let mut internal_links = Vec::new();
            if record.status.is_success() {
                if let Some(body) = outcome.body.as_deref() {
                    let base = Url::parse(&record.final_url).unwrap_or_else(|_| self.start.clone());
                    let extracted = analyzer.analyze(body, &base, &mut record);
                    internal_links = self.process_outlinks(&extracted, depth);
                }
            } else {
                warn!("failed to crawl {url}: {}", record.error);
            }

            last_fetched = Some(url.clone());
            self.results.push(record);
            self.outlinks.push(internal_links);
            pages_crawled += 1;
            progress.page_crawled(pages_crawled, self.config.max_pages, &url);

            let delay = self.next_delay();
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }

        self.fill_inlinks();
        info!(
            "crawl finished: {} pages, {} skipped ({} from links, {} from sitemaps)",
            self.results.len(),
            self.skipped.len(),
            self.urls_from_crawling,
            self.urls_from_sitemap
        );
        Ok(self.results.clone())
    }

    async fn resolve_robots_and_sitemaps(
        &mut self,
        fetcher: &PageFetcher,
        progress: &dyn CrawlProgress,
    ) {
        if !(self.config.respect_robots || self.config.use_sitemap) {
            progress.init_step(90, "⚠️ Robots.txt and sitemaps disabled");
            self.robots = RobotsPolicy::disabled();
            self.sitemap_status = "Disabled".to_string();
            return;
        }

        progress.init_step(20, "📋 Fetching robots.txt...");
        self.robots = RobotsPolicy::fetch(fetcher.client(), &self.start).await;
        if self.robots.status == "Fetched and parsed" {
            progress.init_step(40, "✅ Robots.txt fetched successfully");
        } else {
            progress.init_step(40, "⚠️ Could not fetch robots.txt, continuing...");
        }

        if !self.config.use_sitemap {
            self.sitemap_status = "Disabled".to_string();
            return;
        }

        let mut resolver = SitemapResolver::new(fetcher.client(), &self.domain);
        let hints = self.robots.sitemap_hints.clone();
        if hints.is_empty() {
            progress.init_step(50, "🗺️ Checking common sitemap locations...");
        } else {
            progress.init_step(50, &format!("🗺️ Found {} sitemaps in robots.txt", hints.len()));
        }

        // Robots-declared hints plus the well-known locations, all fetched;
        // a hint yielding URLs never shadows /sitemap.xml and friends.
        let mut sources = hints;
        for url in sitemap::well_known_urls(&self.start) {
            if !sources.contains(&url) {
                sources.push(url);
            }
        }
        for (i, source_url) in sources.iter().enumerate() {
            let percent = 50 + (40 * (i + 1) / sources.len()) as u8;
            let name = source_url.rsplit('/').next().unwrap_or(source_url);
            progress.init_step(
                percent,
                &format!("🗺️ Processing sitemap {}/{}: {}", i + 1, sources.len(), name),
            );
            resolver.fetch_sitemap(source_url).await;
        }

        if resolver.urls.is_empty() {
            progress.init_step(90, "⚠️ No sitemap URLs found");
            progress.init_step(95, "🗺️ Trying common sitemap locations...");
            resolver.try_well_known(&self.start).await;
        } else {
            progress.init_step(
                90,
                &format!("✅ Discovered {} URLs from sitemaps", resolver.urls.len()),
            );
        }

        for url in &resolver.urls {
            if let Some(normalized) = urls::normalize(url) {
                self.frontier.push_sitemap(normalized);
            }
        }
        self.sitemap_status = resolver.status;
    }

    /// Pop-time filter chain: exclude, include, robots, extension. The first
    /// match wins and is logged as the skip reason.
    fn filter_reason(&self, url: &str) -> Option<SkipReason> {
        if !self.exclude.is_empty() && self.exclude.matches(url) {
            return Some(SkipReason::ExcludedByPattern);
        }
        if !self.include.is_empty() && !self.include.matches(url) {
            return Some(SkipReason::NotIncludedByPattern);
        }
        if self.config.respect_robots && !self.robots.allows(url) {
            return Some(SkipReason::BlockedByRobots);
        }
        if urls::is_non_html_resource(url) {
            return Some(SkipReason::NonHtmlResource);
        }
        None
    }

    /// Enqueue same-domain outlinks within the depth bound; robots and
    /// pattern checks are deferred to pop time so skips are visible in the
    /// skip log. Returns the page's normalized same-domain outlinks.
    fn process_outlinks(&mut self, extracted: &[String], depth: usize) -> Vec<String> {
        let mut internal = Vec::new();
        for link in extracted {
            let Some(normalized) = urls::normalize(link) else {
                continue;
            };
            if !urls::is_same_domain(&self.domain, &normalized) {
                continue;
            }
            if depth + 1 <= self.config.max_depth && !self.frontier.is_visited(&normalized) {
                self.frontier.push_discovered(normalized.clone(), depth + 1);
            }
            internal.push(normalized);
        }
        internal
    }

    /// Robots crawl-delay wins when present; otherwise a uniform draw from
    /// the configured range.
    fn next_delay(&self) -> f64 {
        if self.robots.crawl_delay > 0.0 {
            self.robots.crawl_delay
        } else {
            let (min, max) = self.config.delay_range;
            rand::rng().random_range(min..=max)
        }
    }

    /// Back-fill `inlinks` / `unique_inlinks` from the recorded outlink
    /// lists, keyed on each record's canonical address and final URL.
    fn fill_inlinks(&mut self) {
        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, record) in self.results.iter().enumerate() {
            index.entry(record.address.clone()).or_insert(i);
            if let Some(normalized) = urls::normalize(&record.final_url) {
                index.entry(normalized).or_insert(i);
            }
        }

        let mut inlinks = vec![0usize; self.results.len()];
        let mut unique_inlinks = vec![0usize; self.results.len()];
        for (source, links) in self.outlinks.iter().enumerate() {
            let mut seen: HashSet<usize> = HashSet::new();
            for target in links {
                let Some(&target_index) = index.get(target) else {
                    continue;
                };
                if target_index == source {
                    continue;
                }
                inlinks[target_index] += 1;
                if seen.insert(target_index) {
                    unique_inlinks[target_index] += 1;
                }
            }
        }

        for (i, record) in self.results.iter_mut().enumerate() {
            record.inlinks = inlinks[i];
            record.unique_inlinks = unique_inlinks[i];
        }
    }

    pub fn results(&self) -> &[PageRecord] {
        &self.results
    }

    pub fn skipped(&self) -> &[SkipRecord] {
        &self.skipped
    }

    pub fn stats(&self) -> CrawlStats {
        let crawl_delay_used = if self.robots.crawl_delay > 0.0 {
            format_delay(self.robots.crawl_delay)
        } else {
            let (min, max) = self.config.delay_range;
            format!("{}-{}s", format_delay(min), format_delay(max))
        };
        CrawlStats {
            total_pages: self.results.len(),
            skipped_urls: self.skipped.len(),
            robots_txt_status: self.robots.status.clone(),
            crawl_delay_used,
            sitemap_status: self.sitemap_status.clone(),
            urls_from_crawling: self.urls_from_crawling,
            urls_from_sitemap: self.urls_from_sitemap,
        }
    }
}

/// Render a delay bound the way the report format expects: whole-number
/// seconds keep one decimal ("2.0", not "2").
fn format_delay(value: f64) -> String {
    let formatted = value.to_string();
    if formatted.contains('.') {
        formatted
    } else {
        format!("{formatted}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PageStatus;

    fn crawler_with(config: CrawlConfig) -> SeoCrawler {
        SeoCrawler::new(config).unwrap()
    }

    fn base_config() -> CrawlConfig {
        CrawlConfig {
            respect_robots: false,
            use_sitemap: false,
            ..CrawlConfig::for_site("https://example.com")
        }
    }

    #[test]
    fn new_rejects_invalid_configs_before_io() {
        let config = CrawlConfig {
            max_pages: 0,
            ..CrawlConfig::for_site("https://example.com")
        };
        assert!(SeoCrawler::new(config).is_err());

        let config = CrawlConfig::for_site("no spaces allowed");
        assert!(SeoCrawler::new(config).is_err());
    }

    #[test]
    fn exclude_patterns_win_over_include_patterns() {
        let config = CrawlConfig {
            include_patterns: vec!["https://example.com/*".to_string()],
            exclude_patterns: vec!["*/private/*".to_string()],
            ..base_config()
        };
        let crawler = crawler_with(config);
        assert_eq!(
            crawler.filter_reason("https://example.com/private/x"),
            Some(SkipReason::ExcludedByPattern)
        );
        assert_eq!(crawler.filter_reason("https://example.com/ok"), None);
        assert_eq!(
            crawler.filter_reason("https://other.com/page"),
            Some(SkipReason::NotIncludedByPattern)
        );
    }

    #[test]
    fn robots_rules_only_apply_when_respected() {
        let mut crawler = crawler_with(base_config());
        crawler.robots = RobotsPolicy::parse("User-agent: *\nDisallow: /private/\n");
        assert_eq!(crawler.filter_reason("https://example.com/private/x"), None);

        let mut crawler = crawler_with(CrawlConfig {
            respect_robots: true,
            ..base_config()
        });
        crawler.robots = RobotsPolicy::parse("User-agent: *\nDisallow: /private/\n");
        assert_eq!(
            crawler.filter_reason("https://example.com/private/x"),
            Some(SkipReason::BlockedByRobots)
        );
    }

    #[test]
    fn binary_resources_are_filtered_by_extension() {
        let crawler = crawler_with(base_config());
        assert_eq!(
            crawler.filter_reason("https://example.com/brochure.pdf"),
            Some(SkipReason::NonHtmlResource)
        );
    }

    #[test]
    fn outlinks_respect_depth_bound_and_domain() {
        let mut crawler = crawler_with(CrawlConfig {
            max_depth: 1,
            ..base_config()
        });
        let extracted = vec![
            "https://example.com/a".to_string(),
            "https://other.com/b".to_string(),
        ];
        // depth 0 -> children at depth 1 are allowed
        let internal = crawler.process_outlinks(&extracted, 0);
        assert_eq!(internal, vec!["https://example.com/a"]);
        assert_eq!(crawler.frontier.queued(), 2); // seed + /a

        // depth 1 -> children would exceed max_depth, tracked but not queued
        let internal = crawler.process_outlinks(&extracted, 1);
        assert_eq!(internal, vec!["https://example.com/a"]);
        assert_eq!(crawler.frontier.queued(), 2);
    }

    #[test]
    fn fill_inlinks_counts_edges_and_unique_sources() {
        let mut crawler = crawler_with(base_config());
        let page = |address: &str| PageRecord {
            address: address.to_string(),
            final_url: address.to_string(),
            status: PageStatus::Code(200),
            ..PageRecord::default()
        };
        crawler.results = vec![
            page("https://example.com/"),
            page("https://example.com/a"),
            page("https://example.com/b"),
        ];
        crawler.outlinks = vec![
            // home links to /a twice and /b once
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string(),
            ],
            // /a links to /b and to itself (ignored)
            vec![
                "https://example.com/b".to_string(),
                "https://example.com/a".to_string(),
            ],
            vec![],
        ];

        crawler.fill_inlinks();
        assert_eq!(crawler.results[1].inlinks, 2);
        assert_eq!(crawler.results[1].unique_inlinks, 1);
        assert_eq!(crawler.results[2].inlinks, 2);
        assert_eq!(crawler.results[2].unique_inlinks, 2);
        assert_eq!(crawler.results[0].inlinks, 0);
    }

    #[test]
    fn cancel_handle_flips_the_shared_flag() {
        let crawler = crawler_with(base_config());
        let handle = crawler.cancel_handle();
        assert!(!handle.is_cancelled());
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(crawler.cancelled.load(Ordering::Relaxed));
    }

    #[test]
    fn stats_report_delay_range_until_robots_overrides() {
        let mut crawler = crawler_with(base_config());
        assert_eq!(crawler.stats().crawl_delay_used, "0.5-2.0s");
        crawler.robots = RobotsPolicy::parse("Crawl-delay: 1.5\n");
        assert_eq!(crawler.stats().crawl_delay_used, "1.5");
        crawler.robots = RobotsPolicy::parse("Crawl-delay: 2\n");
        assert_eq!(crawler.stats().crawl_delay_used, "2.0");
    }
}
